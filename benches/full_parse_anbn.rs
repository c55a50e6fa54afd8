use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chartwright::algorithm::{Algorithm, AnyGrammar};
use chartwright::recognize;

const ANBN_SRC: &str = include_str!("../grammars/anbn.cfg");
const ARITH_SRC: &str = include_str!("../grammars/arith.cfg");

fn parse(algorithm: Algorithm, g: &AnyGrammar, input: &str) -> bool {
  recognize(algorithm, g, input).unwrap().is_derivable()
}

fn criterion_benchmark(c: &mut Criterion) {
  let anbn = AnyGrammar::Cfg(ANBN_SRC.parse().unwrap());
  let arith = AnyGrammar::Cfg(ARITH_SRC.parse().unwrap());
  let anbn_input = "a a a a b b b b";
  let arith_input = "( x + x ) * x + x";

  c.bench_function("earley anbn", |b| {
    b.iter(|| parse(Algorithm::CfgEarley, black_box(&anbn), black_box(anbn_input)))
  });

  c.bench_function("cyk-general anbn", |b| {
    b.iter(|| parse(Algorithm::CfgCykGeneral, black_box(&anbn), black_box(anbn_input)))
  });

  c.bench_function("earley arith", |b| {
    b.iter(|| parse(Algorithm::CfgEarley, black_box(&arith), black_box(arith_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
