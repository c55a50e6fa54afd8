use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{debug, info};

use chartwright::Err;
use chartwright::algorithm::{Algorithm, AnyGrammar};
use chartwright::deduction::{DeductionConfig, deduce};

#[derive(Parser)]
#[command(
  name = "chartwright",
  version,
  about = "Decide whether a string is derivable from a grammar"
)]
struct Args {
  /// Grammar file (.cfg, .pcfg or .tag)
  grammar: PathBuf,

  /// Space separated tokens. Read line by line from stdin when missing.
  input: Option<String>,

  /// One of cfg-topdown, cfg-shiftreduce, cfg-earley, cfg-leftcorner,
  /// cfg-cyk, cfg-cyk-extended, cfg-cyk-general, cfg-unger, cfg-lr-k,
  /// pcfg-cyk, pcfg-astar, tag-cyk, tag-earley
  #[arg(short, long, default_value = "cfg-earley")]
  algorithm: String,

  /// Print every chart entry
  #[arg(long)]
  trace: bool,

  /// Print only the entries leading to a goal
  #[arg(long)]
  success: bool,

  /// Print the derivation trees of the goals
  #[arg(long)]
  trees: bool,

  /// Give up once the chart holds this many items
  #[arg(long)]
  max_chart: Option<usize>,
}

fn parse(g: &AnyGrammar, algorithm: Algorithm, input: &str, args: &Args) -> Result<(), Err> {
  debug!(%algorithm, input, "parsing");
  let schema = algorithm.compile(g, input)?;

  let config = DeductionConfig {
    replace: algorithm.replace_policy(),
    max_chart_size: args.max_chart,
  };
  let outcome = deduce(Some(&schema), config)?;
  debug!(chart = outcome.chart().len(), goals = outcome.goals().len(), "done");

  if outcome.is_derivable() {
    println!("derivable");
  } else {
    println!("not derivable");
  }

  if args.trace {
    println!("\n{}", outcome.trace());
  }
  if args.success {
    println!("\n{}", outcome.useful_trace());
  }
  if args.trees {
    for t in outcome.trees() {
      println!("{}", t);
    }
  }

  Ok(())
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  let algorithm: Algorithm = match args.algorithm.parse() {
    Ok(a) => a,
    Err(e) => {
      eprintln!("error: {}", e);
      process::exit(255);
    }
  };

  let g = match AnyGrammar::read_from_file(&args.grammar) {
    Ok(g) => g,
    Err(e) => {
      eprintln!("error: {}: {}", args.grammar.display(), e);
      process::exit(255);
    }
  };

  info!(grammar = %args.grammar.display(), kind = %g.kind(), %algorithm, "loaded grammar");

  // grammar preconditions do not depend on the input
  if let Err(e) = algorithm.compile(&g, "") {
    eprintln!("error: {}", e);
    process::exit(1);
  }

  if let Some(input) = &args.input {
    if let Err(e) = parse(&g, algorithm, input, &args) {
      eprintln!("error: {}", e);
      process::exit(1);
    }
    return Ok(());
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    input.clear();
    if io::stdin().read_line(&mut input)? == 0 {
      // ctrl+d
      return Ok(());
    }
    if let Err(e) = parse(&g, algorithm, input.trim(), &args) {
      eprintln!("error: {}", e);
    }
  }
}
