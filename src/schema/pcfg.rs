//! Weighted CYK and A* over probabilistic grammars. Items carry the weight of
//! their best known derivation, so these schemata are run with a
//! [`ReplacePolicy`](crate::deduction::ReplacePolicy) that keeps the better
//! weight: the higher probability for CYK, the lower cost for A*.

use std::collections::HashMap;
use std::rc::Rc;

use crate::algorithm::Algorithm;
use crate::error::SchemaError;
use crate::grammar::Pcfg;
use crate::item;
use crate::item::Item;
use crate::rules::ProductionRule;
use crate::schema::{either_order, Axiom, Fired, Schema};
use crate::tree::Tree;
use crate::utils::combinations;

#[derive(Debug, Clone)]
pub enum PcfgRule {
  /// `p1 : [B,i,l1]  p2 : [C,i+l1,l2]  =>  p*p1*p2 : [A,i,l1+l2]` for
  /// `p : A -> B C`
  CykComplete { rule: Rc<ProductionRule>, p: f64 },
  /// `w1 : [B,i,j]  w2 : [C,j,k]  =>  w : [A,i,k]` for `p : A -> B C`, where
  /// `w` is the summed inside cost `-ln p` of both parts plus the outside
  /// estimate of `A` over `i..k`
  AstarComplete {
    rule: Rc<ProductionRule>,
    p: f64,
    estimates: Rc<SxEstimates>,
  },
}

fn cost(p: f64) -> f64 {
  -p.ln()
}

/// SX estimates for A*: the cheapest inside cost of a nonterminal over `l`
/// words, and the cheapest outside cost of a nonterminal over `l` words with
/// `left` words before it, both as negative log probabilities. Only lengths
/// count, never the words themselves.
#[derive(Debug, Clone)]
pub struct SxEstimates {
  n: usize,
  inside: HashMap<(String, usize), f64>,
  outside: HashMap<(String, usize, usize), f64>,
}

fn relax<K: std::hash::Hash + Eq>(table: &mut HashMap<K, f64>, key: K, value: f64) {
  let entry = table.entry(key).or_insert(f64::INFINITY);
  if value < *entry {
    *entry = value;
  }
}

impl SxEstimates {
  /// Estimates for inputs of `n` words. Needs a grammar in Chomsky normal
  /// form.
  pub fn new(pcfg: &Pcfg, n: usize) -> Self {
    let binary = pcfg
      .rules
      .iter()
      .filter_map(|wr| {
        let mut rhs = wr.rule.rhs_symbols();
        match (rhs.next(), rhs.next(), wr.rule.is_binary_nonterminal()) {
          (Some(b), Some(c), true) => Some((wr.rule.symbol_str(), b, c, cost(wr.p))),
          _ => None,
        }
      })
      .collect::<Vec<_>>();

    let mut inside = HashMap::new();
    for wr in pcfg.rules.iter().filter(|wr| wr.rule.is_lexical()) {
      relax(&mut inside, (wr.rule.symbol_str().to_string(), 1), cost(wr.p));
    }
    for l in 2..=n {
      for &(a, b, c, w) in binary.iter() {
        for k in 1..l {
          let left = inside.get(&(b.to_string(), k)).copied();
          let right = inside.get(&(c.to_string(), l - k)).copied();
          if let (Some(x), Some(y)) = (left, right) {
            relax(&mut inside, (a.to_string(), l), w + x + y);
          }
        }
      }
    }

    let mut outside = HashMap::new();
    outside.insert((pcfg.start.clone(), 0, n), 0.0);
    for l in (2..=n).rev() {
      for left in 0..=(n - l) {
        for &(a, b, c, w) in binary.iter() {
          let Some(&out) = outside.get(&(a.to_string(), left, l)) else {
            continue;
          };
          for k in 1..l {
            if let Some(&y) = inside.get(&(c.to_string(), l - k)) {
              relax(&mut outside, (b.to_string(), left, k), out + w + y);
            }
            if let Some(&x) = inside.get(&(b.to_string(), k)) {
              relax(&mut outside, (c.to_string(), left + k, l - k), out + w + x);
            }
          }
        }
      }
    }

    Self { n, inside, outside }
  }

  pub fn inside(&self, symbol: &str, len: usize) -> Option<f64> {
    self.inside.get(&(symbol.to_string(), len)).copied()
  }

  /// None if no complete parse of `n` words can have `symbol` over
  /// `i..i+len`
  pub fn outside(&self, symbol: &str, i: usize, len: usize) -> Option<f64> {
    if i + len > self.n {
      return None;
    }
    self.outside.get(&(symbol.to_string(), i, len)).copied()
  }
}

impl PcfgRule {
  pub fn arity(&self) -> usize {
    match self {
      Self::CykComplete { .. } | Self::AstarComplete { .. } => 2,
    }
  }

  pub fn name(&self) -> String {
    match self {
      Self::CykComplete { rule, p } | Self::AstarComplete { rule, p, .. } => {
        format!("complete {} : {}", p, rule)
      }
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::CykComplete { rule, p } => {
        let rhs = rule.rhs_symbols().collect::<Vec<_>>();
        let (b, c) = match rhs.as_slice() {
          [b, c] => (*b, *c),
          _ => ("B", "C"),
        };
        format!(
          "x1 : [{},i,l1], x2 : [{},i+l1,l2]\n______ {} : {}\n{} * x1 * x2 : [{},i,l1+l2]",
          b, c, p, rule, p, rule.symbol
        )
      }
      Self::AstarComplete { rule, p, .. } => {
        let rhs = rule.rhs_symbols().collect::<Vec<_>>();
        let (b, c) = match rhs.as_slice() {
          [b, c] => (*b, *c),
          _ => ("B", "C"),
        };
        format!(
          "w1 : [{},i,j], w2 : [{},j,k]\n______ {} : {}\nw1 + w2 - ln {} + sx({},i,k) : [{},i,k]",
          b, c, p, rule, p, rule.symbol, rule.symbol
        )
      }
    }
  }

  pub(crate) fn try_apply(&self, antecedents: &[&Item]) -> Option<Fired> {
    match self {
      Self::CykComplete { rule, p } => either_order(antecedents, |left, right| {
        let (b, i, l1) = (left.sym(0)?, left.num(1)?, left.num(2)?);
        let (c, i2, l2) = (right.sym(0)?, right.num(1)?, right.num(2)?);
        let mut rhs = rule.rhs_symbols();
        if rhs.next() != Some(b) || rhs.next() != Some(c) || i + l1 != i2 {
          return None;
        }
        let weight = p * left.weight()? * right.weight()?;
        let trees = combinations(&[left.trees().to_vec(), right.trees().to_vec()])
          .into_iter()
          .filter_map(|pair| {
            pair
              .iter()
              .try_fold(Tree::from_production(rule), |t, child| t.substitute_leftmost(child))
          })
          .collect();
        Fired::one(
          self.name(),
          item![rule.symbol_str(), i, l1 + l2]
            .weighted(weight)
            .with_trees(trees),
        )
      }),

      Self::AstarComplete { rule, p, estimates } => either_order(antecedents, |left, right| {
        let (b, i, j) = (left.sym(0)?, left.num(1)?, left.num(2)?);
        let (c, j2, k) = (right.sym(0)?, right.num(1)?, right.num(2)?);
        let mut rhs = rule.rhs_symbols();
        if rhs.next() != Some(b) || rhs.next() != Some(c) || j != j2 {
          return None;
        }
        let inside_b = left.weight()? - estimates.outside(b, i, j.checked_sub(i)?)?;
        let inside_c = right.weight()? - estimates.outside(c, j, k.checked_sub(j)?)?;
        let estimate = estimates.outside(rule.symbol_str(), i, k - i)?;
        let weight = cost(*p) + inside_b + inside_c + estimate;
        let trees = combinations(&[left.trees().to_vec(), right.trees().to_vec()])
          .into_iter()
          .filter_map(|pair| {
            pair
              .iter()
              .try_fold(Tree::from_production(rule), |t, child| t.substitute_leftmost(child))
          })
          .collect();
        Fired::one(
          self.name(),
          item![rule.symbol_str(), i, k].weighted(weight).with_trees(trees),
        )
      }),
    }
  }
}

pub fn cyk(pcfg: &Pcfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  if !pcfg.to_cfg().is_in_chomsky_normal_form() {
    return Err(SchemaError::NotChomskyNormalForm(Algorithm::PcfgCyk.to_string()));
  }
  let mut schema = Schema::new();
  for wr in pcfg.rules.iter() {
    let rule = &wr.rule;
    if rule.is_lexical() {
      let a = rule.productions[0].symbol_str();
      for (i, _) in tokens.iter().enumerate().filter(|(_, t)| *t == a) {
        schema.add_axiom(
          Axiom::new(format!("scan {}", wr)).with(
            item![rule.symbol_str(), i, 1usize]
              .weighted(wr.p)
              .with_tree(Tree::from_production(rule)),
          ),
        );
      }
    } else if rule.is_binary_nonterminal() {
      schema.add_rule(PcfgRule::CykComplete {
        rule: Rc::new(rule.clone()),
        p: wr.p,
      });
    } else if rule.is_empty() && tokens.is_empty() {
      schema.add_axiom(
        Axiom::new(format!("scan {}", wr)).with(
          item![rule.symbol_str(), 0usize, 0usize]
            .weighted(wr.p)
            .with_tree(Tree::from_production(rule)),
        ),
      );
    }
  }
  schema.add_goal(item![pcfg.start.clone(), 0usize, tokens.len()]);
  Ok(schema)
}

/// A* parsing: items `[A,i,j]` weighted by inside cost plus the SX outside
/// estimate, run under a policy that keeps the lower weight. Items no complete
/// parse can use are never built.
pub fn astar(pcfg: &Pcfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  if !pcfg.to_cfg().is_in_chomsky_normal_form() {
    return Err(SchemaError::NotChomskyNormalForm(Algorithm::PcfgAstar.to_string()));
  }
  let estimates = Rc::new(SxEstimates::new(pcfg, tokens.len()));
  let mut schema = Schema::new();
  for wr in pcfg.rules.iter() {
    let rule = &wr.rule;
    if rule.is_lexical() {
      let a = rule.productions[0].symbol_str();
      for (i, _) in tokens.iter().enumerate().filter(|(_, t)| *t == a) {
        let Some(estimate) = estimates.outside(rule.symbol_str(), i, 1) else {
          continue;
        };
        schema.add_axiom(
          Axiom::new(format!("scan {}", wr)).with(
            item![rule.symbol_str(), i, i + 1]
              .weighted(cost(wr.p) + estimate)
              .with_tree(Tree::from_production(rule)),
          ),
        );
      }
    } else if rule.is_binary_nonterminal() {
      schema.add_rule(PcfgRule::AstarComplete {
        rule: Rc::new(rule.clone()),
        p: wr.p,
        estimates: estimates.clone(),
      });
    } else if rule.is_empty() && tokens.is_empty() {
      schema.add_axiom(
        Axiom::new(format!("scan {}", wr)).with(
          item![rule.symbol_str(), 0usize, 0usize]
            .weighted(cost(wr.p))
            .with_tree(Tree::from_production(rule)),
        ),
      );
    }
  }
  schema.add_goal(item![pcfg.start.clone(), 0usize, tokens.len()]);
  Ok(schema)
}
