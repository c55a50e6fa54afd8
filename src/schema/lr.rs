//! LR parse tables. States are sets of LR(0) items; reductions are entered
//! for every lookahead in the FOLLOW set of the rule's left-hand side. A cell
//! may hold more than one action, and the deduction rules built on the table
//! simply follow all of them.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use tracing::debug;

use crate::grammar::Cfg;
use crate::rules::{Production, ProductionRule, Symbol};

/// End of input lookahead
pub const END: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
  Shift(usize),
  /// Reduce by the numbered production
  Reduce(usize),
  Accept,
}

/// A production number and a dot position
type LrItem = (usize, usize);

#[derive(Debug, Clone)]
pub struct LrTable {
  /// Productions numbered in grammar order from 1. Number 0 is the added
  /// `S' -> S`.
  rules: Vec<Rc<ProductionRule>>,
  actions: HashMap<(usize, String), Vec<Action>>,
  gotos: HashMap<(usize, String), usize>,
  states: usize,
}

fn first_sets(cfg: &Cfg) -> HashMap<String, BTreeSet<String>> {
  let mut first: HashMap<String, BTreeSet<String>> = HashMap::new();
  let mut changed = true;
  while changed {
    changed = false;
    for rule in cfg.rules.iter() {
      let mut found = BTreeSet::new();
      for p in rule.productions.iter() {
        match p {
          Production::Terminal(a) => {
            found.insert(a.clone());
            break;
          }
          Production::Nonterminal(b) => {
            if let Some(f) = first.get(&b.name) {
              found.extend(f.iter().cloned());
            }
            if !cfg.is_nullable(&b.name) {
              break;
            }
          }
        }
      }
      let entry = first.entry(rule.symbol.name.clone()).or_default();
      for a in found {
        changed |= entry.insert(a);
      }
    }
  }
  first
}

fn follow_sets(cfg: &Cfg, first: &HashMap<String, BTreeSet<String>>) -> HashMap<String, BTreeSet<String>> {
  let mut follow: HashMap<String, BTreeSet<String>> = HashMap::new();
  follow
    .entry(cfg.start.clone())
    .or_default()
    .insert(END.to_string());

  let mut changed = true;
  while changed {
    changed = false;
    for rule in cfg.rules.iter() {
      for (idx, p) in rule.productions.iter().enumerate() {
        let Production::Nonterminal(b) = p else {
          continue;
        };
        let mut found = BTreeSet::new();
        let mut rest_nullable = true;
        for next in rule.productions[idx + 1..].iter() {
          match next {
            Production::Terminal(a) => {
              found.insert(a.clone());
              rest_nullable = false;
              break;
            }
            Production::Nonterminal(c) => {
              if let Some(f) = first.get(&c.name) {
                found.extend(f.iter().cloned());
              }
              if !cfg.is_nullable(&c.name) {
                rest_nullable = false;
                break;
              }
            }
          }
        }
        if rest_nullable {
          if let Some(f) = follow.get(&rule.symbol.name) {
            found.extend(f.iter().cloned());
          }
        }
        let entry = follow.entry(b.name.clone()).or_default();
        for a in found {
          changed |= entry.insert(a);
        }
      }
    }
  }
  follow
}

impl LrTable {
  pub fn new(cfg: &Cfg) -> Self {
    let mut augmented = format!("{}'", cfg.start);
    while cfg.is_nonterminal(&augmented) {
      augmented.push('\'');
    }
    let mut rules = vec![Rc::new(ProductionRule::new(
      &augmented,
      vec![Production::Nonterminal(Symbol::new(cfg.start.clone()))],
    ))];
    rules.extend(cfg.rules.iter().cloned());

    let follow = follow_sets(cfg, &first_sets(cfg));

    let mut table = Self {
      rules,
      actions: HashMap::new(),
      gotos: HashMap::new(),
      states: 0,
    };

    let mut states = vec![table.closure(BTreeSet::from([(0, 0)]))];
    let mut index: HashMap<BTreeSet<LrItem>, usize> = HashMap::new();
    index.insert(states[0].clone(), 0);

    let mut q = 0;
    while q < states.len() {
      let next_symbols = states[q]
        .iter()
        .filter_map(|&(r, dot)| table.rules[r].productions.get(dot))
        .cloned()
        .collect::<BTreeSet<_>>();

      for symbol in next_symbols {
        let kernel = states[q]
          .iter()
          .filter(|&&(r, dot)| table.rules[r].productions.get(dot) == Some(&symbol))
          .map(|&(r, dot)| (r, dot + 1))
          .collect();
        let target = table.closure(kernel);
        let id = match index.get(&target) {
          Some(&id) => id,
          None => {
            index.insert(target.clone(), states.len());
            states.push(target);
            states.len() - 1
          }
        };
        match symbol {
          Production::Terminal(a) => table.add_action(q, &a, Action::Shift(id)),
          Production::Nonterminal(b) => {
            table.gotos.insert((q, b.name), id);
          }
        }
      }

      let complete = states[q]
        .iter()
        .filter(|&&(r, dot)| dot == table.rules[r].len())
        .map(|&(r, _)| r)
        .collect::<Vec<_>>();
      for r in complete {
        if r == 0 {
          table.add_action(q, END, Action::Accept);
          continue;
        }
        let lookaheads = follow
          .get(table.rules[r].symbol_str())
          .cloned()
          .unwrap_or_default();
        for a in lookaheads {
          table.add_action(q, &a, Action::Reduce(r));
        }
      }
      q += 1;
    }

    table.states = states.len();
    debug!(
      states = table.states,
      deterministic = table.is_deterministic(),
      "built LR table"
    );
    table
  }

  fn closure(&self, mut set: BTreeSet<LrItem>) -> BTreeSet<LrItem> {
    let mut stack = set.iter().copied().collect::<Vec<_>>();
    while let Some((r, dot)) = stack.pop() {
      let Some(Production::Nonterminal(b)) = self.rules[r].productions.get(dot) else {
        continue;
      };
      for (id, rule) in self.rules.iter().enumerate().skip(1) {
        if rule.symbol == *b && set.insert((id, 0)) {
          stack.push((id, 0));
        }
      }
    }
    set
  }

  fn add_action(&mut self, state: usize, lookahead: &str, action: Action) {
    let cell = self
      .actions
      .entry((state, lookahead.to_string()))
      .or_default();
    if !cell.contains(&action) {
      cell.push(action);
    }
  }

  pub fn actions(&self, state: usize, lookahead: &str) -> &[Action] {
    self
      .actions
      .get(&(state, lookahead.to_string()))
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn goto(&self, state: usize, symbol: &str) -> Option<usize> {
    self.gotos.get(&(state, symbol.to_string())).copied()
  }

  pub fn rule(&self, id: usize) -> Option<&Rc<ProductionRule>> {
    self.rules.get(id)
  }

  /// Production numbers of the grammar's own rules
  pub fn rule_ids(&self) -> std::ops::Range<usize> {
    1..self.rules.len()
  }

  pub fn states(&self) -> usize {
    self.states
  }

  /// No cell holds two actions
  pub fn is_deterministic(&self) -> bool {
    self.actions.values().all(|cell| cell.len() <= 1)
  }
}

pub fn state_name(q: usize) -> String {
  format!("q{}", q)
}

/// The state on top of an LR stack `q0 X1 q1 ... Xk qk`
pub fn top_state(stack: &[String]) -> Option<usize> {
  stack.last()?.strip_prefix('q')?.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg(s: &str) -> Cfg {
    s.parse().unwrap()
  }

  #[test]
  fn test_expression_table() {
    let g = cfg(
      r#"
      N = {"E", "T"}
      T = {"x", "+"}
      S = "E"
      P = {"E -> E + T", "E -> T", "T -> x"}
      "#,
    );
    let table = LrTable::new(&g);
    assert!(table.is_deterministic());
    assert_eq!(table.states(), 6);

    let Action::Shift(after_x) = table.actions(0, "x")[0] else {
      panic!("expected a shift on x");
    };
    // T -> x is production 3
    assert_eq!(table.actions(after_x, "+"), &[Action::Reduce(3)]);
    assert_eq!(table.actions(after_x, END), &[Action::Reduce(3)]);
    assert!(table.actions(after_x, "x").is_empty());

    let after_e = table.goto(0, "E").unwrap();
    assert_eq!(table.actions(after_e, END), &[Action::Accept]);
    assert!(matches!(table.actions(after_e, "+"), [Action::Shift(_)]));
    assert_eq!(table.rule(0).unwrap().to_string(), "E' -> E");
  }

  #[test]
  fn test_conflicts_are_kept() {
    let g = cfg(
      r#"
      N = {"S"}
      T = {"a"}
      S = "S"
      P = {"S -> S S", "S -> a"}
      "#,
    );
    let table = LrTable::new(&g);
    assert!(!table.is_deterministic());
    let after_s = table.goto(0, "S").unwrap();
    let after_ss = table.goto(after_s, "S").unwrap();
    let cell = table.actions(after_ss, "a");
    assert!(cell.contains(&Action::Reduce(1)));
    assert!(cell.iter().any(|a| matches!(a, Action::Shift(_))));
  }

  #[test]
  fn test_stack_states() {
    let stack = vec!["q0".to_string(), "a".to_string(), "q12".to_string()];
    assert_eq!(top_state(&stack), Some(12));
    assert_eq!(top_state(&stack[..2]), None);
    assert_eq!(state_name(3), "q3");
  }
}
