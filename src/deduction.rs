//! The forward-chaining engine. A run seeds the chart with the schema's axioms
//! and then pops chart positions off a FIFO agenda, trying every rule on the
//! popped item combined with every subset of the chart of the right size,
//! until nothing new can be derived.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, trace, warn};

use crate::chart::{Chart, Derivation};
use crate::error::DeductionError;
use crate::item::Item;
use crate::schema::{DynamicRule, Schema};
use crate::trace::Trace;
use crate::tree::Tree;

/// What happens when a rule derives an item that is already in the chart
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReplacePolicy {
  /// Keep the entry and record the new derivation next to the old ones
  #[default]
  Accumulate,
  /// Replace the entry if the new weight is strictly higher
  HigherWins,
  /// Replace the entry if the new weight is strictly lower
  LowerWins,
}

impl ReplacePolicy {
  fn prefers(self, new: Option<f64>, old: Option<f64>) -> bool {
    match (self, new, old) {
      (Self::HigherWins, Some(new), Some(old)) => new > old,
      (Self::LowerWins, Some(new), Some(old)) => new < old,
      _ => false,
    }
  }
}

#[derive(Debug, Default, Clone)]
pub struct DeductionConfig {
  pub replace: ReplacePolicy,
  /// Fail the run instead of growing the chart past this many items
  pub max_chart_size: Option<usize>,
}

impl DeductionConfig {
  pub fn with_policy(replace: ReplacePolicy) -> Self {
    Self {
      replace,
      ..Self::default()
    }
  }
}

/// The result of a run: the final chart and which goals it contains
#[derive(Debug)]
pub struct Outcome {
  chart: Chart,
  goals: Vec<usize>,
  trees: Vec<Tree>,
}

impl Outcome {
  /// What a run without a schema reports: nothing derived, nothing derivable
  pub fn underivable() -> Self {
    Self {
      chart: Chart::new(),
      goals: Vec::new(),
      trees: Vec::new(),
    }
  }

  pub fn is_derivable(&self) -> bool {
    !self.goals.is_empty()
  }

  pub fn chart(&self) -> &Chart {
    &self.chart
  }

  /// Chart positions of the goals that were derived
  pub fn goals(&self) -> &[usize] {
    &self.goals
  }

  /// Derivation trees attached to the derived goals
  pub fn trees(&self) -> &[Tree] {
    &self.trees
  }

  /// Every chart entry
  pub fn trace(&self) -> Trace {
    Trace::full(&self.chart)
  }

  /// Only the entries that contribute to a derived goal, original ids kept
  pub fn useful_trace(&self) -> Trace {
    Trace::useful(&self.chart)
  }
}

/// State of one run. Nothing outlives it except the [`Outcome`].
pub struct Deduction<'s> {
  schema: &'s Schema,
  config: DeductionConfig,
  chart: Chart,
  agenda: VecDeque<usize>,
  pending: HashSet<usize>,
}

impl<'s> Deduction<'s> {
  pub fn new(schema: &'s Schema, config: DeductionConfig) -> Self {
    Self {
      schema,
      config,
      chart: Chart::new(),
      agenda: VecDeque::new(),
      pending: HashSet::new(),
    }
  }

  pub fn run(mut self) -> Result<Outcome, DeductionError> {
    let schema = self.schema;

    for axiom in schema.axioms() {
      for item in axiom.consequences() {
        if self.chart.has(item) {
          continue;
        }
        self.insert(item.clone(), Derivation::axiom(axiom.name()))?;
      }
    }

    while let Some(idx) = self.agenda.pop_front() {
      self.pending.remove(&idx);
      for rule in schema.rules() {
        self.apply(idx, rule)?;
      }
    }

    Ok(self.finish())
  }

  /// Tries `rule` with the item at `idx` first and every increasing choice of
  /// other positions after it. Positions holding an item equal to the first
  /// are never used as further antecedents.
  fn apply(&mut self, idx: usize, rule: &DynamicRule) -> Result<(), DeductionError> {
    let arity = rule.arity();
    if arity == 0 || self.chart.len() < arity {
      return Ok(());
    }

    for others in self.antecedent_positions(idx, arity - 1) {
      let mut positions = Vec::with_capacity(arity);
      positions.push(idx);
      positions.extend(others);

      let fired = {
        let antecedents = positions
          .iter()
          .map(|&p| self.chart.item(p))
          .collect::<Vec<_>>();
        rule.try_apply(&antecedents)
      };
      let Some(fired) = fired else {
        continue;
      };

      positions.sort_unstable();
      for item in fired.items {
        self.merge(item, &fired.name, &positions)?;
      }
    }
    Ok(())
  }

  /// All ways to pick `needed` further chart positions in increasing order.
  /// The chart length is read once, so items added while a rule is being
  /// tried are only combined once they are popped themselves.
  fn antecedent_positions(&self, first: usize, needed: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(needed);
    self.collect_positions(first, 0, needed, self.chart.len(), &mut current, &mut out);
    out
  }

  fn collect_positions(
    &self,
    first: usize,
    from: usize,
    needed: usize,
    len: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
  ) {
    let remaining = needed - current.len();
    if remaining == 0 {
      out.push(current.clone());
      return;
    }
    if len < remaining {
      return;
    }
    for j in from..=(len - remaining) {
      if self.chart.item(j) == self.chart.item(first) {
        continue;
      }
      current.push(j);
      self.collect_positions(first, j + 1, needed, len, current, out);
      current.pop();
    }
  }

  /// Adds a consequence to the chart. Unlike a plain agenda, a position can
  /// be consumed more than once: an entry goes back on the agenda when a
  /// weighted policy replaces it or when its set of trees grows, and its
  /// consequences are then derived again from the new value.
  fn merge(&mut self, item: Item, rule: &str, backpointers: &[usize]) -> Result<(), DeductionError> {
    let derivation = Derivation::new(rule, backpointers.to_vec());
    let Some(old) = self.chart.position(&item) else {
      return self.insert(item, derivation);
    };

    match self.config.replace {
      ReplacePolicy::Accumulate => {
        if self.chart.add_derivation(old, derivation) {
          debug!(position = old + 1, %rule, "new derivation of {}", item);
        }
        if self.chart.merge_trees(old, &item) {
          trace!(position = old + 1, "more trees for {}", item);
          self.requeue(old);
        }
      }
      policy @ (ReplacePolicy::HigherWins | ReplacePolicy::LowerWins) => {
        if policy.prefers(item.weight(), self.chart.item(old).weight()) {
          trace!(position = old + 1, %rule, "replacing {} with {}", self.chart.item(old), item);
          self.chart.replace(old, item, derivation);
          self.requeue(old);
        }
      }
    }
    Ok(())
  }

  fn requeue(&mut self, idx: usize) {
    if self.pending.insert(idx) {
      self.agenda.push_back(idx);
    }
  }

  fn insert(&mut self, item: Item, derivation: Derivation) -> Result<(), DeductionError> {
    if let Some(limit) = self.config.max_chart_size {
      if self.chart.len() >= limit {
        warn!(limit, "chart limit reached");
        return Err(DeductionError::ChartLimit { limit });
      }
    }
    debug!(position = self.chart.len() + 1, rule = %derivation.rule, "added {}", item);
    let idx = self.chart.push(item, derivation);
    self.requeue(idx);
    Ok(())
  }

  fn finish(mut self) -> Outcome {
    let mut goals = Vec::new();
    let mut trees: Vec<Tree> = Vec::new();
    for goal in self.schema.goals() {
      let Some(idx) = self.chart.position(goal) else {
        continue;
      };
      if goals.contains(&idx) {
        continue;
      }
      goals.push(idx);
      for tree in self.chart.item(idx).trees() {
        if !trees.contains(tree) {
          trees.push(tree.clone());
        }
      }
    }

    self.chart.mark_useful(&goals);
    info!(
      items = self.chart.len(),
      goals = goals.len(),
      useful = self.chart.useful_positions().len(),
      "deduction finished"
    );

    Outcome {
      chart: self.chart,
      goals,
      trees,
    }
  }
}

/// Runs `schema` to its fixpoint. No schema, as when a compiler rejected the
/// grammar, means nothing is derivable.
pub fn deduce(schema: Option<&Schema>, config: DeductionConfig) -> Result<Outcome, DeductionError> {
  match schema {
    Some(schema) => Deduction::new(schema, config).run(),
    None => Ok(Outcome::underivable()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::item;
  use crate::schema::{Axiom, CfgRule, PcfgRule};
  use crate::rules::{Production, ProductionRule, Symbol};
  use std::rc::Rc;

  fn binary(lhs: &str, b: &str, c: &str) -> Rc<ProductionRule> {
    let nt = |s: &str| Production::Nonterminal(Symbol::new(s.to_string()));
    Rc::new(ProductionRule::new(lhs, vec![nt(b), nt(c)]))
  }

  /// `S -> A B` over `[A,0,1]` and `[B,1,1]`
  fn small_cyk() -> Schema {
    let mut schema = Schema::new();
    schema.add_axiom(Axiom::new("scan a").with(item!["A", 0usize, 1usize]));
    schema.add_axiom(Axiom::new("scan b").with(item!["B", 1usize, 1usize]));
    schema.add_rule(CfgRule::CykComplete {
      rule: binary("S", "A", "B"),
    });
    schema.add_goal(item!["S", 0usize, 2usize]);
    schema
  }

  #[test]
  fn test_binary_rule_fires_once() {
    let outcome = deduce(Some(&small_cyk()), DeductionConfig::default()).unwrap();
    assert!(outcome.is_derivable());
    assert_eq!(outcome.chart().len(), 3);
    let entry = outcome.chart().get(2).unwrap();
    assert_eq!(entry.item.to_string(), "[S,0,2]");
    assert_eq!(
      entry.derivations,
      vec![Derivation::new("complete S -> A B", vec![0, 1])]
    );
    assert_eq!(outcome.goals(), &[2]);
  }

  #[test]
  fn test_no_schema_is_underivable() {
    let outcome = deduce(None, DeductionConfig::default()).unwrap();
    assert!(!outcome.is_derivable());
    assert!(outcome.chart().is_empty());
    assert!(outcome.trace().rows().is_empty());
  }

  #[test]
  fn test_duplicate_axioms_are_skipped() {
    let mut schema = small_cyk();
    schema.add_axiom(Axiom::new("again").with(item!["A", 0usize, 1usize]));
    let outcome = deduce(Some(&schema), DeductionConfig::default()).unwrap();
    assert_eq!(outcome.chart().len(), 3);
    assert_eq!(outcome.chart().get(0).unwrap().derivations.len(), 1);
  }

  #[test]
  fn test_chart_limit() {
    let config = DeductionConfig {
      max_chart_size: Some(2),
      ..DeductionConfig::default()
    };
    let err = deduce(Some(&small_cyk()), config).unwrap_err();
    assert!(matches!(err, DeductionError::ChartLimit { limit: 2 }));
  }

  #[test]
  fn test_higher_wins_keeps_best_and_propagates() {
    // two ways to build X over 0..2, and T built on top of X
    let mut schema = Schema::new();
    schema.add_axiom(Axiom::new("scan").with(item!["A", 0usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["B", 1usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["C", 2usize, 1usize].weighted(1.0)));
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("X", "A", "B"),
      p: 0.3,
    });
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("X", "B", "A"),
      p: 0.9,
    });
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("T", "X", "C"),
      p: 1.0,
    });
    schema.add_axiom(Axiom::new("scan").with(item!["B", 0usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["A", 1usize, 1usize].weighted(1.0)));
    schema.add_goal(item!["T", 0usize, 3usize]);

    let outcome = deduce(
      Some(&schema),
      DeductionConfig::with_policy(ReplacePolicy::HigherWins),
    )
    .unwrap();
    let x = outcome.chart().position(&item!["X", 0usize, 2usize]).unwrap();
    let t = outcome.goals()[0];
    assert_eq!(outcome.chart().item(x).weight(), Some(0.9));
    assert_eq!(outcome.chart().get(x).unwrap().derivations.len(), 1);
    assert_eq!(outcome.chart().item(t).weight(), Some(0.9));
  }

  #[test]
  fn test_lower_wins_replaces_costlier_item() {
    // X over 0..2 is first built at 0.9, then rebuilt at 0.3 once B A arrive
    let mut schema = Schema::new();
    schema.add_axiom(Axiom::new("scan").with(item!["A", 0usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["B", 1usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["C", 2usize, 1usize].weighted(1.0)));
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("X", "A", "B"),
      p: 0.9,
    });
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("X", "B", "A"),
      p: 0.3,
    });
    schema.add_rule(PcfgRule::CykComplete {
      rule: binary("T", "X", "C"),
      p: 1.0,
    });
    schema.add_axiom(Axiom::new("scan").with(item!["B", 0usize, 1usize].weighted(1.0)));
    schema.add_axiom(Axiom::new("scan").with(item!["A", 1usize, 1usize].weighted(1.0)));
    schema.add_goal(item!["T", 0usize, 3usize]);

    let outcome = deduce(
      Some(&schema),
      DeductionConfig::with_policy(ReplacePolicy::LowerWins),
    )
    .unwrap();
    let x = outcome.chart().position(&item!["X", 0usize, 2usize]).unwrap();
    let t = outcome.goals()[0];
    assert_eq!(outcome.chart().item(x).weight(), Some(0.3));
    assert_eq!(
      outcome.chart().get(x).unwrap().derivations[0].rule,
      "complete 0.3 : X -> B A"
    );
    assert_eq!(outcome.chart().get(x).unwrap().derivations.len(), 1);
    assert_eq!(outcome.chart().item(t).weight(), Some(0.3));
  }

  #[test]
  fn test_policies() {
    assert!(ReplacePolicy::HigherWins.prefers(Some(0.7), Some(0.3)));
    assert!(!ReplacePolicy::HigherWins.prefers(Some(0.3), Some(0.3)));
    assert!(ReplacePolicy::LowerWins.prefers(Some(0.3), Some(0.7)));
    assert!(!ReplacePolicy::Accumulate.prefers(Some(0.7), Some(0.3)));
    assert!(!ReplacePolicy::HigherWins.prefers(None, Some(0.3)));
  }
}
