use std::collections::HashMap;
use std::fmt;

use crate::item::{Field, Item};

/// One way an item was derived: the name the rule fired under and the chart
/// positions of its antecedents, sorted ascending. Axioms have none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
  pub rule: String,
  pub backpointers: Vec<usize>,
}

impl Derivation {
  pub fn new(rule: impl Into<String>, backpointers: Vec<usize>) -> Self {
    Self {
      rule: rule.into(),
      backpointers,
    }
  }

  pub fn axiom(rule: impl Into<String>) -> Self {
    Self::new(rule, Vec::new())
  }
}

#[derive(Debug, Clone)]
pub struct ChartEntry {
  pub item: Item,
  pub derivations: Vec<Derivation>,
  /// Set once the item has been found to contribute to a goal
  pub useful: bool,
}

/// Every item derived so far in insertion order, each with its derivations.
/// Positions are stable: an entry never moves once added.
#[derive(Debug, Default)]
pub struct Chart {
  entries: Vec<ChartEntry>,
  index: HashMap<Vec<Field>, usize>,
}

impl Chart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, idx: usize) -> Option<&ChartEntry> {
    self.entries.get(idx)
  }

  /// Panics on an out-of-range position, like slice indexing
  pub fn item(&self, idx: usize) -> &Item {
    &self.entries[idx].item
  }

  pub fn position(&self, item: &Item) -> Option<usize> {
    self.index.get(item.form()).copied()
  }

  pub fn has(&self, item: &Item) -> bool {
    self.position(item).is_some()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ChartEntry> {
    self.entries.iter()
  }

  /// Appends an item not yet in the chart, returning its position
  pub(crate) fn push(&mut self, item: Item, derivation: Derivation) -> usize {
    let idx = self.entries.len();
    self.index.insert(item.form().to_vec(), idx);
    self.entries.push(ChartEntry {
      item,
      derivations: vec![derivation],
      useful: false,
    });
    idx
  }

  /// Records another derivation of the item at `idx` unless it is already
  /// known. Returns whether it was new.
  pub(crate) fn add_derivation(&mut self, idx: usize, derivation: Derivation) -> bool {
    let entry = &mut self.entries[idx];
    if entry.derivations.contains(&derivation) {
      return false;
    }
    entry.derivations.push(derivation);
    true
  }

  pub(crate) fn merge_trees(&mut self, idx: usize, item: &Item) -> bool {
    self.entries[idx].item.merge_trees(item.trees())
  }

  /// Swaps in a better-weighted version of the item at `idx`, dropping the
  /// derivations of the one it replaces.
  pub(crate) fn replace(&mut self, idx: usize, item: Item, derivation: Derivation) {
    let entry = &mut self.entries[idx];
    entry.item = item;
    entry.derivations = vec![derivation];
  }

  /// Marks everything reachable from `roots` through backpointers as useful
  pub(crate) fn mark_useful(&mut self, roots: &[usize]) {
    let mut stack = roots.to_vec();
    while let Some(idx) = stack.pop() {
      let entry = &mut self.entries[idx];
      if entry.useful {
        continue;
      }
      entry.useful = true;
      for d in entry.derivations.iter() {
        stack.extend(d.backpointers.iter().copied());
      }
    }
  }

  pub fn useful_positions(&self) -> Vec<usize> {
    self
      .entries
      .iter()
      .enumerate()
      .filter(|(_, e)| e.useful)
      .map(|(idx, _)| idx)
      .collect()
  }
}

impl IntoIterator for Chart {
  type Item = (usize, ChartEntry);
  type IntoIter = std::iter::Enumerate<std::vec::IntoIter<ChartEntry>>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter().enumerate()
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, entry) in self.entries.iter().enumerate() {
      writeln!(f, "{}: {}", idx + 1, entry.item)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::item;

  fn small_chart() -> Chart {
    let mut chart = Chart::new();
    chart.push(item!["a", 0usize, 1usize], Derivation::axiom("scan"));
    chart.push(item!["b", 1usize, 1usize], Derivation::axiom("scan"));
    chart.push(item!["c", 0usize, 1usize], Derivation::axiom("scan"));
    chart.push(item!["S", 0usize, 2usize], Derivation::new("complete", vec![0, 1]));
    chart
  }

  #[test]
  fn test_positions_are_stable() {
    let mut chart = small_chart();
    assert_eq!(chart.position(&item!["S", 0usize, 2usize]), Some(3));
    chart.replace(1, item!["b", 1usize, 1usize].weighted(0.5), Derivation::axiom("x"));
    assert_eq!(chart.position(&item!["b", 1usize, 1usize]), Some(1));
    assert_eq!(chart.item(1).weight(), Some(0.5));
    assert_eq!(chart.get(1).unwrap().derivations, vec![Derivation::axiom("x")]);
  }

  #[test]
  fn test_duplicate_derivations_are_dropped() {
    let mut chart = small_chart();
    assert!(!chart.add_derivation(3, Derivation::new("complete", vec![0, 1])));
    assert!(chart.add_derivation(3, Derivation::new("complete", vec![1, 2])));
    assert!(chart.add_derivation(3, Derivation::new("other", vec![0, 1])));
    assert_eq!(chart.get(3).unwrap().derivations.len(), 3);
  }

  #[test]
  fn test_mark_useful() {
    let mut chart = small_chart();
    chart.mark_useful(&[3]);
    assert_eq!(chart.useful_positions(), vec![0, 1, 3]);
  }

  #[test]
  fn test_display() {
    let chart = small_chart();
    assert!(chart.to_string().starts_with("1: [a,0,1]\n2: [b,1,1]\n"));
  }
}
