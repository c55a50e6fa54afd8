//! Parsing schemata: the axioms, inference rules and goals a grammar and an
//! input compile to. The engine in [`crate::deduction`] only ever sees this
//! module's types.

use std::fmt;

use crate::item::Item;

pub mod cfg;
pub mod lr;
pub mod pcfg;
pub mod tag;

pub use cfg::CfgRule;
pub use pcfg::PcfgRule;
pub use tag::{TagCykRule, TagEarleyRule};

/// A rule with no antecedents: its consequences are in the chart before
/// anything else runs.
#[derive(Debug, Clone)]
pub struct Axiom {
  name: String,
  consequences: Vec<Item>,
}

impl Axiom {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      consequences: Vec::new(),
    }
  }

  pub fn with(mut self, item: Item) -> Self {
    self.consequences.push(item);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn consequences(&self) -> &[Item] {
    &self.consequences
  }

  pub fn arity(&self) -> usize {
    0
  }

  pub fn describe(&self) -> String {
    let items = self
      .consequences
      .iter()
      .map(Item::to_string)
      .collect::<Vec<_>>()
      .join(" ");
    format!("{}\n______\n{}", self.name, items)
  }
}

/// What a rule produced for one antecedent assignment, and the name it fired
/// under
#[derive(Debug)]
pub struct Fired {
  pub name: String,
  pub items: Vec<Item>,
}

impl Fired {
  pub fn new(name: impl Into<String>, items: Vec<Item>) -> Option<Self> {
    if items.is_empty() {
      None
    } else {
      Some(Self {
        name: name.into(),
        items,
      })
    }
  }

  pub fn one(name: impl Into<String>, item: Item) -> Option<Self> {
    Self::new(name, vec![item])
  }
}

/// An inference rule with a fixed number of antecedents. The engine hands
/// over antecedents as the item just taken off the agenda followed by the
/// others in chart order; every rule tries whichever assignment of them to
/// its premises it needs.
#[derive(Debug, Clone)]
pub enum DynamicRule {
  Cfg(CfgRule),
  Pcfg(PcfgRule),
  TagCyk(TagCykRule),
  TagEarley(TagEarleyRule),
}

impl DynamicRule {
  pub fn arity(&self) -> usize {
    match self {
      Self::Cfg(r) => r.arity(),
      Self::Pcfg(r) => r.arity(),
      Self::TagCyk(r) => r.arity(),
      Self::TagEarley(r) => r.arity(),
    }
  }

  /// The rule's base name. Some rules fire under a more specific one.
  pub fn name(&self) -> String {
    match self {
      Self::Cfg(r) => r.name(),
      Self::Pcfg(r) => r.name(),
      Self::TagCyk(r) => r.name(),
      Self::TagEarley(r) => r.name(),
    }
  }

  /// Human-readable inference-rule notation
  pub fn describe(&self) -> String {
    match self {
      Self::Cfg(r) => r.describe(),
      Self::Pcfg(r) => r.describe(),
      Self::TagCyk(r) => r.describe(),
      Self::TagEarley(r) => r.describe(),
    }
  }

  /// None if `antecedents` has the wrong length or does not match
  pub fn try_apply(&self, antecedents: &[&Item]) -> Option<Fired> {
    if antecedents.len() != self.arity() {
      return None;
    }
    match self {
      Self::Cfg(r) => r.try_apply(antecedents),
      Self::Pcfg(r) => r.try_apply(antecedents),
      Self::TagCyk(r) => r.try_apply(antecedents),
      Self::TagEarley(r) => r.try_apply(antecedents),
    }
  }
}

impl From<CfgRule> for DynamicRule {
  fn from(r: CfgRule) -> Self {
    Self::Cfg(r)
  }
}

impl From<PcfgRule> for DynamicRule {
  fn from(r: PcfgRule) -> Self {
    Self::Pcfg(r)
  }
}

impl From<TagCykRule> for DynamicRule {
  fn from(r: TagCykRule) -> Self {
    Self::TagCyk(r)
  }
}

impl From<TagEarleyRule> for DynamicRule {
  fn from(r: TagEarleyRule) -> Self {
    Self::TagEarley(r)
  }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
  axioms: Vec<Axiom>,
  rules: Vec<DynamicRule>,
  goals: Vec<Item>,
}

impl Schema {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_axiom(&mut self, axiom: Axiom) {
    self.axioms.push(axiom);
  }

  pub fn add_rule(&mut self, rule: impl Into<DynamicRule>) {
    self.rules.push(rule.into());
  }

  pub fn add_goal(&mut self, goal: Item) {
    if !self.goals.contains(&goal) {
      self.goals.push(goal);
    }
  }

  pub fn axioms(&self) -> &[Axiom] {
    &self.axioms
  }

  pub fn rules(&self) -> &[DynamicRule] {
    &self.rules
  }

  pub fn goals(&self) -> &[Item] {
    &self.goals
  }
}

impl fmt::Display for Schema {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for axiom in self.axioms.iter() {
      writeln!(f, "{}\n", axiom.describe())?;
    }
    for rule in self.rules.iter() {
      writeln!(f, "{}\n", rule.describe())?;
    }
    write!(f, "goals:")?;
    for goal in self.goals.iter() {
      write!(f, " {}", goal)?;
    }
    Ok(())
  }
}

/// Tries `f` on each ordering of a pair of antecedents, first match wins
pub(crate) fn either_order<T>(
  antecedents: &[&Item],
  mut f: impl FnMut(&Item, &Item) -> Option<T>,
) -> Option<T> {
  match antecedents {
    [a, b] => f(a, b).or_else(|| f(b, a)),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Cfg;
  use crate::item;

  fn anbn_cnf() -> Cfg {
    r#"
      N = {"S", "A", "B", "C"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> A B", "S -> A C", "C -> S B", "A -> a", "B -> b"}
    "#
    .parse()
    .unwrap()
  }

  fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
  }

  #[test]
  fn test_display_lists_axioms_rules_and_goals() {
    let schema = cfg::cyk(&anbn_cnf(), &tokens("a b")).unwrap();
    let text = schema.to_string();
    assert!(text.starts_with("scan A -> a\n______\n[A,0,1]\n"));
    assert!(text.contains("[A,i,l1] [B,i+l1,l2]\n______ S -> A B\n[S,i,l1+l2]"));
    assert!(text.contains("[S,i,l1] [B,i+l1,l2]\n______ C -> S B\n[C,i,l1+l2]"));
    assert!(text.ends_with("goals: [S,0,2]"));
  }

  #[test]
  fn test_describe_names_the_production() {
    let g = anbn_cnf();
    let input = tokens("a a b b");
    let schemas = [
      cfg::topdown(&g, &input).unwrap(),
      cfg::shift_reduce(&g, &input).unwrap(),
      cfg::earley(&g, &input).unwrap(),
      cfg::left_corner(&g, &input).unwrap(),
      cfg::cyk_general(&g, &input).unwrap(),
      cfg::unger(&g, &input).unwrap(),
      cfg::lr_k(&g, &input).unwrap(),
    ];
    for schema in schemas.iter() {
      for rule in schema.rules() {
        let text = rule.describe();
        assert_eq!(text.lines().count(), 3, "{}", text);
        assert!(text.lines().nth(1).is_some_and(|l| l.starts_with("______")));
      }
    }
    let predict = DynamicRule::from(CfgRule::EarleyPredict {
      rule: g.rules[1].clone(),
    });
    assert_eq!(
      predict.describe(),
      "[A -> α •S β,i,j]\n______ S -> A C\n[S -> •A C,j,j]"
    );
    assert_eq!(predict.name(), "predict S -> A C");
  }

  #[test]
  fn test_wrong_antecedent_count_fires_nothing() {
    let rules: [DynamicRule; 3] = [
      CfgRule::EarleyComplete.into(),
      CfgRule::Shift {
        tokens: vec!["a".to_string()].into(),
      }
      .into(),
      CfgRule::CykGeneral {
        rule: anbn_cnf().rules[0].clone(),
      }
      .into(),
    ];
    let a = item![Vec::<String>::new(), 0usize];
    for rule in rules.iter() {
      assert!(rule.try_apply(&[]).is_none());
      assert!(rule.try_apply(&[&a, &a, &a]).is_none());
    }
  }
}
