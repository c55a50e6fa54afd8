use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::rules::{Production, ProductionRule};
use crate::tree::{GornAddress, Tree, EPSILON};

/// A production with a dot marking how much of its right-hand side has been
/// recognized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedRule {
  pub rule: Rc<ProductionRule>,
  pub pos: usize,
}

impl DottedRule {
  pub fn new(rule: &Rc<ProductionRule>) -> Self {
    Self {
      rule: rule.clone(),
      pos: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.pos < self.rule.len()
  }

  /// None once the dot has reached the end
  pub fn advance(&self) -> Option<Self> {
    if !self.is_active() {
      return None;
    }
    Some(Self {
      rule: self.rule.clone(),
      pos: self.pos + 1,
    })
  }

  pub fn next_production(&self) -> Option<&Production> {
    self.rule.productions.get(self.pos)
  }
}

impl fmt::Display for DottedRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.rule.symbol)?;
    for idx in 0..self.rule.len() {
      if idx == self.pos {
        write!(f, " •")?;
      }
      write!(f, " {}", self.rule.productions[idx])?;
    }
    if !self.is_active() {
      write!(f, " •")?;
    }
    Ok(())
  }
}

/// One component of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
  /// A grammar symbol, tree name or position marker
  Sym(String),
  Num(usize),
  /// An unset index, printed `-`
  Gap,
  Flag(bool),
  /// A symbol sequence such as a parser stack
  Seq(Vec<String>),
  Dotted(DottedRule),
  Addr(GornAddress),
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Sym(s) => write!(f, "{}", s),
      Self::Num(n) => write!(f, "{}", n),
      Self::Gap => write!(f, "-"),
      Self::Flag(b) => write!(f, "{}", if *b { 1 } else { 0 }),
      Self::Seq(s) if s.is_empty() => write!(f, "{}", EPSILON),
      Self::Seq(s) => write!(f, "{}", s.join(" ")),
      Self::Dotted(d) => write!(f, "{}", d),
      Self::Addr(a) => write!(f, "{}", a),
    }
  }
}

impl From<&str> for Field {
  fn from(s: &str) -> Self {
    Self::Sym(s.to_string())
  }
}

impl From<String> for Field {
  fn from(s: String) -> Self {
    Self::Sym(s)
  }
}

impl From<usize> for Field {
  fn from(n: usize) -> Self {
    Self::Num(n)
  }
}

impl From<Option<usize>> for Field {
  fn from(n: Option<usize>) -> Self {
    n.map_or(Self::Gap, Self::Num)
  }
}

impl From<bool> for Field {
  fn from(b: bool) -> Self {
    Self::Flag(b)
  }
}

impl From<Vec<String>> for Field {
  fn from(s: Vec<String>) -> Self {
    Self::Seq(s)
  }
}

impl From<DottedRule> for Field {
  fn from(d: DottedRule) -> Self {
    Self::Dotted(d)
  }
}

impl From<GornAddress> for Field {
  fn from(a: GornAddress) -> Self {
    Self::Addr(a)
  }
}

/// Builds an [`Item`](crate::item::Item) from anything convertible to a
/// [`Field`](crate::item::Field).
///
/// ```
/// use chartwright::item;
/// let it = item!["S", 0usize, 3usize];
/// assert_eq!(it.to_string(), "[S,0,3]");
/// ```
#[macro_export]
macro_rules! item {
  ($($field:expr),* $(,)?) => {
    $crate::item::Item::new(vec![$($crate::item::Field::from($field)),*])
  };
}

/// A derived fact. Identity is the form alone: the weight and the derivation
/// trees ride along but two items with equal forms are the same item.
#[derive(Debug, Clone)]
pub struct Item {
  form: Vec<Field>,
  weight: Option<f64>,
  trees: Vec<Tree>,
}

impl Item {
  pub fn new(form: Vec<Field>) -> Self {
    Self {
      form,
      weight: None,
      trees: Vec::new(),
    }
  }

  pub fn weighted(mut self, weight: f64) -> Self {
    self.weight = Some(weight);
    self
  }

  pub fn with_trees(mut self, trees: Vec<Tree>) -> Self {
    self.trees = trees;
    self
  }

  pub fn with_tree(self, tree: Tree) -> Self {
    self.with_trees(vec![tree])
  }

  pub fn form(&self) -> &[Field] {
    &self.form
  }

  pub fn len(&self) -> usize {
    self.form.len()
  }

  pub fn is_empty(&self) -> bool {
    self.form.is_empty()
  }

  pub fn weight(&self) -> Option<f64> {
    self.weight
  }

  pub fn trees(&self) -> &[Tree] {
    &self.trees
  }

  pub fn field(&self, idx: usize) -> Option<&Field> {
    self.form.get(idx)
  }

  pub fn sym(&self, idx: usize) -> Option<&str> {
    match self.field(idx)? {
      Field::Sym(s) => Some(s),
      _ => None,
    }
  }

  pub fn num(&self, idx: usize) -> Option<usize> {
    match self.field(idx)? {
      Field::Num(n) => Some(*n),
      _ => None,
    }
  }

  /// Some(None) for a gap, Some(Some(n)) for an index, None for anything else
  pub fn opt_num(&self, idx: usize) -> Option<Option<usize>> {
    match self.field(idx)? {
      Field::Num(n) => Some(Some(*n)),
      Field::Gap => Some(None),
      _ => None,
    }
  }

  pub fn flag(&self, idx: usize) -> Option<bool> {
    match self.field(idx)? {
      Field::Flag(b) => Some(*b),
      _ => None,
    }
  }

  pub fn seq(&self, idx: usize) -> Option<&[String]> {
    match self.field(idx)? {
      Field::Seq(s) => Some(s),
      _ => None,
    }
  }

  pub fn dotted(&self, idx: usize) -> Option<&DottedRule> {
    match self.field(idx)? {
      Field::Dotted(d) => Some(d),
      _ => None,
    }
  }

  pub fn addr(&self, idx: usize) -> Option<&GornAddress> {
    match self.field(idx)? {
      Field::Addr(a) => Some(a),
      _ => None,
    }
  }

  /// Adds the trees of `other` not already present. A tree embedding one this
  /// item already holds only repeats a cycle of unary or ε steps and is left
  /// out, which keeps the forest of a cyclic grammar finite. Returns whether
  /// anything was added.
  pub(crate) fn merge_trees(&mut self, other: &[Tree]) -> bool {
    let mut changed = false;
    for tree in other {
      if self.trees.contains(tree) || self.trees.iter().any(|t| tree.has_proper_subtree(t)) {
        continue;
      }
      self.trees.push(tree.clone());
      changed = true;
    }
    changed
  }
}

impl PartialEq for Item {
  fn eq(&self, other: &Self) -> bool {
    self.form == other.form
  }
}

impl Eq for Item {}

impl Hash for Item {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.form.hash(state);
  }
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(w) = self.weight {
      write!(f, "{} : ", w)?;
    }
    write!(f, "[")?;
    for (idx, field) in self.form.iter().enumerate() {
      if idx > 0 {
        write!(f, ",")?;
      }
      write!(f, "{}", field)?;
    }
    write!(f, "]")
  }
}
