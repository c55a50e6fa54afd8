use std::fmt;
use std::str::FromStr;

use crate::error::TreeError;
use crate::rules::ProductionRule;

pub const EPSILON: &str = "ε";

/// Path from the root of a tree to one of its nodes: the root is `ε`, its
/// first child `1`, that child's second child `1.2`, and so on. Children are
/// numbered from 1.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GornAddress(Vec<usize>);

impl GornAddress {
  pub fn root() -> Self {
    Self(Vec::new())
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  pub fn path(&self) -> &[usize] {
    &self.0
  }

  /// Address of the `n`th child (1-based)
  pub fn child(&self, n: usize) -> Self {
    let mut path = self.0.clone();
    path.push(n);
    Self(path)
  }

  pub fn parent(&self) -> Option<Self> {
    if self.is_root() {
      None
    } else {
      Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
  }

  /// Address the next sibling would have. Whether a node lives there is up
  /// to the tree.
  pub fn right_sibling(&self) -> Option<Self> {
    let (last, init) = self.0.split_last()?;
    let mut path = init.to_vec();
    path.push(last + 1);
    Some(Self(path))
  }

  /// Index of this node among its siblings, 1-based. None for the root.
  pub fn last(&self) -> Option<usize> {
    self.0.last().copied()
  }
}

impl fmt::Display for GornAddress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_root() {
      return write!(f, "{}", EPSILON);
    }
    for (idx, n) in self.0.iter().enumerate() {
      if idx > 0 {
        write!(f, ".")?;
      }
      write!(f, "{}", n)?;
    }
    Ok(())
  }
}

impl FromStr for GornAddress {
  type Err = TreeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() || s == EPSILON {
      return Ok(Self::root());
    }
    let mut path = Vec::new();
    for segment in s.split('.') {
      let n: usize = segment.parse().map_err(|_| TreeError::BadSegment {
        segment: segment.to_string(),
        address: s.to_string(),
      })?;
      if n == 0 {
        return Err(TreeError::ZeroSegment(s.to_string()));
      }
      path.push(n);
    }
    Ok(Self(path))
  }
}

/// An ordered, labelled tree. Used both for the elementary trees of a TAG and
/// for the derivation trees that schemata attach to items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tree {
  pub label: String,
  /// Marks the foot node of an auxiliary tree
  pub foot: bool,
  pub children: Vec<Tree>,
}

impl Tree {
  pub fn leaf(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      foot: false,
      children: Vec::new(),
    }
  }

  pub fn foot(label: impl Into<String>) -> Self {
    Self {
      foot: true,
      ..Self::leaf(label)
    }
  }

  pub fn branch(label: impl Into<String>, children: Vec<Tree>) -> Self {
    Self {
      label: label.into(),
      foot: false,
      children,
    }
  }

  /// The one-level tree of a production: `A -> B c` becomes `(A B c)`, and an
  /// empty production `A -> ε` becomes `(A ε)`.
  pub fn from_production(rule: &ProductionRule) -> Self {
    let children = if rule.is_empty() {
      vec![Self::leaf(EPSILON)]
    } else {
      rule
        .productions
        .iter()
        .map(|p| Self::leaf(p.symbol_str()))
        .collect()
    };
    Self::branch(rule.symbol_str(), children)
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  pub fn is_epsilon(&self) -> bool {
    self.is_leaf() && (self.label == EPSILON || self.label.is_empty())
  }

  pub fn node(&self, addr: &GornAddress) -> Option<&Tree> {
    let mut node = self;
    for n in addr.path() {
      node = node.children.get(n.checked_sub(1)?)?;
    }
    Some(node)
  }

  fn node_mut(&mut self, addr: &GornAddress) -> Option<&mut Tree> {
    let mut node = self;
    for n in addr.path() {
      node = node.children.get_mut(n.checked_sub(1)?)?;
    }
    Some(node)
  }

  /// All nodes with their addresses, in preorder
  pub fn nodes(&self) -> Vec<(GornAddress, &Tree)> {
    let mut out = Vec::new();
    self.collect_nodes(GornAddress::root(), &mut out);
    out
  }

  fn collect_nodes<'a>(&'a self, addr: GornAddress, out: &mut Vec<(GornAddress, &'a Tree)>) {
    out.push((addr.clone(), self));
    for (idx, child) in self.children.iter().enumerate() {
      child.collect_nodes(addr.child(idx + 1), out);
    }
  }

  pub fn foot_address(&self) -> Option<GornAddress> {
    self
      .nodes()
      .into_iter()
      .find(|(_, node)| node.foot)
      .map(|(addr, _)| addr)
  }

  /// Whether `other` occurs somewhere below the root
  pub fn has_proper_subtree(&self, other: &Tree) -> bool {
    self
      .children
      .iter()
      .any(|c| c == other || c.has_proper_subtree(other))
  }

  /// Returns a copy of this tree with the node at `addr` replaced by `subtree`
  pub fn replace(&self, addr: &GornAddress, subtree: &Tree) -> Option<Tree> {
    let mut tree = self.clone();
    *tree.node_mut(addr)? = subtree.clone();
    Some(tree)
  }

  /// Substitutes `subtree` into the leftmost open leaf labelled with its root
  /// symbol. Open leaves are childless, non-foot, non-ε nodes. Returns None if
  /// there is no such leaf.
  pub fn substitute_leftmost(&self, subtree: &Tree) -> Option<Tree> {
    let addr = self
      .nodes()
      .into_iter()
      .find(|(_, node)| {
        node.is_leaf() && !node.foot && !node.is_epsilon() && node.label == subtree.label
      })
      .map(|(addr, _)| addr)?;
    self.replace(&addr, subtree)
  }

  /// Substitution at a given address: the node there must be a childless leaf
  /// with the same label as the root of `initial`.
  pub fn substitute(&self, addr: &GornAddress, initial: &Tree) -> Option<Tree> {
    let target = self.node(addr)?;
    if !target.is_leaf() || target.label != initial.label {
      return None;
    }
    self.replace(addr, initial)
  }

  /// Adjoins `auxiliary` at `addr`: the subtree rooted at `addr` moves under
  /// the foot of `auxiliary`, which then takes its place.
  pub fn adjoin(&self, addr: &GornAddress, auxiliary: &Tree) -> Option<Tree> {
    let target = self.node(addr)?;
    let foot = auxiliary.foot_address()?;
    if auxiliary.label != target.label {
      return None;
    }
    let mut excised = target.clone();
    excised.foot = false;
    let wrapped = auxiliary.replace(&foot, &excised)?;
    self.replace(addr, &wrapped)
  }
}

/// Bracket format: leaves are bare labels, inner nodes are
/// `(label child child ...)`, a trailing `*` marks the foot.
impl fmt::Display for Tree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let star = if self.foot { "*" } else { "" };
    if self.is_leaf() {
      return write!(f, "{}{}", self.label, star);
    }
    write!(f, "({}{}", self.label, star)?;
    for child in self.children.iter() {
      write!(f, " {}", child)?;
    }
    write!(f, ")")
  }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
  Open,
  Close,
  Label(&'a str),
}

fn tokenize(s: &str) -> Vec<Token<'_>> {
  let mut tokens = Vec::new();
  let mut start = None;
  for (idx, c) in s.char_indices() {
    if c == '(' || c == ')' || c.is_whitespace() {
      if let Some(st) = start.take() {
        tokens.push(Token::Label(&s[st..idx]));
      }
      if c == '(' {
        tokens.push(Token::Open);
      } else if c == ')' {
        tokens.push(Token::Close);
      }
    } else if start.is_none() {
      start = Some(idx);
    }
  }
  if let Some(st) = start {
    tokens.push(Token::Label(&s[st..]));
  }
  tokens
}

fn label_node(label: &str) -> Tree {
  match label.strip_suffix('*') {
    Some(stripped) => Tree::foot(stripped),
    None => Tree::leaf(label),
  }
}

fn parse_tree<'a, 'b>(tokens: &'b [Token<'a>]) -> Result<(Tree, &'b [Token<'a>]), TreeError> {
  match tokens.split_first() {
    Some((Token::Label(l), rest)) => Ok((label_node(l), rest)),
    Some((Token::Open, rest)) => {
      let (mut node, mut rest) = match rest.split_first() {
        Some((Token::Label(l), rest)) => (label_node(l), rest),
        _ => return Err(TreeError::MissingLabel),
      };
      loop {
        match rest.split_first() {
          Some((Token::Close, r)) => return Ok((node, r)),
          Some(_) => {
            let (child, r) = parse_tree(rest)?;
            node.children.push(child);
            rest = r;
          }
          None => return Err(TreeError::Unclosed(node.label)),
        }
      }
    }
    Some((Token::Close, _)) => Err(TreeError::UnexpectedClose),
    None => Err(TreeError::Empty),
  }
}

impl FromStr for Tree {
  type Err = TreeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let tokens = tokenize(s);
    let (tree, rest) = parse_tree(&tokens)?;
    if !rest.is_empty() {
      return Err(TreeError::Trailing(tree.to_string()));
    }
    Ok(tree)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn addr(s: &str) -> GornAddress {
    s.parse().unwrap()
  }

  #[test]
  fn test_gorn_addresses() {
    let a = addr("1.2");
    assert_eq!(a.path(), &[1, 2]);
    assert_eq!(a.to_string(), "1.2");
    assert_eq!(a.parent(), Some(addr("1")));
    assert_eq!(a.right_sibling(), Some(addr("1.3")));
    assert_eq!(addr("1").parent(), Some(GornAddress::root()));
    assert_eq!(GornAddress::root().to_string(), "ε");
    assert_eq!(addr("ε"), GornAddress::root());
    assert!(GornAddress::root().right_sibling().is_none());
    assert_eq!(
      "1.0".parse::<GornAddress>(),
      Err(TreeError::ZeroSegment("1.0".to_string()))
    );
    assert!(matches!(
      "x".parse::<GornAddress>(),
      Err(TreeError::BadSegment { ref segment, .. }) if segment == "x"
    ));
  }

  #[test]
  fn test_read_and_print() {
    let t: Tree = "(S (A a) (B b) S*)".parse().unwrap();
    assert_eq!(t.children.len(), 3);
    assert!(t.children[2].foot);
    assert_eq!(t.node(&addr("2.1")).unwrap().label, "b");
    assert_eq!(t.to_string(), "(S (A a) (B b) S*)");
    assert_eq!(t.foot_address(), Some(addr("3")));
  }

  #[test]
  fn test_read_errors() {
    assert_eq!(
      "(S (A a)".parse::<Tree>(),
      Err(TreeError::Unclosed("S".to_string()))
    );
    assert_eq!(
      "(S a) b".parse::<Tree>(),
      Err(TreeError::Trailing("(S a)".to_string()))
    );
    assert_eq!(")".parse::<Tree>(), Err(TreeError::UnexpectedClose));
    assert_eq!("( )".parse::<Tree>(), Err(TreeError::MissingLabel));
    assert_eq!("".parse::<Tree>(), Err(TreeError::Empty));
  }

  #[test]
  fn test_proper_subtree() {
    let t: Tree = "(S (X (S a)) b)".parse().unwrap();
    assert!(t.has_proper_subtree(&"(S a)".parse().unwrap()));
    assert!(t.has_proper_subtree(&Tree::leaf("b")));
    assert!(!t.has_proper_subtree(&t.clone()));
    assert!(!t.has_proper_subtree(&"(X a)".parse().unwrap()));
  }

  #[test]
  fn test_preorder() {
    let t: Tree = "(S (A a) b)".parse().unwrap();
    let labels = t
      .nodes()
      .into_iter()
      .map(|(a, n)| format!("{}:{}", a, n.label))
      .collect::<Vec<_>>();
    assert_eq!(labels, vec!["ε:S", "1:A", "1.1:a", "2:b"]);
  }

  #[test]
  fn test_substitute_leftmost() {
    let t: Tree = "(S A (B A))".parse().unwrap();
    let sub: Tree = "(A x)".parse().unwrap();
    let once = t.substitute_leftmost(&sub).unwrap();
    assert_eq!(once.to_string(), "(S (A x) (B A))");
    let twice = once.substitute_leftmost(&sub).unwrap();
    assert_eq!(twice.to_string(), "(S (A x) (B (A x)))");
    assert!(twice.substitute_leftmost(&sub).is_none());
  }

  #[test]
  fn test_adjoin() {
    let alpha: Tree = "(S (NP john) (VP sleeps))".parse().unwrap();
    let beta: Tree = "(VP (ADV often) VP*)".parse().unwrap();
    let derived = alpha.adjoin(&addr("2"), &beta).unwrap();
    assert_eq!(
      derived.to_string(),
      "(S (NP john) (VP (ADV often) (VP sleeps)))"
    );
    // the foot has been filled
    assert!(derived.foot_address().is_none());
    // label mismatch
    assert!(alpha.adjoin(&addr("1"), &beta).is_none());
  }

  #[test]
  fn test_substitute_at() {
    let alpha: Tree = "(S NP (VP sleeps))".parse().unwrap();
    let np: Tree = "(NP john)".parse().unwrap();
    assert_eq!(
      alpha.substitute(&addr("1"), &np).unwrap().to_string(),
      "(S (NP john) (VP sleeps))"
    );
    assert!(alpha.substitute(&addr("2"), &np).is_none());
  }
}
