use std::fmt;

use crate::tree::EPSILON;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: String) -> Self {
    Self { name }
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Production {
  Terminal(String),
  Nonterminal(Symbol),
}

impl Production {
  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => &s.name,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal(_))
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Self::Nonterminal(_))
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) => write!(f, "{}", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

/// A context-free production `symbol -> productions`. An empty right-hand
/// side is the ε-production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionRule {
  pub symbol: Symbol,
  pub productions: Vec<Production>,
}

impl ProductionRule {
  pub fn new(symbol: &str, productions: Vec<Production>) -> Self {
    Self {
      symbol: Symbol::new(symbol.to_string()),
      productions,
    }
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn symbol_str(&self) -> &str {
    &self.symbol.name
  }

  pub fn rhs_symbols(&self) -> impl Iterator<Item = &str> {
    self.productions.iter().map(Production::symbol_str)
  }

  /// `A -> B C`
  pub fn is_binary_nonterminal(&self) -> bool {
    self.len() == 2 && self.productions.iter().all(Production::is_nonterminal)
  }

  /// `A -> B`
  pub fn is_unary_nonterminal(&self) -> bool {
    self.len() == 1 && self.productions[0].is_nonterminal()
  }

  /// `A -> a`
  pub fn is_lexical(&self) -> bool {
    self.len() == 1 && self.productions[0].is_terminal()
  }
}

impl fmt::Display for ProductionRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    if self.is_empty() {
      return write!(f, " {}", EPSILON);
    }
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    Ok(())
  }
}

/// A production with a probability attached, as found in a PCFG
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRule {
  pub rule: ProductionRule,
  pub p: f64,
}

impl fmt::Display for WeightedRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} : {}", self.p, self.rule)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn nt(s: &str) -> Production {
    Production::Nonterminal(Symbol::new(s.to_string()))
  }

  fn t(s: &str) -> Production {
    Production::Terminal(s.to_string())
  }

  #[test]
  fn test_display() {
    let r = ProductionRule::new("S", vec![t("a"), nt("S"), t("b")]);
    assert_eq!(r.to_string(), "S -> a S b");
    assert_eq!(ProductionRule::new("S", vec![]).to_string(), "S -> ε");
    let w = WeightedRule { rule: r, p: 0.5 };
    assert_eq!(w.to_string(), "0.5 : S -> a S b");
  }

  #[test]
  fn test_shapes() {
    assert!(ProductionRule::new("S", vec![nt("A"), nt("B")]).is_binary_nonterminal());
    assert!(!ProductionRule::new("S", vec![nt("A"), t("b")]).is_binary_nonterminal());
    assert!(ProductionRule::new("S", vec![nt("A")]).is_unary_nonterminal());
    assert!(ProductionRule::new("A", vec![t("a")]).is_lexical());
  }
}
