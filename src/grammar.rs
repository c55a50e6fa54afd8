use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::rules::{Production, ProductionRule, Symbol, WeightedRule};
use crate::tree::{GornAddress, Tree};

/// A context-free grammar. Rules keep their file order.
#[derive(Debug, Clone)]
pub struct Cfg {
  pub start: String,
  pub nonterminals: Vec<String>,
  pub terminals: Vec<String>,
  pub rules: Vec<Rc<ProductionRule>>,
  nullables: HashSet<String>,
}

impl Cfg {
  pub fn new(
    nonterminals: Vec<String>,
    terminals: Vec<String>,
    start: String,
    rules: Vec<ProductionRule>,
  ) -> Self {
    let rules = rules.into_iter().map(Rc::new).collect::<Vec<_>>();
    let nullables = Self::find_nullables(&rules);
    Self {
      start,
      nonterminals,
      terminals,
      rules,
      nullables,
    }
  }

  fn rule_is_nullable(nullables: &HashSet<String>, rule: &ProductionRule) -> bool {
    rule.is_empty()
      || rule.productions.iter().all(|p| match p {
        Production::Nonterminal(s) => nullables.contains(&s.name),
        Production::Terminal(_) => false,
      })
  }

  fn find_nullables(rules: &[Rc<ProductionRule>]) -> HashSet<String> {
    let mut nullables: HashSet<String> = HashSet::new();

    let mut last_length = 1;
    while last_length != nullables.len() {
      last_length = nullables.len();
      for r in rules.iter() {
        if !nullables.contains(&r.symbol.name) && Self::rule_is_nullable(&nullables, r) {
          nullables.insert(r.symbol.name.clone());
        }
      }
    }

    nullables
  }

  pub fn is_nullable(&self, s: &str) -> bool {
    self.nullables.contains(s)
  }

  pub fn is_nonterminal(&self, s: &str) -> bool {
    self.nonterminals.iter().any(|n| n == s)
  }

  pub fn is_terminal(&self, s: &str) -> bool {
    self.terminals.iter().any(|t| t == s)
  }

  pub fn rules_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a Rc<ProductionRule>> {
    self.rules.iter().filter(move |r| r.symbol_str() == symbol)
  }

  pub fn has_epsilon_productions(&self) -> bool {
    self.rules.iter().any(|r| r.is_empty())
  }

  /// Whether some nonterminal A derives A α in one or more steps. Nullable
  /// prefixes are looked through.
  pub fn has_left_recursion(&self) -> bool {
    let mut corners: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in self.rules.iter() {
      let entry = corners.entry(r.symbol_str()).or_default();
      for p in r.productions.iter() {
        match p {
          Production::Nonterminal(s) => {
            entry.insert(s.name.as_str());
            if !self.is_nullable(&s.name) {
              break;
            }
          }
          Production::Terminal(_) => break,
        }
      }
    }

    corners.keys().any(|&start| {
      let mut seen = HashSet::new();
      let mut stack = corners[start].iter().copied().collect::<Vec<_>>();
      while let Some(next) = stack.pop() {
        if next == start {
          return true;
        }
        if seen.insert(next) {
          if let Some(more) = corners.get(next) {
            stack.extend(more.iter().copied());
          }
        }
      }
      false
    })
  }

  fn start_on_rhs(&self) -> bool {
    self
      .rules
      .iter()
      .any(|r| r.rhs_symbols().any(|s| s == self.start))
  }

  /// S -> ε is tolerated as long as S never appears on a right-hand side
  fn is_allowed_epsilon(&self, rule: &ProductionRule) -> bool {
    rule.is_empty() && rule.symbol_str() == self.start && !self.start_on_rhs()
  }

  pub fn is_in_chomsky_normal_form(&self) -> bool {
    self
      .rules
      .iter()
      .all(|r| r.is_binary_nonterminal() || r.is_lexical() || self.is_allowed_epsilon(r))
  }

  /// Like Chomsky normal form, but chain rules `A -> B` are allowed as well
  pub fn is_in_canonical_two_form(&self) -> bool {
    self.rules.iter().all(|r| {
      r.is_binary_nonterminal()
        || r.is_unary_nonterminal()
        || r.is_lexical()
        || self.is_allowed_epsilon(r)
    })
  }
}

fn write_section(f: &mut fmt::Formatter<'_>, name: char, items: &[String]) -> fmt::Result {
  let quoted = items
    .iter()
    .map(|s| format!("\"{}\"", s))
    .collect::<Vec<_>>()
    .join(", ");
  writeln!(f, "{} = {{{}}}", name, quoted)
}

/// Written back in the same format the reader accepts
impl fmt::Display for Cfg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "G = <N, T, S, P>")?;
    write_section(f, 'N', &self.nonterminals)?;
    write_section(f, 'T', &self.terminals)?;
    writeln!(f, "S = \"{}\"", self.start)?;
    let rules = self.rules.iter().map(|r| r.to_string()).collect::<Vec<_>>();
    write_section(f, 'P', &rules)
  }
}

/// A probabilistic context-free grammar
#[derive(Debug, Clone)]
pub struct Pcfg {
  pub start: String,
  pub nonterminals: Vec<String>,
  pub terminals: Vec<String>,
  pub rules: Vec<WeightedRule>,
}

impl Pcfg {
  /// The underlying CFG with the probabilities dropped
  pub fn to_cfg(&self) -> Cfg {
    Cfg::new(
      self.nonterminals.clone(),
      self.terminals.clone(),
      self.start.clone(),
      self.rules.iter().map(|r| r.rule.clone()).collect(),
    )
  }
}

/// Every rule of a left-hand side gets the same share of probability
impl From<&Cfg> for Pcfg {
  fn from(cfg: &Cfg) -> Self {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in cfg.rules.iter() {
      *counts.entry(r.symbol_str()).or_default() += 1;
    }
    let rules = cfg
      .rules
      .iter()
      .map(|r| WeightedRule {
        rule: (**r).clone(),
        p: 1.0 / counts[r.symbol_str()] as f64,
      })
      .collect();
    Self {
      start: cfg.start.clone(),
      nonterminals: cfg.nonterminals.clone(),
      terminals: cfg.terminals.clone(),
      rules,
    }
  }
}

impl fmt::Display for Pcfg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "G = <N, T, S, P>")?;
    write_section(f, 'N', &self.nonterminals)?;
    write_section(f, 'T', &self.terminals)?;
    writeln!(f, "S = \"{}\"", self.start)?;
    let rules = self.rules.iter().map(|r| r.to_string()).collect::<Vec<_>>();
    write_section(f, 'P', &rules)
  }
}

/// A tree-adjoining grammar. Auxiliary trees carry exactly one foot node
/// whose label matches their root.
#[derive(Debug, Clone)]
pub struct Tag {
  pub start: String,
  pub nonterminals: Vec<String>,
  pub terminals: Vec<String>,
  pub initial: BTreeMap<String, Tree>,
  pub auxiliary: BTreeMap<String, Tree>,
}

impl Tag {
  pub fn tree(&self, name: &str) -> Option<&Tree> {
    self.initial.get(name).or_else(|| self.auxiliary.get(name))
  }

  /// Initial trees first, then auxiliary trees, each by name
  pub fn trees(&self) -> impl Iterator<Item = (&String, &Tree)> {
    self.initial.iter().chain(self.auxiliary.iter())
  }

  pub fn is_initial(&self, name: &str) -> bool {
    self.initial.contains_key(name)
  }

  pub fn is_nonterminal(&self, s: &str) -> bool {
    self.nonterminals.iter().any(|n| n == s)
  }

  pub fn is_terminal(&self, s: &str) -> bool {
    self.terminals.iter().any(|t| t == s)
  }

  pub fn node(&self, tree: &str, addr: &GornAddress) -> Option<&Tree> {
    self.tree(tree)?.node(addr)
  }

  pub fn foot(&self, aux: &str) -> Option<GornAddress> {
    self.auxiliary.get(aux)?.foot_address()
  }

  /// A nonterminal leaf that is not a foot
  pub fn is_substitution_node(&self, tree: &str, addr: &GornAddress) -> bool {
    self
      .node(tree, addr)
      .is_some_and(|n| n.is_leaf() && !n.foot && self.is_nonterminal(&n.label))
  }

  /// All substitution nodes, in tree order
  pub fn substitution_nodes(&self) -> Vec<(String, GornAddress)> {
    let mut out = Vec::new();
    for (name, tree) in self.trees() {
      for (addr, _) in tree.nodes() {
        if self.is_substitution_node(name, &addr) {
          out.push((name.clone(), addr));
        }
      }
    }
    out
  }

  /// Whether `aux` may adjoin at the node `addr` of `tree`: the node must be
  /// an inner node carrying the auxiliary tree's root label.
  pub fn is_adjoinable(&self, aux: &str, tree: &str, addr: &GornAddress) -> bool {
    let Some(beta) = self.auxiliary.get(aux) else {
      return false;
    };
    self
      .node(tree, addr)
      .is_some_and(|n| !n.is_leaf() && n.label == beta.label)
  }

  /// The first tree with a node of more than two children
  pub fn unbinarized_tree(&self) -> Option<&str> {
    self
      .trees()
      .find(|(_, t)| t.nodes().iter().any(|(_, n)| n.children.len() > 2))
      .map(|(name, _)| name.as_str())
  }
}

/// Every production becomes an initial tree: `A -> B c` yields `(A B c)`
/// with `B` a substitution node.
impl From<&Cfg> for Tag {
  fn from(cfg: &Cfg) -> Self {
    let initial = cfg
      .rules
      .iter()
      .enumerate()
      .map(|(idx, r)| (format!("α{}", idx + 1), Tree::from_production(r)))
      .collect();
    Self {
      start: cfg.start.clone(),
      nonterminals: cfg.nonterminals.clone(),
      terminals: cfg.terminals.clone(),
      initial,
      auxiliary: BTreeMap::new(),
    }
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "G = <N, T, I, A, S>")?;
    write_section(f, 'N', &self.nonterminals)?;
    write_section(f, 'T', &self.terminals)?;
    let named = |trees: &BTreeMap<String, Tree>| {
      trees
        .iter()
        .map(|(name, t)| format!("{} : {}", name, t))
        .collect::<Vec<_>>()
    };
    write_section(f, 'I', &named(&self.initial))?;
    write_section(f, 'A', &named(&self.auxiliary))?;
    writeln!(f, "S = \"{}\"", self.start)
  }
}

/// Symbol constructor shared by the grammar readers
pub(crate) fn production(symbol: &str, nonterminals: &[String]) -> Production {
  if nonterminals.iter().any(|n| n == symbol) {
    Production::Nonterminal(Symbol::new(symbol.to_string()))
  } else {
    Production::Terminal(symbol.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg(s: &str) -> Cfg {
    s.parse().unwrap()
  }

  #[test]
  fn test_nullables() {
    let g = cfg(
      r#"
      N = {"S", "A", "B"}
      T = {"a"}
      S = "S"
      P = {"S -> A B", "A -> ε", "B -> A", "B -> a"}
      "#,
    );
    assert!(g.is_nullable("A"));
    assert!(g.is_nullable("B"));
    assert!(g.is_nullable("S"));
    assert!(g.has_epsilon_productions());
  }

  #[test]
  fn test_left_recursion() {
    let direct = cfg(
      r#"
      N = {"S"}
      T = {"a"}
      S = "S"
      P = {"S -> S a", "S -> a"}
      "#,
    );
    assert!(direct.has_left_recursion());

    let indirect = cfg(
      r#"
      N = {"S", "A"}
      T = {"a"}
      S = "S"
      P = {"S -> A a", "A -> S a", "A -> a"}
      "#,
    );
    assert!(indirect.has_left_recursion());

    let hidden = cfg(
      r#"
      N = {"S", "E"}
      T = {"a"}
      S = "S"
      P = {"S -> E S a", "S -> a", "E -> ε"}
      "#,
    );
    assert!(hidden.has_left_recursion());

    let anbn = cfg(
      r#"
      N = {"S"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> a S b", "S -> ε"}
      "#,
    );
    assert!(!anbn.has_left_recursion());
  }

  #[test]
  fn test_normal_forms() {
    let cnf = cfg(
      r#"
      N = {"S", "A", "B"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> A B", "A -> a", "B -> b"}
      "#,
    );
    assert!(cnf.is_in_chomsky_normal_form());
    assert!(cnf.is_in_canonical_two_form());

    let chain = cfg(
      r#"
      N = {"S", "A"}
      T = {"a"}
      S = "S"
      P = {"S -> A", "A -> a"}
      "#,
    );
    assert!(!chain.is_in_chomsky_normal_form());
    assert!(chain.is_in_canonical_two_form());

    let eps_under_start = cfg(
      r#"
      N = {"S", "A"}
      T = {"a"}
      S = "S"
      P = {"S -> A S", "S -> ε", "A -> a"}
      "#,
    );
    assert!(!eps_under_start.is_in_chomsky_normal_form());
  }

  #[test]
  fn test_uniform_pcfg() {
    let g = cfg(
      r#"
      N = {"S", "A"}
      T = {"a"}
      S = "S"
      P = {"S -> A A", "S -> A", "A -> a"}
      "#,
    );
    let p = Pcfg::from(&g);
    assert_eq!(p.rules[0].p, 0.5);
    assert_eq!(p.rules[2].p, 1.0);
    assert_eq!(p.to_cfg().rules.len(), 3);
  }

  #[test]
  fn test_display_round_trips() {
    let g = cfg(
      r#"
      N = {"S"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> a S b", "S -> ε"}
      "#,
    );
    let again: Cfg = g.to_string().parse().unwrap();
    assert_eq!(again.rules, g.rules);
    assert_eq!(again.start, "S");
  }

  #[test]
  fn test_tag_from_cfg() {
    let g = cfg(
      r#"
      N = {"S", "A"}
      T = {"a"}
      S = "S"
      P = {"S -> A a", "A -> a"}
      "#,
    );
    let tag = Tag::from(&g);
    assert_eq!(tag.initial["α1"].to_string(), "(S A a)");
    assert!(tag.is_substitution_node("α1", &GornAddress::root().child(1)));
    assert!(!tag.is_substitution_node("α1", &GornAddress::root().child(2)));
    assert_eq!(tag.substitution_nodes().len(), 1);
    assert_eq!(tag.unbinarized_tree(), None);
  }

  #[test]
  fn test_adjoinable() {
    let tag: Tag = r#"
      N = {"S", "A"}
      T = {"a", "b"}
      S = "S"
      I = {"α : (S (A a) b)"}
      A = {"β : (A b A*)", "γ : (S a S* b)"}
      "#
    .parse()
    .unwrap();
    let one = GornAddress::root().child(1);
    assert!(tag.is_adjoinable("β", "α", &one));
    assert!(!tag.is_adjoinable("β", "α", &GornAddress::root()));
    assert!(tag.is_adjoinable("γ", "α", &GornAddress::root()));
    // a leaf, even if the label matches
    assert!(!tag.is_adjoinable("β", "β", &GornAddress::root().child(2)));
    assert!(!tag.is_adjoinable("α", "α", &one));
    assert!(!tag.is_initial("β"));
    assert_eq!(tag.foot("β"), Some(GornAddress::root().child(2)));
    assert_eq!(tag.unbinarized_tree(), Some("γ"));
  }
}
