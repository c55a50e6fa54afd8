//! Reader for the line-oriented grammar file format:
//!
//! ```text
//! G = <N, T, S, P>
//! N = {"S", "A"}
//! T = {"a", "b"}
//! S = "S"
//! P = {"S -> a S b", "S -> ε"}
//! ```
//!
//! Each line declares one section, named by its first character, and every
//! entry is a double-quoted string. PCFG rules read `"0.5 : S -> a S b"`,
//! TAG sections `I` (initial) and `A` (auxiliary) hold `"name : (S a B*)"`.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::GrammarError;
use crate::grammar::{production, Cfg, Pcfg, Tag};
use crate::rules::{ProductionRule, WeightedRule};
use crate::tree::{Tree, EPSILON};

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

regex_static!(QUOTED, r#""(.*?)""#);
regex_static!(SECTION, r"^(\S+?)\s*=\s*(.*)$");
regex_static!(RULE, r"^\s*(\S+)\s*->\s*(.*?)\s*$");
regex_static!(NAMED, r"^\s*(.+?)\s*:\s*(.+?)\s*$");

#[derive(Debug)]
struct Section {
  line: usize,
  entries: Vec<String>,
}

type Sections = HashMap<char, Section>;

/// Splits a grammar file into its sections. `G` lines only restate the
/// grammar's signature and are skipped, as are blank lines and `//` comments.
fn read_sections(s: &str, allowed: &[char]) -> Result<Sections, GrammarError> {
  let mut sections = Sections::new();

  for (idx, raw) in s.lines().enumerate() {
    let line = idx + 1;
    let text = raw.trim();
    if text.is_empty() || text.starts_with("//") {
      continue;
    }

    let Some(caps) = SECTION.captures(text) else {
      return Err(GrammarError::UnknownSection {
        line,
        section: text.to_string(),
      });
    };
    let name = &caps[1];
    let mut chars = name.chars();
    let head = match (chars.next(), chars.next()) {
      (Some(c), None) => c,
      _ => {
        return Err(GrammarError::UnknownSection {
          line,
          section: name.to_string(),
        })
      }
    };
    if head == 'G' {
      continue;
    }
    if !allowed.contains(&head) {
      return Err(GrammarError::UnknownSection {
        line,
        section: name.to_string(),
      });
    }
    if sections.contains_key(&head) {
      return Err(GrammarError::DuplicateSection {
        line,
        section: head,
      });
    }

    let entries = QUOTED
      .captures_iter(text)
      .map(|c| c[1].to_string())
      .collect::<Vec<_>>();
    let body = caps[2].trim();
    if entries.is_empty() && body != "{}" {
      return Err(GrammarError::MissingQuotes { line });
    }

    sections.insert(head, Section { line, entries });
  }

  Ok(sections)
}

fn needed_section(sections: &Sections, name: char) -> Result<&Section, GrammarError> {
  sections.get(&name).ok_or(GrammarError::MissingSection(name))
}

fn symbols(sections: &Sections, name: char) -> Result<Vec<String>, GrammarError> {
  Ok(needed_section(sections, name)?.entries.clone())
}

fn start_symbol(sections: &Sections) -> Result<String, GrammarError> {
  let section = needed_section(sections, 'S')?;
  match section.entries.as_slice() {
    [start] => Ok(start.clone()),
    _ => Err(GrammarError::MissingQuotes { line: section.line }),
  }
}

/// Parses `A -> X Y Z`. Symbols declared in `nonterminals` become
/// nonterminals, everything else a terminal. `ε` or nothing on the right is
/// the empty production.
fn parse_rule(line: usize, s: &str, nonterminals: &[String]) -> Result<ProductionRule, GrammarError> {
  let caps = RULE.captures(s).ok_or_else(|| GrammarError::MalformedRule {
    line,
    rule: s.to_string(),
  })?;
  let productions = caps[2]
    .split_whitespace()
    .filter(|sym| *sym != EPSILON)
    .map(|sym| production(sym, nonterminals))
    .collect();
  Ok(ProductionRule::new(&caps[1], productions))
}

fn parse_weighted_rule(line: usize, s: &str, nonterminals: &[String]) -> Result<WeightedRule, GrammarError> {
  let caps = NAMED.captures(s).ok_or_else(|| GrammarError::MalformedRule {
    line,
    rule: s.to_string(),
  })?;
  let p = caps[1]
    .parse::<f64>()
    .ok()
    .filter(|p| (0.0..=1.0).contains(p))
    .ok_or_else(|| GrammarError::BadProbability {
      line,
      value: caps[1].to_string(),
    })?;
  let rule = parse_rule(line, &caps[2], nonterminals)?;
  Ok(WeightedRule { rule, p })
}

fn parse_named_tree(line: usize, s: &str) -> Result<(String, Tree), GrammarError> {
  let caps = NAMED.captures(s).ok_or_else(|| GrammarError::MalformedTree {
    line,
    name: s.to_string(),
    message: "expected name : tree".to_string(),
  })?;
  let name = caps[1].to_string();
  let tree = Tree::from_str(&caps[2]).map_err(|e| GrammarError::MalformedTree {
    line,
    name: name.clone(),
    message: e.to_string(),
  })?;
  Ok((name, tree))
}

fn bad_foot(line: usize, name: &str, message: &str) -> GrammarError {
  GrammarError::BadFoot {
    line,
    name: name.to_string(),
    message: message.to_string(),
  }
}

fn read_trees(
  section: Option<&Section>,
  auxiliary: bool,
  trees: &mut BTreeMap<String, Tree>,
  seen: &mut BTreeMap<String, usize>,
) -> Result<(), GrammarError> {
  let Some(section) = section else {
    return Ok(());
  };
  let line = section.line;
  for entry in section.entries.iter() {
    let (name, tree) = parse_named_tree(line, entry)?;
    let feet = tree.nodes().iter().filter(|(_, n)| n.foot).count();
    if auxiliary {
      if feet != 1 {
        return Err(bad_foot(line, &name, "auxiliary trees need exactly one foot"));
      }
      let foot_label = tree
        .foot_address()
        .and_then(|a| tree.node(&a))
        .map(|n| n.label.as_str());
      if foot_label != Some(tree.label.as_str()) {
        return Err(bad_foot(line, &name, "foot label must match the root"));
      }
    } else if feet != 0 {
      return Err(bad_foot(line, &name, "initial trees have no foot"));
    }
    if seen.insert(name.clone(), line).is_some() {
      return Err(GrammarError::MalformedTree {
        line,
        name,
        message: "tree name declared twice".to_string(),
      });
    }
    trees.insert(name, tree);
  }
  Ok(())
}

impl FromStr for Cfg {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let sections = read_sections(s, &['N', 'T', 'S', 'P'])?;
    let nonterminals = symbols(&sections, 'N')?;
    let terminals = symbols(&sections, 'T')?;
    let start = start_symbol(&sections)?;
    let productions = needed_section(&sections, 'P')?;
    let rules = productions
      .entries
      .iter()
      .map(|r| parse_rule(productions.line, r, &nonterminals))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Cfg::new(nonterminals, terminals, start, rules))
  }
}

impl FromStr for Pcfg {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let sections = read_sections(s, &['N', 'T', 'S', 'P'])?;
    let nonterminals = symbols(&sections, 'N')?;
    let terminals = symbols(&sections, 'T')?;
    let start = start_symbol(&sections)?;
    let productions = needed_section(&sections, 'P')?;
    let rules = productions
      .entries
      .iter()
      .map(|r| parse_weighted_rule(productions.line, r, &nonterminals))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Pcfg {
      start,
      nonterminals,
      terminals,
      rules,
    })
  }
}

impl FromStr for Tag {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let sections = read_sections(s, &['N', 'T', 'S', 'I', 'A'])?;
    let nonterminals = symbols(&sections, 'N')?;
    let terminals = symbols(&sections, 'T')?;
    let start = start_symbol(&sections)?;
    needed_section(&sections, 'I')?;

    let mut seen = BTreeMap::new();
    let mut initial = BTreeMap::new();
    let mut auxiliary = BTreeMap::new();
    read_trees(sections.get(&'I'), false, &mut initial, &mut seen)?;
    read_trees(sections.get(&'A'), true, &mut auxiliary, &mut seen)?;

    Ok(Tag {
      start,
      nonterminals,
      terminals,
      initial,
      auxiliary,
    })
  }
}

fn read_file<T: FromStr<Err = GrammarError>>(path: &Path) -> Result<T, GrammarError> {
  fs::read_to_string(path)?.parse()
}

impl Cfg {
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    read_file(path.as_ref())
  }
}

impl Pcfg {
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    read_file(path.as_ref())
  }
}

impl Tag {
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    read_file(path.as_ref())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  macro_rules! grammar_file {
    ($filename:expr) => {
      include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/grammars/", $filename))
    };
  }

  #[test]
  fn test_read_cfg() {
    let g: Cfg = r#"
      G = <N, T, S, P>
      N = {"S"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> a S b", "S -> ε", "S ->"}
    "#
    .parse()
    .unwrap();
    assert_eq!(g.start, "S");
    assert_eq!(g.terminals, vec!["a", "b"]);
    assert_eq!(g.rules.len(), 3);
    assert_eq!(g.rules[0].to_string(), "S -> a S b");
    assert!(g.rules[0].productions[1].is_nonterminal());
    assert!(g.rules[0].productions[0].is_terminal());
    assert!(g.rules[1].is_empty());
    assert!(g.rules[2].is_empty());
  }

  #[test]
  fn test_duplicate_section_reports_line() {
    let err = r#"N = {"S"}
T = {"a"}
N = {"A"}
S = "S"
P = {"S -> a"}"#
      .parse::<Cfg>()
      .unwrap_err();
    assert!(matches!(
      err,
      GrammarError::DuplicateSection {
        line: 3,
        section: 'N'
      }
    ));
    assert_eq!(err.to_string(), "line 3: declaring N twice is not allowed");
  }

  #[test]
  fn test_errors() {
    let unknown = "N = {\"S\"}\nQ = {\"x\"}".parse::<Cfg>().unwrap_err();
    assert!(matches!(unknown, GrammarError::UnknownSection { line: 2, .. }));

    let unquoted = "N = {S}".parse::<Cfg>().unwrap_err();
    assert!(matches!(unquoted, GrammarError::MissingQuotes { line: 1 }));

    let missing = "N = {\"S\"}\nT = {\"a\"}\nS = \"S\"".parse::<Cfg>().unwrap_err();
    assert!(matches!(missing, GrammarError::MissingSection('P')));

    let rule = "N = {\"S\"}\nT = {\"a\"}\nS = \"S\"\nP = {\"S a\"}"
      .parse::<Cfg>()
      .unwrap_err();
    assert!(matches!(rule, GrammarError::MalformedRule { line: 4, .. }));

    let prob = "N = {\"S\"}\nT = {\"a\"}\nS = \"S\"\nP = {\"1.5 : S -> a\"}"
      .parse::<Pcfg>()
      .unwrap_err();
    assert!(matches!(prob, GrammarError::BadProbability { line: 4, .. }));
  }

  #[test]
  fn test_read_pcfg() {
    let g: Pcfg = grammar_file!("ab.pcfg").parse().unwrap();
    assert_eq!(g.rules.len(), 4);
    assert_eq!(g.rules[2].p, 0.3);
    assert_eq!(g.rules[2].rule.to_string(), "S -> A B");
  }

  #[test]
  fn test_read_tag() {
    let g: Tag = grammar_file!("anb.tag").parse().unwrap();
    assert_eq!(g.initial.len(), 1);
    assert_eq!(g.auxiliary.len(), 1);
    assert_eq!(g.auxiliary["β"].to_string(), "(S a S*)");

    let footless = "N = {\"S\"}\nT = {\"a\"}\nS = \"S\"\nI = {\"α : (S a)\"}\nA = {\"β : (S a)\"}"
      .parse::<Tag>()
      .unwrap_err();
    assert!(matches!(footless, GrammarError::BadFoot { line: 5, .. }));

    let broken = "N = {\"S\"}\nT = {\"a\"}\nS = \"S\"\nI = {\"α : (S a\"}"
      .parse::<Tag>()
      .unwrap_err();
    assert!(matches!(broken, GrammarError::MalformedTree { line: 4, .. }));
  }

  #[test]
  fn test_grammar_files_load() {
    grammar_file!("anbn.cfg").parse::<Cfg>().unwrap();
    grammar_file!("arith.cfg").parse::<Cfg>().unwrap();
    grammar_file!("ab.pcfg").parse::<Pcfg>().unwrap();
    grammar_file!("anb.tag").parse::<Tag>().unwrap();
    grammar_file!("sleeps.tag").parse::<Tag>().unwrap();
  }

  #[test]
  fn test_missing_file() {
    let err = Cfg::read_from_file("/nonexistent/grammar.cfg").unwrap_err();
    assert!(matches!(err, GrammarError::Io(_)));
  }
}
