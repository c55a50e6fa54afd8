//! Algorithm identifiers and the routing from a loaded grammar to the matching
//! schema compiler.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::warn;

use crate::deduction::ReplacePolicy;
use crate::error::{GrammarError, SchemaError};
use crate::grammar::{Cfg, Pcfg, Tag};
use crate::schema::{self, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
  CfgTopDown,
  CfgShiftReduce,
  CfgEarley,
  CfgLeftCorner,
  CfgCyk,
  CfgCykExtended,
  CfgCykGeneral,
  CfgUnger,
  CfgLrK,
  PcfgCyk,
  PcfgAstar,
  TagCyk,
  TagEarley,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarKind {
  Cfg,
  Pcfg,
  Tag,
}

impl GrammarKind {
  /// Picks the kind from a `.cfg`, `.pcfg` or `.tag` extension
  pub fn from_path(path: &Path) -> Result<Self, GrammarError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
      "cfg" => Ok(Self::Cfg),
      "pcfg" => Ok(Self::Pcfg),
      "tag" => Ok(Self::Tag),
      _ => Err(GrammarError::UnknownExtension(ext.to_string())),
    }
  }
}

impl fmt::Display for GrammarKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Cfg => write!(f, "cfg"),
      Self::Pcfg => write!(f, "pcfg"),
      Self::Tag => write!(f, "tag"),
    }
  }
}

/// A grammar of any supported formalism
#[derive(Debug, Clone)]
pub enum AnyGrammar {
  Cfg(Cfg),
  Pcfg(Pcfg),
  Tag(Tag),
}

impl AnyGrammar {
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    let path = path.as_ref();
    Ok(match GrammarKind::from_path(path)? {
      GrammarKind::Cfg => Self::Cfg(Cfg::read_from_file(path)?),
      GrammarKind::Pcfg => Self::Pcfg(Pcfg::read_from_file(path)?),
      GrammarKind::Tag => Self::Tag(Tag::read_from_file(path)?),
    })
  }

  pub fn kind(&self) -> GrammarKind {
    match self {
      Self::Cfg(_) => GrammarKind::Cfg,
      Self::Pcfg(_) => GrammarKind::Pcfg,
      Self::Tag(_) => GrammarKind::Tag,
    }
  }
}

impl From<Cfg> for AnyGrammar {
  fn from(g: Cfg) -> Self {
    Self::Cfg(g)
  }
}

impl From<Pcfg> for AnyGrammar {
  fn from(g: Pcfg) -> Self {
    Self::Pcfg(g)
  }
}

impl From<Tag> for AnyGrammar {
  fn from(g: Tag) -> Self {
    Self::Tag(g)
  }
}

impl Algorithm {
  pub const ALL: [Algorithm; 13] = [
    Self::CfgTopDown,
    Self::CfgShiftReduce,
    Self::CfgEarley,
    Self::CfgLeftCorner,
    Self::CfgCyk,
    Self::CfgCykExtended,
    Self::CfgCykGeneral,
    Self::CfgUnger,
    Self::CfgLrK,
    Self::PcfgCyk,
    Self::PcfgAstar,
    Self::TagCyk,
    Self::TagEarley,
  ];

  pub fn id(self) -> &'static str {
    match self {
      Self::CfgTopDown => "cfg-topdown",
      Self::CfgShiftReduce => "cfg-shiftreduce",
      Self::CfgEarley => "cfg-earley",
      Self::CfgLeftCorner => "cfg-leftcorner",
      Self::CfgCyk => "cfg-cyk",
      Self::CfgCykExtended => "cfg-cyk-extended",
      Self::CfgCykGeneral => "cfg-cyk-general",
      Self::CfgUnger => "cfg-unger",
      Self::CfgLrK => "cfg-lr-k",
      Self::PcfgCyk => "pcfg-cyk",
      Self::PcfgAstar => "pcfg-astar",
      Self::TagCyk => "tag-cyk",
      Self::TagEarley => "tag-earley",
    }
  }

  /// The formalism the compiler works on. Grammars of a weaker formalism are
  /// converted before compiling.
  pub fn grammar_kind(self) -> GrammarKind {
    match self {
      Self::PcfgCyk | Self::PcfgAstar => GrammarKind::Pcfg,
      Self::TagCyk | Self::TagEarley => GrammarKind::Tag,
      _ => GrammarKind::Cfg,
    }
  }

  pub fn replace_policy(self) -> ReplacePolicy {
    match self {
      Self::PcfgCyk => ReplacePolicy::HigherWins,
      Self::PcfgAstar => ReplacePolicy::LowerWins,
      _ => ReplacePolicy::Accumulate,
    }
  }

  /// Builds the schema for `input`, a whitespace-separated token string
  pub fn compile(self, grammar: &AnyGrammar, input: &str) -> Result<Schema, SchemaError> {
    let tokens = input.split_whitespace().map(String::from).collect::<Vec<_>>();
    let result = self.compile_tokens(grammar, &tokens);
    if let Err(e) = &result {
      warn!(algorithm = %self, "{}", e);
    }
    result
  }

  fn compile_tokens(self, grammar: &AnyGrammar, tokens: &[String]) -> Result<Schema, SchemaError> {
    match self.grammar_kind() {
      GrammarKind::Cfg => {
        let converted;
        let cfg = match grammar {
          AnyGrammar::Cfg(cfg) => cfg,
          AnyGrammar::Pcfg(pcfg) => {
            converted = pcfg.to_cfg();
            &converted
          }
          AnyGrammar::Tag(_) => return Err(self.kind_mismatch(grammar.kind())),
        };
        self.compile_cfg(cfg, tokens)
      }
      GrammarKind::Pcfg => {
        let converted;
        let pcfg = match grammar {
          AnyGrammar::Pcfg(pcfg) => pcfg,
          AnyGrammar::Cfg(cfg) => {
            converted = Pcfg::from(cfg);
            &converted
          }
          AnyGrammar::Tag(_) => return Err(self.kind_mismatch(grammar.kind())),
        };
        match self {
          Self::PcfgAstar => schema::pcfg::astar(pcfg, tokens),
          _ => schema::pcfg::cyk(pcfg, tokens),
        }
      }
      GrammarKind::Tag => {
        let converted;
        let tag = match grammar {
          AnyGrammar::Tag(tag) => tag,
          AnyGrammar::Cfg(cfg) => {
            converted = Tag::from(cfg);
            &converted
          }
          AnyGrammar::Pcfg(pcfg) => {
            converted = Tag::from(&pcfg.to_cfg());
            &converted
          }
        };
        match self {
          Self::TagCyk => schema::tag::cyk(tag, tokens),
          _ => schema::tag::earley(tag, tokens),
        }
      }
    }
  }

  fn compile_cfg(self, cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
    use schema::cfg;
    match self {
      Self::CfgTopDown => cfg::topdown(cfg, tokens),
      Self::CfgShiftReduce => cfg::shift_reduce(cfg, tokens),
      Self::CfgEarley => cfg::earley(cfg, tokens),
      Self::CfgLeftCorner => cfg::left_corner(cfg, tokens),
      Self::CfgCyk => cfg::cyk(cfg, tokens),
      Self::CfgCykExtended => cfg::cyk_extended(cfg, tokens),
      Self::CfgCykGeneral => cfg::cyk_general(cfg, tokens),
      Self::CfgUnger => cfg::unger(cfg, tokens),
      Self::CfgLrK => cfg::lr_k(cfg, tokens),
      other => Err(other.kind_mismatch(GrammarKind::Cfg)),
    }
  }

  fn kind_mismatch(self, found: GrammarKind) -> SchemaError {
    SchemaError::GrammarKind {
      algorithm: self.to_string(),
      expected: self.grammar_kind().to_string(),
      found: found.to_string(),
    }
  }
}

impl fmt::Display for Algorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.id())
  }
}

impl FromStr for Algorithm {
  type Err = SchemaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .copied()
      .find(|a| a.id() == s)
      .ok_or_else(|| SchemaError::UnknownAlgorithm {
        name: s.to_string(),
        known: Self::ALL
          .iter()
          .map(|a| a.id())
          .collect::<Vec<_>>()
          .join(", "),
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ids_round_trip() {
    for a in Algorithm::ALL {
      assert_eq!(a.id().parse::<Algorithm>().unwrap(), a);
    }
  }

  #[test]
  fn test_unknown_algorithm() {
    let err = "cfg-lr".parse::<Algorithm>().unwrap_err();
    assert!(matches!(err, SchemaError::UnknownAlgorithm { ref name, .. } if name == "cfg-lr"));
    assert!(err.to_string().contains("cfg-earley"));
  }

  #[test]
  fn test_grammar_kind_from_path() {
    assert_eq!(
      GrammarKind::from_path(Path::new("grammars/anbn.cfg")).unwrap(),
      GrammarKind::Cfg
    );
    assert_eq!(
      GrammarKind::from_path(Path::new("x.pcfg")).unwrap(),
      GrammarKind::Pcfg
    );
    assert!(matches!(
      GrammarKind::from_path(Path::new("x.txt")),
      Err(GrammarError::UnknownExtension(_))
    ));
  }

  #[test]
  fn test_tag_grammar_rejected_by_cfg_algorithms() {
    let tag: Tag = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/grammars/anb.tag"))
      .parse()
      .unwrap();
    let err = Algorithm::CfgEarley
      .compile(&AnyGrammar::Tag(tag), "a b")
      .unwrap_err();
    assert!(matches!(err, SchemaError::GrammarKind { .. }));
    assert_eq!(
      err.to_string(),
      "cfg-earley needs a cfg grammar but got a tag"
    );
  }

  #[test]
  fn test_policies() {
    assert_eq!(Algorithm::PcfgCyk.replace_policy(), ReplacePolicy::HigherWins);
    assert_eq!(Algorithm::PcfgAstar.replace_policy(), ReplacePolicy::LowerWins);
    assert_eq!(Algorithm::CfgCyk.replace_policy(), ReplacePolicy::Accumulate);
  }
}
