use thiserror::Error;

/// Problems reading a grammar file. Errors tied to a line carry its 1-based
/// number.
#[derive(Debug, Error)]
pub enum GrammarError {
  #[error("could not read grammar file: {0}")]
  Io(#[from] std::io::Error),

  #[error("line {line}: declaring {section} twice is not allowed")]
  DuplicateSection { line: usize, section: char },

  #[error("line {line}: unknown section {section:?}")]
  UnknownSection { line: usize, section: String },

  #[error("line {line}: expected quoted entries like \"S\"")]
  MissingQuotes { line: usize },

  #[error("line {line}: malformed rule {rule:?}")]
  MalformedRule { line: usize, rule: String },

  #[error("line {line}: malformed tree {name}: {message}")]
  MalformedTree {
    line: usize,
    name: String,
    message: String,
  },

  #[error("line {line}: {value:?} is not a probability")]
  BadProbability { line: usize, value: String },

  #[error("line {line}: {message} in tree {name}")]
  BadFoot {
    line: usize,
    name: String,
    message: String,
  },

  #[error("grammar has no {0} section")]
  MissingSection(char),

  #[error("unknown grammar file extension {0:?}, expected .cfg, .pcfg or .tag")]
  UnknownExtension(String),
}

/// A bracketed tree or a Gorn address that could not be read
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
  #[error("bad gorn address segment {segment:?} in {address}")]
  BadSegment { segment: String, address: String },

  #[error("gorn address segments start at 1: {0}")]
  ZeroSegment(String),

  #[error("expected a label after (")]
  MissingLabel,

  #[error("unclosed ( after {0}")]
  Unclosed(String),

  #[error("unexpected )")]
  UnexpectedClose,

  #[error("empty tree")]
  Empty,

  #[error("trailing input after tree {0}")]
  Trailing(String),
}

/// A grammar does not fit what an algorithm requires
#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("grammar must be in Chomsky normal form for {0}")]
  NotChomskyNormalForm(String),

  #[error("grammar must be in canonical 2-form for {0}")]
  NotCanonicalTwoForm(String),

  #[error("grammar contains ε-productions, which {0} cannot handle")]
  EmptyProductions(String),

  #[error("grammar is left recursive, which {0} cannot handle")]
  LeftRecursion(String),

  #[error("tree {tree} is not binarized, which {algorithm} requires")]
  NotBinarized { algorithm: String, tree: String },

  #[error("{algorithm} needs a {expected} grammar but got a {found}")]
  GrammarKind {
    algorithm: String,
    expected: String,
    found: String,
  },

  #[error("unknown algorithm {name:?}, expected one of: {known}")]
  UnknownAlgorithm { name: String, known: String },
}

#[derive(Debug, Error)]
pub enum DeductionError {
  #[error("chart grew past its limit of {limit} items")]
  ChartLimit { limit: usize },
}
