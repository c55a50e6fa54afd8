#[macro_use]
extern crate lazy_static;

pub mod algorithm;
pub mod chart;
pub mod deduction;
pub mod error;
pub mod grammar;
pub mod item;
pub mod parse_grammar;
pub mod rules;
pub mod schema;
pub mod trace;
pub mod tree;
pub mod utils;

use crate::algorithm::{Algorithm, AnyGrammar};
use crate::deduction::{DeductionConfig, Outcome, deduce};
pub use crate::utils::Err;

/// Compiles `input` for `algorithm` and runs it with the algorithm's
/// replacement policy. A grammar the algorithm cannot handle is an error.
pub fn recognize(algorithm: Algorithm, grammar: &AnyGrammar, input: &str) -> Result<Outcome, Err> {
  let schema = algorithm.compile(grammar, input)?;
  let outcome = deduce(
    Some(&schema),
    DeductionConfig::with_policy(algorithm.replace_policy()),
  )?;
  Ok(outcome)
}
