//! Tabular rendering of a chart: one row per entry with the rules and
//! backpointers that derived it.

use std::fmt;

use crate::chart::{Chart, ChartEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
  /// 1-based chart position
  pub id: usize,
  pub item: String,
  pub rules: String,
  pub backpointers: String,
}

impl TraceRow {
  fn from_entry(idx: usize, entry: &ChartEntry) -> Self {
    let rules = entry
      .derivations
      .iter()
      .map(|d| d.rule.as_str())
      .collect::<Vec<_>>()
      .join(", ");
    let backpointers = entry
      .derivations
      .iter()
      .map(|d| {
        let ids = d
          .backpointers
          .iter()
          .map(|b| (b + 1).to_string())
          .collect::<Vec<_>>()
          .join(", ");
        format!("{{{}}}", ids)
      })
      .collect::<Vec<_>>()
      .join(", ");
    Self {
      id: idx + 1,
      item: entry.item.to_string(),
      rules,
      backpointers,
    }
  }

  fn cells(&self) -> [String; 4] {
    [
      self.id.to_string(),
      self.item.clone(),
      self.rules.clone(),
      self.backpointers.clone(),
    ]
  }
}

#[derive(Debug, Clone, Default)]
pub struct Trace {
  rows: Vec<TraceRow>,
}

const HEADER: [&str; 4] = ["Id", "Item", "Rules", "Backpointers"];
const PADDING: usize = 3;

impl Trace {
  pub fn full(chart: &Chart) -> Self {
    Self {
      rows: chart
        .iter()
        .enumerate()
        .map(|(idx, entry)| TraceRow::from_entry(idx, entry))
        .collect(),
    }
  }

  /// Rows for useful entries only, keeping their chart ids
  pub fn useful(chart: &Chart) -> Self {
    Self {
      rows: chart
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.useful)
        .map(|(idx, entry)| TraceRow::from_entry(idx, entry))
        .collect(),
    }
  }

  pub fn rows(&self) -> &[TraceRow] {
    &self.rows
  }

  fn widths(&self) -> [usize; 4] {
    let mut widths = HEADER.map(|h| h.chars().count());
    for row in self.rows.iter() {
      for (w, cell) in widths.iter_mut().zip(row.cells().iter()) {
        *w = (*w).max(cell.chars().count());
      }
    }
    widths.map(|w| w + PADDING)
  }
}

fn write_row<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, cells: &[S], widths: &[usize]) -> fmt::Result {
  let line = cells
    .iter()
    .zip(widths.iter())
    .map(|(cell, &w)| {
      let cell = cell.as_ref();
      // pad by chars, item fields hold non-ASCII symbols
      let pad = w.saturating_sub(cell.chars().count());
      format!("{}{}", cell, " ".repeat(pad))
    })
    .collect::<String>();
  writeln!(f, "{}", line.trim_end())
}

impl fmt::Display for Trace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let widths = self.widths();
    write_row(f, &HEADER, &widths)?;
    for row in self.rows.iter() {
      write_row(f, &row.cells(), &widths)?;
    }
    Ok(())
  }
}
