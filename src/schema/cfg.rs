//! Deduction rules and schema compilers for context-free grammars

use std::rc::Rc;

use crate::algorithm::Algorithm;
use crate::error::SchemaError;
use crate::grammar::Cfg;
use crate::item;
use crate::item::{DottedRule, Item};
use crate::rules::ProductionRule;
use crate::schema::lr::{self, Action, LrTable};
use crate::schema::{either_order, Axiom, Fired, Schema};
use crate::tree::{Tree, EPSILON};
use crate::utils::{combinations, permutations};

#[derive(Debug, Clone)]
pub enum CfgRule {
  /// `[aα, i] => [α, i+1]` if `a` is the (i+1)th token
  TopDownScan { tokens: Rc<[String]> },
  /// `[Aα, i] => [γα, i]` for `A -> γ`, as long as `|γα| <= n - i`
  TopDownPredict {
    rule: Rc<ProductionRule>,
    length: usize,
  },
  /// `[Γ, i] => [Γa, i+1]`
  Shift { tokens: Rc<[String]> },
  /// `[Γγ, i] => [ΓA, i]` for `A -> γ`
  Reduce { rule: Rc<ProductionRule> },
  EarleyScan { tokens: Rc<[String]> },
  EarleyPredict { rule: Rc<ProductionRule> },
  EarleyComplete,
  /// `[Xα, Bβ, γ] => [α, X1..Xk $ Bβ, Aγ]` for `A -> X X1..Xk`
  LeftCornerReduce { rule: Rc<ProductionRule> },
  /// `[Xα, Xβ, γ] => [α, β, γ]`
  LeftCornerRemove,
  /// `[α, $β, Aγ] => [Aα, β, γ]`
  LeftCornerMove,
  CykComplete { rule: Rc<ProductionRule> },
  CykUnary { rule: Rc<ProductionRule> },
  /// One premise per right-hand side symbol, each spanning the next stretch
  /// of input
  CykGeneral { rule: Rc<ProductionRule> },
  UngerPredict { rule: Rc<ProductionRule> },
  UngerScan { tokens: Rc<[String]> },
  UngerComplete { rule: Rc<ProductionRule> },
  /// `[Γ q, i] => [Γ q a q', i+1]` if the table shifts the (i+1)th token `a`
  /// from `q` to `q'`
  LrShift {
    table: Rc<LrTable>,
    tokens: Rc<[String]>,
  },
  /// `[Γ p X1 q1 .. Xk qk, i] => [Γ p A q, i]` if the table reduces by
  /// production `id` in `qk` on the next token, and goes from `p` to `q` on `A`
  LrReduce {
    id: usize,
    table: Rc<LrTable>,
    tokens: Rc<[String]>,
  },
}

/// Marker for end of a prediction on the left corner predicted stack
const DOLLAR: &str = "$";

fn predicted(symbol: &str) -> String {
  format!("•{}", symbol)
}

fn completed(symbol: &str) -> String {
  format!("{}•", symbol)
}

fn symbols(rule: &ProductionRule) -> Vec<String> {
  rule.rhs_symbols().map(str::to_string).collect()
}

/// Substitutes one tree from each list into `base`, left to right, for every
/// choice of trees
fn fill(base: &Tree, children: &[&[Tree]]) -> Vec<Tree> {
  let lists = children.iter().map(|c| c.to_vec()).collect::<Vec<_>>();
  let mut trees: Vec<Tree> = Vec::new();
  for choice in combinations(&lists) {
    let filled = choice
      .iter()
      .try_fold(base.clone(), |t, child| t.substitute_leftmost(child));
    if let Some(t) = filled {
      if !trees.contains(&t) {
        trees.push(t);
      }
    }
  }
  trees
}

/// Ways to split `i..j` into one nonempty `(from, to)` span per right-hand
/// side symbol. Terminal spans are exactly one token long.
fn partitions(rule: &ProductionRule, i: usize, j: usize) -> Vec<Vec<(usize, usize)>> {
  fn go(
    rule: &ProductionRule,
    idx: usize,
    from: usize,
    to: usize,
    current: &mut Vec<(usize, usize)>,
    out: &mut Vec<Vec<(usize, usize)>>,
  ) {
    let left = rule.len() - idx;
    if left == 0 {
      if from == to {
        out.push(current.clone());
      }
      return;
    }
    if to < from + left {
      return;
    }
    let max = to - from - (left - 1);
    let lengths = if rule.productions[idx].is_terminal() {
      1..=1
    } else {
      1..=max
    };
    for len in lengths {
      if len > max {
        break;
      }
      current.push((from, from + len));
      go(rule, idx + 1, from + len, to, current, out);
      current.pop();
    }
  }

  let mut out = Vec::new();
  if !rule.is_empty() {
    go(rule, 0, i, j, &mut Vec::new(), &mut out);
  }
  out
}

impl CfgRule {
  pub fn arity(&self) -> usize {
    match self {
      Self::EarleyComplete | Self::CykComplete { .. } => 2,
      Self::CykGeneral { rule } => rule.len().max(1),
      Self::UngerComplete { rule } => rule.len() + 1,
      _ => 1,
    }
  }

  pub fn name(&self) -> String {
    match self {
      Self::TopDownScan { .. } | Self::EarleyScan { .. } | Self::UngerScan { .. } => {
        "scan".to_string()
      }
      Self::TopDownPredict { rule, .. }
      | Self::EarleyPredict { rule }
      | Self::UngerPredict { rule } => format!("predict {}", rule),
      Self::Shift { .. } | Self::LrShift { .. } => "shift".to_string(),
      Self::Reduce { rule } | Self::LeftCornerReduce { rule } => format!("reduce {}", rule),
      Self::LrReduce { id, table, .. } => match table.rule(*id) {
        Some(rule) => format!("reduce {}", rule),
        None => "reduce".to_string(),
      },
      Self::EarleyComplete => "complete".to_string(),
      Self::LeftCornerRemove => "remove".to_string(),
      Self::LeftCornerMove => "move".to_string(),
      Self::CykComplete { rule }
      | Self::CykUnary { rule }
      | Self::CykGeneral { rule }
      | Self::UngerComplete { rule } => format!("complete {}", rule),
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::TopDownScan { .. } => "[aα,i]\n______ w_i+1 = a\n[α,i+1]".to_string(),
      Self::TopDownPredict { rule, .. } => {
        let rhs = symbols(rule).join(" ");
        format!(
          "[{}α,i]\n______ {}, |{} α| ≤ n - i\n[{} α,i]",
          rule.symbol, rule, rhs, rhs
        )
      }
      Self::Shift { .. } => "[Γ,i]\n______ w_i+1 = a\n[Γa,i+1]".to_string(),
      Self::Reduce { rule } => format!(
        "[Γ{},i]\n______ {}\n[Γ{},i]",
        symbols(rule).join(" "),
        rule,
        rule.symbol
      ),
      Self::EarleyScan { .. } => "[A -> α •a β,i,j]\n______ w_j+1 = a\n[A -> α a •β,i,j+1]".to_string(),
      Self::EarleyPredict { rule } => format!(
        "[A -> α •{} β,i,j]\n______ {}\n[{} -> •{},j,j]",
        rule.symbol,
        rule,
        rule.symbol,
        symbols(rule).join(" ")
      ),
      Self::EarleyComplete => {
        "[A -> α •B β,i,j] [B -> γ •,j,k]\n______\n[A -> α B •β,i,k]".to_string()
      }
      Self::LeftCornerReduce { rule } => {
        let rhs = symbols(rule);
        let rest = rhs.get(1..).unwrap_or_default().join(" ");
        format!(
          "[{}α,Bβ,ɣ]\n______ {}, B ≠ $\n[α,{} $ Bβ,{}ɣ]",
          rhs.first().map(String::as_str).unwrap_or(EPSILON),
          rule,
          rest,
          rule.symbol
        )
      }
      Self::LeftCornerRemove => "[Xα,Xβ,ɣ]\n______\n[α,β,ɣ]".to_string(),
      Self::LeftCornerMove => "[α,$β,Aɣ]\n______\n[Aα,β,ɣ]".to_string(),
      Self::CykComplete { rule } => {
        let rhs = symbols(rule);
        let (b, c) = match rhs.as_slice() {
          [b, c] => (b.as_str(), c.as_str()),
          _ => ("B", "C"),
        };
        format!(
          "[{},i,l1] [{},i+l1,l2]\n______ {}\n[{},i,l1+l2]",
          b, c, rule, rule.symbol
        )
      }
      Self::CykUnary { rule } => format!(
        "[{},i,l]\n______ {}\n[{},i,l]",
        symbols(rule).join(" "),
        rule,
        rule.symbol
      ),
      Self::CykGeneral { rule } => {
        let premises = if rule.is_empty() {
          format!("[{},i,0]", EPSILON)
        } else {
          symbols(rule)
            .iter()
            .enumerate()
            .map(|(m, s)| format!("[{},i{},l{}]", s, m + 1, m + 1))
            .collect::<Vec<_>>()
            .join(" ")
        };
        format!("{}\n______ {}\n[{},i1,l1+...]", premises, rule, rule.symbol)
      }
      Self::UngerPredict { rule } => format!(
        "[•{},i0,ik]\n______ {}, i0 < i1 < ... < ik\n{}",
        rule.symbol,
        rule,
        symbols(rule)
          .iter()
          .enumerate()
          .map(|(m, s)| format!("[•{},i{},i{}]", s, m, m + 1))
          .collect::<Vec<_>>()
          .join(" ")
      ),
      Self::UngerScan { .. } => "[•a,i,i+1]\n______ w_i+1 = a\n[a•,i,i+1]".to_string(),
      Self::UngerComplete { rule } => format!(
        "[•{},i0,ik] {}\n______ {}\n[{}•,i0,ik]",
        rule.symbol,
        symbols(rule)
          .iter()
          .enumerate()
          .map(|(m, s)| format!("[{}•,i{},i{}]", s, m, m + 1))
          .collect::<Vec<_>>()
          .join(" "),
        rule,
        rule.symbol
      ),
      Self::LrShift { .. } => {
        "[Γ q,i]\n______ w_i+1 = a, shift to q' in q\n[Γ q a q',i+1]".to_string()
      }
      Self::LrReduce { .. } => format!(
        "[Γ p X1 q1 ... Xk qk,i]\n______ {}, reduce in qk, goto q from p\n[Γ p A q,i]",
        self.name().trim_start_matches("reduce ")
      ),
    }
  }

  pub(crate) fn try_apply(&self, antecedents: &[&Item]) -> Option<Fired> {
    match self {
      Self::TopDownScan { tokens } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let (top, rest) = stack.split_first()?;
        if tokens.get(i)? != top {
          return None;
        }
        Fired::one(
          format!("scan {}", top),
          item![rest.to_vec(), i + 1].with_trees(ant.trees().to_vec()),
        )
      }

      Self::TopDownPredict { rule, length } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let (top, rest) = stack.split_first()?;
        if top != rule.symbol_str() {
          return None;
        }
        let mut new_stack = symbols(rule);
        new_stack.extend(rest.iter().cloned());
        if new_stack.len() > length.checked_sub(i)? {
          return None;
        }
        let base = Tree::from_production(rule);
        let trees = if ant.trees().is_empty() {
          vec![base]
        } else {
          ant
            .trees()
            .iter()
            .filter_map(|t| t.substitute_leftmost(&base))
            .collect()
        };
        Fired::one(self.name(), item![new_stack, i].with_trees(trees))
      }

      Self::Shift { tokens } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let token = tokens.get(i)?;
        let mut new_stack = stack.to_vec();
        new_stack.push(token.clone());
        Fired::one(format!("shift {}", token), item![new_stack, i + 1])
      }

      Self::Reduce { rule } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let rhs = symbols(rule);
        if rhs.is_empty() || !stack.ends_with(&rhs) {
          return None;
        }
        let mut new_stack = stack[..stack.len() - rhs.len()].to_vec();
        new_stack.push(rule.symbol_str().to_string());
        Fired::one(self.name(), item![new_stack, i])
      }

      Self::EarleyScan { tokens } => {
        let ant = *antecedents.first()?;
        let (dotted, i, j) = (ant.dotted(0)?, ant.num(1)?, ant.num(2)?);
        let next = dotted.next_production()?;
        if !next.is_terminal() || tokens.get(j)? != next.symbol_str() {
          return None;
        }
        Fired::one(
          format!("scan {}", next),
          item![dotted.advance()?, i, j + 1].with_trees(ant.trees().to_vec()),
        )
      }

      Self::EarleyPredict { rule } => {
        let ant = *antecedents.first()?;
        let (dotted, j) = (ant.dotted(0)?, ant.num(2)?);
        let next = dotted.next_production()?;
        if !next.is_nonterminal() || next.symbol_str() != rule.symbol_str() {
          return None;
        }
        Fired::one(
          self.name(),
          item![DottedRule::new(rule), j, j].with_tree(Tree::from_production(rule)),
        )
      }

      Self::EarleyComplete => either_order(antecedents, |active, done| {
        let (a, i, j) = (active.dotted(0)?, active.num(1)?, active.num(2)?);
        let (b, j2, k) = (done.dotted(0)?, done.num(1)?, done.num(2)?);
        let next = a.next_production()?;
        if b.is_active()
          || !next.is_nonterminal()
          || next.symbol_str() != b.rule.symbol_str()
          || j != j2
        {
          return None;
        }
        let mut trees: Vec<Tree> = Vec::new();
        for ta in active.trees() {
          for t in fill(ta, &[done.trees()]) {
            if !trees.contains(&t) {
              trees.push(t);
            }
          }
        }
        Fired::one(self.name(), item![a.advance()?, i, k].with_trees(trees))
      }),

      Self::LeftCornerReduce { rule } => {
        let ant = *antecedents.first()?;
        let (compl, pred, lhs) = (ant.seq(0)?, ant.seq(1)?, ant.seq(2)?);
        let (x, rest) = compl.split_first()?;
        let b = pred.first()?;
        let rhs = symbols(rule);
        if b == DOLLAR || rhs.first() != Some(x) {
          return None;
        }
        let mut new_pred = rhs[1..].to_vec();
        new_pred.push(DOLLAR.to_string());
        new_pred.extend(pred.iter().cloned());
        let mut new_lhs = vec![rule.symbol_str().to_string()];
        new_lhs.extend(lhs.iter().cloned());
        Fired::one(self.name(), item![rest.to_vec(), new_pred, new_lhs])
      }

      Self::LeftCornerRemove => {
        let ant = *antecedents.first()?;
        let (compl, pred, lhs) = (ant.seq(0)?, ant.seq(1)?, ant.seq(2)?);
        let (x, compl_rest) = compl.split_first()?;
        let (y, pred_rest) = pred.split_first()?;
        if x != y || x == DOLLAR {
          return None;
        }
        Fired::one(
          self.name(),
          item![compl_rest.to_vec(), pred_rest.to_vec(), lhs.to_vec()],
        )
      }

      Self::LeftCornerMove => {
        let ant = *antecedents.first()?;
        let (compl, pred, lhs) = (ant.seq(0)?, ant.seq(1)?, ant.seq(2)?);
        let (dollar, pred_rest) = pred.split_first()?;
        let (a, lhs_rest) = lhs.split_first()?;
        if dollar != DOLLAR {
          return None;
        }
        let mut new_compl = vec![a.clone()];
        new_compl.extend(compl.iter().cloned());
        Fired::one(
          self.name(),
          item![new_compl, pred_rest.to_vec(), lhs_rest.to_vec()],
        )
      }

      Self::CykComplete { rule } => either_order(antecedents, |left, right| {
        let rhs = symbols(rule);
        let (b, i, l1) = (left.sym(0)?, left.num(1)?, left.num(2)?);
        let (c, i2, l2) = (right.sym(0)?, right.num(1)?, right.num(2)?);
        if rhs.len() != 2 || b != rhs[0] || c != rhs[1] || i + l1 != i2 {
          return None;
        }
        let trees = fill(&Tree::from_production(rule), &[left.trees(), right.trees()]);
        Fired::one(
          self.name(),
          item![rule.symbol_str(), i, l1 + l2].with_trees(trees),
        )
      }),

      Self::CykUnary { rule } => {
        let ant = *antecedents.first()?;
        let (b, i, l) = (ant.sym(0)?, ant.num(1)?, ant.num(2)?);
        if rule.rhs_symbols().next() != Some(b) {
          return None;
        }
        let trees = fill(&Tree::from_production(rule), &[ant.trees()]);
        Fired::one(self.name(), item![rule.symbol_str(), i, l].with_trees(trees))
      }

      Self::CykGeneral { rule } => {
        if rule.is_empty() {
          let ant = *antecedents.first()?;
          let (sym, i, l) = (ant.sym(0)?, ant.num(1)?, ant.num(2)?);
          if sym != EPSILON || l != 0 {
            return None;
          }
          return Fired::one(
            self.name(),
            item![rule.symbol_str(), i, 0usize].with_tree(Tree::from_production(rule)),
          );
        }

        let mut items: Vec<Item> = Vec::new();
        for order in permutations(antecedents) {
          let Some(start) = order[0].num(1) else {
            continue;
          };
          let mut end = start;
          let mut matched = true;
          for (ant, p) in order.iter().zip(rule.productions.iter()) {
            if ant.sym(0) != Some(p.symbol_str()) || ant.num(1) != Some(end) {
              matched = false;
              break;
            }
            match ant.num(2) {
              Some(l) => end += l,
              None => {
                matched = false;
                break;
              }
            }
          }
          if !matched {
            continue;
          }
          let children = order
            .iter()
            .zip(rule.productions.iter())
            .filter(|(_, p)| p.is_nonterminal())
            .map(|(ant, _)| ant.trees())
            .collect::<Vec<_>>();
          let trees = fill(&Tree::from_production(rule), &children);
          let consequence = item![rule.symbol_str(), start, end - start].with_trees(trees);
          if !items.contains(&consequence) {
            items.push(consequence);
          }
        }
        Fired::new(self.name(), items)
      }

      Self::UngerPredict { rule } => {
        let ant = *antecedents.first()?;
        let (sym, i, j) = (ant.sym(0)?, ant.num(1)?, ant.num(2)?);
        if sym != predicted(rule.symbol_str()) {
          return None;
        }
        let items = partitions(rule, i, j)
          .into_iter()
          .flat_map(|spans| {
            rule
              .rhs_symbols()
              .zip(spans)
              .map(|(s, (from, to))| item![predicted(s), from, to])
              .collect::<Vec<_>>()
          })
          .fold(Vec::new(), |mut acc: Vec<Item>, it| {
            if !acc.contains(&it) {
              acc.push(it);
            }
            acc
          });
        Fired::new(self.name(), items)
      }

      Self::UngerScan { tokens } => {
        let ant = *antecedents.first()?;
        let (sym, i, j) = (ant.sym(0)?, ant.num(1)?, ant.num(2)?);
        let a = sym.strip_prefix('•')?;
        if j != i + 1 || tokens.get(i)? != a {
          return None;
        }
        Fired::one(format!("scan {}", a), item![completed(a), i, j])
      }

      Self::UngerComplete { rule } => {
        let goal = predicted(rule.symbol_str());
        let parts = rule.rhs_symbols().map(completed).collect::<Vec<_>>();
        for order in permutations(antecedents) {
          let (head, rest) = order.split_first()?;
          let (Some(i), Some(j)) = (head.num(1), head.num(2)) else {
            continue;
          };
          if head.sym(0) != Some(goal.as_str()) {
            continue;
          }
          let mut end = i;
          let chained = rest.iter().zip(parts.iter()).all(|(ant, part)| {
            let ok = ant.sym(0) == Some(part.as_str()) && ant.num(1) == Some(end);
            if let Some(to) = ant.num(2).filter(|_| ok) {
              end = to;
              true
            } else {
              false
            }
          });
          if chained && end == j {
            return Fired::one(self.name(), item![completed(rule.symbol_str()), i, j]);
          }
        }
        None
      }

      Self::LrShift { table, tokens } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let token = tokens.get(i)?;
        let q = table
          .actions(lr::top_state(stack)?, token)
          .iter()
          .find_map(|a| match a {
            Action::Shift(q) => Some(*q),
            _ => None,
          })?;
        let mut new_stack = stack.to_vec();
        new_stack.push(token.clone());
        new_stack.push(lr::state_name(q));
        Fired::one(format!("shift {}", token), item![new_stack, i + 1])
      }

      Self::LrReduce { id, table, tokens } => {
        let ant = *antecedents.first()?;
        let (stack, i) = (ant.seq(0)?, ant.num(1)?);
        let lookahead = tokens.get(i).map_or(lr::END, String::as_str);
        if !table
          .actions(lr::top_state(stack)?, lookahead)
          .contains(&Action::Reduce(*id))
        {
          return None;
        }
        let rule = table.rule(*id)?;
        let base = stack.len().checked_sub(2 * rule.len())?;
        let popped = stack[base..].iter().step_by(2).map(String::as_str);
        if base == 0 || !popped.eq(rule.rhs_symbols()) {
          return None;
        }
        let q = table.goto(lr::top_state(&stack[..base])?, rule.symbol_str())?;
        let mut new_stack = stack[..base].to_vec();
        new_stack.push(rule.symbol_str().to_string());
        new_stack.push(lr::state_name(q));
        Fired::one(self.name(), item![new_stack, i])
      }
    }
  }
}

fn tokens_rc(tokens: &[String]) -> Rc<[String]> {
  tokens.to_vec().into()
}

fn check(ok: bool, err: impl FnOnce(String) -> SchemaError, algorithm: Algorithm) -> Result<(), SchemaError> {
  if ok {
    Ok(())
  } else {
    Err(err(algorithm.to_string()))
  }
}

/// Top-down parsing with a stack of symbols still to be matched
pub fn topdown(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    !cfg.has_epsilon_productions(),
    SchemaError::EmptyProductions,
    Algorithm::CfgTopDown,
  )?;
  let mut schema = Schema::new();
  schema.add_axiom(Axiom::new("axiom").with(item![vec![cfg.start.clone()], 0usize]));
  schema.add_rule(CfgRule::TopDownScan {
    tokens: tokens_rc(tokens),
  });
  for rule in cfg.rules.iter() {
    schema.add_rule(CfgRule::TopDownPredict {
      rule: rule.clone(),
      length: tokens.len(),
    });
  }
  schema.add_goal(item![Vec::<String>::new(), tokens.len()]);
  Ok(schema)
}

pub fn shift_reduce(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    !cfg.has_epsilon_productions(),
    SchemaError::EmptyProductions,
    Algorithm::CfgShiftReduce,
  )?;
  let mut schema = Schema::new();
  schema.add_axiom(Axiom::new("axiom").with(item![Vec::<String>::new(), 0usize]));
  schema.add_rule(CfgRule::Shift {
    tokens: tokens_rc(tokens),
  });
  for rule in cfg.rules.iter() {
    schema.add_rule(CfgRule::Reduce { rule: rule.clone() });
  }
  schema.add_goal(item![vec![cfg.start.clone()], tokens.len()]);
  Ok(schema)
}

pub fn earley(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  let mut schema = Schema::new();
  schema.add_rule(CfgRule::EarleyScan {
    tokens: tokens_rc(tokens),
  });
  schema.add_rule(CfgRule::EarleyComplete);
  for rule in cfg.rules.iter() {
    if rule.symbol_str() == cfg.start {
      let dotted = DottedRule::new(rule);
      schema.add_axiom(
        Axiom::new("axiom")
          .with(item![dotted.clone(), 0usize, 0usize].with_tree(Tree::from_production(rule))),
      );
      let done = DottedRule {
        pos: rule.len(),
        ..dotted
      };
      schema.add_goal(item![done, 0usize, tokens.len()]);
    }
    schema.add_rule(CfgRule::EarleyPredict { rule: rule.clone() });
  }
  Ok(schema)
}

pub fn left_corner(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    !cfg.has_epsilon_productions(),
    SchemaError::EmptyProductions,
    Algorithm::CfgLeftCorner,
  )?;
  check(
    !cfg.has_left_recursion(),
    SchemaError::LeftRecursion,
    Algorithm::CfgLeftCorner,
  )?;
  let mut schema = Schema::new();
  schema.add_axiom(Axiom::new("axiom").with(item![
    tokens.to_vec(),
    vec![cfg.start.clone()],
    Vec::<String>::new()
  ]));
  for rule in cfg.rules.iter() {
    schema.add_rule(CfgRule::LeftCornerReduce { rule: rule.clone() });
  }
  schema.add_rule(CfgRule::LeftCornerRemove);
  schema.add_rule(CfgRule::LeftCornerMove);
  schema.add_goal(item![
    Vec::<String>::new(),
    Vec::<String>::new(),
    Vec::<String>::new()
  ]);
  Ok(schema)
}

/// Scan axioms `[A, i, 1]` for every lexical rule matching a token. In
/// Chomsky normal form an `S -> ε` rule only matters for the empty input.
fn lexical_axioms(cfg: &Cfg, tokens: &[String], schema: &mut Schema) {
  for rule in cfg.rules.iter() {
    if rule.is_lexical() {
      let a = rule.productions[0].symbol_str();
      for (i, token) in tokens.iter().enumerate() {
        if token == a {
          schema.add_axiom(
            Axiom::new(format!("scan {}", rule))
              .with(item![rule.symbol_str(), i, 1usize].with_tree(Tree::from_production(rule))),
          );
        }
      }
    } else if rule.is_empty() && tokens.is_empty() {
      schema.add_axiom(
        Axiom::new(format!("scan {}", rule))
          .with(item![rule.symbol_str(), 0usize, 0usize].with_tree(Tree::from_production(rule))),
      );
    }
  }
}

pub fn cyk(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    cfg.is_in_chomsky_normal_form(),
    SchemaError::NotChomskyNormalForm,
    Algorithm::CfgCyk,
  )?;
  let mut schema = Schema::new();
  lexical_axioms(cfg, tokens, &mut schema);
  for rule in cfg.rules.iter().filter(|r| r.is_binary_nonterminal()) {
    schema.add_rule(CfgRule::CykComplete { rule: rule.clone() });
  }
  schema.add_goal(item![cfg.start.clone(), 0usize, tokens.len()]);
  Ok(schema)
}

pub fn cyk_extended(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    cfg.is_in_canonical_two_form(),
    SchemaError::NotCanonicalTwoForm,
    Algorithm::CfgCykExtended,
  )?;
  let mut schema = Schema::new();
  lexical_axioms(cfg, tokens, &mut schema);
  for rule in cfg.rules.iter() {
    if rule.is_binary_nonterminal() {
      schema.add_rule(CfgRule::CykComplete { rule: rule.clone() });
    } else if rule.is_unary_nonterminal() {
      schema.add_rule(CfgRule::CykUnary { rule: rule.clone() });
    }
  }
  schema.add_goal(item![cfg.start.clone(), 0usize, tokens.len()]);
  Ok(schema)
}

/// CYK over arbitrary productions, ε-rules included
pub fn cyk_general(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  let mut schema = Schema::new();
  for (i, token) in tokens.iter().enumerate() {
    schema.add_axiom(Axiom::new(format!("scan {}", token)).with(item![token.clone(), i, 1usize]));
    schema.add_axiom(Axiom::new(format!("scan {}", EPSILON)).with(item![EPSILON, i, 0usize]));
  }
  schema.add_axiom(
    Axiom::new(format!("scan {}", EPSILON)).with(item![EPSILON, tokens.len(), 0usize]),
  );
  for rule in cfg.rules.iter() {
    schema.add_rule(CfgRule::CykGeneral { rule: rule.clone() });
  }
  schema.add_goal(item![cfg.start.clone(), 0usize, tokens.len()]);
  Ok(schema)
}

pub fn unger(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    !cfg.has_epsilon_productions(),
    SchemaError::EmptyProductions,
    Algorithm::CfgUnger,
  )?;
  check(
    !cfg.has_left_recursion(),
    SchemaError::LeftRecursion,
    Algorithm::CfgUnger,
  )?;
  let mut schema = Schema::new();
  schema.add_axiom(Axiom::new("axiom").with(item![predicted(&cfg.start), 0usize, tokens.len()]));
  schema.add_rule(CfgRule::UngerScan {
    tokens: tokens_rc(tokens),
  });
  for rule in cfg.rules.iter() {
    schema.add_rule(CfgRule::UngerPredict { rule: rule.clone() });
    schema.add_rule(CfgRule::UngerComplete { rule: rule.clone() });
  }
  schema.add_goal(item![completed(&cfg.start), 0usize, tokens.len()]);
  Ok(schema)
}

/// Shift-reduce parsing driven by an LR parse table with one token of
/// lookahead. Conflicting table entries are all followed.
pub fn lr_k(cfg: &Cfg, tokens: &[String]) -> Result<Schema, SchemaError> {
  check(
    !cfg.has_epsilon_productions(),
    SchemaError::EmptyProductions,
    Algorithm::CfgLrK,
  )?;
  let table = Rc::new(LrTable::new(cfg));
  let tokens = tokens_rc(tokens);
  let mut schema = Schema::new();
  schema.add_axiom(Axiom::new("axiom").with(item![vec![lr::state_name(0)], 0usize]));
  schema.add_rule(CfgRule::LrShift {
    table: table.clone(),
    tokens: tokens.clone(),
  });
  for id in table.rule_ids() {
    schema.add_rule(CfgRule::LrReduce {
      id,
      table: table.clone(),
      tokens: tokens.clone(),
    });
  }
  if let Some(q) = table.goto(0, &cfg.start) {
    schema.add_goal(item![
      vec![lr::state_name(0), cfg.start.clone(), lr::state_name(q)],
      tokens.len()
    ]);
  }
  Ok(schema)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rules::{Production, Symbol};

  fn rule(lhs: &str, rhs: &[&str]) -> Rc<ProductionRule> {
    let productions = rhs
      .iter()
      .map(|s| {
        if s.chars().next().is_some_and(char::is_uppercase) {
          Production::Nonterminal(Symbol::new(s.to_string()))
        } else {
          Production::Terminal(s.to_string())
        }
      })
      .collect();
    Rc::new(ProductionRule::new(lhs, productions))
  }

  fn words(s: &str) -> Rc<[String]> {
    s.split_whitespace().map(str::to_string).collect::<Vec<_>>().into()
  }

  fn stack(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
  }

  #[test]
  fn test_topdown_predict_respects_bound() {
    let predict = CfgRule::TopDownPredict {
      rule: rule("S", &["a", "S", "b"]),
      length: 4,
    };
    let fired = predict.try_apply(&[&item![stack("S b"), 0usize]]).unwrap();
    assert_eq!(fired.items[0].to_string(), "[a S b b,0]");
    assert_eq!(fired.items[0].trees()[0].to_string(), "(S a S b)");
    assert!(predict.try_apply(&[&item![stack("S b"), 1usize]]).is_none());
    assert!(predict.try_apply(&[&item![stack("A"), 0usize]]).is_none());
  }

  #[test]
  fn test_shift_and_reduce() {
    let shift = CfgRule::Shift { tokens: words("a b") };
    let fired = shift.try_apply(&[&item![stack("S"), 1usize]]).unwrap();
    assert_eq!(fired.name, "shift b");
    assert_eq!(fired.items[0].to_string(), "[S b,2]");
    assert!(shift.try_apply(&[&item![stack("S"), 2usize]]).is_none());

    let reduce = CfgRule::Reduce {
      rule: rule("S", &["a", "S", "b"]),
    };
    let fired = reduce.try_apply(&[&item![stack("a a S b"), 3usize]]).unwrap();
    assert_eq!(fired.items[0].to_string(), "[a S,3]");
  }

  #[test]
  fn test_earley_complete_either_order() {
    let s = rule("S", &["A", "b"]);
    let a = rule("A", &["a"]);
    let active = item![DottedRule::new(&s), 0usize, 0usize].with_tree(Tree::from_production(&s));
    let done = item![DottedRule { rule: a.clone(), pos: 1 }, 0usize, 1usize]
      .with_tree(Tree::from_production(&a));
    for ants in [[&active, &done], [&done, &active]] {
      let fired = CfgRule::EarleyComplete.try_apply(&ants).unwrap();
      assert_eq!(fired.items[0].to_string(), "[S -> A • b,0,1]");
      assert_eq!(fired.items[0].trees()[0].to_string(), "(S (A a) b)");
    }
  }

  #[test]
  fn test_left_corner_steps() {
    let reduce = CfgRule::LeftCornerReduce {
      rule: rule("S", &["a", "S", "b"]),
    };
    let fired = reduce
      .try_apply(&[&item![stack("a b"), stack("S"), Vec::<String>::new()]])
      .unwrap();
    assert_eq!(fired.items[0].to_string(), "[b,S b $ S,S]");

    let moved = CfgRule::LeftCornerMove
      .try_apply(&[&item![stack("b"), stack("$ S"), stack("S")]])
      .unwrap();
    assert_eq!(moved.items[0].to_string(), "[S b,S,ε]");

    let removed = CfgRule::LeftCornerRemove
      .try_apply(&[&item![stack("S"), stack("S"), Vec::<String>::new()]])
      .unwrap();
    assert_eq!(removed.items[0].to_string(), "[ε,ε,ε]");
  }

  #[test]
  fn test_cyk_general_orders_premises() {
    let r = CfgRule::CykGeneral {
      rule: rule("S", &["a", "S", "b"]),
    };
    assert_eq!(r.arity(), 3);
    let a = item!["a", 0usize, 1usize];
    let s = item!["S", 1usize, 0usize].with_tree(Tree::from_production(&rule("S", &[])));
    let b = item!["b", 1usize, 1usize];
    let fired = r.try_apply(&[&b, &a, &s]).unwrap();
    assert_eq!(fired.items.len(), 1);
    assert_eq!(fired.items[0].to_string(), "[S,0,2]");
    assert_eq!(fired.items[0].trees()[0].to_string(), "(S a (S ε) b)");

    let gap = item!["b", 2usize, 1usize];
    assert!(r.try_apply(&[&a, &s, &gap]).is_none());
  }

  #[test]
  fn test_unger_predict_partitions() {
    let predict = CfgRule::UngerPredict {
      rule: rule("S", &["a", "S", "b"]),
    };
    let fired = predict.try_apply(&[&item!["•S", 0usize, 4usize]]).unwrap();
    let shown = fired.items.iter().map(Item::to_string).collect::<Vec<_>>();
    assert_eq!(shown, vec!["[•a,0,1]", "[•S,1,3]", "[•b,3,4]"]);
    assert!(predict.try_apply(&[&item!["•S", 0usize, 2usize]]).is_none());
  }

  #[test]
  fn test_unger_complete() {
    let complete = CfgRule::UngerComplete {
      rule: rule("S", &["a", "b"]),
    };
    let head = item!["•S", 0usize, 2usize];
    let a = item!["a•", 0usize, 1usize];
    let b = item!["b•", 1usize, 2usize];
    let fired = complete.try_apply(&[&b, &head, &a]).unwrap();
    assert_eq!(fired.items[0].to_string(), "[S•,0,2]");
    let short = item!["•S", 0usize, 3usize];
    assert!(complete.try_apply(&[&short, &a, &b]).is_none());
  }

  #[test]
  fn test_preconditions() {
    let g: Cfg = r#"
      N = {"S"}
      T = {"a", "b"}
      S = "S"
      P = {"S -> a S b", "S -> ε"}
    "#
    .parse()
    .unwrap();
    let tokens = stack("a b");
    assert!(matches!(topdown(&g, &tokens), Err(SchemaError::EmptyProductions(_))));
    assert!(matches!(cyk(&g, &tokens), Err(SchemaError::NotChomskyNormalForm(_))));
    assert!(matches!(
      cyk_extended(&g, &tokens),
      Err(SchemaError::NotCanonicalTwoForm(_))
    ));
    assert!(earley(&g, &tokens).is_ok());
    assert!(cyk_general(&g, &tokens).is_ok());
  }
}
