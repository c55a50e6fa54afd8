//! Deduction rules for tree-adjoining grammars.
//!
//! CYK items are `[γ, p, ⊤|⊥, i, f1, f2, j]`: node `p` of elementary tree `γ`
//! spans `i..j`, with the gap `f1..f2` under a foot node if `γ` is auxiliary
//! and the foot lies below `p`. `⊤` and `⊥` say whether adjunction at `p` has
//! been dealt with yet.
//!
//! Earley items are `[γ, p, la|lb|rb|ra, i, j, k, l, adj]`: the dot sits left
//! or right of `p`, above (`a`) or below (`b`) it. `i..l` is the span so far,
//! `j..k` the foot gap and `adj` records whether something adjoined at `p`.

use std::rc::Rc;

use crate::algorithm::Algorithm;
use crate::error::SchemaError;
use crate::grammar::Tag;
use crate::item;
use crate::item::Item;
use crate::schema::{either_order, Axiom, Fired, Schema};
use crate::tree::{GornAddress, Tree};

const TOP: &str = "⊤";
const BOTTOM: &str = "⊥";

const LA: &str = "la";
const LB: &str = "lb";
const RB: &str = "rb";
const RA: &str = "ra";

type Gap = (Option<usize>, Option<usize>);

/// Combines the foot gaps of two sibling spans. At most one of them may
/// dominate the foot.
fn join_gaps(a: Gap, b: Gap) -> Option<Gap> {
  match (a, b) {
    ((None, None), other) | (other, (None, None)) => Some(other),
    _ => None,
  }
}

fn pair_trees(a: &[Tree], b: &[Tree], f: impl Fn(&Tree, &Tree) -> Option<Tree>) -> Vec<Tree> {
  let mut trees: Vec<Tree> = Vec::new();
  for ta in a {
    for tb in b {
      if let Some(t) = f(ta, tb) {
        if !trees.contains(&t) {
          trees.push(t);
        }
      }
    }
  }
  trees
}

/// Every node of the grammar where `aux` may adjoin
fn adjunction_sites(tag: &Tag, aux: &str) -> Vec<(String, GornAddress)> {
  let mut sites = Vec::new();
  for (name, tree) in tag.trees() {
    for (addr, _) in tree.nodes() {
      if tag.is_adjoinable(aux, name, &addr) {
        sites.push((name.clone(), addr));
      }
    }
  }
  sites
}

struct CykItem<'a> {
  tree: &'a str,
  node: &'a GornAddress,
  top: bool,
  i: usize,
  gap: Gap,
  j: usize,
}

impl<'a> CykItem<'a> {
  fn read(item: &'a Item) -> Option<Self> {
    let top = match item.sym(2)? {
      TOP => true,
      BOTTOM => false,
      _ => return None,
    };
    Some(Self {
      tree: item.sym(0)?,
      node: item.addr(1)?,
      top,
      i: item.num(3)?,
      gap: (item.opt_num(4)?, item.opt_num(5)?),
      j: item.num(6)?,
    })
  }
}

fn cyk_item(tree: &str, node: GornAddress, top: bool, i: usize, gap: Gap, j: usize) -> Item {
  item![tree, node, if top { TOP } else { BOTTOM }, i, gap.0, gap.1, j]
}

#[derive(Debug, Clone)]
pub enum TagCykRule {
  /// `[γ,p.1,⊤,i,f1,f2,j] => [γ,p,⊥,i,f1,f2,j]` when `p.1` is an only child
  MoveUnary { tag: Rc<Tag> },
  /// `[γ,p.1,⊤,i,f1,f2,k] [γ,p.2,⊤,k,f1',f2',j] => [γ,p,⊥,i,f1⊕f1',f2⊕f2',j]`
  MoveBinary { tag: Rc<Tag> },
  /// `[γ,p,⊥,i,f1,f2,j] => [γ,p,⊤,i,f1,f2,j]`
  NullAdjoin,
  /// `[α,ε,⊤,i,-,-,j] => [γ,p,⊤,i,-,-,j]` for the substitution node `p` of `γ`
  Substitute {
    tag: Rc<Tag>,
    tree: String,
    node: GornAddress,
  },
  /// `[β,ε,⊤,i,f1,f2,j] [γ,p,⊥,f1,f1',f2',f2] => [γ,p,⊤,i,f1',f2',j]`
  Adjoin { tag: Rc<Tag> },
}

impl TagCykRule {
  pub fn arity(&self) -> usize {
    match self {
      Self::MoveBinary { .. } | Self::Adjoin { .. } => 2,
      _ => 1,
    }
  }

  pub fn name(&self) -> String {
    match self {
      Self::MoveUnary { .. } => "move-unary".to_string(),
      Self::MoveBinary { .. } => "move-binary".to_string(),
      Self::NullAdjoin => "null-adjoin".to_string(),
      Self::Substitute { tree, node, .. } => format!("substitute in {} at {}", tree, node),
      Self::Adjoin { .. } => "adjoin".to_string(),
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::MoveUnary { .. } => "[γ,p.1,⊤,i,f1,f2,j]\n______ γ(p.2) undefined\n[γ,p,⊥,i,f1,f2,j]".to_string(),
      Self::MoveBinary { .. } => {
        "[γ,p.1,⊤,i,f1,f2,k] [γ,p.2,⊤,k,f1',f2',j]\n______\n[γ,p,⊥,i,f1⊕f1',f2⊕f2',j]".to_string()
      }
      Self::NullAdjoin => "[γ,p,⊥,i,f1,f2,j]\n______\n[γ,p,⊤,i,f1,f2,j]".to_string(),
      Self::Substitute { tag, tree, node } => format!(
        "[α,ε,⊤,i,-,-,j]\n______ α ∈ I, root label {}\n[{},{},⊤,i,-,-,j]",
        tag.node(tree, node).map_or("?", |n| n.label.as_str()),
        tree,
        node
      ),
      Self::Adjoin { .. } => {
        "[β,ε,⊤,i,f1,f2,j] [γ,p,⊥,f1,f1',f2',f2]\n______ β adjoinable at γ(p)\n[γ,p,⊤,i,f1',f2',j]".to_string()
      }
    }
  }

  pub(crate) fn try_apply(&self, antecedents: &[&Item]) -> Option<Fired> {
    match self {
      Self::MoveUnary { tag } => {
        let it = CykItem::read(*antecedents.first()?)?;
        if !it.top || it.node.last() != Some(1) {
          return None;
        }
        let parent = it.node.parent()?;
        if tag.node(it.tree, &parent.child(2)).is_some() {
          return None;
        }
        Fired::one(self.name(), cyk_item(it.tree, parent, false, it.i, it.gap, it.j))
      }

      Self::MoveBinary { .. } => either_order(antecedents, |left, right| {
        let (l, r) = (CykItem::read(left)?, CykItem::read(right)?);
        if !l.top
          || !r.top
          || l.tree != r.tree
          || l.node.last() != Some(1)
          || l.node.right_sibling().as_ref() != Some(r.node)
          || l.j != r.i
        {
          return None;
        }
        let gap = join_gaps(l.gap, r.gap)?;
        Fired::one(
          self.name(),
          cyk_item(l.tree, l.node.parent()?, false, l.i, gap, r.j),
        )
      }),

      Self::NullAdjoin => {
        let it = CykItem::read(*antecedents.first()?)?;
        if it.top {
          return None;
        }
        Fired::one(self.name(), cyk_item(it.tree, it.node.clone(), true, it.i, it.gap, it.j))
      }

      Self::Substitute { tag, tree, node } => {
        let it = CykItem::read(*antecedents.first()?)?;
        let label = &tag.node(tree, node)?.label;
        if !it.top
          || !it.node.is_root()
          || !tag.is_initial(it.tree)
          || &tag.tree(it.tree)?.label != label
        {
          return None;
        }
        Fired::one(
          format!("substitute {} in {} at {}", it.tree, tree, node),
          cyk_item(tree, node.clone(), true, it.i, (None, None), it.j),
        )
      }

      Self::Adjoin { tag } => either_order(antecedents, |aux, target| {
        let (b, g) = (CykItem::read(aux)?, CykItem::read(target)?);
        let (f1, f2) = (b.gap.0?, b.gap.1?);
        if !b.top
          || g.top
          || !b.node.is_root()
          || !tag.is_adjoinable(b.tree, g.tree, g.node)
          || g.i != f1
          || g.j != f2
        {
          return None;
        }
        Fired::one(
          format!("adjoin {} in {} at {}", b.tree, g.tree, g.node),
          cyk_item(g.tree, g.node.clone(), true, b.i, g.gap, b.j),
        )
      }),
    }
  }
}

struct EarleyItem<'a> {
  tree: &'a str,
  node: &'a GornAddress,
  pos: &'a str,
  i: usize,
  gap: Gap,
  l: usize,
  adj: bool,
}

impl<'a> EarleyItem<'a> {
  fn read(item: &'a Item) -> Option<Self> {
    Some(Self {
      tree: item.sym(0)?,
      node: item.addr(1)?,
      pos: item.sym(2)?,
      i: item.num(3)?,
      gap: (item.opt_num(4)?, item.opt_num(5)?),
      l: item.num(6)?,
      adj: item.flag(7)?,
    })
  }

  /// Same node, other dot position, no adjunction recorded
  fn at(&self, pos: &str, l: usize) -> Item {
    earley_item(self.tree, self.node.clone(), pos, self.i, self.gap, l, false)
  }
}

fn earley_item(tree: &str, node: GornAddress, pos: &str, i: usize, gap: Gap, l: usize, adj: bool) -> Item {
  item![tree, node, pos, i, gap.0, gap.1, l, adj]
}

/// A fresh prediction `[γ, p, pos, l, -, -, l, 0]`
fn predicted(tree: &str, node: GornAddress, pos: &str, l: usize) -> Item {
  earley_item(tree, node, pos, l, (None, None), l, false)
}

#[derive(Debug, Clone)]
pub enum TagEarleyRule {
  ScanTerm { tag: Rc<Tag>, tokens: Rc<[String]> },
  ScanEps { tag: Rc<Tag> },
  PredictAdjoinable { tag: Rc<Tag> },
  PredictNoAdj { tag: Rc<Tag> },
  PredictAdjoined { tag: Rc<Tag> },
  CompleteFoot { tag: Rc<Tag> },
  CompleteNode { tag: Rc<Tag> },
  Adjoin { tag: Rc<Tag> },
  MoveDown { tag: Rc<Tag> },
  MoveRight { tag: Rc<Tag> },
  MoveUp { tag: Rc<Tag> },
  PredictSubst { tag: Rc<Tag> },
  /// Substitution into one particular node
  Substitute {
    tag: Rc<Tag>,
    tree: String,
    node: GornAddress,
  },
}

impl TagEarleyRule {
  pub fn arity(&self) -> usize {
    match self {
      Self::CompleteFoot { .. } | Self::CompleteNode { .. } | Self::Adjoin { .. } => 2,
      _ => 1,
    }
  }

  pub fn name(&self) -> String {
    match self {
      Self::ScanTerm { .. } | Self::ScanEps { .. } => "scan",
      Self::PredictAdjoinable { .. } => "predict adjoinable",
      Self::PredictNoAdj { .. } => "predict no-adj",
      Self::PredictAdjoined { .. } => "predict adjoined",
      Self::CompleteFoot { .. } => "complete foot",
      Self::CompleteNode { .. } => "complete node",
      Self::Adjoin { .. } => "adjoin",
      Self::MoveDown { .. } => "move down",
      Self::MoveRight { .. } => "move right",
      Self::MoveUp { .. } => "move up",
      Self::PredictSubst { .. } => "predict substitution",
      Self::Substitute { tree, node, .. } => return format!("substitute in {} at {}", tree, node),
    }
    .to_string()
  }

  pub fn describe(&self) -> String {
    match self {
      Self::ScanTerm { .. } => "[γ,p,la,i,j,k,l,0]\n______ l(γ,p) = w_l+1\n[γ,p,ra,i,j,k,l+1,0]",
      Self::ScanEps { .. } => "[γ,p,la,i,j,k,l,0]\n______ l(γ,p) = ε\n[γ,p,ra,i,j,k,l,0]",
      Self::PredictAdjoinable { .. } => {
        "[γ,p,la,i,j,k,l,0]\n______ β adjoinable at γ(p)\n[β,ε,la,l,-,-,l,0]"
      }
      Self::PredictNoAdj { .. } => "[γ,p,la,i,j,k,l,0]\n______\n[γ,p,lb,l,-,-,l,0]",
      Self::PredictAdjoined { .. } => {
        "[β,pf,lb,l,-,-,l,0]\n______ pf foot of β, β adjoinable at γ(p)\n[γ,p,lb,l,-,-,l,0]"
      }
      Self::CompleteFoot { .. } => {
        "[γ,p,rb,i,j,k,l,0] [β,pf,lb,i,-,-,i,0]\n______ pf foot of β, β adjoinable at γ(p)\n[β,pf,rb,i,i,l,l,0]"
      }
      Self::CompleteNode { .. } => {
        "[γ,p,la,f,g,h,i,0] [γ,p,rb,i,j,k,l,adj]\n______ l(γ,p) ∈ N\n[γ,p,ra,f,g⊕j,h⊕k,l,0]"
      }
      Self::Adjoin { .. } => {
        "[β,ε,ra,i,j,k,l,0] [γ,p,rb,j,g,h,k,0]\n______ β adjoinable at γ(p)\n[γ,p,rb,i,g,h,l,1]"
      }
      Self::MoveDown { .. } => "[γ,p,lb,i,j,k,l,0]\n______ γ(p.1) defined\n[γ,p.1,la,i,j,k,l,0]",
      Self::MoveRight { .. } => "[γ,p,ra,i,j,k,l,0]\n______ γ(p+1) defined\n[γ,p+1,la,i,j,k,l,0]",
      Self::MoveUp { .. } => "[γ,p.m,ra,i,j,k,l,0]\n______ γ(p.m+1) undefined\n[γ,p,rb,i,j,k,l,0]",
      Self::PredictSubst { .. } => {
        "[γ,p,la,i,-,-,l,0]\n______ γ(p) substitution node, α ∈ I\n[α,ε,la,l,-,-,l,0]"
      }
      Self::Substitute { tree, node, .. } => {
        return format!("[α,ε,ra,i,-,-,j,0]\n______ α ∈ I\n[{},{},rb,i,-,-,j,0]", tree, node)
      }
    }
    .to_string()
  }

  pub(crate) fn try_apply(&self, antecedents: &[&Item]) -> Option<Fired> {
    match self {
      Self::ScanTerm { tag, tokens } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let node = tag.node(it.tree, it.node)?;
        if it.pos != LA || it.adj || !node.is_leaf() || !tag.is_terminal(&node.label) {
          return None;
        }
        if tokens.get(it.l)? != &node.label {
          return None;
        }
        Fired::one(
          format!("scan {}", node.label),
          it.at(RA, it.l + 1).with_trees(ant.trees().to_vec()),
        )
      }

      Self::ScanEps { tag } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let node = tag.node(it.tree, it.node)?;
        if it.pos != LA || it.adj || !node.is_epsilon() {
          return None;
        }
        Fired::one(
          format!("scan {}", node.label),
          it.at(RA, it.l).with_trees(ant.trees().to_vec()),
        )
      }

      Self::PredictAdjoinable { tag } => {
        let it = EarleyItem::read(*antecedents.first()?)?;
        if it.pos != LA || it.adj {
          return None;
        }
        let items = tag
          .auxiliary
          .iter()
          .filter(|(beta, _)| tag.is_adjoinable(beta, it.tree, it.node))
          .map(|(beta, tree)| predicted(beta, GornAddress::root(), LA, it.l).with_tree(tree.clone()))
          .collect();
        Fired::new(self.name(), items)
      }

      Self::PredictNoAdj { tag } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let node = tag.node(it.tree, it.node)?;
        if it.pos != LA
          || it.adj
          || !tag.is_nonterminal(&node.label)
          || tag.is_substitution_node(it.tree, it.node)
        {
          return None;
        }
        Fired::one(
          self.name(),
          predicted(it.tree, it.node.clone(), LB, it.l).with_trees(ant.trees().to_vec()),
        )
      }

      Self::PredictAdjoined { tag } => {
        let it = EarleyItem::read(*antecedents.first()?)?;
        if it.pos != LB || it.adj || it.i != it.l || it.gap != (None, None) {
          return None;
        }
        if tag.foot(it.tree).as_ref() != Some(it.node) {
          return None;
        }
        let items = adjunction_sites(tag, it.tree)
          .into_iter()
          .filter_map(|(gamma, p)| {
            let tree = tag.tree(&gamma)?.clone();
            Some(predicted(&gamma, p, LB, it.l).with_tree(tree))
          })
          .collect();
        Fired::new(self.name(), items)
      }

      Self::CompleteFoot { tag } => either_order(antecedents, |below, foot| {
        let (r, f) = (EarleyItem::read(below)?, EarleyItem::read(foot)?);
        if r.pos != RB || r.adj || f.pos != LB || f.adj {
          return None;
        }
        if f.i != r.i || f.l != r.i || f.gap != (None, None) {
          return None;
        }
        if tag.foot(f.tree).as_ref() != Some(f.node) || !tag.is_adjoinable(f.tree, r.tree, r.node) {
          return None;
        }
        Fired::one(
          self.name(),
          earley_item(f.tree, f.node.clone(), RB, r.i, (Some(r.i), Some(r.l)), r.l, false)
            .with_trees(foot.trees().to_vec()),
        )
      }),

      Self::CompleteNode { tag } => either_order(antecedents, |left, right| {
        let (a, b) = (EarleyItem::read(left)?, EarleyItem::read(right)?);
        if a.pos != LA || a.adj || b.pos != RB || a.tree != b.tree || a.node != b.node || a.l != b.i {
          return None;
        }
        if !tag.is_nonterminal(&tag.node(a.tree, a.node)?.label) {
          return None;
        }
        let gap = join_gaps(a.gap, b.gap)?;
        let trees = pair_trees(left.trees(), right.trees(), |ta, tb| {
          ta.replace(a.node, tb.node(a.node)?)
        });
        Fired::one(
          self.name(),
          earley_item(a.tree, a.node.clone(), RA, a.i, gap, b.l, false).with_trees(trees),
        )
      }),

      Self::Adjoin { tag } => either_order(antecedents, |aux, target| {
        let (b, g) = (EarleyItem::read(aux)?, EarleyItem::read(target)?);
        let (j, k) = (b.gap.0?, b.gap.1?);
        if b.pos != RA || b.adj || !b.node.is_root() || g.pos != RB || g.adj {
          return None;
        }
        if g.i != j || g.l != k || !tag.is_adjoinable(b.tree, g.tree, g.node) {
          return None;
        }
        let trees = pair_trees(target.trees(), aux.trees(), |tg, tb| tg.adjoin(g.node, tb));
        Fired::one(
          format!("adjoin {} in {} at {}", b.tree, g.tree, g.node),
          earley_item(g.tree, g.node.clone(), RB, b.i, g.gap, b.l, true).with_trees(trees),
        )
      }),

      Self::MoveDown { tag } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let child = it.node.child(1);
        if it.pos != LB || it.adj || tag.node(it.tree, &child).is_none() {
          return None;
        }
        Fired::one(
          self.name(),
          earley_item(it.tree, child, LA, it.i, it.gap, it.l, false).with_trees(ant.trees().to_vec()),
        )
      }

      Self::MoveRight { tag } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let sibling = it.node.right_sibling()?;
        if it.pos != RA || it.adj || tag.node(it.tree, &sibling).is_none() {
          return None;
        }
        Fired::one(
          self.name(),
          earley_item(it.tree, sibling, LA, it.i, it.gap, it.l, false).with_trees(ant.trees().to_vec()),
        )
      }

      Self::MoveUp { tag } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let sibling = it.node.right_sibling()?;
        if it.pos != RA || it.adj || tag.node(it.tree, &sibling).is_some() {
          return None;
        }
        Fired::one(
          self.name(),
          earley_item(it.tree, it.node.parent()?, RB, it.i, it.gap, it.l, false)
            .with_trees(ant.trees().to_vec()),
        )
      }

      Self::PredictSubst { tag } => {
        let it = EarleyItem::read(*antecedents.first()?)?;
        if it.pos != LA || it.adj || !tag.is_substitution_node(it.tree, it.node) {
          return None;
        }
        let label = &tag.node(it.tree, it.node)?.label;
        let items = tag
          .initial
          .iter()
          .filter(|(_, alpha)| &alpha.label == label)
          .map(|(name, alpha)| predicted(name, GornAddress::root(), LA, it.l).with_tree(alpha.clone()))
          .collect();
        Fired::new(self.name(), items)
      }

      Self::Substitute { tag, tree, node } => {
        let ant = *antecedents.first()?;
        let it = EarleyItem::read(ant)?;
        let target = tag.tree(tree)?;
        let label = &target.node(node)?.label;
        if it.pos != RA
          || it.adj
          || !it.node.is_root()
          || it.gap != (None, None)
          || !tag.is_initial(it.tree)
          || &tag.tree(it.tree)?.label != label
        {
          return None;
        }
        let trees = ant
          .trees()
          .iter()
          .filter_map(|t| target.substitute(node, t))
          .collect();
        Fired::one(
          format!("substitute {} in {} at {}", it.tree, tree, node),
          earley_item(tree, node.clone(), RB, it.i, (None, None), it.l, false).with_trees(trees),
        )
      }
    }
  }
}

fn initial_trees_for_start(tag: &Tag) -> impl Iterator<Item = (&String, &Tree)> {
  tag.initial.iter().filter(move |(_, t)| t.label == tag.start)
}

pub fn cyk(tag: &Tag, tokens: &[String]) -> Result<Schema, SchemaError> {
  if let Some(tree) = tag.unbinarized_tree() {
    return Err(SchemaError::NotBinarized {
      algorithm: Algorithm::TagCyk.to_string(),
      tree: tree.to_string(),
    });
  }
  let n = tokens.len();
  let rc = Rc::new(tag.clone());
  let mut schema = Schema::new();

  for (name, tree) in tag.trees() {
    for (addr, node) in tree.nodes() {
      if !node.is_leaf() {
        continue;
      }
      if node.is_epsilon() {
        for i in 0..=n {
          schema.add_axiom(
            Axiom::new("eps-scan").with(cyk_item(name, addr.clone(), true, i, (None, None), i)),
          );
        }
      } else if tag.is_terminal(&node.label) {
        for (i, _) in tokens.iter().enumerate().filter(|(_, t)| **t == node.label) {
          schema.add_axiom(
            Axiom::new(format!("lex-scan {}", node.label))
              .with(cyk_item(name, addr.clone(), true, i, (None, None), i + 1)),
          );
        }
      }
    }
  }

  for (beta, tree) in tag.auxiliary.iter() {
    let Some(foot) = tree.foot_address() else {
      continue;
    };
    for i in 0..=n {
      for j in i..=n {
        schema.add_axiom(
          Axiom::new("foot-predict").with(cyk_item(beta, foot.clone(), true, i, (Some(i), Some(j)), j)),
        );
      }
    }
  }

  schema.add_rule(TagCykRule::MoveUnary { tag: rc.clone() });
  schema.add_rule(TagCykRule::MoveBinary { tag: rc.clone() });
  schema.add_rule(TagCykRule::NullAdjoin);
  for (tree, node) in tag.substitution_nodes() {
    schema.add_rule(TagCykRule::Substitute {
      tag: rc.clone(),
      tree,
      node,
    });
  }
  schema.add_rule(TagCykRule::Adjoin { tag: rc });

  for (name, _) in initial_trees_for_start(tag) {
    schema.add_goal(cyk_item(name, GornAddress::root(), true, 0, (None, None), n));
  }
  Ok(schema)
}

pub fn earley(tag: &Tag, tokens: &[String]) -> Result<Schema, SchemaError> {
  let rc = Rc::new(tag.clone());
  let mut schema = Schema::new();

  for (name, tree) in initial_trees_for_start(tag) {
    schema.add_axiom(
      Axiom::new("initialize").with(predicted(name, GornAddress::root(), LA, 0).with_tree(tree.clone())),
    );
    schema.add_goal(earley_item(
      name,
      GornAddress::root(),
      RA,
      0,
      (None, None),
      tokens.len(),
      false,
    ));
  }

  schema.add_rule(TagEarleyRule::ScanTerm {
    tag: rc.clone(),
    tokens: tokens.to_vec().into(),
  });
  schema.add_rule(TagEarleyRule::ScanEps { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::PredictAdjoinable { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::PredictNoAdj { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::PredictAdjoined { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::CompleteFoot { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::CompleteNode { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::Adjoin { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::MoveDown { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::MoveRight { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::MoveUp { tag: rc.clone() });
  schema.add_rule(TagEarleyRule::PredictSubst { tag: rc.clone() });
  for (tree, node) in tag.substitution_nodes() {
    schema.add_rule(TagEarleyRule::Substitute {
      tag: rc.clone(),
      tree,
      node,
    });
  }
  Ok(schema)
}
