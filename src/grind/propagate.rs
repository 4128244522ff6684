//! Propagation rules for the logical connectives.
//!
//! An *up* rule runs on an application when it is internalized and whenever the class
//! of one of its children changes; it derives facts about the application from facts about
//! its arguments. A *down* rule runs when the class of the application is merged with
//! `True` or `False`, and derives facts about the arguments. Rules are plain functions
//! looked up by head constant, so new connectives can be added with
//! [`Grind::register_propagator`](super::Grind::register_propagator).

use std::collections::HashMap;
use crate::error::Result;
use crate::name::Name;
use crate::term::{TermId, TermKind, TermStore};
use super::GoalM;
use super::types::NewFact;

/// A propagation rule, called with an internalized application of the constant it is
/// registered for.
pub type Propagator = fn(&mut GoalM<'_>, TermId) -> Result<()>;

/// When a propagator runs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
  /// When a child's class changes.
  Up,
  /// When the term becomes equal to `True` or `False`.
  Down,
}

/// The propagator registry.
#[derive(Clone, Debug, Default)]
pub struct Propagators {
  map: HashMap<(Name, Direction), Propagator>,
}

impl Propagators {
  /// The registry with the rules for the builtin connectives.
  #[must_use] pub fn builtin() -> Self {
    let mut p = Self::default();
    p.register(Name::AND, Direction::Up, and_up);
    p.register(Name::AND, Direction::Down, and_down);
    p.register(Name::OR, Direction::Up, or_up);
    p.register(Name::OR, Direction::Down, or_down);
    p.register(Name::NOT, Direction::Up, not_up);
    p.register(Name::NOT, Direction::Down, not_down);
    p.register(Name::EQ, Direction::Up, eq_up);
    p.register(Name::EQ, Direction::Down, eq_down);
    p.register(Name::HEQ, Direction::Up, heq_up);
    p.register(Name::HEQ, Direction::Down, heq_down);
    p.register(Name::ITE, Direction::Up, ite_up);
    p.register(Name::DITE, Direction::Up, dite_up);
    p.register(Name::MATCH_COND, Direction::Up, match_cond_up);
    p
  }

  /// Register `f` for applications of `n`, replacing the previous rule.
  pub fn register(&mut self, n: Name, dir: Direction, f: Propagator) {
    if self.map.insert((n, dir), f).is_some() {
      log::debug!(target: "grind::internalize", "replaced {dir:?} propagator for {n}")
    }
  }

  /// The rule for applications of `n`.
  #[must_use] pub fn get(&self, n: Name, dir: Direction) -> Option<Propagator> { self.map.get(&(n, dir)).copied() }
}

impl GoalM<'_> {
  fn propagate(&mut self, e: TermId, dir: Direction) -> Result<()> {
    if self.goal.inconsistent { return Ok(()) }
    match self.ctx.terms.kind(e) {
      TermKind::Forall(..) =>
        return if dir == Direction::Up { self.propagate_imp_up(e) } else { self.propagate_imp_down(e) },
      TermKind::App(..) => {}
      _ => return Ok(()),
    }
    let Some(n) = self.ctx.terms.head_const(e) else { return Ok(()) };
    if let Some(f) = self.ctx.propagators.get(n, dir) { f(self, e)? }
    if dir == Direction::Up && self.goal.seen_matchers.contains(&n) { self.instantiate_match_eqns(e)? }
    Ok(())
  }

  /// Run the up rule for `e`.
  pub fn propagate_up(&mut self, e: TermId) -> Result<()> { self.propagate(e, Direction::Up) }

  /// Run the down rule for `e`.
  pub fn propagate_down(&mut self, e: TermId) -> Result<()> { self.propagate(e, Direction::Down) }

  /// The two sides of an internalized non-dependent implication between propositions.
  fn internalized_arrow(&mut self, e: TermId) -> Option<(TermId, TermId)> {
    let (p, q) = self.ctx.terms.match_arrow(e)?;
    (self.goal.is_internalized(p) && self.goal.is_internalized(q)).then_some((p, q))
  }

  fn propagate_imp_up(&mut self, e: TermId) -> Result<()> {
    let Some((p, q)) = self.internalized_arrow(e) else { return Ok(()) };
    if self.goal.is_eq_false(p) {
      let h = self.mk_eq_false_proof(p)?;
      let h = self.lemma(Name::IMP_TRUE_OF_FALSE_LEFT, &[h, q]);
      self.push_eq_true(e, h)
    } else if self.goal.is_eq_true(q) {
      let h = self.mk_eq_true_proof(q)?;
      let h = self.lemma(Name::IMP_TRUE_OF_TRUE_RIGHT, &[p, h]);
      self.push_eq_true(e, h)
    } else if self.goal.is_eq_true(p) {
      let h = self.mk_eq_true_proof(p)?;
      let h = self.lemma(Name::IMP_EQ_OF_TRUE_LEFT, &[h, q]);
      self.push_eq(e, q, h)
    }
    Ok(())
  }

  fn propagate_imp_down(&mut self, e: TermId) -> Result<()> {
    let Some((p, q)) = self.internalized_arrow(e) else { return Ok(()) };
    if self.goal.is_eq_true(e) && self.goal.is_eq_true(p) {
      let he = self.mk_eq_true_proof(e)?;
      let hp = self.mk_eq_true_proof(p)?;
      let h = self.lemma(Name::MODUS_PONENS, &[he, hp]);
      self.push_eq_true(q, h)
    }
    Ok(())
  }

  /// On `a = b` being false, instantiate the extensionality theorems of the type of `a`.
  /// A theorem `∀ xs, P xs → l xs = r xs` whose conclusion matches `a = b` yields the
  /// fact `¬P xs`.
  fn propagate_ext(&mut self, e: TermId, ty: TermId, a: TermId, b: TermId) -> Result<()> {
    let ty = self.ctx.tc().whnf(ty)?;
    let Some(head) = self.ctx.terms.head_const(ty) else { return Ok(()) };
    let generation = self.goal.generation(e) + 1;
    if generation > self.ctx.config.max_gen { return Ok(()) }
    for thm in self.ctx.env.ext_thms(head).to_vec() {
      if self.goal.ext_keys.contains(&(thm, e)) { continue }
      let Some((vals, premise)) = self.match_ext_thm(thm, a, b)? else { continue };
      self.goal.ext_keys.insert((thm, e));
      let inst = self.terms().mk_const_app(thm, &vals);
      let fact = match premise {
        Some(p) => {
          let h = self.mk_eq_false_proof(e)?;
          NewFact { prop: self.terms().not(p), proof: self.lemma(Name::EXT_MT, &[inst, h]), generation }
        }
        // the theorem proves `a = b` outright
        None => NewFact { prop: self.mk_eq(a, b)?, proof: inst, generation },
      };
      log::debug!(target: "grind::internalize", "ext {thm}: {}", self.pp(fact.prop));
      self.goal.new_facts.push_back(fact);
    }
    Ok(())
  }

  /// Match the conclusion of the extensionality theorem `thm` against `a = b`, returning
  /// the instantiation of its variables and the instantiated premise, if any.
  fn match_ext_thm(&mut self, thm: Name, a: TermId, b: TermId) -> Result<Option<(Vec<TermId>, Option<TermId>)>> {
    let ty = self.ctx.env.find(thm)?.ty;
    let s = self.terms();
    let mut binders = vec![];
    let mut body = ty;
    while let TermKind::Forall(_, d, b) = *s.kind(body) { binders.push((d, b)); body = b }
    // the last binder is the premise when nothing depends on it
    let (premise, concl, nvars) = match binders.last() {
      Some(&(p, c)) if !s.has_loose_bvar(c, 0) => (Some(p), s.lower_loose_bvars(c, 1, 1), binders.len() - 1),
      _ => (None, body, binders.len()),
    };
    let Some((_, l, r)) = s.match_eq(concl) else { return Ok(None) };
    let mut subst = vec![None; nvars];
    if !match_pattern(s, l, a, &mut subst) || !match_pattern(s, r, b, &mut subst) { return Ok(None) }
    let Some(vals) = subst.into_iter().rev().collect::<Option<Vec<_>>>() else { return Ok(None) };
    let premise = premise.map(|p| s.instantiate_rev(p, &vals));
    Ok(Some((vals, premise)))
  }
}

/// Syntactic first-order matching of `pat` (whose loose variable `#j` is `subst[j]`)
/// against the closed term `e`. Constants match by name only.
fn match_pattern(s: &TermStore, pat: TermId, e: TermId, subst: &mut [Option<TermId>]) -> bool {
  if !s.has_loose_bvars(pat) { return pat == e || s.const_name(pat).is_some() && s.const_name(pat) == s.const_name(e) }
  match (s.kind(pat), s.kind(e)) {
    (&TermKind::BVar(j), _) => match subst.get_mut(j as usize) {
      Some(slot @ None) => { *slot = Some(e); true }
      Some(Some(v)) => *v == e,
      None => false,
    },
    (&TermKind::App(f, x), &TermKind::App(g, y)) => match_pattern(s, f, g, subst) && match_pattern(s, x, y, subst),
    _ => false,
  }
}

fn and_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::AND, 2) else { return Ok(()) };
  let (a, b) = (args[0], args[1]);
  if m.goal.is_eq_true(a) {
    let h = m.mk_eq_true_proof(a)?;
    let h = m.lemma(Name::AND_EQ_OF_TRUE_LEFT, &[h]);
    m.push_eq(e, b, h)
  } else if m.goal.is_eq_true(b) {
    let h = m.mk_eq_true_proof(b)?;
    let h = m.lemma(Name::AND_EQ_OF_TRUE_RIGHT, &[h]);
    m.push_eq(e, a, h)
  } else if m.goal.is_eq_false(a) {
    let h = m.mk_eq_false_proof(a)?;
    let h = m.lemma(Name::AND_EQ_OF_FALSE_LEFT, &[h]);
    m.push_eq_false(e, h)
  } else if m.goal.is_eq_false(b) {
    let h = m.mk_eq_false_proof(b)?;
    let h = m.lemma(Name::AND_EQ_OF_FALSE_RIGHT, &[h]);
    m.push_eq_false(e, h)
  }
  Ok(())
}

fn and_down(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::AND, 2) else { return Ok(()) };
  if m.goal.is_eq_true(e) {
    let h = m.mk_eq_true_proof(e)?;
    let ha = m.lemma(Name::AND_LEFT_OF_TRUE, &[h]);
    m.push_eq_true(args[0], ha);
    let hb = m.lemma(Name::AND_RIGHT_OF_TRUE, &[h]);
    m.push_eq_true(args[1], hb);
  }
  Ok(())
}

fn or_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::OR, 2) else { return Ok(()) };
  let (a, b) = (args[0], args[1]);
  if m.goal.is_eq_false(a) {
    let h = m.mk_eq_false_proof(a)?;
    let h = m.lemma(Name::OR_EQ_OF_FALSE_LEFT, &[h]);
    m.push_eq(e, b, h)
  } else if m.goal.is_eq_false(b) {
    let h = m.mk_eq_false_proof(b)?;
    let h = m.lemma(Name::OR_EQ_OF_FALSE_RIGHT, &[h]);
    m.push_eq(e, a, h)
  } else if m.goal.is_eq_true(a) {
    let h = m.mk_eq_true_proof(a)?;
    let h = m.lemma(Name::OR_EQ_OF_TRUE_LEFT, &[h]);
    m.push_eq_true(e, h)
  } else if m.goal.is_eq_true(b) {
    let h = m.mk_eq_true_proof(b)?;
    let h = m.lemma(Name::OR_EQ_OF_TRUE_RIGHT, &[h]);
    m.push_eq_true(e, h)
  }
  Ok(())
}

fn or_down(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::OR, 2) else { return Ok(()) };
  if m.goal.is_eq_false(e) {
    let h = m.mk_eq_false_proof(e)?;
    let ha = m.lemma(Name::OR_LEFT_OF_FALSE, &[h]);
    m.push_eq_false(args[0], ha);
    let hb = m.lemma(Name::OR_RIGHT_OF_FALSE, &[h]);
    m.push_eq_false(args[1], hb);
  }
  Ok(())
}

/// `¬a` and `a` in the same class is a contradiction.
fn check_not_self(m: &mut GoalM<'_>, e: TermId, a: TermId) -> Result<bool> {
  if !m.goal.is_eqv(e, a) { return Ok(false) }
  let h = m.mk_eq_proof(e, a)?;
  let h = m.lemma(Name::FALSE_OF_NOT_EQ_SELF, &[h]);
  m.close_goal(h);
  Ok(true)
}

fn not_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(a) = m.ctx.terms.match_not(e) else { return Ok(()) };
  if m.goal.is_eq_false(a) {
    let h = m.mk_eq_false_proof(a)?;
    let h = m.lemma(Name::NOT_EQ_OF_FALSE, &[h]);
    m.push_eq_true(e, h)
  } else if m.goal.is_eq_true(a) {
    let h = m.mk_eq_true_proof(a)?;
    let h = m.lemma(Name::NOT_EQ_OF_TRUE, &[h]);
    m.push_eq_false(e, h)
  } else {
    check_not_self(m, e, a)?;
  }
  Ok(())
}

fn not_down(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(a) = m.ctx.terms.match_not(e) else { return Ok(()) };
  if check_not_self(m, e, a)? { return Ok(()) }
  if m.goal.is_eq_false(e) {
    let h = m.mk_eq_false_proof(e)?;
    let h = m.lemma(Name::EQ_TRUE_OF_NOT_FALSE, &[h]);
    m.push_eq_true(a, h)
  } else if m.goal.is_eq_true(e) {
    let h = m.mk_eq_true_proof(e)?;
    let h = m.lemma(Name::EQ_FALSE_OF_NOT_TRUE, &[h]);
    m.push_eq_false(a, h)
  }
  Ok(())
}

/// Are the roots of `a` and `b` distinct values: distinct literals, distinct constructor
/// applications, or `True` and `False`?
fn distinct_values(m: &GoalM<'_>, a: TermId, b: TermId) -> Option<(TermId, TermId)> {
  let (ra, rb) = (m.goal.get_root_enode(a)?, m.goal.get_root_enode(b)?);
  if ra.term == rb.term { return None }
  if ra.interpreted() && rb.interpreted() { return Some((ra.term, rb.term)) }
  if ra.ctor() && rb.ctor() {
    let s = &m.ctx.terms;
    if s.head_const(ra.term) != s.head_const(rb.term) { return Some((ra.term, rb.term)) }
  }
  None
}

fn eq_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some((ty, a, b)) = m.ctx.terms.match_eq(e) else { return Ok(()) };
  if m.goal.is_eqv(a, b) {
    let h = m.mk_eq_proof(a, b)?;
    let h = m.lemma(Name::EQ_TRUE, &[h]);
    m.push_eq_true(e, h)
  } else if let Some((ra, rb)) = distinct_values(m, a, b) {
    let ha = m.mk_eq_proof(a, ra)?;
    let hb = m.mk_eq_proof(b, rb)?;
    let h = m.lemma(Name::EQ_FALSE_OF_DISTINCT, &[ra, rb, ha, hb]);
    m.push_eq_false(e, h)
  } else if ty == TermStore::PROP && m.goal.is_eq_true(a) {
    let h = m.mk_eq_true_proof(a)?;
    let h = m.lemma(Name::EQ_EQ_OF_TRUE_LEFT, &[h]);
    m.push_eq(e, b, h)
  } else if ty == TermStore::PROP && m.goal.is_eq_true(b) {
    let h = m.mk_eq_true_proof(b)?;
    let h = m.lemma(Name::EQ_EQ_OF_TRUE_RIGHT, &[h]);
    m.push_eq(e, a, h)
  }
  Ok(())
}

fn eq_down(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some((ty, a, b)) = m.ctx.terms.match_eq(e) else { return Ok(()) };
  if m.goal.is_eq_true(e) {
    let h = m.mk_of_eq_true(e)?;
    m.push_eq(a, b, h)
  } else if m.goal.is_eq_false(e) && m.ctx.config.ext {
    m.propagate_ext(e, ty, a, b)?
  }
  Ok(())
}

fn heq_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some((_, a, _, b)) = m.ctx.terms.match_heq(e) else { return Ok(()) };
  if m.goal.is_eqv(a, b) {
    let h = m.mk_heq_proof(a, b)?;
    let h = m.lemma(Name::HEQ_EQ_TRUE, &[h]);
    m.push_eq_true(e, h)
  }
  Ok(())
}

fn heq_down(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some((ta, a, tb, b)) = m.ctx.terms.match_heq(e) else { return Ok(()) };
  if m.goal.is_eq_true(e) {
    let h = m.mk_of_eq_true(e)?;
    m.push_heq(a, b, h);
    if ta != tb && m.goal.is_internalized(ta) && m.goal.is_internalized(tb) {
      let h = m.lemma(Name::TYPE_EQ_OF_HEQ, &[h]);
      m.push_eq(ta, tb, h)
    }
  }
  Ok(())
}

fn ite_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::ITE, 5) else { return Ok(()) };
  let (c, a, b) = (args[1], args[3], args[4]);
  if m.goal.is_eq_true(c) {
    let h = m.mk_eq_true_proof(c)?;
    let h = m.lemma(Name::ITE_COND_TRUE, &[a, b, h]);
    m.push_eq(e, a, h)
  } else if m.goal.is_eq_false(c) {
    let h = m.mk_eq_false_proof(c)?;
    let h = m.lemma(Name::ITE_COND_FALSE, &[a, b, h]);
    m.push_eq(e, b, h)
  } else {
    m.add_split_candidate(super::SplitInfo::Cond(c))
  }
  Ok(())
}

fn dite_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  let Some(args) = m.ctx.terms.match_app(e, Name::DITE, 5) else { return Ok(()) };
  let (c, t, f) = (args[1], args[3], args[4]);
  let (branch, ev, h) = if m.goal.is_eq_true(c) {
    let h = m.mk_eq_true_proof(c)?;
    let ev = m.mk_of_eq_true(c)?;
    (t, ev, m.lemma(Name::DITE_COND_TRUE, &[t, f, h]))
  } else if m.goal.is_eq_false(c) {
    let h = m.mk_eq_false_proof(c)?;
    let ev = m.mk_of_eq_false(c)?;
    (f, ev, m.lemma(Name::DITE_COND_FALSE, &[t, f, h]))
  } else {
    m.add_split_candidate(super::SplitInfo::Cond(c));
    return Ok(())
  };
  let r = m.terms().app(branch, ev);
  let r = m.terms().head_beta(r);
  let r2 = m.preprocess(r)?;
  let generation = m.goal.generation(e);
  m.internalize(r2.expr, generation, Some(e))?;
  let h = match r2.proof {
    Some(p) => m.lemma(Name::EQ_TRANS, &[h, p]),
    None => h,
  };
  m.push_eq(e, r2.expr, h);
  Ok(())
}

fn match_cond_up(m: &mut GoalM<'_>, e: TermId) -> Result<()> {
  if m.goal.is_eq_true(e) { return Ok(()) }
  let Some(args) = m.ctx.terms.match_app(e, Name::MATCH_COND, 1) else { return Ok(()) };
  for (l, p) in m.match_cond_eqs(args[0]) {
    if !m.goal.is_internalized(l) { continue }
    let r = m.goal.get_root(l);
    if m.clashes(r, p) {
      log::trace!(target: "grind::match", "{} ≠ {}", m.pp(l), m.pp(p));
      let h = m.mk_eq_proof(l, r)?;
      let h = m.lemma(Name::MATCH_COND_TRUE, &[e, h]);
      m.push_eq_true(e, h);
      break
    }
  }
  Ok(())
}

impl GoalM<'_> {
  /// The equations `lᵢ = pᵢ` of a match condition `∀ xs, l₁ = p₁ → … → False`. The
  /// `pᵢ` may mention the bound variables; the `lᵢ` returned are closed.
  pub(super) fn match_cond_eqs(&self, body: TermId) -> Vec<(TermId, TermId)> {
    let s = &self.ctx.terms;
    let mut out = vec![];
    let mut e = body;
    while let TermKind::Forall(_, d, b) = *s.kind(e) {
      if let Some((_, l, p)) = s.match_eq(d) {
        if !s.has_loose_bvars(l) { out.push((l, p)) }
      } else if let Some((_, l, _, p)) = s.match_heq(d) {
        if !s.has_loose_bvars(l) { out.push((l, p)) }
      }
      e = b;
    }
    out
  }

  /// Is the class root `r` (a constructor application or literal) incompatible with the
  /// pattern `p`?
  pub(super) fn clashes(&self, r: TermId, p: TermId) -> bool {
    let s = &self.ctx.terms;
    let Some(n) = self.goal.get_enode(r) else { return false };
    match (s.kind(r), s.kind(p)) {
      (TermKind::Lit(a), TermKind::Lit(b)) => a != b,
      _ if n.ctor() => {
        let (c1, c2) = (s.head_const(r), s.head_const(p));
        c2.is_some_and(|c| self.ctx.env.ctor(c).is_some()) && c1 != c2
      }
      _ => false,
    }
  }
}
