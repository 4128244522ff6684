//! The congruence table.
//!
//! Applications are bucketed by a hash of the roots of their head and relevant arguments.
//! Instance arguments and proofs are not relevant: instances are assumed canonical and
//! proofs are equal by proof irrelevance. `Eq` applications hash their sides
//! symmetrically, so that `a = b` and `b = a` are detected as congruent.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use crate::error::Result;
use crate::name::Name;
use crate::term::{BinderInfo, TermId, TermKind};
use super::GoalM;
use super::types::ENodeFlags;

impl GoalM<'_> {
  /// For a head `f` applied to `n` arguments, which argument positions take part in
  /// congruence.
  pub(super) fn relevant_args(&mut self, f: TermId, n: usize) -> Result<Rc<[bool]>> {
    if let Some(r) = self.ctx.relevance.get(&(f, n)) { return Ok(r.clone()) }
    let bis = self.ctx.tc().binder_infos(f, n)?;
    let r: Rc<[bool]> = (0..n).map(|i| bis.get(i) != Some(&BinderInfo::InstImplicit)).collect();
    self.ctx.relevance.insert((f, n), r.clone());
    Ok(r)
  }

  /// The root of the head of an application. Constant heads are not tracked by the
  /// E-graph as parents, so they hash as themselves.
  fn head_root(&self, f: TermId) -> TermId {
    if let TermKind::Const(..) = self.ctx.terms.kind(f) { f } else { self.goal.get_root(f) }
  }

  fn congr_hash(&mut self, e: TermId) -> Result<u64> {
    let mut h = DefaultHasher::new();
    if let Some((_, a, b)) = self.ctx.terms.match_eq(e) {
      let (ra, rb) = (self.goal.get_root(a), self.goal.get_root(b));
      (Name::EQ, ra.min(rb), ra.max(rb)).hash(&mut h);
    } else {
      let (f, args) = self.ctx.terms.app_fn_args(e);
      let mask = self.relevant_args(f, args.len())?;
      self.head_root(f).hash(&mut h);
      args.len().hash(&mut h);
      for (i, &a) in args.iter().enumerate() {
        if mask[i] && !self.is_proof(a)? { self.goal.get_root(a).hash(&mut h) }
      }
    }
    Ok(h.finish())
  }

  /// Are the applications `a` and `b` congruent in the current E-graph?
  pub fn is_congruent(&mut self, a: TermId, b: TermId) -> Result<bool> {
    let s = &self.ctx.terms;
    if let (Some((_, a1, a2)), Some((_, b1, b2))) = (s.match_eq(a), s.match_eq(b)) {
      let g = &*self.goal;
      return Ok(g.is_eqv(a1, b1) && g.is_eqv(a2, b2) || g.is_eqv(a1, b2) && g.is_eqv(a2, b1))
    }
    let ((f, xs), (g, ys)) = (s.app_fn_args(a), s.app_fn_args(b));
    if xs.len() != ys.len() || self.head_root(f) != self.head_root(g) { return Ok(false) }
    let mask = self.relevant_args(f, xs.len())?;
    for (i, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
      if !mask[i] || self.is_proof(x)? { continue }
      if !self.goal.is_eqv(x, y) { return Ok(false) }
      if x != y && self.goal.get_root_enode(x).is_some_and(|n| n.flags.contains(ENodeFlags::HEQ_PROOFS)) {
        // the class was built with heterogeneous equalities, so equal roots do not
        // imply equal types
        let (tx, ty) = (self.infer(x)?, self.infer(y)?);
        if tx != ty && !self.goal.is_eqv(tx, ty) { return Ok(false) }
      }
    }
    Ok(true)
  }

  /// Insert the application `e` into the congruence table, or, if it is congruent to an
  /// application already there, schedule their union.
  pub fn add_congr_table(&mut self, e: TermId) -> Result<()> {
    self.enode_mut(e).flags |= ENodeFlags::CONGR_RELEVANT;
    let h = self.congr_hash(e)?;
    let bucket = self.goal.congr_table.get(&h).cloned().unwrap_or_default();
    for other in bucket {
      if other == e || !self.is_congruent(e, other)? { continue }
      log::trace!(target: "grind::congr", "{} ≡ {}", self.pp(e), self.pp(other));
      self.enode_mut(e).congr = other;
      let heq = self.infer(e)? != self.infer(other)?;
      let p = self.terms().konst(Name::CONGR_PLACEHOLDER, &[]);
      self.ctx.stats.congrs += 1;
      self.push_eq_core(e, other, p, heq);
      return Ok(())
    }
    self.enode_mut(e).congr = e;
    self.goal.congr_table.entry(h).or_insert_with(Default::default).push(e);
    Ok(())
  }

  /// Remove the congruence roots among the parents of the class `root` from the table,
  /// before the roots of their arguments change. Returns all the parents.
  pub(super) fn remove_parents(&mut self, root: TermId) -> Result<Vec<TermId>> {
    let parents: Vec<_> = self.enode(root).parents.iter().copied().collect();
    for &p in &parents {
      let n = self.enode(p);
      if !n.flags.contains(ENodeFlags::CONGR_RELEVANT) || !n.is_congr_root() { continue }
      let h = self.congr_hash(p)?;
      if let Some(bucket) = self.goal.congr_table.get_mut(&h) {
        bucket.retain(|x| *x != p);
        if bucket.is_empty() { self.goal.congr_table.remove(&h); }
      }
    }
    Ok(parents)
  }

  /// Put the parents removed by [`remove_parents`](Self::remove_parents) back, now that
  /// the classes have been merged. This is where new congruences are found.
  pub(super) fn reinsert_parents(&mut self, parents: &[TermId]) -> Result<()> {
    for &p in parents {
      let n = self.enode(p);
      if n.flags.contains(ENodeFlags::CONGR_RELEVANT) && n.is_congr_root() { self.add_congr_table(p)? }
    }
    Ok(())
  }
}
