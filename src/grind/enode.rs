//! E-graph nodes and the union-find structure over them.
//!
//! Every node stores its root directly, and union rewrites the root pointers of the
//! smaller class, so `get_root` never mutates. Classes are threaded as cyclic lists through
//! the `next` field so that two classes can be spliced in constant time.

use grind_util::u32_as_usize;
use crate::error::Result;
use crate::name::Name;
use crate::term::{TermId, TermKind, TermStore};
use super::GoalM;
use super::types::{ENode, ENodeFlags, HeadIndex, PendingEq};

impl GoalM<'_> {
  /// The node of an internalized term.
  ///
  /// # Panics
  /// If `e` has not been internalized.
  #[must_use] pub fn enode(&self, e: TermId) -> &ENode { &self.goal.enodes[&e] }

  pub(super) fn enode_mut(&mut self, e: TermId) -> &mut ENode { &mut self.goal.enodes[&e] }

  /// Is `e` a fully applied constructor (or a constructor constant without arguments)?
  #[must_use] pub fn is_ctor_app(&self, e: TermId) -> bool {
    let s = &self.ctx.terms;
    let Some(c) = s.head_const(e).and_then(|c| self.ctx.env.ctor(c)) else { return false };
    s.app_num_args(e) == (c.num_params + c.num_fields) as usize
  }

  /// Create the node for a term that has not been internalized yet.
  pub fn mk_enode(&mut self, e: TermId, generation: u32) {
    if self.goal.is_internalized(e) { unreachable!("mk_enode: {e:?} is already internalized") }
    let mut flags = match self.ctx.terms.kind(e) {
      TermKind::Lit(_) => ENodeFlags::INTERPRETED,
      TermKind::Lam(..) => ENodeFlags::HAS_LAMBDAS,
      _ => ENodeFlags::empty(),
    };
    if e == TermStore::TRUE { flags |= ENodeFlags::INTERPRETED | ENodeFlags::EQ_TRUE }
    if e == TermStore::FALSE { flags |= ENodeFlags::INTERPRETED | ENodeFlags::EQ_FALSE }
    if self.is_ctor_app(e) { flags |= ENodeFlags::CTOR }
    let idx = self.goal.next_idx;
    self.goal.next_idx += 1;
    self.goal.enodes.insert(e, ENode {
      term: e, root: e, next: e, congr: e,
      target: None, proof: None, flipped: false, heq: false,
      size: 1, flags, generation, idx,
      parents: im::OrdSet::new(),
    });
    self.ctx.stats.enodes += 1;
    log::trace!(target: "grind::internalize", "[{idx}] {}", self.pp(e));
  }

  /// Record `parent` as a parent of the class of `child`.
  pub fn register_parent(&mut self, parent: TermId, child: TermId) {
    if !self.goal.is_internalized(child) { return }
    let root = self.goal.get_root(child);
    self.enode_mut(root).parents.insert(parent);
  }

  /// Index an application by its head symbol.
  pub fn update_app_map(&mut self, e: TermId) {
    let f = self.ctx.terms.app_fn(e);
    let h = match *self.ctx.terms.kind(f) {
      TermKind::Const(n, _) => HeadIndex::Const(n),
      TermKind::FVar(x) => HeadIndex::FVar(x),
      _ => HeadIndex::Other(f),
    };
    self.goal.app_map.entry(h).or_insert_with(im::Vector::new).push_back(e);
  }

  /// Schedule the union of the classes of `lhs` and `rhs`, justified by `proof`.
  pub fn push_eq_core(&mut self, lhs: TermId, rhs: TermId, proof: TermId, heq: bool) {
    if lhs == rhs { return }
    self.goal.pending.push_back(PendingEq { lhs, rhs, proof, heq })
  }

  /// Schedule `lhs = rhs`.
  pub fn push_eq(&mut self, lhs: TermId, rhs: TermId, proof: TermId) { self.push_eq_core(lhs, rhs, proof, false) }

  /// Schedule `HEq lhs rhs`.
  pub fn push_heq(&mut self, lhs: TermId, rhs: TermId, proof: TermId) { self.push_eq_core(lhs, rhs, proof, true) }

  /// Schedule `e = True`.
  pub fn push_eq_true(&mut self, e: TermId, proof: TermId) { self.push_eq(e, TermStore::TRUE, proof) }

  /// Schedule `e = False`.
  pub fn push_eq_false(&mut self, e: TermId, proof: TermId) { self.push_eq(e, TermStore::FALSE, proof) }

  /// Merge all pending equalities, in the order they were scheduled. Merging may schedule
  /// further equalities, which are processed by the same loop.
  pub fn process_new_eqs(&mut self) -> Result<()> {
    while let Some(p) = self.goal.pending.pop_front() {
      if self.goal.inconsistent { self.goal.pending.clear(); break }
      self.add_eq_step(p)?;
    }
    Ok(())
  }

  fn add_eq_step(&mut self, PendingEq { lhs, rhs, proof, heq }: PendingEq) -> Result<()> {
    for e in [lhs, rhs] {
      if !self.goal.is_internalized(e) {
        let generation = self.goal.generation(lhs).max(self.goal.generation(rhs));
        self.internalize(e, generation, None)?;
      }
    }
    let (lr, rr) = (self.goal.get_root(lhs), self.goal.get_root(rhs));
    if lr == rr { return Ok(()) }
    log::trace!(target: "grind::eqc", "{} {} {}", self.pp(lhs), if heq { "≍" } else { "=" }, self.pp(rhs));
    let (ln, rn) = (self.enode(lr), self.enode(rr));
    if ln.interpreted() && !rn.interpreted() ||
       ln.ctor() && !rn.ctor() ||
       ln.size > rn.size && !rn.interpreted() && !rn.ctor() {
      self.merge(rhs, lhs, proof, true, heq)
    } else {
      self.merge(lhs, rhs, proof, false, heq)
    }
  }

  /// Merge the class of `lhs` into the class of `rhs`, whose root stays the root.
  fn merge(&mut self, lhs: TermId, rhs: TermId, proof: TermId, flipped: bool, heq: bool) -> Result<()> {
    let (lr, rr) = (self.goal.get_root(lhs), self.goal.get_root(rhs));
    let (lroot, rroot) = (self.enode(lr).clone(), self.enode(rr).clone());
    let true_eq_false = matches!((lr, rr),
      (TermStore::TRUE, TermStore::FALSE) | (TermStore::FALSE, TermStore::TRUE));
    let value_inconsistency = lroot.interpreted() && rroot.interpreted() && !true_eq_false;

    self.invert_trans(lhs);
    let n = self.enode_mut(lhs);
    (n.target, n.proof, n.flipped, n.heq) = (Some(rhs), Some(proof), flipped, heq);

    let parents = self.remove_parents(lr)?;
    let members = self.goal.eqc(lr);
    for &x in &members { self.enode_mut(x).root = rr }
    self.enode_mut(lr).next = rroot.next;
    let r = self.enode_mut(rr);
    r.next = lroot.next;
    r.size += lroot.size;
    r.flags |= lroot.flags &
      (ENodeFlags::EQ_TRUE | ENodeFlags::EQ_FALSE | ENodeFlags::HAS_LAMBDAS | ENodeFlags::HEQ_PROOFS);
    if heq { r.flags |= ENodeFlags::HEQ_PROOFS }
    r.parents = r.parents.clone().union(lroot.parents.clone());
    let has_lambdas = r.flags.contains(ENodeFlags::HAS_LAMBDAS);
    self.ctx.stats.merges += 1;
    self.reinsert_parents(&parents)?;

    if true_eq_false {
      let h = self.mk_eq_proof(TermStore::TRUE, TermStore::FALSE)?;
      let h = self.lemma(Name::TRUE_NE_FALSE, &[h]);
      self.close_goal(h);
      return Ok(())
    }
    if value_inconsistency {
      let h = self.mk_eq_proof(lr, rr)?;
      let h = self.lemma(Name::LIT_NE, &[lr, rr, h]);
      self.close_goal(h);
      return Ok(())
    }
    if lroot.ctor() && rroot.ctor() { self.propagate_ctor(lr, rr)? }
    if rr == TermStore::TRUE || rr == TermStore::FALSE {
      for x in members { self.propagate_down(x)? }
    }
    if has_lambdas && (lroot.flags.contains(ENodeFlags::HAS_LAMBDAS) != rroot.flags.contains(ENodeFlags::HAS_LAMBDAS)) {
      let all_parents = self.enode(rr).parents.clone();
      for p in all_parents { self.propagate_beta(p)? }
    }
    for p in parents { self.propagate_up(p)? }
    Ok(())
  }

  /// Reverse the proof forest path from `e` to its root, making `e` the root of its tree.
  fn invert_trans(&mut self, e: TermId) {
    let (mut target, mut proof, mut flipped, mut heq) = (None, None, false, false);
    let mut cur = Some(e);
    while let Some(x) = cur {
      let n = self.enode_mut(x);
      let old = (n.target, n.proof, n.flipped, n.heq);
      (n.target, n.proof, n.flipped, n.heq) = (target, proof, flipped, heq);
      (target, proof, flipped, heq) = (Some(x), old.1, !old.2, old.3);
      cur = old.0;
    }
  }

  /// Two constructor applications were merged: equal constructors have equal fields,
  /// distinct constructors are a contradiction.
  fn propagate_ctor(&mut self, a: TermId, b: TermId) -> Result<()> {
    let (fa, aargs) = self.ctx.terms.app_fn_args(a);
    let (fb, bargs) = self.ctx.terms.app_fn_args(b);
    if fa == fb || self.ctx.terms.const_name(fa) == self.ctx.terms.const_name(fb) {
      let Some(c) = self.ctx.terms.const_name(fa).and_then(|c| self.ctx.env.ctor(c)) else { return Ok(()) };
      let (np, nf) = (c.num_params, c.num_fields);
      let h = self.mk_eq_proof(a, b)?;
      for i in np..np + nf {
        let (x, y) = (aargs[u32_as_usize(i)], bargs[u32_as_usize(i)]);
        if x == y || self.is_proof(x)? { continue }
        let idx = self.terms().nat_lit(i - np);
        let p = self.lemma(Name::CTOR_INJ, &[idx, h]);
        let heq = self.infer(x)? != self.infer(y)?;
        self.push_eq_core(x, y, p, heq);
      }
    } else {
      let h = self.mk_eq_proof(a, b)?;
      let h = self.lemma(Name::CTOR_NE, &[a, b, h]);
      self.close_goal(h);
    }
    Ok(())
  }

  /// If the function of the application `p` is in a class with lambdas, equate `p` with
  /// the beta reduced applications of those lambdas.
  pub(super) fn propagate_beta(&mut self, p: TermId) -> Result<()> {
    let (f, args) = self.ctx.terms.app_fn_args(p);
    if args.is_empty() || !self.goal.is_internalized(f) ||
      matches!(self.ctx.terms.kind(f), TermKind::Lam(..) | TermKind::Const(..)) ||
      !self.goal.get_root_enode(f).is_some_and(|n| n.flags.contains(ENodeFlags::HAS_LAMBDAS)) {
      return Ok(())
    }
    let generation = self.goal.generation(p);
    for lam in self.goal.eqc(f) {
      if !matches!(self.ctx.terms.kind(lam), TermKind::Lam(..)) { continue }
      let e = self.terms().mk_app(lam, &args);
      let r = self.terms().head_beta(e);
      self.internalize(r, generation, None)?;
      let h = self.mk_eq_proof(f, lam)?;
      let mut hargs = vec![h];
      hargs.extend_from_slice(&args);
      let h = self.lemma(Name::BETA, &hargs);
      self.push_eq(p, r, h);
    }
    Ok(())
  }

  /// Record a proof of `False`: the goal is solved.
  pub fn close_goal(&mut self, proof: TermId) {
    if self.goal.inconsistent { return }
    log::debug!(target: "grind::eqc", "closed ?m.{}", self.goal.mvar.into_inner());
    self.goal.inconsistent = true;
    self.goal.pending.clear();
    let target = self.target();
    let elim = self.terms().mk_const_app(Name::FALSE_ELIM, &[target, proof]);
    self.ctx.mctx.assign(self.goal.mvar, elim);
  }
}
