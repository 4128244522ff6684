//! Internalization: adding terms to the E-graph.
//!
//! Internalizing a term creates nodes for it and its relevant subterms, registers it with
//! the congruence table and its children's parent sets, and runs the up propagators on it.
//! Terms are expected to be preprocessed: annotations, kernel projections and assigned
//! metavariables are errors here.

use crate::error::{GrindError, Result};
use crate::name::Name;
use crate::term::{TermId, TermKind};
use super::GoalM;

/// The position of the cast term in the arguments of each cast-like function, and its
/// arity.
const CASTS: [(Name, usize, usize); 5] = [
  (Name::CAST, 4, 3),
  (Name::EQ_MPR, 4, 3),
  (Name::EQ_REC, 6, 3),
  (Name::EQ_NDREC, 6, 3),
  (Name::EQ_REC_ON, 6, 5),
];

impl GoalM<'_> {
  /// Add `e` to the E-graph with the given generation. `parent` is the term whose
  /// internalization caused this one, if any.
  pub fn internalize(&mut self, e: TermId, generation: u32, parent: Option<TermId>) -> Result<()> {
    if self.goal.is_internalized(e) { return Ok(()) }
    let max = self.ctx.config.max_rec_depth;
    if self.ctx.depth >= max { return Err(GrindError::MaxRecDepth(max)) }
    self.ctx.depth += 1;
    let r = self.internalize_core(e, generation, parent);
    self.ctx.depth -= 1;
    r?;
    self.check_and_add_split_candidate(e)?;
    self.add_match_eqns(e)
  }

  fn internalize_core(&mut self, e: TermId, generation: u32, parent: Option<TermId>) -> Result<()> {
    match *self.ctx.terms.kind(e) {
      TermKind::BVar(i) => return Err(GrindError::UnexpectedBVar(i)),
      TermKind::MVar(m) => return Err(GrindError::UnexpectedMVar(m)),
      TermKind::MData(..) => return Err(GrindError::UnexpectedMData(e)),
      TermKind::Proj(..) => return Err(GrindError::UnexpectedProj(e)),
      TermKind::Lit(_) => {
        self.mk_enode(e, generation);
        self.arith_internalize(e, parent)
      }
      TermKind::FVar(_) | TermKind::Const(..) => {
        self.mk_enode(e, generation);
        self.propagate_unit_like(e, generation)?
      }
      TermKind::Sort(_) | TermKind::Lam(..) => self.mk_enode(e, generation),
      TermKind::Forall(..) => {
        self.mk_enode(e, generation);
        if_chain! {
          if let Some((p, q)) = self.ctx.terms.match_arrow(e);
          if self.is_prop(p)? && self.is_prop(q)?;
          then {
            self.internalize(p, generation, Some(e))?;
            self.internalize(q, generation, Some(e))?;
            self.register_parent(e, p);
            self.register_parent(e, q);
            self.propagate_up(e)?
          }
        }
      }
      TermKind::Let(_, v, b) => {
        let body = self.terms().instantiate1(b, v);
        self.internalize_let(e, v, body, generation)?
      }
      TermKind::App(..) => {
        if let Some(args) = self.ctx.terms.match_app(e, Name::LET_FUN, 4) {
          let body = self.terms().app(args[3], args[2]);
          let body = self.terms().head_beta(body);
          return self.internalize_let(e, args[2], body, generation)
        }
        if let Some(args) = self.ctx.terms.match_app(e, Name::MATCH_COND, 1) {
          return self.internalize_match_cond(e, args[0], generation)
        }
        self.internalize_app(e, generation, parent)?
      }
    }
    Ok(())
  }

  /// `let x := v; b` and `letFun v (fun x => b)` are equal to `b[v/x]`.
  fn internalize_let(&mut self, e: TermId, v: TermId, body: TermId, generation: u32) -> Result<()> {
    self.mk_enode(e, generation);
    if !self.is_proof(v)? { self.internalize(v, generation, Some(e))? }
    self.internalize(body, generation, Some(e))?;
    let h = self.lemma(Name::EQ_REFL, &[e]);
    self.push_eq(e, body, h);
    Ok(())
  }

  /// A match condition only depends on the left hand sides of its equations. With no
  /// equations it is just the proposition it wraps.
  fn internalize_match_cond(&mut self, e: TermId, body: TermId, generation: u32) -> Result<()> {
    self.mk_enode(e, generation);
    let eqs = self.match_cond_eqs(body);
    if eqs.is_empty() {
      self.internalize(body, generation, Some(e))?;
      let h = self.lemma(Name::EQ_REFL, &[e]);
      self.push_eq(e, body, h);
      return Ok(())
    }
    for (l, _) in eqs {
      self.internalize(l, generation, Some(e))?;
      self.register_parent(e, l);
    }
    self.propagate_up(e)
  }

  fn internalize_app(&mut self, e: TermId, generation: u32, parent: Option<TermId>) -> Result<()> {
    let (f, args) = self.ctx.terms.app_fn_args(e);
    let const_head = matches!(self.ctx.terms.kind(f), TermKind::Const(..));
    if !const_head { self.internalize(f, generation, Some(e))? }
    for &a in &args {
      if !self.is_proof(a)? { self.internalize(a, generation, Some(e))? }
    }
    self.mk_enode(e, generation);
    if !const_head { self.register_parent(e, f) }
    for &a in &args { self.register_parent(e, a) }
    self.add_congr_table(e)?;
    self.update_app_map(e);
    self.arith_internalize(e, parent);
    self.push_cast_heqs(e)?;
    self.propagate_up(e)?;
    self.propagate_beta(e)
  }

  /// Tell the arithmetic procedure about `e`, queueing the facts it derives.
  fn arith_internalize(&mut self, e: TermId, parent: Option<TermId>) {
    let facts = self.ctx.arith.internalize(&mut self.ctx.terms, &self.ctx.env, e, parent);
    self.goal.new_facts.extend(facts)
  }

  /// A cast `cast h a` is heterogeneously equal to `a`.
  fn push_cast_heqs(&mut self, e: TermId) -> Result<()> {
    let Some(n) = self.ctx.terms.head_const(e) else { return Ok(()) };
    let Some(&(_, arity, i)) = CASTS.iter().find(|c| c.0 == n) else { return Ok(()) };
    let args = self.ctx.terms.app_args(e);
    if args.len() != arity { return Ok(()) }
    let a = args[i];
    if !self.goal.is_internalized(a) { return Ok(()) }
    let h = self.lemma(Name::CAST_HEQ, &[e, a]);
    self.push_heq(e, a, h);
    Ok(())
  }

  /// An element of a structure without fields is equal to its constructor.
  fn propagate_unit_like(&mut self, e: TermId, generation: u32) -> Result<()> {
    if self.is_ctor_app(e) { return Ok(()) }
    let ty = self.infer(e)?;
    let ty = self.ctx.tc().whnf(ty)?;
    let (head, params) = self.ctx.terms.app_fn_args(ty);
    let TermKind::Const(n, ref ls) = *self.ctx.terms.kind(head) else { return Ok(()) };
    let Some(st) = self.ctx.env.structure(n) else { return Ok(()) };
    if !st.projs.is_empty() { return Ok(()) }
    let (c, ls) = (st.ctor, ls.clone());
    if self.is_prop(ty)? { return Ok(()) }
    let c = self.terms().konst(c, &ls);
    let c = self.terms().mk_app(c, &params);
    self.internalize(c, generation, Some(e))?;
    log::trace!(target: "grind::internalize", "{} is unit-like", self.pp(e));
    let h = self.lemma(Name::UNIT_ETA, &[e]);
    self.push_eq(e, c, h);
    Ok(())
  }
}
