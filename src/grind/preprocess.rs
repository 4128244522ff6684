//! Preprocessing of hypotheses and new facts, and the interfaces to the external
//! simplifier and arithmetic procedures.

use std::collections::HashMap;
use std::fmt::Debug;
use crate::env::Environment;
use crate::error::Result;
use crate::name::Name;
use crate::term::{TermFlags, TermId, TermKind, TermStore};
use super::GoalM;
use super::types::NewFact;

/// The result of simplifying a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimpResult {
  /// The simplified term.
  pub expr: TermId,
  /// A proof of `e = expr`, or `None` if they are definitionally equal.
  pub proof: Option<TermId>,
}

impl SimpResult {
  /// A result which does not change the term.
  #[must_use] pub fn unchanged(expr: TermId) -> Self { SimpResult { expr, proof: None } }

  /// The proof of `e = expr`, using reflexivity if none was recorded.
  pub fn get_proof(&self, terms: &mut TermStore) -> TermId {
    match self.proof {
      Some(p) => p,
      None => terms.mk_const_app(Name::EQ_REFL, &[self.expr]),
    }
  }
}

/// A simplifier, run on every hypothesis and fact before it is internalized.
pub trait Simp: Debug {
  /// Simplify `e`.
  fn simp(&mut self, terms: &mut TermStore, env: &Environment, e: TermId) -> Result<SimpResult>;
}

/// The simplifier which does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSimp;

impl Simp for NoopSimp {
  fn simp(&mut self, _: &mut TermStore, _: &Environment, e: TermId) -> Result<SimpResult> {
    Ok(SimpResult::unchanged(e))
  }
}

/// A simplifier which only beta reduces.
#[derive(Clone, Copy, Debug, Default)]
pub struct BetaSimp;

impl Simp for BetaSimp {
  fn simp(&mut self, terms: &mut TermStore, _: &Environment, e: TermId) -> Result<SimpResult> {
    Ok(SimpResult::unchanged(beta_all(terms, e)))
  }
}

/// Beta reduce every redex in `e`.
pub fn beta_all(terms: &mut TermStore, e: TermId) -> TermId {
  terms.replace(e, &mut |s, t, _| {
    let TermKind::App(..) = s.kind(t) else { return None };
    if !matches!(s.kind(s.app_fn(t)), TermKind::Lam(..)) { return None }
    let r = s.head_beta(t);
    Some(beta_all(s, r))
  })
}

/// An arithmetic procedure. It is told about every internalized term, and may answer with
/// facts to be asserted.
pub trait Arith: Debug {
  /// Called after `e` (with parent `parent`, if any) has been internalized.
  fn internalize(&mut self, terms: &mut TermStore, env: &Environment, e: TermId, parent: Option<TermId>) -> Vec<NewFact>;
}

/// No arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoArith;

impl Arith for NoArith {
  fn internalize(&mut self, _: &mut TermStore, _: &Environment, _: TermId, _: Option<TermId>) -> Vec<NewFact> {
    vec![]
  }
}

impl GoalM<'_> {
  /// Bring `e` into the form the E-graph expects: simplified, without annotations, with
  /// kernel projections replaced by projection functions, and beta reduced. Only the
  /// simplifier step needs a proof; the other steps are definitional.
  pub fn preprocess(&mut self, e: TermId) -> Result<SimpResult> {
    let e = self.instantiate_mvars(e);
    let r = match self.ctx.simp.simp(&mut self.ctx.terms, &self.ctx.env, e) {
      Ok(r) => r,
      Err(err) => {
        self.report_issue(format!("simp failed on {}: {err}", self.pp(e)));
        SimpResult::unchanged(e)
      }
    };
    let s = &mut self.ctx.terms;
    let expr = s.cleanup_annotations(r.expr);
    let expr = self.fold_projs(expr)?;
    let expr = beta_all(&mut self.ctx.terms, expr);
    if expr != e { log::trace!(target: "grind::intro", "{} ~> {}", self.pp(e), self.pp(expr)) }
    Ok(SimpResult { expr, proof: r.proof })
  }

  /// Replace the closed kernel projections `s.i a` in `e` by applications of the
  /// corresponding projection function.
  fn fold_projs(&mut self, e: TermId) -> Result<TermId> {
    if !self.ctx.terms.flags(e).contains(TermFlags::HAS_PROJ) { return Ok(e) }
    let mut projs = vec![];
    self.ctx.terms.for_each_closed(e, &mut |t| {
      if let TermKind::Proj(..) = self.ctx.terms.kind(t) { projs.push(t) }
    });
    let mut folded = HashMap::new();
    // innermost first, so that the arguments are already folded
    for &p in projs.iter().rev() {
      let TermKind::Proj(sn, i, a) = *self.ctx.terms.kind(p) else { continue };
      let a = self.ctx.terms.replace(a, &mut |_, t, _| folded.get(&t).copied());
      if let Some(r) = self.proj_fn_app(sn, i, a)? { folded.insert(p, r); }
    }
    Ok(self.ctx.terms.replace(e, &mut |_, t, _| folded.get(&t).copied()))
  }

  /// `S.proj_i params a` for the projection `S.i a`.
  fn proj_fn_app(&mut self, sn: Name, i: u32, a: TermId) -> Result<Option<TermId>> {
    let Some(&pf) = self.ctx.env.structure(sn).and_then(|st| st.projs.get(i as usize)) else { return Ok(None) };
    let ty = self.infer(a)?;
    let ty = self.ctx.tc().whnf(ty)?;
    let (head, mut args) = self.ctx.terms.app_fn_args(ty);
    let TermKind::Const(n, ref ls) = *self.ctx.terms.kind(head) else { return Ok(None) };
    if n != sn { return Ok(None) }
    let ls = ls.clone();
    let f = self.terms().konst(pf, &ls);
    args.push(a);
    Ok(Some(self.terms().mk_app(f, &args)))
  }
}
