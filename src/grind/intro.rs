//! Introduction of binders and hypotheses, and assertion of new facts.
//!
//! Introducing a binder of the target creates a child metavariable in an extended local
//! context, and assigns the parent a (delayed) lambda over it. Hypotheses go through a
//! small pipeline: destruct them if they are of a `grind cases` type, apply injectivity if
//! they equate two constructor applications, and otherwise add them to the E-graph.

use grind_util::u32_as_usize;
use crate::error::Result;
use crate::name::{intern, Name};
use crate::term::{FVarId, TermId, TermKind, TermStore};
use super::GoalM;
use super::split::FORBIDDEN_SPLIT_TYPES;
use super::types::{Goal, NewFact};

/// The result of introducing one binder of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroResult {
  /// The target is not a binder.
  Done,
  /// A hypothesis was introduced.
  Hyp(FVarId),
  /// A local variable was introduced.
  Local(FVarId),
  /// A local definition was introduced.
  Let(FVarId),
}

/// The result of asserting one new fact.
#[derive(Debug)]
pub enum AssertResult {
  /// There were no facts left.
  Done,
  /// A fact was asserted.
  Progress,
  /// Asserting a fact required a case split; these are the subgoals.
  Branch(Vec<Goal>),
}

impl GoalM<'_> {
  /// Continue the goal in a context extended by `xs`, with target `target`. The current
  /// metavariable becomes a binding of `xs` over the new one.
  fn extend_goal(&mut self, xs: &[FVarId], target: TermId) {
    let mut lctx = self.goal.lctx.clone();
    lctx.extend(xs.iter().copied());
    let child = self.ctx.mctx.mk_mvar(lctx.clone(), target);
    self.ctx.mctx.assign_delayed(self.goal.mvar, xs, child);
    self.goal.mvar = child;
    self.goal.lctx = lctx;
  }

  /// Introduce the outermost binder of the target.
  pub fn intro_next(&mut self) -> Result<IntroResult> {
    let target = self.target();
    match *self.ctx.terms.kind(target) {
      TermKind::Forall(_, d, b) => {
        if !self.ctx.terms.has_loose_bvar(b, 0) && self.is_prop(d)? {
          let h = self.ctx.mctx.mk_fvar(intern("h"), d, None);
          let body = self.terms().lower_loose_bvars(b, 1, 1);
          self.extend_goal(&[h], body);
          log::trace!(target: "grind::intro", "hypothesis {}", self.pp(d));
          return Ok(IntroResult::Hyp(h))
        }
        let x = self.ctx.mctx.mk_fvar(intern("x"), d, None);
        let ex = self.terms().fvar(x);
        let body = self.terms().instantiate1(b, ex);
        self.extend_goal(&[x], body);
        Ok(IntroResult::Local(x))
      }
      TermKind::Let(ty, v, b) => Ok(IntroResult::Let(self.intro_let(ty, v, b)?)),
      _ => {
        let Some(args) = self.ctx.terms.match_app(target, Name::LET_FUN, 4) else { return Ok(IntroResult::Done) };
        let TermKind::Lam(_, _, b) = *self.ctx.terms.kind(args[3]) else { return Ok(IntroResult::Done) };
        Ok(IntroResult::Let(self.intro_let(args[0], args[2], b)?))
      }
    }
  }

  /// Introduce `x := v` with body `b`, and queue the fact `x = v`.
  fn intro_let(&mut self, ty: TermId, v: TermId, b: TermId) -> Result<FVarId> {
    let x = self.ctx.mctx.mk_fvar(intern("x"), ty, Some(v));
    let ex = self.terms().fvar(x);
    let body = self.terms().instantiate1(b, ex);
    self.extend_goal(&[x], body);
    let r = self.preprocess(v)?;
    let prop = self.mk_eq(ex, r.expr)?;
    let proof = r.get_proof(&mut self.ctx.terms);
    self.goal.new_facts.push_back(NewFact { prop, proof, generation: 0 });
    log::trace!(target: "grind::intro", "let {}", self.pp(prop));
    Ok(x)
  }

  /// Turn `⊢ t` into `¬t ⊢ False`, or `⊢ ¬p` into `p ⊢ False`. Returns the new hypothesis.
  fn by_contra(&mut self, target: TermId) -> FVarId {
    let (lemma, arg, hyp) = match self.ctx.terms.match_not(target) {
      Some(p) => (Name::NOT_INTRO, p, p),
      None => (Name::BY_CONTRA, target, self.terms().not(target)),
    };
    let h = self.ctx.mctx.mk_fvar(intern("h"), hyp, None);
    let mut lctx = self.goal.lctx.clone();
    lctx.push_back(h);
    let child = self.ctx.mctx.mk_mvar(lctx.clone(), TermStore::FALSE);
    let ty = self.ctx.mctx.mk_binding(&mut self.ctx.terms, false, &[h], TermStore::FALSE);
    let l = self.ctx.mctx.mk_mvar(self.goal.lctx.clone(), ty);
    self.ctx.mctx.assign_delayed(l, &[h], child);
    let el = self.terms().mvar(l);
    let proof = self.lemma(lemma, &[arg, el]);
    self.ctx.mctx.assign(self.goal.mvar, proof);
    self.goal.mvar = child;
    self.goal.lctx = lctx;
    self.goal.by_contra_done = true;
    log::trace!(target: "grind::intro", "by contradiction: {}", self.pp(hyp));
    h
  }

  /// Introduce all binders of the target, reduce it to `False` by contradiction, and
  /// process the queued hypotheses. Returns the subgoals if a hypothesis was destructed.
  pub fn intros(&mut self) -> Result<Option<Vec<Goal>>> {
    loop {
      match self.intro_next()? {
        IntroResult::Done => break,
        IntroResult::Hyp(h) => self.goal.intro_queue.push_back(h),
        IntroResult::Local(_) | IntroResult::Let(_) => {}
      }
    }
    let target = self.target();
    if self.ctx.config.by_contra && !self.goal.by_contra_done && target != TermStore::FALSE {
      let h = self.by_contra(target);
      self.goal.intro_queue.push_back(h)
    }
    self.drain_intro_queue()
  }

  fn drain_intro_queue(&mut self) -> Result<Option<Vec<Goal>>> {
    while let Some(h) = self.goal.intro_queue.pop_front() {
      if self.goal.inconsistent { break }
      if let Some(gs) = self.process_hyp(h, 0)? { return Ok(Some(gs)) }
    }
    Ok(None)
  }

  /// Preprocess the type of `h`. If it changes, introduce a local `h' := Eq.mp _ h` of the
  /// new type and return it instead.
  fn transport(&mut self, h: FVarId, ty: TermId) -> Result<(FVarId, TermId)> {
    let r = self.preprocess(ty)?;
    if r.expr == ty { return Ok((h, ty)) }
    let p = r.get_proof(&mut self.ctx.terms);
    let eh = self.terms().fvar(h);
    let v = self.lemma(Name::EQ_MP, &[p, eh]);
    let h2 = self.ctx.mctx.mk_fvar(intern("h"), r.expr, Some(v));
    let target = self.target();
    self.extend_goal(&[h2], target);
    Ok((h2, r.expr))
  }

  /// Run a hypothesis through the pipeline: cases, injection, or assertion.
  fn process_hyp(&mut self, h: FVarId, generation: u32) -> Result<Option<Vec<Goal>>> {
    let ty = self.ctx.mctx.fvars[h].ty;
    let ty = self.instantiate_mvars(ty);
    let (h, ty) = self.transport(h, ty)?;
    if let Some(gs) = self.apply_cases(h, ty)? { return Ok(Some(gs)) }
    if self.apply_injection(h, ty, generation)? { return Ok(None) }
    let proof = self.terms().fvar(h);
    self.add_fact(ty, proof, generation)?;
    Ok(None)
  }

  /// Destruct a hypothesis whose type is an inductive proposition marked for case
  /// splitting.
  fn apply_cases(&mut self, h: FVarId, ty: TermId) -> Result<Option<Vec<Goal>>> {
    let Some(n) = self.ctx.terms.head_const(ty) else { return Ok(None) };
    if !self.ctx.env.is_cases(n) || FORBIDDEN_SPLIT_TYPES.contains(&n) {
      return Ok(None)
    }
    let eh = self.terms().fvar(h);
    let r = self.split_ctors(eh, true)?;
    if r.is_some() { log::trace!(target: "grind::intro", "cases on {}", self.pp(ty)) }
    Ok(r)
  }

  /// If `ty` is an equation between constructor applications, replace it by the
  /// equations between their fields, or close the goal if the constructors differ.
  fn apply_injection(&mut self, h: FVarId, ty: TermId, generation: u32) -> Result<bool> {
    let Some((_, a, b)) = self.ctx.terms.match_eq(ty) else { return Ok(false) };
    if !self.is_ctor_app(a) || !self.is_ctor_app(b) { return Ok(false) }
    let eh = self.terms().fvar(h);
    let (fa, aargs) = self.ctx.terms.app_fn_args(a);
    let (fb, bargs) = self.ctx.terms.app_fn_args(b);
    let (ca, cb) = (self.ctx.terms.const_name(fa), self.ctx.terms.const_name(fb));
    if ca != cb {
      let proof = self.lemma(Name::CTOR_NE, &[a, b, eh]);
      self.close_goal(proof);
      return Ok(true)
    }
    let Some(c) = ca.and_then(|c| self.ctx.env.ctor(c)) else { return Ok(false) };
    let (np, nf) = (c.num_params, c.num_fields);
    for i in np..np + nf {
      let (x, y) = (aargs[u32_as_usize(i)], bargs[u32_as_usize(i)]);
      if x == y || self.is_proof(x)? { continue }
      let idx = self.terms().nat_lit(i - np);
      let proof = self.lemma(Name::CTOR_INJ, &[idx, eh]);
      let prop = if self.infer(x)? == self.infer(y)? { self.mk_eq(x, y)? } else { self.mk_heq(x, y)? };
      self.goal.new_facts.push_back(NewFact { prop, proof, generation });
    }
    log::trace!(target: "grind::intro", "injection {}", self.pp(ty));
    Ok(true)
  }

  /// Add the proposition `prop`, proved by `proof`, to the E-graph.
  pub fn add_fact(&mut self, prop: TermId, proof: TermId, generation: u32) -> Result<()> {
    if !self.is_prop(prop)? {
      self.report_issue(format!("ignoring {}, which is not a proposition", self.pp(prop)));
      return Ok(())
    }
    log::debug!(target: "grind::intro", "{}", self.pp(prop));
    let s = &self.ctx.terms;
    if let Some((_, a, b)) = s.match_eq(prop) {
      self.internalize(a, generation, None)?;
      self.internalize(b, generation, None)?;
      self.push_eq(a, b, proof)
    } else if let Some((_, a, _, b)) = s.match_heq(prop) {
      self.internalize(a, generation, None)?;
      self.internalize(b, generation, None)?;
      self.push_heq(a, b, proof)
    } else if let Some(p) = s.match_not(prop) {
      self.internalize(p, generation, None)?;
      let h = self.lemma(Name::EQ_FALSE, &[proof]);
      self.push_eq_false(p, h)
    } else {
      self.internalize(prop, generation, None)?;
      let h = self.lemma(Name::EQ_TRUE, &[proof]);
      self.push_eq_true(prop, h)
    }
    self.process_new_eqs()
  }

  /// Assert the next fact of the new fact queue as a hypothesis.
  pub fn assert_next(&mut self) -> Result<AssertResult> {
    if self.goal.inconsistent { return Ok(AssertResult::Done) }
    let Some(NewFact { prop, proof, generation }) = self.goal.new_facts.pop_front() else {
      return Ok(AssertResult::Done)
    };
    self.ctx.stats.facts += 1;
    let h = self.ctx.mctx.mk_fvar(intern("h"), prop, Some(proof));
    let target = self.target();
    self.extend_goal(&[h], target);
    Ok(match self.process_hyp(h, generation)? {
      Some(gs) => AssertResult::Branch(gs),
      None => AssertResult::Progress,
    })
  }
}
