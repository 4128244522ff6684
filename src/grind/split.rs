//! Case splitting.
//!
//! Terms that may require a case split are queued as candidates when they are
//! internalized. When nothing else is left to do, [`GoalM::split_next`] picks the first
//! candidate that is ready and creates one child goal per case. The parent metavariable is
//! assigned a case analysis term whose branches are (delayed) lambdas over the children.

use grind_util::u32_as_usize;
use crate::error::Result;
use crate::name::{intern, Name};
use crate::term::{FVarId, Level, TermId, TermKind};
use super::GoalM;
use super::types::{Goal, SplitInfo};

/// Applications of these are never split on.
pub(super) const FORBIDDEN_SPLIT_TYPES: [Name; 4] = [Name::EQ, Name::HEQ, Name::PROP_TRUE, Name::PROP_FALSE];

/// Whether a candidate can be split on now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitStatus {
  /// The case split is no longer needed.
  Resolved,
  /// The case split is not needed yet, but may become needed.
  NotReady,
  /// The case split can be performed.
  Ready,
}

/// A case of a split: the new local variables (the last one is the case hypothesis,
/// if any) and which of them are queued for introduction.
struct Case {
  fvars: Vec<FVarId>,
  hyps: Vec<FVarId>,
}

impl GoalM<'_> {
  /// Queue `e` as a split candidate if it is one: a local of a `grind cases` type, a
  /// matcher application, the condition of an `ite`/`dite`, a disjunction or a
  /// conjunction. Equalities, `True` and `False` are never candidates.
  pub fn check_and_add_split_candidate(&mut self, e: TermId) -> Result<()> {
    if self.ctx.terms.is_true_or_false(e) { return Ok(()) }
    let s = &self.ctx.terms;
    match *s.kind(e) {
      TermKind::FVar(_) => {
        let ty = self.infer(e)?;
        if self.is_prop(ty)? { return Ok(()) }
        if let Some(n) = self.ctx.tc().cases_type_of(ty)? {
          if !FORBIDDEN_SPLIT_TYPES.contains(&n) { self.add_split_candidate(SplitInfo::Cases(e)) }
        }
      }
      TermKind::App(..) => {
        let Some(n) = s.head_const(e) else { return Ok(()) };
        if FORBIDDEN_SPLIT_TYPES.contains(&n) { return Ok(()) }
        let nargs = s.app_num_args(e);
        if self.ctx.env.matcher(n).is_some_and(|m| m.arity() == nargs) {
          self.add_split_candidate(SplitInfo::Match(e))
        } else if (n == Name::ITE || n == Name::DITE) && nargs == 5 {
          let c = s.app_args(e)[1];
          if !self.goal.is_eq_true(c) && !self.goal.is_eq_false(c) { self.add_split_candidate(SplitInfo::Cond(c)) }
        } else if n == Name::OR && nargs == 2 {
          self.add_split_candidate(SplitInfo::Or(e))
        } else if n == Name::AND && nargs == 2 {
          self.add_split_candidate(SplitInfo::NotAnd(e))
        }
      }
      _ => {}
    }
    Ok(())
  }

  /// Queue a split candidate, unless it was queued before.
  pub fn add_split_candidate(&mut self, info: SplitInfo) {
    if self.goal.split_seen.contains(&info) { return }
    log::trace!(target: "grind::split", "candidate {}", self.pp(info.term()));
    self.goal.split_seen.insert(info);
    self.goal.split_candidates.push_back(info);
  }

  /// Mark the split on `e` as done, so that it is not performed again on this branch.
  pub fn mark_case_split_as_resolved(&mut self, e: TermId) {
    if self.goal.resolved_splits.insert(e).is_none() {
      log::trace!(target: "grind::split", "resolved {}", self.pp(e));
    }
  }

  fn split_status(&self, info: SplitInfo) -> SplitStatus {
    let g = &*self.goal;
    if g.resolved_splits.contains(&info.term()) { return SplitStatus::Resolved }
    let s = &self.ctx.terms;
    let args = s.app_args(info.term());
    match info {
      SplitInfo::Cond(c) =>
        if g.is_eq_true(c) || g.is_eq_false(c) { SplitStatus::Resolved } else { SplitStatus::Ready },
      // a false disjunction (true conjunction) has already been decomposed
      SplitInfo::Or(e) =>
        if g.is_eq_false(e) { SplitStatus::Resolved }
        else if !g.is_eq_true(e) { SplitStatus::NotReady }
        else if g.is_eq_true(args[0]) || g.is_eq_true(args[1]) { SplitStatus::Resolved }
        else { SplitStatus::Ready },
      SplitInfo::NotAnd(e) =>
        if g.is_eq_true(e) { SplitStatus::Resolved }
        else if !g.is_eq_false(e) { SplitStatus::NotReady }
        else if g.is_eq_false(args[0]) || g.is_eq_false(args[1]) { SplitStatus::Resolved }
        else { SplitStatus::Ready },
      SplitInfo::Cases(x) =>
        if g.get_root_enode(x).is_some_and(|n| n.ctor()) { SplitStatus::Resolved } else { SplitStatus::Ready },
      SplitInfo::Match(e) => {
        let Some(info) = s.head_const(e).and_then(|n| self.ctx.env.matcher(n)) else { return SplitStatus::Resolved };
        let d = args[u32_as_usize(info.num_params)];
        if g.get_root_enode(d).is_some_and(|n| n.ctor() || n.interpreted()) {
          SplitStatus::Resolved
        } else { SplitStatus::Ready }
      }
    }
  }

  /// Perform the first ready case split. Returns the child goals, or `None` if there is no
  /// ready candidate or the split budget is exhausted.
  pub fn split_next(&mut self) -> Result<Option<Vec<Goal>>> {
    if self.goal.inconsistent { return Ok(None) }
    if self.goal.num_splits >= self.ctx.config.splits {
      log::debug!(target: "grind::split", "split limit {} reached", self.ctx.config.splits);
      return Ok(None)
    }
    let mut remaining = im::Vector::new();
    let mut chosen = None;
    while let Some(info) = self.goal.split_candidates.pop_front() {
      match self.split_status(info) {
        SplitStatus::Resolved => {}
        SplitStatus::NotReady => remaining.push_back(info),
        SplitStatus::Ready => { chosen = Some(info); break }
      }
    }
    remaining.append(std::mem::take(&mut self.goal.split_candidates));
    self.goal.split_candidates = remaining;
    let Some(info) = chosen else { return Ok(None) };
    log::debug!(target: "grind::split", "splitting on {}", self.pp(info.term()));
    self.mark_case_split_as_resolved(info.term());
    self.goal.num_splits += 1;
    self.ctx.stats.splits += 1;
    let children = match info {
      SplitInfo::Cond(c) => self.split_by_cases(c)?,
      SplitInfo::NotAnd(e) => {
        let a = self.ctx.terms.app_args(e)[0];
        self.split_by_cases(a)?
      }
      SplitInfo::Or(e) => {
        let args = self.ctx.terms.app_args(e);
        let ev = self.mk_of_eq_true(e)?;
        let cases = [args[0], args[1]].map(|p| self.mk_hyp_case(p));
        let f = self.terms().konst(Name::OR.str("casesOn"), &[]);
        self.mk_cases(f, &[ev], cases)
      }
      SplitInfo::Cases(_) | SplitInfo::Match(_) => {
        let d = match info {
          SplitInfo::Match(e) => {
            let n = self.ctx.terms.head_const(e);
            let np = n.and_then(|n| self.ctx.env.matcher(n)).map_or(0, |m| u32_as_usize(m.num_params));
            self.ctx.terms.app_args(e)[np]
          }
          _ => info.term(),
        };
        match self.split_ctors(d, false)? {
          Some(gs) => gs,
          None => {
            self.report_issue(format!("cannot split on {}", self.pp(d)));
            return Ok(None)
          }
        }
      }
    };
    Ok(Some(children))
  }

  fn mk_hyp_case(&mut self, ty: TermId) -> Case {
    let h = self.ctx.mctx.mk_fvar(intern("h"), ty, None);
    Case { fvars: vec![h], hyps: vec![h] }
  }

  /// Split on whether `p` holds.
  fn split_by_cases(&mut self, p: TermId) -> Result<Vec<Goal>> {
    let not_p = self.terms().not(p);
    let cases = [p, not_p].map(|q| self.mk_hyp_case(q));
    let f = self.terms().konst(Name::BY_CASES, &[]);
    Ok(self.mk_cases(f, &[p], cases))
  }

  /// Split on the constructor of `d`, whose type must be an inductive without indices.
  /// Unless `d` is a proof, each case also gets the hypothesis `d = c fields`. Returns
  /// `None` if the type of `d` is not a suitable inductive.
  pub(super) fn split_ctors(&mut self, d: TermId, is_proof: bool) -> Result<Option<Vec<Goal>>> {
    let ty = self.infer(d)?;
    let ty = self.ctx.tc().whnf(ty)?;
    let (head, params) = self.ctx.terms.app_fn_args(ty);
    let TermKind::Const(n, ref ls) = *self.ctx.terms.kind(head) else { return Ok(None) };
    let ls: Vec<Level> = ls.to_vec();
    let Some(ind) = self.ctx.env.inductive(n) else { return Ok(None) };
    if ind.num_indices != 0 || params.len() != u32_as_usize(ind.num_params) { return Ok(None) }
    let mut cases = vec![];
    for c in ind.ctors.clone() {
      let cf = self.terms().konst(c, &ls);
      let mut cty = self.infer(cf)?;
      for &p in &params {
        cty = self.ctx.tc().whnf(cty)?;
        let TermKind::Forall(_, _, b) = *self.ctx.terms.kind(cty) else { return Ok(None) };
        cty = self.terms().instantiate1(b, p);
      }
      let mut case = Case { fvars: vec![], hyps: vec![] };
      let mut value = self.terms().mk_app(cf, &params);
      loop {
        cty = self.ctx.tc().whnf(cty)?;
        let TermKind::Forall(_, dom, b) = *self.ctx.terms.kind(cty) else { break };
        let x = self.ctx.mctx.mk_fvar(intern("a"), dom, None);
        let ex = self.terms().fvar(x);
        case.fvars.push(x);
        if self.is_prop(dom)? { case.hyps.push(x) }
        value = self.terms().app(value, ex);
        cty = self.terms().instantiate1(b, ex);
      }
      if !is_proof {
        let eq = self.mk_eq(d, value)?;
        let h = self.ctx.mctx.mk_fvar(intern("h"), eq, None);
        case.fvars.push(h);
        case.hyps.push(h);
      }
      cases.push(case);
    }
    let f = self.terms().konst(n.str("casesOn"), &ls);
    Ok(Some(self.mk_cases(f, &[d], cases)))
  }

  /// Create one child goal per case, and assign `f args ?l₁ … ?lₙ` to the current goal,
  /// where `?lᵢ` abstracts the new locals of case `i` over the child's metavariable.
  fn mk_cases(&mut self, f: TermId, args: &[TermId], cases: impl IntoIterator<Item=Case>) -> Vec<Goal> {
    let target = self.target();
    let mut children = vec![];
    let mut branches = args.to_vec();
    for Case { fvars, hyps } in cases {
      let mut lctx = self.goal.lctx.clone();
      lctx.extend(fvars.iter().copied());
      let child = self.ctx.mctx.mk_mvar(lctx.clone(), target);
      let ty = self.ctx.mctx.mk_binding(&mut self.ctx.terms, false, &fvars, target);
      let l = self.ctx.mctx.mk_mvar(self.goal.lctx.clone(), ty);
      self.ctx.mctx.assign_delayed(l, &fvars, child);
      branches.push(self.terms().mvar(l));
      let mut g = self.goal.clone();
      g.mvar = child;
      g.lctx = lctx;
      g.intro_queue.extend(hyps);
      children.push(g);
    }
    let proof = self.terms().mk_app(f, &branches);
    self.ctx.mctx.assign(self.goal.mvar, proof);
    log::debug!(target: "grind::split", "{} cases", children.len());
    children
  }
}
