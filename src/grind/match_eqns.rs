//! Equations of matchers.
//!
//! A matcher application `m ps ds` reduces to the right hand side of the first alternative
//! whose patterns match the discriminants. Matching is done against the E-graph: a
//! discriminant matches a constructor pattern when its class contains that constructor
//! application (or literal), and clashes when its class contains a different one. When an
//! alternative matches, the instantiated equation `m ps pats = rhs` becomes a new fact; the
//! congruence closure then links it to the original application.

use grind_util::u32_as_usize;
use crate::error::Result;
use crate::term::{TermId, TermKind};
use super::GoalM;
use super::types::NewFact;

/// The result of matching a pattern against the E-graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchResult {
  /// The pattern matches.
  Match,
  /// The pattern can never match.
  Clash,
  /// Not enough is known yet.
  Unknown,
}

impl MatchResult {
  fn and(self, other: impl FnOnce() -> MatchResult) -> MatchResult {
    match self {
      MatchResult::Clash => MatchResult::Clash,
      MatchResult::Match => other(),
      MatchResult::Unknown => match other() {
        MatchResult::Clash => MatchResult::Clash,
        _ => MatchResult::Unknown,
      },
    }
  }
}

impl GoalM<'_> {
  /// Register the equations of the matcher at the head of `e`, once per matcher, and try
  /// them on `e`.
  pub(super) fn add_match_eqns(&mut self, e: TermId) -> Result<()> {
    if !self.ctx.config.match_eqns { return Ok(()) }
    let Some(n) = self.ctx.terms.head_const(e) else { return Ok(()) };
    if self.ctx.env.matcher(n).is_none() { return Ok(()) }
    if !self.goal.seen_matchers.contains(&n) {
      log::trace!(target: "grind::match", "registered equations of {n}");
      self.goal.seen_matchers.insert(n);
    }
    self.instantiate_match_eqns(e)
  }

  /// A class member of `t` that is a constructor application or a literal.
  fn value_of(&self, t: TermId) -> Option<TermId> {
    let n = self.goal.get_root_enode(t)?;
    (n.ctor() || n.interpreted()).then_some(n.term)
  }

  /// Match the pattern `pat`, whose pattern variable `k` is `#k`, against the term `t`.
  fn match_pattern(&self, pat: TermId, t: TermId, vals: &mut [Option<TermId>]) -> MatchResult {
    let s = &self.ctx.terms;
    if let TermKind::BVar(k) = *s.kind(pat) {
      let Some(slot) = vals.get_mut(k as usize) else { return MatchResult::Unknown };
      return match *slot {
        None => { *slot = Some(t); MatchResult::Match }
        Some(v) if self.goal.is_eqv(v, t) => MatchResult::Match,
        Some(_) => MatchResult::Unknown,
      }
    }
    if !s.has_loose_bvars(pat) && self.goal.is_eqv(pat, t) { return MatchResult::Match }
    let Some(v) = self.value_of(t) else { return MatchResult::Unknown };
    match (s.kind(pat), s.kind(v)) {
      (TermKind::Lit(a), TermKind::Lit(b)) => if a == b { MatchResult::Match } else { MatchResult::Clash },
      (TermKind::Lit(_), _) | (_, TermKind::Lit(_)) => MatchResult::Unknown,
      _ => {
        let (pf, pargs) = s.app_fn_args(pat);
        let Some(c) = s.const_name(pf).and_then(|c| self.ctx.env.ctor(c)) else { return MatchResult::Unknown };
        if pargs.len() != (c.num_params + c.num_fields) as usize { return MatchResult::Unknown }
        let (vf, vargs) = s.app_fn_args(v);
        if s.const_name(vf) != s.const_name(pf) { return MatchResult::Clash }
        let np = c.num_params as usize;
        let mut r = MatchResult::Match;
        for (&p, &a) in pargs[np..].iter().zip(&vargs[np..]) {
          r = r.and(|| self.match_pattern(p, a, vals));
          if r == MatchResult::Clash { break }
        }
        r
      }
    }
  }

  /// Instantiate the equation of the first alternative of the matcher application `e`
  /// that matches, as a new fact.
  pub(super) fn instantiate_match_eqns(&mut self, e: TermId) -> Result<()> {
    let Some(n) = self.ctx.terms.head_const(e) else { return Ok(()) };
    let Some(info) = self.ctx.env.matcher(n).cloned() else { return Ok(()) };
    let (f, args) = self.ctx.terms.app_fn_args(e);
    if args.len() != info.arity() { return Ok(()) }
    let generation = self.goal.generation(e) + 1;
    if generation > self.ctx.config.max_gen { return Ok(()) }
    let (ps, ds) = args.split_at(u32_as_usize(info.num_params));
    for (i, alt) in (0..).zip(&info.alts) {
      if self.goal.match_eqn_keys.contains(&(e, i)) { return Ok(()) }
      let nv = u32_as_usize(alt.num_vars);
      let mut subst = ps.to_vec();
      for k in 0..alt.num_vars { subst.push(self.terms().bvar(k)) }
      let pats: Vec<_> = alt.patterns.iter().map(|&p| self.terms().instantiate_rev(p, &subst)).collect();
      let mut vals = vec![None; nv];
      let mut r = MatchResult::Match;
      for (&p, &d) in pats.iter().zip(ds) {
        r = r.and(|| self.match_pattern(p, d, &mut vals));
        if r == MatchResult::Clash { break }
      }
      match r {
        MatchResult::Clash => {
          log::trace!(target: "grind::match", "{}: falling back to alternative {}", self.pp(e), i + 2);
          continue
        }
        MatchResult::Unknown if info.overlapping => return Ok(()),
        MatchResult::Unknown => continue,
        MatchResult::Match => {}
      }
      let Some(vals) = vals.into_iter().collect::<Option<Vec<_>>>() else { continue };
      self.goal.match_eqn_keys.insert((e, i));
      let mut inst = ps.to_vec();
      inst.extend_from_slice(&vals);
      let mut lhs_args = ps.to_vec();
      for &p in &alt.patterns { lhs_args.push(self.terms().instantiate_rev(p, &inst)) }
      let lhs = self.terms().mk_app(f, &lhs_args);
      let rhs = self.terms().instantiate_rev(alt.rhs, &inst);
      let prop = self.mk_eq(lhs, rhs)?;
      let proof = self.terms().mk_const_app(n.str(&format!("eq_{}", i + 1)), &inst);
      log::debug!(target: "grind::match", "{}", self.pp(prop));
      self.goal.new_facts.push_back(NewFact { prop, proof, generation });
      return Ok(())
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::MatchResult::*;

  #[test]
  fn clash_dominates() {
    assert_eq!(Match.and(|| Clash), Clash);
    assert_eq!(Unknown.and(|| Clash), Clash);
    assert_eq!(Unknown.and(|| Match), Unknown);
    assert_eq!(Clash.and(|| unreachable!()), Clash);
    assert_eq!(Match.and(|| Match), Match);
  }
}
