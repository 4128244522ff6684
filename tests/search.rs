mod common;

use common::Problem;
use grind::{intern, Config, Environment, GrindError, GrindResult, Name, TermId, TermStore};
use grind::env::{MatchAlt, MatcherInfo};
use grind::grind::{BetaSimp, Simp, SimpResult, SplitInfo};
use grind::term::{BinderInfo, Level};

#[test]
fn conjunction_hypothesis() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let goal = t.goal(&[pq]);
  let mut goal = t.saturate1(goal);
  assert!(goal.is_eq_true(p) && goal.is_eq_true(q));
  assert!(t.g.split_next(&mut goal).unwrap().is_none());
  // the true conjunction is never going to be split on
  assert!(goal.split_candidates.is_empty());
}

#[test]
fn false_disjunction_leaves_no_candidate() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.or(p, q);
  let npq = t.not(pq);
  let goal = t.goal(&[npq]);
  let mut goal = t.saturate1(goal);
  assert!(goal.is_eq_false(p) && goal.is_eq_false(q));
  assert!(t.g.split_next(&mut goal).unwrap().is_none());
  assert!(goal.split_candidates.is_empty());
}

#[test]
fn ite_split() {
  let mut t = Problem::new();
  let nat = t.nat();
  let c = t.prop("c");
  let a = t.local("a", nat);
  let b = t.local("b", nat);
  let d = t.local("d", nat);
  let ite = t.ite(nat, c, a, b);
  let h = t.eq(nat, ite, d);
  let goal = t.goal(&[h]);
  let mut goal = t.saturate1(goal);
  assert!(goal.split_candidates.contains(&SplitInfo::Cond(c)));
  let mut gs = t.g.split_next(&mut goal).unwrap().expect("split on the condition");
  assert_eq!(gs.len(), 2);
  assert!(t.g.mctx.is_assigned(goal.mvar));
  let neg = t.saturate1(gs.pop().unwrap());
  let pos = t.saturate1(gs.pop().unwrap());
  assert!(pos.is_eq_true(c));
  assert!(pos.is_eqv(ite, a) && pos.is_eqv(a, d));
  assert!(neg.is_eq_false(c));
  assert!(neg.is_eqv(ite, b) && !neg.is_eqv(ite, a));
  for g in [&pos, &neg] {
    assert!(g.resolved_splits.contains(&c));
    assert_eq!(g.num_splits, 1);
  }
}

#[test]
fn disjunctions_wait_until_true() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.or(p, q);
  let mut goal = t.goal(&[]);
  let mut m = grind::GoalM::new(&mut t.g, &mut goal);
  m.internalize(pq, 0, None).unwrap();
  assert_eq!(m.goal.split_candidates.len(), 1);
  assert!(m.split_next().unwrap().is_none());
  assert_eq!(m.goal.split_candidates.len(), 1, "not ready candidates stay queued");
  assert!(!m.goal.resolved_splits.contains(&pq));
}

#[test]
fn equalities_are_not_split_candidates() {
  let mut t = Problem::new();
  let nat = t.nat();
  let p = t.prop("p");
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let xy = t.eq(nat, x, y);
  let np = t.not(p);
  let goal = t.goal(&[xy, np]);
  let goal = t.saturate1(goal);
  assert!(goal.split_candidates.is_empty());
}

#[test]
fn splits_are_taken_in_order() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let r = t.prop("r");
  let s = t.prop("s");
  let pq = t.or(p, q);
  let rs = t.or(r, s);
  let goal = t.goal(&[pq, rs]);
  let mut goal = t.saturate1(goal);
  assert_eq!(goal.split_candidates.iter().copied().collect::<Vec<_>>(),
    [SplitInfo::Or(pq), SplitInfo::Or(rs)]);
  let gs = t.g.split_next(&mut goal).unwrap().expect("split");
  assert_eq!(gs.len(), 2);
  for (g, x) in gs.into_iter().zip([p, q]) {
    assert_eq!(g.split_candidates.iter().copied().collect::<Vec<_>>(), [SplitInfo::Or(rs)]);
    let g = t.saturate1(g);
    assert!(g.is_eq_true(x));
  }
}

#[test]
fn split_limit() {
  let mut t = Problem::with_config(Config { splits: 0, ..<_>::default() });
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.or(p, q);
  let goal = t.goal(&[pq]);
  let mut goal = t.saturate1(goal);
  assert!(t.g.split_next(&mut goal).unwrap().is_none());
  assert_eq!(t.g.stats.splits, 0);
}

#[test]
fn exists_hypotheses_are_destructed() {
  let mut t = Problem::new();
  let nat = t.nat();
  let pred = t.arrow(nat, TermStore::PROP);
  let pr = t.local("P", pred);
  let ex = t.g.terms.konst(Name::EXISTS, &[Level::one()]);
  let ex = t.app(ex, &[nat, pr]);
  let goal = t.goal(&[ex]);
  let m = goal.mvar;
  let mut gs = t.g.intros(goal).unwrap();
  assert_eq!(gs.len(), 1);
  assert!(t.g.mctx.is_assigned(m));
  let g = t.saturate1(gs.pop().unwrap());
  let w = g.lctx[g.lctx.len() - 2];
  let w = t.g.terms.fvar(w);
  let pw = t.app(pr, &[w]);
  assert!(g.is_eq_true(pw));
}

#[test]
fn by_contradiction() {
  let mut t = Problem::new();
  let p = t.prop("p");
  t.local("h", p);
  let GrindResult { proof, failed } = t.prove(p);
  assert!(failed.is_empty());
  let proof = proof.expect("proved");
  assert!(!t.g.terms.has_mvar(proof));

  let mut t = Problem::with_config(Config { by_contra: false, ..<_>::default() });
  let p = t.prop("p");
  t.local("h", p);
  let r = t.prove(p);
  assert!(r.proof.is_none());
  assert_eq!(r.failed.len(), 1);
}

fn imps(t: &mut Problem, hyps: &[TermId], concl: TermId) -> TermId {
  hyps.iter().rev().fold(concl, |c, &h| t.arrow(h, c))
}

#[test]
fn and_comm() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let (pq, qp) = (t.and(p, q), t.and(q, p));
  let target = t.arrow(pq, qp);
  let r = t.prove(target);
  assert!(r.failed.is_empty());
  assert!(r.proof.is_some());
}

#[test]
fn or_elim_needs_a_split() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let r = t.prop("r");
  let pq = t.or(p, q);
  let (pr, qr) = (t.arrow(p, r), t.arrow(q, r));
  let target = imps(&mut t, &[pq, pr, qr], r);
  let res = t.prove(target);
  assert!(res.failed.is_empty());
  let proof = res.proof.expect("proved");
  assert!(!t.g.terms.has_mvar(proof));
  assert_eq!(t.g.stats.splits, 1);

  let mut t = Problem::with_config(Config { splits: 0, ..<_>::default() });
  let p = t.prop("p");
  let q = t.prop("q");
  let r = t.prop("r");
  let pq = t.or(p, q);
  let (pr, qr) = (t.arrow(p, r), t.arrow(q, r));
  let target = imps(&mut t, &[pq, pr, qr], r);
  let res = t.prove(target);
  assert!(res.proof.is_none());
  assert_eq!(res.failed.len(), 1);
}

#[test]
fn unprovable_goals_fail() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.or(p, q);
  let target = t.arrow(pq, p);
  let r = t.prove(target);
  assert!(r.proof.is_none());
  // `¬p` makes `q` true, which resolves the disjunction without a split
  assert_eq!(r.failed.len(), 1);
  assert!(!r.failed[0].inconsistent);
  assert!(r.failed[0].is_eq_true(q));
}

#[test]
fn let_target() {
  let mut t = Problem::new();
  let nat = t.nat();
  let a = t.local("a", nat);
  let b0 = t.g.terms.bvar(0);
  let body = t.eq(nat, b0, a);
  let target = t.g.terms.let_(nat, a, body);
  let r = t.prove(target);
  assert!(r.failed.is_empty());
  assert!(r.proof.is_some());
}

#[test]
fn beta_redexes_are_reduced() {
  let mut t = Problem::new();
  let nat = t.nat();
  let a = t.local("a", nat);
  let b = t.local("b", nat);
  let b0 = t.g.terms.bvar(0);
  let body = t.eq(nat, b0, a);
  let lam = t.g.terms.lam(BinderInfo::Default, nat, body);
  let h = t.app(lam, &[b]);
  let goal = t.goal(&[h]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eqv(a, b));
}

#[derive(Debug)]
struct FailingSimp;

impl Simp for FailingSimp {
  fn simp(&mut self, _: &mut TermStore, _: &Environment, _: TermId) -> grind::Result<SimpResult> {
    Err(GrindError::Simp("out of fuel".into()))
  }
}

#[test]
fn simp_failures_are_tolerated() {
  let mut t = Problem::new().map(|g| g.with_simp(Box::new(FailingSimp)));
  let p = t.prop("p");
  let q = t.prop("q");
  let (pq, qp) = (t.and(p, q), t.and(q, p));
  let target = t.arrow(pq, qp);
  let r = t.prove(target);
  assert!(r.proof.is_some());
  assert!(!t.g.issues.is_empty());
  assert!(t.g.issues.iter().all(|i| i.contains("out of fuel")));

  let mut t = Problem::new().map(|g| g.with_simp(Box::new(BetaSimp)));
  let (p, q) = (t.prop("p"), t.prop("q"));
  let (pq, qp) = (t.and(p, q), t.and(q, p));
  let target = t.arrow(pq, qp);
  assert!(t.prove(target).proof.is_some());
  assert!(t.g.issues.is_empty());
}

/// `T.ext : ∀ a b : T, R a b → a = b`
fn ext_problem(t: &mut Problem) -> (TermId, TermId, TermId) {
  let ty = t.g.terms.sort(Level::one());
  let tt = t.axiom("T", ty);
  let rel = t.arrow(tt, TermStore::PROP);
  let rel = t.arrow(tt, rel);
  let r = t.axiom("R", rel);
  let (b1, b0) = (t.g.terms.bvar(1), t.g.terms.bvar(0));
  let rab = t.app(r, &[b1, b0]);
  let eq = t.eq(tt, b1, b0);
  let body = t.arrow(rab, eq);
  let body = t.g.terms.forall(BinderInfo::Default, tt, body);
  let thm = t.g.terms.forall(BinderInfo::Default, tt, body);
  t.g.env.add_axiom(intern("T.ext"), &[], thm).unwrap();
  t.g.env.add_ext_thm(intern("T"), intern("T.ext")).unwrap();
  let a = t.local("a", tt);
  let b = t.local("b", tt);
  (r, a, b)
}

#[test]
fn extensionality_on_disequalities() {
  let mut t = Problem::new();
  let (r, a, b) = ext_problem(&mut t);
  let tt = t.konst(intern("T"));
  let ab = t.eq(tt, a, b);
  let nab = t.not(ab);
  let goal = t.goal(&[nab]);
  let goal = t.saturate1(goal);
  let rab = t.app(r, &[a, b]);
  assert!(goal.is_eq_false(ab));
  assert!(goal.is_eq_false(rab));

  let mut t = Problem::with_config(Config { ext: false, ..<_>::default() });
  let (r, a, b) = ext_problem(&mut t);
  let tt = t.konst(intern("T"));
  let ab = t.eq(tt, a, b);
  let nab = t.not(ab);
  let goal = t.goal(&[nab]);
  let goal = t.saturate1(goal);
  let rab = t.app(r, &[a, b]);
  assert!(!goal.is_internalized(rab));
}

#[test]
fn extensionality_closes_goals() {
  let mut t = Problem::new();
  let (r, a, b) = ext_problem(&mut t);
  let tt = t.konst(intern("T"));
  let rab = t.app(r, &[a, b]);
  let ab = t.eq(tt, a, b);
  let target = t.arrow(rab, ab);
  let res = t.prove(target);
  assert!(res.failed.is_empty());
}

/// `m : Nat → Bool` with `m 0 = true` and `m (n + 1) = false`.
fn matcher(t: &mut Problem) -> TermId {
  let nat = t.nat();
  let bool_ = t.konst(Name::BOOL);
  let ty = t.arrow(nat, bool_);
  let zero = t.konst(Name::NAT_ZERO);
  let succ = t.konst(Name::NAT_SUCC);
  let b0 = t.g.terms.bvar(0);
  let succ_pat = t.app(succ, &[b0]);
  let (tt, ff) = (t.konst(Name::BOOL_TRUE), t.konst(Name::BOOL_FALSE));
  let info = MatcherInfo {
    num_params: 0,
    num_discrs: 1,
    alts: vec![
      MatchAlt { num_vars: 0, patterns: vec![zero], rhs: tt },
      MatchAlt { num_vars: 1, patterns: vec![succ_pat], rhs: ff },
    ],
    overlapping: false,
  };
  let n = intern("isZero.match_1");
  t.g.env.add_matcher(n, &[], ty, info).unwrap();
  t.konst(n)
}

#[test]
fn match_equations() {
  let mut t = Problem::new();
  let m = matcher(&mut t);
  let nat = t.nat();
  let bool_ = t.konst(Name::BOOL);
  let x = t.local("x", nat);
  let zero = t.konst(Name::NAT_ZERO);
  let ff = t.konst(Name::BOOL_FALSE);
  let mx = t.app(m, &[x]);
  let (h1, h2) = (t.eq(nat, x, zero), t.eq(bool_, mx, ff));
  t.local("h1", h1);
  t.local("h2", h2);
  let r = t.prove(TermStore::FALSE);
  assert!(r.failed.is_empty(), "m 0 = true contradicts m x = false");
  assert!(r.proof.is_some());

  let mut t = Problem::new();
  let m = matcher(&mut t);
  let nat = t.nat();
  let bool_ = t.konst(Name::BOOL);
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let succ = t.konst(Name::NAT_SUCC);
  let sy = t.app(succ, &[y]);
  let tt = t.konst(Name::BOOL_TRUE);
  let mx = t.app(m, &[x]);
  let (h1, h2) = (t.eq(nat, x, sy), t.eq(bool_, mx, tt));
  let goal = t.goal(&[h1, h2]);
  let goal = t.saturate1(goal);
  assert!(goal.inconsistent);

  let mut t = Problem::with_config(Config { match_eqns: false, ..<_>::default() });
  let m = matcher(&mut t);
  let nat = t.nat();
  let bool_ = t.konst(Name::BOOL);
  let x = t.local("x", nat);
  let zero = t.konst(Name::NAT_ZERO);
  let ff = t.konst(Name::BOOL_FALSE);
  let mx = t.app(m, &[x]);
  let (h1, h2) = (t.eq(nat, x, zero), t.eq(bool_, mx, ff));
  let goal = t.goal(&[h1, h2]);
  let goal = t.saturate1(goal);
  assert!(!goal.inconsistent);
}

#[test]
fn fatal_errors_abort_the_search() {
  let mut t = Problem::with_config(Config { max_rec_depth: 2, ..<_>::default() });
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let fx = t.app(f, &[x]);
  let ffx = t.app(f, &[fx]);
  let fffx = t.app(f, &[ffx]);
  let h = t.eq(nat, fffx, x);
  t.local("h", h);
  let m = t.g.mctx.mk_mvar(t.lctx.iter().copied().collect(), TermStore::FALSE);
  assert!(matches!(t.g.main(m), Err(GrindError::MaxRecDepth(2))));
}
