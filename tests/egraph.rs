mod common;

use common::Problem;
use grind::{intern, Config, Goal, GoalM, GrindError, Name, TermId, TermStore};
use grind::env::CtorDecl;
use grind::grind::{AssertResult, Direction, HeadIndex, NewFact};
use grind::term::{BinderInfo, Level};

#[test]
fn reflexivity() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(x, 0, None).unwrap();
  assert!(m.goal.is_eqv(x, x));
  let h = m.mk_eq_proof(x, x).unwrap();
  let refl = m.terms().mk_const_app(grind::Name::EQ_REFL, &[x]);
  assert_eq!(h, refl);
}

#[test]
fn internalize_is_memoized() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let fx = t.app(f, &[x]);
  let ffx = t.app(f, &[fx]);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(ffx, 0, None).unwrap();
  let n = m.ctx.stats.enodes;
  let size = m.goal.enodes.len();
  m.internalize(ffx, 0, None).unwrap();
  m.internalize(fx, 3, None).unwrap();
  assert_eq!(m.ctx.stats.enodes, n);
  assert_eq!(m.goal.enodes.len(), size);
  // the generation of the first internalization sticks
  assert_eq!(m.goal.generation(fx), 0);
}

#[test]
fn congruence_is_one_directional() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let (fx, fy) = (t.app(f, &[x]), t.app(f, &[y]));
  let h = t.eq(nat, fx, fy);
  let goal = t.goal(&[h]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eqv(fx, fy));
  assert!(!goal.is_eqv(x, y));
  assert!(!goal.inconsistent);
}

#[test]
fn equal_arguments_give_equal_applications() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let (fx, fy) = (t.app(f, &[x]), t.app(f, &[y]));
  let (ffx, ffy) = (t.app(f, &[fx]), t.app(f, &[fy]));
  let h = t.eq(nat, x, y);
  let mut goal = t.goal(&[h]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(ffx, 0, None).unwrap();
  m.internalize(ffy, 0, None).unwrap();
  assert!(!m.goal.is_eqv(ffx, ffy));
  let goal = t.saturate1(goal);
  assert!(goal.is_eqv(fx, fy));
  assert!(goal.is_eqv(ffx, ffy));
  assert!(t.g.stats.congrs >= 2);
}

#[test]
fn equations_are_transitive() {
  let mut t = Problem::new();
  let nat = t.nat();
  let a = t.local("a", nat);
  let b = t.local("b", nat);
  let c = t.local("c", nat);
  let d = t.local("d", nat);
  let (ab, cb, dc) = (t.eq(nat, a, b), t.eq(nat, c, b), t.eq(nat, d, c));
  let goal = t.goal(&[ab, cb, dc]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eqv(a, d));
  let mut eqc = goal.eqc(a);
  eqc.sort();
  let mut expected = vec![a, b, c, d];
  expected.sort();
  assert_eq!(eqc, expected);
}

#[test]
fn and_true_makes_both_sides_true() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let goal = t.goal(&[pq]);
  let mut goal = t.saturate1(goal);
  assert!(goal.is_eq_true(pq));
  assert!(goal.is_eq_true(p));
  assert!(goal.is_eq_true(q));
  // the conjunction is only split on when it is false
  assert!(t.g.split_next(&mut goal).unwrap().is_none());
}

#[test]
fn one_true_conjunct_does_not_make_the_conjunction_true() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let mut goal = t.goal(&[p]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(pq, 0, None).unwrap();
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_true(p));
  assert!(!goal.is_eq_true(pq));
  assert!(!goal.is_eq_false(pq));
  // but it is equal to the other conjunct
  assert!(goal.is_eqv(pq, q));
}

#[test]
fn false_conjunct_makes_the_conjunction_false() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let np = t.not(p);
  let mut goal = t.goal(&[np]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(pq, 0, None).unwrap();
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_false(p));
  assert!(goal.is_eq_false(pq));
  assert!(!goal.is_eq_false(q));
}

#[test]
fn false_conjunction_does_not_decide_the_conjuncts() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let npq = t.not(pq);
  let goal = t.goal(&[npq]);
  let mut goal = t.saturate1(goal);
  assert!(goal.is_eq_false(pq));
  for x in [p, q] { assert!(!goal.is_eq_true(x) && !goal.is_eq_false(x)) }
  let cands: Vec<_> = goal.split_candidates.iter().map(|c| c.term()).collect();
  assert!(cands.contains(&pq));
  let gs = t.g.split_next(&mut goal).unwrap().expect("split on the left conjunct");
  assert_eq!(gs.len(), 2);
}

#[test]
fn or_rules() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let r = t.prop("r");
  let s = t.prop("s");
  let pq = t.or(p, q);
  let rs = t.or(r, s);
  let nrs = t.not(rs);
  let goal = t.goal(&[pq, nrs]);
  let goal = t.saturate1(goal);
  // a true disjunction decides nothing
  assert!(goal.is_eq_true(pq));
  for x in [p, q] { assert!(!goal.is_eq_true(x) && !goal.is_eq_false(x)) }
  // a false one makes both disjuncts false
  assert!(goal.is_eq_false(r));
  assert!(goal.is_eq_false(s));
  assert!(!goal.inconsistent);
}

#[test]
fn true_disjunct_makes_the_disjunction_true() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.or(p, q);
  let mut goal = t.goal(&[q]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(pq, 0, None).unwrap();
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_true(pq));
  assert!(!goal.is_eq_true(p));
}

#[test]
fn not_rules() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let np = t.not(p);
  let nq = t.not(q);
  let goal = t.goal(&[np, q]);
  let mut goal = t.saturate1(goal);
  assert!(goal.is_eq_false(p));
  assert!(goal.is_eq_true(q));
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(nq, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(m.goal.is_eq_false(nq));
  assert!(!m.goal.inconsistent);
}

#[test]
fn consistent_facts_are_not_contradictory() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let p = t.prop("p");
  let q = t.prop("q");
  let fx = t.app(f, &[x]);
  let fy = t.app(f, &[y]);
  let fx_y = t.eq(nat, fx, y);
  let fy_x = t.eq(nat, fy, x);
  let xy = t.eq(nat, x, y);
  let nxy = t.not(xy);
  let pq = t.or(p, q);
  let nq = t.not(q);
  let goal = t.goal(&[fx_y, fy_x, nxy, pq, nq]);
  let goal = t.saturate1(goal);
  assert!(!goal.inconsistent);
  assert!(goal.is_eq_false(xy));
  assert!(!goal.is_eqv(x, y));
}

#[test]
fn contradiction_closes_the_goal() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let (fx, fy) = (t.app(f, &[x]), t.app(f, &[y]));
  let xy = t.eq(nat, x, y);
  let fxy = t.eq(nat, fx, fy);
  let nfxy = t.not(fxy);
  let goal = t.goal(&[xy, nfxy]);
  let m = goal.mvar;
  let goal = t.saturate1(goal);
  assert!(goal.inconsistent);
  assert!(t.g.mctx.is_assigned(m));
}

#[test]
fn distinct_constructors_are_contradictory() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let zero = t.konst(grind::Name::NAT_ZERO);
  let succ = t.konst(grind::Name::NAT_SUCC);
  let sx = t.app(succ, &[x]);
  let y = t.local("y", nat);
  let h1 = t.eq(nat, y, zero);
  let h2 = t.eq(nat, y, sx);
  let goal = t.goal(&[h1, h2]);
  let goal = t.saturate1(goal);
  assert!(goal.inconsistent);
}

#[test]
fn injection_equates_fields() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let succ = t.konst(grind::Name::NAT_SUCC);
  let (sx, sy) = (t.app(succ, &[x]), t.app(succ, &[y]));
  let h = t.eq(nat, sx, sy);
  let goal = t.goal(&[h]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eqv(x, y));
  assert!(!goal.inconsistent);
}

#[test]
fn annotations_are_stripped_before_internalizing() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.and(p, q);
  let h = t.g.terms.mdata(intern("noindex"), pq);
  let goal = t.goal(&[h]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_true(p));
  assert!(!goal.is_internalized(h));
}

#[test]
fn max_rec_depth_is_fatal() {
  let mut t = Problem::with_config(Config { max_rec_depth: 3, ..<_>::default() });
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let mut e = t.local("x", nat);
  for _ in 0..5 { e = t.app(f, &[e]) }
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  assert!(matches!(m.internalize(e, 0, None), Err(GrindError::MaxRecDepth(3))));
}

#[test]
fn unexpected_terms_are_fatal() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let mut goal = t.goal(&[]);
  let mv = t.g.mctx.mk_mvar(goal.lctx.clone(), nat);
  let mv = t.g.terms.mvar(mv);
  let md = t.g.terms.mdata(intern("k"), x);
  let pr = t.g.terms.proj(grind::Name::AND, 0, x);
  let bv = t.g.terms.bvar(0);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  assert!(matches!(m.internalize(mv, 0, None), Err(GrindError::UnexpectedMVar(_))));
  assert!(matches!(m.internalize(md, 0, None), Err(GrindError::UnexpectedMData(_))));
  assert!(matches!(m.internalize(pr, 0, None), Err(GrindError::UnexpectedProj(_))));
  assert!(matches!(m.internalize(bv, 0, None), Err(GrindError::UnexpectedBVar(0))));
}

#[test]
fn non_propositions_are_reported() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.add_fact(x, x, 0).unwrap();
  assert_eq!(t.g.issues.len(), 1);
  assert!(!goal.is_internalized(x));
}

fn wrap_up(m: &mut GoalM<'_>, e: TermId) -> grind::Result<()> {
  let a = m.ctx.terms.app_args(e)[0];
  let h = m.terms().mk_const_app(intern("wrap_eq"), &[a]);
  m.push_eq(e, a, h);
  Ok(())
}

#[test]
fn custom_propagators() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let wrap = t.axiom("wrap", nat_nat);
  let x = t.local("x", nat);
  let wx = t.app(wrap, &[x]);
  t.g.register_propagator(intern("wrap"), Direction::Up, wrap_up);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(wx, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(m.goal.is_eqv(wx, x));
  assert!(!m.goal.is_eqv(wx, TermStore::TRUE));
}

#[test]
fn applications_are_indexed_by_head() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let fv = *t.lctx.last().unwrap();
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let (fx, fy) = (t.app(f, &[x]), t.app(f, &[y]));
  let ffx = t.app(f, &[fx]);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(ffx, 0, None).unwrap();
  m.internalize(fy, 0, None).unwrap();
  let apps: Vec<_> = goal.apps_of(HeadIndex::FVar(fv)).into_iter().collect();
  assert_eq!(apps, [fx, ffx, fy]);
  assert!(goal.apps_of(HeadIndex::Const(grind::Name::AND)).is_empty());
}

#[test]
fn heq_of_equal_terms_is_true() {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let y = t.local("y", nat);
  let xy = t.eq(nat, x, y);
  let hxy = t.heq(nat, x, nat, y);
  let goal = t.goal(&[xy]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(hxy, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_eq_true(hxy));
}

#[test]
fn true_heq_equates_both_sides_and_their_types() {
  let mut t = Problem::new();
  let ty = t.ty();
  let tt = t.local("T", ty);
  let u = t.local("U", ty);
  let a = t.local("a", tt);
  let b = t.local("b", u);
  let q = t.prop("q");
  let h = t.heq(tt, a, u, b);
  let qh = t.and(q, h);
  let goal = t.goal(&[qh]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_true(h));
  assert!(goal.is_eqv(a, b));
  assert!(goal.is_eqv(tt, u));
  assert!(!goal.inconsistent);
}

#[test]
fn dite_applies_the_branch_to_the_evidence() {
  let mut t = Problem::new();
  let nat = t.nat();
  let c = t.prop("c");
  let c_nat = t.arrow(c, nat);
  let g = t.local("g", c_nat);
  let gv = *t.lctx.last().unwrap();
  let b = t.local("b", nat);
  let b0 = t.g.terms.bvar(0);
  let g0 = t.app(g, &[b0]);
  let then_ = t.g.terms.lam(BinderInfo::Default, c, g0);
  let nc = t.not(c);
  let else_ = t.g.terms.lam(BinderInfo::Default, nc, b);
  let e = t.dite(nat, c, then_, else_);
  let goal = t.goal(&[c]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(e, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  // `g h` for the evidence `h : c`, the only application of `g`
  let apps: Vec<_> = goal.apps_of(HeadIndex::FVar(gv)).into_iter().collect();
  assert_eq!(apps.len(), 1);
  assert!(goal.is_eqv(e, apps[0]));
  assert!(!goal.is_eqv(e, b));
}

#[test]
fn dite_with_false_condition_takes_the_else_branch() {
  let mut t = Problem::new();
  let nat = t.nat();
  let c = t.prop("c");
  let a = t.local("a", nat);
  let b = t.local("b", nat);
  let nc = t.not(c);
  let then_ = t.g.terms.lam(BinderInfo::Default, c, a);
  let else_ = t.g.terms.lam(BinderInfo::Default, nc, b);
  let e = t.dite(nat, c, then_, else_);
  let goal = t.goal(&[nc]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(e, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_eqv(e, b));
  assert!(!goal.is_eqv(e, a));
}

#[test]
fn casts_are_heterogeneously_equal_to_their_argument() {
  let mut t = Problem::new();
  let ty = t.ty();
  let tt = t.local("T", ty);
  let u = t.local("U", ty);
  let a = t.local("a", tt);
  let b = t.local("b", u);
  let eq2 = t.g.terms.konst(Name::EQ, &[Level::one().succ()]);
  let tu = t.g.terms.mk_app(eq2, &[ty, tt, u]);
  let h = t.local("h", tu);
  let cast = t.g.terms.konst(Name::CAST, &[Level::one()]);
  let cast = t.g.terms.mk_app(cast, &[tt, u, h, a]);
  let mpr = t.g.terms.konst(Name::EQ_MPR, &[Level::one()]);
  let mpr = t.g.terms.mk_app(mpr, &[tt, u, h, b]);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(cast, 0, None).unwrap();
  m.internalize(mpr, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_eqv(cast, a));
  assert!(goal.is_eqv(mpr, b));
  assert!(!goal.is_eqv(a, b));
}

/// Internalize `p → q` in a goal with one hypothesis built from `p` and `q`.
fn with_implication(hyp: fn(&mut Problem, TermId, TermId) -> TermId) -> (Goal, TermId, TermId) {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.arrow(p, q);
  let h = hyp(&mut t, p, q);
  let goal = t.goal(&[h]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(pq, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  (goal, pq, q)
}

#[test]
fn implication_up_rules() {
  let (goal, pq, _) = with_implication(|t, p, _| t.not(p));
  assert!(goal.is_eq_true(pq));
  let (goal, pq, _) = with_implication(|_, _, q| q);
  assert!(goal.is_eq_true(pq));
  let (goal, pq, q) = with_implication(|_, p, _| p);
  assert!(goal.is_eqv(pq, q));
  assert!(!goal.is_eq_true(pq));
}

#[test]
fn modus_ponens() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let q = t.prop("q");
  let pq = t.arrow(p, q);
  let goal = t.goal(&[pq, p]);
  let goal = t.saturate1(goal);
  assert!(goal.is_eq_true(pq));
  assert!(goal.is_eq_true(q));
}

#[test]
fn match_condition_without_equations_is_its_body() {
  let mut t = Problem::new();
  let p = t.prop("p");
  let mc = t.g.terms.mk_const_app(Name::MATCH_COND, &[p]);
  let goal = t.goal(&[p]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(mc, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_eqv(mc, p));
  assert!(goal.is_eq_true(mc));
}

/// `grind.MatchCond (x = 0 → False)`, in a goal where `x` is equal to `disc`.
fn zero_match_condition(disc: fn(&mut Problem, TermId) -> TermId) -> (Goal, TermId) {
  let mut t = Problem::new();
  let nat = t.nat();
  let x = t.local("x", nat);
  let zero = t.konst(Name::NAT_ZERO);
  let x_zero = t.eq(nat, x, zero);
  let body = t.g.terms.forall(BinderInfo::Default, x_zero, TermStore::FALSE);
  let mc = t.g.terms.mk_const_app(Name::MATCH_COND, &[body]);
  let d = disc(&mut t, nat);
  let h = t.eq(nat, x, d);
  let goal = t.goal(&[h]);
  let mut goal = t.saturate1(goal);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(mc, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_internalized(x));
  (goal, mc)
}

#[test]
fn match_condition_is_true_on_a_constructor_clash() {
  let (goal, mc) = zero_match_condition(|t, nat| {
    let y = t.local("y", nat);
    let succ = t.konst(Name::NAT_SUCC);
    t.app(succ, &[y])
  });
  assert!(goal.is_eq_true(mc));
  let (goal, mc) = zero_match_condition(|t, _| t.konst(Name::NAT_ZERO));
  assert!(!goal.is_eq_true(mc));
  let (goal, mc) = zero_match_condition(|t, nat| t.local("y", nat));
  assert!(!goal.is_eq_true(mc));
}

#[test]
fn elements_of_unit_like_types_are_equal() {
  let mut t = Problem::new();
  let ty = t.ty();
  let (token, mk) = (intern("Token"), intern("Token.mk"));
  let token_t = t.konst(token);
  t.g.env.add_inductive(token, &[], ty, 0, 0, &[CtorDecl { name: mk, ty: token_t, num_fields: 0 }]).unwrap();
  t.g.env.add_structure(token, &[]).unwrap();
  let x = t.local("x", token_t);
  let y = t.local("y", token_t);
  let mk = t.konst(mk);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(x, 0, None).unwrap();
  m.internalize(y, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_eqv(x, mk));
  assert!(goal.is_eqv(x, y));
}

#[test]
fn kernel_projections_become_projection_functions() {
  let mut t = Problem::new();
  let ty = t.ty();
  let nat = t.nat();
  let (point, mk, px, py) = (intern("Point"), intern("Point.mk"), intern("Point.x"), intern("Point.y"));
  let point_t = t.konst(point);
  let nat_point = t.arrow(nat, point_t);
  let mk_ty = t.arrow(nat, nat_point);
  t.g.env.add_inductive(point, &[], ty, 0, 0, &[CtorDecl { name: mk, ty: mk_ty, num_fields: 2 }]).unwrap();
  let proj_ty = t.arrow(point_t, nat);
  t.g.env.add_axiom(px, &[], proj_ty).unwrap();
  t.g.env.add_axiom(py, &[], proj_ty).unwrap();
  t.g.env.add_structure(point, &[px, py]).unwrap();
  let p = t.local("p", point_t);
  let kp = t.g.terms.proj(point, 1, p);
  let five = t.g.terms.nat_lit(5u32);
  let h = t.eq(nat, kp, five);
  let goal = t.goal(&[h]);
  let goal = t.saturate1(goal);
  let py = t.konst(py);
  let py_p = t.app(py, &[p]);
  assert!(goal.is_internalized(py_p));
  assert!(goal.is_eqv(py_p, five));
  assert!(!goal.is_internalized(kp));
}

#[test]
fn new_facts_are_asserted_in_order() {
  let mut t = Problem::new();
  let props = [t.prop("p"), t.prop("q"), t.prop("r")];
  let proofs = [t.local("hp", props[0]), t.local("hq", props[1]), t.local("hr", props[2])];
  let mut goal = t.goal(&[]);
  for (prop, proof) in props.into_iter().zip(proofs) {
    goal.new_facts.push_back(NewFact { prop, proof, generation: 0 });
  }
  let mut m = GoalM::new(&mut t.g, &mut goal);
  for (i, &p) in props.iter().enumerate() {
    assert!(matches!(m.assert_next().unwrap(), AssertResult::Progress));
    assert!(m.goal.is_eq_true(p));
    assert!(props[i + 1..].iter().all(|&q| !m.goal.is_internalized(q)));
  }
  assert!(matches!(m.assert_next().unwrap(), AssertResult::Done));
  assert_eq!(m.goal.lctx.len(), 6 + 3);
}

#[test]
fn let_values_are_internalized() {
  let mut t = Problem::new();
  let nat = t.nat();
  let nat_nat = t.arrow(nat, nat);
  let f = t.local("f", nat_nat);
  let a = t.local("a", nat);
  let c = t.local("c", nat);
  let fa = t.app(f, &[a]);
  let e = t.g.terms.let_(nat, fa, c);
  let mut goal = t.goal(&[]);
  let mut m = GoalM::new(&mut t.g, &mut goal);
  m.internalize(e, 0, None).unwrap();
  m.process_new_eqs().unwrap();
  assert!(goal.is_internalized(fa));
  assert!(goal.is_eqv(e, c));
}
