#![allow(dead_code)]

use grind::{intern, Config, Environment, Goal, Grind, GrindResult, Name, TermId, TermStore};
use grind::term::{FVarId, Level};

/// A grind context with helpers for building problems out of local variables.
pub struct Problem {
  pub g: Grind,
  pub lctx: Vec<FVarId>,
}

impl Problem {
  pub fn new() -> Self { Self::with_config(Config::default()) }

  pub fn with_config(config: Config) -> Self {
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default());
    let mut terms = TermStore::new();
    let env = Environment::with_prelude(&mut terms).unwrap();
    Problem { g: Grind::new(terms, env, config), lctx: vec![] }
  }

  /// Replace the context, e.g. to install a simplifier.
  pub fn map(self, f: impl FnOnce(Grind) -> Grind) -> Self { Problem { g: f(self.g), lctx: self.lctx } }

  pub fn local(&mut self, n: &str, ty: TermId) -> TermId {
    let x = self.g.mctx.mk_fvar(intern(n), ty, None);
    self.lctx.push(x);
    self.g.terms.fvar(x)
  }

  pub fn prop(&mut self, n: &str) -> TermId { self.local(n, TermStore::PROP) }

  pub fn nat(&mut self) -> TermId { self.g.terms.konst(Name::NAT, &[]) }

  /// `Type`, i.e. `Sort 1`.
  pub fn ty(&mut self) -> TermId { self.g.terms.sort(Level::one()) }

  pub fn konst(&mut self, n: Name) -> TermId { self.g.terms.konst(n, &[]) }

  pub fn app(&mut self, f: TermId, args: &[TermId]) -> TermId { self.g.terms.mk_app(f, args) }

  pub fn and(&mut self, a: TermId, b: TermId) -> TermId { self.g.terms.mk_const_app(Name::AND, &[a, b]) }

  pub fn or(&mut self, a: TermId, b: TermId) -> TermId { self.g.terms.mk_const_app(Name::OR, &[a, b]) }

  pub fn not(&mut self, a: TermId) -> TermId { self.g.terms.not(a) }

  pub fn arrow(&mut self, a: TermId, b: TermId) -> TermId { self.g.terms.arrow(a, b) }

  /// `@Eq ty a b` for a type `ty : Type`.
  pub fn eq(&mut self, ty: TermId, a: TermId, b: TermId) -> TermId {
    let f = self.g.terms.konst(Name::EQ, &[Level::one()]);
    self.g.terms.mk_app(f, &[ty, a, b])
  }

  /// `@ite.{1} ty c inst a b`, with a fresh `Decidable c` instance.
  pub fn ite(&mut self, ty: TermId, c: TermId, a: TermId, b: TermId) -> TermId {
    let dec = self.g.terms.mk_const_app(Name::DECIDABLE, &[c]);
    let inst = self.local("inst", dec);
    let f = self.g.terms.konst(Name::ITE, &[Level::one()]);
    self.g.terms.mk_app(f, &[ty, c, inst, a, b])
  }

  /// `@HEq.{1} ta a tb b`.
  pub fn heq(&mut self, ta: TermId, a: TermId, tb: TermId, b: TermId) -> TermId {
    let f = self.g.terms.konst(Name::HEQ, &[Level::one()]);
    self.g.terms.mk_app(f, &[ta, a, tb, b])
  }

  /// `@dite.{1} ty c inst t e`, with a fresh `Decidable c` instance.
  pub fn dite(&mut self, ty: TermId, c: TermId, t: TermId, e: TermId) -> TermId {
    let dec = self.g.terms.mk_const_app(Name::DECIDABLE, &[c]);
    let inst = self.local("inst", dec);
    let f = self.g.terms.konst(Name::DITE, &[Level::one()]);
    self.g.terms.mk_app(f, &[ty, c, inst, t, e])
  }

  /// Declare an opaque constant.
  pub fn axiom(&mut self, n: &str, ty: TermId) -> TermId {
    let n = intern(n);
    self.g.env.add_axiom(n, &[], ty).unwrap();
    self.g.terms.konst(n, &[])
  }

  /// A goal `⊢ False` with the locals declared so far, and hypotheses of the given types.
  pub fn goal(&mut self, hyps: &[TermId]) -> Goal {
    for (i, &h) in hyps.iter().enumerate() { self.local(&format!("h{i}"), h); }
    self.goal_with_target(TermStore::FALSE)
  }

  /// A goal `⊢ target` with the locals declared so far.
  pub fn goal_with_target(&mut self, target: TermId) -> Goal {
    let m = self.g.mctx.mk_mvar(self.lctx.iter().copied().collect(), target);
    self.g.mk_goal(m).unwrap()
  }

  /// Introduce and assert everything, without splitting. Returns the resulting goals.
  pub fn saturate(&mut self, goal: Goal) -> Vec<Goal> {
    let mut out = vec![];
    for g in self.g.intros(goal).unwrap() {
      out.extend(self.g.assert_all(g).unwrap())
    }
    out
  }

  /// Like [`saturate`](Self::saturate), for problems that do not branch.
  pub fn saturate1(&mut self, goal: Goal) -> Goal {
    let mut gs = self.saturate(goal);
    assert_eq!(gs.len(), 1, "unexpected branching");
    gs.pop().unwrap()
  }

  /// Run the whole search on `⊢ target` with the locals declared so far.
  pub fn prove(&mut self, target: TermId) -> GrindResult {
    let m = self.g.mctx.mk_mvar(self.lctx.iter().copied().collect(), target);
    self.g.main(m).unwrap()
  }
}
