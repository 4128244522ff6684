//! The congruence closure engine.
//!
//! A [`Grind`] context owns everything that is shared between goals (terms, environment,
//! local declarations and metavariables, configuration and the external procedures). Each
//! [`Goal`] owns its E-graph, which is built from persistent maps so that case splits can
//! clone it cheaply. Most operations live on [`GoalM`], which pairs the context with the
//! goal being worked on.

mod congr;
mod enode;
mod internalize;
mod intro;
mod match_eqns;
mod preprocess;
mod proof;
mod propagate;
mod split;
pub mod types;

use std::collections::HashMap;
use std::rc::Rc;
use crate::config::Config;
use crate::env::Environment;
use crate::error::Result;
use crate::infer::{MetaCtx, TypeChecker};
use crate::name::Name;
use crate::print::PPTerm;
use crate::term::{MVarId, TermId, TermStore};
pub use types::{ENode, ENodeFlags, Goal, HeadIndex, NewFact, SplitInfo};
pub use propagate::{Direction, Propagator, Propagators};
pub use preprocess::{Arith, BetaSimp, NoArith, NoopSimp, Simp, SimpResult};
pub use intro::{AssertResult, IntroResult};

/// Counters describing the work done by a grind invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
  /// E-graph nodes created.
  pub enodes: u64,
  /// Congruences discovered.
  pub congrs: u64,
  /// Classes merged.
  pub merges: u64,
  /// Case splits performed.
  pub splits: u64,
  /// Facts asserted from the new fact queue.
  pub facts: u64,
}

/// The context shared by all goals of one grind invocation.
#[derive(Debug)]
pub struct Grind {
  /// The term store.
  pub terms: TermStore,
  /// The environment.
  pub env: Environment,
  /// Local declarations and metavariables.
  pub mctx: MetaCtx,
  /// Configuration.
  pub config: Config,
  /// Problems that were tolerated, in the order they were reported.
  pub issues: Vec<String>,
  /// Statistics.
  pub stats: Stats,
  propagators: Propagators,
  simp: Box<dyn Simp>,
  arith: Box<dyn Arith>,
  depth: u32,
  relevance: HashMap<(TermId, usize), Rc<[bool]>>,
  proofs: HashMap<TermId, bool>,
}

/// The result of [`Grind::main`].
#[derive(Debug)]
pub struct GrindResult {
  /// The proof of the original goal, if every branch was closed.
  pub proof: Option<TermId>,
  /// The goals on which no further progress could be made.
  pub failed: Vec<Goal>,
}

/// The result of processing one goal in the search loop.
#[derive(Debug)]
enum Outcome {
  Closed,
  Branch(Vec<Goal>),
  Stuck(Goal),
}

impl Grind {
  /// Construct a new context with the builtin propagators and no external procedures.
  #[must_use] pub fn new(terms: TermStore, env: Environment, config: Config) -> Self {
    Grind {
      terms, env, config,
      mctx: MetaCtx::default(),
      issues: vec![],
      stats: Stats::default(),
      propagators: Propagators::builtin(),
      simp: Box::new(NoopSimp),
      arith: Box::new(NoArith),
      depth: 0,
      relevance: HashMap::new(),
      proofs: HashMap::new(),
    }
  }

  /// Use the given simplifier during preprocessing.
  #[must_use] pub fn with_simp(mut self, simp: Box<dyn Simp>) -> Self { self.simp = simp; self }

  /// Use the given arithmetic procedure.
  #[must_use] pub fn with_arith(mut self, arith: Box<dyn Arith>) -> Self { self.arith = arith; self }

  /// Register a propagator for applications of the constant `n`, replacing any existing one.
  pub fn register_propagator(&mut self, n: Name, dir: Direction, f: Propagator) {
    self.propagators.register(n, dir, f)
  }

  /// Record a problem which does not prevent the search from continuing.
  pub fn report_issue(&mut self, msg: String) {
    log::warn!(target: "grind::issues", "{msg}");
    self.issues.push(msg)
  }

  /// Borrow the parts of the context needed for type inference.
  pub fn tc(&mut self) -> TypeChecker<'_> {
    TypeChecker { terms: &mut self.terms, env: &self.env, mctx: &mut self.mctx }
  }

  /// Display a term.
  #[must_use] pub fn pp(&self, e: TermId) -> PPTerm<'_> { self.terms.pp(Some(&self.mctx), e) }

  /// Create the initial goal for `mvar`. Hypotheses already in its local context are
  /// queued for introduction.
  pub fn mk_goal(&mut self, mvar: MVarId) -> Result<Goal> {
    let lctx = self.mctx.mvars[mvar].lctx.clone();
    let mut goal = Goal::new(mvar, lctx.clone());
    let mut m = GoalM { ctx: self, goal: &mut goal };
    m.mk_enode(TermStore::TRUE, 0);
    m.mk_enode(TermStore::FALSE, 0);
    for x in lctx {
      let ty = m.ctx.mctx.fvars[x].ty;
      if m.ctx.tc().is_prop(ty)? { m.goal.intro_queue.push_back(x) }
    }
    Ok(goal)
  }

  /// Introduce the binders of the target and process the hypotheses of `goal`.
  /// Returns the goal itself, or its subgoals if a hypothesis was destructed.
  pub fn intros(&mut self, mut goal: Goal) -> Result<Vec<Goal>> {
    let r = GoalM { ctx: self, goal: &mut goal }.intros()?;
    Ok(r.unwrap_or_else(|| vec![goal]))
  }

  /// Assert the facts of the new fact queue until it is empty or the goal is closed.
  pub fn assert_all(&mut self, mut goal: Goal) -> Result<Vec<Goal>> {
    let mut m = GoalM { ctx: self, goal: &mut goal };
    loop {
      match m.assert_next()? {
        AssertResult::Done => break,
        AssertResult::Progress => if m.goal.inconsistent { break },
        AssertResult::Branch(gs) => return Ok(gs),
      }
    }
    Ok(vec![goal])
  }

  /// Perform the next ready case split of `goal`, if any.
  pub fn split_next(&mut self, goal: &mut Goal) -> Result<Option<Vec<Goal>>> {
    GoalM { ctx: self, goal }.split_next()
  }

  fn process(&mut self, mut goal: Goal) -> Result<Outcome> {
    let mut m = GoalM { ctx: self, goal: &mut goal };
    if let Some(gs) = m.intros()? { return Ok(Outcome::Branch(gs)) }
    loop {
      if m.goal.inconsistent { return Ok(Outcome::Closed) }
      match m.assert_next()? {
        AssertResult::Done => break,
        AssertResult::Progress => {}
        AssertResult::Branch(gs) => return Ok(Outcome::Branch(gs)),
      }
    }
    if let Some(gs) = m.split_next()? { return Ok(Outcome::Branch(gs)) }
    Ok(Outcome::Stuck(goal))
  }

  /// Try to close the goal `mvar` by congruence closure, propagation and case splitting.
  /// Fails only on fatal errors; running out of things to do is reported through
  /// [`GrindResult::failed`].
  pub fn main(&mut self, mvar: MVarId) -> Result<GrindResult> {
    let goal = self.mk_goal(mvar)?;
    let mut stack = vec![goal];
    let mut failed = vec![];
    while let Some(goal) = stack.pop() {
      match self.process(goal)? {
        Outcome::Closed => {}
        Outcome::Branch(gs) => stack.extend(gs.into_iter().rev()),
        Outcome::Stuck(g) => {
          log::debug!(target: "grind::split", "stuck on ?m.{}", g.mvar.into_inner());
          failed.push(g)
        }
      }
    }
    let proof = failed.is_empty().then(|| {
      let e = self.terms.mvar(mvar);
      self.mctx.instantiate_mvars(&mut self.terms, e)
    });
    Ok(GrindResult { proof, failed })
  }
}

/// A goal being worked on, together with the shared context.
#[derive(Debug)]
pub struct GoalM<'a> {
  /// The shared context.
  pub ctx: &'a mut Grind,
  /// The goal.
  pub goal: &'a mut Goal,
}

impl<'a> GoalM<'a> {
  /// Work on `goal` in the context `ctx`.
  pub fn new(ctx: &'a mut Grind, goal: &'a mut Goal) -> Self { GoalM { ctx, goal } }

  /// The term store.
  pub fn terms(&mut self) -> &mut TermStore { &mut self.ctx.terms }

  /// Type inference.
  pub fn tc(&mut self) -> TypeChecker<'_> { self.ctx.tc() }

  /// Infer the type of a term.
  pub fn infer(&mut self, e: TermId) -> Result<TermId> { self.ctx.tc().infer(e) }

  /// Is `e` a proposition?
  pub fn is_prop(&mut self, e: TermId) -> Result<bool> { self.ctx.tc().is_prop(e) }

  /// Is `e` a proof? Cached, since the congruence table asks for every argument.
  pub fn is_proof(&mut self, e: TermId) -> Result<bool> {
    if let Some(&b) = self.ctx.proofs.get(&e) { return Ok(b) }
    let b = self.ctx.tc().is_proof(e)?;
    self.ctx.proofs.insert(e, b);
    Ok(b)
  }

  /// Replace assigned metavariables.
  pub fn instantiate_mvars(&mut self, e: TermId) -> TermId {
    self.ctx.mctx.instantiate_mvars(&mut self.ctx.terms, e)
  }

  /// Display a term.
  #[must_use] pub fn pp(&self, e: TermId) -> PPTerm<'_> { self.ctx.pp(e) }

  /// Record a tolerated problem.
  pub fn report_issue(&mut self, msg: String) { self.ctx.report_issue(msg) }

  /// The current target of the goal.
  pub fn target(&mut self) -> TermId {
    let ty = self.ctx.mctx.mvars[self.goal.mvar].ty;
    self.instantiate_mvars(ty)
  }

  /// `@Eq α a b`, where `α` is the type of `a`.
  pub fn mk_eq(&mut self, a: TermId, b: TermId) -> Result<TermId> {
    let ty = self.infer(a)?;
    let u = self.ctx.tc().infer_sort(ty)?;
    let eq = self.terms().konst(Name::EQ, &[u]);
    Ok(self.terms().mk_app(eq, &[ty, a, b]))
  }

  /// `@HEq α a β b`.
  pub fn mk_heq(&mut self, a: TermId, b: TermId) -> Result<TermId> {
    let (ta, tb) = (self.infer(a)?, self.infer(b)?);
    let u = self.ctx.tc().infer_sort(ta)?;
    let heq = self.terms().konst(Name::HEQ, &[u]);
    Ok(self.terms().mk_app(heq, &[ta, a, tb, b]))
  }
}
