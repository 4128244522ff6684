//! The goal state threaded through the engine.

use std::collections::{hash_map::DefaultHasher, VecDeque};
use std::hash::BuildHasherDefault;
use smallvec::SmallVec;
use crate::name::Name;
use crate::term::{FVarId, MVarId, TermId};

/// A persistent map with a deterministic hasher, so that runs are reproducible.
pub type PMap<K, V> = im::HashMap<K, V, BuildHasherDefault<DefaultHasher>>;
/// A persistent set with a deterministic hasher.
pub type PSet<K> = im::HashSet<K, BuildHasherDefault<DefaultHasher>>;

bitflags::bitflags! {
  /// Per-node flags. The `EQ_TRUE`, `EQ_FALSE`, `HAS_LAMBDAS` and `HEQ_PROOFS` flags are
  /// only meaningful on roots, where they summarize the whole class.
  #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
  pub struct ENodeFlags: u8 {
    /// A value (`True`, `False`, a literal) distinct from all other values.
    const INTERPRETED    = 1 << 0;
    /// A fully applied constructor.
    const CTOR           = 1 << 1;
    /// The class contains a lambda.
    const HAS_LAMBDAS    = 1 << 2;
    /// The class was built using heterogeneous equalities.
    const HEQ_PROOFS     = 1 << 3;
    /// The term is an application tracked by the congruence table.
    const CONGR_RELEVANT = 1 << 4;
    /// The class contains `True`.
    const EQ_TRUE        = 1 << 5;
    /// The class contains `False`.
    const EQ_FALSE       = 1 << 6;
  }
}

/// An E-graph node, one per internalized term.
#[derive(Clone, Debug)]
pub struct ENode {
  /// The term this node represents.
  pub term: TermId,
  /// The representative of the class. Updated eagerly on union.
  pub root: TermId,
  /// The next element of the cyclic list of class members.
  pub next: TermId,
  /// The representative of the congruence class of this application.
  pub congr: TermId,
  /// The proof forest edge: this node was merged with `target` ...
  pub target: Option<TermId>,
  /// ... by this proof, of `term = target`, or of `target = term` if `flipped`.
  pub proof: Option<TermId>,
  /// Whether the edge proof goes from `target` to `term`.
  pub flipped: bool,
  /// Whether the edge proof is a heterogeneous equality.
  pub heq: bool,
  /// The number of members of the class (valid at roots).
  pub size: u32,
  /// Flags, see [`ENodeFlags`].
  pub flags: ENodeFlags,
  /// The generation of the term: `0` for terms of the input, `n + 1` for terms created by
  /// instantiating a fact whose trigger had generation `n`.
  pub generation: u32,
  /// Creation order.
  pub idx: u32,
  /// The applications which have a member of this class as a direct child (valid at roots).
  pub parents: im::OrdSet<TermId>,
}

impl ENode {
  /// Is this node the representative of its class?
  #[must_use] pub fn is_root(&self) -> bool { self.root == self.term }
  /// Is this node the representative of its congruence class?
  #[must_use] pub fn is_congr_root(&self) -> bool { self.congr == self.term }
  /// Is the node an interpreted value?
  #[must_use] pub fn interpreted(&self) -> bool { self.flags.contains(ENodeFlags::INTERPRETED) }
  /// Is the node a constructor application?
  #[must_use] pub fn ctor(&self) -> bool { self.flags.contains(ENodeFlags::CTOR) }
}

/// An equality waiting to be merged into the E-graph.
#[derive(Clone, Copy, Debug)]
pub struct PendingEq {
  /// The left hand side.
  pub lhs: TermId,
  /// The right hand side.
  pub rhs: TermId,
  /// A proof of `lhs = rhs` (or `HEq lhs rhs`).
  pub proof: TermId,
  /// Is this a heterogeneous equality?
  pub heq: bool,
}

/// A fact discovered during the search, waiting to be asserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewFact {
  /// The proposition.
  pub prop: TermId,
  /// Its proof.
  pub proof: TermId,
  /// The generation of the terms in the fact.
  pub generation: u32,
}

/// A case split the engine may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplitInfo {
  /// Split on whether the proposition holds (conditions of `ite`/`dite`).
  Cond(TermId),
  /// Split on the discriminants of a matcher application.
  Match(TermId),
  /// Split on the constructor of a variable whose type is a `grind cases` inductive.
  Cases(TermId),
  /// A disjunction that is true: split into the two disjuncts.
  Or(TermId),
  /// A conjunction that is false: split on its left conjunct.
  NotAnd(TermId),
}

impl SplitInfo {
  /// The term being split on.
  #[must_use] pub fn term(self) -> TermId {
    match self {
      SplitInfo::Cond(e) | SplitInfo::Match(e) | SplitInfo::Cases(e) |
      SplitInfo::Or(e) | SplitInfo::NotAnd(e) => e
    }
  }
}

/// The head symbol of an application, used to index applications by head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeadIndex {
  /// A constant head.
  Const(Name),
  /// A local variable head.
  FVar(FVarId),
  /// Any other head (lambda, metavariable, ...), by term.
  Other(TermId),
}

/// The state of one goal. Cloning is cheap: all large components are persistent.
#[derive(Clone, Debug)]
pub struct Goal {
  /// The metavariable this goal assigns.
  pub mvar: MVarId,
  /// The local context.
  pub lctx: im::Vector<FVarId>,
  /// The E-graph nodes.
  pub enodes: PMap<TermId, ENode>,
  /// The congruence table: congruence hash to the representatives with that hash.
  pub congr_table: PMap<u64, SmallVec<[TermId; 2]>>,
  /// Applications indexed by head symbol.
  pub app_map: PMap<HeadIndex, im::Vector<TermId>>,
  /// Split candidates, in discovery order.
  pub split_candidates: im::Vector<SplitInfo>,
  /// Candidates that were queued at some point, to avoid enqueueing twice.
  pub split_seen: PSet<SplitInfo>,
  /// Terms whose case split has been performed on this branch.
  pub resolved_splits: PSet<TermId>,
  /// The number of case splits performed on this branch.
  pub num_splits: u32,
  /// Hypotheses introduced but not yet processed.
  pub intro_queue: im::Vector<FVarId>,
  /// Facts discovered by propagation, waiting to be asserted.
  pub new_facts: im::Vector<NewFact>,
  /// Equalities waiting to be merged.
  pub pending: VecDeque<PendingEq>,
  /// Matchers whose equations have been registered.
  pub seen_matchers: PSet<Name>,
  /// Matcher applications and alternatives whose equation has been instantiated.
  pub match_eqn_keys: PSet<(TermId, u32)>,
  /// Extensionality instances already produced, by theorem and disequality.
  pub ext_keys: PSet<(Name, TermId)>,
  /// Has a contradiction been found? Then `mvar` is assigned.
  pub inconsistent: bool,
  /// Has `by_contra` been applied?
  pub by_contra_done: bool,
  /// The index of the next node.
  pub next_idx: u32,
}

impl Goal {
  /// An empty goal for the given metavariable.
  #[must_use] pub fn new(mvar: MVarId, lctx: im::Vector<FVarId>) -> Self {
    Goal {
      mvar, lctx,
      enodes: PMap::default(),
      congr_table: PMap::default(),
      app_map: PMap::default(),
      split_candidates: im::Vector::new(),
      split_seen: PSet::default(),
      resolved_splits: PSet::default(),
      num_splits: 0,
      intro_queue: im::Vector::new(),
      new_facts: im::Vector::new(),
      pending: VecDeque::new(),
      seen_matchers: PSet::default(),
      match_eqn_keys: PSet::default(),
      ext_keys: PSet::default(),
      inconsistent: false,
      by_contra_done: false,
      next_idx: 0,
    }
  }

  /// Get the node of an internalized term.
  #[must_use] pub fn get_enode(&self, e: TermId) -> Option<&ENode> { self.enodes.get(&e) }

  /// Has this term been internalized?
  #[must_use] pub fn is_internalized(&self, e: TermId) -> bool { self.enodes.contains_key(&e) }

  /// The representative of the class of `e`, or `e` itself if it is not internalized.
  #[must_use] pub fn get_root(&self, e: TermId) -> TermId { self.enodes.get(&e).map_or(e, |n| n.root) }

  /// The node of the representative of the class of `e`.
  #[must_use] pub fn get_root_enode(&self, e: TermId) -> Option<&ENode> {
    self.enodes.get(&self.get_root(e))
  }

  /// Are `a` and `b` in the same class?
  #[must_use] pub fn is_eqv(&self, a: TermId, b: TermId) -> bool {
    a == b || self.is_internalized(a) && self.is_internalized(b) && self.get_root(a) == self.get_root(b)
  }

  fn root_flag(&self, e: TermId, f: ENodeFlags) -> bool {
    self.get_root_enode(e).is_some_and(|n| n.flags.contains(f))
  }

  /// Is `e` known to be equal to `True`?
  #[must_use] pub fn is_eq_true(&self, e: TermId) -> bool { self.root_flag(e, ENodeFlags::EQ_TRUE) }

  /// Is `e` known to be equal to `False`?
  #[must_use] pub fn is_eq_false(&self, e: TermId) -> bool { self.root_flag(e, ENodeFlags::EQ_FALSE) }

  /// The generation of `e`, or `0` if it is not internalized.
  #[must_use] pub fn generation(&self, e: TermId) -> u32 { self.enodes.get(&e).map_or(0, |n| n.generation) }

  /// The members of the class of `e`, starting at `e`.
  #[must_use] pub fn eqc(&self, e: TermId) -> Vec<TermId> {
    let mut out = vec![e];
    let Some(n) = self.get_enode(e) else { return out };
    let mut it = n.next;
    while it != e {
      out.push(it);
      it = self.enodes[&it].next;
    }
    out
  }

  /// The applications whose head is `h`.
  #[must_use] pub fn apps_of(&self, h: HeadIndex) -> im::Vector<TermId> {
    self.app_map.get(&h).cloned().unwrap_or_default()
  }
}
