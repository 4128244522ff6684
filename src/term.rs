//! Hash-consed terms with de Bruijn indexed binders.
//!
//! Every term lives in a [`TermStore`] and is referred to by a [`TermId`]. The store
//! deduplicates on construction, so two structurally equal terms always get the same id,
//! and comparing ids is comparing terms. This plays the role of `shareCommon`: the
//! internalizer relies on it to memoize shared subterms.

use std::collections::HashMap;
use std::rc::Rc;
use num::BigUint;
use smallvec::SmallVec;
pub use grind_util::{FVarId, MVarId, TermId, TermVec};
use crate::name::Name;

/// A universe level.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Level {
  /// The level of `Prop`.
  Zero,
  /// The successor of a level.
  Succ(Rc<Level>),
  /// The larger of two levels.
  Max(Rc<Level>, Rc<Level>),
  /// `imax u v` is `0` if `v` is `0`, otherwise `max u v`.
  IMax(Rc<Level>, Rc<Level>),
  /// A universe parameter of a declaration.
  Param(Name),
}

impl Level {
  /// The level `1`, so that `Sort 1` is `Type`.
  #[must_use] pub fn one() -> Level { Level::Succ(Rc::new(Level::Zero)) }

  /// The successor level.
  #[must_use] pub fn succ(self) -> Level { Level::Succ(Rc::new(self)) }

  /// The level `max u v`, simplified when one side is `0`.
  #[must_use] pub fn max(self, v: Level) -> Level {
    match (self, v) {
      (Level::Zero, v) => v,
      (u, Level::Zero) => u,
      (u, v) if u == v => u,
      (u, v) => Level::Max(Rc::new(u), Rc::new(v)),
    }
  }

  /// The level `imax u v`, simplified when `v` is known to be zero or nonzero.
  #[must_use] pub fn imax(self, v: Level) -> Level {
    match v {
      Level::Zero => Level::Zero,
      Level::Succ(_) => self.max(v),
      v if self == Level::Zero => v,
      v => Level::IMax(Rc::new(self), Rc::new(v)),
    }
  }

  /// Is this literally the level `0`?
  #[must_use] pub fn is_zero(&self) -> bool { matches!(self, Level::Zero) }

  /// Substitute universe parameters.
  #[must_use] pub fn instantiate(&self, params: &[Name], ls: &[Level]) -> Level {
    match self {
      Level::Zero => Level::Zero,
      Level::Succ(l) => l.instantiate(params, ls).succ(),
      Level::Max(a, b) => a.instantiate(params, ls).max(b.instantiate(params, ls)),
      Level::IMax(a, b) => a.instantiate(params, ls).imax(b.instantiate(params, ls)),
      &Level::Param(n) => match params.iter().position(|&p| p == n) {
        Some(i) if i < ls.len() => ls[i].clone(),
        _ => Level::Param(n),
      },
    }
  }
}

/// How a binder was written, which determines how its argument is treated by congruence.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum BinderInfo {
  /// An explicit binder `(x : A)`.
  #[default] Default,
  /// An implicit binder `{x : A}`.
  Implicit,
  /// A strict implicit binder `⦃x : A⦄`.
  StrictImplicit,
  /// An instance binder `[x : A]`.
  InstImplicit,
}

/// A literal value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
  /// A natural number literal.
  Nat(BigUint),
  /// A string literal.
  Str(Rc<str>),
}

/// The shape of a term. Children are [`TermId`]s into the same store.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TermKind {
  /// A loose bound variable, as a de Bruijn index.
  BVar(u32),
  /// A free variable of the local context.
  FVar(FVarId),
  /// A metavariable.
  MVar(MVarId),
  /// A universe `Sort u`.
  Sort(Level),
  /// A constant with universe arguments.
  Const(Name, Rc<[Level]>),
  /// A function application.
  App(TermId, TermId),
  /// `fun x : A => b`
  Lam(BinderInfo, TermId, TermId),
  /// `∀ x : A, B`
  Forall(BinderInfo, TermId, TermId),
  /// `let x : A := v; b`
  Let(TermId, TermId, TermId),
  /// A literal.
  Lit(Literal),
  /// An annotation, which must be removed before terms are compared.
  MData(Name, TermId),
  /// A kernel projection `s.i` out of the structure named in the first field.
  Proj(Name, u32, TermId),
}

bitflags::bitflags! {
  /// Summary information cached for each term.
  #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
  pub struct TermFlags: u8 {
    /// Does this term contain a free variable?
    const HAS_FVAR  = 1 << 0;
    /// Does this term contain a metavariable?
    const HAS_MVAR  = 1 << 1;
    /// Does this term contain an annotation?
    const HAS_MDATA = 1 << 2;
    /// Does this term contain a kernel projection?
    const HAS_PROJ  = 1 << 3;
    /// Does this term contain a `let`?
    const HAS_LET   = 1 << 4;
  }
}

#[derive(Debug)]
struct TermData {
  k: TermKind,
  flags: TermFlags,
  /// One more than the largest loose bound variable, or `0` if the term is closed.
  loose_bvar_range: u32,
}

/// The hash-consing arena for terms.
#[derive(Debug)]
pub struct TermStore {
  data: TermVec<TermData>,
  map: HashMap<TermKind, TermId>,
}

impl Default for TermStore {
  fn default() -> Self { Self::new() }
}

type Args = SmallVec<[TermId; 4]>;

impl TermStore {
  /// The proposition `True`, allocated first in every store.
  pub const TRUE: TermId = TermId(0);
  /// The proposition `False`, allocated second in every store.
  pub const FALSE: TermId = TermId(1);
  /// `Prop`, that is, `Sort 0`.
  pub const PROP: TermId = TermId(2);

  /// Construct a new store containing the pinned terms.
  #[must_use] pub fn new() -> Self {
    let mut s = TermStore { data: TermVec::default(), map: HashMap::new() };
    assert_eq!(s.konst(Name::PROP_TRUE, &[]), Self::TRUE);
    assert_eq!(s.konst(Name::PROP_FALSE, &[]), Self::FALSE);
    assert_eq!(s.sort(Level::Zero), Self::PROP);
    s
  }

  /// The number of distinct terms allocated so far.
  #[must_use] pub fn len(&self) -> usize { self.data.len() }

  /// Returns true if no terms have been allocated (never the case after [`TermStore::new`]).
  #[must_use] pub fn is_empty(&self) -> bool { self.data.is_empty() }

  /// Hash-cons a term: returns the unique id for this term shape.
  pub fn mk(&mut self, k: TermKind) -> TermId {
    if let Some(&e) = self.map.get(&k) { return e }
    let (flags, loose_bvar_range) = self.summarize(&k);
    let e = self.data.push_id(TermData { k: k.clone(), flags, loose_bvar_range });
    self.map.insert(k, e);
    e
  }

  fn summarize(&self, k: &TermKind) -> (TermFlags, u32) {
    let d = |e: TermId| (self.data[e].flags, self.data[e].loose_bvar_range);
    let under = |r: u32| r.saturating_sub(1);
    match *k {
      TermKind::BVar(i) => (TermFlags::empty(), i + 1),
      TermKind::FVar(_) => (TermFlags::HAS_FVAR, 0),
      TermKind::MVar(_) => (TermFlags::HAS_MVAR, 0),
      TermKind::Sort(_) | TermKind::Const(..) | TermKind::Lit(_) => (TermFlags::empty(), 0),
      TermKind::App(f, a) => {
        let ((f1, r1), (f2, r2)) = (d(f), d(a));
        (f1 | f2, r1.max(r2))
      }
      TermKind::Lam(_, t, b) | TermKind::Forall(_, t, b) => {
        let ((f1, r1), (f2, r2)) = (d(t), d(b));
        (f1 | f2, r1.max(under(r2)))
      }
      TermKind::Let(t, v, b) => {
        let ((f1, r1), (f2, r2), (f3, r3)) = (d(t), d(v), d(b));
        (f1 | f2 | f3 | TermFlags::HAS_LET, r1.max(r2).max(under(r3)))
      }
      TermKind::MData(_, e) => { let (f, r) = d(e); (f | TermFlags::HAS_MDATA, r) }
      TermKind::Proj(_, _, e) => { let (f, r) = d(e); (f | TermFlags::HAS_PROJ, r) }
    }
  }

  /// The shape of a term.
  #[must_use] pub fn kind(&self, e: TermId) -> &TermKind { &self.data[e].k }

  /// The cached flags of a term.
  #[must_use] pub fn flags(&self, e: TermId) -> TermFlags { self.data[e].flags }

  /// Does this term have loose bound variables?
  #[must_use] pub fn has_loose_bvars(&self, e: TermId) -> bool { self.data[e].loose_bvar_range > 0 }

  /// Does the term mention any free variable?
  #[must_use] pub fn has_fvar(&self, e: TermId) -> bool { self.flags(e).contains(TermFlags::HAS_FVAR) }

  /// Does the term mention any metavariable?
  #[must_use] pub fn has_mvar(&self, e: TermId) -> bool { self.flags(e).contains(TermFlags::HAS_MVAR) }

  // Constructors

  /// A bound variable.
  pub fn bvar(&mut self, i: u32) -> TermId { self.mk(TermKind::BVar(i)) }
  /// A free variable.
  pub fn fvar(&mut self, v: FVarId) -> TermId { self.mk(TermKind::FVar(v)) }
  /// A metavariable.
  pub fn mvar(&mut self, v: MVarId) -> TermId { self.mk(TermKind::MVar(v)) }
  /// `Sort l`.
  pub fn sort(&mut self, l: Level) -> TermId { self.mk(TermKind::Sort(l)) }
  /// A constant.
  pub fn konst(&mut self, n: Name, ls: &[Level]) -> TermId { self.mk(TermKind::Const(n, ls.into())) }
  /// `f a`.
  pub fn app(&mut self, f: TermId, a: TermId) -> TermId { self.mk(TermKind::App(f, a)) }
  /// `f a1 ... an`.
  pub fn mk_app(&mut self, f: TermId, args: &[TermId]) -> TermId {
    args.iter().fold(f, |f, &a| self.app(f, a))
  }
  /// `c a1 ... an` for a constant `c` with no universe arguments.
  pub fn mk_const_app(&mut self, c: Name, args: &[TermId]) -> TermId {
    let f = self.konst(c, &[]);
    self.mk_app(f, args)
  }
  /// `fun x : ty => body`, where `body` refers to `x` as `#0`.
  pub fn lam(&mut self, bi: BinderInfo, ty: TermId, body: TermId) -> TermId {
    self.mk(TermKind::Lam(bi, ty, body))
  }
  /// `∀ x : ty, body`, where `body` refers to `x` as `#0`.
  pub fn forall(&mut self, bi: BinderInfo, ty: TermId, body: TermId) -> TermId {
    self.mk(TermKind::Forall(bi, ty, body))
  }
  /// The non-dependent arrow `a → b`.
  pub fn arrow(&mut self, a: TermId, b: TermId) -> TermId {
    let b = self.lift_loose_bvars(b, 0, 1);
    self.forall(BinderInfo::Default, a, b)
  }
  /// `let x : ty := val; body`.
  pub fn let_(&mut self, ty: TermId, val: TermId, body: TermId) -> TermId {
    self.mk(TermKind::Let(ty, val, body))
  }
  /// A natural number literal.
  pub fn nat_lit(&mut self, n: impl Into<BigUint>) -> TermId { self.mk(TermKind::Lit(Literal::Nat(n.into()))) }
  /// A string literal.
  pub fn str_lit(&mut self, s: &str) -> TermId { self.mk(TermKind::Lit(Literal::Str(s.into()))) }
  /// An annotated term.
  pub fn mdata(&mut self, k: Name, e: TermId) -> TermId { self.mk(TermKind::MData(k, e)) }
  /// A kernel projection.
  pub fn proj(&mut self, s: Name, i: u32, e: TermId) -> TermId { self.mk(TermKind::Proj(s, i, e)) }
  /// `¬p`.
  pub fn not(&mut self, p: TermId) -> TermId { self.mk_const_app(Name::NOT, &[p]) }

  // Destructors

  /// The name of a constant term.
  #[must_use] pub fn const_name(&self, e: TermId) -> Option<Name> {
    if let TermKind::Const(n, _) = self.kind(e) { Some(*n) } else { None }
  }

  /// Strips applications: the `f` in `f a1 ... an`.
  #[must_use] pub fn app_fn(&self, mut e: TermId) -> TermId {
    while let TermKind::App(f, _) = *self.kind(e) { e = f }
    e
  }

  /// The name of the head constant of an application, if any.
  #[must_use] pub fn head_const(&self, e: TermId) -> Option<Name> { self.const_name(self.app_fn(e)) }

  /// The number of arguments `n` in `f a1 ... an`.
  #[must_use] pub fn app_num_args(&self, mut e: TermId) -> usize {
    let mut n = 0;
    while let TermKind::App(f, _) = *self.kind(e) { e = f; n += 1 }
    n
  }

  /// Decomposes `f a1 ... an` into `(f, [a1, ..., an])`.
  #[must_use] pub fn app_fn_args(&self, mut e: TermId) -> (TermId, Args) {
    let mut args = Args::new();
    while let TermKind::App(f, a) = *self.kind(e) { args.push(a); e = f }
    args.reverse();
    (e, args)
  }

  /// The arguments of an application.
  #[must_use] pub fn app_args(&self, e: TermId) -> Args { self.app_fn_args(e).1 }

  /// Is `e` an application of constant `c` to exactly `n` arguments?
  #[must_use] pub fn is_app_of(&self, e: TermId, c: Name, n: usize) -> bool {
    self.head_const(e) == Some(c) && self.app_num_args(e) == n
  }

  /// If `e` is an application of constant `c` to exactly `n` arguments, return the arguments.
  #[must_use] pub fn match_app(&self, e: TermId, c: Name, n: usize) -> Option<Args> {
    let (f, args) = self.app_fn_args(e);
    (self.const_name(f) == Some(c) && args.len() == n).then_some(args)
  }

  /// Matches `@Eq α a b`, returning `(α, a, b)`.
  #[must_use] pub fn match_eq(&self, e: TermId) -> Option<(TermId, TermId, TermId)> {
    self.match_app(e, Name::EQ, 3).map(|a| (a[0], a[1], a[2]))
  }

  /// Matches `@HEq α a β b`, returning `(α, a, β, b)`.
  #[must_use] pub fn match_heq(&self, e: TermId) -> Option<(TermId, TermId, TermId, TermId)> {
    self.match_app(e, Name::HEQ, 4).map(|a| (a[0], a[1], a[2], a[3]))
  }

  /// Matches `¬p`, returning `p`.
  #[must_use] pub fn match_not(&self, e: TermId) -> Option<TermId> {
    self.match_app(e, Name::NOT, 1).map(|a| a[0])
  }

  /// Matches a non-dependent arrow `a → b`, returning `(a, b)` with `b` lowered out of the binder.
  #[must_use] pub fn match_arrow(&mut self, e: TermId) -> Option<(TermId, TermId)> {
    let TermKind::Forall(_, a, b) = *self.kind(e) else { return None };
    if self.has_loose_bvar(b, 0) { return None }
    Some((a, self.lower_loose_bvars(b, 1, 1)))
  }

  /// Returns true if this is the literal `True` or `False` constant.
  #[must_use] pub fn is_true_or_false(&self, e: TermId) -> bool { e == Self::TRUE || e == Self::FALSE }

  // Traversals

  /// Rebuild `e` after applying `f` to each immediate child. `f` receives the binder depth
  /// offset of the child relative to `e`.
  fn map_children(&mut self, e: TermId, f: &mut impl FnMut(&mut Self, TermId, u32) -> TermId) -> TermId {
    let k = match *self.kind(e) {
      TermKind::App(a, b) => TermKind::App(f(self, a, 0), f(self, b, 0)),
      TermKind::Lam(bi, t, b) => TermKind::Lam(bi, f(self, t, 0), f(self, b, 1)),
      TermKind::Forall(bi, t, b) => TermKind::Forall(bi, f(self, t, 0), f(self, b, 1)),
      TermKind::Let(t, v, b) => TermKind::Let(f(self, t, 0), f(self, v, 0), f(self, b, 1)),
      TermKind::MData(n, a) => TermKind::MData(n, f(self, a, 0)),
      TermKind::Proj(s, i, a) => TermKind::Proj(s, i, f(self, a, 0)),
      _ => return e,
    };
    self.mk(k)
  }

  /// Generic memoized rewriting. `f(store, e, offset)` returns `Some(e')` to replace `e`
  /// (found under `offset` binders) or `None` to recurse into its children.
  pub fn replace(&mut self, e: TermId, f: &mut impl FnMut(&mut Self, TermId, u32) -> Option<TermId>) -> TermId {
    fn go(s: &mut TermStore, e: TermId, offset: u32,
      cache: &mut HashMap<(TermId, u32), TermId>,
      f: &mut impl FnMut(&mut TermStore, TermId, u32) -> Option<TermId>,
    ) -> TermId {
      if let Some(&r) = cache.get(&(e, offset)) { return r }
      let r = match f(s, e, offset) {
        Some(r) => r,
        None => s.map_children(e, &mut |s, c, d| go(s, c, offset + d, cache, f)),
      };
      cache.insert((e, offset), r);
      r
    }
    go(self, e, 0, &mut HashMap::new(), f)
  }

  /// Does `e` contain the loose bound variable `#i`?
  #[must_use] pub fn has_loose_bvar(&self, e: TermId, i: u32) -> bool {
    if self.data[e].loose_bvar_range <= i { return false }
    match *self.kind(e) {
      TermKind::BVar(j) => i == j,
      TermKind::App(a, b) => self.has_loose_bvar(a, i) || self.has_loose_bvar(b, i),
      TermKind::Lam(_, t, b) | TermKind::Forall(_, t, b) =>
        self.has_loose_bvar(t, i) || self.has_loose_bvar(b, i + 1),
      TermKind::Let(t, v, b) =>
        self.has_loose_bvar(t, i) || self.has_loose_bvar(v, i) || self.has_loose_bvar(b, i + 1),
      TermKind::MData(_, a) | TermKind::Proj(_, _, a) => self.has_loose_bvar(a, i),
      _ => false,
    }
  }

  /// Shift loose bound variables `#i` with `i >= s` up by `d`.
  pub fn lift_loose_bvars(&mut self, e: TermId, s: u32, d: u32) -> TermId {
    if d == 0 || self.data[e].loose_bvar_range <= s { return e }
    self.replace(e, &mut |st, e, off| {
      if st.data[e].loose_bvar_range <= s + off { return Some(e) }
      match *st.kind(e) {
        TermKind::BVar(i) => Some(st.bvar(i + d)),
        _ => None,
      }
    })
  }

  /// Shift loose bound variables `#i` with `i >= s` down by `d`. The caller guarantees that
  /// there are no loose variables in the range `[s - d, s)`.
  pub fn lower_loose_bvars(&mut self, e: TermId, s: u32, d: u32) -> TermId {
    if d == 0 || self.data[e].loose_bvar_range <= s { return e }
    self.replace(e, &mut |st, e, off| {
      if st.data[e].loose_bvar_range <= s + off { return Some(e) }
      match *st.kind(e) {
        TermKind::BVar(i) => Some(st.bvar(i - d)),
        _ => None,
      }
    })
  }

  /// Replace the loose bound variable `#i` by `subst[subst.len() - 1 - i]` for `i < subst.len()`,
  /// and lower the remaining loose variables. This is the inverse of [`abstract_fvars`].
  ///
  /// [`abstract_fvars`]: Self::abstract_fvars
  pub fn instantiate_rev(&mut self, e: TermId, subst: &[TermId]) -> TermId {
    let n = u32::try_from(subst.len()).expect("overflow");
    if n == 0 || !self.has_loose_bvars(e) { return e }
    self.replace(e, &mut |st, e, off| {
      if st.data[e].loose_bvar_range <= off { return Some(e) }
      let TermKind::BVar(i) = *st.kind(e) else { return None };
      Some(if i < off { e }
        else if i - off < n {
          let v = subst[(n - 1 - (i - off)) as usize];
          st.lift_loose_bvars(v, 0, off)
        } else { st.bvar(i - n) })
    })
  }

  /// Replace the loose bound variable `#0` by `v`.
  pub fn instantiate1(&mut self, e: TermId, v: TermId) -> TermId { self.instantiate_rev(e, &[v]) }

  /// Replace the free variables `xs[i]` by `#(n - 1 - i)` (under the current binder depth).
  pub fn abstract_fvars(&mut self, e: TermId, xs: &[FVarId]) -> TermId {
    let n = u32::try_from(xs.len()).expect("overflow");
    if n == 0 || !self.has_fvar(e) { return e }
    self.replace(e, &mut |st, e, off| {
      if !st.has_fvar(e) { return Some(e) }
      let TermKind::FVar(x) = *st.kind(e) else { return None };
      Some(match xs.iter().rposition(|&y| y == x) {
        Some(i) => st.bvar(off + n - 1 - u32::try_from(i).expect("overflow")),
        None => e,
      })
    })
  }

  /// Does `e` mention the free variable `x`?
  #[must_use] pub fn occurs_fvar(&self, e: TermId, x: FVarId) -> bool {
    if !self.has_fvar(e) { return false }
    match *self.kind(e) {
      TermKind::FVar(y) => x == y,
      TermKind::App(a, b) | TermKind::Lam(_, a, b) | TermKind::Forall(_, a, b) =>
        self.occurs_fvar(a, x) || self.occurs_fvar(b, x),
      TermKind::Let(t, v, b) => self.occurs_fvar(t, x) || self.occurs_fvar(v, x) || self.occurs_fvar(b, x),
      TermKind::MData(_, a) | TermKind::Proj(_, _, a) => self.occurs_fvar(a, x),
      _ => false,
    }
  }

  /// Beta reduce `f a1 ... an` when `f` is a lambda (possibly after partial application).
  pub fn head_beta(&mut self, e: TermId) -> TermId {
    let (mut f, args) = self.app_fn_args(e);
    if !matches!(self.kind(f), TermKind::Lam(..)) { return e }
    let mut i = 0;
    while i < args.len() {
      let TermKind::Lam(_, _, b) = *self.kind(f) else { break };
      f = self.instantiate1(b, args[i]);
      i += 1;
    }
    let rest = &args[i..];
    let r = self.mk_app(f, rest);
    self.head_beta(r)
  }

  /// Remove all annotations from `e`.
  pub fn cleanup_annotations(&mut self, e: TermId) -> TermId {
    if !self.flags(e).contains(TermFlags::HAS_MDATA) { return e }
    self.replace(e, &mut |st, e, _| {
      if !st.flags(e).contains(TermFlags::HAS_MDATA) { return Some(e) }
      match *st.kind(e) {
        TermKind::MData(_, a) => Some(st.cleanup_annotations(a)),
        _ => None,
      }
    })
  }

  /// Call `f` on every subterm of `e` that does not contain loose bound variables,
  /// outermost first, skipping repeated visits of shared subterms.
  pub fn for_each_closed(&self, e: TermId, f: &mut impl FnMut(TermId)) {
    let mut visited = bit_set::BitSet::new();
    let mut stack = vec![e];
    while let Some(e) = stack.pop() {
      if !visited.insert(e.index()) { continue }
      if !self.has_loose_bvars(e) { f(e) }
      match *self.kind(e) {
        TermKind::App(a, b) | TermKind::Lam(_, a, b) | TermKind::Forall(_, a, b) => { stack.push(b); stack.push(a) }
        TermKind::Let(t, v, b) => { stack.push(b); stack.push(v); stack.push(t) }
        TermKind::MData(_, a) | TermKind::Proj(_, _, a) => stack.push(a),
        _ => {}
      }
    }
  }
}
