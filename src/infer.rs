//! Local declarations, metavariables and type inference.
//!
//! Free variables and metavariables are global to a grind invocation: a case split
//! never removes a declaration, it only creates goals with longer local contexts. This
//! lets every goal share one [`MetaCtx`].

use std::collections::HashMap;
use crate::env::Environment;
use crate::error::{GrindError, Result};
use crate::name::Name;
use crate::term::{BinderInfo, FVarId, Level, Literal, MVarId, TermId, TermKind, TermStore};
use grind_util::{FVarVec, MVarVec};

/// A local hypothesis or variable.
#[derive(Clone, Debug)]
pub struct LocalDecl {
  /// The user-facing name, used only for printing.
  pub name: Name,
  /// The type of the variable.
  pub ty: TermId,
  /// The value, for `let` variables.
  pub value: Option<TermId>,
}

/// A metavariable declaration: a hole of the given type in the given context.
#[derive(Clone, Debug)]
pub struct MVarDecl {
  /// The local context visible to the hole.
  pub lctx: im::Vector<FVarId>,
  /// The type of the hole.
  pub ty: TermId,
}

/// The local declarations and metavariable assignments of a grind invocation.
#[derive(Debug, Default)]
pub struct MetaCtx {
  /// Free variable declarations.
  pub fvars: FVarVec<LocalDecl>,
  /// Metavariable declarations.
  pub mvars: MVarVec<MVarDecl>,
  assignment: HashMap<MVarId, TermId>,
  delayed: HashMap<MVarId, (Box<[FVarId]>, MVarId)>,
  infer_cache: HashMap<TermId, TermId>,
}

impl MetaCtx {
  /// Declare a new free variable.
  pub fn mk_fvar(&mut self, name: Name, ty: TermId, value: Option<TermId>) -> FVarId {
    self.fvars.push_id(LocalDecl { name, ty, value })
  }

  /// Declare a new metavariable.
  pub fn mk_mvar(&mut self, lctx: im::Vector<FVarId>, ty: TermId) -> MVarId {
    self.mvars.push_id(MVarDecl { lctx, ty })
  }

  /// Get the value assigned to a metavariable.
  #[must_use] pub fn assignment(&self, m: MVarId) -> Option<TermId> { self.assignment.get(&m).copied() }

  /// Is this metavariable assigned, directly or through a delayed assignment?
  #[must_use] pub fn is_assigned(&self, m: MVarId) -> bool {
    self.assignment.contains_key(&m) || self.delayed.contains_key(&m)
  }

  /// Assign a metavariable. Each metavariable is assigned at most once.
  pub fn assign(&mut self, m: MVarId, v: TermId) {
    let old = self.assignment.insert(m, v);
    debug_assert!(old.is_none(), "?{m:?} assigned twice");
  }

  /// Assign `m := fun xs => inner` (with `let` for the `xs` that have values), where `inner`
  /// lives in a context extended by `xs`. The binding is built when `m` is instantiated,
  /// so `inner` may be assigned later.
  pub fn assign_delayed(&mut self, m: MVarId, xs: &[FVarId], inner: MVarId) {
    let old = self.delayed.insert(m, (xs.into(), inner));
    debug_assert!(old.is_none() && !self.assignment.contains_key(&m), "?{m:?} assigned twice");
  }

  /// Abstract `xs` out of `body`, binding each with a lambda (or a `∀` if `!lambda`), or a
  /// `let` if it has a value.
  pub fn mk_binding(&self, s: &mut TermStore, lambda: bool, xs: &[FVarId], body: TermId) -> TermId {
    let mut r = s.abstract_fvars(body, xs);
    for (i, &x) in xs.iter().enumerate().rev() {
      let d = &self.fvars[x];
      let ty = s.abstract_fvars(d.ty, &xs[..i]);
      r = match d.value {
        Some(v) => { let v = s.abstract_fvars(v, &xs[..i]); s.let_(ty, v, r) }
        None if lambda => s.lam(BinderInfo::Default, ty, r),
        None => s.forall(BinderInfo::Default, ty, r),
      };
    }
    r
  }

  /// Replace assigned metavariables in `e` by their (instantiated) values.
  pub fn instantiate_mvars(&self, s: &mut TermStore, e: TermId) -> TermId {
    if !s.has_mvar(e) { return e }
    s.replace(e, &mut |s, e, _| {
      if !s.has_mvar(e) { return Some(e) }
      let TermKind::MVar(m) = *s.kind(e) else { return None };
      if let Some(v) = self.assignment(m) { return Some(self.instantiate_mvars(s, v)) }
      let (xs, inner) = self.delayed.get(&m)?;
      let inner = s.mvar(*inner);
      let body = self.instantiate_mvars(s, inner);
      Some(self.mk_binding(s, true, xs, body))
    })
  }
}

/// Substitute universe parameters in a term.
pub fn instantiate_level_params(s: &mut TermStore, e: TermId, params: &[Name], ls: &[Level]) -> TermId {
  if params.is_empty() { return e }
  s.replace(e, &mut |s, e, _| match s.kind(e) {
    TermKind::Sort(l) => { let l = l.instantiate(params, ls); Some(s.sort(l)) }
    TermKind::Const(n, us) => {
      let (n, us) = (*n, us.iter().map(|l| l.instantiate(params, ls)).collect::<Vec<_>>());
      Some(s.konst(n, &us))
    }
    _ => None,
  })
}

/// A borrowed view of everything needed to infer types.
#[derive(Debug)]
pub struct TypeChecker<'a> {
  /// The term store.
  pub terms: &'a mut TermStore,
  /// The environment.
  pub env: &'a Environment,
  /// The local context and metavariables.
  pub mctx: &'a mut MetaCtx,
}

impl TypeChecker<'_> {
  fn err<T>(&self, msg: impl Into<String>) -> Result<T> { Err(GrindError::Type(msg.into())) }

  /// Infer the type of a closed term.
  pub fn infer(&mut self, e: TermId) -> Result<TermId> {
    if let Some(&ty) = self.mctx.infer_cache.get(&e) { return Ok(ty) }
    let ty = match *self.terms.kind(e) {
      TermKind::BVar(i) => return Err(GrindError::UnexpectedBVar(i)),
      TermKind::FVar(x) => self.mctx.fvars[x].ty,
      TermKind::MVar(m) => self.mctx.mvars[m].ty,
      TermKind::Sort(ref l) => { let l = l.clone().succ(); self.terms.sort(l) }
      TermKind::Const(n, ref ls) => {
        let ls = ls.clone();
        let c = self.env.find(n)?;
        let (ty, params) = (c.ty, c.level_params.clone());
        instantiate_level_params(self.terms, ty, &params, &ls)
      }
      TermKind::App(..) => {
        let (f, args) = self.terms.app_fn_args(e);
        let mut fty = self.infer(f)?;
        let mut j = 0;
        for i in 0..args.len() {
          if !matches!(self.terms.kind(fty), TermKind::Forall(..)) {
            fty = self.terms.instantiate_rev(fty, &args[j..i]);
            j = i;
            fty = self.whnf(fty)?;
          }
          let TermKind::Forall(_, _, body) = *self.terms.kind(fty) else {
            return self.err(format!("function expected in application {e:?}"))
          };
          fty = body;
        }
        self.terms.instantiate_rev(fty, &args[j..])
      }
      TermKind::Lam(bi, dom, body) => {
        let x = self.mctx.mk_fvar(Name::ANON, dom, None);
        let ex = self.terms.fvar(x);
        let body = self.terms.instantiate1(body, ex);
        let bty = self.infer(body)?;
        let bty = self.terms.abstract_fvars(bty, &[x]);
        self.terms.forall(bi, dom, bty)
      }
      TermKind::Forall(_, dom, body) => {
        let u = self.infer_sort(dom)?;
        let x = self.mctx.mk_fvar(Name::ANON, dom, None);
        let ex = self.terms.fvar(x);
        let body = self.terms.instantiate1(body, ex);
        let v = self.infer_sort(body)?;
        self.terms.sort(u.imax(v))
      }
      TermKind::Let(_, val, body) => {
        let body = self.terms.instantiate1(body, val);
        self.infer(body)?
      }
      TermKind::Lit(Literal::Nat(_)) => self.terms.konst(Name::NAT, &[]),
      TermKind::Lit(Literal::Str(_)) => self.terms.konst(Name::STRING, &[]),
      TermKind::MData(_, e) => self.infer(e)?,
      TermKind::Proj(sn, i, st) => self.infer_proj(sn, i, st)?,
    };
    self.mctx.infer_cache.insert(e, ty);
    Ok(ty)
  }

  fn infer_proj(&mut self, sn: Name, i: u32, st: TermId) -> Result<TermId> {
    let sty = self.infer(st)?;
    let sty = self.whnf(sty)?;
    let (f, params) = self.terms.app_fn_args(sty);
    let Some(ctor) = self.env.structure(sn).map(|si| si.ctor) else {
      return self.err(format!("{sn} is not a structure"))
    };
    let TermKind::Const(_, ref ls) = *self.terms.kind(f) else {
      return self.err(format!("structure type expected, got {sty:?}"))
    };
    let ls = ls.clone();
    let c = self.env.find(ctor)?;
    let (cty, lps) = (c.ty, c.level_params.clone());
    let mut ty = instantiate_level_params(self.terms, cty, &lps, &ls);
    for &p in &params {
      ty = self.whnf(ty)?;
      let TermKind::Forall(_, _, b) = *self.terms.kind(ty) else { return self.err("bad constructor type") };
      ty = self.terms.instantiate1(b, p);
    }
    for j in 0..=i {
      ty = self.whnf(ty)?;
      let TermKind::Forall(_, d, b) = *self.terms.kind(ty) else { return self.err("bad projection index") };
      if j == i { return Ok(d) }
      let pj = self.terms.proj(sn, j, st);
      ty = self.terms.instantiate1(b, pj);
    }
    unreachable!()
  }

  /// Infer the universe level of a type.
  pub fn infer_sort(&mut self, ty: TermId) -> Result<Level> {
    let s = self.infer(ty)?;
    let s = self.whnf(s)?;
    match self.terms.kind(s) {
      TermKind::Sort(l) => Ok(l.clone()),
      _ => self.err(format!("type expected, got {ty:?}")),
    }
  }

  /// Weak head normal form: beta, zeta, annotation removal, projection of constructors
  /// and unfolding of definitions.
  pub fn whnf(&mut self, mut e: TermId) -> Result<TermId> {
    loop {
      match *self.terms.kind(e) {
        TermKind::MData(_, a) => e = a,
        TermKind::Let(_, v, b) => e = self.terms.instantiate1(b, v),
        TermKind::FVar(x) => match self.mctx.fvars[x].value {
          Some(v) => e = v,
          None => return Ok(e),
        },
        TermKind::MVar(m) => match self.mctx.assignment(m) {
          Some(v) => e = v,
          None => return Ok(e),
        },
        TermKind::Proj(_, i, st) => {
          let st = self.whnf(st)?;
          let (f, args) = self.terms.app_fn_args(st);
          match self.terms.const_name(f).and_then(|c| self.env.ctor(c)) {
            Some(c) if args.len() == (c.num_params + c.num_fields) as usize =>
              e = args[(c.num_params + i) as usize],
            _ => return Ok(e),
          }
        }
        TermKind::App(..) => {
          let (f, args) = self.terms.app_fn_args(e);
          match *self.terms.kind(f) {
            TermKind::Lam(..) => e = self.terms.head_beta(e),
            TermKind::Const(n, ref ls) => {
              let Some(ConstValue { value, params }) = self.const_value(n) else { return Ok(e) };
              let ls = ls.clone();
              let v = instantiate_level_params(self.terms, value, &params, &ls);
              let r = self.terms.mk_app(v, &args);
              e = self.terms.head_beta(r);
            }
            _ => {
              let f2 = self.whnf(f)?;
              if f2 == f { return Ok(e) }
              let r = self.terms.mk_app(f2, &args);
              e = self.terms.head_beta(r);
            }
          }
        }
        TermKind::Const(n, ref ls) => {
          let Some(ConstValue { value, params }) = self.const_value(n) else { return Ok(e) };
          let ls = ls.clone();
          e = instantiate_level_params(self.terms, value, &params, &ls);
        }
        _ => return Ok(e),
      }
    }
  }

  fn const_value(&self, n: Name) -> Option<ConstValue> {
    let c = self.env.get(n)?;
    Some(ConstValue { value: c.value?, params: c.level_params.clone() })
  }

  /// Is `ty` a proposition, that is, does it have type `Prop`?
  pub fn is_prop(&mut self, ty: TermId) -> Result<bool> {
    let s = self.infer(ty)?;
    let s = self.whnf(s)?;
    Ok(s == TermStore::PROP)
  }

  /// Is `e` a proof, that is, is its type a proposition?
  pub fn is_proof(&mut self, e: TermId) -> Result<bool> {
    if matches!(self.terms.kind(e), TermKind::Sort(_) | TermKind::Forall(..) | TermKind::Lit(_)) {
      return Ok(false)
    }
    let ty = self.infer(e)?;
    self.is_prop(ty)
  }

  /// Is `e` (an element of) a type whose head is an inductive marked for case splitting?
  /// Returns the inductive's name.
  pub fn cases_type_of(&mut self, ty: TermId) -> Result<Option<Name>> {
    let ty = self.whnf(ty)?;
    Ok(self.terms.head_const(ty).filter(|&n| self.env.is_cases(n)))
  }

  /// Decompose the type of a constant application, returning the binder info of each
  /// explicit argument position, until the type stops being a `∀`.
  pub fn binder_infos(&mut self, f: TermId, n: usize) -> Result<Vec<BinderInfo>> {
    let mut ty = self.infer(f)?;
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
      if !matches!(self.terms.kind(ty), TermKind::Forall(..)) { ty = self.whnf(ty)? }
      let TermKind::Forall(bi, _, b) = *self.terms.kind(ty) else { break };
      out.push(bi);
      ty = b;
    }
    Ok(out)
  }
}

struct ConstValue { value: TermId, params: Box<[Name]> }
