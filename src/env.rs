//! The global environment of declarations known to the engine.

use std::collections::{HashMap, HashSet};
use grind_util::HashMapExt;
use crate::error::{GrindError, Result};
use crate::name::{intern, Name};
use crate::term::{BinderInfo, Level, TermId, TermStore};

/// A declared constant.
#[derive(Clone, Debug)]
pub struct ConstInfo {
  /// The name of the constant.
  pub name: Name,
  /// The universe parameters, referenced as [`Level::Param`] in the type and value.
  pub level_params: Box<[Name]>,
  /// The type of the constant.
  pub ty: TermId,
  /// The definitional value, if this is a definition which may be unfolded.
  pub value: Option<TermId>,
}

/// An inductive type.
#[derive(Clone, Debug)]
pub struct InductiveInfo {
  /// The number of parameters.
  pub num_params: u32,
  /// The number of indices.
  pub num_indices: u32,
  /// The constructors, in order.
  pub ctors: Vec<Name>,
}

/// A constructor of an inductive type.
#[derive(Clone, Debug)]
pub struct CtorInfo {
  /// The inductive type this constructs.
  pub induct: Name,
  /// The index of this constructor in [`InductiveInfo::ctors`].
  pub cidx: u32,
  /// The number of parameters (shared with the inductive type).
  pub num_params: u32,
  /// The number of fields.
  pub num_fields: u32,
}

/// A structure, i.e. a single-constructor non-recursive inductive, with its projections.
#[derive(Clone, Debug)]
pub struct StructureInfo {
  /// The unique constructor.
  pub ctor: Name,
  /// The projection functions, one per field.
  pub projs: Vec<Name>,
}

/// One alternative of a matcher.
///
/// The patterns and the right hand side live under `num_params + num_vars` binders:
/// the matcher parameters followed by the pattern variables, so that
/// `instantiate_rev(rhs, params ++ vars)` produces the instance.
#[derive(Clone, Debug)]
pub struct MatchAlt {
  /// The number of pattern variables.
  pub num_vars: u32,
  /// One pattern per discriminant.
  pub patterns: Vec<TermId>,
  /// The value of the matcher when this alternative applies.
  pub rhs: TermId,
}

/// An auxiliary function compiled from a `match` expression, applied as
/// `m p₁ … pₖ d₁ … dₙ` to its parameters and discriminants.
#[derive(Clone, Debug)]
pub struct MatcherInfo {
  /// The number of leading parameters.
  pub num_params: u32,
  /// The number of discriminants.
  pub num_discrs: u32,
  /// The alternatives, tried in order.
  pub alts: Vec<MatchAlt>,
  /// If true, alternative `i` only applies when alternatives `0..i` are refuted.
  pub overlapping: bool,
}

impl MatcherInfo {
  /// The number of arguments of a full application.
  #[must_use] pub fn arity(&self) -> usize { (self.num_params + self.num_discrs) as usize }
}

/// The environment: constants, inductive types and the attributes grind consults.
#[derive(Debug, Default)]
pub struct Environment {
  consts: HashMap<Name, ConstInfo>,
  inductives: HashMap<Name, InductiveInfo>,
  ctors: HashMap<Name, CtorInfo>,
  structures: HashMap<Name, StructureInfo>,
  proj_fns: HashMap<Name, (Name, u32)>,
  matchers: HashMap<Name, MatcherInfo>,
  cases: HashSet<Name>,
  ext_thms: HashMap<Name, Vec<Name>>,
}

/// A constructor declaration for [`Environment::add_inductive`].
#[derive(Clone, Copy, Debug)]
pub struct CtorDecl {
  /// The constructor name.
  pub name: Name,
  /// The full type of the constructor, including parameters.
  pub ty: TermId,
  /// The number of fields.
  pub num_fields: u32,
}

impl Environment {
  /// Get a declared constant.
  #[must_use] pub fn get(&self, n: Name) -> Option<&ConstInfo> { self.consts.get(&n) }

  /// Get a declared constant, or fail with [`GrindError::UnknownConstant`].
  pub fn find(&self, n: Name) -> Result<&ConstInfo> { self.get(n).ok_or(GrindError::UnknownConstant(n)) }

  /// Get an inductive type.
  #[must_use] pub fn inductive(&self, n: Name) -> Option<&InductiveInfo> { self.inductives.get(&n) }

  /// Get a constructor.
  #[must_use] pub fn ctor(&self, n: Name) -> Option<&CtorInfo> { self.ctors.get(&n) }

  /// Get a structure.
  #[must_use] pub fn structure(&self, n: Name) -> Option<&StructureInfo> { self.structures.get(&n) }

  /// If `n` is a projection function, the structure it projects out of and the field index.
  #[must_use] pub fn proj_fn(&self, n: Name) -> Option<(Name, u32)> { self.proj_fns.get(&n).copied() }

  /// Get a matcher.
  #[must_use] pub fn matcher(&self, n: Name) -> Option<&MatcherInfo> { self.matchers.get(&n) }

  /// Is `n` an inductive marked with the `grind cases` attribute?
  #[must_use] pub fn is_cases(&self, n: Name) -> bool { self.cases.contains(&n) }

  /// The extensionality theorems registered for the type with head `n`.
  #[must_use] pub fn ext_thms(&self, n: Name) -> &[Name] { self.ext_thms.get(&n).map_or(&[], |v| v) }

  fn add_const(&mut self, info: ConstInfo) -> Result<()> {
    if let Some((info, _)) = self.consts.try_insert_ext(info.name, info) {
      return Err(GrindError::AlreadyDeclared(info.name))
    }
    Ok(())
  }

  /// Declare an opaque constant.
  pub fn add_axiom(&mut self, name: Name, level_params: &[Name], ty: TermId) -> Result<()> {
    self.add_const(ConstInfo { name, level_params: level_params.into(), ty, value: None })
  }

  /// Declare a definition, which `whnf` may unfold.
  pub fn add_def(&mut self, name: Name, level_params: &[Name], ty: TermId, value: TermId) -> Result<()> {
    self.add_const(ConstInfo { name, level_params: level_params.into(), ty, value: Some(value) })
  }

  /// Declare an inductive type with its constructors.
  pub fn add_inductive(&mut self,
    name: Name, level_params: &[Name], ty: TermId,
    num_params: u32, num_indices: u32, ctors: &[CtorDecl],
  ) -> Result<()> {
    self.add_axiom(name, level_params, ty)?;
    for (cidx, c) in (0..).zip(ctors) {
      self.add_axiom(c.name, level_params, c.ty)?;
      self.ctors.insert(c.name, CtorInfo { induct: name, cidx, num_params, num_fields: c.num_fields });
    }
    let ctors = ctors.iter().map(|c| c.name).collect();
    self.inductives.insert(name, InductiveInfo { num_params, num_indices, ctors });
    Ok(())
  }

  /// Mark an already declared single-constructor inductive as a structure with the given
  /// projection functions (which must be declared separately).
  pub fn add_structure(&mut self, name: Name, projs: &[Name]) -> Result<()> {
    let ind = self.inductive(name).ok_or(GrindError::UnknownConstant(name))?;
    let &[ctor] = &ind.ctors[..] else {
      return Err(GrindError::Type(format!("{name} is not a structure")))
    };
    for (i, &p) in (0..).zip(projs) { self.proj_fns.insert(p, (name, i)); }
    self.structures.insert(name, StructureInfo { ctor, projs: projs.into() });
    Ok(())
  }

  /// Declare a matcher (an auxiliary `match` function).
  pub fn add_matcher(&mut self, name: Name, level_params: &[Name], ty: TermId, info: MatcherInfo) -> Result<()> {
    self.add_axiom(name, level_params, ty)?;
    self.matchers.insert(name, info);
    Ok(())
  }

  /// Mark an inductive type as a case-split target.
  pub fn add_cases_attr(&mut self, name: Name) -> Result<()> {
    if self.inductive(name).is_none() { return Err(GrindError::UnknownConstant(name)) }
    self.cases.insert(name);
    Ok(())
  }

  /// Register an extensionality theorem `thm : ∀ xs, P → a = b` for the type with head `ty`.
  pub fn add_ext_thm(&mut self, ty: Name, thm: Name) -> Result<()> {
    self.find(thm)?;
    self.ext_thms.entry(ty).or_default().push(thm);
    Ok(())
  }

  /// An environment containing the logical prelude used by the propagators.
  pub fn with_prelude(s: &mut TermStore) -> Result<Self> {
    let mut env = Environment::default();
    env.add_prelude(s)?;
    Ok(env)
  }

  #[allow(clippy::many_single_char_names)]
  fn add_prelude(&mut self, s: &mut TermStore) -> Result<()> {
    use BinderInfo::{Default as D, Implicit as I, InstImplicit as Inst};
    let (u_name, v_name) = (intern("u"), intern("v"));
    let (u, v) = (Level::Param(u_name), Level::Param(v_name));
    let prop = TermStore::PROP;
    let ty = s.sort(Level::one());
    let sort_u = s.sort(u.clone());
    let b = |s: &mut TermStore, i| s.bvar(i);
    let eq_u = |s: &mut TermStore, args: &[TermId]| {
      let f = s.konst(Name::EQ, &[u.clone()]);
      s.mk_app(f, args)
    };

    // True, False
    self.add_inductive(Name::PROP_TRUE, &[], prop, 0, 0,
      &[CtorDecl { name: Name::TRUE_INTRO, ty: TermStore::TRUE, num_fields: 0 }])?;
    self.add_inductive(Name::PROP_FALSE, &[], prop, 0, 0, &[])?;

    // Not : Prop → Prop := fun a => a → False
    let t = s.forall(D, prop, prop);
    let b0 = b(s, 0);
    let body = s.forall(D, b0, TermStore::FALSE);
    let val = s.lam(D, prop, body);
    self.add_def(Name::NOT, &[], t, val)?;

    // And, Or
    let pp = s.forall(D, prop, prop);
    let ppp = s.forall(D, prop, pp);
    let (b0, b1, b2, b3) = (b(s, 0), b(s, 1), b(s, 2), b(s, 3));
    let and32 = s.mk_const_app(Name::AND, &[b3, b2]);
    let t = s.forall(D, b1, and32);
    let t = s.forall(D, b1, t);
    let t = s.forall(I, prop, t);
    let and_intro = s.forall(I, prop, t);
    self.add_inductive(Name::AND, &[], ppp, 2, 0,
      &[CtorDecl { name: Name::AND_INTRO, ty: and_intro, num_fields: 2 }])?;
    let or21 = s.mk_const_app(Name::OR, &[b2, b1]);
    let mk_or_ctor = |s: &mut TermStore, dom| {
      let t = s.forall(D, dom, or21);
      let t = s.forall(I, prop, t);
      s.forall(I, prop, t)
    };
    let (inl, inr) = (mk_or_ctor(s, b1), mk_or_ctor(s, b0));
    self.add_inductive(Name::OR, &[], ppp, 2, 0, &[
      CtorDecl { name: Name::OR_INL, ty: inl, num_fields: 1 },
      CtorDecl { name: Name::OR_INR, ty: inr, num_fields: 1 },
    ])?;

    // Eq.{u} : ∀ {α : Sort u}, α → α → Prop
    let t = s.forall(D, b1, prop);
    let t = s.forall(D, b0, t);
    let eq_ty = s.forall(I, sort_u, t);
    let body = eq_u(s, &[b1, b0, b0]);
    let t = s.forall(D, b0, body);
    let refl = s.forall(I, sort_u, t);
    self.add_inductive(Name::EQ, &[u_name], eq_ty, 2, 1,
      &[CtorDecl { name: Name::EQ_REFL, ty: refl, num_fields: 0 }])?;

    // HEq.{u} : ∀ {α : Sort u}, α → ∀ {β : Sort u}, β → Prop
    let t = s.forall(D, b0, prop);
    let t = s.forall(I, sort_u, t);
    let t = s.forall(D, b0, t);
    let heq_ty = s.forall(I, sort_u, t);
    self.add_axiom(Name::HEQ, &[u_name], heq_ty)?;

    // Decidable : Prop → Type
    let t = s.forall(D, prop, ty);
    self.add_axiom(Name::DECIDABLE, &[], t)?;

    // ite.{u} : ∀ {α : Sort u} (c : Prop) [h : Decidable c], α → α → α
    let dec0 = s.mk_const_app(Name::DECIDABLE, &[b0]);
    let b4 = b(s, 4);
    let t = s.forall(D, b3, b4);
    let t = s.forall(D, b2, t);
    let t = s.forall(Inst, dec0, t);
    let t = s.forall(D, prop, t);
    let ite = s.forall(I, sort_u, t);
    self.add_axiom(Name::ITE, &[u_name], ite)?;

    // dite.{u} : ∀ {α : Sort u} (c : Prop) [h : Decidable c], (c → α) → (¬c → α) → α
    let then_ty = s.forall(D, b1, b3);
    let not2 = s.not(b2);
    let else_ty = s.forall(D, not2, b4);
    let t = s.forall(D, else_ty, b4);
    let t = s.forall(D, then_ty, t);
    let t = s.forall(Inst, dec0, t);
    let t = s.forall(D, prop, t);
    let dite = s.forall(I, sort_u, t);
    self.add_axiom(Name::DITE, &[u_name], dite)?;

    // cast.{u} : ∀ {α β : Sort u}, α = β → α → β
    // Eq.mpr.{u} : ∀ {α β : Sort u}, α = β → β → α
    let eq1 = s.konst(Name::EQ, &[u.clone().succ()]);
    let eq_ab = s.mk_app(eq1, &[sort_u, b1, b0]);
    let mk_cast = |s: &mut TermStore, dom, cod| {
      let t = s.forall(D, dom, cod);
      let t = s.forall(D, eq_ab, t);
      let t = s.forall(I, sort_u, t);
      s.forall(I, sort_u, t)
    };
    let cast = mk_cast(s, b2, b2);
    let mpr = mk_cast(s, b1, b3);
    self.add_axiom(Name::CAST, &[u_name], cast)?;
    self.add_axiom(Name::EQ_MPR, &[u_name], mpr)?;

    // letFun.{u, v} : ∀ {α : Sort u} {β : α → Sort v} (v : α), (∀ x : α, β x) → β v
    let sort_v = s.sort(v);
    let beta_ty = s.forall(D, b0, sort_v);
    let bx = s.app(b2, b0);
    let f_ty = s.forall(D, b2, bx);
    let bv = s.app(b2, b1);
    let t = s.forall(D, f_ty, bv);
    let t = s.forall(D, b1, t);
    let t = s.forall(I, beta_ty, t);
    let let_fun = s.forall(I, sort_u, t);
    self.add_axiom(Name::LET_FUN, &[u_name, v_name], let_fun)?;

    // Nat, Bool, String
    let nat = s.konst(Name::NAT, &[]);
    let succ = s.forall(D, nat, nat);
    self.add_inductive(Name::NAT, &[], ty, 0, 0, &[
      CtorDecl { name: Name::NAT_ZERO, ty: nat, num_fields: 0 },
      CtorDecl { name: Name::NAT_SUCC, ty: succ, num_fields: 1 },
    ])?;
    let bool_ = s.konst(Name::BOOL, &[]);
    self.add_inductive(Name::BOOL, &[], ty, 0, 0, &[
      CtorDecl { name: Name::BOOL_FALSE, ty: bool_, num_fields: 0 },
      CtorDecl { name: Name::BOOL_TRUE, ty: bool_, num_fields: 0 },
    ])?;
    self.add_axiom(Name::STRING, &[], ty)?;

    // Exists.{u} : ∀ {α : Sort u}, (α → Prop) → Prop
    let pred = s.forall(D, b0, prop);
    let t = s.forall(D, pred, prop);
    let ex_ty = s.forall(I, sort_u, t);
    let ex = s.konst(Name::EXISTS, &[u.clone()]);
    let ex32 = s.mk_app(ex, &[b3, b2]);
    let pw = s.app(b1, b0);
    let t = s.forall(D, pw, ex32);
    let t = s.forall(D, b1, t);
    let t = s.forall(I, pred, t);
    let ex_intro = s.forall(I, sort_u, t);
    self.add_inductive(Name::EXISTS, &[u_name], ex_ty, 2, 0,
      &[CtorDecl { name: Name::EXISTS_INTRO, ty: ex_intro, num_fields: 2 }])?;
    self.add_cases_attr(Name::EXISTS)?;

    // grind.MatchCond : Prop → Prop := fun p => p
    let t = s.forall(D, prop, prop);
    let val = s.lam(D, prop, b0);
    self.add_def(Name::MATCH_COND, &[], t, val)?;

    // Lemmas whose applications may end up inside internalized terms, as evidence for
    // `dite` branches. They need types so that proof arguments can be recognized.
    let eq_prop = s.konst(Name::EQ, &[Level::one()]);
    let mk_of_eq = |s: &mut TermStore, rhs, concl| {
      let p_eq = s.mk_app(eq_prop, &[prop, b0, rhs]);
      let t = s.forall(D, p_eq, concl);
      s.forall(I, prop, t)
    };
    let not1 = s.not(b1);
    let of_eq_true = mk_of_eq(s, TermStore::TRUE, b1);
    let of_eq_false = mk_of_eq(s, TermStore::FALSE, not1);
    self.add_axiom(Name::OF_EQ_TRUE, &[], of_eq_true)?;
    self.add_axiom(Name::OF_EQ_FALSE, &[], of_eq_false)?;
    Ok(())
  }
}
