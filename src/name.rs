//! Interned constant names.
//!
//! A [`Name`] is a dot-separated identifier like `Eq.trans`, stored in a global interner.
//! Names used directly by the engine (logical connectives and the lemma vocabulary used to
//! build proof terms) are pinned to fixed indices so they can be matched as constants.

use std::{collections::HashMap, fmt::Display, sync::{LazyLock, Mutex, MutexGuard}};

/// An interned, dot-separated constant name.
///
/// Names are interned forever: the interner leaks any string it is given,
/// so a `Name` is just a `u32` and is `Copy`.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(u32);

macro_rules! make_names {
  {consts $n:expr;} => {};
  {consts $n:expr; $x:ident $doc0:expr, $($xs:tt)*} => {
    #[doc=$doc0]
    pub const $x: Name = Name($n);
    make_names! {consts Name::$x.0+1; $($xs)*}
  };
  {$($x:ident: $e:expr,)*} => {
    impl Name {
      make_names! {consts 0; $($x concat!("The name `", $e, "`.\n"),)*}

      /// Map a function over the list of pinned names (in increasing order).
      fn on_names(mut f: impl FnMut(&'static str, Name)) { $(f($e, Name::$x);)* }
    }
  }
}

make_names! {
  ANON: "_",
  PROP_TRUE: "True",
  TRUE_INTRO: "True.intro",
  PROP_FALSE: "False",
  FALSE_ELIM: "False.elim",
  NOT: "Not",
  AND: "And",
  AND_INTRO: "And.intro",
  OR: "Or",
  OR_INL: "Or.inl",
  OR_INR: "Or.inr",
  EQ: "Eq",
  EQ_REFL: "Eq.refl",
  EQ_SYMM: "Eq.symm",
  EQ_TRANS: "Eq.trans",
  EQ_MP: "Eq.mp",
  EQ_MPR: "Eq.mpr",
  EQ_REC: "Eq.rec",
  EQ_NDREC: "Eq.ndrec",
  EQ_REC_ON: "Eq.recOn",
  HEQ: "HEq",
  HEQ_REFL: "HEq.refl",
  HEQ_SYMM: "HEq.symm",
  HEQ_TRANS: "HEq.trans",
  HEQ_OF_EQ: "heq_of_eq",
  EQ_OF_HEQ: "eq_of_heq",
  CONGR: "congr",
  CONGR_ARG: "congrArg",
  CONGR_FUN: "congrFun",
  CAST: "cast",
  ITE: "ite",
  DITE: "dite",
  DECIDABLE: "Decidable",
  LET_FUN: "letFun",
  EXISTS: "Exists",
  EXISTS_INTRO: "Exists.intro",
  NAT: "Nat",
  NAT_ZERO: "Nat.zero",
  NAT_SUCC: "Nat.succ",
  BOOL: "Bool",
  BOOL_TRUE: "Bool.true",
  BOOL_FALSE: "Bool.false",
  STRING: "String",
  MATCH_COND: "grind.MatchCond",
  CONGR_PLACEHOLDER: "grind.congrPlaceholder",
  HCONGR: "grind.hcongr",
  EQ_CONGR_SYMM: "grind.eq_congr_symm",
  PROOF_IRREL: "grind.proof_irrel",
  SUBSINGLETON_ELIM: "Subsingleton.elim",
  EQ_TRUE: "grind.eq_true",
  EQ_FALSE: "grind.eq_false",
  OF_EQ_TRUE: "grind.of_eq_true",
  OF_EQ_FALSE: "grind.of_eq_false",
  TRUE_NE_FALSE: "grind.false_of_true_eq_false",
  AND_EQ_OF_TRUE_LEFT: "grind.and_eq_of_eq_true_left",
  AND_EQ_OF_TRUE_RIGHT: "grind.and_eq_of_eq_true_right",
  AND_EQ_OF_FALSE_LEFT: "grind.and_eq_of_eq_false_left",
  AND_EQ_OF_FALSE_RIGHT: "grind.and_eq_of_eq_false_right",
  AND_LEFT_OF_TRUE: "grind.eq_true_of_and_eq_true_left",
  AND_RIGHT_OF_TRUE: "grind.eq_true_of_and_eq_true_right",
  OR_EQ_OF_FALSE_LEFT: "grind.or_eq_of_eq_false_left",
  OR_EQ_OF_FALSE_RIGHT: "grind.or_eq_of_eq_false_right",
  OR_EQ_OF_TRUE_LEFT: "grind.or_eq_of_eq_true_left",
  OR_EQ_OF_TRUE_RIGHT: "grind.or_eq_of_eq_true_right",
  OR_LEFT_OF_FALSE: "grind.eq_false_of_or_eq_false_left",
  OR_RIGHT_OF_FALSE: "grind.eq_false_of_or_eq_false_right",
  NOT_EQ_OF_FALSE: "grind.not_eq_of_eq_false",
  NOT_EQ_OF_TRUE: "grind.not_eq_of_eq_true",
  EQ_TRUE_OF_NOT_FALSE: "grind.eq_true_of_not_eq_false",
  EQ_FALSE_OF_NOT_TRUE: "grind.eq_false_of_not_eq_true",
  FALSE_OF_NOT_EQ_SELF: "grind.false_of_not_eq_self",
  EQ_EQ_OF_TRUE_LEFT: "grind.eq_eq_of_eq_true_left",
  EQ_EQ_OF_TRUE_RIGHT: "grind.eq_eq_of_eq_true_right",
  EQ_FALSE_OF_DISTINCT: "grind.eq_false_of_distinct",
  HEQ_EQ_TRUE: "grind.heq_eq_true",
  TYPE_EQ_OF_HEQ: "grind.type_eq_of_heq",
  CTOR_NE: "grind.ctor_noConfusion",
  CTOR_INJ: "grind.ctor_inj",
  LIT_NE: "grind.lit_ne",
  ITE_COND_TRUE: "grind.ite_cond_eq_true",
  ITE_COND_FALSE: "grind.ite_cond_eq_false",
  DITE_COND_TRUE: "grind.dite_cond_eq_true",
  DITE_COND_FALSE: "grind.dite_cond_eq_false",
  IMP_EQ_OF_TRUE_LEFT: "grind.imp_eq_of_eq_true_left",
  IMP_TRUE_OF_FALSE_LEFT: "grind.imp_eq_true_of_eq_false_left",
  IMP_TRUE_OF_TRUE_RIGHT: "grind.imp_eq_true_of_eq_true_right",
  MODUS_PONENS: "grind.eq_true_of_imp_eq_true",
  CAST_HEQ: "grind.cast_heq",
  BETA: "grind.beta",
  UNIT_ETA: "grind.unit_eta",
  MATCH_COND_TRUE: "grind.match_cond_true_of_ne",
  BY_CASES: "grind.by_cases",
  BY_CONTRA: "grind.by_contra",
  NOT_INTRO: "grind.not_intro",
  EXT_MT: "grind.ext_mt",
}

struct Interner {
  names: HashMap<&'static str, Name>,
  strings: Vec<&'static str>,
}

static INTERNER: LazyLock<Mutex<Interner>> = LazyLock::new(|| {
  let mut i = Interner { names: HashMap::new(), strings: Vec::new() };
  Name::on_names(|s, n| assert_eq!(n, i.intern(s)));
  Mutex::new(i)
});

fn lock() -> MutexGuard<'static, Interner> { INTERNER.lock().expect("propagating poisoned mutex") }

impl Interner {
  fn intern(&mut self, s: &str) -> Name {
    if let Some(&name) = self.names.get(s) { return name }
    // Names are constants and lemma names of the environment, so leaking them is fine.
    let s = Box::leak(s.to_owned().into_boxed_str());
    let n = Name(u32::try_from(self.strings.len()).expect("too many names"));
    self.strings.push(s);
    self.names.insert(s, n);
    n
  }
}

/// Intern a single string, returning a `Name` that represents that string.
#[must_use] pub fn intern(s: &str) -> Name { lock().intern(s) }

impl Name {
  /// Get the string corresponding to this name.
  #[must_use] pub fn as_str(self) -> &'static str { lock().strings[self.0 as usize] }

  /// The name `self.s`, for example `Nat.casesOn` from `Nat` and `casesOn`.
  #[must_use] pub fn str(self, s: &str) -> Name { intern(&format!("{}.{s}", self.as_str())) }

  /// The name with the last component removed, or `None` for an atomic name.
  #[must_use] pub fn prefix(self) -> Option<Name> {
    let s = self.as_str();
    s.rfind('.').map(|i| intern(&s[..i]))
  }
}

impl From<&str> for Name {
  fn from(s: &str) -> Self { intern(s) }
}

impl Display for Name {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.as_str().fmt(f) }
}
impl std::fmt::Debug for Name {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "`{self}") }
}
