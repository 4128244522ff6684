//! Proof reconstruction from the proof forest.
//!
//! Every merge records an edge `term → target` labeled with the proof that was pushed.
//! An equality between two members of a class is explained by the path through their
//! lowest common ancestor. Edges found by the congruence table carry a placeholder proof,
//! which is expanded here into `congr`/`congrArg`/`congrFun` steps (recursively explaining
//! the arguments).
//!
//! The proofs are sketches: lemma constants are applied to their explicit arguments only.

use bit_set::BitSet;
use crate::error::Result;
use crate::name::Name;
use crate::term::{BinderInfo, TermId, TermStore};
use super::GoalM;

/// One step of an explanation, oriented from left to right.
#[derive(Clone, Copy, Debug)]
struct Step {
  proof: TermId,
  heq: bool,
}

impl GoalM<'_> {
  /// `n a1 ... an`.
  pub(super) fn lemma(&mut self, n: Name, args: &[TermId]) -> TermId { self.terms().mk_const_app(n, args) }

  fn symm(&mut self, s: Step) -> Step {
    Step { proof: self.lemma(if s.heq { Name::HEQ_SYMM } else { Name::EQ_SYMM }, &[s.proof]), heq: s.heq }
  }

  fn to_heq(&mut self, s: Step) -> TermId {
    if s.heq { s.proof } else { self.lemma(Name::HEQ_OF_EQ, &[s.proof]) }
  }

  /// The edge from `x` to its target in the proof forest, as a proof of `x = target`.
  fn edge_step(&mut self, x: TermId) -> Result<(TermId, Step)> {
    let n = self.enode(x);
    let (Some(target), Some(proof)) = (n.target, n.proof) else { unreachable!("edge_step: {x:?} has no edge") };
    let (flipped, heq) = (n.flipped, n.heq);
    let (l, r) = if flipped { (target, x) } else { (x, target) };
    let proof = if self.ctx.terms.const_name(proof) == Some(Name::CONGR_PLACEHOLDER) {
      self.mk_congr_proof(l, r, heq)?
    } else { proof };
    let s = Step { proof, heq };
    Ok((target, if flipped { self.symm(s) } else { s }))
  }

  /// Prove `a = b` (or `HEq a b` if `heq`), where `a` and `b` are in the same class.
  fn mk_proof(&mut self, a: TermId, b: TermId, heq: bool) -> Result<TermId> {
    if a == b {
      return Ok(if heq { self.lemma(Name::HEQ_REFL, &[a]) } else { self.lemma(Name::EQ_REFL, &[a]) })
    }
    debug_assert!(self.goal.is_eqv(a, b), "mk_proof: terms are not equal");
    let mut on_a_path = BitSet::new();
    let mut it = Some(a);
    while let Some(x) = it { on_a_path.insert(x.index()); it = self.enode(x).target }
    let mut lca = b;
    while !on_a_path.contains(lca.index()) {
      let Some(t) = self.enode(lca).target else { unreachable!("mk_proof: no common ancestor") };
      lca = t;
    }
    let mut steps = vec![];
    let mut x = a;
    while x != lca {
      let (t, s) = self.edge_step(x)?;
      steps.push(s);
      x = t;
    }
    let mut back = vec![];
    let mut y = b;
    while y != lca {
      let (t, s) = self.edge_step(y)?;
      back.push(s);
      y = t;
    }
    for s in back.into_iter().rev() { let s = self.symm(s); steps.push(s) }

    if heq || steps.iter().any(|s| s.heq) {
      let mut h = self.to_heq(steps[0]);
      for &s in &steps[1..] {
        let h2 = self.to_heq(s);
        h = self.lemma(Name::HEQ_TRANS, &[h, h2]);
      }
      Ok(if heq { h } else { self.lemma(Name::EQ_OF_HEQ, &[h]) })
    } else {
      let mut h = steps[0].proof;
      for s in &steps[1..] { h = self.lemma(Name::EQ_TRANS, &[h, s.proof]) }
      Ok(h)
    }
  }

  /// Prove `a = b` for two terms in the same class.
  pub fn mk_eq_proof(&mut self, a: TermId, b: TermId) -> Result<TermId> { self.mk_proof(a, b, false) }

  /// Prove `HEq a b` for two terms in the same class.
  pub fn mk_heq_proof(&mut self, a: TermId, b: TermId) -> Result<TermId> { self.mk_proof(a, b, true) }

  /// Prove `a = True`.
  pub fn mk_eq_true_proof(&mut self, a: TermId) -> Result<TermId> { self.mk_eq_proof(a, TermStore::TRUE) }

  /// Prove `a = False`.
  pub fn mk_eq_false_proof(&mut self, a: TermId) -> Result<TermId> { self.mk_eq_proof(a, TermStore::FALSE) }

  /// Prove `a` from `a = True`.
  pub fn mk_of_eq_true(&mut self, a: TermId) -> Result<TermId> {
    let h = self.mk_eq_true_proof(a)?;
    Ok(self.lemma(Name::OF_EQ_TRUE, &[a, h]))
  }

  /// Prove `¬a` from `a = False`.
  pub fn mk_of_eq_false(&mut self, a: TermId) -> Result<TermId> {
    let h = self.mk_eq_false_proof(a)?;
    Ok(self.lemma(Name::OF_EQ_FALSE, &[a, h]))
  }

  /// Proof that two arguments in an irrelevant position are equal.
  fn mk_irrelevant_proof(&mut self, bi: Option<BinderInfo>, x: TermId, y: TermId) -> TermId {
    let n = if bi == Some(BinderInfo::InstImplicit) { Name::SUBSINGLETON_ELIM } else { Name::PROOF_IRREL };
    self.lemma(n, &[x, y])
  }

  /// Explain why the congruent applications `l` and `r` are equal.
  fn mk_congr_proof(&mut self, l: TermId, r: TermId, heq: bool) -> Result<TermId> {
    let eqs = (self.ctx.terms.match_eq(l), self.ctx.terms.match_eq(r));
    if let (Some((_, a1, a2)), Some((_, b1, b2))) = eqs {
      if !(self.goal.is_eqv(a1, b1) && self.goal.is_eqv(a2, b2)) {
        let h1 = self.mk_eq_proof(a1, b2)?;
        let h2 = self.mk_eq_proof(a2, b1)?;
        return Ok(self.lemma(Name::EQ_CONGR_SYMM, &[h1, h2]))
      }
    }
    let ((f, xs), (g, ys)) = (self.ctx.terms.app_fn_args(l), self.ctx.terms.app_fn_args(r));
    let mask = self.relevant_args(f, xs.len())?;
    let bis = self.ctx.tc().binder_infos(f, xs.len())?;
    let mut arg_proofs = Vec::with_capacity(xs.len());
    for (i, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
      arg_proofs.push(if x == y { None }
        else if !mask[i] || self.is_proof(x)? {
          Some(Step { proof: self.mk_irrelevant_proof(bis.get(i).copied(), x, y), heq: false })
        } else {
          let heq = self.infer(x)? != self.infer(y)?;
          Some(Step { proof: self.mk_proof(x, y, heq)?, heq })
        })
    }
    if heq {
      let hf = self.mk_heq_proof(f, g)?;
      let mut args = vec![hf];
      for (s, &x) in arg_proofs.into_iter().zip(&xs) {
        args.push(match s {
          None => self.lemma(Name::HEQ_REFL, &[x]),
          Some(s) => self.to_heq(s),
        })
      }
      return Ok(self.lemma(Name::HCONGR, &args))
    }
    let mut h = if f == g { None } else { Some(self.mk_eq_proof(f, g)?) };
    let mut lhs = f;
    for (s, &x) in arg_proofs.into_iter().zip(&xs) {
      h = match (h, s) {
        (None, None) => None,
        (Some(hf), None) => Some(self.lemma(Name::CONGR_FUN, &[hf, x])),
        (None, Some(s)) => Some(self.lemma(Name::CONGR_ARG, &[lhs, s.proof])),
        (Some(hf), Some(s)) => Some(self.lemma(Name::CONGR, &[hf, s.proof])),
      };
      lhs = self.terms().app(lhs, x);
    }
    Ok(match h { Some(h) => h, None => self.lemma(Name::EQ_REFL, &[l]) })
  }
}
