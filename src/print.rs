//! Pretty printer for terms, used in traces, issues and the demo driver.

use std::fmt;
use pretty::{Arena, DocAllocator, DocBuilder};
use grind_util::alphanumber;
use crate::infer::MetaCtx;
use crate::name::Name;
use crate::term::{Level, Literal, TermId, TermKind, TermStore};

type Doc<'a> = DocBuilder<'a, Arena<'a, ()>, ()>;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Prec { Bot, Arrow, Or, And, Not, Eq, App, Max }

/// A term paired with the context needed to print it. Implements [`Display`](fmt::Display).
#[derive(Copy, Clone, Debug)]
pub struct PPTerm<'a> {
  terms: &'a TermStore,
  mctx: Option<&'a MetaCtx>,
  e: TermId,
  width: usize,
}

impl TermStore {
  /// Display a term. Free variables print as their user name when `mctx` is given.
  #[must_use] pub fn pp<'a>(&'a self, mctx: Option<&'a MetaCtx>, e: TermId) -> PPTerm<'a> {
    PPTerm { terms: self, mctx, e, width: 100 }
  }
}

struct Printer<'a> {
  terms: &'a TermStore,
  mctx: Option<&'a MetaCtx>,
  alloc: &'a Arena<'a, ()>,
  bound: Vec<String>,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut n = 0;
    let mut l = self;
    while let Level::Succ(l2) = l { n += 1; l = l2 }
    match l {
      Level::Zero => write!(f, "{n}"),
      Level::Param(p) if n == 0 => write!(f, "{p}"),
      Level::Param(p) => write!(f, "{p}+{n}"),
      Level::Max(a, b) => write!(f, "(max {a} {b}){}", if n == 0 { String::new() } else { format!("+{n}") }),
      Level::IMax(a, b) => write!(f, "(imax {a} {b}){}", if n == 0 { String::new() } else { format!("+{n}") }),
      Level::Succ(_) => unreachable!(),
    }
  }
}

impl<'a> Printer<'a> {
  fn text(&self, s: impl Into<std::borrow::Cow<'a, str>>) -> Doc<'a> { self.alloc.text(s) }

  fn paren(&self, (p, doc): (Prec, Doc<'a>), min: Prec) -> Doc<'a> {
    if p >= min { doc } else { self.text("(").append(doc).append(self.text(")")) }
  }

  fn binop(&mut self, op: &'static str, p: Prec, lhs: TermId, rhs: TermId, rassoc: bool) -> (Prec, Doc<'a>) {
    let (lp, rp) = if rassoc { (next(p), p) } else { (next(p), next(p)) };
    let l = self.pp(lhs);
    let l = self.paren(l, lp);
    let r = self.pp(rhs);
    let r = self.paren(r, rp);
    let doc = l.append(self.text(" ")).append(self.text(op))
      .append(self.alloc.line()).append(r).nest(2).group();
    (p, doc)
  }

  fn pp_sort(&self, l: &Level) -> Doc<'a> {
    match l {
      Level::Zero => self.text("Prop"),
      Level::Succ(l2) if l2.is_zero() => self.text("Type"),
      _ => self.text(format!("Sort {l}")),
    }
  }

  fn pp_binder(&mut self, kw: &'static str, dom: TermId, body: TermId) -> (Prec, Doc<'a>) {
    let d = self.pp(dom);
    let d = self.paren(d, Prec::Bot);
    let x = alphanumber(self.bound.len());
    let head = self.text(kw).append(self.text(format!(" {x} : "))).append(d).append(self.text(","));
    self.bound.push(x);
    let b = self.pp(body);
    self.bound.pop();
    let b = self.paren(b, Prec::Bot);
    (Prec::Bot, head.append(self.alloc.line()).append(b).nest(2).group())
  }

  fn pp(&mut self, e: TermId) -> (Prec, Doc<'a>) {
    let s = self.terms;
    if let Some((_, a, b)) = s.match_eq(e) { return self.binop("=", Prec::Eq, a, b, false) }
    if let Some((_, a, _, b)) = s.match_heq(e) { return self.binop("≍", Prec::Eq, a, b, false) }
    if let Some(a) = s.match_app(e, Name::AND, 2) { return self.binop("∧", Prec::And, a[0], a[1], true) }
    if let Some(a) = s.match_app(e, Name::OR, 2) { return self.binop("∨", Prec::Or, a[0], a[1], true) }
    if let Some(a) = s.match_not(e) {
      let d = self.pp(a);
      return (Prec::Not, self.text("¬").append(self.paren(d, Prec::Not)))
    }
    match *s.kind(e) {
      TermKind::BVar(i) => {
        let n = self.bound.len();
        (Prec::Max, match n.checked_sub(i as usize + 1) {
          Some(j) => self.text(self.bound[j].clone()),
          None => self.text(format!("#{i}")),
        })
      }
      TermKind::FVar(x) => (Prec::Max, match self.mctx.and_then(|m| m.fvars.get(x)) {
        Some(d) if d.name != Name::ANON => self.text(d.name.as_str()),
        _ => self.text(format!("_x.{}", x.into_inner())),
      }),
      TermKind::MVar(m) => (Prec::Max, self.text(format!("?m.{}", m.into_inner()))),
      TermKind::Sort(ref l) => (Prec::Max, self.pp_sort(l)),
      TermKind::Const(n, _) => (Prec::Max, self.text(n.as_str())),
      TermKind::App(..) => {
        let (f, args) = s.app_fn_args(e);
        let f = self.pp(f);
        let mut doc = self.paren(f, Prec::App);
        for a in args {
          let a = self.pp(a);
          doc = doc.append(self.alloc.line()).append(self.paren(a, Prec::Max));
        }
        (Prec::App, doc.nest(2).group())
      }
      TermKind::Lam(_, dom, body) => self.pp_binder("fun", dom, body),
      TermKind::Forall(_, dom, body) if !s.has_loose_bvar(body, 0) => {
        let d = self.pp(dom);
        let d = self.paren(d, Prec::Not);
        self.bound.push(String::new());
        let b = self.pp(body);
        self.bound.pop();
        let b = self.paren(b, Prec::Arrow);
        (Prec::Arrow, d.append(self.text(" →")).append(self.alloc.line()).append(b).nest(2).group())
      }
      TermKind::Forall(_, dom, body) => self.pp_binder("∀", dom, body),
      TermKind::Let(_, val, body) => {
        let v = self.pp(val);
        let v = self.paren(v, Prec::Bot);
        let x = alphanumber(self.bound.len());
        let head = self.text(format!("let {x} := ")).append(v).append(self.text(";"));
        self.bound.push(x);
        let b = self.pp(body);
        self.bound.pop();
        (Prec::Bot, head.append(self.alloc.line()).append(self.paren(b, Prec::Bot)).group())
      }
      TermKind::Lit(Literal::Nat(ref n)) => (Prec::Max, self.text(n.to_string())),
      TermKind::Lit(Literal::Str(ref st)) => (Prec::Max, self.text(format!("{st:?}"))),
      TermKind::MData(_, a) => self.pp(a),
      TermKind::Proj(_, i, a) => {
        let d = self.pp(a);
        (Prec::Max, self.paren(d, Prec::Max).append(self.text(format!(".{}", i + 1))))
      }
    }
  }
}

fn next(p: Prec) -> Prec {
  match p {
    Prec::Bot => Prec::Arrow,
    Prec::Arrow => Prec::Or,
    Prec::Or => Prec::And,
    Prec::And => Prec::Not,
    Prec::Not => Prec::Eq,
    Prec::Eq => Prec::App,
    Prec::App | Prec::Max => Prec::Max,
  }
}

impl fmt::Display for PPTerm<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let alloc = Arena::new();
    let mut p = Printer { terms: self.terms, mctx: self.mctx, alloc: &alloc, bound: vec![] };
    let (_, doc) = p.pp(self.e);
    doc.into_doc().render_fmt(self.width, f)
  }
}
