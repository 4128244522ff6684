use clap::Parser;
use itertools::Itertools;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use grind::{intern, Config, Environment, Grind, GrindResult, Name, Result, TermId, TermStore};
use grind::term::{FVarId, Level};

/// Run the grind core on a few sample problems.
#[derive(Parser, Debug)]
#[command(name = "grind-demo", version)]
struct Args {
  /// Maximum recursion depth of the internalizer
  #[arg(long, default_value_t = Config::default().max_rec_depth)]
  max_rec_depth: u32,
  /// Maximum number of case splits along a branch
  #[arg(long, default_value_t = Config::default().splits)]
  splits: u32,
  /// Enable debug logging (repeat for trace logging)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn local(g: &mut Grind, n: &str, ty: TermId) -> (FVarId, TermId) {
  let x = g.mctx.mk_fvar(intern(n), ty, None);
  (x, g.terms.fvar(x))
}

fn eq(g: &mut Grind, ty: TermId, a: TermId, b: TermId) -> TermId {
  let f = g.terms.konst(Name::EQ, &[Level::one()]);
  g.terms.mk_app(f, &[ty, a, b])
}

fn imps(g: &mut Grind, hyps: &[TermId], concl: TermId) -> TermId {
  hyps.iter().rev().fold(concl, |c, &h| g.terms.arrow(h, c))
}

/// `∀ p q, p ∧ q → q ∧ p`
fn and_comm(g: &mut Grind) -> Result<TermId> {
  let (p, ep) = local(g, "p", TermStore::PROP);
  let (q, e_q) = local(g, "q", TermStore::PROP);
  let pq = g.terms.mk_const_app(Name::AND, &[ep, e_q]);
  let qp = g.terms.mk_const_app(Name::AND, &[e_q, ep]);
  let body = g.terms.arrow(pq, qp);
  Ok(g.mctx.mk_binding(&mut g.terms, false, &[p, q], body))
}

/// `∀ f x y, f x = f y → f (f x) = f (f y)`
fn congruence(g: &mut Grind) -> Result<TermId> {
  let nat = g.terms.konst(Name::NAT, &[]);
  let nat_nat = g.terms.arrow(nat, nat);
  let (f, ef) = local(g, "f", nat_nat);
  let (x, ex) = local(g, "x", nat);
  let (y, ey) = local(g, "y", nat);
  let (fx, fy) = (g.terms.app(ef, ex), g.terms.app(ef, ey));
  let (ffx, ffy) = (g.terms.app(ef, fx), g.terms.app(ef, fy));
  let h = eq(g, nat, fx, fy);
  let c = eq(g, nat, ffx, ffy);
  let body = g.terms.arrow(h, c);
  Ok(g.mctx.mk_binding(&mut g.terms, false, &[f, x, y], body))
}

/// `∀ c [Decidable c] a b, (if c then a else b) = b → a ≠ b → ¬c`
fn ite_cond(g: &mut Grind) -> Result<TermId> {
  let nat = g.terms.konst(Name::NAT, &[]);
  let (c, ec) = local(g, "c", TermStore::PROP);
  let dec = g.terms.mk_const_app(Name::DECIDABLE, &[ec]);
  let (inst, einst) = local(g, "inst", dec);
  let (a, ea) = local(g, "a", nat);
  let (b, eb) = local(g, "b", nat);
  let ite = g.terms.konst(Name::ITE, &[Level::one()]);
  let ite = g.terms.mk_app(ite, &[nat, ec, einst, ea, eb]);
  let h1 = eq(g, nat, ite, eb);
  let ab = eq(g, nat, ea, eb);
  let h2 = g.terms.not(ab);
  let nc = g.terms.not(ec);
  let body = imps(g, &[h1, h2], nc);
  Ok(g.mctx.mk_binding(&mut g.terms, false, &[c, inst, a, b], body))
}

/// `∀ p q r, p ∨ q → (p → r) → (q → r) → r`
fn or_elim(g: &mut Grind) -> Result<TermId> {
  let (p, ep) = local(g, "p", TermStore::PROP);
  let (q, e_q) = local(g, "q", TermStore::PROP);
  let (r, er) = local(g, "r", TermStore::PROP);
  let or = g.terms.mk_const_app(Name::OR, &[ep, e_q]);
  let (pr, qr) = (g.terms.arrow(ep, er), g.terms.arrow(e_q, er));
  let body = imps(g, &[or, pr, qr], er);
  Ok(g.mctx.mk_binding(&mut g.terms, false, &[p, q, r], body))
}

/// `∀ p q, p → q`, which is not provable.
fn unprovable(g: &mut Grind) -> Result<TermId> {
  let (p, ep) = local(g, "p", TermStore::PROP);
  let (q, e_q) = local(g, "q", TermStore::PROP);
  let body = g.terms.arrow(ep, e_q);
  Ok(g.mctx.mk_binding(&mut g.terms, false, &[p, q], body))
}

type Problem = (&'static str, fn(&mut Grind) -> Result<TermId>);

const PROBLEMS: [Problem; 5] = [
  ("and_comm", and_comm),
  ("congruence", congruence),
  ("ite_cond", ite_cond),
  ("or_elim", or_elim),
  ("unprovable", unprovable),
];

fn run(config: Config, build: fn(&mut Grind) -> Result<TermId>) -> Result<String> {
  let mut terms = TermStore::new();
  let env = Environment::with_prelude(&mut terms)?;
  let mut g = Grind::new(terms, env, config);
  let target = build(&mut g)?;
  let m = g.mctx.mk_mvar(im::Vector::new(), target);
  println!("  ⊢ {}", g.pp(target));
  let GrindResult { proof, failed } = g.main(m)?;
  let mut out = match proof {
    Some(p) => format!("proved by\n    {}", g.pp(p)),
    None => format!("failed with {} open goal(s)", failed.len()),
  };
  if !g.issues.is_empty() { out = format!("{out}\n  issues: {}", g.issues.iter().format("; ")) }
  let st = g.stats;
  Ok(format!("{out}\n  ({} nodes, {} merges, {} congruences, {} splits)",
    st.enodes, st.merges, st.congrs, st.splits))
}

fn main() {
  let args = Args::parse();
  let level = match args.verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  let _ = TermLogger::init(level, simplelog::Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
  let config = Config { max_rec_depth: args.max_rec_depth, splits: args.splits, ..<_>::default() };
  for (name, build) in PROBLEMS {
    println!("{name}:");
    match run(config, build) {
      Ok(msg) => println!("  {msg}"),
      Err(e) => println!("  error: {e}"),
    }
  }
}
