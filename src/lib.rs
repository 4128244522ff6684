//! The core of `grind`, a congruence-closure proof search procedure for dependent type
//! theory.
//!
//! A goal is turned into a proof of `False` from its hypotheses (by contradiction), and
//! the hypotheses are added to an E-graph. The E-graph maintains equivalence classes of
//! terms up to congruence, propagates the meaning of the logical connectives through
//! `True` and `False`, and detects contradictions. When no further progress can be made,
//! a case split is performed and each case is searched separately.
//!
//! The entry point is [`Grind::main`](grind::Grind::main):
//!
//! ```text
//! let mut s = TermStore::new();
//! let env = Environment::with_prelude(&mut s)?;
//! let mut g = Grind::new(s, env, Config::default());
//! let m = g.mctx.mk_mvar(lctx, target);
//! let GrindResult { proof, failed } = g.main(m)?;
//! ```

// rust lints we want
#![warn(bare_trait_objects, elided_lifetimes_in_paths,
  missing_copy_implementations, missing_debug_implementations, future_incompatible,
  rust_2018_idioms, trivial_numeric_casts, variant_size_differences, unreachable_pub,
  unused, missing_docs)]
// all the clippy
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
// all the clippy::restriction lints we want
#![warn(clippy::float_arithmetic,
  clippy::get_unwrap, clippy::integer_division,
  clippy::rc_buffer, clippy::rest_pat_in_fully_bound_structs,
  clippy::string_add, clippy::unwrap_used)]
// all the clippy lints we don't want
#![allow(clippy::cognitive_complexity, clippy::comparison_chain,
  clippy::default_trait_access, clippy::enum_glob_use, clippy::inline_always,
  clippy::manual_map, clippy::map_err_ignore, clippy::missing_const_for_fn,
  clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions,
  clippy::multiple_crate_versions, clippy::option_if_let_else, clippy::redundant_pub_crate,
  clippy::semicolon_if_nothing_returned, clippy::shadow_unrelated, clippy::too_many_lines,
  clippy::use_self)]

#[macro_use] extern crate if_chain;

pub mod name;
pub mod term;
pub mod print;
pub mod env;
pub mod infer;
pub mod error;
pub mod config;
pub mod grind;

pub use config::Config;
pub use env::Environment;
pub use error::{GrindError, Result};
pub use grind::{Grind, GrindResult, GoalM, Goal};
pub use name::{intern, Name};
pub use term::{TermId, TermKind, TermStore};
