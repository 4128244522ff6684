//! The fatal error type of the grind core.
//!
//! Contradictions are not errors: they close goals. Soft problems are reported through
//! [`Grind::report_issue`](crate::grind::Grind::report_issue). What remains here are
//! violated preconditions of the caller, which abort the whole invocation.

use grind_util::BoxError;
use crate::name::Name;
use crate::term::{MVarId, TermId};

/// Errors that abort a grind invocation.
#[derive(Debug, thiserror::Error)]
pub enum GrindError {
  /// A metavariable reached the internalizer (the input must be instantiated first).
  #[error("unexpected metavariable ?{0:?} during internalization")]
  UnexpectedMVar(MVarId),
  /// An annotation reached the internalizer (preprocessing strips them).
  #[error("unexpected metadata term {0:?} during internalization")]
  UnexpectedMData(TermId),
  /// A kernel projection reached the internalizer (preprocessing folds them).
  #[error("unexpected kernel projection term {0:?} during internalization")]
  UnexpectedProj(TermId),
  /// A loose bound variable reached the internalizer.
  #[error("unexpected bound variable #{0} during internalization")]
  UnexpectedBVar(u32),
  /// The recursion depth limit was exceeded.
  #[error("maximum recursion depth has been reached (max_rec_depth = {0})")]
  MaxRecDepth(u32),
  /// A declaration was added twice to the environment.
  #[error("declaration {0} has already been declared")]
  AlreadyDeclared(Name),
  /// A constant was used but never declared.
  #[error("unknown constant {0}")]
  UnknownConstant(Name),
  /// Type inference failed.
  #[error("type error: {0}")]
  Type(String),
  /// The simplifier failed.
  #[error("simp failed: {0}")]
  Simp(BoxError),
}

/// Result type for fallible grind operations.
pub type Result<T> = std::result::Result<T, GrindError>;
