//! Tunable limits and switches for a grind invocation.

/// Configuration of a [`Grind`](crate::grind::Grind) context.
///
/// Construct with struct update syntax, for example
/// `Config { splits: 4, ..<_>::default() }`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
  /// Maximum nesting of the internalizer before giving up with a fatal error.
  pub max_rec_depth: u32,
  /// Maximum number of case splits along one branch of the search.
  pub splits: u32,
  /// Maximum term generation. Facts whose generation would exceed this are dropped.
  pub max_gen: u32,
  /// Turn a goal `⊢ p` into `¬p ⊢ False` when the target is not already `False`.
  pub by_contra: bool,
  /// Instantiate extensionality theorems on disequalities.
  pub ext: bool,
  /// Instantiate the equations of `match` auxiliary functions.
  pub match_eqns: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self { max_rec_depth: 512, splits: 8, max_gen: 8, by_contra: true, ext: true, match_eqns: true }
  }
}
