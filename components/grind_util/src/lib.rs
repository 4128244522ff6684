//! Utilities for the grind core: strongly typed index vectors and a few
//! collection extensions.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub, unused)]
#![warn(clippy::all, clippy::pedantic, clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::{
  hash_map::{Entry, OccupiedEntry},
  HashMap,
};
use std::error::Error;
use std::hash::{BuildHasher, Hash};

mod ids;

pub use ids::*;

/// The payload of errors coming from pluggable procedures such as the simplifier.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Insertion into a [`HashMap`] that refuses to overwrite.
pub trait HashMapExt<K, V> {
  /// Insert `v` at a fresh key. At an occupied key, hand `v` back together with the
  /// existing entry instead.
  fn try_insert_ext(&mut self, k: K, v: V) -> Option<(V, OccupiedEntry<'_, K, V>)>;
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMapExt<K, V> for HashMap<K, V, S> {
  fn try_insert_ext(&mut self, k: K, v: V) -> Option<(V, OccupiedEntry<'_, K, V>)> {
    match self.entry(k) {
      Entry::Vacant(e) => {
        e.insert(v);
        None
      }
      Entry::Occupied(e) => Some((v, e)),
    }
  }
}

/// Widen a `u32` count (parameter numbers, field indices) to a `usize`.
#[inline]
#[must_use]
pub fn u32_as_usize(n: u32) -> usize {
  n.try_into().expect("usize is at least 32 bits")
}

/// The `n`-th name in the sequence `a, b, ..., z, aa, ab, ...`, used to name binders
/// when printing.
#[must_use]
pub fn alphanumber(mut n: usize) -> String {
  let mut out = vec![];
  loop {
    #[allow(clippy::cast_possible_truncation)]
    out.push(b'a' + (n % 26) as u8);
    if n < 26 { break }
    n = n / 26 - 1;
  }
  out.reverse();
  String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn binder_names() {
    assert_eq!(alphanumber(0), "a");
    assert_eq!(alphanumber(25), "z");
    assert_eq!(alphanumber(26), "aa");
    assert_eq!(alphanumber(27), "ab");
    assert_eq!(alphanumber(26 * 27), "aaa");
  }

  #[test]
  fn redeclaring_keeps_the_first_declaration() {
    let mut decls = HashMap::new();
    assert!(decls.try_insert_ext("Nat.zero", 0).is_none());
    let (rejected, e) = decls.try_insert_ext("Nat.zero", 1).expect("occupied");
    assert_eq!((rejected, *e.get()), (1, 0));
    assert_eq!(decls.len(), 1);
  }

  #[test]
  fn arena_ids_are_sequential() {
    let mut v = TermVec::default();
    assert_eq!(v.push_id("x"), TermId(0));
    assert_eq!(v.push_id("y"), TermId(1));
    assert_eq!((v[TermId(1)], v.get(TermId(2))), ("y", None));
  }
}
