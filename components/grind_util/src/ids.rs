//! Index newtypes for the arenas used by the grind core.

use std::fmt;
use std::ops::{Deref, Index};

macro_rules! id_wrapper {
  ($id:ident: $ty:ty, $vec:ident, $doc:expr) => {
    #[doc=$doc]
    #[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
    pub struct $id(pub $ty);

    impl $id {
      /// The raw id, for display.
      #[must_use] pub fn into_inner(self) -> $ty { self.0 }

      /// The position in the owning arena.
      #[must_use] pub fn index(self) -> usize { self.0 as usize }
    }

    impl fmt::Debug for $id {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
    }

    /// An arena addressed by the matching id type.
    #[derive(Clone, Debug)]
    pub struct $vec<T>(pub Vec<T>);

    #[allow(dead_code)]
    impl<T> $vec<T> {
      /// Look up an id that may come from a different arena.
      #[must_use]
      pub fn get(&self, i: $id) -> Option<&T> { self.0.get(i.0 as usize) }

      /// Append an element and return the id it was allocated.
      pub fn push_id(&mut self, t: T) -> $id {
        let id = $id(<$ty>::try_from(self.0.len()).expect("arena is full"));
        self.0.push(t);
        id
      }
    }

    impl<T> Default for $vec<T> {
      fn default() -> $vec<T> { $vec(Vec::new()) }
    }

    impl<T> Index<$id> for $vec<T> {
      type Output = T;
      fn index(&self, i: $id) -> &T { &self.0[i.0 as usize] }
    }

    impl<T> Deref for $vec<T> {
      type Target = Vec<T>;
      fn deref(&self) -> &Vec<T> { &self.0 }
    }
  };
}

id_wrapper!(TermId: u32, TermVec,
  "A hash-consed term. Equal ids mean structurally equal terms.");
id_wrapper!(FVarId: u32, FVarVec, "A free variable, declared in a local context.");
id_wrapper!(MVarId: u32, MVarVec, "A metavariable, standing for a goal or a hole in a proof.");
