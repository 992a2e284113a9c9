use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

use crate::Show;

mod annotated;
pub use annotated::{Action, AnnotatedSymbol};

/// A symbol is the atomic element of an alphabet. Symbols are compared by value and their
/// ordering determines the order in which successors are explored, which makes every search in
/// this crate deterministic.
pub trait Symbol: Clone + Eq + Ord + Hash + Debug + Show + Send + Sync {}

impl<T: Clone + Eq + Ord + Hash + Debug + Show + Send + Sync> Symbol for T {}

/// Represents a finite alphabet. The symbols are kept sorted and free of duplicates.
///
/// # Example
/// ```
/// use fifo_automata::prelude::*;
///
/// let alphabet = Alphabet::from_iter(['b', 'a', 'b']);
/// assert_eq!(alphabet.size(), 2);
/// assert_eq!(alphabet.universe().collect::<Vec<_>>(), vec![&'a', &'b']);
/// ```
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct Alphabet<S>(Vec<S>);

impl<S> Default for Alphabet<S> {
    fn default() -> Self {
        Self(vec![])
    }
}

impl<S: Symbol> Alphabet<S> {
    /// Creates an alphabet without any symbols.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns an iterator over all symbols in ascending order.
    pub fn universe(&self) -> std::slice::Iter<'_, S> {
        self.0.iter()
    }

    /// The number of symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether `symbol` is part of the alphabet.
    pub fn contains(&self, symbol: &S) -> bool {
        self.0.binary_search(symbol).is_ok()
    }

    /// Adds `symbol`, returns `true` if it was not present before.
    pub fn insert(&mut self, symbol: S) -> bool {
        match self.0.binary_search(&symbol) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, symbol);
                true
            }
        }
    }

    /// Returns the symbols of `self` that do not appear in `other`.
    pub fn missing_from<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'a S> + 'a {
        self.0.iter().filter(|sym| !other.contains(sym))
    }

    /// Returns true if every symbol of `self` is also a symbol of `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.missing_from(other).next().is_none()
    }
}

impl<S: Symbol> FromIterator<S> for Alphabet<S> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl<S: Symbol> From<Vec<S>> for Alphabet<S> {
    fn from(value: Vec<S>) -> Self {
        value.into_iter().collect()
    }
}

impl<S> std::ops::Index<usize> for Alphabet<S> {
    type Output = S;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<S: Show> Show for Alphabet<S> {
    fn show(&self) -> String {
        format!("{{{}}}", self.0.iter().map(|sym| sym.show()).join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::Alphabet;

    #[test]
    fn alphabet_is_sorted_and_deduplicated() {
        let mut alphabet = Alphabet::from_iter(['c', 'a', 'c', 'b']);
        assert_eq!(alphabet.size(), 3);
        assert!(!alphabet.insert('a'));
        assert!(alphabet.insert('d'));
        assert_eq!(alphabet[3], 'd');

        let smaller = Alphabet::from_iter(['a', 'd']);
        assert!(smaller.is_subset_of(&alphabet));
        assert!(!alphabet.is_subset_of(&smaller));
        assert_eq!(
            alphabet.missing_from(&smaller).copied().collect::<Vec<_>>(),
            vec!['b', 'c']
        );
    }
}
