use std::cmp::Ordering;

use crate::alphabet::AnnotatedSymbol;

/// A finite word is simply a sequence of symbols.
pub type Word<S> = Vec<S>;

/// A word over an annotated alphabet, i.e. a trace in which every step carries its channel action.
pub type AnnotatedWord<S, M> = Word<AnnotatedSymbol<S, M>>;

/// Compares two words first by their length and then lexicographically. This is the order in
/// which breadth-first searches over sorted alphabets discover words.
pub fn length_lexicographic<S: Ord>(left: &[S], right: &[S]) -> Ordering {
    left.len()
        .cmp(&right.len())
        .then_with(|| left.cmp(right))
}

/// Concatenates `prefix` and `suffix` into a new word.
pub fn concat<S: Clone>(prefix: &[S], suffix: &[S]) -> Word<S> {
    let mut out = Vec::with_capacity(prefix.len() + suffix.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(suffix);
    out
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    #[test]
    fn length_lexicographic_order() {
        assert_eq!(length_lexicographic(&['b'], &['a', 'a']), Ordering::Less);
        assert_eq!(length_lexicographic(&['a', 'b'], &['a', 'a']), Ordering::Greater);
        assert_eq!(concat(&['a'], &['b', 'c']), vec!['a', 'b', 'c']);
    }
}
