use std::collections::VecDeque;

use crate::{math::StateSet, prelude::*};

/// Type alias for a minimal representative of a state which is its length-lexicographically minimal
/// access sequence and its state index.
pub type MinimalRepresentative<S> = (Word<S>, StateIndex);

/// Struct that can return the minimal representatives of an automaton. A minimal representative
/// for a state `q` is the length-lexicographically minimal word with which `q` can be reached
/// from a given origin. States are produced in breadth-first order.
#[derive(Debug, Clone)]
pub struct MinimalRepresentatives<'a, S> {
    dfa: &'a DFA<S>,
    seen: StateSet,
    queue: VecDeque<MinimalRepresentative<S>>,
}

impl<'a, S: Symbol> MinimalRepresentatives<'a, S> {
    /// Starts the exploration in `origin`.
    pub fn new(dfa: &'a DFA<S>, origin: StateIndex) -> Self {
        let mut seen = StateSet::with_capacity(dfa.size());
        seen.insert(origin.index());
        let queue = [(vec![], origin)].into_iter().collect();
        Self { dfa, seen, queue }
    }
}

impl<'a, S: Symbol> Iterator for MinimalRepresentatives<'a, S> {
    type Item = MinimalRepresentative<S>;

    fn next(&mut self) -> Option<Self::Item> {
        let (access, q) = self.queue.pop_front()?;
        for (sym, p) in self.dfa.edges_from(q) {
            if self.seen.insert(p.index()) {
                let mut new_access = access.clone();
                new_access.push(sym.clone());
                self.queue.push_back((new_access, p));
            }
        }
        Some((access, q))
    }
}

impl<S: Symbol> DFA<S> {
    /// Minimal representatives of all states reachable from the initial state.
    pub fn minimal_representatives(&self) -> MinimalRepresentatives<'_, S> {
        self.minimal_representatives_from(self.initial())
    }

    /// Minimal representatives of all states reachable from `origin`.
    pub fn minimal_representatives_from(
        &self,
        origin: StateIndex,
    ) -> MinimalRepresentatives<'_, S> {
        MinimalRepresentatives::new(self, origin)
    }

    /// Indices of all states reachable from the initial state, in breadth-first order.
    pub fn reachable_state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.minimal_representatives().map(|(_, q)| q)
    }

    /// Computes the length-lexicographically minimal word leading from `from` to `to` that only
    /// uses transitions whose symbol satisfies `allowed`.
    pub fn shortest_path_where<F>(
        &self,
        from: StateIndex,
        to: StateIndex,
        allowed: F,
    ) -> Option<Word<S>>
    where
        F: Fn(&S) -> bool,
    {
        let mut seen = StateSet::with_capacity(self.size());
        seen.insert(from.index());
        let mut queue: VecDeque<(Word<S>, StateIndex)> = [(vec![], from)].into_iter().collect();

        while let Some((access, q)) = queue.pop_front() {
            if q == to {
                return Some(access);
            }
            for (sym, p) in self.edges_from(q).filter(|(sym, _)| allowed(sym)) {
                if seen.insert(p.index()) {
                    let mut extended = access.clone();
                    extended.push(sym.clone());
                    queue.push_back((extended, p));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::prelude::*;

    #[test]
    fn reachable_states() {
        let dfa = DFA::builder()
            .with_state_colors([false, false, true, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 2),
                (1, 'b', 0),
                (2, 'a', 2),
                (2, 'b', 2),
                (3, 'a', 0),
            ])
            .into_dfa(0);
        let q = |n| dfa.nth_state(n).unwrap();

        assert_eq!(
            dfa.minimal_representatives().collect_vec(),
            vec![(vec![], q(0)), (vec!['a'], q(1)), (vec!['a', 'a'], q(2))]
        );
        assert_eq!(dfa.reachable_state_indices().collect_vec(), vec![q(0), q(1), q(2)]);
        assert_eq!(
            dfa.minimal_representatives_from(q(2))
                .map(|(_, p)| p)
                .collect_vec(),
            vec![q(2)]
        );
    }

    #[test]
    fn restricted_shortest_paths() {
        let dfa = DFA::builder()
            .default_color(true)
            .with_edges([(0, 'a', 1), (1, 'b', 2), (0, 'c', 3), (3, 'c', 4), (4, 'c', 2)])
            .into_dfa(0);
        let q = |n| dfa.nth_state(n).unwrap();

        assert_eq!(dfa.shortest_path_where(q(0), q(2), |_| true), Some(vec!['a', 'b']));
        assert_eq!(
            dfa.shortest_path_where(q(0), q(2), |s| *s != 'b'),
            Some(vec!['c', 'c', 'c'])
        );
        assert_eq!(dfa.shortest_path_where(q(0), q(2), |s| *s == 'a'), None);
        assert_eq!(dfa.shortest_path_where(q(2), q(2), |_| false), Some(vec![]));
    }
}
