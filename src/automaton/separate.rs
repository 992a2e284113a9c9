use std::collections::VecDeque;

use crate::{
    math::{Map, Set, StateSet},
    prelude::*,
    word::length_lexicographic,
};

type ProductState = (Option<StateIndex>, Option<StateIndex>);

impl<S: Symbol> DFA<S> {
    /// Returns the states that are reachable from the initial state and from which some accepting
    /// state can be reached.
    pub fn live_states(&self) -> StateSet {
        let reachable: StateSet = self.reachable_state_indices().map(|q| q.index()).collect();

        let mut predecessors = vec![vec![]; self.size()];
        for (p, _, q) in self.transitions() {
            predecessors[q.index()].push(p);
        }

        let mut coreachable = StateSet::with_capacity(self.size());
        let mut stack = self.accepting_states().collect::<Vec<_>>();
        for q in &stack {
            coreachable.insert(q.index());
        }
        while let Some(q) = stack.pop() {
            for p in &predecessors[q.index()] {
                if coreachable.insert(p.index()) {
                    stack.push(*p);
                }
            }
        }

        reachable.intersection(&coreachable).collect()
    }

    /// Restricts `self` to its live states. The result accepts the same language and a word can
    /// be read completely in it if and only if it is a prefix of an accepted word. The initial
    /// state is kept even if it is not live, in which case the result has no transitions.
    pub fn trim(&self) -> DFA<S> {
        let live = self.live_states();
        let mut out = DFA::for_alphabet(self.alphabet().clone());
        if !live.contains(self.initial().index()) {
            return out;
        }

        let mut image: Map<StateIndex, StateIndex> = Map::default();
        for q in self
            .reachable_state_indices()
            .filter(|q| live.contains(q.index()))
        {
            let new = if q == self.initial() {
                out.initial()
            } else {
                out.add_state(false)
            };
            out.set_accepting(new, self.is_accepting(q));
            image.insert(q, new);
        }

        for (p, sym, q) in self.transitions() {
            if let (Some(from), Some(to)) = (image.get(&p), image.get(&q)) {
                out.add_edge(*from, sym.clone(), *to);
            }
        }
        out
    }

    /// Computes the length-lexicographically minimal word over `inputs` that is accepted by
    /// exactly one of `self` and `other`. Missing transitions behave like a rejecting sink.
    /// Returns `None` if the two automata agree on all words over `inputs`.
    pub fn separating_word(&self, other: &DFA<S>, inputs: &Alphabet<S>) -> Option<Word<S>> {
        let start: ProductState = (Some(self.initial()), Some(other.initial()));
        let mut seen: Set<ProductState> = Set::from_iter([start]);
        let mut queue: VecDeque<(Word<S>, ProductState)> = [(vec![], start)].into_iter().collect();

        while let Some((word, (left, right))) = queue.pop_front() {
            let left_accepts = left.is_some_and(|q| self.is_accepting(q));
            let right_accepts = right.is_some_and(|q| other.is_accepting(q));
            if left_accepts != right_accepts {
                return Some(word);
            }

            for sym in inputs.universe() {
                let next = (
                    left.and_then(|q| self.successor(q, sym)),
                    right.and_then(|q| other.successor(q, sym)),
                );
                if next == (None, None) || !seen.insert(next) {
                    continue;
                }
                let mut extended = word.clone();
                extended.push(sym.clone());
                queue.push_back((extended, next));
            }
        }
        None
    }

    /// Checks whether `self` and `other` accept the same language over the union of their
    /// alphabets.
    pub fn equivalent(&self, other: &DFA<S>) -> bool {
        let inputs: Alphabet<S> = self
            .alphabet()
            .universe()
            .chain(other.alphabet().universe())
            .cloned()
            .collect();
        self.separating_word(other, &inputs).is_none()
    }

    /// Computes a structural cover, a finite set of words that together visit every reachable
    /// state and take every transition leaving a reachable state at least once. It consists of
    /// the minimal access word of each state and every such word extended by one defined symbol.
    /// The words are returned in length-lexicographic order without duplicates.
    pub fn structural_cover(&self) -> Vec<Word<S>> {
        let mut cover = vec![];
        for (access, q) in self.minimal_representatives() {
            for (sym, _) in self.edges_from(q) {
                let mut extended = access.clone();
                extended.push(sym.clone());
                cover.push(extended);
            }
            cover.push(access);
        }
        cover.sort_by(|left, right| length_lexicographic(left, right));
        cover.dedup();
        cover
    }
}
