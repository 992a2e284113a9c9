use std::{collections::BTreeMap, fmt::Debug};

use crate::{alphabet::Alphabet, word::Word, Show, Symbol};

/// Builder for automata given as literals.
pub mod builder;
/// Breadth-first exploration: minimal representatives and shortest paths.
pub mod reachable;
/// Minimization through partition refinement.
pub mod minimization;
/// Trimming, separating words, equivalence checks and structural covers.
pub mod separate;

/// Opaque handle of a state. It is only meaningful for the automaton that created it.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct StateIndex(u32);

impl StateIndex {
    pub(crate) fn new(position: usize) -> Self {
        Self(u32::try_from(position).expect("number of states exceeds u32::MAX"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for StateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl Show for StateIndex {
    fn show(&self) -> String {
        format!("q{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct State<S> {
    accepting: bool,
    edges: BTreeMap<S, StateIndex>,
}

impl<S> State<S> {
    fn new(accepting: bool) -> Self {
        Self {
            accepting,
            edges: BTreeMap::new(),
        }
    }
}

/// A deterministic finite automaton (DFA). States live in an arena and are referred to through
/// [`StateIndex`] handles. The transition function may be partial: a missing transition means
/// that every word continuing with that symbol is rejected.
///
/// Successors of a state are stored ordered by symbol, so every exploration of the automaton
/// visits transitions in ascending symbol order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DFA<S> {
    alphabet: Alphabet<S>,
    states: Vec<State<S>>,
    initial: StateIndex,
}

impl<S: Symbol> DFA<S> {
    /// Creates an automaton over `alphabet` which consists of a single rejecting initial state
    /// without any transitions, i.e. it accepts the empty language.
    pub fn for_alphabet(alphabet: Alphabet<S>) -> Self {
        Self {
            alphabet,
            states: vec![State::new(false)],
            initial: StateIndex::new(0),
        }
    }

    /// Returns a [`builder::DFABuilder`] for constructing an automaton from literals.
    pub fn builder() -> builder::DFABuilder<S> {
        builder::DFABuilder::default()
    }

    /// The alphabet of the automaton. It contains at least every symbol that labels a transition.
    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// The designated initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Makes `state` the initial state.
    pub fn set_initial(&mut self, state: StateIndex) {
        assert!(self.contains_state(state), "{state:?} does not exist");
        self.initial = state;
    }

    /// Adds a new state without outgoing transitions and returns its index.
    pub fn add_state(&mut self, accepting: bool) -> StateIndex {
        let index = StateIndex::new(self.states.len());
        self.states.push(State::new(accepting));
        index
    }

    /// Returns the `n`-th state in the order in which states were added.
    pub fn nth_state(&self, n: usize) -> Option<StateIndex> {
        (n < self.states.len()).then(|| StateIndex::new(n))
    }

    /// Returns true if `state` is a state of `self`.
    pub fn contains_state(&self, state: StateIndex) -> bool {
        state.index() < self.states.len()
    }

    /// Iterates over all states in the order in which they were added.
    pub fn state_indices(&self) -> impl Iterator<Item = StateIndex> + '_ {
        (0..self.states.len()).map(StateIndex::new)
    }

    /// Returns true if `state` exists and is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.states
            .get(state.index())
            .map(|s| s.accepting)
            .unwrap_or(false)
    }

    /// Changes the acceptance of `state`.
    pub fn set_accepting(&mut self, state: StateIndex, accepting: bool) {
        self.states[state.index()].accepting = accepting;
    }

    /// Returns the indices of all states that are accepting.
    pub fn accepting_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.state_indices().filter(|q| self.is_accepting(*q))
    }

    /// Adds the transition `from --symbol--> to`. An existing transition on `symbol` is
    /// replaced and its target returned, so the automaton stays deterministic. The symbol is
    /// added to the alphabet if it is not yet part of it.
    pub fn add_edge(&mut self, from: StateIndex, symbol: S, to: StateIndex) -> Option<StateIndex> {
        assert!(self.contains_state(to), "target {to:?} does not exist");
        self.alphabet.insert(symbol.clone());
        self.states[from.index()].edges.insert(symbol, to)
    }

    /// The successor of `state` on `symbol`, if that transition is defined.
    pub fn successor(&self, state: StateIndex, symbol: &S) -> Option<StateIndex> {
        self.states.get(state.index())?.edges.get(symbol).copied()
    }

    /// Iterates over the outgoing transitions of `state` in ascending symbol order.
    pub fn edges_from(&self, state: StateIndex) -> impl Iterator<Item = (&S, StateIndex)> + '_ {
        self.states
            .get(state.index())
            .into_iter()
            .flat_map(|s| s.edges.iter().map(|(sym, q)| (sym, *q)))
    }

    /// Iterates over all transitions as triples `(source, symbol, target)`, ordered by source
    /// and then by symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateIndex, &S, StateIndex)> + '_ {
        self.state_indices()
            .flat_map(move |q| self.edges_from(q).map(move |(sym, p)| (q, sym, p)))
    }

    /// Runs `word` starting in `origin` and returns the reached state, or `None` if the run
    /// hits an undefined transition.
    pub fn reached_state_from(&self, origin: StateIndex, word: &[S]) -> Option<StateIndex> {
        word.iter()
            .try_fold(origin, |state, symbol| self.successor(state, symbol))
    }

    /// Runs `word` from the initial state, see [`Self::reached_state_from`].
    pub fn reached_state(&self, word: &[S]) -> Option<StateIndex> {
        self.reached_state_from(self.initial, word)
    }

    /// Returns true if `word` leads from the initial state to an accepting state.
    pub fn accepts(&self, word: &[S]) -> bool {
        self.reached_state(word)
            .map(|q| self.is_accepting(q))
            .unwrap_or(false)
    }

    /// Tries to construct a shortest word that is accepted. Returns `None` if the language is
    /// empty.
    pub fn give_word(&self) -> Option<Word<S>> {
        self.minimal_representatives()
            .find_map(|(rep, q)| self.is_accepting(q).then_some(rep))
    }

    /// Returns true if and only if the accepted language is empty.
    pub fn is_empty_language(&self) -> bool {
        self.give_word().is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::wiki_dfa};

    #[test]
    fn runs_and_acceptance() {
        let dfa = wiki_dfa();
        assert_eq!(dfa.size(), 6);
        assert!(dfa.accepts(&['b', 'a']));
        assert!(dfa.accepts(&['a', 'b', 'a', 'a']));
        assert!(!dfa.accepts(&['b', 'b']));
        assert!(!dfa.accepts(&[]));
        assert_eq!(dfa.give_word(), Some(vec!['b']));
        assert_eq!(dfa.accepting_states().count(), 3);
    }

    #[test]
    fn partial_transitions_reject() {
        let mut dfa = DFA::for_alphabet(Alphabet::from_iter(['a', 'b']));
        assert!(dfa.is_empty_language());
        let q = dfa.add_state(true);
        assert_eq!(dfa.add_edge(dfa.initial(), 'a', q), None);
        assert!(dfa.accepts(&['a']));
        assert!(!dfa.accepts(&['b']));
        assert_eq!(dfa.reached_state(&['a', 'a']), None);
        assert_eq!(dfa.add_edge(dfa.initial(), 'a', dfa.initial()), Some(q));
        assert!(!dfa.accepts(&['a']));
    }
}
