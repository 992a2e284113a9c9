use crate::{alphabet::Alphabet, Symbol, DFA};

/// Helper struct for the construction of automata from literals. States are referred to by
/// consecutive numbers starting at `0`, which become the positions of the states in the built
/// automaton (see [`DFA::nth_state`]).
///
/// # Example
///
/// We want to create a DFA with two states 0 and 1 over the alphabet `['a', 'b']`, where
/// reading `b` toggles between the states and state 1 is accepting.
/// ```
/// use fifo_automata::prelude::*;
///
/// let dfa = DFA::builder()
///     .with_state_colors([false, true]) // colors given in the order of the states
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .into_dfa(0); // 0 is the initial state
/// assert!(dfa.accepts(&['a', 'b', 'a']));
/// ```
pub struct DFABuilder<S> {
    symbols: Vec<S>,
    edges: Vec<(u32, S, u32)>,
    default: Option<bool>,
    colors: Vec<(u32, bool)>,
}

impl<S> Default for DFABuilder<S> {
    fn default() -> Self {
        Self {
            symbols: vec![],
            edges: vec![],
            default: None,
            colors: vec![],
        }
    }
}

impl<S: Symbol> DFABuilder<S> {
    /// Sets the acceptance of states that have no color specified.
    pub fn default_color(mut self, accepting: bool) -> Self {
        self.default = Some(accepting);
        self
    }

    /// By default, the only alphabet symbols of the built automaton are the ones that appear on
    /// at least one transition. This method can be used to force additional symbols to appear.
    pub fn with_alphabet_symbols<I: IntoIterator<Item = S>>(mut self, symbols: I) -> Self {
        self.symbols.extend(symbols);
        self
    }

    /// Assigns acceptance to the states in the order in which the colors are given.
    pub fn with_state_colors<I: IntoIterator<Item = bool>>(mut self, iter: I) -> Self {
        self.colors.extend((0u32..).zip(iter));
        self
    }

    /// Adds the given transitions `(source, symbol, target)`.
    pub fn with_edges<I: IntoIterator<Item = (u32, S, u32)>>(mut self, iter: I) -> Self {
        self.edges.extend(iter);
        self
    }

    /// Builds the automaton with `initial` as its initial state.
    ///
    /// # Panics
    /// If some state has no color and no default color was set, or if two transitions leave
    /// the same state on the same symbol.
    pub fn into_dfa(self, initial: u32) -> DFA<S> {
        let num_states = self
            .edges
            .iter()
            .flat_map(|(p, _, q)| [*p, *q])
            .chain(self.colors.iter().map(|(q, _)| *q))
            .chain(std::iter::once(initial))
            .max()
            .map(|max| max as usize + 1)
            .unwrap_or(1);

        let alphabet: Alphabet<S> = self
            .edges
            .iter()
            .map(|(_, sym, _)| sym.clone())
            .chain(self.symbols)
            .collect();

        let color_of = |q: u32| {
            self.colors
                .iter()
                .rev()
                .find_map(|(p, c)| (*p == q).then_some(*c))
                .or(self.default)
                .unwrap_or_else(|| panic!("no color given for state {q} and no default set"))
        };

        let mut dfa = DFA::for_alphabet(alphabet);
        dfa.set_accepting(dfa.initial(), color_of(0));
        for q in 1..num_states as u32 {
            dfa.add_state(color_of(q));
        }

        for (p, sym, q) in self.edges {
            let source = dfa.nth_state(p as usize).expect("states were added above");
            let target = dfa.nth_state(q as usize).expect("states were added above");
            if dfa.add_edge(source, sym.clone(), target).is_some() {
                panic!("nondeterministic transitions from {p} on {sym:?}");
            }
        }

        let initial = dfa
            .nth_state(initial as usize)
            .expect("initial state was added above");
        dfa.set_initial(initial);
        dfa
    }
}
