//! The transform F maps a hypothesis to the automaton of the traces that the channel semantics
//! force to be present. Transitions that push or pass are copied as they are, since whether they
//! can be taken only depends on the current step. A pull can only be taken if a matching push
//! happened earlier and was not consumed in between, so every pull transition is rewritten:
//!
//! - If the hypothesis has a run that pushes the message and then reaches the pulling state
//!   without consuming it, the pull is justified and kept.
//! - Otherwise the pull is dropped and, for every matching push transition of the FIFO
//!   automaton, a small sub-automaton is synthesized: the push prefix is replayed from the initial
//!   state, the state reached by the push is marked as pending, a fresh copy of the shortest path
//!   of the hypothesis to the pulling state follows and a final transition performs the pull and
//!   enters the target of the pull.
//!
//! Every state of the result stands for a state of the hypothesis, or for none if the hypothesis
//! rejects everything from there on. A pending state stands for the initial state, since the
//! replayed prefix is exactly what [`reverse_fl`] removes again. Acceptance is inherited through
//! this correspondence, so a word that can be read by the derived automaton is accepted if and
//! only if the hypothesis accepts its reversal.
use tracing::{debug, trace};

use crate::{
    fifo::PushArc,
    math::{Map, StateSet},
    prelude::*,
    word::AnnotatedWord,
};

/// Describes where a state of an [`Expansion`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin<M> {
    /// Copy of the given state of the minimized hypothesis.
    Copied(StateIndex),
    /// Fresh state on a replayed push prefix or on a forward path towards a pull.
    Synthesized,
    /// Fresh state entered by a push whose message has not been consumed yet.
    Pending(M),
}

/// Result of [`apply_fl`], the derived automaton together with the origin of each of its states.
#[derive(Debug, Clone)]
pub struct Expansion<S, M> {
    automaton: DFA<AnnotatedSymbol<S, M>>,
    origins: Vec<Origin<M>>,
}

impl<S: Symbol, M: Symbol> Expansion<S, M> {
    /// The derived automaton.
    pub fn automaton(&self) -> &DFA<AnnotatedSymbol<S, M>> {
        &self.automaton
    }

    /// Consumes `self` and returns the derived automaton.
    pub fn into_automaton(self) -> DFA<AnnotatedSymbol<S, M>> {
        self.automaton
    }

    /// The origin of `state`, `None` if it is not a state of the derived automaton.
    pub fn origin(&self, state: StateIndex) -> Option<&Origin<M>> {
        self.origins.get(state.index())
    }

    /// Returns true if `state` is marked as pending.
    pub fn is_pending(&self, state: StateIndex) -> bool {
        matches!(self.origin(state), Some(Origin::Pending(_)))
    }

    /// All states that are marked as pending.
    pub fn pending_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.automaton
            .state_indices()
            .filter(|q| self.is_pending(*q))
    }
}

type Transition<S, M> = (StateIndex, AnnotatedSymbol<S, M>, StateIndex);

struct Expander<'a, S, M> {
    hypothesis: &'a DFA<AnnotatedSymbol<S, M>>,
    derived: DFA<AnnotatedSymbol<S, M>>,
    origins: Vec<Origin<M>>,
    // the hypothesis state each derived state stands for
    meanings: Vec<Option<StateIndex>>,
    // position of a hypothesis state -> its copy in `derived`
    copies: Vec<StateIndex>,
    pushed: Map<M, StateSet>,
}

impl<'a, S: Symbol, M: Symbol> Expander<'a, S, M> {
    fn new(hypothesis: &'a DFA<AnnotatedSymbol<S, M>>) -> Self {
        let mut derived = DFA::for_alphabet(hypothesis.alphabet().clone());
        let mut copies = Vec::with_capacity(hypothesis.size());
        for q in hypothesis.state_indices() {
            let copy = if q == hypothesis.initial() {
                derived.initial()
            } else {
                derived.add_state(false)
            };
            derived.set_accepting(copy, hypothesis.is_accepting(q));
            copies.push(copy);
        }

        let mut origins = vec![Origin::Synthesized; derived.size()];
        let mut meanings = vec![None; derived.size()];
        for q in hypothesis.state_indices() {
            origins[copies[q.index()].index()] = Origin::Copied(q);
            meanings[copies[q.index()].index()] = Some(q);
        }

        Self {
            hypothesis,
            derived,
            origins,
            meanings,
            copies,
            pushed: Map::default(),
        }
    }

    fn copy(&self, q: StateIndex) -> StateIndex {
        self.copies[q.index()]
    }

    fn meaning(&self, state: StateIndex) -> Option<StateIndex> {
        self.meanings[state.index()]
    }

    fn is_pending(&self, state: StateIndex) -> bool {
        matches!(self.origins[state.index()], Origin::Pending(_))
    }

    /// Copies every push and pass transition and returns the pull transitions.
    fn copy_local_transitions(&mut self) -> Vec<Transition<S, M>> {
        let hypothesis = self.hypothesis;
        let mut pulls = vec![];
        for (p, symbol, q) in hypothesis.transitions() {
            if symbol.action().is_pull() {
                pulls.push((p, symbol.clone(), q));
            } else {
                let (from, to) = (self.copy(p), self.copy(q));
                self.derived.add_edge(from, symbol.clone(), to);
            }
        }
        pulls
    }

    /// Explores the hypothesis while remembering whether `message` has been pushed and not
    /// pulled since. Returns the states that are reachable with such a message in transit.
    fn states_with_pending(&self, message: &M) -> StateSet {
        let hypothesis = self.hypothesis;
        let size = hypothesis.size();
        let slot = |q: StateIndex, pending: bool| q.index() + usize::from(pending) * size;

        let mut seen = StateSet::with_capacity(2 * size);
        seen.insert(slot(hypothesis.initial(), false));
        let mut stack = vec![(hypothesis.initial(), false)];
        while let Some((q, pending)) = stack.pop() {
            for (symbol, p) in hypothesis.edges_from(q) {
                let pending = match symbol.action() {
                    Action::Push(m) if m == message => true,
                    Action::Pull(m) if m == message => false,
                    _ => pending,
                };
                if seen.insert(slot(p, pending)) {
                    stack.push((p, pending));
                }
            }
        }

        hypothesis
            .state_indices()
            .filter(|q| seen.contains(slot(*q, true)))
            .map(|q| q.index())
            .collect()
    }

    /// A pull is justified if the hypothesis can reach its source with the pulled message in
    /// transit.
    fn is_justified(&mut self, pull: &Transition<S, M>) -> bool {
        let (p, symbol, _) = pull;
        let Some(message) = symbol.message() else {
            return true;
        };
        if !self.pushed.contains_key(message) {
            let states = self.states_with_pending(message);
            self.pushed.insert(message.clone(), states);
        }
        self.pushed[message].contains(p.index())
    }

    /// Follows the transition on `symbol` if it exists, otherwise creates a fresh state that
    /// stands for `meaning`.
    fn step(
        &mut self,
        from: StateIndex,
        symbol: &AnnotatedSymbol<S, M>,
        meaning: Option<StateIndex>,
        origin: Origin<M>,
    ) -> StateIndex {
        if let Some(next) = self.derived.successor(from, symbol) {
            return next;
        }
        let accepting = meaning.is_some_and(|q| self.hypothesis.is_accepting(q));
        let fresh = self.derived.add_state(accepting);
        self.origins.push(origin);
        self.meanings.push(meaning);
        self.derived.add_edge(from, symbol.clone(), fresh);
        fresh
    }

    /// Reads `symbol` from `from`, the hypothesis moves along.
    fn advance(&mut self, from: StateIndex, symbol: &AnnotatedSymbol<S, M>) -> StateIndex {
        let meaning = self
            .meaning(from)
            .and_then(|q| self.hypothesis.successor(q, symbol));
        self.step(from, symbol, meaning, Origin::Synthesized)
    }

    /// Adds `from --symbol--> to` unless `from` already has a transition on `symbol`.
    fn connect(&mut self, from: StateIndex, symbol: &AnnotatedSymbol<S, M>, to: StateIndex) {
        match self.derived.successor(from, symbol) {
            None => {
                self.derived.add_edge(from, symbol.clone(), to);
            }
            Some(existing) if existing == to => {}
            Some(existing) => trace!(
                "{from:?} already moves to {existing:?} on {}, not redirecting it to {to:?}",
                symbol.show()
            ),
        }
    }

    /// Builds the sub-automaton that justifies `pull` through the push `arc`.
    fn synthesize(&mut self, arc: &PushArc<S, M>, pull: &Transition<S, M>) {
        let (p, symbol, target) = pull;
        let message = arc.message();
        let hypothesis = self.hypothesis;

        let Some(forward) = hypothesis
            .shortest_path_where(hypothesis.initial(), *p, |s| !s.action().pulls(message))
        else {
            trace!(
                "{p:?} is not reachable without consuming {}, skipping push prefix {}",
                message.show(),
                arc.prefix().show()
            );
            return;
        };
        let push = arc.symbol();
        let Some((_, access)) = arc.prefix().split_last() else {
            return;
        };

        // the push has to enter a pending state, an existing ordinary successor cannot become one
        let entered = self
            .derived
            .reached_state(access)
            .and_then(|q| self.derived.successor(q, push));
        if let Some(q) = entered.filter(|q| !self.is_pending(*q)) {
            trace!(
                "push prefix {} already leads to {q:?}, no gadget for pull out of {p:?}",
                arc.prefix().show()
            );
            return;
        }

        let mut current = self.derived.initial();
        for sym in access {
            current = self.advance(current, sym);
        }
        let initial = Some(hypothesis.initial());
        current = self.step(current, push, initial, Origin::Pending(message.clone()));
        for sym in &forward {
            current = self.advance(current, sym);
        }
        debug_assert_eq!(self.meaning(current), Some(*p));

        let target = self.copy(*target);
        self.connect(current, symbol, target);
        trace!(
            "synthesized {} {} {} for pull out of {p:?}, justified by push {:?} -> {:?}",
            arc.prefix().show(),
            forward.show(),
            symbol.show(),
            arc.source(),
            arc.target()
        );
    }

    fn finish(self) -> Expansion<S, M> {
        debug_assert_eq!(self.origins.len(), self.derived.size());
        Expansion {
            automaton: self.derived,
            origins: self.origins,
        }
    }
}

/// Applies the transform F to the minimized `hypothesis`, see the module documentation for the
/// construction. The hypothesis itself is not modified.
pub fn apply_fl<S: Symbol, M: Symbol>(
    fifo: &FifoAutomaton<S, M>,
    hypothesis: &DFA<AnnotatedSymbol<S, M>>,
) -> Expansion<S, M> {
    let hypothesis = hypothesis.minimize();
    let mut expander = Expander::new(&hypothesis);
    let pulls = expander.copy_local_transitions();

    let mut unjustified = vec![];
    for pull in pulls {
        if expander.is_justified(&pull) {
            trace!("pull {} out of {:?} is justified", pull.1.show(), pull.0);
            let (source, target) = (expander.copy(pull.0), expander.copy(pull.2));
            expander.connect(source, &pull.1, target);
        } else {
            unjustified.push(pull);
        }
    }

    for pull in &unjustified {
        let message = pull.1.message();
        let mut matching = fifo
            .push_arcs()
            .iter()
            .filter(|arc| Some(arc.message()) == message)
            .peekable();
        if matching.peek().is_none() {
            debug!(
                "no push in the FIFO automaton matches {}, dropping it",
                pull.1.show()
            );
        }
        for arc in matching {
            expander.synthesize(arc, pull);
        }
    }

    let expansion = expander.finish();
    debug!(
        "F maps hypothesis with {} states and {} unjustified pulls to automaton with {} states",
        hypothesis.size(),
        unjustified.len(),
        expansion.automaton.size()
    );
    expansion
}

/// Maps a word of the derived automaton of `expansion` back to the domain of the hypothesis.
/// Everything up to the last pending state that the run of `word` passes through is a replayed
/// push prefix followed by its push and is removed. Words that never enter a pending state are
/// returned unchanged, in particular every word of a hypothesis that is already a fixpoint.
pub fn reverse_fl<S: Symbol, M: Symbol>(
    expansion: &Expansion<S, M>,
    word: &[AnnotatedSymbol<S, M>],
) -> AnnotatedWord<S, M> {
    let derived = expansion.automaton();
    let mut state = derived.initial();
    let mut start = 0;
    for (position, symbol) in word.iter().enumerate() {
        let Some(next) = derived.successor(state, symbol) else {
            break;
        };
        state = next;
        if expansion.is_pending(state) {
            start = position + 1;
        }
    }

    if start > 0 {
        trace!(
            "removing push prefix {} from {}",
            word[..start].show(),
            word.show()
        );
    }
    word[start..].to_vec()
}
