use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::{prelude::*, word::AnnotatedWord};

/// Reasons why an annotated word is not a valid channel history. Positions are zero-based
/// indices into the offending word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelViolation {
    /// A pull was attempted while no message was in transit.
    #[error("pull at position {position} found an empty channel")]
    EmptyChannel {
        /// Position of the pull.
        position: usize,
    },
    /// The oldest message in the channel is not the one that should be pulled.
    #[error("pull at position {position} expects `{expected}` but the oldest message is `{found}`")]
    MessageMismatch {
        /// Position of the pull.
        position: usize,
        /// The message the symbol pulls.
        expected: String,
        /// The message at the front of the channel.
        found: String,
    },
    /// The FIFO automaton has no transition for the symbol.
    #[error("no transition for `{symbol}` at position {position}")]
    NoTransition {
        /// Position of the symbol.
        position: usize,
        /// The symbol that could not be read.
        symbol: String,
    },
}

/// The content of the channel, a queue of messages in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel<M> {
    queue: VecDeque<M>,
}

impl<M> Default for Channel<M> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<M: Symbol> Channel<M> {
    /// An empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages in transit.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no message is in transit.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The messages in transit, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &M> + '_ {
        self.queue.iter()
    }

    /// Performs `action`, which is the action of the symbol at `position` of some word.
    pub fn apply(&mut self, action: &Action<M>, position: usize) -> Result<(), ChannelViolation> {
        match action {
            Action::Push(m) => self.queue.push_back(m.clone()),
            Action::Pull(m) => {
                match self.queue.front() {
                    None => return Err(ChannelViolation::EmptyChannel { position }),
                    Some(oldest) if oldest != m => {
                        return Err(ChannelViolation::MessageMismatch {
                            position,
                            expected: m.show(),
                            found: oldest.show(),
                        })
                    }
                    Some(_) => {}
                }
                self.queue.pop_front();
            }
            Action::Pass => {}
        }
        Ok(())
    }
}

/// A transition of a [`FifoAutomaton`] that pushes a message, together with the
/// length-lexicographically minimal word that reaches it from the initial state and takes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushArc<S, M> {
    source: StateIndex,
    symbol: AnnotatedSymbol<S, M>,
    message: M,
    target: StateIndex,
    prefix: AnnotatedWord<S, M>,
}

impl<S, M> PushArc<S, M> {
    /// The state in which the push happens.
    pub fn source(&self) -> StateIndex {
        self.source
    }

    /// The pushing symbol.
    pub fn symbol(&self) -> &AnnotatedSymbol<S, M> {
        &self.symbol
    }

    /// The pushed message.
    pub fn message(&self) -> &M {
        &self.message
    }

    /// The state reached by the push.
    pub fn target(&self) -> StateIndex {
        self.target
    }

    /// The minimal access word of [`Self::source`] followed by [`Self::symbol`].
    pub fn prefix(&self) -> &[AnnotatedSymbol<S, M>] {
        &self.prefix
    }
}

/// A deterministic automaton over annotated symbols which, together with the FIFO semantics of
/// the channel, determines the valid traces of the system under learning. It is immutable once
/// constructed and can be shared between threads.
#[derive(Debug, Clone)]
pub struct FifoAutomaton<S, M> {
    automaton: DFA<AnnotatedSymbol<S, M>>,
    push_arcs: Vec<PushArc<S, M>>,
}

impl<S: Symbol, M: Symbol> FifoAutomaton<S, M> {
    /// Wraps `automaton` and precomputes its reachable push transitions.
    pub fn new(automaton: DFA<AnnotatedSymbol<S, M>>) -> Self {
        let mut push_arcs = vec![];
        for (access, source) in automaton.minimal_representatives() {
            for (symbol, target) in automaton.edges_from(source) {
                if let Action::Push(message) = symbol.action() {
                    let mut prefix = access.clone();
                    prefix.push(symbol.clone());
                    push_arcs.push(PushArc {
                        source,
                        symbol: symbol.clone(),
                        message: message.clone(),
                        target,
                        prefix,
                    });
                }
            }
        }
        trace!(
            "FIFO automaton with {} states has {} reachable push transitions",
            automaton.size(),
            push_arcs.len()
        );
        Self {
            automaton,
            push_arcs,
        }
    }

    /// The underlying automaton.
    pub fn automaton(&self) -> &DFA<AnnotatedSymbol<S, M>> {
        &self.automaton
    }

    /// The annotated alphabet.
    pub fn alphabet(&self) -> &Alphabet<AnnotatedSymbol<S, M>> {
        self.automaton.alphabet()
    }

    /// All push transitions reachable from the initial state, ordered by the breadth-first
    /// discovery of their source and then by symbol.
    pub fn push_arcs(&self) -> &[PushArc<S, M>] {
        &self.push_arcs
    }

    /// Returns true if `state` is a state of the FIFO automaton.
    pub fn contains_state(&self, state: StateIndex) -> bool {
        self.automaton.contains_state(state)
    }

    /// Simulates only the channel: pushes enqueue, pulls dequeue the oldest message and passes do
    /// nothing. Returns the final channel content or the first violation.
    pub fn channel_history(
        &self,
        word: &[AnnotatedSymbol<S, M>],
    ) -> Result<Channel<M>, ChannelViolation> {
        let mut channel = Channel::new();
        for (position, symbol) in word.iter().enumerate() {
            channel.apply(symbol.action(), position)?;
        }
        Ok(channel)
    }

    /// Decides whether `word` is a structurally valid annotated trace: it must be accepted by
    /// the FIFO automaton and its channel history must respect the FIFO order.
    pub fn is_correct_annotated_trace(&self, word: &[AnnotatedSymbol<S, M>]) -> bool {
        self.automaton.accepts(word) && self.channel_history(word).is_ok()
    }

    /// Executes `word` step by step, moving through the FIFO automaton and the channel at the
    /// same time. Acceptance of the reached state is not required, every prefix of an executable
    /// trace is executable. Returns the reached state or the first violation.
    pub fn validate_trace(
        &self,
        word: &[AnnotatedSymbol<S, M>],
    ) -> Result<StateIndex, ChannelViolation> {
        let mut channel = Channel::new();
        let mut state = self.automaton.initial();
        for (position, symbol) in word.iter().enumerate() {
            state = self.automaton.successor(state, symbol).ok_or_else(|| {
                ChannelViolation::NoTransition {
                    position,
                    symbol: symbol.show(),
                }
            })?;
            channel.apply(symbol.action(), position)?;
        }
        Ok(state)
    }
}

impl<S: Symbol, M: Symbol> From<DFA<AnnotatedSymbol<S, M>>> for FifoAutomaton<S, M> {
    fn from(value: DFA<AnnotatedSymbol<S, M>>) -> Self {
        Self::new(value)
    }
}
