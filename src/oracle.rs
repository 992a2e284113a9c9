use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::trace;

use crate::{prelude::*, word::concat};

mod equivalence;
pub use equivalence::{
    Counterexample, EquivalenceOracle, OracleError, OracleOptions, UnsafeWitness, Verdict,
};

/// A trait for anything that can answer membership queries, i.e. decide whether a finite word
/// belongs to some language. In the equivalence check it decides whether a trace that reaches an
/// unsafe state can actually be executed by the system under learning.
pub trait MembershipOracle<S> {
    /// Returns true if `word` is a member of the language.
    fn answer_query(&self, word: &[S]) -> bool;

    /// Answers the query for the concatenation of `prefix` and `suffix`.
    fn answer_query_split(&self, prefix: &[S], suffix: &[S]) -> bool
    where
        S: Clone,
    {
        self.answer_query(&concat(prefix, suffix))
    }
}

impl<S, F> MembershipOracle<S> for F
where
    F: Fn(&[S]) -> bool,
{
    fn answer_query(&self, word: &[S]) -> bool {
        self(word)
    }
}

impl<S: Symbol> MembershipOracle<S> for DFA<S> {
    fn answer_query(&self, word: &[S]) -> bool {
        self.accepts(word)
    }
}

/// Answers membership queries by executing the annotated word on a [`FifoAutomaton`] together
/// with its channel, see [`FifoAutomaton::validate_trace`].
#[derive(Debug, Clone)]
pub struct FifoTraceSimulator<S, M> {
    fifo: Arc<FifoAutomaton<S, M>>,
}

impl<S: Symbol, M: Symbol> FifoTraceSimulator<S, M> {
    /// Creates a simulator for `fifo`, which may already be shared with an [`EquivalenceOracle`].
    pub fn new(fifo: impl Into<Arc<FifoAutomaton<S, M>>>) -> Self {
        Self { fifo: fifo.into() }
    }

    /// The simulated automaton.
    pub fn fifo(&self) -> &FifoAutomaton<S, M> {
        &self.fifo
    }
}

impl<S: Symbol, M: Symbol> MembershipOracle<AnnotatedSymbol<S, M>> for FifoTraceSimulator<S, M> {
    fn answer_query(&self, word: &[AnnotatedSymbol<S, M>]) -> bool {
        match self.fifo.validate_trace(word) {
            Ok(state) => {
                trace!("{} executes to {state:?}", word.show());
                true
            }
            Err(violation) => {
                trace!("{} is not executable: {violation}", word.show());
                false
            }
        }
    }
}

/// Wraps another oracle and counts the queries that are posed to it.
#[derive(Debug, Default)]
pub struct CountingOracle<O> {
    inner: O,
    queries: AtomicUsize,
}

impl<O> CountingOracle<O> {
    /// Wraps `inner`, starting with a count of zero.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
        }
    }

    /// The number of queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<S, O: MembershipOracle<S>> MembershipOracle<S> for CountingOracle<O> {
    fn answer_query(&self, word: &[S]) -> bool {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.inner.answer_query(word)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        prelude::*,
        tests::{pass, ping_pong, pull, push, wiki_dfa, Sym},
    };

    #[test_log::test]
    fn simulator_executes_traces() {
        let fifo = Arc::new(ping_pong());
        let simulator = FifoTraceSimulator::new(Arc::clone(&fifo));

        assert!(simulator.answer_query(&Vec::<Sym>::new()));
        assert!(simulator.answer_query(&[push('a'), push('a')]));
        assert!(!simulator.answer_query_split(&[push('a'), pass('c')], &[]));
        assert!(simulator.answer_query_split(&[push('a')], &[pull('b'), pass('c')]));
        assert!(!simulator.answer_query(&[pull('b')]));
        assert!(!simulator.answer_query(&[push('z')]));
    }

    #[test]
    fn automata_and_closures_answer_queries() {
        let dfa = wiki_dfa();
        assert!(dfa.answer_query(&['a', 'a', 'b']));
        assert!(!dfa.answer_query(&['a', 'b', 'b']));

        let even = |word: &[Sym]| word.len() % 2 == 0;
        assert!(even.answer_query(&[push('a'), pull('b')]));
        assert!(!even.answer_query(&[push('a')]));
    }

    #[test]
    fn queries_are_counted() {
        let oracle = CountingOracle::new(wiki_dfa());
        assert_eq!(oracle.queries(), 0);
        oracle.answer_query(&['b']);
        oracle.answer_query_split(&['a'], &['b']);
        assert_eq!(oracle.queries(), 2);
        assert_eq!(oracle.inner().size(), 6);
    }
}
