use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

use crate::{prelude::*, word::AnnotatedWord};

/// A word on which the hypothesis is wrong, possibly together with the output the hypothesis
/// should produce on it. If the expected output is not known, the learner has to ask its
/// membership oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample<S, M> {
    word: AnnotatedWord<S, M>,
    expected: Option<bool>,
}

impl<S, M> Counterexample<S, M> {
    /// Creates a counterexample for `word`.
    pub fn new(word: AnnotatedWord<S, M>, expected: Option<bool>) -> Self {
        Self { word, expected }
    }

    /// The word that should be added to the observations of the learner.
    pub fn word(&self) -> &[AnnotatedSymbol<S, M>] {
        &self.word
    }

    /// The correct classification of [`Self::word`], if it is known.
    pub fn expected(&self) -> Option<bool> {
        self.expected
    }

    /// Consumes `self` and returns the word.
    pub fn into_word(self) -> AnnotatedWord<S, M> {
        self.word
    }
}

/// An executable trace of the system under learning that leads into a bad state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeWitness<S, M> {
    word: AnnotatedWord<S, M>,
    bad_state: StateIndex,
}

impl<S, M> UnsafeWitness<S, M> {
    /// The witnessing trace.
    pub fn word(&self) -> &[AnnotatedSymbol<S, M>] {
        &self.word
    }

    /// The bad state of the FIFO automaton that is reached.
    pub fn bad_state(&self) -> StateIndex {
        self.bad_state
    }
}

/// Outcome of a single equivalence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<S, M> {
    /// The hypothesis needs to be refined with the given counterexample.
    Refine(Counterexample<S, M>),
    /// The hypothesis is a fixpoint of F and no bad state can be reached, learning is complete.
    Safe,
    /// The system under learning itself can reach a bad state. This is not something the learner
    /// can recover from.
    Unsafe(UnsafeWitness<S, M>),
}

impl<S: Symbol, M: Symbol> Verdict<S, M> {
    /// Returns true if `self` is [`Verdict::Safe`].
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    /// Returns the counterexample, if there is one.
    pub fn counterexample(&self) -> Option<&Counterexample<S, M>> {
        match self {
            Verdict::Refine(ce) => Some(ce),
            _ => None,
        }
    }

    /// Turns a confirmed safety violation into an [`OracleError::Unsafe`], such that a learning
    /// loop can propagate it with `?`. Otherwise the counterexample is returned, `None` meaning
    /// the hypothesis is safe.
    pub fn into_result(self) -> Result<Option<Counterexample<S, M>>, OracleError> {
        match self {
            Verdict::Refine(ce) => Ok(Some(ce)),
            Verdict::Safe => Ok(None),
            Verdict::Unsafe(witness) => Err(OracleError::Unsafe {
                state: witness.bad_state,
                witness: witness.word.show(),
            }),
        }
    }
}

/// Errors that can occur when constructing or querying an [`EquivalenceOracle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Some symbols of the hypothesis or of the input alphabet are unknown to the FIFO automaton.
    #[error("alphabets do not match, unknown symbols: {0}")]
    AlphabetMismatch(String),
    /// The safety search was reached but no bad states were configured.
    #[error("no bad states were configured for the safety search")]
    NoBadStates,
    /// A configured bad state is not a state of the FIFO automaton.
    #[error("{0:?} is not a state of the FIFO automaton")]
    UnknownBadState(StateIndex),
    /// A bad state is reachable by an executable trace of the system under learning.
    #[error("bad state {state:?} is reachable by the executable trace {witness}")]
    Unsafe {
        /// The reached bad state.
        state: StateIndex,
        /// The rendered witness.
        witness: String,
    },
}

/// Runtime options of an [`EquivalenceOracle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleOptions {
    parallel: bool,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl OracleOptions {
    /// Sets whether the words of a structural cover are checked on the rayon thread pool. Without
    /// the `parallel` feature this has no effect.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns true if cover enumeration runs in parallel.
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

/// Answers equivalence queries for hypotheses of a system that communicates over a FIFO channel.
/// The FIFO automaton and the bad states are fixed at construction, every call to
/// [`Self::find_counterexample`] only reads them, so an oracle can be shared between threads.
///
/// A query runs three stages in order, each one only if the previous one found nothing:
/// 1. The hypothesis is compared with its image under F. A separating word is returned as
///    counterexample, translated back with [`reverse_fl`] if it is not a valid trace.
/// 2. For each bad state in order, the first non-empty word of the structural cover of
///    [`reverse_reachability`] is taken as candidate witness. If there is none, the hypothesis
///    is [`Verdict::Safe`].
/// 3. The validator decides whether the witness is executable. If it is, the verdict is
///    [`Verdict::Unsafe`], otherwise the witness is returned as a counterexample.
#[derive(Debug)]
pub struct EquivalenceOracle<S, M, O> {
    fifo: Arc<FifoAutomaton<S, M>>,
    validator: O,
    bad_states: Vec<StateIndex>,
    options: OracleOptions,
    safety_searches: AtomicUsize,
}

impl<S: Symbol, M: Symbol> EquivalenceOracle<S, M, FifoTraceSimulator<S, M>> {
    /// Creates an oracle that validates witnesses by simulating them on `fifo` itself.
    pub fn simulating(
        fifo: impl Into<Arc<FifoAutomaton<S, M>>>,
        bad_states: Vec<StateIndex>,
    ) -> Result<Self, OracleError> {
        let fifo = fifo.into();
        let validator = FifoTraceSimulator::new(Arc::clone(&fifo));
        Self::new(fifo, validator, bad_states)
    }
}

impl<S, M, O> EquivalenceOracle<S, M, O>
where
    S: Symbol,
    M: Symbol,
    O: MembershipOracle<AnnotatedSymbol<S, M>>,
{
    /// Creates a new oracle. Fails if one of the `bad_states` is not a state of `fifo`.
    pub fn new(
        fifo: impl Into<Arc<FifoAutomaton<S, M>>>,
        validator: O,
        bad_states: Vec<StateIndex>,
    ) -> Result<Self, OracleError> {
        let fifo = fifo.into();
        if let Some(unknown) = bad_states.iter().find(|q| !fifo.contains_state(**q)) {
            return Err(OracleError::UnknownBadState(*unknown));
        }
        Ok(Self {
            fifo,
            validator,
            bad_states,
            options: OracleOptions::default(),
            safety_searches: AtomicUsize::new(0),
        })
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: OracleOptions) -> Self {
        self.options = options;
        self
    }

    /// The FIFO automaton.
    pub fn fifo(&self) -> &FifoAutomaton<S, M> {
        &self.fifo
    }

    /// The oracle that validates unsafe witnesses.
    pub fn validator(&self) -> &O {
        &self.validator
    }

    /// The bad states in the order in which they are searched.
    pub fn bad_states(&self) -> &[StateIndex] {
        &self.bad_states
    }

    /// The number of bad states for which a safety search was started, over all queries so far.
    pub fn safety_searches(&self) -> usize {
        self.safety_searches.load(Ordering::Relaxed)
    }

    /// Decides whether `hypothesis` needs further refinement, is safe or reveals that the system
    /// under learning is unsafe. Its alphabet must be contained in `inputs`, which in turn must be
    /// contained in the alphabet of the FIFO automaton.
    pub fn find_counterexample(
        &self,
        hypothesis: &DFA<AnnotatedSymbol<S, M>>,
        inputs: &Alphabet<AnnotatedSymbol<S, M>>,
    ) -> Result<Verdict<S, M>, OracleError> {
        self.check_alphabets(hypothesis, inputs)?;

        let minimal = hypothesis.minimize();
        if let Some(ce) = self.fixpoint_counterexample(&minimal, inputs) {
            return Ok(Verdict::Refine(ce));
        }
        debug!("hypothesis with {} states is a fixpoint of F", minimal.size());

        if self.bad_states.is_empty() {
            return Err(OracleError::NoBadStates);
        }
        let Some(witness) = self.find_witness(&minimal) else {
            info!("no bad state is reachable, hypothesis is safe");
            return Ok(Verdict::Safe);
        };

        if self.validator.answer_query(witness.word()) {
            info!(
                "{} reaches bad state {:?} and is executable",
                witness.word().show(),
                witness.bad_state()
            );
            Ok(Verdict::Unsafe(witness))
        } else {
            debug!(
                "{} reaches bad state {:?} but is not executable",
                witness.word().show(),
                witness.bad_state()
            );
            Ok(Verdict::Refine(Counterexample::new(witness.word, Some(false))))
        }
    }

    fn check_alphabets(
        &self,
        hypothesis: &DFA<AnnotatedSymbol<S, M>>,
        inputs: &Alphabet<AnnotatedSymbol<S, M>>,
    ) -> Result<(), OracleError> {
        let unknown = hypothesis
            .alphabet()
            .missing_from(inputs)
            .chain(inputs.missing_from(self.fifo.alphabet()))
            .map(|sym| sym.show())
            .unique()
            .join(", ");
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(OracleError::AlphabetMismatch(unknown))
        }
    }

    fn fixpoint_counterexample(
        &self,
        minimal: &DFA<AnnotatedSymbol<S, M>>,
        inputs: &Alphabet<AnnotatedSymbol<S, M>>,
    ) -> Option<Counterexample<S, M>> {
        let expansion = apply_fl(&self.fifo, minimal);
        let derived = expansion.automaton().minimize();
        let ce = minimal.separating_word(&derived, inputs)?;

        let counterexample = if minimal.accepts(&ce) {
            debug!("{} is accepted by the hypothesis but not by its image", ce.show());
            Counterexample::new(ce, Some(false))
        } else if self.fifo.is_correct_annotated_trace(&ce) {
            debug!("{} is missing from the hypothesis and a valid trace", ce.show());
            Counterexample::new(ce, Some(true))
        } else {
            let reversed = reverse_fl(&expansion, &ce);
            debug!(
                "{} is not a valid trace, reversed to {}",
                ce.show(),
                reversed.show()
            );
            Counterexample::new(reversed, None)
        };
        Some(counterexample)
    }

    fn find_witness(&self, minimal: &DFA<AnnotatedSymbol<S, M>>) -> Option<UnsafeWitness<S, M>> {
        self.bad_states.iter().find_map(|&bad_state| {
            self.safety_searches.fetch_add(1, Ordering::Relaxed);
            unsafe_witness(&self.fifo, minimal, bad_state, self.options.parallel)
                .map(|word| UnsafeWitness { word, bad_state })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        prelude::*,
        tests::{
            eager_consumer, pass, ping_pong, ping_pong_safe_hypothesis, pull, push,
            unjustified_pull, Sym,
        },
    };

    fn rejecting(_: &[Sym]) -> bool {
        false
    }

    fn bad_state(fifo: &FifoAutomaton<char, char>) -> StateIndex {
        fifo.automaton().nth_state(2).unwrap()
    }

    #[test_log::test]
    fn unjustified_pull_is_reversed() {
        let fifo = eager_consumer();
        let inputs = fifo.alphabet().clone();
        let validator = CountingOracle::new(FifoTraceSimulator::new(fifo.clone()));
        let bad = fifo.automaton().nth_state(3).unwrap();
        let oracle = EquivalenceOracle::new(fifo, validator, vec![bad]).unwrap();

        let verdict = oracle
            .find_counterexample(&unjustified_pull(), &inputs)
            .unwrap();
        // the image replays `b a` before the pull, which is everything the reversal removes
        let ce = verdict.counterexample().unwrap();
        assert!(ce.word().is_empty());
        assert_eq!(ce.expected(), None);
        let expansion = apply_fl(oracle.fifo(), &unjustified_pull());
        assert_eq!(
            ce.word(),
            reverse_fl(&expansion, &[pull('b'), push('a')]).as_slice()
        );
        assert_eq!(oracle.validator().queries(), 0);
        assert_eq!(oracle.safety_searches(), 0);
    }

    #[test_log::test]
    fn late_pushes_justify_pulls_before_the_safety_search() {
        let fifo = FifoAutomaton::new(
            DFA::builder()
                .default_color(true)
                .with_edges([(0, pass('c'), 0), (0, push('a'), 1), (1, pull('b'), 0)])
                .into_dfa(0),
        );
        let inputs = fifo.alphabet().clone();
        let bad = fifo.automaton().nth_state(1).unwrap();
        let oracle = EquivalenceOracle::simulating(fifo, vec![bad]).unwrap();

        let hypothesis = DFA::builder()
            .default_color(true)
            .with_edges([(0, pass('c'), 1), (1, push('a'), 2), (2, pull('b'), 3)])
            .into_dfa(0);
        let verdict = oracle.find_counterexample(&hypothesis, &inputs).unwrap();
        let Verdict::Unsafe(witness) = verdict else {
            panic!("expected an unsafe verdict, got {verdict:?}");
        };
        assert_eq!(witness.word(), &[pass('c'), push('a')]);
        assert_eq!(witness.bad_state(), bad);
        assert_eq!(oracle.safety_searches(), 1);
    }

    #[test]
    fn separating_words_carry_the_expected_output() {
        let fifo = Arc::new(ping_pong());
        let validator = CountingOracle::new(rejecting);
        let oracle = EquivalenceOracle::new(Arc::clone(&fifo), validator, vec![]).unwrap();

        // pulls before anything was pushed
        let hypothesis = DFA::builder()
            .default_color(true)
            .with_edges([(0, pull('b'), 1), (1, push('a'), 0)])
            .into_dfa(0);

        // the image of the hypothesis starts with the push instead
        let verdict = oracle
            .find_counterexample(&hypothesis, fifo.alphabet())
            .unwrap();
        assert_eq!(
            verdict,
            Verdict::Refine(Counterexample::new(vec![push('a')], Some(true)))
        );

        // without the push, only the lost pull separates the two
        let pulls_only: Alphabet<Sym> = [pull('b')].into_iter().collect();
        let hypothesis = DFA::builder()
            .default_color(true)
            .with_edges([(0, pull('b'), 1)])
            .into_dfa(0);
        let verdict = oracle
            .find_counterexample(&hypothesis, &pulls_only)
            .unwrap();
        assert_eq!(
            verdict,
            Verdict::Refine(Counterexample::new(vec![pull('b')], Some(false)))
        );
        assert_eq!(oracle.validator().queries(), 0);
        assert_eq!(oracle.safety_searches(), 0);
    }

    #[test_log::test]
    fn fixpoint_without_path_to_bad_state_is_safe() {
        let fifo = ping_pong();
        let inputs = fifo.alphabet().clone();
        let bad = bad_state(&fifo);
        let validator = CountingOracle::new(FifoTraceSimulator::new(fifo.clone()));
        let oracle = EquivalenceOracle::new(fifo, validator, vec![bad]).unwrap();

        let verdict = oracle
            .find_counterexample(&ping_pong_safe_hypothesis(), &inputs)
            .unwrap();
        assert_eq!(verdict, Verdict::Safe);
        assert_eq!(verdict.into_result(), Ok(None));
        assert_eq!(oracle.validator().queries(), 0);
        assert_eq!(oracle.safety_searches(), 1);
    }

    #[test_log::test]
    fn invalid_witness_is_a_counterexample() {
        let fifo = ping_pong();
        let inputs = fifo.alphabet().clone();
        let bad = bad_state(&fifo);
        let hypothesis = fifo.automaton().clone();
        let validator = CountingOracle::new(rejecting);
        let oracle = EquivalenceOracle::new(fifo, validator, vec![bad]).unwrap();

        let verdict = oracle.find_counterexample(&hypothesis, &inputs).unwrap();
        assert_eq!(
            verdict,
            Verdict::Refine(Counterexample::new(vec![push('a'), push('a')], Some(false)))
        );
        assert_eq!(oracle.validator().queries(), 1);
    }

    #[test_log::test]
    fn executable_witness_is_unsafe() {
        let fifo = Arc::new(ping_pong());
        let inputs = fifo.alphabet().clone();
        let bad = bad_state(&fifo);
        let hypothesis = fifo.automaton().clone();

        for parallel in [false, true] {
            let oracle = EquivalenceOracle::simulating(Arc::clone(&fifo), vec![bad])
                .unwrap()
                .with_options(OracleOptions::default().with_parallel(parallel));
            let verdict = oracle.find_counterexample(&hypothesis, &inputs).unwrap();

            let Verdict::Unsafe(witness) = &verdict else {
                panic!("expected an unsafe verdict, got {verdict:?}");
            };
            assert_eq!(witness.word(), &[push('a'), push('a')]);
            assert_eq!(witness.bad_state(), bad);
            assert_eq!(
                verdict.into_result(),
                Err(OracleError::Unsafe {
                    state: bad,
                    witness: "a!m a!m".into()
                })
            );
        }
    }

    #[test]
    fn bad_states_are_searched_in_order() {
        let fifo = ping_pong();
        let inputs = fifo.alphabet().clone();
        let (initial, bad) = (fifo.automaton().initial(), bad_state(&fifo));
        let hypothesis = fifo.automaton().clone();
        let oracle = EquivalenceOracle::simulating(fifo, vec![initial, bad]).unwrap();

        let verdict = oracle.find_counterexample(&hypothesis, &inputs).unwrap();
        let Verdict::Unsafe(witness) = verdict else {
            panic!("expected an unsafe verdict");
        };
        assert_eq!(witness.bad_state(), initial);
        assert_eq!(witness.word(), &[pass('c')]);
        assert_eq!(oracle.safety_searches(), 1);
    }

    #[test]
    fn malformed_configurations_are_rejected() {
        let fifo = Arc::new(ping_pong());
        let inputs = fifo.alphabet().clone();

        assert_eq!(
            EquivalenceOracle::simulating(Arc::clone(&fifo), vec![StateIndex::new(7)]).err(),
            Some(OracleError::UnknownBadState(StateIndex::new(7)))
        );

        let oracle = EquivalenceOracle::simulating(Arc::clone(&fifo), vec![]).unwrap();
        assert_eq!(
            oracle.find_counterexample(fifo.automaton(), &inputs),
            Err(OracleError::NoBadStates)
        );

        let mut foreign = inputs.clone();
        foreign.insert(push('z'));
        assert_eq!(
            oracle.find_counterexample(fifo.automaton(), &foreign),
            Err(OracleError::AlphabetMismatch("z!m".into()))
        );

        let narrow: Alphabet<Sym> = [push('a'), pull('b')].into_iter().collect();
        assert_eq!(
            oracle.find_counterexample(fifo.automaton(), &narrow),
            Err(OracleError::AlphabetMismatch("c".into()))
        );
    }
}
