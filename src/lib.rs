//! Equivalence checking for active learning of systems that communicate over a single FIFO channel.
//!
//! The central object is a [`FifoAutomaton`], a deterministic finite automaton over
//! [`AnnotatedSymbol`]s. Every annotated symbol carries an [`Action`] which either pushes a message
//! into the channel, pulls the oldest message out of it or leaves the channel untouched. Together
//! with the queue semantics of the channel, the FIFO automaton determines which annotated words are
//! valid traces. A learning loop produces hypotheses (plain [`DFA`]s over annotated symbols) and
//! hands them to the [`EquivalenceOracle`], which answers with a [`Verdict`]:
//! - [`Verdict::Refine`] if the hypothesis is not yet a fixpoint of the transform F or if it
//!   reaches an unsafe state only through a trace that the system cannot actually execute,
//! - [`Verdict::Safe`] if the hypothesis is a fixpoint and no designated bad state is reachable,
//! - [`Verdict::Unsafe`] if a bad state is reachable through an executable trace.
//!
//! The automaton algebra needed for this (minimization, separating words, structural covers) lives
//! in [`automaton`], the transform F and its inverse in [`fixpoint`] and the construction of the
//! automata used for the safety search in [`safety`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use fifo_automata::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Action, Alphabet, AnnotatedSymbol, Symbol},
        automaton::{builder::DFABuilder, StateIndex, DFA},
        fifo::{Channel, ChannelViolation, FifoAutomaton, PushArc},
        fixpoint::{apply_fl, reverse_fl, Expansion, Origin},
        math,
        oracle::{
            CountingOracle, Counterexample, EquivalenceOracle, FifoTraceSimulator,
            MembershipOracle, OracleError, OracleOptions, UnsafeWitness, Verdict,
        },
        safety::{reverse_reachability, unsafe_witness},
        word::Word,
        Show,
    };
}

/// Contains type aliases for the collections used throughout the crate.
pub mod math;

/// Module that contains definitions for dealing with alphabets, including annotated ones.
pub mod alphabet;

/// Finite words and their ordering.
pub mod word;

/// Deterministic finite automata and the algebra on them.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// FIFO automata and the channel semantics that decide whether an annotated word is a valid trace.
pub mod fifo;

/// The fixpoint transform F and its inverse on words.
pub mod fixpoint;

/// Reachability of designated unsafe states.
pub mod safety;

/// Membership and equivalence oracles.
pub mod oracle;

/// Generation of random automata. This is feature gated behind the `random` feature.
#[cfg(feature = "random")]
pub mod random;

pub use alphabet::{Action, Alphabet, AnnotatedSymbol, Symbol};
pub use automaton::{StateIndex, DFA};
pub use fifo::FifoAutomaton;
pub use oracle::{EquivalenceOracle, Verdict};

/// Helper trait which can be used to display states, symbols and words. It is mainly used to
/// render words in log messages and error descriptions.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example q0, q1, q2, ... and for a word it is the concatenation of its symbols.
    fn show(&self) -> String;
}

macro_rules! impl_show_via_to_string {
    ($($t:ty),*) => {
        $(
            impl Show for $t {
                fn show(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_show_via_to_string!(char, u8, u16, u32, u64, usize, i32, i64, String, str);

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }
}

impl Show for () {
    fn show(&self) -> String {
        "-".into()
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        if self.is_empty() {
            return "ε".to_string();
        }
        itertools::Itertools::join(&mut self.iter().map(|x| x.show()), " ")
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
