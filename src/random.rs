use tracing::trace;

use crate::prelude::*;

/// Generates a random, possibly partial [`DFA`] with `size` states over `alphabet`. The
/// generator is seeded, so the same arguments always produce the same automaton.
/// The algorithm is as follows:
/// 1. Start with `size` states, each accepting with probability one half.
/// 2. For each state and each symbol, with probability `density` draw a target state uniformly
///    and add the corresponding edge, otherwise leave the transition undefined.
///
/// Note that depending on the drawn edges, there may be unreachable states.
pub fn random_dfa<S: Symbol>(
    alphabet: &Alphabet<S>,
    size: usize,
    density: f64,
    seed: u64,
) -> DFA<S> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut dfa = DFA::for_alphabet(alphabet.clone());
    dfa.set_accepting(dfa.initial(), rng.bool());
    for _ in 1..size {
        dfa.add_state(rng.bool());
    }

    let states = dfa.state_indices().collect::<Vec<_>>();
    for &source in &states {
        for symbol in alphabet.universe() {
            if rng.f64() < density {
                let target = states[rng.usize(..states.len())];
                dfa.add_edge(source, symbol.clone(), target);
            }
        }
    }
    trace!(
        "generated random automaton with {} states and {} transitions from seed {seed}",
        dfa.size(),
        dfa.transitions().count()
    );
    dfa
}

/// Works as [`random_dfa`], but over annotated symbols. Every symbol of `symbols` is paired with
/// each action on each message of `messages`, so the result can serve as FIFO automaton or as
/// hypothesis for one.
pub fn random_annotated_dfa<S: Symbol, M: Symbol>(
    symbols: &[S],
    messages: &[M],
    size: usize,
    density: f64,
    seed: u64,
) -> DFA<AnnotatedSymbol<S, M>> {
    let alphabet = symbols
        .iter()
        .flat_map(|symbol| {
            std::iter::once(AnnotatedSymbol::pass(symbol.clone())).chain(messages.iter().flat_map(
                move |message| {
                    [
                        AnnotatedSymbol::push(symbol.clone(), message.clone()),
                        AnnotatedSymbol::pull(symbol.clone(), message.clone()),
                    ]
                },
            ))
        })
        .collect::<Alphabet<_>>();
    random_dfa(&alphabet, size, density, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let alphabet = Alphabet::from_iter(['a', 'b']);
        let first = random_dfa(&alphabet, 10, 0.5, 7);
        let second = random_dfa(&alphabet, 10, 0.5, 7);
        assert_eq!(first.size(), 10);
        assert_eq!(
            first.transitions().collect::<Vec<_>>(),
            second.transitions().collect::<Vec<_>>()
        );

        let complete = random_dfa(&alphabet, 4, 1.0, 3);
        assert_eq!(complete.transitions().count(), 8);
        let empty = random_dfa(&alphabet, 4, 0.0, 3);
        assert_eq!(empty.transitions().count(), 0);
    }

    #[test]
    fn annotated_alphabet_pairs_every_action() {
        let dfa = random_annotated_dfa(&['a', 'b'], &['m', 'n'], 3, 0.5, 1);
        assert_eq!(dfa.alphabet().size(), 10);
        assert!(dfa.alphabet().contains(&AnnotatedSymbol::pull('b', 'n')));
    }
}
