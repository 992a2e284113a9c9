use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{math::Map, prelude::*, word::AnnotatedWord};

/// Builds the automaton that accepts exactly those prefixes of the language of `hypothesis` which
/// lead the FIFO automaton into the state `bad`. It is the product of the trimmed hypothesis with
/// the FIFO automaton, restricted to the part that is reachable from the pair of initial states.
pub fn reverse_reachability<S: Symbol, M: Symbol>(
    fifo: &FifoAutomaton<S, M>,
    hypothesis: &DFA<AnnotatedSymbol<S, M>>,
    bad: StateIndex,
) -> DFA<AnnotatedSymbol<S, M>> {
    let prefixes = hypothesis.trim();
    let system = fifo.automaton();

    let mut product = DFA::for_alphabet(prefixes.alphabet().clone());
    let start = (prefixes.initial(), system.initial());
    product.set_accepting(product.initial(), start.1 == bad);

    let mut image: Map<(StateIndex, StateIndex), StateIndex> = Map::default();
    image.insert(start, product.initial());
    let mut queue = VecDeque::from([start]);

    while let Some(pair) = queue.pop_front() {
        let source = image[&pair];
        let (h, f) = pair;
        for (symbol, h_next) in prefixes.edges_from(h) {
            let Some(f_next) = system.successor(f, symbol) else {
                continue;
            };
            let next = (h_next, f_next);
            let target = match image.get(&next) {
                Some(target) => *target,
                None => {
                    let target = product.add_state(f_next == bad);
                    image.insert(next, target);
                    queue.push_back(next);
                    target
                }
            };
            product.add_edge(source, symbol.clone(), target);
        }
    }

    trace!(
        "product for bad state {bad:?} has {} states, {} of them unsafe",
        product.size(),
        product.accepting_states().count()
    );
    product
}

/// Searches for a witness that `hypothesis` can reach the unsafe state `bad`. The structural
/// cover of [`reverse_reachability`] is enumerated and the first non-empty word it accepts is
/// returned. If `parallel` is set and the `parallel` feature is enabled, the words are checked
/// on the rayon thread pool, the result is still the first accepted word in cover order.
pub fn unsafe_witness<S: Symbol, M: Symbol>(
    fifo: &FifoAutomaton<S, M>,
    hypothesis: &DFA<AnnotatedSymbol<S, M>>,
    bad: StateIndex,
    parallel: bool,
) -> Option<AnnotatedWord<S, M>> {
    let reach = reverse_reachability(fifo, hypothesis, bad);
    let cover = reach.structural_cover();
    debug!(
        "checking {} words of the structural cover for bad state {bad:?}",
        cover.len()
    );
    first_accepted(&reach, cover, parallel)
}

fn is_witness<S: Symbol>(dfa: &DFA<S>, word: &Word<S>) -> bool {
    !word.is_empty() && dfa.accepts(word)
}

#[cfg(feature = "parallel")]
fn first_accepted<S: Symbol>(
    dfa: &DFA<S>,
    cover: Vec<Word<S>>,
    parallel: bool,
) -> Option<Word<S>> {
    use rayon::prelude::*;

    if parallel {
        cover.into_par_iter().find_first(|w| is_witness(dfa, w))
    } else {
        cover.into_iter().find(|w| is_witness(dfa, w))
    }
}

#[cfg(not(feature = "parallel"))]
fn first_accepted<S: Symbol>(
    dfa: &DFA<S>,
    cover: Vec<Word<S>>,
    _parallel: bool,
) -> Option<Word<S>> {
    cover.into_iter().find(|w| is_witness(dfa, w))
}

#[cfg(test)]
mod tests {
    use crate::{
        prelude::*,
        tests::{pass, ping_pong, ping_pong_safe_hypothesis, pull, push},
    };

    #[test]
    fn product_accepts_prefixes_reaching_the_bad_state() {
        let fifo = ping_pong();
        let bad = fifo.automaton().nth_state(2).unwrap();
        let reach = reverse_reachability(&fifo, fifo.automaton(), bad);

        assert_eq!(reach.size(), 3);
        assert!(reach.accepts(&[push('a'), push('a')]));
        assert!(reach.accepts(&[push('a'), push('a'), pull('b'), push('a')]));
        assert!(!reach.accepts(&[push('a')]));
        assert!(!reach.accepts(&[pass('c')]));
    }

    #[test_log::test]
    fn witnesses_are_found_in_cover_order() {
        let fifo = ping_pong();
        let bad = fifo.automaton().nth_state(2).unwrap();
        for parallel in [false, true] {
            assert_eq!(
                unsafe_witness(&fifo, fifo.automaton(), bad, parallel),
                Some(vec![push('a'), push('a')])
            );
            assert_eq!(
                unsafe_witness(&fifo, &ping_pong_safe_hypothesis(), bad, parallel),
                None
            );
        }
    }

    #[test]
    fn empty_witness_is_skipped() {
        let fifo = ping_pong();
        let initial = fifo.automaton().initial();
        assert_eq!(
            unsafe_witness(&fifo, &ping_pong_safe_hypothesis(), initial, false),
            Some(vec![pass('c')])
        );
    }

    #[test]
    fn rejected_suffixes_do_not_count_as_prefixes() {
        let fifo = ping_pong();
        let bad = fifo.automaton().nth_state(2).unwrap();
        // the second push is only ever followed by rejection
        let hypothesis = DFA::builder()
            .with_state_colors([true, true, false])
            .with_edges([(0, push('a'), 1), (1, pull('b'), 0), (1, push('a'), 2)])
            .into_dfa(0);
        assert_eq!(unsafe_witness(&fifo, &hypothesis, bad, false), None);
    }
}
