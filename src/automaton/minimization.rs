use itertools::Itertools;
use tracing::trace;

use crate::{math::Map, prelude::*};

impl<S: Symbol> DFA<S> {
    /// Returns the minimal automaton accepting the same language as `self`. This is done using
    /// Moore's partition refinement on the live part of the automaton, where every missing or
    /// dead transition is redirected into an implicit rejecting sink.
    ///
    /// The result is partial: the sink class is dropped again, so it only consists of states that
    /// are reachable and from which an accepting state is reachable. An automaton accepting the
    /// empty language minimizes to a single rejecting state. States are numbered in the
    /// breadth-first order in which their first member is discovered.
    pub fn minimize(&self) -> DFA<S> {
        let live = self.live_states();
        if !live.contains(self.initial().index()) {
            trace!("language is empty, minimal automaton has a single rejecting state");
            return DFA::for_alphabet(self.alphabet().clone());
        }

        let states = self
            .reachable_state_indices()
            .filter(|q| live.contains(q.index()))
            .collect_vec();
        let position: Map<StateIndex, usize> =
            states.iter().enumerate().map(|(i, q)| (*q, i)).collect();
        let sink = states.len();
        let symbols = self.alphabet().universe().collect_vec();

        let table: Vec<Vec<usize>> = states
            .iter()
            .map(|q| {
                symbols
                    .iter()
                    .map(|sym| {
                        self.successor(*q, sym)
                            .and_then(|p| position.get(&p).copied())
                            .unwrap_or(sink)
                    })
                    .collect()
            })
            .chain(std::iter::once(vec![sink; symbols.len()]))
            .collect();

        let mut class: Vec<usize> = states
            .iter()
            .map(|q| usize::from(self.is_accepting(*q)))
            .chain(std::iter::once(0))
            .collect();
        let mut count = class.iter().unique().count();

        loop {
            let mut ids: Map<(usize, Vec<usize>), usize> = Map::default();
            let refined = (0..=sink)
                .map(|i| {
                    let signature = (class[i], table[i].iter().map(|j| class[*j]).collect_vec());
                    let next = ids.len();
                    *ids.entry(signature).or_insert(next)
                })
                .collect_vec();
            class = refined;
            if ids.len() == count {
                break;
            }
            count = ids.len();
        }

        let sink_class = class[sink];
        let mut out = DFA::for_alphabet(self.alphabet().clone());
        let mut image: Map<usize, StateIndex> = Map::default();
        let mut representatives = vec![];
        for (i, q) in states.iter().enumerate() {
            if image.contains_key(&class[i]) {
                continue;
            }
            let new = if i == 0 { out.initial() } else { out.add_state(false) };
            out.set_accepting(new, self.is_accepting(*q));
            image.insert(class[i], new);
            representatives.push(i);
        }

        for i in representatives {
            let source = image[&class[i]];
            for (k, sym) in symbols.iter().enumerate() {
                let target = table[i][k];
                if class[target] != sink_class {
                    out.add_edge(source, (*sym).clone(), image[&class[target]]);
                }
            }
        }

        trace!(
            "minimized automaton with {} states to {} states",
            self.size(),
            out.size()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::wiki_dfa};

    #[test_log::test]
    fn minimize_wiki_dfa() {
        let dfa = wiki_dfa();
        let min = dfa.minimize();
        // the sink 5 disappears, 0/1 and 2/3/4 collapse
        assert_eq!(min.size(), 2);
        assert!(min.equivalent(&dfa));
        assert_eq!(min.minimize(), min);
    }

    #[test]
    fn minimize_removes_unreachable_and_dead_states() {
        let dfa = DFA::builder()
            .with_state_colors([false, true, false, true])
            .with_edges([(0, 'a', 1), (0, 'b', 2), (2, 'a', 2), (3, 'a', 1)])
            .into_dfa(0);
        let min = dfa.minimize();
        assert_eq!(min.size(), 2);
        assert!(min.accepts(&['a']));
        assert_eq!(min.successor(min.initial(), &'b'), None);
    }

    #[test]
    fn minimize_empty_language() {
        let dfa = DFA::builder()
            .default_color(false)
            .with_edges([(0, 'a', 1), (1, 'a', 0)])
            .into_dfa(0);
        let min = dfa.minimize();
        assert_eq!(min.size(), 1);
        assert!(min.is_empty_language());
        assert_eq!(min.alphabet().size(), 1);
    }

    #[cfg(feature = "random")]
    #[test]
    fn minimization_is_idempotent_on_random_automata() {
        let alphabet = Alphabet::from_iter(['a', 'b', 'c']);
        for seed in 0..50 {
            let dfa = crate::random::random_dfa(&alphabet, 8, 0.7, seed);
            let once = dfa.minimize();
            let twice = once.minimize();
            assert!(once.equivalent(&dfa), "seed {seed}");
            assert!(twice.equivalent(&once), "seed {seed}");
            assert_eq!(twice.size(), once.size(), "seed {seed}");
        }
    }
}
