use thiserror::Error;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, CharAlphabet},
    math::OrderedMap,
    Color, Int,
};

use super::MealyMachine;

/// Errors that can occur when turning a [`MealyBuilder`] into a [`MealyMachine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Some state has no outgoing transition for a symbol of the alphabet.
    #[error("state {state} has no transition on symbol '{symbol}'")]
    MissingTransition {
        /// The state that lacks a transition.
        state: usize,
        /// The symbol for which no transition exists.
        symbol: char,
    },
    /// Some state has two different transitions on the same symbol.
    #[error("state {state} has more than one transition on symbol '{symbol}'")]
    Nondeterministic {
        /// The state with conflicting transitions.
        state: usize,
        /// The symbol on which the transitions conflict.
        symbol: char,
    },
    /// The builder contains no transitions at all.
    #[error("cannot build a Mealy machine without states")]
    Empty,
}

/// Helper struct for the construction of [`MealyMachine`]s. It stores a list of transitions and
/// additional alphabet symbols, the machine is only assembled (and checked for completeness and
/// determinism) in [`MealyBuilder::into_mealy`].
///
/// # Example
///
/// We want to create a Mealy machine with two states 0 and 1 over the alphabet `['a', 'b']`, that outputs
/// `1` whenever it reads a 'b' in state 1 and `0` otherwise. Transitions are given as tuples of the form
/// `(source, symbol, output, target)`.
/// ```
/// use automata_ads::prelude::*;
///
/// let mm: MealyMachine = MealyBuilder::default()
///     .with_transitions([(0, 'a', 0, 1), (0, 'b', 0, 0), (1, 'a', 0, 1), (1, 'b', 1, 0)])
///     .into_mealy()
///     .unwrap();
/// assert_eq!(mm.output_word(0, &['a', 'b']), vec![0, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct MealyBuilder<C = Int> {
    symbols: Vec<char>,
    transitions: Vec<(usize, char, C, usize)>,
}

impl<C> Default for MealyBuilder<C> {
    fn default() -> Self {
        Self {
            symbols: vec![],
            transitions: vec![],
        }
    }
}

impl<C: Color> MealyBuilder<C> {
    /// By default, the only alphabet symbols in the machine that is built are the ones that
    /// appear on at least one transition. This method can be used to force additional alphabet
    /// symbols to appear. Note that every state needs a transition on each of them.
    pub fn with_alphabet_symbols<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        self.symbols.extend(symbols);
        self
    }

    /// Adds a list of transitions to `self`. The transitions are added in the order in which they are given
    /// and each transition is a tuple `(source, symbol, output, target)`.
    pub fn with_transitions<T: IntoIterator<Item = (usize, char, C, usize)>>(
        mut self,
        iter: T,
    ) -> Self {
        self.transitions.extend(iter);
        self
    }

    /// Adds a single transition from `source` to `target` on `symbol` that emits `output`.
    pub fn add_transition(&mut self, source: usize, symbol: char, output: C, target: usize) {
        self.transitions.push((source, symbol, output, target));
    }

    /// Assembles the [`MealyMachine`]. The states are `0..=m` where `m` is the largest state index that
    /// appears in a transition. Fails if some state misses a transition for a symbol of the alphabet or
    /// if two distinct transitions exist for the same state and symbol. Giving the exact same transition
    /// twice is allowed.
    pub fn into_mealy(self) -> Result<MealyMachine<C>, BuildError> {
        let alphabet: CharAlphabet = self
            .transitions
            .iter()
            .map(|(_, symbol, _, _)| *symbol)
            .chain(self.symbols)
            .collect();
        let Some(size) = self
            .transitions
            .iter()
            .flat_map(|(q, _, _, p)| [*q, *p])
            .max()
            .map(|max| max + 1)
        else {
            return Err(BuildError::Empty);
        };

        let mut table: OrderedMap<(usize, char), (usize, C)> = OrderedMap::new();
        for (source, symbol, output, target) in self.transitions {
            if let Some((t, o)) = table.get(&(source, symbol)) {
                if *t == target && *o == output {
                    continue;
                }
                return Err(BuildError::Nondeterministic {
                    state: source,
                    symbol,
                });
            }
            table.insert((source, symbol), (target, output));
        }

        let mut transitions = Vec::with_capacity(size * alphabet.size());
        for state in 0..size {
            for &symbol in alphabet.symbols() {
                let Some(transition) = table.remove(&(state, symbol)) else {
                    return Err(BuildError::MissingTransition { state, symbol });
                };
                transitions.push(transition);
            }
        }
        trace!(
            "built Mealy machine with {size} states over {} symbols",
            alphabet.size()
        );

        Ok(MealyMachine::from_parts(alphabet, size, transitions))
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildError, MealyBuilder};
    use crate::prelude::*;

    #[test]
    fn builds_complete_machines() {
        let mm: MealyMachine<char> = MealyBuilder::default()
            .with_transitions([(0, 'a', 'x', 1), (1, 'a', 'y', 2), (2, 'a', 'z', 0)])
            .with_transitions([(2, 'a', 'z', 0)])
            .into_mealy()
            .unwrap();
        assert_eq!(mm.size(), 3);
        assert_eq!(mm.output_word(0, &['a', 'a', 'a', 'a']), vec!['x', 'y', 'z', 'x']);
    }

    #[test]
    fn rejects_incomplete_machines() {
        let missing = MealyBuilder::<Int>::default()
            .with_transitions([(0, 'a', 0, 1), (1, 'b', 0, 0)])
            .into_mealy();
        assert_eq!(
            missing,
            Err(BuildError::MissingTransition {
                state: 0,
                symbol: 'b'
            })
        );

        let mut extra = MealyBuilder::<Int>::default().with_alphabet_symbols(['c']);
        extra.add_transition(0, 'a', 0, 0);
        assert_eq!(
            extra.into_mealy(),
            Err(BuildError::MissingTransition {
                state: 0,
                symbol: 'c'
            })
        );

        assert_eq!(
            MealyBuilder::<Int>::default().into_mealy(),
            Err(BuildError::Empty)
        );
    }

    #[test]
    fn rejects_nondeterministic_machines() {
        let result = MealyBuilder::<Int>::default()
            .with_transitions([(0, 'a', 0, 0), (0, 'a', 1, 0)])
            .into_mealy();
        assert_eq!(
            result,
            Err(BuildError::Nondeterministic {
                state: 0,
                symbol: 'a'
            })
        );
    }
}
