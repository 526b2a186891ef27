use std::collections::VecDeque;

use itertools::Itertools;

use crate::{
    ads::AdsTree,
    alphabet::{Alphabet, CharAlphabet},
    math::Set,
    Color, IndexType, Int, Show,
};

mod builder;
pub use builder::{BuildError, MealyBuilder};

/// Type alias for the input symbols of a [`Transducer`].
pub type SymbolOf<M> = <<M as Transducer>::Alphabet as Alphabet>::Symbol;
/// Type alias for the state indices of a [`Transducer`].
pub type StateOf<M> = <M as Transducer>::StateIndex;
/// Type alias for the outputs of a [`Transducer`].
pub type OutputOf<M> = <M as Transducer>::Output;
/// Type alias for an [`AdsTree`] that distinguishes states of the [`Transducer`] `M`.
pub type AdsOf<M> = AdsTree<StateOf<M>, SymbolOf<M>, OutputOf<M>>;

/// Read-only view on a complete, deterministic Mealy machine. This is all the algorithms for computing
/// adaptive distinguishing sequences need to know about a machine: its states, the successor and the
/// output of every transition, and a dense numbering of the states.
///
/// Every state must have exactly one outgoing transition for every symbol of the [`Transducer::alphabet`],
/// which is why [`Transducer::successor`] and [`Transducer::output`] do not return an `Option`.
pub trait Transducer {
    /// The input alphabet.
    type Alphabet: Alphabet;
    /// The type used to refer to states.
    type StateIndex: IndexType;
    /// The type of outputs that are emitted on transitions.
    type Output: Color;

    /// Returns a reference to the input alphabet.
    fn alphabet(&self) -> &Self::Alphabet;

    /// Returns the number of states.
    fn size(&self) -> usize;

    /// Returns an iterator over all states.
    fn state_indices(&self) -> impl Iterator<Item = Self::StateIndex> + '_;

    /// Gives the dense id of `state`, which is a number in `0..self.size()`. Distinct states have
    /// distinct ids.
    fn state_id(&self, state: Self::StateIndex) -> usize;

    /// Returns the state that is reached from `state` on `symbol`.
    fn successor(&self, state: Self::StateIndex, symbol: SymbolOf<Self>) -> Self::StateIndex;

    /// Returns the output that is emitted when reading `symbol` in `state`.
    fn output(&self, state: Self::StateIndex, symbol: SymbolOf<Self>) -> Self::Output;

    /// Returns true if `state` is a state of `self`.
    fn contains_state(&self, state: Self::StateIndex) -> bool {
        self.state_indices().any(|q| q == state)
    }

    /// Returns the state that is reached when reading `word` from `state`.
    fn reached(&self, state: Self::StateIndex, word: &[SymbolOf<Self>]) -> Self::StateIndex {
        word.iter()
            .fold(state, |current, symbol| self.successor(current, *symbol))
    }

    /// Produces the sequence of outputs that is emitted when reading `word` from `state`. The
    /// result has the same length as `word`.
    fn output_word(&self, state: Self::StateIndex, word: &[SymbolOf<Self>]) -> Vec<Self::Output> {
        let mut current = state;
        word.iter()
            .map(|symbol| {
                let output = self.output(current, *symbol);
                current = self.successor(current, *symbol);
                output
            })
            .collect()
    }

    /// Attempts to find a shortest word over the symbols of `alphabet` on which `left` and `right`
    /// produce different outputs. Returns `None` if the two states are equivalent with respect to
    /// `alphabet`, which in particular is the case if they are equal.
    ///
    /// The search is a breadth-first search over pairs of states, so its runtime is quadratic in
    /// the number of states.
    fn separating_word<A>(
        &self,
        left: Self::StateIndex,
        right: Self::StateIndex,
        alphabet: &A,
    ) -> Option<Vec<SymbolOf<Self>>>
    where
        A: Alphabet<Symbol = SymbolOf<Self>>,
    {
        if left == right {
            return None;
        }
        let mut seen = Set::from_iter([(left, right)]);
        let mut queue = VecDeque::from([((left, right), vec![])]);

        while let Some(((l, r), access)) = queue.pop_front() {
            for symbol in alphabet.universe() {
                if self.output(l, symbol) != self.output(r, symbol) {
                    let mut word = access;
                    word.push(symbol);
                    return Some(word);
                }
            }
            for symbol in alphabet.universe() {
                let next = (self.successor(l, symbol), self.successor(r, symbol));
                if next.0 != next.1 && seen.insert(next) {
                    let mut word = access.clone();
                    word.push(symbol);
                    queue.push_back((next, word));
                }
            }
        }
        None
    }
}

impl<M: Transducer> Transducer for &M {
    type Alphabet = M::Alphabet;
    type StateIndex = M::StateIndex;
    type Output = M::Output;

    fn alphabet(&self) -> &Self::Alphabet {
        M::alphabet(self)
    }
    fn size(&self) -> usize {
        M::size(self)
    }
    fn state_indices(&self) -> impl Iterator<Item = Self::StateIndex> + '_ {
        M::state_indices(self)
    }
    fn state_id(&self, state: Self::StateIndex) -> usize {
        M::state_id(self, state)
    }
    fn successor(&self, state: Self::StateIndex, symbol: SymbolOf<Self>) -> Self::StateIndex {
        M::successor(self, state, symbol)
    }
    fn output(&self, state: Self::StateIndex, symbol: SymbolOf<Self>) -> Self::Output {
        M::output(self, state, symbol)
    }
    fn contains_state(&self, state: Self::StateIndex) -> bool {
        M::contains_state(self, state)
    }
}

/// A Mealy machine is a transition system where each transition has an output. States are numbered
/// densely from `0` to `size - 1` and the transitions are stored in a single table, where the transition
/// of state `q` on the `i`-th symbol of the alphabet is found at position `q * |alphabet| + i`.
///
/// Instances are created through [`MealyBuilder`], which guarantees that the machine is complete and
/// deterministic.
///
/// # Example
/// ```
/// use automata_ads::prelude::*;
///
/// let mm: MealyMachine = MealyBuilder::default()
///     .with_transitions([(0, 'a', 0, 1), (1, 'a', 1, 0)])
///     .into_mealy()
///     .unwrap();
/// assert_eq!(mm.size(), 2);
/// assert_eq!(mm.output_word(0, &['a', 'a', 'a']), vec![0, 1, 0]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MealyMachine<C: Color = Int> {
    alphabet: CharAlphabet,
    size: usize,
    transitions: Vec<(usize, C)>,
}

impl<C: Color> MealyMachine<C> {
    /// Creates a [`MealyMachine`] from the given alphabet and transition table. The table must contain
    /// exactly `size * alphabet.size()` entries, laid out as described in the type level documentation.
    pub(crate) fn from_parts(
        alphabet: CharAlphabet,
        size: usize,
        transitions: Vec<(usize, C)>,
    ) -> Self {
        assert_eq!(
            transitions.len(),
            size * alphabet.size(),
            "transition table does not match dimensions"
        );
        assert!(
            transitions.iter().all(|(target, _)| *target < size),
            "transition leads to a state that does not exist"
        );
        Self {
            alphabet,
            size,
            transitions,
        }
    }

    /// Creates a new, empty [`MealyBuilder`].
    pub fn builder() -> MealyBuilder<C> {
        MealyBuilder::default()
    }

    fn position(&self, state: usize, symbol: char) -> usize {
        assert!(state < self.size, "state {state} does not exist");
        let Some(offset) = self.alphabet.position(symbol) else {
            panic!("symbol {symbol} is not part of the alphabet");
        };
        state * self.alphabet.size() + offset
    }

    /// Returns a string representation of the transition table, where each cell shows the output
    /// and the target of the respective transition.
    pub fn build_transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string())
                .chain(self.alphabet.universe().map(|s| s.show())),
        );
        for state in self.state_indices() {
            let mut row = vec![state.show()];
            for symbol in self.alphabet.universe() {
                let (target, output) = &self.transitions[self.position(state, symbol)];
                row.push(format!("{}/{}", output.show(), target.show()));
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    /// Returns a vector over all outputs that can be emitted.
    pub fn output_range(&self) -> Vec<C> {
        self.transitions
            .iter()
            .map(|(_, output)| output.clone())
            .unique()
            .sorted()
            .collect()
    }
}

impl<C: Color> Transducer for MealyMachine<C> {
    type Alphabet = CharAlphabet;
    type StateIndex = usize;
    type Output = C;

    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn size(&self) -> usize {
        self.size
    }

    fn state_indices(&self) -> impl Iterator<Item = usize> + '_ {
        0..self.size
    }

    fn state_id(&self, state: usize) -> usize {
        state
    }

    fn successor(&self, state: usize, symbol: char) -> usize {
        self.transitions[self.position(state, symbol)].0
    }

    fn output(&self, state: usize, symbol: char) -> C {
        self.transitions[self.position(state, symbol)].1.clone()
    }

    fn contains_state(&self, state: usize) -> bool {
        state < self.size
    }
}

impl<C: Color> Show for MealyMachine<C> {
    fn show(&self) -> String {
        self.build_transition_table()
    }
}

impl<C: Color> std::fmt::Debug for MealyMachine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build_transition_table())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn late_divergence() -> MealyMachine {
        MealyBuilder::default()
            .with_transitions([
                (0, 'a', 0, 2),
                (0, 'b', 0, 0),
                (1, 'a', 0, 3),
                (1, 'b', 0, 1),
                (2, 'a', 0, 2),
                (2, 'b', 0, 2),
                (3, 'a', 0, 3),
                (3, 'b', 1, 3),
            ])
            .into_mealy()
            .unwrap()
    }

    #[test]
    fn mealy_runs() {
        let mm = late_divergence();
        assert_eq!(mm.size(), 4);
        assert_eq!(mm.reached(1, &['b', 'a', 'b']), 3);
        assert_eq!(mm.output_word(1, &['a', 'b']), vec![0, 1]);
        assert_eq!(mm.output_word(0, &['a', 'b']), vec![0, 0]);
        assert_eq!(mm.output_range(), vec![0, 1]);
        assert!(mm.contains_state(3));
        assert!(!mm.contains_state(4));
    }

    #[test]
    fn separating_words() {
        let mm = late_divergence();
        assert_eq!(mm.separating_word(0, 1, mm.alphabet()), Some(vec!['a', 'b']));
        assert_eq!(mm.separating_word(2, 3, mm.alphabet()), Some(vec!['b']));
        assert_eq!(mm.separating_word(1, 1, mm.alphabet()), None);

        let only_a = alphabet!(simple 'a');
        assert_eq!(mm.separating_word(0, 1, &only_a), None);
    }

    #[test]
    fn equivalent_states_are_not_separated() {
        let mm: MealyMachine = MealyBuilder::default()
            .with_transitions([(0, 'a', 0, 1), (1, 'a', 0, 0)])
            .into_mealy()
            .unwrap();
        assert_eq!(mm.separating_word(0, 1, mm.alphabet()), None);
    }

    #[test]
    fn transition_table() {
        let table = late_divergence().build_transition_table();
        assert!(table.contains("State"));
        assert!(table.contains("1/3"));
    }
}
