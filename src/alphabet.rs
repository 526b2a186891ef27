use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

use crate::Show;

/// A symbol of an alphabet, which is also the type of the symbols in a word that is fed into
/// a [`crate::Transducer`].
pub trait Symbol: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show {}
impl<S: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show> Symbol for S {}

/// An alphabet abstracts a finite collection of [`Symbol`]s.
pub trait Alphabet: Clone + Debug {
    /// The type of symbols in this alphabet.
    type Symbol: Symbol;

    /// Type for an iterator over all symbols in the alphabet.
    type Universe<'this>: Iterator<Item = Self::Symbol>
    where
        Self: 'this;

    /// Returns an iterator over all symbols in the alphabet. The order in which symbols are
    /// produced is fixed, algorithms iterating over the alphabet rely on this.
    fn universe(&self) -> Self::Universe<'_>;

    /// Returns true if the given symbol is present in the alphabet.
    fn contains(&self, symbol: Self::Symbol) -> bool;

    /// Returns the number of symbols in the alphabet.
    fn size(&self) -> usize;

    /// Returns true if the alphabet contains no symbols.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<A: Alphabet> Alphabet for &A {
    type Symbol = A::Symbol;
    type Universe<'this> = A::Universe<'this> where Self: 'this;
    fn universe(&self) -> Self::Universe<'_> {
        A::universe(self)
    }
    fn contains(&self, symbol: Self::Symbol) -> bool {
        A::contains(self, symbol)
    }
    fn size(&self) -> usize {
        A::size(self)
    }
}

/// Represents an alphabet where a [`Symbol`] is just a single `char`.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(pub(crate) Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] from the given symbols, duplicates are removed and the
    /// symbols are sorted.
    pub fn new(symbols: Vec<char>) -> Self {
        symbols.into_iter().collect()
    }

    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Returns the position of `symbol` in the alphabet, if it is present.
    pub fn position(&self, symbol: char) -> Option<usize> {
        self.0.binary_search(&symbol).ok()
    }

    /// Gives the symbols of the alphabet as a slice.
    pub fn symbols(&self) -> &[char] {
        &self.0
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Helper macro for creating a [`CharAlphabet`] alphabet. Is called simply with a list of symbols
/// that are separated by commata.
///
/// # Examples
/// ```
/// use automata_ads::prelude::*;
/// let alphabet = alphabet!(simple 'a', 'b', 'c');
/// assert_eq!(alphabet.size(), 3);
/// ```
#[macro_export]
macro_rules! alphabet {
    (simple $($c:literal),*) => {
        $crate::prelude::CharAlphabet::new(vec![$($c),*])
    };
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl Alphabet for CharAlphabet {
    type Symbol = char;

    type Universe<'this> = std::iter::Copied<std::slice::Iter<'this, char>>
    where
        Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        self.0.iter().copied()
    }

    fn contains(&self, symbol: char) -> bool {
        self.position(symbol).is_some()
    }

    fn size(&self) -> usize {
        self.0.len()
    }
}
