//! Library for computing adaptive distinguishing sequences (ADS) of deterministic Mealy machines.
//!
//! An ADS is an experiment that is run on a Mealy machine whose current state is unknown, but known to
//! be one of a given set of target states. The experiment is a decision tree: every inner node prescribes
//! an input symbol that should be applied next and branches on the output that is observed. Every leaf
//! names the one target state that is consistent with all observations on the path leading to it. See
//! [`ads::AdsTree`] for the representation of such trees.
//!
//! The entry points are [`ads::compute`], which picks an algorithm based on the number of target states,
//! and [`ads::compute_optimal`], which performs an exhaustive search for a tree that is minimal with
//! respect to a given [`ads::CostAggregator`]. The individual algorithms are also accessible directly:
//! - [`ads::state_equivalence`] distinguishes exactly two states using a separating word,
//! - [`ads::backtracking`] searches for splitting words of growing length for arbitrary subsets of states,
//! - [`ads::lee_yannakakis`] decides in quadratic time whether an ADS for *all* states exists.
//!
//! All algorithms work on anything implementing the [`Transducer`] trait, which gives read-only access to
//! the states, successors and outputs of a complete deterministic Mealy machine. The crate ships with
//! [`MealyMachine`], a simple implementation over a [`alphabet::CharAlphabet`] that can be constructed via
//! [`mealy::MealyBuilder`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::{fmt::Debug, hash::Hash};

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use automata_ads::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        ads,
        ads::{AdsError, AdsTree, CostAggregator, NodeId},
        alphabet,
        alphabet::{Alphabet, CharAlphabet, Symbol},
        math,
        mealy::{
            AdsOf, BuildError, MealyBuilder, MealyMachine, OutputOf, StateOf, SymbolOf,
            Transducer,
        },
        Color, IndexType, Int, Show,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets.
#[macro_use]
pub mod alphabet;

/// Defines the [`Transducer`] abstraction that the algorithms operate on, as well as a concrete
/// [`MealyMachine`].
pub mod mealy;
pub use mealy::{MealyMachine, Transducer};

/// Computation of adaptive distinguishing sequences.
pub mod ads;

/// Implements the generation of random Mealy machines.
#[cfg(feature = "random")]
pub mod random;

/// Alias for the default integer type that is used as output of a [`MealyMachine`].
pub type Int = u8;

/// A color is simply a type that can be used as the output of a transition.
pub trait Color: Clone + Eq + Ord + Hash + Debug + Show {}
impl<T: Clone + Eq + Ord + Hash + Debug + Show> Color for T {}

/// Marker trait for types that can be used to refer to the states of a [`Transducer`].
pub trait IndexType: Copy + Eq + Ord + Hash + Debug + Show {}
impl<T: Copy + Eq + Ord + Hash + Debug + Show> IndexType for T {}

/// Helper trait which can be used to display states, symbols, outputs and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example q0, q1, q2, ... and for an input symbol just the symbol itself.
    /// This is mainly used for debugging purposes.
    fn show(&self) -> String;
}

macro_rules! impl_show_display {
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

impl_show_display!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, String);

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
        format!(
            "\"{}\"",
            itertools::Itertools::join(&mut self.iter().map(|x| x.show()), "")
        )
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl<S: Show> Show for std::collections::BTreeSet<S> {
    fn show(&self) -> String {
        format!(
            "{{{}}}",
            itertools::Itertools::join(&mut self.iter().map(|x| x.show()), ", ")
        )
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
