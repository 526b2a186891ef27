//! An adaptive distinguishing sequence (ADS) for a set of states of a [`Transducer`] is an [`AdsTree`]
//! that identifies the state from which it is executed, as long as this state is one of the targets.
//!
//! Usually, [`compute`] is the way to go. It picks one of the algorithms based on the number of
//! target states:
//! - a single state is identified by a leaf without doing anything,
//! - two states are distinguished with a shortest separating word ([`state_equivalence`]),
//! - all states of the transducer are handled by the algorithm of Lee and Yannakakis
//!   ([`lee_yannakakis`]), which decides the existence of an ADS in polynomial time,
//! - any other set of states is handed to the satisficing search of [`backtracking`].
//!
//! If the resulting tree should be as small or as shallow as possible, use [`compute_optimal`].
//!
//! # Example
//! ```
//! use automata_ads::prelude::*;
//!
//! let mm: MealyMachine = MealyBuilder::default()
//!     .with_transitions([(0, 'a', 0, 1), (1, 'a', 1, 2), (2, 'a', 2, 0)])
//!     .into_mealy()
//!     .unwrap();
//! let ads = ads::compute(&mm, mm.alphabet(), [0, 1, 2]).unwrap().unwrap();
//! assert_eq!(ads.depth(), 1);
//! for state in 0..3 {
//!     assert_eq!(ads.identify(&mm, state), Some(state));
//! }
//! ```

use thiserror::Error;
use tracing::debug;

use crate::{
    alphabet::Alphabet,
    math::OrderedSet,
    mealy::{AdsOf, StateOf},
    Show, Transducer,
};

mod tree;
pub use tree::{AdsNode, AdsTree, NodeId};

pub mod util;

pub(crate) mod split_tree;
use split_tree::SplitOf;

pub mod backtracking;
pub use backtracking::CostAggregator;

pub mod lee_yannakakis;
pub mod state_equivalence;

#[cfg(test)]
pub(crate) mod fixtures;

/// Errors that are caused by calling one of the algorithms with unsuitable arguments. The absence of an
/// ADS is not an error, it is signalled by returning `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdsError {
    /// Distinguishing via a separating word works for exactly two states.
    #[error("expected exactly two states to distinguish but got {0}")]
    NotAPair(usize),
    /// The searches need at least one state to work with.
    #[error("the set of target states is empty")]
    EmptyTargets,
    /// Some target is not a state of the transducer.
    #[error("state {0} does not exist in the transducer")]
    UnknownState(String),
    /// The alphabet that should be used contains a symbol on which the transducer has no transitions.
    #[error("symbol {0} is not part of the transducer's alphabet")]
    UnknownSymbol(String),
}

/// The algorithm that is used for a given number of target states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Nothing,
    Leaf,
    StateEquivalence,
    LeeYannakakis,
    Backtracking,
}

impl Strategy {
    fn pick(targets: usize, states: usize) -> Self {
        match targets {
            0 => Strategy::Nothing,
            1 => Strategy::Leaf,
            2 => Strategy::StateEquivalence,
            n if n == states => Strategy::LeeYannakakis,
            _ => Strategy::Backtracking,
        }
    }
}

/// Computes an ADS that distinguishes the states in `targets`, using the symbols of `alphabet`. Returns
/// `Ok(None)` if `targets` is empty or if no ADS exists. In the latter case, there may still be an ADS
/// for a subset of the targets.
///
/// Fails if some target is not a state of `machine` or `alphabet` contains a symbol that `machine` does
/// not know.
pub fn compute<M, It>(
    machine: &M,
    alphabet: &M::Alphabet,
    targets: It,
) -> Result<Option<AdsOf<M>>, AdsError>
where
    M: Transducer,
    It: IntoIterator<Item = StateOf<M>>,
{
    let targets = collect_targets(machine, alphabet, targets)?;
    let strategy = Strategy::pick(targets.len(), machine.size());
    debug!(
        "computing ADS for {} of {} states with {strategy:?}",
        targets.len(),
        machine.size()
    );

    Ok(match strategy {
        Strategy::Nothing => None,
        Strategy::Leaf => targets.first().map(|&state| AdsTree::leaf(state)),
        Strategy::StateEquivalence => {
            state_equivalence::compute_node(machine, alphabet, &split_tree::SplitNode::identity(targets))
        }
        Strategy::LeeYannakakis => {
            let result = lee_yannakakis::compute(machine, alphabet);
            if !result.is_present() {
                debug!(
                    "states {} cannot be distinguished",
                    result.indistinguishable_states().show()
                );
            }
            result.into_ads()
        }
        Strategy::Backtracking => {
            backtracking::search(machine, alphabet, &split_tree::SplitNode::identity(targets))
        }
    })
}

/// Computes an ADS for `targets` that is minimal with respect to `aggregator`, see
/// [`backtracking::compute_optimal`]. Returns `Ok(None)` if `targets` is empty or no ADS exists.
///
/// Fails if some target is not a state of `machine` or `alphabet` contains a symbol that `machine` does
/// not know.
pub fn compute_optimal<M, It>(
    machine: &M,
    alphabet: &M::Alphabet,
    targets: It,
    aggregator: CostAggregator,
) -> Result<Option<AdsOf<M>>, AdsError>
where
    M: Transducer,
    It: IntoIterator<Item = StateOf<M>>,
{
    let targets = collect_targets(machine, alphabet, targets)?;
    if targets.is_empty() {
        return Ok(None);
    }
    backtracking::compute_optimal(machine, alphabet, targets, aggregator)
}

/// Computes an ADS for the states of `node`, whose leaves are labelled with the images of the states
/// under the node's mapping.
pub(crate) fn compute_node<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
    node: &SplitOf<M>,
) -> Option<AdsOf<M>> {
    match node.len() {
        0 => None,
        1 => Some(AdsTree::leaf(node.image(node.first()))),
        2 => state_equivalence::compute_node(machine, alphabet, node),
        _ => backtracking::search(machine, alphabet, node),
    }
}

/// Collects `targets` into an ordered set, failing if one of them is not a state of `machine` or if
/// `alphabet` is not a subset of the alphabet of `machine`.
pub(crate) fn collect_targets<M, It>(
    machine: &M,
    alphabet: &M::Alphabet,
    targets: It,
) -> Result<OrderedSet<StateOf<M>>, AdsError>
where
    M: Transducer,
    It: IntoIterator<Item = StateOf<M>>,
{
    if let Some(symbol) = alphabet
        .universe()
        .find(|&symbol| !machine.alphabet().contains(symbol))
    {
        return Err(AdsError::UnknownSymbol(symbol.show()));
    }
    targets
        .into_iter()
        .map(|state| {
            if machine.contains_state(state) {
                Ok(state)
            } else {
                Err(AdsError::UnknownState(state.show()))
            }
        })
        .collect()
}
