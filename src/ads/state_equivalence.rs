//! Distinguishes exactly two states with the help of a separating word.

use tracing::trace;

use crate::{
    mealy::{AdsOf, StateOf},
    math, Show, Transducer,
};

use super::{
    collect_targets,
    split_tree::{SplitNode, SplitOf},
    util, AdsError,
};

/// Computes an ADS for the two states in `targets`, using a shortest separating word over the symbols
/// of `alphabet`. Returns `Ok(None)` if the two states are equivalent.
///
/// Fails with [`AdsError::NotAPair`] unless `targets` contains exactly two distinct states.
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
    if targets.len() != 2 {
        return Err(AdsError::NotAPair(targets.len()));
    }
    Ok(compute_node(machine, alphabet, &SplitNode::identity(targets)))
}

/// Works on a node with exactly two states, the leaves of the resulting tree name the images of the
/// two states under the node's mapping.
pub(crate) fn compute_node<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
    node: &SplitOf<M>,
) -> Option<AdsOf<M>> {
    assert_eq!(node.len(), 2, "can only distinguish two states");
    let left = node.first();
    let right = *node.partition.last().expect("node has two states");

    let Some(word) = machine.separating_word(left, right, alphabet) else {
        trace!(
            "states {} and {} are equivalent",
            left.show(),
            right.show()
        );
        return None;
    };

    let left_output = machine.output_word(left, &word);
    let right_output = machine.output_word(right, &word);
    let shared = math::longest_common_prefix(&left_output, &right_output);
    trace!(
        "separating {} and {} with {} after a shared prefix of length {shared}",
        left.show(),
        right.show(),
        word.show()
    );

    let (mut tree, tail) = util::build_from_trace(machine, &word[..=shared], left);
    tree.push_leaf(tail, left_output[shared].clone(), node.image(left));
    tree.push_leaf(tail, right_output[shared].clone(), node.image(right));
    Some(tree)
}
