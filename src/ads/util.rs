//! Helper routines for working with [`AdsTree`]s.

use crate::{
    alphabet::Symbol,
    mealy::{AdsOf, SymbolOf},
    math, Color, IndexType, Transducer,
};

use super::{AdsTree, NodeId};

/// Computes the length of the longest input word that the sub-experiment rooted in `node` may apply,
/// i.e. the number of inner nodes on the longest path from `node` to a leaf.
pub fn length<S: IndexType, I: Symbol, O: Color>(tree: &AdsTree<S, I, O>, node: NodeId) -> usize {
    match tree.children(node) {
        None => 0,
        Some(children) => {
            1 + children
                .values()
                .map(|child| length(tree, *child))
                .max()
                .unwrap_or(0)
        }
    }
}

/// Counts the inner nodes of the subtree rooted in `node`.
pub fn count_symbol_nodes<S: IndexType, I: Symbol, O: Color>(
    tree: &AdsTree<S, I, O>,
    node: NodeId,
) -> usize {
    match tree.children(node) {
        None => 0,
        Some(children) => {
            1 + children
                .values()
                .map(|child| count_symbol_nodes(tree, *child))
                .sum::<usize>()
        }
    }
}

/// Collects all leaves of the subtree rooted in `root` in depth-first order.
pub fn collect_leaves<S: IndexType, I: Symbol, O: Color>(
    tree: &AdsTree<S, I, O>,
    root: NodeId,
) -> Vec<NodeId> {
    let mut leaves = vec![];
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match tree.children(node) {
            None => leaves.push(node),
            Some(children) => stack.extend(children.values().rev().copied()),
        }
    }
    leaves
}

/// Builds a chain of inner nodes for the symbols of `trace`, where the edges are labelled with the outputs
/// that are produced when reading `trace` from `state`. The last inner node has no children yet, it is
/// returned together with the tree.
///
/// Panics if `trace` is empty.
pub fn build_from_trace<M>(
    machine: &M,
    trace: &[SymbolOf<M>],
    state: M::StateIndex,
) -> (AdsOf<M>, NodeId)
where
    M: Transducer,
{
    let (first, rest) = trace
        .split_first()
        .expect("cannot build a trace for the empty word");
    let mut tree = AdsTree::symbol(*first);
    let mut tail = tree.root();
    let mut previous = *first;
    let mut current = state;

    for &symbol in rest {
        let output = machine.output(current, previous);
        tail = tree.push_symbol(tail, output, symbol);
        current = machine.successor(current, previous);
        previous = symbol;
    }

    (tree, tail)
}

/// Reconstructs the input word that leads from the root to `node`, together with the outputs that have
/// to be observed along the way.
pub fn trace_for_node<S: IndexType, I: Symbol, O: Color>(
    tree: &AdsTree<S, I, O>,
    node: NodeId,
) -> (Vec<I>, Vec<O>) {
    let mut inputs = vec![];
    let mut outputs = vec![];
    let mut current = node;

    while let Some(parent) = tree.parent(current) {
        inputs.push(
            tree.symbol_of(parent)
                .expect("parents are always inner nodes"),
        );
        outputs.push(output_for_successor(tree, parent, current));
        current = parent;
    }

    inputs.reverse();
    outputs.reverse();
    (inputs, outputs)
}

/// Returns the output that leads from `node` to its child `successor`.
///
/// Panics if `successor` is not a child of `node`.
pub fn output_for_successor<S: IndexType, I: Symbol, O: Color>(
    tree: &AdsTree<S, I, O>,
    node: NodeId,
    successor: NodeId,
) -> O {
    assert_eq!(
        tree.parent(successor),
        Some(node),
        "no parent relationship between {node:?} and {successor:?}"
    );
    tree.children(node)
        .and_then(|children| {
            children
                .iter()
                .find_map(|(output, child)| (*child == successor).then(|| output.clone()))
        })
        .unwrap_or_else(|| panic!("{successor:?} is not a child of {node:?}"))
}

/// Computes an upper bound for the length of a splitting word, based on
///
/// I.V. Kogan. "Estimated Length of a Minimal Simple Conditional Diagnostic Experiment". In: Automation
/// and Remote Control 34 (1973)
///
/// Here `n` is the number of states of the automaton, `i` is the number of states that should be
/// distinguished by the current splitting word and `m` is the number of states that should originally be
/// distinguished. For `m == 2`, the bound is simply `n`, otherwise it is `C(n, i) - C(m - 1, i - 1) - 1`.
/// The value saturates at zero and at [`u64::MAX`].
pub fn max_splitting_word_length(n: usize, i: usize, m: usize) -> u64 {
    if m == 2 {
        return n as u64;
    }

    let subtrahend = match (m.checked_sub(1), i.checked_sub(1)) {
        (Some(m), Some(i)) => math::binomial(m, i),
        _ => 0,
    };
    let bound = math::binomial(n, i)
        .saturating_sub(subtrahend)
        .saturating_sub(1);
    u64::try_from(bound).unwrap_or(u64::MAX)
}

/// Returns true if the traces of all leaves are pairwise distinct and every leaf's trace matches the
/// behaviour of `machine` from the leaf's state. Such a tree distinguishes all states that its leaves
/// name.
pub fn is_valid<M>(machine: &M, tree: &AdsOf<M>) -> bool
where
    M: Transducer,
{
    let mut seen = math::Set::default();
    tree.leaves().into_iter().all(|leaf| {
        let (inputs, outputs) = trace_for_node(tree, leaf);
        let Some(state) = tree.state(leaf) else {
            return false;
        };
        machine.output_word(state, &inputs) == outputs
            && seen.insert(outputs)
            && tree.identify(machine, state) == Some(state)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn splitting_word_bound() {
        assert_eq!(max_splitting_word_length(7, 2, 2), 7);
        assert_eq!(max_splitting_word_length(5, 3, 4), 6);
        assert_eq!(max_splitting_word_length(6, 4, 6), 4);
        assert_eq!(max_splitting_word_length(3, 3, 3), 0);
        assert_eq!(max_splitting_word_length(128, 64, 3), u64::MAX);
    }

    #[test]
    fn traces() {
        let mm: MealyMachine = MealyBuilder::default()
            .with_transitions([
                (0, 'a', 0, 1),
                (0, 'b', 1, 0),
                (1, 'a', 0, 0),
                (1, 'b', 0, 1),
            ])
            .into_mealy()
            .unwrap();

        let (mut tree, tail) = build_from_trace(&mm, &['b', 'a', 'b'], 0);
        assert_eq!(tree.depth(), 3);
        let leaf = tree.push_leaf(tail, 0, 0);
        assert_eq!(
            trace_for_node(&tree, leaf),
            (vec!['b', 'a', 'b'], vec![1, 0, 0])
        );
        assert_eq!(collect_leaves(&tree, tree.root()), vec![leaf]);
        assert_eq!(count_symbol_nodes(&tree, tree.root()), 3);
        assert!(is_valid(&mm, &tree));
    }
}
