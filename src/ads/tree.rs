use std::collections::VecDeque;

use owo_colors::OwoColorize;

use crate::{
    alphabet::{Alphabet, Symbol},
    math::OrderedMap,
    Color, IndexType, Show, Transducer,
};

use super::util;

/// Refers to a node of an [`AdsTree`]. Node ids are only meaningful for the tree that handed them out.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the position of the node in the arena of its tree.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N({})", self.0)
    }
}

/// A node of an [`AdsTree`], which is either a leaf that names the identified state or an inner node
/// that prescribes the next input symbol and branches on the output that is observed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AdsNode<S, I, O> {
    /// A terminal node, the experiment has identified `state`.
    Leaf {
        /// The parent of the node, `None` for the root.
        parent: Option<NodeId>,
        /// The target state that is identified when reaching this node.
        state: S,
    },
    /// An inner node, the experiment continues by applying `symbol`.
    Symbol {
        /// The parent of the node, `None` for the root.
        parent: Option<NodeId>,
        /// The input symbol that is applied next.
        symbol: I,
        /// Maps each possible output to the node that the experiment proceeds with.
        children: OrderedMap<O, NodeId>,
    },
}

impl<S, I, O> AdsNode<S, I, O> {
    /// Returns the parent of the node, if it exists.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            AdsNode::Leaf { parent, .. } | AdsNode::Symbol { parent, .. } => *parent,
        }
    }

    fn set_parent(&mut self, new_parent: Option<NodeId>) {
        match self {
            AdsNode::Leaf { parent, .. } | AdsNode::Symbol { parent, .. } => *parent = new_parent,
        }
    }

    /// Returns true if the node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, AdsNode::Leaf { .. })
    }
}

/// An adaptive distinguishing sequence in the form of a decision tree. The nodes are stored in an arena
/// and refer to each other through [`NodeId`]s, every node knows its parent, so that the trace leading to
/// a node can be reconstructed. The root is always the first node in the arena.
///
/// Starting in the root, an experiment applies the symbol of the current node to the (unknown) state of a
/// [`Transducer`], observes the output and continues with the child that is associated with this output.
/// Once a leaf is reached, its state is the state that the transducer was in at the very beginning.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AdsTree<S, I, O> {
    nodes: Vec<AdsNode<S, I, O>>,
}

impl<S: IndexType, I: Symbol, O: Color> AdsTree<S, I, O> {
    /// Creates a tree that consists of a single leaf, which identifies `state`.
    pub fn leaf(state: S) -> Self {
        Self {
            nodes: vec![AdsNode::Leaf {
                parent: None,
                state,
            }],
        }
    }

    /// Creates a tree whose root is an inner node for `symbol` that does not have any children yet.
    pub(crate) fn symbol(symbol: I) -> Self {
        Self {
            nodes: vec![AdsNode::Symbol {
                parent: None,
                symbol,
                children: OrderedMap::new(),
            }],
        }
    }

    /// Returns the id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the total number of nodes, that is inner nodes and leaves.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always returns false, as a tree has at least a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gives a reference to the node with the given id.
    pub fn node(&self, node: NodeId) -> &AdsNode<S, I, O> {
        assert!(node.0 < self.nodes.len(), "invalid node index");
        &self.nodes[node.0]
    }

    /// Returns the parent of `node`, if it exists.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent()
    }

    /// Returns true if `node` is a leaf.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.node(node).is_leaf()
    }

    /// Returns the state that is identified by `node`, or `None` if it is an inner node.
    pub fn state(&self, node: NodeId) -> Option<S> {
        match self.node(node) {
            AdsNode::Leaf { state, .. } => Some(*state),
            AdsNode::Symbol { .. } => None,
        }
    }

    /// Returns the input symbol of `node`, or `None` if it is a leaf.
    pub fn symbol_of(&self, node: NodeId) -> Option<I> {
        match self.node(node) {
            AdsNode::Symbol { symbol, .. } => Some(*symbol),
            AdsNode::Leaf { .. } => None,
        }
    }

    /// Returns the map from outputs to children of `node`, or `None` if it is a leaf.
    pub fn children(&self, node: NodeId) -> Option<&OrderedMap<O, NodeId>> {
        match self.node(node) {
            AdsNode::Symbol { children, .. } => Some(children),
            AdsNode::Leaf { .. } => None,
        }
    }

    /// Returns the child of `node` that the experiment continues with when observing `output`.
    pub fn child(&self, node: NodeId, output: &O) -> Option<NodeId> {
        self.children(node)?.get(output).copied()
    }

    /// Lists the nodes of the tree in level-order, starting with the root.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root()]);
        while let Some(node) = queue.pop_front() {
            result.push(node);
            if let Some(children) = self.children(node) {
                queue.extend(children.values().copied());
            }
        }
        result
    }

    /// Collects the leaves of the tree, see [`util::collect_leaves`].
    pub fn leaves(&self) -> Vec<NodeId> {
        util::collect_leaves(self, self.root())
    }

    /// Returns the states that are identified by the leaves of the tree.
    pub fn identified_states(&self) -> Vec<S> {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| self.state(leaf))
            .collect()
    }

    /// The length of the longest input word that the experiment may apply, see [`util::length`].
    pub fn depth(&self) -> usize {
        util::length(self, self.root())
    }

    /// The number of inner nodes, see [`util::count_symbol_nodes`].
    pub fn size(&self) -> usize {
        util::count_symbol_nodes(self, self.root())
    }

    /// Runs the experiment on `machine`, starting in `state`. Returns the leaf in which the
    /// experiment ends, or `None` if some observed output has no corresponding child.
    pub fn execute<M>(&self, machine: &M, state: S) -> Option<NodeId>
    where
        M: Transducer<StateIndex = S, Output = O>,
        M::Alphabet: Alphabet<Symbol = I>,
    {
        let mut node = self.root();
        let mut current = state;
        while let Some(symbol) = self.symbol_of(node) {
            let output = machine.output(current, symbol);
            node = self.child(node, &output)?;
            current = machine.successor(current, symbol);
        }
        Some(node)
    }

    /// Runs the experiment on `machine` starting in `state` and returns the state that it identifies.
    /// For a valid tree, this is `state` itself whenever `state` is one of the target states.
    pub fn identify<M>(&self, machine: &M, state: S) -> Option<S>
    where
        M: Transducer<StateIndex = S, Output = O>,
        M::Alphabet: Alphabet<Symbol = I>,
    {
        self.execute(machine, state)
            .and_then(|leaf| self.state(leaf))
    }

    /// Appends a new inner node for `symbol` as the child of `parent` for `output`.
    pub(crate) fn push_symbol(&mut self, parent: NodeId, output: O, symbol: I) -> NodeId {
        self.push(
            parent,
            output,
            AdsNode::Symbol {
                parent: Some(parent),
                symbol,
                children: OrderedMap::new(),
            },
        )
    }

    /// Appends a new leaf for `state` as the child of `parent` for `output`.
    pub(crate) fn push_leaf(&mut self, parent: NodeId, output: O, state: S) -> NodeId {
        self.push(
            parent,
            output,
            AdsNode::Leaf {
                parent: Some(parent),
                state,
            },
        )
    }

    /// Moves all nodes of `subtree` into `self` and makes its root the child of `parent` for `output`.
    /// Returns the new id of the root of `subtree`.
    pub(crate) fn graft(&mut self, parent: NodeId, output: O, subtree: Self) -> NodeId {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);
        self.nodes.extend(subtree.nodes.into_iter().map(|mut node| {
            node.set_parent(Some(node.parent().map_or(parent, shift)));
            if let AdsNode::Symbol { children, .. } = &mut node {
                children.values_mut().for_each(|child| *child = shift(*child));
            }
            node
        }));
        let root = NodeId(offset);
        self.attach(parent, output, root);
        root
    }

    fn push(&mut self, parent: NodeId, output: O, node: AdsNode<S, I, O>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.attach(parent, output, id);
        id
    }

    fn attach(&mut self, parent: NodeId, output: O, child: NodeId) {
        assert!(parent.0 < self.nodes.len(), "invalid node index");
        let AdsNode::Symbol { children, .. } = &mut self.nodes[parent.0] else {
            panic!("cannot add a child to leaf {parent:?}");
        };
        if let Some(existing) = children.insert(output.clone(), child) {
            panic!(
                "output {output:?} leads to {existing:?} and {child:?}, the transducer is not deterministic"
            );
        }
    }

    fn show_node(&self, node: NodeId, indent: usize, out: &mut String) {
        match self.node(node) {
            AdsNode::Leaf { state, .. } => {
                out.push_str(&format!("{}\n", state.show().green()));
            }
            AdsNode::Symbol {
                symbol, children, ..
            } => {
                out.push_str(&format!("{}\n", symbol.show().bold()));
                for (output, child) in children {
                    out.push_str(&format!("{}{} -> ", "  ".repeat(indent + 1), output.show()));
                    self.show_node(*child, indent + 1, out);
                }
            }
        }
    }
}

impl<S: IndexType, I: Symbol, O: Color> Show for AdsTree<S, I, O> {
    fn show(&self) -> String {
        let mut out = String::new();
        self.show_node(self.root(), 0, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn cycle() -> MealyMachine {
        MealyBuilder::default()
            .with_transitions([(0, 'a', 0, 1), (1, 'a', 1, 2), (2, 'a', 2, 0)])
            .into_mealy()
            .unwrap()
    }

    #[test]
    fn build_and_execute() {
        let mm = cycle();
        let mut tree = AdsTree::symbol('a');
        let root = tree.root();
        let zero = tree.push_leaf(root, 0, 0usize);
        tree.push_leaf(root, 1, 1);
        tree.push_leaf(root, 2, 2);

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.parent(zero), Some(root));
        assert_eq!(tree.child(root, &0), Some(zero));
        assert_eq!(tree.symbol_of(root), Some('a'));
        assert_eq!(tree.state(zero), Some(0));
        for q in mm.state_indices() {
            assert_eq!(tree.identify(&mm, q), Some(q));
        }
        assert_eq!(tree.nodes().len(), 4);
        assert_eq!(tree.identified_states(), vec![0, 1, 2]);
    }

    #[test]
    fn grafting_shifts_indices() {
        let mut lower = AdsTree::symbol('b');
        let lower_root = lower.root();
        lower.push_leaf(lower_root, 0, 3usize);
        lower.push_leaf(lower_root, 1, 4);

        let mut tree = AdsTree::symbol('a');
        let root = tree.root();
        tree.push_leaf(root, 0, 0);
        let grafted = tree.graft(root, 1, lower);

        assert_eq!(grafted, NodeId(2));
        assert_eq!(tree.parent(grafted), Some(root));
        let leaf = tree.child(grafted, &1).unwrap();
        assert_eq!(tree.state(leaf), Some(4));
        assert_eq!(tree.parent(leaf), Some(grafted));
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.size(), 2);
    }

    #[test]
    #[should_panic(expected = "not deterministic")]
    fn duplicate_outputs_panic() {
        let mut tree: AdsTree<usize, char, Int> = AdsTree::symbol('a');
        let root = tree.root();
        tree.push_leaf(root, 0, 0);
        tree.push_leaf(root, 0, 1);
    }

    #[test]
    fn show_tree() {
        let mut tree: AdsTree<usize, char, Int> = AdsTree::symbol('a');
        let root = tree.root();
        tree.push_leaf(root, 0, 0);
        tree.push_leaf(root, 1, 1);
        let shown = tree.show();
        assert!(shown.contains("0 -> "));
        assert!(shown.contains("1 -> "));
    }
}
