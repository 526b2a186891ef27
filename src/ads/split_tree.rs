use crate::{
    math::{Map, OrderedMap, OrderedSet},
    mealy::{OutputOf, StateOf, SymbolOf},
    Color, IndexType,
};

/// The [`SplitNode`]s that are used when computing an ADS for the transducer `M`.
pub(crate) type SplitOf<M> = SplitNode<StateOf<M>, SymbolOf<M>, OutputOf<M>>;

/// Index of a [`SplitNode`] in a [`SplitTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub(crate) struct SplitId(usize);

/// A block of states that is refined by applying `sequence`. Once `sequence` is set, the states are
/// distributed among `successors` according to the output they produce. What `mapping` means depends
/// on the algorithm using the node. Searches map every state of `partition` to the target state that
/// it represents, whereas the Lee-Yannakakis refinement maps it to the state reached after `sequence`.
#[derive(Clone, Debug)]
pub(crate) struct SplitNode<S, I, O> {
    pub(crate) partition: OrderedSet<S>,
    pub(crate) mapping: Map<S, S>,
    pub(crate) successors: OrderedMap<O, SplitId>,
    pub(crate) sequence: Vec<I>,
}

impl<S: IndexType, I, O> Default for SplitNode<S, I, O> {
    fn default() -> Self {
        Self {
            partition: OrderedSet::new(),
            mapping: Map::default(),
            successors: OrderedMap::new(),
            sequence: vec![],
        }
    }
}

impl<S: IndexType, I, O> SplitNode<S, I, O> {
    /// Creates a node for `states` in which every state represents itself.
    pub(crate) fn identity<It: IntoIterator<Item = S>>(states: It) -> Self {
        let mut node = Self::default();
        for state in states {
            node.insert(state, state);
        }
        node
    }

    /// Adds `state` to the partition, where it stands for `image`. Returns false if `state` was
    /// already present, in which case nothing changes.
    pub(crate) fn insert(&mut self, state: S, image: S) -> bool {
        if !self.partition.insert(state) {
            return false;
        }
        self.mapping.insert(state, image);
        true
    }

    /// Returns the image of `state` under the mapping.
    ///
    /// Panics if `state` has no image.
    pub(crate) fn image(&self, state: S) -> S {
        *self
            .mapping
            .get(&state)
            .unwrap_or_else(|| panic!("state {state:?} is not mapped"))
    }

    pub(crate) fn len(&self) -> usize {
        self.partition.len()
    }

    /// Gives the smallest state of the partition.
    pub(crate) fn first(&self) -> S {
        *self
            .partition
            .first()
            .expect("split nodes are never empty")
    }
}

/// A tree of [`SplitNode`]s that are stored in an arena, the root is the node with index 0.
#[derive(Clone, Debug)]
pub(crate) struct SplitTree<S, I, O> {
    nodes: Vec<SplitNode<S, I, O>>,
}

impl<S: IndexType, I: Clone, O: Color> SplitTree<S, I, O> {
    /// Creates a tree whose root contains `states`.
    pub(crate) fn new<It: IntoIterator<Item = S>>(states: It) -> Self {
        Self {
            nodes: vec![SplitNode::identity(states)],
        }
    }

    pub(crate) fn root(&self) -> SplitId {
        SplitId(0)
    }

    pub(crate) fn node(&self, id: SplitId) -> &SplitNode<S, I, O> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: SplitId) -> &mut SplitNode<S, I, O> {
        &mut self.nodes[id.0]
    }

    /// Creates a new node containing `partition` and registers it as the successor of `parent` for
    /// `output`.
    pub(crate) fn add_successor(
        &mut self,
        parent: SplitId,
        output: O,
        partition: OrderedSet<S>,
    ) -> SplitId {
        let id = SplitId(self.nodes.len());
        self.nodes.push(SplitNode {
            partition,
            ..Default::default()
        });
        let previous = self.nodes[parent.0].successors.insert(output, id);
        assert!(previous.is_none(), "successor for output exists already");
        id
    }

    /// Finds the deepest node whose partition contains every state of `set`, children are searched
    /// in the order of their outputs.
    pub(crate) fn find_lowest_subset_node(&self, set: &OrderedSet<S>) -> Option<SplitId> {
        self.lowest_below(self.root(), set)
    }

    fn lowest_below(&self, node: SplitId, set: &OrderedSet<S>) -> Option<SplitId> {
        self.node(node)
            .successors
            .values()
            .find_map(|child| self.lowest_below(*child, set))
            .or_else(|| self.node(node).partition.is_superset(set).then_some(node))
    }
}
