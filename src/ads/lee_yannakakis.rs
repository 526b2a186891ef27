//! The algorithm of Lee and Yannakakis decides in polynomial time whether an adaptive distinguishing
//! sequence for *all* states of a machine exists and computes one if this is the case.
//!
//! D. Lee and M. Yannakakis. "Testing finite-state machines: state identification and verification". In:
//! IEEE Transactions on Computers 43.3 (1994)
//!
//! The algorithm refines a partition of the states, which is organized as a split tree, until every
//! block contains a single state. In every round the blocks of maximal cardinality are refined with one
//! of three kinds of inputs:
//! - an input for which the states of a block produce different outputs (a-valid),
//! - an input that leads the states of a block into different blocks of the current partition (b-valid),
//! - a word that leads the states of a block into a block which is a- or b-valid (c-valid).
//!
//! In all cases, no two states of the block may be merged while reading the input. If a block has
//! none of these inputs, there is no ADS for the machine.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    alphabet::Alphabet,
    math::{Bijection, Map, OrderedMap, OrderedSet, Set},
    mealy::{AdsOf, OutputOf, StateOf, SymbolOf},
    Show, Transducer,
};

use super::{
    split_tree::{SplitId, SplitTree},
    util, AdsTree,
};

type SplitTreeOf<M> = SplitTree<StateOf<M>, SymbolOf<M>, OutputOf<M>>;

/// The outcome of [`compute`]. Either an ADS for all states was found, or there is a set of states
/// for which the refinement got stuck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyResult<S, I, O> {
    ads: Option<AdsTree<S, I, O>>,
    indistinguishable: OrderedSet<S>,
}

impl<S, I, O> LyResult<S, I, O> {
    /// Returns true if an ADS was found.
    pub fn is_present(&self) -> bool {
        self.ads.is_some()
    }

    /// Gives a reference to the computed ADS, if it exists.
    pub fn ads(&self) -> Option<&AdsTree<S, I, O>> {
        self.ads.as_ref()
    }

    /// Consumes `self` and returns the computed ADS, if it exists.
    pub fn into_ads(self) -> Option<AdsTree<S, I, O>> {
        self.ads
    }

    /// The states of the blocks that could not be refined any further. This is empty if an ADS was found.
    pub fn indistinguishable_states(&self) -> &OrderedSet<S> {
        &self.indistinguishable
    }
}

/// Attempts to compute an ADS for all states of `machine`, using the symbols of `alphabet`.
///
/// Panics if `alphabet` contains a symbol on which `machine` has no transitions, [`crate::ads::compute`]
/// reports this as [`AdsError::UnknownSymbol`](crate::ads::AdsError::UnknownSymbol) instead.
pub fn compute<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
) -> LyResult<StateOf<M>, SymbolOf<M>, OutputOf<M>> {
    if machine.size() == 0 {
        return LyResult {
            ads: None,
            indistinguishable: OrderedSet::new(),
        };
    }

    match refine(machine, alphabet) {
        Ok(tree) => {
            let states: OrderedSet<_> = machine.state_indices().collect();
            let identity = states.iter().map(|&state| (state, state)).collect();
            LyResult {
                ads: Some(extract(machine, &tree, &states, &identity)),
                indistinguishable: OrderedSet::new(),
            }
        }
        Err(indistinguishable) => {
            debug!(
                "no ADS exists, cannot refine {}",
                indistinguishable.show()
            );
            LyResult {
                ads: None,
                indistinguishable,
            }
        }
    }
}

/// The blocks of one round, sorted by the kind of input that refines them.
struct Classification<I> {
    a_valid: Vec<(SplitId, I)>,
    b_valid: Vec<(SplitId, I)>,
    c_valid: Vec<(SplitId, Vec<I>)>,
    invalid: Vec<SplitId>,
}

impl<I> Default for Classification<I> {
    fn default() -> Self {
        Self {
            a_valid: vec![],
            b_valid: vec![],
            c_valid: vec![],
            invalid: vec![],
        }
    }
}

/// Records which blocks of the partition can be reached from which other blocks with a single valid
/// input. Nodes are the indices of the blocks.
struct ImplicationGraph<I> {
    edges: Vec<Vec<(usize, I)>>,
}

impl<I: Copy> ImplicationGraph<I> {
    fn new(size: usize) -> Self {
        Self {
            edges: (0..size).map(|_| vec![]).collect(),
        }
    }

    fn connect(&mut self, source: usize, target: usize, symbol: I) {
        self.edges[source].push((target, symbol));
    }

    /// Performs a breadth-first search from `source` and returns the labels of a shortest path to the
    /// first node that satisfies `is_target`.
    fn shortest_word<F: Fn(usize) -> bool>(&self, source: usize, is_target: F) -> Option<Vec<I>> {
        let mut predecessor: Vec<Option<(usize, I)>> = vec![None; self.edges.len()];
        let mut seen = vec![false; self.edges.len()];
        let mut queue = VecDeque::from([source]);
        seen[source] = true;

        while let Some(node) = queue.pop_front() {
            if is_target(node) {
                let mut word = vec![];
                let mut current = node;
                while let Some((previous, symbol)) = predecessor[current] {
                    word.push(symbol);
                    current = previous;
                }
                word.reverse();
                return Some(word);
            }
            for &(target, symbol) in &self.edges[node] {
                if !seen[target] {
                    seen[target] = true;
                    predecessor[target] = Some((node, symbol));
                    queue.push_back(target);
                }
            }
        }
        None
    }
}

/// Returns true if no two states of `block` that produce the same output on `symbol` reach the same
/// state.
fn is_valid_input<M: Transducer>(
    machine: &M,
    symbol: SymbolOf<M>,
    block: &OrderedSet<StateOf<M>>,
) -> bool {
    let mut seen = Set::default();
    block.iter().all(|&state| {
        seen.insert((
            machine.output(state, symbol),
            machine.successor(state, symbol),
        ))
    })
}

/// Builds the split tree, returns the states of the blocks that cannot be refined if it gets stuck.
fn refine<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
) -> Result<SplitTreeOf<M>, OrderedSet<StateOf<M>>> {
    let mut tree: SplitTreeOf<M> = SplitTree::new(machine.state_indices());
    let mut frontier = OrderedSet::from([tree.root()]);

    while frontier.iter().any(|id| tree.node(*id).len() > 1) {
        let cardinality = frontier
            .iter()
            .map(|id| tree.node(*id).len())
            .max()
            .unwrap_or(0);
        let round: Vec<_> = frontier
            .iter()
            .copied()
            .filter(|id| tree.node(*id).len() == cardinality)
            .collect();
        trace!(
            "refining {} blocks of size {cardinality} out of {}",
            round.len(),
            frontier.len()
        );

        let classification = classify(machine, alphabet, &tree, &frontier, &round);
        if !classification.invalid.is_empty() {
            return Err(classification
                .invalid
                .iter()
                .flat_map(|id| tree.node(*id).partition.iter().copied())
                .collect());
        }

        for (id, symbol) in classification.a_valid {
            let children = split_by_output(machine, &mut tree, id, symbol);
            frontier.remove(&id);
            frontier.extend(children);
        }
        for (id, word) in classification
            .b_valid
            .into_iter()
            .map(|(id, symbol)| (id, vec![symbol]))
            .chain(classification.c_valid)
        {
            let children = split_by_word(machine, &mut tree, id, word);
            frontier.remove(&id);
            frontier.extend(children);
        }
    }

    Ok(tree)
}

fn classify<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
    tree: &SplitTreeOf<M>,
    frontier: &OrderedSet<SplitId>,
    round: &[SplitId],
) -> Classification<SymbolOf<M>> {
    let mut block_of: Map<StateOf<M>, usize> = Map::default();
    let mut blocks: Bijection<usize, SplitId> = Bijection::new();
    for (index, &id) in frontier.iter().enumerate() {
        for &state in &tree.node(id).partition {
            let previous = block_of.insert(state, index);
            assert!(previous.is_none(), "frontier is not a partition");
        }
        blocks.insert(index, id);
    }

    let mut classification = Classification::default();
    let mut graph = ImplicationGraph::new(blocks.len());
    let mut resolved = Set::default();
    let mut pending = vec![];

    'blocks: for &id in round {
        let partition = &tree.node(id).partition;
        let block = *blocks.get_by_right(&id).expect("block is part of the frontier");
        let valid: Vec<_> = alphabet
            .universe()
            .filter(|&symbol| is_valid_input(machine, symbol, partition))
            .collect();

        for &symbol in &valid {
            let outputs: Set<_> = partition
                .iter()
                .map(|&state| machine.output(state, symbol))
                .collect();
            if outputs.len() > 1 {
                classification.a_valid.push((id, symbol));
                resolved.insert(block);
                continue 'blocks;
            }
        }

        for &symbol in &valid {
            let targets: Set<_> = partition
                .iter()
                .map(|&state| block_of[&machine.successor(state, symbol)])
                .collect();
            if targets.len() > 1 {
                classification.b_valid.push((id, symbol));
                resolved.insert(block);
                continue 'blocks;
            }
        }

        // every valid input now leads the whole block into a single block
        let representative = *partition.first().expect("blocks are never empty");
        let mut implied = false;
        for &symbol in &valid {
            let target = block_of[&machine.successor(representative, symbol)];
            if target != block {
                graph.connect(block, target, symbol);
                implied = true;
            }
        }
        if implied {
            pending.push(id);
        } else {
            classification.invalid.push(id);
        }
    }

    for id in pending {
        let block = *blocks.get_by_right(&id).expect("block is part of the frontier");
        match graph.shortest_word(block, |target| resolved.contains(&target)) {
            Some(word) => classification.c_valid.push((id, word)),
            None => classification.invalid.push(id),
        }
    }

    classification
}

/// Refines the node `id` with an a-valid `symbol`, returns the newly created children.
fn split_by_output<M: Transducer>(
    machine: &M,
    tree: &mut SplitTreeOf<M>,
    id: SplitId,
    symbol: SymbolOf<M>,
) -> Vec<SplitId> {
    let partition = tree.node(id).partition.clone();
    let mut groups: OrderedMap<OutputOf<M>, OrderedSet<StateOf<M>>> = OrderedMap::new();
    for &state in &partition {
        groups
            .entry(machine.output(state, symbol))
            .or_default()
            .insert(state);
    }

    let node = tree.node_mut(id);
    node.sequence = vec![symbol];
    node.mapping = partition
        .iter()
        .map(|&state| (state, machine.successor(state, symbol)))
        .collect();

    groups
        .into_iter()
        .map(|(output, block)| tree.add_successor(id, output, block))
        .collect()
}

/// Refines the node `id` with a b- or c-valid `word`. The states reached via `word` are contained in a
/// node that was already refined, the sequence of that node is appended to `word` and its children
/// determine the children of `id`.
fn split_by_word<M: Transducer>(
    machine: &M,
    tree: &mut SplitTreeOf<M>,
    id: SplitId,
    word: Vec<SymbolOf<M>>,
) -> Vec<SplitId> {
    let partition = tree.node(id).partition.clone();
    let origin: OrderedMap<StateOf<M>, StateOf<M>> = partition
        .iter()
        .map(|&state| (machine.reached(state, &word), state))
        .collect();
    let reached: OrderedSet<_> = origin.keys().copied().collect();
    let lowest = tree
        .find_lowest_subset_node(&reached)
        .expect("the root contains every state");

    let lower = tree.node(lowest);
    assert!(
        !lower.sequence.is_empty(),
        "word leads into a block that is not refined yet"
    );
    let sequence: Vec<_> = word.iter().chain(lower.sequence.iter()).copied().collect();
    let mapping = partition
        .iter()
        .map(|&state| (state, lower.image(machine.reached(state, &word))))
        .collect();
    let blocks: Vec<_> = lower
        .successors
        .iter()
        .filter_map(|(output, child)| {
            let preimage: OrderedSet<_> = tree
                .node(*child)
                .partition
                .iter()
                .filter_map(|state| origin.get(state).copied())
                .collect();
            (!preimage.is_empty()).then(|| (output.clone(), preimage))
        })
        .collect();

    let node = tree.node_mut(id);
    node.sequence = sequence;
    node.mapping = mapping;

    blocks
        .into_iter()
        .map(|(output, block)| tree.add_successor(id, output, block))
        .collect()
}

/// Assembles the ADS for the states in `current` from the split tree, where `current_to_initial` maps
/// every state of `current` to the state from which the experiment started.
fn extract<M: Transducer>(
    machine: &M,
    tree: &SplitTreeOf<M>,
    current: &OrderedSet<StateOf<M>>,
    current_to_initial: &Map<StateOf<M>, StateOf<M>>,
) -> AdsOf<M> {
    let first = *current.first().expect("cannot extract an ADS for no states");
    if current.len() == 1 {
        return AdsTree::leaf(current_to_initial[&first]);
    }

    let lowest = tree
        .find_lowest_subset_node(current)
        .expect("the root contains every state");
    let node = tree.node(lowest);
    let (mut ads, tail) = util::build_from_trace(machine, &node.sequence, first);

    for (output, child) in &node.successors {
        let intersection: Vec<_> = tree
            .node(*child)
            .partition
            .intersection(current)
            .copied()
            .collect();
        if intersection.is_empty() {
            continue;
        }
        let next_to_initial: Map<_, _> = intersection
            .iter()
            .map(|&state| (node.image(state), current_to_initial[&state]))
            .collect();
        let next: OrderedSet<_> = next_to_initial.keys().copied().collect();
        ads.graft(
            tail,
            output.clone(),
            extract(machine, tree, &next, &next_to_initial),
        );
    }
    ads
}
