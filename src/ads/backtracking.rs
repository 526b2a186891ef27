//! Search based computation of adaptive distinguishing sequences for arbitrary sets of states.
//!
//! The satisficing search [`compute`] grows candidate splitting words in a breadth-first manner. As soon as
//! a word is found whose last symbol separates the current states into several output classes, it
//! recursively computes trees for all of the classes. The length of candidates is bounded by
//! [`util::max_splitting_word_length`]. The result is not necessarily minimal in any sense.
//!
//! The optimal search [`compute_optimal`] explores the complete successor tree of the set of states and
//! keeps the best solution according to a [`CostAggregator`]. This is much more expensive, but the
//! produced tree is minimal with respect to the chosen measure.

use std::{collections::VecDeque, rc::Rc};

use bit_set::BitSet;
use tracing::{debug, trace};

use crate::{
    alphabet::Alphabet,
    math::{Map, OrderedMap, OrderedSet, Set},
    mealy::{AdsOf, OutputOf, StateOf, SymbolOf},
    Show, Transducer,
};

use super::{
    collect_targets, compute_node,
    split_tree::{SplitNode, SplitOf},
    util, AdsError, AdsTree,
};

/// Determines how the costs of the subtrees of a node are combined in [`compute_optimal`]. The cost of
/// a leaf is zero and every inner node adds one to the combined cost of its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CostAggregator {
    /// Minimizes the depth of the tree, i.e. the length of the longest word that the experiment applies.
    MinLength,
    /// Minimizes the number of inner nodes of the tree.
    MinSize,
}

impl CostAggregator {
    /// Combines the accumulated cost of some siblings with the `cost` of another sibling.
    ///
    /// ```
    /// use automata_ads::prelude::*;
    /// assert_eq!(CostAggregator::MinLength.apply(2, 3), 3);
    /// assert_eq!(CostAggregator::MinSize.apply(2, 3), 5);
    /// ```
    pub fn apply(&self, accumulated: usize, cost: usize) -> usize {
        match self {
            CostAggregator::MinLength => accumulated.max(cost),
            CostAggregator::MinSize => accumulated.saturating_add(cost),
        }
    }
}

/// Computes an ADS for `targets` by searching for splitting words of increasing length. Returns
/// `Ok(None)` if no ADS exists for `targets`.
///
/// Fails if `targets` is empty or contains a state that does not belong to `machine`.
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
    match targets.first() {
        None => Err(AdsError::EmptyTargets),
        Some(&state) if targets.len() == 1 => Ok(Some(AdsTree::leaf(state))),
        Some(_) => Ok(search(machine, alphabet, &SplitNode::identity(targets))),
    }
}

/// Runs the satisficing search for the states of `node`, the leaves of the result name the images of
/// the states under the node's mapping.
pub(crate) fn search<M: Transducer>(
    machine: &M,
    alphabet: &M::Alphabet,
    node: &SplitOf<M>,
) -> Option<AdsOf<M>> {
    SatisficingSearch {
        machine,
        alphabet,
        original_size: node.len(),
    }
    .search(node)
}

struct SatisficingSearch<'a, M: Transducer> {
    machine: &'a M,
    alphabet: &'a M::Alphabet,
    original_size: usize,
}

impl<'a, M: Transducer> SatisficingSearch<'a, M> {
    fn search(&self, node: &SplitOf<M>) -> Option<AdsOf<M>> {
        let bound =
            util::max_splitting_word_length(self.machine.size(), node.len(), self.original_size);
        let mut cache: Set<BitSet> = Set::default();
        let mut candidates: VecDeque<Vec<SymbolOf<M>>> = VecDeque::from([vec![]]);

        while let Some(prefix) = candidates.pop_front() {
            let current_to_initial: OrderedMap<StateOf<M>, StateOf<M>> = node
                .partition
                .iter()
                .map(|&state| (self.machine.reached(state, &prefix), state))
                .collect();
            let configuration = self.bits(current_to_initial.keys().copied());
            if cache.contains(&configuration) {
                trace!("configuration after {} was explored already", prefix.show());
                continue;
            }

            'symbols: for symbol in self.alphabet.universe() {
                let Some(successors) = self.split(node, &current_to_initial, symbol) else {
                    continue;
                };

                if successors.len() > 1 {
                    let mut results = OrderedMap::new();
                    for (output, child) in successors {
                        let key = self.bits(child.partition.iter().copied());
                        if cache.contains(&key) {
                            continue 'symbols;
                        }
                        let result = if child.len() > 2 {
                            self.search(&child)
                        } else {
                            compute_node(self.machine, self.alphabet, &child)
                        };
                        let Some(subtree) = result else {
                            cache.insert(key);
                            continue 'symbols;
                        };
                        results.insert(output, subtree);
                    }

                    let mut word = prefix.clone();
                    word.push(symbol);
                    trace!("found splitting word {}", word.show());
                    let (mut tree, tail) = util::build_from_trace(self.machine, &word, node.first());
                    for (output, subtree) in results {
                        tree.graft(tail, output, subtree);
                    }
                    return Some(tree);
                } else if (prefix.len() as u64) < bound {
                    let mut next = prefix.clone();
                    next.push(symbol);
                    candidates.push_back(next);
                }
            }

            cache.insert(configuration);
        }

        trace!("no splitting word of length at most {bound}");
        None
    }

    /// Partitions the successors of the current states under `symbol` by their output. Returns `None` if
    /// two states with the same output reach the same state, as then they can never be distinguished.
    fn split(
        &self,
        node: &SplitOf<M>,
        current_to_initial: &OrderedMap<StateOf<M>, StateOf<M>>,
        symbol: SymbolOf<M>,
    ) -> Option<OrderedMap<OutputOf<M>, SplitOf<M>>> {
        let mut successors: OrderedMap<OutputOf<M>, SplitOf<M>> = OrderedMap::new();
        for (&current, &initial) in current_to_initial {
            let next = self.machine.successor(current, symbol);
            let output = self.machine.output(current, symbol);
            if !successors
                .entry(output)
                .or_default()
                .insert(next, node.image(initial))
            {
                return None;
            }
        }
        Some(successors)
    }

    fn bits<I: Iterator<Item = StateOf<M>>>(&self, states: I) -> BitSet {
        states.map(|state| self.machine.state_id(state)).collect()
    }
}

/// Computes an ADS for `targets` that is minimal with respect to `aggregator`. Returns `Ok(None)` if no
/// ADS exists for `targets`.
///
/// Fails if `targets` is empty or contains a state that does not belong to `machine`.
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
    match targets.first() {
        None => return Err(AdsError::EmptyTargets),
        Some(&state) if targets.len() == 1 => return Ok(Some(AdsTree::leaf(state))),
        Some(_) => {}
    }

    let mut context = SearchContext {
        machine,
        alphabet,
        aggregator,
        memo: Map::default(),
    };
    let Some(solution) = context.explore(&targets, &Set::default(), usize::MAX) else {
        debug!("no ADS exists for {} states", targets.len());
        return Ok(None);
    };
    debug!(
        "optimal search explored {} subsets, cost is {}",
        context.memo.len(),
        solution.cost
    );

    let identity = targets.iter().map(|&state| (state, state)).collect();
    Ok(Some(context.construct(identity, &solution)))
}

/// A node of the successor tree that was determined to be the best choice for some set of states.
#[derive(Debug)]
struct SearchState<I, O> {
    symbol: Option<I>,
    successors: OrderedMap<O, Rc<SearchState<I, O>>>,
    cost: usize,
}

type SolutionOf<M> = Rc<SearchState<SymbolOf<M>, OutputOf<M>>>;

/// Holds the memoized results of the optimal search, it lives for a single call of [`compute_optimal`].
struct SearchContext<'a, M: Transducer> {
    machine: &'a M,
    alphabet: &'a M::Alphabet,
    aggregator: CostAggregator,
    memo: Map<OrderedSet<StateOf<M>>, Option<SolutionOf<M>>>,
}

impl<'a, M: Transducer> SearchContext<'a, M> {
    /// Finds the cheapest way of distinguishing `targets`, where `trace` contains the sets of states that
    /// were visited without splitting since the last split and only solutions with a cost strictly
    /// below `bound` are of interest.
    fn explore(
        &mut self,
        targets: &OrderedSet<StateOf<M>>,
        trace: &Set<OrderedSet<StateOf<M>>>,
        bound: usize,
    ) -> Option<SolutionOf<M>> {
        if let Some(cached) = self.memo.get(targets) {
            return cached.clone();
        }
        if trace.contains(targets) {
            return None;
        }
        if targets.len() == 1 {
            let solution = Rc::new(SearchState {
                symbol: None,
                successors: OrderedMap::new(),
                cost: 0,
            });
            self.memo.insert(targets.clone(), Some(Rc::clone(&solution)));
            return Some(solution);
        }
        if bound == 0 {
            return None;
        }

        let alphabet = self.alphabet;
        let mut converging = true;
        let mut best_cost = bound;
        let mut best = None;

        'symbols: for symbol in alphabet.universe() {
            let Some(successors) = self.split(targets, symbol) else {
                continue;
            };
            converging = false;

            let (cost, children) = if successors.len() > 1 {
                let mut children = OrderedMap::new();
                let mut cost = 0;
                for (output, block) in successors {
                    let Some(solution) = self.explore(&block, &Set::default(), best_cost) else {
                        continue 'symbols;
                    };
                    cost = self.aggregator.apply(cost, solution.cost);
                    if cost >= best_cost {
                        continue 'symbols;
                    }
                    children.insert(output, solution);
                }
                (cost, children)
            } else {
                let Some((output, block)) = successors.into_iter().next() else {
                    continue;
                };
                let mut extended = trace.clone();
                extended.insert(targets.clone());
                let Some(solution) = self.explore(&block, &extended, best_cost) else {
                    continue;
                };
                (solution.cost, OrderedMap::from([(output, solution)]))
            };

            if cost < best_cost {
                best_cost = cost;
                best = Some((symbol, children));
            }
        }

        if converging {
            trace!("states {} converge on every symbol", targets.show());
            self.memo.insert(targets.clone(), None);
            return None;
        }

        let (symbol, successors) = best?;
        let solution = Rc::new(SearchState {
            symbol: Some(symbol),
            successors,
            cost: best_cost + 1,
        });
        self.memo.insert(targets.clone(), Some(Rc::clone(&solution)));
        Some(solution)
    }

    fn split(
        &self,
        targets: &OrderedSet<StateOf<M>>,
        symbol: SymbolOf<M>,
    ) -> Option<OrderedMap<OutputOf<M>, OrderedSet<StateOf<M>>>> {
        let mut successors: OrderedMap<OutputOf<M>, OrderedSet<StateOf<M>>> = OrderedMap::new();
        for &state in targets {
            let next = self.machine.successor(state, symbol);
            let output = self.machine.output(state, symbol);
            if !successors.entry(output).or_default().insert(next) {
                return None;
            }
        }
        Some(successors)
    }

    /// Replays the decisions stored in `solution`, where `current_to_initial` maps the states that the
    /// machine may currently be in to the target states they originate from.
    fn construct(
        &self,
        current_to_initial: OrderedMap<StateOf<M>, StateOf<M>>,
        solution: &SearchState<SymbolOf<M>, OutputOf<M>>,
    ) -> AdsOf<M> {
        if current_to_initial.len() == 1 {
            let initial = current_to_initial
                .into_values()
                .next()
                .expect("mapping has one element");
            return AdsTree::leaf(initial);
        }

        let symbol = solution
            .symbol
            .expect("solutions for several states carry a symbol");
        let mut groups: OrderedMap<OutputOf<M>, OrderedMap<StateOf<M>, StateOf<M>>> =
            OrderedMap::new();
        for (current, initial) in current_to_initial {
            let next = self.machine.successor(current, symbol);
            let output = self.machine.output(current, symbol);
            let previous = groups.entry(output).or_default().insert(next, initial);
            assert!(previous.is_none(), "solution applies an invalid input");
        }

        let mut tree = AdsTree::symbol(symbol);
        let root = tree.root();
        for (output, mapping) in groups {
            let successor = solution
                .successors
                .get(&output)
                .expect("solution covers every output");
            let subtree = self.construct(mapping, successor);
            tree.graft(root, output, subtree);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::fixtures;
    use crate::prelude::*;

    #[test_log::test]
    fn satisficing_search() {
        let mm = fixtures::late_divergence();
        let ads = compute(&mm, mm.alphabet(), [0, 1, 3]).unwrap().unwrap();
        fixtures::assert_valid(&mm, &ads, [0, 1, 3]);

        let cycle = fixtures::cycle();
        let ads = compute(&cycle, cycle.alphabet(), [0, 1, 2])
            .unwrap()
            .unwrap();
        assert_eq!(ads.depth(), 1);
        assert_eq!(ads.size(), 1);
    }

    /// Checks that every chain of single-child nodes that ends in a split is not longer than the bound
    /// for the number of states that enter the chain, where `original` is the number of targets.
    fn assert_bounded_words(mm: &MealyMachine, ads: &AdsOf<MealyMachine>, original: usize) {
        let mut starts = vec![ads.root()];
        while let Some(start) = starts.pop() {
            if ads.children(start).is_none() {
                continue;
            }
            let states = util::collect_leaves(ads, start).len();
            let mut length = 0u64;
            let mut node = start;
            let split = loop {
                length += 1;
                let children = ads.children(node).expect("chains end in a split");
                if children.len() > 1 {
                    break children;
                }
                node = *children.values().next().expect("inner nodes have a child");
            };
            let m = if states > 2 { original } else { 2 };
            let bound = util::max_splitting_word_length(mm.size(), states, m).saturating_add(1);
            assert!(
                length <= bound,
                "word of length {length} for {states} states exceeds {bound}\n{}",
                ads.show()
            );
            starts.extend(split.values().copied());
        }
    }

    #[test_log::test]
    fn splitting_words_respect_bound() {
        let mm = fixtures::krichen_m4();
        let ads = compute(&mm, mm.alphabet(), 0..4).unwrap().unwrap();
        assert_bounded_words(&mm, &ads, 4);

        let mm = fixtures::late_divergence();
        let ads = compute(&mm, mm.alphabet(), [0, 1, 3]).unwrap().unwrap();
        assert_bounded_words(&mm, &ads, 3);

        let cycle = fixtures::cycle();
        assert_eq!(util::max_splitting_word_length(3, 3, 3), 0);
        let ads = compute(&cycle, cycle.alphabet(), 0..3).unwrap().unwrap();
        assert_bounded_words(&cycle, &ads, 3);
    }

    #[cfg(feature = "random")]
    #[test_log::test]
    fn random_splitting_words_respect_bound() {
        let mut rng = fastrand::Rng::with_seed(0xb0);
        for _ in 0..20 {
            let mm = crate::random::generate_random_mealy_with(&mut rng, 2, 6, 2);
            for targets in [vec![0, 2, 4], vec![1, 2, 3, 5], (0..6).collect()] {
                if let Some(ads) = compute(&mm, mm.alphabet(), targets.iter().copied()).unwrap() {
                    assert_bounded_words(&mm, &ads, targets.len());
                }
            }
        }
    }

    #[test_log::test]
    fn optimal_search() {
        let mm = fixtures::krichen_m4();
        for aggregator in [CostAggregator::MinLength, CostAggregator::MinSize] {
            let ads = compute_optimal(&mm, mm.alphabet(), 0..4, aggregator)
                .unwrap()
                .unwrap();
            fixtures::assert_valid(&mm, &ads, 0..4);
        }
    }

    #[test]
    fn indistinguishable_states() {
        let mm = fixtures::late_divergence();
        fixtures::verify_failure(&mm, [0, 2]);
        fixtures::verify_failure(&mm, [0, 1, 2]);
        assert_eq!(compute(&mm, mm.alphabet(), [0, 2, 3]), Ok(None));
    }

    #[test]
    fn invalid_arguments() {
        let mm = fixtures::cycle();
        assert_eq!(
            compute(&mm, mm.alphabet(), std::iter::empty()),
            Err(AdsError::EmptyTargets)
        );
        assert_eq!(
            compute_optimal(
                &mm,
                mm.alphabet(),
                std::iter::empty(),
                CostAggregator::MinSize
            ),
            Err(AdsError::EmptyTargets)
        );
        assert_eq!(
            compute(&mm, mm.alphabet(), [1, 5]),
            Err(AdsError::UnknownState("5".to_string()))
        );
        assert_eq!(
            compute(&mm, mm.alphabet(), [2]).unwrap(),
            Some(AdsTree::leaf(2))
        );
    }

    #[test]
    fn aggregators() {
        assert_eq!(CostAggregator::MinLength.apply(0, 4), 4);
        assert_eq!(CostAggregator::MinLength.apply(4, 1), 4);
        assert_eq!(CostAggregator::MinSize.apply(4, 1), 5);
        assert_eq!(CostAggregator::MinSize.apply(usize::MAX, 1), usize::MAX);
    }
}
