//! Machines and checks that are shared by the tests of the ADS algorithms.

use crate::{
    math::{OrderedSet, Set},
    prelude::*,
};

use super::util::{is_valid, trace_for_node};

fn build(transitions: &[(usize, char, Int, usize)]) -> MealyMachine {
    MealyBuilder::default()
        .with_transitions(transitions.iter().copied())
        .into_mealy()
        .unwrap()
}

/// Three states in a cycle, the single symbol emits the index of the current state.
pub fn cycle() -> MealyMachine {
    build(&[(0, 'a', 0, 1), (1, 'a', 1, 2), (2, 'a', 2, 0)])
}

/// States 0 and 1 only differ after reading `ab`, states 0 and 2 are equivalent.
pub fn late_divergence() -> MealyMachine {
    build(&[
        (0, 'a', 0, 2),
        (0, 'b', 0, 0),
        (1, 'a', 0, 3),
        (1, 'b', 0, 1),
        (2, 'a', 0, 2),
        (2, 'b', 0, 2),
        (3, 'a', 0, 3),
        (3, 'b', 1, 3),
    ])
}

/// Two states that behave identically.
pub fn equivalent_states() -> MealyMachine {
    build(&[(0, 'a', 0, 1), (1, 'a', 0, 0)])
}

/// Machine M3 from Krichen's survey, its three states can be distinguished pairwise but there is no
/// ADS for all of them.
pub fn krichen_m3() -> MealyMachine {
    build(&[
        (0, 'a', 0, 0),
        (0, 'b', 1, 2),
        (1, 'a', 0, 0),
        (1, 'b', 0, 2),
        (2, 'a', 0, 1),
        (2, 'b', 0, 2),
    ])
}

/// Machine M4 from Krichen's survey.
pub fn krichen_m4() -> MealyMachine {
    build(&[
        (0, 'a', 0, 2),
        (0, 'b', 0, 0),
        (1, 'a', 0, 3),
        (1, 'b', 0, 0),
        (2, 'a', 1, 0),
        (2, 'b', 0, 2),
        (3, 'a', 1, 1),
        (3, 'b', 1, 3),
    ])
}

/// Machine M5 from Krichen's survey.
pub fn krichen_m5() -> MealyMachine {
    build(&[
        (0, 'a', 0, 0),
        (0, 'b', 1, 2),
        (1, 'a', 0, 1),
        (1, 'b', 0, 0),
        (2, 'a', 1, 2),
        (2, 'b', 1, 1),
    ])
}

/// Machine M6 from Krichen's survey.
pub fn krichen_m6() -> MealyMachine {
    build(&[
        (0, 'a', 0, 1),
        (0, 'b', 0, 0),
        (1, 'a', 1, 2),
        (1, 'b', 0, 0),
        (2, 'a', 0, 3),
        (2, 'b', 0, 3),
        (3, 'a', 1, 4),
        (3, 'b', 0, 4),
        (4, 'a', 0, 5),
        (4, 'b', 0, 5),
        (5, 'a', 1, 0),
        (5, 'b', 0, 0),
    ])
}

/// Asserts that the leaves of `ads` name exactly `targets`, that the trace of every leaf agrees with
/// the behaviour of `mm` and that no two leaves share a trace.
pub fn assert_valid<It: IntoIterator<Item = usize>>(
    mm: &MealyMachine,
    ads: &AdsOf<MealyMachine>,
    targets: It,
) {
    let targets: OrderedSet<_> = targets.into_iter().collect();
    let leaves = ads.leaves();
    let identified: OrderedSet<_> = ads.identified_states().into_iter().collect();
    assert_eq!(identified, targets, "wrong leaves in\n{}", ads.show());
    assert_eq!(leaves.len(), targets.len(), "duplicate leaves in\n{}", ads.show());

    let mut traces = Set::default();
    for leaf in leaves {
        let (inputs, outputs) = trace_for_node(ads, leaf);
        let state = ads.state(leaf).unwrap();
        assert_eq!(mm.output_word(state, &inputs), outputs);
        assert!(traces.insert(outputs), "duplicate trace in\n{}", ads.show());
    }
    assert!(is_valid(mm, ads));
}

/// Runs the facade, the satisficing and both optimal searches on `targets`. All of them have to produce
/// a valid tree and the optimal searches must not be beaten in their respective measure.
pub fn verify_success<It: IntoIterator<Item = usize>>(mm: &MealyMachine, targets: It) {
    let targets: OrderedSet<_> = targets.into_iter().collect();
    let alphabet = mm.alphabet();

    let default = ads::compute(mm, alphabet, targets.iter().copied())
        .unwrap()
        .expect("facade found no ADS");
    let satisficing = ads::backtracking::compute(mm, alphabet, targets.iter().copied())
        .unwrap()
        .expect("satisficing search found no ADS");
    let min_length = ads::backtracking::compute_optimal(
        mm,
        alphabet,
        targets.iter().copied(),
        CostAggregator::MinLength,
    )
    .unwrap()
    .expect("optimal search found no ADS");
    let min_size = ads::backtracking::compute_optimal(
        mm,
        alphabet,
        targets.iter().copied(),
        CostAggregator::MinSize,
    )
    .unwrap()
    .expect("optimal search found no ADS");

    for tree in [&default, &satisficing, &min_length, &min_size] {
        assert_valid(mm, tree, targets.iter().copied());
    }

    for other in [&default, &satisficing, &min_size] {
        assert!(min_length.depth() <= other.depth());
    }
    for other in [&default, &satisficing, &min_length] {
        assert!(min_size.size() <= other.size());
    }
}

/// Asserts that neither the facade nor any of the searches finds an ADS for `targets`.
pub fn verify_failure<It: IntoIterator<Item = usize>>(mm: &MealyMachine, targets: It) {
    let targets: OrderedSet<_> = targets.into_iter().collect();
    let alphabet = mm.alphabet();

    assert_eq!(ads::compute(mm, alphabet, targets.iter().copied()), Ok(None));
    assert_eq!(
        ads::backtracking::compute(mm, alphabet, targets.iter().copied()),
        Ok(None)
    );
    for aggregator in [CostAggregator::MinLength, CostAggregator::MinSize] {
        assert_eq!(
            ads::backtracking::compute_optimal(mm, alphabet, targets.iter().copied(), aggregator),
            Ok(None)
        );
    }
}
