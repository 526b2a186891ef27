use crate::prelude::*;
use tracing::trace;

/// Generates a random, complete Mealy machine with `size` states over a [`CharAlphabet`] with `symbols`
/// symbols. For each state and symbol, the target is drawn uniformly from all states and the output
/// uniformly from `0..outputs`. Note that the machine is not necessarily minimal or connected.
///
/// Panics if `size` or `outputs` is zero, or if there are more than 26 symbols.
pub fn generate_random_mealy(symbols: usize, size: usize, outputs: Int) -> MealyMachine {
    generate_random_mealy_with(&mut fastrand::Rng::new(), symbols, size, outputs)
}

/// Works as [`generate_random_mealy`], but draws from the given random number generator. Using a seeded
/// generator makes the result reproducible.
pub fn generate_random_mealy_with(
    rng: &mut fastrand::Rng,
    symbols: usize,
    size: usize,
    outputs: Int,
) -> MealyMachine {
    assert!(size > 0, "cannot generate a machine without states");
    assert!(outputs > 0, "need at least one output");
    let alphabet = CharAlphabet::of_size(symbols);

    let mut builder = MealyMachine::builder().with_alphabet_symbols(alphabet.universe());
    for source in 0..size {
        for symbol in alphabet.universe() {
            builder.add_transition(source, symbol, rng.u8(..outputs), rng.usize(..size));
        }
    }
    trace!("drew random Mealy machine with {size} states and {symbols} symbols");

    // every state has a transition for every symbol, so building cannot fail
    match builder.into_mealy() {
        Ok(mm) => mm,
        Err(e) => unreachable!("random machine is incomplete: {e}"),
    }
}
