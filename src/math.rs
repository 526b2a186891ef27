use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Type alias for sets whose iteration order is determined by the elements. Subsets of states
/// are kept in this form, as they can be hashed and are used as keys of caches.
pub type OrderedSet<S> = BTreeSet<S>;
/// Type alias for maps whose iteration order is determined by the keys.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// Computes the binomial coefficient `n` choose `k`. Saturates at [`u128::MAX`] instead of
/// overflowing.
///
/// # Example
/// ```
/// use automata_ads::math::binomial;
/// assert_eq!(binomial(5, 2), 10);
/// assert_eq!(binomial(3, 4), 0);
/// ```
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for j in 0..k {
        // result * (n - j) is always divisible by (j + 1)
        result = match result.checked_mul((n - j) as u128) {
            Some(product) => product / (j as u128 + 1),
            None => return u128::MAX,
        };
    }
    result
}

/// Returns the length of the longest common prefix of `left` and `right`.
pub fn longest_common_prefix<X: PartialEq>(left: &[X], right: &[X]) -> usize {
    left.iter()
        .zip(right.iter())
        .take_while(|(l, r)| l == r)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomials() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(7, 0), 1);
        assert_eq!(binomial(7, 7), 1);
        assert_eq!(binomial(6, 3), 20);
        assert_eq!(binomial(10, 4), 210);
        assert_eq!(binomial(60, 30), 118_264_581_564_861_424);
        assert_eq!(binomial(2, 5), 0);
    }

    #[test]
    fn common_prefixes() {
        assert_eq!(longest_common_prefix(&[0, 1, 2], &[0, 1, 3]), 2);
        assert_eq!(longest_common_prefix(&[0, 1], &[0, 1, 3]), 2);
        assert_eq!(longest_common_prefix::<u8>(&[], &[0]), 0);
        assert_eq!(longest_common_prefix(&['a'], &['b']), 0);
    }
}
