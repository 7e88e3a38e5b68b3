//! String encoding for persisted station-number sets.
//!
//! Sets are stored as comma-joined decimal numbers, e.g. `"3,10,27"`.
//! An empty or missing value is the empty set. Elements that don't parse
//! are skipped so one bad entry can't wipe a user's favorites.

use std::collections::BTreeSet;

use crate::domain::StationNumber;

/// Encode a set as a comma-joined string, in ascending order.
pub fn encode_set(set: &BTreeSet<StationNumber>) -> String {
    set.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a comma-joined string. Never fails.
pub fn decode_set(value: Option<&str>) -> BTreeSet<StationNumber> {
    value
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.parse::<StationNumber>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(numbers: &[u32]) -> BTreeSet<StationNumber> {
        numbers.iter().copied().map(StationNumber::new).collect()
    }

    #[test]
    fn encode_sorted() {
        assert_eq!(encode_set(&set(&[27, 3, 10])), "3,10,27");
        assert_eq!(encode_set(&set(&[])), "");
    }

    #[test]
    fn decode_empty_and_missing() {
        assert!(decode_set(None).is_empty());
        assert!(decode_set(Some("")).is_empty());
        assert!(decode_set(Some(",,")).is_empty());
    }

    #[test]
    fn decode_skips_garbage() {
        assert_eq!(decode_set(Some("3,abc,10,-4, 27 ,")), set(&[3, 10, 27]));
    }

    #[test]
    fn decode_dedups() {
        assert_eq!(decode_set(Some("5,5,5")), set(&[5]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any set of non-negative numbers round-trips losslessly
        #[test]
        fn roundtrip(numbers in prop::collection::btree_set(any::<u32>(), 0..50)) {
            let set: BTreeSet<StationNumber> = numbers.into_iter().map(StationNumber::new).collect();
            let encoded = encode_set(&set);
            prop_assert_eq!(decode_set(Some(&encoded)), set);
        }

        /// Decoding arbitrary text never panics and yields only parsed numbers
        #[test]
        fn decode_total(s in ".{0,64}") {
            let decoded = decode_set(Some(&s));
            for n in decoded {
                prop_assert!(s.contains(&n.to_string()));
            }
        }
    }
}
