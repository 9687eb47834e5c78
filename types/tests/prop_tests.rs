use proptest::prelude::*;

use quorum_types::{Amount, Height, PublicKey, Slot, Timestamp, TxHash};

proptest! {
    /// TxHash ordering follows the byte order, which the election relies on
    /// to break weight ties.
    #[test]
    fn tx_hash_orders_by_bytes(a in prop::array::uniform32(0u8..), b in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(TxHash::new(a).cmp(&TxHash::new(b)), a.cmp(&b));
    }

    /// No wall-clock timestamp can outrank or equal the final sentinel.
    #[test]
    fn final_timestamp_is_maximal(millis in 0u64..u64::MAX) {
        let ts = Timestamp::from_millis(millis);
        prop_assert!(ts < Timestamp::FINAL);
        prop_assert!(!ts.is_final());
    }

    /// Amount summation never overflows and equals the u128 sum when it fits.
    #[test]
    fn amount_sum_matches_raw(values in prop::collection::vec(0u128..u64::MAX as u128, 0..32)) {
        let total: Amount = values.iter().map(|v| Amount::new(*v)).sum();
        prop_assert_eq!(total.raw(), values.iter().sum::<u128>());
    }

    /// Slots are equal only when both account and height match.
    #[test]
    fn slot_equality(a in prop::array::uniform32(0u8..), h1 in 0u64..1000, h2 in 0u64..1000) {
        let s1 = Slot::new(PublicKey(a), Height::new(h1));
        let s2 = Slot::new(PublicKey(a), Height::new(h2));
        prop_assert_eq!(s1 == s2, h1 == h2);
    }
}
