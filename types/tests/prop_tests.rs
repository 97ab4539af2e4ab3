use proptest::prelude::*;

use rollcall_types::{ClaimDigest, ItemId, PublicKey, Signature, Timestamp, ZoneDigest};

proptest! {
    /// ClaimDigest hex form parses back to the same digest.
    #[test]
    fn claim_digest_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let digest = ClaimDigest::new(bytes);
        prop_assert_eq!(ClaimDigest::from_hex(&digest.to_hex()).unwrap(), digest);
    }

    /// ZoneDigest::is_zero is true only for all-zero bytes.
    #[test]
    fn zone_digest_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let digest = ZoneDigest::new(bytes);
        prop_assert_eq!(digest.is_zero(), bytes == [0u8; 32]);
    }

    /// ItemId bincode serialization roundtrip.
    #[test]
    fn item_id_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = ItemId::new(bytes);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: ItemId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }

    /// Signature bincode roundtrip through the custom byte (de)serializer.
    #[test]
    fn signature_bincode_roundtrip(
        lo in prop::array::uniform32(0u8..),
        hi in prop::array::uniform32(0u8..),
    ) {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&lo);
        bytes[32..].copy_from_slice(&hi);
        let sig = Signature(bytes);
        let encoded = bincode::serialize(&sig).unwrap();
        let decoded: Signature = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, sig);
    }

    /// Arbitrary text never panics the hex parsers.
    #[test]
    fn hex_parsers_never_panic(s in ".{0,140}") {
        let _ = PublicKey::from_hex(&s);
        let _ = Signature::from_hex(&s);
        let _ = ClaimDigest::from_hex(&s);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }
}
