use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::*;

// Values clustered into a few containers so that array, bitset and run
// containers all show up.
fn arb_values32() -> impl Strategy<Value = Vec<u32>> {
    prop_oneof![
        proptest::collection::vec(0u32..200_000, 0..512),
        proptest::collection::vec(any::<u32>(), 0..64),
        (0u32..1_000_000, 1u32..9_000).prop_map(|(start, len)| (start..start + len).collect()),
    ]
}

fn arb_values64() -> impl Strategy<Value = Vec<u64>> {
    prop_oneof![
        proptest::collection::vec(0u64..(1 << 40), 0..256),
        proptest::collection::vec(any::<u64>(), 0..64),
    ]
}

fn set<T: Ord + Copy>(values: &[T]) -> BTreeSet<T> {
    values.iter().copied().collect()
}

// ---- encoding ----

proptest! {
    #[test]
    fn round_trip_32(values in arb_values32(), optimize in any::<bool>()) {
        let mut bm = Bitmap32::from_values(&values).unwrap();
        if optimize {
            bm.run_optimize();
        }

        for format in [Format::Normal, Format::Portable] {
            let bytes = bm.serialize(format).unwrap();
            let decoded = Bitmap32::deserialize(format, &bytes).unwrap();
            prop_assert_eq!(&decoded, &bm, "{} round trip", format);
        }

        let buffer = MemoryBuffer::from_bitmap(&bm, Format::Frozen).unwrap();
        let view = buffer.to_frozen::<Roaring32>(Format::Frozen).unwrap();
        prop_assert_eq!(view.to_vec().unwrap(), bm.to_vec().unwrap());
    }

    #[test]
    fn round_trip_64(values in arb_values64()) {
        let bm = Bitmap64::from_values(&values).unwrap();

        let bytes = bm.serialize(Format::Portable).unwrap();
        let decoded = Bitmap64::deserialize(Format::Portable, &bytes).unwrap();
        prop_assert_eq!(&decoded, &bm);

        let buffer = MemoryBuffer::from_bitmap(&bm, Format::Frozen).unwrap();
        let view = buffer.to_frozen::<Roaring64>(Format::Frozen).unwrap();
        prop_assert_eq!(view.to_vec().unwrap(), bm.to_vec().unwrap());
    }
}

// ---- contents ----

proptest! {
    #[test]
    fn contents_match_btreeset(values in arb_values32()) {
        let bm = Bitmap32::from_values(&values).unwrap();
        let expected = set(&values);

        prop_assert_eq!(bm.len(), expected.len() as u64);
        prop_assert_eq!(bm.min(), expected.first().copied());
        prop_assert_eq!(bm.max(), expected.last().copied());
        prop_assert_eq!(bm.to_vec().unwrap(), expected.iter().copied().collect::<Vec<_>>());

        for (index, &value) in expected.iter().enumerate() {
            prop_assert!(bm.contains(value));
            prop_assert_eq!(bm.rank(value), index as u64 + 1);
            prop_assert_eq!(bm.select(index as u64), Some(value));
        }
    }

    #[test]
    fn window_matches_slice(
        values in proptest::collection::vec(any::<u32>(), 0..64),
        offset in 0usize..80,
        count in 0usize..80,
    ) {
        let result = Bitmap32::from_values_window(&values, offset, count);
        if offset + count <= values.len() {
            let bm = result.unwrap();
            prop_assert_eq!(bm.len(), set(&values[offset..offset + count]).len() as u64);
        } else {
            prop_assert!(matches!(result, Err(Error::Range(_))));
        }
    }

    #[test]
    fn range_ops_match_btreeset(
        values in arb_values32(),
        a in 0u32..250_000,
        b in 0u32..250_000,
    ) {
        let (min, max) = (a.min(b), a.max(b));
        let expected = set(&values);

        let mut added = Bitmap32::from_values(&values).unwrap();
        added.add_range(min, max).unwrap();
        prop_assert!(added.contains_range(min, max).unwrap());
        let mut with_range = expected.clone();
        with_range.extend(min..=max);
        prop_assert_eq!(added.len(), with_range.len() as u64);

        let mut removed = Bitmap32::from_values(&values).unwrap();
        removed.remove_range(min, max).unwrap();
        let without_range = expected.iter().filter(|v| !(min..=max).contains(*v)).count();
        prop_assert_eq!(removed.len(), without_range as u64);

        let flipped = Bitmap32::from_values(&values).unwrap().flip(min, max).unwrap();
        let inside = expected.range(min..=max).count() as u64;
        let width = u64::from(max - min) + 1;
        prop_assert_eq!(flipped.len(), expected.len() as u64 - inside + (width - inside));
    }
}

// ---- set algebra ----

proptest! {
    #[test]
    fn algebra_matches_btreeset(a_vals in arb_values32(), b_vals in arb_values32()) {
        let a = Bitmap32::from_values(&a_vals).unwrap();
        let b = Bitmap32::from_values(&b_vals).unwrap();
        let (sa, sb) = (set(&a_vals), set(&b_vals));

        let and: Vec<u32> = sa.intersection(&sb).copied().collect();
        let or: Vec<u32> = sa.union(&sb).copied().collect();
        let xor: Vec<u32> = sa.symmetric_difference(&sb).copied().collect();
        let andnot: Vec<u32> = sa.difference(&sb).copied().collect();

        prop_assert_eq!(a.and(&b).unwrap().to_vec().unwrap(), and.clone());
        prop_assert_eq!(a.or(&b).unwrap().to_vec().unwrap(), or.clone());
        prop_assert_eq!(a.xor(&b).unwrap().to_vec().unwrap(), xor.clone());
        prop_assert_eq!(a.andnot(&b).unwrap().to_vec().unwrap(), andnot.clone());

        prop_assert_eq!(a.and_len(&b), and.len() as u64);
        prop_assert_eq!(a.or_len(&b), or.len() as u64);
        prop_assert_eq!(a.xor_len(&b), xor.len() as u64);
        prop_assert_eq!(a.andnot_len(&b), andnot.len() as u64);
        prop_assert_eq!(a.and_len(&b) + a.andnot_len(&b), a.len());
    }

    #[test]
    fn inplace_matches_allocating(a_vals in arb_values32(), b_vals in arb_values32()) {
        let a = Bitmap32::from_values(&a_vals).unwrap();
        let b = Bitmap32::from_values(&b_vals).unwrap();

        let mut and = a.clone();
        and.and_inplace(&b);
        prop_assert_eq!(and, a.and(&b).unwrap());

        let mut or = a.clone();
        or.or_inplace(&b);
        prop_assert_eq!(or, a.or(&b).unwrap());

        let mut xor = a.clone();
        xor.xor_inplace(&b);
        prop_assert_eq!(xor, a.xor(&b).unwrap());

        let mut andnot = a.clone();
        andnot.andnot_inplace(&b);
        prop_assert_eq!(andnot, a.andnot(&b).unwrap());
    }

    #[test]
    fn lazy_matches_eager(parts in proptest::collection::vec(arb_values32(), 1..6)) {
        let bitmaps: Vec<Bitmap32> = parts
            .iter()
            .map(|values| Bitmap32::from_values(values).unwrap())
            .collect();

        let mut eager = Bitmap32::new().unwrap();
        let mut dirty = Bitmap32::new().unwrap().into_dirty();
        for bm in &bitmaps {
            eager.or_inplace(bm);
            dirty.or_inplace(bm);
        }
        prop_assert_eq!(dirty.repair(), eager);
    }

    #[test]
    fn algebra_matches_btreeset_64(a_vals in arb_values64(), b_vals in arb_values64()) {
        let a = Bitmap64::from_values(&a_vals).unwrap();
        let b = Bitmap64::from_values(&b_vals).unwrap();
        let (sa, sb) = (set(&a_vals), set(&b_vals));

        prop_assert_eq!(a.and_len(&b), sa.intersection(&sb).count() as u64);
        prop_assert_eq!(a.or_len(&b), sa.union(&sb).count() as u64);
        prop_assert_eq!(
            a.xor(&b).unwrap().to_vec().unwrap(),
            sa.symmetric_difference(&sb).copied().collect::<Vec<_>>()
        );
        prop_assert_eq!(a.and_len(&b) + a.andnot_len(&b), a.len());
    }
}
