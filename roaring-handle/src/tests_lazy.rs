use crate::*;

fn parts() -> Vec<Bitmap32> {
    (0..8u32)
        .map(|i| {
            let values: Vec<u32> = (0..5_000).map(|x| x * (i + 1) + i * 7).collect();
            Bitmap32::from_values(&values).unwrap()
        })
        .collect()
}

#[test]
fn test_lazy_or_chain_matches_eager() {
    let parts = parts();

    let mut eager = Bitmap32::new().unwrap();
    for part in &parts {
        eager.or_inplace(part);
    }

    let mut dirty = Bitmap32::new().unwrap().into_dirty();
    for part in &parts {
        dirty.or_inplace(part);
    }
    let repaired = dirty.repair();

    assert_eq!(repaired.len(), eager.len());
    assert_eq!(repaired, eager);
    assert!(repaired.validate().is_ok());
}

#[test]
fn test_lazy_or_with_bitset_conversion() {
    let parts = parts();
    let options = BitmapOptions::new().with_lazy_bitset_conversion(true);

    let mut dirty = parts[0].lazy_or_with(&parts[1], &options).unwrap();
    for part in &parts[2..] {
        dirty.or_inplace(part);
    }
    let repaired = dirty.repair();

    let rest: Vec<&Bitmap32> = parts[1..].iter().collect();
    let expected = parts[0].or_many(rest.as_slice()).unwrap();
    assert_eq!(repaired, expected);
}

#[test]
fn test_lazy_xor_matches_eager() {
    let a = Bitmap32::from_values(&(0..10_000).collect::<Vec<_>>()).unwrap();
    let b = Bitmap32::from_values(&(5_000..15_000).collect::<Vec<_>>()).unwrap();
    let c = Bitmap32::from_values(&[1, 7_000, 20_000]).unwrap();

    let mut dirty = a.lazy_xor(&b).unwrap();
    dirty.xor_inplace(&c);
    let repaired = dirty.repair();

    let expected = a.xor_many(&[&b, &c]).unwrap();
    assert_eq!(repaired, expected);
    assert_eq!(repaired.len(), 10_001);
}

#[test]
fn test_repaired_bitmap_is_mutable() {
    let a = Bitmap32::from_values(&[1, 2]).unwrap();
    let b = Bitmap32::from_values(&[3]).unwrap();

    let mut merged = a.lazy_or(&b).unwrap().repair();
    merged.add(4);
    assert_eq!(merged.to_vec().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_lazy_merge_with_frozen_operand() {
    let a = Bitmap32::from_values(&[1, 2, 3]).unwrap();
    let b = Bitmap32::from_values(&[3, 4]).unwrap();
    let buffer = MemoryBuffer::from_bitmap(&b, Format::Frozen).unwrap();
    let view = buffer.to_frozen::<Roaring32>(Format::Frozen).unwrap();

    let mut dirty = a.clone().into_dirty();
    dirty.or_inplace(&view);
    assert_eq!(dirty.repair().to_vec().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_dirty_release_without_repair() {
    let a = Bitmap32::from_values(&[1]).unwrap();
    let dirty = a.lazy_or(&a).unwrap();
    dirty.release();

    let dropped = a.lazy_xor(&a).unwrap();
    drop(dropped);
    assert_eq!(a.len(), 1);
}
