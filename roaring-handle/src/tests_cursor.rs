use crate::*;

// ---- cursors ----

#[test]
fn test_move_next_protocol() {
    let bm = Bitmap32::from_values(&[2, 4, 8]).unwrap();
    let mut cursor = bm.cursor().unwrap();

    assert_eq!(cursor.current().unwrap(), None);
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Some(2));
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Some(4));
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Some(8));

    assert!(!cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), None);
    assert!(!cursor.move_next().unwrap());
}

#[test]
fn test_empty_bitmap_cursor() {
    let bm = Bitmap32::new().unwrap();
    let mut cursor = bm.cursor().unwrap();
    assert!(!cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), None);
    assert_eq!(bm.cursor().unwrap().count(), 0);
}

#[test]
fn test_cursor_as_iterator() {
    let values: Vec<u32> = (0..300).map(|x| x * 1_000).collect();
    let bm = Bitmap32::from_values(&values).unwrap();

    let collected: Vec<u32> = bm.cursor().unwrap().collect();
    assert_eq!(collected, values);

    let mut cursor = bm.cursor().unwrap();
    assert_eq!(cursor.by_ref().take(2).collect::<Vec<_>>(), vec![0, 1_000]);
    assert_eq!(cursor.next(), Some(2_000));

    // Exhausted cursors stay exhausted.
    let mut cursor = bm.cursor().unwrap();
    cursor.by_ref().for_each(drop);
    assert_eq!(cursor.next(), None);
    assert_eq!(cursor.next(), None);
}

#[test]
fn test_cursor_reset_is_unsupported() {
    let bm = Bitmap32::from_values(&[1]).unwrap();
    let mut cursor = bm.cursor().unwrap();
    cursor.move_next().unwrap();

    assert!(matches!(cursor.reset(), Err(Error::Unsupported(_))));
    assert_eq!(cursor.current().unwrap(), Some(1));
}

#[test]
fn test_cursor_release() {
    let bm = Bitmap32::from_values(&[1, 2]).unwrap();
    let mut cursor = bm.cursor().unwrap();
    cursor.move_next().unwrap();

    cursor.release();
    cursor.release();
    assert!(cursor.is_released());

    assert!(matches!(cursor.move_next(), Err(Error::Disposed { .. })));
    assert!(matches!(cursor.current(), Err(Error::Disposed { .. })));
    assert_eq!(cursor.next(), None);
}

#[test]
fn test_cursor_over_frozen_view() {
    let bm = Bitmap32::from_values(&[5, 50, 500]).unwrap();
    let buffer = MemoryBuffer::from_bitmap(&bm, Format::Frozen).unwrap();
    let view = buffer.to_frozen::<Roaring32>(Format::Frozen).unwrap();

    let collected: Vec<u32> = view.cursor().unwrap().collect();
    assert_eq!(collected, vec![5, 50, 500]);
}

#[test]
fn test_cursor_64() {
    let big = u64::MAX - 5;
    let bm = Bitmap64::from_values(&[0, 1 << 40, big]).unwrap();

    let mut cursor = bm.cursor().unwrap();
    assert!(cursor.move_next().unwrap());
    assert_eq!(cursor.current().unwrap(), Some(0));
    assert_eq!(cursor.collect::<Vec<_>>(), vec![1 << 40, big]);
}

// ---- bulk insertion ----

#[test]
fn test_bulk_matches_add_many() {
    let values: Vec<u32> = (0..2_000).chain(70_000..70_100).collect();

    let mut bulk_built = Bitmap32::new().unwrap();
    {
        let mut bulk = bulk_built.bulk();
        bulk.extend(values.iter().copied()).unwrap();
        bulk.add(1_000_000).unwrap();
    }

    let mut expected = Bitmap32::from_values(&values).unwrap();
    expected.add(1_000_000);
    assert_eq!(bulk_built, expected);
}

#[test]
fn test_bulk_release() {
    let mut bm = Bitmap32::new().unwrap();
    let mut bulk = bm.bulk();
    bulk.add(3).unwrap();

    bulk.release();
    bulk.release();
    assert!(bulk.is_released());
    assert!(matches!(bulk.add(4), Err(Error::Disposed { .. })));
    drop(bulk);

    assert_eq!(bm.to_vec().unwrap(), vec![3]);
    bm.add(4);
    assert_eq!(bm.len(), 2);
}

#[test]
fn test_bulk_64() {
    let mut bm = Bitmap64::new().unwrap();
    let mut bulk = bm.bulk();
    bulk.extend([1u64 << 33, 1, 1 << 33, 2]).unwrap();
    drop(bulk);

    assert_eq!(bm.to_vec().unwrap(), vec![1, 2, 1 << 33]);
}
