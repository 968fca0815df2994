//! Staging buffer tests: FIFO order, reserve-before-buffer, release on drain.

use tabwire_core::types::{Row, Value};
use tabwire_mem::{ByteAccountant, Staged, StagingBuffer};

fn row(label: &str, bytes: usize) -> Row {
    Row::new(vec![Value::Str(label.to_string())], bytes)
}

#[test]
fn test_fifo_order() {
    let accountant = ByteAccountant::new(10_000);
    let mut staging = StagingBuffer::new(&accountant, "test");

    staging.push_row(row("first", 100)).unwrap();
    staging.push_row(row("second", 100)).unwrap();
    staging.push_row(row("third", 100)).unwrap();

    // Peeking does not consume or release
    assert!(matches!(staging.front(), Some(Staged::Row(_))));
    assert_eq!(staging.staged_bytes(), 300);

    let labels: Vec<String> = std::iter::from_fn(|| staging.pop_row())
        .map(|r| match &r.values()[0] {
            Value::Str(s) => s.clone(),
            other => panic!("unexpected value {other:?}"),
        })
        .collect();
    assert_eq!(labels, ["first", "second", "third"]);
}

#[test]
fn test_append_reserves_and_pop_releases() {
    let accountant = ByteAccountant::new(10_000);
    let mut staging = StagingBuffer::new(&accountant, "test");
    assert_eq!(accountant.reserved_bytes(), 0);

    staging.push_row(row("a", 4_000)).unwrap();
    staging.push_row(row("b", 3_000)).unwrap();
    assert_eq!(accountant.reserved_bytes(), 7_000);
    assert_eq!(staging.staged_bytes(), 7_000);

    let popped = staging.pop_row().expect("row staged");
    assert_eq!(popped.byte_size(), 4_000);
    assert_eq!(accountant.reserved_bytes(), 3_000);

    staging.pop_row().expect("row staged");
    assert_eq!(accountant.reserved_bytes(), 0);
    assert!(staging.is_empty());
}

#[test]
fn test_failed_append_buffers_nothing() {
    let accountant = ByteAccountant::new(5_000);
    let mut staging = StagingBuffer::new(&accountant, "test");

    staging.push_row(row("fits", 4_000)).unwrap();

    let err = staging.push_row(row("too-big", 2_000)).unwrap_err();
    assert!(matches!(
        err,
        tabwire_mem::Error::CapacityExceeded { requested: 2_000, .. }
    ));

    // Rejected row is not buffered and not accounted
    assert_eq!(staging.len(), 1);
    assert_eq!(accountant.reserved_bytes(), 4_000);
}

#[test]
fn test_drop_releases_remainder() {
    let accountant = ByteAccountant::new(10_000);
    {
        let mut staging = StagingBuffer::new(&accountant, "test");
        staging.push_row(row("a", 2_000)).unwrap();
        staging.push_row(row("b", 2_000)).unwrap();
        staging.pop_row();
        assert_eq!(accountant.reserved_bytes(), 2_000);
        // staging drops here with one row still inside
    }
    assert_eq!(accountant.reserved_bytes(), 0);
}

#[test]
fn test_boundaries_account_zero_bytes() {
    let accountant = ByteAccountant::new(1_000);
    let mut staging = StagingBuffer::new(&accountant, "test");

    staging.push_row(row("a", 500)).unwrap();
    staging.push_boundary(true);
    staging.push_row(row("b", 500)).unwrap();
    staging.push_boundary(false);

    // Boundaries cost nothing against the ceiling
    assert_eq!(accountant.reserved_bytes(), 1_000);

    assert!(staging.pop_row().is_some());
    assert_eq!(staging.next_is_boundary(), Some(true));
    assert_eq!(staging.take_boundary(), Some(true));
    assert!(staging.pop_row().is_some());
    assert_eq!(staging.take_boundary(), Some(false));
    assert!(staging.is_empty());
    assert_eq!(accountant.reserved_bytes(), 0);
}

#[test]
fn test_pop_row_stops_at_boundary() {
    let accountant = ByteAccountant::new(1_000);
    let mut staging = StagingBuffer::new(&accountant, "test");

    staging.push_boundary(true);
    staging.push_row(row("next-set", 100)).unwrap();

    // pop_row refuses to step over the boundary
    assert!(staging.pop_row().is_none());
    assert_eq!(staging.take_boundary(), Some(true));
    assert!(staging.pop_row().is_some());
}

#[test]
fn test_mixed_pop_releases_rows_only() {
    let accountant = ByteAccountant::new(1_000);
    let mut staging = StagingBuffer::new(&accountant, "test");

    staging.push_row(row("a", 300)).unwrap();
    staging.push_boundary(false);

    match staging.pop() {
        Some(Staged::Row(r)) => assert_eq!(r.byte_size(), 300),
        other => panic!("expected row, got {other:?}"),
    }
    assert_eq!(accountant.reserved_bytes(), 0);
    assert!(matches!(
        staging.pop(),
        Some(Staged::ResultBoundary {
            more_results: false
        })
    ));
    assert!(staging.pop().is_none());
}

#[test]
fn test_two_buffers_share_one_ledger() {
    let accountant = ByteAccountant::new(10_000);
    let mut a = StagingBuffer::new(&accountant, "cursor-a");
    let mut b = StagingBuffer::new(&accountant, "cursor-b");

    a.push_row(row("a", 6_000)).unwrap();
    // b sees the ledger already mostly consumed by a
    assert!(b.push_row(row("b", 6_000)).is_err());
    b.push_row(row("b", 4_000)).unwrap();
    assert_eq!(accountant.reserved_bytes(), 10_000);

    drop(a);
    assert_eq!(accountant.reserved_bytes(), 4_000);
    drop(b);
    assert_eq!(accountant.reserved_bytes(), 0);
}
