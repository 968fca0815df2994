//! End-to-end buffering scenarios: a 10_000-byte ceiling against a large
//! multi-packet response, under both retrieval strategies.
//!
//! The large response models a realistic wire layout: 800 rows of 23 bytes
//! spread over three packets with framing overhead, 18_449 bytes in total of
//! which 18_400 are row bytes. Linear incremental reads never stage a byte;
//! any path that must materialize the response hits the ceiling.

use tabwire_cursor::script::{end_frame, rows_frame, ScriptedChannel};
use tabwire_cursor::{Connection, ConnectionConfig, CursorKind, Error, RetrievalStrategy};

const CEILING: usize = 10_000;
const ROW_BYTES: usize = 23;
const LARGE_ROWS: usize = 800;

fn config(buffering: RetrievalStrategy) -> ConnectionConfig {
    ConnectionConfig {
        max_buffer_bytes: CEILING,
        buffering,
    }
}

/// 800 rows over three packets; 49 bytes of header framing on the first.
fn push_large_response(channel: &mut ScriptedChannel) {
    channel.push_response(vec![
        rows_frame(345, ROW_BYTES, 49),
        rows_frame(347, ROW_BYTES, 0),
        rows_frame(108, ROW_BYTES, 0),
        end_frame(),
    ]);
}

fn push_small_response(channel: &mut ScriptedChannel) {
    channel.push_response(vec![rows_frame(10, ROW_BYTES, 49), end_frame()]);
}

fn drain(cursor: &tabwire_cursor::Cursor<ScriptedChannel>) -> usize {
    let mut count = 0;
    while cursor.next_row().expect("next_row").is_some() {
        count += 1;
    }
    count
}

#[test]
fn test_eager_large_response_exceeds_ceiling() {
    let mut channel = ScriptedChannel::new();
    push_large_response(&mut channel);
    push_small_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Eager));

    let err = conn.execute(CursorKind::ForwardOnly).unwrap_err();
    assert!(err.is_capacity_exceeded(), "got {err}");

    // The failed materialization left nothing behind
    assert_eq!(conn.staged_bytes(), 0);
    assert_eq!(conn.open_cursors(), 0);

    // The oversized response was discarded; the channel serves the next
    // statement cleanly.
    let cursor = conn.execute(CursorKind::ForwardOnly).expect("small statement");
    assert_eq!(drain(&cursor), 10);
}

#[test]
fn test_incremental_large_response_reads_through() {
    let mut channel = ScriptedChannel::new();
    push_large_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Incremental));

    let cursor = conn.execute(CursorKind::ForwardOnly).expect("execute");
    assert_eq!(drain(&cursor), LARGE_ROWS);
    assert!(cursor.is_exhausted());

    // Linear consumption of a live cursor stages nothing, so the ceiling is
    // irrelevant to result size.
    assert_eq!(conn.peak_staged_bytes(), 0);
}

#[test]
fn test_interleaved_statements_exceed_ceiling() {
    let mut channel = ScriptedChannel::new();
    push_large_response(&mut channel);
    push_small_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Incremental));

    let first = conn.execute(CursorKind::ForwardOnly).expect("execute first");
    assert!(first.next_row().expect("next_row").is_some());

    // Interleaving forces the first cursor's ~18KB remainder into staging,
    // which cannot fit under the 10KB ceiling.
    let err = conn.execute(CursorKind::ForwardOnly).unwrap_err();
    assert!(err.is_capacity_exceeded(), "got {err}");
    assert_eq!(conn.staged_bytes(), 0);

    // The victim is unusable until closed
    assert!(matches!(first.next_row(), Err(Error::CursorStalled)));
    first.close().expect("close victim");

    let second = conn.execute(CursorKind::ForwardOnly).expect("execute after close");
    assert_eq!(drain(&second), 10);
}

#[test]
fn test_interleaved_small_statements_fit() {
    // Same interleaving shape as above, but the staged remainder fits.
    let mut channel = ScriptedChannel::new();
    push_small_response(&mut channel);
    push_small_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Incremental));

    let first = conn.execute(CursorKind::ForwardOnly).expect("execute first");
    assert!(first.next_row().expect("next_row").is_some());

    let second = conn.execute(CursorKind::ForwardOnly).expect("execute second");
    assert!(conn.staged_bytes() <= CEILING);

    // 1 row delivered live, 9 from staging
    assert_eq!(drain(&first), 9);
    assert_eq!(drain(&second), 10);
    assert_eq!(conn.staged_bytes(), 0);
}

#[test]
fn test_small_responses_pass_under_both_strategies() {
    for buffering in [RetrievalStrategy::Incremental, RetrievalStrategy::Eager] {
        let mut channel = ScriptedChannel::new();
        push_small_response(&mut channel);
        push_small_response(&mut channel);
        let conn = Connection::new(channel, config(buffering));

        for _ in 0..2 {
            let cursor = conn.execute(CursorKind::ForwardOnly).expect("execute");
            assert_eq!(drain(&cursor), 10);
        }
        assert_eq!(conn.staged_bytes(), 0);
        assert!(conn.peak_staged_bytes() <= CEILING);
    }
}

#[test]
fn test_scrollable_cursor_is_forced_eager() {
    // Incremental configuration cannot save a scrollable cursor: scrolling
    // needs the whole result materialized, and the result does not fit.
    let mut channel = ScriptedChannel::new();
    push_large_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Incremental));

    let err = conn.execute(CursorKind::ScrollInsensitive).unwrap_err();
    assert!(err.is_capacity_exceeded(), "got {err}");
    assert_eq!(conn.staged_bytes(), 0);
}

#[test]
fn test_scrollable_cursor_small_response_materializes() {
    let mut channel = ScriptedChannel::new();
    push_small_response(&mut channel);
    let conn = Connection::new(channel, config(RetrievalStrategy::Incremental));

    let cursor = conn.execute(CursorKind::ScrollSensitive).expect("execute");
    // Fully staged despite the incremental connection default
    assert_eq!(conn.staged_bytes(), 10 * ROW_BYTES);
    assert_eq!(drain(&cursor), 10);
    assert_eq!(conn.staged_bytes(), 0);
}

#[test]
fn test_ceiling_scales_with_configuration() {
    // The same large response fits once the ceiling covers its row bytes.
    let mut channel = ScriptedChannel::new();
    push_large_response(&mut channel);
    let conn = Connection::new(
        channel,
        ConnectionConfig {
            max_buffer_bytes: LARGE_ROWS * ROW_BYTES,
            buffering: RetrievalStrategy::Eager,
        },
    );

    let cursor = conn.execute(CursorKind::ForwardOnly).expect("execute");
    assert_eq!(conn.staged_bytes(), LARGE_ROWS * ROW_BYTES);
    assert_eq!(drain(&cursor), LARGE_ROWS);
    assert_eq!(conn.peak_staged_bytes(), LARGE_ROWS * ROW_BYTES);
    assert_eq!(conn.staged_bytes(), 0);
}
