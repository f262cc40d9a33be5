//! Deterministic row payload generation for the COPY write path.
//!
//! One worker renders a single page of tab-delimited text rows once, then
//! streams that page to the server a fixed number of times. The repeat
//! stream hands out cheap `Bytes` clones on demand so the full payload is
//! never materialized.

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::stream::Stream;

/// Render `row_count` rows in COPY text format (tab-delimited, one row per
/// line). Index runs 0..row_count; the label embeds the worker id for
/// traceability. Byte-identical across calls with the same inputs.
pub fn render_rows(worker_id: u32, row_count: u32) -> Bytes {
    let mut buf = BytesMut::new();
    for i in 0..row_count {
        buf.put_slice(
            format!("{i}\tLoaded by worker {worker_id}. Long string to consume some space.\n")
                .as_bytes(),
        );
    }
    buf.freeze()
}

/// Lazily yield exactly `repetitions` clones of `buf`.
///
/// Buffer content is opaque; `repetitions = 0` yields an empty stream.
pub fn repeat_buffer(buf: Bytes, repetitions: u64) -> impl Stream<Item = Bytes> {
    futures_util::stream::iter((0..repetitions).map(move |_| buf.clone()))
}
