//! Chunked execution of bulk statements.
//!
//! SQLite caps the number of bound parameters per statement. Bulk inserts and
//! deletes are therefore split into fixed-size windows that run one after the
//! other. Chunks are not wrapped in a shared transaction: when a chunk fails,
//! the chunks before it stay committed.

/// Runs `op` on consecutive windows of at most `size` items, stopping at the first error.
///
/// Returns the number of windows executed. Empty input executes nothing.
pub async fn in_chunks<T, E>(items: &[T], size: usize, mut op: impl AsyncFnMut(&[T]) -> Result<(), E>) -> Result<usize, E> {
    let size = size.max(1);
    let mut executed = 0;
    for chunk in items.chunks(size) {
        op(chunk).await?;
        executed += 1;
    }
    Ok(executed)
}
