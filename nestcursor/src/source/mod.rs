use async_trait::async_trait;

use crate::{error::CursorResult, row::values::RawRow};

mod memory;
pub use memory::*;

mod lines;
pub use lines::*;

/// A producer of raw, flattened rows.
///
/// Rows are yielded in the physical order of the underlying result. Rows of
/// the same parent object must be contiguous for the cursor to group them
/// correctly; sources are expected to be sorted by the parent key.
///
/// Sources are driven by a single [`Cursor`](crate::cursor::Cursor), which
/// calls [`open`](Self::open) once before the first fetch and
/// [`close`](Self::close) once it's done with the source, be it due to
/// exhaustion, an explicit close, a failure, or the cursor being dropped.
#[async_trait]
pub trait RowSource: Send {
    /// Binds the underlying resource. Called once, before the first fetch.
    async fn open(&mut self) -> CursorResult<()> {
        Ok(())
    }

    /// Fetches the next row.
    ///
    /// Returns `None` once the source is exhausted. Errors are failures of the
    /// underlying source and are propagated unchanged to the cursor's caller.
    async fn try_fetch_row(&mut self) -> CursorResult<Option<RawRow>>;

    /// Releases the underlying resource. Must be idempotent.
    fn close(&mut self);
}

#[async_trait]
impl<S: RowSource + ?Sized> RowSource for Box<S> {
    async fn open(&mut self) -> CursorResult<()> {
        (**self).open().await
    }

    async fn try_fetch_row(&mut self) -> CursorResult<Option<RawRow>> {
        (**self).try_fetch_row().await
    }

    fn close(&mut self) {
        (**self).close()
    }
}
