//! The user-facing cursor.
//!
//! A [`Cursor`] lazily reconstructs nested [`ResultObject`]s from the flattened
//! rows of a [`RowSource`]. Nothing is fetched until the first call to
//! [`CursorIter::has_next`], and at most one group (plus the first row of the
//! following group) is held in memory at any time.
//!
//! The cursor follows the lifecycle below. Both `Closed` and `Consumed` are
//! terminal, but only `Consumed` means the source was read to the end.
//!
//! ```text
//! Created --has_next--> Open --exhaustion--> Consumed
//!    |                   |
//!    +------close--------+-----close/failure--> Closed
//! ```
//!
//! The source is released on every transition to a terminal state, and when
//! the cursor is dropped. A fetch abandoned midway (its future dropped) closes
//! the cursor.

use std::ops::Deref;

use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::{debug, instrument, trace};

use crate::{
    config::RowBounds,
    error::{CursorResult, Error},
    exec::{aggregator::GroupAggregator, window::BoundsWindow},
    mapping::ResultMapping,
    row::object::ResultObject,
    source::RowSource,
};

/// A lazy, forward-only, single-pass cursor over nested result objects.
///
/// A cursor is meant to be driven by a single owner. It can be iterated only
/// once, through the handle returned by [`Cursor::iter`].
pub struct Cursor<'m, S: RowSource> {
    state: CursorState,
    aggregator: GroupAggregator<'m>,
    window: BoundsWindow,
    source: Option<S>,
    /// The element produced by the last `has_next`, not yet taken by `next`.
    peeked: Option<ResultObject>,
    iterator_opened: bool,
}

/// The lifecycle state of a [`Cursor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// No fetch was attempted yet.
    Created,
    /// At least one fetch was attempted; the source is held.
    Open,
    /// Closed before exhaustion, by the caller or due to a source failure.
    Closed,
    /// The source was read to the end (or the limit was reached).
    Consumed,
}

impl<'m, S: RowSource> Cursor<'m, S> {
    /// Constructs a new cursor. No row is fetched until iteration starts.
    pub fn new(source: S, mapping: &'m ResultMapping, bounds: RowBounds) -> Self {
        Cursor {
            state: CursorState::Created,
            aggregator: GroupAggregator::new(mapping),
            window: BoundsWindow::new(bounds),
            source: Some(source),
            peeked: None,
            iterator_opened: false,
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Checks whether the cursor has started fetching and isn't closed or
    /// consumed yet.
    pub fn is_open(&self) -> bool {
        self.state == CursorState::Open
    }

    /// Checks whether the underlying source was read to the end.
    ///
    /// This is `false` for cursors closed before exhaustion.
    pub fn is_consumed(&self) -> bool {
        self.state == CursorState::Consumed
    }

    /// Returns the position of the last yielded object among all the objects
    /// of the result, offset included, or `-1` if nothing was yielded yet.
    pub fn current_index(&self) -> i64 {
        self.window.current_index()
    }

    /// Returns the (single) iterator over this cursor.
    ///
    /// Fails if an iterator was already requested, or if the cursor is
    /// already closed.
    pub fn iter(&mut self) -> CursorResult<CursorIter<'_, 'm, S>> {
        if self.iterator_opened {
            return Err(Error::IteratorAlreadyOpened);
        }
        if self.is_terminal() {
            return Err(Error::CursorClosed);
        }
        self.iterator_opened = true;
        Ok(CursorIter { cursor: self })
    }

    /// Closes the cursor, releasing the underlying source.
    ///
    /// Any buffered row or element is discarded. Closing a closed or consumed
    /// cursor does nothing.
    pub fn close(&mut self) {
        if self.is_terminal() {
            return;
        }
        debug!(state = ?self.state, "closing cursor");
        self.release(CursorState::Closed);
    }

    fn is_terminal(&self) -> bool {
        matches!(self.state, CursorState::Closed | CursorState::Consumed)
    }

    /// Fetches the next element into `peeked`.
    ///
    /// The in-progress group lives in the future itself. If the future is
    /// dropped before completing, the guard closes the cursor, so that a
    /// partially read group is never resumed as if it were a new one.
    #[instrument(name = "CursorFetch", level = "debug", skip_all)]
    async fn fetch_next(&mut self) -> CursorResult<bool> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        if self.is_terminal() {
            return Ok(false);
        }

        let mut guard = FetchGuard {
            cursor: self,
            armed: true,
        };
        let fetched = guard.cursor.pull().await;
        guard.armed = false;
        fetched
    }

    async fn pull(&mut self) -> CursorResult<bool> {
        match self.state {
            CursorState::Closed | CursorState::Consumed => return Ok(false),
            CursorState::Open => {}
            CursorState::Created => {
                debug!("opening cursor");
                self.state = CursorState::Open;
                if let Some(source) = &mut self.source {
                    if let Err(error) = source.open().await {
                        debug!(%error, "failed to open source");
                        self.release(CursorState::Closed);
                        return Err(error);
                    }
                }
            }
        }

        let Some(source) = &mut self.source else {
            self.state = CursorState::Closed;
            return Ok(false);
        };

        match self.window.advance(&mut self.aggregator, source).await {
            Ok(Some(object)) => {
                trace!(index = self.window.current_index(), "produced object");
                self.peeked = Some(object);
                Ok(true)
            }
            Ok(None) => {
                debug!("cursor consumed");
                self.release(CursorState::Consumed);
                Ok(false)
            }
            Err(error) => {
                debug!(%error, "source failure, closing cursor");
                self.release(CursorState::Closed);
                Err(error)
            }
        }
    }

    fn take_next(&mut self) -> CursorResult<ResultObject> {
        self.peeked.take().ok_or(Error::NoPendingElement)
    }

    /// Moves to the given terminal state, releasing the source.
    fn release(&mut self, state: CursorState) {
        let opened = self.state == CursorState::Open;
        self.state = state;
        self.peeked = None;
        self.aggregator.reset();
        if let Some(mut source) = self.source.take() {
            if opened {
                trace!("closing source");
                source.close();
            }
        }
    }
}

/// Closes the cursor unless disarmed, i.e., if a fetch didn't run to completion.
struct FetchGuard<'g, 'm, S: RowSource> {
    cursor: &'g mut Cursor<'m, S>,
    armed: bool,
}

impl<S: RowSource> Drop for FetchGuard<'_, '_, S> {
    fn drop(&mut self) {
        if self.armed {
            debug!("fetch cancelled, closing cursor");
            self.cursor.release(CursorState::Closed);
        }
    }
}

impl<S: RowSource> Drop for Cursor<'_, S> {
    fn drop(&mut self) {
        if self.source.is_some() {
            trace!(state = ?self.state, "releasing source on drop");
            self.release(CursorState::Closed);
        }
    }
}

/// The forward-only iterator over a [`Cursor`].
///
/// Dereferences to the cursor, so that its state may be inspected during the
/// iteration.
pub struct CursorIter<'c, 'm, S: RowSource> {
    cursor: &'c mut Cursor<'m, S>,
}

impl<'c, 'm, S: RowSource> CursorIter<'c, 'm, S> {
    /// Checks whether there's another element, fetching it if needed.
    ///
    /// The first call opens the cursor. Repeated calls without an intermediate
    /// [`next`](Self::next) don't fetch again. Returns `false` once the cursor
    /// is consumed or closed. A source failure closes the cursor and is
    /// returned as is.
    ///
    /// # Cancel safety
    ///
    /// This method is not resumable. If the returned future is dropped before
    /// completion (e.g., by a timeout or a `select!`), the rows read so far
    /// are discarded and the cursor is closed, releasing the source. The
    /// cursor then reports `Closed` and is not consumed.
    pub async fn has_next(&mut self) -> CursorResult<bool> {
        self.cursor.fetch_next().await
    }

    /// Returns the element fetched by the last [`has_next`](Self::has_next).
    ///
    /// Never fetches. Fails with [`Error::NoPendingElement`] if there is no
    /// such element.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> CursorResult<ResultObject> {
        self.cursor.take_next()
    }

    /// Closes the underlying cursor.
    pub fn close(&mut self) {
        self.cursor.close();
    }

    /// Collects the remaining elements.
    pub async fn try_collect(mut self) -> CursorResult<Vec<ResultObject>> {
        let mut objects = Vec::new();
        while self.has_next().await? {
            objects.push(self.next()?);
        }
        Ok(objects)
    }

    /// Adapts the iterator into a stream of elements.
    ///
    /// A failure is yielded once, after which the stream ends.
    pub fn into_stream(self) -> BoxStream<'c, CursorResult<ResultObject>> {
        stream::unfold(self, |mut iter| async move {
            match iter.has_next().await {
                Ok(true) => {
                    let next = iter.next();
                    Some((next, iter))
                }
                Ok(false) => None,
                Err(error) => Some((Err(error), iter)),
            }
        })
        .boxed()
    }
}

impl<'m, S: RowSource> Deref for CursorIter<'_, 'm, S> {
    type Target = Cursor<'m, S>;

    fn deref(&self) -> &Self::Target {
        self.cursor
    }
}
