use tracing::trace;

use crate::{
    config::RowBounds,
    error::CursorResult,
    exec::aggregator::GroupAggregator,
    row::object::ResultObject,
    source::RowSource,
};

/// Applies an offset and a limit over the groups produced by a
/// [`GroupAggregator`].
pub struct BoundsWindow {
    offset: u64,
    /// Groups still to be skipped.
    skip: u64,
    /// Groups still permitted. `None` is unbounded.
    remaining: Option<u64>,
    yielded: u64,
    exhausted: bool,
}

impl BoundsWindow {
    /// Constructs a new window.
    pub fn new(bounds: RowBounds) -> Self {
        BoundsWindow {
            offset: bounds.offset,
            skip: bounds.offset,
            remaining: bounds.limit,
            yielded: 0,
            exhausted: false,
        }
    }

    /// Produces the next group within the window.
    pub async fn advance<S>(
        &mut self,
        aggregator: &mut GroupAggregator<'_>,
        source: &mut S,
    ) -> CursorResult<Option<ResultObject>>
    where
        S: RowSource + ?Sized,
    {
        if self.exhausted {
            return Ok(None);
        }

        while self.skip > 0 {
            if aggregator.next_group(source).await?.is_none() {
                trace!(skip = self.skip, "exhausted while skipping");
                self.exhausted = true;
                return Ok(None);
            }
            self.skip -= 1;
        }

        if self.remaining == Some(0) {
            trace!("limit reached");
            self.exhausted = true;
            return Ok(None);
        }

        match aggregator.next_group(source).await? {
            Some(object) => {
                self.yielded += 1;
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= 1;
                }
                Ok(Some(object))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Returns the position of the last yielded group in the unwindowed
    /// sequence of groups, or `-1` if no group was yielded yet.
    pub fn current_index(&self) -> i64 {
        if self.yielded == 0 {
            return -1;
        }
        i64::try_from(self.offset + self.yielded - 1).unwrap_or(i64::MAX)
    }

    /// Checks whether the window won't produce any further group.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
