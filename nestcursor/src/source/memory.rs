use async_trait::async_trait;

use crate::{error::CursorResult, row::values::RawRow, source::RowSource};

/// An in-memory row source.
pub struct VecSource {
    rows: std::vec::IntoIter<RawRow>,
    closed: bool,
}

#[async_trait]
impl RowSource for VecSource {
    async fn try_fetch_row(&mut self) -> CursorResult<Option<RawRow>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.rows.next())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl VecSource {
    /// Constructs a new in-memory source over the given rows.
    pub fn new(rows: Vec<RawRow>) -> Self {
        VecSource {
            rows: rows.into_iter(),
            closed: false,
        }
    }

    /// Returns the number of rows not yet fetched.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl FromIterator<RawRow> for VecSource {
    fn from_iter<I: IntoIterator<Item = RawRow>>(iter: I) -> Self {
        VecSource::new(iter.into_iter().collect())
    }
}
