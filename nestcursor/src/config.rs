/// Separator between the cells of a line-encoded row.
pub const FIELD_SEPARATOR: char = '\t';

/// Cell text decoded as a null value.
pub const NULL_MARKER: &str = "\\N";

/// Offset and limit applied over the logical groups (not the raw rows) yielded
/// by a cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowBounds {
    /// The number of groups to discard before yielding.
    pub offset: u64,
    /// The maximum number of groups to yield. `None` means unbounded.
    pub limit: Option<u64>,
}

impl RowBounds {
    /// No offset, no limit.
    pub const DEFAULT: RowBounds = RowBounds {
        offset: 0,
        limit: None,
    };

    /// Constructs new bounds.
    pub fn new(offset: u64, limit: u64) -> Self {
        RowBounds {
            offset,
            limit: Some(limit),
        }
    }

    /// Bounds which only skip the first `offset` groups.
    pub fn offset(offset: u64) -> Self {
        RowBounds {
            offset,
            limit: None,
        }
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}
