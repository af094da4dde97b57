use std::{borrow::Cow, io};

pub type CursorResult<T, E = Error> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `next` was called without a pending element, i.e., without a preceding
    /// successful `has_next`.
    #[error("no pending element; call `has_next` first")]
    NoPendingElement,

    /// A second iterator was requested over the same cursor.
    #[error("cannot open more than one iterator on a cursor")]
    IteratorAlreadyOpened,

    /// An iterator was requested over a closed (or consumed) cursor.
    #[error("cursor is already closed")]
    CursorClosed,

    /// The result mapping is not valid.
    #[error("invalid result mapping: {0}")]
    InvalidMapping(Cow<'static, str>),

    /// A mapped column is not present in the fetched row.
    #[error("column `{0}` is not present in the row")]
    MissingColumn(String),

    /// The row source produced a line that can't be decoded as a row.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: Cow<'static, str> },

    /// A generic row source failure.
    #[error("row source error: {0}")]
    Source(Cow<'static, str>),

    /// An generic IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
