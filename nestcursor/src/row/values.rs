use std::fmt;

use crate::{
    error::{CursorResult, Error},
    row::value::Value,
};

/// A raw row, as yielded by a [`RowSource`](crate::source::RowSource).
pub type RawRow = Values;

/// An ordered map from column names to values ([`Value`]).
///
/// Columns keep the order in which they were inserted. Rows are short, so
/// lookups are linear.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: Vec<(String, Value)>,
}

impl Values {
    /// Constructs a new empty values map.
    pub fn new() -> Values {
        Values { inner: Vec::new() }
    }

    /// Constructs a new empty values map with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Values {
        Values {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Returns a reference to the value of the given column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner
            .iter()
            .find_map(|(column, value)| (column == name).then_some(value))
    }

    /// Same as [`Self::get`], but fails with [`Error::MissingColumn`].
    pub fn try_get(&self, name: &str) -> CursorResult<&Value> {
        self.get(name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    }

    /// Sets a value. If the column is already present its value is replaced
    /// in place; otherwise the column is appended.
    pub fn set(&mut self, name: String, value: Value) {
        match self.inner.iter_mut().find(|(column, _)| *column == name) {
            Some((_, slot)) => *slot = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Returns an iterator over the column names, in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(column, _)| column.as_str())
    }

    /// Returns an iterator over the `(column, value)` pairs, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (name, value) in iter {
            values.set(name.into(), value);
        }
        values
    }
}

impl From<Vec<(String, Value)>> for Values {
    fn from(inner: Vec<(String, Value)>) -> Values {
        inner.into_iter().collect()
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
