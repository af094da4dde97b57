//! Static row-to-object mapping configuration.
//!
//! A [`ResultMapping`] declares which columns identify the parent object (the
//! parent key), which columns are copied as its scalar fields, and, for each
//! nested collection, which columns identify a child (the child key) and which
//! are copied into it. Mappings are validated once, when built, and are then
//! shared by reference with every cursor that uses them.

use std::collections::HashSet;

use crate::{
    error::{CursorResult, Error},
    row::{value::Value, values::Values},
};

/// A key made of the values of a set of columns, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(Vec<Value>);

impl Key {
    /// Extracts the key formed by `columns` from the given row.
    pub fn extract(row: &Values, columns: &[String]) -> CursorResult<Key> {
        columns
            .iter()
            .map(|column| row.try_get(column).cloned())
            .collect::<CursorResult<_>>()
            .map(Key)
    }

    /// Checks whether every component of the key is null.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(Value::is_null)
    }
}

/// A validated mapping from flattened rows to nested result objects.
#[derive(Clone, Debug)]
pub struct ResultMapping {
    id_columns: Vec<String>,
    columns: Vec<String>,
    auto_mapping: bool,
    collections: Vec<CollectionMapping>,
}

/// The mapping of a single nested collection.
#[derive(Clone, Debug)]
pub struct CollectionMapping {
    name: String,
    id_columns: Vec<String>,
    columns: Vec<String>,
}

/// Builder for [`ResultMapping`].
#[derive(Default)]
pub struct ResultMappingBuilder {
    id_columns: Vec<String>,
    columns: Vec<String>,
    auto_mapping: bool,
    collections: Vec<CollectionMapping>,
}

impl ResultMapping {
    /// Returns a new mapping builder.
    pub fn builder() -> ResultMappingBuilder {
        ResultMappingBuilder::default()
    }

    /// Returns the columns that form the parent key.
    pub fn id_columns(&self) -> &[String] {
        &self.id_columns
    }

    /// Returns the nested collection mappings, in declaration order.
    pub fn collections(&self) -> &[CollectionMapping] {
        &self.collections
    }

    /// Extracts the parent key of the given row.
    pub fn parent_key(&self, row: &Values) -> CursorResult<Key> {
        Key::extract(row, &self.id_columns)
    }

    /// Extracts the parent scalar fields of the given row.
    ///
    /// With auto-mapping, every column of the row that isn't claimed by a
    /// nested collection is copied, in row order. Explicitly mapped columns
    /// must still be present.
    pub fn scalars(&self, row: &Values) -> CursorResult<Values> {
        if !self.auto_mapping {
            return project(row, self.id_columns.iter().chain(&self.columns));
        }
        for column in self.id_columns.iter().chain(&self.columns) {
            row.try_get(column)?;
        }
        Ok(row
            .iter()
            .filter(|(column, _)| self.is_explicit(column) || !self.is_claimed(column))
            .map(|(column, value)| (column, value.clone()))
            .collect())
    }

    fn is_explicit(&self, column: &str) -> bool {
        self.id_columns
            .iter()
            .chain(&self.columns)
            .any(|explicit| explicit == column)
    }

    fn is_claimed(&self, column: &str) -> bool {
        self.collections
            .iter()
            .any(|collection| collection.owns(column))
    }
}

impl ResultMappingBuilder {
    /// Adds a column to the parent key. The column is also a scalar field.
    pub fn id(mut self, column: impl Into<String>) -> Self {
        self.id_columns.push(column.into());
        self
    }

    /// Adds a scalar field column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Enables or disables auto-mapping of unclaimed columns as scalar fields.
    pub fn auto_mapping(mut self, enabled: bool) -> Self {
        self.auto_mapping = enabled;
        self
    }

    /// Adds a nested collection.
    pub fn collection(mut self, collection: CollectionMapping) -> Self {
        self.collections.push(collection);
        self
    }

    /// Validates and builds the mapping.
    pub fn build(self) -> CursorResult<ResultMapping> {
        if self.id_columns.is_empty() {
            return Err(Error::InvalidMapping(
                "the parent must declare at least one id column".into(),
            ));
        }
        check_unique("parent", self.id_columns.iter().chain(&self.columns))?;

        let mut names = HashSet::with_capacity(self.collections.len());
        for collection in &self.collections {
            let name = &collection.name;
            if name.is_empty() {
                return Err(Error::InvalidMapping("empty collection name".into()));
            }
            if !names.insert(name.as_str()) {
                return Err(Error::InvalidMapping(
                    format!("duplicate collection `{name}`").into(),
                ));
            }
            if collection.id_columns.is_empty() {
                return Err(Error::InvalidMapping(
                    format!("collection `{name}` must declare at least one id column").into(),
                ));
            }
            check_unique(name, collection.id_columns.iter().chain(&collection.columns))?;
        }

        Ok(ResultMapping {
            id_columns: self.id_columns,
            columns: self.columns,
            auto_mapping: self.auto_mapping,
            collections: self.collections,
        })
    }
}

impl CollectionMapping {
    /// Constructs a new, still empty, collection mapping.
    pub fn new(name: impl Into<String>) -> Self {
        CollectionMapping {
            name: name.into(),
            id_columns: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Adds a column to the child key. The column is also copied into the
    /// child.
    pub fn id(mut self, column: impl Into<String>) -> Self {
        self.id_columns.push(column.into());
        self
    }

    /// Adds a column copied into the child.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the child key of the given row.
    ///
    /// Returns `None` if every key column is null, which is how an outer join
    /// reports a parent without children.
    pub fn child_key(&self, row: &Values) -> CursorResult<Option<Key>> {
        let key = Key::extract(row, &self.id_columns)?;
        Ok((!key.is_null()).then_some(key))
    }

    /// Extracts the child fields of the given row.
    pub fn child(&self, row: &Values) -> CursorResult<Values> {
        project(row, self.id_columns.iter().chain(&self.columns))
    }

    fn owns(&self, column: &str) -> bool {
        self.id_columns
            .iter()
            .chain(&self.columns)
            .any(|owned| owned == column)
    }
}

fn project<'c>(row: &Values, columns: impl Iterator<Item = &'c String>) -> CursorResult<Values> {
    let mut projected = Values::new();
    for column in columns {
        projected.set(column.clone(), row.try_get(column)?.clone());
    }
    Ok(projected)
}

fn check_unique<'c>(level: &str, columns: impl Iterator<Item = &'c String>) -> CursorResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column) {
            return Err(Error::InvalidMapping(
                format!("column `{column}` mapped twice in `{level}`").into(),
            ));
        }
    }
    Ok(())
}
