use crate::row::{value::Value, values::Values};

/// A logical result object, reconstructed from a group of raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultObject {
    fields: Values,
    collections: Vec<NestedCollection>,
}

/// A nested collection of a [`ResultObject`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedCollection {
    name: String,
    items: Vec<Values>,
}

impl ResultObject {
    pub(crate) fn new(fields: Values, collections: Vec<NestedCollection>) -> Self {
        ResultObject {
            fields,
            collections,
        }
    }

    /// Returns the value of the given scalar field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns all scalar fields.
    pub fn fields(&self) -> &Values {
        &self.fields
    }

    /// Returns the items of the given nested collection.
    ///
    /// Every collection declared in the mapping is present, even if empty.
    pub fn collection(&self, name: &str) -> Option<&[Values]> {
        self.collections
            .iter()
            .find(|collection| collection.name == name)
            .map(|collection| collection.items.as_slice())
    }

    /// Returns all nested collections, in mapping order.
    pub fn collections(&self) -> &[NestedCollection] {
        &self.collections
    }

    pub(crate) fn collections_mut(&mut self) -> &mut [NestedCollection] {
        &mut self.collections
    }
}

impl NestedCollection {
    pub(crate) fn new(name: String) -> Self {
        NestedCollection {
            name,
            items: Vec::new(),
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection items, in first-occurrence order.
    pub fn items(&self) -> &[Values] {
        &self.items
    }

    pub(crate) fn push(&mut self, item: Values) {
        self.items.push(item);
    }
}
