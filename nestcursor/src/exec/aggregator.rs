use std::collections::HashSet;

use tracing::trace;

use crate::{
    error::CursorResult,
    mapping::{Key, ResultMapping},
    row::{
        object::{NestedCollection, ResultObject},
        values::RawRow,
    },
    source::RowSource,
};

/// Groups consecutive raw rows sharing a parent key into result objects.
///
/// The aggregator relies on the source yielding the rows of a parent
/// contiguously. It performs no re-sorting: if the rows of a parent are split
/// apart, one object is yielded for each run.
pub struct GroupAggregator<'m> {
    mapping: &'m ResultMapping,
    /// The first row of the next group, read while completing the current one.
    lookahead: Option<RawRow>,
    /// Whether the source already reported exhaustion.
    drained: bool,
}

impl<'m> GroupAggregator<'m> {
    /// Constructs a new aggregator over the given mapping.
    pub fn new(mapping: &'m ResultMapping) -> Self {
        GroupAggregator {
            mapping,
            lookahead: None,
            drained: false,
        }
    }

    /// Produces the next group, or `None` if the source is exhausted.
    pub async fn next_group<S>(&mut self, source: &mut S) -> CursorResult<Option<ResultObject>>
    where
        S: RowSource + ?Sized,
    {
        let seed = match self.lookahead.take() {
            Some(row) => row,
            None => match self.fetch(source).await? {
                Some(row) => row,
                None => return Ok(None),
            },
        };

        let parent_key = self.mapping.parent_key(&seed)?;
        let mut group = GroupBuilder::new(self.mapping, &seed)?;
        group.fold(&seed)?;
        let mut rows = 1;

        while let Some(row) = self.fetch(source).await? {
            if self.mapping.parent_key(&row)? != parent_key {
                trace!(rows, "group boundary");
                self.lookahead = Some(row);
                break;
            }
            group.fold(&row)?;
            rows += 1;
        }

        Ok(Some(group.finish()))
    }

    /// Discards the lookahead row, if any.
    pub fn reset(&mut self) {
        self.lookahead = None;
    }

    /// Checks whether a row of the next group is buffered.
    pub fn has_lookahead(&self) -> bool {
        self.lookahead.is_some()
    }

    async fn fetch<S>(&mut self, source: &mut S) -> CursorResult<Option<RawRow>>
    where
        S: RowSource + ?Sized,
    {
        if self.drained {
            return Ok(None);
        }
        let row = source.try_fetch_row().await?;
        if row.is_none() {
            trace!("source exhausted");
            self.drained = true;
        }
        Ok(row)
    }
}

/// A result object under construction.
struct GroupBuilder<'m> {
    mapping: &'m ResultMapping,
    object: ResultObject,
    /// Child keys already present, per collection (in mapping order).
    seen: Vec<HashSet<Key>>,
}

impl<'m> GroupBuilder<'m> {
    fn new(mapping: &'m ResultMapping, seed: &RawRow) -> CursorResult<Self> {
        let collections = mapping
            .collections()
            .iter()
            .map(|collection| NestedCollection::new(collection.name().to_owned()))
            .collect();
        Ok(GroupBuilder {
            mapping,
            object: ResultObject::new(mapping.scalars(seed)?, collections),
            seen: vec![HashSet::new(); mapping.collections().len()],
        })
    }

    /// Folds the nested collection columns of the given row into the object.
    ///
    /// Each collection is de-duplicated on its own child key, independently of
    /// the other collections.
    fn fold(&mut self, row: &RawRow) -> CursorResult<()> {
        let targets = self.object.collections_mut().iter_mut().zip(&mut self.seen);
        for (mapping, (collection, seen)) in self.mapping.collections().iter().zip(targets) {
            let Some(key) = mapping.child_key(row)? else {
                continue;
            };
            if seen.contains(&key) {
                continue;
            }
            collection.push(mapping.child(row)?);
            seen.insert(key);
        }
        Ok(())
    }

    fn finish(self) -> ResultObject {
        self.object
    }
}
