use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use nestcursor::{
    error::{CursorResult, Error},
    mapping::{CollectionMapping, ResultMapping},
    row::{
        object::ResultObject,
        value::Value,
        values::{RawRow, Values},
    },
    source::RowSource,
    values,
};

/// Sets up tracing subscriber.
#[allow(dead_code)]
pub fn setup_tracing(level: Option<&str>) {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or("warn".into()));
    let fmt_layer = layer()
        .with_test_writer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Several tests of the same binary may race to install it.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

/// The users mapping: one user has many groups and many roles.
#[allow(dead_code)]
pub fn users_mapping() -> ResultMapping {
    ResultMapping::builder()
        .id("id")
        .column("name")
        .collection(CollectionMapping::new("groups").id("group_id"))
        .collection(CollectionMapping::new("roles").id("role_id"))
        .build()
        .unwrap()
}

/// Rows of the users query, sorted by user id. Groups have 4, 3, 3 and 2
/// rows.
#[allow(dead_code)]
pub fn users_rows() -> Vec<RawRow> {
    [
        (1, "User1", 1, 1),
        (1, "User1", 1, 2),
        (1, "User1", 2, 3),
        (1, "User1", 3, 4),
        (2, "User2", 1, 1),
        (2, "User2", 1, 2),
        (2, "User2", 1, 3),
        (3, "User3", 1, 1),
        (3, "User3", 2, 1),
        (3, "User3", 3, 1),
        (4, "User4", 1, 1),
        (4, "User4", 2, 2),
    ]
    .into_iter()
    .map(|(id, name, group_id, role_id)| user_row(id, name, group_id, role_id))
    .collect()
}

#[allow(dead_code)]
pub fn user_row(id: i32, name: &str, group_id: i32, role_id: i32) -> RawRow {
    values! {
        "id" => id,
        "name" => name,
        "group_id" => group_id,
        "role_id" => role_id,
    }
}

/// Returns the ids of the given nested collection.
#[allow(dead_code)]
pub fn child_ids(object: &ResultObject, collection: &str, column: &str) -> Vec<i64> {
    object
        .collection(collection)
        .expect("collection is mapped")
        .iter()
        .map(|child| child.get(column).and_then(Value::as_i64).expect("int id"))
        .collect()
}

/// Asserts the scalar fields and nested collections of a user.
#[allow(dead_code)]
pub fn assert_user(object: &ResultObject, id: i32, name: &str, groups: &[i64], roles: &[i64]) {
    assert_eq!(object.get("id"), Some(&Value::Int(id)));
    assert_eq!(object.get("name"), Some(&Value::Text(name.into())));
    assert_eq!(child_ids(object, "groups", "group_id"), groups);
    assert_eq!(child_ids(object, "roles", "role_id"), roles);
}

/// Counters shared between a [`ScriptedSource`] and the test.
#[allow(dead_code)]
#[derive(Default)]
pub struct SourceCounters {
    opens: AtomicUsize,
    fetches: AtomicUsize,
    closes: AtomicUsize,
}

#[allow(dead_code)]
impl SourceCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Acquire)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }
}

/// A step of a [`ScriptedSource`].
#[allow(dead_code)]
pub enum Step {
    Row(RawRow),
    Fail(&'static str),
    /// Waits before serving the following step.
    Delay(Duration),
}

/// A scripted row source which records how the cursor drives it.
#[allow(dead_code)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    counters: Arc<SourceCounters>,
    fail_open: bool,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, Arc<SourceCounters>) {
        let counters = Arc::new(SourceCounters::default());
        let source = ScriptedSource {
            steps: steps.into_iter().collect(),
            counters: Arc::clone(&counters),
            fail_open: false,
        };
        (source, counters)
    }

    pub fn from_rows(rows: Vec<Values>) -> (Self, Arc<SourceCounters>) {
        Self::new(rows.into_iter().map(Step::Row))
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

#[async_trait]
impl RowSource for ScriptedSource {
    async fn open(&mut self) -> CursorResult<()> {
        self.counters.opens.fetch_add(1, Ordering::AcqRel);
        if self.fail_open {
            return Err(Error::Source("connection refused".into()));
        }
        Ok(())
    }

    async fn try_fetch_row(&mut self) -> CursorResult<Option<RawRow>> {
        self.counters.fetches.fetch_add(1, Ordering::AcqRel);
        loop {
            match self.steps.pop_front() {
                Some(Step::Row(row)) => return Ok(Some(row)),
                Some(Step::Fail(reason)) => return Err(Error::Source(reason.into())),
                Some(Step::Delay(duration)) => tokio::time::sleep(duration).await,
                None => return Ok(None),
            }
        }
    }

    fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::AcqRel);
    }
}
