use futures_util::StreamExt;
use nestcursor::{
    config::RowBounds, error::CursorResult, row::value::Value, source::VecSource, Cursor,
};
use test_utils::{assert_user, user_row, users_mapping, users_rows, ScriptedSource};

mod test_utils;

#[tokio::test]
async fn test_sorted_rows_ordered_result() -> CursorResult<()> {
    test_utils::setup_tracing(None);

    let mapping = users_mapping();
    let mut cursor = Cursor::new(VecSource::new(users_rows()), &mapping, RowBounds::DEFAULT);
    assert!(!cursor.is_open());

    // Retrieving the iterator doesn't start fetching.
    let mut iter = cursor.iter()?;
    assert!(!iter.is_open());

    assert!(iter.has_next().await?);
    assert!(iter.is_open());
    assert!(!iter.is_consumed());

    assert_user(&iter.next()?, 1, "User1", &[1, 2, 3], &[1, 2, 3, 4]);
    assert!(iter.has_next().await?);
    assert_user(&iter.next()?, 2, "User2", &[1], &[1, 2, 3]);
    assert!(iter.has_next().await?);
    assert_user(&iter.next()?, 3, "User3", &[1, 2, 3], &[1]);
    assert!(iter.has_next().await?);
    assert_user(&iter.next()?, 4, "User4", &[1, 2], &[1, 2]);

    assert!(iter.is_open());
    assert!(!iter.is_consumed());
    assert_eq!(iter.current_index(), 3);

    assert!(!iter.has_next().await?);
    assert!(!iter.is_open());
    assert!(iter.is_consumed());

    // Exhaustion is sticky.
    assert!(!iter.has_next().await?);
    assert!(iter.is_consumed());
    Ok(())
}

#[tokio::test]
async fn test_group_sizes_follow_distinct_child_keys() -> CursorResult<()> {
    let mapping = users_mapping();
    let mut cursor = Cursor::new(VecSource::new(users_rows()), &mapping, RowBounds::DEFAULT);
    let objects = cursor.iter()?.try_collect().await?;

    let sizes: Vec<_> = objects
        .iter()
        .map(|user| {
            (
                user.collection("groups").unwrap().len(),
                user.collection("roles").unwrap().len(),
            )
        })
        .collect();
    assert_eq!(sizes, [(3, 4), (1, 3), (3, 1), (2, 2)]);
    assert!(cursor.is_consumed());
    Ok(())
}

#[tokio::test]
async fn test_misordered_rows_fragment_groups() -> CursorResult<()> {
    let mapping = users_mapping();
    let rows = vec![
        user_row(1, "A", 1, 1),
        user_row(1, "A", 2, 1),
        user_row(2, "B", 1, 1),
        user_row(1, "A", 3, 2),
    ];
    let mut cursor = Cursor::new(VecSource::new(rows), &mapping, RowBounds::DEFAULT);
    let objects = cursor.iter()?.try_collect().await?;

    let names: Vec<_> = objects.iter().map(|user| user.get("name").unwrap()).collect();
    assert_eq!(
        names,
        [&Value::from("A"), &Value::from("B"), &Value::from("A")]
    );
    assert_user(&objects[0], 1, "A", &[1, 2], &[1]);
    assert_user(&objects[2], 1, "A", &[3], &[2]);
    Ok(())
}

#[tokio::test]
async fn test_has_next_fetches_once() -> CursorResult<()> {
    let mapping = users_mapping();
    let (source, counters) = ScriptedSource::from_rows(users_rows());
    let mut cursor = Cursor::new(source, &mapping, RowBounds::DEFAULT);
    let mut iter = cursor.iter()?;

    assert!(iter.has_next().await?);
    // The four rows of the first user, plus the first row of the second.
    assert_eq!(counters.fetches(), 5);
    assert_eq!(counters.opens(), 1);

    assert!(iter.has_next().await?);
    assert!(iter.has_next().await?);
    assert_eq!(counters.fetches(), 5);

    assert_user(&iter.next()?, 1, "User1", &[1, 2, 3], &[1, 2, 3, 4]);
    assert_eq!(counters.fetches(), 5);
    Ok(())
}

#[tokio::test]
async fn test_stream() -> CursorResult<()> {
    let mapping = users_mapping();
    let mut cursor = Cursor::new(VecSource::new(users_rows()), &mapping, RowBounds::DEFAULT);

    let ids: Vec<_> = cursor
        .iter()?
        .into_stream()
        .map(|user| user.map(|user| user.get("id").cloned()))
        .collect()
        .await;
    let ids = ids.into_iter().collect::<CursorResult<Vec<_>>>()?;

    assert_eq!(
        ids,
        [1, 2, 3, 4].map(|id| Some(Value::Int(id)))
    );
    assert!(cursor.is_consumed());
    Ok(())
}

#[tokio::test]
async fn test_empty_source() -> CursorResult<()> {
    let mapping = users_mapping();
    let (source, counters) = ScriptedSource::from_rows(Vec::new());
    let mut cursor = Cursor::new(source, &mapping, RowBounds::DEFAULT);
    let mut iter = cursor.iter()?;

    assert!(!iter.has_next().await?);
    assert!(iter.is_consumed());
    assert_eq!(iter.current_index(), -1);
    assert_eq!(counters.fetches(), 1);
    assert_eq!(counters.closes(), 1);
    Ok(())
}
