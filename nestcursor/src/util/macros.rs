/// Builds a [`Values`](crate::row::values::Values) map, in column order.
///
/// ```
/// use nestcursor::{row::value::Value, values};
///
/// let row = values! { "id" => 1, "name" => "User1", "group_id" => Value::Null };
/// assert_eq!(row.get("name"), Some(&Value::Text("User1".into())));
/// ```
#[macro_export]
macro_rules! values {
    ($($column:expr => $value:expr),* $(,)?) => {
        $crate::row::values::Values::from(::std::vec![
            $((
                ::std::string::String::from($column),
                $crate::row::value::Value::from($value),
            )),*
        ])
    };
}

macro_rules! get_or_insert_with {
    ($opt:expr, || $($init:tt)*) => {
        if let Some(inner) = $opt {
            inner
        } else {
            let init_val = {
                $($init)*
            };
            $opt.insert(init_val)
        }
    }
}
pub(crate) use get_or_insert_with;
