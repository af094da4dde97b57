use std::path::PathBuf;

use clap::Parser;
use nestcursor::{
    config::RowBounds,
    error::CursorResult,
    mapping::{CollectionMapping, ResultMapping},
    row::{object::ResultObject, values::Values},
    source::LineSource,
    Cursor,
};
use tracing::info;

#[tokio::main]
async fn main() -> CursorResult<()> {
    setup_tracing();

    let args = Args::parse();
    let mapping = args.mapping()?;
    let bounds = args.bounds();

    info!(path = ?args.path, ?bounds, "reading rows");
    let source = LineSource::open_file(&args.path).await?;
    let mut cursor = Cursor::new(source, &mapping, bounds);
    let mut iter = cursor.iter()?;

    println!("{}", "-".repeat(50));
    while iter.has_next().await? {
        let object = iter.next()?;
        print_object(iter.current_index(), &object);
        println!("{}", "-".repeat(50));
    }
    info!(consumed = iter.is_consumed(), "done");

    Ok(())
}

/// Prints the nested objects reconstructed from a tab-separated file.
#[derive(Parser, Debug)]
#[command(name = "nestcursor-cli", long_about = None)]
struct Args {
    /// Tab-separated input file, with a header line
    path: PathBuf,

    /// Columns forming the parent key
    #[arg(long, required = true, value_delimiter = ',')]
    id: Vec<String>,

    /// Scalar column of the parent (repeatable)
    #[arg(long)]
    column: Vec<String>,

    /// Also map every column not claimed by a collection
    #[arg(long)]
    auto: bool,

    /// Nested collection, as `<name>=<id>[,<id>...][:<col>[,<col>...]]` (repeatable)
    #[arg(long, value_parser = parse_collection)]
    collection: Vec<CollectionMapping>,

    /// Number of objects to skip
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Maximum number of objects to print
    #[arg(long)]
    limit: Option<u64>,
}

impl Args {
    /// Builds the result mapping described by the arguments.
    fn mapping(&self) -> CursorResult<ResultMapping> {
        let mut mapping = ResultMapping::builder().auto_mapping(self.auto);
        for id in &self.id {
            mapping = mapping.id(id);
        }
        for column in &self.column {
            mapping = mapping.column(column);
        }
        for collection in &self.collection {
            mapping = mapping.collection(collection.clone());
        }
        mapping.build()
    }

    fn bounds(&self) -> RowBounds {
        RowBounds {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Parses `<name>=<id>[,<id>...][:<col>[,<col>...]]`.
fn parse_collection(spec: &str) -> Result<CollectionMapping, String> {
    let (name, columns) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected `<name>=<ids>`, found `{spec}`"))?;
    let (ids, columns) = columns.split_once(':').unwrap_or((columns, ""));

    let mut collection = CollectionMapping::new(name);
    for id in list(ids) {
        collection = collection.id(id);
    }
    for column in list(columns) {
        collection = collection.column(column);
    }
    Ok(collection)
}

fn list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').filter(|item| !item.is_empty())
}

fn print_object(index: i64, object: &ResultObject) {
    println!("#{index:<4} {}", format_values(object.fields()));
    for collection in object.collections() {
        println!("  {} ({})", collection.name(), collection.items().len());
        for item in collection.items() {
            println!("    {}", format_values(item));
        }
    }
}

fn format_values(values: &Values) -> String {
    values
        .iter()
        .map(|(column, value)| format!("{column}={value}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Sets up tracing subscriber.
fn setup_tracing() {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or("warn".into());
    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Result<Args, clap::Error> {
        Args::try_parse_from(["nestcursor-cli"].into_iter().chain(line.split(' ')))
    }

    #[test]
    fn test_parse_args() {
        let args = args(
            "users.tsv --id id,tenant --column name --collection groups=group_id:group_name \
             --collection roles=role_id --offset 2 --limit 1",
        )
        .unwrap();
        assert_eq!(args.path, PathBuf::from("users.tsv"));
        assert_eq!(args.bounds(), RowBounds::new(2, 1));

        let mapping = args.mapping().unwrap();
        assert_eq!(mapping.id_columns(), ["id", "tenant"]);
        let names: Vec<_> = mapping.collections().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["groups", "roles"]);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args("users.tsv --column name").is_err());
        assert!(args("users.tsv --id").is_err());
        assert!(args("users.tsv --id id --limit x").is_err());
        assert!(args("users.tsv --id id --collection roles").is_err());
    }

    #[test]
    fn test_invalid_mapping() {
        let args = args("users.tsv --id id --collection roles=").unwrap();
        assert!(args.mapping().is_err());
    }
}
