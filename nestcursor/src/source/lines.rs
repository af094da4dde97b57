use std::{collections::HashSet, path::Path};

use async_trait::async_trait;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
};
use tracing::{debug, trace};

use crate::{
    config::{FIELD_SEPARATOR, NULL_MARKER},
    error::{CursorResult, Error},
    row::{
        value::Value,
        values::{RawRow, Values},
    },
    source::RowSource,
    util::macros::get_or_insert_with,
};

/// A row source over tab-separated lines.
///
/// The first line is the header, holding distinct column names. Every
/// following line is a row with exactly as many cells as the header. Cells
/// equal to [`NULL_MARKER`] decode to [`Value::Null`]; every other cell
/// decodes to [`Value::Text`]. Blank lines are skipped.
pub struct LineSource<R> {
    lines: Lines<R>,
    header: Option<Vec<String>>,
    line: usize,
    closed: bool,
}

#[async_trait]
impl<R> RowSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn open(&mut self) -> CursorResult<()> {
        let columns = self.header().await?;
        debug!(columns, "read line source header");
        Ok(())
    }

    async fn try_fetch_row(&mut self) -> CursorResult<Option<RawRow>> {
        if self.closed {
            return Ok(None);
        }
        self.header().await?;

        loop {
            let Some(line) = self.lines.next_line().await? else {
                trace!(line = self.line, "end of input");
                return Ok(None);
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            let header = self.header.as_deref().unwrap_or_default();
            return decode(header, &line, self.line).map(Some);
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Constructs a new line source over the given reader.
    pub fn new(reader: R) -> Self {
        LineSource {
            lines: reader.lines(),
            header: None,
            line: 0,
            closed: false,
        }
    }

    /// Reads the header on first access. Returns the number of columns.
    async fn header(&mut self) -> CursorResult<usize> {
        let header = get_or_insert_with!(&mut self.header, || {
            match self.lines.next_line().await? {
                Some(line) => {
                    self.line += 1;
                    parse_header(&line, self.line)?
                }
                None => Vec::new(),
            }
        });
        Ok(header.len())
    }
}

impl LineSource<BufReader<File>> {
    /// Opens a line source over the file at the given path.
    pub async fn open_file(path: &Path) -> CursorResult<Self> {
        let file = File::open(path).await?;
        Ok(LineSource::new(BufReader::new(file)))
    }
}

fn parse_header(line: &str, line_no: usize) -> CursorResult<Vec<String>> {
    let mut seen = HashSet::new();
    line.split(FIELD_SEPARATOR)
        .map(|column| {
            if !seen.insert(column) {
                return Err(Error::MalformedRow {
                    line: line_no,
                    reason: format!("duplicate column `{column}`").into(),
                });
            }
            Ok(column.to_owned())
        })
        .collect()
}

fn decode(header: &[String], line: &str, line_no: usize) -> CursorResult<Values> {
    let mut values = Values::with_capacity(header.len());
    let mut cells = line.split(FIELD_SEPARATOR);
    for column in header {
        let Some(cell) = cells.next() else {
            return Err(Error::MalformedRow {
                line: line_no,
                reason: format!("missing cell for column `{column}`").into(),
            });
        };
        let value = if cell == NULL_MARKER {
            Value::Null
        } else {
            Value::Text(cell.to_owned())
        };
        values.set(column.clone(), value);
    }
    if cells.next().is_some() {
        return Err(Error::MalformedRow {
            line: line_no,
            reason: format!("more than {} cells", header.len()).into(),
        });
    }
    Ok(values)
}
