//! Column-oriented CSV comparison.
//!
//! A CSV file is read as a table of named columns: the first record is the
//! header, every following record fills the columns positionally. Two files
//! are equal when they have the same column names and every column holds the
//! same values in the same order. Column order does not matter.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use rsqa_utils::error::{AssertionError, FixtureError, QaError};

use crate::charset;
use crate::hex::to_hex;

/// Separator, quote character and charset of a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDialect {
    pub separator: char,
    pub quote: char,
    /// Encoding label, e.g. `UTF-8` or `ISO-8859-1`
    pub charset: String,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            separator: ',',
            quote: '"',
            charset: charset::DEFAULT_CHARSET.to_string(),
        }
    }
}

impl CsvDialect {
    #[must_use]
    pub fn new(separator: char, quote: char) -> Self {
        Self {
            separator,
            quote,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    fn reader_builder(&self) -> Result<::csv::ReaderBuilder, FixtureError> {
        let separator = ascii_byte("separator", self.separator)?;
        let quote = ascii_byte("quote", self.quote)?;
        if separator == quote {
            return Err(FixtureError::InvalidDialect {
                reason: format!("separator and quote are both '{}'", self.separator),
            });
        }

        let mut builder = ::csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(separator)
            .quote(quote);
        Ok(builder)
    }
}

fn ascii_byte(role: &str, c: char) -> Result<u8, FixtureError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(FixtureError::InvalidDialect {
            reason: format!("{role} '{c}' is not an ASCII character"),
        })
    }
}

/// Named columns of a CSV file, in header order.
///
/// All columns hold the same number of cells. An empty file yields a table
/// without columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    columns: Vec<String>,
    cells: HashMap<String, Vec<String>>,
}

impl CsvTable {
    /// Column names in header order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.cells.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows, header excluded.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .and_then(|name| self.cells.get(name))
            .map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read and decode `path` as a [`CsvTable`].
///
/// # Errors
///
/// Returns [`FixtureError`] when the file cannot be read, the dialect is
/// unusable, the charset is unknown, or the header repeats a column name.
pub fn parse_csv(path: &Path, dialect: &CsvDialect) -> Result<CsvTable, FixtureError> {
    let encoding = charset::resolve(&dialect.charset)?;
    let bytes = fs::read(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = charset::decode(encoding, &bytes, path);
    parse_csv_text(&text, dialect, path)
}

/// Parse already decoded CSV text. `origin` only names the source in errors.
///
/// # Errors
///
/// Same as [`parse_csv`], minus the read and charset failures.
pub fn parse_csv_text(
    text: &str,
    dialect: &CsvDialect,
    origin: &Path,
) -> Result<CsvTable, FixtureError> {
    let parse_error = |e: ::csv::Error| FixtureError::Parse {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    };

    let builder = dialect.reader_builder()?;
    let mut lines = split_records(text, dialect.separator, dialect.quote).into_iter();

    let Some(header) = lines.next() else {
        return Ok(CsvTable::default());
    };
    let header = parse_record(&builder, header).map_err(parse_error)?;

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for name in header {
        if !seen.insert(name.clone()) {
            return Err(FixtureError::DuplicateColumn {
                path: origin.to_path_buf(),
                column: name,
            });
        }
        columns.push(name);
    }

    let mut values: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for line in lines {
        let record = parse_record(&builder, line).map_err(parse_error)?;
        for (index, column) in values.iter_mut().enumerate() {
            column.push(record.get(index).cloned().unwrap_or_default());
        }
    }

    let cells = columns.iter().cloned().zip(values).collect();
    Ok(CsvTable { columns, cells })
}

/// Split `text` into one slice per record, terminators removed.
///
/// The `csv` reader skips blank lines, but a blank line is a record holding
/// one empty field, so records are cut here and parsed one by one. Quoted
/// fields may span lines. A terminator at the very end does not start
/// another record.
fn split_records(text: &str, separator: char, quote: char) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if in_quotes {
            if c == quote {
                if chars.peek().is_some_and(|&(_, next)| next == quote) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            '\n' | '\r' => {
                records.push(&text[start..index]);
                if c == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n') {
                    chars.next();
                }
                start = chars.peek().map_or(text.len(), |&(next, _)| next);
                field_start = true;
            }
            c if c == quote && field_start => {
                in_quotes = true;
                field_start = false;
            }
            c if c == separator => field_start = true,
            _ => field_start = false,
        }
    }

    if start < text.len() {
        records.push(&text[start..]);
    }
    records
}

fn parse_record(builder: &::csv::ReaderBuilder, line: &str) -> Result<Vec<String>, ::csv::Error> {
    match builder.from_reader(line.as_bytes()).records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(vec![String::new()]),
    }
}

/// Compare two CSV files column by column.
///
/// # Errors
///
/// [`QaError::Fixture`] when either file cannot be parsed,
/// [`QaError::Assertion`] on the first difference found.
pub fn compare_csv_files(left: &Path, right: &Path, dialect: &CsvDialect) -> Result<(), QaError> {
    let left_table = parse_csv(left, dialect)?;
    let right_table = parse_csv(right, dialect)?;
    compare_tables(&left_table, &right_table, left, right)?;

    tracing::debug!(
        left = %left.display(),
        right = %right.display(),
        columns = left_table.column_count(),
        rows = left_table.row_count(),
        "CSV files match"
    );
    Ok(())
}

/// Compare two parsed tables; `left` and `right` name them in diagnostics.
///
/// Columns are visited in the left table's header order and the first
/// differing cell of the first differing column is reported.
///
/// # Errors
///
/// Returns the [`AssertionError`] describing the first difference.
pub fn compare_tables(
    left_table: &CsvTable,
    right_table: &CsvTable,
    left: &Path,
    right: &Path,
) -> Result<(), AssertionError> {
    let only_in_left = missing_from(left_table, right_table);
    let only_in_right = missing_from(right_table, left_table);
    if !only_in_left.is_empty() || !only_in_right.is_empty() {
        return Err(AssertionError::ColumnSetMismatch {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
            left_count: left_table.column_count(),
            right_count: right_table.column_count(),
            only_in_left,
            only_in_right,
        });
    }

    for name in left_table.columns() {
        let left_values = left_table.column(name).unwrap_or_default();
        let right_values = right_table.column(name).unwrap_or_default();

        if left_values.len() != right_values.len() {
            return Err(AssertionError::RowCountMismatch {
                column: name.clone(),
                left_rows: left_values.len(),
                right_rows: right_values.len(),
            });
        }

        if let Some((row, (l, r))) = left_values
            .iter()
            .zip(right_values)
            .enumerate()
            .find(|(_, (l, r))| l != r)
        {
            return Err(AssertionError::CellMismatch {
                column: name.clone(),
                row,
                left_value: l.clone(),
                right_value: r.clone(),
                left_hex: to_hex(l),
                right_hex: to_hex(r),
            });
        }
    }

    Ok(())
}

/// Columns of `table` that `other` lacks, in `table`'s header order.
fn missing_from(table: &CsvTable, other: &CsvTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|name| other.column(name).is_none())
        .cloned()
        .collect()
}
