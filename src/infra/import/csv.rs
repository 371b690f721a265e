use thiserror::Error;

use crate::domain::entities::contact::{ContactFields, ImportRow, RowId};
use crate::domain::rules::columns::{normalize_header, ColumnMap, ContactColumn};
use crate::infra::import::tokenizer::tokenize_line;

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("The file must contain a header row and at least one data row")]
    TooShort,
    #[error("No data rows were found below the header row")]
    NoDataRows,
}

impl ParseError {
    pub fn reasons(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Result of a successful parse. Invalid rows are kept; filtering them is
/// up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContacts {
    pub columns: ColumnMap,
    pub rows: Vec<ImportRow>,
    pub skipped_blank_lines: usize,
}

impl ParsedContacts {
    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.len() - self.valid_count()
    }
}

pub fn parse_contacts_csv(content: &str) -> Result<ParsedContacts, ParseError> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    let mut lines = content.lines().skip_while(|line| line.trim().is_empty());

    let header_line = lines.next().ok_or(ParseError::TooShort)?;
    let data_lines: Vec<&str> = lines.collect();
    if data_lines.is_empty() {
        return Err(ParseError::TooShort);
    }

    let headers: Vec<String> = tokenize_line(header_line)
        .iter()
        .map(|header| normalize_header(header))
        .collect();
    let columns = ColumnMap::resolve(&headers);

    let mut rows = Vec::with_capacity(data_lines.len());
    let mut skipped_blank_lines = 0;
    for line in data_lines {
        if line.trim().is_empty() {
            skipped_blank_lines += 1;
            continue;
        }

        let values = tokenize_line(line);
        let mut fields = ContactFields::default();
        for column in ContactColumn::ALL {
            fields.set(column, columns.value(&values, column));
        }
        rows.push(ImportRow::new(RowId::generate(), fields));
    }

    if rows.is_empty() {
        return Err(ParseError::NoDataRows);
    }

    Ok(ParsedContacts {
        columns,
        rows,
        skipped_blank_lines,
    })
}
