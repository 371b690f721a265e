use anyhow::{Context, Result};

use crate::domain::entities::contact::ImportRow;

pub const TEMPLATE_FILE_NAME: &str = "contacts_template.csv";
pub const TEMPLATE_HEADERS: [&str; 4] = ["firstName", "lastName", "email", "telephone"];

const TEMPLATE_ROWS: [[&str; 4]; 2] = [
    ["John", "Doe", "john.doe@example.com", "+1 555 010 0100"],
    ["Jane", "Smith", "jane.smith@example.com", "+1 555 010 0101"],
];

/// Reference file showing the expected import shape.
pub fn template_csv() -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(TEMPLATE_HEADERS)
        .context("failed to write template header")?;
    for row in TEMPLATE_ROWS {
        writer
            .write_record(row)
            .context("failed to write template row")?;
    }
    finish(writer)
}

/// Rows that failed validation, with their reasons in a trailing `errors`
/// column, so they can be fixed outside the app and uploaded again.
pub fn invalid_rows_csv<'a>(rows: impl IntoIterator<Item = &'a ImportRow>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(TEMPLATE_HEADERS.iter().copied().chain(["errors"]))
        .context("failed to write export header")?;

    for row in rows.into_iter().filter(|row| !row.is_valid()) {
        let fields = row.fields();
        let errors = row.errors().join("; ");
        writer
            .write_record([
                fields.first_name.as_str(),
                fields.last_name.as_str(),
                fields.email.as_str(),
                fields.telephone.as_str(),
                errors.as_str(),
            ])
            .with_context(|| format!("failed to write row {}", row.id))?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv writer: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}
