use crate::domain::model::{Operation, ResultTable};
use crate::domain::ports::Storage;
use crate::utils::error::PersistError;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

/// Writes result snapshots as `<operation>_<timestamp>.<ext>`, one file per format.
pub struct Exporter<S: Storage> {
    storage: S,
    formats: Vec<ExportFormat>,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S, formats: Vec<ExportFormat>) -> Self {
        Self { storage, formats }
    }

    /// Returns the display path of every file written.
    pub async fn save(
        &self,
        operation: Operation,
        timestamp: &str,
        table: &ResultTable,
    ) -> Result<Vec<String>, PersistError> {
        let mut saved = Vec::with_capacity(self.formats.len());

        for format in &self.formats {
            let file_name = format!(
                "{}_{}.{}",
                operation.file_stem(),
                timestamp,
                format.extension()
            );
            let data = match format {
                ExportFormat::Json => to_json(table)?,
                ExportFormat::Csv => to_delimited(table, b',')?,
                ExportFormat::Tsv => to_delimited(table, b'\t')?,
            };

            tracing::debug!("Writing {} ({} bytes)", file_name, data.len());
            self.storage.write_file(&file_name, &data).await?;
            saved.push(self.storage.display_path(&file_name));
        }

        Ok(saved)
    }
}

/// Array of records, 4-space indent.
pub fn to_json(table: &ResultTable) -> Result<Vec<u8>, PersistError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    table.serialize(&mut serializer)?;
    Ok(buf)
}

pub fn to_delimited(table: &ResultTable, delimiter: u8) -> Result<Vec<u8>, PersistError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }

    writer
        .into_inner()
        .map_err(|e| PersistError::Io(e.into_error()))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
