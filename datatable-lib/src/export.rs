//! Export of the rendered rows to CSV or JSON.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ExportError;
use crate::model::Accessor;
use crate::model::ColumnDef;
use crate::model::TableRow;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    /// Not produced natively; written as CSV.
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv | ExportFormat::Xlsx => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
        }
    }
}

/// What to export and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Export only the selected rows, when any are selected.
    pub include_selected_only: bool,
    /// Passed through to custom exporters.
    pub include_filters: bool,
    /// Defaults to `export.<extension>`.
    pub filename: Option<String>,
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_selected_only(mut self, selected_only: bool) -> Self {
        self.include_selected_only = selected_only;
        self
    }

    pub fn with_filters(mut self, include_filters: bool) -> Self {
        self.include_filters = include_filters;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Filename to write, falling back to `export.<extension>`.
    pub fn resolved_filename(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("export.{}", self.format.extension()))
    }
}

/// A column as seen by the exporter.
pub struct ExportColumn<T> {
    pub id: String,
    pub header: String,
    pub accessor: Accessor<T>,
}

impl<T: TableRow> ExportColumn<T> {
    /// Projects a column definition: export header, and the raw cell value.
    pub fn from_def(column: &ColumnDef<T>) -> Self {
        let def = column.clone();
        Self {
            id: column.id.clone(),
            header: column.export_header(),
            accessor: Arc::new(move |row| def.value(row)),
        }
    }
}

impl<T> std::fmt::Debug for ExportColumn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportColumn")
            .field("id", &self.id)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// A finished export ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub format: ExportFormat,
    pub mime_type: &'static str,
    pub contents: String,
}

/// Writes CSV: a header row, then one line per row.
///
/// Null cells are empty fields. Fields containing a comma, a quote, `\n` or
/// `\r` are quoted with inner quotes doubled. A line holding a single empty
/// field is left blank. No trailing newline.
pub fn to_csv<T>(rows: &[T], columns: &[ExportColumn<T>]) -> Result<String, ExportError> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary);

    let bytes = match columns {
        [column] => single_column_csv(&builder, rows, column)?,
        _ => {
            let mut writer = builder.from_writer(Vec::new());
            writer.write_record(columns.iter().map(|c| c.header.as_str()))?;
            for row in rows {
                writer.write_record(columns.iter().map(|c| (c.accessor)(row).to_string()))?;
            }
            writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?
        }
    };

    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// csv writes a record made of one empty field as `""`
fn single_column_csv<T>(
    builder: &csv::WriterBuilder,
    rows: &[T],
    column: &ExportColumn<T>,
) -> Result<Vec<u8>, ExportError> {
    let cells = rows.iter().map(|row| (column.accessor)(row).to_string());
    let fields = std::iter::once(column.header.clone()).chain(cells);
    let mut out = Vec::new();
    for field in fields {
        if field.is_empty() {
            out.push(b'\n');
            continue;
        }
        let mut writer = builder.from_writer(&mut out);
        writer.write_record([field.as_str()])?;
        writer.flush()?;
    }
    Ok(out)
}

/// Writes the rows as a pretty-printed JSON array.
pub fn to_json<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Builds the artifact for `options`.
///
/// XLSX is written as CSV with the extension rewritten.
pub fn build_artifact<T: Serialize>(
    rows: &[T],
    columns: &[ExportColumn<T>],
    options: &ExportOptions,
) -> Result<ExportArtifact, ExportError> {
    let filename = options.resolved_filename();
    let artifact = match options.format {
        ExportFormat::Csv => ExportArtifact {
            filename,
            format: ExportFormat::Csv,
            mime_type: ExportFormat::Csv.mime_type(),
            contents: to_csv(rows, columns)?,
        },
        ExportFormat::Json => ExportArtifact {
            filename,
            format: ExportFormat::Json,
            mime_type: ExportFormat::Json.mime_type(),
            contents: to_json(rows)?,
        },
        ExportFormat::Xlsx => {
            log::warn!("XLSX export not implemented, falling back to CSV");
            ExportArtifact {
                filename: Path::new(&filename).with_extension("csv").to_string_lossy().into_owned(),
                format: ExportFormat::Csv,
                mime_type: ExportFormat::Csv.mime_type(),
                contents: to_csv(rows, columns)?,
            }
        }
    };
    log::debug!("Built {} export '{}'", artifact.format.extension(), artifact.filename);
    Ok(artifact)
}

/// Receives finished exports.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<(), ExportError>;
}

/// Replaces the built-in export entirely. Receives only the options.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, options: ExportOptions) -> Result<(), ExportError>;
}

/// Writes artifacts as files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path an artifact with `filename` is written to.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<(), ExportError> {
        let path = self.path_for(&artifact.filename);
        tokio::fs::write(&path, artifact.contents.as_bytes()).await?;
        log::info!("Exported {} to {}", artifact.filename, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::model::Record;

    fn columns() -> Vec<ExportColumn<Record>> {
        vec![
            ExportColumn::from_def(&ColumnDef::new("name", "name").accessor_key("name")),
            ExportColumn::from_def(&ColumnDef::new("note", "note").accessor_key("note")),
        ]
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        let rows = vec![Record::new(1).set("name", "A,B").set("note", "He said \"hi\"")];
        let csv = to_csv(&rows, &columns()).unwrap();
        assert_eq!(csv, "name,note\n\"A,B\",\"He said \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_nulls_are_empty() {
        let rows = vec![
            Record::new(1).set("name", "x").set("note", CellValue::Null),
            Record::new(2).set("name", 3).set("note", "line\nbreak"),
        ];
        let csv = to_csv(&rows, &columns()).unwrap();
        assert_eq!(csv, "name,note\nx,\n3,\"line\nbreak\"");
    }

    #[test]
    fn test_json_is_pretty_array() {
        let rows = vec![Record::new(1).set("name", "A")];
        let json = to_json(&rows).unwrap();
        assert_eq!(json, "[\n  {\n    \"name\": \"A\"\n  }\n]");
    }

    #[test]
    fn test_xlsx_falls_back_to_csv() {
        let rows = vec![Record::new(1).set("name", "A").set("note", "b")];
        let options = ExportOptions::new(ExportFormat::Xlsx).with_filename("people.xlsx");
        let artifact = build_artifact(&rows, &columns(), &options).unwrap();
        assert_eq!(artifact.filename, "people.csv");
        assert_eq!(artifact.format, ExportFormat::Csv);
        assert_eq!(artifact.contents, "name,note\nA,b");
    }

    #[test]
    fn test_xlsx_fallback_rewrites_only_the_extension() {
        let rows = vec![Record::new(1).set("name", "A").set("note", "b")];
        let named = ExportOptions::new(ExportFormat::Xlsx).with_filename("q.xlsx.backup.xlsx");
        assert_eq!(build_artifact(&rows, &columns(), &named).unwrap().filename, "q.xlsx.backup.csv");
        let bare = ExportOptions::new(ExportFormat::Xlsx).with_filename("report");
        assert_eq!(build_artifact(&rows, &columns(), &bare).unwrap().filename, "report.csv");
        let default = ExportOptions::new(ExportFormat::Xlsx);
        assert_eq!(build_artifact(&rows, &columns(), &default).unwrap().filename, "export.csv");
    }

    #[test]
    fn test_single_empty_field_line_is_blank() {
        let column = vec![ExportColumn::from_def(&ColumnDef::new("note", "note").accessor_key("note"))];
        let rows = vec![
            Record::new(1).set("note", CellValue::Null),
            Record::new(2).set("note", "x"),
            Record::new(3).set("note", "a\rb"),
        ];
        let csv = to_csv(&rows, &column).unwrap();
        assert_eq!(csv, "note\n\nx\n\"a\rb\"");
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(ExportOptions::new(ExportFormat::Json).resolved_filename(), "export.json");
    }
}
