//! View files: column definitions and options stored as JSON

use std::collections::BTreeSet;
use std::path::Path;

use datatable_lib::model::ColumnDef;
use datatable_lib::model::ColumnSpec;
use datatable_lib::model::Record;
use datatable_lib::options::DataTableOptions;
use serde::Deserialize;

use crate::error::CliError;

/// Contents of a `--view` file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewFile {
    pub columns: Vec<ColumnSpec>,
    pub options: DataTableOptions,
    pub id_field: Option<String>,
}

impl ViewFile {
    pub async fn load(path: &Path) -> Result<Self, CliError> {
        let text = tokio::fs::read_to_string(path).await?;
        let view = serde_json::from_str(&text)?;
        log::debug!("Loaded view from {}", path.display());
        Ok(view)
    }

    /// Column definitions, or one text column per field seen in `records`.
    pub fn column_defs(&self, records: &[Record]) -> Vec<ColumnDef<Record>> {
        if !self.columns.is_empty() {
            return self.columns.iter().cloned().map(ColumnSpec::into_column).collect();
        }
        infer_columns(records)
    }
}

/// One column per field, in first-seen order.
pub fn infer_columns(records: &[Record]) -> Vec<ColumnDef<Record>> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.fields().keys() {
            if seen.insert(key.clone()) {
                columns.push(ColumnDef::new(key.clone(), key.clone()).accessor_key(key.clone()));
            }
        }
    }
    log::debug!("Inferred {} columns", columns.len());
    columns
}

pub async fn load_records(path: &Path, id_field: &str) -> Result<Vec<Record>, CliError> {
    let text = tokio::fs::read_to_string(path).await?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let records = Record::from_json_array(value, id_field)?;
    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_file_defaults() {
        let view: ViewFile = serde_json::from_str(r#"{"columns": [{"id": "name"}]}"#).unwrap();
        assert_eq!(view.columns.len(), 1);
        assert!(view.options.enable_sorting);
        assert_eq!(view.id_field, None);
    }

    #[test]
    fn test_infer_columns_in_first_seen_order() {
        let records = vec![
            Record::new(1).set("name", "Alice"),
            Record::new(2).set("age", 25).set("name", "Bob"),
        ];
        let ids: Vec<String> = infer_columns(&records).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["name", "age"]);
    }
}
