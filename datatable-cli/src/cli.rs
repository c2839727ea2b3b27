//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use datatable_lib::export::ExportFormat;
use datatable_lib::filter::ColumnFilter;
use datatable_lib::filter::FilterCondition;
use datatable_lib::filter::FilterOperator;
use datatable_lib::sort::SortState;
use simplelog::LevelFilter;

use crate::error::CliError;

#[derive(Debug, Parser, Clone)]
#[command(name = "datatable", about = "Filter, sort and export JSON rows")]
pub struct Args {
    /// JSON file holding an array of row objects
    #[arg(short, long)]
    pub rows: PathBuf,

    /// JSON file with column definitions and table options
    #[arg(long)]
    pub view: Option<PathBuf>,

    /// Field holding each row's id
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// Global search term
    #[arg(short, long)]
    pub search: Option<String>,

    /// Column filter as `column:operator:value`, e.g. `age:between:[26,40]`
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Sort as `column` or `column:desc`
    #[arg(long)]
    pub sort: Option<String>,

    /// Comma separated columns to show
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the export to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    /// Export format, or `None` for the plain text table.
    pub fn export_format(self) -> Option<ExportFormat> {
        match self {
            OutputFormat::Table => None,
            OutputFormat::Csv => Some(ExportFormat::Csv),
            OutputFormat::Json => Some(ExportFormat::Json),
        }
    }
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn sort_state(&self) -> Result<Option<SortState>, CliError> {
        let Some(sort) = &self.sort else {
            return Ok(None);
        };
        let state = match sort.split_once(':') {
            None => SortState::asc(sort.as_str()),
            Some((column, "asc")) => SortState::asc(column),
            Some((column, "desc")) => SortState::desc(column),
            Some(_) => return Err(CliError::InvalidArgument(format!("bad sort '{}'", sort))),
        };
        Ok(Some(state))
    }

    pub fn column_filters(&self) -> Result<Vec<ColumnFilter>, CliError> {
        self.filters.iter().map(|f| parse_filter(f)).collect()
    }
}

/// Parses `column:operator:value`. The value is read as JSON when it parses,
/// otherwise as a plain string.
pub fn parse_filter(arg: &str) -> Result<ColumnFilter, CliError> {
    let invalid = |reason: &str| CliError::InvalidArgument(format!("bad filter '{}': {}", arg, reason));

    let mut parts = arg.splitn(3, ':');
    let (Some(column), Some(operator), Some(raw)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("expected column:operator:value"));
    };
    let operator: FilterOperator = serde_json::from_value(serde_json::Value::String(operator.to_string()))
        .map_err(|_| invalid("unknown operator"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    let condition = FilterCondition::from_json(operator, value).map_err(|e| invalid(&e))?;
    Ok(ColumnFilter::new(column, condition))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["datatable", "--rows", "rows.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_parse_between_filter() {
        let filter = parse_filter("age:between:[26,40]").unwrap();
        assert_eq!(filter, ColumnFilter::between("age", 26, 40));
    }

    #[test]
    fn test_parse_text_filter_keeps_colons() {
        let filter = parse_filter("note:contains:a:b").unwrap();
        assert_eq!(filter, ColumnFilter::contains("note", "a:b"));
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(parse_filter("age").is_err());
        assert!(parse_filter("age:near:3").is_err());
        assert!(parse_filter("age:between:5").is_err());
    }

    #[test]
    fn test_sort_argument() {
        assert_eq!(args(&[]).sort_state().unwrap(), None);
        assert_eq!(args(&["--sort", "age"]).sort_state().unwrap(), Some(SortState::asc("age")));
        assert_eq!(
            args(&["--sort", "age:desc"]).sort_state().unwrap(),
            Some(SortState::desc("age"))
        );
        assert!(args(&["--sort", "age:up"]).sort_state().is_err());
    }

    #[test]
    fn test_columns_are_comma_separated() {
        let args = args(&["--columns", "name,age", "-vv"]);
        assert_eq!(args.columns, vec!["name", "age"]);
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }
}
