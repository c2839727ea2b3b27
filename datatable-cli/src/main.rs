mod cli;
mod error;
mod render;
mod view;

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use datatable_lib::DataTable;
use datatable_lib::export::DirectorySink;
use datatable_lib::export::ExportOptions;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::cli::Args;
use crate::error::CliError;
use crate::render::render_table;
use crate::view::ViewFile;
use crate::view::load_records;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) -> Result<(), CliError> {
    let level = args.log_level();
    match &args.log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), CliError> {
    init_logging(&args)?;

    let view = match &args.view {
        Some(path) => ViewFile::load(path).await?,
        None => ViewFile::default(),
    };
    let id_field = view.id_field.as_deref().unwrap_or(&args.id_field);
    let records = load_records(&args.rows, id_field).await?;
    let columns = view.column_defs(&records);

    let mut options = view.options.clone().with_export(true);
    if !args.columns.is_empty() {
        options = options.with_default_visible_columns(args.columns.iter().cloned());
    }

    let mut builder = DataTable::builder(columns).rows(records).options(options);
    if let Some(path) = &args.output {
        let dir = path.parent().unwrap_or(Path::new(""));
        builder = builder.export_sink(Arc::new(DirectorySink::new(dir)));
    }
    let mut table = builder.build()?;

    if let Some(term) = &args.search {
        table.set_global_search(term.as_str())?;
    }
    for filter in args.column_filters()? {
        table.apply_column_filter(filter)?;
    }
    if let Some(sort) = args.sort_state()? {
        table.set_sort(sort)?;
    }
    log::info!("{} of {} rows match", table.view().len(), table.rows().len());

    let Some(format) = args.format.export_format() else {
        let text = render_table(&table);
        match &args.output {
            Some(path) => tokio::fs::write(path, text).await?,
            None => print!("{}", text),
        }
        return Ok(());
    };

    let mut export = ExportOptions::new(format);
    match args.output.as_ref().and_then(|p| p.file_name()) {
        Some(name) => {
            export = export.with_filename(name.to_string_lossy());
            table.export(export).await?;
        }
        None => {
            let artifact = table.build_export(&export)?;
            println!("{}", artifact.contents);
        }
    }
    Ok(())
}
