//! # Plantilla CLI
//!
//! Command-line interface for compiling document templates into layout plans.
//!
//! ## Usage
//!
//! ```bash
//! # Compile a document against runtime variables
//! plantilla render invoice.json --vars order.json --pretty
//!
//! # Check variables without rendering
//! plantilla validate invoice.json --vars order.json
//!
//! # Compile one plan per record, in parallel
//! plantilla batch invoice.json --records orders.json --out-dir plans/
//!
//! # List component types with their editor defaults
//! plantilla components --pretty
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use plantilla::{
    ContentMeasurer, DocumentContent, NoMeasurement, PageSettings, PlantillaError, TextEstimate,
    compile_batch, component_catalog,
};

/// Plantilla - document template compiler
#[derive(Parser, Debug)]
#[command(name = "plantilla")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a document into a layout plan
    Render {
        /// Document JSON file
        document: PathBuf,

        /// Runtime variables as a JSON object file
        #[arg(long, value_name = "FILE")]
        vars: Option<PathBuf>,

        /// Write the plan here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pretty-print the plan JSON
        #[arg(long)]
        pretty: bool,

        /// Override the document's page size (a4, letter, legal, or WIDTHxHEIGHT in mm)
        #[arg(long, value_parser = PageSettings::parse)]
        page_size: Option<PageSettings>,

        /// Skip content measurement and keep designed heights
        #[arg(long)]
        no_estimate: bool,
    },

    /// Check runtime variables against a document's definitions
    Validate {
        /// Document JSON file
        document: PathBuf,

        /// Runtime variables as a JSON object file
        #[arg(long, value_name = "FILE")]
        vars: Option<PathBuf>,
    },

    /// Compile one plan per record from a dataset, in parallel
    Batch {
        /// Document JSON file
        document: PathBuf,

        /// JSON array of runtime variable records
        #[arg(long, value_name = "FILE")]
        records: PathBuf,

        /// Write one plan file per record into this directory
        /// (omit to stream compact plans to stdout, one per line)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Skip content measurement and keep designed heights
        #[arg(long)]
        no_estimate: bool,

        /// Suppress per-record progress on stderr
        #[arg(long)]
        quiet: bool,
    },

    /// List component types with their editor defaults
    Components {
        /// Pretty-print the catalog JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PlantillaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            document,
            vars,
            output,
            pretty,
            page_size,
            no_estimate,
        } => render(
            &document,
            vars.as_deref(),
            output.as_deref(),
            pretty,
            page_size,
            no_estimate,
        ),
        Commands::Validate { document, vars } => validate(&document, vars.as_deref()),
        Commands::Batch {
            document,
            records,
            out_dir,
            no_estimate,
            quiet,
        } => batch(&document, &records, out_dir.as_deref(), no_estimate, quiet),
        Commands::Components { pretty } => emit_json(None, pretty, &component_catalog()),
    }
}

fn render(
    document: &Path,
    vars: Option<&Path>,
    output: Option<&Path>,
    pretty: bool,
    page_size: Option<PageSettings>,
    no_estimate: bool,
) -> Result<(), PlantillaError> {
    let mut content = load_document(document)?;
    if let Some(settings) = page_size {
        content.settings.page_settings = settings;
    }
    let runtime = load_variables(vars)?;
    let plan = content.compile(&runtime, measurer_for(no_estimate))?;
    emit_json(output, pretty, &plan)
}

fn validate(document: &Path, vars: Option<&Path>) -> Result<(), PlantillaError> {
    let content = load_document(document)?;
    let runtime = load_variables(vars)?;

    match content.resolve_variables(&runtime) {
        Ok((_, issues)) => {
            let payload = serde_json::json!({ "isValid": true, "computedIssues": issues });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(PlantillaError::Validation(report)) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Err(PlantillaError::Validation(report))
        }
        Err(other) => Err(other),
    }
}

fn batch(
    document: &Path,
    records_path: &Path,
    out_dir: Option<&Path>,
    no_estimate: bool,
    quiet: bool,
) -> Result<(), PlantillaError> {
    let content = load_document(document)?;
    let records: Vec<HashMap<String, Value>> =
        serde_json::from_str(&fs::read_to_string(records_path)?)?;
    let total = records.len();
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    let done = AtomicUsize::new(0);
    let results = compile_batch(&content, &records, measurer_for(no_estimate), |_| {
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if !quiet {
            eprintln!("compiled {finished}/{total}");
        }
    });

    let mut failed = 0usize;
    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(plan) => match out_dir {
                Some(dir) => {
                    let path = dir.join(format!("record-{index:04}.json"));
                    fs::write(path, serde_json::to_string_pretty(plan)?)?;
                }
                None => println!("{}", serde_json::to_string(plan)?),
            },
            Err(error) => {
                failed += 1;
                eprintln!("record {index}: {error}");
            }
        }
    }

    if failed > 0 {
        return Err(PlantillaError::Content(format!(
            "{failed} of {total} record(s) failed"
        )));
    }
    Ok(())
}

fn measurer_for(no_estimate: bool) -> &'static dyn ContentMeasurer {
    if no_estimate { &NoMeasurement } else { &TextEstimate }
}

fn load_document(path: &Path) -> Result<DocumentContent, PlantillaError> {
    DocumentContent::from_json(&fs::read_to_string(path)?)
}

fn load_variables(path: Option<&Path>) -> Result<HashMap<String, Value>, PlantillaError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(HashMap::new()),
    }
}

fn emit_json<T: Serialize>(
    output: Option<&Path>,
    pretty: bool,
    value: &T,
) -> Result<(), PlantillaError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}
