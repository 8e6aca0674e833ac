//! UML Schema CLI
//!
//! Command-line interface for converting UML/XMI models to JSON Schema.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uml_schema::{
    convert_version_dir, load_schema, rebuild_api_document, validate_payload, ConvertOptions,
    SchemaMode, ValidateError,
};

#[derive(Parser)]
#[command(name = "uml-schema")]
#[command(about = "Convert UML/XMI class models to JSON Schema and OpenAPI")]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log skipped attributes and other details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// How schemas appear in openapi.json: embed or reference
    #[arg(long, default_value = "embed", value_parser = parse_mode)]
    mode: SchemaMode,

    /// API title for openapi.json
    #[arg(long)]
    title: Option<String>,

    /// Schemas directory (default: <VERSION_DIR>/schemas)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write single-line JSON instead of indented JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert all model files (*.xml, *.xmi) in a version directory
    Convert {
        /// Version directory containing the model files (e.g. v2.1.0)
        version_dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rebuild openapi.json from the schema files already generated
    Openapi {
        /// Version directory containing the schemas directory
        version_dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate a JSON payload against a generated schema
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Schema file
        #[arg(long)]
        schema: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn parse_mode(s: &str) -> Result<SchemaMode, String> {
    SchemaMode::parse(s).ok_or_else(|| format!("unknown mode '{}': expected embed or reference", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            version_dir,
            output,
            json,
        } => run_convert(&version_dir, output, json),
        Commands::Openapi {
            version_dir,
            output,
        } => run_openapi(&version_dir, output),
        Commands::Validate {
            payload,
            schema,
            json,
        } => run_validate(&payload, &schema, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options_from(output: OutputArgs) -> ConvertOptions {
    let mut options = ConvertOptions::new()
        .mode(output.mode)
        .pretty(!output.compact);
    if let Some(title) = output.title {
        options = options.title(title);
    }
    if let Some(dir) = output.output_dir {
        options = options.output_dir(dir);
    }
    options
}

fn run_convert(version_dir: &Path, output: OutputArgs, json: bool) -> Result<(), u8> {
    let report = convert_version_dir(version_dir, options_from(output)).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if json {
        let output = serde_json::to_string_pretty(&report).map_err(|e| {
            eprintln!("Error serializing report: {}", e);
            2u8
        })?;
        println!("{}", output);
        return Ok(());
    }

    println!(
        "\x1b[32m✓ {} schemas written for version {}\x1b[0m",
        report.schemas_written.len(),
        report.version
    );
    let classes_skipped = report.classes_skipped();
    if classes_skipped > 0 || !report.skipped_files.is_empty() || !report.write_failures.is_empty()
    {
        println!(
            "\x1b[33m⚠ {} classes skipped, {} files skipped, {} write failures\x1b[0m",
            classes_skipped,
            report.skipped_files.len(),
            report.write_failures.len()
        );
    }
    if let Some(api) = &report.api_document {
        println!("  {}", api.display());
    }

    Ok(())
}

fn run_openapi(version_dir: &Path, output: OutputArgs) -> Result<(), u8> {
    let path = rebuild_api_document(version_dir, &options_from(output)).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    println!("{}", path.display());
    Ok(())
}

fn run_validate(payload_path: &Path, schema_path: &Path, json_output: bool) -> Result<(), u8> {
    let payload = load_schema(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let schema = load_schema(schema_path).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    match validate_payload(&schema, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
