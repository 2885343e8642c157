use anyhow::Context;
use clap::{Parser, Subcommand};
use dstruct::{ByteBuffer, SchemaRegistry, StructType};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dstruct")]
#[command(about = "Inspect, decode, and encode fixed-layout struct types declared in schema files")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show byte length, alignment and per-field placement as JSON
    Inspect {
        /// Schema file (YAML, or JSON with a .json extension)
        #[arg(short = 'f', long = "file", required = true)]
        file: PathBuf,

        /// Struct type to inspect
        #[arg(short = 't', long = "type-name", required = true)]
        type_name: String,

        /// Pretty print JSON output
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },

    /// Print the compact layout string of a type
    Layout {
        #[arg(short = 'f', long = "file", required = true)]
        file: PathBuf,

        #[arg(short = 't', long = "type-name", required = true)]
        type_name: String,
    },

    /// Print the byte-by-byte layout table of a type
    Linear {
        #[arg(short = 'f', long = "file", required = true)]
        file: PathBuf,

        #[arg(short = 't', long = "type-name", required = true)]
        type_name: String,
    },

    /// Interpret binary data as an instance and print it as JSON
    Decode {
        #[arg(short = 'f', long = "file", required = true)]
        file: PathBuf,

        #[arg(short = 't', long = "type-name", required = true)]
        type_name: String,

        /// Binary data file
        #[arg(short = 'd', long = "data-file", required = true)]
        data_file: PathBuf,

        /// Byte offset of the instance within the data file
        #[arg(long = "offset", default_value_t = 0)]
        offset: usize,

        /// Pretty print JSON output
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },

    /// Build an instance from a JSON object of field values and write its bytes
    Encode {
        #[arg(short = 'f', long = "file", required = true)]
        file: PathBuf,

        #[arg(short = 't', long = "type-name", required = true)]
        type_name: String,

        /// JSON file holding field values
        #[arg(short = 'i', long = "input", required = true)]
        input: PathBuf,

        /// Output binary file
        #[arg(short = 'o', long = "output", required = true)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect {
            file,
            type_name,
            pretty,
        } => {
            let registry = load_registry(&file)?;
            let summary = registry.describe(&type_name)?;
            print_json(&serde_json::to_value(summary)?, pretty)
        }
        Commands::Layout { file, type_name } => {
            println!("{}", load_type(&file, &type_name)?.layout());
            Ok(())
        }
        Commands::Linear { file, type_name } => {
            println!("{}", load_type(&file, &type_name)?.linear());
            Ok(())
        }
        Commands::Decode {
            file,
            type_name,
            data_file,
            offset,
            pretty,
        } => {
            let ty = load_type(&file, &type_name)?;
            let bytes = std::fs::read(&data_file)
                .with_context(|| format!("Failed to read {}", data_file.display()))?;
            debug!(bytes = bytes.len(), offset, "decoding instance");
            let buffer = ByteBuffer::from_vec(bytes);
            let instance = ty
                .create_in(&buffer, offset, None)
                .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", type_name, e))?;
            print_json(&instance.to_json()?, pretty)
        }
        Commands::Encode {
            file,
            type_name,
            input,
            output,
        } => {
            let ty = load_type(&file, &type_name)?;
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let values: serde_json::Value = serde_json::from_str(&text)?;
            let instance = ty
                .create_from_json(&values)
                .map_err(|e| anyhow::anyhow!("Failed to build {}: {}", type_name, e))?;
            std::fs::write(&output, instance.to_bytes())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Wrote {} bytes to {}",
                instance.byte_length(),
                output.display()
            );
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_registry(file: &Path) -> anyhow::Result<SchemaRegistry> {
    let registry = SchemaRegistry::from_path(file)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", file.display(), e))?;
    debug!(types = ?registry.names(), "loaded schema");
    Ok(registry)
}

fn load_type(file: &Path, type_name: &str) -> anyhow::Result<StructType> {
    Ok(load_registry(file)?.require(type_name)?.clone())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
