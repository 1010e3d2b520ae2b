use clap::{Parser, Subcommand};
use colored::Colorize;
use royalbit_sheetbind::cli;
use royalbit_sheetbind::error::SheetResult;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetbind")]
#[command(about = "Convert spreadsheet cells into typed values through a converter registry.")]
#[command(long_about = "Sheetbind - typed spreadsheet cell conversion

Every cell carries a kind (EMPTY, STRING, NUMBER, BOOLEAN, DATE, ERROR).
A converter is looked up by (destination type, cell kind) and applied.

COMMANDS:
  text   - Project every row to text, one JSON object per line
  bind   - Convert configured columns into typed values
  types  - List the built-in converters

EXAMPLES:
  sheetbind text orders.xlsx --sheet Orders
  sheetbind bind orders.xlsx --config orders.yaml
  RUST_LOG=debug sheetbind text orders.xlsx")]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Project every row of a sheet to text.

Empty cells become null. Every other cell goes through the text converter
for its kind. The first cell that cannot be converted stops the run.
Workbooks using the 1904 date system are detected and read as such.

OUTPUT:
  {\"0\":\"bolt\",\"1\":null,\"2\":\"12\"}")]
    /// Project every row to text
    Text {
        /// Path to the workbook (.xlsx, .xlsm, .xlsb, .xls, .ods)
        file: PathBuf,

        /// Sheet to read (defaults to the config's sheet, then the first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Read config (YAML) supplying date format, trimming and 1904 dates
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of leading rows to skip
        #[arg(long, default_value = "0")]
        skip: usize,
    },

    #[command(long_about = "Convert configured columns into typed values.

The config lists which column index binds to which type:

  columns:
    - index: 0
      name: sku
      type: text
    - index: 2
      name: quantity
      type: integer
    - index: 3
      name: shipped
      type: cell<datetime>
      format: \"%d/%m/%Y\"

TYPES:
  text, number, integer, boolean, datetime
  cell<TYPE>  keeps the source cell next to the converted value
  cell        same as cell<text>

Empty or missing cells bind as null. Any other cell that cannot be
converted stops the run with its row number.")]
    /// Convert configured columns into typed values
    Bind {
        /// Path to the workbook
        file: PathBuf,

        /// Read config (YAML) with column bindings
        #[arg(short, long)]
        config: PathBuf,

        /// Sheet to read (overrides the config)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// List the built-in converters
    Types,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "royalbit_sheetbind=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn run(command: Commands) -> SheetResult<()> {
    match command {
        Commands::Text {
            file,
            sheet,
            config,
            skip,
        } => cli::text(file, sheet, config, skip),

        Commands::Bind {
            file,
            config,
            sheet,
        } => cli::bind(file, config, sheet),

        Commands::Types => cli::types(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "❌ Error:".bold().red(), err);
            let mut cause = err.source();
            while let Some(inner) = cause {
                eprintln!("   caused by: {}", inner);
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}
