//! Earthwork CLI - survey grid labelling and formula insertion

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use earthwork::prelude::*;
use earthwork::{
    locate_row_range, number_to_label, validate_positive_integer_cells, write_grid_labels,
    UnsupportedContent,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "earthwork")]
#[command(
    author,
    version,
    about = "Label survey grids and insert earthwork cut/fill formulas"
)]
struct Cli {
    /// Log per-step detail (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Workbook, sheet and layout selection shared by every subcommand
#[derive(Args)]
struct SheetArgs {
    /// Input workbook (xlsx, xlsm)
    input: PathBuf,

    /// Sheet index (0-based, default: the active sheet)
    #[arg(short, long)]
    sheet: Option<usize>,

    /// Layout JSON file (default: the standard survey layout)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Rows scanned below the first data row
    #[arg(long)]
    search_limit: Option<u32>,
}

/// [`SheetArgs`] for commands that write the workbook back
#[derive(Args)]
struct WriteArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    /// Output workbook (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite the input even if it holds styles or parts that are not written back
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write grid cell identifiers down the identifier column
    Labels {
        #[command(flatten)]
        args: WriteArgs,

        /// Horizontal resolution (default: read from the layout's resolution cell)
        #[arg(long, requires = "vertical", allow_negative_numbers = true)]
        horizontal: Option<f64>,

        /// Vertical resolution (default: read from the layout's resolution cell)
        #[arg(long, requires = "horizontal", allow_negative_numbers = true)]
        vertical: Option<f64>,

        /// First label cell (default: the layout's first identifier cell)
        #[arg(long)]
        start: Option<String>,
    },

    /// Insert level averages and cut/fill volume formulas
    Earthwork {
        #[command(flatten)]
        args: WriteArgs,
    },

    /// Insert topographic continuity check formulas
    Continuity {
        #[command(flatten)]
        args: WriteArgs,
    },

    /// Validate, label, then insert every formula column
    Run {
        #[command(flatten)]
        args: WriteArgs,
    },

    /// Check the resolution cells; exits non-zero on failure
    Validate {
        #[command(flatten)]
        args: SheetArgs,
    },

    /// Print the rows spanned by a column of data
    Locate {
        #[command(flatten)]
        args: SheetArgs,

        /// Start cell (e.g. C14)
        address: String,
    },

    /// Print the column label of a zero-based index
    ColumnLabel {
        #[arg(allow_negative_numbers = true)]
        index: f64,
    },

    /// Print the effective layout as JSON
    ShowLayout {
        /// Layout JSON file (default: the standard survey layout)
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Labels {
            args,
            horizontal,
            vertical,
            start,
        } => edit_sheet(&args, |sheet, layout| {
            let labels = match (horizontal, vertical) {
                (Some(h), Some(v)) => {
                    let start = match start.as_deref() {
                        Some(start) => start.to_string(),
                        None => layout.data_start()?.to_string(),
                    };
                    write_grid_labels(sheet, h, v, &start)?
                }
                _ if start.is_some() => {
                    bail!("--start requires --horizontal and --vertical")
                }
                _ => setup_grid(sheet, layout)?,
            };
            println!("Wrote {} grid label(s)", labels.row_count);
            Ok(())
        }),
        Commands::Earthwork { args } => edit_sheet(&args, |sheet, layout| {
            let inserted = apply_earthwork_calculation_formulas(sheet, layout)?;
            print_inserted(&inserted.ranges);
            Ok(())
        }),
        Commands::Continuity { args } => edit_sheet(&args, |sheet, layout| {
            let inserted = apply_continuity_validation_formulas(sheet, layout)?;
            print_inserted(&inserted.ranges);
            Ok(())
        }),
        Commands::Run { args } => edit_sheet(&args, |sheet, layout| {
            let report = run_all(sheet, layout)?;
            println!(
                "Wrote {} grid label(s), rows {} to {}",
                report.labels.row_count, report.rows.start_row, report.rows.end_row
            );
            print_inserted(&report.columns_written);
            Ok(())
        }),
        Commands::Validate { args } => validate(&args),
        Commands::Locate { args, address } => locate(&args, &address),
        Commands::ColumnLabel { index } => {
            println!("{}", number_to_label(index)?);
            Ok(())
        }
        Commands::ShowLayout { layout } => {
            let layout = load_layout(layout.as_deref(), None)?;
            println!("{}", layout.to_json_pretty()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_layout(path: Option<&Path>, search_limit: Option<u32>) -> Result<SheetLayout> {
    let mut layout = match path {
        Some(path) => SheetLayout::from_json_file(path)
            .with_context(|| format!("Failed to load layout '{}'", path.display()))?,
        None => SheetLayout::default(),
    };
    if let Some(limit) = search_limit {
        layout.search_limit = limit;
        layout.validate().context("Invalid --search-limit")?;
    }
    Ok(layout)
}

fn open_workbook(input: &Path) -> Result<Workbook> {
    Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn sheet_index(workbook: &Workbook, sheet: Option<usize>) -> Result<usize> {
    let index = sheet.unwrap_or_else(|| workbook.active_sheet());
    if index >= workbook.sheet_count() {
        bail!(
            "Sheet index {} not found ({} sheet(s))",
            index,
            workbook.sheet_count()
        );
    }
    Ok(index)
}

/// Open the workbook, apply `edit` to the selected sheet and save the result
fn edit_sheet<F>(args: &WriteArgs, edit: F) -> Result<()>
where
    F: FnOnce(&mut Worksheet, &SheetLayout) -> Result<()>,
{
    let input = &args.sheet.input;
    let output = args.output.as_deref().unwrap_or(input);
    let layout = load_layout(args.sheet.layout.as_deref(), args.sheet.search_limit)?;
    let (mut workbook, unsupported) = Workbook::open_with_report(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    check_overwrite(input, output, &unsupported, args.force)?;
    let index = sheet_index(&workbook, args.sheet.sheet)?;

    let sheet = workbook
        .worksheet_mut(index)
        .with_context(|| format!("Sheet index {} not found", index))?;
    tracing::debug!("Editing sheet {} \"{}\"", index, sheet.name());
    edit(sheet, &layout)?;

    workbook
        .save(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    eprintln!("Saved '{}'", output.display());

    Ok(())
}

/// Refuse to replace `input` with a copy that loses content, unless forced
fn check_overwrite(
    input: &Path,
    output: &Path,
    unsupported: &UnsupportedContent,
    force: bool,
) -> Result<()> {
    if unsupported.is_empty() {
        return Ok(());
    }
    if output != input {
        tracing::warn!("Not carried over to '{}': {}", output.display(), unsupported);
        return Ok(());
    }
    if !force {
        bail!(
            "'{}' has content that would be lost on save ({}); write elsewhere with --output or pass --force",
            input.display(),
            unsupported
        );
    }
    tracing::warn!("Overwriting '{}' drops: {}", input.display(), unsupported);
    Ok(())
}

fn print_inserted(ranges: &[CellRange]) {
    for range in ranges {
        println!("Inserted {}", range);
    }
}

fn validate(args: &SheetArgs) -> Result<()> {
    let layout = load_layout(args.layout.as_deref(), args.search_limit)?;
    let workbook = open_workbook(&args.input)?;
    let index = sheet_index(&workbook, args.sheet)?;
    let sheet = workbook
        .worksheet(index)
        .with_context(|| format!("Sheet index {} not found", index))?;

    let errors = validate_positive_integer_cells(sheet, &layout.resolution_cells())?;
    for error in &errors {
        println!("{}", error);
    }
    if !errors.is_empty() {
        bail!("{} cell(s) failed validation", errors.len());
    }

    println!("OK");
    Ok(())
}

fn locate(args: &SheetArgs, address: &str) -> Result<()> {
    let layout = load_layout(args.layout.as_deref(), args.search_limit)?;
    let workbook = open_workbook(&args.input)?;
    let index = sheet_index(&workbook, args.sheet)?;
    let sheet = workbook
        .worksheet(index)
        .with_context(|| format!("Sheet index {} not found", index))?;

    let options = LocateOptions {
        search_limit: layout.search_limit,
    };
    let range = locate_row_range(sheet, address, &options)?;
    println!(
        "rows {} to {} ({} row(s))",
        range.start_row, range.end_row, range.row_count
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled() -> UnsupportedContent {
        ["part xl/styles.xml".to_string()].into_iter().collect()
    }

    #[test]
    fn test_overwrite_of_lossy_input_needs_force() {
        let input = Path::new("survey.xlsx");

        let err = check_overwrite(input, input, &styled(), false).unwrap_err();
        assert!(err.to_string().contains("part xl/styles.xml"));
        assert!(err.to_string().contains("--output"));

        assert!(check_overwrite(input, input, &styled(), true).is_ok());
    }

    #[test]
    fn test_separate_output_or_plain_input_is_allowed() {
        let input = Path::new("survey.xlsx");

        assert!(check_overwrite(input, Path::new("out.xlsx"), &styled(), false).is_ok());
        assert!(check_overwrite(input, input, &UnsupportedContent::default(), false).is_ok());
    }

    #[test]
    fn test_cli_parses_force() {
        let cli = Cli::try_parse_from(["earthwork", "run", "survey.xlsx", "--force"]).unwrap();
        match cli.command {
            Commands::Run { args } => {
                assert!(args.force);
                assert!(args.output.is_none());
            }
            _ => panic!("expected the run command"),
        }
    }
}
