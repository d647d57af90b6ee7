//! # tabula-cli
//!
//! Command-line front end for converting and inspecting spreadsheets.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabula_sheet::{
    read_path, write_format, CellValue, CsvReadOptions, Format, Grid, ReadOptions, SheetReader,
    WriteOptions,
};
use tracing_subscriber::EnvFilter;

/// tabula - read and write csv, xls, xlsx and ods through one grid
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Convert and inspect spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Read a spreadsheet and write it in another format
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Input format tag (default: from the input extension)
        #[arg(long = "from", value_name = "TAG")]
        from: Option<String>,

        /// Output format tag (default: from the output extension)
        #[arg(long = "to", value_name = "TAG")]
        to: Option<String>,

        /// Field delimiter of delimited input (default: detected)
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<u8>,

        /// Keep blank lines of delimited input as empty rows
        #[arg(long)]
        keep_blank_lines: bool,
    },

    /// Print the first sheet of a spreadsheet
    Show {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Input format tag (default: from the extension)
        #[arg(long = "from", value_name = "TAG")]
        from: Option<String>,

        /// Print the grid as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match cli.command {
        Command::Convert {
            input,
            output,
            from,
            to,
            delimiter,
            keep_blank_lines,
        } => {
            let mut csv = CsvReadOptions::default().with_blank_lines(keep_blank_lines);
            if let Some(delimiter) = delimiter {
                csv = csv.with_delimiter(delimiter);
            }
            let options = ReadOptions::default().with_csv(csv);

            let grid = load(&input, from.as_deref(), options)?;
            let format = output_format(&output, to.as_deref())?;
            convert(&grid, &output, format)?;
            println!(
                "{} {} rows to {} ({format})",
                "Wrote".green().bold(),
                grid.len(),
                output.display()
            );
            Ok(())
        }
        Command::Show { input, from, json } => {
            let grid = load(&input, from.as_deref(), ReadOptions::default())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&grid)?);
            } else {
                print!("{}", render_rows(&grid));
            }
            Ok(())
        }
    }
}

/// Parse a delimiter given as a single ASCII character or `tab`.
fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!(
            "delimiter must be a single ASCII character, got '{s}'"
        )),
    }
}

fn load(path: &Path, tag: Option<&str>, options: ReadOptions) -> Result<Grid> {
    let grid = match tag {
        Some(tag) => SheetReader::new()
            .path(path)
            .format(tag)
            .options(options)
            .read(),
        None => read_path(path, &options),
    };
    grid.with_context(|| format!("Failed to read {}", path.display()))
}

fn output_format(path: &Path, tag: Option<&str>) -> Result<Format> {
    let format = match tag {
        Some(tag) => tag.parse::<Format>(),
        None => Format::from_path(path),
    };
    format.with_context(|| format!("Cannot choose an output format for {}", path.display()))
}

fn convert(grid: &Grid, output: &Path, format: Format) -> Result<()> {
    if output.is_dir() {
        bail!("Output {} is a directory", output.display());
    }
    let bytes = write_format(grid, format, &WriteOptions::default())
        .with_context(|| format!("Failed to encode {format}"))?;
    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to write file: {}", output.display()))
}

/// One line per row, cells separated by tabs.
fn render_rows(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid {
        let line: Vec<String> = row.iter().map(CellValue::to_string).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_render_rows() {
        let grid = vec![
            vec![CellValue::from("a"), CellValue::Null, CellValue::Int(3)],
            vec![],
            vec![CellValue::formula("A1+1")],
        ];
        assert_eq!(render_rows(&grid), "a\t\t3\n\nA1+1\n");
    }

    #[test]
    fn test_output_format() {
        assert_eq!(
            output_format(Path::new("out.ods"), None).unwrap(),
            Format::Ods
        );
        assert_eq!(
            output_format(Path::new("out"), Some("xls")).unwrap(),
            Format::Xls
        );
        assert!(output_format(Path::new("out"), None).is_err());
        assert!(output_format(Path::new("out.csv"), Some("pdf")).is_err());
    }

    #[test]
    fn test_convert_csv_to_ods_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let middle = dir.path().join("mid.ods");
        std::fs::write(&input, "name;qty\nbolt;12\n").unwrap();

        let grid = load(&input, None, ReadOptions::default()).unwrap();
        convert(&grid, &middle, Format::Ods).unwrap();

        let restored = load(&middle, None, ReadOptions::default()).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn test_explicit_input_tag() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.dat");
        std::fs::write(&input, "a\tb\n").unwrap();

        assert!(load(&input, None, ReadOptions::default()).is_err());
        let grid = load(&input, Some("txt"), ReadOptions::default()).unwrap();
        assert_eq!(grid, vec![vec![CellValue::from("a"), CellValue::from("b")]]);
    }

    #[test]
    fn test_convert_into_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(convert(&Vec::new(), dir.path(), Format::Csv).is_err());
    }
}
