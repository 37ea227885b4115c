//! GridOT CLI
//!
//! Offline tool for inspecting grid operations: apply them to snapshots,
//! compose, invert and transform them, and check that two concurrent
//! operations converge.
//!
//! # Usage
//!
//! ```bash
//! # Apply an operation to a snapshot
//! gridot apply --snapshot grid.json op.json
//!
//! # Rebase a local op onto one committed concurrently
//! gridot transform mine.json theirs.json --side right
//!
//! # Read the operation from stdin, write MessagePack
//! cat op.json | gridot --format msgpack invert -
//!
//! # Check two concurrent ops converge on a base grid
//! gridot converge --snapshot grid.json a.json b.json
//! ```

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use gridot_core::{Operation, Side, Snapshot};
use gridot_protocol::{decode_operation, decode_snapshot, encode, Format};

/// GridOT - Operational Transformation for shared grids
#[derive(Parser, Debug)]
#[command(name = "gridot")]
#[command(author, version, about = "GridOT CLI - apply, compose, invert and transform grid operations")]
struct Args {
    /// Output format (json, msgpack)
    #[arg(short, long, env = "GRIDOT_FORMAT", default_value = "json")]
    format: String,

    /// Pretty-print JSON output
    #[arg(short, long, env = "GRIDOT_PRETTY")]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GRIDOT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an operation to a snapshot and print the result
    Apply {
        /// Snapshot file (omit to start from an empty grid)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
        /// Operation file, or `-` for stdin
        op: PathBuf,
    },

    /// Compose two sequential operations into one
    Compose { first: PathBuf, second: PathBuf },

    /// Print the operation that undoes the given one
    Invert { op: PathBuf },

    /// Rebase OP onto OTHER, both generated against the same snapshot
    Transform {
        op: PathBuf,
        other: PathBuf,
        /// Serialization position of OP relative to OTHER (left, right)
        #[arg(long)]
        side: String,
    },

    /// Apply two concurrent operations in both orders and compare
    Converge {
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
        /// Operation serialized first
        first: PathBuf,
        /// Operation serialized second
        second: PathBuf,
    },
}

/// What a command produced
#[derive(Debug)]
enum Output {
    Snapshot(Snapshot),
    Operation(Operation),
    Converge { converged: bool, left: Snapshot, right: Snapshot },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let format: Format = args.format.parse()?;
    let output = run(&args.command)?;

    let mut stdout = std::io::stdout().lock();
    match output {
        Output::Snapshot(snapshot) => write_value(&mut stdout, &snapshot, format, args.pretty)?,
        Output::Operation(op) => write_value(&mut stdout, &op, format, args.pretty)?,
        Output::Converge { converged, left, right } => {
            if converged {
                eprintln!("{}", "Converged.".green());
                write_value(&mut stdout, &left, format, args.pretty)?;
            } else {
                eprintln!("{}", "Diverged!".red());
                write_value(&mut stdout, &left, format, args.pretty)?;
                write_value(&mut stdout, &right, format, args.pretty)?;
                stdout.flush()?;
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn run(command: &Command) -> Result<Output> {
    match command {
        Command::Apply { snapshot, op } => {
            let mut grid = load_snapshot(snapshot.as_deref())?;
            let op = load_operation(op)?;
            gridot_core::apply(&mut grid, &op).context("Operation does not apply to snapshot")?;
            info!(rows = grid.row_count(), components = op.len(), "Applied operation");
            Ok(Output::Snapshot(grid))
        }
        Command::Compose { first, second } => {
            let composed = gridot_core::compose(&load_operation(first)?, &load_operation(second)?);
            Ok(Output::Operation(composed))
        }
        Command::Invert { op } => Ok(Output::Operation(gridot_core::invert(&load_operation(op)?))),
        Command::Transform { op, other, side } => {
            let side: Side = side.parse()?;
            let transformed = gridot_core::transform(&load_operation(op)?, &load_operation(other)?, side);
            debug!(%side, components = transformed.len(), "Transformed operation");
            Ok(Output::Operation(transformed))
        }
        Command::Converge { snapshot, first, second } => {
            let base = load_snapshot(snapshot.as_deref())?;
            let first = load_operation(first)?;
            let second = load_operation(second)?;

            let left = apply_all(&base, &[&first, &gridot_core::transform(&second, &first, Side::Right)])
                .context("First-then-second path failed")?;
            let right = apply_all(&base, &[&second, &gridot_core::transform(&first, &second, Side::Left)])
                .context("Second-then-first path failed")?;

            Ok(Output::Converge {
                converged: left == right,
                left,
                right,
            })
        }
    }
}

fn apply_all(base: &Snapshot, ops: &[&Operation]) -> gridot_core::Result<Snapshot> {
    let mut grid = gridot_core::create(Some(base));
    for op in ops {
        gridot_core::apply(&mut grid, op)?;
    }
    Ok(grid)
}

/// Files ending in `.msgpack` or `.mp` are MessagePack, everything else JSON
fn input_format(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some("msgpack") | Some("mp") => Format::Msgpack,
        _ => Format::Json,
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        return Ok(data);
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_operation(path: &Path) -> Result<Operation> {
    let data = read_input(path)?;
    decode_operation(&data, input_format(path))
        .with_context(|| format!("Invalid operation in {}", path.display()))
}

fn load_snapshot(path: Option<&Path>) -> Result<Snapshot> {
    let Some(path) = path else {
        return Ok(gridot_core::create(None));
    };
    let data = read_input(path)?;
    decode_snapshot(&data, input_format(path))
        .with_context(|| format!("Invalid snapshot in {}", path.display()))
}

fn write_value<T: Serialize>(out: &mut impl Write, value: &T, format: Format, pretty: bool) -> Result<()> {
    match format {
        Format::Json if pretty => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        Format::Json => {
            out.write_all(&encode(value, format)?)?;
            writeln!(out)?;
        }
        Format::Msgpack => out.write_all(&encode(value, format)?)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridot_core::CellValue;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_apply_command() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = write(&dir, "grid.json", "[[null,null],[null,null]]");
        let op = write(&dir, "op.json", r#"[{"type":"insertRows","index":0,"count":1},{"type":"set","cells":[[1,0,null,"X"]]}]"#);

        let output = run(&Command::Apply { snapshot: Some(snapshot), op }).unwrap();
        match output {
            Output::Snapshot(grid) => {
                assert_eq!(grid.row_count(), 3);
                assert_eq!(grid.get(1, 0), Some(&CellValue::from("X")));
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_apply_reports_divergence() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = write(&dir, "grid.json", r#"[["a"]]"#);
        let op = write(&dir, "op.json", r#"[{"type":"set","cells":[[0,0,"b","c"]]}]"#);

        let err = run(&Command::Apply { snapshot: Some(snapshot), op }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<gridot_core::Error>(),
            Some(gridot_core::Error::Apply { .. })
        ));
    }

    #[test]
    fn test_transform_rejects_bad_side() {
        let dir = tempfile::tempdir().unwrap();
        let op = write(&dir, "a.json", "[]");
        let other = write(&dir, "b.json", "[]");

        let err = run(&Command::Transform { op, other, side: "middle".into() }).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<gridot_core::Error>(),
            Some(gridot_core::Error::InvalidSide(_))
        ));
    }

    #[test]
    fn test_transform_command() {
        let dir = tempfile::tempdir().unwrap();
        let op = write(&dir, "a.json", r#"[{"type":"set","cells":[[5,0,"a","b"]]}]"#);
        let other = write(&dir, "b.json", r#"[{"type":"insertRows","index":2,"count":3}]"#);

        let output = run(&Command::Transform { op, other, side: "right".into() }).unwrap();
        assert!(matches!(
            output,
            Output::Operation(ref op) if serde_json::to_string(op).unwrap() == r#"[{"type":"set","cells":[[8,0,"a","b"]]}]"#
        ));
    }

    #[test]
    fn test_converge_command() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = write(&dir, "grid.json", r#"[["x","y"],["z","w"]]"#);
        let first = write(&dir, "a.json", r#"[{"type":"set","cells":[[0,0,"x","A"]]}]"#);
        let second = write(&dir, "b.json", r#"[{"type":"set","cells":[[0,0,"x","B"]]},{"type":"insertCols","index":0,"count":1}]"#);

        match run(&Command::Converge { snapshot: Some(snapshot), first, second }).unwrap() {
            Output::Converge { converged, left, .. } => {
                assert!(converged);
                assert_eq!(left.get(0, 1), Some(&CellValue::from("A")));
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_unknown_component_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let op = write(&dir, "op.json", r#"[{"type":"mergeCells"}]"#);

        let err = run(&Command::Invert { op }).unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown operation component"));
    }

    #[test]
    fn test_input_format_from_extension() {
        assert_eq!(input_format(Path::new("op.msgpack")), Format::Msgpack);
        assert_eq!(input_format(Path::new("op.json")), Format::Json);
        assert_eq!(input_format(Path::new("-")), Format::Json);
    }
}
