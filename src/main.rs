use clap::{Parser, Subcommand, ValueEnum};
use schema_graph::error::{Error, Result};
use schema_graph::{
    DatabaseSchema, Format, LayoutAlgorithm, ViewMode, detect_format, identify_valid_blocks,
    layout_schema, parse_schema, schema_to_format,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-graph")]
#[command(version)]
#[command(about = "Parse SQL DDL or Mermaid ER diagrams into a positioned schema graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging on stderr (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema file and print it
    Parse {
        /// Input file (.sql or Mermaid erDiagram)
        file: PathBuf,

        /// Input format: sql or mermaid (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<Format>,

        /// Layout algorithm: force, hierarchical or circular
        #[arg(short, long)]
        layout: Option<LayoutAlgorithm>,

        /// View mode for the layout: 2d or 3d
        #[arg(long, default_value = "3d")]
        view: ViewMode,

        /// What to print
        #[arg(short, long, value_enum, default_value_t = Emit::Json)]
        emit: Emit,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the detected format of a file
    Detect {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    /// Schema as JSON
    Json,
    /// Regenerated SQL DDL
    Sql,
    /// Regenerated Mermaid erDiagram
    Mermaid,
    /// Valid/invalid ranges of the input as JSON
    Blocks,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("schema_graph=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn write(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)?;
            info!(path = %path.display(), bytes = text.len(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Parse `input`, then lay it out when an algorithm was asked for.
fn load_schema(
    input: &str,
    format: Option<Format>,
    layout: Option<LayoutAlgorithm>,
    view: ViewMode,
) -> Result<DatabaseSchema> {
    let schema = parse_schema(input, format)
        .ok_or(Error::Unparseable(format.map_or("SQL or Mermaid", Format::as_str)))?;
    Ok(match layout {
        Some(algorithm) => layout_schema(&schema, algorithm, view),
        None => schema,
    })
}

fn render(
    input: &str,
    format: Option<Format>,
    layout: Option<LayoutAlgorithm>,
    view: ViewMode,
    emit: Emit,
) -> Result<String> {
    Ok(match emit {
        // Highlighting ranges need no parseable schema
        Emit::Blocks => serde_json::to_string_pretty(&identify_valid_blocks(input, format))?,
        Emit::Json => serde_json::to_string_pretty(&load_schema(input, format, layout, view)?)?,
        Emit::Sql => schema_to_format(&load_schema(input, format, layout, view)?, Some(Format::Sql)),
        Emit::Mermaid => {
            schema_to_format(&load_schema(input, format, layout, view)?, Some(Format::Mermaid))
        }
    })
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Parse {
            file,
            format,
            layout,
            view,
            emit,
            output,
        } => {
            let input = read(&file)?;
            let text = render(&input, format, layout, view, emit)?;
            write(output.as_deref(), &text)
        }
        Commands::Detect { file } => {
            let input = read(&file)?;
            let format = detect_format(&input).ok_or(Error::Unparseable("SQL or Mermaid"))?;
            println!("{format}");
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "CREATE TABLE users (id INT PRIMARY KEY);";

    #[test]
    fn test_blocks_do_not_need_a_schema() {
        let text = render("nonsense;", None, None, ViewMode::ThreeD, Emit::Blocks).unwrap();
        assert!(text.contains("\"isValid\": false"));
        assert!(matches!(
            render("nonsense;", None, None, ViewMode::ThreeD, Emit::Json),
            Err(Error::Unparseable(_))
        ));
    }

    #[test]
    fn test_emit_formats() {
        let sql = render(SQL, None, None, ViewMode::ThreeD, Emit::Sql).unwrap();
        assert!(sql.starts_with("CREATE TABLE users"));

        let mermaid = render(SQL, Some(Format::Sql), None, ViewMode::TwoD, Emit::Mermaid).unwrap();
        assert!(mermaid.starts_with("erDiagram"));

        let json = render(SQL, None, Some(LayoutAlgorithm::Circular), ViewMode::TwoD, Emit::Json).unwrap();
        let schema = DatabaseSchema::from_json(&json).unwrap();
        assert_eq!(schema.tables[0].position, [0.0, 0.0, 0.0]);
    }
}
