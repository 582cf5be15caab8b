//! schemasm CLI - dry-run circuit assembly and routing from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use schemasm::assembly::router::simplify_path;
use schemasm::host::CanvasSnapshot;
use schemasm::{
    assemble_circuit, parse_netlist, AssemblyOptions, AssemblyStats, GridPoint, PageSize, Point,
    PinSignalMap, RecordingHost, SchemasmCore, SymbolLibrary,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemasm")]
#[command(about = "Schematic circuit assembly and wire routing tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a circuit JSON file onto an in-memory canvas
    Assemble {
        /// Path to the circuit JSON
        #[arg(value_name = "CIRCUIT")]
        file: PathBuf,

        /// Keep the root block at the page origin instead of centering it
        #[arg(long)]
        no_center: bool,

        /// Symbol library JSON (symbol id -> pin templates)
        #[arg(long, value_name = "LIB")]
        library: Option<PathBuf>,

        /// Page width reported by the canvas
        #[arg(long, requires = "page_height")]
        page_width: Option<f64>,

        /// Page height reported by the canvas
        #[arg(long, requires = "page_width")]
        page_height: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if any component, wire or block failed
        #[arg(long)]
        strict: bool,
    },

    /// Parse an Allegro netlist and print the pin -> signal map
    Netlist {
        /// Path to the netlist text
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Simplify a raw point sequence into an orthogonal wire path
    Route {
        /// Points as `x,y`
        #[arg(value_name = "POINT", required = true, allow_hyphen_values = true)]
        points: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Assemble {
            file,
            no_center,
            library,
            page_width,
            page_height,
            format,
            strict,
        } => {
            let page = page_width
                .zip(page_height)
                .map(|(width, height)| PageSize { width, height });
            handle_assemble(&file, no_center, library.as_deref(), page, format, strict).await
        }
        Commands::Netlist { file, format } => handle_netlist(&file, format),
        Commands::Route { points, format } => handle_route(&points, format),
    };

    process::exit(exit_code);
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_assemble(
    file: &Path,
    no_center: bool,
    library: Option<&Path>,
    page: Option<PageSize>,
    format: OutputFormat,
    strict: bool,
) -> i32 {
    let circuit = match SchemasmCore::load_circuit(file) {
        Ok(circuit) => circuit,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return 1;
        }
    };
    tracing::debug!(
        "Loaded {} with {} components and {} edges",
        file.display(),
        circuit.components.len(),
        circuit.edges.len()
    );

    let library = match library {
        Some(path) => match load_library(path) {
            Ok(library) => library,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return 1;
            }
        },
        None => SymbolLibrary::from_circuit(&circuit),
    };

    let mut host = RecordingHost::new(library);
    if let Some(page) = page {
        host = host.with_page_size(page);
    }

    let mut options = AssemblyOptions::default();
    if no_center {
        options = options.centered(false);
    }

    match assemble_circuit(&host, &circuit, &options).await {
        Ok(stats) => {
            let canvas = host.snapshot();
            let printed = match format {
                OutputFormat::Human => {
                    output_assembly_human(file, &stats, &canvas);
                    Ok(())
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "file": file.display().to_string(),
                    "stats": stats,
                    "canvas": canvas,
                })),
            };
            if let Err(e) = printed {
                eprintln!("Error: {}", e);
                return 1;
            }
            if strict && !stats.is_clean() {
                return 1;
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn load_library(path: &Path) -> anyhow::Result<SymbolLibrary> {
    let json = std::fs::read_to_string(path)?;
    Ok(SymbolLibrary::from_json(&json)?)
}

fn output_assembly_human(file: &Path, stats: &AssemblyStats, canvas: &CanvasSnapshot) {
    println!("\nCircuit: {}", file.display());
    println!("{}", "─".repeat(60));

    println!(
        "  Components: {} placed, {} failed, {} skipped",
        stats.components_placed, stats.components_failed, stats.components_skipped
    );
    println!(
        "  Wires:      {} drawn, {} skipped, {} failed",
        stats.wires_drawn, stats.sections_skipped, stats.wires_failed
    );
    println!(
        "  Net stubs:  {} drawn, {} unresolved, {} failed",
        stats.stubs_drawn, stats.stubs_unresolved, stats.stubs_failed
    );
    println!(
        "  Blocks:     {} drawn, {} failed",
        stats.blocks_drawn, stats.blocks_failed
    );

    if !canvas.wires.is_empty() {
        println!("\n  WIRES:");
        for wire in &canvas.wires {
            println!("    - {}: {}", wire.net, format_path(&wire.points));
        }
    }

    let errors: Vec<_> = canvas
        .notices
        .iter()
        .filter(|n| n.level == schemasm::host::NoticeLevel::Error)
        .collect();
    if !errors.is_empty() {
        println!("\n  ERRORS:");
        for notice in errors {
            println!("    - {}", notice.message);
        }
    }
}

fn handle_netlist(file: &Path, format: OutputFormat) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return 1;
        }
    };

    let map = parse_netlist(&text);
    match format {
        OutputFormat::Human => {
            output_netlist_human(&map);
            0
        }
        OutputFormat::Json => {
            let pins: serde_json::Map<String, serde_json::Value> = map
                .sorted()
                .into_iter()
                .map(|(pin, signal)| (pin.to_string(), signal.into()))
                .collect();
            match print_json(&serde_json::Value::Object(pins)) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

fn output_netlist_human(map: &PinSignalMap) {
    if map.is_empty() {
        println!("No nets found");
        return;
    }
    println!("{} pins:", map.len());
    for (pin, signal) in map.sorted() {
        println!("  {:<12} {}", pin, signal);
    }
}

fn handle_route(raw: &[String], format: OutputFormat) -> i32 {
    let mut points = Vec::with_capacity(raw.len());
    for text in raw {
        match parse_point(text) {
            Some(p) => points.push(p.quantize()),
            None => {
                eprintln!("Error: invalid point {:?}, expected x,y", text);
                return 1;
            }
        }
    }

    let path = simplify_path(&points);
    match format {
        OutputFormat::Human => {
            println!("{}", format_path(&path));
            0
        }
        OutputFormat::Json => {
            let coords: Vec<[i64; 2]> = path.iter().map(|p| [p.x, p.y]).collect();
            match print_json(&coords) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}

fn parse_point(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn format_path(points: &[GridPoint]) -> String {
    points
        .iter()
        .map(GridPoint::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
