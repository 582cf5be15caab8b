//! schemasm - circuit assembly and routing for schematic editors
//!
//! Turns an abstract circuit description (components with coarse positions,
//! routed edges, functional blocks) into concrete drawing primitives on a
//! schematic canvas: placed symbols, orthogonal grid-aligned wires, net
//! stubs and block annotations. The editor is reached only through the
//! [`SchematicHost`] trait.
//!
//! # Quick Start
//!
//! ```no_run
//! use schemasm::{assemble_circuit, AssemblyOptions, Circuit, RecordingHost, SymbolLibrary};
//!
//! # async fn run() -> Result<(), schemasm::AssemblyError> {
//! let circuit = Circuit::from_json(&std::fs::read_to_string("circuit.json")?)?;
//! let host = RecordingHost::new(SymbolLibrary::from_circuit(&circuit));
//!
//! let stats = assemble_circuit(&host, &circuit, &AssemblyOptions::default()).await?;
//! println!("{} wires drawn", stats.wires_drawn);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Placement**: concurrent symbol creation, GND/VCC power symbols
//! - **Routing**: bend snapping, orthogonal paths, duplicate removal
//! - **Annotation**: block frames with wrapped descriptions
//! - **Extraction**: canvas selection back to an explained circuit
//! - **Netlist**: Allegro `$NETS` parsing

pub mod assembly;
pub mod core;
pub mod extract;
pub mod geometry;
pub mod host;
pub mod parser;
pub mod schema;

// Re-export main types
pub use assembly::CircuitAssembler;
pub use core::{assemble_circuit, AssemblyError, AssemblyOptions, AssemblyStats, SchemasmCore};
pub use extract::{extract_schematic, ExplainedCircuit, ExplainedComponent, ExtractError};
pub use geometry::{quantize, GridPoint, Offset, PageSize, Point};
pub use host::{HostError, RecordingHost, SchematicHost, SymbolHandle, SymbolLibrary};
pub use parser::netlist::{parse_netlist, PinSignalMap};
pub use schema::{Block, Circuit, Component, DanglingNet, Edge, Section};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        assemble_circuit, AssemblyError, AssemblyOptions, AssemblyStats, Circuit, HostError,
        RecordingHost, SchematicHost, SymbolLibrary,
    };
}
