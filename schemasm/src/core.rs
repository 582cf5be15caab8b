//! Core assembly API shared by the library and the CLI.
//! No editor binding dependencies: every host call goes through the trait.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assembly::CircuitAssembler;
use crate::geometry::PageSize;
use crate::host::SchematicHost;
use crate::schema::Circuit;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid circuit: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for an assembly run (CLI or embedding editor).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Center the root block on the page. `None` defers to the circuit's
    /// own `assembly_options`, and to centering when that is unset too.
    pub centered: Option<bool>,
    /// Page size used when the host cannot report one
    pub fallback_page: PageSize,
}

impl AssemblyOptions {
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = Some(centered);
        self
    }

    pub fn with_fallback_page(mut self, page: PageSize) -> Self {
        self.fallback_page = page;
        self
    }

    pub fn effective_centered(&self, circuit: &Circuit) -> bool {
        self.centered
            .or_else(|| circuit.assembly_options.and_then(|o| o.centered))
            .unwrap_or(true)
    }
}

/// What an assembly run did; per-item failures are counted, never raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub components_placed: usize,
    pub components_failed: usize,
    /// Components without a part reference
    pub components_skipped: usize,
    pub wires_drawn: usize,
    /// Sections with an endpoint that could not be located
    pub sections_skipped: usize,
    pub wires_failed: usize,
    pub stubs_drawn: usize,
    pub stubs_unresolved: usize,
    pub stubs_failed: usize,
    pub blocks_drawn: usize,
    pub blocks_failed: usize,
}

impl AssemblyStats {
    pub fn total_failures(&self) -> usize {
        self.components_failed
            + self.sections_skipped
            + self.wires_failed
            + self.stubs_unresolved
            + self.stubs_failed
            + self.blocks_failed
    }

    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

/// Assemble a circuit onto the host canvas.
///
/// Host failures are isolated per item and counted in the returned stats.
pub async fn assemble_circuit<H: SchematicHost + ?Sized>(
    host: &H,
    circuit: &Circuit,
    options: &AssemblyOptions,
) -> Result<AssemblyStats, AssemblyError> {
    Ok(CircuitAssembler::new(host, options.clone())
        .assemble(circuit)
        .await)
}

/// Core assembly API used by the CLI and embedders.
pub struct SchemasmCore;

impl SchemasmCore {
    /// Read a circuit JSON file
    pub fn load_circuit(path: &Path) -> Result<Circuit, AssemblyError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Circuit::from_json(&json)?)
    }

    /// Parse circuit JSON and assemble it
    pub async fn assemble_json<H: SchematicHost + ?Sized>(
        host: &H,
        json: &str,
        options: &AssemblyOptions,
    ) -> Result<AssemblyStats, AssemblyError> {
        let circuit = Circuit::from_json(json)?;
        assemble_circuit(host, &circuit, options).await
    }

    /// Load a circuit file and assemble it
    pub async fn assemble_file<H: SchematicHost + ?Sized>(
        host: &H,
        path: &Path,
        options: &AssemblyOptions,
    ) -> Result<AssemblyStats, AssemblyError> {
        let circuit = Self::load_circuit(path)?;
        assemble_circuit(host, &circuit, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_centered() {
        let mut circuit = Circuit::default();
        assert!(AssemblyOptions::default().effective_centered(&circuit));

        circuit.assembly_options = Some(crate::schema::CircuitAssemblyOptions {
            centered: Some(false),
        });
        assert!(!AssemblyOptions::default().effective_centered(&circuit));
        assert!(AssemblyOptions::default()
            .centered(true)
            .effective_centered(&circuit));
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: AssemblyOptions = serde_json::from_str(r#"{ "centered": false }"#).unwrap();
        assert_eq!(options.centered, Some(false));
        assert_eq!(options.fallback_page, PageSize::default());
    }

    #[test]
    fn test_stats_failures() {
        let stats = AssemblyStats {
            components_placed: 2,
            components_failed: 1,
            wires_failed: 2,
            ..Default::default()
        };
        assert_eq!(stats.total_failures(), 3);
        assert!(!stats.is_clean());
        assert!(AssemblyStats::default().is_clean());
    }

    #[test]
    fn test_host_failures_are_counted_not_raised() {
        use crate::host::{RecordingHost, SymbolLibrary};

        let circuit = Circuit::from_json(
            r#"{ "components": [ { "designator": "U1", "part_uuid": "MISSING" } ] }"#,
        )
        .unwrap();
        let host = RecordingHost::new(SymbolLibrary::new()).reject_symbol("MISSING");

        let stats = tokio_test::block_on(assemble_circuit(
            &host,
            &circuit,
            &AssemblyOptions::default(),
        ))
        .unwrap();
        assert_eq!(stats.components_failed, 1);
        assert_eq!(stats.total_failures(), 1);
    }

    #[test]
    fn test_load_circuit_errors() {
        let missing = SchemasmCore::load_circuit(Path::new("/nonexistent/circuit.json"));
        assert!(matches!(missing, Err(AssemblyError::Io(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SchemasmCore::load_circuit(&path),
            Err(AssemblyError::Json(_))
        ));
    }
}
