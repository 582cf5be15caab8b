//! Host Capability Interface
//!
//! Every interaction with the schematic editor goes through
//! [`SchematicHost`]: symbol placement, pin enumeration, library search,
//! netlist export, primitive drawing and user notifications. The engine never
//! talks to a concrete editor binding, which keeps it testable against
//! [`RecordingHost`].

pub mod recording;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{GridPoint, PageSize};

pub use recording::{CanvasSnapshot, PinTemplate, RecordingHost, SymbolLibrary};

/// Errors reported by the host editor
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Opaque primitive id of a symbol instance on the canvas
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolHandle(pub String);

impl SymbolHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymbolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Library coordinates of a symbol definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryRef {
    pub library_uuid: String,
    pub uuid: String,
}

impl LibraryRef {
    pub fn new(library_uuid: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            library_uuid: library_uuid.into(),
            uuid: uuid.into(),
        }
    }
}

/// Request to place one symbol instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRequest {
    pub library: LibraryRef,
    pub at: GridPoint,
    pub rotation: Option<f64>,
    /// Designator to assign after creation (generic parts only)
    pub designator: Option<String>,
    /// Display name override (power symbols)
    pub name: Option<String>,
    /// "Global Net Name" property (power symbols)
    pub global_net_name: Option<String>,
}

/// A pin as the host reports it, in the host's wire frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostPin {
    /// Pin number as text; usually numeric
    pub number: String,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl HostPin {
    pub fn numeric_number(&self) -> Option<u32> {
        self.number.trim().parse().ok()
    }
}

/// State of a symbol already on the canvas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub handle: SymbolHandle,
    /// False for non-component primitives (wires, text, ...)
    pub is_component: bool,
    pub designator: Option<String>,
    pub name: Option<String>,
    pub manufacturer_id: Option<String>,
    pub supplier_id: Option<String>,
    pub sub_part_name: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Placement position
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// One candidate returned by a library search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPart {
    pub uuid: String,
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleRequest {
    pub top_left: GridPoint,
    pub width: i64,
    pub height: i64,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub at: GridPoint,
    pub text: String,
    pub font_size: f64,
}

/// A polyline wire tagged with its net name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    pub points: Vec<GridPoint>,
    pub net: String,
}

impl WireRequest {
    /// `[x0, y0, x1, y1, ...]` as most editor APIs expect it
    pub fn flat_coordinates(&self) -> Vec<i64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Capabilities the engine consumes from the schematic editor
#[async_trait]
pub trait SchematicHost: Send + Sync {
    /// Create a symbol instance; `HostError::NotFound` when the library has no such symbol
    async fn place_symbol(&self, request: &SymbolRequest) -> Result<SymbolHandle, HostError>;

    /// Enumerate the pins of a placed symbol
    async fn symbol_pins(&self, symbol: &SymbolHandle) -> Result<Vec<HostPin>, HostError>;

    /// Commit a symbol after its properties were set
    async fn finish_symbol(&self, _symbol: &SymbolHandle) -> Result<(), HostError> {
        Ok(())
    }

    /// Every symbol currently on the canvas
    async fn all_symbols(&self) -> Result<Vec<SymbolInfo>, HostError>;

    async fn symbol_info(&self, symbol: &SymbolHandle) -> Result<SymbolInfo, HostError>;

    /// Symbols in the user's current selection
    async fn selected_symbols(&self) -> Result<Vec<SymbolHandle>, HostError>;

    async fn search_library(&self, query: &str) -> Result<Vec<LibraryPart>, HostError>;

    /// Current netlist in Allegro text format
    async fn export_netlist(&self) -> Result<String, HostError>;

    async fn page_size(&self) -> Result<PageSize, HostError>;

    async fn create_rectangle(&self, rect: &RectangleRequest) -> Result<(), HostError>;

    async fn create_text(&self, text: &TextRequest) -> Result<(), HostError>;

    async fn create_wire(&self, wire: &WireRequest) -> Result<(), HostError>;

    /// Show a short message to the user; best-effort
    fn notify(&self, level: NoticeLevel, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_coordinates() {
        let wire = WireRequest {
            points: vec![GridPoint::new(0, 0), GridPoint::new(10, 0), GridPoint::new(10, 5)],
            net: "N".into(),
        };
        assert_eq!(wire.flat_coordinates(), vec![0, 0, 10, 0, 10, 5]);
    }

    #[test]
    fn test_numeric_pin_number() {
        let pin = HostPin {
            number: " 12 ".into(),
            name: String::new(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
        };
        assert_eq!(pin.numeric_number(), Some(12));

        let named = HostPin {
            number: "A".into(),
            ..pin
        };
        assert_eq!(named.numeric_number(), None);
    }
}
