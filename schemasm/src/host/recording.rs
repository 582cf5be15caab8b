//! Recording Host
//!
//! In-memory [`SchematicHost`] that keeps every primitive it is asked to
//! create. Used by the integration tests and by the CLI's dry-run mode.
//! Failure injection (`reject_symbol`, `reject_wires_on`, `fail_pins_for`)
//! exercises the per-item error paths of the engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    HostError, HostPin, LibraryPart, NoticeLevel, RectangleRequest, SchematicHost, SymbolHandle,
    SymbolInfo, SymbolRequest, TextRequest, WireRequest,
};
use crate::assembly::placer::PartKind;
use crate::geometry::{GridPoint, PageSize};
use crate::schema::Circuit;

/// Horizontal distance from symbol center to a generated pin
const GENERATED_PIN_REACH: f64 = 20.0;
/// Vertical pitch between generated pins on the same side
const GENERATED_PIN_PITCH: f64 = 10.0;

/// Pin of a library symbol, relative to the symbol origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinTemplate {
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl PinTemplate {
    pub fn new(number: impl Into<String>, dx: f64, dy: f64, rotation: f64) -> Self {
        let number = number.into();
        Self {
            name: number.clone(),
            number,
            dx,
            dy,
            rotation,
        }
    }
}

/// Symbol id → pin templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolLibrary {
    symbols: HashMap<String, Vec<PinTemplate>>,
}

impl SymbolLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Library covering every placeable component of a circuit, with pins
    /// generated from the circuit's own pin lists
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut library = Self::new();
        for component in &circuit.components {
            let Some(part) = component.part_reference() else {
                continue;
            };
            let uuid = PartKind::classify(part).library_ref().uuid;
            if library.contains(&uuid) {
                continue;
            }
            let mut numbers: Vec<u32> =
                component.pins.iter().filter_map(|p| p.pin_number).collect();
            numbers.sort_unstable();
            if numbers.is_empty() {
                numbers.push(1);
            }
            library.insert(uuid, Self::two_sided(&numbers));
        }
        library
    }

    /// Pins alternating left/right of the origin, top to bottom.
    ///
    /// A single pin sits on the origin pointing down.
    pub fn two_sided(pin_numbers: &[u32]) -> Vec<PinTemplate> {
        if let [only] = pin_numbers {
            return vec![PinTemplate::new(only.to_string(), 0.0, 0.0, 90.0)];
        }

        pin_numbers
            .iter()
            .enumerate()
            .map(|(i, number)| {
                let row = (i / 2) as f64 * GENERATED_PIN_PITCH;
                if i % 2 == 0 {
                    PinTemplate::new(number.to_string(), -GENERATED_PIN_REACH, row, 180.0)
                } else {
                    PinTemplate::new(number.to_string(), GENERATED_PIN_REACH, row, 0.0)
                }
            })
            .collect()
    }

    pub fn with_symbol(mut self, uuid: impl Into<String>, pins: Vec<PinTemplate>) -> Self {
        self.insert(uuid, pins);
        self
    }

    pub fn insert(&mut self, uuid: impl Into<String>, pins: Vec<PinTemplate>) {
        self.symbols.insert(uuid.into(), pins);
    }

    pub fn get(&self, uuid: &str) -> Option<&[PinTemplate]> {
        self.symbols.get(uuid).map(Vec::as_slice)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.symbols.contains_key(uuid)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedSymbol {
    pub info: SymbolInfo,
    /// `None` for symbols seeded with [`RecordingHost::add_existing_symbol`]
    pub request: Option<SymbolRequest>,
    pub pins: Vec<HostPin>,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything drawn on the canvas so far
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanvasSnapshot {
    pub symbols: Vec<RecordedSymbol>,
    pub wires: Vec<WireRequest>,
    pub rectangles: Vec<RectangleRequest>,
    pub texts: Vec<TextRequest>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Default)]
struct CanvasState {
    canvas: CanvasSnapshot,
    selection: Vec<SymbolHandle>,
}

pub struct RecordingHost {
    library: SymbolLibrary,
    page: Option<PageSize>,
    netlist: String,
    parts: Vec<LibraryPart>,
    rejected_symbols: HashSet<String>,
    rejected_nets: HashSet<String>,
    failing_pins: HashSet<String>,
    state: Mutex<CanvasState>,
}

impl RecordingHost {
    pub fn new(library: SymbolLibrary) -> Self {
        Self {
            library,
            page: Some(PageSize::default()),
            netlist: String::new(),
            parts: Vec::new(),
            rejected_symbols: HashSet::new(),
            rejected_nets: HashSet::new(),
            failing_pins: HashSet::new(),
            state: Mutex::new(CanvasState::default()),
        }
    }

    pub fn with_page_size(mut self, page: PageSize) -> Self {
        self.page = Some(page);
        self
    }

    /// Make `page_size` fail, as editors without page info do
    pub fn without_page_size(mut self) -> Self {
        self.page = None;
        self
    }

    pub fn with_netlist(mut self, netlist: impl Into<String>) -> Self {
        self.netlist = netlist.into();
        self
    }

    pub fn with_library_part(mut self, part: LibraryPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Placement of this symbol id fails with `NotFound`
    pub fn reject_symbol(mut self, uuid: impl Into<String>) -> Self {
        self.rejected_symbols.insert(uuid.into());
        self
    }

    /// Wires on this net are rejected
    pub fn reject_wires_on(mut self, net: impl Into<String>) -> Self {
        self.rejected_nets.insert(net.into());
        self
    }

    /// Pin enumeration fails for instances of this symbol id
    pub fn fail_pins_for(mut self, uuid: impl Into<String>) -> Self {
        self.failing_pins.insert(uuid.into());
        self
    }

    /// Seed a symbol that was already on the canvas before assembly
    pub fn add_existing_symbol(&self, mut info: SymbolInfo, pins: Vec<HostPin>) -> SymbolHandle {
        if info.handle.as_str().is_empty() {
            info.handle = SymbolHandle::new(uuid::Uuid::new_v4().to_string());
        }
        let handle = info.handle.clone();
        self.state().canvas.symbols.push(RecordedSymbol {
            info,
            request: None,
            pins,
            finished: true,
        });
        handle
    }

    pub fn select(&self, handles: Vec<SymbolHandle>) {
        self.state().selection = handles;
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        self.state().canvas.clone()
    }

    pub fn symbols(&self) -> Vec<RecordedSymbol> {
        self.state().canvas.symbols.clone()
    }

    pub fn wires(&self) -> Vec<WireRequest> {
        self.state().canvas.wires.clone()
    }

    pub fn rectangles(&self) -> Vec<RectangleRequest> {
        self.state().canvas.rectangles.clone()
    }

    pub fn texts(&self) -> Vec<TextRequest> {
        self.state().canvas.texts.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.state().canvas.notices.clone()
    }

    /// Messages of error-level notices only
    pub fn errors(&self) -> Vec<String> {
        self.state()
            .canvas
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, CanvasState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_symbol(&self, handle: &SymbolHandle) -> Result<RecordedSymbol, HostError> {
        self.state()
            .canvas
            .symbols
            .iter()
            .find(|s| &s.info.handle == handle)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("Symbol {}", handle)))
    }

    /// Pin positions in the wire frame, whose Y axis is the negated placement Y
    fn instantiate_pins(templates: &[PinTemplate], at: GridPoint, rotation: f64) -> Vec<HostPin> {
        let (sin, cos) = rotation.to_radians().sin_cos();
        templates
            .iter()
            .map(|t| {
                let dx = (t.dx * cos - t.dy * sin).round();
                let dy = (t.dx * sin + t.dy * cos).round();
                HostPin {
                    number: t.number.clone(),
                    name: t.name.clone(),
                    x: at.x as f64 + dx,
                    y: -(at.y as f64) + dy,
                    rotation: (t.rotation + rotation).rem_euclid(360.0),
                }
            })
            .collect()
    }
}

#[async_trait]
impl SchematicHost for RecordingHost {
    async fn place_symbol(&self, request: &SymbolRequest) -> Result<SymbolHandle, HostError> {
        let uuid = &request.library.uuid;
        let templates = match self.library.get(uuid) {
            Some(t) if !self.rejected_symbols.contains(uuid) => t,
            _ => return Err(HostError::NotFound(format!("Symbol {}", uuid))),
        };

        let handle = SymbolHandle::new(uuid::Uuid::new_v4().to_string());
        let pins = Self::instantiate_pins(templates, request.at, request.rotation.unwrap_or(0.0));

        let mut properties = std::collections::BTreeMap::new();
        if let Some(net) = &request.global_net_name {
            properties.insert("Global Net Name".to_string(), net.clone());
        }

        let info = SymbolInfo {
            handle: handle.clone(),
            is_component: true,
            designator: request.designator.clone(),
            name: request.name.clone(),
            properties,
            x: request.at.x as f64,
            y: request.at.y as f64,
            ..Default::default()
        };

        self.state().canvas.symbols.push(RecordedSymbol {
            info,
            request: Some(request.clone()),
            pins,
            finished: false,
        });

        Ok(handle)
    }

    async fn symbol_pins(&self, symbol: &SymbolHandle) -> Result<Vec<HostPin>, HostError> {
        let recorded = self.find_symbol(symbol)?;
        let failing = recorded
            .request
            .as_ref()
            .map(|r| self.failing_pins.contains(&r.library.uuid))
            .unwrap_or(false);
        if failing {
            return Err(HostError::Other(anyhow!("Pins not found")));
        }
        Ok(recorded.pins)
    }

    async fn finish_symbol(&self, symbol: &SymbolHandle) -> Result<(), HostError> {
        let mut state = self.state();
        let recorded = state
            .canvas
            .symbols
            .iter_mut()
            .find(|s| &s.info.handle == symbol)
            .ok_or_else(|| HostError::NotFound(format!("Symbol {}", symbol)))?;
        recorded.finished = true;
        Ok(())
    }

    async fn all_symbols(&self) -> Result<Vec<SymbolInfo>, HostError> {
        Ok(self
            .state()
            .canvas
            .symbols
            .iter()
            .map(|s| s.info.clone())
            .collect())
    }

    async fn symbol_info(&self, symbol: &SymbolHandle) -> Result<SymbolInfo, HostError> {
        self.find_symbol(symbol).map(|s| s.info)
    }

    async fn selected_symbols(&self) -> Result<Vec<SymbolHandle>, HostError> {
        Ok(self.state().selection.clone())
    }

    async fn search_library(&self, query: &str) -> Result<Vec<LibraryPart>, HostError> {
        let needle = query.to_lowercase();
        Ok(self
            .parts
            .iter()
            .filter(|p| {
                p.uuid == query
                    || p.supplier_id.as_deref() == Some(query)
                    || p.name
                        .as_deref()
                        .map(|n| n.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn export_netlist(&self) -> Result<String, HostError> {
        Ok(self.netlist.clone())
    }

    async fn page_size(&self) -> Result<PageSize, HostError> {
        self.page
            .ok_or_else(|| HostError::Other(anyhow!("page info unavailable")))
    }

    async fn create_rectangle(&self, rect: &RectangleRequest) -> Result<(), HostError> {
        self.state().canvas.rectangles.push(rect.clone());
        Ok(())
    }

    async fn create_text(&self, text: &TextRequest) -> Result<(), HostError> {
        self.state().canvas.texts.push(text.clone());
        Ok(())
    }

    async fn create_wire(&self, wire: &WireRequest) -> Result<(), HostError> {
        if self.rejected_nets.contains(&wire.net) {
            return Err(HostError::Rejected(format!("wire on net {}", wire.net)));
        }
        if wire.points.len() < 2 {
            return Err(HostError::Rejected(
                "a wire needs at least two points".to_string(),
            ));
        }
        self.state().canvas.wires.push(wire.clone());
        Ok(())
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        tracing::debug!("notice ({:?}): {}", level, message);
        self.state().canvas.notices.push(Notice {
            level,
            message: message.to_string(),
        });
    }
}
