//! Pin Resolver
//!
//! Maps a `(designator, pin number)` reference onto a concrete pin position.
//! Components placed by this run are consulted first; the canvas may be
//! searched for symbols placed earlier when the caller allows it.

use super::placer::{sort_pins, PlacedComponents};
use crate::geometry::Point;
use crate::host::{HostPin, SchematicHost, SymbolHandle, SymbolInfo};

/// A pin of a symbol on the canvas, in the wire frame
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPin {
    pub symbol: SymbolHandle,
    pub number: String,
    pub name: String,
    pub position: Point,
    /// Degrees, one of 0/90/180/270 for well-formed symbols
    pub rotation: f64,
}

impl ResolvedPin {
    pub fn from_host(symbol: &SymbolHandle, pin: HostPin) -> Self {
        Self {
            symbol: symbol.clone(),
            number: pin.number,
            name: pin.name,
            position: Point::new(pin.x, pin.y),
            rotation: pin.rotation,
        }
    }

    pub fn numeric_number(&self) -> Option<u32> {
        self.number.trim().parse().ok()
    }
}

/// Where the resolver may look for a designator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Only components placed during this run
    PlacedOnly,
    /// Fall back to symbols already on the canvas
    IncludeCanvas,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinMatch {
    pub pin: ResolvedPin,
    /// True when the pin belongs to a symbol that was not placed by this run
    pub external: bool,
}

/// Pick a pin by number from an ordered pin list.
///
/// Pin 1 of a single-pin symbol always matches that pin, whatever it is
/// numbered on the symbol.
pub fn select_pin(pins: &[ResolvedPin], pin_number: u32) -> Option<&ResolvedPin> {
    if pin_number == 1 && pins.len() == 1 {
        return pins.first();
    }
    pins.iter().find(|p| p.numeric_number() == Some(pin_number))
}

fn designator_of(symbol: &SymbolInfo) -> &str {
    symbol.designator.as_deref().unwrap_or("")
}

/// Choose the canvas symbol for a designator: an exact designator wins over
/// the first designator that merely contains it
fn pick_canvas_symbol<'s>(symbols: &'s [SymbolInfo], designator: &str) -> Option<&'s SymbolInfo> {
    symbols
        .iter()
        .find(|s| designator_of(s) == designator)
        .or_else(|| symbols.iter().find(|s| designator_of(s).contains(designator)))
}

pub struct PinResolver<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    placed: &'a PlacedComponents,
}

impl<'a, H: SchematicHost + ?Sized> PinResolver<'a, H> {
    pub fn new(host: &'a H, placed: &'a PlacedComponents) -> Self {
        Self { host, placed }
    }

    /// Resolve a pin reference; `None` when nothing matches.
    ///
    /// A missing pin number never resolves. Host failures during the
    /// canvas search count as "not found".
    pub async fn resolve(
        &self,
        designator: &str,
        pin_number: Option<u32>,
        scope: SearchScope,
    ) -> Option<PinMatch> {
        let pin_number = pin_number?;

        if let Some(component) = self.placed.get(designator) {
            return select_pin(&component.pins, pin_number).map(|pin| PinMatch {
                pin: pin.clone(),
                external: false,
            });
        }

        if scope == SearchScope::PlacedOnly {
            return None;
        }

        let pins = self.canvas_pins(designator).await?;
        select_pin(&pins, pin_number).map(|pin| PinMatch {
            pin: pin.clone(),
            external: true,
        })
    }

    async fn canvas_pins(&self, designator: &str) -> Option<Vec<ResolvedPin>> {
        let symbols = match self.host.all_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::warn!("Canvas search for {} failed: {}", designator, e);
                return None;
            }
        };

        let symbol = pick_canvas_symbol(&symbols, designator)?;
        tracing::debug!(
            "Resolved {} against existing symbol {}",
            designator,
            symbol.handle
        );

        match self.host.symbol_pins(&symbol.handle).await {
            Ok(pins) => Some(
                sort_pins(pins)
                    .into_iter()
                    .map(|p| ResolvedPin::from_host(&symbol.handle, p))
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("Pins of {} unavailable: {}", symbol.handle, e);
                None
            }
        }
    }
}
