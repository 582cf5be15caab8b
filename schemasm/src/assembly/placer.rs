//! Component Placer
//!
//! Creates one symbol instance per placeable component and collects its
//! pins. Power symbols (`GND`, `VCC`) come from a fixed table; every other
//! part reference goes through the generic library path.

use std::collections::HashMap;

use futures::future::join_all;

use super::resolver::ResolvedPin;
use crate::geometry::{GridPoint, Offset};
use crate::host::{
    HostError, HostPin, LibraryRef, NoticeLevel, SchematicHost, SymbolHandle, SymbolRequest,
};
use crate::schema::Component;

/// Library holding the built-in power symbols
pub const POWER_LIBRARY_UUID: &str = "f5af0881d090439f925343ec8aedf154";
/// Library used for every other part reference
pub const GENERIC_LIBRARY_UUID: &str = "lcsc";

/// A power symbol with a fixed library identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSymbol {
    pub part: &'static str,
    pub symbol_uuid: &'static str,
}

pub static POWER_SYMBOLS: [PowerSymbol; 2] = [
    PowerSymbol {
        part: "GND",
        symbol_uuid: "181f479f152643bbaa46a4b8cd92ed2e",
    },
    PowerSymbol {
        part: "VCC",
        symbol_uuid: "4e5977e7f049493cbf5b5f91190144d3",
    },
];

/// How a part reference maps onto the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind<'a> {
    Power(&'static PowerSymbol),
    Library(&'a str),
}

impl<'a> PartKind<'a> {
    pub fn classify(part: &'a str) -> Self {
        POWER_SYMBOLS
            .iter()
            .find(|p| p.part == part)
            .map(PartKind::Power)
            .unwrap_or(PartKind::Library(part))
    }

    pub fn library_ref(&self) -> LibraryRef {
        match self {
            PartKind::Power(p) => LibraryRef::new(POWER_LIBRARY_UUID, p.symbol_uuid),
            PartKind::Library(part) => LibraryRef::new(GENERIC_LIBRARY_UUID, *part),
        }
    }
}

/// A symbol on the canvas together with its sorted pins
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedComponent {
    pub symbol: SymbolHandle,
    pub pins: Vec<ResolvedPin>,
    pub designator: String,
}

/// Designator → placed component; built once, read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct PlacedComponents {
    by_designator: HashMap<String, PlacedComponent>,
}

impl PlacedComponents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, designator: &str) -> Option<&PlacedComponent> {
        self.by_designator.get(designator)
    }

    pub fn contains(&self, designator: &str) -> bool {
        self.by_designator.contains_key(designator)
    }

    pub fn len(&self) -> usize {
        self.by_designator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_designator.is_empty()
    }

    pub fn designators(&self) -> impl Iterator<Item = &str> {
        self.by_designator.keys().map(String::as_str)
    }
}

impl FromIterator<PlacedComponent> for PlacedComponents {
    fn from_iter<I: IntoIterator<Item = PlacedComponent>>(iter: I) -> Self {
        Self {
            by_designator: iter
                .into_iter()
                .map(|c| (c.designator.clone(), c))
                .collect(),
        }
    }
}

/// Result of placing a component list
#[derive(Debug, Default)]
pub struct PlacementOutcome {
    pub placed: PlacedComponents,
    /// Designators whose placement failed
    pub failed: Vec<String>,
    /// Components without a part reference
    pub skipped: usize,
}

/// Sort pins ascending by numeric pin number; non-numeric pins go last
pub fn sort_pins(mut pins: Vec<HostPin>) -> Vec<HostPin> {
    pins.sort_by_key(|p| match p.numeric_number() {
        Some(n) => (0, n),
        None => (1, 0),
    });
    pins
}

/// Build the placement request, or `None` for components without a part reference
pub fn symbol_request(component: &Component, offset: &Offset) -> Option<SymbolRequest> {
    let part = component.part_reference()?;
    let at = placement_point(component, offset);
    let value = Some(component.value.as_str()).filter(|v| !v.is_empty());

    let request = match PartKind::classify(part) {
        kind @ PartKind::Power(power) => {
            let net = value.unwrap_or(power.part).to_string();
            SymbolRequest {
                library: kind.library_ref(),
                at,
                rotation: component.pos.rotate,
                designator: None,
                name: Some(net.clone()),
                global_net_name: Some(net),
            }
        }
        kind @ PartKind::Library(_) => SymbolRequest {
            library: kind.library_ref(),
            at,
            rotation: component.pos.rotate,
            designator: Some(component.designator.clone()),
            name: None,
            global_net_name: None,
        },
    };

    Some(request)
}

pub struct ComponentPlacer<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    offset: Offset,
}

impl<'a, H: SchematicHost + ?Sized> ComponentPlacer<'a, H> {
    pub fn new(host: &'a H, offset: Offset) -> Self {
        Self { host, offset }
    }

    /// Place every component concurrently; failures are reported and omitted
    pub async fn place_all(&self, components: &[Component]) -> PlacementOutcome {
        let mut outcome = PlacementOutcome::default();

        let pending: Vec<_> = components
            .iter()
            .filter_map(|c| symbol_request(c, &self.offset).map(|req| (c, req)))
            .collect();
        outcome.skipped = components.len() - pending.len();

        let results = join_all(
            pending
                .iter()
                .map(|(component, request)| self.place(component, request)),
        )
        .await;

        let mut placed = Vec::with_capacity(results.len());
        for ((component, _), result) in pending.iter().zip(results) {
            match result {
                Ok(p) => placed.push(p),
                Err(e) => {
                    tracing::warn!("Placement of {} failed: {}", component.designator, e);
                    self.host.notify(
                        NoticeLevel::Error,
                        &format!("Component error {}: {}", component.designator, e),
                    );
                    outcome.failed.push(component.designator.clone());
                }
            }
        }

        outcome.placed = placed.into_iter().collect();
        tracing::info!(
            "Placed {} components ({} failed, {} without part reference)",
            outcome.placed.len(),
            outcome.failed.len(),
            outcome.skipped
        );
        outcome
    }

    async fn place(
        &self,
        component: &Component,
        request: &SymbolRequest,
    ) -> Result<PlacedComponent, HostError> {
        let symbol = self.host.place_symbol(request).await?;
        self.host.notify(
            NoticeLevel::Success,
            &format!(
                "Component {} place at {} {}",
                component.designator, request.at.x, request.at.y
            ),
        );

        let pins = sort_pins(self.host.symbol_pins(&symbol).await?)
            .into_iter()
            .map(|p| ResolvedPin::from_host(&symbol, p))
            .collect();

        self.host.finish_symbol(&symbol).await?;
        tracing::debug!("Placed {} at {}", component.designator, request.at);

        Ok(PlacedComponent {
            symbol,
            pins,
            designator: component.designator.clone(),
        })
    }
}

/// Grid position a component will be placed at
pub fn placement_point(component: &Component, offset: &Offset) -> GridPoint {
    offset.apply(component.center()).quantize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ComponentPosition;

    fn component(designator: &str, part: Option<&str>, value: &str) -> Component {
        Component {
            designator: designator.into(),
            part_uuid: part.map(String::from),
            value: value.into(),
            pos: ComponentPosition {
                x: 12.0,
                y: 21.0,
                width: 10.0,
                height: 10.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_power_parts() {
        assert!(matches!(PartKind::classify("GND"), PartKind::Power(p) if p.part == "GND"));
        assert!(matches!(PartKind::classify("VCC"), PartKind::Power(p) if p.part == "VCC"));
        assert_eq!(PartKind::classify("C25804"), PartKind::Library("C25804"));
        assert_eq!(
            PartKind::classify("gnd").library_ref(),
            LibraryRef::new(GENERIC_LIBRARY_UUID, "gnd")
        );
    }

    #[test]
    fn test_power_request_uses_value_as_net() {
        let req = symbol_request(&component("#PWR1", Some("VCC"), "+3V3"), &Offset::identity())
            .unwrap();
        assert_eq!(req.library.library_uuid, POWER_LIBRARY_UUID);
        assert_eq!(req.library.uuid, "4e5977e7f049493cbf5b5f91190144d3");
        assert_eq!(req.name.as_deref(), Some("+3V3"));
        assert_eq!(req.global_net_name.as_deref(), Some("+3V3"));
        assert!(req.designator.is_none());

        let req = symbol_request(&component("#PWR2", Some("GND"), ""), &Offset::identity())
            .unwrap();
        assert_eq!(req.global_net_name.as_deref(), Some("GND"));
    }

    #[test]
    fn test_generic_request() {
        let offset = Offset::new(Some(100.0), Some(300.0));
        let req = symbol_request(&component("R1", Some("C25804"), "10k"), &offset).unwrap();
        assert_eq!(req.library, LibraryRef::new("lcsc", "C25804"));
        assert_eq!(req.designator.as_deref(), Some("R1"));
        // center (17, 26) -> (117, 274) -> grid
        assert_eq!(req.at, GridPoint::new(115, 270));
    }

    #[test]
    fn test_no_part_reference() {
        assert!(symbol_request(&component("X1", None, ""), &Offset::identity()).is_none());
        assert!(symbol_request(&component("X2", Some(""), ""), &Offset::identity()).is_none());
    }

    #[test]
    fn test_sort_pins() {
        let pin = |n: &str| HostPin {
            number: n.into(),
            name: String::new(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
        };
        let sorted = sort_pins(vec![pin("10"), pin("EP"), pin("2"), pin("1")]);
        let numbers: Vec<_> = sorted.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "10", "EP"]);
    }
}
