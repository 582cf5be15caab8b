//! Schematic Extractor
//!
//! Reads components that are already on the canvas back into an
//! [`ExplainedCircuit`]: designator, value, pins with their netlist signals
//! and the library part the component was placed from.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point;
use crate::host::{HostError, NoticeLevel, SchematicHost, SymbolHandle, SymbolInfo};
use crate::parser::netlist::{parse_netlist, PinSignalMap};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Netlist export failed: {0}")]
    Netlist(#[source] HostError),
    #[error("Selection unavailable: {0}")]
    Selection(#[source] HostError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainedCircuit {
    pub components: Vec<ExplainedComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedComponent {
    pub designator: String,
    pub value: String,
    pub pins: Vec<ExplainedPin>,
    /// Library part uuid, when a search found the component's supplier part
    pub part_uuid: Option<String>,
    pub pos: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainedPin {
    pub pin_number: u32,
    pub name: String,
    pub signal_name: String,
}

/// Display value of a component.
///
/// Names that reference the manufacturer part or the `Value` property are
/// templates; a leading `=` marks an unresolved expression.
pub fn component_value(info: &SymbolInfo) -> String {
    let name = info.name.as_deref().unwrap_or("");
    let manufacturer = || info.manufacturer_id.clone().unwrap_or_default();

    let value = if name.contains("Manufacturer Part") {
        Some(manufacturer())
    } else if name.contains("Value") {
        info.properties.get("Value").cloned()
    } else if !name.starts_with('=') {
        Some(name.to_string())
    } else {
        None
    };

    value.filter(|v| !v.is_empty()).unwrap_or_else(manufacturer)
}

/// Leading decimal digits of a pin number, `0` when there are none
pub fn parse_pin_number(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}

/// Library search query: supplier id, else sub-part name, else manufacturer id
fn search_query(info: &SymbolInfo) -> Option<&str> {
    info.supplier_id
        .as_deref()
        .or(info.sub_part_name.as_deref())
        .or(info.manufacturer_id.as_deref())
}

/// A component read from the canvas, still waiting for its part lookup
struct Pending {
    component: ExplainedComponent,
    query: String,
    supplier_id: Option<String>,
}

pub struct SchematicExtractor<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
}

impl<'a, H: SchematicHost + ?Sized> SchematicExtractor<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Explain the given symbols, or the current selection when `ids` is `None`
    pub async fn extract(
        &self,
        ids: Option<&[SymbolHandle]>,
    ) -> Result<ExplainedCircuit, ExtractError> {
        let netlist = self
            .host
            .export_netlist()
            .await
            .map_err(ExtractError::Netlist)?;
        let signals = parse_netlist(&netlist);

        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => self
                .host
                .selected_symbols()
                .await
                .map_err(ExtractError::Selection)?,
        };

        let mut pending = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(p) = self.read_component(id, &signals).await {
                pending.push(p);
            }
        }

        let lookups = join_all(pending.iter().map(|p| self.lookup_part(p))).await;
        let components = pending
            .into_iter()
            .zip(lookups)
            .map(|(p, part_uuid)| ExplainedComponent {
                part_uuid,
                ..p.component
            })
            .collect::<Vec<_>>();

        tracing::info!("Extracted {} of {} symbols", components.len(), ids.len());
        Ok(ExplainedCircuit { components })
    }

    async fn read_component(&self, id: &SymbolHandle, signals: &PinSignalMap) -> Option<Pending> {
        let info = match self.host.symbol_info(id).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", id, e);
                return None;
            }
        };

        if !info.is_component {
            tracing::warn!("Skipping {}: not a component", id);
            return None;
        }
        let designator = info.designator.as_deref().unwrap_or("").to_string();
        if designator.trim().is_empty() {
            tracing::warn!("Skipping {}: no designator", id);
            return None;
        }

        let value = component_value(&info);
        tracing::debug!("Component {}, value {}", designator, value);

        let pins = match self.host.symbol_pins(id).await {
            Ok(pins) => pins
                .into_iter()
                .map(|p| {
                    let pin_number = parse_pin_number(&p.number);
                    ExplainedPin {
                        pin_number,
                        signal_name: signals
                            .signal_for(&designator, pin_number)
                            .unwrap_or("")
                            .to_string(),
                        name: p.name,
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!("No pins for {}: {}", designator, e);
                Vec::new()
            }
        };

        let Some(query) = search_query(&info) else {
            self.host.notify(
                NoticeLevel::Error,
                &format!("Fail get component {}", designator),
            );
            return None;
        };

        Some(Pending {
            query: query.to_string(),
            supplier_id: info.supplier_id.clone(),
            component: ExplainedComponent {
                designator,
                value,
                pins,
                part_uuid: None,
                pos: Point::new(info.x, info.y),
            },
        })
    }

    /// First search result carrying the component's supplier id
    async fn lookup_part(&self, pending: &Pending) -> Option<String> {
        match self.host.search_library(&pending.query).await {
            Ok(parts) => parts
                .into_iter()
                .find(|p| p.supplier_id == pending.supplier_id)
                .map(|p| p.uuid),
            Err(e) => {
                tracing::warn!("Library search for {} failed: {}", pending.query, e);
                None
            }
        }
    }
}

/// Convenience wrapper around [`SchematicExtractor::extract`]
pub async fn extract_schematic<H: SchematicHost + ?Sized>(
    host: &H,
    ids: Option<&[SymbolHandle]>,
) -> Result<ExplainedCircuit, ExtractError> {
    SchematicExtractor::new(host).extract(ids).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> SymbolInfo {
        SymbolInfo {
            is_component: true,
            designator: Some("R1".into()),
            name: Some(name.into()),
            manufacturer_id: Some("RC0603FR-0710KL".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_value_from_plain_name() {
        assert_eq!(component_value(&info("10k")), "10k");
    }

    #[test]
    fn test_value_from_manufacturer_template() {
        assert_eq!(
            component_value(&info("={Manufacturer Part}")),
            "RC0603FR-0710KL"
        );
    }

    #[test]
    fn test_value_from_property_template() {
        let mut i = info("={Value}");
        i.properties.insert("Value".into(), "4.7uF".into());
        assert_eq!(component_value(&i), "4.7uF");

        // missing property falls back to the manufacturer id
        assert_eq!(component_value(&info("={Value}")), "RC0603FR-0710KL");
    }

    #[test]
    fn test_value_expression_falls_back() {
        assert_eq!(component_value(&info("=Other")), "RC0603FR-0710KL");

        let mut bare = info("");
        bare.manufacturer_id = None;
        assert_eq!(component_value(&bare), "");
    }

    #[test]
    fn test_parse_pin_number() {
        assert_eq!(parse_pin_number("12"), 12);
        assert_eq!(parse_pin_number(" 3"), 3);
        assert_eq!(parse_pin_number("4A"), 4);
        assert_eq!(parse_pin_number("EP"), 0);
        assert_eq!(parse_pin_number(""), 0);
    }

    #[test]
    fn test_search_query_order() {
        let mut i = info("x");
        assert_eq!(search_query(&i), Some("RC0603FR-0710KL"));
        i.sub_part_name = Some("R0603".into());
        assert_eq!(search_query(&i), Some("R0603"));
        i.supplier_id = Some("C25804".into());
        assert_eq!(search_query(&i), Some("C25804"));
    }
}
