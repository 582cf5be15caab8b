//! Circuit Assembly Schema
//!
//! JSON input produced by the upstream placement stage: components with
//! coarse positions, routed edges (sections with bend points), block
//! rectangles and declared dangling nets.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::{Point, Rect};

/// Name of the block that frames the whole page
pub const ROOT_BLOCK_NAME: &str = "block___v_root__";

/// Separator between designator and pin number in a shape reference
pub const SHAPE_PIN_SEPARATOR: &str = "_pin_";

/// Root input for an assembly run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(default)]
    pub metadata: CircuitMetadata,

    #[serde(default)]
    pub components: Vec<Component>,

    #[serde(default)]
    pub edges: Vec<Edge>,

    #[serde(default, alias = "blocksRect")]
    pub blocks_rect: Vec<Block>,

    #[serde(default, alias = "addedNet")]
    pub added_net: Vec<DanglingNet>,

    #[serde(default)]
    pub assembly_options: Option<CircuitAssemblyOptions>,
}

impl Circuit {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The page frame block, if the layout stage emitted one
    pub fn root_block(&self) -> Option<&Block> {
        self.blocks_rect.iter().find(|b| b.is_root())
    }

    pub fn component(&self, designator: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.designator == designator)
    }

    /// Signal name declared on the input pin list, ignoring empty names
    pub fn declared_signal(&self, designator: &str, pin_number: u32) -> Option<&str> {
        self.component(designator)?
            .pins
            .iter()
            .find(|p| p.pin_number == Some(pin_number))
            .map(|p| p.signal_name.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitMetadata {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
}

/// Per-circuit options the layout stage may embed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CircuitAssemblyOptions {
    #[serde(default)]
    pub centered: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    pub designator: String,

    /// Library part reference; `None` or empty means the component is not placeable
    #[serde(default, alias = "partUuid")]
    pub part_uuid: Option<String>,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub pos: ComponentPosition,

    #[serde(default)]
    pub pins: Vec<ComponentPin>,

    #[serde(default)]
    pub block_name: Option<String>,
}

impl Component {
    pub fn part_reference(&self) -> Option<&str> {
        self.part_uuid.as_deref().filter(|p| !p.is_empty())
    }

    /// Absolute center in source-graph coordinates; an explicit center wins
    pub fn center(&self) -> Point {
        let pos = &self.pos;
        let cx = pos.center.map(|c| c.x).unwrap_or(pos.width / 2.0);
        let cy = pos.center.map(|c| c.y).unwrap_or(pos.height / 2.0);
        Point::new(pos.x + cx, pos.y + cy)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentPosition {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub center: Option<Point>,
    #[serde(default)]
    pub rotate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentPin {
    /// `None` when the producer sent something that is not a pin number
    #[serde(default, deserialize_with = "de_pin_number")]
    pub pin_number: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub signal_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One point-to-point routing request between two pin references
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub incoming_shape: Option<String>,
    #[serde(default)]
    pub outgoing_shape: Option<String>,
    #[serde(default)]
    pub bend_points: Vec<Point>,
    #[serde(default)]
    pub start_point: Option<Point>,
    #[serde(default)]
    pub end_point: Option<Point>,
}

impl Section {
    pub fn source(&self) -> PinRef {
        PinRef::parse(self.incoming_shape.as_deref().unwrap_or(""))
    }

    pub fn target(&self) -> PinRef {
        PinRef::parse(self.outgoing_shape.as_deref().unwrap_or(""))
    }
}

/// `<designator>_pin_<number>` split into its parts.
///
/// A missing separator or a non-numeric pin yields `pin_number: None`,
/// which never resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRef {
    pub designator: String,
    pub pin_number: Option<u32>,
}

impl PinRef {
    pub fn parse(shape: &str) -> Self {
        match shape.split_once(SHAPE_PIN_SEPARATOR) {
            Some((designator, pin)) => Self {
                designator: designator.to_string(),
                pin_number: pin.trim().parse().ok(),
            },
            None => Self {
                designator: shape.to_string(),
                pin_number: None,
            },
        }
    }
}

impl std::fmt::Display for PinRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pin_number {
            Some(pin) => write!(f, "{} {}", pin, self.designator),
            None => write!(f, "? {}", self.designator),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Block {
    pub fn is_root(&self) -> bool {
        self.name == ROOT_BLOCK_NAME
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A net that should end in a short stub on one pin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DanglingNet {
    pub designator: String,
    #[serde(default, deserialize_with = "de_pin_number")]
    pub pin_number: Option<u32>,
    pub net: String,
}

impl DanglingNet {
    /// Pin number for messages, `?` when it did not parse
    pub fn pin_label(&self) -> String {
        self.pin_number
            .map(|pin| pin.to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// Pin numbers arrive as JSON numbers, but some producers quote them.
///
/// Anything that is not a non-negative integer becomes `None`, so a single
/// bad pin cannot fail the whole circuit.
fn de_pin_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPin {
        Number(u32),
        Text(String),
        Other(IgnoredAny),
    }

    let pin = match RawPin::deserialize(deserializer)? {
        RawPin::Number(n) => Some(n),
        RawPin::Text(s) => {
            let parsed = s.trim().parse().ok();
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid pin number {:?}", s);
            }
            parsed
        }
        RawPin::Other(_) => {
            tracing::warn!("Ignoring non-numeric pin number");
            None
        }
    };
    Ok(pin)
}
