//! Net-Stub Placer
//!
//! Declared dangling nets end in a short wire leaving the pin in the
//! direction the pin faces, so the editor attaches the net label to it.

use super::placer::PlacedComponents;
use super::resolver::{PinResolver, ResolvedPin, SearchScope};
use crate::host::{NoticeLevel, SchematicHost, WireRequest};
use crate::schema::DanglingNet;

pub const STUB_LENGTH: i64 = 20;

/// Direction a stub leaves its pin, by 90° quadrant of the pin rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubDirection {
    PosX,
    NegY,
    NegX,
    PosY,
}

impl StubDirection {
    pub fn from_rotation(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        if normalized < 90.0 {
            StubDirection::PosX
        } else if normalized < 180.0 {
            StubDirection::NegY
        } else if normalized < 270.0 {
            StubDirection::NegX
        } else {
            StubDirection::PosY
        }
    }

    pub fn delta(self, length: i64) -> (i64, i64) {
        match self {
            StubDirection::PosX => (length, 0),
            StubDirection::NegY => (0, -length),
            StubDirection::NegX => (-length, 0),
            StubDirection::PosY => (0, length),
        }
    }
}

/// Stub starting on the pin itself; only the length is on the grid
pub fn stub_wire(pin: &ResolvedPin, net: &str) -> WireRequest {
    let start = pin.position.round();
    let (dx, dy) = StubDirection::from_rotation(pin.rotation).delta(STUB_LENGTH);
    WireRequest {
        points: vec![start, start.offset(dx, dy)],
        net: net.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StubOutcome {
    pub drawn: usize,
    pub unresolved: usize,
    pub failed: usize,
}

pub struct NetStubPlacer<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    resolver: PinResolver<'a, H>,
}

impl<'a, H: SchematicHost + ?Sized> NetStubPlacer<'a, H> {
    pub fn new(host: &'a H, placed: &'a PlacedComponents) -> Self {
        Self {
            host,
            resolver: PinResolver::new(host, placed),
        }
    }

    pub async fn place_all(&self, nets: &[DanglingNet]) -> StubOutcome {
        let mut outcome = StubOutcome::default();

        for dangling in nets {
            let Some(found) = self
                .resolver
                .resolve(
                    &dangling.designator,
                    dangling.pin_number,
                    SearchScope::IncludeCanvas,
                )
                .await
            else {
                let pin = dangling.pin_label();
                tracing::warn!(
                    "No pin {}.{} for net {}",
                    dangling.designator,
                    pin,
                    dangling.net
                );
                self.host.notify(
                    NoticeLevel::Error,
                    &format!(
                        "Not found pin in placenet: {} {}",
                        dangling.designator, pin
                    ),
                );
                outcome.unresolved += 1;
                continue;
            };

            let wire = stub_wire(&found.pin, &dangling.net);
            match self.host.create_wire(&wire).await {
                Ok(()) => {
                    tracing::debug!(
                        "Stub {} on {}.{}",
                        dangling.net,
                        dangling.designator,
                        dangling.pin_label()
                    );
                    outcome.drawn += 1;
                }
                Err(e) => {
                    tracing::error!("Stub on {} rejected: {}", dangling.net, e);
                    self.host.notify(
                        NoticeLevel::Error,
                        &format!("Wire error: {} {}", e, dangling.net),
                    );
                    outcome.failed += 1;
                }
            }
        }

        if !nets.is_empty() {
            tracing::info!(
                "Placed {} net stubs ({} unresolved, {} failed)",
                outcome.drawn,
                outcome.unresolved,
                outcome.failed
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GridPoint, Point};
    use crate::host::SymbolHandle;

    fn pin_at(x: f64, y: f64, rotation: f64) -> ResolvedPin {
        ResolvedPin {
            symbol: SymbolHandle::new("s"),
            number: "1".into(),
            name: String::new(),
            position: Point::new(x, y),
            rotation,
        }
    }

    #[test]
    fn test_direction_quadrants() {
        assert_eq!(StubDirection::from_rotation(0.0), StubDirection::PosX);
        assert_eq!(StubDirection::from_rotation(45.0), StubDirection::PosX);
        assert_eq!(StubDirection::from_rotation(90.0), StubDirection::NegY);
        assert_eq!(StubDirection::from_rotation(180.0), StubDirection::NegX);
        assert_eq!(StubDirection::from_rotation(270.0), StubDirection::PosY);
        assert_eq!(StubDirection::from_rotation(359.0), StubDirection::PosY);
    }

    #[test]
    fn test_direction_normalizes_rotation() {
        assert_eq!(StubDirection::from_rotation(-90.0), StubDirection::PosY);
        assert_eq!(StubDirection::from_rotation(450.0), StubDirection::NegY);
        assert_eq!(StubDirection::from_rotation(720.0), StubDirection::PosX);
    }

    #[test]
    fn test_stub_wire_starts_on_pin() {
        let wire = stub_wire(&pin_at(101.0, -49.0, 180.0), "SDA");
        assert_eq!(wire.net, "SDA");
        assert_eq!(
            wire.points,
            vec![GridPoint::new(101, -49), GridPoint::new(81, -49)]
        );

        let wire = stub_wire(&pin_at(100.4, -49.5, 90.0), "SCL");
        assert_eq!(
            wire.points,
            vec![GridPoint::new(100, -49), GridPoint::new(100, -69)]
        );
    }
}
