//! Wire Router
//!
//! Turns each edge section into one orthogonal wire:
//!
//! 1. resolve both endpoint pins (falling back to the section's own
//!    start/end points)
//! 2. snap bend points that sit within [`SNAP_TOLERANCE`] of an endpoint
//!    onto that endpoint's axis
//! 3. quantize, insert corners between diagonal neighbours and drop
//!    revisited points
//!
//! Every path handed to the host is orthogonal, on the grid and visits each
//! point once.

use std::collections::HashSet;

use super::placer::PlacedComponents;
use super::resolver::{PinResolver, SearchScope};
use crate::geometry::{GridPoint, Offset, Point};
use crate::host::{NoticeLevel, SchematicHost, WireRequest};
use crate::schema::{Circuit, PinRef, Section};

/// Distance within which a bend coordinate locks onto an endpoint
pub const SNAP_TOLERANCE: f64 = 5.0;

/// Net name used when neither endpoint declares a signal
pub const UNKNOWN_NET: &str = "unknown net";

/// Snap one axis of a bend point; the source endpoint is checked first
pub fn snap_axis(bend: f64, source: f64, target: f64) -> f64 {
    if (bend - source).abs() <= SNAP_TOLERANCE {
        source
    } else if (bend - target).abs() <= SNAP_TOLERANCE {
        target
    } else {
        bend
    }
}

pub fn snap_bend(bend: Point, source: Point, target: Point) -> Point {
    Point::new(
        snap_axis(bend.x, source.x, target.x),
        snap_axis(bend.y, source.y, target.y),
    )
}

/// Corner that joins two diagonal neighbours
fn corner(cur: GridPoint, next: GridPoint) -> GridPoint {
    let dx = (next.x - cur.x).abs();
    let dy = (next.y - cur.y).abs();
    if dx < dy {
        GridPoint::new(next.x, cur.y)
    } else {
        GridPoint::new(cur.x, next.y)
    }
}

/// Insert one corner between every diagonal pair of consecutive points
pub fn orthogonalize(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut path = Vec::with_capacity(points.len() * 2);
    for pair in points.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        path.push(cur);
        if !cur.is_aligned_with(&next) {
            path.push(corner(cur, next));
        }
    }
    path.extend(points.last().copied());
    path
}

/// Drop every point that was already visited, keeping first-seen order
pub fn dedup_points(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut seen = HashSet::with_capacity(points.len());
    points.iter().copied().filter(|p| seen.insert(*p)).collect()
}

/// Re-close diagonal gaps left behind by [`dedup_points`].
///
/// Of the two possible corners the one not yet on the path is used. When
/// both are taken the preferred corner is used and the revisit is left for
/// [`erase_loops`].
fn reconnect(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut on_path: HashSet<GridPoint> = points.iter().copied().collect();
    let mut path = Vec::with_capacity(points.len());

    for pair in points.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        path.push(cur);
        if cur.is_aligned_with(&next) {
            continue;
        }

        let preferred = corner(cur, next);
        let alternate = if preferred.x == next.x {
            GridPoint::new(cur.x, next.y)
        } else {
            GridPoint::new(next.x, cur.y)
        };
        let chosen = if on_path.contains(&preferred) && !on_path.contains(&alternate) {
            alternate
        } else {
            preferred
        };
        on_path.insert(chosen);
        path.push(chosen);
    }
    path.extend(points.last().copied());
    path
}

/// Cut the loop closed by every revisited point.
///
/// Each step either appends a neighbour of the current last point or
/// truncates back to an earlier copy of that neighbour, so an orthogonal
/// input stays orthogonal and keeps both endpoints.
pub fn erase_loops(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut path: Vec<GridPoint> = Vec::with_capacity(points.len());
    for &point in points {
        match path.iter().position(|p| *p == point) {
            Some(first) => path.truncate(first + 1),
            None => path.push(point),
        }
    }
    path
}

pub fn is_orthogonal(points: &[GridPoint]) -> bool {
    points.windows(2).all(|pair| pair[0].is_aligned_with(&pair[1]))
}

/// Full simplification pipeline on already quantized points
pub fn simplify_path(points: &[GridPoint]) -> Vec<GridPoint> {
    let path = dedup_points(&orthogonalize(points));
    if is_orthogonal(&path) {
        path
    } else {
        erase_loops(&reconnect(&path))
    }
}

/// Build a wire path from raw wire-frame endpoints and bend points
pub fn build_path(source: Point, bends: &[Point], target: Point) -> Vec<GridPoint> {
    let mut raw = Vec::with_capacity(bends.len() + 2);
    raw.push(source.quantize());
    raw.extend(bends.iter().map(|b| snap_bend(*b, source, target).quantize()));
    raw.push(target.quantize());
    simplify_path(&raw)
}

/// Declared signal of the source pin, else of the target pin
pub fn net_name(circuit: &Circuit, source: &PinRef, target: &PinRef) -> String {
    let declared = |r: &PinRef| {
        r.pin_number
            .and_then(|pin| circuit.declared_signal(&r.designator, pin))
    };
    declared(source)
        .or_else(|| declared(target))
        .unwrap_or(UNKNOWN_NET)
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOutcome {
    Drawn,
    /// An endpoint could not be located at all
    Skipped,
    /// The host rejected the wire
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub drawn: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RoutingOutcome {
    fn record(&mut self, outcome: SectionOutcome) {
        match outcome {
            SectionOutcome::Drawn => self.drawn += 1,
            SectionOutcome::Skipped => self.skipped += 1,
            SectionOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct WireRouter<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    circuit: &'a Circuit,
    resolver: PinResolver<'a, H>,
    offset: Offset,
}

impl<'a, H: SchematicHost + ?Sized> WireRouter<'a, H> {
    pub fn new(
        host: &'a H,
        circuit: &'a Circuit,
        placed: &'a PlacedComponents,
        offset: Offset,
    ) -> Self {
        Self {
            host,
            circuit,
            resolver: PinResolver::new(host, placed),
            offset,
        }
    }

    /// Route every section of every edge, in input order
    pub async fn route_all(&self) -> RoutingOutcome {
        let mut outcome = RoutingOutcome::default();
        for edge in &self.circuit.edges {
            for section in &edge.sections {
                outcome.record(self.route_section(section).await);
            }
        }
        tracing::info!(
            "Routed {} wires ({} skipped, {} failed)",
            outcome.drawn,
            outcome.skipped,
            outcome.failed
        );
        outcome
    }

    pub async fn route_section(&self, section: &Section) -> SectionOutcome {
        let source = section.source();
        let target = section.target();
        let net = net_name(self.circuit, &source, &target);

        let start = self.endpoint(&source, section.start_point).await;
        let end = self.endpoint(&target, section.end_point).await;
        let (Some(start), Some(end)) = (start, end) else {
            tracing::warn!("Skipping section {} -> {}: endpoint unavailable", source, target);
            return SectionOutcome::Skipped;
        };

        let bends: Vec<Point> = section
            .bend_points
            .iter()
            .map(|b| self.offset.to_wire_frame(*b))
            .collect();

        let wire = WireRequest {
            points: build_path(start, &bends, end),
            net,
        };

        match self.host.create_wire(&wire).await {
            Ok(()) => {
                tracing::debug!("Wire {} with {} points", wire.net, wire.points.len());
                SectionOutcome::Drawn
            }
            Err(e) => {
                tracing::error!("Wire on {} rejected: {}", wire.net, e);
                self.host.notify(
                    NoticeLevel::Error,
                    &format!(
                        "Wire error: {} {:?} {} {} -> {}",
                        e,
                        wire.flat_coordinates(),
                        wire.net,
                        section.incoming_shape.as_deref().unwrap_or(""),
                        section.outgoing_shape.as_deref().unwrap_or("")
                    ),
                );
                SectionOutcome::Failed
            }
        }
    }

    /// Wire-frame position of one section end
    async fn endpoint(&self, pin: &PinRef, fallback: Option<Point>) -> Option<Point> {
        if let Some(found) = self
            .resolver
            .resolve(&pin.designator, pin.pin_number, SearchScope::PlacedOnly)
            .await
        {
            return Some(found.pin.position);
        }

        self.host.notify(
            NoticeLevel::Error,
            &format!("Wire error not found pin: {}", pin),
        );
        fallback.map(|p| self.offset.to_wire_frame(p))
    }
}
