//! Circuit Assembly Engine
//!
//! Drives one assembly run against a [`SchematicHost`]:
//! page offset → [`placer`] → [`router`] → [`stubs`] → [`annotate`].
//!
//! Placement is concurrent; everything after it runs in input order. Every
//! item is guarded on its own, so a failing component, wire or block is
//! reported and skipped without aborting the run.

pub mod annotate;
pub mod placer;
pub mod resolver;
pub mod router;
pub mod stubs;

pub use annotate::{AnnotationOutcome, BlockAnnotator, BlockPrimitives};
pub use placer::{ComponentPlacer, PartKind, PlacedComponent, PlacedComponents, PlacementOutcome};
pub use resolver::{PinMatch, PinResolver, ResolvedPin, SearchScope};
pub use router::{simplify_path, RoutingOutcome, SectionOutcome, WireRouter};
pub use stubs::{NetStubPlacer, StubDirection, StubOutcome};

use crate::core::{AssemblyOptions, AssemblyStats};
use crate::geometry::{page_offset, Offset, PageSize};
use crate::host::{NoticeLevel, SchematicHost};
use crate::schema::Circuit;

pub struct CircuitAssembler<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    options: AssemblyOptions,
}

impl<'a, H: SchematicHost + ?Sized> CircuitAssembler<'a, H> {
    pub fn new(host: &'a H, options: AssemblyOptions) -> Self {
        Self { host, options }
    }

    /// Page size reported by the host, or the configured fallback
    pub async fn page_size(&self) -> PageSize {
        match self.host.page_size().await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    "Page size unavailable ({}), using {}x{}",
                    e,
                    self.options.fallback_page.width,
                    self.options.fallback_page.height
                );
                self.options.fallback_page
            }
        }
    }

    pub async fn page_offset(&self, circuit: &Circuit) -> Offset {
        let page = self.page_size().await;
        let root = circuit.root_block().map(|b| b.rect());
        let centered = self.options.effective_centered(circuit);
        let offset = page_offset(root.as_ref(), page, centered);
        tracing::debug!("Page offset {:?} (centered: {})", offset, centered);
        offset
    }

    pub async fn assemble(&self, circuit: &Circuit) -> AssemblyStats {
        self.host.notify(NoticeLevel::Info, "Assemble circuit...");
        tracing::info!(
            "Assembling {} components, {} edges, {} blocks",
            circuit.components.len(),
            circuit.edges.len(),
            circuit.blocks_rect.len()
        );

        let offset = self.page_offset(circuit).await;

        let placement = ComponentPlacer::new(self.host, offset)
            .place_all(&circuit.components)
            .await;

        let routing = WireRouter::new(self.host, circuit, &placement.placed, offset)
            .route_all()
            .await;

        let stubs = NetStubPlacer::new(self.host, &placement.placed)
            .place_all(&circuit.added_net)
            .await;

        let blocks = BlockAnnotator::new(self.host, offset)
            .annotate_all(&circuit.blocks_rect)
            .await;

        self.host.notify(NoticeLevel::Success, "Assemble complete.");

        let stats = AssemblyStats {
            components_placed: placement.placed.len(),
            components_failed: placement.failed.len(),
            components_skipped: placement.skipped,
            wires_drawn: routing.drawn,
            sections_skipped: routing.skipped,
            wires_failed: routing.failed,
            stubs_drawn: stubs.drawn,
            stubs_unresolved: stubs.unresolved,
            stubs_failed: stubs.failed,
            blocks_drawn: blocks.drawn,
            blocks_failed: blocks.failed,
        };
        tracing::info!("Assembly finished with {} failures", stats.total_failures());
        stats
    }
}
