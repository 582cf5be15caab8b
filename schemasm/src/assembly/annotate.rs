//! Block Annotator
//!
//! Frames every functional block with a rounded rectangle, its wrapped
//! description and its name. The root block is the page frame and is
//! never drawn.

use crate::geometry::{quantize, Offset, Point, GRID};
use crate::host::{HostError, NoticeLevel, RectangleRequest, SchematicHost, TextRequest};
use crate::schema::Block;

pub const BLOCK_PADDING: f64 = 5.0;
pub const CORNER_RADIUS: f64 = 2.0;
pub const WORDS_PER_LINE: usize = 8;
pub const DESCRIPTION_FONT_SIZE: f64 = 5.0;
pub const NAME_FONT_SIZE: f64 = 14.0;

/// Vertical gap between the frame's top edge and the description
const DESCRIPTION_GAP: f64 = 3.0;
/// Vertical gap between the frame's top edge and the name
const NAME_GAP: f64 = 18.0;
/// Vertical space reserved per description line
const LINE_HEIGHT: f64 = GRID as f64;

/// Split a description into lines of at most [`WORDS_PER_LINE`] words
pub fn wrap_description(description: &str) -> Vec<String> {
    let words: Vec<&str> = description.split_whitespace().collect();
    words
        .chunks(WORDS_PER_LINE)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Primitives drawn for one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPrimitives {
    pub rectangle: RectangleRequest,
    pub description: Option<TextRequest>,
    pub name: TextRequest,
}

pub fn block_primitives(block: &Block, offset: &Offset) -> BlockPrimitives {
    let top_left = offset
        .apply(Point::new(block.x - BLOCK_PADDING, block.y - BLOCK_PADDING))
        .quantize();

    let lines = wrap_description(&block.description);
    let line_offset = LINE_HEIGHT * lines.len() as f64;
    let below_top = |gap: f64| {
        Point::new(top_left.x as f64, top_left.y as f64 + gap + line_offset).quantize()
    };

    let description = (!lines.is_empty()).then(|| TextRequest {
        at: below_top(DESCRIPTION_GAP),
        text: lines.join("\n"),
        font_size: DESCRIPTION_FONT_SIZE,
    });

    BlockPrimitives {
        rectangle: RectangleRequest {
            top_left,
            width: quantize(block.width + 2.0 * BLOCK_PADDING),
            height: quantize(block.height + 2.0 * BLOCK_PADDING),
            corner_radius: CORNER_RADIUS,
        },
        description,
        name: TextRequest {
            at: below_top(NAME_GAP),
            text: block.name.clone(),
            font_size: NAME_FONT_SIZE,
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationOutcome {
    pub drawn: usize,
    pub failed: usize,
}

pub struct BlockAnnotator<'a, H: SchematicHost + ?Sized> {
    host: &'a H,
    offset: Offset,
}

impl<'a, H: SchematicHost + ?Sized> BlockAnnotator<'a, H> {
    pub fn new(host: &'a H, offset: Offset) -> Self {
        Self { host, offset }
    }

    pub async fn annotate_all(&self, blocks: &[Block]) -> AnnotationOutcome {
        let mut outcome = AnnotationOutcome::default();

        for block in blocks.iter().filter(|b| !b.is_root()) {
            let primitives = block_primitives(block, &self.offset);
            match self.draw(&primitives).await {
                Ok(()) => outcome.drawn += 1,
                Err(e) => {
                    tracing::error!("Block {} not drawn: {}", block.name, e);
                    self.host.notify(
                        NoticeLevel::Error,
                        &format!("Block error {}: {}", block.name, e),
                    );
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            "Annotated {} blocks ({} failed)",
            outcome.drawn,
            outcome.failed
        );
        outcome
    }

    async fn draw(&self, primitives: &BlockPrimitives) -> Result<(), HostError> {
        self.host.create_rectangle(&primitives.rectangle).await?;
        if let Some(description) = &primitives.description {
            self.host.create_text(description).await?;
        }
        self.host.create_text(&primitives.name).await
    }
}
