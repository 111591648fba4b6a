//! RegionSelector: two pixel-space rectangles and the channel points
//! inside them

use crate::viewport::{PixelPoint, PixelSize, ViewportMapper};
use serde::{Deserialize, Serialize};
use sigview_core::{Channel, ChannelId, SamplePoint};
use tracing::debug;

/// Number of rectangles needed before a splice is possible
pub const MAX_SELECTIONS: usize = 2;

/// Axis-aligned pixel rectangle, normalized so `left <= right` and
/// `top <= bottom`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    /// Channel the rectangle was drawn on
    pub channel: ChannelId,
}

impl SelectionRect {
    pub fn from_corners(a: PixelPoint, b: PixelPoint, channel: ChannelId) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
            channel,
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Progress of the two-rectangle selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    /// Rectangle with this index is the next one to be drawn/finalized
    Drawing(usize),
    /// Both rectangles are finalized
    Complete,
}

#[derive(Debug, Clone, Copy)]
struct Draft {
    anchor: PixelPoint,
    rect: SelectionRect,
}

/// Accumulates up to two selection rectangles and extracts the points of
/// a channel that fall inside each
#[derive(Debug, Clone, Default)]
pub struct RegionSelector {
    enabled: bool,
    drafts: [Option<Draft>; MAX_SELECTIONS],
    extracted: [Vec<SamplePoint>; MAX_SELECTIONS],
    current: usize,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flip selection mode. Either way all rectangles and extracted
    /// points are discarded.
    pub fn toggle_mode(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.reset();
        self.enabled
    }

    /// Clear rectangles and extracted sets, start over at the first one
    pub fn reset(&mut self) {
        self.drafts = [None, None];
        self.extracted = [Vec::new(), Vec::new()];
        self.current = 0;
    }

    pub fn state(&self) -> SelectionState {
        if self.current >= MAX_SELECTIONS {
            SelectionState::Complete
        } else {
            SelectionState::Drawing(self.current)
        }
    }

    /// Both rectangles finalized, splicing may proceed
    pub fn is_complete(&self) -> bool {
        self.state() == SelectionState::Complete
    }

    /// Start a rectangle at `point`. Returns false outside selection mode
    /// or once both rectangles are complete.
    pub fn begin(&mut self, channel: ChannelId, point: PixelPoint) -> bool {
        if !self.enabled || self.current >= MAX_SELECTIONS {
            return false;
        }
        self.drafts[self.current] = Some(Draft {
            anchor: point,
            rect: SelectionRect::from_corners(point, point, channel),
        });
        true
    }

    /// Move the far corner of the rectangle being drawn
    pub fn update(&mut self, point: PixelPoint) -> bool {
        if !self.enabled || self.current >= MAX_SELECTIONS {
            return false;
        }
        match self.drafts[self.current].as_mut() {
            Some(draft) => {
                draft.rect = SelectionRect::from_corners(draft.anchor, point, draft.rect.channel);
                true
            }
            None => false,
        }
    }

    /// Channel of the rectangle currently being drawn
    pub fn pending_channel(&self) -> Option<ChannelId> {
        self.drafts
            .get(self.current)
            .and_then(|d| d.as_ref())
            .map(|d| d.rect.channel)
    }

    /// Freeze the current rectangle and collect the points of `channel`
    /// whose pixel projection lies inside it.
    ///
    /// Returns the rectangles finalized so far, or `None` when there is
    /// nothing to finalize.
    pub fn finalize(
        &mut self,
        channel: &Channel,
        mapper: &ViewportMapper,
        size: PixelSize,
    ) -> Option<Vec<SelectionRect>> {
        if !self.enabled || self.current >= MAX_SELECTIONS {
            return None;
        }
        let rect = self.drafts[self.current]?.rect;

        // Snapshot the length so samples appended later are not visited
        let len = channel.len();
        let inside: Vec<SamplePoint> = channel.buffer()[..len]
            .iter()
            .copied()
            .filter(|&p| rect.contains(mapper.project(channel, p, size)))
            .collect();

        debug!(
            index = self.current,
            channel = %channel.id(),
            points = inside.len(),
            "finalized selection"
        );
        self.extracted[self.current] = inside;
        self.current += 1;
        Some(self.finalized())
    }

    /// Rectangles already finalized, in order
    pub fn finalized(&self) -> Vec<SelectionRect> {
        self.drafts[..self.current.min(MAX_SELECTIONS)]
            .iter()
            .flatten()
            .map(|d| d.rect)
            .collect()
    }

    /// Every live rectangle, including the one being drawn
    pub fn rectangles(&self) -> Vec<SelectionRect> {
        self.drafts.iter().flatten().map(|d| d.rect).collect()
    }

    /// Points extracted by rectangle `index`
    pub fn extracted(&self, index: usize) -> &[SamplePoint] {
        self.extracted.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Both extracted sets, once the selection is complete
    pub fn extracted_pair(&self) -> Option<(&[SamplePoint], &[SamplePoint])> {
        if self.is_complete() {
            Some((&self.extracted[0], &self.extracted[1]))
        } else {
            None
        }
    }
}
