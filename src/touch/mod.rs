/// Touch routing - turns drag and press gestures into highlight, selection and voice state
/// Drag tracking and press/release are two independent streams that share one router
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::audio::Voice;
use crate::error::{Error, Result};
use crate::pitch::{GridConfig, PitchGrid};

pub mod geometry;
pub mod layout;

pub use geometry::{Point, Rect};
pub use layout::HoneycombLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
    Highlighted(Option<usize>),
    Selected(usize),
    Pressed { cell: usize, frequency: f64 },
    Released(usize),
    Cancelled,
}

pub struct TouchRouter {
    pitches: PitchGrid,
    regions: HashMap<usize, Rect>,
    highlighted: Option<usize>,
    selected: Option<usize>,
    active: Option<usize>,
    drag: DragState,
    events: Vec<RouterEvent>,
}

impl TouchRouter {
    pub fn new(config: GridConfig) -> Result<Self> {
        Ok(Self::with_pitches(PitchGrid::new(config)?))
    }

    pub fn with_pitches(pitches: PitchGrid) -> Self {
        Self {
            pitches,
            regions: HashMap::new(),
            highlighted: None,
            selected: None,
            active: None,
            drag: DragState::Idle,
            events: Vec::new(),
        }
    }

    pub fn pitches(&self) -> &PitchGrid {
        &self.pitches
    }

    pub fn config(&self) -> &GridConfig {
        self.pitches.config()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Last cell a drag ended on
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn region(&self, cell: usize) -> Option<Rect> {
        self.regions.get(&cell).copied()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Upsert the hit region for a cell; later hit-tests use it immediately
    pub fn register_region(&mut self, cell: usize, rect: Rect) -> Result<()> {
        let config = self.config();
        if !config.contains(cell) {
            return Err(Error::OutOfRange {
                index: cell,
                num_cols: config.num_cols,
                num_rows: config.num_rows,
            });
        }
        self.regions.insert(cell, rect);
        Ok(())
    }

    /// Register every region of a layout, overwriting the previous rects
    pub fn apply_layout(&mut self, layout: &HoneycombLayout) -> Result<()> {
        for (cell, rect) in layout.regions() {
            self.register_region(cell, rect)?;
        }
        Ok(())
    }

    /// Forget all regions, e.g. after a resize; a highlight can no longer be resolved
    pub fn clear_regions(&mut self) {
        self.regions.clear();
        self.set_highlight(None);
    }

    /// Cell whose region contains `point`; first match in map order wins
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.regions
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(cell, _)| *cell)
    }

    pub fn update_highlight(&mut self, point: Point) -> Option<usize> {
        self.drag = DragState::Dragging;
        let hit = self.hit_test(point);
        self.set_highlight(hit);
        hit
    }

    /// Finish the drag, promoting the highlight (if any) to a one-shot selection
    pub fn end_drag(&mut self) -> Option<usize> {
        self.drag = DragState::Idle;

        let cell = self.highlighted.take()?;
        self.events.push(RouterEvent::Highlighted(None));
        self.selected = Some(cell);
        self.events.push(RouterEvent::Selected(cell));
        info!(cell, "selected");
        Some(cell)
    }

    pub fn press<V: Voice + ?Sized>(&mut self, cell: usize, voice: &mut V) -> Result<()> {
        if !self.config().contains(cell) {
            return Err(Error::InvalidCell(cell));
        }
        let frequency = self
            .pitches
            .frequency(cell)
            .map_err(|_| Error::InvalidCell(cell))?;

        self.active = Some(cell);
        self.events.push(RouterEvent::Pressed { cell, frequency });
        debug!(cell, frequency, "pressed");

        voice.set_frequency(frequency);
        voice.set_amplitude(self.config().amplitude);
        voice.start().inspect_err(|e| warn!(cell, "voice failed to start: {}", e))
    }

    pub fn release<V: Voice + ?Sized>(&mut self, cell: usize, voice: &mut V) -> Result<()> {
        if !self.config().contains(cell) {
            return Err(Error::InvalidCell(cell));
        }

        // Monophonic: any release silences the single voice
        self.active = None;
        self.events.push(RouterEvent::Released(cell));
        debug!(cell, "released");

        voice.stop().inspect_err(|e| warn!(cell, "voice failed to stop: {}", e))
    }

    /// Abort both gestures: drop the highlight without selecting and force-release
    pub fn cancel<V: Voice + ?Sized>(&mut self, voice: &mut V) -> Result<()> {
        self.drag = DragState::Idle;
        self.set_highlight(None);
        self.events.push(RouterEvent::Cancelled);

        match self.active.take() {
            Some(cell) => {
                self.events.push(RouterEvent::Released(cell));
                debug!(cell, "force released");
                voice.stop().inspect_err(|e| warn!(cell, "voice failed to stop: {}", e))
            }
            None => Ok(()),
        }
    }

    pub fn poll_events(&mut self) -> Vec<RouterEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_highlight(&mut self, cell: Option<usize>) {
        if self.highlighted != cell {
            self.highlighted = cell;
            self.events.push(RouterEvent::Highlighted(cell));
            debug!(?cell, "highlight");
        }
    }
}

impl Default for TouchRouter {
    fn default() -> Self {
        Self::with_pitches(PitchGrid::default())
    }
}
