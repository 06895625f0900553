//! # Complication Slots
//!
//! Two small text dials sit diagonally across the center: slot 0 ("Primary") toward the
//! bottom-left and slot 1 ("Secondary") toward the top-right. Providers push data at any
//! time; only short-text payloads for a known slot are kept. A slot without text is not
//! drawn at all.

use log::debug;
use serde::Serialize;

use crate::canvas::{Canvas, Paint, RectF};

/// Identifier of a complication slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SlotId(u8);

impl SlotId {
    pub const PRIMARY: SlotId = SlotId(0);
    pub const SECONDARY: SlotId = SlotId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for SlotId {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SlotId::PRIMARY),
            1 => Ok(SlotId::SECONDARY),
            other => Err(other),
        }
    }
}

/// Payload kinds a provider may send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplicationKind {
    ShortText,
    LongText,
    RangedValue,
    Icon,
    SmallImage,
    Empty,
    NoData,
}

/// One provider update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplicationData {
    pub kind: ComplicationKind,
    pub text: Option<String>,
}

impl ComplicationData {
    pub fn short_text(text: impl Into<String>) -> Self {
        Self {
            kind: ComplicationKind::ShortText,
            text: Some(text.into()),
        }
    }

    pub fn of_kind(kind: ComplicationKind) -> Self {
        Self { kind, text: None }
    }
}

/// A dial's latest text and screen region.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComplicationSlot {
    pub id: SlotId,
    pub name: &'static str,
    pub supported: &'static [ComplicationKind],
    pub region: RectF,
    pub text: Option<String>,
}

impl ComplicationSlot {
    fn new(id: SlotId, name: &'static str) -> Self {
        Self {
            id,
            name,
            supported: &[ComplicationKind::ShortText],
            region: RectF::default(),
            text: None,
        }
    }

    pub fn supports(&self, kind: ComplicationKind) -> bool {
        self.supported.contains(&kind)
    }

    /// Disc in `disc` paint with the text centered by its measured bounds.
    pub fn draw(&self, canvas: &mut dyn Canvas, disc: &Paint, text_paint: &Paint) -> bool {
        let Some(text) = &self.text else {
            return false;
        };
        canvas.draw_oval(self.region, disc);
        let bounds = canvas.measure_text(text, text_paint);
        canvas.draw_text(
            text,
            self.region.center_x() - bounds.width() / 2.0,
            self.region.center_y() + bounds.height() / 2.0,
            text_paint,
        );
        true
    }
}

/// Both complication slots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComplicationSet {
    slots: [ComplicationSlot; 2],
}

impl Default for ComplicationSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplicationSet {
    /// Diagonal offset of each dial from the center, as a fraction of the radius.
    pub const OFFSET_FRACTION: f32 = 0.282_842_7; // 1 / (2.5·√2)

    pub fn new() -> Self {
        Self {
            slots: [
                ComplicationSlot::new(SlotId::PRIMARY, "Primary"),
                ComplicationSlot::new(SlotId::SECONDARY, "Secondary"),
            ],
        }
    }

    pub fn slot(&self, id: SlotId) -> &ComplicationSlot {
        &self.slots[id.index()]
    }

    pub fn slots(&self) -> &[ComplicationSlot] {
        &self.slots
    }

    /// Store a provider update. Returns whether a slot's text changed.
    pub fn on_data_update(&mut self, id: u32, data: ComplicationData) -> bool {
        let Ok(slot_id) = SlotId::try_from(id) else {
            debug!("Ignoring complication data for unknown slot {}", id);
            return false;
        };
        let slot = &mut self.slots[slot_id.index()];
        if !slot.supports(data.kind) {
            debug!("Ignoring {:?} complication data for slot {}", data.kind, slot.name);
            return false;
        }
        let Some(text) = data.text else {
            debug!("Ignoring short text without text for slot {}", slot.name);
            return false;
        };
        debug!("Complication {} text: {}", slot.name, text);
        let changed = slot.text.as_deref() != Some(text.as_str());
        slot.text = Some(text);
        changed
    }

    /// Recompute both regions for a surface centered at `(cx, cy)`.
    pub fn layout(&mut self, cx: f32, cy: f32) {
        let half = (cx / 5.0).trunc();
        let off = Self::OFFSET_FRACTION;
        self.slots[0].region = RectF::centered(cx * (1.0 - off), cy * (1.0 + off), half);
        self.slots[1].region = RectF::centered(cx * (1.0 + off), cy * (1.0 - off), half);
    }

    /// Draw every slot that has text. Returns how many were drawn.
    pub fn draw(&self, canvas: &mut dyn Canvas, disc: &Paint, text_paint: &Paint) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.draw(canvas, disc, text_paint))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, DrawCommand, RecordingCanvas};

    #[test]
    fn test_slots_start_empty() {
        let set = ComplicationSet::new();
        assert_eq!(set.slot(SlotId::PRIMARY).name, "Primary");
        assert_eq!(set.slot(SlotId::SECONDARY).name, "Secondary");
        assert!(set.slots().iter().all(|slot| slot.text.is_none()));
    }

    #[test]
    fn test_only_short_text_is_stored() {
        let mut set = ComplicationSet::new();
        assert!(!set.on_data_update(0, ComplicationData::of_kind(ComplicationKind::Icon)));
        assert!(set.slot(SlotId::PRIMARY).text.is_none());
        assert!(set.on_data_update(0, ComplicationData::short_text("72°")));
        assert_eq!(set.slot(SlotId::PRIMARY).text.as_deref(), Some("72°"));
        assert!(!set.on_data_update(0, ComplicationData::short_text("72°")));
    }

    #[test]
    fn test_unknown_slot_is_ignored() {
        let mut set = ComplicationSet::new();
        assert!(!set.on_data_update(7, ComplicationData::short_text("x")));
        assert!(set.slots().iter().all(|slot| slot.text.is_none()));
    }

    #[test]
    fn test_layout_places_slots_diagonally() {
        let mut set = ComplicationSet::new();
        set.layout(200.0, 200.0);
        let primary = set.slot(SlotId::PRIMARY).region;
        let secondary = set.slot(SlotId::SECONDARY).region;
        assert!((primary.width() - 80.0).abs() < 1e-3);
        assert!(primary.center_x() < 200.0 && primary.center_y() > 200.0);
        assert!(secondary.center_x() > 200.0 && secondary.center_y() < 200.0);
        assert!((primary.center_x() - 200.0 * (1.0 - 0.2828427)).abs() < 1e-2);
    }

    #[test]
    fn test_draw_skips_slots_without_text() {
        let mut set = ComplicationSet::new();
        set.layout(100.0, 100.0);
        set.on_data_update(1, ComplicationData::short_text("5k"));
        let mut canvas = RecordingCanvas::new();
        let text_paint = Paint::fill(Color::WHITE).with_text_size(10.0);
        assert_eq!(set.draw(&mut canvas, &Paint::fill(Color(0xFFC53C91)), &text_paint), 1);
        assert_eq!(canvas.count(|c| matches!(c, DrawCommand::Oval { .. })), 1);
        assert_eq!(canvas.texts().len(), 1);
        assert_eq!(canvas.texts()[0].0, "5k");
    }
}
