use bytes::Bytes;

use crate::ast::SlotId;
use crate::error::{MatchError, Result};

/// Where a capturing group started and what it finally matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSlot {
    pub start: Option<usize>,
    pub text: Option<Bytes>,
}

/// Arena of capture slots owned by one match invocation.
///
/// Nodes address slots by `SlotId`; an id outside the arena is reported as an
/// expired slot instead of being dereferenced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    slots: Vec<CaptureSlot>,
}

impl Captures {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![CaptureSlot::default(); len],
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, id: SlotId) -> Result<&CaptureSlot> {
        self.slots.get(id.0).ok_or(MatchError::ExpiredSlot {
            slot: id,
            len: self.len(),
        })
    }

    fn slot_mut(&mut self, id: SlotId) -> Result<&mut CaptureSlot> {
        let len = self.len();
        self.slots
            .get_mut(id.0)
            .ok_or(MatchError::ExpiredSlot { slot: id, len })
    }

    pub fn set_start(&mut self, id: SlotId, pos: usize) -> Result<()> {
        self.slot_mut(id)?.start = Some(pos);
        Ok(())
    }

    /// Record `input[start..end]` using the start saved by `set_start`.
    pub fn close(&mut self, id: SlotId, input: &Bytes, end: usize) -> Result<()> {
        let slot = self.slot_mut(id)?;
        let start = slot.start.ok_or(MatchError::UnsetCapture(id))?;
        // The legacy class scan can move the cursor backwards.
        let start = start.min(end);
        slot.text = Some(input.slice(start..end));
        Ok(())
    }

    /// Record a capture whose bounds are already known.
    pub fn record(&mut self, id: SlotId, input: &Bytes, start: usize, end: usize) -> Result<()> {
        let slot = self.slot_mut(id)?;
        slot.start = Some(start);
        slot.text = Some(input.slice(start..end));
        Ok(())
    }

    /// Text captured by slot `id`; an unpopulated slot is an internal error.
    pub fn text(&self, id: SlotId) -> Result<&Bytes> {
        self.slot(id)?.text.as_ref().ok_or(MatchError::UnsetCapture(id))
    }

    pub fn get(&self, id: SlotId) -> Option<&CaptureSlot> {
        self.slots.get(id.0)
    }
}
