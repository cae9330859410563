//! # Segment Store
//!
//! The ordered working set of stickers and the only place they are mutated.
//!
//! ## Mutation Discipline
//!
//! ```text
//!   begin(id) ──▶ MutationTicket ──▶ (await slicer/adjuster/backend) ──▶ commit | abort
//!      │                                                                   │
//!      └─ ConcurrentMutation if id already in flight    stale ticket ◀─────┘ dropped
//! ```
//!
//! - At most one mutation per segment id is in flight at a time
//! - A picture swap replaces the whole [`StickerImage`] under the lock
//! - Every batch install or reset bumps the generation; tickets and label
//!   passes from an older generation write nothing
//! - The source sheet is installed together with its stickers, so the sheet,
//!   the stickers and the generation always belong to the same batch
//!
//! The store is a cheap cloneable handle. The internal lock is never held
//! across an `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::core::segment::Segment;
use crate::error::{StickerError, StickerResult};
use crate::payload::StickerImage;

/// Proof that the holder owns the single in-flight mutation of one segment.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be committed or aborted"]
pub struct MutationTicket {
    generation: u64,
    id: u32,
}

impl MutationTicket {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    generation: u64,
    source: Option<StickerImage>,
    segments: Vec<Segment>,
    in_flight: HashSet<u32>,
}

impl StoreInner {
    fn position(&self, id: u32) -> Option<usize> {
        self.segments.binary_search_by_key(&id, Segment::id).ok()
    }
}

/// Shared, ordered collection of segments.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the working set with a freshly sliced batch and the sheet it
    /// was cut from.
    ///
    /// The batch is sorted by id and every picture is marked stable. Returns
    /// the new generation.
    pub fn install(&self, source: StickerImage, mut segments: Vec<Segment>) -> u64 {
        segments.sort_by_key(Segment::id);
        for segment in &mut segments {
            segment.set_processing(false);
        }
        let mut inner = self.lock();
        inner.generation += 1;
        inner.source = Some(source);
        inner.segments = segments;
        inner.in_flight.clear();
        debug!(
            "installed {} segments (generation {})",
            inner.segments.len(),
            inner.generation
        );
        inner.generation
    }

    /// Discard the whole working set. Outstanding tickets become stale.
    pub fn reset(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.source = None;
        inner.segments.clear();
        inner.in_flight.clear();
        inner.generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// The sheet the current batch was cut from.
    pub fn source(&self) -> Option<StickerImage> {
        self.lock().source.clone()
    }

    /// Current generation and its sheet, read under one lock. Pass the
    /// generation back to [`apply_labels`](Self::apply_labels).
    pub fn labelling_target(&self) -> Option<(u64, StickerImage)> {
        let inner = self.lock();
        inner
            .source
            .clone()
            .map(|source| (inner.generation, source))
    }

    pub fn len(&self) -> usize {
        self.lock().segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().segments.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<Segment> {
        let inner = self.lock();
        inner.position(id).map(|i| inner.segments[i].clone())
    }

    /// Copy of all segments, ascending by id.
    pub fn snapshot(&self) -> Vec<Segment> {
        self.lock().segments.clone()
    }

    /// Claim the single mutation slot of segment `id` and flag it processing.
    ///
    /// # Errors
    ///
    /// - `Validation` if no such segment exists
    /// - `ConcurrentMutation` if another mutation of `id` is in flight
    pub fn begin(&self, id: u32) -> StickerResult<MutationTicket> {
        let mut inner = self.lock();
        let pos = inner
            .position(id)
            .ok_or_else(|| StickerError::validation("segment_id", "must name an existing sticker", id.to_string()))?;
        if !inner.in_flight.insert(id) {
            return Err(StickerError::concurrent_mutation(id)
                .with_recovery_suggestion("Wait for the current update of this sticker to finish"));
        }
        inner.segments[pos].set_processing(true);
        Ok(MutationTicket {
            generation: inner.generation,
            id,
        })
    }

    /// Swap in a new picture and release the slot.
    ///
    /// Returns `false` and drops `image` if the working set was replaced or
    /// reset since the ticket was issued.
    pub fn commit(&self, ticket: MutationTicket, image: StickerImage) -> bool {
        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            warn!(
                "discarding result for sticker {} from stale generation {}",
                ticket.id, ticket.generation
            );
            return false;
        }
        inner.in_flight.remove(&ticket.id);
        match inner.position(ticket.id) {
            Some(pos) => {
                inner.segments[pos].replace_image(image);
                true
            }
            None => false,
        }
    }

    /// Release the slot without touching the picture.
    pub fn abort(&self, ticket: MutationTicket) {
        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            return;
        }
        inner.in_flight.remove(&ticket.id);
        if let Some(pos) = inner.position(ticket.id) {
            inner.segments[pos].set_processing(false);
        }
    }

    /// Write enrichment labels in reading order.
    ///
    /// Blank labels keep the current one; extra labels are ignored. Nothing is
    /// written if `generation` is no longer current. Returns how many labels
    /// were applied.
    pub fn apply_labels(&self, generation: u64, labels: &[String]) -> usize {
        let mut inner = self.lock();
        if inner.generation != generation {
            warn!(
                "discarding {} labels from stale generation {}",
                labels.len(),
                generation
            );
            return 0;
        }
        let mut applied = 0;
        for (segment, label) in inner.segments.iter_mut().zip(labels) {
            let label = label.trim();
            if !label.is_empty() {
                segment.set_label(label);
                applied += 1;
            }
        }
        applied
    }

    /// Set a user-chosen label.
    pub fn rename(&self, id: u32, label: &str) -> StickerResult<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(StickerError::validation("label", "must not be blank", label));
        }
        let mut inner = self.lock();
        let pos = inner
            .position(id)
            .ok_or_else(|| StickerError::validation("segment_id", "must name an existing sticker", id.to_string()))?;
        inner.segments[pos].set_label(label);
        Ok(())
    }
}
