//! # Sticker Session
//!
//! High-level orchestration of one sticker sheet: slicing, label enrichment,
//! per-sticker resizing and regeneration, and export. A session owns its
//! configuration, its backend and its [`SegmentStore`]; nothing is global.
//!
//! ## Lifecycle
//!
//! ```text
//!   load_sheet / generate_sheet ──▶ store.install ──▶ enrich_labels (optional)
//!                                        │
//!                   adjust_resolution / regenerate / rename (any order)
//!                                        │
//!                              export_to_dir | reset
//! ```
//!
//! Mutations of one sticker go through a store ticket so a second request on
//! the same sticker is rejected while the first runs, and results that land
//! after a reset or a new sheet are dropped.

// Standard library imports
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External crate imports
use log::{info, warn};

// Internal module imports
use crate::config::StickerConfig;
use crate::core::segment::{default_label, Segment};
use crate::core::store::{MutationTicket, SegmentStore};
use crate::error::{StickerError, StickerResult};
use crate::payload::StickerImage;
use crate::processing::resolution::ResolutionAdjuster;
use crate::processing::slicer::slice_sheet;
use crate::remote::{HttpBackend, StickerBackend};

/// One working sheet and its stickers.
pub struct StickerSession {
    config: StickerConfig,
    backend: Arc<dyn StickerBackend>,
    store: SegmentStore,
}

impl StickerSession {
    /// Create a new session using the builder pattern.
    pub fn builder() -> StickerSessionBuilder {
        StickerSessionBuilder::new()
    }

    pub fn config(&self) -> &StickerConfig {
        &self.config
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// All stickers, ascending by id.
    pub fn segments(&self) -> Vec<Segment> {
        self.store.snapshot()
    }

    pub fn segment(&self, id: u32) -> Option<Segment> {
        self.store.get(id)
    }

    /// The sheet the current stickers were cut from.
    pub fn source(&self) -> Option<StickerImage> {
        self.store.source()
    }

    /// Slice `bytes` with the configured grid and make the result the
    /// working set.
    ///
    /// On failure the previous working set is left as it was.
    pub async fn load_sheet(&self, bytes: Vec<u8>) -> StickerResult<Vec<Segment>> {
        let (sheet, segments) =
            slice_sheet(bytes, self.config.grid_shape(), self.config.output_format).await?;
        info!(
            "loaded {}x{} sheet ({} stickers)",
            sheet.width(),
            sheet.height(),
            segments.len()
        );
        self.store.install(sheet, segments);
        Ok(self.store.snapshot())
    }

    /// Ask the backend for a new sheet and load it.
    pub async fn generate_sheet(
        &self,
        prompt: &str,
        references: &[Vec<u8>],
    ) -> StickerResult<Vec<Segment>> {
        if prompt.trim().is_empty() {
            return Err(StickerError::validation("prompt", "must not be blank", prompt));
        }
        let references = references
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                StickerImage::from_bytes(bytes.clone())
                    .map_err(|e| e.with_context(format!("reading reference image {}", i + 1)))
            })
            .collect::<StickerResult<Vec<_>>>()?;
        let sheet = self
            .backend
            .generate_sheet(prompt, &references)
            .await
            .map_err(|e| e.with_operation("generate sheet"))?;
        self.load_sheet(sheet).await
    }

    /// Replace default labels with backend suggestions.
    ///
    /// Returns how many labels were applied; zero if the sheet was replaced
    /// or reset while the backend was working.
    pub async fn enrich_labels(&self) -> StickerResult<usize> {
        let (generation, sheet) = self.store.labelling_target().ok_or_else(|| {
            StickerError::validation("sheet", "a sheet must be loaded first", "none")
        })?;
        let labels = self
            .backend
            .label_sheet(&sheet)
            .await
            .map_err(|e| e.with_operation("label sheet"))?;
        let applied = self.store.apply_labels(generation, &labels);
        info!("applied {} of {} suggested labels", applied, labels.len());
        Ok(applied)
    }

    /// Resize sticker `id` to `target_size`×`target_size`.
    ///
    /// # Errors
    ///
    /// - `ConcurrentMutation` if the sticker is already being changed
    /// - whatever the adjuster reports; the sticker keeps its old picture
    pub async fn adjust_resolution(&self, id: u32, target_size: u32) -> StickerResult<Segment> {
        let ticket = self.store.begin(id)?;
        let Some(segment) = self.store.get(id) else {
            self.store.abort(ticket);
            return Err(missing_segment(id));
        };
        let adjuster = ResolutionAdjuster::new(
            self.backend.as_ref(),
            self.config.square_fit.to_square_fit(),
            self.config.output_format,
        );
        match adjuster.adjust_resolution(&segment, target_size).await {
            Ok(updated) => self.finish(ticket, updated.image().clone()),
            Err(e) => {
                self.store.abort(ticket);
                Err(e)
            }
        }
    }

    /// Redraw sticker `id` following `instruction`.
    pub async fn regenerate(&self, id: u32, instruction: &str) -> StickerResult<Segment> {
        if instruction.trim().is_empty() {
            return Err(StickerError::validation("instruction", "must not be blank", instruction));
        }
        let ticket = self.store.begin(id)?;
        let Some(segment) = self.store.get(id) else {
            self.store.abort(ticket);
            return Err(missing_segment(id));
        };
        let result = match self
            .backend
            .regenerate_sticker(segment.image(), instruction)
            .await
        {
            Ok(bytes) => StickerImage::from_bytes(bytes)
                .map_err(|e| e.with_context("reading regenerated sticker")),
            Err(e) => Err(e.with_operation(format!("regenerate sticker {}", id))),
        };
        match result {
            Ok(image) => self.finish(ticket, image),
            Err(e) => {
                self.store.abort(ticket);
                Err(e)
            }
        }
    }

    fn finish(&self, ticket: MutationTicket, image: StickerImage) -> StickerResult<Segment> {
        let id = ticket.id();
        if !self.store.commit(ticket, image) {
            return Err(StickerError::validation(
                "segment_id",
                "sticker was discarded while it was being updated",
                id.to_string(),
            ));
        }
        self.store.get(id).ok_or_else(|| missing_segment(id))
    }

    pub fn rename(&self, id: u32, label: &str) -> StickerResult<()> {
        self.store.rename(id, label)
    }

    /// Drop the sheet and every sticker. In-flight results are discarded
    /// when they arrive.
    pub fn reset(&self) {
        let generation = self.store.reset();
        info!("session reset (generation {})", generation);
    }

    /// Write every sticker to `dir` as `NN_<label>.<ext>`.
    pub async fn export_to_dir(&self, dir: impl AsRef<Path>) -> StickerResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StickerError::io("create export directory", e).with_path(dir.display().to_string()))?;

        let segments = self.store.snapshot();
        if segments.is_empty() {
            warn!("nothing to export");
        }
        let mut written = Vec::with_capacity(segments.len());
        for segment in segments {
            let path = dir.join(export_file_name(&segment));
            tokio::fs::write(&path, segment.image().bytes())
                .await
                .map_err(|e| StickerError::io("write sticker", e).with_path(path.display().to_string()))?;
            written.push(path);
        }
        info!("exported {} stickers to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn missing_segment(id: u32) -> StickerError {
    StickerError::validation("segment_id", "must name an existing sticker", id.to_string())
}

/// `NN_<label>.<ext>` with a filesystem-safe label.
pub(crate) fn export_file_name(segment: &Segment) -> String {
    let mut label = sanitize_label(segment.label());
    if label.is_empty() {
        label = default_label(segment.id());
    }
    format!("{:02}_{}.{}", segment.id() + 1, label, segment.image().extension())
}

fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else if c.is_whitespace() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Builder for sticker sessions.
pub struct StickerSessionBuilder {
    config: StickerConfig,
    backend: Option<Arc<dyn StickerBackend>>,
}

impl Default for StickerSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StickerSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: StickerConfig::default(),
            backend: None,
        }
    }

    pub fn with_config(mut self, config: StickerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_backend<B: StickerBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn with_shared_backend(mut self, backend: Arc<dyn StickerBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Validate the configuration and build the session. Without an explicit
    /// backend an [`HttpBackend`] for `config.backend` is used.
    pub fn build(self) -> StickerResult<StickerSession> {
        self.config
            .validate()
            .map_err(|reason| StickerError::config("config", "session", reason))?;
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpBackend::new(&self.config.backend)?),
        };
        Ok(StickerSession {
            config: self.config,
            backend,
            store: SegmentStore::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_made_filesystem_safe() {
        assert_eq!(sanitize_label("Happy Cat!"), "Happy_Cat");
        assert_eq!(sanitize_label("  ../etc/passwd "), "etcpasswd");
        assert_eq!(sanitize_label("thumbs  up"), "thumbs_up");
        assert_eq!(sanitize_label("???"), "");
    }

    #[test]
    fn invalid_config_is_rejected_at_build() {
        let mut config = StickerConfig::default();
        config.rows = 0;
        let err = StickerSession::builder().with_config(config).build().err().unwrap();
        assert_eq!(err.category(), "config");
    }
}
