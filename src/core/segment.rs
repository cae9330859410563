//! # Segment
//!
//! One sticker cut from a sheet: a stable reading-order id, the current
//! picture, a label and a "picture not final yet" flag.

use crate::payload::StickerImage;

/// Placeholder label given to a freshly sliced sticker (`sticker_<id+1>`).
pub fn default_label(id: u32) -> String {
    format!("sticker_{}", u64::from(id) + 1)
}

/// One sticker of a sliced sheet.
///
/// The id is fixed at creation. The picture is only ever replaced as a whole
/// [`StickerImage`], so bytes and preview cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: u32,
    image: StickerImage,
    label: String,
    processing: bool,
}

impl Segment {
    /// New segment straight out of the slicer: default label, still processing.
    pub fn new(id: u32, image: StickerImage) -> Self {
        Self {
            id,
            image,
            label: default_label(id),
            processing: true,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn image(&self) -> &StickerImage {
        &self.image
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True while the picture is being produced or replaced.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Copy of this segment carrying `image`, with the processing flag cleared.
    /// Id and label are kept.
    pub(crate) fn with_image(&self, image: StickerImage) -> Self {
        Self {
            id: self.id,
            image,
            label: self.label.clone(),
            processing: false,
        }
    }

    pub(crate) fn replace_image(&mut self, image: StickerImage) {
        self.image = image;
        self.processing = false;
    }

    pub(crate) fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub(crate) fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }
}
