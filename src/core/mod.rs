//! # Core Data Model
//!
//! The sticker working set: [`segment::Segment`] values and the
//! [`store::SegmentStore`] that owns and serializes their mutation.

pub mod segment;
pub mod store;

pub use segment::{default_label, Segment};
pub use store::{MutationTicket, SegmentStore};
