//! License text recognition.
//!
//! - [`normalize`] — splits text into comparable words, dropping copyright lines.
//! - [`corpus`] — the immutable set of reference license texts.
//! - [`classifier`] — aligns a text against the corpus and reports [`Coverage`](crate::models::Coverage).

pub mod classifier;
pub mod corpus;
pub mod normalize;
