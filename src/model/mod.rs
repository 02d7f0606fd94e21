//! Core data model shared by parsing and packaging.
//!
//! This module contains:
//! - The parsed chapter tree ([`Section`], [`Paragraph`], [`Inline`])
//! - Book metadata from the summary file ([`BookInfo`], [`ChapterMark`])
//! - Package bookkeeping types ([`ManifestItem`], [`OutlineItem`])
//!
//! Everything here is plain data; values are built once and read afterwards.

mod book;
mod document;

pub use book::{BookInfo, ChapterMark, ManifestItem, OutlineItem};
pub use document::{Comment, ImageRef, Inline, Paragraph, RubyAnnotation, Section};
