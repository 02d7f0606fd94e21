//! Chapter text parsing.
//!
//! [`scanner`] finds ruby and image annotations in a line,
//! [`ParagraphBuilder`] splices them into a [`Paragraph`](crate::model::Paragraph),
//! and [`parse_section`] splits a chapter file into its regions.

pub mod scanner;

mod paragraph;
mod section;

pub use paragraph::{ImageDirectory, ParagraphBuilder};
pub use section::{
    FOOTER_BORDER, HEADER_BORDER, SectionLines, parse_section, segment, split_lines,
};
