//! # txt2epub
//!
//! Converts a folder of serialized web-novel text files into an EPUB 3 book.
//!
//! A novel folder contains a `summary.json` with the book's metadata and
//! chapter layout, one plain-text file per section (`<code>-<n>.txt`), and an
//! optional `img/` directory. Section text may carry ruby annotations
//! (`漢字《かんじ》`, `|base《reading》`) and image placeholders (`<i123|456>`).
//!
//! ## Quick Start
//!
//! ```no_run
//! use txt2epub::{EpubConfig, convert_folder};
//!
//! let (path, summary) =
//!     convert_folder("novels/n0001aa", "out", &EpubConfig::default()).unwrap();
//! println!("{} sections -> {}", summary.sections, path.display());
//! ```
//!
//! ## Lower-level pieces
//!
//! - [`parse`] turns section text into [`Section`]s.
//! - [`epub`] renders pages and streams them into a zip container.
//! - [`import`] reads the summary and lists section files lazily.

pub mod epub;
pub mod error;
pub mod import;
pub mod model;
pub mod parse;
pub mod util;
pub mod xml;

pub use epub::{EpubConfig, PackageSummary, output_file_name, write_book, write_book_to_dir};
pub use error::{Error, Result};
pub use import::{Loader, NovelFolder};
pub use model::{BookInfo, ChapterMark, Inline, Paragraph, Section};

use std::path::{Path, PathBuf};

/// Convert the novel folder at `input` into an EPUB inside `output_dir`.
///
/// Returns the path of the written book.
pub fn convert_folder(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &EpubConfig,
) -> Result<(PathBuf, PackageSummary)> {
    let folder = NovelFolder::open(input.as_ref())?;
    convert(&folder, output_dir.as_ref(), config)
}

/// Write the book produced by any [`Loader`] into `output_dir`.
pub fn convert<L: Loader + ?Sized>(
    loader: &L,
    output_dir: &Path,
    config: &EpubConfig,
) -> Result<(PathBuf, PackageSummary)> {
    write_book_to_dir(loader.info(), loader.sections(), output_dir, config)
}
