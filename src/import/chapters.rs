//! Chapter file discovery and lazy loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::vec;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Section;
use crate::parse::{ParagraphBuilder, parse_section};
use crate::util::decode_utf8;

/// A chapter file and the ordinal taken from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub ordinal: u32,
    pub path: PathBuf,
}

/// Ordinal of a file named `<code>-<digits>.txt` (case-insensitive prefix
/// match; trailing text after `.txt` is accepted).
pub fn chapter_ordinal(file_name: &str, file_code: &str) -> Option<u32> {
    let lower = file_name.to_lowercase();
    let rest = lower.strip_prefix(&format!("{}-", file_code.to_lowercase()))?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !rest[digits..].starts_with(".txt") {
        return None;
    }
    rest[..digits].parse().ok()
}

/// Every chapter file in `dir`, sorted by ordinal.
pub fn list_chapter_files(dir: &Path, file_code: &str) -> Result<Vec<ChapterFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(ordinal) = chapter_ordinal(&name.to_string_lossy(), file_code) {
            files.push(ChapterFile {
                ordinal,
                path: entry.path(),
            });
        }
    }

    if files.is_empty() {
        return Err(Error::NoChapters {
            dir: dir.to_path_buf(),
            pattern: format!("{file_code}-<n>.txt"),
        });
    }
    files.sort_by_key(|f| f.ordinal);
    Ok(files)
}

/// Reads and parses one chapter file per iteration.
#[derive(Debug)]
pub struct ChapterSource<'a> {
    files: vec::IntoIter<ChapterFile>,
    builder: ParagraphBuilder<'a>,
}

impl<'a> ChapterSource<'a> {
    pub fn new(files: Vec<ChapterFile>, builder: ParagraphBuilder<'a>) -> Self {
        Self {
            files: files.into_iter(),
            builder,
        }
    }
}

impl Iterator for ChapterSource<'_> {
    type Item = Result<Section>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.files.next()?;
        Some(read_chapter(&file, &self.builder))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

fn read_chapter(file: &ChapterFile, builder: &ParagraphBuilder<'_>) -> Result<Section> {
    let bytes = fs::read(&file.path)?;
    let text = decode_utf8(&bytes, &file.path);
    debug!(ordinal = file.ordinal, file = %file.path.display(), "parsing chapter");
    Ok(parse_section(file.ordinal, &text, builder))
}
