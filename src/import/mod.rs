//! Novel folder loading.
//!
//! A novel folder holds a `summary.json`, one text file per section named
//! `<code>-<n>.txt`, and an optional `img/` directory with illustrations.
//! [`NovelFolder`] reads the summary and lists the section files up front;
//! section text is only read when the iterator returned by
//! [`Loader::sections`] is advanced.

mod chapters;
mod summary;

pub use chapters::{ChapterFile, ChapterSource, chapter_ordinal, list_chapter_files};
pub use summary::{SUMMARY_FILE_NAME, Summary, load_summary, parse_summary, parse_timestamp};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::model::{BookInfo, Section};
use crate::parse::{ImageDirectory, ParagraphBuilder};

/// Name of the illustration directory inside a novel folder.
pub const IMAGE_DIR_NAME: &str = "img";

/// Source of book metadata and a lazy stream of sections.
pub trait Loader {
    /// Book metadata.
    fn info(&self) -> &BookInfo;

    /// Sections in reading order. Each item is read and parsed on demand.
    fn sections(&self) -> Box<dyn Iterator<Item = Result<Section>> + '_>;
}

/// A novel folder on disk.
#[derive(Debug, Clone)]
pub struct NovelFolder {
    root: PathBuf,
    summary: Summary,
    files: Vec<ChapterFile>,
    images: ImageDirectory,
}

impl NovelFolder {
    /// Read the summary, list the section files and snapshot `img/`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let summary = load_summary(&root)?;
        let files = list_chapter_files(&root, &summary.file_code)?;
        let images = ImageDirectory::open(root.join(IMAGE_DIR_NAME))?;
        debug!(
            folder = %root.display(),
            sections = files.len(),
            chapters = summary.info.outline.len(),
            "opened novel folder"
        );
        Ok(Self {
            root,
            summary,
            files,
            images,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_code(&self) -> &str {
        &self.summary.file_code
    }

    pub fn images(&self) -> &ImageDirectory {
        &self.images
    }

    pub fn chapters(&self) -> ChapterSource<'_> {
        ChapterSource::new(self.files.clone(), ParagraphBuilder::new(&self.images))
    }
}

impl Loader for NovelFolder {
    fn info(&self) -> &BookInfo {
        &self.summary.info
    }

    fn sections(&self) -> Box<dyn Iterator<Item = Result<Section>> + '_> {
        Box::new(self.chapters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    fn write_summary(dir: &Path) {
        fs::write(
            dir.join(SUMMARY_FILE_NAME),
            r#"{
                "共通ファイル名": "n9",
                "タイトル": "題",
                "作者名": "著",
                "あらすじ": [],
                "キーワード": [],
                "掲載日": "",
                "更新": "2024-01-01T00:00:00Z",
                "URL": "https://example.com/n9/",
                "chapters": []
            }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_open_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_summary(dir.path());
        fs::write(dir.path().join("n9-2.txt"), "二\n\n本文二").unwrap();
        fs::write(dir.path().join("n9-1.txt"), "一\n\n本文一").unwrap();

        let folder = NovelFolder::open(dir.path()).unwrap();
        assert_eq!(folder.info().title, "題");
        assert_eq!(folder.file_code(), "n9");
        assert!(folder.images().candidates("1", "1").is_empty());

        let titles: Vec<_> = folder
            .sections()
            .map(|s| s.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["一", "二"]);
    }

    #[test]
    fn test_open_folder_without_chapters() {
        let dir = tempfile::tempdir().unwrap();
        write_summary(dir.path());
        assert!(matches!(
            NovelFolder::open(dir.path()),
            Err(Error::NoChapters { .. })
        ));
    }
}
