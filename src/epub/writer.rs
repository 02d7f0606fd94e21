use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::assembler::{
    Assembler, COVER_HREF, IMAGE_DIR, ImageRegistry, Manifest, NAV_HREF, PackageFields,
    STYLESHEET_HREF, container_path,
};
use super::outline::OutlineBuilder;
use crate::error::Result;
use crate::model::{BookInfo, Section};

/// Folder holding the package descriptor and content documents.
pub const PACKAGE_DIR: &str = "EPUB";
pub const PACKAGE_FILE: &str = "book.opf";

const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/book.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Stylesheet used when [`EpubConfig::stylesheet`] is not overridden.
pub const DEFAULT_STYLESHEET: &str = r#"@charset "UTF-8";

html {
  -epub-writing-mode: horizontal-tb;
  writing-mode: horizontal-tb;
}

body {
  line-height: 1.8;
  margin: 0 1em;
}

.heading.title {
  font-size: 1.6em;
  text-align: center;
}

.heading.chapter {
  font-size: 1.4em;
}

.heading.section {
  font-size: 1.2em;
}

table.informations th {
  text-align: left;
  vertical-align: top;
  white-space: nowrap;
  padding-right: 1em;
}

header, footer {
  font-size: 0.9em;
}

rt {
  font-size: 0.5em;
}

img {
  max-width: 100%;
  height: auto;
}
"#;

/// Configuration for EPUB packaging.
#[derive(Debug, Clone)]
pub struct EpubConfig {
    /// Deflate level for every entry except `mimetype` (0-9, default 9).
    pub compression_level: i64,
    /// Value of `dc:language` and the pages' `lang` (default `ja`).
    pub language: String,
    /// Contents of `css/default.css`.
    pub stylesheet: String,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            compression_level: 9,
            language: "ja".to_string(),
            stylesheet: DEFAULT_STYLESHEET.to_string(),
        }
    }
}

impl EpubConfig {
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_stylesheet(mut self, stylesheet: impl Into<String>) -> Self {
        self.stylesheet = stylesheet.into();
        self
    }
}

/// Counts reported after a book has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageSummary {
    pub sections: usize,
    pub images: usize,
}

/// Streams sections into an EPUB container.
///
/// Fixed entries are written on construction, each section as it is added,
/// and the navigation document and package descriptor on [`finish`].
///
/// [`finish`]: PackageWriter::finish
pub struct PackageWriter<'a, W: Write + Seek> {
    zip: ZipWriter<W>,
    deflated: SimpleFileOptions,
    info: &'a BookInfo,
    assembler: Assembler,
    manifest: Manifest,
    images: ImageRegistry,
    outline: OutlineBuilder,
}

impl<'a, W: Write + Seek> PackageWriter<'a, W> {
    pub fn new(writer: W, info: &'a BookInfo, config: &EpubConfig) -> Result<Self> {
        let mut zip = ZipWriter::new(writer);

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(config.compression_level));

        // mimetype must be first and uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        zip.start_file(container_path(PACKAGE_DIR, STYLESHEET_HREF), deflated)?;
        zip.write_all(config.stylesheet.as_bytes())?;

        let assembler = Assembler::new(config.language.as_str());
        let cover = assembler.render_cover(&info.title, &info.info_table)?;
        zip.start_file(container_path(PACKAGE_DIR, COVER_HREF), deflated)?;
        zip.write_all(&cover)?;

        Ok(Self {
            zip,
            deflated,
            info,
            assembler,
            manifest: Manifest::new(),
            images: ImageRegistry::new(),
            outline: OutlineBuilder::new(info.outline.clone()),
        })
    }

    /// Render and store one section, plus any images it introduces.
    pub fn add_section(&mut self, section: &Section) -> Result<()> {
        let chapter = self.outline.begin_section(section.index);
        let page = self
            .assembler
            .render_section(chapter.as_deref(), section, &mut self.images)?;
        debug!(
            ordinal = section.index,
            title = %section.title,
            chapter = chapter.as_deref().unwrap_or(""),
            paragraphs = section.paragraphs().count(),
            images = page.images.len(),
            "section rendered"
        );

        self.zip
            .start_file(container_path(PACKAGE_DIR, &page.file_name), self.deflated)?;
        self.zip.write_all(&page.document)?;

        for asset in page.images {
            if self.manifest.images().is_empty() {
                self.zip
                    .add_directory(format!("{PACKAGE_DIR}/{IMAGE_DIR}/"), self.deflated)?;
            }
            self.zip
                .start_file(container_path(PACKAGE_DIR, &asset.item.href), self.deflated)?;
            self.zip.write_all(&asset.data)?;
            self.manifest.push_image(asset.item);
        }

        self.outline.push_section(page.title, page.page.href.clone());
        self.manifest.push_page(page.page);
        Ok(())
    }

    /// Write the navigation document and package descriptor and close the
    /// archive.
    pub fn finish(mut self) -> Result<(W, PackageSummary)> {
        let summary = PackageSummary {
            sections: self.manifest.pages().len(),
            images: self.manifest.images().len(),
        };

        let nav = self.assembler.render_nav(self.outline.items())?;
        self.zip
            .start_file(container_path(PACKAGE_DIR, NAV_HREF), self.deflated)?;
        self.zip.write_all(&nav)?;

        let fields = PackageFields {
            id: &self.info.package_id,
            title: &self.info.title,
            author: &self.info.author,
            updated: self.info.updated,
        };
        let opf = self.assembler.render_package(&fields, &self.manifest)?;
        self.zip
            .start_file(format!("{PACKAGE_DIR}/{PACKAGE_FILE}"), self.deflated)?;
        self.zip.write_all(&opf)?;

        let writer = self.zip.finish()?;
        Ok((writer, summary))
    }
}

/// Write a whole book from a stream of sections.
///
/// Sections are pulled one at a time; the first error stops the run.
pub fn write_book<W, I>(
    info: &BookInfo,
    sections: I,
    writer: W,
    config: &EpubConfig,
) -> Result<(W, PackageSummary)>
where
    W: Write + Seek,
    I: IntoIterator<Item = Result<Section>>,
{
    let mut package = PackageWriter::new(writer, info, config)?;
    for section in sections {
        package.add_section(&section?)?;
    }
    package.finish()
}

/// Output file name: `[<author>]<title>.epub`.
///
/// Path separators are replaced so the name stays inside the output folder.
pub fn output_file_name(info: &BookInfo) -> String {
    format!("[{}]{}.epub", info.author, info.title).replace(['/', '\\'], "_")
}

/// Write a book into `out_dir` under [`output_file_name`].
///
/// The archive is assembled in a temporary file next to the destination and
/// only renamed into place once it is complete.
pub fn write_book_to_dir<I>(
    info: &BookInfo,
    sections: I,
    out_dir: &Path,
    config: &EpubConfig,
) -> Result<(PathBuf, PackageSummary)>
where
    I: IntoIterator<Item = Result<Section>>,
{
    let mut tmp = tempfile::Builder::new()
        .prefix(".txt2epub-")
        .suffix(".part")
        .tempfile_in(out_dir)?;
    let (_, summary) = write_book(info, sections, tmp.as_file_mut(), config)?;

    let path = out_dir.join(output_file_name(info));
    tmp.persist(&path).map_err(|e| e.error)?;
    info!(
        path = %path.display(),
        sections = summary.sections,
        images = summary.images,
        "book written"
    );
    Ok((path, summary))
}
