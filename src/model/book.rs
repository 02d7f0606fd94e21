use chrono::{DateTime, Utc};

/// Book-level metadata supplied by the summary file.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub updated: DateTime<Utc>,
    /// Unique package identifier (`dc:identifier`).
    pub package_id: String,
    /// Ordered rows of the cover page table: label and cell values.
    pub info_table: Vec<(String, Vec<String>)>,
    /// Chapter grouping, sorted by first section ordinal.
    pub outline: Vec<ChapterMark>,
}

/// A chapter heading starting at a given section ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMark {
    pub title: String,
    pub begin: u32,
}

impl ChapterMark {
    pub fn new(title: impl Into<String>, begin: u32) -> Self {
        Self {
            title: title.into(),
            begin,
        }
    }
}

/// An entry of the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Path relative to the package descriptor.
    pub href: String,
    pub media_type: String,
    /// Optional `properties` attribute (e.g. `nav`).
    pub properties: Option<&'static str>,
}

impl ManifestItem {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: &'static str) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// A node of the navigation outline (hierarchical).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    pub text: String,
    pub href: Option<String>,
    /// `Some` for chapter groups, even while empty.
    pub children: Option<Vec<OutlineItem>>,
}

impl OutlineItem {
    /// A leaf entry linking to a page.
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
            children: None,
        }
    }

    /// A chapter group without a link target of its own.
    pub fn group(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
            children: Some(Vec::new()),
        }
    }
}
