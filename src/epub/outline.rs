//! Incremental navigation outline.
//!
//! Sections arrive in ordinal order. When a section's ordinal equals the
//! `begin` of the next pending chapter mark, a new top-level chapter group is
//! opened and every following section is nested under it. Sections before the
//! first chapter mark sit at the top level.

use crate::model::{ChapterMark, OutlineItem};

#[derive(Debug, Clone, Default)]
pub struct OutlineBuilder {
    marks: Vec<ChapterMark>,
    next_mark: usize,
    items: Vec<OutlineItem>,
    in_chapter: bool,
}

impl OutlineBuilder {
    /// `marks` must be sorted by `begin`.
    pub fn new(marks: Vec<ChapterMark>) -> Self {
        Self {
            marks,
            ..Self::default()
        }
    }

    /// Start a section. Returns the chapter title if the section opens the
    /// next chapter.
    pub fn begin_section(&mut self, ordinal: u32) -> Option<String> {
        let mark = self.marks.get(self.next_mark)?;
        if mark.begin != ordinal {
            return None;
        }
        let title = mark.title.clone();
        self.items.push(OutlineItem::group(title.clone()));
        self.in_chapter = true;
        self.next_mark += 1;
        Some(title)
    }

    /// Add a section entry under the current chapter, or at the top level.
    pub fn push_section(&mut self, title: impl Into<String>, href: impl Into<String>) {
        let entry = OutlineItem::link(title, href);
        let current = self
            .items
            .last_mut()
            .filter(|_| self.in_chapter)
            .and_then(|chapter| chapter.children.as_mut());
        match current {
            Some(children) => children.push(entry),
            None => self.items.push(entry),
        }
    }

    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    pub fn finish(self) -> Vec<OutlineItem> {
        self.items
    }
}
