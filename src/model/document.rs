//! Parsed chapter structure handed from parsing to serialization.

use std::path::PathBuf;

/// One chapter file, split into its regions.
///
/// `foreword` is `Some` exactly when the header border was present and
/// `afterword` is `Some` exactly when the footer border was present, even if
/// the region holds no lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Ordinal declared by the chapter file name. Drives output file names and
    /// matching against the chapter outline.
    pub index: u32,
    pub title: String,
    pub foreword: Option<Vec<Paragraph>>,
    pub body: Vec<Paragraph>,
    pub afterword: Option<Vec<Paragraph>>,
}

impl Section {
    /// Iterate every paragraph in reading order (foreword, body, afterword).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.foreword
            .iter()
            .flatten()
            .chain(&self.body)
            .chain(self.afterword.iter().flatten())
    }
}

/// A single source line with annotations spliced in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub children: Vec<Inline>,
}

impl Paragraph {
    pub fn new(children: Vec<Inline>) -> Self {
        Self { children }
    }

    /// Reconstruct the source line this paragraph was parsed from.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_source_text(&mut out);
        }
        out
    }
}

/// A child of a [`Paragraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Literal text, stored unescaped. May be empty.
    Text(String),
    /// Author comment marker; rendered as nothing.
    Comment(Comment),
    Image(ImageRef),
    Ruby(RubyAnnotation),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Append the exact source characters this node was built from.
    pub fn push_source_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Comment(comment) => out.push(comment.marker),
            Inline::Image(image) => out.push_str(&image.alt),
            Inline::Ruby(ruby) => {
                if let Some(marker) = ruby.marker {
                    out.push(marker);
                }
                out.push_str(&ruby.base);
                out.push(ruby.open);
                out.push_str(&ruby.reading);
                out.push(ruby.close);
            }
        }
    }
}

/// The marker of a bracketed span with an empty base.
///
/// The bracketed text itself follows as a separate [`Inline::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    pub marker: char,
}

/// An inline image resolved against the image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub path: PathBuf,
    /// The original placeholder, e.g. `<i1|5>`.
    pub alt: String,
}

impl ImageRef {
    /// File name used inside the container's image folder.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A ruby (furigana) annotation.
///
/// The brackets are kept so readers without ruby support can fall back to
/// `base(reading)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyAnnotation {
    /// Explicit start marker (`|` or `｜`) when the base was delimited by one.
    pub marker: Option<char>,
    pub base: String,
    pub open: char,
    pub reading: String,
    pub close: char,
}
