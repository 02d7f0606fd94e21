//! Turns a single line into a [`Paragraph`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::scanner::{AnnotationKind, ImageMatch, scan};
use crate::error::Result;
use crate::model::{Comment, ImageRef, Inline, Paragraph, RubyAnnotation};

/// Snapshot of the file names in the image folder.
///
/// The folder is listed once per run; placeholders are resolved against the
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct ImageDirectory {
    root: PathBuf,
    files: Vec<String>,
}

impl ImageDirectory {
    /// List the regular files in `root`. A missing folder behaves like an
    /// empty one.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %root.display(), "no image folder");
                return Ok(Self::from_names(root, Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(Self::from_names(root, files))
    }

    /// Build from an explicit list of file names.
    pub fn from_names(root: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file named `<user>_<id>.<ext>`, compared case-insensitively.
    pub fn candidates(&self, user: &str, id: &str) -> Vec<&str> {
        let prefix = format!("{user}_{id}.").to_lowercase();
        self.files
            .iter()
            .filter(|name| {
                name.to_lowercase()
                    .strip_prefix(&prefix)
                    .and_then(|ext| ext.chars().next())
                    .is_some_and(|c| c != '.')
            })
            .map(String::as_str)
            .collect()
    }

    /// The unique file for a placeholder, or the number of candidates found.
    pub fn resolve(&self, user: &str, id: &str) -> std::result::Result<PathBuf, usize> {
        match self.candidates(user, id).as_slice() {
            [name] => Ok(self.root.join(name)),
            others => Err(others.len()),
        }
    }
}

/// Splits a line into literal runs and annotation nodes.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphBuilder<'a> {
    images: &'a ImageDirectory,
}

impl<'a> ParagraphBuilder<'a> {
    pub fn new(images: &'a ImageDirectory) -> Self {
        Self { images }
    }

    /// Parse one line. Text runs are kept verbatim (unescaped); a run is
    /// emitted before every annotation and after the last one, even if empty.
    pub fn build(&self, line: &str) -> Paragraph {
        let mut children = Vec::new();
        let mut cursor = 0;

        for annotation in scan(line) {
            children.push(Inline::text(&line[cursor..annotation.offset]));
            let source = &line[annotation.offset..annotation.end()];

            match annotation.kind {
                AnnotationKind::Ruby(ruby) => match ruby.marker {
                    Some(marker) if ruby.base.is_empty() => {
                        children.push(Inline::Comment(Comment { marker }));
                        children.push(Inline::Text(format!(
                            "{}{}{}",
                            ruby.open, ruby.reading, ruby.close
                        )));
                    }
                    marker => children.push(Inline::Ruby(RubyAnnotation {
                        marker,
                        base: ruby.base.to_string(),
                        open: ruby.open,
                        reading: ruby.reading.to_string(),
                        close: ruby.close,
                    })),
                },
                AnnotationKind::Image(image) => children.push(self.image(image, source)),
            }

            cursor = annotation.end();
        }

        children.push(Inline::text(&line[cursor..]));
        Paragraph::new(children)
    }

    fn image(&self, image: ImageMatch<'_>, source: &str) -> Inline {
        match self.images.resolve(image.user, image.id) {
            Ok(path) => Inline::Image(ImageRef {
                path,
                alt: source.to_string(),
            }),
            Err(count) => {
                warn!(
                    placeholder = source,
                    matches = count,
                    dir = %self.images.root().display(),
                    "no unique image for placeholder; keeping it as text"
                );
                Inline::text(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn images(names: &[&str]) -> ImageDirectory {
        ImageDirectory::from_names(
            "/novel/img",
            names.iter().map(|n| n.to_string()).collect(),
        )
    }

    fn texts(p: &Paragraph) -> Vec<&str> {
        p.children
            .iter()
            .filter_map(|c| match c {
                Inline::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_line_is_single_run() {
        let dir = images(&[]);
        let p = ParagraphBuilder::new(&dir).build("ただの文章です。");
        assert_eq!(p.children, vec![Inline::text("ただの文章です。")]);
    }

    #[test]
    fn test_ruby_node() {
        let dir = images(&[]);
        let p = ParagraphBuilder::new(&dir).build("彼は東京《とうきょう》へ");
        assert_eq!(
            p.children,
            vec![
                Inline::text("彼は"),
                Inline::Ruby(RubyAnnotation {
                    marker: None,
                    base: "東京".to_string(),
                    open: '《',
                    reading: "とうきょう".to_string(),
                    close: '》',
                }),
                Inline::text("へ"),
            ]
        );
    }

    #[test]
    fn test_comment_keeps_bracketed_text() {
        let dir = images(&[]);
        let p = ParagraphBuilder::new(&dir).build("ええ｜《まあね》");
        assert_eq!(
            p.children,
            vec![
                Inline::text("ええ"),
                Inline::Comment(Comment { marker: '｜' }),
                Inline::text("《まあね》"),
                Inline::text(""),
            ]
        );
    }

    #[test]
    fn test_mismatched_brackets_stay_literal() {
        let dir = images(&[]);
        let line = "漢字《かんじ)です";
        let p = ParagraphBuilder::new(&dir).build(line);
        assert_eq!(p.children, vec![Inline::text(line)]);
    }

    #[test]
    fn test_image_resolves_unique_file() {
        let dir = images(&["i1_5.png", "i1_50.png", "other.txt"]);
        let p = ParagraphBuilder::new(&dir).build("<i1|5>");
        match &p.children[1] {
            Inline::Image(image) => {
                assert!(image.path.ends_with("i1_5.png"));
                assert_eq!(image.alt, "<i1|5>");
                assert_eq!(image.file_name(), "i1_5.png");
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_ruby_directly_after_image() {
        let dir = images(&["i1_5.png"]);
        let p = ParagraphBuilder::new(&dir).build("<i1|5>漢字《かんじ》");
        assert_eq!(
            p.children,
            vec![
                Inline::text(""),
                Inline::Image(ImageRef {
                    path: PathBuf::from("/novel/img/i1_5.png"),
                    alt: "<i1|5>".to_string(),
                }),
                Inline::text(""),
                Inline::Ruby(RubyAnnotation {
                    marker: None,
                    base: "漢字".to_string(),
                    open: '《',
                    reading: "かんじ".to_string(),
                    close: '》',
                }),
                Inline::text(""),
            ]
        );
    }

    #[test]
    fn test_image_match_is_case_insensitive() {
        let dir = images(&["I1_5.PNG"]);
        assert_eq!(dir.candidates("i1", "5"), vec!["I1_5.PNG"]);
    }

    #[test]
    fn test_image_without_match_stays_literal() {
        let dir = images(&["i2_5.png"]);
        let p = ParagraphBuilder::new(&dir).build("前<i1|5>後");
        assert_eq!(texts(&p).concat(), "前<i1|5>後");
        assert!(!p.children.iter().any(|c| matches!(c, Inline::Image(_))));
    }

    #[test]
    fn test_image_with_two_matches_stays_literal() {
        let dir = images(&["i1_5.png", "i1_5.jpg"]);
        let p = ParagraphBuilder::new(&dir).build("<i1|5>");
        assert_eq!(texts(&p).concat(), "<i1|5>");
    }

    #[test]
    fn test_extension_must_not_start_with_dot() {
        let dir = images(&["i1_5..png", "i1_5."]);
        assert!(dir.candidates("i1", "5").is_empty());
    }

    #[test]
    fn test_missing_image_folder_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ImageDirectory::open(tmp.path().join("img")).unwrap();
        assert!(dir.candidates("i1", "1").is_empty());
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            "[あ-んア-ン漢字東京一二三]{0,4}",
            Just("《".to_string()),
            Just("》".to_string()),
            Just("(".to_string()),
            Just(")".to_string()),
            Just("｜".to_string()),
            Just("|".to_string()),
            Just("<i1|5>".to_string()),
            Just("<i2|7>".to_string()),
            "[a-z0-9<>| 　]{0,3}",
        ];
        prop::collection::vec(piece, 0..12).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn prop_paragraph_reconstructs_line(line in line_strategy()) {
            let dir = images(&["i1_5.png"]);
            let p = ParagraphBuilder::new(&dir).build(&line);
            prop_assert_eq!(p.source_text(), line);
        }

        #[test]
        fn prop_mismatched_ruby_is_literal(
            base in "[漢字東京一二三]{1,10}",
            reading in "[あ-ん]{1,10}",
            pair in 0usize..4,
            shift in 1usize..4,
        ) {
            let (open, _) = crate::parse::scanner::BRACKET_PAIRS[pair];
            let (_, close) = crate::parse::scanner::BRACKET_PAIRS[(pair + shift) % 4];
            let line = format!("{base}{open}{reading}{close}");
            let dir = images(&[]);
            let p = ParagraphBuilder::new(&dir).build(&line);
            prop_assert_eq!(p.children, vec![Inline::Text(line)]);
        }

        #[test]
        fn prop_valid_ruby_yields_node(
            base in "[漢字東京一二三]{1,10}",
            reading in "[あ-ん]{1,10}",
            pair in 0usize..4,
        ) {
            let (open, close) = crate::parse::scanner::BRACKET_PAIRS[pair];
            let line = format!("{base}{open}{reading}{close}");
            let dir = images(&[]);
            let p = ParagraphBuilder::new(&dir).build(&line);
            prop_assert_eq!(
                p.children,
                vec![
                    Inline::text(""),
                    Inline::Ruby(RubyAnnotation {
                        marker: None,
                        base,
                        open,
                        reading,
                        close,
                    }),
                    Inline::text(""),
                ]
            );
        }
    }
}
