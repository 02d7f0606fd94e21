//! Chapter file segmentation.
//!
//! ```text
//! foreword lines...
//! ********************************************      (header border, 44 *)
//! title
//! <separator, skipped>
//! body lines...
//! ************************************************  (footer border, 48 *)
//! afterword lines...
//! ```
//!
//! Both borders are optional. Without a header border the title is the
//! first line and the body starts on the third.

use super::paragraph::ParagraphBuilder;
use crate::model::{Paragraph, Section};

pub const HEADER_BORDER: &str = "********************************************";
pub const FOOTER_BORDER: &str = "************************************************";

/// The regions of a chapter file, still as raw lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLines<'a> {
    pub foreword: Option<&'a [&'a str]>,
    pub title: &'a str,
    /// The line after the title, which is dropped.
    pub separator: Option<&'a str>,
    pub body: &'a [&'a str],
    pub afterword: Option<&'a [&'a str]>,
}

/// Split on `\n` and `\r\n`.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        *line = line.strip_suffix('\r').unwrap_or(line);
    }
    lines
}

/// Locate the borders and slice `lines` into regions.
///
/// Each border is looked up by its first exact occurrence.
pub fn segment<'a>(lines: &'a [&'a str]) -> SectionLines<'a> {
    let header = lines.iter().position(|l| *l == HEADER_BORDER);
    let footer = lines.iter().position(|l| *l == FOOTER_BORDER);

    let mut current = 0;
    let foreword = header.map(|h| {
        current = h + 1;
        &lines[..h]
    });

    let title = lines.get(current).copied().unwrap_or_default();
    let separator = lines.get(current + 1).copied();

    let body_start = current + 2;
    let body_end = footer.unwrap_or(lines.len());
    let body = if body_start < body_end {
        &lines[body_start..body_end]
    } else {
        &[]
    };

    let afterword = footer.map(|f| &lines[f + 1..]);

    SectionLines {
        foreword,
        title,
        separator,
        body,
        afterword,
    }
}

/// Parse a whole chapter file into a [`Section`].
pub fn parse_section(index: u32, text: &str, builder: &ParagraphBuilder<'_>) -> Section {
    let lines = split_lines(text);
    let parts = segment(&lines);
    let build = |region: &[&str]| -> Vec<Paragraph> {
        region.iter().map(|line| builder.build(line)).collect()
    };

    Section {
        index,
        title: parts.title.to_string(),
        foreword: parts.foreword.map(|region| build(region)),
        body: build(parts.body),
        afterword: parts.afterword.map(|region| build(region)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ImageDirectory;
    use proptest::prelude::*;

    #[test]
    fn test_split_lines_handles_crlf() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_no_borders() {
        let lines = ["Title", "", "one", "two"];
        let parts = segment(&lines);
        assert_eq!(parts.foreword, None);
        assert_eq!(parts.title, "Title");
        assert_eq!(parts.separator, Some(""));
        assert_eq!(parts.body, &["one", "two"]);
        assert_eq!(parts.afterword, None);
    }

    #[test]
    fn test_both_borders() {
        let lines = [
            "before",
            HEADER_BORDER,
            "Title",
            "",
            "body 1",
            "body 2",
            FOOTER_BORDER,
            "after",
        ];
        let parts = segment(&lines);
        assert_eq!(parts.foreword, Some(&["before"][..]));
        assert_eq!(parts.title, "Title");
        assert_eq!(parts.body, &["body 1", "body 2"]);
        assert_eq!(parts.afterword, Some(&["after"][..]));
    }

    #[test]
    fn test_footer_only() {
        let lines = ["Title", "", "body", FOOTER_BORDER];
        let parts = segment(&lines);
        assert_eq!(parts.foreword, None);
        assert_eq!(parts.body, &["body"]);
        assert_eq!(parts.afterword, Some(&[][..]));
    }

    #[test]
    fn test_border_lookalikes_are_ordinary_lines() {
        let almost = "*".repeat(45);
        let lines = ["Title", "", almost.as_str()];
        let parts = segment(&lines);
        assert_eq!(parts.body, &[almost.as_str()]);
    }

    #[test]
    fn test_short_file() {
        let lines = ["Only a title"];
        let parts = segment(&lines);
        assert_eq!(parts.title, "Only a title");
        assert_eq!(parts.separator, None);
        assert!(parts.body.is_empty());
    }

    #[test]
    fn test_parse_section_builds_paragraphs() {
        let dir = ImageDirectory::default();
        let builder = ParagraphBuilder::new(&dir);
        let text = format!("前書き\r\n{HEADER_BORDER}\r\n第一話\r\n\r\n漢字《かんじ》\r\n{FOOTER_BORDER}\r\n後書き\r\n");
        let section = parse_section(3, &text, &builder);

        assert_eq!(section.index, 3);
        assert_eq!(section.title, "第一話");
        assert_eq!(section.foreword.as_ref().map(Vec::len), Some(1));
        assert_eq!(section.body.len(), 1);
        assert_eq!(section.body[0].source_text(), "漢字《かんじ》");
        let afterword: Vec<_> = section
            .afterword
            .iter()
            .flatten()
            .map(Paragraph::source_text)
            .collect();
        assert_eq!(afterword, vec!["後書き", ""]);
        assert_eq!(section.paragraphs().count(), 4);
    }

    fn plain_lines(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z あ-ん*]{0,6}", 0..max)
    }

    proptest! {
        #[test]
        fn prop_segments_partition_lines(
            foreword in plain_lines(4),
            title in "[a-z]{1,6}",
            separator in "[a-z]{0,3}",
            body in plain_lines(6),
            afterword in plain_lines(4),
        ) {
            let mut lines: Vec<&str> = foreword.iter().map(String::as_str).collect();
            lines.push(HEADER_BORDER);
            lines.push(&title);
            lines.push(&separator);
            lines.extend(body.iter().map(String::as_str));
            lines.push(FOOTER_BORDER);
            lines.extend(afterword.iter().map(String::as_str));

            let parts = segment(&lines);

            let mut rebuilt: Vec<&str> = parts.foreword.unwrap_or_default().to_vec();
            rebuilt.push(HEADER_BORDER);
            rebuilt.push(parts.title);
            rebuilt.extend(parts.separator);
            rebuilt.extend_from_slice(parts.body);
            rebuilt.push(FOOTER_BORDER);
            rebuilt.extend_from_slice(parts.afterword.unwrap_or_default());

            prop_assert_eq!(&rebuilt, &lines);
            prop_assert_eq!(parts.body.len(), body.len());
        }

        #[test]
        fn prop_without_borders_body_starts_at_line_two(lines in plain_lines(8)) {
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            let parts = segment(&lines);
            prop_assert_eq!(parts.title, lines.first().copied().unwrap_or_default());
            prop_assert_eq!(parts.body, lines.get(2..).unwrap_or_default());
        }
    }
}
