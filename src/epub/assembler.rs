//! Renders the XHTML pages and the package descriptor.
//!
//! Every document is built as an [`Element`] tree, so the structure a page
//! needs is always present. Manifest bookkeeping lives in [`Manifest`] and
//! [`ImageRegistry`], which the caller owns for the duration of one book.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ImageRef, Inline, ManifestItem, OutlineItem, Paragraph, RubyAnnotation, Section};
use crate::util::{ImageInfo, probe_image};
use crate::xml::{Element, Node, write_document};

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// Stylesheet location relative to the package descriptor.
pub const STYLESHEET_HREF: &str = "css/default.css";
pub const COVER_HREF: &str = "cover.xhtml";
pub const NAV_HREF: &str = "nav.xhtml";
/// Image folder relative to the package descriptor.
pub const IMAGE_DIR: &str = "img";

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
const EPUB_NS: &str = "http://www.idpf.org/2007/ops";
const OPF_NS: &str = "http://www.idpf.org/2007/opf";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

const NAV_TITLE: &str = "目次";

/// Append-only manifest and spine for one book.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pages: Vec<ManifestItem>,
    images: Vec<ManifestItem>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content page; pages are also the spine, in insertion order.
    pub fn push_page(&mut self, item: ManifestItem) {
        self.pages.push(item);
    }

    pub fn push_image(&mut self, item: ManifestItem) {
        self.images.push(item);
    }

    pub fn pages(&self) -> &[ManifestItem] {
        &self.pages
    }

    pub fn images(&self) -> &[ManifestItem] {
        &self.images
    }

    /// Manifest entries written for every book, before the pages.
    pub fn fixed_items() -> [ManifestItem; 3] {
        [
            ManifestItem::new("nav", NAV_HREF, XHTML_MEDIA_TYPE).with_properties("nav"),
            ManifestItem::new("cover", COVER_HREF, XHTML_MEDIA_TYPE),
            ManifestItem::new("style", STYLESHEET_HREF, "text/css"),
        ]
    }

    /// Every manifest entry: fixed items, pages, then images.
    pub fn items(&self) -> impl Iterator<Item = ManifestItem> + '_ {
        Self::fixed_items()
            .into_iter()
            .chain(self.pages.iter().cloned())
            .chain(self.images.iter().cloned())
    }

    /// Spine idrefs: the cover followed by every page.
    pub fn spine(&self) -> impl Iterator<Item = &str> {
        std::iter::once("cover").chain(self.pages.iter().map(|p| p.id.as_str()))
    }
}

/// Images already embedded, keyed by container file name.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    probed: HashMap<String, ImageInfo>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe an image the first time it is seen. Returns its header info and,
    /// for a first sighting, the asset to embed.
    fn embed(&mut self, image: &ImageRef) -> Result<(ImageInfo, Option<ImageAsset>)> {
        let file_name = image.file_name();
        if let Some(info) = self.probed.get(&file_name) {
            return Ok((*info, None));
        }

        let data = fs::read(&image.path)?;
        let info = probe_image(&data).ok_or_else(|| Error::ImageProbe {
            path: image.path.clone(),
        })?;
        debug!(
            file = %file_name,
            width = info.width,
            height = info.height,
            media_type = info.media_type,
            "embedding image"
        );

        self.probed.insert(file_name.clone(), info);
        let asset = ImageAsset {
            item: ManifestItem::new(
                file_name.clone(),
                image_href(&file_name),
                info.media_type,
            ),
            file_name,
            data,
        };
        Ok((info, Some(asset)))
    }
}

/// An image file to store in the container.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub item: ManifestItem,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// A rendered section page.
#[derive(Debug, Clone)]
pub struct SectionPage {
    pub title: String,
    pub page: ManifestItem,
    /// Container path under the package folder, e.g. `section-3.xhtml`.
    pub file_name: String,
    pub document: Vec<u8>,
    /// Images first referenced by this section.
    pub images: Vec<ImageAsset>,
}

/// Identity fields of the package descriptor.
#[derive(Debug, Clone, Copy)]
pub struct PackageFields<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub updated: DateTime<Utc>,
}

/// Format a timestamp as `dcterms:modified` expects.
pub fn modified_timestamp(updated: &DateTime<Utc>) -> String {
    updated.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn image_href(file_name: &str) -> String {
    format!("./{IMAGE_DIR}/{file_name}")
}

/// Builds documents in a fixed language.
#[derive(Debug, Clone)]
pub struct Assembler {
    language: String,
}

impl Assembler {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    fn page(&self, title: &str, body: Element) -> Result<Vec<u8>> {
        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "UTF-8"))
            .child(Element::new("title").child(title))
            .child(
                Element::new("link")
                    .attr("rel", "stylesheet")
                    .attr("type", "text/css")
                    .attr("href", format!("./{STYLESHEET_HREF}")),
            );
        let html = Element::new("html")
            .attr("xmlns", XHTML_NS)
            .attr("xmlns:epub", EPUB_NS)
            .attr("lang", self.language.as_str())
            .attr("xml:lang", self.language.as_str())
            .child(head)
            .child(body);
        write_document(&html, Some("html"))
    }

    /// The cover page: book title and the information table.
    pub fn render_cover(&self, title: &str, info_table: &[(String, Vec<String>)]) -> Result<Vec<u8>> {
        let rows = info_table.iter().map(|(label, values)| {
            Element::new("tr")
                .child(Element::new("th").child(label.as_str()))
                .child(Element::new("td").children(join_with_breaks(
                    values.iter().map(|v| vec![Node::from(v.as_str())]),
                )))
        });

        let body = Element::new("body")
            .child(Element::new("h1").attr("class", "heading title").child(title))
            .child(
                Element::new("table")
                    .attr("class", "informations")
                    .child(Element::new("tbody").children(rows)),
            );
        self.page(title, body)
    }

    /// Render one section page.
    ///
    /// `chapter` is the chapter title when this section opens a chapter; the
    /// page then carries an `h1` for the chapter and an `h2` for the section.
    /// Images seen for the first time are probed, registered in `images` and
    /// returned with the page.
    pub fn render_section(
        &self,
        chapter: Option<&str>,
        section: &Section,
        images: &mut ImageRegistry,
    ) -> Result<SectionPage> {
        let mut new_images = Vec::new();
        let mut body = Element::new("body");

        match chapter {
            Some(chapter) => {
                body.push(heading("h1", "heading chapter", chapter));
                body.push(heading("h2", "heading section", &section.title));
            }
            None => body.push(heading("h1", "heading section", &section.title)),
        }

        if let Some(foreword) = &section.foreword {
            let nodes = self.paragraphs(foreword, images, &mut new_images)?;
            body.push(Element::new("header").children(nodes));
            body.push(Element::new("hr"));
        }

        let nodes = self.paragraphs(&section.body, images, &mut new_images)?;
        body.push(Element::new("main").children(nodes));

        if let Some(afterword) = &section.afterword {
            let nodes = self.paragraphs(afterword, images, &mut new_images)?;
            body.push(Element::new("hr"));
            body.push(Element::new("footer").children(nodes));
        }

        let id = format!("section-{}", section.index);
        let file_name = format!("{id}.xhtml");
        Ok(SectionPage {
            title: section.title.clone(),
            page: ManifestItem::new(id, format!("./{file_name}"), XHTML_MEDIA_TYPE),
            file_name,
            document: self.page(&section.title, body)?,
            images: new_images,
        })
    }

    /// Paragraphs separated by `<br/>`.
    fn paragraphs(
        &self,
        paragraphs: &[Paragraph],
        images: &mut ImageRegistry,
        new_images: &mut Vec<ImageAsset>,
    ) -> Result<Vec<Node>> {
        let mut lines = Vec::with_capacity(paragraphs.len());
        for paragraph in paragraphs {
            let mut nodes = Vec::with_capacity(paragraph.children.len());
            for child in &paragraph.children {
                if let Some(node) = inline_node(child, images, new_images)? {
                    nodes.push(node);
                }
            }
            lines.push(nodes);
        }
        Ok(join_with_breaks(lines))
    }

    /// The navigation document with a nested ordered list.
    pub fn render_nav(&self, outline: &[OutlineItem]) -> Result<Vec<u8>> {
        let nav = Element::new("nav")
            .attr("epub:type", "toc")
            .attr("id", "toc")
            .child(Element::new("h1").child(NAV_TITLE))
            .child(Element::new("ol").children(outline.iter().map(outline_entry)));
        self.page(NAV_TITLE, Element::new("body").child(nav))
    }

    /// The package descriptor (`book.opf`).
    pub fn render_package(&self, fields: &PackageFields<'_>, manifest: &Manifest) -> Result<Vec<u8>> {
        let metadata = Element::new("metadata")
            .attr("xmlns:dc", DC_NS)
            .child(
                Element::new("dc:identifier")
                    .attr("id", "pub-id")
                    .child(fields.id),
            )
            .child(Element::new("dc:title").child(fields.title))
            .child(Element::new("dc:language").child(self.language.as_str()))
            .child(
                Element::new("dc:creator")
                    .attr("id", "creator")
                    .child(fields.author),
            )
            .child(
                Element::new("meta")
                    .attr("property", "dcterms:modified")
                    .child(modified_timestamp(&fields.updated)),
            );

        let items = manifest.items().map(|item| {
            let mut el = Element::new("item")
                .attr("id", item.id)
                .attr("href", item.href)
                .attr("media-type", item.media_type);
            if let Some(properties) = item.properties {
                el = el.attr("properties", properties);
            }
            el
        });

        let spine = manifest
            .spine()
            .map(|idref| Element::new("itemref").attr("idref", idref));

        let package = Element::new("package")
            .attr("xmlns", OPF_NS)
            .attr("version", "3.0")
            .attr("unique-identifier", "pub-id")
            .attr("xml:lang", self.language.as_str())
            .child(metadata)
            .child(Element::new("manifest").children(items))
            .child(Element::new("spine").children(spine));
        write_document(&package, None)
    }
}

fn heading(tag: &'static str, class: &str, text: &str) -> Element {
    Element::new(tag).attr("class", class).child(text)
}

/// Flatten groups of nodes, separating consecutive groups with `<br/>`.
fn join_with_breaks<I>(groups: I) -> Vec<Node>
where
    I: IntoIterator<Item = Vec<Node>>,
{
    let mut out = Vec::new();
    for (i, group) in groups.into_iter().enumerate() {
        if i > 0 {
            out.push(Element::new("br").into());
        }
        out.extend(group);
    }
    out
}

fn inline_node(
    child: &Inline,
    images: &mut ImageRegistry,
    new_images: &mut Vec<ImageAsset>,
) -> Result<Option<Node>> {
    let node = match child {
        Inline::Text(text) => Node::Text(text.clone()),
        Inline::Comment(_) => return Ok(None),
        Inline::Image(image) => {
            let (info, asset) = images.embed(image)?;
            new_images.extend(asset);
            Element::new("img")
                .attr("src", image_href(&image.file_name()))
                .attr("alt", image.alt.as_str())
                .attr("width", info.width.to_string())
                .attr("height", info.height.to_string())
                .into()
        }
        Inline::Ruby(ruby) => ruby_element(ruby).into(),
    };
    Ok(Some(node))
}

/// `<ruby>base<rp>《</rp><rt>reading</rt><rp>》</rp></ruby>`
///
/// The start marker is not rendered.
fn ruby_element(ruby: &RubyAnnotation) -> Element {
    Element::new("ruby")
        .child(ruby.base.as_str())
        .child(Element::new("rp").child(ruby.open.to_string()))
        .child(Element::new("rt").child(ruby.reading.as_str()))
        .child(Element::new("rp").child(ruby.close.to_string()))
}

fn outline_entry(item: &OutlineItem) -> Element {
    let label = match &item.href {
        Some(href) => Element::new("a")
            .attr("href", href.as_str())
            .child(item.text.as_str()),
        None => Element::new("span").child(item.text.as_str()),
    };
    let mut li = Element::new("li").child(label);
    if let Some(children) = &item.children {
        li.push(Element::new("ol").children(children.iter().map(outline_entry)));
    }
    li
}

/// Container path of a page or image relative to the package descriptor.
pub fn container_path(package_dir: &str, href: &str) -> String {
    let href = href.strip_prefix("./").unwrap_or(href);
    Path::new(package_dir)
        .join(href)
        .to_string_lossy()
        .replace('\\', "/")
}
