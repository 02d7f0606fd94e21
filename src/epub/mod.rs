//! EPUB 3 packaging.
//!
//! [`Assembler`] renders individual documents, [`OutlineBuilder`] groups
//! sections under chapters, and [`PackageWriter`] streams everything into a
//! zip container.

mod assembler;
mod outline;
mod writer;

pub use assembler::{
    Assembler, ImageAsset, ImageRegistry, Manifest, PackageFields, SectionPage, XHTML_MEDIA_TYPE,
    modified_timestamp,
};
pub use outline::OutlineBuilder;
pub use writer::{
    DEFAULT_STYLESHEET, EpubConfig, PACKAGE_DIR, PACKAGE_FILE, PackageSummary, PackageWriter,
    output_file_name, write_book, write_book_to_dir,
};
