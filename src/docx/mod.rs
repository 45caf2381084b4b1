//! OOXML word-processing packages in both directions.

pub mod export;
pub mod image;
pub mod import;
pub mod numbering;
mod package;
mod runs;
mod xml;

pub use export::{export_docx, export_docx_with};
pub use image::{DefaultImageResolver, ImageResolver};
pub use import::chapters::ChapterData;
pub use import::images::{DirImageStore, ImageStore, MemoryImageStore};
pub use import::{import_docx, read_docx, ImportResult, ImportedDocument, Orientation, PageSettings};
