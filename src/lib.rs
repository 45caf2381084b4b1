//! Conversion between editor HTML, the Content/StyleSheet JSON model and
//! `.docx` packages.
//!
//! ```no_run
//! let (content, sheet) = richdoc::parse_html("<p>Hello <b>world</b></p>");
//! let html = richdoc::render_html(&content, &sheet)?;
//! let docx = richdoc::export_docx(&content, &sheet, None)?;
//! # Ok::<(), richdoc::ConvertError>(())
//! ```

pub mod assemble;
pub mod css;
pub mod docx;
pub mod error;
pub mod html;
pub mod marks;
pub mod model;
pub mod settings;
pub mod style;
pub mod style_index;
pub mod table;
pub mod units;

pub use assemble::{merge_chapters, MergeOptions};
pub use docx::{
    export_docx, export_docx_with, import_docx, read_docx, ChapterData, DefaultImageResolver,
    DirImageStore, ImageResolver, ImageStore, ImportResult, ImportedDocument, MemoryImageStore,
    PageSettings,
};
pub use error::{ConvertError, ErrorKind, Result};
pub use html::{parse_html, render_html};
pub use model::{Block, Content, Mark, StyleRule, StyleSheet};
pub use settings::{DocumentSettings, HeadingNumberingStyle, ImportConfig};
