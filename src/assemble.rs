//! Concatenating chapters into one exportable document.

use crate::docx::ChapterData;
use crate::model::{Block, Content, DividerBlock, HeadingBlock, StyleScope, StyleSheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Emit each chapter's title as a heading before its content.
    pub include_titles: bool,
    /// Put a divider between consecutive chapters.
    pub dividers_between: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            include_titles: true,
            dividers_between: false,
        }
    }
}

pub fn merge_chapters(chapters: &[ChapterData], options: MergeOptions) -> (Content, StyleSheet) {
    let mut blocks = Vec::new();
    let mut sheet = StyleSheet::new("merged", StyleScope::Document);

    for (i, chapter) in chapters.iter().enumerate() {
        if i > 0 && options.dividers_between {
            blocks.push(Block::Divider(DividerBlock {
                id: format!("chapter-divider-{i}"),
            }));
        }
        if options.include_titles {
            blocks.push(Block::Heading(HeadingBlock {
                id: format!("chapter-title-{}", i + 1),
                text: chapter.title.clone(),
                level: chapter.level.clamp(1, 6),
                marks: Vec::new(),
                attrs: None,
            }));
        }
        blocks.extend(chapter.content.blocks.iter().cloned());
        sheet.rules.extend(chapter.stylesheet.rules.iter().cloned());
    }
    (Content::new(blocks), sheet)
}
