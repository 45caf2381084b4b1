//! Content/StyleSheet document model and its JSON wire format.
//!
//! Field names are camelCase on the wire and must stay stable: persisted
//! documents are decoded with these exact names.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use crate::style::{
    BorderCollapse, CellType, CssValue, RowIndex, RowParity, StyleDeclaration, StyleScope,
    StyleTarget, TableLayout, TargetBlockType, TextAlign, VerticalAlign,
};

/// Fresh block id: `{prefix}-` plus eight hex digits.
pub fn block_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &uuid[..8])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleMarkName {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Superscript,
    Subscript,
}

impl SimpleMarkName {
    pub const ALL: [SimpleMarkName; 7] = [
        SimpleMarkName::Bold,
        SimpleMarkName::Italic,
        SimpleMarkName::Underline,
        SimpleMarkName::Strike,
        SimpleMarkName::Code,
        SimpleMarkName::Superscript,
        SimpleMarkName::Subscript,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimpleMarkName::Bold => "bold",
            SimpleMarkName::Italic => "italic",
            SimpleMarkName::Underline => "underline",
            SimpleMarkName::Strike => "strike",
            SimpleMarkName::Code => "code",
            SimpleMarkName::Superscript => "superscript",
            SimpleMarkName::Subscript => "subscript",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMarkName {
    Color,
    FontSize,
    FontFamily,
    BackgroundColor,
}

impl ValueMarkName {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueMarkName::Color => "color",
            ValueMarkName::FontSize => "fontSize",
            ValueMarkName::FontFamily => "fontFamily",
            ValueMarkName::BackgroundColor => "backgroundColor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "color" => Some(ValueMarkName::Color),
            "fontSize" => Some(ValueMarkName::FontSize),
            "fontFamily" => Some(ValueMarkName::FontFamily),
            "backgroundColor" => Some(ValueMarkName::BackgroundColor),
            _ => None,
        }
    }

    pub fn css_property(self) -> &'static str {
        match self {
            ValueMarkName::Color => "color",
            ValueMarkName::FontSize => "font-size",
            ValueMarkName::FontFamily => "font-family",
            ValueMarkName::BackgroundColor => "background-color",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkKind {
    Simple(SimpleMarkName),
    Composite(Vec<SimpleMarkName>),
    Link { href: String },
    Value { name: ValueMarkName, value: String },
    /// A name this version does not know; kept for round-tripping and otherwise ignored.
    Unknown(String),
}

/// Character-range formatting over a block's text. Offsets count `char`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMark", into = "RawMark")]
pub struct Mark {
    pub start: usize,
    pub end: usize,
    pub kind: MarkKind,
}

impl Mark {
    pub fn new(start: usize, end: usize, kind: MarkKind) -> Self {
        Mark { start, end, kind }
    }

    pub fn simple(start: usize, end: usize, name: SimpleMarkName) -> Self {
        Mark::new(start, end, MarkKind::Simple(name))
    }

    pub fn value(start: usize, end: usize, name: ValueMarkName, value: impl Into<String>) -> Self {
        Mark::new(
            start,
            end,
            MarkKind::Value {
                name,
                value: value.into(),
            },
        )
    }

    pub fn link(start: usize, end: usize, href: impl Into<String>) -> Self {
        Mark::new(start, end, MarkKind::Link { href: href.into() })
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMarkType {
    One(String),
    Many(Vec<String>),
}

#[derive(Serialize, Deserialize)]
struct RawMark {
    #[serde(rename = "type")]
    kind: RawMarkType,
    range: (usize, usize),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl TryFrom<RawMark> for Mark {
    type Error = String;

    fn try_from(raw: RawMark) -> std::result::Result<Self, Self::Error> {
        let (start, end) = raw.range;
        if start > end {
            return Err(format!("mark range ({start}, {end}) is reversed"));
        }
        let kind = match raw.kind {
            RawMarkType::Many(names) => {
                let names: Vec<SimpleMarkName> = names
                    .iter()
                    .filter_map(|n| SimpleMarkName::from_name(n))
                    .collect();
                MarkKind::Composite(names)
            }
            RawMarkType::One(name) => {
                if let Some(simple) = SimpleMarkName::from_name(&name) {
                    MarkKind::Simple(simple)
                } else if name == "link" {
                    let href = raw.href.ok_or_else(|| "link mark without href".to_string())?;
                    MarkKind::Link { href }
                } else if let Some(value_name) = ValueMarkName::from_name(&name) {
                    let value = raw
                        .value
                        .ok_or_else(|| format!("{name} mark without value"))?;
                    MarkKind::Value {
                        name: value_name,
                        value,
                    }
                } else {
                    MarkKind::Unknown(name)
                }
            }
        };
        Ok(Mark { start, end, kind })
    }
}

impl From<Mark> for RawMark {
    fn from(mark: Mark) -> Self {
        let range = (mark.start, mark.end);
        let (kind, href, value) = match mark.kind {
            MarkKind::Simple(name) => (RawMarkType::One(name.as_str().to_string()), None, None),
            MarkKind::Composite(names) => (
                RawMarkType::Many(names.iter().map(|n| n.as_str().to_string()).collect()),
                None,
                None,
            ),
            MarkKind::Link { href } => (RawMarkType::One("link".to_string()), Some(href), None),
            MarkKind::Value { name, value } => (
                RawMarkType::One(name.as_str().to_string()),
                None,
                Some(value),
            ),
            MarkKind::Unknown(name) => (RawMarkType::One(name), None, None),
        };
        RawMark {
            kind,
            range,
            href,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Ordered,
    #[serde(rename = "none")]
    Plain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_start: Option<u32>,
}

impl ParagraphAttrs {
    /// List kind and level when this paragraph is a list item.
    pub fn list(&self) -> Option<(ListType, u32)> {
        match self.list_type {
            Some(ListType::Bullet) | Some(ListType::Ordered) => {
                Some((self.list_type?, self.list_level.unwrap_or(0)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphBlock {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<ParagraphAttrs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    pub id: String,
    pub text: String,
    pub level: u8,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<ParagraphAttrs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<CssValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<CssValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub id: String,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ImageMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellContent {
    pub text: String,
    #[serde(default)]
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Grid coordinate of the (master) cell.
    #[serde(rename = "cell")]
    pub position: (usize, usize),
    pub content: CellContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeType {
    Horizontal,
    Vertical,
    Rectangular,
}

impl MergeType {
    pub fn classify(rowspan: usize, colspan: usize) -> Option<MergeType> {
        match (rowspan > 1, colspan > 1) {
            (true, true) => Some(MergeType::Rectangular),
            (true, false) => Some(MergeType::Vertical),
            (false, true) => Some(MergeType::Horizontal),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRegion {
    #[serde(default)]
    pub id: String,
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub master_cell: (usize, usize),
    #[serde(rename = "type")]
    pub kind: MergeType,
}

impl MergeRegion {
    pub fn new(start: (usize, usize), rowspan: usize, colspan: usize) -> Option<Self> {
        let kind = MergeType::classify(rowspan, colspan)?;
        Some(MergeRegion {
            id: format!("merge-{}-{}", start.0, start.1),
            start,
            end: (start.0 + rowspan - 1, start.1 + colspan - 1),
            master_cell: start,
            kind,
        })
    }

    pub fn rowspan(&self) -> usize {
        self.end.0 - self.start.0 + 1
    }

    pub fn colspan(&self) -> usize {
        self.end.1 - self.start.1 + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start.0..=self.end.0).contains(&row) && (self.start.1..=self.end.1).contains(&col)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub merge_regions: Vec<MergeRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub id: String,
    pub data: TableData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividerBlock {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Paragraph(ParagraphBlock),
    Heading(HeadingBlock),
    Image(ImageBlock),
    Table(TableBlock),
    Code(CodeBlock),
    Divider(DividerBlock),
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Paragraph(b) => &b.id,
            Block::Heading(b) => &b.id,
            Block::Image(b) => &b.id,
            Block::Table(b) => &b.id,
            Block::Code(b) => &b.id,
            Block::Divider(b) => &b.id,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading(_) => "heading",
            Block::Image(_) => "image",
            Block::Table(_) => "table",
            Block::Code(_) => "code",
            Block::Divider(_) => "divider",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub blocks: Vec<Block>,
}

impl Content {
    pub fn new(blocks: Vec<Block>) -> Self {
        Content { blocks }
    }

    pub fn from_json(json: &str) -> Result<Content> {
        let content: Content = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Schema checks that serde alone cannot express, plus table coverage
    /// (reported as a structural error).
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for block in &self.blocks {
            let id = block.id();
            if id.is_empty() {
                return Err(ConvertError::Validation(format!(
                    "{} block without id",
                    block.type_name()
                )));
            }
            if !seen.insert(id) {
                return Err(ConvertError::Validation(format!("duplicate block id {id}")));
            }
            match block {
                Block::Heading(h) if !(1..=6).contains(&h.level) => {
                    return Err(ConvertError::Validation(format!(
                        "heading {} has level {} outside 1..6",
                        h.id, h.level
                    )));
                }
                Block::Table(t) if t.data.rows == 0 || t.data.cols == 0 => {
                    if !t.data.cells.is_empty() {
                        return Err(ConvertError::Validation(format!(
                            "table {} has cells but an empty grid",
                            t.id
                        )));
                    }
                }
                _ => {}
            }
        }
        for table in self.tables() {
            crate::table::check_coverage(&table.id, &table.data)?;
        }
        Ok(())
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    #[serde(default)]
    pub target: StyleTarget,
    #[serde(default)]
    pub style: StyleDeclaration,
}

impl StyleRule {
    pub fn for_block(block_type: TargetBlockType, id: &str, style: StyleDeclaration) -> Self {
        StyleRule {
            target: StyleTarget {
                block_type: Some(block_type),
                block_ids: Some(vec![id.to_string()]),
                ..Default::default()
            },
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheet {
    pub style_id: String,
    #[serde(default)]
    pub applies_to: StyleScope,
    #[serde(default)]
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn new(style_id: impl Into<String>, applies_to: StyleScope) -> Self {
        StyleSheet {
            style_id: style_id.into(),
            applies_to,
            rules: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<StyleSheet> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        StyleSheet::new("default", StyleScope::Document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_mark_shape() {
        let json = r##"[
            {"type": "bold", "range": [0, 2]},
            {"type": ["bold", "italic"], "range": [2, 4]},
            {"type": "link", "range": [0, 4], "href": "https://a.test"},
            {"type": "color", "range": [1, 3], "value": "#ff0000"},
            {"type": "sparkle", "range": [0, 1]}
        ]"##;
        let marks: Vec<Mark> = serde_json::from_str(json).unwrap();
        assert_eq!(marks[0].kind, MarkKind::Simple(SimpleMarkName::Bold));
        assert_eq!(
            marks[1].kind,
            MarkKind::Composite(vec![SimpleMarkName::Bold, SimpleMarkName::Italic])
        );
        assert_eq!(
            marks[2].kind,
            MarkKind::Link {
                href: "https://a.test".into()
            }
        );
        assert_eq!(
            marks[3].kind,
            MarkKind::Value {
                name: ValueMarkName::Color,
                value: "#ff0000".into()
            }
        );
        assert_eq!(marks[4].kind, MarkKind::Unknown("sparkle".into()));

        let back = serde_json::to_value(&marks[1]).unwrap();
        assert_eq!(back["type"], serde_json::json!(["bold", "italic"]));
        assert_eq!(back["range"], serde_json::json!([2, 4]));
    }

    #[test]
    fn rejects_reversed_mark_range() {
        let err = serde_json::from_str::<Mark>(r#"{"type": "bold", "range": [3, 1]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn block_union_uses_type_tag() {
        let json = r#"{"blocks": [
            {"type": "heading", "id": "heading-1", "text": "Intro", "level": 2, "marks": []},
            {"type": "divider", "id": "divider-1"},
            {"type": "table", "id": "table-1", "data": {"rows": 1, "cols": 2,
                "cells": [{"cell": [0, 0], "content": {"text": "a", "marks": []}, "styleId": "cell-0-0"}],
                "mergeRegions": [{"id": "merge-0-0", "start": [0, 0], "end": [0, 1], "masterCell": [0, 0], "type": "horizontal"}]}}
        ]}"#;
        let content = Content::from_json(json).unwrap();
        assert_eq!(content.blocks.len(), 3);
        assert_eq!(content.blocks[1].type_name(), "divider");
        match &content.blocks[2] {
            Block::Table(t) => {
                assert_eq!(t.data.cells[0].style_id.as_deref(), Some("cell-0-0"));
                assert_eq!(t.data.merge_regions[0].kind, MergeType::Horizontal);
                assert_eq!(t.data.merge_regions[0].colspan(), 2);
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_bad_levels_and_duplicate_ids() {
        let bad_level = r#"{"blocks": [{"type": "heading", "id": "h", "text": "x", "level": 7}]}"#;
        assert!(matches!(
            Content::from_json(bad_level),
            Err(ConvertError::Validation(_))
        ));
        let dup = r#"{"blocks": [{"type": "divider", "id": "d"}, {"type": "divider", "id": "d"}]}"#;
        assert!(matches!(
            Content::from_json(dup),
            Err(ConvertError::Validation(_))
        ));
        let unknown_type = r#"{"blocks": [{"type": "video", "id": "v"}]}"#;
        assert!(Content::from_json(unknown_type).is_err());
    }

    #[test]
    fn block_ids_carry_prefix() {
        let id = block_id("para");
        assert!(id.starts_with("para-"));
        assert_eq!(id.len(), "para-".len() + 8);
        assert_ne!(block_id("para"), id);
    }

    #[test]
    fn merge_region_classification() {
        assert_eq!(MergeType::classify(1, 1), None);
        assert_eq!(MergeType::classify(1, 3), Some(MergeType::Horizontal));
        assert_eq!(MergeType::classify(2, 1), Some(MergeType::Vertical));
        let region = MergeRegion::new((0, 0), 2, 2).unwrap();
        assert_eq!(region.kind, MergeType::Rectangular);
        assert_eq!(region.end, (1, 1));
        assert!(region.contains(1, 1));
        assert!(!region.contains(2, 0));
    }

    #[test]
    fn uncovered_table_grid_is_structural() {
        let json = r#"{"blocks": [{"type": "table", "id": "t", "data": {
            "rows": 1, "cols": 2,
            "cells": [{"cell": [0, 0], "content": {"text": "only"}}],
            "mergeRegions": []
        }}]}"#;
        let err = Content::from_json(json).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Structural);
    }
}
