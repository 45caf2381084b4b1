//! Style selectors and declarations: pure data addressed by block id or
//! table coordinate, never embedded in blocks.

use serde::{Deserialize, Serialize};

/// A value the editor may give either as a bare integer or as a CSS string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(i64),
    Text(String),
}

impl CssValue {
    /// Integer when the string is all digits, the raw string otherwise.
    pub fn from_attr(s: &str) -> CssValue {
        let t = s.trim();
        match t.parse::<i64>() {
            Ok(n) => CssValue::Number(n),
            Err(_) => CssValue::Text(t.to_string()),
        }
    }

    pub fn as_css(&self) -> String {
        match self {
            CssValue::Number(n) => n.to_string(),
            CssValue::Text(s) => s.clone(),
        }
    }

    /// CSS with `px` appended to bare integers.
    pub fn as_css_px(&self) -> String {
        match self {
            CssValue::Number(n) => format!("{n}px"),
            CssValue::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for CssValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_css())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleScope {
    Global,
    #[default]
    Document,
    Chapter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetBlockType {
    Paragraph,
    Heading,
    Image,
    Table,
    TableRow,
    TableCell,
    TableColumn,
    TableMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Th,
    Td,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowParity {
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowIndex {
    Index(usize),
    Parity(RowParity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn from_css(s: &str) -> Option<TextAlign> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn from_css(s: &str) -> Option<VerticalAlign> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "text-top" => Some(VerticalAlign::Top),
            "middle" | "center" => Some(VerticalAlign::Middle),
            "bottom" | "text-bottom" => Some(VerticalAlign::Bottom),
            _ => None,
        }
    }

    pub fn as_css(self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "middle",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderCollapse {
    Collapse,
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLayout {
    Auto,
    Fixed,
}

/// AND-filter over blocks and table coordinates; absent fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<TargetBlockType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<crate::model::ListType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_type: Option<CellType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<RowIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_id: Option<String>,
}

impl StyleTarget {
    pub fn ids(&self) -> &[String] {
        self.block_ids.as_deref().unwrap_or(&[])
    }
}

macro_rules! declaration {
    ($($field:ident : $ty:ty),* $(,)?) => {
        /// Flat bag of optional style properties.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct StyleDeclaration {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl StyleDeclaration {
            /// Copies every property set on `other` over this one.
            pub fn merge_from(&mut self, other: &StyleDeclaration) {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )*
            }

            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }
        }
    };
}

declaration! {
    width: CssValue,
    height: CssValue,
    align: String,
    display: String,

    font_size: i64,
    font_family: String,
    font_weight: CssValue,
    line_height: f64,
    color: String,
    text_align: TextAlign,
    text_indent: CssValue,
    letter_spacing: f64,
    background_color: String,

    border_width: i64,
    border_style: String,
    border_color: String,
    border_radius: i64,
    border_top_width: i64,
    border_top_style: String,
    border_top_color: String,
    border_bottom_width: i64,
    border_bottom_style: String,
    border_bottom_color: String,
    border_left_width: i64,
    border_left_style: String,
    border_left_color: String,
    border_right_width: i64,
    border_right_style: String,
    border_right_color: String,

    margin_top: i64,
    margin_bottom: i64,
    padding_top: i64,
    padding_bottom: i64,
    padding_left: i64,
    padding_right: i64,
    padding: CssValue,
    min_width: CssValue,
    max_width: CssValue,
    min_height: CssValue,

    list_style_type: String,
    marker_color: String,

    border_collapse: BorderCollapse,
    table_layout: TableLayout,
    cell_spacing: String,
    cell_padding: String,

    vertical_align: VerticalAlign,
}

impl StyleDeclaration {
    /// `fontWeight` as a boolean bold flag.
    pub fn is_bold(&self) -> bool {
        match &self.font_weight {
            Some(CssValue::Number(n)) => *n >= 600,
            Some(CssValue::Text(s)) => {
                let s = s.trim().to_ascii_lowercase();
                s == "bold" || s == "bolder" || s.parse::<i64>().map(|n| n >= 600).unwrap_or(false)
            }
            None => false,
        }
    }
}
