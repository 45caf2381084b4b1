//! Inline `style="..."` parsing and promotion of user-set values into
//! style declarations.

use crate::style::{BorderCollapse, CssValue, StyleDeclaration, TableLayout, TextAlign, VerticalAlign};
use crate::units;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // The property name is matched as a whole token, so `background-color`
    // never satisfies a lookup for `color`.
    static ref DECLARATION: Regex = Regex::new(r"(?i)([a-z-]+)\s*:\s*([^;]+)").unwrap();
    static ref HEX_COLOR: Regex = Regex::new(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").unwrap();
    static ref RGB_COLOR: Regex =
        Regex::new(r"(?i)^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([\d.]+)\s*)?\)$").unwrap();
    static ref BORDER_SHORTHAND: Regex =
        Regex::new(r"(?i)(\d+)px\s+(solid|dashed|dotted|double)\s+(.+)").unwrap();
}

/// Declarations of one inline style attribute, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(style: &str) -> InlineStyle {
        let decls = DECLARATION
            .captures_iter(style)
            .map(|c| (c[1].to_ascii_lowercase(), c[2].trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        InlineStyle { decls }
    }

    /// First value for `property`.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Zero alpha means fully transparent.
    pub transparent: bool,
}

impl Rgb {
    /// Upper-case `RRGGBB`, the form OOXML expects.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

pub fn parse_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    if let Some(c) = HEX_COLOR.captures(s) {
        let hex = &c[1];
        let full: String = if hex.len() == 3 {
            hex.chars().flat_map(|ch| [ch, ch]).collect()
        } else {
            hex.to_string()
        };
        let v = u32::from_str_radix(&full, 16).ok()?;
        return Some(Rgb {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
            transparent: false,
        });
    }
    if let Some(c) = RGB_COLOR.captures(s) {
        let channel = |i: usize| c[i].parse::<u32>().ok().map(|v| v.min(255) as u8);
        let alpha = c.get(4).and_then(|a| a.as_str().parse::<f64>().ok());
        return Some(Rgb {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            transparent: alpha == Some(0.0),
        });
    }
    let named = match s.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        _ => return None,
    };
    Some(Rgb {
        r: named.0,
        g: named.1,
        b: named.2,
        transparent: false,
    })
}

fn is_default_black(color: &str) -> bool {
    let c = color.trim().to_ascii_lowercase().replace(' ', "");
    matches!(c.as_str(), "rgb(0,0,0)" | "#000000" | "#000" | "black")
}

fn is_transparent(color: &str) -> bool {
    let c = color.trim().to_ascii_lowercase().replace(' ', "");
    c == "transparent" || c == "rgba(0,0,0,0)"
}

/// Block-level (paragraph, heading, list item, image) user styles. Browser
/// defaults such as left alignment and black text are not promoted.
pub fn block_style(style: &InlineStyle) -> StyleDeclaration {
    let mut decl = StyleDeclaration::default();
    if let Some(align) = style.get("text-align") {
        match TextAlign::from_css(align) {
            Some(TextAlign::Left) | None => {}
            Some(a) => decl.text_align = Some(a),
        }
    }
    if let Some(color) = style.get("color") {
        if !is_default_black(color) {
            decl.color = Some(color.to_string());
        }
    }
    if let Some(lh) = style.get("line-height") {
        if let Ok(v) = lh.trim().parse::<f64>() {
            decl.line_height = Some(v);
        }
    }
    if let Some(indent) = style.get("text-indent") {
        decl.text_indent = Some(CssValue::Text(indent.to_string()));
    }
    if let Some(bg) = style.get("background-color") {
        if !is_transparent(bg) {
            decl.background_color = Some(bg.to_string());
        }
    }
    if let Some(v) = style.get("margin-top").and_then(units::length_to_pt) {
        decl.margin_top = Some(v.round() as i64);
    }
    if let Some(v) = style.get("margin-bottom").and_then(units::length_to_pt) {
        decl.margin_bottom = Some(v.round() as i64);
    }
    if let Some(w) = style.get("width") {
        if !w.eq_ignore_ascii_case("auto") {
            decl.width = Some(px_or_text(w));
        }
    }
    if let Some(h) = style.get("height") {
        if !h.eq_ignore_ascii_case("auto") {
            decl.height = Some(px_or_text(h));
        }
    }
    decl
}

/// `"120px"` → 120, anything else kept verbatim.
fn px_or_text(v: &str) -> CssValue {
    let t = v.trim();
    match t.strip_suffix("px").map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) => CssValue::Number(n),
        _ => CssValue::from_attr(t),
    }
}

/// Cell styles from the style attribute plus legacy `align`/`valign`/`bgcolor`.
pub fn cell_style(
    style: &InlineStyle,
    align_attr: Option<&str>,
    valign_attr: Option<&str>,
    bgcolor_attr: Option<&str>,
) -> StyleDeclaration {
    let mut decl = StyleDeclaration::default();
    if let Some(a) = style.get("text-align").or(align_attr) {
        match TextAlign::from_css(a) {
            Some(TextAlign::Left) | None => {}
            Some(a) => decl.text_align = Some(a),
        }
    }
    if let Some(v) = style.get("vertical-align").or(valign_attr) {
        decl.vertical_align = VerticalAlign::from_css(v);
    }
    if let Some(ff) = style.get("font-family") {
        decl.font_family = Some(ff.to_string());
    }
    if let Some(fs) = style.get("font-size").and_then(units::leading_number) {
        decl.font_size = Some(fs as i64);
    }
    if let Some(fw) = style.get("font-weight") {
        let fw = fw.trim();
        if fw != "normal" && fw != "400" {
            decl.font_weight = Some(CssValue::Text(fw.to_string()));
        }
    }
    if let Some(color) = style.get("color") {
        if !is_default_black(color) {
            decl.color = Some(color.to_string());
        }
    }
    let bg = style
        .get("background-color")
        .or_else(|| style.get("background"))
        .or(bgcolor_attr);
    if let Some(bg) = bg {
        if !is_transparent(bg) {
            decl.background_color = Some(bg.to_string());
        }
    }
    decl
}

/// Table-level styles: border shorthand, width, collapse and layout.
pub fn table_style(style: &InlineStyle) -> StyleDeclaration {
    let mut decl = StyleDeclaration::default();
    if let Some(border) = style.get("border") {
        if let Some(c) = BORDER_SHORTHAND.captures(border) {
            decl.border_width = c[1].parse().ok();
            decl.border_style = Some(c[2].to_ascii_lowercase());
            decl.border_color = Some(c[3].trim().to_string());
        }
    }
    if let Some(w) = style.get("width") {
        if !w.eq_ignore_ascii_case("auto") {
            decl.width = Some(px_or_text(w));
        }
    }
    decl.border_collapse = match style.get("border-collapse").map(str::to_ascii_lowercase).as_deref() {
        Some("collapse") => Some(BorderCollapse::Collapse),
        Some("separate") => Some(BorderCollapse::Separate),
        _ => None,
    };
    decl.table_layout = match style.get("table-layout").map(str::to_ascii_lowercase).as_deref() {
        Some("fixed") => Some(TableLayout::Fixed),
        Some("auto") => Some(TableLayout::Auto),
        _ => None,
    };
    decl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_and_background_color_are_distinct() {
        let s = InlineStyle::parse("background-color: yellow; color: #ff0000");
        assert_eq!(s.get("color"), Some("#ff0000"));
        assert_eq!(s.get("background-color"), Some("yellow"));

        let only_bg = InlineStyle::parse("background-color: yellow");
        assert_eq!(only_bg.get("color"), None);
    }

    #[test]
    fn parses_colors() {
        assert_eq!(parse_color("#FF8000").map(Rgb::to_hex).as_deref(), Some("FF8000"));
        assert_eq!(parse_color("#f00").map(Rgb::to_hex).as_deref(), Some("FF0000"));
        assert_eq!(
            parse_color("rgb(0, 128, 255)").map(Rgb::to_hex).as_deref(),
            Some("0080FF")
        );
        assert!(parse_color("rgba(0, 0, 0, 0)").unwrap().transparent);
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn block_style_drops_browser_defaults() {
        let s = InlineStyle::parse("text-align: left; color: rgb(0, 0, 0); line-height: 1.8");
        let d = block_style(&s);
        assert_eq!(d.text_align, None);
        assert_eq!(d.color, None);
        assert_eq!(d.line_height, Some(1.8));

        let s = InlineStyle::parse("text-align: center; color: #c00; text-indent: 2em; line-height: normal");
        let d = block_style(&s);
        assert_eq!(d.text_align, Some(TextAlign::Center));
        assert_eq!(d.color.as_deref(), Some("#c00"));
        assert_eq!(d.text_indent, Some(CssValue::Text("2em".into())));
        assert_eq!(d.line_height, None);
    }

    #[test]
    fn cell_style_reads_legacy_attributes() {
        let s = InlineStyle::parse("font-size: 14px; font-weight: normal");
        let d = cell_style(&s, Some("center"), Some("baseline"), Some("#eee"));
        assert_eq!(d.text_align, Some(TextAlign::Center));
        assert_eq!(d.vertical_align, None);
        assert_eq!(d.font_size, Some(14));
        assert_eq!(d.font_weight, None);
        assert_eq!(d.background_color.as_deref(), Some("#eee"));
    }

    #[test]
    fn table_border_shorthand() {
        let s = InlineStyle::parse("border: 2px dashed #999; width: 600px; table-layout: fixed");
        let d = table_style(&s);
        assert_eq!(d.border_width, Some(2));
        assert_eq!(d.border_style.as_deref(), Some("dashed"));
        assert_eq!(d.border_color.as_deref(), Some("#999"));
        assert_eq!(d.width, Some(CssValue::Number(600)));
        assert_eq!(d.table_layout, Some(TableLayout::Fixed));
    }
}
