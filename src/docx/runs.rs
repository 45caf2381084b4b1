//! Paragraph and run property builders for the document body.

use super::xml::{check_text, escape, word_color};
use crate::error::BlockError;
use crate::marks::{resegment, StyledRun};
use crate::model::{Mark, SimpleMarkName, ValueMarkName};
use crate::style::{StyleDeclaration, TextAlign, VerticalAlign};
use crate::units::{font_size_to_pt, length_to_pt, pt_to_half_points, pt_to_twips};

pub const INLINE_CODE_FONT: &str = "Consolas";

/// Properties every run of a paragraph starts from before marks apply.
#[derive(Debug, Clone, Default)]
pub struct RunDefaults {
    pub font: Option<String>,
    pub half_points: Option<i64>,
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
}

fn rfonts(font: &str) -> String {
    let f = escape(font);
    format!("<w:rFonts w:ascii=\"{f}\" w:hAnsi=\"{f}\" w:eastAsia=\"{f}\" w:cs=\"{f}\"/>")
}

/// `<w:rPr>` for one styled run, elements in schema order.
pub fn run_properties(run: Option<&StyledRun>, defaults: &RunDefaults) -> String {
    let has = |n: SimpleMarkName| run.is_some_and(|r| r.has(n));
    let value = |n: ValueMarkName| run.and_then(|r| r.value(n));

    let mut out = String::new();
    if run.is_some_and(|r| r.link.is_some()) {
        out.push_str("<w:rStyle w:val=\"Hyperlink\"/>");
    }
    let font = if has(SimpleMarkName::Code) {
        Some(INLINE_CODE_FONT.to_string())
    } else {
        value(ValueMarkName::FontFamily)
            .map(|f| f.trim_matches(|c| c == '"' || c == '\'').to_string())
            .or_else(|| defaults.font.clone())
    };
    if let Some(font) = font {
        out.push_str(&rfonts(&font));
    }
    if has(SimpleMarkName::Bold) || defaults.bold {
        out.push_str("<w:b/>");
    }
    if has(SimpleMarkName::Italic) || defaults.italic {
        out.push_str("<w:i/>");
    }
    if has(SimpleMarkName::Strike) {
        out.push_str("<w:strike/>");
    }
    let color = value(ValueMarkName::Color)
        .and_then(word_color)
        .or_else(|| defaults.color.clone());
    if let Some(color) = color {
        out.push_str(&format!("<w:color w:val=\"{color}\"/>"));
    }
    let size = value(ValueMarkName::FontSize)
        .and_then(font_size_to_pt)
        .map(pt_to_half_points)
        .or(defaults.half_points);
    if let Some(sz) = size {
        out.push_str(&format!("<w:sz w:val=\"{sz}\"/><w:szCs w:val=\"{sz}\"/>"));
    }
    if has(SimpleMarkName::Underline) {
        out.push_str("<w:u w:val=\"single\"/>");
    }
    if let Some(fill) = value(ValueMarkName::BackgroundColor).and_then(word_color) {
        out.push_str(&format!("<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"));
    }
    if has(SimpleMarkName::Superscript) {
        out.push_str("<w:vertAlign w:val=\"superscript\"/>");
    } else if has(SimpleMarkName::Subscript) {
        out.push_str("<w:vertAlign w:val=\"subscript\"/>");
    }
    if out.is_empty() {
        out
    } else {
        format!("<w:rPr>{out}</w:rPr>")
    }
}

/// One `<w:r>`; line feeds become `<w:br/>`.
pub fn text_run(text: &str, rpr: &str) -> String {
    let mut out = format!("<w:r>{rpr}");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        if !line.is_empty() {
            out.push_str(&format!("<w:t xml:space=\"preserve\">{}</w:t>", escape(line)));
        }
    }
    out.push_str("</w:r>");
    out
}

/// Runs for marked text. Consecutive runs sharing a link go into one
/// `<w:hyperlink>`; `link_rel` allocates the relationship id for an href.
pub fn marked_runs(
    text: &str,
    marks: &[Mark],
    defaults: &RunDefaults,
    link_rel: &mut dyn FnMut(&str) -> String,
) -> Result<String, BlockError> {
    check_text(text)?;
    let mut out = String::new();
    let mut open_link: Option<String> = None;
    for run in resegment(text, marks) {
        if open_link.is_some() && open_link != run.link {
            out.push_str("</w:hyperlink>");
            open_link = None;
        }
        if open_link.is_none() {
            if let Some(href) = &run.link {
                out.push_str(&format!("<w:hyperlink r:id=\"{}\">", link_rel(href)));
                open_link = Some(href.clone());
            }
        }
        out.push_str(&text_run(&run.text, &run_properties(Some(&run), defaults)));
    }
    if open_link.is_some() {
        out.push_str("</w:hyperlink>");
    }
    Ok(out)
}

/// `<w:pPr>` contents. Lengths are twips.
#[derive(Debug, Clone, Default)]
pub struct ParagraphProps {
    pub style: Option<String>,
    pub num: Option<(u32, u32)>,
    pub border_bottom: bool,
    pub shading: Option<String>,
    pub before: Option<i64>,
    pub after: Option<i64>,
    /// Line spacing in 240ths of a line.
    pub line: Option<i64>,
    pub ind_left: Option<i64>,
    pub ind_right: Option<i64>,
    pub first_line: Option<i64>,
    pub jc: Option<&'static str>,
}

pub const DEFAULT_LINE: i64 = 360;

fn jc_value(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
        TextAlign::Justify => "both",
    }
}

pub fn vertical_align_value(align: VerticalAlign) -> &'static str {
    match align {
        VerticalAlign::Top => "top",
        VerticalAlign::Middle => "center",
        VerticalAlign::Bottom => "bottom",
    }
}

impl ParagraphProps {
    /// Paragraph-level properties of a block declaration. Color stays with
    /// the runs (see [`RunDefaults`]).
    pub fn from_declaration(decl: Option<&StyleDeclaration>) -> Self {
        let mut props = ParagraphProps {
            line: Some(DEFAULT_LINE),
            ..Default::default()
        };
        let Some(decl) = decl else {
            return props;
        };
        props.jc = decl.text_align.map(jc_value);
        if let Some(lh) = decl.line_height.filter(|v| *v > 0.0) {
            props.line = Some((lh * 240.0).round() as i64);
        }
        props.first_line = decl
            .text_indent
            .as_ref()
            .and_then(|v| length_to_pt(&v.as_css_px()))
            .map(pt_to_twips);
        props.before = decl.margin_top.map(|v| pt_to_twips(v as f64));
        props.after = decl.margin_bottom.map(|v| pt_to_twips(v as f64));
        props.ind_left = decl.padding_left.map(|v| pt_to_twips(v as f64));
        props.ind_right = decl.padding_right.map(|v| pt_to_twips(v as f64));
        props.shading = decl.background_color.as_deref().and_then(word_color);
        props
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(style) = &self.style {
            out.push_str(&format!("<w:pStyle w:val=\"{}\"/>", escape(style)));
        }
        if let Some((num_id, ilvl)) = self.num {
            out.push_str(&format!(
                "<w:numPr><w:ilvl w:val=\"{ilvl}\"/><w:numId w:val=\"{num_id}\"/></w:numPr>"
            ));
        }
        if self.border_bottom {
            out.push_str("<w:pBdr><w:bottom w:val=\"single\" w:sz=\"6\" w:space=\"1\" w:color=\"000000\"/></w:pBdr>");
        }
        if let Some(fill) = &self.shading {
            out.push_str(&format!("<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"));
        }
        let mut spacing = String::new();
        if let Some(v) = self.before {
            spacing.push_str(&format!(" w:before=\"{v}\""));
        }
        if let Some(v) = self.after {
            spacing.push_str(&format!(" w:after=\"{v}\""));
        }
        if let Some(line) = self.line {
            spacing.push_str(&format!(" w:line=\"{line}\" w:lineRule=\"auto\""));
        }
        if !spacing.is_empty() {
            out.push_str(&format!("<w:spacing{spacing}/>"));
        }
        let mut ind = String::new();
        if let Some(v) = self.ind_left {
            ind.push_str(&format!(" w:left=\"{v}\""));
        }
        if let Some(v) = self.ind_right {
            ind.push_str(&format!(" w:right=\"{v}\""));
        }
        match self.first_line {
            Some(v) if v < 0 => ind.push_str(&format!(" w:hanging=\"{}\"", -v)),
            Some(v) => ind.push_str(&format!(" w:firstLine=\"{v}\"")),
            None => {}
        }
        if !ind.is_empty() {
            out.push_str(&format!("<w:ind{ind}/>"));
        }
        if let Some(jc) = self.jc {
            out.push_str(&format!("<w:jc w:val=\"{jc}\"/>"));
        }
        if out.is_empty() {
            out
        } else {
            format!("<w:pPr>{out}</w:pPr>")
        }
    }
}
