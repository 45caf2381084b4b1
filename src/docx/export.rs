//! Content + StyleSheet + settings → `.docx` bytes.
//!
//! Every block is written independently: a block that cannot be converted is
//! logged and replaced by a red placeholder paragraph, and a failed image
//! becomes a gray italic note. Validation and settings errors abort before
//! the first block.

use super::image::{display_size, DefaultImageResolver, ImageResolver, LoadedImage};
use super::numbering::{HeadingNumbering, NumberingPart, BULLET_NUM_ID, HEADING_NUM_ID};
use super::package::{styles_xml, Media, Package, Relationships};
use super::runs::{
    marked_runs, run_properties, text_run, vertical_align_value, ParagraphProps, RunDefaults,
};
use super::xml::{check_text, escape, word_color, NS_A, NS_PIC, NS_R, NS_W, NS_WP, XML_DECL};
use crate::error::{BlockError, Result};
use crate::model::{
    Block, CodeBlock, Content, HeadingBlock, ImageBlock, ListType, ParagraphBlock, StyleSheet,
    TableBlock,
};
use crate::settings::{DocumentSettings, DEFAULT_FONT};
use crate::style::{CssValue, StyleDeclaration, TableLayout, TextAlign};
use crate::style_index::StyleIndex;
use crate::table::{Slot, TableGeometry};
use crate::units::{
    cm_to_twips, pt_to_eighth_points, pt_to_half_points, pt_to_twips, px_to_emu, px_to_twips, Length,
    Unit, PT_PER_PX,
};
use log::{debug, error, info, warn};

/// US Letter in twips.
pub const PAGE_WIDTH: i64 = 12240;
pub const PAGE_HEIGHT: i64 = 15840;

const BODY_HALF_POINTS: i64 = 24;
const CODE_FONT: &str = "Courier New";
const CODE_HALF_POINTS: i64 = 20;
const CODE_SHADING: &str = "F5F5F5";
const HEADER_SHADING: &str = "F2F2F2";
const PLACEHOLDER_GRAY: &str = "808080";
const ERROR_RED: &str = "FF0000";
const TWIPS_PER_PX: f64 = 15.0;

/// Exports with the default image resolver (data URIs, http, local paths).
pub fn export_docx(
    content: &Content,
    sheet: &StyleSheet,
    settings: Option<&DocumentSettings>,
) -> Result<Vec<u8>> {
    export_docx_with(content, sheet, settings, &DefaultImageResolver::default())
}

pub fn export_docx_with(
    content: &Content,
    sheet: &StyleSheet,
    settings: Option<&DocumentSettings>,
    resolver: &dyn ImageResolver,
) -> Result<Vec<u8>> {
    content.validate()?;
    let defaults = DocumentSettings::default();
    let settings = settings.unwrap_or(&defaults);
    settings.validate()?;

    let mut writer = DocxWriter::new(sheet, settings, resolver);
    for block in &content.blocks {
        writer.write_block(block);
    }
    info!(
        "exported {} blocks ({} images, {} failed)",
        content.blocks.len(),
        writer.media.len(),
        writer.failures
    );
    writer.finish()
}

struct DocxWriter<'a> {
    index: StyleIndex,
    settings: &'a DocumentSettings,
    resolver: &'a dyn ImageResolver,
    numbering: HeadingNumbering,
    lists: NumberingPart,
    ordered_num: Option<u32>,
    rels: Relationships,
    media: Media,
    body: String,
    drawing_id: u32,
    failures: usize,
}

impl<'a> DocxWriter<'a> {
    fn new(sheet: &StyleSheet, settings: &'a DocumentSettings, resolver: &'a dyn ImageResolver) -> Self {
        let numbering = HeadingNumbering::from_settings(settings.heading_numbering_style.as_ref());
        let heading_preset = match &numbering {
            HeadingNumbering::Native { preset } => Some(preset.clone()),
            _ => None,
        };
        DocxWriter {
            index: StyleIndex::build(sheet),
            settings,
            resolver,
            numbering,
            lists: NumberingPart::new(heading_preset),
            ordered_num: None,
            rels: Relationships::default(),
            media: Media::default(),
            body: String::new(),
            drawing_id: 0,
            failures: 0,
        }
    }

    fn text_width_twips(&self) -> i64 {
        let margins = cm_to_twips(self.settings.margin_left) + cm_to_twips(self.settings.margin_right);
        (PAGE_WIDTH - margins).max(1440)
    }

    fn write_block(&mut self, block: &Block) {
        if !matches!(block, Block::Paragraph(p) if p.attrs.as_ref().and_then(|a| a.list()).is_some()) {
            self.ordered_num = None;
        }
        let result = match block {
            Block::Paragraph(p) => self.paragraph(p),
            Block::Heading(h) => self.heading(h),
            Block::Image(img) => Ok(self.image(img)),
            Block::Table(t) => self.table(t),
            Block::Code(c) => self.code(c),
            Block::Divider(_) => Ok(divider_xml()),
        };
        match result {
            Ok(xml) => self.body.push_str(&xml),
            Err(e) => {
                error!("failed to export {} block {}: {e}", block.type_name(), block.id());
                self.failures += 1;
                self.body.push_str(&placeholder_paragraph(
                    &format!("[导出错误: {}]", block.type_name()),
                    ERROR_RED,
                    false,
                ));
            }
        }
    }

    fn runs(&mut self, text: &str, marks: &[crate::model::Mark], defaults: &RunDefaults) -> std::result::Result<String, BlockError> {
        let rels = &mut self.rels;
        marked_runs(text, marks, defaults, &mut |href| rels.hyperlink(href))
    }

    fn body_defaults(decl: Option<&StyleDeclaration>) -> RunDefaults {
        RunDefaults {
            font: Some(DEFAULT_FONT.to_string()),
            half_points: Some(BODY_HALF_POINTS),
            color: decl.and_then(|d| d.color.as_deref()).and_then(word_color),
            ..Default::default()
        }
    }

    fn paragraph(&mut self, p: &ParagraphBlock) -> std::result::Result<String, BlockError> {
        let decl = self.index.block(&p.id).cloned();
        let mut props = ParagraphProps::from_declaration(decl.as_ref());
        if let Some((kind, level)) = p.attrs.as_ref().and_then(|a| a.list()) {
            let num_id = match kind {
                ListType::Ordered => match self.ordered_num {
                    Some(id) => id,
                    None => {
                        let start = p.attrs.as_ref().and_then(|a| a.list_start).unwrap_or(1);
                        let id = self.lists.ordered_instance(start);
                        self.ordered_num = Some(id);
                        id
                    }
                },
                _ => {
                    if level == 0 {
                        self.ordered_num = None;
                    }
                    BULLET_NUM_ID
                }
            };
            props.num = Some((num_id, level.min(8)));
        }
        let runs = self.runs(&p.text, &p.marks, &Self::body_defaults(decl.as_ref()))?;
        Ok(format!("<w:p>{}{runs}</w:p>", props.to_xml()))
    }

    /// Heading runs carry no font or size so the HeadingN template applies;
    /// only author marks add run-level overrides.
    fn heading(&mut self, h: &HeadingBlock) -> std::result::Result<String, BlockError> {
        check_text(&h.text)?;
        let level = h.level.clamp(1, 6);
        let decl = self.index.block(&h.id).cloned();
        let mut props = ParagraphProps::from_declaration(decl.as_ref());
        props.style = Some(format!("Heading{level}"));
        // The HeadingN template owns spacing unless the block sets a line height.
        if !decl.as_ref().and_then(|d| d.line_height).is_some_and(|v| v > 0.0) {
            props.line = None;
        }
        let mut prefix = String::new();
        match &mut self.numbering {
            HeadingNumbering::Text(numbering) => prefix = numbering.prefix(level),
            HeadingNumbering::Native { .. } => props.num = Some((HEADING_NUM_ID, u32::from(level) - 1)),
            HeadingNumbering::Off => {}
        }
        let defaults = RunDefaults {
            color: decl.as_ref().and_then(|d| d.color.as_deref()).and_then(word_color),
            ..Default::default()
        };
        let mut xml = format!("<w:p>{}", props.to_xml());
        if !prefix.is_empty() {
            xml.push_str(&text_run(&prefix, ""));
        }
        xml.push_str(&self.runs(&h.text, &h.marks, &defaults)?);
        xml.push_str("</w:p>");
        Ok(xml)
    }

    fn image(&mut self, img: &ImageBlock) -> String {
        let loaded = self
            .resolver
            .resolve(&img.src)
            .and_then(LoadedImage::from_bytes);
        let loaded = match loaded {
            Ok(l) => l,
            Err(e) => {
                let short: String = img.src.chars().take(50).collect();
                warn!("image {} could not be loaded: {e}", img.id);
                return placeholder_paragraph(
                    &format!("[图片加载失败: {short}...]"),
                    PLACEHOLDER_GRAY,
                    true,
                );
            }
        };
        let max_px = self.text_width_twips() as f64 / TWIPS_PER_PX;
        let (w, h) = display_size(img.meta.as_ref(), (loaded.width, loaded.height), max_px);
        let (cx, cy) = (px_to_emu(w), px_to_emu(h));

        let (ext, content_type) = (loaded.extension(), loaded.content_type());
        let media_name = self.media.add(loaded.bytes, ext, content_type);
        let rid = self.rels.image(&media_name);
        self.drawing_id += 1;
        let id = self.drawing_id;
        let alt = img
            .meta
            .as_ref()
            .and_then(|m| m.alt.as_deref())
            .unwrap_or("");

        let props = ParagraphProps {
            jc: Some(match self.index.block(&img.id).and_then(|d| d.text_align) {
                Some(TextAlign::Left) => "left",
                Some(TextAlign::Right) => "right",
                _ => "center",
            }),
            ..Default::default()
        };
        format!(
            "<w:p>{}<w:r><w:drawing><wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
<wp:extent cx=\"{cx}\" cy=\"{cy}\"/><wp:docPr id=\"{id}\" name=\"Picture {id}\" descr=\"{alt}\"/>\
<a:graphic xmlns:a=\"{NS_A}\"><a:graphicData uri=\"{NS_PIC}\"><pic:pic xmlns:pic=\"{NS_PIC}\">\
<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"{media_name}\"/><pic:cNvPicPr/></pic:nvPicPr>\
<pic:blipFill><a:blip r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>\
<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>",
            props.to_xml(),
            alt = escape(alt),
        )
    }

    fn code(&mut self, code: &CodeBlock) -> std::result::Result<String, BlockError> {
        check_text(&code.text)?;
        let mut xml = String::new();
        if let Some(lang) = code.language.as_deref().filter(|l| !l.is_empty()) {
            check_text(lang)?;
            let label = RunDefaults {
                half_points: Some(18),
                color: Some(PLACEHOLDER_GRAY.to_string()),
                ..Default::default()
            };
            xml.push_str(&format!(
                "<w:p>{}</w:p>",
                text_run(&format!("[{lang}]"), &run_properties(None, &label))
            ));
        }
        let props = ParagraphProps {
            shading: Some(CODE_SHADING.to_string()),
            before: Some(0),
            after: Some(0),
            ..Default::default()
        };
        let rpr = run_properties(
            None,
            &RunDefaults {
                font: Some(CODE_FONT.to_string()),
                half_points: Some(CODE_HALF_POINTS),
                ..Default::default()
            },
        );
        xml.push_str(&format!("<w:p>{}{}</w:p>", props.to_xml(), text_run(&code.text, &rpr)));
        Ok(xml)
    }

    fn column_widths(&self, table: &TableBlock) -> Vec<i64> {
        let cols = table.data.cols.max(1);
        let total = self.text_width_twips();
        let explicit: Vec<Option<i64>> = (0..cols)
            .map(|c| {
                self.index
                    .column_width(&table.id, c)
                    .and_then(|w| css_width_twips(w, total))
            })
            .collect();
        let used: i64 = explicit.iter().flatten().sum();
        let missing = explicit.iter().filter(|w| w.is_none()).count() as i64;
        let fill = if missing > 0 {
            ((total - used).max(missing * 360)) / missing
        } else {
            0
        };
        explicit.into_iter().map(|w| w.unwrap_or(fill)).collect()
    }

    fn table(&mut self, table: &TableBlock) -> std::result::Result<String, BlockError> {
        let data = &table.data;
        if data.rows == 0 || data.cols == 0 {
            warn!("table {} has an empty grid; skipped", table.id);
            return Ok(String::new());
        }
        let geometry = TableGeometry::new(data);
        let widths = self.column_widths(table);
        let table_decl = self.index.block(&table.id).cloned();

        let mut xml = String::from("<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/>");
        match table_decl
            .as_ref()
            .and_then(|d| d.width.as_ref())
            .and_then(|w| css_width_twips(w, self.text_width_twips()))
        {
            Some(w) => xml.push_str(&format!("<w:tblW w:w=\"{w}\" w:type=\"dxa\"/>")),
            None => xml.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>"),
        }
        if let Some(borders) = table_decl.as_ref().and_then(table_borders) {
            xml.push_str(&borders);
        }
        if table_decl.as_ref().and_then(|d| d.table_layout) == Some(TableLayout::Fixed) {
            xml.push_str("<w:tblLayout w:type=\"fixed\"/>");
        }
        xml.push_str("</w:tblPr><w:tblGrid>");
        for w in &widths {
            xml.push_str(&format!("<w:gridCol w:w=\"{w}\"/>"));
        }
        xml.push_str("</w:tblGrid>");

        for r in 0..data.rows {
            xml.push_str("<w:tr>");
            for c in 0..data.cols {
                match geometry.slot(r, c) {
                    Slot::Master { rowspan, colspan } => {
                        let width: i64 = widths[c..(c + colspan).min(widths.len())].iter().sum();
                        let cell_xml = self.table_cell(table, &geometry, r, c, rowspan, colspan, width)?;
                        xml.push_str(&cell_xml);
                    }
                    Slot::Covered { master } if master.0 < r && master.1 == c => {
                        let Slot::Master { colspan, .. } = geometry.slot(master.0, master.1) else {
                            continue;
                        };
                        let width: i64 = widths[c..(c + colspan).min(widths.len())].iter().sum();
                        let span = if colspan > 1 {
                            format!("<w:gridSpan w:val=\"{colspan}\"/>")
                        } else {
                            String::new()
                        };
                        xml.push_str(&format!(
                            "<w:tc><w:tcPr><w:tcW w:w=\"{width}\" w:type=\"dxa\"/>{span}<w:vMerge/></w:tcPr><w:p/></w:tc>"
                        ));
                    }
                    Slot::Covered { .. } => {}
                }
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl><w:p/>");
        Ok(xml)
    }

    #[allow(clippy::too_many_arguments)]
    fn table_cell(
        &mut self,
        table: &TableBlock,
        geometry: &TableGeometry,
        r: usize,
        c: usize,
        rowspan: usize,
        colspan: usize,
        width: i64,
    ) -> std::result::Result<String, BlockError> {
        let cell = geometry.cell(&table.data, r, c);
        let decl = cell
            .and_then(|cell| cell.style_id.as_deref())
            .and_then(|id| self.index.block(id))
            .cloned()
            .unwrap_or_default();
        let header = r == 0;

        let mut tc_pr = format!("<w:tcW w:w=\"{width}\" w:type=\"dxa\"/>");
        if colspan > 1 {
            tc_pr.push_str(&format!("<w:gridSpan w:val=\"{colspan}\"/>"));
        }
        if rowspan > 1 {
            tc_pr.push_str("<w:vMerge w:val=\"restart\"/>");
        }
        if let Some(borders) = cell_borders(&decl) {
            tc_pr.push_str(&borders);
        }
        let fill = decl
            .background_color
            .as_deref()
            .and_then(word_color)
            .or_else(|| header.then(|| HEADER_SHADING.to_string()));
        if let Some(fill) = fill {
            tc_pr.push_str(&format!("<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"));
        }
        if let Some(v) = decl.vertical_align {
            tc_pr.push_str(&format!("<w:vAlign w:val=\"{}\"/>", vertical_align_value(v)));
        }

        let props = ParagraphProps {
            jc: match decl.text_align {
                Some(TextAlign::Left) => Some("left"),
                Some(TextAlign::Center) => Some("center"),
                Some(TextAlign::Right) => Some("right"),
                Some(TextAlign::Justify) => Some("both"),
                None if header => Some("center"),
                None => None,
            },
            ..Default::default()
        };
        let defaults = RunDefaults {
            font: decl
                .font_family
                .clone()
                .or_else(|| Some(DEFAULT_FONT.to_string())),
            half_points: decl
                .font_size
                .map(|px| pt_to_half_points(px as f64 * PT_PER_PX))
                .or(Some(BODY_HALF_POINTS)),
            color: decl.color.as_deref().and_then(word_color),
            bold: header || decl.is_bold(),
            italic: false,
        };
        let runs = match cell {
            Some(cell) => self.runs(&cell.content.text, &cell.content.marks, &defaults)?,
            None => String::new(),
        };
        Ok(format!(
            "<w:tc><w:tcPr>{tc_pr}</w:tcPr><w:p>{}{runs}</w:p></w:tc>",
            props.to_xml()
        ))
    }

    fn finish(self) -> Result<Vec<u8>> {
        let s = self.settings;
        let document = format!(
            "{XML_DECL}\n<w:document xmlns:w=\"{NS_W}\" xmlns:r=\"{NS_R}\" xmlns:wp=\"{NS_WP}\" xmlns:a=\"{NS_A}\" xmlns:pic=\"{NS_PIC}\"><w:body>{}\
<w:sectPr><w:pgSz w:w=\"{PAGE_WIDTH}\" w:h=\"{PAGE_HEIGHT}\"/>\
<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"708\" w:footer=\"708\" w:gutter=\"0\"/>\
<w:cols w:space=\"708\"/><w:docGrid w:linePitch=\"360\"/></w:sectPr></w:body></w:document>",
            self.body,
            cm_to_twips(s.margin_top),
            cm_to_twips(s.margin_right),
            cm_to_twips(s.margin_bottom),
            cm_to_twips(s.margin_left),
        );
        debug!("document.xml is {} bytes", document.len());
        Package {
            document,
            styles: styles_xml(s, self.numbering.is_native()),
            numbering: self.lists.to_xml(),
            relationships: &self.rels,
            media: &self.media,
        }
        .write()
    }
}

fn divider_xml() -> String {
    let props = ParagraphProps {
        border_bottom: true,
        before: Some(120),
        after: Some(120),
        ..Default::default()
    };
    format!("<w:p>{}</w:p>", props.to_xml())
}

fn placeholder_paragraph(text: &str, color: &str, italic: bool) -> String {
    let rpr = run_properties(
        None,
        &RunDefaults {
            color: Some(color.to_string()),
            italic,
            ..Default::default()
        },
    );
    format!("<w:p>{}</w:p>", text_run(text, &rpr))
}

/// Column and table widths: bare numbers are px, percentages are relative to
/// the text width, other units convert through points.
fn css_width_twips(value: &CssValue, total: i64) -> Option<i64> {
    let twips = match value {
        CssValue::Number(px) => px_to_twips(*px as f64),
        CssValue::Text(s) => {
            let len = Length::parse(s)?;
            match len.unit {
                Unit::Bare | Unit::Px => px_to_twips(len.value),
                Unit::Percent => (total as f64 * len.value / 100.0).round() as i64,
                _ => pt_to_twips(len.to_pt()?),
            }
        }
    };
    (twips > 0).then_some(twips)
}

fn border_value(style: Option<&str>) -> &'static str {
    match style.map(str::to_ascii_lowercase).as_deref() {
        Some("dashed") => "dashed",
        Some("dotted") => "dotted",
        Some("double") => "double",
        Some("none") | Some("hidden") => "nil",
        _ => "single",
    }
}

fn table_borders(decl: &StyleDeclaration) -> Option<String> {
    let width_px = decl.border_width?;
    let sz = pt_to_eighth_points(width_px as f64 * PT_PER_PX);
    let val = border_value(decl.border_style.as_deref());
    let color = decl
        .border_color
        .as_deref()
        .and_then(word_color)
        .unwrap_or_else(|| "auto".to_string());
    let sides: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|side| format!("<w:{side} w:val=\"{val}\" w:sz=\"{sz}\" w:space=\"0\" w:color=\"{color}\"/>"))
        .collect();
    Some(format!("<w:tblBorders>{sides}</w:tblBorders>"))
}

/// Per-side cell borders; widths are points.
fn cell_borders(decl: &StyleDeclaration) -> Option<String> {
    let sides = [
        ("top", decl.border_top_width, &decl.border_top_style, &decl.border_top_color),
        ("left", decl.border_left_width, &decl.border_left_style, &decl.border_left_color),
        ("bottom", decl.border_bottom_width, &decl.border_bottom_style, &decl.border_bottom_color),
        ("right", decl.border_right_width, &decl.border_right_style, &decl.border_right_color),
    ];
    let mut out = String::new();
    for (side, width, style, color) in sides {
        if width.is_none() && style.is_none() && color.is_none() {
            continue;
        }
        let sz = pt_to_eighth_points(width.unwrap_or(1) as f64);
        let color = color
            .as_deref()
            .and_then(word_color)
            .unwrap_or_else(|| "auto".to_string());
        out.push_str(&format!(
            "<w:{side} w:val=\"{}\" w:sz=\"{sz}\" w:space=\"0\" w:color=\"{color}\"/>",
            border_value(style.as_deref())
        ));
    }
    (!out.is_empty()).then(|| format!("<w:tcBorders>{out}</w:tcBorders>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, ErrorKind};
    use crate::model::{
        CellContent, DividerBlock, Mark, MergeRegion, ParagraphAttrs, SimpleMarkName, TableCell,
        TableData, ValueMarkName,
    };
    use crate::settings::HeadingNumberingStyle;
    use std::io::{Cursor, Read};

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    fn para(id: &str, text: &str) -> Block {
        Block::Paragraph(ParagraphBlock {
            id: id.into(),
            text: text.into(),
            marks: vec![],
            attrs: None,
        })
    }

    fn heading(id: &str, text: &str, level: u8, marks: Vec<Mark>) -> Block {
        Block::Heading(HeadingBlock {
            id: id.into(),
            text: text.into(),
            level,
            marks,
            attrs: None,
        })
    }

    fn ordered(id: &str, start: Option<u32>) -> Block {
        Block::Paragraph(ParagraphBlock {
            id: id.into(),
            text: id.into(),
            marks: vec![],
            attrs: Some(ParagraphAttrs {
                list_type: Some(ListType::Ordered),
                list_level: Some(0),
                list_start: start,
            }),
        })
    }

    fn export(blocks: Vec<Block>, settings: Option<&DocumentSettings>) -> Vec<u8> {
        export_docx(&Content::new(blocks), &StyleSheet::default(), settings).unwrap()
    }

    #[test]
    fn heading_override_runs_inherit_template_font() {
        let marks = vec![
            Mark::simple(0, 3, SimpleMarkName::Bold),
            Mark::value(0, 3, ValueMarkName::Color, "#ff0000"),
        ];
        let bytes = export(vec![heading("h", "Red title", 1, marks)], None);
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(doc.contains(
            "<w:r><w:rPr><w:b/><w:color w:val=\"FF0000\"/></w:rPr><w:t xml:space=\"preserve\">Red</w:t></w:r>"
        ));
        assert!(doc.contains("<w:r><w:t xml:space=\"preserve\"> title</w:t></w:r>"));
        assert!(!doc.contains("rFonts"));
        let styles = part(&bytes, "word/styles.xml");
        assert!(styles.contains("w:styleId=\"Heading1\""));
        assert!(styles.contains("<w:sz w:val=\"44\"/>"));
    }

    #[test]
    fn headings_keep_template_spacing_unless_styled() {
        let mut sheet = StyleSheet::default();
        sheet.rules.push(crate::model::StyleRule::for_block(
            crate::style::TargetBlockType::Heading,
            "styled",
            StyleDeclaration {
                line_height: Some(2.0),
                ..Default::default()
            },
        ));
        let content = Content::new(vec![
            heading("plain", "Plain", 1, vec![]),
            heading("styled", "Styled", 2, vec![]),
        ]);
        let doc = part(&export_docx(&content, &sheet, None).unwrap(), "word/document.xml");
        assert!(doc.contains("<w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr>"));
        assert!(!doc.contains("w:line=\"360\""));
        assert!(doc.contains("<w:spacing w:line=\"480\" w:lineRule=\"auto\"/>"));
    }

    #[test]
    fn paragraphs_stamp_default_font_and_size() {
        let doc = part(&export(vec![para("p", "body")], None), "word/document.xml");
        assert!(doc.contains("w:eastAsia=\"Microsoft YaHei\""));
        assert!(doc.contains("<w:sz w:val=\"24\"/>"));
        assert!(doc.contains("<w:spacing w:line=\"360\" w:lineRule=\"auto\"/>"));
    }

    #[test]
    fn failing_block_becomes_placeholder_and_export_continues() {
        let bytes = export(vec![para("bad", "bell\u{7}"), para("good", "still here")], None);
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("[导出错误: paragraph]"));
        assert!(doc.contains("<w:color w:val=\"FF0000\"/>"));
        assert!(doc.contains("still here"));
    }

    #[test]
    fn unloadable_image_becomes_gray_note() {
        let src = format!("/nowhere/{}.png", "x".repeat(60));
        let bytes = export(
            vec![Block::Image(ImageBlock {
                id: "img".into(),
                src: src.clone(),
                meta: None,
            })],
            None,
        );
        let doc = part(&bytes, "word/document.xml");
        let short: String = src.chars().take(50).collect();
        assert!(doc.contains(&format!("[图片加载失败: {short}...]")));
        assert!(doc.contains("<w:i/><w:color w:val=\"808080\"/>"));
    }

    #[test]
    fn data_uri_image_is_embedded() {
        let src = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let bytes = export(
            vec![Block::Image(ImageBlock {
                id: "img".into(),
                src: src.into(),
                meta: None,
            })],
            None,
        );
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("<a:blip r:embed=\"rId10\"/>"));
        assert!(doc.contains("<wp:extent cx=\"9525\" cy=\"9525\"/>"));
        let rels = part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains("Target=\"media/image1.png\""));
        let mut archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        assert!(archive.by_name("word/media/image1.png").unwrap().size() > 0);
    }

    #[test]
    fn text_prefix_numbering_counts_per_export() {
        let settings = DocumentSettings {
            heading_numbering_style: Some(HeadingNumberingStyle {
                enabled: true,
                style: Some("style2".into()),
                formats: None,
                use_auto_numbering: false,
            }),
            ..Default::default()
        };
        let blocks = vec![
            heading("a", "A", 1, vec![]),
            heading("b", "B", 2, vec![]),
            heading("c", "C", 2, vec![]),
            heading("d", "D", 1, vec![]),
        ];
        for _ in 0..2 {
            let doc = part(&export(blocks.clone(), Some(&settings)), "word/document.xml");
            for prefix in ["1、", "1.1 ", "1.2 ", "2、"] {
                assert!(doc.contains(&format!(">{prefix}</w:t>")), "missing {prefix}");
            }
        }
    }

    #[test]
    fn native_numbering_attaches_heading_list() {
        let settings = DocumentSettings {
            heading_numbering_style: Some(HeadingNumberingStyle {
                enabled: true,
                style: Some("style1".into()),
                formats: None,
                use_auto_numbering: true,
            }),
            ..Default::default()
        };
        let bytes = export(vec![heading("a", "A", 2, vec![])], Some(&settings));
        let doc = part(&bytes, "word/document.xml");
        assert!(doc.contains("<w:numPr><w:ilvl w:val=\"1\"/><w:numId w:val=\"2\"/></w:numPr>"));
        assert!(part(&bytes, "word/numbering.xml").contains("chineseCounting"));
    }

    #[test]
    fn ordered_lists_restart_after_interruption() {
        let bytes = export(
            vec![
                ordered("a", None),
                ordered("b", None),
                para("p", "break"),
                ordered("c", Some(4)),
            ],
            None,
        );
        let doc = part(&bytes, "word/document.xml");
        assert_eq!(doc.matches("<w:numId w:val=\"3\"/>").count(), 2);
        assert_eq!(doc.matches("<w:numId w:val=\"4\"/>").count(), 1);
        let numbering = part(&bytes, "word/numbering.xml");
        assert!(numbering.contains("<w:startOverride w:val=\"4\"/>"));
    }

    #[test]
    fn merged_table_cells_use_grid_span_and_vmerge() {
        let cell = |r: usize, c: usize, text: &str| TableCell {
            position: (r, c),
            content: CellContent {
                text: text.into(),
                marks: vec![],
            },
            style_id: None,
        };
        let data = TableData {
            rows: 3,
            cols: 3,
            cells: vec![
                cell(0, 0, "M"),
                cell(0, 2, "h"),
                cell(1, 2, "x"),
                cell(2, 0, "a"),
                cell(2, 1, "b"),
                cell(2, 2, "c"),
            ],
            merge_regions: vec![MergeRegion::new((0, 0), 2, 2).unwrap()],
        };
        let bytes = export(
            vec![Block::Table(TableBlock {
                id: "t".into(),
                data,
                style_id: None,
            })],
            None,
        );
        let doc = part(&bytes, "word/document.xml");
        assert_eq!(doc.matches("<w:gridCol ").count(), 3);
        assert!(doc.contains("<w:gridSpan w:val=\"2\"/><w:vMerge w:val=\"restart\"/>"));
        assert!(doc.contains("<w:gridSpan w:val=\"2\"/><w:vMerge/>"));
        assert_eq!(doc.matches("<w:tc>").count(), 7);
        assert!(doc.contains("w:fill=\"F2F2F2\""));
        assert!(roxmltree::Document::parse(&doc).is_ok());
    }

    #[test]
    fn divider_and_code_blocks() {
        let doc = part(
            &export(
                vec![
                    Block::Divider(DividerBlock { id: "d".into() }),
                    Block::Code(CodeBlock {
                        id: "c".into(),
                        text: "let a = 1;\nlet b = 2;".into(),
                        language: Some("rust".into()),
                    }),
                ],
                None,
            ),
            "word/document.xml",
        );
        assert!(doc.contains("<w:pBdr><w:bottom w:val=\"single\" w:sz=\"6\""));
        assert!(doc.contains(">[rust]</w:t>"));
        assert!(doc.contains("w:ascii=\"Courier New\""));
        assert!(doc.contains("<w:br/>"));
        assert!(doc.contains("w:fill=\"F5F5F5\""));
    }

    #[test]
    fn broken_table_and_settings_are_rejected() {
        let data = TableData {
            rows: 1,
            cols: 1,
            cells: vec![],
            merge_regions: vec![MergeRegion::new((0, 0), 1, 2).unwrap()],
        };
        let content = Content::new(vec![Block::Table(TableBlock {
            id: "t".into(),
            data,
            style_id: None,
        })]);
        let err = export_docx(&content, &StyleSheet::default(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        let settings = DocumentSettings {
            margin_top: -1.0,
            ..Default::default()
        };
        let err = export_docx(&Content::default(), &StyleSheet::default(), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConvertError::Settings(_)));
    }

    #[test]
    fn tables_with_holes_or_duplicates_are_structural() {
        let cell = |r: usize, c: usize| TableCell {
            position: (r, c),
            content: CellContent::default(),
            style_id: None,
        };
        for cells in [vec![cell(0, 0)], vec![cell(0, 0), cell(0, 0), cell(0, 1)]] {
            let content = Content::new(vec![Block::Table(TableBlock {
                id: "t".into(),
                data: TableData {
                    rows: 1,
                    cols: 2,
                    cells,
                    merge_regions: vec![],
                },
                style_id: None,
            })]);
            let err = export_docx(&content, &StyleSheet::default(), None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Structural);
        }
    }

    #[test]
    fn margins_are_converted_from_cm() {
        let doc = part(&export(vec![], None), "word/document.xml");
        assert!(doc.contains("<w:pgMar w:top=\"1440\" w:right=\"1797\" w:bottom=\"1440\" w:left=\"1797\""));
    }
}
