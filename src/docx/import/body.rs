//! `w:body` → flat blocks plus the style rules each block owns.

use super::catalog::{font_name, outline_level, ListCatalog, StyleCatalog};
use super::package::Relationship;
use super::wml::{
    descendant, hex_color, highlight_color, int_attr, wml, wml_attr, wml_bool, NS_A, NS_R, NS_W,
    NS_WP,
};
use crate::marks::{self, MarkCollector, MarkDescriptor};
use crate::model::{
    block_id, Block, CellContent, CssValue, DividerBlock, HeadingBlock, ImageBlock, ImageMeta,
    ListType, Mark, ParagraphAttrs, ParagraphBlock, SimpleMarkName, StyleDeclaration, StyleRule,
    StyleTarget, TableBlock, TableCell, TableData, TableLayout, TargetBlockType, TextAlign,
    ValueMarkName, VerticalAlign,
};
use crate::table::{self, PhysicalCell};
use crate::units::{emu_to_px, format_number, format_pt, half_points_to_pt, twips_to_pt, PT_PER_PX};
use log::{debug, warn};
use roxmltree::Node;
use std::collections::HashMap;

/// Line spacing the exporter writes when a block sets none (1.5 lines).
const EXPORT_DEFAULT_LINE: i64 = 360;

/// A style rule tagged with the block it was produced for, so chapters can
/// take exactly the rules of their own blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedRule {
    pub owner: String,
    pub rule: StyleRule,
}

#[derive(Debug, Clone, PartialEq)]
struct DrawingRef {
    rel_id: String,
    cx: Option<i64>,
    cy: Option<i64>,
    alt: Option<String>,
}

/// Text, marks and drawings of one paragraph (or one table cell).
struct InlineReader<'r> {
    rels: &'r HashMap<String, Relationship>,
    styles: &'r StyleCatalog,
    collector: MarkCollector,
    active: Vec<MarkDescriptor>,
    drawings: Vec<DrawingRef>,
}

impl<'r> InlineReader<'r> {
    fn new(rels: &'r HashMap<String, Relationship>, styles: &'r StyleCatalog) -> Self {
        InlineReader {
            rels,
            styles,
            collector: MarkCollector::new(),
            active: Vec::new(),
            drawings: Vec::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.collector.push_text(text, &self.active);
    }

    fn walk(&mut self, node: Node) {
        for child in node.children().filter(|n| n.is_element()) {
            if child.tag_name().namespace() != Some(NS_W) {
                continue;
            }
            match child.tag_name().name() {
                "r" => self.run(child),
                "hyperlink" => {
                    let href = child
                        .attribute((NS_R, "id"))
                        .and_then(|id| self.rels.get(id))
                        .filter(|rel| rel.is_hyperlink())
                        .map(|rel| rel.target.clone())
                        .or_else(|| child.attribute((NS_W, "anchor")).map(|a| format!("#{a}")));
                    match href {
                        Some(href) => {
                            self.active.push(MarkDescriptor::Link(href));
                            self.walk(child);
                            self.active.pop();
                        }
                        None => self.walk(child),
                    }
                }
                "ins" | "smartTag" | "customXml" | "fldSimple" | "dir" | "bdo" => self.walk(child),
                "sdt" => {
                    if let Some(content) = wml(child, "sdtContent") {
                        self.walk(content);
                    }
                }
                _ => {}
            }
        }
    }

    fn run(&mut self, r: Node) {
        let base = self.active.len();
        if let Some(rpr) = wml(r, "rPr") {
            let descriptors = run_descriptors(rpr, self.styles);
            self.active.extend(descriptors);
        }
        for child in r.children().filter(|n| n.is_element()) {
            if child.tag_name().namespace() != Some(NS_W) {
                continue;
            }
            match child.tag_name().name() {
                "t" => self.text(child.text().unwrap_or_default()),
                "tab" => self.text("\t"),
                "br" => match child.attribute((NS_W, "type")) {
                    None | Some("textWrapping") => self.text("\n"),
                    Some(kind) => debug!("ignoring {kind} break"),
                },
                "cr" => self.text("\n"),
                "noBreakHyphen" => self.text("-"),
                "drawing" => self.drawings.extend(drawing_ref(child)),
                "pict" | "object" => debug!("skipping legacy embedded object"),
                _ => {}
            }
        }
        self.active.truncate(base);
    }

    fn line_break(&mut self) {
        self.collector.push_text("\n", &[]);
    }

    fn finish(self) -> (String, Vec<Mark>, Vec<DrawingRef>) {
        let (text, marks) = self.collector.finish();
        (text, marks, self.drawings)
    }
}

/// Marks implied by one `w:rPr`. Font and size equal to the document
/// defaults are not promoted.
fn run_descriptors(rpr: Node, styles: &StyleCatalog) -> Vec<MarkDescriptor> {
    let mut out = Vec::new();
    for (tag, name) in [
        ("b", SimpleMarkName::Bold),
        ("i", SimpleMarkName::Italic),
        ("strike", SimpleMarkName::Strike),
        ("dstrike", SimpleMarkName::Strike),
    ] {
        if wml_bool(rpr, tag) == Some(true) {
            push_simple(&mut out, name);
        }
    }
    if let Some(u) = wml(rpr, "u") {
        if u.attribute((NS_W, "val")).unwrap_or("single") != "none" {
            push_simple(&mut out, SimpleMarkName::Underline);
        }
    }
    match wml_attr(rpr, "vertAlign") {
        Some("superscript") => push_simple(&mut out, SimpleMarkName::Superscript),
        Some("subscript") => push_simple(&mut out, SimpleMarkName::Subscript),
        _ => {}
    }

    if let Some(color) = wml_attr(rpr, "color").and_then(hex_color) {
        out.push(MarkDescriptor::Value(ValueMarkName::Color, color));
    }
    let half_points: Option<i64> = wml_attr(rpr, "sz").and_then(|v| v.trim().parse().ok());
    if let Some(hp) = half_points.filter(|hp| Some(*hp) != styles.default_half_points) {
        out.push(MarkDescriptor::Value(
            ValueMarkName::FontSize,
            format_pt(half_points_to_pt(hp as f64)),
        ));
    }
    let font = wml(rpr, "rFonts").and_then(font_name);
    if let Some(font) = font.filter(|f| Some(*f) != styles.default_font.as_deref()) {
        out.push(MarkDescriptor::Value(ValueMarkName::FontFamily, font.to_string()));
    }
    let background = wml_attr(rpr, "highlight")
        .and_then(highlight_color)
        .map(str::to_string)
        .or_else(|| {
            wml(rpr, "shd")
                .and_then(|shd| shd.attribute((NS_W, "fill")))
                .and_then(hex_color)
        });
    if let Some(bg) = background {
        out.push(MarkDescriptor::Value(ValueMarkName::BackgroundColor, bg));
    }
    out
}

fn push_simple(out: &mut Vec<MarkDescriptor>, name: SimpleMarkName) {
    let d = MarkDescriptor::Simple(name);
    if !out.contains(&d) {
        out.push(d);
    }
}

fn drawing_ref(drawing: Node) -> Option<DrawingRef> {
    let blip = descendant(drawing, NS_A, "blip")?;
    let rel_id = blip.attribute((NS_R, "embed"))?.to_string();
    let extent = descendant(drawing, NS_WP, "extent");
    let dim = |name: &str| {
        extent
            .and_then(|e| e.attribute(name))
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
    };
    let alt = descendant(drawing, NS_WP, "docPr")
        .and_then(|d| d.attribute("descr").or_else(|| d.attribute("title")))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(DrawingRef {
        rel_id,
        cx: dim("cx"),
        cy: dim("cy"),
        alt,
    })
}

fn text_align(jc: &str) -> Option<TextAlign> {
    match jc {
        "left" | "start" => Some(TextAlign::Left),
        "center" => Some(TextAlign::Center),
        "right" | "end" => Some(TextAlign::Right),
        "both" | "distribute" => Some(TextAlign::Justify),
        _ => None,
    }
}

/// Twips attribute as whole points; zero is treated as unset.
fn twips_as_pt(node: Node, attr: &str) -> Option<i64> {
    int_attr(node, attr)
        .filter(|v| *v != 0)
        .map(|v| twips_to_pt(v as f64).round() as i64)
}

fn paragraph_declaration(ppr: Node) -> StyleDeclaration {
    let mut decl = StyleDeclaration {
        text_align: wml_attr(ppr, "jc").and_then(text_align),
        ..Default::default()
    };
    if let Some(ind) = wml(ppr, "ind") {
        decl.padding_left = twips_as_pt(ind, "left").or_else(|| twips_as_pt(ind, "start"));
        decl.padding_right = twips_as_pt(ind, "right").or_else(|| twips_as_pt(ind, "end"));
        let first = int_attr(ind, "firstLine")
            .filter(|v| *v != 0)
            .or_else(|| int_attr(ind, "hanging").filter(|v| *v != 0).map(|v| -v));
        decl.text_indent = first.map(|v| CssValue::Text(format_pt(twips_to_pt(v as f64))));
    }
    if let Some(spacing) = wml(ppr, "spacing") {
        decl.margin_top = twips_as_pt(spacing, "before");
        decl.margin_bottom = twips_as_pt(spacing, "after");
        match spacing.attribute((NS_W, "lineRule")) {
            None | Some("auto") => {
                decl.line_height = int_attr(spacing, "line")
                    .filter(|v| *v > 0 && *v != EXPORT_DEFAULT_LINE)
                    .map(|v| (v as f64 / 240.0 * 100.0).round() / 100.0);
            }
            Some(rule) => debug!("line rule {rule} has no line-height equivalent; dropped"),
        }
    }
    decl.background_color = wml(ppr, "shd")
        .and_then(|shd| shd.attribute((NS_W, "fill")))
        .and_then(hex_color);
    decl
}

/// `w:tcW`/`w:tblW` as a CSS width: twips become points, `pct` fiftieths a percentage.
fn width_value(w: Node) -> Option<CssValue> {
    let value = int_attr(w, "w").filter(|v| *v > 0)?;
    match w.attribute((NS_W, "type")).unwrap_or("dxa") {
        "pct" => Some(CssValue::Text(format!("{}%", format_number(value as f64 / 50.0)))),
        "dxa" => Some(CssValue::Text(format_pt(twips_to_pt(value as f64)))),
        _ => None,
    }
}

struct Border {
    eighths: Option<i64>,
    style: &'static str,
    color: Option<String>,
}

fn border(node: Node) -> Border {
    let style = match node.attribute((NS_W, "val")).unwrap_or("single") {
        "nil" | "none" => "none",
        "dashed" | "dashSmallGap" | "dotDash" => "dashed",
        "dotted" => "dotted",
        "double" => "double",
        _ => "solid",
    };
    Border {
        eighths: int_attr(node, "sz"),
        style,
        color: node.attribute((NS_W, "color")).and_then(hex_color),
    }
}

/// Per-side `w:tcBorders`; widths become whole points, at least 1 when drawn.
fn apply_cell_borders(decl: &mut StyleDeclaration, borders: Node) {
    for side in borders.children().filter(|n| n.is_element()) {
        let b = border(side);
        let width = b
            .eighths
            .map(|sz| if sz > 0 { ((sz as f64) / 8.0).round().max(1.0) as i64 } else { 0 });
        let (w, s, c) = match side.tag_name().name() {
            "top" => (
                &mut decl.border_top_width,
                &mut decl.border_top_style,
                &mut decl.border_top_color,
            ),
            "bottom" => (
                &mut decl.border_bottom_width,
                &mut decl.border_bottom_style,
                &mut decl.border_bottom_color,
            ),
            "left" | "start" => (
                &mut decl.border_left_width,
                &mut decl.border_left_style,
                &mut decl.border_left_color,
            ),
            "right" | "end" => (
                &mut decl.border_right_width,
                &mut decl.border_right_style,
                &mut decl.border_right_color,
            ),
            _ => continue,
        };
        *w = width;
        *s = Some(b.style.to_string());
        *c = b.color;
    }
}

fn table_declaration(tblpr: Node) -> StyleDeclaration {
    let mut decl = StyleDeclaration {
        align: wml_attr(tblpr, "jc").map(|jc| {
            match jc {
                "center" => "center",
                "right" | "end" => "right",
                _ => "left",
            }
            .to_string()
        }),
        width: wml(tblpr, "tblW").and_then(width_value),
        ..Default::default()
    };
    if wml(tblpr, "tblLayout").and_then(|l| l.attribute((NS_W, "type"))) == Some("fixed") {
        decl.table_layout = Some(TableLayout::Fixed);
    }
    if let Some(top) = wml(tblpr, "tblBorders").and_then(|b| wml(b, "top")) {
        let b = border(top);
        decl.border_width = b
            .eighths
            .map(|sz| ((sz as f64 / 8.0) / PT_PER_PX).round().max(1.0) as i64);
        decl.border_style = Some(b.style.to_string());
        decl.border_color = b.color;
    }
    decl
}

fn cell_declaration(tc: Node) -> StyleDeclaration {
    let mut decl = StyleDeclaration::default();
    if let Some(tcpr) = wml(tc, "tcPr") {
        decl.background_color = wml(tcpr, "shd")
            .and_then(|shd| shd.attribute((NS_W, "fill")))
            .and_then(hex_color);
        decl.vertical_align = wml_attr(tcpr, "vAlign").and_then(|v| match v {
            "top" => Some(VerticalAlign::Top),
            "center" => Some(VerticalAlign::Middle),
            "bottom" => Some(VerticalAlign::Bottom),
            _ => None,
        });
        decl.width = wml(tcpr, "tcW").and_then(width_value);
        if let Some(borders) = wml(tcpr, "tcBorders") {
            apply_cell_borders(&mut decl, borders);
        }
    }
    // Alignment of the first paragraph with text, else of the first paragraph.
    let paragraphs: Vec<Node> = tc.children().filter(|n| n.has_tag_name((NS_W, "p"))).collect();
    decl.text_align = paragraphs
        .iter()
        .copied()
        .find(|&p| has_text(p) && paragraph_jc(p).is_some())
        .or_else(|| paragraphs.first().copied())
        .and_then(paragraph_jc)
        .and_then(text_align);
    decl
}

fn paragraph_jc<'a>(p: Node<'a, '_>) -> Option<&'a str> {
    wml(p, "pPr").and_then(|ppr| wml_attr(ppr, "jc"))
}

fn has_text(p: Node) -> bool {
    p.descendants()
        .filter(|n| n.has_tag_name((NS_W, "t")))
        .any(|t| t.text().is_some_and(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VMerge {
    None,
    Restart,
    Continue,
}

struct RawCell<'a, 'i> {
    node: Node<'a, 'i>,
    grid_col: usize,
    colspan: usize,
    vmerge: VMerge,
    rowspan: usize,
    absorbed: bool,
}

/// Collects blocks and their rules while walking the body.
pub struct BodyConverter<'a> {
    styles: &'a StyleCatalog,
    lists: &'a ListCatalog,
    rels: &'a HashMap<String, Relationship>,
    image_path: &'a mut dyn FnMut(&str) -> Option<String>,
    pub blocks: Vec<Block>,
    pub rules: Vec<OwnedRule>,
}

impl<'a> BodyConverter<'a> {
    /// `image_path` stores the image behind a relationship id and returns the
    /// path to reference, or `None` when it cannot be extracted.
    pub fn new(
        styles: &'a StyleCatalog,
        lists: &'a ListCatalog,
        rels: &'a HashMap<String, Relationship>,
        image_path: &'a mut dyn FnMut(&str) -> Option<String>,
    ) -> Self {
        BodyConverter {
            styles,
            lists,
            rels,
            image_path,
            blocks: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn convert(&mut self, container: Node) {
        for child in container.children().filter(|n| n.is_element()) {
            if child.tag_name().namespace() != Some(NS_W) {
                continue;
            }
            match child.tag_name().name() {
                "p" => self.paragraph(child),
                "tbl" => self.table(child),
                "sdt" => {
                    if let Some(content) = wml(child, "sdtContent") {
                        self.convert(content);
                    }
                }
                "sectPr" | "bookmarkStart" | "bookmarkEnd" | "proofErr" => {}
                other => debug!("skipping body element w:{other}"),
            }
        }
    }

    fn push_rule(
        &mut self,
        owner: &str,
        block_type: TargetBlockType,
        level: Option<u8>,
        style: StyleDeclaration,
    ) {
        if style.is_empty() {
            return;
        }
        self.rules.push(OwnedRule {
            owner: owner.to_string(),
            rule: StyleRule {
                target: StyleTarget {
                    block_type: Some(block_type),
                    block_ids: Some(vec![owner.to_string()]),
                    level,
                    ..Default::default()
                },
                style,
            },
        });
    }

    fn heading_level(&self, ppr: Node) -> Option<u8> {
        wml_attr(ppr, "pStyle")
            .and_then(|s| self.styles.heading_level(s))
            .or_else(|| wml_attr(ppr, "outlineLvl").and_then(outline_level))
    }

    fn list_attrs(&self, ppr: Node) -> Option<ParagraphAttrs> {
        let num_pr = wml(ppr, "numPr")?;
        let num_id = wml_attr(num_pr, "numId").filter(|id| *id != "0")?;
        let level: u32 = wml_attr(num_pr, "ilvl")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let (list_type, start) = self.lists.list_kind(num_id, level);
        Some(ParagraphAttrs {
            list_type: Some(list_type),
            list_level: Some(level),
            list_start: if list_type == ListType::Ordered { start } else { None },
        })
    }

    fn paragraph(&mut self, p: Node) {
        let ppr = wml(p, "pPr");
        let mut reader = InlineReader::new(self.rels, self.styles);
        reader.walk(p);
        let (text, marks, drawings) = reader.finish();

        if text.trim().is_empty() {
            if !drawings.is_empty() {
                for d in &drawings {
                    self.image(d);
                }
            } else if ppr
                .and_then(|ppr| wml(ppr, "pBdr"))
                .and_then(|b| wml(b, "bottom"))
                .is_some_and(|b| border(b).style != "none")
            {
                self.blocks.push(Block::Divider(DividerBlock {
                    id: block_id("divider"),
                }));
            }
            return;
        }

        let decl = ppr.map(paragraph_declaration).unwrap_or_default();
        match ppr.and_then(|ppr| self.heading_level(ppr)) {
            Some(level) => {
                let id = block_id("heading");
                self.push_rule(&id, TargetBlockType::Heading, Some(level), decl);
                self.blocks.push(Block::Heading(HeadingBlock {
                    id,
                    text,
                    level,
                    marks,
                    attrs: None,
                }));
            }
            None => {
                let id = block_id("para");
                let attrs = ppr.and_then(|ppr| self.list_attrs(ppr));
                self.push_rule(&id, TargetBlockType::Paragraph, None, decl);
                self.blocks.push(Block::Paragraph(ParagraphBlock {
                    id,
                    text,
                    marks,
                    attrs,
                }));
            }
        }
        for d in &drawings {
            self.image(d);
        }
    }

    fn image(&mut self, d: &DrawingRef) {
        let Some(src) = (self.image_path)(&d.rel_id) else {
            warn!("image {} could not be extracted; skipped", d.rel_id);
            return;
        };
        let meta = ImageMeta {
            width: d.cx.map(|v| CssValue::Number(emu_to_px(v))),
            height: d.cy.map(|v| CssValue::Number(emu_to_px(v))),
            alt: d.alt.clone(),
        };
        let meta = (meta != ImageMeta::default()).then_some(meta);
        self.blocks.push(Block::Image(ImageBlock {
            id: block_id("image"),
            src,
            meta,
        }));
    }

    fn cell_content(&self, tc: Node) -> CellContent {
        let mut reader = InlineReader::new(self.rels, self.styles);
        let paragraphs = tc.children().filter(|n| n.has_tag_name((NS_W, "p")));
        for (i, p) in paragraphs.enumerate() {
            if i > 0 {
                reader.line_break();
            }
            reader.walk(p);
        }
        if tc.children().any(|n| n.has_tag_name((NS_W, "tbl"))) {
            debug!("nested table inside a cell flattened away");
        }
        let (text, marks, drawings) = reader.finish();
        if !drawings.is_empty() {
            debug!("{} image(s) inside a table cell dropped", drawings.len());
        }
        let (text, marks) = marks::trim_trailing_breaks(&text, marks);
        CellContent { text, marks }
    }

    fn table(&mut self, tbl: Node) {
        let id = block_id("table");
        let grid: Vec<i64> = wml(tbl, "tblGrid")
            .map(|g| {
                g.children()
                    .filter(|n| n.has_tag_name((NS_W, "gridCol")))
                    .map(|c| int_attr(c, "w").unwrap_or(0))
                    .collect()
            })
            .unwrap_or_default();

        let mut raw: Vec<Vec<RawCell>> = Vec::new();
        for tr in tbl.children().filter(|n| n.has_tag_name((NS_W, "tr"))) {
            let mut row = Vec::new();
            let mut col = 0;
            for tc in tr.children().filter(|n| n.has_tag_name((NS_W, "tc"))) {
                let tcpr = wml(tc, "tcPr");
                let colspan = tcpr
                    .and_then(|p| wml_attr(p, "gridSpan"))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let vmerge = match tcpr.and_then(|p| wml(p, "vMerge")) {
                    None => VMerge::None,
                    Some(v) if v.attribute((NS_W, "val")) == Some("restart") => VMerge::Restart,
                    Some(_) => VMerge::Continue,
                };
                row.push(RawCell {
                    node: tc,
                    grid_col: col,
                    colspan,
                    vmerge,
                    rowspan: 1,
                    absorbed: false,
                });
                col += colspan;
            }
            raw.push(row);
        }

        // Continuation cells extend the open restart cell in the same grid column.
        let mut open: HashMap<usize, (usize, usize)> = HashMap::new();
        for r in 0..raw.len() {
            let mut next = HashMap::new();
            for i in 0..raw[r].len() {
                let (gc, vmerge) = (raw[r][i].grid_col, raw[r][i].vmerge);
                match vmerge {
                    VMerge::Continue => match open.get(&gc) {
                        Some(&(mr, mi)) => {
                            raw[mr][mi].rowspan += 1;
                            raw[r][i].absorbed = true;
                            next.insert(gc, (mr, mi));
                        }
                        None => warn!("table {id}: vertical merge continues nothing at row {r}"),
                    },
                    VMerge::Restart => {
                        next.insert(gc, (r, i));
                    }
                    VMerge::None => {}
                }
            }
            open = next;
        }

        let physical: Vec<Vec<PhysicalCell<Node>>> = raw
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|c| !c.absorbed)
                    .map(|c| PhysicalCell {
                        rowspan: c.rowspan,
                        colspan: c.colspan,
                        payload: c.node,
                    })
                    .collect()
            })
            .collect();
        let cols = grid.len().max(table::column_count(&physical));
        if physical.is_empty() || cols == 0 {
            debug!("table without rows skipped");
            return;
        }
        let laid = table::layout(physical, cols);
        for (row, _) in &laid.overflow {
            warn!("table {id}: dropping cell that does not fit row {row}");
        }
        let holes = laid.holes();

        let mut cells = Vec::with_capacity(laid.cells.len());
        for placed in laid.cells {
            let tc = placed.payload;
            let decl = cell_declaration(tc);
            let style_id = if decl.is_empty() {
                None
            } else {
                let cell_id = format!("cell-{}-{}", placed.row, placed.col);
                self.rules.push(OwnedRule {
                    owner: id.clone(),
                    rule: StyleRule {
                        target: StyleTarget {
                            block_type: Some(TargetBlockType::TableCell),
                            block_ids: Some(vec![cell_id.clone()]),
                            ..Default::default()
                        },
                        style: decl,
                    },
                });
                Some(cell_id)
            };
            cells.push(TableCell {
                position: (placed.row, placed.col),
                content: self.cell_content(tc),
                style_id,
            });
        }
        if !holes.is_empty() {
            debug!("table {id}: padding {} short-row coordinates", holes.len());
        }
        cells.extend(holes.into_iter().map(|position| TableCell {
            position,
            content: CellContent::default(),
            style_id: None,
        }));

        if let Some(tblpr) = wml(tbl, "tblPr") {
            self.push_rule(&id, TargetBlockType::Table, None, table_declaration(tblpr));
        }
        for (col, twips) in grid.iter().enumerate().filter(|(_, w)| **w > 0) {
            self.rules.push(OwnedRule {
                owner: id.clone(),
                rule: StyleRule {
                    target: StyleTarget {
                        block_type: Some(TargetBlockType::TableColumn),
                        block_ids: Some(vec![id.clone()]),
                        column_index: Some(col),
                        ..Default::default()
                    },
                    style: StyleDeclaration {
                        width: Some(CssValue::Text(format_pt(twips_to_pt(*twips as f64)))),
                        ..Default::default()
                    },
                },
            });
        }

        self.blocks.push(Block::Table(TableBlock {
            id,
            data: TableData {
                rows: laid.rows,
                cols: laid.cols,
                cells,
                merge_regions: laid.merges,
            },
            style_id: None,
        }));
    }
}
