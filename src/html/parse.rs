use super::dom::{
    attr, attr_get, attrs_vec, body_children, child_with_tag, children, element_children,
    find_descendant, has_class, sanitize_href, tag_lower, text_content,
};
use crate::css::{self, InlineStyle};
use crate::marks::{self, MarkCollector, MarkDescriptor};
use crate::model::{
    block_id, Block, CellContent, CodeBlock, Content, DividerBlock, HeadingBlock, ImageBlock,
    ImageMeta, ListType, Mark, ParagraphAttrs, ParagraphBlock, SimpleMarkName, StyleRule,
    StyleSheet, TableBlock, TableCell, TableData, ValueMarkName,
};
use crate::style::{CellType, CssValue, StyleDeclaration, StyleScope, StyleTarget, TargetBlockType};
use crate::table::{self, PhysicalCell};
use crate::units;
use log::{debug, warn};
use markup5ever_rcdom::{Handle, NodeData};

const INLINE_TAGS: &[&str] = &[
    "span", "strong", "b", "em", "i", "u", "s", "strike", "del", "ins", "code", "sup", "sub",
    "a", "font", "mark", "small", "big", "label", "abbr", "br",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "table", "ul", "ol", "pre", "hr", "blockquote",
    "div", "section", "article", "img", "figure",
];

/// Parses editor HTML into content blocks plus the style rules promoted from
/// inline styles. Never fails: unknown markup is skipped.
pub fn parse_html(html: &str) -> (Content, StyleSheet) {
    let mut parser = HtmlParser::default();
    parser.parse_nodes(&body_children(html));
    let mut sheet = StyleSheet::new(block_id("style"), StyleScope::Document);
    sheet.rules = parser.rules;
    (Content::new(parser.blocks), sheet)
}

#[derive(Default)]
struct HtmlParser {
    blocks: Vec<Block>,
    rules: Vec<StyleRule>,
}

impl HtmlParser {
    fn parse_nodes(&mut self, nodes: &[Handle]) {
        let mut inline_run: Vec<Handle> = Vec::new();
        for node in nodes {
            let tag = match &node.data {
                NodeData::Text { .. } => {
                    inline_run.push(node.clone());
                    continue;
                }
                NodeData::Element { .. } => tag_lower(node).unwrap_or_default(),
                _ => continue,
            };
            if INLINE_TAGS.contains(&tag.as_str()) {
                inline_run.push(node.clone());
                continue;
            }
            self.flush_inline(&mut inline_run);
            self.parse_element(node, &tag);
        }
        self.flush_inline(&mut inline_run);
    }

    /// Loose text and inline elements between blocks become one paragraph.
    fn flush_inline(&mut self, run: &mut Vec<Handle>) {
        if run.is_empty() {
            return;
        }
        let mut collector = MarkCollector::new();
        let mut active = Vec::new();
        for node in run.drain(..) {
            walk_inline(&node, &mut active, &mut collector, false);
        }
        let (text, marks) = collector.finish();
        let (text, marks) = marks::trim(&text, marks);
        if text.is_empty() {
            return;
        }
        self.blocks.push(Block::Paragraph(ParagraphBlock {
            id: block_id("para"),
            text,
            marks,
            attrs: None,
        }));
    }

    fn parse_element(&mut self, node: &Handle, tag: &str) {
        match tag {
            "p" => self.paragraph(node),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse().unwrap_or(1);
                self.heading(node, level);
            }
            "table" => self.table(node),
            "img" => self.image(node),
            "ul" | "ol" => {
                let base = list_margin_level(node);
                self.list(node, tag == "ol", base);
            }
            "pre" => self.code(node),
            "hr" => self.divider(),
            "div" | "section" | "article" | "blockquote" | "figure" | "main" | "header"
            | "footer" => self.container(node),
            other => debug!("skipping unsupported <{other}>"),
        }
    }

    fn block_style(&mut self, node: &Handle, block_type: TargetBlockType, id: &str, level: Option<u8>) {
        let Some(style) = attr(node, "style") else {
            return;
        };
        let decl = css::block_style(&InlineStyle::parse(&style));
        if decl.is_empty() {
            return;
        }
        let mut rule = StyleRule::for_block(block_type, id, decl);
        rule.target.level = level;
        self.rules.push(rule);
    }

    fn paragraph(&mut self, node: &Handle) {
        let (text, marks) = inline_content(node, false);
        if text.trim().is_empty() && find_descendant(node, &["img"]).is_some() {
            self.images_within(node);
            return;
        }
        let id = block_id("para");
        self.block_style(node, TargetBlockType::Paragraph, &id, None);
        self.blocks.push(Block::Paragraph(ParagraphBlock {
            id,
            text,
            marks,
            attrs: None,
        }));
    }

    fn images_within(&mut self, node: &Handle) {
        for c in element_children(node) {
            if tag_lower(&c).as_deref() == Some("img") {
                self.image(&c);
            } else {
                self.images_within(&c);
            }
        }
    }

    fn heading(&mut self, node: &Handle, level: u8) {
        let (text, marks) = inline_content(node, false);
        let id = block_id("heading");
        self.block_style(node, TargetBlockType::Heading, &id, Some(level));
        self.blocks.push(Block::Heading(HeadingBlock {
            id,
            text,
            level,
            marks,
            attrs: None,
        }));
    }

    fn list(&mut self, node: &Handle, ordered: bool, level: u32) {
        let list_start = ordered.then(|| {
            attr(node, "start")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(1)
        });
        let list_type = if ordered {
            ListType::Ordered
        } else {
            ListType::Bullet
        };
        for child in element_children(node) {
            match tag_lower(&child).as_deref() {
                Some("li") => {
                    let (text, marks) = inline_content(&child, true);
                    let (text, marks) = marks::trim(&text, marks);
                    let id = block_id("para");
                    self.block_style(&child, TargetBlockType::Paragraph, &id, None);
                    self.blocks.push(Block::Paragraph(ParagraphBlock {
                        id,
                        text,
                        marks,
                        attrs: Some(ParagraphAttrs {
                            list_type: Some(list_type),
                            list_level: Some(level),
                            list_start,
                        }),
                    }));
                    for nested in element_children(&child) {
                        match tag_lower(&nested).as_deref() {
                            Some("ul") => self.list(&nested, false, level + 1),
                            Some("ol") => self.list(&nested, true, level + 1),
                            _ => {}
                        }
                    }
                }
                Some("ul") => self.list(&child, false, level + 1),
                Some("ol") => self.list(&child, true, level + 1),
                _ => {}
            }
        }
    }

    fn code(&mut self, node: &Handle) {
        let code = child_with_tag(node, &["code"]);
        let language = code
            .as_ref()
            .and_then(|c| language_class(c))
            .or_else(|| language_class(node));
        let text = match &code {
            Some(c) => text_content(c),
            None => text_content(node),
        };
        self.blocks.push(Block::Code(CodeBlock {
            id: block_id("code"),
            text,
            language,
        }));
    }

    fn divider(&mut self) {
        self.blocks.push(Block::Divider(DividerBlock {
            id: block_id("divider"),
        }));
    }

    fn container(&mut self, node: &Handle) {
        if has_class(node, "w-e-textarea-divider") {
            self.divider();
            return;
        }
        let has_blocks = element_children(node)
            .iter()
            .any(|c| tag_lower(c).is_some_and(|t| BLOCK_TAGS.contains(&t.as_str())));
        if has_blocks {
            self.parse_nodes(&children(node));
        } else if find_descendant(node, &["hr"]).is_some() {
            self.divider();
        } else {
            self.paragraph(node);
        }
    }

    fn image(&mut self, node: &Handle) {
        let attrs = attrs_vec(node);
        let meta = ImageMeta {
            width: attr_get(&attrs, "width").map(|w| CssValue::from_attr(&w)),
            height: attr_get(&attrs, "height").map(|h| CssValue::from_attr(&h)),
            alt: attr_get(&attrs, "alt"),
        };
        let id = block_id("image");
        self.block_style(node, TargetBlockType::Image, &id, None);
        self.blocks.push(Block::Image(ImageBlock {
            id,
            src: attr_get(&attrs, "src").unwrap_or_default(),
            meta: Some(meta),
        }));
    }

    fn table(&mut self, node: &Handle) {
        let id = block_id("table");
        let rows = table_rows(node);

        let physical: Vec<Vec<PhysicalCell<(Handle, bool)>>> = rows
            .iter()
            .map(|tr| {
                element_children(tr)
                    .into_iter()
                    .filter_map(|c| {
                        let tag = tag_lower(&c)?;
                        if tag != "td" && tag != "th" {
                            return None;
                        }
                        Some(PhysicalCell {
                            rowspan: span_attr(&c, "rowspan"),
                            colspan: span_attr(&c, "colspan"),
                            payload: (c, tag == "th"),
                        })
                    })
                    .collect()
            })
            .collect();

        let first_row: Vec<(Handle, usize)> = physical
            .first()
            .map(|r| r.iter().map(|c| (c.payload.0.clone(), c.colspan)).collect())
            .unwrap_or_default();

        let cols = table::column_count(&physical);
        let laid = table::layout(physical, cols);
        for (row, _) in &laid.overflow {
            warn!("table {id}: dropping cell that does not fit row {row}");
        }
        let holes = laid.holes();

        let mut cells = Vec::with_capacity(laid.cells.len());
        for placed in laid.cells {
            let (cell_node, is_header) = placed.payload;
            let (text, marks) = inline_content(&cell_node, false);
            let (text, marks) = marks::trim(&text, marks);
            let cell_attrs = attrs_vec(&cell_node);
            let style = InlineStyle::parse(&attr_get(&cell_attrs, "style").unwrap_or_default());
            let decl = css::cell_style(
                &style,
                attr_get(&cell_attrs, "align").as_deref(),
                attr_get(&cell_attrs, "valign").as_deref(),
                attr_get(&cell_attrs, "bgcolor").as_deref(),
            );
            let style_id = if decl.is_empty() {
                None
            } else {
                let cell_id = format!("cell-{}-{}", placed.row, placed.col);
                self.rules.push(StyleRule {
                    target: StyleTarget {
                        block_type: Some(TargetBlockType::TableCell),
                        block_ids: Some(vec![cell_id.clone()]),
                        cell_type: Some(if is_header { CellType::Th } else { CellType::Td }),
                        ..Default::default()
                    },
                    style: decl,
                });
                Some(cell_id)
            };
            cells.push(TableCell {
                position: (placed.row, placed.col),
                content: CellContent { text, marks },
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

        if let Some(style) = attr(node, "style") {
            let decl = css::table_style(&InlineStyle::parse(&style));
            if !decl.is_empty() {
                self.rules
                    .push(StyleRule::for_block(TargetBlockType::Table, &id, decl));
            }
        }
        for (col, width) in column_widths(node, &first_row) {
            self.rules.push(StyleRule {
                target: StyleTarget {
                    block_type: Some(TargetBlockType::TableColumn),
                    block_ids: Some(vec![id.clone()]),
                    column_index: Some(col),
                    ..Default::default()
                },
                style: StyleDeclaration {
                    width: Some(CssValue::Text(width)),
                    ..Default::default()
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

/// Text and marks of an element's children. List items pass `skip_lists` so
/// nested lists do not leak into the item's own text.
fn inline_content(node: &Handle, skip_lists: bool) -> (String, Vec<Mark>) {
    let mut collector = MarkCollector::new();
    let mut active = Vec::new();
    for c in children(node) {
        walk_inline(&c, &mut active, &mut collector, skip_lists);
    }
    let (text, marks) = collector.finish();
    marks::trim_trailing_breaks(&text, marks)
}

fn walk_inline(
    node: &Handle,
    active: &mut Vec<MarkDescriptor>,
    out: &mut MarkCollector,
    skip_lists: bool,
) {
    match &node.data {
        NodeData::Text { contents } => out.push_text(&contents.borrow(), active),
        NodeData::Element { .. } => {
            let tag = tag_lower(node).unwrap_or_default();
            match tag.as_str() {
                "script" | "style" => return,
                "ul" | "ol" if skip_lists => return,
                "br" => {
                    out.push_text("\n", active);
                    return;
                }
                _ => {}
            }
            let added = descriptors_for(node, &tag);
            let n = added.len();
            active.extend(added);
            for c in node.children.borrow().iter() {
                walk_inline(c, active, out, skip_lists);
            }
            active.truncate(active.len() - n);
        }
        _ => {}
    }
}

fn descriptors_for(node: &Handle, tag: &str) -> Vec<MarkDescriptor> {
    let mut out = Vec::new();
    let semantic = match tag {
        "strong" | "b" => Some(SimpleMarkName::Bold),
        "em" | "i" => Some(SimpleMarkName::Italic),
        "u" | "ins" => Some(SimpleMarkName::Underline),
        "s" | "strike" | "del" => Some(SimpleMarkName::Strike),
        "code" => Some(SimpleMarkName::Code),
        "sup" => Some(SimpleMarkName::Superscript),
        "sub" => Some(SimpleMarkName::Subscript),
        _ => None,
    };
    if let Some(name) = semantic {
        out.push(MarkDescriptor::Simple(name));
    }
    let attrs = attrs_vec(node);
    if tag == "a" {
        if let Some(href) = attr_get(&attrs, "href").and_then(|h| sanitize_href(&h)) {
            out.push(MarkDescriptor::Link(href));
        }
    }
    if let Some(style) = attr_get(&attrs, "style") {
        for (prop, value) in InlineStyle::parse(&style).iter() {
            let d = match prop {
                "color" => MarkDescriptor::Value(ValueMarkName::Color, value.to_string()),
                "background-color" | "background" => {
                    MarkDescriptor::Value(ValueMarkName::BackgroundColor, value.to_string())
                }
                "font-size" => MarkDescriptor::Value(ValueMarkName::FontSize, value.to_string()),
                "font-family" => MarkDescriptor::Value(ValueMarkName::FontFamily, value.to_string()),
                "font-weight" if is_bold_weight(value) => MarkDescriptor::Simple(SimpleMarkName::Bold),
                "font-style" if matches!(value.to_ascii_lowercase().as_str(), "italic" | "oblique") => {
                    MarkDescriptor::Simple(SimpleMarkName::Italic)
                }
                "text-decoration" | "text-decoration-line" => {
                    let v = value.to_ascii_lowercase();
                    if v.contains("underline") {
                        out.push(MarkDescriptor::Simple(SimpleMarkName::Underline));
                    }
                    if v.contains("line-through") {
                        out.push(MarkDescriptor::Simple(SimpleMarkName::Strike));
                    }
                    continue;
                }
                _ => continue,
            };
            if !out.contains(&d) {
                out.push(d);
            }
        }
    }
    out
}

fn is_bold_weight(v: &str) -> bool {
    let v = v.trim().to_ascii_lowercase();
    v == "bold" || v == "bolder" || v.parse::<u32>().map(|n| n >= 600).unwrap_or(false)
}

fn language_class(node: &Handle) -> Option<String> {
    attr(node, "class")?
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// `margin-left: {2n}em` on a top-level list marks nesting level `n`.
fn list_margin_level(node: &Handle) -> u32 {
    attr(node, "style")
        .and_then(|s| InlineStyle::parse(&s).get("margin-left").map(str::to_string))
        .filter(|m| m.trim_end().ends_with("em"))
        .and_then(|m| units::leading_number(&m))
        .map(|em| (em / 2.0).round().max(0.0) as u32)
        .unwrap_or(0)
}

fn table_rows(table: &Handle) -> Vec<Handle> {
    let mut rows = Vec::new();
    for child in element_children(table) {
        match tag_lower(&child).as_deref() {
            Some("tr") => rows.push(child),
            Some("thead") | Some("tbody") | Some("tfoot") => rows.extend(
                element_children(&child)
                    .into_iter()
                    .filter(|r| tag_lower(r).as_deref() == Some("tr")),
            ),
            _ => {}
        }
    }
    rows
}

fn span_attr(node: &Handle, name: &str) -> usize {
    attr(node, name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

fn width_number(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") || raw.ends_with('%') {
        return None;
    }
    units::leading_number(raw).map(units::format_number)
}

/// Column widths from `<colgroup>`/`<col>`, falling back to the first row's
/// cell widths.
fn column_widths(table: &Handle, first_row: &[(Handle, usize)]) -> Vec<(usize, String)> {
    let mut cols = Vec::new();
    for child in element_children(table) {
        match tag_lower(&child).as_deref() {
            Some("colgroup") => cols.extend(
                element_children(&child)
                    .into_iter()
                    .filter(|c| tag_lower(c).as_deref() == Some("col")),
            ),
            Some("col") => cols.push(child),
            _ => {}
        }
    }

    let mut out = Vec::new();
    if !cols.is_empty() {
        let mut index = 0;
        for col in cols {
            let span = span_attr(&col, "span");
            let width = attr(&col, "width").or_else(|| {
                attr(&col, "style").and_then(|s| InlineStyle::parse(&s).get("width").map(str::to_string))
            });
            if let Some(w) = width.as_deref().and_then(width_number) {
                for i in index..index + span {
                    out.push((i, w.clone()));
                }
            }
            index += span;
        }
        return out;
    }

    let mut index = 0;
    for (cell, colspan) in first_row {
        let width = attr(cell, "width").or_else(|| {
            attr(cell, "style").and_then(|s| InlineStyle::parse(&s).get("width").map(str::to_string))
        });
        if *colspan == 1 {
            if let Some(w) = width.as_deref().and_then(width_number) {
                out.push((index, w));
            }
        }
        index += colspan;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarkKind, MergeType};

    fn only_paragraph(html: &str) -> ParagraphBlock {
        let (content, _) = parse_html(html);
        assert_eq!(content.blocks.len(), 1, "{:?}", content.blocks);
        match content.blocks.into_iter().next().unwrap() {
            Block::Paragraph(p) => p,
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn adjacent_spans_with_equal_font_size_merge() {
        let p = only_paragraph(
            r#"<p><span style="font-size:12pt">AB</span><span style="font-size:12pt">CD</span></p>"#,
        );
        assert_eq!(p.text, "ABCD");
        assert_eq!(p.marks, vec![Mark::value(0, 4, ValueMarkName::FontSize, "12pt")]);
    }

    #[test]
    fn nested_tags_accumulate_marks() {
        let p = only_paragraph(
            r#"<p>a<strong>b<em>c</em></strong><a href="https://x.test">d</a></p>"#,
        );
        assert_eq!(p.text, "abcd");
        assert!(p.marks.contains(&Mark::simple(1, 3, SimpleMarkName::Bold)));
        assert!(p.marks.contains(&Mark::simple(2, 3, SimpleMarkName::Italic)));
        assert!(p.marks.contains(&Mark::link(3, 4, "https://x.test")));
    }

    #[test]
    fn span_styles_become_composite_mark() {
        let p = only_paragraph(
            r#"<p><span style="font-weight:bold;font-style:italic;text-decoration:underline">xy</span></p>"#,
        );
        assert_eq!(
            p.marks,
            vec![Mark::new(
                0,
                2,
                MarkKind::Composite(vec![
                    SimpleMarkName::Bold,
                    SimpleMarkName::Italic,
                    SimpleMarkName::Underline
                ])
            )]
        );
    }

    #[test]
    fn background_color_is_not_mistaken_for_color() {
        let p = only_paragraph(r#"<p><span style="background-color: yellow">hi</span></p>"#);
        assert_eq!(
            p.marks,
            vec![Mark::value(0, 2, ValueMarkName::BackgroundColor, "yellow")]
        );
    }

    #[test]
    fn block_styles_skip_defaults() {
        let (content, sheet) = parse_html(
            r#"<p style="text-align: left; color: #000000">plain</p><h2 style="text-align: center">T</h2>"#,
        );
        assert_eq!(content.blocks.len(), 2);
        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.target.block_type, Some(TargetBlockType::Heading));
        assert_eq!(rule.target.level, Some(2));
        assert_eq!(rule.target.ids(), &[content.blocks[1].id().to_string()]);
    }

    #[test]
    fn lists_flatten_with_levels_and_start() {
        let (content, _) = parse_html(
            r#"<ol start="3"><li>one<ul><li>inner</li></ul></li><li>two</li></ol>"#,
        );
        let items: Vec<(String, ParagraphAttrs)> = content
            .blocks
            .iter()
            .map(|b| match b {
                Block::Paragraph(p) => (p.text.clone(), p.attrs.clone().unwrap()),
                other => panic!("{other:?}"),
            })
            .collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, "one");
        assert_eq!(items[0].1.list_type, Some(ListType::Ordered));
        assert_eq!(items[0].1.list_start, Some(3));
        assert_eq!(items[1].0, "inner");
        assert_eq!(items[1].1.list_level, Some(1));
        assert_eq!(items[1].1.list_type, Some(ListType::Bullet));
        assert_eq!(items[2].0, "two");
        assert_eq!(items[2].1.list_level, Some(0));
    }

    #[test]
    fn code_divider_and_containers() {
        let (content, _) = parse_html(
            r#"<pre><code class="language-rust">fn main() {}
</code></pre><hr><div class="w-e-textarea-divider"><hr></div>
<div><p>inside</p>loose text</div><section>just text</section>"#,
        );
        let kinds: Vec<&str> = content.blocks.iter().map(|b| b.type_name()).collect();
        assert_eq!(
            kinds,
            vec!["code", "divider", "divider", "paragraph", "paragraph", "paragraph"]
        );
        match &content.blocks[0] {
            Block::Code(c) => {
                assert_eq!(c.language.as_deref(), Some("rust"));
                assert_eq!(c.text, "fn main() {}\n");
            }
            other => panic!("{other:?}"),
        }
        match &content.blocks[4] {
            Block::Paragraph(p) => assert_eq!(p.text, "loose text"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn merged_table_cells_are_omitted() {
        let (content, sheet) = parse_html(
            r#"<table><tr><td rowspan="2" colspan="2" style="background-color:#eee">M</td><td>a</td></tr>
               <tr><td>b</td></tr><tr><td>c</td><td>d</td><td>e</td></tr></table>"#,
        );
        let Block::Table(t) = &content.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!((t.data.rows, t.data.cols), (3, 3));
        assert_eq!(t.data.merge_regions.len(), 1);
        let region = &t.data.merge_regions[0];
        assert_eq!(region.kind, MergeType::Rectangular);
        assert_eq!((region.start, region.end), ((0, 0), (1, 1)));
        let positions: Vec<(usize, usize)> = t.data.cells.iter().map(|c| c.position).collect();
        for covered in [(0, 1), (1, 0), (1, 1)] {
            assert!(!positions.contains(&covered));
        }
        assert_eq!(t.data.cells[0].style_id.as_deref(), Some("cell-0-0"));
        assert!(sheet
            .rules
            .iter()
            .any(|r| r.target.block_type == Some(TargetBlockType::TableCell)));
    }

    #[test]
    fn column_widths_from_colgroup() {
        let (content, sheet) = parse_html(
            r#"<table><colgroup><col width="120"><col width="auto"><col style="width: 80px"></colgroup>
               <tr><td>a</td><td>b</td><td>c</td></tr></table>"#,
        );
        let table_id = content.blocks[0].id().to_string();
        let widths: Vec<(usize, CssValue)> = sheet
            .rules
            .iter()
            .filter(|r| r.target.block_type == Some(TargetBlockType::TableColumn))
            .map(|r| {
                assert_eq!(r.target.ids(), &[table_id.clone()]);
                (r.target.column_index.unwrap(), r.style.width.clone().unwrap())
            })
            .collect();
        assert_eq!(
            widths,
            vec![
                (0, CssValue::Text("120".into())),
                (2, CssValue::Text("80".into()))
            ]
        );
    }

    #[test]
    fn image_only_paragraph_yields_image() {
        let (content, _) =
            parse_html(r#"<p><img src="/a.png" alt="A" width="300" height="auto"></p>"#);
        let Block::Image(img) = &content.blocks[0] else {
            panic!("expected image");
        };
        assert_eq!(img.src, "/a.png");
        let meta = img.meta.as_ref().unwrap();
        assert_eq!(meta.width, Some(CssValue::Number(300)));
        assert_eq!(meta.height, Some(CssValue::Text("auto".into())));
        assert_eq!(meta.alt.as_deref(), Some("A"));
    }

    #[test]
    fn malformed_html_does_not_fail() {
        let (content, _) = parse_html("<p><b>unclosed <i>tags</p><video></video>stray");
        assert!(!content.blocks.is_empty());
    }

    #[test]
    fn script_links_are_dropped() {
        let p = only_paragraph(
            r#"<p><a href="javascript:alert(1)">a</a><a href=" VBScript:msgbox">b</a><a href="/ok">c</a></p>"#,
        );
        assert_eq!(p.text, "abc");
        let links: Vec<&Mark> = p
            .marks
            .iter()
            .filter(|m| matches!(m.kind, MarkKind::Link { .. }))
            .collect();
        assert_eq!(links, vec![&Mark::link(2, 3, "/ok")]);
    }

    #[test]
    fn ragged_table_rows_are_padded() {
        let (content, _) = parse_html(
            r#"<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>"#,
        );
        let Block::Table(t) = &content.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!((t.data.rows, t.data.cols), (2, 3));
        let padded: Vec<_> = t.data.cells[4..].iter().map(|c| c.position).collect();
        assert_eq!(padded, vec![(1, 1), (1, 2)]);
        assert!(t.data.cells[4..].iter().all(|c| c.content.text.is_empty()));
        assert!(content.validate().is_ok());
    }
}
