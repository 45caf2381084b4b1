use super::escape_html;
use crate::error::Result;
use crate::marks::resegment;
use crate::model::{
    Block, CodeBlock, Content, HeadingBlock, ImageBlock, ListType, Mark, ParagraphBlock,
    SimpleMarkName, StyleSheet, TableBlock, ValueMarkName,
};
use crate::style::StyleDeclaration;
use crate::style_index::StyleIndex;
use crate::table::{Slot, TableGeometry};

const CELL_BASE_STYLE: &str = "border: 1px solid #ddd; padding: 8px";

/// Renders content back into editor HTML. Consecutive list items of one
/// type, level and start value share a single list element.
pub fn render_html(content: &Content, sheet: &StyleSheet) -> Result<String> {
    content.validate()?;
    let index = StyleIndex::build(sheet);
    let blocks = &content.blocks;
    let mut parts = Vec::with_capacity(blocks.len());

    let mut i = 0;
    while i < blocks.len() {
        if let Some(kind) = list_kind(&blocks[i]) {
            let start = list_start(&blocks[i]);
            let mut items = Vec::new();
            while let Some(Block::Paragraph(p)) = blocks.get(i) {
                if list_kind(&blocks[i]) != Some(kind) || list_start(&blocks[i]) != start {
                    break;
                }
                items.push(p);
                i += 1;
            }
            parts.push(render_list(&items, kind, &index));
            continue;
        }
        parts.push(render_block(&blocks[i], &index));
        i += 1;
    }
    Ok(parts.join("\n"))
}

fn list_kind(block: &Block) -> Option<(ListType, u32)> {
    match block {
        Block::Paragraph(p) => p.attrs.as_ref()?.list(),
        _ => None,
    }
}

/// Start value of an ordered item; bullet items have none.
fn list_start(block: &Block) -> Option<u32> {
    match block {
        Block::Paragraph(p) => p
            .attrs
            .as_ref()
            .filter(|a| a.list_type == Some(ListType::Ordered))
            .map(|a| a.list_start.unwrap_or(1)),
        _ => None,
    }
}

fn render_block(block: &Block, index: &StyleIndex) -> String {
    match block {
        Block::Paragraph(p) => render_paragraph(p, index),
        Block::Heading(h) => render_heading(h, index),
        Block::Image(img) => render_image(img, index),
        Block::Table(t) => render_table(t, index),
        Block::Code(c) => render_code(c),
        Block::Divider(_) => "<hr>".to_string(),
    }
}

fn style_attr(css: &str) -> String {
    if css.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(css))
    }
}

fn block_css(index: &StyleIndex, id: &str) -> String {
    index.block(id).map(declaration_css).unwrap_or_default()
}

fn render_paragraph(p: &ParagraphBlock, index: &StyleIndex) -> String {
    format!(
        "<p{}>{}</p>",
        style_attr(&block_css(index, &p.id)),
        render_inline(&p.text, &p.marks)
    )
}

fn render_heading(h: &HeadingBlock, index: &StyleIndex) -> String {
    format!(
        "<h{level}{style}>{body}</h{level}>",
        level = h.level,
        style = style_attr(&block_css(index, &h.id)),
        body = render_inline(&h.text, &h.marks)
    )
}

fn render_list(items: &[&ParagraphBlock], (kind, level): (ListType, u32), index: &StyleIndex) -> String {
    let tag = if kind == ListType::Ordered { "ol" } else { "ul" };
    let mut open = format!("<{tag}");
    if kind == ListType::Ordered {
        let start = items
            .first()
            .and_then(|p| p.attrs.as_ref())
            .and_then(|a| a.list_start)
            .unwrap_or(1);
        if start != 1 {
            open.push_str(&format!(" start=\"{start}\""));
        }
    }
    if level > 0 {
        open.push_str(&format!(" style=\"margin-left: {}em\"", level * 2));
    }
    open.push('>');

    let mut out = vec![open];
    for p in items {
        out.push(format!(
            "<li{}>{}</li>",
            style_attr(&block_css(index, &p.id)),
            render_inline(&p.text, &p.marks)
        ));
    }
    out.push(format!("</{tag}>"));
    out.join("\n")
}

fn render_image(img: &ImageBlock, index: &StyleIndex) -> String {
    let mut out = format!("<img src=\"{}\"", escape_html(&img.src));
    if let Some(meta) = &img.meta {
        if let Some(alt) = &meta.alt {
            out.push_str(&format!(" alt=\"{}\"", escape_html(alt)));
        }
        if let Some(w) = &meta.width {
            out.push_str(&format!(" width=\"{}\"", escape_html(&w.as_css())));
        }
        if let Some(h) = &meta.height {
            out.push_str(&format!(" height=\"{}\"", escape_html(&h.as_css())));
        }
    }
    out.push_str(&style_attr(&block_css(index, &img.id)));
    out.push_str(" />");
    out
}

fn render_code(code: &CodeBlock) -> String {
    let class = code
        .language
        .as_deref()
        .map(|l| format!(" class=\"language-{}\"", escape_html(l)))
        .unwrap_or_default();
    format!("<pre><code{class}>{}</code></pre>", escape_html(&code.text))
}

fn render_table(table: &TableBlock, index: &StyleIndex) -> String {
    let data = &table.data;
    let geometry = TableGeometry::new(data);

    let mut table_css = vec!["border-collapse: collapse".to_string()];
    if let Some(decl) = index.block(&table.id) {
        if let Some(w) = &decl.width {
            table_css.push(format!("width: {}", w.as_css_px()));
        }
        if let Some(bw) = decl.border_width {
            table_css.push(format!("border-width: {bw}px"));
        }
        if let Some(bs) = &decl.border_style {
            table_css.push(format!("border-style: {bs}"));
        }
        if let Some(bc) = &decl.border_color {
            table_css.push(format!("border-color: {bc}"));
        }
        if let Some(layout) = decl.table_layout {
            let v = match layout {
                crate::style::TableLayout::Auto => "auto",
                crate::style::TableLayout::Fixed => "fixed",
            };
            table_css.push(format!("table-layout: {v}"));
        }
    }

    let mut out = vec![format!("<table{}>", style_attr(&table_css.join("; ")))];

    if index.has_column_widths(&table.id, data.cols) {
        let mut colgroup = String::from("<colgroup>");
        for c in 0..data.cols {
            match index.column_width(&table.id, c) {
                Some(w) => colgroup.push_str(&format!("<col width=\"{}\">", escape_html(&w.as_css()))),
                None => colgroup.push_str("<col>"),
            }
        }
        colgroup.push_str("</colgroup>");
        out.push(colgroup);
    }

    for r in 0..data.rows {
        out.push("  <tr>".to_string());
        for c in 0..data.cols {
            let (rowspan, colspan) = match geometry.slot(r, c) {
                Slot::Covered { .. } => continue,
                Slot::Master { rowspan, colspan } => (rowspan, colspan),
            };
            let tag = if r == 0 { "th" } else { "td" };
            let Some(cell) = geometry.cell(data, r, c) else {
                out.push(format!("    <{tag}></{tag}>"));
                continue;
            };
            let mut attrs = String::new();
            if rowspan > 1 {
                attrs.push_str(&format!(" rowspan=\"{rowspan}\""));
            }
            if colspan > 1 {
                attrs.push_str(&format!(" colspan=\"{colspan}\""));
            }
            if colspan == 1 {
                if let Some(w) = index.column_width(&table.id, c) {
                    attrs.push_str(&format!(" width=\"{}\"", escape_html(&w.as_css())));
                }
            }
            let mut css = vec![CELL_BASE_STYLE.to_string()];
            if let Some(decl) = cell.style_id.as_deref().and_then(|id| index.block(id)) {
                css.extend(cell_css(decl));
            }
            attrs.push_str(&style_attr(&css.join("; ")));
            out.push(format!(
                "    <{tag}{attrs}>{}</{tag}>",
                render_inline(&cell.content.text, &cell.content.marks)
            ));
        }
        out.push("  </tr>".to_string());
    }
    out.push("</table>".to_string());
    out.join("\n")
}

fn cell_css(decl: &StyleDeclaration) -> Vec<String> {
    let mut css = Vec::new();
    if let Some(a) = decl.text_align {
        css.push(format!("text-align: {}", a.as_css()));
    }
    if let Some(v) = decl.vertical_align {
        css.push(format!("vertical-align: {}", v.as_css()));
    }
    if let Some(ff) = &decl.font_family {
        css.push(format!("font-family: {ff}"));
    }
    if let Some(fs) = decl.font_size {
        css.push(format!("font-size: {fs}px"));
    }
    if let Some(fw) = &decl.font_weight {
        css.push(format!("font-weight: {}", fw.as_css()));
    }
    if let Some(color) = &decl.color {
        css.push(format!("color: {color}"));
    }
    if let Some(bg) = &decl.background_color {
        css.push(format!("background-color: {bg}"));
    }
    css
}

/// Inline CSS for a block declaration. Integer spacing values are points.
pub fn declaration_css(decl: &StyleDeclaration) -> String {
    let mut css: Vec<String> = Vec::new();
    if let Some(a) = decl.text_align {
        css.push(format!("text-align: {}", a.as_css()));
    }
    if let Some(fs) = decl.font_size {
        css.push(format!("font-size: {fs}px"));
    }
    if let Some(color) = &decl.color {
        css.push(format!("color: {color}"));
    }
    if let Some(bg) = &decl.background_color {
        css.push(format!("background-color: {bg}"));
    }
    if let Some(lh) = decl.line_height {
        css.push(format!("line-height: {lh}"));
    }
    if let Some(indent) = &decl.text_indent {
        css.push(format!("text-indent: {}", indent.as_css_px()));
    }
    let spacing = [
        ("margin-top", decl.margin_top),
        ("margin-bottom", decl.margin_bottom),
        ("padding-top", decl.padding_top),
        ("padding-bottom", decl.padding_bottom),
        ("padding-left", decl.padding_left),
        ("padding-right", decl.padding_right),
    ];
    for (prop, value) in spacing {
        if let Some(v) = value {
            css.push(format!("{prop}: {v}pt"));
        }
    }
    if let Some(w) = &decl.width {
        css.push(format!("width: {}", w.as_css_px()));
    }
    if let Some(h) = &decl.height {
        css.push(format!("height: {}", h.as_css_px()));
    }
    if let Some(bw) = decl.border_width {
        css.push(format!("border-width: {bw}px"));
    }
    if let Some(bs) = &decl.border_style {
        css.push(format!("border-style: {bs}"));
    }
    if let Some(bc) = &decl.border_color {
        css.push(format!("border-color: {bc}"));
    }
    css.join("; ")
}

fn simple_tag(name: SimpleMarkName) -> &'static str {
    match name {
        SimpleMarkName::Bold => "strong",
        SimpleMarkName::Italic => "em",
        SimpleMarkName::Underline => "u",
        SimpleMarkName::Strike => "s",
        SimpleMarkName::Code => "code",
        SimpleMarkName::Superscript => "sup",
        SimpleMarkName::Subscript => "sub",
    }
}

/// Marked-up text: simple tags innermost, one styled span around them, and a
/// link outermost.
pub fn render_inline(text: &str, marks: &[Mark]) -> String {
    let mut out = String::new();
    for run in resegment(text, marks) {
        let mut html = escape_html(&run.text).replace('\n', "<br>");
        for name in run.simple.iter().rev() {
            let tag = simple_tag(*name);
            html = format!("<{tag}>{html}</{tag}>");
        }
        let order = [
            ValueMarkName::Color,
            ValueMarkName::BackgroundColor,
            ValueMarkName::FontSize,
            ValueMarkName::FontFamily,
        ];
        let style: String = order
            .iter()
            .filter_map(|n| run.value(*n).map(|v| format!("{}: {};", n.css_property(), v)))
            .collect();
        if !style.is_empty() {
            html = format!("<span style=\"{}\">{html}</span>", escape_html(&style));
        }
        if let Some(href) = &run.link {
            html = format!("<a href=\"{}\">{html}</a>", escape_html(href));
        }
        out.push_str(&html);
    }
    out
}
