use richdoc::model::{Block, MarkKind, MergeType, TargetBlockType, ValueMarkName};
use richdoc::{parse_html, render_html, StyleSheet};

const EDITOR_HTML: &str = r#"
<h1 style="text-align: center">Report</h1>
<p>Plain <strong>bold</strong> and <span style="color: #ff0000; font-size: 14pt">red</span> text<br>second line</p>
<ul><li>first</li><li>second</li></ul>
<ol start="3"><li>third</li></ol>
<table>
  <tr><td rowspan="2" colspan="2" style="background-color: #eeeeee">M</td><td>a</td></tr>
  <tr><td>b</td></tr>
  <tr><td>c</td><td>d</td><td>e</td></tr>
</table>
<hr>
<pre><code class="language-rust">let x = 1;</code></pre>
"#;

fn summary(blocks: &[Block]) -> Vec<(String, String)> {
    blocks
        .iter()
        .map(|b| {
            let text = match b {
                Block::Paragraph(p) => p.text.clone(),
                Block::Heading(h) => format!("{}:{}", h.level, h.text),
                Block::Code(c) => c.text.clone(),
                Block::Table(t) => format!("{}x{}", t.data.rows, t.data.cols),
                _ => String::new(),
            };
            (b.type_name().to_string(), text)
        })
        .collect()
}

#[test]
fn parse_render_parse_is_stable() {
    let (content, sheet) = parse_html(EDITOR_HTML);
    let html = render_html(&content, &sheet).unwrap();
    let (again, sheet_again) = parse_html(&html);

    assert_eq!(summary(&content.blocks), summary(&again.blocks));
    // rendering adds `border-collapse` to every table, so only compare the rest
    let non_table = |s: &StyleSheet| {
        s.rules
            .iter()
            .filter(|r| r.target.block_type != Some(TargetBlockType::Table))
            .count()
    };
    assert_eq!(non_table(&sheet), non_table(&sheet_again));

    for (a, b) in content.blocks.iter().zip(&again.blocks) {
        match (a, b) {
            (Block::Paragraph(x), Block::Paragraph(y)) => {
                assert_eq!(x.marks, y.marks);
                assert_eq!(x.attrs, y.attrs);
            }
            (Block::Heading(x), Block::Heading(y)) => assert_eq!(x.marks, y.marks),
            (Block::Table(x), Block::Table(y)) => {
                assert_eq!(x.data.merge_regions, y.data.merge_regions);
                let cells = |t: &richdoc::model::TableBlock| {
                    t.data
                        .cells
                        .iter()
                        .map(|c| (c.position, c.content.text.clone()))
                        .collect::<Vec<_>>()
                };
                assert_eq!(cells(x), cells(y));
            }
            _ => {}
        }
    }
}

#[test]
fn parsed_model_carries_formatting_and_structure() {
    let (content, _) = parse_html(EDITOR_HTML);
    let Block::Paragraph(p) = &content.blocks[1] else {
        panic!("expected paragraph, got {:?}", content.blocks[1]);
    };
    assert_eq!(p.text, "Plain bold and red text\nsecond line");
    assert!(p.marks.iter().any(|m| m.start == 6
        && m.end == 10
        && m.kind == MarkKind::Simple(richdoc::model::SimpleMarkName::Bold)));
    assert!(p.marks.iter().any(|m| matches!(
        &m.kind,
        MarkKind::Value { name: ValueMarkName::Color, value } if value.eq_ignore_ascii_case("#ff0000")
    ) && (m.start, m.end) == (15, 18)));

    let table = content.tables().next().unwrap();
    assert_eq!((table.data.rows, table.data.cols), (3, 3));
    assert_eq!(table.data.merge_regions.len(), 1);
    assert_eq!(table.data.merge_regions[0].kind, MergeType::Rectangular);
    let positions: Vec<_> = table.data.cells.iter().map(|c| c.position).collect();
    for covered in [(0, 1), (1, 0), (1, 1)] {
        assert!(!positions.contains(&covered));
    }
}
