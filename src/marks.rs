//! Character-range marks: collection during tree walks, normalization, and
//! resegmentation into non-overlapping styled runs.

use crate::model::{Mark, MarkKind, SimpleMarkName, ValueMarkName};
use std::collections::BTreeSet;

/// A formatting fact active while walking a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkDescriptor {
    Simple(SimpleMarkName),
    Link(String),
    Value(ValueMarkName, String),
}

impl MarkDescriptor {
    fn to_mark(&self, start: usize, end: usize) -> Mark {
        match self {
            MarkDescriptor::Simple(name) => Mark::simple(start, end, *name),
            MarkDescriptor::Link(href) => Mark::link(start, end, href.clone()),
            MarkDescriptor::Value(name, value) => Mark::value(start, end, *name, value.clone()),
        }
    }
}

/// Accumulates text and one raw mark per active descriptor per text leaf.
#[derive(Debug, Default)]
pub struct MarkCollector {
    text: String,
    len: usize,
    marks: Vec<Mark>,
}

impl MarkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_text(&mut self, text: &str, active: &[MarkDescriptor]) {
        let n = text.chars().count();
        if n == 0 {
            return;
        }
        let start = self.len;
        self.text.push_str(text);
        self.len += n;
        for d in active {
            self.marks.push(d.to_mark(start, start + n));
        }
    }

    /// Text plus normalized marks.
    pub fn finish(self) -> (String, Vec<Mark>) {
        (self.text, normalize(self.marks))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MergeKey {
    Simple(SimpleMarkName),
    Link(String),
    Value(ValueMarkName, String),
    Unknown(String),
}

struct Merged {
    key: MergeKey,
    ranges: Vec<(usize, usize, usize)>,
}

/// Merges contiguous or overlapping marks of equal name and value, then folds
/// simple marks sharing one exact range into a composite mark.
///
/// Output order follows the first raw mark contributing to each result, so
/// nesting decided later stays stable.
pub fn normalize(marks: Vec<Mark>) -> Vec<Mark> {
    let mut groups: Vec<Merged> = Vec::new();
    for (order, mark) in marks.into_iter().enumerate() {
        if mark.is_empty() {
            continue;
        }
        let keys: Vec<MergeKey> = match mark.kind {
            MarkKind::Simple(n) => vec![MergeKey::Simple(n)],
            MarkKind::Composite(names) => names.into_iter().map(MergeKey::Simple).collect(),
            MarkKind::Link { href } => vec![MergeKey::Link(href)],
            MarkKind::Value { name, value } => vec![MergeKey::Value(name, value)],
            MarkKind::Unknown(name) => vec![MergeKey::Unknown(name)],
        };
        for key in keys {
            match groups.iter_mut().find(|g| g.key == key) {
                Some(g) => g.ranges.push((mark.start, mark.end, order)),
                None => groups.push(Merged {
                    key,
                    ranges: vec![(mark.start, mark.end, order)],
                }),
            }
        }
    }

    // (start, end, order, key)
    let mut spans: Vec<(usize, usize, usize, MergeKey)> = Vec::new();
    for mut group in groups {
        group.ranges.sort_by_key(|r| (r.0, r.1));
        let mut current: Option<(usize, usize, usize)> = None;
        for (s, e, o) in group.ranges {
            current = match current {
                Some((cs, ce, co)) if s <= ce => Some((cs, ce.max(e), co.min(o))),
                Some(done) => {
                    spans.push((done.0, done.1, done.2, group.key.clone()));
                    Some((s, e, o))
                }
                None => Some((s, e, o)),
            };
        }
        if let Some(done) = current {
            spans.push((done.0, done.1, done.2, group.key.clone()));
        }
    }
    spans.sort_by_key(|s| (s.2, s.0, s.1));

    let mut out: Vec<(usize, Mark)> = Vec::new();
    for (start, end, order, key) in spans {
        let kind = match key {
            MergeKey::Simple(name) => {
                let existing = out.iter_mut().find(|(_, m)| {
                    m.start == start
                        && m.end == end
                        && matches!(m.kind, MarkKind::Simple(_) | MarkKind::Composite(_))
                });
                if let Some((_, m)) = existing {
                    m.kind = match std::mem::replace(&mut m.kind, MarkKind::Composite(Vec::new())) {
                        MarkKind::Simple(first) => {
                            let mut names = vec![first, name];
                            names.sort();
                            MarkKind::Composite(names)
                        }
                        MarkKind::Composite(mut names) => {
                            names.push(name);
                            names.sort();
                            MarkKind::Composite(names)
                        }
                        other => other,
                    };
                    continue;
                }
                MarkKind::Simple(name)
            }
            MergeKey::Link(href) => MarkKind::Link { href },
            MergeKey::Value(name, value) => MarkKind::Value { name, value },
            MergeKey::Unknown(name) => MarkKind::Unknown(name),
        };
        out.push((order, Mark { start, end, kind }));
    }
    out.into_iter().map(|(_, m)| m).collect()
}

/// One maximal range of text with a fixed set of active marks.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Simple formatting, outermost first.
    pub simple: Vec<SimpleMarkName>,
    pub values: Vec<(ValueMarkName, String)>,
    pub link: Option<String>,
}

impl StyledRun {
    pub fn has(&self, name: SimpleMarkName) -> bool {
        self.simple.contains(&name)
    }

    pub fn value(&self, name: ValueMarkName) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Splits `text` at every mark boundary. Runs are contiguous, non-overlapping
/// and concatenate back to `text`.
///
/// Simple marks nest so the first mark wraps outermost and the last one
/// innermost. Out-of-bounds ranges are clipped, empty ranges dropped.
pub fn resegment(text: &str, marks: &[Mark]) -> Vec<StyledRun> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }
    let clipped: Vec<(usize, usize, &MarkKind)> = marks
        .iter()
        .map(|m| (m.start.min(len), m.end.min(len), &m.kind))
        .filter(|(s, e, kind)| s < e && !matches!(kind, MarkKind::Unknown(_)))
        .collect();

    let mut bounds: BTreeSet<usize> = BTreeSet::new();
    bounds.insert(0);
    bounds.insert(len);
    for (s, e, _) in &clipped {
        bounds.insert(*s);
        bounds.insert(*e);
    }
    let bounds: Vec<usize> = bounds.into_iter().collect();

    let mut runs = Vec::with_capacity(bounds.len());
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let mut simple = Vec::new();
        let mut values = Vec::new();
        let mut link = None;
        for (s, e, kind) in clipped.iter() {
            if *s > start || *e < end {
                continue;
            }
            match kind {
                MarkKind::Simple(n) => push_unique(&mut simple, *n),
                MarkKind::Composite(names) => {
                    for n in names {
                        push_unique(&mut simple, *n);
                    }
                }
                MarkKind::Link { href } => {
                    if link.is_none() {
                        link = Some(href.clone());
                    }
                }
                MarkKind::Value { name, value } => values.push((*name, value.clone())),
                MarkKind::Unknown(_) => {}
            }
        }
        runs.push(StyledRun {
            start,
            end,
            text: chars[start..end].iter().collect(),
            simple,
            values,
            link,
        });
    }
    runs
}

fn push_unique(v: &mut Vec<SimpleMarkName>, n: SimpleMarkName) {
    if !v.contains(&n) {
        v.push(n);
    }
}

/// Drops surrounding whitespace, shifting and clipping marks to match.
pub fn trim(text: &str, marks: Vec<Mark>) -> (String, Vec<Mark>) {
    trim_matching(text, marks, char::is_whitespace, true)
}

/// Drops trailing line breaks left by a final `<br>`.
pub fn trim_trailing_breaks(text: &str, marks: Vec<Mark>) -> (String, Vec<Mark>) {
    trim_matching(text, marks, |c| c == '\n', false)
}

fn trim_matching(
    text: &str,
    marks: Vec<Mark>,
    pred: impl Fn(char) -> bool,
    leading: bool,
) -> (String, Vec<Mark>) {
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;
    let mut end = chars.len();
    if leading {
        while start < end && pred(chars[start]) {
            start += 1;
        }
    }
    while end > start && pred(chars[end - 1]) {
        end -= 1;
    }
    if start == 0 && end == chars.len() {
        return (text.to_string(), marks);
    }
    let trimmed: String = chars[start..end].iter().collect();
    let marks = marks
        .into_iter()
        .filter_map(|m| {
            let s = m.start.clamp(start, end) - start;
            let e = m.end.clamp(start, end) - start;
            (s < e).then_some(Mark {
                start: s,
                end: e,
                kind: m.kind,
            })
        })
        .collect();
    (trimmed, marks)
}

/// Shifts marks by `offset` characters (used when concatenating texts).
pub fn shift(marks: &[Mark], offset: usize) -> Vec<Mark> {
    marks
        .iter()
        .map(|m| Mark {
            start: m.start + offset,
            end: m.end + offset,
            kind: m.kind.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut marks: Vec<Mark>) -> Vec<(usize, usize, String)> {
        let mut out: Vec<(usize, usize, String)> = marks
            .drain(..)
            .map(|m| (m.start, m.end, format!("{:?}", m.kind)))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn merges_adjacent_same_value_marks() {
        let marks = vec![
            Mark::value(0, 2, ValueMarkName::FontSize, "12pt"),
            Mark::value(2, 4, ValueMarkName::FontSize, "12pt"),
        ];
        let out = normalize(marks);
        assert_eq!(out, vec![Mark::value(0, 4, ValueMarkName::FontSize, "12pt")]);
    }

    #[test]
    fn keeps_different_values_and_gaps_apart() {
        let marks = vec![
            Mark::value(0, 2, ValueMarkName::Color, "red"),
            Mark::value(2, 4, ValueMarkName::Color, "blue"),
            Mark::simple(0, 1, SimpleMarkName::Bold),
            Mark::simple(2, 3, SimpleMarkName::Bold),
        ];
        let out = normalize(marks);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn folds_identical_ranges_into_composite() {
        let marks = vec![
            Mark::simple(0, 3, SimpleMarkName::Bold),
            Mark::simple(0, 3, SimpleMarkName::Italic),
            Mark::simple(0, 3, SimpleMarkName::Underline),
        ];
        let out = normalize(marks);
        assert_eq!(
            out,
            vec![Mark::new(
                0,
                3,
                MarkKind::Composite(vec![
                    SimpleMarkName::Bold,
                    SimpleMarkName::Italic,
                    SimpleMarkName::Underline
                ])
            )]
        );
    }

    #[test]
    fn normalization_is_idempotent_and_order_independent() {
        let a = vec![
            Mark::simple(0, 2, SimpleMarkName::Bold),
            Mark::simple(2, 5, SimpleMarkName::Bold),
            Mark::value(1, 3, ValueMarkName::Color, "#f00"),
            Mark::value(3, 6, ValueMarkName::Color, "#f00"),
            Mark::simple(0, 5, SimpleMarkName::Italic),
        ];
        let mut b = a.clone();
        b.reverse();
        let once = normalize(a);
        assert_eq!(normalize(once.clone()), once);
        assert_eq!(sorted(once), sorted(normalize(b)));
    }

    #[test]
    fn drops_empty_marks() {
        assert!(normalize(vec![Mark::simple(2, 2, SimpleMarkName::Bold)]).is_empty());
    }

    #[test]
    fn collector_offsets_count_chars() {
        let mut c = MarkCollector::new();
        c.push_text("你好", &[]);
        c.push_text("世界", &[MarkDescriptor::Simple(SimpleMarkName::Bold)]);
        assert_eq!(c.len(), 4);
        let (text, marks) = c.finish();
        assert_eq!(text, "你好世界");
        assert_eq!(marks, vec![Mark::simple(2, 4, SimpleMarkName::Bold)]);
    }

    #[test]
    fn trimming_shifts_marks() {
        let marks = vec![
            Mark::simple(0, 4, SimpleMarkName::Bold),
            Mark::simple(5, 7, SimpleMarkName::Italic),
        ];
        let (text, marks) = trim("  ab \n", marks);
        assert_eq!(text, "ab");
        assert_eq!(marks, vec![Mark::simple(0, 2, SimpleMarkName::Bold)]);

        let (text, marks) = trim_trailing_breaks(" x\n", vec![Mark::simple(0, 3, SimpleMarkName::Code)]);
        assert_eq!(text, " x");
        assert_eq!(marks, vec![Mark::simple(0, 2, SimpleMarkName::Code)]);
    }

    #[test]
    fn resegment_covers_text_exactly() {
        let text = "Hello, wörld!";
        let marks = vec![
            Mark::simple(0, 5, SimpleMarkName::Bold),
            Mark::simple(3, 9, SimpleMarkName::Italic),
            Mark::value(7, 40, ValueMarkName::Color, "red"),
            Mark::simple(4, 4, SimpleMarkName::Code),
        ];
        let runs = resegment(text, &marks);
        let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined, text);
        let mut pos = 0;
        for r in &runs {
            assert_eq!(r.start, pos);
            assert!(r.end > r.start);
            pos = r.end;
        }
        assert_eq!(pos, text.chars().count());

        let mid = runs.iter().find(|r| r.start == 3).unwrap();
        assert!(mid.has(SimpleMarkName::Bold) && mid.has(SimpleMarkName::Italic));
        let tail = runs.last().unwrap();
        assert_eq!(tail.value(ValueMarkName::Color), Some("red"));
    }

    #[test]
    fn resegment_nests_first_mark_outermost_and_expands_composites() {
        let marks = vec![
            Mark::simple(0, 4, SimpleMarkName::Bold),
            Mark::new(
                0,
                4,
                MarkKind::Composite(vec![SimpleMarkName::Italic, SimpleMarkName::Underline]),
            ),
            Mark::link(0, 4, "https://x.test"),
        ];
        let runs = resegment("text", &marks);
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0].simple,
            vec![
                SimpleMarkName::Bold,
                SimpleMarkName::Italic,
                SimpleMarkName::Underline
            ]
        );
        assert_eq!(runs[0].link.as_deref(), Some("https://x.test"));
    }
}
