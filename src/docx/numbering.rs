//! Heading numbering (literal prefixes or a native multilevel list) and the
//! `numbering.xml` part shared with bullet and ordered lists.

use super::xml::{escape, NS_W, XML_DECL};
use crate::settings::{HeadingNumberingStyle, NumberFormat};

pub const BULLET_NUM_ID: u32 = 1;
pub const HEADING_NUM_ID: u32 = 2;
const FIRST_ORDERED_NUM_ID: u32 = 3;

const ABSTRACT_BULLET: u32 = 1;
const ABSTRACT_DECIMAL: u32 = 2;
const ABSTRACT_HEADING: u32 = 3;

const CHINESE_DIGITS: [&str; 11] = ["零", "一", "二", "三", "四", "五", "六", "七", "八", "九", "十"];
const CIRCLED: [&str; 10] = ["①", "②", "③", "④", "⑤", "⑥", "⑦", "⑧", "⑨", "⑩"];

use NumberFormat::{Chapter, Chinese, Circled, Hierarchical, Number, NumberDot, Parenthesis};

fn preset_formats(name: &str) -> Option<[NumberFormat; 6]> {
    match name {
        "style1" => Some([Chinese, Hierarchical, Parenthesis, Hierarchical, Parenthesis, Circled]),
        "style2" => Some([Number, Hierarchical, Hierarchical, Hierarchical, Hierarchical, Hierarchical]),
        "style3" => Some([NumberDot, Hierarchical, Hierarchical, Hierarchical, Hierarchical, Hierarchical]),
        "style4" => Some([Chapter, Hierarchical, Hierarchical, Hierarchical, Hierarchical, Hierarchical]),
        _ => None,
    }
}

/// Chinese numerals for 1..=99; larger values fall back to digits.
pub fn to_chinese(n: u32) -> String {
    match n {
        0 => CHINESE_DIGITS[0].to_string(),
        1..=10 => CHINESE_DIGITS[n as usize].to_string(),
        11..=19 => format!("十{}", CHINESE_DIGITS[(n - 10) as usize]),
        20..=99 => {
            let mut s = format!("{}十", CHINESE_DIGITS[(n / 10) as usize]);
            if n % 10 > 0 {
                s.push_str(CHINESE_DIGITS[(n % 10) as usize]);
            }
            s
        }
        _ => n.to_string(),
    }
}

/// Renders the prefix for the last counter in `path` (the full path is used
/// by hierarchical formats).
pub fn format_prefix(format: NumberFormat, path: &[u32]) -> String {
    let n = path.last().copied().unwrap_or(1);
    let dotted = || {
        path.iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".")
    };
    match format {
        Chinese => format!("{}、", to_chinese(n)),
        Number => format!("{n}、"),
        NumberDot => format!("{n}. "),
        Hierarchical => format!("{} ", dotted()),
        Parenthesis => format!("({n}) "),
        Circled => match CIRCLED.get((n as usize).wrapping_sub(1)) {
            Some(c) => format!("{c} "),
            None => format!("({n}) "),
        },
        Chapter if n <= 10 => format!("第{}章 ", to_chinese(n)),
        Chapter => format!("第{n}章 "),
        NumberFormat::None => String::new(),
    }
}

/// Counter stack for one export call.
#[derive(Debug, Clone, Default)]
pub struct HeadingCounters {
    counters: [u32; 6],
}

impl HeadingCounters {
    /// Advances the counter for `level` (1-based) and returns the path from
    /// level 1 down to it. Missing ancestors are seeded with 1 and every
    /// deeper counter is reset.
    pub fn enter(&mut self, level: u8) -> &[u32] {
        let idx = (level.clamp(1, 6) - 1) as usize;
        for c in &mut self.counters[..idx] {
            if *c == 0 {
                *c = 1;
            }
        }
        self.counters[idx] += 1;
        for c in &mut self.counters[idx + 1..] {
            *c = 0;
        }
        &self.counters[..=idx]
    }
}

/// Literal text prefixes inserted as the first run of each heading.
#[derive(Debug, Clone)]
pub struct TextNumbering {
    formats: [NumberFormat; 6],
    counters: HeadingCounters,
}

impl TextNumbering {
    pub fn new(formats: [NumberFormat; 6]) -> Self {
        TextNumbering {
            formats,
            counters: HeadingCounters::default(),
        }
    }

    pub fn prefix(&mut self, level: u8) -> String {
        let format = self.formats[(level.clamp(1, 6) - 1) as usize];
        format_prefix(format, self.counters.enter(level))
    }
}

/// Numbering mode chosen for one export.
#[derive(Debug, Clone)]
pub enum HeadingNumbering {
    Off,
    Text(TextNumbering),
    Native { preset: String },
}

impl HeadingNumbering {
    pub fn from_settings(style: Option<&HeadingNumberingStyle>) -> Self {
        let Some(style) = style.filter(|s| s.enabled) else {
            return HeadingNumbering::Off;
        };
        if style.use_auto_numbering {
            let preset = style
                .style
                .clone()
                .filter(|s| preset_formats(s).is_some())
                .unwrap_or_else(|| "style2".to_string());
            return HeadingNumbering::Native { preset };
        }
        if let Some(formats) = style.style.as_deref().and_then(preset_formats) {
            return HeadingNumbering::Text(TextNumbering::new(formats));
        }
        if let Some(map) = &style.formats {
            let mut formats = [Hierarchical; 6];
            for (level, format) in map {
                if (1..=6).contains(level) {
                    formats[(*level - 1) as usize] = *format;
                }
            }
            return HeadingNumbering::Text(TextNumbering::new(formats));
        }
        HeadingNumbering::Text(TextNumbering::new([
            Number,
            Hierarchical,
            Hierarchical,
            Hierarchical,
            Hierarchical,
            Hierarchical,
        ]))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, HeadingNumbering::Native { .. })
    }
}

struct NativeLevel {
    num_fmt: &'static str,
    lvl_text: String,
}

fn native_levels(preset: &str) -> Vec<NativeLevel> {
    let path = |depth: usize| {
        (1..=depth)
            .map(|i| format!("%{i}"))
            .collect::<Vec<_>>()
            .join(".")
    };
    (1..=6)
        .map(|depth| {
            let decimal = |text: String| NativeLevel {
                num_fmt: "decimal",
                lvl_text: text,
            };
            match (preset, depth) {
                ("style1", 1) => NativeLevel {
                    num_fmt: "chineseCounting",
                    lvl_text: "%1、".into(),
                },
                ("style1", 3) => decimal("(%3) ".into()),
                ("style1", 5) => decimal("(%5) ".into()),
                ("style1", 6) => NativeLevel {
                    num_fmt: "decimalEnclosedCircle",
                    lvl_text: "%6 ".into(),
                },
                ("style3", 1) => decimal("%1. ".into()),
                ("style4", 1) => NativeLevel {
                    num_fmt: "chineseCounting",
                    lvl_text: "第%1章 ".into(),
                },
                (_, 1) => decimal("%1、".into()),
                (_, d) => decimal(format!("{} ", path(d))),
            }
        })
        .collect()
}

/// Numbering instances allocated while the document body is written.
#[derive(Debug, Default)]
pub struct NumberingPart {
    ordered: Vec<(u32, u32)>,
    heading_preset: Option<String>,
}

impl NumberingPart {
    pub fn new(heading_preset: Option<String>) -> Self {
        NumberingPart {
            ordered: Vec::new(),
            heading_preset,
        }
    }

    /// A fresh ordered-list instance restarting at `start`.
    pub fn ordered_instance(&mut self, start: u32) -> u32 {
        let id = FIRST_ORDERED_NUM_ID + self.ordered.len() as u32;
        self.ordered.push((id, start.max(1)));
        id
    }

    pub fn to_xml(&self) -> String {
        let mut out = format!("{XML_DECL}\n<w:numbering xmlns:w=\"{NS_W}\">");

        out.push_str(&format!(
            "<w:abstractNum w:abstractNumId=\"{ABSTRACT_BULLET}\"><w:multiLevelType w:val=\"hybridMultilevel\"/>"
        ));
        let bullets = ["•", "○", "■"];
        for i in 0..9 {
            out.push_str(&list_level(i, "bullet", bullets[i % 3], 1));
        }
        out.push_str("</w:abstractNum>");

        out.push_str(&format!(
            "<w:abstractNum w:abstractNumId=\"{ABSTRACT_DECIMAL}\"><w:multiLevelType w:val=\"hybridMultilevel\"/>"
        ));
        let formats = ["decimal", "lowerLetter", "lowerRoman"];
        for i in 0..9 {
            out.push_str(&list_level(i, formats[i % 3], &format!("%{}.", i + 1), 1));
        }
        out.push_str("</w:abstractNum>");

        if let Some(preset) = &self.heading_preset {
            out.push_str(&format!(
                "<w:abstractNum w:abstractNumId=\"{ABSTRACT_HEADING}\"><w:multiLevelType w:val=\"multilevel\"/>"
            ));
            for (i, level) in native_levels(preset).into_iter().enumerate() {
                out.push_str(&format!(
                    "<w:lvl w:ilvl=\"{i}\"><w:start w:val=\"1\"/><w:numFmt w:val=\"{}\"/><w:suff w:val=\"space\"/><w:lvlText w:val=\"{}\"/><w:lvlJc w:val=\"left\"/><w:pPr><w:ind w:left=\"{}\" w:hanging=\"0\"/></w:pPr></w:lvl>",
                    level.num_fmt,
                    escape(&level.lvl_text),
                    i * 420
                ));
            }
            out.push_str("</w:abstractNum>");
        }

        out.push_str(&format!(
            "<w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"{ABSTRACT_BULLET}\"/></w:num>"
        ));
        if self.heading_preset.is_some() {
            out.push_str(&format!(
                "<w:num w:numId=\"{HEADING_NUM_ID}\"><w:abstractNumId w:val=\"{ABSTRACT_HEADING}\"/></w:num>"
            ));
        }
        for (id, start) in &self.ordered {
            out.push_str(&format!(
                "<w:num w:numId=\"{id}\"><w:abstractNumId w:val=\"{ABSTRACT_DECIMAL}\"/><w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"{start}\"/></w:lvlOverride></w:num>"
            ));
        }
        out.push_str("</w:numbering>");
        out
    }
}

fn list_level(ilvl: usize, num_fmt: &str, text: &str, start: u32) -> String {
    format!(
        "<w:lvl w:ilvl=\"{ilvl}\"><w:start w:val=\"{start}\"/><w:numFmt w:val=\"{num_fmt}\"/><w:lvlText w:val=\"{}\"/><w:lvlJc w:val=\"left\"/><w:pPr><w:ind w:left=\"{}\" w:hanging=\"360\"/></w:pPr></w:lvl>",
        escape(text),
        720 * (ilvl + 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_resets_deeper_counters() {
        let mut numbering = TextNumbering::new([Hierarchical; 6]);
        let prefixes: Vec<String> = [1, 2, 2, 3, 3, 1]
            .into_iter()
            .map(|l| numbering.prefix(l))
            .collect();
        assert_eq!(prefixes, ["1 ", "1.1 ", "1.2 ", "1.2.1 ", "1.2.2 ", "2 "]);
    }

    #[test]
    fn skipped_levels_seed_missing_ancestors() {
        let mut counters = HeadingCounters::default();
        assert_eq!(counters.enter(3), &[1, 1, 1]);
        assert_eq!(counters.enter(1), &[2]);
        assert_eq!(counters.enter(3), &[2, 1, 1]);
    }

    #[test]
    fn formats() {
        assert_eq!(format_prefix(Chinese, &[3]), "三、");
        assert_eq!(format_prefix(Chinese, &[21]), "二十一、");
        assert_eq!(format_prefix(Number, &[2]), "2、");
        assert_eq!(format_prefix(NumberDot, &[2]), "2. ");
        assert_eq!(format_prefix(Parenthesis, &[1, 4]), "(4) ");
        assert_eq!(format_prefix(Circled, &[2]), "② ");
        assert_eq!(format_prefix(Circled, &[11]), "(11) ");
        assert_eq!(format_prefix(Chapter, &[1]), "第一章 ");
        assert_eq!(format_prefix(Chapter, &[12]), "第12章 ");
        assert_eq!(format_prefix(NumberFormat::None, &[1]), "");
        assert_eq!(to_chinese(15), "十五");
        assert_eq!(to_chinese(40), "四十");
    }

    #[test]
    fn settings_pick_the_mode() {
        let mut style = HeadingNumberingStyle {
            enabled: true,
            style: Some("style1".into()),
            formats: None,
            use_auto_numbering: false,
        };
        let HeadingNumbering::Text(mut text) = HeadingNumbering::from_settings(Some(&style)) else {
            panic!("expected text numbering");
        };
        assert_eq!(text.prefix(1), "一、");
        assert_eq!(text.prefix(2), "1.1 ");

        style.use_auto_numbering = true;
        style.style = Some("unknown".into());
        assert!(matches!(
            HeadingNumbering::from_settings(Some(&style)),
            HeadingNumbering::Native { preset } if preset == "style2"
        ));

        style.enabled = false;
        assert!(matches!(
            HeadingNumbering::from_settings(Some(&style)),
            HeadingNumbering::Off
        ));
        assert!(matches!(HeadingNumbering::from_settings(None), HeadingNumbering::Off));
    }

    #[test]
    fn custom_formats_default_to_hierarchical() {
        let style = HeadingNumberingStyle {
            enabled: true,
            style: None,
            formats: Some([(1u8, Circled)].into_iter().collect()),
            use_auto_numbering: false,
        };
        let HeadingNumbering::Text(mut text) = HeadingNumbering::from_settings(Some(&style)) else {
            panic!("expected text numbering");
        };
        assert_eq!(text.prefix(1), "① ");
        assert_eq!(text.prefix(2), "1.1 ");
    }

    #[test]
    fn numbering_xml_carries_restarts_and_native_levels() {
        let mut part = NumberingPart::new(Some("style4".into()));
        assert_eq!(part.ordered_instance(5), 3);
        assert_eq!(part.ordered_instance(1), 4);
        let xml = part.to_xml();
        assert!(xml.contains("<w:startOverride w:val=\"5\"/>"));
        assert!(xml.contains("w:numId=\"4\""));
        assert!(xml.contains("第%1章 "));
        assert!(xml.contains("%1.%2.%3 "));
        assert!(roxmltree::Document::parse(&xml).is_ok());
    }
}
