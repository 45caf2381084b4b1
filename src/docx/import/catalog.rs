//! Lookups built from `styles.xml` and `numbering.xml`: which paragraph
//! styles are headings, and which list instances are bullets.

use super::wml::{wml, wml_attr, NS_W};
use crate::error::Result;
use crate::model::ListType;
use std::collections::HashMap;

const MAX_STYLE_DEPTH: usize = 10;

#[derive(Debug, Default)]
struct StyleEntry {
    based_on: Option<String>,
    heading: Option<u8>,
}

/// Heading level per paragraph style id, following `basedOn` chains, plus
/// the document-wide run defaults.
#[derive(Debug, Default)]
pub struct StyleCatalog {
    styles: HashMap<String, StyleEntry>,
    pub default_font: Option<String>,
    pub default_half_points: Option<i64>,
}

/// Level from a style name such as "heading 2", "Heading 2", "标题 2" or "标题2".
pub fn heading_level_from_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let lower = name.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("heading")
        .or_else(|| name.strip_prefix("标题"))?;
    let n: u8 = rest.trim().parse().ok()?;
    (1..=6).contains(&n).then_some(n)
}

/// Explicit face of a `w:rFonts` element; theme references are ignored.
pub fn font_name<'a>(rfonts: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    ["ascii", "hAnsi", "eastAsia", "cs"]
        .iter()
        .filter_map(|a| rfonts.attribute((NS_W, *a)))
        .find(|f| !f.trim().is_empty())
}

/// `w:outlineLvl` is zero-based; 9 means body text.
pub fn outline_level(val: &str) -> Option<u8> {
    let n: u8 = val.trim().parse().ok()?;
    (n < 6).then_some(n + 1)
}

impl StyleCatalog {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut catalog = StyleCatalog::default();
        let defaults = wml(doc.root_element(), "docDefaults")
            .and_then(|d| wml(d, "rPrDefault"))
            .and_then(|d| wml(d, "rPr"));
        if let Some(rpr) = defaults {
            catalog.default_font = wml(rpr, "rFonts").and_then(font_name).map(str::to_string);
            catalog.default_half_points = wml_attr(rpr, "sz").and_then(|v| v.parse().ok());
        }
        for style in doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name((NS_W, "style")))
        {
            if style.attribute((NS_W, "type")) != Some("paragraph") {
                continue;
            }
            let Some(id) = style.attribute((NS_W, "styleId")) else {
                continue;
            };
            let heading = wml_attr(style, "name")
                .and_then(heading_level_from_name)
                .or_else(|| heading_level_from_name(id))
                .or_else(|| {
                    wml(style, "pPr")
                        .and_then(|ppr| wml_attr(ppr, "outlineLvl"))
                        .and_then(outline_level)
                });
            catalog.styles.insert(
                id.to_string(),
                StyleEntry {
                    based_on: wml_attr(style, "basedOn").map(str::to_string),
                    heading,
                },
            );
        }
        Ok(catalog)
    }

    /// Heading level of a style id. Ids that are missing from the catalog are
    /// matched by name so documents without `styles.xml` still work.
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        let mut current = style_id;
        for _ in 0..MAX_STYLE_DEPTH {
            let Some(entry) = self.styles.get(current) else {
                return heading_level_from_name(current);
            };
            if entry.heading.is_some() {
                return entry.heading;
            }
            current = entry.based_on.as_deref()?;
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LevelFormat {
    num_fmt: String,
    start: Option<u32>,
}

/// List kind and start value per `(numId, ilvl)`.
#[derive(Debug, Default)]
pub struct ListCatalog {
    abstract_levels: HashMap<String, HashMap<u32, LevelFormat>>,
    nums: HashMap<String, (String, HashMap<u32, u32>)>,
}

impl ListCatalog {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut catalog = ListCatalog::default();
        let root = doc.root_element();
        for abs in root
            .children()
            .filter(|n| n.has_tag_name((NS_W, "abstractNum")))
        {
            let Some(abs_id) = abs.attribute((NS_W, "abstractNumId")) else {
                continue;
            };
            let mut levels = HashMap::new();
            for lvl in abs.children().filter(|n| n.has_tag_name((NS_W, "lvl"))) {
                let Some(ilvl) = lvl.attribute((NS_W, "ilvl")).and_then(|v| v.parse().ok()) else {
                    continue;
                };
                levels.insert(
                    ilvl,
                    LevelFormat {
                        num_fmt: wml_attr(lvl, "numFmt").unwrap_or("decimal").to_string(),
                        start: wml_attr(lvl, "start").and_then(|v| v.parse().ok()),
                    },
                );
            }
            catalog.abstract_levels.insert(abs_id.to_string(), levels);
        }
        for num in root.children().filter(|n| n.has_tag_name((NS_W, "num"))) {
            let (Some(num_id), Some(abs_id)) = (
                num.attribute((NS_W, "numId")),
                wml_attr(num, "abstractNumId"),
            ) else {
                continue;
            };
            let mut overrides = HashMap::new();
            for ov in num
                .children()
                .filter(|n| n.has_tag_name((NS_W, "lvlOverride")))
            {
                let ilvl = ov.attribute((NS_W, "ilvl")).and_then(|v| v.parse().ok());
                let start = wml_attr(ov, "startOverride").and_then(|v| v.parse().ok());
                if let (Some(ilvl), Some(start)) = (ilvl, start) {
                    overrides.insert(ilvl, start);
                }
            }
            catalog
                .nums
                .insert(num_id.to_string(), (abs_id.to_string(), overrides));
        }
        Ok(catalog)
    }

    /// Unknown instances are treated as bullets.
    pub fn list_kind(&self, num_id: &str, ilvl: u32) -> (ListType, Option<u32>) {
        let Some((abs_id, overrides)) = self.nums.get(num_id) else {
            return (ListType::Bullet, None);
        };
        let level = self.abstract_levels.get(abs_id).and_then(|l| l.get(&ilvl));
        match level {
            Some(l) if l.num_fmt != "bullet" && l.num_fmt != "none" => {
                let start = overrides.get(&ilvl).copied().or(l.start);
                (ListType::Ordered, start)
            }
            _ => (ListType::Bullet, None),
        }
    }
}
