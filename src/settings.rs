//! Export-time document settings and import configuration.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_FONT: &str = "Microsoft YaHei";
pub const DEFAULT_CHAPTER_TITLE: &str = "默认章节";
pub const ENV_MAX_HEADING_LEVEL: &str = "DOCX_IMPORT_MAX_HEADING_LEVEL";
pub const ENV_DEFAULT_CHAPTER_TITLE: &str = "DOCX_IMPORT_DEFAULT_CHAPTER_TITLE";

/// Paragraph template for one heading level. Sizes and spacing are points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingStyle {
    pub font_size: f64,
    #[serde(default = "default_font")]
    pub font_family: String,
    #[serde(default = "default_weight")]
    pub font_weight: String,
    #[serde(default = "default_heading_color")]
    pub color: String,
    #[serde(default)]
    pub margin_top: f64,
    #[serde(default)]
    pub margin_bottom: f64,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_weight() -> String {
    "bold".to_string()
}

fn default_heading_color() -> String {
    "#333333".to_string()
}

impl HeadingStyle {
    fn preset(font_size: f64, margin_top: f64, margin_bottom: f64) -> Self {
        HeadingStyle {
            font_size,
            font_family: default_font(),
            font_weight: default_weight(),
            color: default_heading_color(),
            margin_top,
            margin_bottom,
        }
    }

    pub fn is_bold(&self) -> bool {
        let w = self.font_weight.trim().to_ascii_lowercase();
        w == "bold" || w == "bolder" || w.parse::<u32>().map(|n| n >= 600).unwrap_or(false)
    }
}

pub fn default_heading_styles() -> BTreeMap<String, HeadingStyle> {
    [
        ("h1", HeadingStyle::preset(22.0, 17.0, 16.5)),
        ("h2", HeadingStyle::preset(16.0, 13.0, 13.0)),
        ("h3", HeadingStyle::preset(14.0, 13.0, 13.0)),
        ("h4", HeadingStyle::preset(12.0, 12.0, 12.0)),
        ("h5", HeadingStyle::preset(10.5, 10.0, 10.0)),
        ("h6", HeadingStyle::preset(9.0, 9.0, 9.0)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Per-level number format for text-prefix heading numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Chinese,
    Number,
    NumberDot,
    Hierarchical,
    Parenthesis,
    Circled,
    Chapter,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingNumberingStyle {
    #[serde(default)]
    pub enabled: bool,
    /// Preset name, `style1` through `style4`.
    #[serde(default, alias = "preset", skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Explicit per-level formats, used when no known preset is named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<BTreeMap<u8, NumberFormat>>,
    /// Emit a native multilevel list instead of literal prefixes.
    #[serde(default, alias = "useNativeNumbering")]
    pub use_auto_numbering: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    #[serde(default = "default_vertical_margin")]
    pub margin_top: f64,
    #[serde(default = "default_vertical_margin")]
    pub margin_bottom: f64,
    #[serde(default = "default_horizontal_margin")]
    pub margin_left: f64,
    #[serde(default = "default_horizontal_margin")]
    pub margin_right: f64,
    #[serde(default = "default_heading_styles")]
    pub heading_styles: BTreeMap<String, HeadingStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_numbering_style: Option<HeadingNumberingStyle>,
}

fn default_vertical_margin() -> f64 {
    2.54
}

fn default_horizontal_margin() -> f64 {
    3.17
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            margin_top: default_vertical_margin(),
            margin_bottom: default_vertical_margin(),
            margin_left: default_horizontal_margin(),
            margin_right: default_horizontal_margin(),
            heading_styles: default_heading_styles(),
            heading_numbering_style: None,
        }
    }
}

impl DocumentSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: DocumentSettings = serde_json::from_str(json)
            .map_err(|e| ConvertError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let margins = [
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
        ];
        for (name, v) in margins {
            if !v.is_finite() || v < 0.0 {
                return Err(ConvertError::Settings(format!("{name} must be >= 0, got {v}")));
            }
        }
        for (key, style) in &self.heading_styles {
            if heading_key_level(key).is_none() {
                return Err(ConvertError::Settings(format!("unknown heading style key {key}")));
            }
            if !(1.0..=100.0).contains(&style.font_size) {
                return Err(ConvertError::Settings(format!(
                    "{key} font size {} outside 1..100pt",
                    style.font_size
                )));
            }
            if style.margin_top < 0.0 || style.margin_bottom < 0.0 {
                return Err(ConvertError::Settings(format!("{key} spacing must be >= 0")));
            }
        }
        Ok(())
    }

    pub fn heading_style(&self, level: u8) -> Option<&HeadingStyle> {
        self.heading_styles.get(&format!("h{level}"))
    }
}

fn heading_key_level(key: &str) -> Option<u8> {
    let n: u8 = key.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&n).then_some(n)
}

/// How imported documents are split into chapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub max_heading_level: u8,
    pub default_chapter_title: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            max_heading_level: 2,
            default_chapter_title: DEFAULT_CHAPTER_TITLE.to_string(),
        }
    }
}

impl ImportConfig {
    pub fn new(max_heading_level: u8, default_chapter_title: impl Into<String>) -> Result<Self> {
        let config = ImportConfig {
            max_heading_level,
            default_chapter_title: default_chapter_title.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `DOCX_IMPORT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ImportConfig::default();
        if let Some(level) = lookup(ENV_MAX_HEADING_LEVEL) {
            config.max_heading_level = level.trim().parse().map_err(|_| {
                ConvertError::Validation(format!("{ENV_MAX_HEADING_LEVEL}={level} is not a number"))
            })?;
        }
        if let Some(title) = lookup(ENV_DEFAULT_CHAPTER_TITLE) {
            if !title.trim().is_empty() {
                config.default_chapter_title = title;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.max_heading_level) {
            return Err(ConvertError::Validation(format!(
                "max_heading_level must be within 1..6, got {}",
                self.max_heading_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_presets() {
        let s = DocumentSettings::default();
        assert_eq!(s.margin_top, 2.54);
        assert_eq!(s.margin_left, 3.17);
        let h5 = s.heading_style(5).unwrap();
        assert_eq!(h5.font_size, 10.5);
        assert_eq!(h5.font_family, "Microsoft YaHei");
        assert!(h5.is_bold());
        assert!(s.heading_style(7).is_none());
    }

    #[test]
    fn parses_partial_settings() {
        let s = DocumentSettings::from_json(
            r##"{"margin_top": 3.0, "heading_styles": {"h1": {"fontSize": 30, "color": "#ff0000"}},
                 "heading_numbering_style": {"enabled": true, "preset": "style3", "useNativeNumbering": true}}"##,
        )
        .unwrap();
        assert_eq!(s.margin_top, 3.0);
        assert_eq!(s.margin_left, 3.17);
        assert_eq!(s.heading_styles.len(), 1);
        let n = s.heading_numbering_style.unwrap();
        assert_eq!(n.style.as_deref(), Some("style3"));
        assert!(n.use_auto_numbering);
    }

    #[test]
    fn rejects_malformed_settings() {
        assert!(matches!(
            DocumentSettings::from_json(r#"{"margin_top": -1}"#),
            Err(ConvertError::Settings(_))
        ));
        assert!(matches!(
            DocumentSettings::from_json(r#"{"heading_styles": {"h9": {"fontSize": 12}}}"#),
            Err(ConvertError::Settings(_))
        ));
        assert!(matches!(
            DocumentSettings::from_json(r#"{"heading_styles": {"h1": {"fontSize": 0}}}"#),
            Err(ConvertError::Settings(_))
        ));
    }

    #[test]
    fn import_config_from_environment_values() {
        let c = ImportConfig::from_lookup(|k| match k {
            ENV_MAX_HEADING_LEVEL => Some("3".into()),
            ENV_DEFAULT_CHAPTER_TITLE => Some("Preface".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.max_heading_level, 3);
        assert_eq!(c.default_chapter_title, "Preface");

        assert!(ImportConfig::from_lookup(|_| None).unwrap() == ImportConfig::default());
        assert!(ImportConfig::from_lookup(|k| (k == ENV_MAX_HEADING_LEVEL).then(|| "9".into())).is_err());
        assert!(ImportConfig::new(0, "x").is_err());
    }
}
