//! `.docx` bytes → flat blocks, page settings and extracted images, then
//! a chapter hierarchy.

mod body;
mod catalog;
pub mod chapters;
pub mod images;
mod package;
mod wml;

use self::body::BodyConverter;
use self::catalog::{ListCatalog, StyleCatalog};
use self::chapters::{ChapterBuilder, ChapterData};
use self::images::{generate_filename, ImageStore};
use self::package::{part_name, DocxArchive, NUMBERING_PART, STYLES_PART};
use self::wml::{int_attr, wml, NS_W};
use crate::error::{ConvertError, Result};
use crate::model::{Content, StyleSheet};
use crate::settings::{DocumentSettings, ImportConfig};
use crate::units::{twips_to_cm, twips_to_pt};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page geometry of the last section: sizes in points, margins in
/// centimetres rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub page_width: Option<f64>,
    pub page_height: Option<f64>,
    pub orientation: Orientation,
    pub margin_top: Option<f64>,
    pub margin_bottom: Option<f64>,
    pub margin_left: Option<f64>,
    pub margin_right: Option<f64>,
}

impl PageSettings {
    fn read(sect_pr: roxmltree::Node) -> Self {
        let mut page = PageSettings::default();
        if let Some(size) = wml(sect_pr, "pgSz") {
            page.page_width = int_attr(size, "w").map(|v| twips_to_pt(v as f64));
            page.page_height = int_attr(size, "h").map(|v| twips_to_pt(v as f64));
            if size.attribute((NS_W, "orient")) == Some("landscape") {
                page.orientation = Orientation::Landscape;
            }
        }
        if let Some(margins) = wml(sect_pr, "pgMar") {
            let cm = |attr: &str| {
                int_attr(margins, attr).map(|v| (twips_to_cm(v as f64) * 100.0).round() / 100.0)
            };
            page.margin_top = cm("top");
            page.margin_bottom = cm("bottom");
            page.margin_left = cm("left");
            page.margin_right = cm("right");
        }
        page
    }

    /// Overwrites the margins present here.
    pub fn apply(&self, settings: &mut DocumentSettings) {
        let pairs = [
            (&mut settings.margin_top, self.margin_top),
            (&mut settings.margin_bottom, self.margin_bottom),
            (&mut settings.margin_left, self.margin_left),
            (&mut settings.margin_right, self.margin_right),
        ];
        for (slot, value) in pairs {
            if let Some(v) = value.filter(|v| v.is_finite() && *v >= 0.0) {
                *slot = v;
            }
        }
    }

    pub fn to_document_settings(&self) -> DocumentSettings {
        let mut settings = DocumentSettings::default();
        self.apply(&mut settings);
        settings
    }
}

/// A package read as one document.
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub content: Content,
    pub stylesheet: StyleSheet,
    pub page_settings: PageSettings,
    /// Stored path per image relationship id.
    pub images: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub page_settings: PageSettings,
    pub chapters: Vec<ChapterData>,
    pub images: BTreeMap<String, String>,
}

struct Parsed {
    blocks: Vec<crate::model::Block>,
    rules: Vec<body::OwnedRule>,
    page_settings: PageSettings,
    images: BTreeMap<String, String>,
}

fn parse_package(bytes: &[u8], store: &mut dyn ImageStore) -> Result<Parsed> {
    let mut archive = DocxArchive::open(bytes)?;
    let document_xml = archive.document_xml()?;
    let rels = archive.relationships()?;
    let content_types = archive.content_types()?;
    let styles = match archive.text_part(STYLES_PART)? {
        Some(xml) => StyleCatalog::parse(&xml)?,
        None => StyleCatalog::default(),
    };
    let lists = match archive.text_part(NUMBERING_PART)? {
        Some(xml) => ListCatalog::parse(&xml)?,
        None => ListCatalog::default(),
    };

    let doc = roxmltree::Document::parse(&document_xml)?;
    let body = wml(doc.root_element(), "body")
        .ok_or_else(|| ConvertError::Structural("document has no w:body".into()))?;

    let mut stored: HashMap<String, Option<String>> = HashMap::new();
    let mut image_path = |rel_id: &str| -> Option<String> {
        if let Some(known) = stored.get(rel_id) {
            return known.clone();
        }
        let path = rels
            .get(rel_id)
            .filter(|rel| rel.is_image() && !rel.external)
            .and_then(|rel| {
                let part = part_name(&rel.target);
                let data = match archive.part(&part) {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        warn!("image part {part} missing from package");
                        return None;
                    }
                    Err(e) => {
                        warn!("image part {part} unreadable: {e}");
                        return None;
                    }
                };
                let content_type = content_types.for_part(&part).unwrap_or("image/png");
                store
                    .store(&generate_filename(content_type), &data)
                    .map_err(|e| warn!("storing image {part} failed: {e}"))
                    .ok()
            });
        stored.insert(rel_id.to_string(), path.clone());
        path
    };

    let mut converter = BodyConverter::new(&styles, &lists, &rels, &mut image_path);
    converter.convert(body);
    let BodyConverter { blocks, rules, .. } = converter;

    let page_settings = body
        .children()
        .filter(|n| n.has_tag_name((NS_W, "sectPr")))
        .last()
        .map(PageSettings::read)
        .unwrap_or_default();
    let images = stored
        .into_iter()
        .filter_map(|(rel_id, path)| Some((rel_id, path?)))
        .collect();

    Ok(Parsed {
        blocks,
        rules,
        page_settings,
        images,
    })
}

/// Reads the whole package as one Content/StyleSheet pair.
pub fn read_docx(bytes: &[u8], store: &mut dyn ImageStore) -> Result<ImportedDocument> {
    let parsed = parse_package(bytes, store)?;
    let mut stylesheet = StyleSheet::default();
    stylesheet.rules = parsed.rules.into_iter().map(|r| r.rule).collect();
    Ok(ImportedDocument {
        content: Content::new(parsed.blocks),
        stylesheet,
        page_settings: parsed.page_settings,
        images: parsed.images,
    })
}

/// Imports a package and splits it into chapters at headings of level
/// `config.max_heading_level` or above.
pub fn import_docx(
    bytes: &[u8],
    config: &ImportConfig,
    store: &mut dyn ImageStore,
) -> Result<ImportResult> {
    config.validate()?;
    let parsed = parse_package(bytes, store)?;
    let block_count = parsed.blocks.len();
    let chapters = ChapterBuilder::new(config, parsed.rules).build(parsed.blocks);
    info!(
        "imported {} blocks into {} chapters ({} images)",
        block_count,
        chapters.len(),
        parsed.images.len()
    );
    Ok(ImportResult {
        page_settings: parsed.page_settings,
        chapters,
        images: parsed.images,
    })
}
