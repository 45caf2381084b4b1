//! Reading parts out of an OOXML zip: the main document, its relationships
//! and content types.

use crate::docx::xml::{NS_CT, NS_RELS};
use crate::error::{ConvertError, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// One `<Relationship>` of the main document.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn is_image(&self) -> bool {
        self.rel_type.ends_with("/image")
    }

    pub fn is_hyperlink(&self) -> bool {
        self.rel_type.ends_with("/hyperlink")
    }
}

pub struct DocxArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> DocxArchive<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        Ok(DocxArchive {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    /// Raw bytes of a part, `None` when the package has no such entry.
    pub fn part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.zip.by_name(name) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }

    pub fn text_part(&mut self, name: &str) -> Result<Option<String>> {
        match self.part(name)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| ConvertError::Structural(format!("{name} is not valid UTF-8"))),
            None => Ok(None),
        }
    }

    pub fn document_xml(&mut self) -> Result<String> {
        self.text_part(DOCUMENT_PART)?
            .ok_or_else(|| ConvertError::Structural(format!("missing {DOCUMENT_PART}")))
    }

    pub fn relationships(&mut self) -> Result<HashMap<String, Relationship>> {
        match self.text_part(DOCUMENT_RELS_PART)? {
            Some(xml) => parse_relationships(&xml),
            None => Ok(HashMap::new()),
        }
    }

    pub fn content_types(&mut self) -> Result<ContentTypes> {
        match self.text_part(CONTENT_TYPES_PART)? {
            Some(xml) => ContentTypes::parse(&xml),
            None => Ok(ContentTypes::default()),
        }
    }
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut rels = HashMap::new();
    for node in doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name((NS_RELS, "Relationship")))
    {
        let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) else {
            continue;
        };
        rels.insert(
            id.to_string(),
            Relationship {
                rel_type: node.attribute("Type").unwrap_or_default().to_string(),
                target: target.to_string(),
                external: node.attribute("TargetMode") == Some("External"),
            },
        );
    }
    Ok(rels)
}

/// Zip entry name for a relationship target of the main document.
pub fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for seg in target.split('/') {
                match seg {
                    "" | "." => {}
                    ".." => {
                        parts.pop();
                    }
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

/// `[Content_Types].xml`: per-part overrides and per-extension defaults.
#[derive(Debug, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut types = ContentTypes::default();
        for node in doc.root_element().children().filter(|n| n.is_element()) {
            let Some(content_type) = node.attribute("ContentType") else {
                continue;
            };
            if node.has_tag_name((NS_CT, "Default")) {
                if let Some(ext) = node.attribute("Extension") {
                    types
                        .defaults
                        .insert(ext.to_ascii_lowercase(), content_type.to_string());
                }
            } else if node.has_tag_name((NS_CT, "Override")) {
                if let Some(part) = node.attribute("PartName") {
                    types
                        .overrides
                        .insert(part.trim_start_matches('/').to_string(), content_type.to_string());
                }
            }
        }
        Ok(types)
    }

    pub fn for_part(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let ext = part.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }
}
