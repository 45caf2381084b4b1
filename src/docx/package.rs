//! OOXML package parts and the zip container.

use super::xml::{
    escape, NS_CT, NS_RELS, NS_W, REL_HYPERLINK, REL_IMAGE, REL_NUMBERING, REL_OFFICE_DOCUMENT,
    REL_STYLES, XML_DECL,
};
use crate::error::Result;
use crate::settings::{DocumentSettings, HeadingStyle, DEFAULT_FONT};
use crate::units::{pt_to_half_points, pt_to_twips};
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const FIRST_DYNAMIC_REL: u32 = 10;

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

/// Relationships of `word/document.xml`. Styles and numbering are fixed at
/// `rId1`/`rId2`; images and hyperlinks are allocated from `rId10`.
#[derive(Debug)]
pub struct Relationships {
    next: u32,
    dynamic: Vec<Relationship>,
    links: HashMap<String, String>,
}

impl Default for Relationships {
    fn default() -> Self {
        Relationships {
            next: FIRST_DYNAMIC_REL,
            dynamic: Vec::new(),
            links: HashMap::new(),
        }
    }
}

impl Relationships {
    fn push(&mut self, kind: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.next);
        self.next += 1;
        self.dynamic.push(Relationship {
            id: id.clone(),
            kind,
            target,
            external,
        });
        id
    }

    /// One relationship per distinct href.
    pub fn hyperlink(&mut self, href: &str) -> String {
        if let Some(id) = self.links.get(href) {
            return id.clone();
        }
        let id = self.push(REL_HYPERLINK, href.to_string(), true);
        self.links.insert(href.to_string(), id.clone());
        id
    }

    pub fn image(&mut self, media_name: &str) -> String {
        self.push(REL_IMAGE, format!("media/{media_name}"), false)
    }

    pub fn to_xml(&self) -> String {
        let mut out = format!("{XML_DECL}\n<Relationships xmlns=\"{NS_RELS}\">");
        out.push_str(&format!(
            "<Relationship Id=\"rId1\" Type=\"{REL_STYLES}\" Target=\"styles.xml\"/>"
        ));
        out.push_str(&format!(
            "<Relationship Id=\"rId2\" Type=\"{REL_NUMBERING}\" Target=\"numbering.xml\"/>"
        ));
        for rel in &self.dynamic {
            let mode = if rel.external { " TargetMode=\"External\"" } else { "" };
            out.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{mode}/>",
                rel.id,
                rel.kind,
                escape(&rel.target)
            ));
        }
        out.push_str("</Relationships>");
        out
    }
}

/// Embedded image bytes under `word/media/`.
#[derive(Debug, Default)]
pub struct Media {
    files: Vec<(String, Vec<u8>, &'static str)>,
}

impl Media {
    /// Stores the bytes and returns the file name (`image{n}.{ext}`).
    pub fn add(&mut self, bytes: Vec<u8>, ext: &str, content_type: &'static str) -> String {
        let name = format!("image{}.{ext}", self.files.len() + 1);
        self.files.push((name.clone(), bytes, content_type));
        name
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn content_types_xml(media: &Media) -> String {
    let mut out = format!("{XML_DECL}\n<Types xmlns=\"{NS_CT}\">");
    out.push_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>");
    out.push_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>");
    let mut seen = BTreeSet::new();
    for (name, _, content_type) in &media.files {
        let ext = name.rsplit('.').next().unwrap_or("png");
        if seen.insert(ext.to_string()) {
            out.push_str(&format!(
                "<Default Extension=\"{ext}\" ContentType=\"{content_type}\"/>"
            ));
        }
    }
    out.push_str("<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>");
    out.push_str("<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>");
    out.push_str("<Override PartName=\"/word/numbering.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml\"/>");
    out.push_str("</Types>");
    out
}

fn root_rels_xml() -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"{NS_RELS}\"><Relationship Id=\"rId1\" Type=\"{REL_OFFICE_DOCUMENT}\" Target=\"word/document.xml\"/></Relationships>"
    )
}

fn heading_style_xml(level: u8, style: &HeadingStyle, native_numbering: bool) -> String {
    let font = escape(&style.font_family);
    let size = pt_to_half_points(style.font_size);
    let color = super::xml::word_color(&style.color).unwrap_or_else(|| "000000".to_string());
    let bold = if style.is_bold() { "<w:b/><w:bCs/>" } else { "" };
    let num = if native_numbering {
        format!(
            "<w:numPr><w:ilvl w:val=\"{}\"/><w:numId w:val=\"{}\"/></w:numPr>",
            level - 1,
            super::numbering::HEADING_NUM_ID
        )
    } else {
        String::new()
    };
    format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"Heading{level}\"><w:name w:val=\"heading {level}\"/><w:basedOn w:val=\"Normal\"/><w:next w:val=\"Normal\"/><w:uiPriority w:val=\"9\"/><w:qFormat/>\
<w:pPr><w:keepNext/><w:keepLines/>{num}<w:spacing w:before=\"{}\" w:after=\"{}\"/><w:outlineLvl w:val=\"{}\"/></w:pPr>\
<w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:eastAsia=\"{font}\" w:cs=\"{font}\"/>{bold}<w:color w:val=\"{color}\"/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr></w:style>",
        pt_to_twips(style.margin_top),
        pt_to_twips(style.margin_bottom),
        level - 1,
    )
}

/// `styles.xml` with heading templates built from the settings; levels the
/// settings omit fall back to the built-in defaults.
pub fn styles_xml(settings: &DocumentSettings, native_numbering: bool) -> String {
    let defaults = crate::settings::default_heading_styles();
    let mut out = format!("{XML_DECL}\n<w:styles xmlns:w=\"{NS_W}\">");
    out.push_str(&format!(
        "<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii=\"{f}\" w:hAnsi=\"{f}\" w:eastAsia=\"{f}\" w:cs=\"{f}\"/><w:sz w:val=\"24\"/><w:szCs w:val=\"24\"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>",
        f = DEFAULT_FONT
    ));
    out.push_str("<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/><w:qFormat/></w:style>");
    for level in 1..=6u8 {
        let key = format!("h{level}");
        if let Some(style) = settings.heading_styles.get(&key).or_else(|| defaults.get(&key)) {
            out.push_str(&heading_style_xml(level, style, native_numbering));
        }
    }
    out.push_str("<w:style w:type=\"character\" w:styleId=\"Hyperlink\"><w:name w:val=\"Hyperlink\"/><w:uiPriority w:val=\"99\"/><w:rPr><w:color w:val=\"0563C1\"/><w:u w:val=\"single\"/></w:rPr></w:style>");
    out.push_str("<w:style w:type=\"table\" w:styleId=\"TableGrid\"><w:name w:val=\"Table Grid\"/><w:tblPr><w:tblBorders>\
<w:top w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/><w:left w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
<w:bottom w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/><w:right w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
<w:insideH w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/><w:insideV w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"auto\"/>\
</w:tblBorders></w:tblPr></w:style>");
    out.push_str("</w:styles>");
    out
}

/// Finished XML parts of one document.
pub struct Package<'a> {
    pub document: String,
    pub styles: String,
    pub numbering: String,
    pub relationships: &'a Relationships,
    pub media: &'a Media,
}

impl Package<'_> {
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", opt)?;
        zip.write_all(content_types_xml(self.media).as_bytes())?;

        zip.start_file("_rels/.rels", opt)?;
        zip.write_all(root_rels_xml().as_bytes())?;

        zip.start_file("word/document.xml", opt)?;
        zip.write_all(self.document.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", opt)?;
        zip.write_all(self.relationships.to_xml().as_bytes())?;

        zip.start_file("word/styles.xml", opt)?;
        zip.write_all(self.styles.as_bytes())?;

        zip.start_file("word/numbering.xml", opt)?;
        zip.write_all(self.numbering.as_bytes())?;

        for (name, bytes, _) in &self.media.files {
            zip.start_file(format!("word/media/{name}"), opt)?;
            zip.write_all(bytes)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn relationship_ids_start_at_ten_and_dedupe_links() {
        let mut rels = Relationships::default();
        assert_eq!(rels.hyperlink("https://a.test"), "rId10");
        assert_eq!(rels.image("image1.png"), "rId11");
        assert_eq!(rels.hyperlink("https://a.test"), "rId10");
        let xml = rels.to_xml();
        assert!(xml.contains("Target=\"https://a.test\" TargetMode=\"External\""));
        assert!(xml.contains("Id=\"rId11\""));
        assert!(xml.contains("Target=\"media/image1.png\"/>"));
    }

    #[test]
    fn heading_templates_follow_settings() {
        let mut settings = DocumentSettings::default();
        if let Some(h1) = settings.heading_styles.get_mut("h1") {
            h1.font_family = "SimHei".into();
            h1.font_size = 20.0;
            h1.color = "#ff0000".into();
        }
        settings.heading_styles.remove("h2");
        let xml = styles_xml(&settings, false);
        assert!(xml.contains("w:styleId=\"Heading1\""));
        assert!(xml.contains("w:ascii=\"SimHei\""));
        assert!(xml.contains("<w:color w:val=\"FF0000\"/><w:sz w:val=\"40\"/>"));
        assert!(xml.contains("w:styleId=\"Heading2\""));
        assert!(!xml.contains("<w:numPr>"));
        assert!(styles_xml(&settings, true).contains("<w:numId w:val=\"2\"/>"));
        assert!(roxmltree::Document::parse(&xml).is_ok());
    }

    #[test]
    fn package_contains_every_part() {
        let rels = Relationships::default();
        let mut media = Media::default();
        media.add(vec![1, 2, 3], "png", "image/png");
        let package = Package {
            document: "<w:document/>".into(),
            styles: styles_xml(&DocumentSettings::default(), false),
            numbering: "<w:numbering/>".into(),
            relationships: &rels,
            media: &media,
        };
        let bytes = package.write().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "word/media/image1.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains("Extension=\"png\" ContentType=\"image/png\""));
    }
}
