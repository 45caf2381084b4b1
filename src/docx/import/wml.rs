//! Small WordprocessingML accessors over `roxmltree` nodes.

pub use crate::docx::xml::{NS_A, NS_R, NS_W, NS_WP};
use roxmltree::Node;

/// First `w:{name}` child.
pub fn wml<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name((NS_W, name)))
}

/// `w:val` of the first `w:{child}` child.
pub fn wml_attr<'a, 'i>(node: Node<'a, 'i>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((NS_W, "val")))
}

/// A toggle property (`w:b`, `w:i`, ...). Present without `w:val`, or with a
/// value other than `0`/`false`/`off`, means on.
pub fn wml_bool(node: Node, name: &str) -> Option<bool> {
    wml(node, name).map(|n| {
        n.attribute((NS_W, "val"))
            .map_or(true, |v| !matches!(v, "0" | "false" | "off" | "none"))
    })
}

/// Integer `w:{attr}` attribute.
pub fn int_attr(node: Node, attr: &str) -> Option<i64> {
    node.attribute((NS_W, attr))?.trim().parse::<f64>().ok().map(|v| v as i64)
}

/// First descendant with the given qualified name.
pub fn descendant<'a, 'i>(node: Node<'a, 'i>, ns: &str, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants().find(|n| n.has_tag_name((ns, name)))
}

/// `#RRGGBB` from a Word hex color; `auto` yields nothing.
pub fn hex_color(val: &str) -> Option<String> {
    let val = val.trim();
    if val.len() != 6 || !val.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", val.to_ascii_uppercase()))
}

/// Word highlight names to CSS hex.
pub fn highlight_color(name: &str) -> Option<&'static str> {
    Some(match name.to_ascii_lowercase().as_str() {
        "yellow" => "#FFFF00",
        "green" => "#00FF00",
        "cyan" => "#00FFFF",
        "magenta" => "#FF00FF",
        "blue" => "#0000FF",
        "red" => "#FF0000",
        "darkblue" => "#000080",
        "darkcyan" => "#008080",
        "darkgreen" => "#008000",
        "darkmagenta" => "#800080",
        "darkred" => "#800000",
        "darkyellow" => "#808000",
        "darkgray" => "#808080",
        "lightgray" => "#C0C0C0",
        "black" => "#000000",
        "white" => "#FFFFFF",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_and_colors() {
        let xml = format!(
            r#"<w:rPr xmlns:w="{NS_W}"><w:b/><w:i w:val="0"/><w:strike w:val="true"/></w:rPr>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let rpr = doc.root_element();
        assert_eq!(wml_bool(rpr, "b"), Some(true));
        assert_eq!(wml_bool(rpr, "i"), Some(false));
        assert_eq!(wml_bool(rpr, "strike"), Some(true));
        assert_eq!(wml_bool(rpr, "u"), None);

        assert_eq!(hex_color("ff0000").as_deref(), Some("#FF0000"));
        assert_eq!(hex_color("auto"), None);
        assert_eq!(highlight_color("darkBlue"), Some("#000080"));
        assert_eq!(highlight_color("none"), None);
    }
}
