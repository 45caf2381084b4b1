use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

pub fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

pub fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

pub fn attrs_vec(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn attr_get(attrs: &[(String, String)], name: &str) -> Option<String> {
    for (k, v) in attrs {
        if k.eq_ignore_ascii_case(name) {
            return Some(v.to_string());
        }
    }
    None
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    attr_get(&attrs_vec(node), name)
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class")
        .map(|c| c.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().iter().cloned().collect()
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| matches!(c.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

pub fn child_with_tag(node: &Handle, tags: &[&str]) -> Option<Handle> {
    element_children(node)
        .into_iter()
        .find(|c| tag_lower(c).is_some_and(|t| tags.contains(&t.as_str())))
}

/// Depth-first search for a descendant element with one of `tags`.
pub fn find_descendant(node: &Handle, tags: &[&str]) -> Option<Handle> {
    for c in node.children.borrow().iter() {
        if tag_lower(c).is_some_and(|t| tags.contains(&t.as_str())) {
            return Some(c.clone());
        }
        if let Some(found) = find_descendant(c, tags) {
            return Some(found);
        }
    }
    None
}

/// Concatenated text of every descendant text node.
pub fn text_content(node: &Handle) -> String {
    fn walk(node: &Handle, out: &mut String) {
        match &node.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            _ => {
                for c in node.children.borrow().iter() {
                    walk(c, out);
                }
            }
        }
    }
    let mut out = String::new();
    walk(node, &mut out);
    out
}

/// Children of `<body>`, wrapping fragments into a full document first.
pub fn body_children(input_html: &str) -> Vec<Handle> {
    let wrapped = if input_html.to_ascii_lowercase().contains("<html") {
        input_html.to_string()
    } else {
        format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
            input_html
        )
    };

    let dom = html5_parse(&wrapped);
    let mut body_children: Vec<Handle> = Vec::new();
    fn walk_find_body(node: &Handle, out: &mut Vec<Handle>) -> bool {
        if let NodeData::Element { name, .. } = &node.data {
            if name.local.to_string().eq_ignore_ascii_case("body") {
                out.extend(node.children.borrow().iter().cloned());
                return true;
            }
        }
        for c in node.children.borrow().iter() {
            if walk_find_body(c, out) {
                return true;
            }
        }
        false
    }
    if !walk_find_body(&dom.document, &mut body_children) {
        body_children = dom.document.children.borrow().iter().cloned().collect();
    }
    body_children
}

pub fn sanitize_href(href: &str) -> Option<String> {
    let h = href.trim();
    if h.is_empty() {
        return None;
    }
    let low = h.to_ascii_lowercase();
    if low.starts_with("javascript:") || low.starts_with("vbscript:") {
        return None;
    }
    Some(h.to_string())
}
