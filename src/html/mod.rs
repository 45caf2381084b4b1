//! Editor HTML on both sides of the model.

mod dom;
pub mod parse;
pub mod render;

pub use parse::parse_html;
pub use render::render_html;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_html("\"quote\" 'x'"), "&quot;quote&quot; &#39;x&#39;");
    }
}
