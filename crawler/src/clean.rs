use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref COMMENTS: Regex = Regex::new(r"(?is)<!--.*?-->").expect("valid regex");
    static ref TAGS: Regex = Regex::new(r"(?is)<[^>]*>").expect("valid regex");
    static ref ENTITIES: Regex = Regex::new(r"(?is)&\S*?;").expect("valid regex");
}

/// Elements whose entire content is dropped along with the tags.
const BLOCK_ELEMENTS: [&str; 5] = ["head", "style", "script", "noscript", "svg"];

/// Removes comments and non-content block elements (head, style, script,
/// noscript, svg), replacing each with a single space so surrounding words
/// stay separated.
pub fn strip_blocks(html: &str) -> String {
    let mut text = COMMENTS.replace_all(html, " ").into_owned();
    for name in BLOCK_ELEMENTS {
        let pattern = format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>");
        let element = Regex::new(&pattern).expect("valid regex");
        text = element.replace_all(&text, " ").into_owned();
    }
    text
}

/// Removes all remaining HTML tags: "A<b>B</b>C" becomes "ABC".
pub fn strip_tags(html: &str) -> String {
    TAGS.replace_all(html, "").into_owned()
}

/// Removes HTML entities: "2010&ndash;2012" becomes "20102012".
pub fn strip_entities(text: &str) -> String {
    ENTITIES.replace_all(text, "").into_owned()
}

/// Full pipeline from raw HTML to plain text.
pub fn strip_html(html: &str) -> String {
    strip_entities(&strip_tags(&strip_blocks(html)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_become_a_space() {
        assert_eq!(strip_blocks("A<!-- B -->C"), "A C");
    }

    #[test]
    fn block_elements_are_dropped_with_their_content() {
        let html = "<style type=\"text/css\">body { font-size: 10pt; }</style>after";
        assert_eq!(strip_blocks(html), " after");

        let html = "keep<script>var x = '<div>';</script>this";
        assert!(!strip_blocks(html).contains("var x"));
    }

    #[test]
    fn scripts_spanning_lines_are_dropped() {
        let html = "before\n<script>\nalert('hi');\n</script>\nafter";
        let text = strip_blocks(html);
        assert!(text.contains("before"));
        assert!(text.contains("after"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn tags_are_removed_without_spacing() {
        assert_eq!(strip_tags("A<b>B</b>C"), "ABC");
    }

    #[test]
    fn entities_are_removed() {
        assert_eq!(strip_entities("2010&ndash;2012"), "20102012");
        assert_eq!(strip_entities("fish &amp; chips"), "fish  chips");
    }

    #[test]
    fn full_pipeline_yields_plain_text() {
        let html = "<html><head><title>T</title></head>\
                    <body><p>hello <b>world</b>&nbsp;</p></body></html>";
        let text = strip_html(html);
        assert!(text.contains("hello world"));
        assert!(!text.contains('<'));
        assert!(!text.contains("T"));
    }
}
