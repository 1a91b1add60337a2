use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Infallible: the pattern is a literal.
    Regex::new(r"&[#\w]+;").unwrap()
});

/// Entities the practice API is known to emit. Anything else is left as-is.
const ENTITY_TABLE: &[(&str, &str)] = &[
    ("&quot;", "\""),
    ("&#039;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", " "),
    ("&#x27;", "'"),
    ("&#x2F;", "/"),
    ("&#x60;", "`"),
    ("&#x3D;", "="),
];

fn lookup(entity: &str) -> Option<&'static str> {
    ENTITY_TABLE
        .iter()
        .find(|(name, _)| *name == entity)
        .map(|(_, value)| *value)
}

/// Decode the HTML entities found in served source content.
///
/// Single pass: the output of one replacement is never re-scanned, so
/// `&amp;lt;` decodes to `&lt;`.
pub fn decode_html_entities(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    ENTITY_RE
        .replace_all(html, |caps: &Captures| {
            let entity = &caps[0];
            lookup(entity).unwrap_or(entity).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_entities() {
        let decoded = decode_html_entities("if (a &lt; b &amp;&amp; c &gt; d) { s = &quot;x&quot;; }");
        assert_eq!(decoded, "if (a < b && c > d) { s = \"x\"; }");
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_html_entities("it&#039;s"), "it's");
        assert_eq!(decode_html_entities("it&#x27;s"), "it's");
        assert_eq!(decode_html_entities("a&#x2F;b"), "a/b");
        assert_eq!(decode_html_entities("&#x60;cmd&#x60;"), "`cmd`");
        assert_eq!(decode_html_entities("x &#x3D; 1"), "x = 1");
        assert_eq!(decode_html_entities("a&nbsp;b"), "a b");
        assert_eq!(decode_html_entities("&apos;"), "'");
    }

    #[test]
    fn test_unknown_entities_pass_through() {
        assert_eq!(decode_html_entities("&copy; 2024 &#169;"), "&copy; 2024 &#169;");
    }

    #[test]
    fn test_single_pass() {
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_bare_ampersand_untouched() {
        assert_eq!(decode_html_entities("a & b && c"), "a & b && c");
    }

    #[test]
    fn test_empty() {
        assert_eq!(decode_html_entities(""), "");
    }
}
