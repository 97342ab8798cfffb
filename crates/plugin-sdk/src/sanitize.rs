//! Text sanitization and output escaping.
//!
//! Input is sanitized once when it is stored; output is escaped for the
//! context it is written into. Plugins and the kernel share these so the
//! same text is treated identically on both sides.

use std::sync::LazyLock;

use regex::Regex;

/// `<script>` and `<style>` elements, including their contents.
#[allow(clippy::expect_used)]
static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>")
        .expect("static regex is valid")
});

/// Runs of line breaks, tabs and spaces.
#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").expect("static regex is valid"));

/// Percent-encoded octets such as `%3C`.
#[allow(clippy::expect_used)]
static PERCENT_OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)%[a-f0-9]{2}").expect("static regex is valid"));

/// Sanitize a single-line text value for storage.
///
/// - removes `<script>`/`<style>` elements with their contents
/// - strips every tag; a `<` that never closes is kept as `&lt;`
/// - drops percent-encoded octets
/// - turns line breaks and tabs into spaces and collapses whitespace
/// - trims both ends
pub fn sanitize_text_field(input: &str) -> String {
    let mut filtered = if input.contains('<') {
        strip_tags(&SCRIPT_STYLE.replace_all(input, ""))
    } else {
        input.to_string()
    };

    filtered = WHITESPACE.replace_all(&filtered, " ").into_owned();

    // Removing one octet can expose another ("%%3C3C")
    let mut found = false;
    while PERCENT_OCTET.is_match(&filtered) {
        filtered = PERCENT_OCTET.replace_all(&filtered, "").into_owned();
        found = true;
    }
    if found {
        filtered = WHITESPACE.replace_all(&filtered, " ").into_owned();
    }

    filtered.trim().to_string()
}

/// Remove `<...>` tags. A `<` that is not closed before the next `<` or the
/// end of input is not a tag and is encoded as `&lt;`.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match (after.find('>'), after.find('<')) {
            (Some(gt), next_lt) if next_lt.is_none_or(|lt| gt < lt) => {
                rest = &after[gt + 1..];
            }
            _ => {
                out.push_str("&lt;");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// HTML-escape a string for text content.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape a string for use inside a double- or single-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    escape_html(s)
}

/// Make CSS safe to place inside a `<style>` element.
///
/// CSS is written as-is except that `</` becomes `<\/`, which CSS reads
/// identically but which cannot close the element.
pub fn escape_style_content(css: &str) -> String {
    css.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_css_is_unchanged() {
        assert_eq!(sanitize_text_field("body{color:red}"), "body{color:red}");
        assert_eq!(
            sanitize_text_field("ul > li { margin: 0 }"),
            "ul > li { margin: 0 }"
        );
    }

    #[test]
    fn tags_are_stripped() {
        assert_eq!(
            sanitize_text_field("<b>h1</b> { color: blue }"),
            "h1 { color: blue }"
        );
        assert_eq!(
            sanitize_text_field("p{}</style><script>alert(1)</script>"),
            "p{}"
        );
    }

    #[test]
    fn style_elements_are_removed_with_content() {
        assert_eq!(
            sanitize_text_field("a{}<style>b{}</style>c{}"),
            "a{}c{}"
        );
        assert_eq!(sanitize_text_field("<SCRIPT src=x>bad()</SCRIPT>ok"), "ok");
    }

    #[test]
    fn lone_less_than_is_encoded() {
        assert_eq!(sanitize_text_field("a < b"), "a &lt; b");
        assert_eq!(sanitize_text_field("x <y <b>z</b>"), "x &lt;y z");
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            sanitize_text_field("  body {\n\tcolor: red;\r\n}  "),
            "body { color: red; }"
        );
    }

    #[test]
    fn percent_octets_are_removed() {
        assert_eq!(sanitize_text_field("a%3Cb"), "ab");
        assert_eq!(sanitize_text_field("a%%3C3Cb"), "ab");
        assert_eq!(sanitize_text_field("width: 50%;"), "width: 50%;");
    }

    #[test]
    fn empty_input() {
        assert_eq!(sanitize_text_field(""), "");
        assert_eq!(sanitize_text_field(" \n "), "");
    }

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(
            escape_html("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_attr(r#"say "hello""#), "say &quot;hello&quot;");
        assert_eq!(escape_html("hello world"), "hello world");
    }

    #[test]
    fn style_content_cannot_close_element() {
        assert_eq!(escape_style_content("body{color:red}"), "body{color:red}");
        assert_eq!(
            escape_style_content("a{}</style><b>"),
            "a{}<\\/style><b>"
        );
    }
}
