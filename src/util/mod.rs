use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("regex should compile"));
static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("regex should compile"));

/// Escapes text for use inside HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Removes anything that looks like an HTML tag.
pub fn strip_html_tags(text: &str) -> String {
    HTML_TAG_RE.replace_all(text, "").into_owned()
}

/// Lowercase, dash-separated identifier (`"Daniel G."` -> `"daniel-g"`).
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_owned()
}

/// Truncates to `max` characters, appending an ellipsis when shortened.
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn strips_tags() {
        assert_eq!(strip_html_tags("<b>Solar</b> <i>flux</i>"), "Solar flux");
    }

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("Daniel G."), "daniel-g");
        assert_eq!(slugify("  Weihao  "), "weihao");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate_label("Sunspot number", 10), "Sunspot nu...");
        assert_eq!(truncate_label("F10.7", 10), "F10.7");
    }
}
