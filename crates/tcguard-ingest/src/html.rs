use regex_lite::Regex;

/// Elements whose content is page chrome or code, never contract text.
const DROPPED_ELEMENTS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

/// Reduce an HTML page to its visible text.
///
/// Dropped elements are removed with their content, comments and remaining
/// tags are stripped, and common entities are decoded. Whitespace is left for
/// [`crate::sanitize_text`].
pub fn html_to_text(html: &str) -> Result<String, regex_lite::Error> {
    let mut text = Regex::new(r"(?s)<!--.*?-->")?
        .replace_all(html, "")
        .into_owned();
    for element in DROPPED_ELEMENTS {
        let re = Regex::new(&format!(r"(?is)<{element}\b[^>]*>.*?</{element}\s*>"))?;
        text = re.replace_all(&text, " ").into_owned();
    }

    let blocks = Regex::new(r"(?i)</?(?:p|div|br|h[1-6]|li|tr|td|section|article)\b[^>]*>")?;
    let text = blocks.replace_all(&text, " ");
    let tags = Regex::new(r"<[^>]+>")?;
    let text = tags.replace_all(&text, "");

    Ok(decode_entities(&text))
}

fn decode_entities(s: &str) -> String {
    // `&amp;` last so `&amp;lt;` decodes to `&lt;`, not `<`.
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&copy;", "©")
        .replace("&reg;", "®")
        .replace("&trade;", "™")
        .replace("&amp;", "&")
}
