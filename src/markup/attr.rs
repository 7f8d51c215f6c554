//! Attribute value helpers.

/// Split a space-delimited multi-valued attribute (`epub:type`, `role`).
///
/// Leading/trailing whitespace is ignored and runs of whitespace count as a
/// single separator. A missing attribute yields no values.
pub fn split_values(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Append `additions` to `existing`, skipping values already present.
///
/// Returns the space-joined result, or `None` when there is nothing to
/// write. Existing values are never removed or reordered.
pub fn merge_values<I, S>(existing: Vec<String>, additions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut values = existing;
    for value in additions {
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(values.join(" "))
    }
}

/// Escape text for use inside an XML attribute value or text node.
///
/// # Examples
///
/// ```
/// use access_aide::markup::xml_encode;
///
/// assert_eq!(xml_encode("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
/// ```
pub fn xml_encode(data: &str) -> String {
    data.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reverse [`xml_encode`].
///
/// `&amp;` is decoded last so that `&amp;lt;` becomes `&lt;`, not `<`.
pub fn xml_decode(data: &str) -> String {
    data.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}
