//! Tag-string parsing shared by both backends.

/// Splits a raw tag string on whitespace.
///
/// Tag names are case-sensitive. Repeated names are dropped, keeping the
/// first occurrence so the association order follows the input.
pub fn parse_tag_string(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for name in raw.split_whitespace() {
        if !tags.iter().any(|existing| existing == name) {
            tags.push(name.to_string());
        }
    }
    tags
}
