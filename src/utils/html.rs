/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) survive, dangerous tags
/// (like <script>, <iframe>) and attributes (like onclick) are stripped.
/// Applied to course descriptions, which trainers may write with markup.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Escapes plain text for interpolation into an HTML template.
pub fn escape_text(input: &str) -> String {
    ammonia::clean_text(input)
}
