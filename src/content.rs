// ABOUTME: Turns raw note text into publish-ready text plus media URLs
// ABOUTME: Media links are lifted out of the text; other links stay inline

use crate::model::Draft;
use once_cell::sync::Lazy;
use regex::Regex;

/// X counts a post in characters, not bytes.
pub const POST_CHAR_LIMIT: usize = 280;

/// File extensions treated as attachable media. Anything else stays in the
/// text as a plain link.
const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".mp4", ".mov"];

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Extract media URLs from note text. Matched URLs are removed from the
/// display text (every occurrence) and returned in first-seen order without
/// duplicates; the remaining text is trimmed. Non-media URLs are untouched.
pub fn extract_media(content: &str) -> Draft {
    let mut text = content.to_string();
    let mut media_urls: Vec<String> = Vec::new();

    for m in URL_RE.find_iter(content) {
        let url = m.as_str();
        if !is_media_url(url) {
            continue;
        }
        if !media_urls.iter().any(|u| u == url) {
            media_urls.push(url.to_string());
            // X renders uploaded media natively, so the link would be noise.
            text = text.replace(url, "");
        }
    }

    Draft {
        text: text.trim().to_string(),
        media_urls,
    }
}

fn is_media_url(url: &str) -> bool {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Truncate to `limit` characters, ellipsis included, on a char boundary.
pub fn truncate_for_post(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_media_jpg() {
        let draft = extract_media("sunset tonight https://img.example/pic.jpg wow");
        assert_eq!(draft.text, "sunset tonight  wow");
        assert_eq!(draft.media_urls, vec!["https://img.example/pic.jpg"]);
    }

    #[test]
    fn test_extract_leaves_plain_links() {
        let draft = extract_media("read this https://example.com/post.html later");
        assert_eq!(draft.text, "read this https://example.com/post.html later");
        assert!(draft.media_urls.is_empty());
    }

    #[test]
    fn test_extract_mixed_links() {
        let draft = extract_media(
            "pic https://img.example/a.png and article https://example.com/a.html",
        );
        assert_eq!(draft.text, "pic  and article https://example.com/a.html");
        assert_eq!(draft.media_urls, vec!["https://img.example/a.png"]);
    }

    #[test]
    fn test_extract_removes_all_occurrences() {
        let draft = extract_media(
            "https://img.example/x.gif again https://img.example/x.gif",
        );
        assert_eq!(draft.text, "again");
        assert_eq!(draft.media_urls, vec!["https://img.example/x.gif"]);
    }

    #[test]
    fn test_extract_case_insensitive_extension() {
        let draft = extract_media("https://img.example/LOUD.JPG");
        assert_eq!(draft.text, "");
        assert_eq!(draft.media_urls, vec!["https://img.example/LOUD.JPG"]);
    }

    #[test]
    fn test_extract_ignores_query_string() {
        let draft = extract_media("https://img.example/pic.jpg?width=600");
        assert_eq!(draft.media_urls, vec!["https://img.example/pic.jpg?width=600"]);
        assert_eq!(draft.text, "");
    }

    #[test]
    fn test_extract_no_urls() {
        let draft = extract_media("just words here");
        assert_eq!(draft.text, "just words here");
        assert!(draft.media_urls.is_empty());
    }

    #[test]
    fn test_extract_video_extension() {
        let draft = extract_media("clip https://cdn.example/v/clip.mp4");
        assert_eq!(draft.text, "clip");
        assert_eq!(draft.media_urls, vec!["https://cdn.example/v/clip.mp4"]);
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_post("hello", POST_CHAR_LIMIT), "hello");
    }

    #[test]
    fn test_truncate_at_limit_unchanged() {
        let text = "a".repeat(280);
        assert_eq!(truncate_for_post(&text, POST_CHAR_LIMIT), text);
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "b".repeat(300);
        let result = truncate_for_post(&text, POST_CHAR_LIMIT);
        assert_eq!(result.chars().count(), 280);
        assert_eq!(&result[..277], "b".repeat(277));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // 300 multi-byte chars must still yield 277 chars plus the ellipsis.
        let text = "ü".repeat(300);
        let result = truncate_for_post(&text, POST_CHAR_LIMIT);
        assert_eq!(result.chars().count(), 280);
        assert!(result.ends_with("..."));
    }
}
