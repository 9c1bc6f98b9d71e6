// ABOUTME: Serde data models for Nostr events and X API responses
// ABOUTME: Tolerant parsing with optional fields where the wire allows omission

use serde::{Deserialize, Serialize};

/// Event kind for plain text notes (the only kind this tool mirrors).
pub const KIND_TEXT_NOTE: u32 = 1;

/// A Nostr event as relays serialize it. Immutable once fetched; only the
/// id outlives a processing pass, inside the checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NostrEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl NostrEvent {
    /// Replies carry an "e" tag pointing at the parent event (some clients
    /// write a literal "reply" marker instead). Top-level notes carry neither.
    pub fn is_reply(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| matches!(tag.first().map(String::as_str), Some("e") | Some("reply")))
    }

    /// Short id prefix for log lines.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}


/// Publish-ready form of one event: display text plus the media URLs that
/// were lifted out of it. Ephemeral within one engine iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub text: String,
    pub media_urls: Vec<String>,
}

/// v1.1 media upload response. Only the string id is needed; the numeric
/// `media_id` field loses precision in some JSON decoders so X also sends it
/// as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadResponse {
    pub media_id_string: String,
}

/// v2 post creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    pub data: PostData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    pub id: String,
}
