// ABOUTME: Explicit runtime configuration built once at startup
// ABOUTME: Env vars (plus .env) with CLI flags taking precedence

use crate::cli::Cli;
use crate::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Relays queried when NOSTR_RELAYS is unset.
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
    "wss://relay.primal.net",
];

/// The four long-lived X API secrets. All present or the tool runs dry.
#[derive(Debug, Clone)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl XCredentials {
    pub fn from_env() -> Option<Self> {
        Some(XCredentials {
            api_key: env::var("TWITTER_API_KEY").ok()?,
            api_secret: env::var("TWITTER_API_SECRET").ok()?,
            access_token: env::var("TWITTER_ACCESS_TOKEN").ok()?,
            access_secret: env::var("TWITTER_ACCESS_SECRET").ok()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Hex-encoded public keys of the monitored authors.
    pub authors: Vec<String>,
    pub relays: Vec<String>,
    /// None means dry-run: no publish calls, no checkpoint advance.
    pub credentials: Option<XCredentials>,
    pub state_file: PathBuf,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let raw_authors = cli
            .npubs
            .clone()
            .or_else(|| env::var("NOSTR_NPUBS").ok())
            .unwrap_or_default();
        let authors = parse_list(&raw_authors)
            .iter()
            .map(|s| normalize_author(s))
            .collect::<Result<Vec<_>>>()?;
        if authors.is_empty() {
            return Err(Error::Config(
                "no monitored authors; set NOSTR_NPUBS or pass --npubs".into(),
            ));
        }

        let relays = match cli
            .relays
            .clone()
            .or_else(|| env::var("NOSTR_RELAYS").ok())
        {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
        };
        if relays.is_empty() {
            return Err(Error::Config(
                "no relays; set NOSTR_RELAYS or pass --relays".into(),
            ));
        }

        let credentials = if cli.dry_run {
            None
        } else {
            XCredentials::from_env()
        };

        Ok(Config {
            authors,
            relays,
            credentials,
            state_file: cli.state_file.clone(),
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts a bech32 `npub1…` or a 64-char hex pubkey; yields lowercase hex,
/// the form relay filters expect.
pub fn normalize_author(input: &str) -> Result<String> {
    if input.starts_with("npub1") {
        let (hrp, data) = bech32::decode(input)
            .map_err(|e| Error::Config(format!("invalid npub {}: {}", input, e)))?;
        if hrp.as_str() != "npub" || data.len() != 32 {
            return Err(Error::Config(format!("invalid npub {}", input)));
        }
        return Ok(hex::encode(data));
    }

    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(input.to_ascii_lowercase());
    }

    Err(Error::Config(format!(
        "author {} is neither an npub nor a hex pubkey",
        input
    )))
}
