// ABOUTME: X API client: OAuth 1.0a signing, v1.1 media upload, v2 posting
// ABOUTME: Falls back to a dry-run publisher when credentials are missing

use crate::config::XCredentials;
use crate::content::{truncate_for_post, POST_CHAR_LIMIT};
use crate::media::MediaAsset;
use crate::model::{MediaUploadResponse, PostResponse};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use reqwest::blocking::{multipart, Client};
use sha1::Sha1;
use std::time::Duration;

const API_BASE: &str = "https://api.twitter.com";
const UPLOAD_BASE: &str = "https://upload.twitter.com";

/// RFC 3986 unreserved characters pass through; everything else is encoded.
const OAUTH_UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn oauth_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_UNRESERVED).to_string()
}

/// HMAC-SHA1 request signature per RFC 5849. `params` carries any form/query
/// parameters that participate in the base string (JSON and multipart bodies
/// do not).
fn sign(
    creds: &XCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &str,
    timestamp: u64,
) -> String {
    let timestamp = timestamp.to_string();
    let oauth_params = [
        ("oauth_consumer_key", creds.api_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (oauth_encode(k), oauth_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        oauth_encode(url),
        oauth_encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        oauth_encode(&creds.api_secret),
        oauth_encode(&creds.access_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn authorization_header(creds: &XCredentials, method: &str, url: &str) -> String {
    let nonce = format!("{:016x}", rand::thread_rng().gen::<u64>());
    let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
    let signature = sign(creds, method, url, &[], &nonce, timestamp);

    format!(
        "OAuth oauth_consumer_key=\"{}\", oauth_nonce=\"{}\", oauth_signature=\"{}\", \
         oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"{}\", oauth_token=\"{}\", \
         oauth_version=\"1.0\"",
        oauth_encode(&creds.api_key),
        oauth_encode(&nonce),
        oauth_encode(&signature),
        timestamp,
        oauth_encode(&creds.access_token),
    )
}

/// What a publish attempt produced. Only `Posted` may advance the checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Posted { post_id: String },
    DryRun,
}

pub trait Publisher {
    /// Upload the given assets, then create one post. Per-asset upload
    /// failures are skipped; a post-creation failure is an error.
    fn publish(&self, text: &str, media: &[MediaAsset]) -> Result<PublishOutcome>;
}

pub struct XClient {
    client: Client,
    creds: XCredentials,
    api_base: String,
    upload_base: String,
}

impl XClient {
    pub fn new(creds: XCredentials) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(XClient {
            client,
            creds,
            api_base: API_BASE.into(),
            upload_base: UPLOAD_BASE.into(),
        })
    }

    pub fn with_base_urls(mut self, api_base: String, upload_base: String) -> Self {
        self.api_base = api_base;
        self.upload_base = upload_base;
        self
    }

    fn upload_media(&self, asset: &MediaAsset) -> Result<String> {
        let endpoint = "/1.1/media/upload.json";
        let url = format!("{}{}", self.upload_base, endpoint);
        let auth = authorization_header(&self.creds, "POST", &url);

        let form = multipart::Form::new().file("media", &asset.path)?;
        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .multipart(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_for_post(&message, 100),
            });
        }

        let parsed: MediaUploadResponse = response.json()?;
        Ok(parsed.media_id_string)
    }

    fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String> {
        let endpoint = "/2/tweets";
        let url = format!("{}{}", self.api_base, endpoint);
        let auth = authorization_header(&self.creds, "POST", &url);

        let mut body = serde_json::json!({ "text": text });
        if !media_ids.is_empty() {
            body["media"] = serde_json::json!({ "media_ids": media_ids });
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_for_post(&message, 100),
            });
        }

        let parsed: PostResponse = response.json()?;
        Ok(parsed.data.id)
    }
}

impl Publisher for XClient {
    fn publish(&self, text: &str, media: &[MediaAsset]) -> Result<PublishOutcome> {
        let mut media_ids = Vec::new();
        for asset in media {
            match self.upload_media(asset) {
                Ok(id) => {
                    println!("    uploaded {} ({} bytes)", asset.source_url, asset.byte_size);
                    media_ids.push(id);
                }
                Err(e) => {
                    eprintln!("    warning: upload failed for {}: {}", asset.source_url, e);
                }
            }
        }

        let text = truncate_for_post(text, POST_CHAR_LIMIT);
        let post_id = self.create_post(&text, &media_ids)?;
        Ok(PublishOutcome::Posted { post_id })
    }
}

/// Selected when credentials are absent (or dry-run is forced): logs the
/// intended action and touches nothing.
pub struct DryRunPublisher;

impl Publisher for DryRunPublisher {
    fn publish(&self, text: &str, media: &[MediaAsset]) -> Result<PublishOutcome> {
        let text = truncate_for_post(text, POST_CHAR_LIMIT);
        let preview: String = text.chars().take(50).collect();
        println!(
            "    [dry run] would post \"{}\" with {} media item(s)",
            preview,
            media.len()
        );
        Ok(PublishOutcome::DryRun)
    }
}
