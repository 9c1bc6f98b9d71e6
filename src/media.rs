// ABOUTME: Downloads referenced media into transient files for upload
// ABOUTME: Assets own their file and remove it when dropped

use crate::{Error, Result};
use rand::Rng;
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DOWNLOAD_TIMEOUT_SECS: u64 = 10;

/// Used when the URL path carries no extension.
const FALLBACK_EXTENSION: &str = ".jpg";

/// A downloaded media file. The file lives exactly as long as the asset:
/// dropping it removes the file, whatever happened to the publish attempt.
#[derive(Debug)]
pub struct MediaAsset {
    pub source_url: String,
    pub path: PathBuf,
    pub byte_size: u64,
}

impl Drop for MediaAsset {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Fetches media URLs into a transient directory.
pub trait MediaFetcher: Sync {
    fn resolve(&self, url: &str) -> Result<MediaAsset>;
}

pub struct MediaResolver {
    client: Client,
    tmp_dir: PathBuf,
}

impl MediaResolver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            // Some image hosts refuse clients that don't look like a browser.
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(MediaResolver {
            client,
            tmp_dir: std::env::temp_dir(),
        })
    }

    pub fn with_tmp_dir(mut self, dir: PathBuf) -> Self {
        self.tmp_dir = dir;
        self
    }
}

impl MediaFetcher for MediaResolver {
    fn resolve(&self, url: &str) -> Result<MediaAsset> {
        let failure = |reason: String| Error::MediaResolution {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("HTTP {}", status.as_u16())));
        }

        let random: u32 = rand::thread_rng().gen();
        let path = self
            .tmp_dir
            .join(format!("crosspost-{:08x}{}", random, url_extension(url)));

        let mut file = fs::File::create(&path).map_err(|e| failure(e.to_string()))?;
        let byte_size = match response.copy_to(&mut file) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&path);
                return Err(failure(e.to_string()));
            }
        };

        Ok(MediaAsset {
            source_url: url.to_string(),
            path,
            byte_size,
        })
    }
}

/// Extension (dot included) from the URL path, ignoring query and fragment.
fn url_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or("");

    match last_segment.rfind('.') {
        Some(pos) if pos > 0 => last_segment[pos..].to_ascii_lowercase(),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}
