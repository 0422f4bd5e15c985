//! Asset lookup: turns a layer's `source`/`fallback`/`font.family` string
//! into bytes.
//!
//! Three kinds of reference are understood:
//!
//! - `http://` / `https://` URLs, fetched with a blocking client (feature `remote`)
//! - `builtin/...` paths into the embedded cardstyle tree
//! - filesystem paths, tried relative to each search directory in turn
//!   (card directory, then template directory), then as given

use std::path::{Path, PathBuf};

use crate::cardstyle::{BUILTIN_PREFIX, builtin_asset_path, builtin_bytes};
use crate::error::{CardgenError, Result};

/// Where an asset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Remote(String),
    /// `builtin/`-prefixed embedded path.
    Embedded(String),
    File(PathBuf),
}

impl AssetRef {
    /// Classify `raw` and resolve relative paths against `dirs`.
    ///
    /// A relative path that exists under none of the directories is kept as
    /// given, so the read fails with the path the author wrote.
    pub fn locate(raw: &str, dirs: &[&Path]) -> AssetRef {
        let raw = raw.trim();
        if is_remote(raw) {
            return AssetRef::Remote(raw.to_string());
        }
        if is_embedded(raw) {
            return AssetRef::Embedded(raw.to_string());
        }

        let path = Path::new(raw);
        if path.is_absolute() {
            return AssetRef::File(path.to_path_buf());
        }

        for dir in dirs {
            let dir_str = dir.to_string_lossy().replace('\\', "/");
            if is_embedded(&dir_str) {
                if let Some(found) = builtin_asset_path(&dir_str, raw) {
                    return AssetRef::Embedded(found);
                }
                continue;
            }
            let candidate = dir.join(path);
            if candidate.is_file() {
                return AssetRef::File(candidate);
            }
        }
        AssetRef::File(path.to_path_buf())
    }

    /// Cache key: the URL, embedded path or filesystem path.
    pub fn key(&self) -> String {
        match self {
            AssetRef::Remote(url) => url.clone(),
            AssetRef::Embedded(path) => path.clone(),
            AssetRef::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

fn is_remote(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

fn is_embedded(raw: &str) -> bool {
    raw.strip_prefix(BUILTIN_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Last path component of a reference, for placeholder captions.
pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(trimmed)
        .to_string()
}

/// Reads asset bytes from any [`AssetRef`].
pub struct Fetcher {
    #[cfg(feature = "remote")]
    client: Option<reqwest::blocking::Client>,
}

impl Fetcher {
    /// A fetcher with an HTTP client when the `remote` feature is enabled.
    pub fn new() -> Self {
        #[cfg(feature = "remote")]
        {
            let client = reqwest::blocking::Client::builder()
                .user_agent(concat!("cardgen/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .map_err(|e| tracing::warn!(error = %e, "HTTP client unavailable, remote artwork disabled"))
                .ok();
            Self { client }
        }
        #[cfg(not(feature = "remote"))]
        {
            Self {}
        }
    }

    /// A fetcher that never touches the network.
    pub fn offline() -> Self {
        Self {
            #[cfg(feature = "remote")]
            client: None,
        }
    }

    pub fn read(&self, asset: &AssetRef) -> Result<Vec<u8>> {
        match asset {
            AssetRef::Embedded(path) => builtin_bytes(path)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| CardgenError::Asset(format!("embedded asset not found: {}", path))),
            AssetRef::File(path) => std::fs::read(path).map_err(|e| {
                CardgenError::Asset(format!("failed to read {}: {}", path.display(), e))
            }),
            AssetRef::Remote(url) => self.download(url),
        }
    }

    #[cfg(feature = "remote")]
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let Some(client) = &self.client else {
            return Err(CardgenError::Asset(format!(
                "cannot download {}: no HTTP client",
                url
            )));
        };
        tracing::debug!(url, "downloading asset");
        let response = client
            .get(url)
            .send()
            .map_err(|e| CardgenError::Asset(format!("failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(CardgenError::Asset(format!(
                "failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| CardgenError::Asset(format!("failed to read {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "remote"))]
    fn download(&self, url: &str) -> Result<Vec<u8>> {
        Err(CardgenError::Asset(format!(
            "cannot download {}: built without the `remote` feature",
            url
        )))
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
