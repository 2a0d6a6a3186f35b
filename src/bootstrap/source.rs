//! Where artifacts come from.
//!
//! `ArtifactSource` is the seam between the bootstrap flow and the network;
//! `HttpSource` is the real implementation on a blocking `reqwest` client.

use crate::error::{Result, SetupError};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

pub trait ArtifactSource {
    /// Lightweight existence probe. Any failure means "no".
    fn exists(&self, url: &str) -> bool;

    /// Download `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("audio-setup/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client })
    }
}

impl ArtifactSource for HttpSource {
    fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(resp) => {
                tracing::debug!("HEAD {} -> {}", url, resp.status());
                resp.status().is_success()
            }
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| SetupError::download(format!("{}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SetupError::download(format!("{}: HTTP {}", url, status)));
        }

        let mut file = File::create(dest)?;
        let bytes = io::copy(&mut resp, &mut file)
            .map_err(|e| SetupError::download(format!("{}: {}", url, e)))?;
        file.sync_all()?;
        Ok(bytes)
    }
}
