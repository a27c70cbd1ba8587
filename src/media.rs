// ABOUTME: Attachment storage for voice recordings and images sent over chat
// ABOUTME: Local filesystem backend writing under a configured media root
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VentureLink

use crate::config::environment::MediaConfig;
use crate::constants::limits::MAX_AUDIO_BYTES;
use crate::errors::{AppError, AppResult};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

const VOICE_DIR: &str = "message_voices";
const IMAGE_DIR: &str = "message_images";

/// Storage backend for message attachments.
///
/// Implementations persist raw bytes and hand back an opaque reference
/// (a URL path) that goes into the message row and onto the wire.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist a voice recording, returning its reference
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is oversized or the write fails
    async fn store_voice(&self, data: &[u8]) -> AppResult<String>;

    /// Persist an image, returning its reference
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is oversized or the write fails
    async fn store_image(&self, data: &[u8]) -> AppResult<String>;
}

/// Local filesystem media storage.
///
/// Files land under `<root_dir>/message_voices/` and
/// `<root_dir>/message_images/` with generated UUID names; references are
/// `<base_url>/<subdir>/<name>`, so a static-file layer in front of the
/// media root serves them unchanged.
#[derive(Clone)]
pub struct LocalMediaStorage {
    root_dir: PathBuf,
    base_url: String,
}

impl LocalMediaStorage {
    /// Create storage rooted at the configured media directory
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root_dir: config.root_dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn store(&self, subdir: &str, extension: &str, data: &[u8]) -> AppResult<String> {
        if data.is_empty() {
            return Err(AppError::invalid_input("Attachment payload is empty"));
        }
        if data.len() > MAX_AUDIO_BYTES {
            return Err(AppError::invalid_input(format!(
                "Attachment payload of {} bytes exceeds the {} byte limit",
                data.len(),
                MAX_AUDIO_BYTES
            )));
        }

        let filename = format!("{}.{extension}", Uuid::new_v4());
        let dir = self.root_dir.join(subdir);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create media directory: {e}")))?;
        tokio::fs::write(dir.join(&filename), data)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write attachment: {e}")))?;

        debug!("Stored {} attachment {} ({} bytes)", subdir, filename, data.len());

        Ok(format!("{}/{subdir}/{filename}", self.base_url))
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store_voice(&self, data: &[u8]) -> AppResult<String> {
        self.store(VOICE_DIR, "wav", data).await
    }

    async fn store_image(&self, data: &[u8]) -> AppResult<String> {
        self.store(IMAGE_DIR, "jpg", data).await
    }
}
