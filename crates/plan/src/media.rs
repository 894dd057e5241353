//! Normalized description of the assets a resolved link exposes.
//!
//! Produced by the (external) resolution collaborator; consumed read-only by
//! the plan builder.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::formats::{AudioFormat, Container};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
}

/// One fetchable source asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAsset {
    pub kind: AssetKind,
    pub url: String,
    /// Approximate bitrate in kbps, when the service reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    /// Declared container, when the service reports one. URL inference is
    /// the fallback, never the other way around.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
}

impl SourceAsset {
    pub fn new(kind: AssetKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            bitrate: None,
            container: None,
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Declared container, falling back to URL inference.
    pub fn inferred_container(&self) -> Option<Container> {
        self.container.or_else(|| Container::infer_from_url(&self.url))
    }
}

/// Per-service quirks the decision engine branches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceCapabilities {
    /// Assets are HLS-segmented and need remuxing into a plain container.
    pub has_hls: bool,
    pub has_multiple_images: bool,
    pub supports_hd: bool,
    pub supports_mute: bool,
    /// Audio-only extraction is meaningful for this service.
    pub supports_audio: bool,
    /// Origin refuses the partial reads ffmpeg needs; materialize a local
    /// copy before processing.
    pub requires_prefetch: bool,
}

impl Default for ServiceCapabilities {
    fn default() -> Self {
        Self {
            has_hls: false,
            has_multiple_images: false,
            supports_hd: false,
            supports_mute: true,
            supports_audio: true,
            requires_prefetch: false,
        }
    }
}

/// Everything the resolver learned about one piece of media.
///
/// If `transient_error` is set the record carries no usable assets and the
/// builder short-circuits straight to an error plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Display name of the originating service ("tiktok", "vimeo", ...).
    pub service: String,
    pub assets: Vec<SourceAsset>,
    /// Codec/container guess for the best standalone audio asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_audio: Option<AudioFormat>,
    #[serde(default)]
    pub capabilities: ServiceCapabilities,
    /// Stable identifier used to derive output filenames.
    pub filename_base: String,
    /// Headers required to re-fetch any asset (session cookies etc.).
    #[serde(default)]
    pub headers: FxHashMap<String, String>,
    /// Title/artist/... supplied by the service, embedded unless disabled.
    #[serde(default)]
    pub file_metadata: FxHashMap<String, String>,
    /// The whole source is an animated GIF-equivalent clip.
    #[serde(default)]
    pub is_gif: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient_error: Option<ResolveError>,
}

impl MediaRecord {
    pub fn new(service: impl Into<String>, filename_base: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            assets: Vec::new(),
            best_audio: None,
            capabilities: ServiceCapabilities::default(),
            filename_base: filename_base.into(),
            headers: FxHashMap::default(),
            file_metadata: FxHashMap::default(),
            is_gif: false,
            transient_error: None,
        }
    }

    /// A record carrying a typed failure instead of assets.
    pub fn failed(service: impl Into<String>, error: ResolveError) -> Self {
        let mut record = Self::new(service, String::new());
        record.transient_error = Some(error);
        record
    }

    pub fn video_assets(&self) -> impl Iterator<Item = &SourceAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Video)
    }

    pub fn audio_assets(&self) -> impl Iterator<Item = &SourceAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Audio)
    }

    pub fn image_assets(&self) -> impl Iterator<Item = &SourceAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Image)
    }
}
