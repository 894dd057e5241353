//! The immutable stream plan: one value describing exactly how a request's
//! media will be delivered.
//!
//! Each kind carries exactly the fields valid for it, so illegal
//! combinations (a merge with one input, a redirect with an output format)
//! are unrepresentable rather than runtime-checked.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::formats::{AudioBitrate, AudioFormat, Container};

/// Metadata keys that may be embedded into the output container. Anything
/// else is a contract violation at argument-construction time, never passed
/// through unsanitized.
pub const METADATA_TAGS: [&str; 9] = [
    "album",
    "composer",
    "genre",
    "copyright",
    "title",
    "artist",
    "album_artist",
    "track",
    "date",
];

/// One upstream input: a URL plus the headers required to fetch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    pub url: String,
    #[serde(default)]
    pub headers: FxHashMap<String, String>,
}

impl PlanInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: FxHashMap::default(),
        }
    }

    pub fn with_headers(url: impl Into<String>, headers: FxHashMap<String, String>) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }
}

/// Audio encode settings carried by transcoding plans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioEncoding {
    pub format: AudioFormat,
    pub bitrate: AudioBitrate,
    /// Byte-copy the source stream instead of re-encoding (copy-possible).
    pub copy: bool,
}

/// Target container plus optional audio encode settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub container: Container,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioEncoding>,
}

impl OutputFormat {
    pub fn container(container: Container) -> Self {
        Self {
            container,
            audio: None,
        }
    }

    pub fn audio(container: Container, audio: AudioEncoding) -> Self {
        Self {
            container,
            audio: Some(audio),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerMedia {
    Photo,
    Video,
    Gif,
}

/// One selectable entry of a picker plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerItem {
    pub media: PickerMedia,
    pub plan: StreamPlan,
}

/// How the media is delivered. `inputs` length is fixed per kind: 2 for
/// merge, 1 for the other streaming kinds, 0 for redirect/picker/error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlanKind {
    /// Send the client straight to the origin URL.
    Redirect { url: String },
    /// Pipe origin bytes through unchanged; the only seekable kind.
    DirectProxy,
    /// Rewrap into a clean container without re-encoding. `drop_audio`
    /// implements muted output.
    Remux { hls: bool, drop_audio: bool },
    /// Combine separate video and audio tracks into one container.
    MergeTracks { hls: bool },
    TranscodeAudio,
    TranscodeGif,
    /// Quality-preserving rewrap with timestamp repair for HD variants.
    EnhanceVideo,
    /// Multiple independent assets; the client picks.
    Picker {
        items: Vec<PickerItem>,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<Box<StreamPlan>>,
    },
    /// The transformation happens client-side; the server only tunnels the
    /// raw inputs. Never wraps an HLS plan.
    LocalProcessing { inner: Box<PlanKind> },
    Error { error: ResolveError },
}

impl PlanKind {
    /// Name used on the wire for local-processing task types.
    pub fn processing_name(&self) -> Option<&'static str> {
        match self {
            PlanKind::MergeTracks { .. } => Some("merge"),
            PlanKind::Remux {
                drop_audio: true, ..
            } => Some("mute"),
            PlanKind::Remux { .. } => Some("remux"),
            PlanKind::TranscodeAudio => Some("audio"),
            PlanKind::TranscodeGif => Some("gif"),
            PlanKind::LocalProcessing { inner } => inner.processing_name(),
            _ => None,
        }
    }

    pub fn is_hls(&self) -> bool {
        match self {
            PlanKind::Remux { hls, .. } | PlanKind::MergeTracks { hls } => *hls,
            PlanKind::LocalProcessing { inner } => inner.is_hls(),
            _ => false,
        }
    }
}

/// Immutable decision record built once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPlan {
    pub kind: PlanKind,
    pub inputs: Vec<PlanInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
    /// Fully resolved output filename, extension included.
    pub filename: String,
    /// Allow-listed metadata tags to embed.
    #[serde(default)]
    pub tags: FxHashMap<String, String>,
    /// Advisory factor for estimating content length before transcoding
    /// completes. A hint, never a contract.
    pub size_multiplier: f64,
    /// Materialize a full local copy before invoking the processing tool.
    #[serde(default)]
    pub prefetch: bool,
}

impl StreamPlan {
    pub fn error(error: ResolveError) -> Self {
        Self {
            kind: PlanKind::Error { error },
            inputs: Vec::new(),
            output: None,
            filename: String::new(),
            tags: FxHashMap::default(),
            size_multiplier: 1.0,
            prefetch: false,
        }
    }

    pub fn redirect(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            kind: PlanKind::Redirect { url: url.into() },
            inputs: Vec::new(),
            output: None,
            filename: filename.into(),
            tags: FxHashMap::default(),
            size_multiplier: 1.0,
            prefetch: false,
        }
    }

    /// Whether dereferencing this plan produces a byte stream (as opposed to
    /// an immediate redirect/picker/error answer).
    pub fn is_streamable(&self) -> bool {
        !matches!(
            self.kind,
            PlanKind::Redirect { .. } | PlanKind::Picker { .. } | PlanKind::Error { .. }
        )
    }

    pub fn as_error(&self) -> Option<&ResolveError> {
        match &self.kind {
            PlanKind::Error { error } => Some(error),
            _ => None,
        }
    }
}
