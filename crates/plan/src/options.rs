//! Request options and configured defaults feeding the plan builder.

use serde::{Deserialize, Serialize};

use crate::formats::{AudioBitrate, AudioFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    #[default]
    Auto,
    Audio,
    Hd,
}

/// Caller-supplied knobs modifying plan selection. All booleans default to
/// off so an empty request body means "give me the video".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadOptions {
    pub download_mode: DownloadMode,
    pub audio_format: AudioFormat,
    pub audio_bitrate: AudioBitrate,
    /// Prefer the full/original audio track over the clipped one.
    pub full_audio: bool,
    pub allow_h265: bool,
    pub always_proxy: bool,
    pub disable_metadata: bool,
    pub convert_gif: bool,
    pub local_processing: bool,
    /// Strip the audio track from the delivered video.
    pub mute: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            download_mode: DownloadMode::Auto,
            audio_format: AudioFormat::Best,
            audio_bitrate: AudioBitrate::default(),
            full_audio: false,
            allow_h265: false,
            always_proxy: false,
            disable_metadata: false,
            convert_gif: false,
            local_processing: false,
            mute: false,
        }
    }
}

/// Deployment-configured fallbacks applied when the request asks for "best"
/// and the resolver has no hint. Part of configuration, not business logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanDefaults {
    pub audio_format: AudioFormat,
    pub audio_bitrate: AudioBitrate,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::M4a,
            audio_bitrate: AudioBitrate::Kbps128,
        }
    }
}
