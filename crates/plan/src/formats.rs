//! Container and audio format handling, including the conservative
//! copy-possible inference.
//!
//! Codec/container of a source asset is *declared* (container hint or URL
//! shape), never probed from the bitstream. When nothing can be inferred the
//! caller must fall back to transcoding; a wrong copy claim is the bug class
//! to avoid, a missed copy is merely slower.

use serde::{Deserialize, Serialize};
use url::Url;

/// Known output/input containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
    Mkv,
    MpegTs,
    Gif,
    Mp3,
    Ogg,
    Opus,
    Wav,
    M4a,
}

impl Container {
    /// File extension, used for output filenames.
    pub fn ext(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Mkv => "mkv",
            Container::MpegTs => "ts",
            Container::Gif => "gif",
            Container::Mp3 => "mp3",
            Container::Ogg => "ogg",
            Container::Opus => "opus",
            Container::Wav => "wav",
            Container::M4a => "m4a",
        }
    }

    /// The ffmpeg muxer name for `-f`. Not always the extension (m4a is
    /// muxed by `ipod`).
    pub fn muxer(&self) -> &'static str {
        match self {
            Container::M4a => "ipod",
            Container::MpegTs => "mpegts",
            other => other.ext(),
        }
    }

    /// Content type announced when streaming this container.
    pub fn mime(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
            Container::Mkv => "video/x-matroska",
            Container::MpegTs => "video/mp2t",
            Container::Gif => "image/gif",
            Container::Mp3 => "audio/mpeg",
            Container::Ogg => "audio/ogg",
            Container::Opus => "audio/opus",
            Container::Wav => "audio/wav",
            Container::M4a => "audio/mp4",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            Container::Mp3 | Container::Ogg | Container::Opus | Container::Wav | Container::M4a
        )
    }

    fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "mp4" | "m4v" => Some(Container::Mp4),
            "webm" => Some(Container::Webm),
            "mkv" => Some(Container::Mkv),
            "ts" => Some(Container::MpegTs),
            "gif" => Some(Container::Gif),
            "mp3" => Some(Container::Mp3),
            "ogg" => Some(Container::Ogg),
            "opus" => Some(Container::Opus),
            "wav" => Some(Container::Wav),
            "m4a" => Some(Container::M4a),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "video/mp4" => Some(Container::Mp4),
            "video/webm" => Some(Container::Webm),
            "video/mp2t" => Some(Container::MpegTs),
            "audio/mpeg" | "audio/mp3" => Some(Container::Mp3),
            "audio/mp4" => Some(Container::M4a),
            "audio/ogg" => Some(Container::Ogg),
            "audio/opus" => Some(Container::Opus),
            "audio/wav" | "audio/x-wav" => Some(Container::Wav),
            "image/gif" => Some(Container::Gif),
            _ => None,
        }
    }

    /// Infer a container from an asset URL.
    ///
    /// Looks at the path extension first, then at `format` / `mime_type`
    /// query parameters some CDNs carry. Returns `None` when unsure.
    pub fn infer_from_url(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;

        if let Some(ext) = url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            && let Some(container) = Self::from_ext(&ext)
        {
            return Some(container);
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "format" => {
                    if let Some(container) = Self::from_ext(&value.to_ascii_lowercase()) {
                        return Some(container);
                    }
                }
                "mime_type" | "mime" => {
                    let mime = value.replace('_', "/").to_ascii_lowercase();
                    if let Some(container) = Self::from_mime(&mime) {
                        return Some(container);
                    }
                }
                _ => {}
            }
        }

        None
    }
}

/// Requested audio format. `Best` is resolved by the builder before a plan
/// is constructed; plans only ever carry concrete formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Best,
    Mp3,
    Ogg,
    Opus,
    Wav,
    M4a,
}

impl AudioFormat {
    pub fn is_best(&self) -> bool {
        matches!(self, AudioFormat::Best)
    }

    /// Target container for a concrete format; `None` for `Best`.
    pub fn container(&self) -> Option<Container> {
        match self {
            AudioFormat::Best => None,
            AudioFormat::Mp3 => Some(Container::Mp3),
            AudioFormat::Ogg => Some(Container::Ogg),
            AudioFormat::Opus => Some(Container::Opus),
            AudioFormat::Wav => Some(Container::Wav),
            AudioFormat::M4a => Some(Container::M4a),
        }
    }

    /// ffmpeg encoder for `-c:a` when re-encoding.
    pub fn codec(&self) -> Option<&'static str> {
        match self {
            AudioFormat::Best => None,
            AudioFormat::Mp3 => Some("libmp3lame"),
            AudioFormat::Ogg => Some("libvorbis"),
            AudioFormat::Opus => Some("libopus"),
            AudioFormat::Wav => Some("pcm_s16le"),
            AudioFormat::M4a => Some("aac"),
        }
    }

    pub fn from_container(container: Container) -> Option<Self> {
        match container {
            Container::Mp3 => Some(AudioFormat::Mp3),
            Container::Ogg => Some(AudioFormat::Ogg),
            Container::Opus => Some(AudioFormat::Opus),
            Container::Wav => Some(AudioFormat::Wav),
            Container::M4a => Some(AudioFormat::M4a),
            _ => None,
        }
    }
}

/// Allowed audio bitrates, kept as a closed set rather than free-form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioBitrate {
    #[serde(rename = "8")]
    Kbps8,
    #[serde(rename = "64")]
    Kbps64,
    #[serde(rename = "96")]
    Kbps96,
    #[serde(rename = "128")]
    Kbps128,
    #[serde(rename = "192")]
    Kbps192,
    #[serde(rename = "256")]
    Kbps256,
    #[serde(rename = "320")]
    Kbps320,
}

impl AudioBitrate {
    pub fn as_kbps(&self) -> u32 {
        match self {
            AudioBitrate::Kbps8 => 8,
            AudioBitrate::Kbps64 => 64,
            AudioBitrate::Kbps96 => 96,
            AudioBitrate::Kbps128 => 128,
            AudioBitrate::Kbps192 => 192,
            AudioBitrate::Kbps256 => 256,
            AudioBitrate::Kbps320 => 320,
        }
    }
}

impl Default for AudioBitrate {
    fn default() -> Self {
        AudioBitrate::Kbps128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_container_from_path_extension() {
        assert_eq!(
            Container::infer_from_url("https://cdn.example.com/v/clip.mp4?sig=abc"),
            Some(Container::Mp4)
        );
        assert_eq!(
            Container::infer_from_url("https://cdn.example.com/a/track.m4a"),
            Some(Container::M4a)
        );
    }

    #[test]
    fn infers_container_from_query_hints() {
        assert_eq!(
            Container::infer_from_url("https://cdn.example.com/media?mime_type=audio_mpeg&id=1"),
            Some(Container::Mp3)
        );
        assert_eq!(
            Container::infer_from_url("https://cdn.example.com/media?format=webm"),
            Some(Container::Webm)
        );
    }

    #[test]
    fn unknown_shapes_infer_nothing() {
        // Must stay conservative: no extension, no hints, no guess.
        assert_eq!(Container::infer_from_url("https://cdn.example.com/media/1234"), None);
        assert_eq!(Container::infer_from_url("not a url"), None);
    }

    #[test]
    fn best_has_no_concrete_mapping() {
        assert!(AudioFormat::Best.container().is_none());
        assert!(AudioFormat::Best.codec().is_none());
    }

    #[test]
    fn bitrates_round_trip_as_strings() {
        let json = serde_json::to_string(&AudioBitrate::Kbps320).unwrap();
        assert_eq!(json, "\"320\"");
        let back: AudioBitrate = serde_json::from_str("\"8\"").unwrap();
        assert_eq!(back, AudioBitrate::Kbps8);
    }
}
