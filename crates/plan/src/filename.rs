//! Output filename derivation.
//!
//! The base comes from the resolver's `filename_base`; the extension always
//! comes from the final output format, never from the source URL.

use crate::formats::{AudioFormat, Container};

#[derive(Debug, Clone, Copy, Default)]
pub struct VideoSuffix {
    pub mute: bool,
    pub hd: bool,
}

pub fn video_filename(base: &str, container: Container, suffix: VideoSuffix) -> String {
    let mut name = String::from(base);
    if suffix.mute {
        name.push_str("_mute");
    }
    if suffix.hd {
        name.push_str("_HD");
    }
    name.push('.');
    name.push_str(container.ext());
    name
}

/// `original` marks full/original-track audio, which gets its own suffix so
/// clipped and full downloads of the same post don't collide.
pub fn audio_filename(base: &str, format: AudioFormat, original: bool) -> String {
    let ext = format
        .container()
        .map(|c| c.ext())
        .unwrap_or("m4a");
    let suffix = if original { "_audio_original" } else { "_audio" };
    format!("{base}{suffix}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_compose_in_order() {
        assert_eq!(
            video_filename("clip_123", Container::Mp4, VideoSuffix::default()),
            "clip_123.mp4"
        );
        assert_eq!(
            video_filename(
                "clip_123",
                Container::Mp4,
                VideoSuffix {
                    mute: true,
                    hd: false
                }
            ),
            "clip_123_mute.mp4"
        );
        assert_eq!(
            video_filename(
                "clip_123",
                Container::MpegTs,
                VideoSuffix {
                    mute: false,
                    hd: true
                }
            ),
            "clip_123_HD.ts"
        );
    }

    #[test]
    fn audio_extension_comes_from_the_format() {
        assert_eq!(
            audio_filename("clip_123", AudioFormat::Opus, false),
            "clip_123_audio.opus"
        );
        assert_eq!(
            audio_filename("clip_123", AudioFormat::Mp3, true),
            "clip_123_audio_original.mp3"
        );
    }
}
