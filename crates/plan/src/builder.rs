//! The decision engine: maps a resolved media record plus request options to
//! one immutable [`StreamPlan`].
//!
//! Pure and deterministic. Expected business outcomes never surface as
//! `Err`/panics; illegal combinations become `PlanKind::Error` plans
//! carrying a taxonomy code.

use rustc_hash::FxHashMap;

use crate::error::{ErrorCode, ErrorContext, ResolveError};
use crate::filename::{VideoSuffix, audio_filename, video_filename};
use crate::formats::{AudioFormat, Container};
use crate::media::{MediaRecord, SourceAsset};
use crate::options::{DownloadMode, DownloadOptions, PlanDefaults};
use crate::plan::{
    AudioEncoding, METADATA_TAGS, OutputFormat, PickerItem, PickerMedia, PlanInput, PlanKind,
    StreamPlan,
};

const MULTIPLIER_PASSTHROUGH: f64 = 1.0;
const MULTIPLIER_REMUX: f64 = 1.1;
const MULTIPLIER_HD: f64 = 4.0;
const MULTIPLIER_GIF: f64 = 60.0;

/// Kinds whose transformation may be deferred to the client. Segmented
/// inputs are excluded: local processing of HLS is explicitly unsupported.
fn local_processing_eligible(kind: &PlanKind) -> bool {
    if kind.is_hls() {
        return false;
    }
    matches!(
        kind,
        PlanKind::MergeTracks { .. }
            | PlanKind::Remux { .. }
            | PlanKind::TranscodeAudio
            | PlanKind::TranscodeGif
    )
}

/// Build the delivery plan for one request. First matching rule wins.
pub fn build(
    record: &MediaRecord,
    options: &DownloadOptions,
    defaults: &PlanDefaults,
) -> StreamPlan {
    // Rule 1: a transient resolver failure short-circuits everything.
    if let Some(error) = &record.transient_error {
        return StreamPlan::error(error.clone());
    }

    let plan = build_inner(record, options, defaults);

    if options.local_processing && local_processing_eligible(&plan.kind) {
        let StreamPlan {
            kind,
            inputs,
            output,
            filename,
            tags,
            size_multiplier,
            prefetch,
        } = plan;
        return StreamPlan {
            kind: PlanKind::LocalProcessing {
                inner: Box::new(kind),
            },
            inputs,
            output,
            filename,
            tags,
            size_multiplier,
            prefetch,
        };
    }

    plan
}

fn build_inner(
    record: &MediaRecord,
    options: &DownloadOptions,
    defaults: &PlanDefaults,
) -> StreamPlan {
    let caps = &record.capabilities;

    // Rule 2: image sets become a picker.
    let images: Vec<&SourceAsset> = record.image_assets().collect();
    if !images.is_empty() {
        return picker_plan(record, options, defaults, &images);
    }

    // Rule 3: audio-only extraction.
    if options.download_mode == DownloadMode::Audio {
        return audio_plan(record, options, defaults);
    }

    // Rule 4: muted output.
    if options.mute {
        if !caps.supports_mute {
            return service_not_supported(record);
        }
        return mute_plan(record, options);
    }

    // Rule 5: HD-enhanced output.
    if options.download_mode == DownloadMode::Hd {
        if !caps.supports_hd {
            return service_not_supported(record);
        }
        return enhance_plan(record, options);
    }

    // Rule 6: GIF-equivalent clips, on request.
    if record.is_gif && options.convert_gif {
        return gif_plan(record, options);
    }

    let video = record.video_assets().next();
    let audio = record.audio_assets().next();

    match (video, audio) {
        // Rule 7: separate tracks, nothing combined.
        (Some(video), Some(audio)) => merge_plan(record, options, video, audio),
        // Rule 8: segmented single asset needs rewrapping.
        (Some(video), None) if caps.has_hls => {
            remux_plan(record, options, video, /* hls */ true, /* drop_audio */ false)
        }
        // Rule 9: plain passthrough.
        (Some(video), None) => passthrough_plan(record, options, video),
        (None, Some(audio)) => audio_plan_for_asset(record, options, defaults, audio, false),
        (None, None) => StreamPlan::error(ResolveError::new(ErrorCode::FetchEmpty)),
    }
}

fn service_not_supported(record: &MediaRecord) -> StreamPlan {
    StreamPlan::error(ResolveError::with_context(
        ErrorCode::ServiceNotSupported,
        ErrorContext::service(record.service.clone()),
    ))
}

fn plan_tags(record: &MediaRecord, options: &DownloadOptions) -> FxHashMap<String, String> {
    if options.disable_metadata {
        return FxHashMap::default();
    }
    record
        .file_metadata
        .iter()
        .filter(|(key, _)| METADATA_TAGS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn input_for(record: &MediaRecord, asset: &SourceAsset) -> PlanInput {
    PlanInput::with_headers(asset.url.clone(), record.headers.clone())
}

/// Direct proxy when the caller insists (or headers are required to fetch),
/// plain redirect otherwise.
fn passthrough_plan(
    record: &MediaRecord,
    options: &DownloadOptions,
    asset: &SourceAsset,
) -> StreamPlan {
    let container = asset.inferred_container().unwrap_or(Container::Mp4);
    let filename = video_filename(&record.filename_base, container, VideoSuffix::default());

    if !options.always_proxy && record.headers.is_empty() {
        return StreamPlan::redirect(asset.url.clone(), filename);
    }

    StreamPlan {
        kind: PlanKind::DirectProxy,
        inputs: vec![input_for(record, asset)],
        output: None,
        filename,
        tags: FxHashMap::default(),
        size_multiplier: MULTIPLIER_PASSTHROUGH,
        prefetch: false,
    }
}

fn merge_plan(
    record: &MediaRecord,
    options: &DownloadOptions,
    video: &SourceAsset,
    audio: &SourceAsset,
) -> StreamPlan {
    let container = video.inferred_container().unwrap_or(Container::Mp4);
    StreamPlan {
        kind: PlanKind::MergeTracks {
            hls: record.capabilities.has_hls,
        },
        // Input order is part of the contract: video first, audio second.
        inputs: vec![input_for(record, video), input_for(record, audio)],
        output: Some(OutputFormat::container(container)),
        filename: video_filename(&record.filename_base, container, VideoSuffix::default()),
        tags: plan_tags(record, options),
        size_multiplier: MULTIPLIER_REMUX,
        prefetch: false,
    }
}

fn remux_plan(
    record: &MediaRecord,
    options: &DownloadOptions,
    asset: &SourceAsset,
    hls: bool,
    drop_audio: bool,
) -> StreamPlan {
    let container = asset.inferred_container().unwrap_or(Container::Mp4);
    StreamPlan {
        kind: PlanKind::Remux { hls, drop_audio },
        inputs: vec![input_for(record, asset)],
        output: Some(OutputFormat::container(container)),
        filename: video_filename(
            &record.filename_base,
            container,
            VideoSuffix {
                mute: drop_audio,
                hd: false,
            },
        ),
        tags: plan_tags(record, options),
        size_multiplier: MULTIPLIER_REMUX,
        prefetch: false,
    }
}

fn mute_plan(record: &MediaRecord, options: &DownloadOptions) -> StreamPlan {
    match record.video_assets().next() {
        Some(video) => remux_plan(
            record,
            options,
            video,
            record.capabilities.has_hls,
            /* drop_audio */ true,
        ),
        None => StreamPlan::error(ResolveError::new(ErrorCode::FetchEmpty)),
    }
}

fn enhance_plan(record: &MediaRecord, options: &DownloadOptions) -> StreamPlan {
    let Some(video) = record.video_assets().next() else {
        return StreamPlan::error(ResolveError::new(ErrorCode::FetchEmpty));
    };
    StreamPlan {
        kind: PlanKind::EnhanceVideo,
        inputs: vec![input_for(record, video)],
        output: Some(OutputFormat::container(Container::MpegTs)),
        filename: video_filename(
            &record.filename_base,
            Container::MpegTs,
            VideoSuffix {
                mute: false,
                hd: true,
            },
        ),
        tags: plan_tags(record, options),
        size_multiplier: MULTIPLIER_HD,
        prefetch: record.capabilities.requires_prefetch,
    }
}

fn gif_plan(record: &MediaRecord, options: &DownloadOptions) -> StreamPlan {
    let Some(video) = record.video_assets().next() else {
        return StreamPlan::error(ResolveError::new(ErrorCode::FetchEmpty));
    };
    StreamPlan {
        kind: PlanKind::TranscodeGif,
        inputs: vec![input_for(record, video)],
        output: Some(OutputFormat::container(Container::Gif)),
        filename: format!("{}.gif", record.filename_base),
        tags: plan_tags(record, options),
        size_multiplier: MULTIPLIER_GIF,
        prefetch: false,
    }
}

fn audio_plan(
    record: &MediaRecord,
    options: &DownloadOptions,
    defaults: &PlanDefaults,
) -> StreamPlan {
    if !record.capabilities.supports_audio {
        return StreamPlan::error(ResolveError::with_context(
            ErrorCode::ServiceAudioNotSupported,
            ErrorContext::service(record.service.clone()),
        ));
    }

    // Prefer a standalone audio track; fall back to extracting from video.
    let original = options.full_audio && record.audio_assets().next().is_some();
    let asset = record
        .audio_assets()
        .next()
        .or_else(|| record.video_assets().next());
    let Some(asset) = asset else {
        return StreamPlan::error(ResolveError::new(ErrorCode::FetchEmpty));
    };

    audio_plan_for_asset(record, options, defaults, asset, original)
}

fn audio_plan_for_asset(
    record: &MediaRecord,
    options: &DownloadOptions,
    defaults: &PlanDefaults,
    asset: &SourceAsset,
    original: bool,
) -> StreamPlan {
    // Resolve "best": the resolver's hint keeps the copy path open, the
    // configured default does not.
    let (format, copy_candidate) = if options.audio_format.is_best() {
        match record.best_audio {
            Some(hint) if !hint.is_best() => (hint, true),
            _ => (defaults.audio_format, false),
        }
    } else {
        (options.audio_format, true)
    };

    let source_container = asset.inferred_container();
    let format_matches = source_container.is_some() && source_container == format.container();

    // Copy-possible fast path: declared source container/codec equals the
    // target exactly, and the source isn't segmented. Ties break toward
    // transcoding.
    if copy_candidate && format_matches && !record.capabilities.has_hls {
        return StreamPlan {
            kind: PlanKind::DirectProxy,
            inputs: vec![input_for(record, asset)],
            output: None,
            filename: audio_filename(&record.filename_base, format, original),
            tags: FxHashMap::default(),
            size_multiplier: MULTIPLIER_PASSTHROUGH,
            prefetch: false,
        };
    }

    let Some(container) = format.container() else {
        // Defaults are validated at config load; an unresolvable format here
        // is a configuration bug, surfaced as a plain fetch failure.
        return StreamPlan::error(ResolveError::critical(ErrorCode::FetchCritical));
    };

    // Segmented sources with a matching codec still avoid a re-encode: the
    // remux copies the stream into the target container.
    let copy = format_matches && record.capabilities.has_hls;

    StreamPlan {
        kind: PlanKind::TranscodeAudio,
        inputs: vec![input_for(record, asset)],
        output: Some(OutputFormat::audio(
            container,
            AudioEncoding {
                format,
                bitrate: options.audio_bitrate,
                copy,
            },
        )),
        filename: audio_filename(&record.filename_base, format, original),
        tags: plan_tags(record, options),
        size_multiplier: audio_multiplier(format, options) * 1.1,
        prefetch: record.capabilities.requires_prefetch,
    }
}

fn audio_multiplier(format: AudioFormat, options: &DownloadOptions) -> f64 {
    match format {
        AudioFormat::Mp3 if options.audio_bitrate.as_kbps() == 8 => 0.3,
        AudioFormat::Mp3 => 0.5,
        AudioFormat::Opus => 0.4,
        _ => 0.6,
    }
}

fn picker_plan(
    record: &MediaRecord,
    options: &DownloadOptions,
    defaults: &PlanDefaults,
    images: &[&SourceAsset],
) -> StreamPlan {
    let items = images
        .iter()
        .enumerate()
        .map(|(index, asset)| {
            let ext = asset
                .inferred_container()
                .map(|c| c.ext())
                .unwrap_or("jpg");
            let item_plan = StreamPlan {
                kind: PlanKind::DirectProxy,
                inputs: vec![input_for(record, asset)],
                output: None,
                filename: format!("{}_{}.{ext}", record.filename_base, index + 1),
                tags: FxHashMap::default(),
                size_multiplier: MULTIPLIER_PASSTHROUGH,
                prefetch: false,
            };
            PickerItem {
                media: PickerMedia::Photo,
                plan: item_plan,
            }
        })
        .collect();

    // Image posts often carry a background track worth offering alongside.
    let audio = record
        .audio_assets()
        .next()
        .filter(|_| record.capabilities.supports_audio)
        .map(|asset| Box::new(audio_plan_for_asset(record, options, defaults, asset, false)));

    StreamPlan {
        kind: PlanKind::Picker { items, audio },
        inputs: Vec::new(),
        output: None,
        filename: record.filename_base.clone(),
        tags: FxHashMap::default(),
        size_multiplier: MULTIPLIER_PASSTHROUGH,
        prefetch: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::AudioBitrate;
    use crate::media::{AssetKind, ServiceCapabilities};

    fn video_record(url: &str) -> MediaRecord {
        let mut record = MediaRecord::new("example", "clip_42");
        record.assets.push(SourceAsset::new(AssetKind::Video, url));
        record
    }

    fn options() -> DownloadOptions {
        DownloadOptions::default()
    }

    fn defaults() -> PlanDefaults {
        PlanDefaults::default()
    }

    #[test]
    fn transient_error_short_circuits_with_code_preserved() {
        let mut record = MediaRecord::failed(
            "example",
            ResolveError::new(ErrorCode::ContentPostUnavailable),
        );
        // Assets present alongside the error must never be touched.
        record
            .assets
            .push(SourceAsset::new(AssetKind::Video, "https://x/v.mp4"));

        let plan = build(&record, &options(), &defaults());
        let error = plan.as_error().expect("error plan");
        assert_eq!(error.code, ErrorCode::ContentPostUnavailable);
        assert!(plan.inputs.is_empty());
    }

    #[test]
    fn single_video_without_proxy_redirects_to_origin() {
        let record = video_record("https://cdn.example.com/v/clip.mp4");
        let plan = build(&record, &options(), &defaults());

        assert_eq!(
            plan.kind,
            PlanKind::Redirect {
                url: "https://cdn.example.com/v/clip.mp4".into()
            }
        );
        assert_eq!(plan.filename, "clip_42.mp4");
    }

    #[test]
    fn always_proxy_turns_redirect_into_tunnel() {
        let record = video_record("https://cdn.example.com/v/clip.mp4");
        let plan = build(
            &record,
            &DownloadOptions {
                always_proxy: true,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::DirectProxy);
        assert_eq!(plan.inputs.len(), 1);
    }

    #[test]
    fn required_headers_force_proxy_even_without_always_proxy() {
        let mut record = video_record("https://cdn.example.com/v/clip.mp4");
        record
            .headers
            .insert("cookie".into(), "session=abc".into());

        let plan = build(&record, &options(), &defaults());
        assert_eq!(plan.kind, PlanKind::DirectProxy);
        assert_eq!(plan.inputs[0].headers.get("cookie").unwrap(), "session=abc");
    }

    #[test]
    fn separate_tracks_merge_video_first() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Video, "https://x/video.mp4"));
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/audio.m4a"));

        let plan = build(&record, &options(), &defaults());
        assert_eq!(plan.kind, PlanKind::MergeTracks { hls: false });
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.inputs[0].url, "https://x/video.mp4");
        assert_eq!(plan.inputs[1].url, "https://x/audio.m4a");
    }

    #[test]
    fn hls_single_asset_remuxes() {
        let mut record = video_record("https://x/master.m3u8");
        record.capabilities.has_hls = true;

        let plan = build(&record, &options(), &defaults());
        assert_eq!(
            plan.kind,
            PlanKind::Remux {
                hls: true,
                drop_audio: false
            }
        );
    }

    #[test]
    fn three_images_build_a_picker() {
        let mut record = MediaRecord::new("example", "post_9");
        for i in 1..=3 {
            record.assets.push(SourceAsset::new(
                AssetKind::Image,
                format!("https://x/img_{i}.jpg"),
            ));
        }

        let plan = build(&record, &options(), &defaults());
        let PlanKind::Picker { items, audio } = &plan.kind else {
            panic!("expected picker, got {:?}", plan.kind);
        };
        assert_eq!(items.len(), 3);
        assert!(audio.is_none());
        for item in items {
            assert_eq!(item.plan.kind, PlanKind::DirectProxy);
        }
    }

    #[test]
    fn picker_carries_background_audio_when_present() {
        let mut record = MediaRecord::new("example", "post_9");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Image, "https://x/img.jpg"));
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/sound.mp3"));
        record.best_audio = Some(AudioFormat::Mp3);

        let plan = build(&record, &options(), &defaults());
        let PlanKind::Picker { audio, .. } = &plan.kind else {
            panic!("expected picker");
        };
        // mp3 hint against an mp3 source: the audio entry rides the copy path.
        assert_eq!(audio.as_ref().unwrap().kind, PlanKind::DirectProxy);
    }

    #[test]
    fn matching_best_audio_hint_takes_the_copy_path() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/track.m4a"));
        record.best_audio = Some(AudioFormat::M4a);

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::DirectProxy);
        assert_eq!(plan.filename, "clip_42_audio.m4a");
    }

    #[test]
    fn missing_hint_forces_reencode_even_when_containers_match() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/track.m4a"));
        // No best_audio hint: default format applies and copy is off the table.

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::TranscodeAudio);
        let audio = plan.output.unwrap().audio.unwrap();
        assert_eq!(audio.format, AudioFormat::M4a);
        assert!(!audio.copy);
    }

    #[test]
    fn unknown_source_container_falls_back_to_transcode() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/media/81736"));
        record.best_audio = Some(AudioFormat::Mp3);

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                ..options()
            },
            &defaults(),
        );
        // Nothing could be inferred, so claiming copy-possible would be the
        // dangerous direction.
        assert_eq!(plan.kind, PlanKind::TranscodeAudio);
    }

    #[test]
    fn audio_unsupported_service_is_a_typed_error() {
        let mut record = video_record("https://x/v.mp4");
        record.capabilities.supports_audio = false;

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                ..options()
            },
            &defaults(),
        );
        let error = plan.as_error().unwrap();
        assert_eq!(error.code, ErrorCode::ServiceAudioNotSupported);
    }

    #[test]
    fn hd_against_unsupporting_service_errors_regardless_of_options() {
        let mut record = video_record("https://x/v.mp4");
        record.capabilities.supports_hd = false;

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Hd,
                always_proxy: true,
                local_processing: true,
                ..options()
            },
            &defaults(),
        );
        let error = plan.as_error().unwrap();
        assert_eq!(error.code, ErrorCode::ServiceNotSupported);
        assert_eq!(error.context.as_ref().unwrap().service.as_deref(), Some("example"));
    }

    #[test]
    fn hd_supported_builds_enhance_plan_with_suffix() {
        let mut record = video_record("https://x/v.mp4");
        record.capabilities.supports_hd = true;
        record.capabilities.requires_prefetch = true;

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Hd,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::EnhanceVideo);
        assert_eq!(plan.filename, "clip_42_HD.ts");
        assert!(plan.prefetch);
    }

    #[test]
    fn mute_unsupported_errors_mute_supported_drops_audio() {
        let mut record = video_record("https://x/v.mp4");
        record.capabilities.supports_mute = false;
        let plan = build(
            &record,
            &DownloadOptions {
                mute: true,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.as_error().unwrap().code, ErrorCode::ServiceNotSupported);

        record.capabilities.supports_mute = true;
        let plan = build(
            &record,
            &DownloadOptions {
                mute: true,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(
            plan.kind,
            PlanKind::Remux {
                hls: false,
                drop_audio: true
            }
        );
        assert_eq!(plan.filename, "clip_42_mute.mp4");
    }

    #[test]
    fn gif_clip_converts_on_request_only() {
        let mut record = video_record("https://x/v.mp4");
        record.is_gif = true;

        let plan = build(&record, &options(), &defaults());
        assert_eq!(
            plan.kind,
            PlanKind::Redirect {
                url: "https://x/v.mp4".into()
            }
        );

        let plan = build(
            &record,
            &DownloadOptions {
                convert_gif: true,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::TranscodeGif);
        assert_eq!(plan.filename, "clip_42.gif");
    }

    #[test]
    fn local_processing_wraps_eligible_kinds_but_never_hls() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Video, "https://x/video.mp4"));
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/audio.m4a"));

        let plan = build(
            &record,
            &DownloadOptions {
                local_processing: true,
                ..options()
            },
            &defaults(),
        );
        let PlanKind::LocalProcessing { inner } = &plan.kind else {
            panic!("expected local processing wrapper");
        };
        assert_eq!(**inner, PlanKind::MergeTracks { hls: false });
        assert_eq!(plan.kind.processing_name(), Some("merge"));

        record.capabilities.has_hls = true;
        let plan = build(
            &record,
            &DownloadOptions {
                local_processing: true,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::MergeTracks { hls: true });
    }

    #[test]
    fn metadata_is_filtered_by_the_allow_list() {
        let mut record = MediaRecord::new("example", "clip_42");
        record
            .assets
            .push(SourceAsset::new(AssetKind::Audio, "https://x/track.wav"));
        record
            .file_metadata
            .insert("title".into(), "A Song".into());
        record
            .file_metadata
            .insert("x-internal-id".into(), "999".into());

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                audio_format: AudioFormat::Mp3,
                audio_bitrate: AudioBitrate::Kbps192,
                ..options()
            },
            &defaults(),
        );
        assert_eq!(plan.kind, PlanKind::TranscodeAudio);
        assert_eq!(plan.tags.get("title").unwrap(), "A Song");
        assert!(!plan.tags.contains_key("x-internal-id"));

        let plan = build(
            &record,
            &DownloadOptions {
                download_mode: DownloadMode::Audio,
                audio_format: AudioFormat::Mp3,
                disable_metadata: true,
                ..options()
            },
            &defaults(),
        );
        assert!(plan.tags.is_empty());
    }

    #[test]
    fn empty_record_is_fetch_empty() {
        let record = MediaRecord::new("example", "clip_42");
        let plan = build(&record, &options(), &defaults());
        assert_eq!(plan.as_error().unwrap().code, ErrorCode::FetchEmpty);
    }
}
