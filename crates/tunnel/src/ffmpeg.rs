//! ffmpeg argument construction.
//!
//! A pure function of the stream plan: no I/O, no process handling. The
//! output is written to stdout (`pipe:1`) so the runner can forward bytes as
//! they are produced.

use rustc_hash::FxHashMap;

use sluice_plan::{Container, METADATA_TAGS, PlanKind, StreamPlan};

use crate::error::StreamError;

/// One resolved ffmpeg input. Usually the plan input verbatim; the runner
/// substitutes a local path after a prefetch.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub location: String,
    pub headers: FxHashMap<String, String>,
}

impl From<&sluice_plan::PlanInput> for InputSource {
    fn from(input: &sluice_plan::PlanInput) -> Self {
        Self {
            location: input.url.clone(),
            headers: input.headers.clone(),
        }
    }
}

impl InputSource {
    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

/// `key: value\r\n` block for ffmpeg's `-headers` flag.
fn raw_header_block(headers: &FxHashMap<String, String>) -> String {
    let mut block = String::new();
    for (key, value) in headers {
        block.push_str(key);
        block.push_str(": ");
        block.push_str(value);
        block.push_str("\r\n");
    }
    block
}

fn push_input(args: &mut Vec<String>, input: &InputSource) {
    if input.is_remote() && !input.headers.is_empty() {
        args.push("-headers".into());
        args.push(raw_header_block(&input.headers));
    }
    args.push("-i".into());
    args.push(input.location.clone());
}

/// Allow-listed `-metadata` flags, sorted by key for deterministic argument
/// lists. An unknown key is a contract violation, not something to pass
/// through unsanitized.
fn metadata_args(tags: &FxHashMap<String, String>) -> Result<Vec<String>, StreamError> {
    let mut entries: Vec<(&String, &String)> = tags.iter().collect();
    entries.sort_by_key(|(key, _)| key.as_str());

    let mut args = Vec::with_capacity(entries.len() * 2);
    for (key, value) in entries {
        if !METADATA_TAGS.contains(&key.as_str()) {
            return Err(StreamError::MetadataTag { name: key.clone() });
        }
        let clean: String = value.chars().filter(|c| !c.is_control()).collect();
        args.push("-metadata".into());
        args.push(format!("{key}={clean}"));
    }
    Ok(args)
}

fn container_copy_args(args: &mut Vec<String>, container: Container) {
    match container {
        Container::Mp4 => {
            args.extend(
                ["-c:v", "copy", "-c:a", "copy", "-movflags", "faststart+frag_keyframe+empty_moov"]
                    .map(String::from),
            );
        }
        Container::Webm => {
            args.extend(["-c:v", "copy", "-c:a", "copy"].map(String::from));
        }
        _ => {
            args.extend(["-c", "copy"].map(String::from));
        }
    }
}

/// Build the full argument list for a streaming plan.
///
/// `inputs` must already be validated against the plan kind (one input, two
/// for merge).
pub fn build_args(plan: &StreamPlan, inputs: &[InputSource]) -> Result<Vec<String>, StreamError> {
    let mut args: Vec<String> = vec!["-loglevel".into(), "error".into(), "-nostdin".into()];

    let container = plan.output.map(|o| o.container);

    match &plan.kind {
        PlanKind::MergeTracks { hls } => {
            let container = container.unwrap_or(Container::Mp4);
            for input in inputs {
                push_input(&mut args, input);
            }
            args.extend(["-map", "0:v", "-map", "1:a"].map(String::from));
            container_copy_args(&mut args, container);
            if *hls {
                // Segmented audio needs rewrapping out of ADTS.
                if container == Container::Webm {
                    args.extend(["-c:a", "libopus"].map(String::from));
                } else {
                    args.extend(["-c:a", "aac", "-bsf:a", "aac_adtstoasc"].map(String::from));
                }
            }
            args.extend(metadata_args(&plan.tags)?);
            args.push("-f".into());
            args.push(container.muxer().into());
        }

        PlanKind::Remux { hls, drop_audio } => {
            let container = container.unwrap_or(Container::Mp4);
            push_input(&mut args, &inputs[0]);
            args.extend(["-c:v", "copy"].map(String::from));
            if *drop_audio {
                args.push("-an".into());
            } else if *hls && container != Container::Webm {
                args.extend(["-c:a", "aac", "-bsf:a", "aac_adtstoasc"].map(String::from));
            } else {
                args.extend(["-c:a", "copy"].map(String::from));
            }
            if container == Container::Mp4 {
                args.extend(
                    ["-movflags", "faststart+frag_keyframe+empty_moov"].map(String::from),
                );
            }
            args.extend(metadata_args(&plan.tags)?);
            args.push("-f".into());
            args.push(container.muxer().into());
        }

        PlanKind::TranscodeAudio => {
            let Some(encoding) = plan.output.and_then(|o| o.audio) else {
                return Err(StreamError::invalid_plan(
                    "audio transcode without encode settings",
                ));
            };
            let container = container.unwrap_or(Container::M4a);
            push_input(&mut args, &inputs[0]);
            args.push("-vn".into());
            if encoding.copy {
                args.extend(["-c:a", "copy"].map(String::from));
            } else {
                if let Some(codec) = encoding.format.codec() {
                    args.extend(["-c:a".into(), codec.to_string()]);
                }
                args.push("-b:a".into());
                args.push(format!("{}k", encoding.bitrate.as_kbps()));
            }
            // Format-specific quirks, matching what the encoders expect.
            match container {
                Container::Mp3 if encoding.bitrate.as_kbps() == 8 => {
                    args.extend(["-ar", "12000"].map(String::from));
                }
                Container::Opus => {
                    args.extend(["-vbr", "off"].map(String::from));
                }
                Container::M4a => {
                    args.extend(["-movflags", "frag_keyframe+empty_moov"].map(String::from));
                }
                _ => {}
            }
            args.extend(metadata_args(&plan.tags)?);
            args.push("-f".into());
            args.push(container.muxer().into());
        }

        PlanKind::TranscodeGif => {
            push_input(&mut args, &inputs[0]);
            args.extend(
                [
                    "-vf",
                    "scale=-1:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
                    "-loop",
                    "0",
                    "-f",
                    "gif",
                ]
                .map(String::from),
            );
        }

        PlanKind::EnhanceVideo => {
            push_input(&mut args, &inputs[0]);
            args.extend(
                [
                    "-c:v",
                    "copy",
                    "-c:a",
                    "copy",
                    "-avoid_negative_ts",
                    "make_zero",
                    "-fflags",
                    "+genpts+igndts",
                    "-max_muxing_queue_size",
                    "2048",
                    "-f",
                    "mpegts",
                ]
                .map(String::from),
            );
        }

        other => {
            return Err(StreamError::invalid_plan(format!(
                "kind {other:?} does not spawn a process"
            )));
        }
    }

    args.push("pipe:1".into());
    Ok(args)
}
