//! Wire types for the resolve endpoint, and the encoder mapping a stream
//! plan onto them.
//!
//! Every streamable plan is exposed as a tunnel URL minted against the
//! one-shot store; origin URLs only appear on the wire when nothing needs
//! proxying.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use sluice_plan::{
    AudioBitrate, AudioFormat, DownloadOptions, PickerMedia, PlanKind, ResolveError, StreamPlan,
};

use crate::config::AppConfig;
use crate::tunnel_store::TunnelStore;

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: DownloadOptions,
}

#[derive(Debug, Serialize)]
pub struct PickerEntry {
    #[serde(rename = "type")]
    pub media: PickerMedia,
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct OutputInfo {
    /// Content type of the finished output.
    #[serde(rename = "type")]
    pub mime: String,
    pub filename: String,
    #[serde(skip_serializing_if = "FxHashMap::is_empty")]
    pub metadata: FxHashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct AudioInfo {
    pub copy: bool,
    pub format: AudioFormat,
    pub bitrate: AudioBitrate,
}

/// Resolve response, discriminated on `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ApiResponse {
    Error {
        error: ResolveError,
    },
    Redirect {
        url: String,
        filename: String,
    },
    Tunnel {
        url: String,
        filename: String,
    },
    Picker {
        picker: Vec<PickerEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<String>,
        #[serde(rename = "audioFilename", skip_serializing_if = "Option::is_none")]
        audio_filename: Option<String>,
    },
    LocalProcessing {
        #[serde(rename = "type")]
        task: String,
        /// One tunnel per raw input, in plan order.
        tunnel: Vec<String>,
        output: OutputInfo,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<AudioInfo>,
    },
}

impl ApiResponse {
    pub fn error(error: ResolveError) -> Self {
        ApiResponse::Error { error }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error { .. })
    }
}

fn mint(plan: StreamPlan, config: &AppConfig, store: &TunnelStore) -> String {
    config.tunnel_url(store.mint(plan))
}

/// Whether a sub-plan can be answered with its origin URL instead of a
/// tunnel: a plain proxy item whose fetch needs no extra headers.
fn direct_url(plan: &StreamPlan, always_proxy: bool) -> Option<String> {
    if always_proxy || !matches!(plan.kind, PlanKind::DirectProxy) {
        return None;
    }
    let input = plan.inputs.first()?;
    input.headers.is_empty().then(|| input.url.clone())
}

/// Map a built plan onto its wire response, minting tunnel ids as needed.
pub fn encode_plan(
    plan: StreamPlan,
    always_proxy: bool,
    config: &AppConfig,
    store: &TunnelStore,
) -> ApiResponse {
    match plan.kind {
        PlanKind::Error { error } => ApiResponse::Error { error },

        PlanKind::Redirect { url } => ApiResponse::Redirect {
            url,
            filename: plan.filename,
        },

        PlanKind::Picker { items, audio } => {
            let picker = items
                .into_iter()
                .map(|item| {
                    let filename = item.plan.filename.clone();
                    let url = direct_url(&item.plan, always_proxy)
                        .unwrap_or_else(|| mint(item.plan, config, store));
                    PickerEntry {
                        media: item.media,
                        url,
                        filename,
                    }
                })
                .collect();

            let (audio, audio_filename) = match audio {
                Some(sub) => {
                    let filename = sub.filename.clone();
                    let url = direct_url(&sub, always_proxy)
                        .unwrap_or_else(|| mint(*sub, config, store));
                    (Some(url), Some(filename))
                }
                None => (None, None),
            };

            ApiResponse::Picker {
                picker,
                audio,
                audio_filename,
            }
        }

        PlanKind::LocalProcessing { ref inner } => {
            let task = inner
                .processing_name()
                .unwrap_or("remux")
                .to_string();
            let output = OutputInfo {
                mime: plan
                    .output
                    .map(|o| o.container.mime().to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                filename: plan.filename.clone(),
                metadata: plan.tags.clone(),
            };
            let audio = plan.output.and_then(|o| o.audio).map(|a| AudioInfo {
                copy: a.copy,
                format: a.format,
                bitrate: a.bitrate,
            });

            let tunnel = plan
                .inputs
                .iter()
                .map(|input| {
                    let sub = StreamPlan {
                        kind: PlanKind::DirectProxy,
                        inputs: vec![input.clone()],
                        output: None,
                        filename: plan.filename.clone(),
                        tags: FxHashMap::default(),
                        size_multiplier: 1.0,
                        prefetch: false,
                    };
                    mint(sub, config, store)
                })
                .collect();

            ApiResponse::LocalProcessing {
                task,
                tunnel,
                output,
                audio,
            }
        }

        // Everything else streams through the tunnel endpoint.
        _ => {
            let filename = plan.filename.clone();
            ApiResponse::Tunnel {
                url: mint(plan, config, store),
                filename,
            }
        }
    }
}
