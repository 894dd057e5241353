//! # sluice-plan
//!
//! The delivery decision engine. Given a normalized [`MediaRecord`] from the
//! resolution layer and the caller's [`DownloadOptions`], [`build`] produces
//! one immutable [`StreamPlan`] describing exactly how the media is
//! delivered: redirect, direct proxy, remux, two-track merge, transcode, or
//! a picker of independent assets.
//!
//! This crate is pure: no I/O, no clocks, no async. Business failures are
//! error plans carrying stable dotted codes, never `Err` values.

pub mod builder;
pub mod error;
pub mod filename;
pub mod formats;
pub mod media;
pub mod options;
pub mod plan;

pub use builder::build;
pub use error::{ErrorCode, ErrorContext, ResolveError};
pub use formats::{AudioBitrate, AudioFormat, Container};
pub use media::{AssetKind, MediaRecord, ServiceCapabilities, SourceAsset};
pub use options::{DownloadMode, DownloadOptions, PlanDefaults};
pub use plan::{
    AudioEncoding, METADATA_TAGS, OutputFormat, PickerItem, PickerMedia, PlanInput, PlanKind,
    StreamPlan,
};
