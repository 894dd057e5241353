//! Stream executor: turns a stream plan into actual bytes.
//!
//! A plan is executed as either a managed processing subprocess (remux,
//! merge, transcode) whose stdout is relayed to the consumer, or a direct
//! proxy of origin bytes. Either way the operation is bounded by a deadline,
//! cancellable, and guaranteed to release its process, pipe, temp files and
//! registry entry on every exit path.

pub mod error;
pub mod ffmpeg;
pub mod http;
pub mod proxy;
pub mod registry;
pub mod runner;
pub mod tempfile;

pub use error::StreamError;
pub use ffmpeg::{InputSource, build_args};
pub use registry::{OperationEntry, OperationRegistry};
pub use runner::{
    ByteSink, ByteStream, ProcessRunner, RunnerConfig, StartInfo, StreamHandle, StreamOutcome,
};
pub use tempfile::{TempFileConfig, TempFileManager};
