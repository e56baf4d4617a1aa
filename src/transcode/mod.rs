//! Voice transformation and audio-to-video composition.
//!
//! Both pipelines drive an external ffmpeg binary:
//! 1. The caller's audio (uploaded bytes or a remote URL) is written to a temp file
//! 2. ffmpeg runs either a voice filter chain or an image+audio composition
//! 3. The output file is read back into memory and returned
//! 4. Temp files are removed whatever the outcome

mod error;
mod fetcher;
mod filters;
mod invoker;
mod job;
mod pipeline;
mod probe;
mod temp_files;

pub use error::{FileStage, ProcessErrorKind, TranscodeError};
pub use fetcher::{AudioFetcher, HttpAudioFetcher};
pub use filters::{
    EffectChain, EffectStage, FilterCatalog, FilterProfile, ProfileSummary, StageParam,
};
pub use invoker::TranscodeInvoker;
pub use job::{CompositionSpec, JobSpec, MediaKind, TranscodeJob, VIDEO_FRAME_RATE};
pub use pipeline::{Transcoder, TranscoderSettings};
pub use probe::{MediaProbe, ProbeResult};
pub use temp_files::{TempFiles, TempResource};
