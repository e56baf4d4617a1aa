use thiserror::Error;

use super::job::MediaKind;

/// Why an external engine invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    /// The binary could not be found or executed.
    NotFound,
    /// The process ran and exited with a nonzero status.
    Failed,
    /// The process exceeded the configured timeout and was killed.
    TimedOut,
}

impl std::fmt::Display for ProcessErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessErrorKind::NotFound => write!(f, "not found"),
            ProcessErrorKind::Failed => write!(f, "failed"),
            ProcessErrorKind::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Pipeline step that moves media between memory and a temp file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    /// Writing the uploaded or downloaded audio to its input file.
    SaveInput,
    /// Reading the engine output back into memory.
    ReadOutput,
}

impl std::fmt::Display for FileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStage::SaveInput => write!(f, "saving input"),
            FileStage::ReadOutput => write!(f, "reading output"),
        }
    }
}

/// Errors that can occur while running a transcoding pipeline.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    #[error("{program} {kind}")]
    Process {
        program: String,
        kind: ProcessErrorKind,
        /// Captured stdout/stderr of the process. Logged, never sent to clients.
        diagnostic: String,
    },

    #[error("Failed to parse probe output: {0}")]
    Parse(String),

    #[error("IO error while {stage}: {source}")]
    Storage {
        stage: FileStage,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    pub fn storage(stage: FileStage, source: std::io::Error) -> Self {
        TranscodeError::Storage { stage, source }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, TranscodeError::Validation(_))
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            TranscodeError::Validation(_) => "validation",
            TranscodeError::Upstream(_) => "upstream",
            TranscodeError::Process { .. } => "process",
            TranscodeError::Parse(_) => "parse",
            TranscodeError::Storage { .. } | TranscodeError::Io(_) => "io",
        }
    }

    /// Message that is safe to hand back to the caller of a `kind` pipeline.
    pub fn public_message(&self, kind: MediaKind) -> String {
        let message = match (self, kind) {
            (TranscodeError::Validation(msg), _) => return msg.clone(),
            (TranscodeError::Upstream(_), _) => "Failed to fetch remote audio",
            (
                TranscodeError::Process {
                    kind: ProcessErrorKind::TimedOut,
                    ..
                },
                MediaKind::Audio,
            ) => "Audio processing timed out",
            (
                TranscodeError::Process {
                    kind: ProcessErrorKind::TimedOut,
                    ..
                },
                MediaKind::Video,
            ) => "Video processing timed out",
            (TranscodeError::Process { .. }, MediaKind::Audio) => "Error processing audio",
            (TranscodeError::Process { .. }, MediaKind::Video) => "Error processing video",
            (TranscodeError::Parse(_), _) => "Failed to inspect audio",
            (
                TranscodeError::Storage {
                    stage: FileStage::SaveInput,
                    ..
                },
                MediaKind::Audio,
            ) => "Failed to save uploaded file",
            (
                TranscodeError::Storage {
                    stage: FileStage::SaveInput,
                    ..
                },
                MediaKind::Video,
            ) => "Failed to save downloaded audio",
            (
                TranscodeError::Storage {
                    stage: FileStage::ReadOutput,
                    ..
                },
                MediaKind::Audio,
            ) => "Failed to read processed audio",
            (
                TranscodeError::Storage {
                    stage: FileStage::ReadOutput,
                    ..
                },
                MediaKind::Video,
            ) => "Failed to read processed video",
            (TranscodeError::Io(_), _) => "Internal server error",
        };
        message.to_string()
    }
}
