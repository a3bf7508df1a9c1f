// ⚠️ Analysis Errors - Every way an analysis attempt can fail
// None of these are fatal: each attempt can be retried with new input.

use thiserror::Error;

/// Which of the two uploaded exports a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFile {
    Followers,
    Following,
}

impl InputFile {
    pub fn name(&self) -> &str {
        match self {
            InputFile::Followers => "followers",
            InputFile::Following => "following",
        }
    }
}

impl std::fmt::Display for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// One or both exports were not supplied
    #[error("both followers and following files are required")]
    MissingInput,

    /// Raw content did not decode as JSON
    #[error("{file} file is not valid JSON: {reason}")]
    UnparseableContent { file: InputFile, reason: String },

    /// Valid JSON, but no user list was found in either export
    #[error("no recognizable user list found in either file")]
    InvalidFormat,

    /// Remote collaborator reported a failure or could not be reached
    #[error("remote fetch failed: {0}")]
    RemoteFetchFailed(String),

    /// Persisting or clearing the analysis failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl AnalysisError {
    /// Localization key the presentation layer looks up for this error
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::MissingInput => "missingFiles",
            AnalysisError::UnparseableContent { .. } | AnalysisError::InvalidFormat => "invalidFile",
            AnalysisError::RemoteFetchFailed(_) => "fetchError",
            AnalysisError::Storage(_) => "storageError",
        }
    }
}
