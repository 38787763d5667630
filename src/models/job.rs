use serde_json::Value;
use std::fmt;
use strum::EnumString;

/// Status of a remote prediction, in the remote service's own vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    /// Any status string outside the known vocabulary. Treated as non-terminal.
    #[strum(default)]
    Unrecognized(String),
}

impl JobStatus {
    pub fn from_remote(raw: &str) -> Self {
        raw.parse()
            .unwrap_or_else(|_| JobStatus::Unrecognized(raw.to_string()))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a remote prediction, as returned by a status request.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Set once the job has succeeded; a single URL or a list of URLs.
    pub output: Option<Value>,
    /// Set once the job has failed; kept verbatim for the caller.
    pub error: Option<Value>,
}

impl Job {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            output: None,
            error: None,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses_parse() {
        assert_eq!(JobStatus::from_remote("pending"), JobStatus::Pending);
        assert_eq!(JobStatus::from_remote("processing"), JobStatus::Processing);
        assert_eq!(JobStatus::from_remote("succeeded"), JobStatus::Succeeded);
        assert_eq!(JobStatus::from_remote("failed"), JobStatus::Failed);
    }

    #[test]
    fn test_unknown_status_is_kept_and_non_terminal() {
        let status = JobStatus::from_remote("starting");
        assert_eq!(status, JobStatus::Unrecognized("starting".to_string()));
        assert!(!status.is_terminal());
        assert_eq!(status.to_string(), "starting");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
