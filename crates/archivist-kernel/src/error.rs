//! Workflow run errors.

use thiserror::Error;

/// Why a workflow run stopped before execution.
#[derive(Error, Debug)]
pub enum RunError {
    /// The workflow document itself is unusable (missing, malformed, unknown channel).
    #[error("{0}")]
    Fatal(String),

    /// Pre-flight analysis found problems. Nothing was posted.
    #[error("Workflow analysis found {} error(s)", .0.len())]
    Analysis(Vec<String>),

    /// The operator cancelled before execution began.
    #[error("Workflow run cancelled")]
    Cancelled,
}

impl RunError {
    /// Every message to show the operator, one per line.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Analysis(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Alias for Result with RunError.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_display_counts_errors() {
        let err = RunError::Analysis(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Workflow analysis found 2 error(s)");
        assert_eq!(err.messages().len(), 2);
        assert_eq!(
            RunError::Fatal("Invalid JSON in workflow.json".into()).messages(),
            vec!["Invalid JSON in workflow.json"]
        );
    }
}
