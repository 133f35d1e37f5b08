//! ProjectSource trait - common interface for registry metadata sources.

use thiserror::Error;

use crate::core::ProjectDescriptor;
use crate::util::diagnostic::Diagnostic;

/// Failure to obtain one project's descriptor.
///
/// Always scoped to a single project: the caller logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("project `{project}` not found in registry")]
    NotFound { project: String },

    #[error("failed to fetch `{project}`: {message}")]
    Transport { project: String, message: String },

    #[error("invalid registry response for `{project}`: {message}")]
    InvalidResponse { project: String, message: String },
}

impl FetchError {
    /// The project the failure refers to.
    pub fn project(&self) -> &str {
        match self {
            FetchError::NotFound { project }
            | FetchError::Transport { project, .. }
            | FetchError::InvalidResponse { project, .. } => project,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            FetchError::NotFound { project } => {
                Diagnostic::error(format!("could not find `{}` in the registry", project))
                    .with_suggestion("Check that the project name is spelled correctly")
                    .with_suggestion(format!(
                        "Add an entry for `{}` under [exceptions] if it is packaged under another name",
                        project
                    ))
            }
            FetchError::Transport { project, message } => {
                Diagnostic::error(format!("error fetching `{}`: {}", project, message))
                    .with_suggestion("Check your network connection")
                    .with_suggestion("Verify the index URL in [net] is correct")
            }
            FetchError::InvalidResponse { project, message } => {
                Diagnostic::error(format!("unexpected registry data for `{}`", project))
                    .with_context(message.clone())
            }
        }
    }
}

/// A source of project descriptors.
pub trait ProjectSource {
    /// Get the source name for display.
    fn name(&self) -> &str;

    /// Fetch the current descriptor of a project.
    fn fetch_project(&mut self, project: &str) -> Result<ProjectDescriptor, FetchError>;
}
