//! Running the Manifest tool in a package directory.

use std::path::Path;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::{find_executable, ProcessBuilder, ProcessError};

/// Why a Manifest could not be generated.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest command is empty")]
    EmptyCommand,

    #[error("`{program}` not found in PATH")]
    ToolMissing { program: String },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl ManifestError {
    /// Warning for the package in `package_dir`.
    pub fn to_diagnostic(&self, package_dir: &Path) -> Diagnostic {
        let diagnostic = Diagnostic::warning(format!("Manifest not generated: {}", self))
            .with_location(package_dir);
        match self {
            ManifestError::EmptyCommand | ManifestError::ToolMissing { .. } => {
                diagnostic.with_suggestion(suggestions::MANIFEST_TOOL_MISSING)
            }
            ManifestError::Process(_) => diagnostic,
        }
    }
}

/// Run `command` (program followed by arguments) inside `package_dir`.
pub fn run_manifest(command: &[String], package_dir: &Path) -> Result<(), ManifestError> {
    let (program, args) = command.split_first().ok_or(ManifestError::EmptyCommand)?;

    let executable = find_executable(program).ok_or_else(|| ManifestError::ToolMissing {
        program: program.clone(),
    })?;

    let process = ProcessBuilder::new(executable).args(args).cwd(package_dir);
    tracing::debug!(
        "running `{}` in {}",
        process.display_command(),
        package_dir.display()
    );
    process.run()?;
    Ok(())
}

/// Like [`run_manifest`], but a failure only logs a warning.
///
/// Returns whether the tool succeeded.
pub fn run_manifest_or_warn(command: &[String], package_dir: &Path) -> bool {
    match run_manifest(command, package_dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{}", e.to_diagnostic(package_dir).format(false).trim_end());
            false
        }
    }
}
