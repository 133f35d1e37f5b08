//! Global context for ebuilder operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::config::Config;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged configuration
    config: Config,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a context rooted at `cwd`, with an optional explicit config
    /// file replacing the project config.
    pub fn load(cwd: PathBuf, explicit_config: Option<&Path>) -> Result<Self> {
        let config = Config::discover(explicit_config, &cwd)?;
        Ok(Self::with_config(cwd, config))
    }

    /// [`GlobalContext::load`] with the global config file given explicitly.
    pub fn load_from(
        cwd: PathBuf,
        global_config: Option<&Path>,
        explicit_config: Option<&Path>,
    ) -> Result<Self> {
        let config = Config::discover_in(global_config, explicit_config, &cwd)?;
        Ok(Self::with_config(cwd, config))
    }

    /// Create a context with an already-built configuration.
    pub fn with_config(cwd: PathBuf, config: Config) -> Self {
        GlobalContext {
            cwd,
            config,
            verbose: false,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// The output repository, from the command line or the config.
    pub fn repo_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        match override_dir {
            Some(dir) => self.resolve_path(dir),
            None => self.resolve_path(&self.config.repo()),
        }
    }
}
