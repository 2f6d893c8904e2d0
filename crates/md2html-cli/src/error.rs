use std::io;
use std::path::PathBuf;

use md2html::RenderError;
use md2html_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 255,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("error reading from stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("error reading from {}: {source}", path.display())]
    Input { path: PathBuf, source: io::Error },

    #[error("error creating {}: {source}", path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("error writing output: {0}")]
    Write(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("conversion failed: {0}")]
    Convert(#[from] RenderError),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::Failure
    }
}
