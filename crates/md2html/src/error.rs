use std::io;
use std::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("failed to highlight {lang} code block: {source}")]
    Highlight {
        lang: String,
        source: syntect::Error,
    },

    #[error("failed to build stylesheet for theme '{theme}': {source}")]
    ThemeStylesheet {
        theme: String,
        source: syntect::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
