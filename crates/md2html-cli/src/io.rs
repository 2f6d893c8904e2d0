use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use md2html::{RenderedDocument, Renderer};
use tracing::debug;

use crate::error::CliError;

/// Where the Markdown source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `None` or `-` selects standard input.
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Input::File(path.to_path_buf()),
            _ => Input::Stdin,
        }
    }

    /// Read the whole source into memory.
    pub fn read(&self) -> Result<Vec<u8>, CliError> {
        let bytes = match self {
            Input::Stdin => {
                let mut buffer = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut buffer)
                    .map_err(CliError::Stdin)?;
                buffer
            }
            Input::File(path) => fs::read(path).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })?,
        };
        debug!(source = ?self, bytes = bytes.len(), "read input");
        Ok(bytes)
    }
}

/// Where the rendered HTML goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// `None` or `-` selects standard output.
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Output::File(path.to_path_buf()),
            _ => Output::Stdout,
        }
    }

    /// Write `document` to the sink. Files are created (or truncated) here
    /// and closed when the writer drops.
    pub fn write(&self, renderer: &Renderer, document: &RenderedDocument) -> Result<(), CliError> {
        match self {
            Output::Stdout => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                match write_all(renderer, document, &mut handle) {
                    Ok(()) => Ok(()),
                    Err(err) if should_ignore_pipe_error(&err) => Ok(()),
                    Err(err) => Err(CliError::Write(err)),
                }
            }
            Output::File(path) => {
                let file = File::create(path).map_err(|source| CliError::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
                let mut writer = BufWriter::new(file);
                write_all(renderer, document, &mut writer).map_err(CliError::Write)?;
                debug!(path = %path.display(), "wrote output");
                Ok(())
            }
        }
    }
}

/// Print one entry per line on stdout. A closed pipe ends the listing quietly.
pub fn print_lines<I, S>(lines: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match write_lines(&mut handle, lines) {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(CliError::Write(err)),
    }
}

fn write_lines<W, I, S>(out: &mut W, lines: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()
}

fn write_all<W: Write>(
    renderer: &Renderer,
    document: &RenderedDocument,
    out: &mut W,
) -> io::Result<()> {
    renderer.write(document, out)?;
    out.flush()
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
