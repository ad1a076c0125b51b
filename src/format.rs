//! Pretty-printing and writing rewritten files back.
//!
//! The engine itself never touches the filesystem; this layer reads a file,
//! runs it through a [`SourceFormatter`] and the import cleaner, and writes
//! it back atomically when the bytes changed.

use crate::session::{RewriteSession, SessionError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to run formatter `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter `{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("formatter `{program}` produced invalid UTF-8")]
    InvalidOutput { program: String },
}

/// What can go wrong while processing one file.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// A processing error with the file it happened in.
#[derive(Error, Debug)]
#[error("{}: {source}", path.display())]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub source: ProcessError,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<ProcessError>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// A canonical pretty-printer for Go source.
pub trait SourceFormatter: Send + Sync {
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Leaves source untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFormatter;

impl SourceFormatter for IdentityFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Pipes source through an external program, `gofmt` by default.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl Default for CommandFormatter {
    fn default() -> Self {
        Self::new("gofmt", Vec::new())
    }
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SourceFormatter for CommandFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let spawn_err = |source| FormatError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // Feed stdin from a separate thread so a large output cannot block us.
        let mut stdin = child.stdin.take();
        let input = source.to_string();
        let writer = std::thread::spawn(move || -> io::Result<()> {
            if let Some(stdin) = stdin.as_mut() {
                stdin.write_all(input.as_bytes())?;
            }
            Ok(())
        });

        let output = child.wait_with_output().map_err(spawn_err)?;
        // A formatter that exits early closes its stdin; the exit status says why.
        log_stdin_result(&self.program, writer.join());

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidOutput {
            program: self.program.clone(),
        })
    }
}

fn log_stdin_result(program: &str, joined: std::thread::Result<io::Result<()>>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(program, error = %e, "writing formatter stdin failed"),
        Err(_) => tracing::debug!(program, "formatter stdin writer panicked"),
    }
}

/// Format `source`, optionally cleaning imports.
///
/// A formatter failure keeps the unformatted text. Cleaning needs a parse,
/// so malformed source is an error.
pub fn prettify_source(
    source: &str,
    formatter: &dyn SourceFormatter,
    clean_imports: bool,
) -> Result<String, SessionError> {
    let formatted = format_or_keep(source, formatter);
    if !clean_imports {
        return Ok(formatted);
    }

    let mut session = RewriteSession::new(formatted.clone())?;
    session.clean_imports()?;
    let cleaned = session.into_source();
    if cleaned == formatted {
        Ok(formatted)
    } else {
        Ok(format_or_keep(&cleaned, formatter))
    }
}

fn format_or_keep(source: &str, formatter: &dyn SourceFormatter) -> String {
    match formatter.format(source) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::warn!(error = %e, "formatter failed, keeping source as is");
            source.to_string()
        }
    }
}

/// Prettify one file in place. Returns whether its content changed.
pub fn prettify_file(
    path: &Path,
    formatter: &dyn SourceFormatter,
    clean_imports: bool,
    dry_run: bool,
) -> Result<bool, FileError> {
    Ok(prettify_file_diff(path, formatter, clean_imports, dry_run)?.is_some())
}

/// Like [`prettify_file`], but returns the old and new text when changed.
pub fn prettify_file_diff(
    path: &Path,
    formatter: &dyn SourceFormatter,
    clean_imports: bool,
    dry_run: bool,
) -> Result<Option<(String, String)>, FileError> {
    let original = fs::read_to_string(path).map_err(|e| FileError::new(path, e))?;
    let pretty =
        prettify_source(&original, formatter, clean_imports).map_err(|e| FileError::new(path, e))?;

    if pretty == original {
        tracing::trace!(path = %path.display(), "unchanged");
        return Ok(None);
    }
    if !dry_run {
        atomic_write(path, pretty.as_bytes()).map_err(|e| FileError::new(path, e))?;
    }
    tracing::debug!(path = %path.display(), dry_run, "rewrote file");
    Ok(Some((original, pretty)))
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // same directory keeps the rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
