use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a conversion.
///
/// Anything recoverable is reported as a [`crate::sfz::Diagnostic`] instead
/// and parsing carries on.
#[derive(Error, Debug)]
pub enum Error {
    /// The SFZ file given on the command line does not exist.
    #[error("input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    /// An `#include` directive names a file that is not there.
    ///
    /// Include targets are always resolved against the base directory of the
    /// top-level file, so a nested include that works relative to its own
    /// directory still ends up here.
    #[error(
        "included file '{}' does not exist (included from '{}')",
        .path.display(),
        .from.display()
    )]
    IncludeNotFound { path: PathBuf, from: PathBuf },

    /// An `#include` directive without a quoted path.
    #[error("malformed #include at {}:{line}", .file.display())]
    MalformedInclude { file: PathBuf, line: usize },

    /// A file includes itself, directly or through other includes.
    #[error("include cycle through '{}'", .0.display())]
    IncludeCycle(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
