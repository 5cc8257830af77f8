use std::io;

use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("chapter {0} not found")]
    ChapterNotFound(u32),

    #[error("chapter {index} matches both {first} and {second}")]
    DuplicateChapter {
        index: u32,
        first: Utf8PathBuf,
        second: Utf8PathBuf,
    },

    #[error("chapter {index} ({path}) contains no image")]
    EmptyChapter { index: u32, path: Utf8PathBuf },

    #[error("cover image not found: {0}")]
    CoverNotFound(Utf8PathBuf),

    #[error("unsupported image format: {0}")]
    UnsupportedImage(Utf8PathBuf),

    #[error("{0} already exists")]
    OutputExists(Utf8PathBuf),

    #[error("couldn't read directory {path}: {source}")]
    ReadDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not a valid utf-8 path")]
    NonUtf8Path(String),

    #[error("couldn't write volume: {0}")]
    Write(#[from] cbz::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Write(err.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
