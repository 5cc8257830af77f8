use std::{collections::BTreeMap, fs, ops::RangeInclusive, sync::LazyLock};

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::debug;

use crate::errors::{Error, Result};

/// `Chapter` then whitespace then the chapter number, anything may follow the number
/// (e.g. `Chapter 01 - The Beginning`)
static CHAPTER_DIR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Chapter\s+(\d+)").expect("valid chapter regex"));

/// A directory holding the pages of one chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDir {
    pub index: u32,
    pub path: Utf8PathBuf,
}

/// Extracts the chapter number out of a directory name
#[must_use]
pub fn parse_chapter_index(dir_name: &str) -> Option<u32> {
    CHAPTER_DIR_NAME
        .captures(dir_name)
        .and_then(|captures| captures.get(1))
        .and_then(|index| index.as_str().parse().ok())
}

/// Finds one chapter directory per number of `range` under `base_dir`, in ascending order
///
/// ## Errors
///
/// Fails with `ChapterNotFound` on the first number of the range without a directory,
/// with `DuplicateChapter` if two directories share a number, or if `base_dir` can't be listed
pub fn locate_chapters(
    base_dir: &Utf8Path,
    range: RangeInclusive<u32>,
) -> Result<Vec<ChapterDir>> {
    let read_dir_error = |source| Error::ReadDir {
        path: base_dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(base_dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let file_name = entry.file_name();
        let Some((name, index)) = file_name
            .to_str()
            .and_then(|name| Some((name, parse_chapter_index(name)?)))
        else {
            continue;
        };
        let path = base_dir.join(name);
        if !range.contains(&index) || !path.is_dir() {
            continue;
        }
        candidates.push(ChapterDir { index, path });
    }
    // listing order is platform dependent
    candidates.sort_by(|a, b| a.path.cmp(&b.path));

    let mut chapters: BTreeMap<u32, ChapterDir> = BTreeMap::new();
    for candidate in candidates {
        if let Some(first) = chapters.get(&candidate.index) {
            return Err(Error::DuplicateChapter {
                index: candidate.index,
                first: first.path.clone(),
                second: candidate.path,
            });
        }
        debug!("found chapter {} in {}", candidate.index, candidate.path);
        chapters.insert(candidate.index, candidate);
    }

    if let Some(missing) = range.clone().find(|index| !chapters.contains_key(index)) {
        return Err(Error::ChapterNotFound(missing));
    }

    Ok(chapters.into_values().collect())
}
