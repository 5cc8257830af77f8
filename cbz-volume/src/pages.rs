use std::{cmp::Ordering, fs};

use camino::{Utf8Path, Utf8PathBuf};
use image::ImageFormat;
use tracing::debug;

use crate::{
    chapters::ChapterDir,
    errors::{Error, Result},
};

/// A single image, `position` is 1-based within its chapter (0 for a cover)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: Utf8PathBuf,
    pub extension: String,
    pub position: usize,
}

impl Page {
    /// ## Errors
    ///
    /// Fails with `UnsupportedImage` if the extension isn't a recognized image one
    pub fn from_path(path: impl Into<Utf8PathBuf>, position: usize) -> Result<Self> {
        let path = path.into();
        let Some(extension) = image_extension(&path) else {
            return Err(Error::UnsupportedImage(path));
        };

        Ok(Self {
            path,
            extension,
            position,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

/// A located chapter and its pages in reading order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub index: u32,
    pub path: Utf8PathBuf,
    pub pages: Vec<Page>,
}

/// Lowercased extension of `path` if it's one of jpg, jpeg, png, gif, bmp or webp
#[must_use]
pub fn image_extension(path: &Utf8Path) -> Option<String> {
    let extension = path.extension()?.to_ascii_lowercase();

    match ImageFormat::from_extension(&extension)? {
        ImageFormat::Jpeg
        | ImageFormat::Png
        | ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::WebP => Some(extension),
        _ => None,
    }
}

/// Numbers embedded in names compare by value, so `2.jpg` comes before `10.jpg`
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natord::compare(a, b).then_with(|| a.cmp(b))
}

/// Lists the images of a chapter directory in natural order
///
/// ## Errors
///
/// Fails if the directory can't be listed, if a path isn't utf-8 or with `EmptyChapter`
/// when no image is found
pub fn collect_pages(chapter: ChapterDir) -> Result<Chapter> {
    let read_dir_error = |source| Error::ReadDir {
        path: chapter.path.clone(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(&chapter.path).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if image_extension(Utf8Path::new(&file_name)).is_none() {
            debug!("skipping {file_name}, not an image");
            continue;
        }

        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|path| Error::NonUtf8Path(path.display().to_string()))?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(Error::EmptyChapter {
            index: chapter.index,
            path: chapter.path,
        });
    }

    paths.sort_by(|a, b| {
        natural_cmp(
            a.file_name().unwrap_or_default(),
            b.file_name().unwrap_or_default(),
        )
    });

    let pages = paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| Page::from_path(path, i + 1))
        .collect::<Result<Vec<_>>>()?;

    Ok(Chapter {
        index: chapter.index,
        path: chapter.path,
        pages,
    })
}
