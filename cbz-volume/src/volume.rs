use std::{
    fs::File,
    io::{self, BufWriter},
};

use camino::{Utf8Path, Utf8PathBuf};
use cbz::{counter_size, stable_file_options, CbzWrite, CbzWriter, CbzWriterInsertionBuilder};
use tracing::{debug, info};

use crate::{
    errors::{Error, Result},
    pages::{Chapter, Page},
};

/// What to do when the volume file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    Deny,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeOptions {
    pub overwrite: Overwrite,
    /// Deflate level, `None` lets the zip crate pick
    pub compression_level: Option<i32>,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            overwrite: Overwrite::Deny,
            compression_level: Some(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSummary {
    pub output_path: Utf8PathBuf,
    /// Entry names, in archive order
    pub entries: Vec<String>,
    pub pages: usize,
    pub cover: Option<String>,
    pub size: u64,
}

/// Stem of the cover entry, it sorts before any page padded to `width`
#[must_use]
pub fn cover_stem(width: usize) -> String {
    format!("{:0>width$}_cover", 0)
}

/// Writes the cover then every page of `chapters` into `output_path`.
///
/// The archive is written next to `output_path` in a temporary file that's only renamed once
/// complete, a failure leaves no file behind.
///
/// ## Errors
///
/// Fails with `OutputExists` if `output_path` exists and `options.overwrite` is `Deny`,
/// and with `Write` if an image can't be read or the archive can't be written
pub fn write_volume(
    output_path: &Utf8Path,
    cover: Option<&Page>,
    chapters: &[Chapter],
    options: &VolumeOptions,
) -> Result<VolumeSummary> {
    if options.overwrite == Overwrite::Deny && output_path.exists() {
        return Err(Error::OutputExists(output_path.to_path_buf()));
    }

    let outdir = output_path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".cbz.part")
        .tempfile_in(outdir)?;
    debug!("writing volume to {}", tmp.path().display());

    let mut cbz_writer = CbzWriter::from_writer(BufWriter::new(tmp))
        .with_file_options(stable_file_options(options.compression_level));

    let pages = chapters.iter().map(|chapter| chapter.pages.len()).sum();
    let width = counter_size(pages);
    let mut entries = Vec::with_capacity(pages + 1);

    let stem = cover_stem(width);
    let cover = cover
        .map(|cover| {
            let insertion = CbzWriterInsertionBuilder::from_extension(&cover.extension)
                .set_bytes_from_reader(File::open(&cover.path)?)?
                .build_custom_str(&stem)?;
            let name = cbz_writer.insert_custom_str(insertion)?;
            info!("{} -> {name} (cover)", cover.file_name());
            entries.push(name.clone());

            Ok::<_, Error>(name)
        })
        .transpose()?;

    let mut counter = 1;
    for chapter in chapters {
        info!("chapter {}: {} pages", chapter.index, chapter.pages.len());

        for page in &chapter.pages {
            let insertion = CbzWriterInsertionBuilder::from_extension(&page.extension)
                .set_bytes_from_reader(File::open(&page.path)?)?
                .build_indexed(counter, width)?;
            let name = cbz_writer.insert_at(insertion)?;
            debug!("{} -> {name}", page.path);
            entries.push(name);
            counter += 1;
        }
    }

    let tmp = cbz_writer
        .finish()?
        .into_inner()
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    tmp.as_file().sync_all()?;

    let persisted = match options.overwrite {
        Overwrite::Replace => tmp.persist(output_path),
        Overwrite::Deny => tmp.persist_noclobber(output_path),
    };
    let file = persisted.map_err(|err| {
        if err.error.kind() == io::ErrorKind::AlreadyExists {
            Error::OutputExists(output_path.to_path_buf())
        } else {
            err.error.into()
        }
    })?;

    Ok(VolumeSummary {
        output_path: output_path.to_path_buf(),
        entries,
        pages,
        cover,
        size: file.metadata()?.len(),
    })
}
