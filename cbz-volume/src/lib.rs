#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use camino::Utf8Path;
use tracing::info;

pub use crate::{
    args::{default_output_name, Args, Invocation, VolumeConfig},
    chapters::{locate_chapters, parse_chapter_index, ChapterDir},
    errors::{Error, Result},
    pages::{collect_pages, image_extension, natural_cmp, Chapter, Page},
    volume::{cover_stem, write_volume, Overwrite, VolumeOptions, VolumeSummary},
};

pub mod args;
pub mod chapters;
pub mod errors;
pub mod pages;
pub mod volume;

/// Packs the chapters of `config` found under `base_dir` into `base_dir/<output_name>.cbz`.
///
/// Every chapter is located and listed before the archive is created.
///
/// ## Errors
///
/// Fails on the first missing or empty chapter, or when the volume can't be written
pub fn pack_volume(
    base_dir: &Utf8Path,
    config: &VolumeConfig,
    options: &VolumeOptions,
) -> Result<VolumeSummary> {
    info!(
        "searching for chapters {}-{} in {base_dir}",
        config.start, config.end
    );
    let chapter_dirs = locate_chapters(base_dir, config.start..=config.end)?;
    info!("found {} chapters", chapter_dirs.len());

    let chapters = chapter_dirs
        .into_iter()
        .map(collect_pages)
        .collect::<Result<Vec<_>>>()?;

    let output_path = base_dir.join(config.output_file_name());
    write_volume(&output_path, config.cover.as_ref(), &chapters, options)
}
