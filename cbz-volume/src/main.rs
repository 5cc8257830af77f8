#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::env;

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use cbz_volume::{pack_volume, Args, Error, Overwrite, VolumeOptions};
use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let Ok(current_dir) = Utf8PathBuf::from_path_buf(env::current_dir()?) else {
        bail!("current dir is not a valid utf-8 path");
    };
    let base_dir = current_dir.join(&args.dir);
    let config = args.volume_config(&current_dir)?;

    let output_path = base_dir.join(config.output_file_name());
    let overwrite = if args.yes {
        Overwrite::Replace
    } else if output_path.exists() {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{output_path} already exists. Overwrite?"))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(Error::OutputExists(output_path).into());
        }
        Overwrite::Replace
    } else {
        Overwrite::Deny
    };

    let summary = pack_volume(
        &base_dir,
        &config,
        &VolumeOptions {
            overwrite,
            compression_level: Some(args.compression_level),
        },
    )?;

    info!("total pages: {}", summary.pages);
    if let Some(cover) = &summary.cover {
        info!("cover: {cover}");
    }
    #[allow(clippy::cast_precision_loss)]
    let size_mb = summary.size as f64 / (1024.0 * 1024.0);
    info!("file size: {size_mb:.2} MB");

    println!("CBZ file created: {}", summary.output_path);

    Ok(())
}
