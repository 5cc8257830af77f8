use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;

use crate::{
    errors::{Error, Result},
    pages::Page,
};

const USAGE: &str =
    "expected `<start> <end> [output_name]` or `<cover> <start> <end> [output_name]`";

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    /// `<start> <end> [output_name]`, or `<cover> <start> <end> [output_name]`
    /// to use `cover` as the first page
    #[clap(num_args = 2..=4, required = true, value_name = "ARGS")]
    pub tokens: Vec<String>,
    /// The directory containing the `Chapter NN` directories, the volume is written there too
    #[clap(long, default_value = ".")]
    pub dir: Utf8PathBuf,
    /// Overwrite an existing volume without asking
    #[clap(short, long, action)]
    pub yes: bool,
    /// Deflate compression level
    #[clap(long, default_value_t = 6, value_parser = clap::value_parser!(i32).range(0..=9))]
    pub compression_level: i32,
}

impl Args {
    /// Resolves the positional arguments, relative cover paths are resolved against `cwd`
    ///
    /// ## Errors
    ///
    /// Same errors as `Invocation::parse` and `VolumeConfig::resolve`
    pub fn volume_config(&self, cwd: &Utf8Path) -> Result<VolumeConfig> {
        VolumeConfig::resolve(Invocation::parse(self.tokens.as_slice())?, cwd)
    }
}

/// The two accepted shapes of positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    RangeFirst {
        start: u32,
        end: u32,
        output_name: Option<String>,
    },
    CoverFirst {
        cover: Utf8PathBuf,
        start: u32,
        end: u32,
        output_name: Option<String>,
    },
}

impl Invocation {
    /// A leading chapter number selects `RangeFirst`, anything else is taken as a cover path.
    ///
    /// ## Errors
    ///
    /// Fails with `InvalidArguments` if the tokens match neither shape
    pub fn parse(tokens: &[impl AsRef<str>]) -> Result<Self> {
        let tokens = tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>();

        match tokens.as_slice() {
            [start, end] | [start, end, _] if is_chapter_number(start) => {
                Ok(Self::RangeFirst {
                    start: parse_chapter_number(start)?,
                    end: parse_chapter_number(end)?,
                    output_name: tokens.get(2).map(ToString::to_string),
                })
            }
            [cover, start, end] | [cover, start, end, _] if !is_chapter_number(cover) => {
                Ok(Self::CoverFirst {
                    cover: Utf8PathBuf::from(*cover),
                    start: parse_chapter_number(start)?,
                    end: parse_chapter_number(end)?,
                    output_name: tokens.get(3).map(ToString::to_string),
                })
            }
            [first, ..] if !is_chapter_number(first) && tokens.len() < 3 => Err(
                Error::InvalidArguments(format!("`{first}` is not a chapter number, {USAGE}")),
            ),
            _ => Err(Error::InvalidArguments(format!(
                "{USAGE}, got {} arguments",
                tokens.len()
            ))),
        }
    }
}

/// Plain ascii digits only, `+1` or ` 1` are not chapter numbers
fn is_chapter_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_chapter_number(token: &str) -> Result<u32> {
    let invalid = || Error::InvalidArguments(format!("`{token}` is not a chapter number"));
    if !is_chapter_number(token) {
        return Err(invalid());
    }
    token.parse().map_err(|_| invalid())
}

/// A fully resolved run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConfig {
    pub start: u32,
    pub end: u32,
    pub output_name: String,
    pub cover: Option<Page>,
}

impl VolumeConfig {
    /// ## Errors
    ///
    /// Fails with `InvalidArguments` when `start > end`, with `CoverNotFound` when the cover
    /// isn't a file and with `UnsupportedImage` when it isn't a recognized image
    pub fn resolve(invocation: Invocation, cwd: &Utf8Path) -> Result<Self> {
        let (cover, start, end, output_name) = match invocation {
            Invocation::RangeFirst {
                start,
                end,
                output_name,
            } => (None, start, end, output_name),
            Invocation::CoverFirst {
                cover,
                start,
                end,
                output_name,
            } => (Some(cover), start, end, output_name),
        };

        if start > end {
            return Err(Error::InvalidArguments(format!(
                "start chapter {start} is greater than end chapter {end}"
            )));
        }

        let cover = cover
            .map(|cover| {
                let cover = cwd.join(cover);
                if !cover.is_file() {
                    return Err(Error::CoverNotFound(cover));
                }
                Page::from_path(cover, 0)
            })
            .transpose()?;

        let output_name = match output_name {
            Some(output_name) if !output_name.trim().is_empty() => output_name,
            Some(_) => {
                return Err(Error::InvalidArguments("output name is empty".to_string()));
            }
            None => default_output_name(start, end),
        };

        Ok(Self {
            start,
            end,
            output_name,
            cover,
        })
    }

    /// The file name of the volume, sanitized and with the `.cbz` extension
    #[must_use]
    pub fn output_file_name(&self) -> String {
        sanitize_filename::sanitize(format!("{}.cbz", self.output_name))
    }
}

/// Name used when none is provided
#[must_use]
pub fn default_output_name(start: u32, end: u32) -> String {
    if start == end {
        format!("Chapter_{start}_merged")
    } else {
        format!("Chapters_{start}-{end}_merged")
    }
}
