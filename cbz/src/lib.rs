#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::{
    borrow::Cow,
    collections::HashSet,
    fs::File,
    io::{self, Cursor, Read, Seek, Write},
    ops::Deref,
    path::Path,
    result,
};

use camino::Utf8Path;
use tracing::debug;
use zip::{read::ZipFile, write::FileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub use crate::errors::{Error, Result};

pub mod errors;

/// We artificially limit the amount of accepted files to 65535 files per Cbz
/// First as it'd be rather impractical for the user to read such enormous Cbz
/// Also, this size has been chosen as it was the limit of the very first zip spec
pub static MAX_FILE_NUMBER: usize = u16::MAX as usize;

/// Indexed entries are never padded to less than this many digits
pub static MIN_COUNTER_SIZE: usize = 3;

/// Padding needed so that `count` indexed entries still sort lexicographically
#[must_use]
pub fn counter_size(count: usize) -> usize {
    let mut digits = 1;
    let mut rest = count / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }

    digits.max(MIN_COUNTER_SIZE)
}

/// Deflated entries stamped with the zip epoch, so that packing the same
/// bytes twice produces the same archive
#[must_use]
pub fn stable_file_options(compression_level: Option<i32>) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(compression_level)
        .last_modified_time(DateTime::default())
}

pub trait Cbz {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait CbzRead: Cbz {
    /// File names, in archive order
    ///
    /// ## Errors
    ///
    /// Fails if an entry header can't be read
    fn file_names(&mut self) -> Result<Vec<String>> {
        (0..self.len())
            .map(|index| Ok::<_, Error>(self.read_by_index(index)?.name().to_string()))
            .collect()
    }

    /// Lookup the file by `name` in Cbz and returns a `CbzFile`
    ///
    /// ## Errors
    ///
    /// Fails if no such file exists or if the content can't be read
    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>>;

    /// Returns the file stored at `index` in archive order
    ///
    /// ## Errors
    ///
    /// Fails if `index` is out of bounds or if the content can't be read
    fn read_by_index(&mut self, index: usize) -> Result<CbzFile<'_>>;

    /// Iterate over files present in the Cbz, in archive order.
    /// If the closure returns an error, this error is returned immediately.
    ///
    /// ## Errors
    ///
    /// Returns an error immediately if the provided closure returns an error
    fn try_for_each<F, E>(&mut self, mut f: F) -> result::Result<(), E>
    where
        F: FnMut(Result<CbzFile<'_>>) -> result::Result<(), E>,
    {
        for index in 0..self.len() {
            f(self.read_by_index(index))?;
        }

        Ok(())
    }
}

pub trait CbzWrite {
    fn size(&self) -> usize;

    /// Inserts a file named after its zero padded index, returns the name used
    ///
    /// ## Errors
    ///
    /// Same behavior as `insert_from_bytes_slice`
    fn insert_at(&mut self, insertion: CbzWriterInsertion<'_, '_, Indexed>) -> Result<String> {
        let Indexed { index, width } = insertion.type_;
        let filename = format!("{index:0>width$}.{}", insertion.extension);

        self.insert_from_bytes_slice(filename.clone(), &insertion.bytes)?;

        Ok(filename)
    }

    /// Inserts a file named after the provided stem, returns the name used
    ///
    /// ## Errors
    ///
    /// Same behavior as `insert_from_bytes_slice`
    fn insert_custom_str(
        &mut self,
        insertion: CbzWriterInsertion<'_, '_, CustomStr<'_>>,
    ) -> Result<String> {
        let filename = format!("{}.{}", &*insertion.type_, insertion.extension);

        self.insert_from_bytes_slice(filename.clone(), &insertion.bytes)?;

        Ok(filename)
    }

    /// This is the method ultimately called to insert the bytes into the Cbz
    ///
    /// ## Errors
    ///
    /// This fails if the Cbz writer can't be written, if the name is already taken,
    /// or if it's full (i.e. its size equals `MAX_FILE_NUMBER`)
    fn insert_from_bytes_slice(&mut self, filename: impl Into<String>, bytes: &[u8]) -> Result<()>;
}

pub struct CbzFile<'a>(ZipFile<'a>);

impl<'a> CbzFile<'a> {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn size(&self) -> u64 {
        self.0.size()
    }

    /// Reads the whole file content
    ///
    /// ## Errors
    ///
    /// Fails if file size is too large to fit a `usize` on host machine
    /// or if the content can't be read
    pub fn to_vec(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(
            self.size()
                .try_into()
                .map_err(|_| Error::CbzFileSizeConversion)?,
        );

        self.0.read_to_end(&mut buf)?;

        Ok(buf)
    }
}

impl<'a> Read for CbzFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<'a> From<ZipFile<'a>> for CbzFile<'a> {
    fn from(zip_file: ZipFile<'a>) -> Self {
        Self(zip_file)
    }
}

#[derive(Debug)]
pub struct CbzReader<R> {
    archive: ZipArchive<R>,
}

impl<R> CbzReader<R> {
    pub fn new(archive: ZipArchive<R>) -> Self {
        Self { archive }
    }
}

impl<R> CbzReader<R>
where
    R: Read + Seek,
{
    /// Creates `CbzReader` from a `Read`
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        Ok(Self::new(archive))
    }
}

impl CbzReader<File> {
    /// Creates `CbzReader` from a path
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Self::from_reader(file)
    }
}

impl<'b> CbzReader<Cursor<&'b [u8]>> {
    /// Creates `CbzReader` from a bytes slice
    ///
    /// ## Errors
    ///
    /// Fails if the underlying `ZipArchive` can't be created
    pub fn from_bytes_slice(bytes: &'b [u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R> Cbz for CbzReader<R>
where
    R: Read + Seek,
{
    fn len(&self) -> usize {
        self.archive.len()
    }
}

impl<R> CbzRead for CbzReader<R>
where
    R: Read + Seek,
{
    fn read_by_name(&mut self, name: &str) -> Result<CbzFile<'_>> {
        let archive_file = self.archive.by_name(name)?;

        Ok(archive_file.into())
    }

    fn read_by_index(&mut self, index: usize) -> Result<CbzFile<'_>> {
        let archive_file = self.archive.by_index(index)?;

        Ok(archive_file.into())
    }
}

pub struct CbzWriter<W: Write + Seek> {
    archive: ZipWriter<W>,
    names: HashSet<String>,
    file_options: FileOptions,
}

impl<W> CbzWriter<W>
where
    W: Write + Seek,
{
    pub fn new(archive: ZipWriter<W>) -> Self {
        Self {
            archive,
            names: HashSet::new(),
            file_options: FileOptions::default(),
        }
    }

    /// Creates a `CbzWriter` from a `Write`
    pub fn from_writer(writer: W) -> Self {
        Self::new(ZipWriter::new(writer))
    }

    /// Options applied to insertions that don't carry their own
    #[must_use]
    pub fn with_file_options(mut self, file_options: FileOptions) -> Self {
        self.file_options = file_options;

        self
    }

    /// Terminates the Cbz archiving, called on drop anyway but error can't be handled
    ///
    /// ## Errors
    ///
    /// Same errors as the underlying `ZipWriter::finish` method
    pub fn finish(&mut self) -> Result<CbzWriterFinished<W>> {
        let writer = self.archive.finish()?;

        Ok(CbzWriterFinished::new(writer))
    }
}

impl Default for CbzWriter<Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::from_writer(Cursor::new(Vec::new()))
    }
}

impl<W> Cbz for CbzWriter<W>
where
    W: Write + Seek,
{
    fn len(&self) -> usize {
        self.names.len()
    }
}

impl<W> CbzWrite for CbzWriter<W>
where
    W: Write + Seek,
{
    fn size(&self) -> usize {
        self.names.len()
    }

    fn insert_from_bytes_slice(
        &mut self,
        filename: impl Into<String>,
        bytes: &[u8],
    ) -> Result<()> {
        if self.names.len() >= MAX_FILE_NUMBER {
            return Err(Error::CbzTooLarge(MAX_FILE_NUMBER));
        }

        let filename = filename.into();
        if self.names.contains(&filename) {
            return Err(Error::CbzDuplicateName(filename));
        }

        self.archive
            .start_file(filename.as_str(), self.file_options)?;

        self.archive.write_all(bytes)?;

        debug!("inserted {filename} into zip");
        self.names.insert(filename);

        Ok(())
    }
}

pub struct Indexed {
    index: usize,
    width: usize,
}

pub struct CustomStr<'a>(&'a str);

impl<'a> Deref for CustomStr<'a> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

pub struct CbzWriterInsertion<'a, 'b, T> {
    extension: Cow<'a, str>,
    bytes: Cow<'b, [u8]>,
    type_: T,
}

#[derive(Debug, PartialEq, Eq)]
enum InsertionTypeDescriber<'a> {
    Filename(&'a str),
    Extension(&'a str),
}

pub struct CbzWriterInsertionBuilder<'a, 'b> {
    type_describer: InsertionTypeDescriber<'a>,
    bytes: Option<Cow<'b, [u8]>>,
}

impl<'a, 'b> CbzWriterInsertionBuilder<'a, 'b> {
    pub fn from_filename(filename: &'a (impl AsRef<str> + ?Sized)) -> Self {
        Self {
            type_describer: InsertionTypeDescriber::Filename(filename.as_ref()),
            bytes: None,
        }
    }

    pub fn from_extension(extension: &'a (impl AsRef<str> + ?Sized)) -> Self {
        Self {
            type_describer: InsertionTypeDescriber::Extension(extension.as_ref()),
            bytes: None,
        }
    }

    #[must_use]
    pub fn set_bytes_ref(mut self, bytes: &'b impl AsRef<[u8]>) -> Self {
        self.bytes = Some(bytes.as_ref().into());

        self
    }

    #[must_use]
    pub fn set_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = Some(bytes.into().into());

        self
    }

    /// Set the `bytes` field from the provided `Read`
    ///
    /// ## Errors
    ///
    /// Can fail when reading the provided `Read`
    pub fn set_bytes_from_reader(mut self, mut reader: impl Read) -> Result<Self> {
        let mut buf = Vec::new();

        reader.read_to_end(&mut buf)?;

        self.bytes = Some(buf.into());

        Ok(self)
    }

    /// Builds a `CbzWriterInsertion` named `index` padded with zeros to `width` digits
    ///
    /// ## Errors
    ///
    /// Fails if the `bytes` field hasn't been populated or if the extension is empty
    pub fn build_indexed(
        self,
        index: usize,
        width: usize,
    ) -> Result<CbzWriterInsertion<'a, 'b, Indexed>> {
        self.inner_build(Indexed { index, width })
    }

    /// Builds a `CbzWriterInsertion` named `s`
    ///
    /// ## Errors
    ///
    /// Fails if the `bytes` field hasn't been populated or if the extension is empty
    pub fn build_custom_str<'c>(
        self,
        s: &'c str,
    ) -> Result<CbzWriterInsertion<'a, 'b, CustomStr<'c>>> {
        self.inner_build(CustomStr(s))
    }

    fn inner_build<T>(self, type_: T) -> Result<CbzWriterInsertion<'a, 'b, T>> {
        let Some(bytes) = self.bytes else {
            return Err(Error::CbzInsertionNoBytes);
        };

        let extension = match self.type_describer {
            InsertionTypeDescriber::Extension(extension) => {
                if extension.is_empty() {
                    return Err(Error::CbzInsertionNoExtension);
                }

                extension.into()
            }
            InsertionTypeDescriber::Filename(filename) => {
                let extension = Utf8Path::new(filename)
                    .extension()
                    .and_then(|extension| (!extension.is_empty()).then_some(extension.to_string()));

                let Some(extension) = extension else {
                    return Err(Error::CbzInsertionNoExtension);
                };

                extension.into()
            }
        };

        Ok(CbzWriterInsertion {
            extension,
            bytes,
            type_,
        })
    }
}

pub struct CbzWriterFinished<W> {
    writer: W,
}

impl<W> CbzWriterFinished<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for CbzWriterFinished<Cursor<T>> {
    fn as_ref(&self) -> &[u8] {
        self.writer.get_ref().as_ref()
    }
}
