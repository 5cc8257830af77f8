use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use cbz::{CbzRead, CbzReader};
use cbz_volume::{pack_volume, Error, Invocation, Overwrite, VolumeConfig, VolumeOptions};
use tempfile::TempDir;

struct Library {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Library {
    /// `chapters` maps a directory name to the page file names it contains
    fn new(chapters: &[(&str, &[&str])]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        for (chapter, pages) in chapters {
            fs::create_dir(root.join(chapter)).unwrap();
            for page in *pages {
                fs::write(root.join(chapter).join(page), format!("{chapter}/{page}")).unwrap();
            }
        }
        Self { _dir: dir, root }
    }

    fn config(&self, tokens: &[&str]) -> VolumeConfig {
        VolumeConfig::resolve(Invocation::parse(tokens).unwrap(), &self.root).unwrap()
    }

    fn pack(&self, tokens: &[&str]) -> Result<Utf8PathBuf, Error> {
        let options = VolumeOptions {
            overwrite: Overwrite::Replace,
            ..VolumeOptions::default()
        };
        pack_volume(&self.root, &self.config(tokens), &options).map(|summary| summary.output_path)
    }

    fn cbz_files(&self) -> Vec<String> {
        let mut names = fs::read_dir(&self.root)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.contains(".cbz"))
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}

fn entries(path: &Utf8Path) -> Vec<(String, String)> {
    let mut reader = CbzReader::from_path(path).unwrap();
    let mut entries = Vec::new();
    reader
        .try_for_each(|file| {
            let mut file = file?;
            let content = String::from_utf8(file.to_vec()?).unwrap();
            entries.push((file.name().to_string(), content));
            Ok::<_, cbz::Error>(())
        })
        .unwrap();
    entries
}

#[test]
fn two_chapters_without_cover() {
    let library = Library::new(&[
        ("Chapter 01 - abc", &["01.jpg", "02.jpg"]),
        ("Chapter 02 - xyz", &["01.jpg"]),
    ]);

    let output = library.pack(&["1", "2", "Volume_1"]).unwrap();

    assert_eq!(output, library.root.join("Volume_1.cbz"));
    assert_eq!(
        entries(&output),
        vec![
            ("001.jpg".to_string(), "Chapter 01 - abc/01.jpg".to_string()),
            ("002.jpg".to_string(), "Chapter 01 - abc/02.jpg".to_string()),
            ("003.jpg".to_string(), "Chapter 02 - xyz/01.jpg".to_string()),
        ]
    );
}

#[test]
fn cover_is_the_first_entry() {
    let library = Library::new(&[
        ("Chapter 01 - abc", &["01.jpg", "02.jpg"]),
        ("Chapter 02 - xyz", &["01.jpg"]),
    ]);
    fs::write(library.root.join("cover.png"), "cover").unwrap();

    let output = library.pack(&["cover.png", "1", "2", "Volume_1"]).unwrap();

    let entries = entries(&output);
    let names = entries.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["000_cover.png", "001.jpg", "002.jpg", "003.jpg"]);
    assert_eq!(entries[0].1, "cover");

    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, names);
}

#[test]
fn cover_first_without_name_uses_the_default_one() {
    let library = Library::new(&[("Chapter 26", &["1.jpg"]), ("Chapter 27", &["1.jpg"])]);
    fs::write(library.root.join("cover.jpg"), "cover").unwrap();

    let output = library.pack(&["cover.jpg", "26", "27"]).unwrap();

    assert_eq!(output, library.root.join("Chapters_26-27_merged.cbz"));
    assert_eq!(entries(&output).len(), 3);
}

#[test]
fn pages_follow_natural_order() {
    let library = Library::new(&[("Chapter 5", &["10.jpg", "2.jpg", "1.jpg", "cover.txt"])]);

    let output = library.pack(&["5", "5"]).unwrap();

    assert_eq!(output, library.root.join("Chapter_5_merged.cbz"));
    assert_eq!(
        entries(&output)
            .into_iter()
            .map(|(_, content)| content)
            .collect::<Vec<_>>(),
        vec!["Chapter 5/1.jpg", "Chapter 5/2.jpg", "Chapter 5/10.jpg"]
    );
}

#[test]
fn entry_count_matches_page_count() {
    let pages = (1..=12).map(|i| format!("{i}.png")).collect::<Vec<_>>();
    let pages = pages.iter().map(String::as_str).collect::<Vec<_>>();
    let library = Library::new(&[
        ("Chapter 7", &pages[..5]),
        ("Chapter 8 - mid", &pages[..12]),
        ("Chapter 9", &pages[..1]),
    ]);
    fs::write(library.root.join("front.webp"), "cover").unwrap();

    let output = library.pack(&["front.webp", "7", "9"]).unwrap();

    assert_eq!(entries(&output).len(), 1 + 5 + 12 + 1);
}

#[test]
fn missing_chapter_fails_without_output() {
    let library = Library::new(&[("Chapter 1", &["1.jpg"]), ("Chapter 3", &["1.jpg"])]);

    assert!(matches!(
        library.pack(&["1", "3", "Volume"]),
        Err(Error::ChapterNotFound(2))
    ));
    assert!(library.cbz_files().is_empty());
}

#[test]
fn empty_chapter_fails_without_output() {
    let library = Library::new(&[("Chapter 1", &["1.jpg"]), ("Chapter 2", &["notes.txt"])]);

    assert!(matches!(
        library.pack(&["1", "2", "Volume"]),
        Err(Error::EmptyChapter { index: 2, .. })
    ));
    assert!(library.cbz_files().is_empty());
}

#[test]
fn packing_twice_gives_the_same_archive() {
    let library = Library::new(&[("Chapter 1", &["b.jpg", "a.jpg"]), ("Chapter 2", &["1.gif"])]);

    let output = library.pack(&["1", "2", "Volume"]).unwrap();
    let first = fs::read(&output).unwrap();
    let first_entries = entries(&output);

    library.pack(&["1", "2", "Volume"]).unwrap();

    assert_eq!(entries(&output), first_entries);
    assert_eq!(fs::read(&output).unwrap(), first);
    assert_eq!(library.cbz_files(), vec!["Volume.cbz"]);
}

#[test]
fn existing_volume_is_not_replaced_by_default() {
    let library = Library::new(&[("Chapter 1", &["1.jpg"])]);
    fs::write(library.root.join("Volume.cbz"), "keep me").unwrap();

    let result = pack_volume(
        &library.root,
        &library.config(&["1", "1", "Volume"]),
        &VolumeOptions::default(),
    );

    assert!(matches!(result, Err(Error::OutputExists(_))));
    assert_eq!(
        fs::read_to_string(library.root.join("Volume.cbz")).unwrap(),
        "keep me"
    );
}
