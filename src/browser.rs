use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::list::ScrollableList;

/// Extensions accepted into the playlist, matched case-sensitively.
pub const PLAYABLE_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "flac"];

const PARENT: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub is_dir: bool,
}

impl DirEntry {
    /// Display form of the name. Bytes that are not UTF-8 are replaced.
    pub fn label(&self) -> String {
        let name = self.name.to_string_lossy();
        if self.is_dir {
            format!("{name}/")
        } else {
            name.into_owned()
        }
    }
}

/// The explorer pane: entries of one working directory.
pub struct FileBrowser {
    current_dir: PathBuf,
    entries: ScrollableList<DirEntry>,
}

impl FileBrowser {
    pub fn open(dir: &Path) -> io::Result<Self> {
        let current_dir = fs::canonicalize(dir)?;
        let entries = ScrollableList::from_items(read_entries(&current_dir)?);
        Ok(Self {
            current_dir,
            entries,
        })
    }

    /// Makes `dir` the working directory and lists it from the top.
    pub fn change_dir(&mut self, dir: &Path) -> io::Result<()> {
        let dir = fs::canonicalize(dir)?;
        let entries = read_entries(&dir)?;
        debug!(dir = %dir.display(), entries = entries.len(), "changed directory");
        self.entries.replace(entries);
        self.current_dir = dir;
        Ok(())
    }

    /// Descends into the selected entry. Returns `Ok(false)` when it is not
    /// a directory.
    pub fn enter_selected(&mut self) -> io::Result<bool> {
        match self.selected_path() {
            Some(path) if self.selected_is_dir() => {
                self.change_dir(&path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn selected_path(&self) -> Option<PathBuf> {
        self.entries
            .selected()
            .map(|entry| self.current_dir.join(&entry.name))
    }

    fn selected_is_dir(&self) -> bool {
        self.entries.selected().is_some_and(|entry| entry.is_dir)
    }

    /// Playable files for the selected entry: the file itself, or every
    /// playable file under it in walk order if it is a directory. The parent
    /// entry is never collected.
    pub fn collect_selected(&self) -> io::Result<Vec<PathBuf>> {
        let Some(entry) = self.entries.selected() else {
            return Ok(Vec::new());
        };
        if entry.name == PARENT {
            return Ok(Vec::new());
        }
        let path = self.current_dir.join(&entry.name);
        if entry.is_dir {
            collect_playable(&path)
        } else if is_playable(&entry.name.to_string_lossy()) {
            Ok(vec![path])
        } else {
            Ok(Vec::new())
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn list(&self) -> &ScrollableList<DirEntry> {
        &self.entries
    }

    pub fn list_mut(&mut self) -> &mut ScrollableList<DirEntry> {
        &mut self.entries
    }
}

/// Sorted listing of `dir`: dot-files hidden, `..` first when there is a parent.
pub fn read_entries(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    if dir.parent().is_some() {
        entries.push(DirEntry {
            name: OsString::from(PARENT),
            is_dir: true,
        });
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        // Follow symlinks so linked folders can be entered.
        let is_dir = entry.path().is_dir();
        entries.push(DirEntry { name, is_dir });
    }
    entries.sort_by(|a, b| collate(&a.name.to_string_lossy(), &b.name.to_string_lossy()));
    Ok(entries)
}

/// Case-insensitive ordering with the parent entry first.
pub fn collate(a: &str, b: &str) -> Ordering {
    match (a == PARENT, b == PARENT) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.chars().map(|c| c.to_ascii_lowercase())),
    }
}

/// True iff the text after the last `.` is a playable extension.
pub fn is_playable(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| PLAYABLE_EXTENSIONS.contains(&ext))
}

fn collect_playable(dir: &Path) -> io::Result<Vec<PathBuf>> {
    // Surface an unreadable top-level folder; skip unreadable children.
    fs::read_dir(dir)?;
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        match entry {
            Ok(entry) => {
                if entry.path().is_file() && is_playable(&entry.file_name().to_string_lossy()) {
                    found.push(entry.into_path());
                }
            }
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs::File;
    use std::os::unix::ffi::OsStrExt;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.to_str().unwrap()).collect()
    }

    /// Playable files under `root` in walk order.
    fn walked_playable(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().into_path())
            .filter(|p| p.is_file() && is_playable(&p.to_string_lossy()))
            .collect()
    }

    #[test]
    fn playable_extensions_are_case_sensitive() {
        assert!(is_playable("song.mp3"));
        assert!(is_playable("archive.tar.flac"));
        assert!(!is_playable("SONG.MP3"));
        assert!(!is_playable("notes.txt"));
        assert!(!is_playable("mp3"));
        assert!(!is_playable("trailing."));
    }

    #[test]
    fn collation_puts_parent_first_and_ignores_case() {
        let mut names = vec!["beta", "..", "Alpha", "alp", "Zed", "_x", "alpha2"];
        names.sort_by(|a, b| collate(a, b));
        assert_eq!(names, vec!["..", "_x", "alp", "Alpha", "alpha2", "beta", "Zed"]);
    }

    #[test]
    fn listing_hides_dotfiles_and_marks_directories() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("b.mp3")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        File::create(dir.path().join("A.txt")).unwrap();
        fs::create_dir(dir.path().join("music")).unwrap();

        let entries = read_entries(dir.path()).unwrap();
        assert_eq!(names(&entries), vec!["..", "A.txt", "b.mp3", "music"]);
        assert!(entries[3].is_dir);
        assert_eq!(entries[3].label(), "music/");
        assert_eq!(entries[2].label(), "b.mp3");
    }

    #[test]
    fn entering_a_directory_relists_from_the_top() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("x.ogg")).unwrap();
        File::create(dir.path().join("z.mp3")).unwrap();

        let mut browser = FileBrowser::open(dir.path()).unwrap();
        browser.list_mut().move_down();
        assert_eq!(browser.list().selected().unwrap().name, "sub");
        assert!(browser.enter_selected().unwrap());
        assert_eq!(names(browser.list().items()), vec!["..", "x.ogg"]);
        assert_eq!(browser.list().cursor(), 0);

        assert!(browser.enter_selected().unwrap());
        assert_eq!(browser.current_dir(), fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn files_do_not_descend() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.mp3")).unwrap();
        let mut browser = FileBrowser::open(dir.path()).unwrap();
        browser.list_mut().jump_last();
        assert!(!browser.enter_selected().unwrap());
        assert_eq!(browser.current_dir(), fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn directory_collection_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let album = dir.path().join("album");
        fs::create_dir_all(album.join("sub")).unwrap();
        for name in ["zz.mp3", "song.mp3", "b.wav", "note.txt", "a.ogg"] {
            File::create(album.join(name)).unwrap();
        }
        File::create(album.join("sub").join("track.flac")).unwrap();

        let mut browser = FileBrowser::open(dir.path()).unwrap();
        browser.list_mut().jump_last();
        let found = browser.collect_selected().unwrap();

        let root = fs::canonicalize(&album).unwrap();
        assert_eq!(found.len(), 5);
        assert!(found.contains(&root.join("sub").join("track.flac")));
        assert!(!found.contains(&root.join("note.txt")));
        assert_eq!(found, walked_playable(&root));
    }

    #[test]
    fn non_utf8_names_resolve_to_real_paths() {
        let dir = tempfile::tempdir().unwrap();
        let song = OsStr::from_bytes(b"caf\xe9.mp3");
        let folder = OsStr::from_bytes(b"d\xfcr");
        File::create(dir.path().join(song)).unwrap();
        fs::create_dir(dir.path().join(folder)).unwrap();
        File::create(dir.path().join(folder).join("x.ogg")).unwrap();

        let mut browser = FileBrowser::open(dir.path()).unwrap();
        let root = browser.current_dir().to_path_buf();
        browser.list_mut().move_down();
        assert_eq!(browser.list().selected().unwrap().label(), "caf\u{fffd}.mp3");
        let queued = browser.collect_selected().unwrap();
        assert_eq!(queued, vec![root.join(song)]);
        assert!(queued[0].exists());

        browser.list_mut().jump_last();
        assert_eq!(browser.list().selected().unwrap().label(), "d\u{fffd}r/");
        assert!(browser.enter_selected().unwrap());
        assert_eq!(browser.current_dir(), root.join(folder));
        assert_eq!(names(browser.list().items()), vec!["..", "x.ogg"]);
    }

    #[test]
    fn parent_and_unplayable_entries_collect_nothing() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("readme.md")).unwrap();
        let mut browser = FileBrowser::open(dir.path()).unwrap();
        assert!(browser.collect_selected().unwrap().is_empty());
        browser.list_mut().jump_last();
        assert!(browser.collect_selected().unwrap().is_empty());
    }
}
