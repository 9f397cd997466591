//! Named scenes available to the front end.

use crate::pipeline::resolve::SceneDescriptor;
use crate::scene::library;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCENE: &str = "Default";
const SCRIPT_EXTENSION: &str = "toml";

/// Where to look for scene scripts besides the built-ins.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub scene_files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
    /// `dir/pattern` where the file-name part may contain one `*`.
    pub masks: Vec<PathBuf>,
    /// Drop the built-in scenes before adding scripts.
    pub no_default: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    descriptor: SceneDescriptor,
    /// Parameter help of a built-in; scripts publish theirs in the metadata pass.
    tooltip: Option<String>,
}

/// Ordered mapping of display names to scene descriptors.
#[derive(Debug, Clone, Default)]
pub struct SceneRepository {
    scenes: Vec<Entry>,
}

impl SceneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with the built-in scenes.
    pub fn with_builtins() -> Self {
        let mut repo = Self::new();
        repo.insert(DEFAULT_SCENE, SceneDescriptor::builtin(library::default_scene));
        repo.insert_with_tooltip(
            "Cube rows",
            SceneDescriptor::builtin_with_param(library::cube_rows),
            library::CUBE_ROWS_TOOLTIP,
        );
        repo.insert("Wooden blocks", SceneDescriptor::builtin(library::wooden_blocks));
        repo
    }

    /// Adds or replaces a scene, keeping the position of a replaced entry.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: SceneDescriptor) {
        self.put(name.into(), descriptor, None);
    }

    /// Like [`insert`](Self::insert), remembering the parameter help of the scene.
    pub fn insert_with_tooltip(
        &mut self,
        name: impl Into<String>,
        descriptor: SceneDescriptor,
        tooltip: impl Into<String>,
    ) {
        self.put(name.into(), descriptor, Some(tooltip.into()));
    }

    fn put(&mut self, name: String, descriptor: SceneDescriptor, tooltip: Option<String>) {
        match self.scenes.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.descriptor = descriptor;
                entry.tooltip = tooltip;
            }
            None => self.scenes.push(Entry {
                name,
                descriptor,
                tooltip,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SceneDescriptor> {
        self.entry(name).map(|e| &e.descriptor)
    }

    /// Stored parameter help, if the scene was registered with one.
    pub fn tooltip(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|e| e.tooltip.as_deref())
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.scenes.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scenes.clear();
    }

    /// Registers scene scripts named by `discovery`. Returns how many were added.
    ///
    /// Missing files are skipped; unreadable directories are logged and skipped.
    pub fn discover(&mut self, discovery: &Discovery) -> usize {
        if discovery.no_default {
            self.clear();
        }

        let mut count = 0;
        for file in &discovery.scene_files {
            if file.is_file() {
                self.add_script(file);
                count += 1;
            } else {
                warn!("Scene file '{}' does not exist", file.display());
            }
        }

        for dir in &discovery.dirs {
            if dir.is_dir() {
                count += self.add_matching(dir, &format!("*.{}", SCRIPT_EXTENSION));
            } else {
                warn!("Scene directory '{}' does not exist", dir.display());
            }
        }

        for mask in &discovery.masks {
            let pattern = match mask.file_name().and_then(|n| n.to_str()) {
                Some(p) => p,
                None => {
                    warn!("Invalid scene mask '{}'", mask.display());
                    continue;
                }
            };
            let dir = match mask.parent() {
                Some(d) if !d.as_os_str().is_empty() => d,
                _ => Path::new("."),
            };
            count += self.add_matching(dir, pattern);
        }

        if count > 0 {
            info!("Registered {} scene script(s)", count);
        }
        count
    }

    fn add_matching(&mut self, dir: &Path, pattern: &str) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("I/O error in dir/mask '{}'/'{}': {}", dir.display(), pattern, e);
                return 0;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!("I/O error in '{}': {}", dir.display(), e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| matches_mask(pattern, n))
            })
            .collect();
        // read_dir order is platform dependent.
        paths.sort();

        for path in &paths {
            self.add_script(path);
        }
        paths.len()
    }

    fn add_script(&mut self, path: &Path) {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.insert(script_key(&path), SceneDescriptor::script_file(path));
    }
}

/// Display name of a script scene: `"* "` followed by the file name without the script extension.
pub fn script_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(&format!(".{}", SCRIPT_EXTENSION))
        .unwrap_or(&name);
    format!("* {}", stem)
}

/// File-name match against a pattern with at most one `*` wildcard.
pub fn matches_mask(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => pattern == name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolve::ExternalSource;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("csg-scenes-repo-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let repo = SceneRepository::with_builtins();
        let names: Vec<_> = repo.names().collect();
        assert_eq!(names, vec!["Default", "Cube rows", "Wooden blocks"]);
        assert!(matches!(repo.get("Cube rows"), Some(SceneDescriptor::BuiltinWithParam(_))));
        assert_eq!(repo.tooltip("Cube rows"), Some(library::CUBE_ROWS_TOOLTIP));
        assert_eq!(repo.tooltip("Default"), None);
    }

    #[test]
    fn replacing_an_entry_replaces_its_tooltip() {
        let mut repo = SceneRepository::with_builtins();
        repo.insert_with_tooltip("Renamed", SceneDescriptor::builtin(library::default_scene), "k=<int>");
        assert_eq!(repo.tooltip("Renamed"), Some("k=<int>"));

        repo.insert("Cube rows", SceneDescriptor::builtin(library::default_scene));
        assert_eq!(repo.tooltip("Cube rows"), None);
        assert_eq!(repo.names().position(|n| n == "Cube rows"), Some(1));
    }

    #[test]
    fn mask_matching() {
        assert!(matches_mask("*.toml", "cubes.toml"));
        assert!(matches_mask("cu*s.toml", "cubes.toml"));
        assert!(!matches_mask("*.toml", "cubes.txt"));
        assert!(!matches_mask("ab*ba", "aba"));
        assert!(matches_mask("cubes.toml", "cubes.toml"));
    }

    #[test]
    fn script_keys_drop_extension() {
        assert_eq!(script_key(Path::new("/data/cubes.toml")), "* cubes");
        assert_eq!(script_key(Path::new("notes.txt")), "* notes.txt");
    }

    #[test]
    fn directory_scan_adds_scripts() {
        let dir = temp_dir("dir");
        fs::write(dir.join("a.toml"), "").unwrap();
        fs::write(dir.join("b.toml"), "").unwrap();
        fs::write(dir.join("readme.md"), "").unwrap();

        let mut repo = SceneRepository::with_builtins();
        let added = repo.discover(&Discovery {
            dirs: vec![dir.clone()],
            ..Discovery::default()
        });

        assert_eq!(added, 2);
        assert_eq!(repo.len(), 5);
        assert!(matches!(
            repo.get("* a"),
            Some(SceneDescriptor::External(ExternalSource::Path(_)))
        ));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn no_default_and_mask() {
        let dir = temp_dir("mask");
        fs::write(dir.join("cubes.toml"), "").unwrap();
        fs::write(dir.join("spheres.toml"), "").unwrap();

        let mut repo = SceneRepository::with_builtins();
        let added = repo.discover(&Discovery {
            masks: vec![dir.join("cu*")],
            scene_files: vec![dir.join("missing.toml")],
            no_default: true,
            ..Discovery::default()
        });

        assert_eq!(added, 1);
        assert_eq!(repo.names().collect::<Vec<_>>(), vec!["* cubes"]);
        fs::remove_dir_all(dir).unwrap();
    }
}
