//! Resolves a logical module name to its source text.
//!
//! Lookup order: compiled-in sources, then `<root>/<name>.<ext>`, then the
//! init file of `<root>/<name>/`. Compiled-in text is borrowed for the life
//! of the program; text read from disk is owned by the caller.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::Settings;

/// Sources shipped inside the binary
pub const BUILTIN_MODULES: &[(&str, &str)] = &[
    ("system", include_str!("modules/system.rhai")),
    ("renderer", include_str!("modules/renderer.rhai")),
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("short read on {path}: expected {expected} bytes, got {got}")]
    ShortRead {
        path: PathBuf,
        expected: u64,
        got: u64,
    },

    #[error("out of memory loading {path} ({size} bytes)")]
    OutOfMemory { path: PathBuf, size: u64 },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Builtin(&'static str),
    Owned { path: PathBuf, text: String },
    NotFound,
}

#[derive(Debug, Clone)]
pub struct SourceResolver {
    root: PathBuf,
    extension: String,
    init_file: String,
    builtins: &'static [(&'static str, &'static str)],
}

impl SourceResolver {
    pub fn new(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        init_file: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            init_file: init_file.into(),
            builtins: BUILTIN_MODULES,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.data_dir,
            &settings.module_extension,
            &settings.init_file,
        )
    }

    #[cfg(test)]
    pub fn with_builtins(mut self, builtins: &'static [(&'static str, &'static str)]) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Resolved, LoadError> {
        if let Some((_, text)) = self.builtins.iter().find(|(n, _)| *n == name) {
            return Ok(Resolved::Builtin(text));
        }
        if !is_relative_name(name) {
            log::warn!("refusing module name {name:?} outside the data root");
            return Ok(Resolved::NotFound);
        }

        let file = self.root.join(format!("{name}.{}", self.extension));
        if file.is_file() {
            return read_source(&file);
        }

        let dir = self.root.join(name);
        if dir.is_dir() {
            let init = dir.join(&self.init_file);
            if init.is_file() {
                return read_source(&init);
            }
        }

        Ok(Resolved::NotFound)
    }
}

/// Only plain relative names stay under the data root
fn is_relative_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Whole-file read into a buffer sized to the file
fn read_source(path: &Path) -> Result<Resolved, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let expected = file.metadata().map_err(io_err)?.len();

    let mut buf = Vec::new();
    buf.try_reserve_exact(expected as usize)
        .map_err(|_| LoadError::OutOfMemory {
            path: path.to_path_buf(),
            size: expected,
        })?;
    let got = file
        .by_ref()
        .take(expected)
        .read_to_end(&mut buf)
        .map_err(io_err)? as u64;
    if got != expected {
        return Err(LoadError::ShortRead {
            path: path.to_path_buf(),
            expected,
            got,
        });
    }

    let text = String::from_utf8(buf).map_err(|_| LoadError::Encoding {
        path: path.to_path_buf(),
    })?;
    log::debug!("loaded module source {}", path.display());
    Ok(Resolved::Owned {
        path: path.to_path_buf(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    static BUILTINS: &[(&str, &str)] = &[("core", "// compiled in")];

    fn resolver(root: &Path) -> SourceResolver {
        SourceResolver::new(root, "rhai", "init.rhai").with_builtins(BUILTINS)
    }

    #[test]
    fn builtin_beats_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("core.rhai"), "// on disk").unwrap();
        assert_eq!(
            resolver(dir.path()).resolve("core").unwrap(),
            Resolved::Builtin("// compiled in")
        );
    }

    #[test]
    fn file_beats_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plugin.rhai"), "// file").unwrap();
        fs::create_dir(dir.path().join("plugin")).unwrap();
        fs::write(dir.path().join("plugin").join("init.rhai"), "// dir").unwrap();

        match resolver(dir.path()).resolve("plugin").unwrap() {
            Resolved::Owned { text, path } => {
                assert_eq!(text, "// file");
                assert_eq!(path, dir.path().join("plugin.rhai"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn directory_loads_its_init_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("plugins").join("wrap")).unwrap();
        fs::write(
            dir.path().join("plugins").join("wrap").join("init.rhai"),
            "fn wrap() {}",
        )
        .unwrap();

        let resolved = resolver(dir.path()).resolve("plugins/wrap").unwrap();
        assert!(matches!(resolved, Resolved::Owned { ref text, .. } if text == "fn wrap() {}"));
    }

    #[test]
    fn neither_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        // a directory without an init file does not count
        fs::create_dir(dir.path().join("empty")).unwrap();
        let r = resolver(dir.path());
        assert_eq!(r.resolve("missing").unwrap(), Resolved::NotFound);
        assert_eq!(r.resolve("empty").unwrap(), Resolved::NotFound);
    }

    #[test]
    fn names_cannot_escape_the_data_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("data");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.rhai"), "// outside").unwrap();
        let r = resolver(&root);

        assert_eq!(r.resolve("../secret").unwrap(), Resolved::NotFound);
        let absolute = outer.path().join("secret");
        assert_eq!(
            r.resolve(absolute.to_str().unwrap()).unwrap(),
            Resolved::NotFound
        );
        assert_eq!(r.resolve("").unwrap(), Resolved::NotFound);
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.rhai"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            resolver(dir.path()).resolve("bad"),
            Err(LoadError::Encoding { .. })
        ));
    }

    #[test]
    fn shipped_modules_are_builtin() {
        let r = SourceResolver::new("/nonexistent", "rhai", "init.rhai");
        assert!(matches!(r.resolve("system"), Ok(Resolved::Builtin(_))));
        assert!(matches!(r.resolve("renderer"), Ok(Resolved::Builtin(_))));
    }
}
