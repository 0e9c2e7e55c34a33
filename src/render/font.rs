use std::fs;
use std::path::{Path, PathBuf};

use super::RenderError;

const DEFAULT_TAB_WIDTH: usize = 4;
pub const MAX_TAB_WIDTH: usize = u16::MAX as usize;

/// A loaded font. Cell backends lay text out one column per character, so
/// the font only contributes its tab width and line height.
#[derive(Debug)]
pub struct Font {
    path: PathBuf,
    size: f32,
    tab_width: usize,
}

impl Font {
    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self, RenderError> {
        let path = path.as_ref();
        if !(size.is_finite() && size > 0.0) {
            return Err(RenderError::InvalidSize(size));
        }
        let meta = fs::metadata(path).map_err(|source| RenderError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(RenderError::NotAFile(path.to_path_buf()));
        }
        // make sure we can actually read it, not just stat it
        fs::File::open(path).map_err(|source| RenderError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("loaded font {} at size {size}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            size,
            tab_width: DEFAULT_TAB_WIDTH,
        })
    }

    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub fn set_tab_width(&mut self, n: usize) {
        self.tab_width = n.clamp(1, MAX_TAB_WIDTH);
    }

    /// Advance of a single character
    pub fn advance(&self, ch: char) -> i32 {
        if ch == '\t' { self.tab_width as i32 } else { 1 }
    }

    pub fn width(&self, text: &str) -> i32 {
        text.chars()
            .fold(0i32, |width, ch| width.saturating_add(self.advance(ch)))
    }

    pub fn height(&self) -> i32 {
        1
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        log::debug!("freed font {} at size {}", self.path.display(), self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_requires_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Font::load(dir.path().join("nope.ttf"), 14.0);
        assert!(matches!(missing, Err(RenderError::FontIo { .. })));

        let as_dir = Font::load(dir.path(), 14.0);
        assert!(matches!(as_dir, Err(RenderError::NotAFile(_))));
    }

    #[test]
    fn rejects_non_positive_size() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            Font::load(file.path(), 0.0),
            Err(RenderError::InvalidSize(_))
        ));
    }

    #[test]
    fn tabs_use_tab_width() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut font = Font::load(file.path(), 12.0).unwrap();
        assert_eq!(font.width("ab\tc"), 7);
        font.set_tab_width(2);
        assert_eq!(font.width("ab\tc"), 5);
        font.set_tab_width(0);
        assert_eq!(font.tab_width(), 1);
        assert_eq!(font.height(), 1);
    }

    #[test]
    fn oversized_tab_width_is_capped() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut font = Font::load(file.path(), 12.0).unwrap();
        font.set_tab_width(usize::MAX);
        assert_eq!(font.tab_width(), MAX_TAB_WIDTH);
        assert_eq!(font.width("\t"), MAX_TAB_WIDTH as i32);

        let tabs = "\t".repeat(40_000);
        assert_eq!(font.width(&tabs), i32::MAX);
    }
}
