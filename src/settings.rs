//! Plain KEY=value settings files.
//!
//! Parses the classic `.env` shape: one `KEY=value` per line, `#` comments
//! and blank lines ignored, whitespace around keys and values trimmed.
//! Rewrites are non-destructive: lines this process never touched are kept
//! verbatim, updated keys are replaced on the line where they first appear,
//! and new keys are appended at the end.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default settings file, resolved relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = ".env";

#[derive(Debug, Clone)]
struct Line {
    raw: String,
    pair: Option<(String, String)>,
}

fn parse_pair(raw: &str) -> Option<(String, String)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// A settings file held in memory line by line, so that saving it back
/// preserves comments, ordering, and keys owned by other tools.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl SettingsFile {
    /// An empty settings file that will be created at `path` on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let lines = content
            .lines()
            .map(|raw| Line {
                raw: raw.to_string(),
                pair: parse_pair(raw),
            })
            .collect();
        Self {
            path: path.into(),
            lines,
        }
    }

    pub fn read(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        Ok(Self::parse(path, &content))
    }

    /// Like [`SettingsFile::read`], but a missing file yields an empty one
    /// instead of an error.
    pub fn read_or_new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Self::parse(path, &content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::new(path)),
            Err(err) => Err(err),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a key; when a key appears more than once the last
    /// occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match &line.pair {
            Some((k, v)) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    /// Sets a key. The first line carrying the key is rewritten in place,
    /// any later duplicates of it are dropped, and a key not present yet is
    /// appended. All other lines pass through untouched.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut replaced = false;
        self.lines.retain_mut(|line| {
            if matches!(&line.pair, Some((k, _)) if k == key) {
                if replaced {
                    return false;
                }
                line.raw = format!("{key}={value}");
                line.pair = Some((key.to_string(), value.to_string()));
                replaced = true;
            }
            true
        });
        if !replaced {
            self.lines.push(Line {
                raw: format!("{key}={value}"),
                pair: Some((key.to_string(), value.to_string())),
            });
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.raw);
            out.push('\n');
        }
        out
    }

    pub fn save(&self) -> io::Result<()> {
        fs::write(&self.path, self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_noise() {
        let content = "# deployment settings\n\nHOST = example.net\nnot a pair\nPORT=8080\n";
        let file = SettingsFile::parse(".env", content);
        assert_eq!(file.get("HOST"), Some("example.net"));
        assert_eq!(file.get("PORT"), Some("8080"));
        assert_eq!(file.get("not a pair"), None);
        assert_eq!(file.get("# deployment settings"), None);
    }

    #[test]
    fn last_duplicate_wins_on_read() {
        let file = SettingsFile::parse(".env", "KEY=first\nKEY=second\n");
        assert_eq!(file.get("KEY"), Some("second"));
    }

    #[test]
    fn set_rewrites_in_place_and_keeps_other_lines_verbatim() {
        let content = "# comment stays\nTOKEN=abc   \n  SPACED = kept as-is\nOTHER=1\n";
        let mut file = SettingsFile::parse(".env", content);
        file.set("TOKEN", "xyz");
        assert_eq!(
            file.render(),
            "# comment stays\nTOKEN=xyz\n  SPACED = kept as-is\nOTHER=1\n"
        );
    }

    #[test]
    fn set_appends_missing_key() {
        let mut file = SettingsFile::parse(".env", "FIRST=1\n");
        file.set("SECOND", "2");
        assert_eq!(file.render(), "FIRST=1\nSECOND=2\n");
        assert_eq!(file.get("SECOND"), Some("2"));
    }

    #[test]
    fn set_collapses_duplicates() {
        let mut file = SettingsFile::parse(".env", "KEY=a\nMIDDLE=m\nKEY=b\n");
        file.set("KEY", "c");
        assert_eq!(file.render(), "KEY=c\nMIDDLE=m\n");
        assert_eq!(file.get("KEY"), Some("c"));
    }

    #[test]
    fn empty_key_lines_are_not_pairs() {
        let file = SettingsFile::parse(".env", "=orphan\n");
        assert_eq!(file.get(""), None);
        assert_eq!(file.render(), "=orphan\n");
    }

    #[test]
    fn read_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.env");
        std::fs::write(&path, "# kept\nA=1\n").unwrap();

        let mut file = SettingsFile::read(&path).unwrap();
        file.set("B", "2");
        file.save().unwrap();

        let reread = std::fs::read_to_string(&path).unwrap();
        assert_eq!(reread, "# kept\nA=1\nB=2\n");
    }

    #[test]
    fn read_or_new_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.env");
        let file = SettingsFile::read_or_new(&path).unwrap();
        assert_eq!(file.get("ANY"), None);
        assert!(SettingsFile::read(&path).is_err());
    }
}
