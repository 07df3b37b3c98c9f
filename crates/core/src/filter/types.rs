use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter settings: {0}")]
    InvalidSettings(String),

    #[error("invalid file descriptor: {0}")]
    InvalidFile(String),
}

/// A single file inside a torrent, as reported by the download client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name without directories.
    pub name: String,
    pub size_bytes: u64,
    /// Path relative to the torrent root, as the client reports it.
    pub relative_path: String,
}

impl FileDescriptor {
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            relative_path: relative_path.into(),
        }
    }

    /// Lowercased extension without the dot. Dotfiles and names without a
    /// dot have no extension.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Torrent-level metadata supplied alongside the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentMeta {
    pub total_size_bytes: u64,
    /// Seeder count when the client knows one.
    pub seeders: Option<u32>,
}

/// Classification of a torrent file by filename heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Media,
    Subtitle,
    /// Media file whose name marks it as a preview sample.
    Sample,
    Other,
}

impl FileKind {
    /// Media and samples both count as media-class: size rules and
    /// subtitle-only detection look at these.
    pub fn is_media_class(&self) -> bool {
        matches!(self, FileKind::Media | FileKind::Sample)
    }
}

fn default_true() -> bool {
    true
}

/// Policy applied to a torrent's file list before it is accepted.
///
/// All fields have defaults so a `[filter]` config section can be partial
/// or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Minimum media file size in megabytes.
    #[serde(default)]
    pub min_file_size_mb: Option<u64>,
    /// Maximum media file size in megabytes.
    #[serde(default)]
    pub max_file_size_mb: Option<u64>,
    /// Extensions treated as media on top of the built-in set. When
    /// non-empty, non-subtitle files with other extensions are dropped.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    /// Extensions dropped unconditionally.
    #[serde(default)]
    pub blocked_extensions: Vec<String>,
    /// Reject the torrent when fewer seeders than this are reported.
    #[serde(default)]
    pub min_seed_count: Option<u32>,
    /// Minimum total torrent size in megabytes.
    #[serde(default)]
    pub min_torrent_size_mb: Option<u64>,
    /// Maximum total torrent size in megabytes.
    #[serde(default)]
    pub max_torrent_size_mb: Option<u64>,
    #[serde(default = "default_true")]
    pub skip_sample_files: bool,
    /// Reject torrents whose only surviving content is subtitles.
    #[serde(default = "default_true")]
    pub skip_subtitle_only: bool,
    /// Drop files that are neither media nor subtitles.
    #[serde(default)]
    pub media_files_only: bool,
    #[serde(default = "default_true")]
    pub include_subtitles: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_file_size_mb: None,
            max_file_size_mb: None,
            allowed_extensions: Vec::new(),
            blocked_extensions: Vec::new(),
            min_seed_count: None,
            min_torrent_size_mb: None,
            max_torrent_size_mb: None,
            skip_sample_files: true,
            skip_subtitle_only: true,
            media_files_only: false,
            include_subtitles: true,
        }
    }
}

/// Outcome of evaluating a file list against [`FilterSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Files surviving the policy, in input order.
    pub kept_files: Vec<FileDescriptor>,
    pub kept_count: u32,
    /// Sum of the kept file sizes.
    pub total_size_bytes: u64,
    /// False when nothing survived or a torrent-level threshold failed.
    pub passed: bool,
}

impl FilterResult {
    pub(crate) fn rejected() -> Self {
        Self {
            kept_files: Vec::new(),
            kept_count: 0,
            total_size_bytes: 0,
            passed: false,
        }
    }

    pub(crate) fn from_kept(kept_files: Vec<FileDescriptor>, passed: bool) -> Self {
        let total_size_bytes = kept_files.iter().map(|f| f.size_bytes).sum();
        Self {
            kept_count: kept_files.len() as u32,
            total_size_bytes,
            kept_files,
            passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lowercased() {
        let file = FileDescriptor::new("Movie.MKV", 100, "Movie.MKV");
        assert_eq!(file.extension(), Some("mkv".to_string()));
    }

    #[test]
    fn test_extension_none_without_dot() {
        let file = FileDescriptor::new("README", 100, "README");
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn test_extension_none_for_dotfile() {
        let file = FileDescriptor::new(".hidden", 100, ".hidden");
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn test_extension_takes_last_component() {
        let file = FileDescriptor::new("show.s01e01.mkv", 100, "show.s01e01.mkv");
        assert_eq!(file.extension(), Some("mkv".to_string()));
    }

    #[test]
    fn test_media_class() {
        assert!(FileKind::Media.is_media_class());
        assert!(FileKind::Sample.is_media_class());
        assert!(!FileKind::Subtitle.is_media_class());
        assert!(!FileKind::Other.is_media_class());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = FilterSettings::default();
        assert!(settings.skip_sample_files);
        assert!(settings.skip_subtitle_only);
        assert!(!settings.media_files_only);
        assert!(settings.include_subtitles);
        assert!(settings.min_file_size_mb.is_none());
        assert!(settings.allowed_extensions.is_empty());
    }

    #[test]
    fn test_settings_partial_toml() {
        let toml = r#"
min_file_size_mb = 300
blocked_extensions = ["exe", "zip"]
media_files_only = true
"#;
        let settings: FilterSettings = toml::from_str(toml).unwrap();
        assert_eq!(settings.min_file_size_mb, Some(300));
        assert_eq!(settings.blocked_extensions, vec!["exe", "zip"]);
        assert!(settings.media_files_only);
        // Unspecified flags keep their defaults
        assert!(settings.skip_sample_files);
        assert!(settings.include_subtitles);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = FilterSettings {
            min_file_size_mb: Some(300),
            min_seed_count: Some(5),
            allowed_extensions: vec!["mkv".to_string()],
            ..FilterSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: FilterSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_result_from_kept_sums_sizes() {
        let result = FilterResult::from_kept(
            vec![
                FileDescriptor::new("a.mkv", 100, "a.mkv"),
                FileDescriptor::new("b.mkv", 250, "b.mkv"),
            ],
            true,
        );
        assert_eq!(result.kept_count, 2);
        assert_eq!(result.total_size_bytes, 350);
        assert!(result.passed);
    }
}
