use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{FileDescriptor, FileKind, FilterSettings};

/// Extensions recognized as video media out of the box.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "wmv", "mov", "flv", "ts", "m2ts", "webm", "mpg", "mpeg", "m4v", "rmvb",
    "vob", "iso",
];

/// Extensions recognized as subtitles.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "idx", "vtt", "smi"];

// "sample" as a standalone token: "sample.mkv", "Movie-SAMPLE.avi",
// "Sample/movie.mkv". Not a substring match, so "sampler.mkv" stays media.
static SAMPLE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[^a-z0-9])sample([^a-z0-9]|$)").unwrap());

/// Classify a file by its extension and name.
///
/// Extensions in `allowed_extensions` are treated as media even when the
/// built-in set does not know them; the configured list wins over the
/// built-ins. Subtitle extensions always classify as subtitles.
pub fn classify(file: &FileDescriptor, settings: &FilterSettings) -> FileKind {
    let ext = match file.extension() {
        Some(ext) => ext,
        None => return FileKind::Other,
    };

    if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        return FileKind::Subtitle;
    }

    let allowed = settings
        .allowed_extensions
        .iter()
        .any(|e| normalize_extension(e) == ext);
    if allowed || MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        if is_sample_name(file) {
            FileKind::Sample
        } else {
            FileKind::Media
        }
    } else {
        FileKind::Other
    }
}

/// Lowercase and strip a leading dot, so configured lists may use either
/// "mkv" or ".mkv".
pub(super) fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

fn is_sample_name(file: &FileDescriptor) -> bool {
    SAMPLE_TOKEN.is_match(&file.name) || SAMPLE_TOKEN.is_match(&file.relative_path)
}
