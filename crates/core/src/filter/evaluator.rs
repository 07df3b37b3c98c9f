use tracing::debug;

use super::classify::{classify, normalize_extension};
use super::types::{
    FileDescriptor, FileKind, FilterError, FilterResult, FilterSettings, TorrentMeta,
};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Evaluate a torrent's file list against the filter policy.
///
/// Rules apply in a fixed order:
/// 1. extension deny list, then allow list (subtitles are exempt from the
///    allow list)
/// 2. min/max file size, media-class files only
/// 3. sample exclusion
/// 4. subtitle-only rejection when no media-class file survived so far
/// 5. `media_files_only` drops everything classified Other
/// 6. `include_subtitles = false` drops subtitles
///
/// then torrent-level seed and total-size thresholds, which fail the result
/// without touching the kept list. An empty input never errors, it fails
/// the filter.
pub fn evaluate(
    files: &[FileDescriptor],
    meta: &TorrentMeta,
    settings: &FilterSettings,
) -> Result<FilterResult, FilterError> {
    validate_settings(settings)?;

    if files.is_empty() {
        return Ok(FilterResult::rejected());
    }
    for file in files {
        if file.name.trim().is_empty() {
            return Err(FilterError::InvalidFile(format!(
                "file with empty name at path '{}'",
                file.relative_path
            )));
        }
    }

    let blocked: Vec<String> = settings
        .blocked_extensions
        .iter()
        .map(|e| normalize_extension(e))
        .collect();
    let allowed: Vec<String> = settings
        .allowed_extensions
        .iter()
        .map(|e| normalize_extension(e))
        .collect();

    let mut kept: Vec<(&FileDescriptor, FileKind)> = files
        .iter()
        .map(|f| (f, classify(f, settings)))
        .collect();

    // 1. extension deny, then allow
    kept.retain(|(file, kind)| match file.extension() {
        Some(ext) => {
            if blocked.contains(&ext) {
                return false;
            }
            if !allowed.is_empty() && *kind != FileKind::Subtitle && !allowed.contains(&ext) {
                return false;
            }
            true
        }
        // Extensionless files cannot match a non-empty allow list.
        None => allowed.is_empty(),
    });

    // 2. size bounds, media-class only
    let min_bytes = settings.min_file_size_mb.map(|m| m.saturating_mul(BYTES_PER_MB));
    let max_bytes = settings.max_file_size_mb.map(|m| m.saturating_mul(BYTES_PER_MB));
    kept.retain(|(file, kind)| {
        if !kind.is_media_class() {
            return true;
        }
        if let Some(min) = min_bytes {
            if file.size_bytes < min {
                return false;
            }
        }
        if let Some(max) = max_bytes {
            if file.size_bytes > max {
                return false;
            }
        }
        true
    });

    // 3. samples
    if settings.skip_sample_files {
        kept.retain(|(_, kind)| *kind != FileKind::Sample);
    }

    // 4. subtitle-only rejection: nothing media-class left means the
    // torrent is not worth keeping for its remaining files
    if settings.skip_subtitle_only && !kept.iter().any(|(_, kind)| kind.is_media_class()) {
        debug!("no media files survived filtering, rejecting torrent");
        return Ok(FilterResult::rejected());
    }

    // 5. media and subtitles only
    if settings.media_files_only {
        kept.retain(|(_, kind)| *kind != FileKind::Other);
    }

    // 6. subtitles
    if !settings.include_subtitles {
        kept.retain(|(_, kind)| *kind != FileKind::Subtitle);
    }

    let thresholds_ok = torrent_thresholds_met(meta, settings);
    let kept_files: Vec<FileDescriptor> = kept.into_iter().map(|(f, _)| f.clone()).collect();
    let passed = !kept_files.is_empty() && thresholds_ok;
    Ok(FilterResult::from_kept(kept_files, passed))
}

fn validate_settings(settings: &FilterSettings) -> Result<(), FilterError> {
    if let (Some(min), Some(max)) = (settings.min_file_size_mb, settings.max_file_size_mb) {
        if min > max {
            return Err(FilterError::InvalidSettings(format!(
                "min_file_size_mb {} exceeds max_file_size_mb {}",
                min, max
            )));
        }
    }
    if let (Some(min), Some(max)) = (settings.min_torrent_size_mb, settings.max_torrent_size_mb) {
        if min > max {
            return Err(FilterError::InvalidSettings(format!(
                "min_torrent_size_mb {} exceeds max_torrent_size_mb {}",
                min, max
            )));
        }
    }
    Ok(())
}

/// Seed and total-size thresholds. An unknown seeder count never fails the
/// seed threshold.
fn torrent_thresholds_met(meta: &TorrentMeta, settings: &FilterSettings) -> bool {
    if let (Some(min), Some(seeders)) = (settings.min_seed_count, meta.seeders) {
        if seeders < min {
            return false;
        }
    }
    if let Some(min) = settings.min_torrent_size_mb {
        if meta.total_size_bytes < min.saturating_mul(BYTES_PER_MB) {
            return false;
        }
    }
    if let Some(max) = settings.max_torrent_size_mb {
        if meta.total_size_bytes > max.saturating_mul(BYTES_PER_MB) {
            return false;
        }
    }
    true
}
