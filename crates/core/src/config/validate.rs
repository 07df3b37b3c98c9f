use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - qBittorrent URL is present and uses http/https
/// - Intervals and the client timeout are non-zero
/// - Filter size bounds are coherent
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // qBittorrent validation
    if config.qbittorrent.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "qbittorrent.url cannot be empty".to_string(),
        ));
    }
    if !config.qbittorrent.url.starts_with("http://")
        && !config.qbittorrent.url.starts_with("https://")
    {
        return Err(ConfigError::ValidationError(
            "qbittorrent.url must start with http:// or https://".to_string(),
        ));
    }
    if config.qbittorrent.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "qbittorrent.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Watcher validation
    if config.watcher.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "watcher.tick_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.watcher.intake.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "watcher.intake.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    // Filter validation
    if let (Some(min), Some(max)) = (config.filter.min_file_size_mb, config.filter.max_file_size_mb)
    {
        if min > max {
            return Err(ConfigError::ValidationError(
                "filter.min_file_size_mb cannot exceed filter.max_file_size_mb".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (
        config.filter.min_torrent_size_mb,
        config.filter.max_torrent_size_mb,
    ) {
        if min > max {
            return Err(ConfigError::ValidationError(
                "filter.min_torrent_size_mb cannot exceed filter.max_torrent_size_mb".to_string(),
            ));
        }
    }

    Ok(())
}
