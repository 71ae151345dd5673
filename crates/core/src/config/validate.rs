use super::{types::Config, ConfigError, TranscodeMode};

/// Accepted values of `log_level`, matched case-insensitively.
pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Validate configuration
/// Currently validates:
/// - Log level is one of debug, info, warn, error
/// - Batch pool size is not 0
/// - Output extension is not empty
/// - Command mode has a template that writes `$output`
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !LOG_LEVELS
        .iter()
        .any(|level| level.eq_ignore_ascii_case(config.log_level.trim()))
    {
        return Err(ConfigError::ValidationError(format!(
            "log_level must be one of {}, got {:?}",
            LOG_LEVELS.join(", "),
            config.log_level
        )));
    }

    if config.batch.pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "batch.pool_size must be at least 1".to_string(),
        ));
    }

    let transcode = &config.transcode;
    if transcode.extension.trim().trim_start_matches('.').is_empty() {
        return Err(ConfigError::ValidationError(
            "transcode.extension cannot be empty".to_string(),
        ));
    }

    if transcode.mode == TranscodeMode::Command {
        let template = transcode.command.as_deref().unwrap_or_default();
        if template.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transcode.command is required when transcode.mode = \"command\"".to_string(),
            ));
        }
        if !template.contains("$output") && !template.contains("${output}") {
            return Err(ConfigError::ValidationError(
                "transcode.command must reference $output".to_string(),
            ));
        }
    }

    if let Some(publish) = &config.publish {
        if publish.destination.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "publish.destination cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
