// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, WatchSection, WatchSettings};
use crate::errors::{Result, ScenewatchError};
use crate::types::is_scene_token;
use crate::watch::{SourceFilter, WatchTimings};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ScenewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_compiler(&raw)?;
        validate_scenes(&raw)?;
        let watch = validate_watch(&raw.watch)?;
        Ok(ConfigFile::new_unchecked(
            raw.server,
            raw.scenes,
            raw.compiler,
            watch,
        ))
    }
}

fn validate_compiler(cfg: &RawConfigFile) -> Result<()> {
    if cfg.compiler.cmd.trim().is_empty() {
        return Err(ScenewatchError::ConfigError(
            "[compiler].cmd must be set to a command that prints the scene bundle".to_string(),
        ));
    }
    Ok(())
}

fn validate_scenes(cfg: &RawConfigFile) -> Result<()> {
    if !is_scene_token(&cfg.scenes.shared) {
        return Err(ScenewatchError::ConfigError(format!(
            "[scenes].shared must be a plain word (got {:?})",
            cfg.scenes.shared
        )));
    }
    if cfg.scenes.entry_point.trim().is_empty() {
        return Err(ScenewatchError::ConfigError(
            "[scenes].entry_point must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(watch: &WatchSection) -> Result<WatchSettings> {
    let timings = WatchTimings {
        build_window: field_duration("build_window", &watch.build_window)?,
        expiry: field_duration("expiry", &watch.expiry)?,
        compile_delay: field_duration("compile_delay", &watch.compile_delay)?,
    };

    // A rebuild scheduled at the very end of the window must still be able
    // to fire, and watching must outlive the rebuild window.
    if timings.compile_delay >= timings.build_window {
        return Err(ScenewatchError::ConfigError(format!(
            "[watch].compile_delay ({}) must be shorter than build_window ({})",
            watch.compile_delay, watch.build_window
        )));
    }
    if timings.build_window > timings.expiry {
        return Err(ScenewatchError::ConfigError(format!(
            "[watch].build_window ({}) must not exceed expiry ({})",
            watch.build_window, watch.expiry
        )));
    }

    let filter = SourceFilter::new(&watch.include, &watch.exclude)
        .map_err(|e| ScenewatchError::ConfigError(format!("[watch] patterns: {e:#}")))?;

    Ok(WatchSettings { timings, filter })
}

fn field_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value)
        .map_err(|e| ScenewatchError::ConfigError(format!("[watch].{field}: {e}")))?;
    if dur.is_zero() {
        return Err(ScenewatchError::ConfigError(format!(
            "[watch].{field} must be greater than zero"
        )));
    }
    Ok(dur)
}

/// Parse a duration string like `"500ms"`, `"15s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ))
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_cmd() -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.compiler.cmd = "cat {dir}/main.js".to_string();
        raw
    }

    #[test]
    fn defaults_validate_once_compiler_is_set() {
        let cfg = ConfigFile::try_from(raw_with_cmd()).unwrap();
        assert_eq!(cfg.watch.timings, WatchTimings::default());
        assert_eq!(cfg.scenes.shared, "shared");
        assert!(cfg.watch.filter.matches("game/app.js"));
        assert!(!cfg.watch.filter.matches("game/app.min.js"));
    }

    #[test]
    fn empty_compiler_cmd_is_rejected() {
        match ConfigFile::try_from(RawConfigFile::default()) {
            Err(ScenewatchError::ConfigError(msg)) => assert!(msg.contains("[compiler].cmd")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn debounce_longer_than_window_is_rejected() {
        let mut raw = raw_with_cmd();
        raw.watch.compile_delay = "20s".to_string();
        match ConfigFile::try_from(raw) {
            Err(ScenewatchError::ConfigError(msg)) => assert!(msg.contains("compile_delay")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn window_longer_than_expiry_is_rejected() {
        let mut raw = raw_with_cmd();
        raw.watch.build_window = "5m".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(ScenewatchError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let mut raw = raw_with_cmd();
        raw.watch.compile_delay = "0ms".to_string();
        match ConfigFile::try_from(raw) {
            Err(ScenewatchError::ConfigError(msg)) => assert!(msg.contains("greater than zero")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn shared_token_must_be_a_word() {
        let mut raw = raw_with_cmd();
        raw.scenes.shared = "../common".to_string();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(ScenewatchError::ConfigError(_))
        ));
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 15s "), Ok(Duration::from_secs(15)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("3 days").is_err());
    }

    #[test]
    fn oversized_durations_are_errors_not_panics() {
        let err = parse_duration("999999999999999999h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn oversized_expiry_is_a_config_error() {
        let mut raw = raw_with_cmd();
        raw.watch.expiry = "999999999999999999h".to_string();
        match ConfigFile::try_from(raw) {
            Err(ScenewatchError::ConfigError(msg)) => assert!(msg.contains("expiry"), "{msg}"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
