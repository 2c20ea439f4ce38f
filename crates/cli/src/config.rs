//! Operator configuration read from `<data dir>/config.json`.

use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shifttrack_core::MAX_TARGET_DAYS;
use shifttrack_progress::MasteryPolicy;
use shifttrack_work::WorkConfig;

/// File name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Tunables for a ShiftTrack installation. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftTrackConfig {
    /// Consecutive all-correct days that count as mastery
    pub mastery_streak: u32,

    /// Streak at which an active goal shows as near mastery
    pub near_mastery_streak: u32,

    /// Active goals allowed per employee
    pub max_active_goals: usize,

    /// Trailing days used for the dashboard success rate
    pub success_window_days: u32,

    /// Days to target for custom goals and new templates
    pub default_target_days: u32,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ShiftTrackConfig {
    fn default() -> Self {
        Self {
            mastery_streak: 3,
            near_mastery_streak: 2,
            max_active_goals: 2,
            success_window_days: 7,
            default_target_days: 90,
            log_level: "info".to_string(),
        }
    }
}

impl ShiftTrackConfig {
    /// Load from `dir`, falling back to defaults when the file is absent.
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine can't work with.
    pub fn validate(&self) -> Result<()> {
        if self.mastery_streak == 0 {
            anyhow::bail!("mastery_streak must be at least 1");
        }
        if self.near_mastery_streak > self.mastery_streak {
            anyhow::bail!(
                "near_mastery_streak ({}) exceeds mastery_streak ({})",
                self.near_mastery_streak,
                self.mastery_streak
            );
        }
        if self.max_active_goals == 0 {
            anyhow::bail!("max_active_goals must be at least 1");
        }
        if self.success_window_days > MAX_TARGET_DAYS {
            anyhow::bail!(
                "success_window_days ({}) exceeds {}",
                self.success_window_days,
                MAX_TARGET_DAYS
            );
        }
        if self.default_target_days > MAX_TARGET_DAYS {
            anyhow::bail!(
                "default_target_days ({}) exceeds {}",
                self.default_target_days,
                MAX_TARGET_DAYS
            );
        }
        Ok(())
    }

    /// Thresholds for the progression engine.
    pub fn mastery_policy(&self) -> MasteryPolicy {
        MasteryPolicy {
            mastery_streak: self.mastery_streak,
            near_mastery_streak: self.near_mastery_streak,
        }
    }

    /// Settings for the work services.
    pub fn work_config(&self) -> WorkConfig {
        WorkConfig {
            max_active_goals: self.max_active_goals,
            default_target_days: self.default_target_days,
            policy: self.mastery_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShiftTrackConfig::load(dir.path()).await.unwrap();
        assert_eq!(config, ShiftTrackConfig::default());
        assert_eq!(config.mastery_policy(), MasteryPolicy::default());
        assert_eq!(config.work_config(), WorkConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "mastery_streak": 5, "log_level": "debug" }"#,
        )
        .await
        .unwrap();

        let config = ShiftTrackConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.mastery_streak, 5);
        assert_eq!(config.near_mastery_streak, 2);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.work_config().policy.mastery_streak, 5);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "mastery_streak": 2, "near_mastery_streak": 4 }"#,
        )
        .await
        .unwrap();
        assert!(ShiftTrackConfig::load(dir.path()).await.is_err());

        tokio::fs::write(dir.path().join(CONFIG_FILE), "not json").await.unwrap();
        assert!(ShiftTrackConfig::load(dir.path()).await.is_err());
    }

    #[test]
    fn test_day_counts_bounded() {
        let window = ShiftTrackConfig {
            success_window_days: 4_000_000_000,
            ..Default::default()
        };
        assert!(window.validate().is_err());

        let target = ShiftTrackConfig {
            default_target_days: MAX_TARGET_DAYS + 1,
            ..Default::default()
        };
        assert!(target.validate().is_err());

        let edge = ShiftTrackConfig {
            success_window_days: MAX_TARGET_DAYS,
            default_target_days: MAX_TARGET_DAYS,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }
}
