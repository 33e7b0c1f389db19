use std::fs;
use std::path::Path;

use anyhow::Context;
use lineage_growth::prelude::{GrowthConfig, TakeoverConfig};
use serde::Deserialize;

use crate::cli::{GrowthArgs, TakeoverArgs};

/// Report settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub growth: GrowthConfig,
    pub takeover: TakeoverConfig,
}

impl ReportConfig {
    /// Load settings from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Growth settings with command-line overrides applied.
    pub fn growth_with(&self, args: &GrowthArgs) -> GrowthConfig {
        let mut config = self.growth.clone();
        if args.min_count.is_some() {
            config.min_count = args.min_count;
        }
        if args.window_weeks.is_some() {
            config.window_weeks = args.window_weeks;
        }
        if args.required_weeks.is_some() {
            config.required_weeks = args.required_weeks;
        }
        if args.top_n.is_some() {
            config.top_n = args.top_n;
        }
        config
    }

    /// Takeover settings with command-line overrides applied.
    pub fn takeover_with(&self, args: &TakeoverArgs) -> TakeoverConfig {
        let mut config = self.takeover.clone();
        if args.horizon_days.is_some() {
            config.horizon_days = args.horizon_days;
        }
        if args.anchor.is_some() {
            config.anchor = args.anchor;
        }
        if args.growth_term.is_some() {
            config.growth_term = args.growth_term;
        }
        if args.symmetric {
            config.perturbation = Some(lineage_growth::prelude::PerturbationPreset::Symmetric);
            config.perturbation_multipliers = None;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use lineage_growth::prelude::PerturbationPreset;

    use super::ReportConfig;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ReportConfig::parse("").expect("empty config parses");
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn sections_are_read() {
        let config = ReportConfig::parse(
            r#"
            [growth]
            min_count = 20
            window_weeks = 6
            alias_family = ["BA", "BQ"]

            [takeover]
            horizon_days = 300
            perturbation = "symmetric"
            anchor = "2021-12-01"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.growth.min_count, Some(20));
        assert_eq!(config.growth.window_weeks, Some(6));
        assert_eq!(
            config.growth.alias_family,
            Some(vec!["BA".to_string(), "BQ".to_string()])
        );
        assert_eq!(config.takeover.horizon_days, Some(300));
        assert_eq!(config.takeover.perturbation, Some(PerturbationPreset::Symmetric));
        assert!(config.takeover.anchor.is_some());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ReportConfig::parse("[growth]\nmin_cuont = 3\n").is_err());
    }
}
