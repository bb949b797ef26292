//! Runtime settings
//!
//! Values resolved from built-in defaults, the user's settings file and the
//! command line, in that order of increasing precedence.

use crate::core::cli::CliArgs;
use crate::core::config_file::ConfigFile;
use crate::kerning::DEFAULT_THROTTLE;
use crate::layout::Alignment;
use crate::text::DEFAULT_PLACEHOLDER_GLYPH;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line height as a multiple of the em size
pub const DEFAULT_LINE_SPACING: f64 = 1.1;

/// How text is laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    pub align: Alignment,
    pub apply_kerning: bool,
    pub line_spacing: f64,
    pub placeholder_glyph: String,
    /// OpenType features passed to the shaper, `"liga"` or `"-kern"` style
    pub features: Vec<String>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            align: Alignment::Left,
            apply_kerning: true,
            line_spacing: DEFAULT_LINE_SPACING,
            placeholder_glyph: DEFAULT_PLACEHOLDER_GLYPH.to_string(),
            features: Vec::new(),
        }
    }
}

/// How kerning edits are sent
#[derive(Debug, Clone, PartialEq)]
pub struct EditSettings {
    pub throttle: Duration,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
        }
    }
}

impl LayoutSettings {
    /// Defaults, overridden by the settings file, overridden by the CLI.
    pub fn resolve(config: Option<&ConfigFile>, cli_args: &CliArgs) -> Self {
        let mut settings = Self::default();
        if let Some(config) = config {
            if let Some(align) = config.default_align {
                settings.align = align;
            }
            if let Some(apply_kerning) = config.apply_kerning {
                settings.apply_kerning = apply_kerning;
            }
            if let Some(line_spacing) = config.line_spacing {
                settings.line_spacing = line_spacing;
            }
            if let Some(placeholder_glyph) = &config.placeholder_glyph {
                settings.placeholder_glyph = placeholder_glyph.clone();
            }
        }
        if let Some(align) = cli_args.align {
            settings.align = align;
        }
        if cli_args.no_kerning {
            settings.apply_kerning = false;
        }
        if !cli_args.features.is_empty() {
            settings.features = cli_args.features.clone();
        }
        settings
    }
}

impl EditSettings {
    pub fn resolve(config: Option<&ConfigFile>) -> Self {
        let throttle = config
            .and_then(|config| config.kerning_throttle_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_THROTTLE);
        Self { throttle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_settings_precedence() {
        let config = ConfigFile {
            default_align: Some(Alignment::Right),
            apply_kerning: Some(false),
            line_spacing: Some(1.5),
            ..Default::default()
        };
        let cli_args = CliArgs::parse_from(["linesetter", "--align", "center"]);

        let settings = LayoutSettings::resolve(Some(&config), &cli_args);
        assert_eq!(settings.align, Alignment::Center);
        assert!(!settings.apply_kerning);
        assert_eq!(settings.line_spacing, 1.5);
        assert_eq!(settings.placeholder_glyph, DEFAULT_PLACEHOLDER_GLYPH);

        let settings = LayoutSettings::resolve(None, &CliArgs::parse_from(["linesetter"]));
        assert_eq!(settings, LayoutSettings::default());
    }

    #[test]
    fn test_edit_settings_throttle() {
        assert_eq!(EditSettings::resolve(None).throttle, DEFAULT_THROTTLE);
        let config = ConfigFile {
            kerning_throttle_ms: Some(120),
            ..Default::default()
        };
        assert_eq!(
            EditSettings::resolve(Some(&config)).throttle,
            Duration::from_millis(120)
        );
    }
}
