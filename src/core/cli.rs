//! Command line interface for linesetter
//!
//! Handles parsing command line arguments and provides validation for user
//! inputs. Options that take structured values document their format.

use crate::data::UfoSource;
use crate::layout::Alignment;
use crate::variation::{FontAxis, Location};
use clap::Parser;
use std::path::PathBuf;

/// linesetter CLI arguments
///
/// Examples:
///   linesetter --source Regular.ufo --text "AVATAR"
///   linesetter --source Light.ufo@wght=100 --source Bold.ufo@wght=900 \
///              --axis wght=100:100:900 --location wght=450 --text "To/T.alt"
///   linesetter --source Regular.ufo --font-binary Regular.ttf --text "office"
///   linesetter --new-config
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "linesetter",
    version,
    about = "Lay out text with a font's sources and kerning",
    long_about = "linesetter shapes and kerns lines of text using UFO sources, interpolating glyph metrics and kerning at a design-space location, and prints the positioned glyphs as JSON."
)]
pub struct CliArgs {
    /// UFO sources, each optionally followed by its location
    #[clap(
        long = "source",
        short = 's',
        help = "UFO source, as path.ufo or path.ufo@wght=400,wdth=100",
        long_help = "A UFO source of the font. Repeat for every source of a variable font. The location after '@' lists axis=value pairs; axis names must match the names given with --axis."
    )]
    pub sources: Vec<UfoSource>,

    /// Axes of the design space
    #[clap(
        long = "axis",
        short = 'a',
        value_parser = parse_axis,
        help = "Axis as tag=min:default:max",
        long_help = "A continuous axis of the design space, as tag=min:default:max. The tag also serves as the axis name in locations."
    )]
    pub axes: Vec<FontAxis>,

    /// Text to lay out; `\n` separates lines, `/name` references glyphs
    #[clap(long = "text", short = 't', default_value = "")]
    pub text: String,

    /// Location to lay out at, defaults to the axis defaults
    #[clap(
        long = "location",
        short = 'l',
        value_parser = parse_location,
        help = "Location as wght=400,wdth=100"
    )]
    pub location: Option<Location>,

    /// Line alignment: left, center or right
    #[clap(long = "align")]
    pub align: Option<Alignment>,

    /// Lay out without kerning
    #[clap(long = "no-kerning")]
    pub no_kerning: bool,

    /// OpenType features, as accepted by the shaping engine (`liga`, `-kern`)
    #[clap(long = "feature", short = 'f')]
    pub features: Vec<String>,

    /// Compiled font binary for engine-backed shaping
    #[clap(
        long = "font-binary",
        help = "Compiled TTF/OTF of the same font",
        long_help = "A compiled font binary (TTF or OTF) of the same font. When given, text is shaped with its GSUB/GPOS tables; otherwise each character maps to one glyph."
    )]
    pub font_binary: Option<PathBuf>,

    /// Log filter, as accepted by RUST_LOG
    #[clap(long = "log", help = "Log filter, e.g. linesetter=debug")]
    pub log_filter: Option<String>,

    /// Also write logs to a daily file in the config directory
    #[clap(long = "log-to-file")]
    pub log_to_file: bool,

    /// Write a settings file with default values and exit
    #[clap(
        long = "new-config",
        help = "Initialize the user settings file",
        long_help = "Create <config dir>/linesetter/settings.json with default values, unless it already exists, and exit."
    )]
    pub new_config: bool,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This makes sure every path exists and every location refers to a
    /// declared axis before any font is loaded.
    pub fn validate(&self) -> Result<(), String> {
        if self.new_config {
            return Ok(());
        }
        if self.sources.is_empty() {
            return Err("No sources given.\nUse --source path.ufo at least once.".to_string());
        }
        for source in &self.sources {
            if !source.path.is_dir() {
                return Err(format!(
                    "Not a UFO directory: {}\nMake sure the path is correct and the UFO exists.",
                    source.path.display()
                ));
            }
            self.validate_location(&source.location)?;
        }
        if let Some(location) = &self.location {
            self.validate_location(location)?;
        }
        if let Some(path) = &self.font_binary {
            if !path.is_file() {
                return Err(format!("Font binary does not exist: {}", path.display()));
            }
        }
        Ok(())
    }

    fn validate_location(&self, location: &Location) -> Result<(), String> {
        match location
            .keys()
            .find(|name| !self.axes.iter().any(|axis| &axis.name == *name))
        {
            Some(name) => Err(format!(
                "Unknown axis '{name}'\nDeclare it with --axis {name}=min:default:max."
            )),
            None => Ok(()),
        }
    }
}

/// Parse `tag=min:default:max` into a continuous axis.
pub fn parse_axis(s: &str) -> Result<FontAxis, String> {
    let (tag, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected tag=min:default:max, got '{s}'"))?;
    let values = range
        .split(':')
        .map(|value| value.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid axis range '{range}'"))?;
    let [minimum, default, maximum] = values[..] else {
        return Err(format!("expected min:default:max, got '{range}'"));
    };
    if !(minimum <= default && default <= maximum) {
        return Err(format!("axis '{tag}' needs min <= default <= max"));
    }
    let tag = tag.trim();
    Ok(FontAxis::continuous(tag, tag, minimum, default, maximum))
}

/// Parse `wght=400,wdth=100` into a location.
pub fn parse_location(s: &str) -> Result<Location, String> {
    s.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (axis, value) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected axis=value, got '{entry}'"))?;
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid value for axis '{axis}'"))?;
            Ok((axis.trim().to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis() {
        let axis = parse_axis("wght=100:400:900").unwrap();
        assert_eq!(axis, FontAxis::continuous("wght", "wght", 100.0, 400.0, 900.0));
        assert!(parse_axis("wght=100:900").is_err());
        assert!(parse_axis("wght=900:400:100").is_err());
        assert!(parse_axis("wght").is_err());
    }

    #[test]
    fn test_parse_arguments() {
        let args = CliArgs::parse_from([
            "linesetter",
            "--source",
            "Light.ufo@wght=100",
            "--source",
            "Bold.ufo@wght=900",
            "--axis",
            "wght=100:100:900",
            "--location",
            "wght=450",
            "--align",
            "right",
            "--no-kerning",
            "--text",
            "AV",
        ]);
        assert_eq!(args.sources.len(), 2);
        assert_eq!(args.sources[1].location.get("wght"), Some(&900.0));
        assert_eq!(args.axes[0].maximum, 900.0);
        assert_eq!(args.location.as_ref().and_then(|l| l.get("wght")), Some(&450.0));
        assert_eq!(args.align, Some(Alignment::Right));
        assert!(args.no_kerning);
        assert_eq!(args.text, "AV");
    }

    #[test]
    fn test_validate_rejects_unknown_axis() {
        let args = CliArgs {
            axes: vec![FontAxis::continuous("wght", "wght", 100.0, 400.0, 900.0)],
            ..Default::default()
        };
        let location: Location = [("wdth".to_string(), 100.0)].into_iter().collect();
        assert!(args.validate_location(&location).is_err());
        assert!(args.validate().is_err());

        let args = CliArgs {
            new_config: true,
            ..Default::default()
        };
        assert!(args.validate().is_ok());
    }
}
