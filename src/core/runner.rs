//! Application runner logic
//!
//! Loads the font, lays out the requested text and prints the result.

use crate::core::cli::CliArgs;
use crate::core::config_file::ConfigFile;
use crate::core::settings::LayoutSettings;
use crate::data::{load_ufo_sources, FontStore};
use crate::kerning::DEFAULT_KERN_TAG;
use crate::layout::{LineLayoutEngine, SceneLayout};
use crate::logging;
use crate::text::character_lines_from_string;
use crate::variation::{default_location, Location};
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

/// Run the application with the given CLI arguments.
pub async fn run_app(cli_args: CliArgs) -> Result<()> {
    if cli_args.new_config {
        ConfigFile::initialize_config_directory()?;
        return Ok(());
    }

    let config = ConfigFile::load();
    let log_filter = cli_args
        .log_filter
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .or_else(|| config.as_ref().and_then(|config| config.log_filter.clone()));
    let _log_guard = logging::init_logging(log_filter.as_deref(), cli_args.log_to_file)?;

    let settings = LayoutSettings::resolve(config.as_ref(), &cli_args);
    let mut data = load_ufo_sources(&cli_args.sources, cli_args.axes.clone())?;
    if let Some(path) = &cli_args.font_binary {
        let binary = fs::read(path)
            .with_context(|| format!("failed to read font binary {}", path.display()))?;
        data.font_binary = Some(binary.into());
    }
    let location = cli_args
        .location
        .clone()
        .unwrap_or_else(|| default_location(&data.axes));

    let store = FontStore::new(data);
    let text = cli_args.text.replace("\\n", "\n");
    let layout = layout_text(&store, &text, &location, &settings).await?;
    info!(
        "Laid out {} lines at {:?}",
        layout.lines.len(),
        location
    );
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

/// Parse, shape, kern and position text with the store's font.
pub async fn layout_text(
    store: &FontStore,
    text: &str,
    location: &Location,
    settings: &LayoutSettings,
) -> Result<SceneLayout> {
    let (lines, axes, units_per_em, mut shaper, kerning_model) = {
        let data = store.data();
        let lines = character_lines_from_string(
            text,
            &data.character_map(),
            &data.glyph_map,
            Some(settings.placeholder_glyph.as_str()),
        );
        (
            lines,
            data.axes.clone(),
            data.units_per_em,
            data.shaper()?,
            data.kerning_model(DEFAULT_KERN_TAG),
        )
    };

    let kerning = kerning_model.instantiate(location.clone());
    let layout = {
        let mut engine = LineLayoutEngine::new(
            store,
            shaper.as_mut(),
            settings,
            units_per_em,
            location.clone(),
        )
        .with_axes(&axes)
        .with_kerning(&kerning);
        engine.build_scene(&lines, None).await
    };
    shaper.close();
    layout.context("layout was cancelled")
}
