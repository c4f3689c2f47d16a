use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::core::FailurePolicy;
use crate::types::{Extent, FontDesc, Rgb};

/// Everything the host needs to open a window and run the game
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    pub window: Extent,
    pub failure_policy: FailurePolicy,
    pub debug_layer: bool,
    pub font: FontDesc,
    pub dialogue: DialogueStyle,
    pub contents: Option<PathBuf>,
    pub delimiter: char,
    pub seed: Option<u64>,
    pub shader_dir: Option<PathBuf>,
}

/// Look of the dialogue box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueStyle {
    /// Text rectangle, centred on the box
    pub text_box: Extent,
    pub text_color: Rgb,
    /// Panel drawn behind the text, BGRA
    pub panel_bgra: [u8; 4],
    /// Distance of the box centre from the bottom of the client area
    pub bottom_margin: u32,
}

impl Default for DialogueStyle {
    fn default() -> Self {
        Self {
            text_box: Extent::new(640, 120),
            text_color: Rgb::WHITE,
            panel_bgra: [64, 32, 32, 192],
            bottom_margin: 100,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Text RPG".to_string(),
            window: Extent::new(800, 600),
            failure_policy: FailurePolicy::default(),
            debug_layer: false,
            font: FontDesc::default(),
            dialogue: DialogueStyle::default(),
            contents: None,
            delimiter: ',',
            seed: None,
            shader_dir: None,
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&text).context(format!("Failed to parse config file: {:?}", path))
    }

    /// File values (or defaults) with command-line flags applied on top
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.window.width = width;
        }
        if let Some(height) = cli.height {
            self.window.height = height;
        }
        if let Some(policy) = cli.failure_policy {
            self.failure_policy = policy;
        }
        if cli.debug_layer {
            self.debug_layer = true;
        }
        if let Some(contents) = &cli.contents {
            self.contents = Some(contents.clone());
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(dir) = &cli.shader_dir {
            self.shader_dir = Some(dir.clone());
        }
    }
}
