// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::core::FailurePolicy;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "text-rpg")]
#[command(about = "Direct3D 11 text adventure", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial client width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Initial client height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// How failed present/map/GDI calls are treated
    #[arg(long, value_enum)]
    pub failure_policy: Option<FailurePolicy>,

    /// Create the device with the debug layer
    #[arg(long = "debug-layer", default_value = "false")]
    pub debug_layer: bool,

    /// Delimiter-separated dialogue file
    #[arg(long)]
    pub contents: Option<PathBuf>,

    /// Seed for random block selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory holding quad_vs.cso and quad_ps.cso
    #[arg(long = "shader-dir")]
    pub shader_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["text-rpg"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.debug_layer);
        assert_eq!(cli.failure_policy, None);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "text-rpg",
            "--width",
            "1024",
            "--height",
            "768",
            "--failure-policy",
            "lenient",
            "--debug-layer",
            "--seed",
            "42",
            "--shader-dir",
            "build/shaders",
        ])
        .unwrap();

        assert_eq!(cli.width, Some(1024));
        assert_eq!(cli.height, Some(768));
        assert_eq!(cli.failure_policy, Some(FailurePolicy::Lenient));
        assert!(cli.debug_layer);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.shader_dir, Some(PathBuf::from("build/shaders")));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["text-rpg", "--failure-policy", "silent"]).is_err());
    }
}
