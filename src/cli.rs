// cli.rs - Command-line interface configuration
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "catwalk")]
#[command(about = "First-person shadow-mapped scene demo", long_about = None)]
pub struct Cli {
    /// Scene layout to load: cat-ring, field, or debug
    #[arg(long, default_value = "cat-ring")]
    pub scene: String,

    /// Window width in pixels
    #[arg(long, default_value_t = crate::settings::DEFAULT_WINDOW_WIDTH)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = crate::settings::DEFAULT_WINDOW_HEIGHT)]
    pub height: u32,

    /// Frame rate cap
    #[arg(long = "fps", default_value_t = crate::settings::DEFAULT_FPS_TARGET)]
    pub fps_target: u32,

    /// glTF file for the cat model; a placeholder mesh is used when absent
    #[arg(long)]
    pub cat_model: Option<std::path::PathBuf>,

    /// Start with per-object axis gizmos enabled
    #[arg(long, default_value = "false")]
    pub debug_axes: bool,

    /// Start in the free-flying camera instead of the player controller
    #[arg(long = "free-camera", default_value = "false")]
    pub free_camera: bool,

    /// Print the selected scene as JSON and exit
    #[arg(long = "dump-scene", default_value = "false")]
    pub dump_scene: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cli = Cli::parse_from(["catwalk"]);
        assert_eq!(cli.scene, "cat-ring");
        assert_eq!(cli.width, 1600);
        assert_eq!(cli.fps_target, 60);
        assert!(!cli.debug_axes);
        assert!(cli.cat_model.is_none());
    }

    #[test]
    fn overrides_parse() {
        let cli = Cli::parse_from([
            "catwalk",
            "--scene",
            "field",
            "--fps",
            "144",
            "--free-camera",
        ]);
        assert_eq!(cli.scene, "field");
        assert_eq!(cli.fps_target, 144);
        assert!(cli.free_camera);
    }
}
