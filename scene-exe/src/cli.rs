use argh::FromArgs;

/// Render a small synthetic scene through the masked sprite renderer
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug
    #[argh(option)]
    pub verbose: Option<log::LevelFilter>,
    /// resolution width in pixels
    #[argh(option, default = "320")]
    pub width: u32,
    /// resolution height in pixels
    #[argh(option, default = "200")]
    pub height: u32,
    /// horizontal field of view in degrees
    #[argh(option, default = "90.0")]
    pub fov: f32,
    /// path to a RON render config, the user config dir is used if not set
    #[argh(option)]
    pub config: Option<String>,
    /// where to write the last frame as a PPM image
    #[argh(option, default = "String::from(\"scene.ppm\")")]
    pub output: String,
    /// number of frames to render, two per game tic
    #[argh(option, default = "70")]
    pub frames: u32,
}
