//! Renders a synthetic scene through the masked sprite stage and writes the
//! last frame out as a PPM image.

mod cli;
mod scene;

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cli::CLIOptions;
use log::{debug, info};
use math::{FixedPoint, FRACUNIT};
use render_masked::{FrameLight, MaskedRenderer, RenderConfig, RenderContext, View};
use render_trait::{PixelBuffer, SoftFramebuffer, SOFT_PIXEL_CHANNELS};
use scene::Scene;
use simplelog::TermLogger;

/// Frames drawn per game tic, the in between ones are interpolated
const FRAMES_PER_TIC: u32 = 2;

fn main() -> Result<(), Box<dyn Error>> {
    let options: CLIOptions = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let config_path = match &options.config {
        Some(path) => PathBuf::from(path),
        None => RenderConfig::default_path()?,
    };
    let config = RenderConfig::load_or_create(&config_path)?;
    info!("Using render config {config_path:?}");
    debug!("{config:?}");

    let width = options.width.max(64) as i32;
    let height = options.height.max(40) as i32;
    let base_view = View::new(width, height, options.fov);
    let mut renderer = MaskedRenderer::new(config, width, height);
    let mut pixels = SoftFramebuffer::new(width as usize, height as usize);
    let mut scene = Scene::new();

    let mut total_sprites = 0;
    for frame in 0..options.frames {
        let sub_tic = frame % FRAMES_PER_TIC;
        if sub_tic == 0 {
            scene.tic(&mut renderer);
        }
        let lerp = FixedPoint::new(FRACUNIT * (sub_tic as i32 + 1) / FRAMES_PER_TIC as i32);
        let ctx = RenderContext {
            view: scene.camera(base_view),
            light: FrameLight::default(),
            lerp,
        };

        let stats = scene.render(&mut renderer, ctx, &mut pixels);
        total_sprites += stats.vissprites;
        debug!(
            "Frame {frame}: {} vissprites, {} live particles, {} segs",
            stats.vissprites, stats.particles, stats.segs
        );
    }

    info!(
        "Rendered {} frames at {width}x{height}, {total_sprites} vissprites in total, pool capacity {}",
        options.frames,
        renderer.pool().capacity()
    );

    let output = Path::new(&options.output);
    write_ppm(output, &pixels)?;
    info!("Wrote {output:?}");

    #[cfg(feature = "hprof")]
    coarse_prof::write(&mut std::io::stdout())?;
    Ok(())
}

/// Binary PPM, alpha is dropped
fn write_ppm(path: &Path, pixels: &dyn PixelBuffer) -> std::io::Result<()> {
    let size = pixels.size();
    let mut file = BufWriter::new(File::create(path)?);
    write!(file, "P6\n{} {}\n255\n", size.width(), size.height())?;
    for px in pixels.buf().chunks_exact(SOFT_PIXEL_CHANNELS) {
        file.write_all(&px[..3])?;
    }
    file.flush()
}
