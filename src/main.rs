use std::fs;

use anyhow::Context;
use log::info;

use mandelbrot_zoom::{backend, render, BmpSink, RenderConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = RenderConfig::from_env()?;
    config.validate()?;

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;
    render::remove_stale_frames(&config.output_dir, config.stale_frame_bound);

    let mut backend = backend::create(config.backend, config.size, &config.kernel)?;
    let summary = render::run(
        &config,
        backend.as_mut(),
        BmpSink::new(&config.output_dir),
    )?;
    drop(backend);

    info!(
        "{} frames in {}",
        summary.frames_written,
        config.output_dir.display()
    );
    Ok(())
}
