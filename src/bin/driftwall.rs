use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use time::{OffsetDateTime, PrimitiveDateTime};

use driftwall::{RefreshLoop, Surface, Timeline, schedule};

#[derive(Parser, Debug)]
#[command(name = "driftwall", version)]
struct Cli {
    /// Schedule XML, or a single still image (.png/.jpg/.jpeg).
    input: PathBuf,

    /// Surface size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_size)]
    size: (u32, u32),

    /// Seconds between schedule re-polls.
    #[arg(long, default_value_t = 300)]
    interval: u64,

    /// Write each composited frame to this PNG path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the parsed schedule as JSON to stderr and exit.
    #[arg(long)]
    dump_schedule: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let single_still = schedule::is_single_image_path(&cli.input);
    let timeline = if single_still {
        Timeline::single_image(&cli.input)
    } else {
        Timeline::load(&cli.input)
            .with_context(|| format!("load schedule '{}'", cli.input.display()))?
    };

    if cli.dump_schedule {
        eprintln!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    let (width, height) = cli.size;
    let mut surface = Surface::new(width, height);
    let mut refresh = RefreshLoop::new(timeline, 3, now_local());

    loop {
        let rendered = refresh.tick(now_local(), &mut surface)?;
        if rendered {
            present(&surface, cli.out.as_deref())?;
        } else if single_still {
            // A bare image that fails to decode has nothing to fall back to.
            anyhow::bail!("failed to render image '{}'", cli.input.display());
        }

        if single_still {
            // One static frame, no recurring timer needed.
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(cli.interval.max(1)));
    }
}

fn present(surface: &Surface, out: Option<&std::path::Path>) -> anyhow::Result<()> {
    let Some(out) = out else {
        tracing::debug!("frame composited, no --out target");
        return Ok(());
    };

    image::save_buffer_with_format(
        out,
        &surface.rgba8,
        surface.width,
        surface.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write frame '{}'", out.display()))?;
    tracing::info!(path = %out.display(), "frame written");
    Ok(())
}

fn now_local() -> PrimitiveDateTime {
    // The anchor is a naive local timestamp; compare against the naive local
    // clock. Falling back to UTC beats refusing to start when the offset
    // cannot be determined.
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| {
        tracing::warn!("local UTC offset unavailable, using UTC");
        OffsetDateTime::now_utc()
    });
    PrimitiveDateTime::new(now.date(), now.time())
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.parse::<u32>().map_err(|_| format!("bad width '{w}'"))?;
    let h = h.parse::<u32>().map_err(|_| format!("bad height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err("surface size must be non-zero".to_string());
    }
    Ok((w, h))
}
