use std::path::PathBuf;

use clap::{Parser, Subcommand};
use floatlines_core::{LinesConfig, Preset};
use floatlines_platform::{Color, ContainerSize, HostEvent, Result};
use floatlines_raster::HeadlessHost;
use floatlines_ui::{run_viewer, ViewerOptions};
use glam::Vec2;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Animated glowing wave lines.
#[derive(Parser, Debug)]
#[command(name = "floatlines", version, about)]
struct Cli {
    /// TOML or JSON config file.
    #[arg(long, short, env = "FLOATLINES_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in palette, used when no config file is given.
    #[arg(long, short)]
    preset: Option<Preset>,

    /// Fix the random wave parameters.
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an interactive window (default).
    View {
        #[arg(long, default_value = "#0b0b12")]
        background: Color,
    },
    /// Render frames offscreen and write the last one as a PNG.
    Render {
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long, default_value_t = 60)]
        frames: u32,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        /// Pace rendering at this rate instead of as fast as possible.
        #[arg(long)]
        fps: Option<u32>,
        /// Pointer position inside the surface, as `X,Y`.
        #[arg(long, value_parser = parse_point)]
        pointer: Option<Vec2>,
        /// Flatten onto this color instead of keeping transparency.
        #[arg(long)]
        background: Option<Color>,
    },
}

fn parse_point(input: &str) -> std::result::Result<Vec2, String> {
    let (x, y) = input
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{input}`"))?;
    let coord = |value: &str| {
        value
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate `{value}`: {e}"))
    };
    Ok(Vec2::new(coord(x)?, coord(y)?))
}

fn load_config(cli: &Cli) -> Result<LinesConfig> {
    let mut config = match (&cli.config, cli.preset) {
        (Some(path), preset) => {
            if preset.is_some() {
                warn!("--preset ignored because --config was given");
            }
            LinesConfig::load(path)?
        }
        (None, Some(preset)) => preset.config(),
        (None, None) => LinesConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let command = cli.command.unwrap_or(Command::View {
        background: ViewerOptions::default().background,
    });
    match command {
        Command::View { background } => run_viewer(
            config,
            ViewerOptions {
                background,
                ..ViewerOptions::default()
            },
        ),
        Command::Render {
            out,
            frames,
            width,
            height,
            fps,
            pointer,
            background,
        } => {
            let size = ContainerSize::new(width as f32, height as f32);
            let mut host = HeadlessHost::new(config, size)?;
            if let Some(position) = pointer {
                let delivered = host.dispatch(HostEvent::PointerMove {
                    client: position,
                    surface_origin: Vec2::ZERO,
                });
                if !delivered {
                    warn!("--pointer ignored: interaction is disabled in this config");
                }
            }
            let drawn = host.run(frames, fps)?;
            host.canvas().save_png(&out, background)?;
            info!("wrote {} after {} frames", out.display(), drawn);
            host.unmount();
            Ok(())
        }
    }
}

fn main() {
    // Init logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("FloatingLines starting");
    if let Err(e) = run(Cli::parse()) {
        eprintln!("floatlines error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("120, 45.5").unwrap(), Vec2::new(120.0, 45.5));
        assert!(parse_point("120").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn cli_defaults_to_viewer_and_reads_render_flags() {
        let cli = Cli::try_parse_from(["floatlines"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "floatlines",
            "--preset",
            "ember",
            "--seed",
            "5",
            "render",
            "--out",
            "frame.png",
            "--pointer",
            "10,20",
            "--background",
            "#000000",
        ])
        .unwrap();
        assert_eq!(cli.preset, Some(Preset::Ember));
        match cli.command {
            Some(Command::Render {
                frames,
                pointer,
                background,
                ..
            }) => {
                assert_eq!(frames, 60);
                assert_eq!(pointer, Some(Vec2::new(10.0, 20.0)));
                assert_eq!(background, Some(Color::BLACK));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn seed_flag_overrides_config() {
        let cli = Cli::try_parse_from(["floatlines", "--preset", "aurora", "--seed", "11"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.lines_gradient, Preset::Aurora.config().lines_gradient);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(Cli::try_parse_from(["floatlines", "--preset", "neon"]).is_err());
    }
}
