mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command};
use cutlane_core::EditorSettings;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        1 => "debug".into(),
        _ => "trace".into(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> Result<EditorSettings> {
    match &args.config {
        Some(path) => EditorSettings::load_from_file(path)
            .with_context(|| format!("failed to read settings {}", path.display())),
        None => Ok(EditorSettings::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity);
    let settings = load_settings(&args)?;

    match args.command {
        Command::New { project, name } => {
            commands::new_project(&project, &name)?;
        }
        Command::Show {
            project,
            scene,
            playhead,
        } => commands::show(&project, &settings, scene, playhead)?,
        Command::Import { project, media } => commands::import(&project, &media)?,
        Command::Add {
            project,
            media,
            track,
            start,
            in_ms,
            out_ms,
            probe,
        } => {
            let opts = commands::AddOptions {
                track,
                start,
                in_ms,
                out_ms,
                source_duration: None,
            };
            commands::add(&project, &media, opts, probe, &settings)?
        }
        Command::Remove { project, clip } => commands::remove(&project, &clip)?,
        Command::Reorder {
            project,
            track,
            clips,
            pack,
        } => commands::reorder(&project, track, &clips, pack)?,
        Command::Move {
            project,
            clip,
            start,
            track,
        } => commands::move_clip(&project, &clip, start, track)?,
        Command::Export {
            project,
            output,
            dry_run,
            preset,
        } => commands::export(&project, &output, dry_run, preset.as_deref(), &settings).await?,
        Command::Play {
            project,
            from,
            preview,
            at,
            mpv,
        } => {
            let opts = commands::PlayOptions {
                from,
                preview,
                at,
                mpv,
            };
            commands::play(&project, opts, &settings).await?
        }
    }
    Ok(())
}
