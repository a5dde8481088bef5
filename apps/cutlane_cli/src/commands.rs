use anyhow::{anyhow, bail, Context, Result};
use cutlane_core::settings::{preset_by_name, EditorSettings};
use cutlane_core::{Clip, ClipId, Project, Sequence, TimeMs};
use cutlane_preview::{run_until_finished, MpvEngine, Player, PreviewError};
use cutlane_view::TimelineView;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load(path: &Path) -> Result<Project> {
    Project::load_from_file(path).with_context(|| format!("failed to open project {}", path.display()))
}

fn save(project: &Project, path: &Path) -> Result<PathBuf> {
    let written = project
        .save_to_file(path)
        .with_context(|| format!("failed to save project {}", path.display()))?;
    tracing::info!(path = %written.display(), "project saved");
    Ok(written)
}

/// Accept a full clip id or a unique prefix of one.
pub fn resolve_clip(sequence: &Sequence, query: &str) -> Result<ClipId> {
    if let Ok(id) = ClipId::parse_str(query) {
        return Ok(id);
    }
    let query = query.to_ascii_lowercase();
    let mut matches = sequence.clips().filter(|c| c.id.to_string().starts_with(&query));
    match (matches.next(), matches.next()) {
        (Some(clip), None) => Ok(clip.id),
        (None, _) => bail!("no clip matches '{query}'"),
        (Some(_), Some(_)) => bail!("'{query}' matches more than one clip"),
    }
}

/// End of the last clip on a track, where an appended clip goes by default.
pub fn track_end(sequence: &Sequence, track: usize) -> TimeMs {
    sequence
        .tracks
        .get(track)
        .and_then(|t| t.clips.iter().map(Clip::timeline_end).max())
        .unwrap_or(TimeMs::ZERO)
}

fn short_id(id: ClipId) -> String {
    id.to_string()[..8].to_string()
}

/// Quote an argument for display in a shell.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ---------------------------------------------------------------------------
// File menu
// ---------------------------------------------------------------------------

pub fn new_project(path: &Path, name: &str) -> Result<PathBuf> {
    let written = save(&Project::new(name), path)?;
    println!("created {}", written.display());
    Ok(written)
}

pub fn describe(project: &Project, settings: &EditorSettings) -> String {
    let seq = &project.sequence;
    let total = seq.total_duration(settings.playback.min_sequence_duration());
    let mut out = format!("{}  ({} clips, {})\n", seq.name, seq.clip_count(), total);
    for track in &seq.tracks {
        out.push_str(&format!("{}\n", track.name));
        for clip in &track.clips {
            let out_point = clip.out_ms.map_or_else(|| "end".to_string(), |t| t.clock());
            out.push_str(&format!(
                "  {}  {:<24} at {}  [{} - {}]\n",
                short_id(clip.id),
                clip.display_name(),
                clip.start_ms_on_timeline.clock(),
                clip.in_ms.clock(),
                out_point,
            ));
        }
    }
    if !project.media_paths.is_empty() {
        out.push_str(&format!("media: {}\n", project.media_paths.len()));
    }
    out
}

pub fn scene_json(project: &Project, settings: &EditorSettings, playhead: Option<i64>) -> Result<String> {
    let mut view = TimelineView::new(&settings.view);
    view.redraw_all(&project.sequence);
    if let Some(ms) = playhead {
        view.set_playhead(TimeMs(ms));
    }
    Ok(serde_json::to_string_pretty(&view.scene())?)
}

pub fn show(path: &Path, settings: &EditorSettings, scene: bool, playhead: Option<i64>) -> Result<()> {
    let project = load(path)?;
    if scene {
        println!("{}", scene_json(&project, settings, playhead)?);
    } else {
        print!("{}", describe(&project, settings));
    }
    Ok(())
}

pub fn import(path: &Path, media: &[PathBuf]) -> Result<()> {
    let mut project = load(path)?;
    for m in media {
        if project.import_media(m.clone()) {
            println!("imported {}", m.display());
        } else {
            println!("already imported {}", m.display());
        }
    }
    save(&project, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

pub struct AddOptions {
    pub track: usize,
    pub start: Option<i64>,
    pub in_ms: i64,
    pub out_ms: Option<i64>,
    pub source_duration: Option<TimeMs>,
}

/// Place a clip and record it in the media bin. Returns the new clip's id.
pub fn add_clip(project: &mut Project, media: &Path, opts: &AddOptions) -> Result<ClipId> {
    let start = opts
        .start
        .map(TimeMs)
        .unwrap_or_else(|| track_end(&project.sequence, opts.track));
    let mut clip = Clip::new(media, start);
    clip.in_ms = TimeMs(opts.in_ms);
    clip.out_ms = opts.out_ms.map(TimeMs);
    clip.source_duration_ms = opts.source_duration;
    let id = project.sequence.append_clip(opts.track, clip)?;
    project.import_media(media);
    Ok(id)
}

pub fn add(path: &Path, media: &Path, mut opts: AddOptions, probe: bool, settings: &EditorSettings) -> Result<()> {
    let mut project = load(path)?;
    if probe {
        let info = cutlane_render::probe_media(&settings.export.probe, media)
            .with_context(|| format!("failed to probe {}", media.display()))?;
        opts.source_duration = info.duration;
    }
    let id = add_clip(&mut project, media, &opts)?;
    save(&project, path)?;
    println!("added {} ({})", short_id(id), media.display());
    Ok(())
}

pub fn remove(path: &Path, query: &str) -> Result<()> {
    let mut project = load(path)?;
    let id = resolve_clip(&project.sequence, query)?;
    project.sequence.remove_clip(id)?;
    save(&project, path)?;
    println!("removed {}", short_id(id));
    Ok(())
}

pub fn reorder_clips(project: &mut Project, track: usize, queries: &[String], pack: bool) -> Result<Vec<ClipId>> {
    let ids = queries
        .iter()
        .map(|q| resolve_clip(&project.sequence, q))
        .collect::<Result<Vec<_>>>()?;
    project.sequence.reorder_track(track, &ids)?;
    if pack {
        project.sequence.pack_track(track)?;
    }
    Ok(project.sequence.track_order(track)?)
}

pub fn reorder(path: &Path, track: usize, queries: &[String], pack: bool) -> Result<()> {
    let mut project = load(path)?;
    let order = reorder_clips(&mut project, track, queries, pack)?;
    save(&project, path)?;
    let names: Vec<String> = order.into_iter().map(short_id).collect();
    println!("track {track}: {}", names.join(" "));
    Ok(())
}

pub fn move_clip(path: &Path, query: &str, start: i64, track: Option<usize>) -> Result<()> {
    let mut project = load(path)?;
    let id = resolve_clip(&project.sequence, query)?;
    let current_track = project.sequence.find_clip(id)?.track_index;
    let track = track.unwrap_or(current_track);
    project.sequence.move_clip(id, TimeMs(start), track)?;
    save(&project, path)?;
    println!("moved {} to track {track} at {}", short_id(id), TimeMs(start).clock());
    Ok(())
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub async fn export(
    path: &Path,
    output: &Path,
    dry_run: bool,
    preset: Option<&str>,
    settings: &EditorSettings,
) -> Result<()> {
    let project = load(path)?;
    let mut export_settings = settings.export.clone();
    if let Some(name) = preset {
        let p = preset_by_name(name).ok_or_else(|| anyhow!("unknown preset '{name}'"))?;
        export_settings.width = p.width;
        export_settings.height = p.height;
        export_settings.fps = p.fps;
    }

    let plan = cutlane_render::compile(&project.sequence, &export_settings, output)?;
    if dry_run {
        let mut line = vec![shell_quote(&plan.encoder)];
        line.extend(cutlane_render::build_encoder_args(&plan).iter().map(|a| shell_quote(a)));
        println!("{}", line.join(" "));
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::watch::channel(cutlane_render::ExportProgress::default());
    let reporter = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let p = rx.borrow_and_update().clone();
            let eta = p.eta.map(|t| format!(" eta {}", t.clock())).unwrap_or_default();
            eprint!("\r{:5.1}% {}{eta}   ", p.percent, p.time.clock());
        }
        eprintln!();
    });
    let result = cutlane_render::execute(&plan, &export_settings, tx, plan.total).await;
    let _ = reporter.await;
    result.with_context(|| format!("export to {} failed", output.display()))?;
    println!("exported {}", output.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

pub struct PlayOptions {
    pub from: Option<String>,
    pub preview: Option<String>,
    pub at: i64,
    pub mpv: String,
}

pub async fn play(path: &Path, opts: PlayOptions, settings: &EditorSettings) -> Result<()> {
    let project = load(path)?;
    let seq = &project.sequence;

    let engine = MpvEngine::spawn(&opts.mpv)?;
    let mut player = Player::new(engine, &settings.playback, &settings.view);
    player.view_mut().redraw_all(seq);
    player.scrub(TimeMs(opts.at));

    let started = if let Some(q) = &opts.preview {
        let id = resolve_clip(seq, q)?;
        player.preview_clip(seq.find_clip(id)?)
    } else if let Some(q) = &opts.from {
        let id = resolve_clip(seq, q)?;
        player.play_from_clip(seq, id)
    } else {
        player.play(seq)
    };
    match started {
        Err(PreviewError::EmptyQueue) => {
            println!("Timeline is empty: add clips first.");
            return Ok(());
        }
        other => other?,
    }

    let tick = Duration::from_millis(settings.playback.tick_interval_ms.max(1));
    let outcome = tokio::select! {
        r = run_until_finished(&mut player, tick) => Some(r),
        _ = tokio::signal::ctrl_c() => None,
    };
    match outcome {
        Some(Ok(state)) => {
            tracing::info!(?state, "playback finished");
            println!("{}", player.transport().label());
        }
        Some(Err(e)) if e.is_recoverable() => println!("{e}"),
        Some(Err(e)) => return Err(e.into()),
        None => {
            player.stop()?;
            println!("stopped at {}", player.controller().playhead().clock());
        }
    }
    Ok(())
}
