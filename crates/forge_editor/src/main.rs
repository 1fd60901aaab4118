//! Forge headless editor
//!
//! Replays a session script against an in-memory scene and prints the final
//! scene as a history snapshot in JSON.
//!
//! ```text
//! forge_editor [--prefs <path>] <script.toml>
//! ```

use std::path::PathBuf;

use forge_editor::script::{run_script, SessionScript};
use forge_editor::{EditorError, EditorPreferences, EditorSession, HistorySnapshot, Result};
use forge_scene::{Scene, SceneHost};

struct Args {
    prefs: Option<PathBuf>,
    script: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut prefs = None;
    let mut script = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--prefs" => {
                let path = args
                    .next()
                    .ok_or_else(|| EditorError::Script("--prefs needs a path".into()))?;
                prefs = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => {
                log::warn!("Ignoring unknown flag {}", flag);
            }
            path => {
                if script.is_none() {
                    script = Some(PathBuf::from(path));
                }
            }
        }
    }

    let script = script
        .ok_or_else(|| EditorError::Script("usage: forge_editor [--prefs <path>] <script.toml>".into()))?;
    Ok(Args { prefs, script })
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let prefs = match &args.prefs {
        Some(path) => EditorPreferences::load(path)?,
        None => EditorPreferences::default_path()
            .map(|path| EditorPreferences::load_or_default(&path))
            .unwrap_or_default(),
    };

    let script = SessionScript::load(&args.script)?;
    let mut session = EditorSession::new(Scene::new(), prefs);
    run_script(&mut session, &script)?;

    for notice in session.notifications_mut().drain() {
        eprintln!("{}", notice);
    }

    let snapshot = HistorySnapshot::capture(session.scene(), None);
    println!("{}", snapshot.to_json()?);
    log::info!(
        "Finished with {} objects, {} history entries",
        session.scene().len(),
        session.history().len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
