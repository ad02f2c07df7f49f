use std::io;
use std::process::ExitCode;

use engine::{resolve_app_paths, MapLoader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::{load_session_config, CONFIG_FILE_NAME};
use session::{run_session, GameSession};

fn main() -> ExitCode {
    init_tracing();
    info!("=== Those Who Fight Startup ===");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(error = %message, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let paths = resolve_app_paths().map_err(|error| error.to_string())?;
    info!(root = %paths.root.display(), "content_root_resolved");

    let config = load_session_config(&paths.root.join(CONFIG_FILE_NAME))?;
    let loader = MapLoader::new(&paths.root);
    let mut session = GameSession::new(loader, &config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(&mut session, stdin.lock(), &mut stdout)
        .map_err(|error| format!("console io failed: {error}"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
