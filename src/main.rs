use std::env;
use std::fs::{self, File};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use env_logger::{Env, Target};

mod api;
mod config;
mod finder;
mod host;
mod loader;
mod render;
mod scripting;

use api::Dispatcher;
use config::Settings;
use host::{HostContext, TerminalPlatform};
use render::TerminalRenderer;
use scripting::ScriptEngine;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("plume: {err:#}");
            1
        }
    };
    process::exit(code);
}

fn run() -> Result<i32> {
    // Capture before anything can change the working directory
    let args: Vec<String> = env::args().collect();
    let settings = Settings::load().context("failed to load settings")?;
    init_logging(&settings);

    let dispatcher = api::dispatcher();
    dispatcher
        .validate()
        .context("native class table is inconsistent")?;

    TerminalRenderer::setup().context("failed to set up terminal")?;
    let result = run_scripts(args, settings, dispatcher);
    TerminalRenderer::teardown().context("failed to restore terminal")?;

    let code = result?;
    log::info!("exiting with status {code}");
    Ok(code)
}

fn run_scripts(args: Vec<String>, settings: Settings, dispatcher: Dispatcher) -> Result<i32> {
    let renderer = TerminalRenderer::stdout().context("failed to query terminal size")?;
    let platform = TerminalPlatform::new(Duration::from_millis(settings.double_click_ms));
    let host = HostContext::new(args, settings, Box::new(platform), Box::new(renderer));

    let engine = ScriptEngine::new(host, dispatcher).context("failed to bind native classes")?;
    engine.run_prelude()?;
    Ok(engine.exit_code().unwrap_or(0))
}

/// Log to a file: the terminal is owned by the renderer while we run
fn init_logging(settings: &Settings) {
    let Some(path) = settings.log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let Ok(file) = File::create(&path) else {
        return;
    };

    let env = Env::new().filter_or("PLUME_LOG", &settings.log_filter);
    let _ = env_logger::Builder::from_env(env)
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    log::debug!("logging to {}", path.display());
}
