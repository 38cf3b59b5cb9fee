// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{run_server, SceneRouter};
use crate::exec::{BuildWorker, CommandCompiler, CompileSettings};
use crate::types::SceneId;
use crate::watch::NotifyChangeNotifier;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the command compiler and single-flight build worker
/// - the scene router with a `notify`-backed change notifier
/// - the HTTP server (or a one-shot build with `--once`)
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(&args.config)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let compiler = Arc::new(CommandCompiler::new(cfg.compiler.cmd.clone()));
    let worker = BuildWorker::new(compiler, CompileSettings::from_config(&cfg));

    if let Some(name) = args.once.as_deref() {
        let scene = SceneId::parse(name, &cfg.scenes.shared)?;
        info!(scene = %scene, "building once");
        let artifact = worker.run(&scene).await?;
        print!("{}", artifact.content);
        return Ok(());
    }

    let notifier = Arc::new(NotifyChangeNotifier::new());
    let router = Arc::new(SceneRouter::from_config(&cfg, worker, notifier));
    run_server(&cfg.server, router).await?;
    Ok(())
}

/// Print the effective configuration without serving anything.
fn print_dry_run(cfg: &ConfigFile) {
    println!("scenewatch dry-run");
    println!("  server: http://{}:{}", cfg.server.host, cfg.server.port);
    println!("  static_dir: {}", cfg.server.static_dir.display());
    println!();

    println!("scenes:");
    println!("  root: {}", cfg.scenes.root.display());
    println!("  shared: {} ({})", cfg.scenes.shared, cfg.shared_dir().display());
    println!("  entry_point: {}", cfg.scenes.entry_point);
    println!();

    println!("compiler:");
    println!("  cmd: {}", cfg.compiler.cmd);
    println!("  minify: {}", cfg.compiler.minify);
    println!();

    let timings = cfg.watch.timings;
    println!("watch:");
    println!("  build_window: {:?}", timings.build_window);
    println!("  expiry: {:?}", timings.expiry);
    println!("  compile_delay: {:?}", timings.compile_delay);

    debug!("dry-run complete (nothing served)");
}
