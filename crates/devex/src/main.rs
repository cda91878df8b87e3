mod cli;
mod console;

use clap::Parser;

use devex_core::kernel::bootstrap::{AppOptions, Application};
use devex_core::wizard::install::run_install;

use crate::cli::{CacheAction, Cli, Command, PluginAction};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    std::process::exit(run(args).await);
}

async fn run(args: Cli) -> i32 {
    let options = AppOptions {
        registry_url: args.registry_url.clone(),
        verify_signatures: args.verify_signatures,
        ..Default::default()
    };
    let mut app = match Application::new(options) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Failed to initialize application: {}", err);
            return 1;
        }
    };
    if let Err(err) = app.startup().await {
        eprintln!("Application startup failed: {}", err);
        return 1;
    }

    let non_interactive = args.non_interactive || cli::non_interactive_detected();
    let code = match args.command.unwrap_or(Command::Setup) {
        Command::Setup => run_setup(&app, non_interactive, args.dry_run).await,
        Command::Plugins { action } => run_plugins(&app, action).await,
        Command::Cache { action } => run_cache(&app, action),
    };

    if let Err(err) = app.shutdown().await {
        log::warn!("Shutdown reported an error: {}", err);
    }
    code
}

async fn run_setup(app: &Application, non_interactive: bool, dry_run: bool) -> i32 {
    let mut session = match app.prepare_setup(dry_run).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Setup preparation failed: {}", err);
            return 1;
        }
    };

    if session.status.report.aborted {
        eprintln!(
            "Critical plugin validation failed ({} failure(s)); aborting.",
            session.status.report.critical_failures
        );
        return 1;
    }

    if non_interactive {
        if let Some(banner) = session.model.banner() {
            println!("{}", banner);
        }
        let defaults = app.settings().defaults.clone();
        if let Err(err) = session.model.apply_default_selections(&defaults) {
            eprintln!("Could not apply default selections: {}", err);
            return 1;
        }
    } else {
        match console::run_interactive(&mut session.model) {
            Ok(true) => {}
            Ok(false) => {
                println!("Setup cancelled.");
                return 0;
            }
            Err(err) => {
                eprintln!("Wizard failed: {}", err);
                return 1;
            }
        }
    }

    let summary = match run_install(&mut session.model, &session.actions).await {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("Installation phase failed: {}", err);
            return 1;
        }
    };

    println!(
        "Setup complete: {} apps attempted, {} succeeded, {} failed.",
        summary.attempted, summary.succeeded, summary.failed
    );
    let metrics = app.plugin_manager().cache_metrics();
    log::debug!(
        "Registry cache: {} hits, {} misses, {} evictions",
        metrics.hits,
        metrics.misses,
        metrics.evictions
    );
    let errors = session.model.errors().snapshot();
    if !errors.is_empty() {
        println!("Reported problems:");
        for error in errors {
            println!("  - {}", error);
        }
    }
    // Partial install failures still exit 0; they were reported above.
    0
}

async fn run_plugins(app: &Application, action: PluginAction) -> i32 {
    let manager = app.plugin_manager();
    match action {
        PluginAction::List => {
            let plugins = manager.executables().list_plugins().await;
            if plugins.is_empty() {
                println!("No plugins installed.");
                return 0;
            }
            let mut names: Vec<_> = plugins.keys().cloned().collect();
            names.sort();
            for name in names {
                let info = &plugins[&name];
                if info.description.is_empty() {
                    println!("{}  {}", name, info.version);
                } else {
                    println!("{}  {}  {}", name, info.version, info.description);
                }
            }
            0
        }
        PluginAction::Install { name } => match manager.downloader().download_plugin(&name).await {
            Ok(path) => {
                println!("Installed {} to {}", name, path.display());
                0
            }
            Err(err) => {
                eprintln!("Install failed: {}", err);
                1
            }
        },
        PluginAction::Remove { name } => match manager.executables().remove_plugin(&name) {
            Ok(()) => {
                println!("Removed {}", name);
                0
            }
            Err(err) => {
                eprintln!("Remove failed: {}", err);
                1
            }
        },
        PluginAction::Update => {
            let updater = manager.updater().clone();
            updater
                .on_update(std::sync::Arc::new(|status| {
                    if status.success {
                        println!(
                            "Updated {} {} -> {}",
                            status.plugin, status.old_version, status.new_version
                        );
                    } else {
                        println!(
                            "Update of {} failed: {}",
                            status.plugin,
                            status.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }))
                .await;
            updater.run_once().await;
            0
        }
    }
}

fn run_cache(app: &Application, action: CacheAction) -> i32 {
    match action {
        CacheAction::Clear => {
            let path = devex_core::config::paths::cache_dir()
                .join(devex_core::kernel::constants::REGISTRY_CACHE_FILE);
            match std::fs::remove_file(&path) {
                Ok(()) => println!("Removed {}", path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    println!("No registry cache at {}", path.display());
                }
                Err(err) => {
                    eprintln!("Could not remove {}: {}", path.display(), err);
                    return 1;
                }
            }
            app.plugin_manager().registry().close();
            0
        }
    }
}
