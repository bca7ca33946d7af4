//! Entry point for the **tiletoggle** command.
//!
//! Parses one command, wires the configured window manager to the state
//! database and hands the command to the [`Dispatcher`].

use clap::Parser;
use log::{debug, error, info};
use tiletoggle::command::Command;
use tiletoggle::config::{config_dir, Config};
use tiletoggle::dispatcher::Dispatcher;
use tiletoggle::state::SqliteStore;
use tiletoggle::wm::Adapter;

/// Show, hide and focus named windows in bspwm or i3.
#[derive(Parser, Debug)]
#[command(name = "tiletoggle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// focus (f), application (a), clean (c), hide (h), hide-latest (hl),
    /// hide-all (ha), show-all (s) or reset (r).
    #[arg(short, long)]
    mode: String,

    /// Name of the window to act on.
    #[arg(short, long)]
    name: Option<String>,

    /// Comma-separated options, e.g. `switch_to,top_padding=40,mods=sticky`.
    #[arg(short, long)]
    options: Option<String>,

    /// Log every step to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Try to load the config from `$XDG_CONFIG_HOME/tiletoggle/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let cmd = match Command::parse(&cli.mode, cli.name.as_deref(), cli.options.as_deref()) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("tiletoggle: {e}");
            std::process::exit(1);
        }
    };

    let config = load_config();
    let wm = Adapter::new(&config);
    debug!("using {}", wm.kind());

    let store_path = config.store_path();
    let store = match SqliteStore::open(&store_path) {
        Ok(store) => store,
        Err(e) => {
            error!("cannot open {}: {}", store_path.display(), e);
            eprintln!("tiletoggle: cannot open state at {}: {e}", store_path.display());
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(store, wm);
    if let Err(e) = dispatcher.handle(&cmd) {
        error!("{} failed: {}", cmd.mode, e);
        eprintln!("tiletoggle: {e}");
        std::process::exit(1);
    }
}
