use std::sync::Arc;

use clap::Parser;
use speakpal_appcore::service::PracticeService;
use speakpal_platform::host::{EnvHost, start_host};
use speakpal_platform::terminal::TerminalView;
use speakpal_runtime::config_store::ConfigStore;
use speakpal_runtime::defaults::{apply_api_base_override, apply_env_overrides, default_config_path};

mod cli;
mod logging;
mod repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging(args.verbose);

    let participant = start_host(&EnvHost::from_env());

    let store = ConfigStore::at_path(args.config.clone().unwrap_or_else(default_config_path));
    let mut cfg = store.load_or_default()?;
    apply_env_overrides(&mut cfg);
    apply_api_base_override(&mut cfg, args.api_base.as_deref());
    if args.save_config {
        store.save(&cfg)?;
        log::info!("config saved to {}", store.path().display());
    }

    let view = Arc::new(TerminalView::stdout());
    let svc = PracticeService::from_config(&cfg, view, participant)?;

    repl::run(
        &svc,
        repl::Presets {
            gender: args.gender,
            level: args.level,
        },
    )
    .await
}
