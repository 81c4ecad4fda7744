//! SiteWrap stub - the packaged desktop app
//!
//! The website configuration is appended to this executable. A launch either
//! becomes the window (primary) or wakes the running one and exits.

#![windows_subsystem = "windows"]

use sitewrap::config::{self, ConfigError};
use sitewrap::handoff::{hand_off, plan_launch, should_probe_lock, LaunchPlan};
use sitewrap::identity::AppIdentity;
use sitewrap::launch::LaunchArgs;
use sitewrap::locator::WindowLocator;
use sitewrap::logging::init_logging;
use sitewrap::relay::NotificationRelay;
use sitewrap::singleton;

fn report_error(message: &str) {
    tracing::error!("{}", message);
    #[cfg(windows)]
    sitewrap::app::show_error("SiteWrap", message);
    #[cfg(not(windows))]
    eprintln!("{}", message);
}

fn config_error_message(e: &ConfigError) -> String {
    match e {
        ConfigError::MarkerMissing => {
            "This executable has no website configuration. Build it with the SiteWrap packager.".to_string()
        }
        other => format!("Failed to load configuration: {}", other),
    }
}

fn main() {
    init_logging();
    tracing::info!("SiteWrap stub starting (v{})", env!("CARGO_PKG_VERSION"));

    let args = LaunchArgs::from_env();

    let config = match config::read_embedded_config() {
        Ok(config) => config,
        Err(e) => {
            report_error(&config_error_message(&e));
            std::process::exit(1);
        }
    };

    let identity = AppIdentity::from_title(&config.title);

    let role = if should_probe_lock(&args, &config) {
        singleton::acquire(&identity)
    } else {
        singleton::untracked()
    };
    tracing::debug!("Instance role: {:?}", role);

    let plan = plan_launch(&args, &config, role.is_primary());
    if let LaunchPlan::HandOff { .. } = plan {
        let relay = NotificationRelay::new(&identity);
        hand_off(&plan, &relay, &WindowLocator, identity.title());
        tracing::info!("Handed off to running instance, exiting");
        return;
    }

    if let Err(e) = run(config, plan, role) {
        report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run(config: config::AppConfig, plan: LaunchPlan, role: singleton::InstanceRole) -> anyhow::Result<()> {
    sitewrap::app::run(config, plan, role)
}

#[cfg(not(windows))]
fn run(config: config::AppConfig, _plan: LaunchPlan, _role: singleton::InstanceRole) -> anyhow::Result<()> {
    anyhow::bail!("\"{}\" needs a Windows desktop to run", config.title)
}
