use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lib_common::loggers::{parse_level, setup_logging, LoggerLocalOptions};
use lib_common::retrieve::ApiClientOptions;

use agent_dashboard::auto_refresh::AutoRefreshController;
use agent_dashboard::config::{self, Settings};
use agent_dashboard::endpoints::HttpDataSource;
use agent_dashboard::notifier::Notifier;
use agent_dashboard::orchestrator::{CycleOutcome, RefreshOrchestrator};
use agent_dashboard::render::RenderEngine;
use agent_dashboard::tui::{self, events::InputEvent, ui, DashboardTerminal};

const APP_NAME: &str = "agent_dashboard";

/// Redraw rate; also bounds how long a key press waits to be handled.
const TICK_RATE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_config()?;

    let log_path = setup_logging(&LoggerLocalOptions {
        app_name: APP_NAME.to_string(),
        log_dir: settings.log_dir.clone(),
        level: parse_level(&settings.log_level),
        use_stderr: settings.once,
    })
    .context("failed to initialise logging")?;
    log::info!("Logging to {}", log_path.display());
    for warning in &settings.warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "Polling {} (auto-refresh {}, every {:?})",
        settings.base_url,
        if settings.auto_refresh { "on" } else { "off" },
        settings.refresh_interval
    );

    let source = HttpDataSource::new(
        settings.base_url.as_str(),
        ApiClientOptions {
            timeout: settings.request_timeout,
            max_retries: settings.max_retries,
            ..Default::default()
        },
    )?;
    let notifier = Notifier::new();
    let renderer = RenderEngine::new(notifier.clone());
    let orchestrator = Arc::new(RefreshOrchestrator::new(Arc::new(source), renderer));

    if settings.once {
        return run_once(&orchestrator).await;
    }
    run_dashboard(&settings, orchestrator, notifier).await
}

/// Single cycle, printed as plain text. Source failures are part of the
/// output, not an exit error.
async fn run_once(orchestrator: &RefreshOrchestrator) -> Result<()> {
    match orchestrator.run_cycle().await {
        CycleOutcome::Rendered(_) => log::info!("Refresh complete."),
        CycleOutcome::Failed(message) => log::error!("Refresh failed: {}", message),
        CycleOutcome::Superseded => log::warn!("Refresh superseded."),
    }
    print!("{}", orchestrator.renderer().view().to_text());
    Ok(())
}

async fn run_dashboard(
    settings: &Settings,
    orchestrator: Arc<RefreshOrchestrator>,
    notifier: Notifier,
) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::setup_terminal().context("failed to initialise terminal")?;

    let result = event_loop(&mut terminal, settings, orchestrator, notifier).await;

    tui::restore_terminal(&mut terminal).context("failed to restore terminal")?;
    log::info!("Shutdown complete.");
    result
}

async fn event_loop(
    terminal: &mut DashboardTerminal,
    settings: &Settings,
    orchestrator: Arc<RefreshOrchestrator>,
    notifier: Notifier,
) -> Result<()> {
    let renderer = orchestrator.renderer().clone();

    spawn_cycle(&orchestrator);
    let mut controller = AutoRefreshController::for_orchestrator(
        Arc::clone(&orchestrator),
        settings.refresh_interval,
        settings.auto_refresh,
        notifier.clone(),
    );
    controller.start();

    loop {
        let view = renderer.view();
        let toasts = notifier.active();
        let auto_refresh = controller.is_enabled();
        terminal.draw(|f| ui::draw(f, &view, &toasts, auto_refresh))?;

        match tokio::task::block_in_place(|| tui::events::poll_event(TICK_RATE)) {
            InputEvent::Quit => {
                log::info!("Quit requested, shutting down.");
                break;
            }
            InputEvent::Refresh => spawn_cycle(&orchestrator),
            InputEvent::ToggleAutoRefresh => controller.toggle(!controller.is_enabled()),
            InputEvent::Resize(_, _) | InputEvent::None => {}
        }
    }

    controller.stop();
    Ok(())
}

fn spawn_cycle(orchestrator: &Arc<RefreshOrchestrator>) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        orchestrator.run_cycle().await;
    });
}
