//! # Auto-Refresh Controller
//!
//! Owns the repeating refresh timer and the on/off toggle. The timer is a
//! spawned task; starting a timer always cancels the previous one first, so
//! repeated or redundant toggles never leave two timers running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::notifier::{NotificationKind, Notifier};
use crate::orchestrator::RefreshOrchestrator;

/// Default period between automatic refresh cycles.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(10);

/// Callback invoked on every timer tick.
pub type TickHandler = Arc<dyn Fn() + Send + Sync>;

/// Decrements the live-timer count when the timer task is dropped, including
/// when it is aborted before its first poll.
struct LiveTimer(Arc<AtomicUsize>);

impl LiveTimer {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct AutoRefreshController {
    enabled: bool,
    period: Duration,
    on_tick: TickHandler,
    notifier: Notifier,
    timer: Option<JoinHandle<()>>,
    live_timers: Arc<AtomicUsize>,
}

impl AutoRefreshController {
    /// Creates a stopped controller. Call `start` to arm the timer.
    pub fn new(period: Duration, enabled: bool, notifier: Notifier, on_tick: TickHandler) -> Self {
        Self {
            enabled,
            period,
            on_tick,
            notifier,
            timer: None,
            live_timers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Controller whose ticks spawn a refresh cycle each. Cycles run as their
    /// own tasks so a slow cycle never delays the next tick.
    pub fn for_orchestrator(
        orchestrator: Arc<RefreshOrchestrator>,
        period: Duration,
        enabled: bool,
        notifier: Notifier,
    ) -> Self {
        let on_tick: TickHandler = Arc::new(move || {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator.run_cycle().await;
            });
        });
        Self::new(period, enabled, notifier, on_tick)
    }

    /// Startup hook: arms the timer when auto-refresh is enabled.
    pub fn start(&mut self) {
        if self.enabled {
            self.start_timer();
        }
    }

    /// Turns auto-refresh on or off and notifies the user. Each call acts
    /// unconditionally; turning on while already on restarts the timer.
    pub fn toggle(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.start_timer();
            self.notifier.notify("Auto-refresh enabled", NotificationKind::Info);
        } else {
            self.cancel_timer();
            self.notifier.notify("Auto-refresh disabled", NotificationKind::Info);
        }
    }

    /// Cancels the timer without changing the enabled flag or notifying.
    pub fn stop(&mut self) {
        self.cancel_timer();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True while a timer handle is held.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Number of timer tasks that have not been dropped yet.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    fn start_timer(&mut self) {
        self.cancel_timer();

        let period = self.period;
        let on_tick = Arc::clone(&self.on_tick);
        let guard = LiveTimer::acquire(&self.live_timers);
        let first_tick = Instant::now() + period;

        self.timer = Some(tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                log::debug!("auto-refresh tick");
                on_tick();
            }
        }));
        log::info!("auto-refresh timer started, period {:?}", period);
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
            log::info!("auto-refresh timer cancelled");
        }
    }
}

impl Drop for AutoRefreshController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_controller(enabled: bool) -> (AutoRefreshController, Arc<AtomicUsize>, Notifier) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let notifier = Notifier::new();
        let controller = AutoRefreshController::new(
            Duration::from_secs(10),
            enabled,
            notifier.clone(),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (controller, ticks, notifier)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_controller_ticks_every_period_after_the_first() {
        let (mut controller, ticks, _) = counting_controller(true);
        controller.start();
        assert!(controller.is_running());

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_controller_does_not_start() {
        let (mut controller, ticks, _) = counting_controller(false);
        controller.start();
        assert!(!controller.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert_eq!(controller.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_off_cancels_and_notifies() {
        let (mut controller, ticks, notifier) = counting_controller(true);
        controller.start();
        controller.toggle(false);
        settle().await;

        assert!(!controller.is_enabled());
        assert_eq!(controller.live_timers(), 0);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.active().len(), 0, "toast expired by now");
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_messages() {
        let (mut controller, _, notifier) = counting_controller(true);
        controller.toggle(false);
        controller.toggle(true);
        let messages: Vec<String> = notifier.active().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["Auto-refresh disabled", "Auto-refresh enabled"]);
    }

    #[tokio::test(start_paused = true)]
    async fn off_then_on_leaves_exactly_one_timer() {
        let (mut controller, ticks, _) = counting_controller(true);
        controller.start();
        settle().await;
        assert_eq!(controller.live_timers(), 1);

        controller.toggle(false);
        controller.toggle(true);
        settle().await;
        assert_eq!(controller.live_timers(), 1);

        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redundant_enable_cancels_previous_timer_first() {
        let (mut controller, ticks, _) = counting_controller(true);
        controller.start();
        controller.toggle(true);
        controller.toggle(true);
        settle().await;
        assert_eq!(controller.live_timers(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_controller_cancels_the_timer() {
        let (mut controller, ticks, _) = counting_controller(true);
        controller.start();
        let live = Arc::clone(&controller.live_timers);
        drop(controller);
        settle().await;

        assert_eq!(live.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
