//! The state driver actor
//!
//! Owns the print job state and the LCDd session. Lifecycle events, progress
//! updates and timer ticks all arrive on one channel and are handled one at a
//! time, so a state change and the widget updates it causes never interleave
//! with another.

use std::time::Duration;

use futures::StreamExt;
use printlcd_config::DisplayConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, info, warn};

use super::handle::{DriverHandle, DriverMessage, DriverStatus, PrintEvent};
use super::layout::{Fields, Layout};
use super::sources::{Clock, ProgressSource, SystemClock};
use super::state::{PrintJobState, ScreenState, StatusView};
use crate::lcdproc::{LcdError, Session};

/// How often ETA and finish time are recomputed while printing
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const CHANNEL_CAPACITY: usize = 64;

/// A scheduled task feeding messages back into the driver
struct Timer {
    generation: u64,
    task: JoinHandle<()>,
}

impl Timer {
    fn cancel(self) {
        self.task.abort();
    }
}

/// A live session with the status screen built on it
struct ActiveDisplay {
    session: Session,
    layout: Layout,
}

impl ActiveDisplay {
    async fn apply(&mut self, fields: Fields, view: &StatusView) -> Result<(), LcdError> {
        self.layout.apply(&mut self.session, fields, view).await
    }
}

/// Drives the LCDd status screen from print job events
///
/// Create with [`StateDriver::new`], then [`spawn`](Self::spawn) it and talk
/// to it through the returned [`DriverHandle`].
///
/// The LCDd session is opened lazily: every update that finds no live
/// session makes exactly one connection attempt. A fresh session gets the
/// status screen rebuilt with the complete current state. A failed attempt
/// is logged and the update dropped; the next update tries again.
pub struct StateDriver<P, C = SystemClock> {
    settings: DisplayConfig,
    progress: P,
    clock: C,
    refresh_interval: Duration,
    idle_timeout: Option<Duration>,

    job: PrintJobState,
    display: Option<ActiveDisplay>,
    connect_attempts: u64,

    refresh_timer: Option<Timer>,
    idle_timer: Option<Timer>,
    last_generation: u64,

    receiver: mpsc::Receiver<DriverMessage>,
    // Weak so that dropping every handle stops the driver
    timer_sender: mpsc::WeakSender<DriverMessage>,
}

impl<P, C> StateDriver<P, C>
where
    P: ProgressSource + 'static,
    C: Clock + 'static,
{
    pub fn new(settings: DisplayConfig, progress: P, clock: C) -> (Self, DriverHandle) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

        let driver = Self {
            settings,
            progress,
            clock,
            refresh_interval: REFRESH_INTERVAL,
            idle_timeout: None,
            job: PrintJobState::default(),
            display: None,
            connect_attempts: 0,
            refresh_timer: None,
            idle_timer: None,
            last_generation: 0,
            receiver,
            timer_sender: sender.downgrade(),
        };

        (driver, DriverHandle { sender })
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Use a fixed idle timeout instead of `idle_time_minutes`
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Handle messages until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!(
            enabled = self.settings.enabled,
            host = %self.settings.host,
            port = self.settings.port,
            "State driver started"
        );

        self.render(Fields::ALL).await;

        while let Some(message) = self.receiver.recv().await {
            if let DriverMessage::Shutdown = message {
                break;
            }
            self.handle(message).await;
        }

        self.stop_refresh_timer();
        self.cancel_idle_timer();
        self.close_display().await;
        info!("State driver stopped");
    }

    async fn handle(&mut self, message: DriverMessage) {
        match message {
            DriverMessage::Print(PrintEvent::Started { name }) => self.on_started(&name).await,
            DriverMessage::Print(event) => self.on_finished(&event).await,
            DriverMessage::Progress(percent) => self.on_progress(percent).await,
            DriverMessage::RefreshTick { generation } => self.on_refresh_tick(generation).await,
            DriverMessage::IdleTimeout { generation } => self.on_idle_timeout(generation).await,
            DriverMessage::Reconfigure(settings) => self.on_reconfigure(settings).await,
            DriverMessage::Status(reply) => {
                // The asker may have given up
                let _ = reply.send(self.status());
            }
            DriverMessage::Shutdown => {}
        }
    }

    async fn on_started(&mut self, name: &str) {
        self.cancel_idle_timer();
        self.job.start(name, self.clock.now());
        info!(filename = name, "Print started");

        self.start_refresh_timer();
        self.job.remaining_seconds = self.progress.remaining_seconds();
        self.render(Fields::ALL).await;
    }

    async fn on_finished(&mut self, event: &PrintEvent) {
        if !self.job.is_printing() {
            debug!(event = event.label(), "No print in progress, ignoring");
            return;
        }

        self.stop_refresh_timer();
        self.job.finish();
        info!(
            event = event.label(),
            filename = self.job.filename.as_deref().unwrap_or_default(),
            "Print ended"
        );

        self.render(Fields::ALL).await;

        if self.settings.hide_page_when_idle {
            self.arm_idle_timer();
        }
    }

    async fn on_progress(&mut self, percent: u8) {
        if !self.job.is_printing() {
            debug!(percent, "No print in progress, ignoring progress");
            return;
        }

        self.job.percent = Some(percent.min(100));
        self.render(Fields::PERCENT).await;
    }

    async fn on_refresh_tick(&mut self, generation: u64) {
        if self.refresh_timer.as_ref().map(|t| t.generation) != Some(generation) {
            debug!(generation, "Stale refresh tick");
            return;
        }

        self.job.remaining_seconds = self.progress.remaining_seconds();
        self.render(Fields::PROGRESS).await;
    }

    async fn on_idle_timeout(&mut self, generation: u64) {
        if self.idle_timer.as_ref().map(|t| t.generation) != Some(generation) {
            debug!(generation, "Stale idle timeout");
            return;
        }
        self.idle_timer = None;

        self.job.go_idle();
        info!("Idle timeout reached");
        self.render(Fields::PRIORITY).await;
    }

    async fn on_reconfigure(&mut self, settings: DisplayConfig) {
        if settings == self.settings {
            debug!("Display settings unchanged");
            return;
        }

        info!(
            enabled = settings.enabled,
            host = %settings.host,
            port = settings.port,
            "Display settings changed, reopening session"
        );

        let idle_changed = settings.hide_page_when_idle != self.settings.hide_page_when_idle
            || settings.idle_time_minutes != self.settings.idle_time_minutes;

        self.close_display().await;
        self.settings = settings;

        // A finished job waits for the idle timeout under the new settings
        if idle_changed && self.job.state == ScreenState::NonPrinting {
            if self.settings.hide_page_when_idle {
                self.arm_idle_timer();
            } else {
                self.cancel_idle_timer();
            }
        }

        self.render(Fields::ALL).await;
    }

    fn status(&self) -> DriverStatus {
        let view = self.job.view(&self.settings, self.clock.now());
        let info = self
            .display
            .as_ref()
            .filter(|d| d.session.is_alive())
            .map(|d| d.session.info());

        DriverStatus {
            state: self.job.state,
            priority: view.priority,
            filename: self.job.filename.clone(),
            percent: self.job.percent,
            eta: view.eta,
            finish: view.finish,
            connected: info.is_some(),
            width: info.map(|i| i.width),
            height: info.map(|i| i.height),
            connect_attempts: self.connect_attempts,
        }
    }

    /// Push the current state to LCDd
    ///
    /// `fields` selects what changed. A freshly opened session always gets
    /// everything.
    async fn render(&mut self, fields: Fields) {
        if !self.settings.enabled {
            return;
        }

        let view = self.job.view(&self.settings, self.clock.now());

        let result = match self.display.take() {
            Some(mut display) if display.session.is_alive() => {
                let result = display.apply(fields, &view).await;
                self.display = Some(display);
                result
            }
            stale => {
                if let Some(mut display) = stale {
                    display.session.close().await;
                }
                self.open_display(&view).await
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_transport() => {
                warn!(error = %e, "Lost connection to LCDd, reconnecting on next update");
            }
            Err(e) => warn!(error = %e, "Failed to update status screen"),
        }
    }

    async fn open_display(&mut self, view: &StatusView) -> Result<(), LcdError> {
        self.connect_attempts += 1;

        let mut session = Session::start(&self.settings.host, self.settings.port).await?;
        let layout = Layout::new(session.info(), &self.settings);

        if let Err(e) = layout.build(&mut session, &self.settings, view).await {
            session.close().await;
            return Err(e);
        }

        self.display = Some(ActiveDisplay { session, layout });
        Ok(())
    }

    async fn close_display(&mut self) {
        if let Some(mut display) = self.display.take() {
            display.session.close().await;
            debug!("LCDd session closed");
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn idle_timeout(&self) -> Duration {
        self.idle_timeout.unwrap_or_else(|| {
            Duration::from_secs(self.settings.idle_time_minutes.saturating_mul(60))
        })
    }

    fn start_refresh_timer(&mut self) {
        self.stop_refresh_timer();

        let generation = self.next_generation();
        let period = self.refresh_interval;
        let sender = self.timer_sender.clone();

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = IntervalStream::new(interval);

            while ticks.next().await.is_some() {
                let Some(sender) = sender.upgrade() else {
                    break;
                };
                if sender
                    .send(DriverMessage::RefreshTick { generation })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        debug!(generation, period_ms = period.as_millis() as u64, "Refresh timer started");
        self.refresh_timer = Some(Timer { generation, task });
    }

    /// Ticks already queued from the stopped timer are ignored by generation
    fn stop_refresh_timer(&mut self) {
        if let Some(timer) = self.refresh_timer.take() {
            debug!(generation = timer.generation, "Refresh timer stopped");
            timer.cancel();
        }
    }

    fn arm_idle_timer(&mut self) {
        self.cancel_idle_timer();

        let generation = self.next_generation();
        let timeout = self.idle_timeout();
        let sender = self.timer_sender.clone();

        let task = tokio::spawn(async move {
            time::sleep(timeout).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(DriverMessage::IdleTimeout { generation }).await;
            }
        });

        debug!(generation, timeout_secs = timeout.as_secs(), "Idle timer armed");
        self.idle_timer = Some(Timer { generation, task });
    }

    fn cancel_idle_timer(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            debug!(generation = timer.generation, "Idle timer cancelled");
            timer.cancel();
        }
    }
}
