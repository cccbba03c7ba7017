use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::notifications::{action_failed, Notification, TradingAction};
use super::poller::{PollTimer, TradingState};
use super::render;
use super::view::{Control, ViewEvent, ViewState};
use crate::api::DashboardApi;
use crate::config::{PollingSettings, Settings, SymbolSettings};
use crate::types::{StartTradingRequest, Strategy};

const EVENT_CAPACITY: usize = 64;

struct Inner {
    api: Arc<dyn DashboardApi>,
    polling: PollingSettings,
    symbols: SymbolSettings,
    notification_display: Duration,
    is_trading: AtomicBool,
    /// Bumped by every start/stop acknowledgement. A status read only
    /// applies if no acknowledgement landed while it was in flight.
    ack_generation: Mutex<u64>,
    view: RwLock<ViewState>,
    timer: PollTimer,
    events: broadcast::Sender<ViewEvent>,
}

/// Drives the dashboard: polls the backend, projects responses into the
/// [`ViewState`], and issues start/stop commands.
///
/// The trading flag only changes on a backend-confirmed status, either the
/// acknowledgement of a start/stop command or a status read. Every change
/// of state re-arms the poll timer at the matching cadence.
#[derive(Clone)]
pub struct DashboardController {
    inner: Arc<Inner>,
}

impl DashboardController {
    pub fn new(api: Arc<dyn DashboardApi>, settings: &Settings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let options = render::baseline_options(&settings.symbols.baseline);
        Self {
            inner: Arc::new(Inner {
                api,
                polling: settings.polling.clone(),
                symbols: settings.symbols.clone(),
                notification_display: Duration::from_millis(settings.notifications.display_ms),
                is_trading: AtomicBool::new(false),
                ack_generation: Mutex::new(0),
                view: RwLock::new(ViewState::new(options)),
                timer: PollTimer::new(),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.events.subscribe()
    }

    pub fn view(&self) -> ViewState {
        self.read_view().clone()
    }

    pub fn is_trading(&self) -> bool {
        self.inner.is_trading.load(Ordering::Acquire)
    }

    pub fn trading_state(&self) -> TradingState {
        TradingState::from_flag(self.is_trading())
    }

    /// Cadence of the live poll timer, if one is armed.
    pub fn cadence(&self) -> Option<TradingState> {
        self.inner.timer.cadence()
    }

    pub fn poll_period(&self) -> Option<Duration> {
        self.inner.timer.period()
    }

    /// Loads performance, trades and status concurrently, then arms the
    /// first timer at the cadence matching the fetched status.
    pub async fn initialize(&self) {
        tokio::join!(
            self.load_performance(),
            self.load_recent_trades(),
            self.load_trading_status(),
        );

        // A failed or overtaken status read leaves no timer behind.
        let state = self.trading_state();
        if self.inner.timer.cadence().is_none() {
            self.arm_timer(state);
        }
        info!("Dashboard initialized ({})", state);
    }

    pub async fn load_performance(&self) {
        match self.inner.api.performance().await {
            Ok(snapshot) => {
                let performance = render::render_performance(&snapshot);
                self.write_view().performance = performance;
                self.emit(ViewEvent::PerformanceUpdated);
            }
            Err(e) => warn!("Failed to load performance data: {}", e),
        }
    }

    pub async fn load_recent_trades(&self) {
        match self.inner.api.recent_trades().await {
            Ok(trades) => {
                let rows = render::render_trades(&trades);
                self.write_view().trades = rows;
                self.emit(ViewEvent::TradesUpdated);
            }
            Err(e) => warn!("Failed to load recent trades: {}", e),
        }
    }

    /// Reads the backend status and applies it through the state machine.
    pub async fn load_trading_status(&self) {
        let sent_at = *self.generation();
        match self.inner.api.trading_status().await {
            Ok(status) => {
                let generation = self.generation();
                if *generation != sent_at {
                    debug!("Dropping status read overtaken by a start/stop acknowledgement");
                    return;
                }
                self.transition(TradingState::from_flag(status.is_trading));
            }
            Err(e) => warn!("Failed to load trading status: {}", e),
        }
    }

    /// One poll tick. Ticks of the idle cadence are dropped while trading,
    /// which covers a tick that fires just before the cadence switch lands.
    pub(crate) async fn refresh(&self, cadence: TradingState) {
        if cadence == TradingState::Idle && self.is_trading() {
            debug!("Skipping idle refresh while trading");
            return;
        }

        if self.inner.polling.sync_status_on_poll {
            tokio::join!(
                self.load_performance(),
                self.load_recent_trades(),
                self.load_trading_status(),
            );
        } else {
            tokio::join!(self.load_performance(), self.load_recent_trades());
        }
    }

    /// Returns whether the backend acknowledged the start.
    pub async fn start_trading(&self, request: StartTradingRequest) -> bool {
        let _busy = self.begin_busy(Control::Start);
        info!(
            "Requesting trading start: strategy={}, symbol={}, timeframe={}",
            request.strategy, request.symbol, request.timeframe
        );

        match self.inner.api.start_trading(request).await {
            Ok(message) => {
                self.show_notification(Notification::success(message));
                self.acknowledge(TradingState::Active);
                true
            }
            Err(e) => {
                error!("Trading start failed: {}", e);
                self.show_notification(action_failed(TradingAction::Start, &e));
                false
            }
        }
    }

    /// Returns whether the backend acknowledged the stop.
    pub async fn stop_trading(&self) -> bool {
        let _busy = self.begin_busy(Control::Stop);
        info!("Requesting trading stop");

        match self.inner.api.stop_trading().await {
            Ok(message) => {
                self.show_notification(Notification::success(message));
                self.acknowledge(TradingState::Idle);
                true
            }
            Err(e) => {
                error!("Trading stop failed: {}", e);
                self.show_notification(action_failed(TradingAction::Stop, &e));
                false
            }
        }
    }

    /// Strategy selector change handler.
    pub async fn select_strategy(&self, strategy: Strategy) {
        if strategy == self.inner.symbols.high_volatility_strategy {
            self.load_volatile_coins().await;
        } else {
            let options = render::baseline_options(&self.inner.symbols.baseline);
            self.write_view().symbol_options = options;
            self.emit(ViewEvent::SymbolsUpdated);
        }
    }

    /// Replaces the symbol options with the baseline pair, a separator and
    /// the fetched volatile coins. A failed fetch leaves them untouched.
    pub async fn load_volatile_coins(&self) {
        match self.inner.api.volatile_coins().await {
            Ok(coins) => {
                info!("Loaded {} volatile coins", coins.len());
                let options = render::volatile_options(
                    &self.inner.symbols.baseline,
                    &self.inner.symbols.separator_label,
                    &coins,
                );
                self.write_view().symbol_options = options;
                self.emit(ViewEvent::SymbolsUpdated);
            }
            Err(e) => warn!("Failed to load volatile coins: {}", e),
        }
    }

    /// Replaces any visible banner and schedules its removal.
    pub fn show_notification(&self, notification: Notification) {
        notification.log();
        let id = notification.id.clone();
        self.write_view().notification = Some(notification);
        self.emit(ViewEvent::NotificationChanged);

        let weak = Arc::downgrade(&self.inner);
        let after = self.inner.notification_display;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(controller) = Self::upgrade(&weak) {
                controller.dismiss_if_current(&id);
            }
        });
    }

    /// User-initiated removal of the visible banner.
    pub fn dismiss_notification(&self) {
        let removed = self.write_view().notification.take().is_some();
        if removed {
            self.emit(ViewEvent::NotificationChanged);
        }
    }

    fn dismiss_if_current(&self, id: &str) {
        let removed = {
            let mut view = self.write_view();
            if view.notification.as_ref().is_some_and(|n| n.id == id) {
                view.notification = None;
                true
            } else {
                false
            }
        };
        if removed {
            self.emit(ViewEvent::NotificationChanged);
        }
    }

    /// Stops scheduling further polls. In-flight requests run to completion.
    pub fn shutdown(&self) {
        if self.inner.timer.close() {
            info!("Polling stopped");
        }
    }

    /// Applies a backend-confirmed start/stop and invalidates status reads
    /// still in flight.
    fn acknowledge(&self, state: TradingState) {
        let mut generation = self.generation();
        *generation += 1;
        self.transition(state);
    }

    fn transition(&self, state: TradingState) {
        let changed = self.set_trading_state(state);
        if changed || self.inner.timer.cadence() != Some(state) {
            self.arm_timer(state);
        }
    }

    /// Returns whether the state changed.
    fn set_trading_state(&self, state: TradingState) -> bool {
        let was_trading = self.inner.is_trading.swap(state.is_trading(), Ordering::AcqRel);
        self.write_view().apply_trading_state(state);
        let changed = was_trading != state.is_trading();
        if changed {
            info!("Trading state changed to {}", state);
            self.emit(ViewEvent::TradingStateChanged { state });
        }
        changed
    }

    fn arm_timer(&self, state: TradingState) {
        let period = state.cadence(&self.inner.polling);
        let weak = Arc::downgrade(&self.inner);
        let armed = self.inner.timer.rearm(state, period, move |cadence| {
            let weak = weak.clone();
            async move {
                if let Some(controller) = Self::upgrade(&weak) {
                    controller.refresh(cadence).await;
                }
            }
        });
        if armed {
            debug!("Polling every {:?} ({})", period, state);
        }
    }

    fn begin_busy(&self, control: Control) -> BusyGuard {
        self.write_view().button_mut(control).begin_busy(control.busy_label());
        self.emit(ViewEvent::ControlsUpdated);
        BusyGuard {
            controller: self.clone(),
            control,
        }
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.inner.events.send(event);
    }

    fn generation(&self) -> MutexGuard<'_, u64> {
        self.inner.ack_generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_view(&self) -> RwLockReadGuard<'_, ViewState> {
        self.inner.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_view(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.inner.view.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores a control when its action resolves, including when the action
/// future is dropped mid-flight.
struct BusyGuard {
    controller: DashboardController,
    control: Control,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.controller.write_view().button_mut(self.control).end_busy();
        self.controller.emit(ViewEvent::ControlsUpdated);
    }
}
