use serde::Serialize;
use std::fmt;

use super::notifications::Notification;
use super::poller::TradingState;

pub const START_LABEL: &str = "Start Trading";
pub const START_BUSY_LABEL: &str = "Starting...";
pub const STOP_LABEL: &str = "Stop Trading";
pub const STOP_BUSY_LABEL: &str = "Stopping...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PnlColor {
    Positive,
    Negative,
    Neutral,
}

impl PnlColor {
    pub fn hex(&self) -> &'static str {
        match self {
            PnlColor::Positive => "#28a745",
            PnlColor::Negative => "#dc3545",
            PnlColor::Neutral => "#fff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceView {
    pub total_return: String,
    pub total_return_color: PnlColor,
    pub win_rate: String,
    pub total_trades: String,
    pub current_balance: String,
}

impl Default for PerformanceView {
    fn default() -> Self {
        Self {
            total_return: "0.00%".to_string(),
            total_return_color: PnlColor::Neutral,
            win_rate: "0.0%".to_string(),
            total_trades: "0".to_string(),
            current_balance: "$0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub side: String,
    pub side_class: String,
    pub symbol: String,
    pub amount: String,
    pub price: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TableRow {
    Placeholder { text: String, colspan: usize },
    Trade(TradeRow),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolOption {
    /// `None` for non-selectable entries such as the separator.
    pub value: Option<String>,
    pub label: String,
    pub disabled: bool,
}

impl SymbolOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            label: label.into(),
            disabled: false,
        }
    }

    pub fn separator(label: impl Into<String>) -> Self {
        Self {
            value: None,
            label: label.into(),
            disabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Control {
    Start,
    Stop,
}

impl Control {
    pub fn idle_label(&self) -> &'static str {
        match self {
            Control::Start => START_LABEL,
            Control::Stop => STOP_LABEL,
        }
    }

    pub fn busy_label(&self) -> &'static str {
        match self {
            Control::Start => START_BUSY_LABEL,
            Control::Stop => STOP_BUSY_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlButton {
    pub label: String,
    pub enabled: bool,
    pub visible: bool,
    #[serde(skip)]
    in_flight: u32,
    #[serde(skip)]
    saved_label: Option<String>,
}

impl ControlButton {
    fn new(control: Control, visible: bool) -> Self {
        Self {
            label: control.idle_label().to_string(),
            enabled: true,
            visible,
            in_flight: 0,
            saved_label: None,
        }
    }

    /// Enters the loading state. Only the first of overlapping actions
    /// captures the label to restore.
    pub(crate) fn begin_busy(&mut self, busy_label: &str) {
        if self.in_flight == 0 {
            self.saved_label = Some(self.label.clone());
        }
        self.in_flight += 1;
        self.label = busy_label.to_string();
        self.enabled = false;
    }

    /// Leaves the loading state once the last overlapping action resolves.
    pub(crate) fn end_busy(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            if let Some(label) = self.saved_label.take() {
                self.label = label;
            }
            self.enabled = true;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

/// The view model rendered by a front end. Every field is re-derived from
/// backend responses; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub performance: PerformanceView,
    pub trades: Vec<TableRow>,
    pub start_button: ControlButton,
    pub stop_button: ControlButton,
    pub symbol_options: Vec<SymbolOption>,
    pub notification: Option<Notification>,
    pub trading_state: TradingState,
}

impl ViewState {
    pub fn new(symbol_options: Vec<SymbolOption>) -> Self {
        Self {
            performance: PerformanceView::default(),
            trades: Vec::new(),
            start_button: ControlButton::new(Control::Start, true),
            stop_button: ControlButton::new(Control::Stop, false),
            symbol_options,
            notification: None,
            trading_state: TradingState::Idle,
        }
    }

    pub fn button(&self, control: Control) -> &ControlButton {
        match control {
            Control::Start => &self.start_button,
            Control::Stop => &self.stop_button,
        }
    }

    pub(crate) fn button_mut(&mut self, control: Control) -> &mut ControlButton {
        match control {
            Control::Start => &mut self.start_button,
            Control::Stop => &mut self.stop_button,
        }
    }

    /// Shows exactly one of the two controls.
    pub(crate) fn apply_trading_state(&mut self, state: TradingState) {
        self.trading_state = state;
        self.start_button.visible = state == TradingState::Idle;
        self.stop_button.visible = state == TradingState::Active;
    }
}

/// Emitted whenever a part of the view changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ViewEvent {
    PerformanceUpdated,
    TradesUpdated,
    TradingStateChanged { state: TradingState },
    ControlsUpdated,
    SymbolsUpdated,
    NotificationChanged,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Trading Dashboard [{}] ===", self.trading_state)?;
        if let Some(notification) = &self.notification {
            writeln!(f, "[{}] {}", notification.kind, notification.message)?;
        }
        writeln!(f, "Total Return:     {} ({})", self.performance.total_return, self.performance.total_return_color.hex())?;
        writeln!(f, "Win Rate:         {}", self.performance.win_rate)?;
        writeln!(f, "Total Trades:     {}", self.performance.total_trades)?;
        writeln!(f, "Balance:          {}", self.performance.current_balance)?;

        for control in [Control::Start, Control::Stop] {
            let button = self.button(control);
            if button.visible {
                let state = if button.enabled { "" } else { " (disabled)" };
                writeln!(f, "Control:          [{}]{}", button.label, state)?;
            }
        }

        let symbols: Vec<&str> = self
            .symbol_options
            .iter()
            .filter(|o| !o.disabled)
            .map(|o| o.label.as_str())
            .collect();
        writeln!(f, "Symbols:          {}", symbols.join(", "))?;

        writeln!(f, "--- Recent Trades ---")?;
        for row in &self.trades {
            match row {
                TableRow::Placeholder { text, .. } => writeln!(f, "{}", text)?,
                TableRow::Trade(t) => writeln!(
                    f,
                    "{}  {:<4}  {:<16} {:>12} {:>14} {:>14}",
                    t.timestamp, t.side, t.symbol, t.amount, t.price, t.value
                )?,
            }
        }
        Ok(())
    }
}
