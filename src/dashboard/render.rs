//! Pure projections from backend payloads to view-model values.

use rust_decimal::{Decimal, RoundingStrategy};

use super::view::{PerformanceView, PnlColor, SymbolOption, TableRow, TradeRow};
use crate::types::{PerformanceSnapshot, TradeRecord, VolatileCoin};

pub const TRADE_TABLE_COLUMNS: usize = 6;
pub const EMPTY_TRADES_MESSAGE: &str = "No trades yet.";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const QUOTE_SUFFIX: &str = ":USDT";

pub fn pnl_color(pnl_percentage: Decimal) -> PnlColor {
    if pnl_percentage > Decimal::ZERO {
        PnlColor::Positive
    } else if pnl_percentage < Decimal::ZERO {
        PnlColor::Negative
    } else {
        PnlColor::Neutral
    }
}

pub fn render_performance(snapshot: &PerformanceSnapshot) -> PerformanceView {
    PerformanceView {
        total_return: format!("{}%", fixed(snapshot.total_pnl_percentage, 2)),
        total_return_color: pnl_color(snapshot.total_pnl_percentage),
        win_rate: format!("{}%", fixed(snapshot.win_rate, 1)),
        total_trades: snapshot.total_trades.to_string(),
        current_balance: format!("${}", grouped(snapshot.current_balance)),
    }
}

/// One row per trade in input order, or a single placeholder row when empty.
pub fn render_trades(trades: &[TradeRecord]) -> Vec<TableRow> {
    if trades.is_empty() {
        return vec![TableRow::Placeholder {
            text: EMPTY_TRADES_MESSAGE.to_string(),
            colspan: TRADE_TABLE_COLUMNS,
        }];
    }

    trades
        .iter()
        .map(|trade| {
            TableRow::Trade(TradeRow {
                timestamp: trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                side: trade.trade_type.as_str().to_string(),
                side_class: trade.trade_type.css_class().to_string(),
                symbol: trade.symbol.clone(),
                amount: fixed(trade.amount, 4),
                price: format!("${}", fixed(trade.price, 2)),
                value: format!("${}", fixed(trade.value, 2)),
            })
        })
        .collect()
}

pub fn baseline_options(baseline: &[String]) -> Vec<SymbolOption> {
    baseline.iter().map(|symbol| symbol_option(symbol)).collect()
}

/// Baseline entries, a disabled separator, then the fetched coins.
pub fn volatile_options(baseline: &[String], separator: &str, coins: &[VolatileCoin]) -> Vec<SymbolOption> {
    let mut options = baseline_options(baseline);
    options.push(SymbolOption::separator(separator));
    options.extend(coins.iter().map(|coin| symbol_option(&coin.symbol)));
    options
}

fn symbol_option(symbol: &str) -> SymbolOption {
    SymbolOption::new(symbol, symbol.replacen(QUOTE_SUFFIX, "", 1))
}

/// Fixed-point formatting with half-away-from-zero rounding.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

/// en-US digit grouping with at most three fractional digits and no
/// trailing zeros, e.g. `10234.5` -> `10,234.5`.
pub fn grouped(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(text.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
