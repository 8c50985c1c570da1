//! Online forecasts that turn trade fields into small residuals.
//!
//! Both the encoder and the decoder run their own `StatsCollector` and feed
//! it every trade in stream order, the encoder after computing the current
//! trade's residuals and the decoder after reconstructing the trade. Because
//! the update order is identical, the forecasts on both sides bit-match and
//! the decoder can add back exactly what the encoder subtracted.

use std::collections::{HashMap, VecDeque};

use trade_module::Trade;

/// Samples kept by the time accumulators.
const ROLLING_WINDOW: usize = 100;

/// Mean over the most recent `ROLLING_WINDOW` samples.
///
/// The mean is computed in `f64` and truncated to an integer at the point of
/// use; the truncation is part of the wire contract, since both sides must
/// land on the same forecast.
#[derive(Debug)]
struct RollingMean {
    samples: VecDeque<f64>,
}

impl RollingMean {
    fn new() -> Self {
        RollingMean { samples: VecDeque::with_capacity(ROLLING_WINDOW) }
    }

    fn add(&mut self, sample: f64) {
        if self.samples.len() == ROLLING_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn mean(&self) -> f64 {
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

/// Last observed price and quantity for one instrument.
#[derive(Debug, Default)]
struct SymbolHistory {
    previous_price: Option<i32>,
    previous_quantity: Option<i32>,
}

impl SymbolHistory {
    fn add_trade(&mut self, trade: &Trade) {
        self.previous_price = Some(trade.price);
        self.previous_quantity = Some(trade.quantity);
    }
}

/// Predicts send time, receive-time difference, and per-symbol price and
/// quantity from previously seen trades.
#[derive(Debug)]
pub struct StatsCollector {
    symbol_history: HashMap<String, SymbolHistory>,
    previous_send_time: Option<i64>,
    previous_receive_time_diff: Option<i64>,
    send_time_gap_acc: RollingMean,
    receive_time_diff_acc: RollingMean,
}

impl StatsCollector {
    pub fn new() -> Self {
        StatsCollector {
            symbol_history: HashMap::new(),
            previous_send_time: None,
            previous_receive_time_diff: None,
            send_time_gap_acc: RollingMean::new(),
            receive_time_diff_acc: RollingMean::new(),
        }
    }

    /// Previous send time plus the mean gap between recent send times; 0
    /// before the first trade, the bare previous value while the gap
    /// accumulator is still empty.
    pub fn predict_send_time(&self) -> i64 {
        let Some(previous) = self.previous_send_time else {
            return 0;
        };
        if self.send_time_gap_acc.is_empty() {
            return previous;
        }
        previous.wrapping_add(self.send_time_gap_acc.mean() as i64)
    }

    /// Same shape as `predict_send_time`, over (receive − send) differences.
    pub fn predict_receive_time_diff(&self) -> i64 {
        let Some(previous) = self.previous_receive_time_diff else {
            return 0;
        };
        if self.receive_time_diff_acc.is_empty() {
            return previous;
        }
        previous.wrapping_add(self.receive_time_diff_acc.mean() as i64)
    }

    /// Last price seen for `symbol`, or 0 for a new instrument.
    pub fn predict_price(&self, symbol: &str) -> i32 {
        self.symbol_history
            .get(symbol)
            .and_then(|history| history.previous_price)
            .unwrap_or(0)
    }

    /// Last quantity seen for `symbol`, or 0 for a new instrument.
    pub fn predict_quantity(&self, symbol: &str) -> i32 {
        self.symbol_history
            .get(symbol)
            .and_then(|history| history.previous_quantity)
            .unwrap_or(0)
    }

    /// Folds `trade` into the running state. Must be called after the
    /// caller has used this trade's forecasts, never before.
    pub fn add_trade(&mut self, trade: &Trade) {
        let receive_time_diff = trade.receive_time.wrapping_sub(trade.send_time);

        if let (Some(previous_send), Some(previous_diff)) =
            (self.previous_send_time, self.previous_receive_time_diff)
        {
            self.send_time_gap_acc
                .add(trade.send_time.wrapping_sub(previous_send) as f64);
            self.receive_time_diff_acc
                .add(receive_time_diff.wrapping_sub(previous_diff) as f64);
        }

        self.previous_send_time = Some(trade.send_time);
        self.previous_receive_time_diff = Some(receive_time_diff);
        self.symbol_history
            .entry(trade.symbol.clone())
            .or_default()
            .add_trade(trade);
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
