use crate::models::AggregateStats;
use crate::sequence::{Sequencer, Ticket};

/// Shown before the first successful stats response.
pub const PLACEHOLDER: &str = "-";

/// Format a count with comma thousands separators: `1234567` → `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Displayed client/market counts. A failed refresh keeps the previous
/// numbers on screen.
#[derive(Debug, Clone, Default)]
pub struct StatsPanel {
    current: Option<AggregateStats>,
    requests: Sequencer,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh; only the answer for the returned ticket is applied.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.requests.issue()
    }

    /// Replace the displayed numbers. Returns false for a superseded ticket.
    pub fn accept(&mut self, ticket: Ticket, stats: AggregateStats) -> bool {
        if !self.requests.is_current(ticket) {
            return false;
        }
        self.current = Some(stats);
        true
    }

    pub fn current(&self) -> Option<AggregateStats> {
        self.current
    }

    pub fn client_count_label(&self) -> String {
        self.current
            .map(|s| format_count(s.client_count))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn market_count_label(&self) -> String {
        self.current
            .map(|s| format_count(s.market_count))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }
}
