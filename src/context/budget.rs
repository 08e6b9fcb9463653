//! Token budget for injected context
//!
//! Costs are a heuristic: one unit per `chars_per_unit` characters, rounded
//! up. The budget is local to a gate session and unrelated to the agent's
//! own conversation accounting.

use serde::{Deserialize, Serialize};

/// Default characters per cost unit
pub const DEFAULT_CHARS_PER_UNIT: usize = 4;

/// Appended to text cut short by the budget
pub const TRUNCATION_MARKER: &str = "\n[...truncated: context budget exhausted]";

/// Returned in place of any text once the budget is spent
pub const OUT_OF_BUDGET_MARKER: &str = "[context omitted: out of budget]";

/// Bounded allowance for injected context text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    max_units: usize,
    consumed: usize,
    chars_per_unit: usize,
}

impl TokenBudget {
    /// Create a budget with the default characters-per-unit ratio
    pub fn new(max_units: usize) -> Self {
        Self::with_chars_per_unit(max_units, DEFAULT_CHARS_PER_UNIT)
    }

    /// Create a budget with a custom characters-per-unit ratio (minimum 1)
    pub fn with_chars_per_unit(max_units: usize, chars_per_unit: usize) -> Self {
        Self {
            max_units,
            consumed: 0,
            chars_per_unit: chars_per_unit.max(1),
        }
    }

    /// Restore a budget with units already consumed
    pub fn resume(mut self, consumed: usize) -> Self {
        self.consumed = consumed;
        self
    }

    pub fn max_units(&self) -> usize {
        self.max_units
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn chars_per_unit(&self) -> usize {
        self.chars_per_unit
    }

    /// Units left before the cap (zero once exceeded)
    pub fn remaining_units(&self) -> usize {
        self.max_units.saturating_sub(self.consumed)
    }

    /// Estimated cost of `text`: characters divided by the ratio, rounded up
    pub fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_unit)
    }

    /// Whether `text` fits in what remains
    pub fn can_fit(&self, text: &str) -> bool {
        self.estimate(text) + self.consumed <= self.max_units
    }

    /// Cut `text` to the remaining budget
    ///
    /// Text that fits is returned unchanged. Otherwise it is cut at a
    /// character boundary, leaving room for the truncation marker so the
    /// result still fits. With nothing left, the out-of-budget marker is
    /// returned instead.
    pub fn truncate_to_fit(&self, text: &str) -> String {
        let remaining_units = self.remaining_units();
        if remaining_units == 0 {
            return OUT_OF_BUDGET_MARKER.to_string();
        }
        if self.can_fit(text) {
            return text.to_string();
        }

        let remaining_chars = remaining_units * self.chars_per_unit;
        let marker_chars = TRUNCATION_MARKER.chars().count();
        if remaining_chars <= marker_chars {
            return TRUNCATION_MARKER.trim_start().to_string();
        }

        let mut truncated: String = text.chars().take(remaining_chars - marker_chars).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }

    /// Charge the cost of emitted text, capped at what remains
    ///
    /// Markers emitted near or past the cap cost more than is left; the
    /// counter stops at `max_units` instead of running over. Returns the
    /// units charged.
    pub fn charge(&mut self, emitted: &str) -> usize {
        let units = self.estimate(emitted).min(self.remaining_units());
        self.consume(units);
        units
    }

    /// Record units spent on emitted text
    pub fn consume(&mut self, units: usize) {
        self.consumed = self.consumed.saturating_add(units);
        tracing::debug!(
            "Context budget consumed {} units ({}/{})",
            units,
            self.consumed,
            self.max_units
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        let budget = TokenBudget::new(100);
        assert_eq!(budget.estimate(""), 0);
        assert_eq!(budget.estimate("abc"), 1);
        assert_eq!(budget.estimate("abcd"), 1);
        assert_eq!(budget.estimate("abcde"), 2);
        // Characters, not bytes
        assert_eq!(budget.estimate("éééé"), 1);
    }

    #[test]
    fn test_can_fit() {
        let mut budget = TokenBudget::new(10);
        assert!(budget.can_fit(&"x".repeat(40)));
        assert!(!budget.can_fit(&"x".repeat(41)));
        budget.consume(5);
        assert!(budget.can_fit(&"x".repeat(20)));
        assert!(!budget.can_fit(&"x".repeat(21)));
    }

    #[test]
    fn test_fitting_text_unchanged() {
        let budget = TokenBudget::new(100);
        assert_eq!(budget.truncate_to_fit("short"), "short");
    }

    #[test]
    fn test_truncated_text_fits_exactly() {
        let budget = TokenBudget::new(100);
        let candidate = "a".repeat(500);
        let emitted = budget.truncate_to_fit(&candidate);

        assert!(emitted.ends_with(TRUNCATION_MARKER));
        assert!(emitted.len() < candidate.len());
        assert_eq!(budget.estimate(&emitted), 100);
        assert!(budget.can_fit(&emitted));
    }

    #[test]
    fn test_consumption_reflects_truncated_length() {
        let mut budget = TokenBudget::new(100);
        let emitted = budget.truncate_to_fit(&"a".repeat(500));
        budget.consume(budget.estimate(&emitted));
        assert!(budget.consumed() <= 100);
        assert!(budget.consumed() < 125);
    }

    #[test]
    fn test_two_near_capacity_injections_stay_within_max() {
        let mut budget = TokenBudget::new(100).resume(99);

        let first = budget.truncate_to_fit(&"a".repeat(396));
        assert_eq!(first, TRUNCATION_MARKER.trim_start());
        assert_eq!(budget.charge(&first), 1);
        assert_eq!(budget.consumed(), 100);

        let second = budget.truncate_to_fit(&"b".repeat(396));
        assert_eq!(second, OUT_OF_BUDGET_MARKER);
        assert_eq!(budget.charge(&second), 0);
        assert_eq!(budget.consumed(), 100);
    }

    #[test]
    fn test_charge_full_cost_when_it_fits() {
        let mut budget = TokenBudget::new(100);
        let emitted = budget.truncate_to_fit(&"a".repeat(500));
        assert_eq!(budget.charge(&emitted), 100);
        assert_eq!(budget.remaining_units(), 0);
    }

    #[test]
    fn test_exhausted_budget_returns_marker() {
        let mut budget = TokenBudget::new(10);
        budget.consume(10);
        assert_eq!(budget.remaining_units(), 0);
        assert_eq!(budget.truncate_to_fit("text"), OUT_OF_BUDGET_MARKER);
    }

    #[test]
    fn test_truncation_on_char_boundary() {
        let budget = TokenBudget::with_chars_per_unit(100, 1);
        let emitted = budget.truncate_to_fit(&"日本語".repeat(50));
        assert!(emitted.ends_with(TRUNCATION_MARKER));
        assert_eq!(emitted.chars().count(), 100);
    }

    #[test]
    fn test_tiny_remainder_gets_bare_marker() {
        let budget = TokenBudget::new(10).resume(9);
        assert_eq!(
            budget.truncate_to_fit(&"x".repeat(100)),
            TRUNCATION_MARKER.trim_start()
        );
    }

    #[test]
    fn test_resume_keeps_consumed() {
        let budget = TokenBudget::new(50).resume(20);
        assert_eq!(budget.remaining_units(), 30);
    }
}
