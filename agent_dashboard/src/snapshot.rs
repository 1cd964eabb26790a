//! # Snapshot Data Model
//!
//! The normalized, immutable result of one refresh cycle. A snapshot is built
//! once from the three raw fetch results and then only read by the renderer;
//! the next cycle replaces it wholesale.

/// A count read from a source, or the marker standing in for a failed source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountReading {
    /// The numeric field was present and numeric.
    Value(f64),
    /// The source failed or returned a non-numeric field.
    ErrorMarker,
}

impl CountReading {
    /// The count when available.
    pub fn value(self) -> Option<f64> {
        match self {
            CountReading::Value(v) => Some(v),
            CountReading::ErrorMarker => None,
        }
    }

    /// True for a numeric reading above zero.
    pub fn is_positive(self) -> bool {
        matches!(self, CountReading::Value(v) if v > 0.0)
    }
}

/// One per-state element of the DH insurance response.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRow {
    /// Two-letter state code as received (empty when missing).
    pub state_code: String,
    /// Ready agents; `None` when the element carried an error.
    pub ready_count: Option<f64>,
    /// Upstream error detail for this state, shown as the card tooltip.
    pub error_detail: Option<String>,
}

impl StateRow {
    /// A row with agents ready and no error.
    pub fn is_available(&self) -> bool {
        self.error_detail.is_none() && self.ready_count.is_some_and(|n| n > 0.0)
    }
}

/// Per-state rows, or the tag for a DH source that failed or was not an array.
///
/// `SourceFailed` renders as invalid data; `Rows(vec![])` renders as "0 states".
#[derive(Debug, Clone, PartialEq)]
pub enum StateRows {
    /// Rows in the order the endpoint returned them.
    Rows(Vec<StateRow>),
    /// The DH call failed or its payload was not an array.
    SourceFailed,
}

impl StateRows {
    /// Number of rows with `ready_count > 0`. Zero for `SourceFailed`.
    pub fn available_states(&self) -> usize {
        match self {
            StateRows::Rows(rows) => rows.iter().filter(|r| r.is_available()).count(),
            StateRows::SourceFailed => 0,
        }
    }

    /// Number of rows. Zero for `SourceFailed`.
    pub fn total_states(&self) -> usize {
        match self {
            StateRows::Rows(rows) => rows.len(),
            StateRows::SourceFailed => 0,
        }
    }
}

/// Combined view of one cycle, handed to the render engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// `ready` from the GUARDIANS endpoint.
    pub guardians_count: CountReading,
    /// `available_agents` from the PLATINUM endpoint.
    pub platinum_count: CountReading,
    /// Rows from the DH insurance endpoint.
    pub state_rows: StateRows,
}

/// Lifecycle of the refresh cycle currently reflected on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshCycleState {
    /// No cycle has run yet.
    #[default]
    Idle,
    /// A cycle is in flight; the loading view is shown.
    Loading,
    /// The latest cycle rendered at least partial data.
    Rendered,
    /// The latest cycle hit the full-error path.
    Failed,
}

/// Integral values print without a fractional part.
pub fn format_count(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, ready: Option<f64>, error: Option<&str>) -> StateRow {
        StateRow {
            state_code: code.to_string(),
            ready_count: ready,
            error_detail: error.map(str::to_string),
        }
    }

    #[test]
    fn availability_ignores_errors_and_zero() {
        let rows = StateRows::Rows(vec![
            row("CA", Some(3.0), None),
            row("TX", Some(0.0), None),
            row("NY", None, Some("timeout")),
        ]);
        assert_eq!(rows.available_states(), 1);
        assert_eq!(rows.total_states(), 3);
    }

    #[test]
    fn source_failed_differs_from_empty() {
        assert_ne!(StateRows::SourceFailed, StateRows::Rows(Vec::new()));
        assert_eq!(StateRows::SourceFailed.total_states(), 0);
    }

    #[test]
    fn count_reading_positive() {
        assert!(CountReading::Value(2.0).is_positive());
        assert!(!CountReading::Value(0.0).is_positive());
        assert!(!CountReading::ErrorMarker.is_positive());
        assert_eq!(CountReading::ErrorMarker.value(), None);
    }

    #[test]
    fn format_count_drops_integral_fraction() {
        assert_eq!(format_count(5.0), "5");
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(2.5), "2.5");
        assert_eq!(format_count(-1.0), "-1");
    }
}
