use crate::models::{RiskTrendResult, Trend};
use crate::risk::overall_risk;
use crate::snapshot::PerformanceSnapshot;

/// Snapshots per comparison window.
pub const TREND_WINDOW: usize = 3;
/// Relative change beyond which a trajectory stops being stable.
pub const TREND_THRESHOLD: f64 = 0.1;

fn mean_risk(window: &[PerformanceSnapshot]) -> f64 {
    window
        .iter()
        .map(|snapshot| overall_risk(snapshot.average_marks()))
        .sum::<f64>()
        / window.len() as f64
}

/// Compares the mean overall risk of the newest window against the window
/// before it. `history` is ordered oldest first.
pub fn analyze_trend(history: &[PerformanceSnapshot]) -> RiskTrendResult {
    if history.len() < 2 {
        return RiskTrendResult::stable();
    }

    let split = history.len().saturating_sub(TREND_WINDOW);
    let recent = &history[split..];
    let older = &history[split.saturating_sub(TREND_WINDOW)..split];

    if older.is_empty() {
        return RiskTrendResult::stable();
    }

    let recent_avg = mean_risk(recent);
    let older_avg = mean_risk(older);

    if older_avg == 0.0 {
        return RiskTrendResult::stable();
    }

    let change_rate = (recent_avg - older_avg) / older_avg;
    let trend = if change_rate < -TREND_THRESHOLD {
        Trend::Improving
    } else if change_rate > TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    };

    RiskTrendResult {
        trend,
        change_rate: change_rate.abs(),
    }
}
