use flick::time_series::ScorePoint;

/// Compute X (seconds) and Y (score) bounds for the results chart
pub fn compute_chart_params(points: &[ScorePoint]) -> (f64, f64) {
    let highest_score = points.iter().map(|p| p.score).fold(0.0, f64::max);

    let mut overall_duration = points.last().map(|p| p.t).unwrap_or(1.0);
    if overall_duration < 1.0 {
        overall_duration = 1.0;
    }

    // a flat zero line still needs a visible y range
    (overall_duration, highest_score.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
