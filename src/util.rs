use std::time::Duration;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `m:ss` clock display
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Seconds with one decimal, for countdowns
pub fn format_secs(duration: Duration) -> String {
    format!("{:.1}", duration.as_secs_f64())
}

/// Round to one decimal place, the precision percentages are shown with
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
