/// Horizontal bar such as `████████░░░░` for `value` out of `max`.
#[must_use]
pub fn ascii_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return "░".repeat(width);
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    let empty = width - filled;

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Bar followed by a right-aligned percentage, e.g. `█████░░░░░  50%`.
#[must_use]
pub fn percentage_bar(percent: f32, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    format!(
        "{} {:>3}%",
        ascii_bar(f64::from(percent), 100.0, width),
        percent.round() as u32
    )
}
