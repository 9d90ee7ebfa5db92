//! One-line progress readout, the terminal stand-in for the overlay bar.

use focusbar_core::IntervalKind;

const BAR_WIDTH: usize = 20;

/// `work [########------------] 42% of 25min  today: 3`
pub fn format_line(kind: IntervalKind, progress: f64, today_count: u64) -> String {
    let progress = progress.clamp(0.0, 1.0);
    let filled = (progress * BAR_WIDTH as f64).round() as usize;
    let pct = (progress * 100.0).floor() as u32;
    format!(
        "{kind:<10} [{}{}] {pct:>3}% of {}min  today: {today_count}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        kind.duration_min(),
    )
}
