pub struct BreakAnalysis {
    pub should_break: bool,
    pub remaining_height: f32,
}

/// Checks whether a band fits between the cursor and the page's flow limit.
///
/// * `cursor_y`: The current Y position on the page.
/// * `band_height`: The height the band needs.
/// * `limit_y`: The lowest Y a flowing band may reach.
pub fn check_band_fit(cursor_y: f32, band_height: f32, limit_y: f32) -> BreakAnalysis {
    let available = (limit_y - cursor_y).max(0.0);
    // Use a small epsilon to handle floating point inaccuracies
    const EPSILON: f32 = 0.01;
    BreakAnalysis {
        should_break: band_height > available + EPSILON,
        remaining_height: available,
    }
}
