//! Display helpers.

/// Placeholder shown when there is no reading.
pub const NO_READING: &str = "---";

/// Format a weight for display: whole grams, thousands grouped with a space.
///
/// `format_weight(Some(12345.6)) == "12 346"`, `format_weight(None) == "---"`.
pub fn format_weight(grams: Option<f64>) -> String {
    let Some(g) = grams.filter(|g| g.is_finite()) else {
        return NO_READING.to_string();
    };
    let rounded = g.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
