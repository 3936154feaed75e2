use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Parses `ss`, `mm:ss` or `hh:mm:ss` (fractional seconds allowed in the last part).
pub fn parse_clock(value: &str) -> Option<f64> {
    let parts = value.trim().split(':').collect::<Vec<_>>();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let seconds = last.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }

    let mut total = 0.0;
    for part in leading {
        let unit = part.trim().parse::<u32>().ok()?;
        total = (total + f64::from(unit)) * 60.0;
    }

    Some(total + seconds)
}

pub fn short_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut shortened = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_hours() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(75.9), "01:15");
        assert_eq!(format_clock(3723.0), "1:02:03");
        assert_eq!(format_clock(f64::NAN), "00:00");
    }

    #[test]
    fn clock_parses_all_forms() {
        assert_eq!(parse_clock("42"), Some(42.0));
        assert_eq!(parse_clock("02:15"), Some(135.0));
        assert_eq!(parse_clock("1:00:30.5"), Some(3630.5));
        assert_eq!(parse_clock("abc"), None);
        assert_eq!(parse_clock("-3"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
    }

    #[test]
    fn short_label_truncates_on_char_boundary() {
        assert_eq!(short_label("gradient", 20), "gradient");
        assert_eq!(short_label("élan vital concept", 5), "élan…");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("entropy");
        assert_eq!(first, stable_pair("entropy"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
