//! Pure helpers that derive what a card shows from raw comment fields.

use chrono::{DateTime, TimeDelta, Utc};

/// Avatar placeholder colors, indexed by `hash_string(username) % 12`.
pub const PALETTE: [&str; 12] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F39C12",
    "#E74C3C", "#9B59B6", "#3498DB", "#2ECC71",
];

/// Author whose avatar always comes from the bundled asset.
pub const RESERVED_AUTHOR: &str = "medicalmedium";
pub const RESERVED_AVATAR: &str = "MMCommentExplorer.webp";

/// Label used when a timestamp is missing, unparseable or in the future.
pub const FALLBACK_TIME_LABEL: &str = "1d";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Rolling `hash * 31 + unit` over UTF-16 code units with 32-bit wrap-around,
/// returning the absolute value.
pub fn hash_string(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

pub fn generate_avatar_color(username: &str) -> &'static str {
    PALETTE[hash_string(username) as usize % PALETTE.len()]
}

/// Second character of the author uppercased, then the first, then `U`.
pub fn initial_letter(author: &str) -> String {
    let mut chars = author.chars();
    let first = chars.next();
    match chars.next().or(first) {
        Some(c) => c.to_uppercase().collect(),
        None => "U".to_string(),
    }
}

/// Terse elapsed-time label such as `3w` or `just now`.
pub fn relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return FALLBACK_TIME_LABEL.to_string();
    };
    let elapsed = now.signed_duration_since(at);
    if elapsed <= TimeDelta::zero() {
        return FALLBACK_TIME_LABEL.to_string();
    }
    let secs = elapsed.num_seconds();
    let buckets = [
        (YEAR, "y"),
        (MONTH, "mo"),
        (WEEK, "w"),
        (DAY, "d"),
        (HOUR, "h"),
        (MINUTE, "m"),
    ];
    buckets
        .iter()
        .find_map(|&(unit, suffix)| {
            let n = secs / unit;
            (n > 0).then(|| format!("{n}{suffix}"))
        })
        .unwrap_or_else(|| "just now".to_string())
}

/// Abbreviates large counts: `1500` → `1.5K`, `2000000` → `2M`.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        abbreviate(n, 1_000_000, 'M')
    } else if n >= 1_000 {
        abbreviate(n, 1_000, 'K')
    } else {
        n.to_string()
    }
}

// One decimal, rounded half-up, trailing `.0` dropped.
fn abbreviate(n: u64, unit: u64, suffix: char) -> String {
    let (n, unit) = (u128::from(n), u128::from(unit));
    let tenths = (n * 10 + unit / 2) / unit;
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole}.{frac}{suffix}")
    }
}

/// `None` for zero likes, which suppresses the element entirely.
pub fn like_label(count: u64) -> Option<String> {
    match count {
        0 => None,
        1 => Some("1 like".to_string()),
        n => Some(format!("{} likes", format_number(n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case("", 0)]
    #[case("a", 97)]
    #[case("bob", 97_717)]
    #[case("hello world", 1_794_106_052)]
    #[case("polygenelubricants", 2_147_483_648)]
    fn hash_matches_classic_string_hash(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(hash_string(input), expected);
    }

    #[test]
    fn avatar_color_is_stable_and_from_palette() {
        for name in ["bob", "alice", "", "测试", "polygenelubricants"] {
            let color = generate_avatar_color(name);
            assert_eq!(color, generate_avatar_color(name));
            assert!(PALETTE.contains(&color));
        }
        assert_eq!(generate_avatar_color("bob"), "#4ECDC4");
        assert_eq!(generate_avatar_color(""), "#FF6B6B");
        assert_eq!(generate_avatar_color("hello world"), "#E74C3C");
    }

    #[rstest]
    #[case("bob", "O")]
    #[case("b", "B")]
    #[case("", "U")]
    #[case("żółw", "Ó")]
    fn initial_prefers_second_character(#[case] author: &str, #[case] expected: &str) {
        assert_eq!(initial_letter(author), expected);
    }

    #[rstest]
    #[case(TimeDelta::days(400), "1y")]
    #[case(TimeDelta::days(800), "2y")]
    #[case(TimeDelta::days(40), "1mo")]
    #[case(TimeDelta::days(10), "1w")]
    #[case(TimeDelta::hours(25), "1d")]
    #[case(TimeDelta::hours(5), "5h")]
    #[case(TimeDelta::minutes(59), "59m")]
    #[case(TimeDelta::seconds(30), "just now")]
    #[case(TimeDelta::milliseconds(200), "just now")]
    #[case(TimeDelta::zero(), "1d")]
    #[case(TimeDelta::hours(-3), "1d")]
    fn relative_time_buckets(#[case] ago: TimeDelta, #[case] expected: &str) {
        assert_eq!(relative_time(Some(now() - ago), now()), expected);
    }

    #[test]
    fn relative_time_without_timestamp_falls_back() {
        assert_eq!(relative_time(None, now()), "1d");
    }

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1_000, "1K")]
    #[case(1_500, "1.5K")]
    #[case(1_049, "1K")]
    #[case(1_050, "1.1K")]
    #[case(12_345, "12.3K")]
    #[case(2_000_000, "2M")]
    #[case(2_350_000, "2.4M")]
    fn formats_numbers(#[case] n: u64, #[case] expected: &str) {
        assert_eq!(format_number(n), expected);
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, Some("1 like"))]
    #[case(2, Some("2 likes"))]
    #[case(1_500, Some("1.5K likes"))]
    #[case(2_000_000, Some("2M likes"))]
    fn like_labels(#[case] n: u64, #[case] expected: Option<&str>) {
        assert_eq!(like_label(n).as_deref(), expected);
    }
}
