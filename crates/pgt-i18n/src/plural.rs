#![forbid(unsafe_code)]

//! Plural rules.
//!
//! Maps a count to a CLDR plural category for a family of built-in rules.
//! Categories become key suffixes during lookup (`item_one`, `item_other`).
//! Negative counts categorize by absolute value.

/// CLDR plural category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// Key suffix for this category (without the separator).
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

/// Built-in plural rule families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluralRule {
    /// One for |n| == 1, Other otherwise. Also covers Germanic and most
    /// Romance languages besides French.
    English,
    /// One for |n| <= 1.
    French,
    /// One / Few / Many by tens-and-hundreds pattern.
    Russian,
    /// Zero / One / Two / Few / Many / Other.
    Arabic,
    /// No plural distinction: always Other.
    CJK,
    /// One / Few / Many.
    Polish,
}

impl PluralRule {
    /// Pick a rule for a locale tag. Unknown locales fall back to English.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        let primary = locale
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" | "pt" | "br" => Self::French,
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::Russian,
            "ar" => Self::Arabic,
            "ja" | "zh" | "ko" | "th" | "vi" | "id" | "ms" => Self::CJK,
            "pl" => Self::Polish,
            _ => Self::English,
        }
    }

    /// Categorize a count. Negative counts use the absolute value.
    #[must_use]
    pub fn categorize(self, count: i64) -> PluralCategory {
        let n = count.unsigned_abs();
        match self {
            Self::English => {
                if n == 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::French => {
                if n <= 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::Russian => {
                let tens = n % 10;
                let hundreds = n % 100;
                if tens == 1 && hundreds != 11 {
                    PluralCategory::One
                } else if (2..=4).contains(&tens) && !(12..=14).contains(&hundreds) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            Self::Arabic => {
                let hundreds = n % 100;
                match n {
                    0 => PluralCategory::Zero,
                    1 => PluralCategory::One,
                    2 => PluralCategory::Two,
                    _ if (3..=10).contains(&hundreds) => PluralCategory::Few,
                    _ if (11..=99).contains(&hundreds) => PluralCategory::Many,
                    _ => PluralCategory::Other,
                }
            }
            Self::CJK => PluralCategory::Other,
            Self::Polish => {
                let tens = n % 10;
                let hundreds = n % 100;
                if n == 1 {
                    PluralCategory::One
                } else if (2..=4).contains(&tens) && !(12..=14).contains(&hundreds) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
