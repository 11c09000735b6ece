#![forbid(unsafe_code)]

//! Text direction lookup.

/// Horizontal text direction of a language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary subtags of right-to-left languages.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "arc", "ckb", "dv", "fa", "ha", "he", "iw", "khw", "ks", "ku", "ps", "sd", "ur", "uz-af",
    "yi",
];

/// Direction of a language tag. Unknown tags are left-to-right.
#[must_use]
pub fn direction(lng: &str) -> Direction {
    let lowered = lng.to_ascii_lowercase();
    let primary = lowered.split(['-', '_']).next().unwrap_or("");
    if RTL_LANGUAGES.contains(&lowered.as_str()) || RTL_LANGUAGES.contains(&primary) {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}
