//! Text normalizer — noisy recognizer output to a canonical expression.
//!
//! Every recognition backend misreads a different set of glyphs, so each
//! one gets a [`NormalizationProfile`]: an ordered list of literal
//! substitutions. The surrounding steps (whitespace removal, decimal comma,
//! division mode, whitelist filter) are shared and always run in the same
//! order.

use regex::Regex;
use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

/// Characters a canonical expression may contain.
pub const WHITELIST: &str = "0123456789.+-*/()";

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.+\-*/()]").expect("whitelist pattern is valid"));

/// Ordered literal substitutions for one recognition backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationProfile {
    pub name: &'static str,
    pub rules: &'static [(&'static str, &'static str)],
}

/// Tesseract reads a handwritten `7` as `/1`; that rule must run before any
/// division-symbol mapping.
pub const TESSERACT: NormalizationProfile = NormalizationProfile {
    name: "tesseract",
    rules: &[
        ("—", "-"),
        ("/1", "7"),
        ("÷", "/"),
        ("x", "*"),
        ("X", "*"),
    ],
};

pub const HANDWRITING: NormalizationProfile = NormalizationProfile {
    name: "handwriting",
    rules: &[
        ("—", "-"),
        ("÷", "/"),
        ("x", "*"),
        ("X", "*"),
        ("_", "-"),
        ("~", "-"),
    ],
};

/// Vision models answer in prose-ish notation: `×`, `:` for division, and
/// a trailing `=` that is read as a division bar.
pub const VISION_LLM: NormalizationProfile = NormalizationProfile {
    name: "vision-llm",
    rules: &[
        ("—", "-"),
        ("÷", "/"),
        ("x", "*"),
        ("X", "*"),
        ("_", "-"),
        ("~", "-"),
        ("×", "*"),
        (":", "/"),
        ("=", "/"),
    ],
};

/// A string made only of [`WHITELIST`] characters.
///
/// Only [`normalize`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalExpression(String);

impl CanonicalExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for CanonicalExpression {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CanonicalExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw recognizer text.
///
/// Steps, in this exact order:
/// 1. drop all whitespace
/// 2. apply the profile rules, each one a full replace pass
/// 3. decimal comma → point
/// 4. in division mode, every `+` becomes `/`
/// 5. drop every character outside [`WHITELIST`]
pub fn normalize(
    raw_text: &str,
    profile: &NormalizationProfile,
    division_mode: bool,
) -> CanonicalExpression {
    let mut text: String = raw_text.chars().filter(|c| !c.is_whitespace()).collect();

    for (pattern, replacement) in profile.rules {
        if text.contains(pattern) {
            text = text.replace(pattern, replacement);
        }
    }

    text = text.replace(',', ".");

    if division_mode {
        text = text.replace('+', "/");
    }

    let canonical = DISALLOWED.replace_all(&text, "").into_owned();
    log::debug!(
        "[EXPR] normalize({}) {:?} -> {:?}",
        profile.name,
        raw_text,
        canonical
    );
    CanonicalExpression(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: [NormalizationProfile; 3] = [TESSERACT, HANDWRITING, VISION_LLM];

    #[test]
    fn strips_whitespace_and_letters() {
        assert_eq!(normalize(" 12 + 3\n", &TESSERACT, false).as_str(), "12+3");
        assert_eq!(normalize("abc", &TESSERACT, false).as_str(), "");
    }

    #[test]
    fn division_mode_rewrites_plus() {
        for profile in &PROFILES {
            assert_eq!(normalize("3+4", profile, true).as_str(), "3/4");
            assert_eq!(normalize("3+4", profile, false).as_str(), "3+4");
        }
    }

    #[test]
    fn tesseract_fixes_seven_before_division_symbol() {
        assert_eq!(normalize("/1x2", &TESSERACT, false).as_str(), "7*2");
        // `÷` maps to `/` after the `/1` rule, so it must not become `7`.
        assert_eq!(normalize("8÷1", &TESSERACT, false).as_str(), "8/1");
    }

    #[test]
    fn whitespace_removal_runs_before_substitution() {
        assert_eq!(normalize("4 / 1", &TESSERACT, false).as_str(), "47");
    }

    #[test]
    fn decimal_comma_becomes_point() {
        assert_eq!(normalize("3,5X2", &TESSERACT, false).as_str(), "3.5*2");
    }

    #[test]
    fn handwriting_maps_dashes() {
        assert_eq!(normalize("9_4~1", &HANDWRITING, false).as_str(), "9-4-1");
        // The tesseract profile has no dash rules; the glyphs are dropped.
        assert_eq!(normalize("9_4", &TESSERACT, false).as_str(), "94");
    }

    #[test]
    fn vision_profile_maps_llm_notation() {
        assert_eq!(normalize("6 × 7", &VISION_LLM, false).as_str(), "6*7");
        assert_eq!(normalize("8 : 2", &VISION_LLM, false).as_str(), "8/2");
        assert_eq!(normalize("12 = 4", &VISION_LLM, false).as_str(), "12/4");
        assert_eq!(normalize("10 — 3", &VISION_LLM, false).as_str(), "10-3");
    }

    #[test]
    fn division_mode_applies_after_substitutions() {
        // `+` introduced by nothing, `/` from `÷`: both end up as division.
        assert_eq!(normalize("8÷2+1", &VISION_LLM, true).as_str(), "8/2/1");
    }

    #[test]
    fn output_stays_inside_whitelist() {
        let noisy = "∑ 3x(4,2)÷ 7 = ? ½ é \t 9 ** ^ & %";
        for profile in &PROFILES {
            for division_mode in [false, true] {
                let out = normalize(noisy, profile, division_mode);
                assert!(
                    out.chars().all(|c| WHITELIST.contains(c)),
                    "{} produced {:?}",
                    profile.name,
                    out
                );
            }
        }
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = "12 x (3,5 — 1) ÷ 2";
        for profile in &PROFILES {
            let first = normalize(raw, profile, false);
            for _ in 0..5 {
                assert_eq!(normalize(raw, profile, false), first);
            }
        }
    }
}
