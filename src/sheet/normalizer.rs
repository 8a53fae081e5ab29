use regex::Regex;
use std::sync::OnceLock;

// Half-width and full-width sentence punctuation plus the ellipsis.
const PUNCTUATION_CLASS: &str = r"[,\.!?;:，。、…]";

fn space_before_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\s+({})", PUNCTUATION_CLASS)).expect("static punctuation regex")
    })
}

fn space_after_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"({})\s+", PUNCTUATION_CLASS)).expect("static punctuation regex")
    })
}

fn multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("static space regex"))
}

/// Cleans essay text before it is laid onto the answer grid.
///
/// Whitespace touching sentence punctuation is removed on both sides, so every
/// punctuation mark shares no cell with a blank. Runs of plain spaces collapse
/// to one. The result is stable under repeated application.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let step1 = space_before_punctuation().replace_all(trimmed, "$1");
    let step2 = space_after_punctuation().replace_all(&step1, "$1");
    multi_space().replace_all(&step2, " ").into_owned()
}
