//! Arabic-script phonetic transliteration.
//!
//! Converts Arabic text into an approximate phonetic rendering in Hebrew or
//! Latin letters, character by character, using a fixed substitution table.
//! There is no phonological or contextual awareness: each source character is
//! replaced independently, and any character without a table entry (digits,
//! whitespace, punctuation, non-Arabic letters) passes through unchanged.
//!
//! The transform is direction-agnostic — output units concatenate in input
//! order. Display directionality (Arabic and Hebrew render right-to-left) is
//! a presentation concern for the client.
//!
//! Several distinct Arabic letters intentionally collapse to the same target
//! symbol (e.g. ص and ط lose their emphatic marking in the Latin table), so
//! the mapping has no inverse. Do not attempt to map transliterated text
//! back to Arabic.

/// An immutable mapping from single Arabic characters to target-script
/// strings. Both tables are static data, built into the binary; lookups for
/// absent keys fall back to the original character.
pub struct TransliterationTable {
    target: &'static str,
    entries: &'static [(char, &'static str)],
}

impl TransliterationTable {
    /// Human-readable name of the destination script (`"hebrew"` / `"latin"`).
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Look up the target string for a single source character.
    /// Returns `None` for characters the table does not map.
    pub fn get(&self, c: char) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == c)
            .map(|(_, out)| *out)
    }
}

/// Arabic → Hebrew. Marked letters use U+05F3 (geresh), not an ASCII
/// apostrophe — downstream consumers depend on the exact code points.
pub static ARABIC_TO_HEBREW: TransliterationTable = TransliterationTable {
    target: "hebrew",
    entries: &[
        ('ا', "א"),
        ('ب', "ב"),
        ('ت', "ת"),
        ('ث', "ת׳"),
        ('ج', "ג"),
        ('ح', "ח"),
        ('خ', "כ׳"),
        ('د', "ד"),
        ('ذ', "ד׳"),
        ('ر', "ר"),
        ('ز', "ז"),
        ('س', "ס"),
        ('ش', "ש"),
        ('ص', "צ"),
        ('ض', "צ׳"),
        ('ط', "ט"),
        ('ظ', "ט׳"),
        ('ع', "ע"),
        ('غ', "ע׳"),
        ('ف', "פ"),
        ('ق', "ק"),
        ('ك', "כ"),
        ('ل', "ל"),
        ('م', "מ"),
        ('ن', "נ"),
        ('ه', "ה"),
        ('و', "ו"),
        ('ي', "י"),
        ('ء', "׳"),
        ('ئ', "׳"),
        ('ى', "י"),
        ('ة', "ה"),
    ],
};

/// Arabic → Latin (English).
pub static ARABIC_TO_LATIN: TransliterationTable = TransliterationTable {
    target: "latin",
    entries: &[
        ('ا', "a"),
        ('ب', "b"),
        ('ت', "t"),
        ('ث', "th"),
        ('ج', "j"),
        ('ح', "h"),
        ('خ', "kh"),
        ('د', "d"),
        ('ذ', "dh"),
        ('ر', "r"),
        ('ز', "z"),
        ('س', "s"),
        ('ش', "sh"),
        ('ص', "s"),
        ('ض', "d"),
        ('ط', "t"),
        ('ظ', "th"),
        ('ع', "a'"),
        ('غ', "gh"),
        ('ف', "f"),
        ('ق', "q"),
        ('ك', "k"),
        ('ل', "l"),
        ('م', "m"),
        ('ن', "n"),
        ('ه', "h"),
        ('و', "w"),
        ('ي', "y"),
        ('ء', "'"),
        ('ئ', "i"),
        ('ى', "a"),
        ('ة', "h"),
    ],
};

/// Transliterate `text` through `table`, one character at a time.
///
/// Total over all Unicode input: never fails, has no side effects, and maps
/// the empty string to the empty string. Each input character produces
/// exactly one output unit (possibly multi-character), in input order.
pub fn transliterate(text: &str, table: &TransliterationTable) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match table.get(ch) {
            Some(mapped) => out.push_str(mapped),
            None => out.push(ch),
        }
    }
    out
}

/// Target script requested by a caller. Exactly three selector strings are
/// recognized on the wire; anything else is rejected at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScript {
    /// No transformation — the answer stays in Arabic script.
    Arabic,
    /// Arabic → Hebrew letters.
    Hebrew,
    /// Arabic → Latin letters.
    Latin,
}

/// Selector values accepted by [`TargetScript::parse`], for error messages.
pub const SELECTORS: [&str; 3] = ["arabic", "transliteration-hebrew", "transliteration-english"];

impl TargetScript {
    /// Parse a wire selector. Returns `None` for unrecognized values.
    pub fn parse(selector: &str) -> Option<TargetScript> {
        match selector {
            "arabic" => Some(TargetScript::Arabic),
            "transliteration-hebrew" => Some(TargetScript::Hebrew),
            "transliteration-english" => Some(TargetScript::Latin),
            _ => None,
        }
    }

    /// Render answer text in this script. Passthrough for [`TargetScript::Arabic`].
    pub fn render(&self, text: &str) -> String {
        match self {
            TargetScript::Arabic => text.to_string(),
            TargetScript::Hebrew => transliterate(text, &ARABIC_TO_HEBREW),
            TargetScript::Latin => transliterate(text, &ARABIC_TO_LATIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hebrew_word() {
        assert_eq!(transliterate("ابن", &ARABIC_TO_HEBREW), "אבנ");
    }

    #[test]
    fn test_latin_word() {
        assert_eq!(transliterate("كتاب", &ARABIC_TO_LATIN), "ktab");
    }

    #[test]
    fn test_mixed_content_passes_through() {
        // Digits and spaces have no table entry and must survive unchanged,
        // in position.
        assert_eq!(transliterate("مرحبا 123", &ARABIC_TO_LATIN), "mrhba 123");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(transliterate("", &ARABIC_TO_HEBREW), "");
        assert_eq!(transliterate("", &ARABIC_TO_LATIN), "");
    }

    #[test]
    fn test_unmapped_text_is_identity() {
        let text = "hello, world! 42 שלום";
        assert_eq!(transliterate(text, &ARABIC_TO_HEBREW), text);
        assert_eq!(transliterate(text, &ARABIC_TO_LATIN), text);
    }

    #[test]
    fn test_multi_char_expansions() {
        // ث expands to two code points in both tables.
        assert_eq!(transliterate("ث", &ARABIC_TO_HEBREW), "ת׳");
        assert_eq!(transliterate("ث", &ARABIC_TO_LATIN), "th");
    }

    #[test]
    fn test_hebrew_uses_geresh() {
        // U+05F3, not U+0027.
        assert_eq!(transliterate("خ", &ARABIC_TO_HEBREW), "כ\u{05F3}");
        assert_eq!(transliterate("ء", &ARABIC_TO_HEBREW), "\u{05F3}");
    }

    #[test]
    fn test_deterministic() {
        let text = "السلام عليكم";
        let first = transliterate(text, &ARABIC_TO_LATIN);
        let second = transliterate(text, &ARABIC_TO_LATIN);
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_output_unit_per_input_char() {
        // Every input character maps to exactly one (possibly multi-char)
        // output unit, so per-char concatenation equals whole-string output.
        let text = "ذهب الطالب إلى المدرسة 3 مرات";
        for table in [&ARABIC_TO_HEBREW, &ARABIC_TO_LATIN] {
            let whole = transliterate(text, table);
            let per_char: String = text
                .chars()
                .map(|c| transliterate(&c.to_string(), table))
                .collect();
            assert_eq!(whole, per_char);
        }
    }

    #[test]
    fn test_ambiguous_letters_collapse() {
        // ص and the emphatic ط lose their distinction in the Latin table;
        // the collapse is part of the contract, not a defect.
        assert_eq!(transliterate("ص", &ARABIC_TO_LATIN), "s");
        assert_eq!(transliterate("س", &ARABIC_TO_LATIN), "s");
        assert_eq!(transliterate("ط", &ARABIC_TO_LATIN), "t");
        assert_eq!(transliterate("ت", &ARABIC_TO_LATIN), "t");
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(ARABIC_TO_HEBREW.get('ا'), Some("א"));
        assert_eq!(ARABIC_TO_LATIN.get('ش'), Some("sh"));
        assert_eq!(ARABIC_TO_LATIN.get('x'), None);
        assert_eq!(ARABIC_TO_HEBREW.get(' '), None);
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(TargetScript::parse("arabic"), Some(TargetScript::Arabic));
        assert_eq!(
            TargetScript::parse("transliteration-hebrew"),
            Some(TargetScript::Hebrew)
        );
        assert_eq!(
            TargetScript::parse("transliteration-english"),
            Some(TargetScript::Latin)
        );
        assert_eq!(TargetScript::parse("hebrew"), None);
        assert_eq!(TargetScript::parse(""), None);
    }

    #[test]
    fn test_render_passthrough() {
        let answer = "مرحبا";
        assert_eq!(TargetScript::Arabic.render(answer), answer);
        assert_eq!(TargetScript::Latin.render(answer), "mrhba");
    }
}
