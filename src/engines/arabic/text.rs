//! Utterances, input conventions and Buckwalter transliteration.

use std::borrow::Cow;

use crate::TtsError;

/// Writing system of a token table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Arabic,
    Buckwalter,
}

/// How the caller wrote the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputConvention {
    /// Arabic script carrying at least one short-vowel mark.
    Diacritized,
    /// Arabic script without diacritics.
    Undiacritized,
    /// Buckwalter transliteration.
    Buckwalter,
}

impl InputConvention {
    pub fn script(self) -> Script {
        match self {
            Self::Diacritized | Self::Undiacritized => Script::Arabic,
            Self::Buckwalter => Script::Buckwalter,
        }
    }
}

/// (Buckwalter, Arabic)
const BUCKWALTER_TABLE: &[(char, char)] = &[
    ('\'', '\u{0621}'),
    ('|', '\u{0622}'),
    ('>', '\u{0623}'),
    ('&', '\u{0624}'),
    ('<', '\u{0625}'),
    ('}', '\u{0626}'),
    ('A', '\u{0627}'),
    ('b', '\u{0628}'),
    ('p', '\u{0629}'),
    ('t', '\u{062A}'),
    ('v', '\u{062B}'),
    ('j', '\u{062C}'),
    ('H', '\u{062D}'),
    ('x', '\u{062E}'),
    ('d', '\u{062F}'),
    ('*', '\u{0630}'),
    ('r', '\u{0631}'),
    ('z', '\u{0632}'),
    ('s', '\u{0633}'),
    ('$', '\u{0634}'),
    ('S', '\u{0635}'),
    ('D', '\u{0636}'),
    ('T', '\u{0637}'),
    ('Z', '\u{0638}'),
    ('E', '\u{0639}'),
    ('g', '\u{063A}'),
    ('_', '\u{0640}'),
    ('f', '\u{0641}'),
    ('q', '\u{0642}'),
    ('k', '\u{0643}'),
    ('l', '\u{0644}'),
    ('m', '\u{0645}'),
    ('n', '\u{0646}'),
    ('h', '\u{0647}'),
    ('w', '\u{0648}'),
    ('Y', '\u{0649}'),
    ('y', '\u{064A}'),
    ('F', '\u{064B}'),
    ('N', '\u{064C}'),
    ('K', '\u{064D}'),
    ('a', '\u{064E}'),
    ('u', '\u{064F}'),
    ('i', '\u{0650}'),
    ('~', '\u{0651}'),
    ('o', '\u{0652}'),
    ('`', '\u{0670}'),
    ('{', '\u{0671}'),
];

/// Arabic punctuation and its ASCII counterpart.
const PUNCTUATION_TABLE: &[(char, char)] = &[(',', '\u{060C}'), (';', '\u{061B}'), ('?', '\u{061F}')];

pub fn buckwalter_to_arabic_char(c: char) -> Option<char> {
    BUCKWALTER_TABLE
        .iter()
        .find(|(bw, _)| *bw == c)
        .map(|(_, ar)| *ar)
}

pub fn arabic_to_buckwalter_char(c: char) -> Option<char> {
    BUCKWALTER_TABLE
        .iter()
        .chain(PUNCTUATION_TABLE)
        .find(|(_, ar)| *ar == c)
        .map(|(bw, _)| *bw)
}

/// Transliterate Buckwalter to Arabic script. Unmapped characters pass through.
pub fn buckwalter_to_arabic(text: &str) -> String {
    text.chars()
        .map(|c| buckwalter_to_arabic_char(c).unwrap_or(c))
        .collect()
}

/// Transliterate Arabic script to Buckwalter. Unmapped characters pass through.
pub fn arabic_to_buckwalter(text: &str) -> String {
    text.chars()
        .map(|c| arabic_to_buckwalter_char(c).unwrap_or(c))
        .collect()
}

/// Arabic letter (hamza forms, base letters, alef wasla). Excludes tatweel.
pub fn is_arabic_letter(c: char) -> bool {
    matches!(c, '\u{0621}'..='\u{063A}' | '\u{0641}'..='\u{064A}' | '\u{0671}')
}

/// Short vowels, tanween, shadda, sukun and dagger alef.
pub fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}')
}

/// Remove every diacritic mark (and tatweel) from Arabic script.
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_diacritic(c) && c != '\u{0640}')
        .collect()
}

/// Immutable input text tagged with its convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
    convention: InputConvention,
}

impl Utterance {
    /// Detect the convention of `text`.
    ///
    /// Text mixing Arabic letters with Latin letters has no single token
    /// table and is rejected.
    pub fn new(text: impl Into<String>) -> Result<Self, TtsError> {
        let text = text.into();
        let has_arabic = text.chars().any(is_arabic_letter);
        let has_latin = text.chars().any(|c| c.is_ascii_alphabetic());

        let convention = match (has_arabic, has_latin) {
            (true, true) => {
                return Err(TtsError::validation(
                    "input mixes Arabic script and Latin transliteration",
                ))
            }
            (true, false) if text.chars().any(is_diacritic) => InputConvention::Diacritized,
            (false, true) => InputConvention::Buckwalter,
            _ => InputConvention::Undiacritized,
        };

        Ok(Self { text, convention })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn convention(&self) -> InputConvention {
        self.convention
    }

    /// The text in the requested script.
    pub fn in_script(&self, script: Script) -> Cow<'_, str> {
        match (self.convention.script(), script) {
            (Script::Arabic, Script::Buckwalter) => Cow::Owned(arabic_to_buckwalter(&self.text)),
            (Script::Buckwalter, Script::Arabic) => Cow::Owned(buckwalter_to_arabic(&self.text)),
            _ => Cow::Borrowed(&self.text),
        }
    }
}
