use std::collections::HashMap;

use super::text::{Script, Utterance};
use super::vocab::SymbolInventory;
use crate::TtsError;

/// Token ids for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence(Vec<i64>);

impl TokenSequence {
    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for TokenSequence {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}

/// Maps an [`Utterance`] to the token ids of one text -> mel network.
pub trait Tokenizer: Send + Sync {
    /// Script of the token table.
    fn script(&self) -> Script;

    fn tokenize(&self, utterance: &Utterance) -> Result<TokenSequence, TtsError>;
}

/// Character-level tokenizer over a [`SymbolInventory`].
#[derive(Debug, Clone)]
pub struct SymbolTokenizer {
    script: Script,
    table: HashMap<char, i64>,
}

impl SymbolTokenizer {
    pub fn new(script: Script, symbols: &SymbolInventory) -> Self {
        Self {
            script,
            table: symbols.table(script),
        }
    }
}

impl Tokenizer for SymbolTokenizer {
    fn script(&self) -> Script {
        self.script
    }

    /// Input written in the other convention is transliterated first.
    /// Whitespace runs collapse to one space; characters outside the table
    /// are dropped.
    fn tokenize(&self, utterance: &Utterance) -> Result<TokenSequence, TtsError> {
        let text = utterance.in_script(self.script);

        let mut ids = Vec::with_capacity(text.len());
        let mut dropped = 0usize;
        for word in text.split_whitespace() {
            if !ids.is_empty() {
                if let Some(&space) = self.table.get(&' ') {
                    ids.push(space);
                }
            }
            for c in word.chars() {
                match self.table.get(&c) {
                    Some(&id) => ids.push(id),
                    None => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            log::debug!("Dropped {dropped} characters without a token");
        }
        if ids.is_empty() {
            return Err(TtsError::validation(format!(
                "no synthesizable characters in input {:?}",
                utterance.text()
            )));
        }

        Ok(TokenSequence(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::arabic::vocab::hardcoded_symbols;

    fn tokenizers() -> (SymbolTokenizer, SymbolTokenizer) {
        let inv = hardcoded_symbols();
        (
            SymbolTokenizer::new(Script::Arabic, &inv),
            SymbolTokenizer::new(Script::Buckwalter, &inv),
        )
    }

    #[test]
    fn both_conventions_reach_the_same_tokens() {
        let (ar, bw) = tokenizers();
        let arabic = Utterance::new("سَلام").unwrap();
        let translit = Utterance::new("salAm").unwrap();

        let expected = bw.tokenize(&translit).unwrap();
        assert_eq!(expected.len(), 5);
        assert_eq!(ar.tokenize(&arabic).unwrap(), expected);
        assert_eq!(ar.tokenize(&translit).unwrap(), expected);
        assert_eq!(bw.tokenize(&arabic).unwrap(), expected);
    }

    #[test]
    fn collapses_whitespace_and_drops_unknown() {
        let (ar, _) = tokenizers();
        let spaced = ar.tokenize(&Utterance::new("  بب \n\t ب ").unwrap()).unwrap();
        let plain = ar.tokenize(&Utterance::new("بب ب").unwrap()).unwrap();
        assert_eq!(spaced, plain);

        let with_digits = ar.tokenize(&Utterance::new("بب 42 ب").unwrap()).unwrap();
        assert_eq!(with_digits.len(), plain.len() + 1);
    }

    #[test]
    fn empty_input_is_rejected() {
        let (ar, bw) = tokenizers();
        assert!(ar.tokenize(&Utterance::new("").unwrap()).unwrap_err().is_validation());
        assert!(bw.tokenize(&Utterance::new("123").unwrap()).unwrap_err().is_validation());
    }
}
