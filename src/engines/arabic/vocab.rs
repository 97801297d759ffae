use std::collections::HashMap;
use std::path::Path;

use super::text::{buckwalter_to_arabic_char, Script};
use crate::TtsError;

/// Token id reserved for padding. Never produced by tokenization.
pub const PAD_ID: i64 = 0;

/// Ordered symbol inventory of the text -> mel networks.
///
/// Symbols are Buckwalter characters; the id of a symbol is its position in
/// the list. Index 0 is the pad slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInventory {
    symbols: Vec<char>,
}

impl SymbolInventory {
    pub fn new(symbols: Vec<char>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Symbol -> id table for the given script.
    ///
    /// The Arabic table maps each Buckwalter symbol through transliteration
    /// and also accepts Arabic punctuation for its ASCII symbol.
    pub fn table(&self, script: Script) -> HashMap<char, i64> {
        let mut table = HashMap::with_capacity(self.symbols.len() + 3);
        for (idx, &symbol) in self.symbols.iter().enumerate() {
            let id = idx as i64;
            if id == PAD_ID {
                continue;
            }
            match script {
                Script::Buckwalter => {
                    table.insert(symbol, id);
                }
                Script::Arabic => {
                    let ar = buckwalter_to_arabic_char(symbol).unwrap_or(symbol);
                    table.insert(ar, id);
                    if let Some(alias) = arabic_punctuation(symbol) {
                        table.insert(alias, id);
                    }
                }
            }
        }
        table
    }
}

impl Default for SymbolInventory {
    fn default() -> Self {
        hardcoded_symbols()
    }
}

fn arabic_punctuation(c: char) -> Option<char> {
    match c {
        ',' => Some('\u{060C}'),
        ';' => Some('\u{061B}'),
        '?' => Some('\u{061F}'),
        _ => None,
    }
}

/// Load the symbol inventory from a config.json file.
///
/// The config.json must contain a `"symbols"` field: an array of
/// single-character strings in id order, starting with the pad symbol.
pub fn load_symbols(config_path: &Path) -> Result<SymbolInventory, TtsError> {
    let content = std::fs::read_to_string(config_path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| TtsError::Config(format!("Failed to parse JSON: {e}")))?;

    let list = json
        .get("symbols")
        .ok_or_else(|| TtsError::Config("Missing 'symbols' field".to_string()))?
        .as_array()
        .ok_or_else(|| TtsError::Config("'symbols' must be an array".to_string()))?;

    let mut symbols = Vec::with_capacity(list.len());
    for v in list {
        let s = v
            .as_str()
            .ok_or_else(|| TtsError::Config(format!("Non-string symbol {v}")))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => symbols.push(c),
            _ => {
                return Err(TtsError::Config(format!(
                    "Symbol {s:?} must be a single character"
                )))
            }
        }
    }

    if symbols.len() < 2 {
        return Err(TtsError::Config("Symbol list is empty".to_string()));
    }

    Ok(SymbolInventory::new(symbols))
}

/// Built-in inventory: pad, space, punctuation, Buckwalter letters and marks.
pub fn hardcoded_symbols() -> SymbolInventory {
    let mut symbols = vec!['\0', ' ', '.', ',', '?', '!', ';', ':', '-', '"'];
    symbols.extend("'|>&<}AbptvjHxd*rzs$SDTZEgfqklmnhwYy".chars());
    symbols.extend("FNKaui~o`{".chars());
    SymbolInventory::new(symbols)
}
