use ndarray::{ArrayD, Axis, Ix3, IxDyn};

use super::catalog::VowelizerId;
use super::session::{first_output, InferenceModel, SessionError, TensorData};
use super::text::{is_arabic_letter, strip_diacritics, Script, Utterance};
use crate::{Stage, TtsError};

/// Diacritic emitted for each output class, in class order.
pub const DIACRITIC_CLASSES: [&str; 15] = [
    "",
    "\u{064E}",
    "\u{064B}",
    "\u{064F}",
    "\u{064C}",
    "\u{0650}",
    "\u{064D}",
    "\u{0652}",
    "\u{0651}",
    "\u{0651}\u{064E}",
    "\u{0651}\u{064B}",
    "\u{0651}\u{064F}",
    "\u{0651}\u{064C}",
    "\u{0651}\u{0650}",
    "\u{0651}\u{064D}",
];

/// Shared by both variants: unknown characters and padding.
const UNKNOWN_ID: i64 = 0;

/// Shakkala: a character's id is its position here plus one.
const SHAKKALA_ALPHABET: &str = " .،؛؟!ءآأؤإئابةتثجحخدذرزسشصضطظعغفقكلمنهوىي";

/// Shakkelha: 1 = space, 2..=38 = letters in code point order, then
/// punctuation.
const SHAKKELHA_SPACE_ID: i64 = 1;
const SHAKKELHA_PUNCTUATION: &str = ".،؛؟!";

fn shakkelha_letter_id(c: char) -> Option<i64> {
    match c {
        '\u{0621}'..='\u{063A}' => Some(2 + (c as i64 - 0x0621)),
        '\u{0641}'..='\u{064A}' => Some(28 + (c as i64 - 0x0641)),
        '\u{0671}' => Some(38),
        _ => None,
    }
}

/// Input id of `c` in the character table of `vowelizer`.
fn input_id(vowelizer: VowelizerId, c: char) -> i64 {
    let position = |alphabet: &str| alphabet.chars().position(|a| a == c);
    match vowelizer {
        VowelizerId::Shakkala => position(SHAKKALA_ALPHABET).map_or(UNKNOWN_ID, |i| i as i64 + 1),
        VowelizerId::Shakkelha => match c {
            ' ' => SHAKKELHA_SPACE_ID,
            _ => shakkelha_letter_id(c)
                .or_else(|| position(SHAKKELHA_PUNCTUATION).map(|i| 39 + i as i64))
                .unwrap_or(UNKNOWN_ID),
        },
    }
}

/// Character-level diacritization network (Shakkala, Shakkelha).
///
/// Input: `input` i64 `[1, T]`. Output: class scores `[1, T, 15]`.
pub struct Vowelizer {
    id: VowelizerId,
    model: Box<dyn InferenceModel>,
}

impl Vowelizer {
    pub fn new(id: VowelizerId, model: Box<dyn InferenceModel>) -> Self {
        Self { id, model }
    }

    /// Add diacritics to `utterance`. Existing marks are replaced.
    pub fn vocalize(&mut self, utterance: &Utterance) -> Result<Utterance, TtsError> {
        let bare = strip_diacritics(&utterance.in_script(Script::Arabic));
        let chars: Vec<char> = bare.chars().collect();
        if chars.is_empty() {
            return Ok(utterance.clone());
        }

        let classes = self
            .predict(&chars)
            .map_err(TtsError::inference(Stage::Vowelizer))?;

        let mut out = String::with_capacity(bare.len() * 2);
        for (&c, &class) in chars.iter().zip(&classes) {
            out.push(c);
            if is_arabic_letter(c) {
                out.push_str(DIACRITIC_CLASSES.get(class).copied().unwrap_or(""));
            }
        }

        log::debug!("{} vocalized {} characters", self.id, chars.len());
        Utterance::new(out)
    }

    fn predict(&mut self, chars: &[char]) -> Result<Vec<usize>, SessionError> {
        let ids: Vec<i64> = chars.iter().map(|&c| input_id(self.id, c)).collect();
        let input = ArrayD::from_shape_vec(IxDyn(&[1, ids.len()]), ids)?;

        let (name, scores) = first_output(self.model.run(vec![(
            "input".to_string(),
            TensorData::I64(input),
        )])?)?;
        let scores = scores.into_f32(&name)?;
        let shape = scores.shape().to_vec();
        if !matches!(shape.as_slice(), [1, t, _] if *t == chars.len()) {
            return Err(SessionError::BadShape { name, shape });
        }
        let scores = scores.into_dimensionality::<Ix3>()?;

        Ok(scores
            .index_axis(Axis(0), 0)
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0usize, f32::NEG_INFINITY), |best, (idx, &v)| {
                        if v > best.1 {
                            (idx, v)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }
}
