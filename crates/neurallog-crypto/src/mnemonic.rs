//! BIP-39 recovery phrases and recall quizzes
//!
//! Phrases are the human-memorable root of the tenant key hierarchy. The
//! quiz helpers back the "prove you wrote it down" flow during onboarding.

use bip39::{Language, Mnemonic};
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::errors::{CryptoError, Result};

/// Entropy sizes accepted by [`generate`]: 128 bits yields 12 words, 256
/// bits yields 24.
const VALID_STRENGTH_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Generate a fresh phrase with the given entropy strength in bits.
pub fn generate(strength_bits: usize) -> Result<String> {
    if !VALID_STRENGTH_BITS.contains(&strength_bits) {
        return Err(CryptoError::ConfigInvalid(format!(
            "mnemonic strength must be one of {:?} bits, got {}",
            VALID_STRENGTH_BITS, strength_bits
        )));
    }
    let word_count = strength_bits * 3 / 32;
    let mnemonic = Mnemonic::generate_in(Language::English, word_count)
        .map_err(|e| CryptoError::MnemonicInvalid(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Check word list membership, word count, and checksum.
pub fn validate(phrase: &str) -> bool {
    Mnemonic::parse_in(Language::English, phrase).is_ok()
}

/// Convert a validated phrase to the 64-byte BIP-39 seed
/// (PBKDF2-HMAC-SHA-512, salt `"mnemonic" + passphrase`, 2048 iterations).
pub fn phrase_to_seed(phrase: &str, passphrase: &str) -> Result<[u8; 64]> {
    let mnemonic = Mnemonic::parse_in(Language::English, phrase)
        .map_err(|e| CryptoError::MnemonicInvalid(e.to_string()))?;
    Ok(mnemonic.to_seed(passphrase))
}

/// One recall-quiz challenge: which word sits at `index`?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub index: usize,
    pub word: String,
}

/// Draw `count` challenges uniformly without replacement from the phrase.
pub fn quiz(phrase: &str, count: usize) -> Result<Vec<QuizQuestion>> {
    if !validate(phrase) {
        return Err(CryptoError::MnemonicInvalid("quiz source phrase".into()));
    }
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if count == 0 || count > words.len() {
        return Err(CryptoError::ConfigInvalid(format!(
            "quiz size must be 1..={}, got {}",
            words.len(),
            count
        )));
    }

    let mut questions: Vec<QuizQuestion> = sample(&mut rand::rngs::OsRng, words.len(), count)
        .into_iter()
        .map(|index| QuizQuestion {
            index,
            word: words[index].to_string(),
        })
        .collect();
    questions.sort_by_key(|q| q.index);
    Ok(questions)
}

/// True iff every answer names the word actually at its index.
pub fn verify_quiz(phrase: &str, answers: &[QuizQuestion]) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    answers.iter().all(|answer| {
        words
            .get(answer.index)
            .is_some_and(|word| *word == answer.word.trim().to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // From the BIP-39 reference vectors
    const PHRASE_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_word_counts() {
        let twelve = generate(128).unwrap();
        assert_eq!(twelve.split_whitespace().count(), 12);
        let twenty_four = generate(256).unwrap();
        assert_eq!(twenty_four.split_whitespace().count(), 24);
    }

    #[test]
    fn test_generate_is_valid() {
        assert!(validate(&generate(128).unwrap()));
        assert!(validate(&generate(256).unwrap()));
    }

    #[test]
    fn test_generate_rejects_odd_strength() {
        let err = generate(100).unwrap_err();
        assert_eq!(err.code(), "config_invalid");
    }

    #[test]
    fn test_validate_rejects_bad_checksum() {
        // Right word count, wrong final word
        let phrase =
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(!validate(phrase));
        assert!(!validate("not a mnemonic at all"));
    }

    #[test]
    fn test_phrase_to_seed_matches_reference_vector() {
        // Trezor test vector for the all-abandon phrase with passphrase TREZOR
        let seed = phrase_to_seed(PHRASE_12, "TREZOR").unwrap();
        assert_eq!(
            hex::encode(&seed[..16]),
            "c55257c360c07c72029aebc1b53c05ed"
        );
    }

    #[test]
    fn test_phrase_to_seed_deterministic() {
        let a = phrase_to_seed(PHRASE_12, "").unwrap();
        let b = phrase_to_seed(PHRASE_12, "").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, phrase_to_seed(PHRASE_12, "other").unwrap());
    }

    #[test]
    fn test_quiz_draws_without_replacement() {
        let questions = quiz(PHRASE_12, 5).unwrap();
        assert_eq!(questions.len(), 5);
        let mut indices: Vec<usize> = questions.iter().map(|q| q.index).collect();
        indices.dedup();
        assert_eq!(indices.len(), 5);
        assert!(indices.iter().all(|&i| i < 12));
    }

    #[test]
    fn test_quiz_bounds() {
        assert!(quiz(PHRASE_12, 0).is_err());
        assert!(quiz(PHRASE_12, 13).is_err());
        assert!(quiz("garbage phrase", 2).is_err());
    }

    #[test]
    fn test_verify_quiz() {
        let questions = quiz(PHRASE_12, 3).unwrap();
        assert!(verify_quiz(PHRASE_12, &questions));

        let mut wrong = questions.clone();
        wrong[0].word = "zebra".to_string();
        assert!(!verify_quiz(PHRASE_12, &wrong));
    }

    #[test]
    fn test_verify_quiz_normalizes_answers() {
        let answers = [QuizQuestion {
            index: 11,
            word: "  About ".to_string(),
        }];
        assert!(verify_quiz(PHRASE_12, &answers));
    }
}
