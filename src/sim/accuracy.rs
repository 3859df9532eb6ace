//! Stage resolution: how close was the stop?
//!
//! The stopped time and the target are compared as `D.DDD` strings, character
//! by character from the left. Matching is prefix-only: after the first
//! mismatch every later character counts as unmatched, even if it happens to
//! be equal.

use serde::{Deserialize, Serialize};

use super::clock::Millis;

/// Best possible stage (last digit of `D.DDD`)
pub const MAX_STAGE: u8 = 4;

/// One displayed character of the stopped time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitMatch {
    pub ch: char,
    pub matched: bool,
}

/// Per-character comparison of the stopped time against the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyMatch {
    /// Characters of the stopped time, annotated
    pub digits: Vec<DigitMatch>,
    /// Accuracy tier, 0 (worst) to `MAX_STAGE` (best)
    pub stage: u8,
}

impl AccuracyMatch {
    /// Number of leading characters that matched
    pub fn matched_len(&self) -> usize {
        self.digits.iter().take_while(|d| d.matched).count()
    }

    /// The matched prefix as a string
    pub fn matched_prefix(&self) -> String {
        self.digits
            .iter()
            .take_while(|d| d.matched)
            .map(|d| d.ch)
            .collect()
    }
}

/// Compare `elapsed` against `target`
///
/// `stage` is the index of the last matched character before the first
/// mismatch (0 when the very first character differs), capped at `MAX_STAGE`.
///
/// # Panics
///
/// Both strings must have the same length; callers format both with three
/// decimals first.
pub fn resolve(target: &str, elapsed: &str) -> AccuracyMatch {
    assert_eq!(
        target.chars().count(),
        elapsed.chars().count(),
        "accuracy operands must share one fixed-precision width"
    );

    let mut correct = true;
    let mut stage = 0usize;
    let digits = target
        .chars()
        .zip(elapsed.chars())
        .enumerate()
        .map(|(i, (want, got))| {
            if correct && want == got {
                stage = i;
            } else {
                correct = false;
            }
            DigitMatch {
                ch: got,
                matched: correct,
            }
        })
        .collect();

    AccuracyMatch {
        digits,
        stage: stage.min(MAX_STAGE as usize) as u8,
    }
}

/// Resolve two clock values rendered with three decimals
pub fn resolve_times(target: Millis, elapsed: Millis) -> AccuracyMatch {
    resolve(&target.to_string(), &elapsed.to_string())
}
