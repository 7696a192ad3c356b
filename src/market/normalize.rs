//! Canonicalizes item names typed into chat before they hit the market.
//!
//! The market matches `market_hash_name` by exact string, and mobile keyboards
//! love to replace `'` with `’`. Without this, "Malefic Drake’s Hood" silently
//! returns no listing.

use crate::market::models::NormalizedName;
use unicode_normalization::UnicodeNormalization;

/// Normalizes a raw item name: straight quotes, NFKC, trimmed.
pub fn normalize(raw: &str) -> NormalizedName {
    let straightened: String = raw
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect();

    let composed: String = straightened.nfkc().collect();
    NormalizedName::new(composed.trim())
}
