use crate::model::{Category, GENERAL_CATEGORY};
use crate::utils::same_name;

/// The outcome of mapping a guessed category name onto the caller's categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedCategory<'a> {
    /// A category whose name equals the guess, ignoring case.
    Matched(&'a Category),
    /// No match; the first category of the list was used.
    FirstAvailable(&'a Category),
    /// No match and the list was empty. The transaction is filed under `"General"`, which has no
    /// entry in the category table.
    General,
}

impl<'a> ResolvedCategory<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            ResolvedCategory::Matched(c) | ResolvedCategory::FirstAvailable(c) => c.name(),
            ResolvedCategory::General => GENERAL_CATEGORY,
        }
    }

    pub fn category(&self) -> Option<&'a Category> {
        match *self {
            ResolvedCategory::Matched(c) | ResolvedCategory::FirstAvailable(c) => Some(c),
            ResolvedCategory::General => None,
        }
    }
}

/// Resolves `guess` against `available`. Never fails: an absent or unknown guess falls back to the
/// first available category, or to `"General"` when there are none. There is no partial matching.
pub fn resolve<'a>(guess: Option<&str>, available: &'a [Category]) -> ResolvedCategory<'a> {
    let matched = guess
        .filter(|g| !g.trim().is_empty())
        .and_then(|g| available.iter().find(|c| same_name(c.name(), g)));
    match (matched, available.first()) {
        (Some(c), _) => ResolvedCategory::Matched(c),
        (None, Some(first)) => ResolvedCategory::FirstAvailable(first),
        (None, None) => ResolvedCategory::General,
    }
}
