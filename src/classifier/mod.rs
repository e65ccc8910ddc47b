//! Console line classification
//!
//! Turns one line of server output into at most one typed [`Action`].
//! Classification is stateless: every line is matched on its own, so a
//! stream that drops or repeats lines never confuses later lines.

mod action;
mod patterns;

pub use action::Action;
pub use patterns::{classify, strip_prefix};

/// Classify every line of an iterator.
pub fn classify_lines<'a, I>(lines: I) -> impl Iterator<Item = Action> + 'a
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    lines.into_iter().map(classify)
}
