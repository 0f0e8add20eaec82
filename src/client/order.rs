//! Target sequence and the win check.

use crate::model::Card;

pub const EXODIA_ORDER: [&str; 5] = [
    "EX Legendary 1/5",
    "EX Legendary 2/5",
    "EX Legendary 3/5",
    "EX Legendary 4/5",
    "EX Legendary 5/5",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Fewer cards than the target.
    Incomplete,
    Match,
    /// Same length or longer than the target, different titles.
    Mismatch,
}

/// What a successful select led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Pending,
    /// Summoned; a reset is scheduled.
    Won,
    /// Wrong order; the selection was reset.
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOrder {
    titles: Vec<String>,
}

impl Default for TargetOrder {
    fn default() -> Self { Self::new(EXODIA_ORDER) }
}

impl TargetOrder {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { titles: titles.into_iter().map(Into::into).collect() }
    }

    pub fn titles(&self) -> &[String] { &self.titles }

    pub fn len(&self) -> usize { self.titles.len() }

    pub fn is_empty(&self) -> bool { self.titles.is_empty() }

    pub fn judge(&self, selected: &[Card]) -> Verdict {
        if selected.len() < self.titles.len() {
            return Verdict::Incomplete;
        }
        let exact = selected.len() == self.titles.len()
            && selected.iter().zip(&self.titles).all(|(card, title)| card.title == *title);
        if exact { Verdict::Match } else { Verdict::Mismatch }
    }
}
