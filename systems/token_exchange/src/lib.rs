#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure token exchange rules evaluated when the player clicks a cell.
//!
//! The machine carries no state of its own: [`resolve`] maps the held token,
//! the clicked cell's value and its range status onto the resulting pair, and
//! [`WinCondition`] settles the hand once the exchange has been applied.

use geo_merge_core::{CellValue, ClickIgnoredReason, Token};

/// Kind of exchange that took place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// Held token and cell token were equal and combined into the hand.
    Merge,
    /// An empty hand took the cell's token.
    Pickup,
    /// The held token was dropped into an empty cell.
    Place,
}

/// Result of applying an exchange to the held token and cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Exchange rule that matched.
    pub exchange: Exchange,
    /// Token held after the exchange.
    pub held: Option<Token>,
    /// Cell contents after the exchange.
    pub cell: CellValue,
}

impl Transition {
    /// Token that moved or was produced by the exchange.
    ///
    /// For merges this is the doubled token now in hand, for pickups the
    /// token taken from the cell and for placements the token left behind.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.exchange {
            Exchange::Merge | Exchange::Pickup => self.held,
            Exchange::Place => self.cell.token(),
        }
    }
}

/// Outcome of a click after the exchange rules were evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// One of the exchange rules matched.
    Applied(Transition),
    /// The click is a defined no-op.
    Ignored(ClickIgnoredReason),
}

/// Evaluates the exchange rules in priority order: merge, pickup, place.
///
/// Out-of-range cells never transition. Merging two tokens whose doubled rank
/// cannot be represented is treated as having no matching rule.
#[must_use]
pub fn resolve(held: Option<Token>, cell: CellValue, in_range: bool) -> Outcome {
    if !in_range {
        return Outcome::Ignored(ClickIgnoredReason::OutOfRange);
    }

    match (held, cell.token()) {
        (Some(held), Some(on_cell)) if held == on_cell => match held.doubled() {
            Some(merged) => Outcome::Applied(Transition {
                exchange: Exchange::Merge,
                held: Some(merged),
                cell: CellValue::EMPTY,
            }),
            None => Outcome::Ignored(ClickIgnoredReason::NoTransition),
        },
        (None, Some(on_cell)) => Outcome::Applied(Transition {
            exchange: Exchange::Pickup,
            held: Some(on_cell),
            cell: CellValue::EMPTY,
        }),
        (Some(held), None) => Outcome::Applied(Transition {
            exchange: Exchange::Place,
            held: None,
            cell: CellValue::holding(held),
        }),
        _ => Outcome::Ignored(ClickIgnoredReason::NoTransition),
    }
}

/// Win rule applied to the hand after every exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinCondition {
    threshold: u32,
    starting: Option<Token>,
}

impl WinCondition {
    /// Creates a rule that resets the hand to `starting` at `threshold`.
    #[must_use]
    pub const fn new(threshold: u32, starting: Option<Token>) -> Self {
        Self {
            threshold,
            starting,
        }
    }

    /// Token the hand is reset to after a win.
    #[must_use]
    pub const fn starting(&self) -> Option<Token> {
        self.starting
    }

    /// Returns the settled hand and, on a win, the token that crossed the threshold.
    #[must_use]
    pub fn settle(&self, held: Option<Token>) -> (Option<Token>, Option<Token>) {
        match held {
            Some(token) if token.value() >= self.threshold => (self.starting, Some(token)),
            _ => (held, None),
        }
    }
}
