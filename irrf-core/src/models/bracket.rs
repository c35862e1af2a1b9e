use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A row of the progressive monthly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrfBracket {
    /// Inclusive upper limit of the net taxable base. `None` marks the
    /// unbounded top bracket.
    pub upper_limit: Option<Decimal>,
    /// Marginal rate in percent (e.g. `7.5`).
    pub rate: Decimal,
    /// Fixed amount subtracted after applying the rate.
    pub table_deduction: Decimal,
}

impl IrrfBracket {
    const fn bounded(
        upper_limit: Decimal,
        rate: Decimal,
        table_deduction: Decimal,
    ) -> Self {
        Self {
            upper_limit: Some(upper_limit),
            rate,
            table_deduction,
        }
    }

    fn covers(
        &self,
        base: Decimal,
    ) -> bool {
        self.upper_limit.is_some_and(|limit| base <= limit)
    }
}

/// Errors raised when building a custom [`BracketTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table is empty")]
    Empty,

    #[error("the last bracket must not have an upper limit")]
    BoundedTopBracket,

    #[error("bracket {0} has no upper limit but is not the last bracket")]
    UnboundedBeforeTop(usize),

    #[error("bracket {0} does not have a strictly increasing upper limit")]
    LimitsNotIncreasing(usize),

    #[error("bracket {0} has a rate outside 0..=100")]
    RateOutOfRange(usize),
}

/// An ordered, immutable progressive table.
///
/// Bounded brackets are scanned in order and the first one whose limit is
/// greater than or equal to the base wins; the unbounded top bracket is the
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTable {
    bounded: Cow<'static, [IrrfBracket]>,
    top: IrrfBracket,
}

static MONTHLY_BOUNDED: [IrrfBracket; 4] = [
    IrrfBracket::bounded(
        Decimal::from_parts(242880, 0, 0, false, 2),
        Decimal::ZERO,
        Decimal::ZERO,
    ),
    IrrfBracket::bounded(
        Decimal::from_parts(282665, 0, 0, false, 2),
        Decimal::from_parts(75, 0, 0, false, 1),
        Decimal::from_parts(18216, 0, 0, false, 2),
    ),
    IrrfBracket::bounded(
        Decimal::from_parts(375105, 0, 0, false, 2),
        Decimal::from_parts(15, 0, 0, false, 0),
        Decimal::from_parts(39416, 0, 0, false, 2),
    ),
    IrrfBracket::bounded(
        Decimal::from_parts(466468, 0, 0, false, 2),
        Decimal::from_parts(225, 0, 0, false, 1),
        Decimal::from_parts(67549, 0, 0, false, 2),
    ),
];

/// The monthly table in force since May 2025.
pub static MONTHLY_TABLE: BracketTable = BracketTable {
    bounded: Cow::Borrowed(&MONTHLY_BOUNDED),
    top: IrrfBracket {
        upper_limit: None,
        rate: Decimal::from_parts(275, 0, 0, false, 1),
        table_deduction: Decimal::from_parts(90873, 0, 0, false, 2),
    },
};

impl BracketTable {
    /// Builds a table from brackets sorted by ascending upper limit.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] if the table is empty, if the limits are
    /// not strictly increasing, if any bracket other than the last is
    /// unbounded, or if a rate is outside `0..=100`.
    pub fn new(mut brackets: Vec<IrrfBracket>) -> Result<Self, BracketTableError> {
        let top = brackets.pop().ok_or(BracketTableError::Empty)?;
        if top.upper_limit.is_some() {
            return Err(BracketTableError::BoundedTopBracket);
        }

        let hundred = Decimal::ONE_HUNDRED;
        let mut previous: Option<Decimal> = None;
        for (index, bracket) in brackets.iter().enumerate() {
            let position = index + 1;
            let limit = bracket
                .upper_limit
                .ok_or(BracketTableError::UnboundedBeforeTop(position))?;
            if previous.is_some_and(|p| limit <= p) {
                return Err(BracketTableError::LimitsNotIncreasing(position));
            }
            if bracket.rate < Decimal::ZERO || bracket.rate > hundred {
                return Err(BracketTableError::RateOutOfRange(position));
            }
            previous = Some(limit);
        }
        if top.rate < Decimal::ZERO || top.rate > hundred {
            return Err(BracketTableError::RateOutOfRange(brackets.len() + 1));
        }

        Ok(Self {
            bounded: Cow::Owned(brackets),
            top,
        })
    }

    /// Iterates over every bracket, top bracket last.
    pub fn iter(&self) -> impl Iterator<Item = &IrrfBracket> {
        self.bounded.iter().chain(std::iter::once(&self.top))
    }

    pub fn len(&self) -> usize {
        self.bounded.len() + 1
    }

    /// Always `false`; a table holds at least its top bracket.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Selects the bracket for `base`: the first bracket whose inclusive
    /// upper limit is at least `base`, otherwise the top bracket.
    pub fn select(
        &self,
        base: Decimal,
    ) -> &IrrfBracket {
        self.bounded
            .iter()
            .find(|bracket| bracket.covers(base))
            .unwrap_or(&self.top)
    }

    /// Read-only rows for display: rate, table deduction and a readable
    /// income range per bracket.
    pub fn rows(&self) -> Vec<BracketRow> {
        let cent = Decimal::new(1, 2);
        let mut lower: Option<Decimal> = None;

        self.iter()
            .enumerate()
            .map(|(index, bracket)| {
                let range = match (lower, bracket.upper_limit) {
                    (None, Some(upper)) => format!("up to {upper:.2}"),
                    (Some(low), Some(upper)) => format!("{:.2} to {upper:.2}", low + cent),
                    (Some(low), None) => format!("above {low:.2}"),
                    (None, None) => "any amount".to_string(),
                };
                if bracket.upper_limit.is_some() {
                    lower = bracket.upper_limit;
                }
                BracketRow {
                    position: index + 1,
                    rate: bracket.rate,
                    table_deduction: bracket.table_deduction,
                    range,
                }
            })
            .collect()
    }
}

/// Display row of a [`BracketTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRow {
    pub position: usize,
    pub rate: Decimal,
    pub table_deduction: Decimal,
    pub range: String,
}
