use std::fmt::{self, Display};

use crate::position::GridPosition;

/// Error taxonomy for the collapse process.
///
/// Every variant here is surfaced to a caller as a `Result { success: false,
/// error_message, .. }` (see [`crate::settings::GenerationResult`]) rather
/// than as a panic or process abort - nothing in this crate aborts the
/// process.
#[derive(Debug)]
pub enum CollapseError {
    /// [`crate::cell::Cell::collapse`] was asked to collapse into a state
    /// that was not among the cell's possible states.
    InvalidCollapse { state: usize },
    /// A cell's possible set became empty, either at the selected cell
    /// (`None`) or somewhere reached during propagation (`Some(pos)`).
    Contradiction {
        position: Option<GridPosition>,
        attempt: u32,
    },
    /// The cancellation signal fired before generation finished.
    Cancelled,
    /// `Settings` named no tiles at all; there is nothing to collapse.
    EmptyConfiguration,
    /// The retry budget was exhausted after repeated contradictions.
    RetryBudgetExhausted { attempts: u32 },
}

impl Display for CollapseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCollapse { state } => {
                write!(f, "cannot collapse into state {state}: not among the cell's possible states")
            }
            Self::Contradiction { position: Some(pos), attempt } => write!(
                f,
                "tile at position {pos:?} has no options left on attempt {attempt}"
            ),
            Self::Contradiction { position: None, attempt } => {
                write!(f, "contradiction on attempt {attempt} before any tile collapsed")
            }
            Self::Cancelled => write!(f, "Operation canceled"),
            Self::EmptyConfiguration => write!(f, "no tiles were provided in the configuration"),
            Self::RetryBudgetExhausted { attempts } => {
                write!(f, "Contradiction after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for CollapseError {}
