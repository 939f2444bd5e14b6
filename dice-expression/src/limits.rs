#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hard ceilings for a single roll request. These are enforced limits, not
/// hints: any expression exceeding them is rejected with a user error, which
/// is also what bounds the total work of one call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limits {
    pub max_dice_count: u64,
    pub max_dice_sides: u64,
    pub max_expression_length: usize,
    pub max_repetitions: u64,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_dice_count: 5000,
            max_dice_sides: 5000,
            max_expression_length: 100,
            max_repetitions: 1000,
        }
    }
}
