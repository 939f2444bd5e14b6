/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

//! Parsing and evaluation of dice roll expressions.
//!
//! An expression combines numbers, `+ - * /`, parentheses and the dice
//! operators `XdY` (roll X dice with Y sides and sum), `XhY` (highest),
//! `XlY` (lowest) and `XaY` (average). An `e` after the dice letter makes
//! the dice explode: a die landing on its maximum face rolls again and
//! adds the result, chaining while the maximum keeps coming up.
//!
//! A full roll request may hold several expressions separated by `;`.
//! Each clause accepts an `r<n>:` repetition prefix and a `[...]` filter
//! suffix reducing the repeated totals, e.g. `r6:3d6[>12c]`.
//!
//! Dice are drawn from an injected roller so evaluation is deterministic
//! under test; [`rolling::roll_die`] provides an unbiased rand-backed one.

pub mod dice_roll;
pub mod dice_types;
pub mod error;
pub mod limits;
pub mod tokenizer;

#[cfg(feature = "parser")]
pub mod parser;
#[cfg(feature = "parser")]
pub mod rolling;

pub use dice_roll::DiceExpressionParser;
pub use dice_types::{
    DiceExpression, DiceRolls, DiceType, FilterComparer, FilterType, FilteredOutput, Operation,
    ParserResult, ParserResultsFilter, Roll, Token,
};
pub use error::UserError;
pub use limits::Limits;
pub use tokenizer::tokenize;

#[cfg(feature = "parser")]
pub use rolling::{process_roll, ClauseOutcome};

#[cfg(all(feature = "parser", feature = "roll"))]
pub use rolling::roll_die;
