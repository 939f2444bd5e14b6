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

use thiserror::Error;

/// Expected, input-driven failure. Every variant renders a message fit for
/// direct display to the user, carrying the offending expression where one
/// is available.
///
/// Defects are not represented here: anything that is not raised on purpose
/// surfaces as a panic and is only translated to [`UserError::Unhandled`] at
/// the outermost driver boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Expression is too long. Maximum length is {max} in \"{expression}\"")]
    ExpressionTooLong { max: usize, expression: String },
    #[error("Number cannot start with decimal point. in \"{expression}\"")]
    LeadingDecimalPoint { expression: String },
    #[error("Too many decimal points in \"{expression}\"")]
    RepeatedDecimalPoint { expression: String },
    #[error("Number cannot end with decimal point. in \"{expression}\"")]
    TrailingDecimalPoint { expression: String },
    #[error("Invalid operator placement: \"{operator}\" in \"{expression}\"")]
    OperatorPlacement { operator: char, expression: String },
    #[error("Invalid explode operator placement in \"{expression}\"")]
    ExplodePlacement { expression: String },
    #[error("Invalid character: \"{character}\" in \"{expression}\"")]
    InvalidCharacter { character: char, expression: String },
    #[error("Expression cannot end with an operator or dice: \"{last}\" in \"{expression}\"")]
    EndsWithOperator { last: char, expression: String },
    #[error("Subexpression starts or ends on operator in \"{expression}\"")]
    OperatorAtBoundary { expression: String },
    #[error("Extra closing parentheses in \"{expression}\"")]
    ExtraClosingParentheses { expression: String },
    #[error("Extra opening parentheses in \"{expression}\"")]
    ExtraOpeningParentheses { expression: String },
    #[error("Empty parentheses in \"{expression}\"")]
    EmptyParentheses { expression: String },
    #[error("Invalid number of dice or sides: \"{dice}\" in \"{expression}\"")]
    InvalidDice { dice: String, expression: String },
    #[error(
        "Too big number of dice or sides: \"{dice}\". Maximum is {max_count}d{max_sides} in \"{expression}\""
    )]
    TooBigDice {
        dice: String,
        max_count: u64,
        max_sides: u64,
        expression: String,
    },
    #[error("Division by zero in \"{expression}\"")]
    DivisionByZero { expression: String },
    #[error("Invalid calculation result in \"{expression}\"")]
    InvalidCalculationResult { expression: String },
    #[error("At least one operator is skipped in \"{expression}\"")]
    OperatorSkipped { expression: String },
    #[error("Cannot repeat {expression} {times} times")]
    CannotRepeat { expression: String, times: u64 },
    #[error("Too much repetition ({times}). Maximum is {max}")]
    TooMuchRepetition { times: u64, max: u64 },
    #[error("Invalid filter comparer: {comparer}")]
    InvalidFilterComparer { comparer: String },
    #[error("Invalid filter expression: {filter}")]
    InvalidFilter { filter: String },
    #[error("Congrats! You occurred unhandled error with your \"{expression}\"!")]
    Unhandled { expression: String },
}

impl UserError {
    /// The expression the error was raised for, when one is attached.
    pub fn expression(&self) -> Option<&str> {
        match self {
            UserError::EmptyExpression
            | UserError::TooMuchRepetition { .. }
            | UserError::InvalidFilterComparer { .. }
            | UserError::InvalidFilter { .. } => None,
            UserError::ExpressionTooLong { expression, .. }
            | UserError::LeadingDecimalPoint { expression }
            | UserError::RepeatedDecimalPoint { expression }
            | UserError::TrailingDecimalPoint { expression }
            | UserError::OperatorPlacement { expression, .. }
            | UserError::ExplodePlacement { expression }
            | UserError::InvalidCharacter { expression, .. }
            | UserError::EndsWithOperator { expression, .. }
            | UserError::OperatorAtBoundary { expression }
            | UserError::ExtraClosingParentheses { expression }
            | UserError::ExtraOpeningParentheses { expression }
            | UserError::EmptyParentheses { expression }
            | UserError::InvalidDice { expression, .. }
            | UserError::TooBigDice { expression, .. }
            | UserError::DivisionByZero { expression }
            | UserError::InvalidCalculationResult { expression }
            | UserError::OperatorSkipped { expression }
            | UserError::CannotRepeat { expression, .. }
            | UserError::Unhandled { expression } => Some(expression),
        }
    }
}
