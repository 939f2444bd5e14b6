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

use crate::{
    dice_types::{DiceType, Operation, Token},
    error::UserError,
};

const DIGITS: &str = "0123456789.";
const EXPLODE: char = 'e';

/// Buffer for the numeric literal currently being scanned. At most one
/// decimal point, which may neither open nor close the literal.
struct CurrentNumber<'e> {
    value: String,
    expr: &'e str,
}

impl<'e> CurrentNumber<'e> {
    fn new(expr: &'e str) -> CurrentNumber<'e> {
        CurrentNumber {
            value: String::new(),
            expr,
        }
    }

    fn append(&mut self, digit: char) -> Result<(), UserError> {
        if digit == '.' {
            if self.value.is_empty() {
                return Err(UserError::LeadingDecimalPoint {
                    expression: self.expr.to_string(),
                });
            }
            if self.value.contains('.') {
                return Err(UserError::RepeatedDecimalPoint {
                    expression: self.expr.to_string(),
                });
            }
        }
        self.value.push(digit);
        Ok(())
    }

    fn pop(&mut self) -> Result<f64, UserError> {
        if self.value.ends_with('.') {
            return Err(UserError::TrailingDecimalPoint {
                expression: self.expr.to_string(),
            });
        }
        let number: f64 = self
            .value
            .parse()
            .expect("buffered digits always form a valid number");
        self.value.clear();
        Ok(number)
    }

    fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Splits an expression into its token sequence, failing on any character
/// or placement the expression grammar does not allow.
///
/// A dice letter without a preceding number gets an implicit count of 1,
/// unless it directly follows a closing parenthesis (then the parenthesized
/// value is the count).
pub fn tokenize(expr: &str) -> Result<Vec<Token>, UserError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current = CurrentNumber::new(expr);

    for c in expr.chars() {
        if DIGITS.contains(c) {
            current.append(c)?;
        } else if let Some(dice) = DiceType::from_char(c) {
            if tokens.last() != Some(&Token::Close) {
                let count = if current.is_empty() {
                    1.0
                } else {
                    current.pop()?
                };
                tokens.push(Token::Number(count));
            }
            tokens.push(Token::Dice {
                dice,
                explode: false,
            });
        } else if let Some(operation) = Operation::from_char(c) {
            if !current.is_empty() {
                tokens.push(Token::Number(current.pop()?));
            }
            match tokens.last() {
                None | Some(Token::Operator(_)) | Some(Token::Dice { .. }) => {
                    return Err(UserError::OperatorPlacement {
                        operator: c,
                        expression: expr.to_string(),
                    });
                }
                _ => {}
            }
            tokens.push(Token::Operator(operation));
        } else if c == '(' || c == ')' {
            if !current.is_empty() {
                tokens.push(Token::Number(current.pop()?));
            }
            tokens.push(if c == '(' { Token::Open } else { Token::Close });
        } else if c == EXPLODE {
            match tokens.last_mut() {
                Some(Token::Dice { explode, .. }) if current.is_empty() => *explode = true,
                _ => {
                    return Err(UserError::ExplodePlacement {
                        expression: expr.to_string(),
                    });
                }
            }
        } else {
            return Err(UserError::InvalidCharacter {
                character: c,
                expression: expr.to_string(),
            });
        }
    }

    if !current.is_empty() {
        tokens.push(Token::Number(current.pop()?));
    } else {
        // an expression may end on a number or parenthesis, never
        // mid-operation
        match tokens.last() {
            Some(Token::Operator(operation)) => {
                return Err(UserError::EndsWithOperator {
                    last: operation.as_char(),
                    expression: expr.to_string(),
                });
            }
            Some(Token::Dice { dice, .. }) => {
                return Err(UserError::EndsWithOperator {
                    last: dice.as_char(),
                    expression: expr.to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(tokens)
}
