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
    dice_types::{DiceRolls, DiceType, Operation, ParserResult, Roll, Token},
    error::UserError,
    limits::Limits,
    tokenizer::tokenize,
};

#[cfg(feature = "logging")]
use log::debug;

/// Evaluates dice expressions against an injected dice roller.
///
/// The roller must return a uniformly distributed value in `[1, sides]`.
/// One instance can be reused for any number of `parse` calls; every call
/// starts with a fresh roll log.
pub struct DiceExpressionParser<F> {
    dice_roller: F,
    limits: Limits,
    dice_rolls: Vec<DiceRolls>,
}

impl<F> DiceExpressionParser<F>
where
    F: FnMut(u64) -> u64,
{
    pub fn new(dice_roller: F) -> DiceExpressionParser<F> {
        DiceExpressionParser::with_limits(dice_roller, Limits::default())
    }

    pub fn with_limits(dice_roller: F, limits: Limits) -> DiceExpressionParser<F> {
        DiceExpressionParser {
            dice_roller,
            limits,
            dice_rolls: Vec::new(),
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Evaluates `expression` to its total, along with every roll group
    /// produced on the way, left to right with parenthesized spans first.
    pub fn parse(&mut self, expression: &str) -> Result<ParserResult, UserError> {
        if expression.is_empty() {
            return Err(UserError::EmptyExpression);
        }
        if expression.chars().count() > self.limits.max_expression_length {
            return Err(UserError::ExpressionTooLong {
                max: self.limits.max_expression_length,
                expression: expression.to_string(),
            });
        }

        self.dice_rolls.clear();
        let tokens = tokenize(expression)?;
        let total = self.eval(tokens, expression)?;
        Ok(ParserResult {
            total_sum: total,
            roll_outputs: std::mem::take(&mut self.dice_rolls),
        })
    }

    /// One full reduction of a token sequence: parentheses, dice,
    /// multiplicative operators, additive operators. Called recursively
    /// for every parenthesized span.
    fn eval(&mut self, tokens: Vec<Token>, expression: &str) -> Result<f64, UserError> {
        if matches!(tokens.first(), Some(Token::Operator(_)))
            || matches!(tokens.last(), Some(Token::Operator(_)))
        {
            return Err(UserError::OperatorAtBoundary {
                expression: expression.to_string(),
            });
        }

        let tokens = self.reduce_parentheses(tokens, expression)?;
        let tokens = self.reduce_dice(tokens, expression)?;
        let tokens = reduce_operations(tokens, &[Operation::Mul, Operation::Div], expression)?;
        let tokens = reduce_operations(tokens, &[Operation::Add, Operation::Sub], expression)?;

        // adjacent operands without an operator survive the passes, e.g.
        // `(2+2)(1+1)`
        match tokens.as_slice() {
            [Token::Number(value)] => Ok(*value),
            _ => Err(UserError::OperatorSkipped {
                expression: expression.to_string(),
            }),
        }
    }

    fn reduce_parentheses(
        &mut self,
        tokens: Vec<Token>,
        expression: &str,
    ) -> Result<Vec<Token>, UserError> {
        let mut reduced: Vec<Token> = Vec::with_capacity(tokens.len());
        let mut open_stack: Vec<usize> = Vec::new();

        for token in tokens {
            match token {
                Token::Open => {
                    open_stack.push(reduced.len());
                    reduced.push(token);
                }
                Token::Close => {
                    let open =
                        open_stack
                            .pop()
                            .ok_or_else(|| UserError::ExtraClosingParentheses {
                                expression: expression.to_string(),
                            })?;
                    let inner = reduced.split_off(open + 1);
                    reduced.pop();
                    if inner.is_empty() {
                        return Err(UserError::EmptyParentheses {
                            expression: expression.to_string(),
                        });
                    }
                    let value = self.eval(inner, expression)?;
                    reduced.push(Token::Number(value));
                }
                token => reduced.push(token),
            }
        }

        if !open_stack.is_empty() {
            return Err(UserError::ExtraOpeningParentheses {
                expression: expression.to_string(),
            });
        }
        Ok(reduced)
    }

    /// Replaces every contiguous `Number Dice Number` pattern with the
    /// aggregated result of rolling that group.
    fn reduce_dice(
        &mut self,
        tokens: Vec<Token>,
        expression: &str,
    ) -> Result<Vec<Token>, UserError> {
        let mut reduced: Vec<Token> = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match (tokens.get(i), tokens.get(i + 1), tokens.get(i + 2)) {
                (
                    Some(&Token::Number(count)),
                    Some(&Token::Dice { dice, explode }),
                    Some(&Token::Number(sides)),
                ) => {
                    let result = self.roll_group(count, dice, explode, sides, expression)?;
                    reduced.push(Token::Number(result));
                    i += 3;
                }
                _ => {
                    reduced.push(tokens[i]);
                    i += 1;
                }
            }
        }
        Ok(reduced)
    }

    fn roll_group(
        &mut self,
        count: f64,
        dice: DiceType,
        explode: bool,
        sides: f64,
        expression: &str,
    ) -> Result<f64, UserError> {
        let num_of_dice = count.trunc() as i64;
        let num_of_sides = sides.trunc() as i64;
        let dice_expression = format!(
            "{}{}{}{}",
            num_of_dice,
            dice,
            if explode { "e" } else { "" },
            num_of_sides
        );

        if num_of_dice < 0 || num_of_sides < 1 {
            return Err(UserError::InvalidDice {
                dice: dice_expression,
                expression: expression.to_string(),
            });
        }
        if num_of_dice as u64 > self.limits.max_dice_count
            || num_of_sides as u64 > self.limits.max_dice_sides
        {
            return Err(UserError::TooBigDice {
                dice: dice_expression,
                max_count: self.limits.max_dice_count,
                max_sides: self.limits.max_dice_sides,
                expression: expression.to_string(),
            });
        }

        let num_of_sides = num_of_sides as u64;
        let mut rolls: Vec<Roll> = Vec::with_capacity(num_of_dice as usize);
        for _ in 0..num_of_dice {
            rolls.push(self.roll_chained(num_of_sides, explode));
        }

        let dice_result = dice.aggregate(&rolls);
        #[cfg(feature = "logging")]
        {
            debug!("rolled {:?} for {}", &rolls, &dice_expression);
        }
        self.dice_rolls.push(DiceRolls {
            dice_expression,
            rolls,
            dice_result,
        });
        Ok(dice_result)
    }

    /// A roll on the maximum face keeps chaining rerolls while it lands on
    /// the maximum again. One-sided dice never explode.
    fn roll_chained(&mut self, sides: u64, explode: bool) -> Roll {
        let value = (self.dice_roller)(sides);
        let exploded = if explode && value == sides && sides != 1 {
            Some(Box::new(self.roll_chained(sides, explode)))
        } else {
            None
        };
        Roll { value, exploded }
    }
}

/// Left-to-right reduction of every operator in `operations`, each one
/// consuming its immediate number neighbors.
fn reduce_operations(
    tokens: Vec<Token>,
    operations: &[Operation],
    expression: &str,
) -> Result<Vec<Token>, UserError> {
    let mut reduced: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Operator(operation) if operations.contains(&operation) => {
                let left = match reduced.pop() {
                    Some(Token::Number(left)) => left,
                    _ => {
                        return Err(UserError::OperatorSkipped {
                            expression: expression.to_string(),
                        });
                    }
                };
                let right = match iter.next() {
                    Some(Token::Number(right)) => right,
                    _ => {
                        return Err(UserError::OperatorSkipped {
                            expression: expression.to_string(),
                        });
                    }
                };
                if operation == Operation::Div && right == 0.0 {
                    return Err(UserError::DivisionByZero {
                        expression: expression.to_string(),
                    });
                }
                let value = operation.apply(left, right);
                if !value.is_finite() {
                    return Err(UserError::InvalidCalculationResult {
                        expression: expression.to_string(),
                    });
                }
                reduced.push(Token::Number(value));
            }
            token => reduced.push(token),
        }
    }

    Ok(reduced)
}
