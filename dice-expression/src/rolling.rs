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

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::{
    dice_roll::DiceExpressionParser,
    dice_types::{DiceExpression, FilteredOutput, ParserResult, ParserResultsFilter},
    error::UserError,
    limits::Limits,
};

#[cfg(feature = "logging")]
use log::error;

#[cfg(feature = "roll")]
use rand::{distributions::Uniform, Rng};

/// Rolls one die without modulo bias.
#[cfg(feature = "roll")]
pub fn roll_die<R: Rng>(rng: &mut R, sides: u64) -> u64 {
    rng.sample(Uniform::new_inclusive(1, sides))
}

/// Everything one semicolon-delimited clause produced: the parsed clause,
/// the results collected before the first failure, and that failure if one
/// occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseOutcome {
    pub expression: DiceExpression,
    pub results: Vec<ParserResult>,
    pub error: Option<UserError>,
}

impl ClauseOutcome {
    /// Reduces the repeated totals with the clause filter, or passes them
    /// through unchanged without one.
    pub fn reduce(&self) -> FilteredOutput {
        let totals: Vec<f64> = self.results.iter().map(|result| result.total_sum).collect();
        match &self.expression.filter {
            Some(filter) => filter.apply(&totals),
            None => FilteredOutput::Display(totals),
        }
    }
}

impl DiceExpression {
    /// Evaluates the clause expression `repeat` times with the given
    /// parser, stopping at the first failure.
    pub fn evaluate<F>(
        &self,
        parser: &mut DiceExpressionParser<F>,
    ) -> Result<Vec<ParserResult>, UserError>
    where
        F: FnMut(u64) -> u64,
    {
        (0..self.repeat).map(|_| parser.parse(&self.expression)).collect()
    }
}

/// Evaluates a full roll request: splits the input into semicolon-delimited
/// clauses, applies repeat counts and filters per clause, and keeps clause
/// failures isolated so one bad clause does not abort its siblings.
///
/// This is also the boundary that shields callers from defects: a panic in
/// a clause is logged in full and surfaced as a generic [`UserError`]
/// referencing the raw clause, never propagated.
pub fn process_roll<F>(
    input: &str,
    global_repeat: u64,
    global_filter: Option<ParserResultsFilter>,
    limits: &Limits,
    dice_roller: F,
) -> Vec<ClauseOutcome>
where
    F: FnMut(u64) -> u64,
{
    let mut parser = DiceExpressionParser::with_limits(dice_roller, *limits);

    input
        .split(';')
        .map(|raw| {
            catch_unwind(AssertUnwindSafe(|| {
                process_clause(raw, global_repeat, global_filter.clone(), limits, &mut parser)
            }))
            .unwrap_or_else(|panic| {
                #[cfg(feature = "logging")]
                {
                    let detail = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!("Unhandled error while parsing {:?}: {}", raw, detail);
                }
                #[cfg(not(feature = "logging"))]
                drop(panic);
                ClauseOutcome {
                    expression: failed_clause(raw),
                    results: Vec::new(),
                    error: Some(UserError::Unhandled {
                        expression: raw.to_string(),
                    }),
                }
            })
        })
        .collect()
}

fn process_clause<F>(
    raw: &str,
    global_repeat: u64,
    global_filter: Option<ParserResultsFilter>,
    limits: &Limits,
    parser: &mut DiceExpressionParser<F>,
) -> ClauseOutcome
where
    F: FnMut(u64) -> u64,
{
    let expression = match DiceExpression::from_raw_expression(raw, global_repeat, global_filter, limits)
    {
        Ok(expression) => expression,
        Err(error) => {
            return ClauseOutcome {
                expression: failed_clause(raw),
                results: Vec::new(),
                error: Some(error),
            };
        }
    };

    let mut results = Vec::with_capacity(expression.repeat as usize);
    let mut error = None;
    for _ in 0..expression.repeat {
        match parser.parse(&expression.expression) {
            Ok(result) => results.push(result),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    ClauseOutcome {
        expression,
        results,
        error,
    }
}

fn failed_clause(raw: &str) -> DiceExpression {
    DiceExpression {
        repeat: 0,
        expression: raw.to_string(),
        original_expression: raw.to_string(),
        filter: None,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::dice_types::{FilterComparer, FilterType};

    fn constant(value: u64) -> impl FnMut(u64) -> u64 {
        move |_| value
    }

    fn totals(outcome: &ClauseOutcome) -> Vec<f64> {
        outcome.results.iter().map(|r| r.total_sum).collect()
    }

    #[test]
    fn test_single_clause() {
        let outcomes = process_roll("2d6+3", 1, None, &Limits::default(), constant(4));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(totals(&outcomes[0]), vec![11.0]);
        assert_eq!(outcomes[0].error, None);
    }

    #[test]
    fn test_multiple_clauses() {
        let outcomes = process_roll("d6;2d6;3d6", 1, None, &Limits::default(), constant(2));
        assert_eq!(outcomes.len(), 3);
        assert_eq!(totals(&outcomes[0]), vec![2.0]);
        assert_eq!(totals(&outcomes[1]), vec![4.0]);
        assert_eq!(totals(&outcomes[2]), vec![6.0]);
    }

    #[test]
    fn test_clause_errors_are_isolated() {
        let outcomes = process_roll("2d6@;d6", 1, None, &Limits::default(), constant(4));
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0].error,
            Some(UserError::InvalidCharacter { character: '@', .. })
        ));
        assert_eq!(outcomes[0].expression.repeat, 0);
        assert_eq!(outcomes[0].results.len(), 0);
        assert_eq!(outcomes[1].error, None);
        assert_eq!(totals(&outcomes[1]), vec![4.0]);
    }

    #[test]
    fn test_repeat_counts_multiply() {
        let outcomes = process_roll("r2:d6", 2, None, &Limits::default(), constant(3));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(totals(&outcomes[0]), vec![3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_reduce_without_filter() {
        let outcomes = process_roll("r3:2d6", 1, None, &Limits::default(), constant(4));
        assert_eq!(
            outcomes[0].reduce(),
            FilteredOutput::Display(vec![8.0, 8.0, 8.0])
        );
    }

    #[test]
    fn test_reduce_with_local_filter() {
        let mut values = vec![5u64, 1, 4].into_iter().cycle();
        let outcomes = process_roll(
            "r3:3d6[>10s]",
            1,
            None,
            &Limits::default(),
            move |_| values.next().expect("cycle never ends"),
        );
        // every repetition totals 10, nothing exceeds 10
        assert_eq!(outcomes[0].reduce(), FilteredOutput::Sum(0.0));

        let outcomes = process_roll("r4:3d6[>10s]", 1, None, &Limits::default(), constant(4));
        assert_eq!(outcomes[0].reduce(), FilteredOutput::Sum(48.0));

        let outcomes = process_roll("r4:3d6[>10c]", 1, None, &Limits::default(), constant(4));
        assert_eq!(outcomes[0].reduce(), FilteredOutput::Count(4));
    }

    #[test]
    fn test_reduce_with_global_filter() {
        let global = Some(ParserResultsFilter::new(
            Some(10.0),
            FilterComparer::BiggerEq,
            FilterType::Count,
        ));
        let outcomes = process_roll("r3:3d6", 1, global, &Limits::default(), constant(4));
        assert_eq!(outcomes[0].reduce(), FilteredOutput::Count(3));
    }

    #[test]
    fn test_empty_clause_reports_empty_expression() {
        let outcomes = process_roll("d6;;d6", 1, None, &Limits::default(), constant(4));
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].error, Some(UserError::EmptyExpression));
    }

    #[test]
    fn test_failure_keeps_earlier_results() {
        // the parenthesized divisor die is rolled first in each repetition;
        // the fourth call makes it 1, so the second repetition divides by 0
        let mut calls = 0;
        let outcomes = process_roll(
            "r2:2d6/(1d6-1)",
            1,
            None,
            &Limits::default(),
            move |_| {
                calls += 1;
                if calls == 4 {
                    1
                } else {
                    2
                }
            },
        );
        assert_eq!(outcomes[0].results.len(), 1);
        assert_eq!(outcomes[0].results[0].total_sum, 4.0);
        assert!(matches!(
            outcomes[0].error,
            Some(UserError::DivisionByZero { .. })
        ));
    }

    #[cfg(feature = "roll")]
    #[test]
    fn test_roll_die_stays_in_range() {
        let mut rng = rand::rngs::mock::StepRng::new(0, 0x9e3779b97f4a7c15);
        for _ in 0..100 {
            let value = roll_die(&mut rng, 6);
            assert!((1..=6).contains(&value));
        }
    }
}
