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
    dice_types::{DiceExpression, FilterComparer, FilterType, ParserResultsFilter},
    error::UserError,
    limits::Limits,
};

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::many_m_n,
    sequence::{delimited, tuple},
    IResult,
};

pub fn parse_u64(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(input)
}

/// The `r<digits>:` repetition prefix of a clause.
pub fn parse_repeat_prefix(input: &str) -> IResult<&str, u64> {
    delimited(tag("r"), parse_u64, tag(":"))(input)
}

/// One or two comparison characters. Which combinations actually name a
/// comparer is decided afterwards, so `>>` fails with its own message.
pub fn parse_filter_comparer(input: &str) -> IResult<&str, &str> {
    recognize(many_m_n(1, 2, one_of("=><")))(input)
}

pub fn parse_filter_type(input: &str) -> IResult<&str, FilterType> {
    alt((
        map(tag("s"), |_| FilterType::Sum),
        map(tag("c"), |_| FilterType::Count),
    ))(input)
}

fn parse_filter_clause(input: &str) -> IResult<&str, (Option<&str>, Option<f64>, Option<FilterType>)> {
    tuple((
        opt(parse_filter_comparer),
        opt(map_res(digit1, |s: &str| s.parse::<f64>())),
        opt(parse_filter_type),
    ))(input)
}

impl ParserResultsFilter {
    /// Parses a `[comparer][value][type]` filter clause. Empty input means
    /// no filter at all. A missing comparer defaults to `>=`, a missing
    /// type to display.
    pub fn from_expression(filter_expression: &str) -> Result<Option<ParserResultsFilter>, UserError> {
        if filter_expression.is_empty() {
            return Ok(None);
        }

        let (rest, (comparer, reference_value, filter_type)) =
            parse_filter_clause(filter_expression).map_err(|_| UserError::InvalidFilter {
                filter: filter_expression.to_string(),
            })?;
        if !rest.is_empty() {
            return Err(UserError::InvalidFilter {
                filter: filter_expression.to_string(),
            });
        }

        let comparer = match comparer {
            None => FilterComparer::BiggerEq,
            Some("<") => FilterComparer::Smaller,
            Some("<=") => FilterComparer::SmallerEq,
            Some(">") => FilterComparer::Bigger,
            Some(">=") => FilterComparer::BiggerEq,
            Some("=") => FilterComparer::Equal,
            Some(other) => {
                return Err(UserError::InvalidFilterComparer {
                    comparer: other.to_string(),
                });
            }
        };

        Ok(Some(ParserResultsFilter::new(
            reference_value,
            comparer,
            filter_type.unwrap_or(FilterType::Display),
        )))
    }
}

/// Splits a trailing `[...]` filter suffix off a clause body. `r2:d20[]`
/// keeps an empty filter expression, which resolves to no filter.
fn split_filter_suffix(rest: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = rest.strip_suffix(']') {
        if let Some(open) = stripped.find('[') {
            if open > 0 {
                return (&stripped[..open], Some(&stripped[open + 1..]));
            }
        }
    }
    (rest, None)
}

impl DiceExpression {
    /// Parses the optional `r<digits>:` prefix and `[...]` filter suffix
    /// around a raw clause. The local repeat count multiplies with the
    /// caller's global one; a local filter takes precedence over a global
    /// one. Without the prefix the whole string is the expression to
    /// evaluate.
    pub fn from_raw_expression(
        raw_expression: &str,
        global_repeat: u64,
        global_filter: Option<ParserResultsFilter>,
        limits: &Limits,
    ) -> Result<DiceExpression, UserError> {
        let (repeat, expression, local_filter) = match parse_repeat_prefix(raw_expression) {
            Ok((rest, local_repeat)) if !rest.is_empty() => {
                let (expression, filter_expression) = split_filter_suffix(rest);
                let local_filter = match filter_expression {
                    Some(filter_expression) => {
                        ParserResultsFilter::from_expression(filter_expression)?
                    }
                    None => None,
                };
                let repeat = local_repeat.checked_mul(global_repeat).unwrap_or(u64::MAX);
                (repeat, expression, local_filter)
            }
            _ => (global_repeat, raw_expression, None),
        };

        if repeat == 0 {
            return Err(UserError::CannotRepeat {
                expression: raw_expression.to_string(),
                times: repeat,
            });
        }
        if repeat > limits.max_repetitions {
            return Err(UserError::TooMuchRepetition {
                times: repeat,
                max: limits.max_repetitions,
            });
        }

        Ok(DiceExpression {
            repeat,
            expression: expression.to_string(),
            original_expression: raw_expression.to_string(),
            filter: local_filter.or(global_filter),
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("1"), Ok(("", 1)));
        assert_eq!(parse_u64("6969"), Ok(("", 6969)));
        assert_eq!(parse_u64("0:"), Ok((":", 0)));
        assert!(parse_u64("-1").is_err());
        assert!(parse_u64("").is_err());
    }

    #[test]
    fn test_parse_repeat_prefix() {
        assert_eq!(parse_repeat_prefix("r3:d20"), Ok(("d20", 3)));
        assert_eq!(parse_repeat_prefix("r12:"), Ok(("", 12)));
        assert!(parse_repeat_prefix("3:d20").is_err());
        assert!(parse_repeat_prefix("r:d20").is_err());
        assert!(parse_repeat_prefix("rd20").is_err());
    }

    #[test]
    fn test_parse_filter_comparer() {
        assert_eq!(parse_filter_comparer(">=10"), Ok(("10", ">=")));
        assert_eq!(parse_filter_comparer(">10"), Ok(("10", ">")));
        assert_eq!(parse_filter_comparer(">>10"), Ok(("10", ">>")));
        assert!(parse_filter_comparer("10").is_err());
        assert!(parse_filter_comparer("").is_err());
    }

    #[test]
    fn test_filter_from_expression() {
        assert_eq!(ParserResultsFilter::from_expression("").unwrap(), None);

        let filter = ParserResultsFilter::from_expression("10").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(10.0));
        assert_eq!(filter.comparer, FilterComparer::BiggerEq);
        assert_eq!(filter.filter_type, FilterType::Display);

        let filter = ParserResultsFilter::from_expression(">15s").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(15.0));
        assert_eq!(filter.comparer, FilterComparer::Bigger);
        assert_eq!(filter.filter_type, FilterType::Sum);

        let filter = ParserResultsFilter::from_expression("<5c").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(5.0));
        assert_eq!(filter.comparer, FilterComparer::Smaller);
        assert_eq!(filter.filter_type, FilterType::Count);

        let filter = ParserResultsFilter::from_expression(">=20").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(20.0));
        assert_eq!(filter.comparer, FilterComparer::BiggerEq);
        assert_eq!(filter.filter_type, FilterType::Display);

        let filter = ParserResultsFilter::from_expression("<=8s").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(8.0));
        assert_eq!(filter.comparer, FilterComparer::SmallerEq);
        assert_eq!(filter.filter_type, FilterType::Sum);

        let filter = ParserResultsFilter::from_expression("=12c").unwrap().unwrap();
        assert_eq!(filter.reference_value, Some(12.0));
        assert_eq!(filter.comparer, FilterComparer::Equal);
        assert_eq!(filter.filter_type, FilterType::Count);
    }

    #[test]
    fn test_filter_without_reference_value() {
        let filter = ParserResultsFilter::from_expression(">s").unwrap().unwrap();
        assert_eq!(filter.reference_value, None);
        assert_eq!(filter.comparer, FilterComparer::Bigger);
        assert_eq!(filter.filter_type, FilterType::Sum);

        let filter = ParserResultsFilter::from_expression("c").unwrap().unwrap();
        assert_eq!(filter.reference_value, None);
        assert_eq!(filter.filter_type, FilterType::Count);
    }

    #[test]
    fn test_filter_errors() {
        assert_eq!(
            ParserResultsFilter::from_expression("invalid"),
            Err(UserError::InvalidFilter {
                filter: "invalid".to_string()
            })
        );
        assert_eq!(
            ParserResultsFilter::from_expression(">10x"),
            Err(UserError::InvalidFilter {
                filter: ">10x".to_string()
            })
        );
        assert_eq!(
            ParserResultsFilter::from_expression(">>10s"),
            Err(UserError::InvalidFilterComparer {
                comparer: ">>".to_string()
            })
        );
    }

    #[test]
    fn test_from_raw_expression() {
        let limits = Limits::default();
        let expr =
            DiceExpression::from_raw_expression("r3:d20[>10s]", 25, None, &limits).unwrap();
        assert_eq!(expr.expression, "d20");
        assert_eq!(expr.original_expression, "r3:d20[>10s]");
        assert_eq!(expr.repeat, 75);

        let filter = expr.filter.unwrap();
        assert_eq!(filter.reference_value, Some(10.0));
        assert_eq!(filter.comparer, FilterComparer::Bigger);
        assert_eq!(filter.filter_type, FilterType::Sum);
    }

    #[test]
    fn test_repeat_counts() {
        let limits = Limits::default();
        assert_eq!(
            DiceExpression::from_raw_expression("r12:d20", 1, None, &limits)
                .unwrap()
                .repeat,
            12
        );
        assert_eq!(
            DiceExpression::from_raw_expression("d20", 15, None, &limits)
                .unwrap()
                .repeat,
            15
        );
        assert_eq!(
            DiceExpression::from_raw_expression("r3:d20", 15, None, &limits)
                .unwrap()
                .repeat,
            45
        );
    }

    #[test]
    fn test_global_filter_passthrough() {
        let limits = Limits::default();
        let global = ParserResultsFilter::new(Some(10.0), FilterComparer::Bigger, FilterType::Sum);

        let expr =
            DiceExpression::from_raw_expression("r3:d20", 1, Some(global.clone()), &limits)
                .unwrap();
        assert_eq!(expr.filter, Some(global.clone()));

        let expr = DiceExpression::from_raw_expression("d20", 1, Some(global.clone()), &limits)
            .unwrap();
        assert_eq!(expr.filter, Some(global));
    }

    #[test]
    fn test_local_filter_wins() {
        let limits = Limits::default();
        let global = ParserResultsFilter::new(Some(11.0), FilterComparer::Equal, FilterType::Count);
        let expr =
            DiceExpression::from_raw_expression("r3:d20[>10s]", 1, Some(global), &limits).unwrap();

        let filter = expr.filter.unwrap();
        assert_eq!(filter.reference_value, Some(10.0));
        assert_eq!(filter.comparer, FilterComparer::Bigger);
        assert_eq!(filter.filter_type, FilterType::Sum);
    }

    #[test]
    fn test_empty_filter_suffix_falls_back() {
        let limits = Limits::default();
        let global = ParserResultsFilter::new(Some(10.0), FilterComparer::Bigger, FilterType::Sum);
        let expr =
            DiceExpression::from_raw_expression("r2:d20[]", 1, Some(global.clone()), &limits)
                .unwrap();
        assert_eq!(expr.expression, "d20");
        assert_eq!(expr.filter, Some(global));
    }

    #[test]
    fn test_repeat_bounds() {
        let limits = Limits::default();
        assert!(matches!(
            DiceExpression::from_raw_expression("r0:d20", 1, None, &limits),
            Err(UserError::CannotRepeat { .. })
        ));
        assert!(matches!(
            DiceExpression::from_raw_expression("d20", 0, None, &limits),
            Err(UserError::CannotRepeat { .. })
        ));
        assert!(matches!(
            DiceExpression::from_raw_expression("r2000:d20", 1, None, &limits),
            Err(UserError::TooMuchRepetition { .. })
        ));
        assert!(matches!(
            DiceExpression::from_raw_expression("r100:d20", 100, None, &limits),
            Err(UserError::TooMuchRepetition { .. })
        ));
        assert_eq!(
            DiceExpression::from_raw_expression("r1000:d20", 1, None, &limits)
                .unwrap()
                .repeat,
            limits.max_repetitions
        );
    }

    #[test]
    fn test_prefix_without_body_is_plain_expression() {
        let limits = Limits::default();
        let expr = DiceExpression::from_raw_expression("r3:", 1, None, &limits).unwrap();
        assert_eq!(expr.expression, "r3:");
        assert_eq!(expr.repeat, 1);
    }
}
