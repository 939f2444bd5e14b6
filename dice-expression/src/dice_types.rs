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

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregation applied to the rolls of one dice operator.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiceType {
    Sum,
    Highest,
    Lowest,
    Average,
}

impl DiceType {
    pub fn from_char(c: char) -> Option<DiceType> {
        match c {
            'd' => Some(DiceType::Sum),
            'h' => Some(DiceType::Highest),
            'l' => Some(DiceType::Lowest),
            'a' => Some(DiceType::Average),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            DiceType::Sum => 'd',
            DiceType::Highest => 'h',
            DiceType::Lowest => 'l',
            DiceType::Average => 'a',
        }
    }

    /// Reduces a roll group to its numeric result. Empty groups follow the
    /// fold identities: sum 0, highest -inf, lowest +inf, average NaN.
    pub fn aggregate(&self, rolls: &[Roll]) -> f64 {
        match self {
            DiceType::Sum => rolls.iter().map(|roll| roll.total() as f64).sum(),
            DiceType::Highest => rolls
                .iter()
                .map(|roll| roll.total() as f64)
                .fold(f64::NEG_INFINITY, f64::max),
            DiceType::Lowest => rolls
                .iter()
                .map(|roll| roll.total() as f64)
                .fold(f64::INFINITY, f64::min),
            DiceType::Average => {
                rolls.iter().map(|roll| roll.total() as f64).sum::<f64>() / rolls.len() as f64
            }
        }
    }
}

impl fmt::Display for DiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    Mul,
    Div,
    Add,
    Sub,
}

impl Operation {
    pub fn from_char(c: char) -> Option<Operation> {
        match c {
            '*' => Some(Operation::Mul),
            '/' => Some(Operation::Div),
            '+' => Some(Operation::Add),
            '-' => Some(Operation::Sub),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Operation::Mul => '*',
            Operation::Div => '/',
            Operation::Add => '+',
            Operation::Sub => '-',
        }
    }

    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            Operation::Mul => left * right,
            Operation::Div => left / right,
            Operation::Add => left + right,
            Operation::Sub => left - right,
        }
    }
}

/// One lexical unit of a dice expression. The `explode` flag is set
/// retroactively by the tokenizer when an `e` marker follows a dice token.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Token {
    Number(f64),
    Dice { dice: DiceType, explode: bool },
    Operator(Operation),
    Open,
    Close,
}

/// A single physical die result. An exploding die chains its follow-up
/// roll through `exploded`; the chain is strictly forward, no cycles.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Roll {
    pub value: u64,
    pub exploded: Option<Box<Roll>>,
}

impl Roll {
    pub fn new(value: u64) -> Roll {
        Roll {
            value,
            exploded: None,
        }
    }

    /// Value of this roll including the whole explosion chain.
    pub fn total(&self) -> u64 {
        self.value + self.exploded.as_ref().map_or(0, |roll| roll.total())
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(chained) = &self.exploded {
            write!(f, " ({})", chained)?;
        }
        Ok(())
    }
}

/// Every roll produced by one dice operator occurrence, e.g. all three
/// dice of `3d6`, together with the aggregated group result.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceRolls {
    pub dice_expression: String,
    pub rolls: Vec<Roll>,
    pub dice_result: f64,
}

impl fmt::Display for DiceRolls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.dice_expression)?;
        for (i, roll) in self.rolls.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", roll)?;
        }
        write!(f, "] = {}", self.dice_result)
    }
}

/// Successful evaluation of one expression: the total plus the log of
/// every roll group, in evaluation order.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParserResult {
    pub total_sum: f64,
    pub roll_outputs: Vec<DiceRolls>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterComparer {
    Smaller,
    SmallerEq,
    Bigger,
    BiggerEq,
    Equal,
}

impl FilterComparer {
    pub fn compare(&self, value: f64, reference: f64) -> bool {
        match self {
            FilterComparer::Smaller => value < reference,
            FilterComparer::SmallerEq => value <= reference,
            FilterComparer::Bigger => value > reference,
            FilterComparer::BiggerEq => value >= reference,
            FilterComparer::Equal => value == reference,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterComparer::Smaller => "<",
            FilterComparer::SmallerEq => "<=",
            FilterComparer::Bigger => ">",
            FilterComparer::BiggerEq => ">=",
            FilterComparer::Equal => "=",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterType {
    Display,
    Sum,
    Count,
}

/// Post-hoc reduction over the totals of a repeated expression.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParserResultsFilter {
    pub reference_value: Option<f64>,
    pub comparer: FilterComparer,
    pub filter_type: FilterType,
}

impl ParserResultsFilter {
    pub fn new(
        reference_value: Option<f64>,
        comparer: FilterComparer,
        filter_type: FilterType,
    ) -> ParserResultsFilter {
        ParserResultsFilter {
            reference_value,
            comparer,
            filter_type,
        }
    }

    /// True when the value passes the comparison. A filter without a
    /// reference value matches everything.
    pub fn matches(&self, value: f64) -> bool {
        match self.reference_value {
            Some(reference) => self.comparer.compare(value, reference),
            None => true,
        }
    }

    /// Keeps the matching results and reduces them per the filter type.
    pub fn apply(&self, results: &[f64]) -> FilteredOutput {
        let matching: Vec<f64> = results
            .iter()
            .copied()
            .filter(|value| self.matches(*value))
            .collect();
        match self.filter_type {
            FilterType::Display => FilteredOutput::Display(matching),
            FilterType::Sum => FilteredOutput::Sum(matching.iter().sum()),
            FilterType::Count => FilteredOutput::Count(matching.len() as u64),
        }
    }
}

/// Result of applying a [`ParserResultsFilter`] to a series of totals.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilteredOutput {
    Display(Vec<f64>),
    Sum(f64),
    Count(u64),
}

impl fmt::Display for FilteredOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilteredOutput::Display(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
            FilteredOutput::Sum(sum) => write!(f, "{}", sum),
            FilteredOutput::Count(count) => write!(f, "{}", count),
        }
    }
}

/// One semicolon-delimited clause of a roll request after its `r<n>:`
/// prefix and `[...]` filter suffix have been parsed away.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceExpression {
    pub repeat: u64,
    pub expression: String,
    pub original_expression: String,
    pub filter: Option<ParserResultsFilter>,
}
