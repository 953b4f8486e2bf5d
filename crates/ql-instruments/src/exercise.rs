//! Option exercise types.
//!
//! Translates `ql/exercise.hpp`.

use ql_core::ensure;
use ql_core::errors::{Error, Result};
use ql_time::Date;
use std::fmt;

/// Type of exercise right.
///
/// Corresponds to `QuantLib::Exercise::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExerciseType {
    /// Can only be exercised at expiry.
    European,
    /// Can be exercised at any time up to expiry.
    American,
    /// Can be exercised on specific dates.
    Bermudan,
}

/// When an option can be exercised.
///
/// Always holds at least one date, sorted ascending.
///
/// Corresponds to `QuantLib::Exercise` and its subclasses.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    exercise_type: ExerciseType,
    dates: Vec<Date>,
}

impl Exercise {
    /// A European exercise on `expiry`.
    pub fn european(expiry: Date) -> Self {
        Self {
            exercise_type: ExerciseType::European,
            dates: vec![expiry],
        }
    }

    /// An American exercise between `earliest` and `latest`.
    pub fn american(earliest: Date, latest: Date) -> Result<Self> {
        ensure!(
            earliest <= latest,
            Error::InvalidArgument(format!(
                "earliest exercise date ({earliest}) is later than latest ({latest})"
            ))
        );
        Ok(Self {
            exercise_type: ExerciseType::American,
            dates: vec![earliest, latest],
        })
    }

    /// A Bermudan exercise on the given dates.
    pub fn bermudan(mut dates: Vec<Date>) -> Result<Self> {
        ensure!(
            !dates.is_empty(),
            Error::InvalidArgument("no exercise date given".into())
        );
        dates.sort();
        dates.dedup();
        Ok(Self {
            exercise_type: ExerciseType::Bermudan,
            dates,
        })
    }

    /// The last possible exercise date.
    pub fn last_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// All exercise dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The type of exercise.
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exercise_type {
            ExerciseType::European => write!(f, "European({})", self.dates[0]),
            ExerciseType::American => {
                write!(f, "American({} to {})", self.dates[0], self.last_date())
            }
            ExerciseType::Bermudan => write!(f, "Bermudan({} dates)", self.dates.len()),
        }
    }
}
