// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Temporal aggregation: days into a month, months into a year tensor.

use gdeltnet_core::{
    ensure_square, zero_matrix, DayMatrix, GdeltNetError, MonthKey, MonthMatrix, Result,
};
use ndarray::{Array2, Zip};
use std::sync::Arc;

/// Elementwise mean of day matrices.
#[derive(Debug, Clone, Copy)]
pub struct TemporalAggregator {
    exclude_zero_edges: bool,
}

impl TemporalAggregator {
    pub fn new(exclude_zero_edges: bool) -> Self {
        Self { exclude_zero_edges }
    }

    pub fn exclude_zero_edges(&self) -> bool {
        self.exclude_zero_edges
    }

    /// Aggregate any number of `n x n` day matrices into one month matrix.
    ///
    /// With `exclude_zero_edges`, a zero cell counts as "no observation" and
    /// the mean runs over non-zero days only; a cell that is zero on every
    /// day stays zero. Otherwise it is the plain mean over all days. No days
    /// at all gives the zero matrix.
    pub fn aggregate_month<'a, I>(&self, days: I, n: usize) -> Result<MonthMatrix>
    where
        I: IntoIterator<Item = &'a DayMatrix>,
    {
        let mut sum = zero_matrix(n);
        let mut count: Array2<u32> = Array2::zeros((n, n));
        let mut days_seen = 0u32;

        for day in days {
            ensure_square(day, n)?;
            days_seen += 1;
            if self.exclude_zero_edges {
                Zip::from(&mut sum)
                    .and(&mut count)
                    .and(day)
                    .for_each(|s, c, &v| {
                        if v != 0.0 {
                            *s += v;
                            *c += 1;
                        }
                    });
            } else {
                sum += day;
            }
        }

        if days_seen == 0 {
            return Ok(sum);
        }

        if self.exclude_zero_edges {
            Zip::from(&mut sum).and(&count).for_each(|s, &c| {
                if c > 0 {
                    *s /= f64::from(c);
                }
            });
        } else {
            sum /= f64::from(days_seen);
        }
        Ok(sum)
    }
}

/// Month matrices of one year in chronological order.
///
/// Months without data are absent, so a tensor can hold fewer than twelve
/// slices. The matrices are shared with the registry and never mutated.
#[derive(Debug, Clone)]
pub struct YearTensor {
    year: i32,
    n: usize,
    months: Vec<(MonthKey, Arc<MonthMatrix>)>,
}

impl YearTensor {
    /// Assemble from month slices in any order. All slices must belong to
    /// `year`, be distinct and be `n x n`.
    pub fn assemble<I>(year: i32, n: usize, months: I) -> Result<Self>
    where
        I: IntoIterator<Item = (MonthKey, Arc<MonthMatrix>)>,
    {
        let mut months: Vec<_> = months.into_iter().collect();
        months.sort_by_key(|(key, _)| *key);
        for window in months.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(GdeltNetError::Validation(format!(
                    "month {} appears twice in the year tensor",
                    window[0].0
                )));
            }
        }
        for (key, matrix) in &months {
            if key.year() != year {
                return Err(GdeltNetError::Validation(format!(
                    "month {} does not belong to year {}",
                    key, year
                )));
            }
            ensure_square(matrix, n)?;
        }
        Ok(Self { year, n, months })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.iter().map(|(key, _)| *key)
    }

    pub fn get(&self, month: MonthKey) -> Option<&Arc<MonthMatrix>> {
        self.months
            .iter()
            .find(|(key, _)| *key == month)
            .map(|(_, matrix)| matrix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MonthKey, &MonthMatrix)> + '_ {
        self.months.iter().map(|(key, matrix)| (*key, matrix.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn single_cell(v: f64) -> DayMatrix {
        array![[0.0, v], [v, 0.0]]
    }

    #[test]
    fn test_missing_aware_mean() {
        let days = vec![single_cell(0.0), single_cell(4.0), single_cell(0.0)];

        let month = TemporalAggregator::new(true)
            .aggregate_month(&days, 2)
            .unwrap();
        assert_eq!(month[[0, 1]], 4.0);

        let month = TemporalAggregator::new(false)
            .aggregate_month(&days, 2)
            .unwrap();
        assert!((month[[0, 1]] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_cell_stays_zero() {
        let days = vec![single_cell(0.0), single_cell(0.0)];
        let month = TemporalAggregator::new(true)
            .aggregate_month(&days, 2)
            .unwrap();
        assert!(month.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_mixed_signs_average() {
        let days = vec![single_cell(-2.0), single_cell(3.0), single_cell(0.0), single_cell(2.0)];
        let month = TemporalAggregator::new(true)
            .aggregate_month(&days, 2)
            .unwrap();
        assert!((month[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_days_and_dimension_mismatch() {
        let empty: Vec<DayMatrix> = Vec::new();
        let month = TemporalAggregator::new(true)
            .aggregate_month(&empty, 3)
            .unwrap();
        assert_eq!(month.dim(), (3, 3));

        let days = vec![single_cell(1.0)];
        assert!(matches!(
            TemporalAggregator::new(true).aggregate_month(&days, 3),
            Err(GdeltNetError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_year_tensor_sorted_and_checked() {
        let m = Arc::new(zero_matrix(2));
        let tensor = YearTensor::assemble(
            2023,
            2,
            vec![
                (MonthKey::new(2023, 3).unwrap(), Arc::clone(&m)),
                (MonthKey::new(2023, 1).unwrap(), Arc::clone(&m)),
            ],
        )
        .unwrap();
        let months: Vec<u32> = tensor.months().map(|k| k.month()).collect();
        assert_eq!(months, vec![1, 3]);
        assert!(tensor.get(MonthKey::new(2023, 2).unwrap()).is_none());

        assert!(YearTensor::assemble(
            2023,
            2,
            vec![(MonthKey::new(2022, 12).unwrap(), Arc::clone(&m))]
        )
        .is_err());
        assert!(YearTensor::assemble(
            2023,
            2,
            vec![
                (MonthKey::new(2023, 1).unwrap(), Arc::clone(&m)),
                (MonthKey::new(2023, 1).unwrap(), m),
            ]
        )
        .is_err());
    }
}
