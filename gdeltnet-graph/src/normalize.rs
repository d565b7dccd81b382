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

//! Year normalisation and the alliance/hostility split.
//!
//! Negative values are divided by `|min|` of the whole year, positive values
//! by `max` of the whole year. Every month of a year is therefore scaled by
//! the same two factors, which keeps months of the same year comparable.

use gdeltnet_core::{GdeltNetError, MonthKey, MonthMatrix, Polarity, Result, SignedMatrix};
use gdeltnet_storage::YearTensor;
use serde::Serialize;
use tracing::debug;

/// Alliance and hostility matrices of one month, both with entries in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedSplit {
    pub alliance: SignedMatrix,
    /// Absolute values of the negative part.
    pub hostility: SignedMatrix,
}

impl SignedSplit {
    /// Split a normalised matrix by sign.
    pub fn from_normalized(normalized: &SignedMatrix) -> Self {
        Self {
            alliance: normalized.mapv(|v| if v > 0.0 { v } else { 0.0 }),
            hostility: normalized.mapv(|v| if v < 0.0 { -v } else { 0.0 }),
        }
    }

    pub fn get(&self, polarity: Polarity) -> &SignedMatrix {
        match polarity {
            Polarity::Alliance => &self.alliance,
            Polarity::Hostility => &self.hostility,
        }
    }
}

/// A normalised year: the two factors and the per-month split.
#[derive(Debug, Clone)]
pub struct NormalizedYear {
    pub year: i32,
    /// `|min|` of the year tensor.
    pub neg_factor: f64,
    /// `max` of the year tensor.
    pub pos_factor: f64,
    months: Vec<(MonthKey, SignedSplit)>,
}

impl NormalizedYear {
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.iter().map(|(key, _)| *key)
    }

    pub fn get(&self, month: MonthKey) -> Option<&SignedSplit> {
        self.months
            .iter()
            .find(|(key, _)| *key == month)
            .map(|(_, split)| split)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MonthKey, &SignedSplit)> + '_ {
        self.months.iter().map(|(key, split)| (*key, split))
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YearNormalizer;

impl YearNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extremes of the tensor as `(neg_factor, pos_factor)`.
    ///
    /// Fails with `DegenerateNormalization` when the tensor has no negative
    /// or no positive value.
    pub fn factors(&self, tensor: &YearTensor) -> Result<(f64, f64)> {
        let mut min = 0.0f64;
        let mut max = 0.0f64;
        for (_, matrix) in tensor.iter() {
            for &v in matrix.iter() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        if min >= 0.0 {
            return Err(GdeltNetError::DegenerateNormalization {
                year: tensor.year(),
                missing: Polarity::Hostility,
            });
        }
        if max <= 0.0 {
            return Err(GdeltNetError::DegenerateNormalization {
                year: tensor.year(),
                missing: Polarity::Alliance,
            });
        }
        Ok((min.abs(), max))
    }

    /// Normalise every month of `tensor` and split it by sign.
    pub fn normalize(&self, tensor: &YearTensor) -> Result<NormalizedYear> {
        let (neg_factor, pos_factor) = self.factors(tensor)?;
        debug!(year = tensor.year(), neg_factor, pos_factor, "normalizing year");

        let months = tensor
            .iter()
            .map(|(key, matrix)| {
                let normalized = normalize_matrix(matrix, neg_factor, pos_factor);
                (key, SignedSplit::from_normalized(&normalized))
            })
            .collect();

        Ok(NormalizedYear {
            year: tensor.year(),
            neg_factor,
            pos_factor,
            months,
        })
    }
}

/// Scale negatives by `neg_factor` and positives by `pos_factor`; zero stays zero.
pub fn normalize_matrix(matrix: &MonthMatrix, neg_factor: f64, pos_factor: f64) -> SignedMatrix {
    matrix.mapv(|v| {
        if v < 0.0 {
            v / neg_factor
        } else if v > 0.0 {
            v / pos_factor
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::Arc;

    fn tensor(months: Vec<(u32, SignedMatrix)>) -> YearTensor {
        YearTensor::assemble(
            2023,
            2,
            months
                .into_iter()
                .map(|(m, matrix)| (MonthKey::new(2023, m).unwrap(), Arc::new(matrix))),
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_bounds_and_split() {
        let t = tensor(vec![
            (1, array![[0.0, 4.0], [4.0, 0.0]]),
            (2, array![[0.0, -2.0], [-2.0, 0.0]]),
            (3, array![[0.0, 1.0], [1.0, 0.0]]),
        ]);
        let year = YearNormalizer::new().normalize(&t).unwrap();
        assert_eq!(year.neg_factor, 2.0);
        assert_eq!(year.pos_factor, 4.0);
        assert_eq!(year.len(), 3);

        let jan = year.get(MonthKey::new(2023, 1).unwrap()).unwrap();
        assert_eq!(jan.alliance[[0, 1]], 1.0);
        assert_eq!(jan.hostility[[0, 1]], 0.0);

        let feb = year.get(MonthKey::new(2023, 2).unwrap()).unwrap();
        assert_eq!(feb.alliance[[0, 1]], 0.0);
        assert_eq!(feb.hostility[[1, 0]], 1.0);

        let mar = year.get(MonthKey::new(2023, 3).unwrap()).unwrap();
        assert_eq!(mar.alliance[[0, 1]], 0.25);
        assert_eq!(mar.get(Polarity::Alliance)[[0, 0]], 0.0);
    }

    #[test]
    fn test_degenerate_years() {
        let positive = tensor(vec![(1, array![[0.0, 4.0], [4.0, 0.0]])]);
        assert!(matches!(
            YearNormalizer::new().normalize(&positive),
            Err(GdeltNetError::DegenerateNormalization {
                year: 2023,
                missing: Polarity::Hostility
            })
        ));

        let negative = tensor(vec![(1, array![[0.0, -4.0], [-4.0, 0.0]])]);
        assert!(matches!(
            YearNormalizer::new().normalize(&negative),
            Err(GdeltNetError::DegenerateNormalization {
                missing: Polarity::Alliance,
                ..
            })
        ));
    }

    #[test]
    fn test_split_is_disjoint() {
        let normalized = array![[0.0, 0.5, -0.2], [0.5, 0.0, 0.0], [-0.2, 0.0, 0.0]];
        let split = SignedSplit::from_normalized(&normalized);
        for (a, h) in split.alliance.iter().zip(split.hostility.iter()) {
            assert!(*a == 0.0 || *h == 0.0);
            assert!(*a >= 0.0 && *h >= 0.0);
        }
        assert_eq!(split.hostility[[0, 2]], 0.2);
    }
}
