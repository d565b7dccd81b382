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

//! Adjacency matrix aliases and the alliance/hostility polarity tag.

use crate::error::{GdeltNetError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// N x N signed adjacency matrix. Rows and columns follow the `CountryIndex`.
pub type SignedMatrix = Array2<f64>;

/// One day's accumulated interactions.
pub type DayMatrix = SignedMatrix;

/// Temporal aggregate of a month's day matrices.
pub type MonthMatrix = SignedMatrix;

/// Which half of a normalised signed graph a matrix holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// Positive (cooperative) weights.
    #[serde(rename = "A")]
    Alliance,
    /// Absolute value of the negative (conflictual) weights.
    #[serde(rename = "H")]
    Hostility,
}

impl Polarity {
    pub const ALL: [Polarity; 2] = [Polarity::Alliance, Polarity::Hostility];

    /// Single-letter code used in exported rows.
    pub fn code(self) -> &'static str {
        match self {
            Polarity::Alliance => "A",
            Polarity::Hostility => "H",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Alliance => write!(f, "alliance"),
            Polarity::Hostility => write!(f, "hostility"),
        }
    }
}

/// All-zero N x N matrix.
pub fn zero_matrix(n: usize) -> SignedMatrix {
    Array2::zeros((n, n))
}

/// Fail with `DimensionMismatch` unless `matrix` is `n x n`.
pub fn ensure_square(matrix: &SignedMatrix, n: usize) -> Result<()> {
    let (rows, cols) = matrix.dim();
    if rows != n || cols != n {
        return Err(GdeltNetError::DimensionMismatch {
            expected: n,
            actual: format!("{}x{}", rows, cols),
        });
    }
    Ok(())
}

/// Largest absolute difference between `m[i,j]` and `m[j,i]`.
pub fn asymmetry(matrix: &SignedMatrix) -> f64 {
    let n = matrix.nrows().min(matrix.ncols());
    let mut worst = 0.0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((matrix[[i, j]] - matrix[[j, i]]).abs());
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_polarity_codes() {
        assert_eq!(Polarity::Alliance.code(), "A");
        assert_eq!(Polarity::Hostility.code(), "H");
        assert_eq!(serde_json::to_string(&Polarity::Hostility).unwrap(), "\"H\"");
    }

    #[test]
    fn test_ensure_square() {
        let m = zero_matrix(3);
        assert!(ensure_square(&m, 3).is_ok());
        assert!(matches!(
            ensure_square(&m, 4),
            Err(GdeltNetError::DimensionMismatch { expected: 4, .. })
        ));
    }

    #[test]
    fn test_asymmetry() {
        let m = array![[0.0, 1.0], [0.5, 0.0]];
        assert!((asymmetry(&m) - 0.5).abs() < 1e-12);
        assert_eq!(asymmetry(&zero_matrix(4)), 0.0);
    }
}
