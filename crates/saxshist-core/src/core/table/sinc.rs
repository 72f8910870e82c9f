/// Below this argument `sin(x)/x` is evaluated through its Taylor expansion.
const TAYLOR_THRESHOLD: f64 = 1e-3;

/// `sin(x)/x`, with the small-argument branch `1 - x²/6 + x⁴/120` to avoid cancellation.
#[inline]
pub fn sinc(x: f64) -> f64 {
    if x.abs() < TAYLOR_THRESHOLD {
        let x2 = x * x;
        1.0 - x2 / 6.0 + x2 * x2 / 120.0
    } else {
        x.sin() / x
    }
}

/// `sinc(q·d)` tabulated for every pair of q and d values, stored row-major by q.
#[derive(Debug, Clone, PartialEq)]
pub struct SincTable {
    q_len: usize,
    d_len: usize,
    values: Vec<f64>,
}

impl SincTable {
    pub fn new(q_values: &[f64], d_values: &[f64]) -> Self {
        let mut values = Vec::with_capacity(q_values.len() * d_values.len());
        for &q in q_values {
            values.extend(d_values.iter().map(|&d| sinc(q * d)));
        }
        Self {
            q_len: q_values.len(),
            d_len: d_values.len(),
            values,
        }
    }

    pub fn q_len(&self) -> usize {
        self.q_len
    }

    pub fn d_len(&self) -> usize {
        self.d_len
    }

    /// All d entries for one q bin.
    #[inline]
    pub fn row(&self, q_index: usize) -> &[f64] {
        &self.values[q_index * self.d_len..(q_index + 1) * self.d_len]
    }

    #[inline]
    pub fn get(&self, q_index: usize, d_index: usize) -> f64 {
        self.values[q_index * self.d_len + d_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinc_is_one_at_zero() {
        assert_eq!(sinc(0.0), 1.0);
    }

    #[test]
    fn taylor_branch_agrees_with_direct_evaluation_near_threshold() {
        let x = 0.999e-3;
        assert!((sinc(x) - x.sin() / x).abs() < 1e-15);
        let y = 1.001e-3;
        assert!((sinc(y) - (1.0 - y * y / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn table_entries_match_sinc_of_product() {
        let q = [0.0, 0.1, 0.5];
        let d = [0.0, 1.0, 2.5, 10.0];
        let table = SincTable::new(&q, &d);
        assert_eq!(table.q_len(), 3);
        assert_eq!(table.d_len(), 4);
        for (qi, &qv) in q.iter().enumerate() {
            for (di, &dv) in d.iter().enumerate() {
                assert_eq!(table.get(qi, di), sinc(qv * dv));
            }
            assert_eq!(table.row(qi).len(), 4);
        }
    }

    #[test]
    fn first_zero_of_sinc_is_at_pi() {
        assert!(sinc(std::f64::consts::PI).abs() < 1e-15);
    }
}
