use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Result, TrainErr};

/// Validated split fractions.
///
/// `test` is applied to the whole dataset, `valid` to the remainder
/// after the test slice is removed.
#[derive(Debug, Clone, Copy)]
pub struct SplitRatios {
    test: f64,
    valid: f64,
}

impl SplitRatios {
    /// Creates validated ratios.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if either fraction is not a finite value
    /// in `[0, 1)`.
    pub fn new(test: f64, valid: f64) -> Result<Self> {
        for (name, value) in [("test_size", test), ("valid_size", valid)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(TrainErr::InvalidConfig(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        Ok(Self { test, valid })
    }

    #[inline]
    pub fn test(&self) -> f64 {
        self.test
    }

    #[inline]
    pub fn valid(&self) -> f64 {
        self.valid
    }
}

/// A partition of group indices into three disjoint subsets covering
/// the full index range. Created once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partitions `n_groups` group indices into train/validation/test.
///
/// A permutation of `[0, n_groups)` is drawn from `rng`; the first
/// `floor(n * test)` permuted indices become the test set, the next
/// `max(floor(rest * valid), 1)` the validation set (never empty while
/// any group remains after the test slice), the remainder the train
/// set. For very small datasets the train set may come out empty; that
/// is accepted and visible in the logged summary.
pub fn split_groups<R: Rng>(
    n_groups: usize,
    ratios: &SplitRatios,
    rng: &mut R,
) -> SplitAssignment {
    let mut order: Vec<usize> = (0..n_groups).collect();
    order.shuffle(rng);

    let n_test = (n_groups as f64 * ratios.test()).floor() as usize;
    let rest = n_groups - n_test;
    let n_valid = if rest > 0 {
        ((rest as f64 * ratios.valid()).floor() as usize).max(1)
    } else {
        0
    };

    let assignment = SplitAssignment {
        test: order[..n_test].to_vec(),
        valid: order[n_test..n_test + n_valid].to_vec(),
        train: order[n_test + n_valid..].to_vec(),
    };

    assert_partition(&assignment, n_groups);

    log::info!(
        "split {n_groups} groups: {} train, {} valid, {} test",
        assignment.train.len(),
        assignment.valid.len(),
        assignment.test.len(),
    );

    assignment
}

/// Checks that the three subsets are pairwise disjoint and jointly
/// cover `0..n_groups`. A failure here means instances of one group
/// could leak across subsets.
fn assert_partition(assignment: &SplitAssignment, n_groups: usize) {
    let mut seen = vec![false; n_groups];
    let all = assignment
        .test
        .iter()
        .chain(&assignment.valid)
        .chain(&assignment.train);

    for &idx in all {
        assert!(!seen[idx], "group {idx} assigned to more than one subset");
        seen[idx] = true;
    }

    assert!(
        seen.iter().all(|&s| s),
        "split does not cover every group index"
    );
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn ratios_reject_out_of_range_values() {
        assert!(SplitRatios::new(1.0, 0.2).is_err());
        assert!(SplitRatios::new(0.2, -0.1).is_err());
        assert!(SplitRatios::new(f64::NAN, 0.2).is_err());
        assert!(SplitRatios::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn split_is_a_partition() {
        let ratios = SplitRatios::new(0.3, 0.25).unwrap();
        for n in 1..40 {
            let mut rng = StdRng::seed_from_u64(7);
            let split = split_groups(n, &ratios, &mut rng);

            let mut all = split.test.clone();
            all.extend(&split.valid);
            all.extend(&split.train);
            assert_eq!(sorted(all), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn split_counts_match_the_formula() {
        // n_test = floor(10 * 0.2) = 2
        // n_valid = max(floor(8 * 0.2), 1) = 1
        let ratios = SplitRatios::new(0.2, 0.2).unwrap();
        let mut rng = StdRng::seed_from_u64(1984);
        let split = split_groups(10, &ratios, &mut rng);

        assert_eq!(split.test.len(), 2);
        assert_eq!(split.valid.len(), 1);
        assert_eq!(split.train.len(), 7);
    }

    #[test]
    fn same_seed_gives_same_assignment() {
        let ratios = SplitRatios::new(0.2, 0.3).unwrap();

        let mut a_rng = StdRng::seed_from_u64(42);
        let mut b_rng = StdRng::seed_from_u64(42);
        let a = split_groups(17, &ratios, &mut a_rng);
        let b = split_groups(17, &ratios, &mut b_rng);

        assert_eq!(a, b);
    }

    #[test]
    fn validation_is_never_empty_while_groups_remain() {
        let ratios = SplitRatios::new(0.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let split = split_groups(2, &ratios, &mut rng);

        assert_eq!(split.test.len(), 0);
        assert_eq!(split.valid.len(), 1);
        assert_eq!(split.train.len(), 1);
    }

    #[test]
    fn tiny_datasets_may_leave_train_empty() {
        let ratios = SplitRatios::new(0.5, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let split = split_groups(2, &ratios, &mut rng);

        assert_eq!(split.test.len(), 1);
        assert_eq!(split.valid.len(), 1);
        assert!(split.train.is_empty());
    }
}
