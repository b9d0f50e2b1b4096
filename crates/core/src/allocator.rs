//! Collision-checked numeric identifier allocation.
//!
//! Identifiers are sampled uniformly from a bounded range and re-sampled while the
//! caller's existence probe reports a collision. The probe only observes the store
//! at the instant of the check; callers that need uniqueness under concurrency use
//! [`IdAllocator::claim`], which pairs each candidate with a create-only write and
//! counts existence collisions and lost writes against one attempt budget.

use core::ops::RangeInclusive;

use rand::Rng;
use thiserror::Error;

/// Default number of samples before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

/// Allocation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocError<E> {
    /// Every sampled candidate collided.
    #[error("identifier space exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// The existence probe itself failed.
    #[error("existence probe failed: {0}")]
    Probe(E),
}

/// Produces identifiers from a fixed inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    range: RangeInclusive<u64>,
    max_attempts: u32,
}

impl IdAllocator {
    /// Allocator over an arbitrary inclusive range.
    ///
    /// `max_attempts` is clamped to at least 1.
    pub fn new(range: RangeInclusive<u64>, max_attempts: u32) -> Self {
        Self {
            range,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Six-digit identifiers (`100000..=999999`).
    pub fn six_digit() -> Self {
        Self::new(100_000..=999_999, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn range(&self) -> &RangeInclusive<u64> {
        &self.range
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Allocate an identifier for which `exists` reports `false`.
    pub fn allocate<F, E>(&self, exists: F) -> Result<u64, AllocError<E>>
    where
        F: FnMut(u64) -> Result<bool, E>,
    {
        self.allocate_with_rng(&mut rand::thread_rng(), exists)
    }

    /// Same as [`IdAllocator::allocate`] with a caller-supplied RNG (deterministic tests).
    pub fn allocate_with_rng<R, F, E>(&self, rng: &mut R, mut exists: F) -> Result<u64, AllocError<E>>
    where
        R: Rng,
        F: FnMut(u64) -> Result<bool, E>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = rng.gen_range(self.range.clone());
            if !exists(candidate).map_err(AllocError::Probe)? {
                if attempt > 1 {
                    tracing::debug!(candidate, attempt, "allocated identifier after collisions");
                }
                return Ok(candidate);
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            "identifier allocation exhausted its attempt budget"
        );
        Err(AllocError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// Allocate an identifier and hand it to `claim`, which writes the record.
    ///
    /// `claim` returns `Ok(None)` when the candidate was taken between the existence check and
    /// the write; a fresh candidate is then drawn. Existence collisions and lost claims
    /// share the `max_attempts` budget. Errors from either closure are returned as
    /// [`AllocError::Probe`].
    pub fn claim<T, E, F, C>(&self, exists: F, claim: C) -> Result<T, AllocError<E>>
    where
        F: FnMut(u64) -> Result<bool, E>,
        C: FnMut(u64) -> Result<Option<T>, E>,
    {
        self.claim_with_rng(&mut rand::thread_rng(), exists, claim)
    }

    /// Same as [`IdAllocator::claim`] with a caller-supplied RNG.
    pub fn claim_with_rng<R, T, E, F, C>(
        &self,
        rng: &mut R,
        mut exists: F,
        mut claim: C,
    ) -> Result<T, AllocError<E>>
    where
        R: Rng,
        F: FnMut(u64) -> Result<bool, E>,
        C: FnMut(u64) -> Result<Option<T>, E>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = rng.gen_range(self.range.clone());
            if exists(candidate).map_err(AllocError::Probe)? {
                continue;
            }
            match claim(candidate).map_err(AllocError::Probe)? {
                Some(claimed) => return Ok(claimed),
                None => tracing::debug!(candidate, attempt, "identifier claimed concurrently"),
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            "identifier claim exhausted its attempt budget"
        );
        Err(AllocError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::six_digit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn six_digit_ids_stay_in_range() {
        let alloc = IdAllocator::six_digit();
        for _ in 0..500 {
            let id = alloc.allocate(|_| Ok::<_, Infallible>(false)).unwrap();
            assert!((100_000..=999_999).contains(&id));
        }
    }

    #[test]
    fn resamples_until_probe_reports_free() {
        let alloc = IdAllocator::new(1..=3, 100);
        let mut rng = StdRng::seed_from_u64(7);
        let taken: HashSet<u64> = [1, 2].into_iter().collect();

        let id = alloc
            .allocate_with_rng(&mut rng, |c| Ok::<_, Infallible>(taken.contains(&c)))
            .unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn exhausted_space_fails_instead_of_looping() {
        let alloc = IdAllocator::new(1..=2, 25);
        let err = alloc.allocate(|_| Ok::<_, Infallible>(true)).unwrap_err();
        assert_eq!(err, AllocError::Exhausted { attempts: 25 });
    }

    #[test]
    fn lost_claims_redraw_within_budget() {
        let alloc = IdAllocator::new(1..=1_000, 3);
        let mut claims = 0;

        let id = alloc
            .claim(
                |_| Ok::<_, Infallible>(false),
                |candidate| {
                    claims += 1;
                    Ok(if claims < 3 { None } else { Some(candidate) })
                },
            )
            .unwrap();

        assert!((1..=1_000).contains(&id));
        assert_eq!(claims, 3);
    }

    #[test]
    fn checks_and_claims_share_one_budget() {
        let alloc = IdAllocator::new(1..=1_000, 4);
        let mut rng = StdRng::seed_from_u64(11);
        let mut checks = 0;
        let mut claims = 0;

        let err = alloc
            .claim_with_rng(
                &mut rng,
                |_| {
                    checks += 1;
                    Ok::<_, Infallible>(checks % 2 == 0)
                },
                |_| {
                    claims += 1;
                    Ok::<Option<u64>, _>(None)
                },
            )
            .unwrap_err();

        assert_eq!(err, AllocError::Exhausted { attempts: 4 });
        assert_eq!(checks, 4);
        assert_eq!(claims, 2);
    }

    #[test]
    fn claim_errors_propagate() {
        let alloc = IdAllocator::six_digit();
        let err = alloc
            .claim(|_| Ok(false), |_| Err::<Option<u64>, _>("write failed"))
            .unwrap_err();
        assert_eq!(err, AllocError::Probe("write failed"));
    }

    #[test]
    fn probe_failures_propagate() {
        let alloc = IdAllocator::six_digit();
        let err = alloc.allocate(|_| Err::<bool, _>("store offline")).unwrap_err();
        assert_eq!(err, AllocError::Probe("store offline"));
    }

    #[test]
    fn zero_attempt_budget_is_clamped() {
        let alloc = IdAllocator::new(5..=5, 0);
        assert_eq!(alloc.max_attempts(), 1);
        assert_eq!(alloc.allocate(|_| Ok::<_, Infallible>(false)).unwrap(), 5);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: sequential allocations against a growing set never collide.
            #[test]
            fn sequential_allocations_are_unique(n in 1usize..300, seed in any::<u64>()) {
                let alloc = IdAllocator::six_digit();
                let mut rng = StdRng::seed_from_u64(seed);
                let mut issued: HashSet<u64> = HashSet::new();

                for _ in 0..n {
                    let id = alloc
                        .allocate_with_rng(&mut rng, |c| Ok::<_, Infallible>(issued.contains(&c)))
                        .unwrap();
                    issued.insert(id);
                }

                prop_assert_eq!(issued.len(), n);
            }
        }
    }
}
