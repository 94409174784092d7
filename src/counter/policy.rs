//! Increment policy
//!
//! Pure functions deciding how much the counter grows and how long the
//! updater waits between ticks. All randomness comes from the caller's
//! RNG so outcomes can be pinned with a seeded `StdRng`.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunables for the increment policy
///
/// Defaults reproduce the stock behavior: seeds of 5000/6000/7000, a
/// 30 second quick-reload threshold, 2 second catch-up intervals, and a
/// 40/60 split between short (2-10s) and long (11-20s) ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Candidate starting counts for a page seen for the first time
    pub seed_views: Vec<u64>,
    /// Reloads closer together than this count as quick reloads
    pub reload_threshold_ms: i64,
    /// Increment for a quick reload
    pub quick_reload_increment: u64,
    /// Candidate increments for a delayed reload
    pub delayed_reload_increments: Vec<u64>,
    /// Length of one catch-up interval
    pub catch_up_interval_ms: i64,
    /// Candidate per-interval increments for catch-up
    pub catch_up_increments: Vec<u64>,
    /// Probability of picking the short branch
    pub short_branch_weight: f64,
    /// Inclusive interval bounds for the short branch
    pub short_interval_ms: (u64, u64),
    /// Candidate increments for the short branch
    pub short_increments: Vec<u64>,
    /// Inclusive interval bounds for the long branch
    pub long_interval_ms: (u64, u64),
    /// Candidate increments for the long branch
    pub long_increments: Vec<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            seed_views: vec![5000, 6000, 7000],
            reload_threshold_ms: 30_000,
            quick_reload_increment: 1,
            delayed_reload_increments: vec![2, 3, 5],
            catch_up_interval_ms: 2000,
            catch_up_increments: vec![1, 2],
            short_branch_weight: 0.4,
            short_interval_ms: (2000, 10_000),
            short_increments: vec![1, 2],
            long_interval_ms: (11_000, 20_000),
            long_increments: vec![1, 2, 3],
        }
    }
}

impl PolicyConfig {
    /// Check that every draw the policy makes is well defined
    pub fn validate(&self) -> Result<(), String> {
        let sets = [
            ("seed_views", &self.seed_views),
            ("delayed_reload_increments", &self.delayed_reload_increments),
            ("catch_up_increments", &self.catch_up_increments),
            ("short_increments", &self.short_increments),
            ("long_increments", &self.long_increments),
        ];
        for (name, set) in sets {
            if set.is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }

        let ranges = [
            ("short_interval_ms", self.short_interval_ms),
            ("long_interval_ms", self.long_interval_ms),
        ];
        for (name, (lo, hi)) in ranges {
            if lo > hi {
                return Err(format!("{} is inverted: {} > {}", name, lo, hi));
            }
        }

        if !(0.0..=1.0).contains(&self.short_branch_weight) {
            return Err(format!(
                "short_branch_weight must be within [0, 1], got {}",
                self.short_branch_weight
            ));
        }
        if self.catch_up_interval_ms <= 0 {
            return Err("catch_up_interval_ms must be positive".to_string());
        }

        Ok(())
    }
}

/// Which timing regime a tick was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Short,
    Long,
}

/// One updater cycle: wait `interval_ms`, then add `increment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub interval_ms: u64,
    pub increment: u64,
    pub branch: Branch,
}

/// Draws seeds, intervals, and increments according to a `PolicyConfig`
#[derive(Debug, Clone)]
pub struct IncrementPolicy {
    config: PolicyConfig,
}

impl IncrementPolicy {
    /// Build a policy, rejecting configurations with empty choice sets
    /// or inverted ranges
    pub fn new(config: PolicyConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Starting count for a page seen for the first time
    pub fn seed_views<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        pick(&self.config.seed_views, rng)
    }

    /// Next updater cycle
    pub fn choose_interval_and_increment<R: Rng + ?Sized>(&self, rng: &mut R) -> Tick {
        if rng.random_bool(self.config.short_branch_weight) {
            let (lo, hi) = self.config.short_interval_ms;
            Tick {
                interval_ms: rng.random_range(lo..=hi),
                increment: pick(&self.config.short_increments, rng),
                branch: Branch::Short,
            }
        } else {
            let (lo, hi) = self.config.long_interval_ms;
            Tick {
                interval_ms: rng.random_range(lo..=hi),
                increment: pick(&self.config.long_increments, rng),
                branch: Branch::Long,
            }
        }
    }

    /// Increment for a page load `elapsed_ms` after the previous one
    pub fn reload_increment<R: Rng + ?Sized>(&self, elapsed_ms: i64, rng: &mut R) -> u64 {
        if elapsed_ms < self.config.reload_threshold_ms {
            self.config.quick_reload_increment
        } else {
            pick(&self.config.delayed_reload_increments, rng)
        }
    }

    /// Number of whole catch-up intervals in `elapsed_ms`
    pub fn catch_up_intervals(&self, elapsed_ms: i64) -> u64 {
        if elapsed_ms <= 0 {
            return 0;
        }
        (elapsed_ms / self.config.catch_up_interval_ms) as u64
    }

    /// Views owed for `elapsed_ms` without updates
    ///
    /// One increment is drawn and applied to every elapsed interval.
    /// Nothing is drawn when no whole interval has passed.
    pub fn catch_up_increment<R: Rng + ?Sized>(&self, elapsed_ms: i64, rng: &mut R) -> u64 {
        let intervals = self.catch_up_intervals(elapsed_ms);
        if intervals == 0 {
            return 0;
        }
        intervals.saturating_mul(pick(&self.config.catch_up_increments, rng))
    }
}

impl Default for IncrementPolicy {
    fn default() -> Self {
        Self {
            config: PolicyConfig::default(),
        }
    }
}

/// Uniform pick from a set validated to be non-empty
fn pick<R: Rng + ?Sized>(choices: &[u64], rng: &mut R) -> u64 {
    choices.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = PolicyConfig::default();
        config.seed_views.clear();
        assert!(config.validate().unwrap_err().contains("seed_views"));

        let mut config = PolicyConfig::default();
        config.long_interval_ms = (20_000, 11_000);
        assert!(config.validate().unwrap_err().contains("long_interval_ms"));

        let mut config = PolicyConfig::default();
        config.short_branch_weight = 1.5;
        assert!(IncrementPolicy::new(config).is_err());

        let mut config = PolicyConfig::default();
        config.catch_up_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_views_from_set() {
        let policy = IncrementPolicy::default();
        let mut rng = rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let seed = policy.seed_views(&mut rng);
            assert!([5000, 6000, 7000].contains(&seed));
            seen.insert(seed);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_ticks_stay_within_branch_bounds() {
        let policy = IncrementPolicy::default();
        let mut rng = rng();

        for _ in 0..5000 {
            let tick = policy.choose_interval_and_increment(&mut rng);
            assert!((2000..=20_000).contains(&tick.interval_ms));
            match tick.branch {
                Branch::Short => {
                    assert!((2000..=10_000).contains(&tick.interval_ms));
                    assert!([1, 2].contains(&tick.increment));
                }
                Branch::Long => {
                    assert!((11_000..=20_000).contains(&tick.interval_ms));
                    assert!([1, 2, 3].contains(&tick.increment));
                }
            }
        }
    }

    #[test]
    fn test_branch_split_is_roughly_forty_sixty() {
        let policy = IncrementPolicy::default();
        let mut rng = rng();
        let draws = 20_000;

        let short = (0..draws)
            .filter(|_| policy.choose_interval_and_increment(&mut rng).branch == Branch::Short)
            .count();
        let ratio = short as f64 / draws as f64;
        assert!((0.37..0.43).contains(&ratio), "short ratio was {ratio}");
    }

    #[test]
    fn test_forced_branches() {
        let mut rng = rng();

        let always_short = IncrementPolicy::new(PolicyConfig {
            short_branch_weight: 1.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            always_short.choose_interval_and_increment(&mut rng).branch,
            Branch::Short
        );

        let always_long = IncrementPolicy::new(PolicyConfig {
            short_branch_weight: 0.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            always_long.choose_interval_and_increment(&mut rng).branch,
            Branch::Long
        );
    }

    #[test]
    fn test_reload_increment() {
        let policy = IncrementPolicy::default();
        let mut rng = rng();

        assert_eq!(policy.reload_increment(0, &mut rng), 1);
        assert_eq!(policy.reload_increment(29_999, &mut rng), 1);
        assert_eq!(policy.reload_increment(-5, &mut rng), 1);

        for _ in 0..100 {
            let inc = policy.reload_increment(30_000, &mut rng);
            assert!([2, 3, 5].contains(&inc));
        }
    }

    #[test]
    fn test_catch_up_uses_single_draw() {
        let policy = IncrementPolicy::default();
        let mut rng = rng();

        assert_eq!(policy.catch_up_increment(0, &mut rng), 0);
        assert_eq!(policy.catch_up_increment(1999, &mut rng), 0);
        assert_eq!(policy.catch_up_increment(-10_000, &mut rng), 0);

        for _ in 0..100 {
            // 7 whole intervals: either 7 * 1 or 7 * 2, never a mix
            let inc = policy.catch_up_increment(15_999, &mut rng);
            assert!(inc == 7 || inc == 14, "got {inc}");
        }
    }

    #[test]
    fn test_no_draw_when_nothing_to_catch_up() {
        let policy = IncrementPolicy::default();
        let mut a = rng();
        let mut b = rng();

        policy.catch_up_increment(500, &mut a);
        assert_eq!(a.random::<u64>(), b.random::<u64>());
    }
}
