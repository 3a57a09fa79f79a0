use std::time::Duration;

/// Delay curve used when the provider throttles a request.
///
/// All variants clamp the computed delay to their configured maximum.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// `base * multiplier^attempt`, optionally with deterministic jitter.
    Exponential {
        base: Duration,
        max: Duration,
        multiplier: f64,
        /// Spread retries over +0%..+40% of the raw delay, keyed on the
        /// attempt number.
        jitter: bool,
    },
    /// Same delay for every attempt.
    Constant { delay: Duration },
}

impl RetryStrategy {
    /// Delay before retrying after the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                // Attempt counts stay far below i32::MAX.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base.as_secs_f64() * multiplier.powi(attempt as i32);
                let adjusted = if *jitter {
                    raw * (1.0 + 0.1 * f64::from(attempt % 5))
                } else {
                    raw
                };
                Duration::from_secs_f64(adjusted.min(max.as_secs_f64()))
            }
            Self::Constant { delay } => *delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_doubles() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn exponential_is_clamped() {
        let strategy = RetryStrategy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(strategy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn jitter_never_shrinks_delay() {
        let plain = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
        };
        let jittered = RetryStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        };
        for attempt in 0..6 {
            assert!(jittered.delay_for(attempt) >= plain.delay_for(attempt));
        }
    }

    #[test]
    fn constant_is_flat() {
        let strategy = RetryStrategy::Constant {
            delay: Duration::from_secs(3),
        };
        assert_eq!(strategy.delay_for(0), Duration::from_secs(3));
        assert_eq!(strategy.delay_for(7), Duration::from_secs(3));
    }
}
