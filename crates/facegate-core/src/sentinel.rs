//! Unknown-face sentinel: rate limiting for security snapshots.
//!
//! Decides *when* an unmatched detection warrants a snapshot; actually
//! writing the image is the daemon's job. The two debounce strategies are
//! mutually exclusive per deployment and selected by configuration.

use std::time::{Duration, Instant};

/// Snapshot debounce strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelPolicy {
    /// Fire once on the transition into an unmatched episode; matched or
    /// empty frames end the episode.
    EdgeTriggered,
    /// Fire at most once per interval while the unmatched condition
    /// persists, regardless of transitions.
    Interval(Duration),
}

/// Tracks unmatched-detection episodes and decides when to fire.
#[derive(Debug)]
pub struct UnknownFaceSentinel {
    policy: SentinelPolicy,
    last_fire: Option<Instant>,
    in_episode: bool,
}

impl UnknownFaceSentinel {
    pub fn new(policy: SentinelPolicy) -> Self {
        Self { policy, last_fire: None, in_episode: false }
    }

    pub fn policy(&self) -> SentinelPolicy {
        self.policy
    }

    /// Feed one frame's outcome. `unknown_present` is true when a face was
    /// detected but rejected by the matcher. Returns true when a snapshot
    /// should be taken now.
    pub fn observe(&mut self, unknown_present: bool, now: Instant) -> bool {
        match self.policy {
            SentinelPolicy::EdgeTriggered => {
                if !unknown_present {
                    self.in_episode = false;
                    return false;
                }
                let fire = !self.in_episode;
                self.in_episode = true;
                fire
            }
            SentinelPolicy::Interval(interval) => {
                if !unknown_present {
                    return false;
                }
                match self.last_fire {
                    Some(prev) if now.saturating_duration_since(prev) < interval => false,
                    _ => {
                        self.last_fire = Some(now);
                        true
                    }
                }
            }
        }
    }
}
