//! Fixed-cadence frame replay.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Simulation, SimulationFrame};

/// Handle for one replay, returned by [`PlaybackScheduler::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaybackToken(pub u64);

impl std::fmt::Display for PlaybackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "playback#{}", self.0)
    }
}

/// Something that happened while advancing the clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Frame `index` is due.
    Frame {
        token: PlaybackToken,
        index: usize,
        frame: SimulationFrame,
    },
    /// All frames were emitted; fired one interval after the last frame.
    Completed { token: PlaybackToken },
}

impl PlaybackEvent {
    /// Token of the playback that produced this event.
    #[must_use]
    pub fn token(&self) -> PlaybackToken {
        match self {
            PlaybackEvent::Frame { token, .. } | PlaybackEvent::Completed { token } => *token,
        }
    }
}

/// Counters kept across replays.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaybackStats {
    pub started: u64,
    pub completed: u64,
    pub canceled: u64,
    pub frames: u64,
}

#[derive(Clone, Debug)]
struct ActivePlayback {
    token: PlaybackToken,
    simulation: Simulation,
    next_index: usize,
    /// Time accumulated since the last emitted event.
    elapsed: Duration,
}

/// Replays one simulation at a time, one frame per interval.
///
/// The scheduler owns no timer. Callers feed it elapsed time through
/// [`advance`](Self::advance) and apply whatever events come back.
///
/// For a simulation of `k` frames, frame `i` is emitted once `(i + 1)`
/// intervals have elapsed and [`PlaybackEvent::Completed`] once `k + 1`
/// intervals have elapsed. An empty simulation completes after one interval.
#[derive(Clone, Debug)]
pub struct PlaybackScheduler {
    interval: Duration,
    active: Option<ActivePlayback>,
    next_token: u64,
    stats: PlaybackStats,
}

impl PlaybackScheduler {
    /// Create a scheduler with the given frame interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: None,
            next_token: 0,
            stats: PlaybackStats::default(),
        }
    }

    /// Frame interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Begin replaying `simulation`, canceling any active replay.
    pub fn start(&mut self, simulation: Simulation) -> PlaybackToken {
        self.cancel_active();

        self.next_token += 1;
        let token = PlaybackToken(self.next_token);
        log::debug!("{} started with {} frames", token, simulation.len());

        self.active = Some(ActivePlayback {
            token,
            simulation,
            next_index: 0,
            elapsed: Duration::ZERO,
        });
        self.stats.started += 1;
        token
    }

    /// Cancel the replay identified by `token`.
    ///
    /// Returns `false` if that replay already completed or was replaced.
    /// Frames already emitted are not rolled back.
    pub fn cancel(&mut self, token: PlaybackToken) -> bool {
        match &self.active {
            Some(active) if active.token == token => {
                self.cancel_active();
                true
            }
            _ => false,
        }
    }

    /// Cancel whatever replay is active. Returns its token, if any.
    pub fn cancel_active(&mut self) -> Option<PlaybackToken> {
        let active = self.active.take()?;
        log::debug!(
            "{} canceled after {}/{} frames",
            active.token,
            active.next_index,
            active.simulation.len()
        );
        self.stats.canceled += 1;
        Some(active.token)
    }

    /// Check if a replay is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Token of the replay in progress.
    #[must_use]
    pub fn active_token(&self) -> Option<PlaybackToken> {
        self.active.as_ref().map(|a| a.token)
    }

    /// Time until the next event is due, or `None` when idle.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        self.active
            .as_ref()
            .map(|a| self.interval.saturating_sub(a.elapsed))
    }

    /// Advance the clock by `elapsed` and collect every event that became due.
    ///
    /// At most one `Completed` is produced per replay; after it the scheduler
    /// is idle and the rest of `elapsed` is discarded.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let interval = self.interval;

        let Some(active) = self.active.as_mut() else {
            return events;
        };
        active.elapsed += elapsed;

        while active.elapsed >= interval {
            active.elapsed -= interval;

            match active.simulation.get(active.next_index) {
                Some(frame) => {
                    events.push(PlaybackEvent::Frame {
                        token: active.token,
                        index: active.next_index,
                        frame: frame.clone(),
                    });
                    active.next_index += 1;
                    self.stats.frames += 1;
                }
                None => {
                    events.push(PlaybackEvent::Completed { token: active.token });
                    break;
                }
            }
        }

        if matches!(events.last(), Some(PlaybackEvent::Completed { .. })) {
            if let Some(done) = self.active.take() {
                log::debug!("{} completed", done.token);
            }
            self.stats.completed += 1;
        }

        events
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::core::config::DEFAULT_FRAME_INTERVAL_MS))
    }
}
