use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// Holds the rollout to at most `tps` ticks per second. A cap of zero or
/// `None` runs uncapped.
#[derive(Debug)]
pub(crate) struct TickPacer {
    tps: Option<u32>,
    last_tick: Instant,
}

impl TickPacer {
    pub(crate) fn new(target_tps: Option<u32>) -> Self {
        Self {
            tps: target_tps.filter(|tps| *tps > 0),
            last_tick: Instant::now(),
        }
    }

    fn tick_budget(&self) -> Option<Duration> {
        self.tps.map(|tps| Duration::from_secs(1) / tps)
    }

    /// Part of the tick budget not yet used after `elapsed`.
    fn slack(&self, elapsed: Duration) -> Duration {
        self.tick_budget()
            .map_or(Duration::ZERO, |budget| budget.saturating_sub(elapsed))
    }

    /// The only sleep point of a tick.
    pub(crate) fn wait(&mut self) {
        let slack = self.slack(self.last_tick.elapsed());
        if !slack.is_zero() {
            thread::sleep(slack);
        }
        self.last_tick = Instant::now();
    }
}

impl fmt::Display for TickPacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tps {
            Some(tps) => write!(f, "{tps}"),
            None => f.write_str("off"),
        }
    }
}
