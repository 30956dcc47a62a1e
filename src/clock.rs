/// Wall-clock capability injected into the commit path so tests can pin a
/// fixed instant and produce reproducible commit byte output.
pub trait Clock: Send + Sync {
    /// Unix seconds and the local UTC offset in minutes (east positive).
    fn now(&self) -> (i64, i32);
}

/// Binds to the host system clock and local offset.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> (i64, i32) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is before the unix epoch");
        (now.as_secs() as i64, local_utc_offset_minutes())
    }
}

/// The host's local UTC offset, in minutes east of UTC. Falls back to UTC
/// (`+0000`) only if the platform refuses the lookup (e.g. a multi-threaded
/// process on a Unix host without the `time` crate's soundness guarantees).
fn local_utc_offset_minutes() -> i32 {
    time::UtcOffset::current_local_offset()
        .map(|offset| offset.whole_minutes() as i32)
        .unwrap_or(0)
}

/// A fixed instant, for deterministic commit tests.
pub struct FixedClock {
    pub unix_seconds: i64,
    pub utc_offset_minutes: i32,
}

impl Clock for FixedClock {
    fn now(&self) -> (i64, i32) {
        (self.unix_seconds, self.utc_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let clock = FixedClock {
            unix_seconds: 1_700_000_000,
            utc_offset_minutes: -300,
        };
        assert_eq!(clock.now(), (1_700_000_000, -300));
    }
}
