use {std::time::Duration, thiserror::Error, tokio::time::Instant};

/// The point in time by which a unit of work has to be done. A single
/// deadline is created per auction round and handed down by value to every
/// layer below it. Layers that need a tighter bound derive one with
/// [`Deadline::tighten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline that expires `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn instant(self) -> Instant {
        self.0
    }

    /// Remaining time until the deadline is reached.
    pub fn remaining(self) -> Result<Duration, DeadlineExceeded> {
        let remaining = self.0.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            Err(DeadlineExceeded)
        } else {
            Ok(remaining)
        }
    }

    /// Derives a deadline that is never later than `self`, bounded by
    /// `timeout` from now.
    pub fn tighten(self, timeout: Duration) -> Self {
        self.min(Self::after(timeout))
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("the deadline has been exceeded")]
pub struct DeadlineExceeded;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_time_shrinks() {
        let deadline = Deadline::after(Duration::from_millis(100));
        assert_eq!(deadline.remaining().unwrap(), Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(40)).await;
        assert_eq!(deadline.remaining().unwrap(), Duration::from_millis(60));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(deadline.remaining().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn tighten_never_extends() {
        let deadline = Deadline::after(Duration::from_millis(100));
        assert_eq!(deadline.tighten(Duration::from_secs(1)), deadline);

        let tight = deadline.tighten(Duration::from_millis(30));
        assert!(tight < deadline);
        assert_eq!(tight.remaining().unwrap(), Duration::from_millis(30));
    }
}
