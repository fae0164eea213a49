//! Scatter-gather execution of the bids of one round.

use {
    super::{
        Bid,
        time::{Deadline, DeadlineExceeded},
    },
    crate::infra::observe,
    std::sync::Arc,
    tokio::{task::JoinSet, time::Instant},
    tracing::Instrument,
};

/// Marks bids that were still running when the round ended.
pub const ROUND_DEADLINE_EXCEEDED: &str = "round deadline exceeded";
/// Marks bids whose task died before recording an outcome.
pub const BID_TASK_FAILED: &str = "bid task failed";

/// Runs all bids concurrently, one task per bid, and returns once every bid
/// has finished or `deadline` is reached, whichever comes first.
///
/// On the deadline the remaining tasks are aborted and their bids are failed.
/// Every bid has an outcome when this function returns.
pub async fn execute(bids: &[Arc<Bid>], deadline: Deadline) -> Result<(), DeadlineExceeded> {
    let started = Instant::now();
    let mut tasks = JoinSet::new();
    for bid in bids {
        let bid = Arc::clone(bid);
        tasks.spawn(async move { bid.run(deadline).await }.instrument(tracing::Span::current()));
    }

    let all = async {
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                observe::bid_task_failed(&err);
            }
        }
    };
    let result = tokio::time::timeout_at(deadline.instant(), all)
        .await
        .map_err(|_| DeadlineExceeded);
    // Wait for aborted tasks to stop so no bid finishes after being failed.
    tasks.shutdown().await;

    let reason = match result {
        Ok(()) => BID_TASK_FAILED,
        Err(_) => ROUND_DEADLINE_EXCEEDED,
    };
    for bid in bids.iter().filter(|bid| !bid.is_finished()) {
        bid.abandon(reason, started.elapsed());
    }
    result
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::testing::{Reply, partner},
        std::time::Duration,
    };

    fn bids(partners: impl IntoIterator<Item = Arc<crate::domain::Partner>>) -> Vec<Arc<Bid>> {
        partners
            .into_iter()
            .map(|partner| Arc::new(Bid::new(partner)))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_all_bids() {
        let bids = bids([
            partner("a", 30, Reply::Bid(1.0)),
            partner("b", 10, Reply::Status(500)),
            partner("c", 20, Reply::Bid(2.0)),
        ]);

        let started = Instant::now();
        execute(&bids, Deadline::after(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(30));
        assert!(bids.iter().all(|bid| bid.is_finished()));
        assert!(bids[0].is_valid());
        assert!(!bids[1].is_valid());
        assert!(bids[2].is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fails_unfinished_bids() {
        let bids = bids([
            partner("fast", 10, Reply::Bid(1.0)),
            partner("slow", 1_000, Reply::Bid(99.0)),
        ]);

        let started = Instant::now();
        let result = execute(&bids, Deadline::after(Duration::from_millis(100))).await;

        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_millis(100));
        assert!(bids[0].is_valid());
        // The partner call shares the round deadline, so either side may
        // record the failure first.
        assert!(!bids[1].is_valid());
        assert_eq!(bids[1].errors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_bid_does_not_affect_siblings() {
        let bids = bids([
            partner("a", 10, Reply::Panic),
            partner("b", 20, Reply::Bid(4.0)),
        ]);

        execute(&bids, Deadline::after(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(bids[0].errors(), [BID_TASK_FAILED]);
        assert!(bids[1].is_valid());
    }

    #[tokio::test]
    async fn no_bids() {
        execute(&[], Deadline::after(Duration::from_millis(100)))
            .await
            .unwrap();
    }
}
