// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The leadership bridge.
//!
//! Tracks an external [`LeadershipTracker`] by alternately waiting on
//! "become leader" and "become minion" one-shots, translating each
//! flip into a boolean sent to the aggregator. Avoids allocating a
//! full change stream for what is fundamentally a single bit.

use rsw_backend::LeadershipTracker;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Spawn the bridge task. Resolves the initial claim first, racing it
/// against `dying` so shutdown during startup doesn't hang, then
/// loops, waiting on whichever one-shot corresponds to the unit *not*
/// currently holding.
///
/// Returns `None` if `dying` fired before the initial claim resolved;
/// the caller should treat that the same as any other early shutdown.
pub(crate) async fn initial_claim(
    leadership: &Arc<dyn LeadershipTracker>,
    dying: &CancellationToken,
) -> Option<bool> {
    tokio::select! {
        biased;
        _ = dying.cancelled() => None,
        leader = leadership.claim_leader() => Some(leader),
    }
}

/// Run the flip-flop loop, sending each new value on `out`. Exits
/// (dropping `out`) as soon as `dying` fires.
pub(crate) async fn run(
    leadership: Arc<dyn LeadershipTracker>,
    mut leader: bool,
    out: mpsc::Sender<bool>,
    dying: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = dying.cancelled() => return,
            _ = wait_for_flip(&leadership, leader) => {
                leader = !leader;
                if out.send(leader).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn wait_for_flip(leadership: &Arc<dyn LeadershipTracker>, currently_leader: bool) {
    if currently_leader {
        leadership.wait_minion().await;
    } else {
        leadership.wait_leader().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsw_backend::FakeLeadershipTracker;

    #[tokio::test]
    async fn initial_claim_resolves_before_dying() {
        let tracker: Arc<dyn LeadershipTracker> = Arc::new(FakeLeadershipTracker::new(true));
        let dying = CancellationToken::new();
        assert_eq!(initial_claim(&tracker, &dying).await, Some(true));
    }

    #[tokio::test]
    async fn initial_claim_short_circuits_on_dying() {
        let tracker: Arc<dyn LeadershipTracker> = Arc::new(FakeLeadershipTracker::new(true));
        let dying = CancellationToken::new();
        dying.cancel();
        assert_eq!(initial_claim(&tracker, &dying).await, None);
    }

    #[tokio::test]
    async fn flip_flop_alternates_and_reports_each_flip() {
        let fake = Arc::new(FakeLeadershipTracker::new(true));
        let tracker: Arc<dyn LeadershipTracker> = fake.clone();
        let dying = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(4);

        let handle = tokio::spawn(run(tracker, true, tx, dying.clone()));

        fake.fire_minion();
        assert_eq!(rx.recv().await, Some(false));

        fake.fire_leader();
        assert_eq!(rx.recv().await, Some(true));

        dying.cancel();
        handle.await.unwrap();
    }
}
