// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background loop moving status reports from the transport to handlers.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::StatusDispatcher;
use crate::status::MeshStatus;

/// Why the status listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// Shutdown was requested.
    Cancelled,
    /// The transport dropped its end of the status queue.
    ChannelClosed,
}

/// Takes status reports in arrival order and dispatches each one.
///
/// Dispatch is synchronous, so per-address ordering is preserved. A pending
/// cancellation is observed before the next report is taken.
pub(crate) async fn listen_for_status(
    mut rx: mpsc::UnboundedReceiver<MeshStatus>,
    dispatcher: StatusDispatcher,
    cancel: CancellationToken,
) -> ListenerExit {
    tracing::debug!("Starting status listener");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Status listener cancelled");
                return ListenerExit::Cancelled;
            }
            status = rx.recv() => {
                let Some(status) = status else {
                    tracing::warn!("Status queue closed by transport, listener stopping");
                    return ListenerExit::ChannelClosed;
                };
                tracing::debug!(avid = %status.avid, report = ?status.report, "Status update from mesh");
                dispatcher.dispatch(&status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::types::{Avid, Brightness};

    #[tokio::test]
    async fn dispatches_in_arrival_order_until_cancelled() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = StatusDispatcher::new();
        let cancel = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _sub = dispatcher.subscribe(move |s| seen_clone.lock().push(s.clone()));

        let task = tokio::spawn(listen_for_status(rx, dispatcher, cancel.clone()));

        for level in [10, 20, 30] {
            tx.send(MeshStatus::brightness(Avid::new("1"), Brightness::new(level)))
                .unwrap();
        }
        while seen.lock().len() < 3 {
            tokio::task::yield_now().await;
        }

        cancel.cancel();
        assert_eq!(task.await.unwrap(), ListenerExit::Cancelled);

        let expected: Vec<MeshStatus> = [10, 20, 30]
            .into_iter()
            .map(|level| MeshStatus::brightness(Avid::new("1"), Brightness::new(level)))
            .collect();
        assert_eq!(*seen.lock(), expected);
    }

    #[tokio::test]
    async fn reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel::<MeshStatus>();
        drop(tx);

        let exit = listen_for_status(rx, StatusDispatcher::new(), CancellationToken::new()).await;
        assert_eq!(exit, ListenerExit::ChannelClosed);
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_status() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = StatusDispatcher::new();
        let cancel = CancellationToken::new();
        let count = Arc::new(Mutex::new(0));

        let count_clone = Arc::clone(&count);
        let _sub = dispatcher.subscribe(move |_| *count_clone.lock() += 1);

        tx.send(MeshStatus::no_change(Avid::new("1"))).unwrap();
        cancel.cancel();

        let exit = listen_for_status(rx, dispatcher, cancel).await;
        assert_eq!(exit, ListenerExit::Cancelled);
        assert_eq!(*count.lock(), 0);
    }
}
