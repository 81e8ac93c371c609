//! Sequence correlator: matches inbound responses to waiting callers.
//!
//! The pending table is the one piece of shared mutable state on a connection. Issuing a call
//! inserts an entry, the read loop removes it when the response arrives, and the caller removes
//! it itself on timeout or when it stops waiting. Every access goes through a single mutex; the
//! hand-off to the waiter is a oneshot channel resolved exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{ClusterwireError, Result};
use crate::protocol::{Frame, NO_SEQUENCE};

struct PendingEntry {
    control: bool,
    route: u8,
    tx: oneshot::Sender<Result<Frame>>,
}

#[derive(Default)]
struct Table {
    entries: HashMap<u64, PendingEntry>,
    closed: bool,
}

/// Per-connection sequence allocator and pending-request table.
pub struct Correlator {
    next_seq: AtomicU64,
    table: Mutex<Table>,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            table: Mutex::new(Table::default()),
        }
    }

    /// Reserve a sequence and record a pending entry for it.
    ///
    /// `control` and `route` describe the request; only a response with the same kind and
    /// route completes the entry.
    pub fn register(
        self: &Arc<Self>,
        control: bool,
        route: u8,
        timeout: Duration,
    ) -> Result<PendingCall> {
        let (tx, rx) = oneshot::channel();

        let seq = {
            let mut table = self.table.lock();
            if table.closed {
                return Err(ClusterwireError::ConnectionClosed);
            }

            let seq = self.allocate(&table.entries);
            table
                .entries
                .insert(seq, PendingEntry { control, route, tx });
            trace!(seq, route, pending = table.entries.len(), "Registered pending call");
            seq
        };

        Ok(PendingCall {
            seq,
            deadline: Instant::now() + timeout,
            rx,
            correlator: Arc::clone(self),
            finished: false,
        })
    }

    fn allocate(&self, in_use: &HashMap<u64, PendingEntry>) -> u64 {
        loop {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            if seq != NO_SEQUENCE && !in_use.contains_key(&seq) {
                return seq;
            }
        }
    }

    /// Deliver a response frame to its waiter.
    ///
    /// Fails with `UnmatchedSequence` (leaving the table untouched) when no pending entry has
    /// this sequence, or when the entry was issued for a different route or frame kind.
    pub fn complete(&self, frame: Frame) -> Result<()> {
        let (seq, route) = (frame.seq(), frame.route());

        let entry = {
            let mut table = self.table.lock();
            match table.entries.get(&seq) {
                Some(entry) if entry.route == route && entry.control == frame.is_control() => {
                    table.entries.remove(&seq)
                }
                _ => None,
            }
        };

        match entry {
            Some(entry) => {
                // The waiter may have just given up; nothing to report then.
                let _ = entry.tx.send(Ok(frame));
                Ok(())
            }
            None => Err(ClusterwireError::UnmatchedSequence { seq, route }),
        }
    }

    /// Cancel a pending call, resolving its waiter with `Cancelled`.
    ///
    /// Returns `false` if the sequence was not pending.
    pub fn cancel(&self, seq: u64) -> bool {
        let entry = self.table.lock().entries.remove(&seq);
        match entry {
            Some(entry) => {
                let _ = entry.tx.send(Err(ClusterwireError::Cancelled { seq }));
                true
            }
            None => false,
        }
    }

    /// Fail every pending call with `ConnectionClosed` and refuse new registrations.
    ///
    /// Returns the number of calls that were failed.
    pub fn close(&self) -> usize {
        let drained: Vec<_> = {
            let mut table = self.table.lock();
            table.closed = true;
            table.entries.drain().collect()
        };

        let count = drained.len();
        for (_, entry) in drained {
            let _ = entry.tx.send(Err(ClusterwireError::ConnectionClosed));
        }
        if count > 0 {
            debug!(count, "Failed pending calls on close");
        }
        count
    }

    pub fn is_closed(&self) -> bool {
        self.table.lock().closed
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, seq: u64) -> bool {
        self.table.lock().entries.remove(&seq).is_some()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

/// A reserved sequence waiting for its response.
///
/// Dropping it before the response arrives removes the pending entry, so a late response is
/// discarded as unmatched. That is the cancellation path for calls made through a
/// [`ConnectionHandle`](crate::ConnectionHandle): dropping the call future drops its
/// `PendingCall`. [`Correlator::cancel`] is for code that drives a correlator directly and
/// wants the waiter to observe `Cancelled`.
pub struct PendingCall {
    seq: u64,
    deadline: Instant,
    rx: oneshot::Receiver<Result<Frame>>,
    correlator: Arc<Correlator>,
    finished: bool,
}

impl PendingCall {
    /// The sequence to stamp on the outbound request.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Wait for the response frame.
    ///
    /// Resolves with `Timeout` once the deadline passes; the entry is removed in that case.
    pub async fn wait(mut self) -> Result<Frame> {
        let outcome = tokio::time::timeout_at(self.deadline, &mut self.rx).await;
        self.finished = true;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClusterwireError::ConnectionClosed),
            Err(_) => {
                self.correlator.remove(self.seq);
                debug!(seq = self.seq, "Pending call timed out");
                Err(ClusterwireError::Timeout { seq: self.seq })
            }
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if !self.finished && self.correlator.remove(self.seq) {
            trace!(seq = self.seq, "Pending call dropped before its response");
        }
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("seq", &self.seq)
            .field("deadline", &self.deadline)
            .finish()
    }
}
