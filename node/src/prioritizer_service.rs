//! Prioritizer task: admits inbound votes and feeds the election task,
//! heaviest vote first.
//!
//! The loop is cooperative. Pending commands are drained before each poll so
//! the queue orders everything that has arrived; when the queue is empty the
//! task sleeps for the poll interval or until the next command, whichever
//! comes first.
//!
//! Votes reach the election task over a bounded channel. A slot is reserved
//! before the queue is polled, so when the election task falls behind votes
//! stay in the queue, where capacity pressure evicts the lightest.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::oneshot;

use quorum_consensus::{Transaction, Vote, VoteEvent, VotePrioritizer, VoteWeightService};
use quorum_types::TxHash;

use crate::events::NodeEvent;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

pub(crate) enum PrioritizerCommand {
    VoteReceived(Vote),
    ElectionStarted(Transaction),
    TransactionRejected(TxHash),
    TransactionSaved(TxHash),
    ElectionExpired(TxHash),
    Snapshot(oneshot::Sender<PrioritizerSnapshot>),
}

/// Sizes of the prioritizer's holding areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrioritizerSnapshot {
    pub queued_votes: usize,
    pub buffered_votes: usize,
    pub buffered_groups: usize,
    pub active_elections: usize,
}

pub(crate) struct PrioritizerService {
    prioritizer: VotePrioritizer,
    weights: Arc<dyn VoteWeightService>,
    router: Router,
    poll_interval: Duration,
}

impl PrioritizerService {
    pub fn new(
        prioritizer: VotePrioritizer,
        weights: Arc<dyn VoteWeightService>,
        router: Router,
        poll_interval: Duration,
    ) -> Self {
        Self {
            prioritizer,
            weights,
            router,
            poll_interval,
        }
    }

    pub async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<PrioritizerCommand>,
        votes: mpsc::Sender<Vote>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            loop {
                match inbox.try_recv() {
                    Ok(command) => self.handle(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if shutdown.is_shutdown() {
                break;
            }

            if self.prioritizer.queue_len() == 0 {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => break,
                    command = inbox.recv() => match command {
                        Some(command) => self.handle(command),
                        None => break,
                    },
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                permit = votes.reserve() => {
                    let Ok(permit) = permit else {
                        tracing::debug!("election task gone, prioritizer stopping");
                        break;
                    };
                    if let Some(entry) = self.prioritizer.poll() {
                        permit.send(entry.vote);
                        self.update_gauges();
                    }
                    tokio::task::yield_now().await;
                }
            }
        }
        tracing::info!(
            abandoned = self.prioritizer.queue_len(),
            "vote prioritizer task shutting down"
        );
    }

    fn handle(&mut self, command: PrioritizerCommand) {
        let events = match command {
            PrioritizerCommand::VoteReceived(mut vote) => {
                self.router.metrics.votes_received.inc();
                vote.weight = self.weights.weight_of(&vote.public_key);
                self.prioritizer.admit(vote)
            }
            PrioritizerCommand::ElectionStarted(transaction) => {
                self.prioritizer.election_started(transaction)
            }
            PrioritizerCommand::TransactionRejected(hash) => {
                self.prioritizer.transaction_rejected(hash)
            }
            PrioritizerCommand::TransactionSaved(hash) => {
                self.prioritizer.transaction_saved(&hash);
                Vec::new()
            }
            PrioritizerCommand::ElectionExpired(hash) => {
                self.prioritizer.election_expired(&hash);
                Vec::new()
            }
            PrioritizerCommand::Snapshot(reply) => {
                let _ = reply.send(PrioritizerSnapshot {
                    queued_votes: self.prioritizer.queue_len(),
                    buffered_votes: self.prioritizer.buffer_len(),
                    buffered_groups: self.prioritizer.buffer_groups(),
                    active_elections: self.prioritizer.active_len(),
                });
                return;
            }
        };

        for event in events {
            self.report(event);
        }
        self.update_gauges();
    }

    fn report(&self, event: VoteEvent) {
        let metrics = &self.router.metrics;
        match &event {
            VoteEvent::Dropped { vote, reason } => {
                tracing::trace!(hash = %vote.hash, voter = %vote.public_key, reason = reason.as_str(), "vote dropped");
                metrics.votes_dropped.with_label_values(&[reason.as_str()]).inc();
            }
            VoteEvent::Rejected { vote, reason } => {
                tracing::debug!(hash = %vote.hash, voter = %vote.public_key, reason = reason.as_str(), "vote rejected");
                metrics.votes_rejected.with_label_values(&[reason.as_str()]).inc();
            }
        }
        self.router.publish(NodeEvent::Vote(event));
    }

    fn update_gauges(&self) {
        let metrics = &self.router.metrics;
        metrics.queue_size.set(self.prioritizer.queue_len() as i64);
        metrics
            .buffered_groups
            .set(self.prioritizer.buffer_groups() as i64);
    }
}
