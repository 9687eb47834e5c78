//! Election task: owns the [`Election`] set and fans its events out.
//!
//! Every mutation of the election set (observing candidates, folding votes,
//! staling and expiry sweeps) arrives on this task's channel and is applied
//! in order, so leader recomputation never races a sweep.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use quorum_consensus::{Clock, Election, ElectionEvent, Transaction, Vote};
use quorum_types::{Amount, TxHash};

use crate::election_monitor::MonitorCommand;
use crate::events::NodeEvent;
use crate::prioritizer_service::PrioritizerCommand;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;
use crate::voter_service::VoterCommand;

pub(crate) enum ElectionCommand {
    Observe(Transaction),
    Vote(Vote),
    ProcessStaling,
    ProcessStaledExpiry,
    Snapshot(oneshot::Sender<ElectionSnapshot>),
    Tally(TxHash, oneshot::Sender<Option<CandidateTally>>),
}

/// Sizes of the election set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElectionSnapshot {
    /// Open elections (slots).
    pub open_elections: usize,
    /// Candidates across all open elections.
    pub candidates: usize,
}

/// Read-only view of one candidate's votes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateTally {
    pub transaction: Transaction,
    pub total_weight: Amount,
    pub final_weight: Amount,
    pub votes: usize,
    /// Whether this candidate currently leads its slot.
    pub leading: bool,
}

pub(crate) struct ElectionService {
    election: Election,
    router: Router,
    clock: Arc<dyn Clock>,
    staling_after: Duration,
    staled_after: Duration,
}

impl ElectionService {
    pub fn new(
        election: Election,
        router: Router,
        clock: Arc<dyn Clock>,
        staling_after: Duration,
        staled_after: Duration,
    ) -> Self {
        Self {
            election,
            router,
            clock,
            staling_after,
            staled_after,
        }
    }

    pub async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<ElectionCommand>,
        mut votes: mpsc::Receiver<Vote>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("election task shutting down");
                    break;
                }
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(vote) = votes.recv() => self.handle(ElectionCommand::Vote(vote)),
            }
        }
    }

    fn handle(&mut self, command: ElectionCommand) {
        let events = match command {
            ElectionCommand::Observe(transaction) => self.election.observe(transaction),
            ElectionCommand::Vote(vote) => self.election.process_vote(vote),
            ElectionCommand::ProcessStaling => self
                .election
                .process_staling(self.clock.now(), self.staling_after),
            ElectionCommand::ProcessStaledExpiry => self
                .election
                .process_staled_expiry(self.clock.now(), self.staled_after),
            ElectionCommand::Snapshot(reply) => {
                let _ = reply.send(ElectionSnapshot {
                    open_elections: self.election.len(),
                    candidates: self.election.candidate_count(),
                });
                return;
            }
            ElectionCommand::Tally(hash, reply) => {
                let _ = reply.send(self.tally(&hash));
                return;
            }
        };

        for event in events {
            self.dispatch(event);
        }
        self.router
            .metrics
            .active_elections
            .set(self.election.len() as i64);
    }

    fn tally(&self, hash: &TxHash) -> Option<CandidateTally> {
        let weighter = self.election.weighter(hash)?;
        let transaction = weighter.transaction().clone();
        let leading = self
            .election
            .consensus(&transaction.slot())
            .is_some_and(|leader| leader.hash == *hash);
        Some(CandidateTally {
            total_weight: weighter.total_weight(),
            final_weight: weighter.total_final_weight(),
            votes: weighter.vote_count(),
            leading,
            transaction,
        })
    }

    fn dispatch(&self, event: ElectionEvent) {
        let metrics = &self.router.metrics;
        match &event {
            ElectionEvent::Started { transaction, .. } => {
                metrics.elections_started.inc();
                self.router
                    .to_prioritizer(PrioritizerCommand::ElectionStarted(transaction.clone()));
            }
            ElectionEvent::Confirmed {
                transaction,
                votes,
                forks,
            } => {
                metrics.elections_confirmed.inc();
                let latency = self
                    .clock
                    .now()
                    .as_millis()
                    .saturating_sub(transaction.received_at.as_millis());
                metrics.confirmation_latency_ms.observe(latency as f64);
                for fork in forks {
                    self.router
                        .to_prioritizer(PrioritizerCommand::ElectionExpired(*fork));
                }
                self.router.to_monitor(MonitorCommand::Confirmed {
                    transaction: transaction.clone(),
                    votes: votes.clone(),
                });
            }
            ElectionEvent::Staling { transaction } => {
                self.router
                    .to_monitor(MonitorCommand::Staling(transaction.clone()));
            }
            ElectionEvent::Staled { transaction } => {
                metrics.elections_staled.inc();
                self.router
                    .to_prioritizer(PrioritizerCommand::ElectionExpired(transaction.hash));
            }
            ElectionEvent::ConsensusChanged { .. } | ElectionEvent::AgreementReached { .. } => {}
        }
        self.router.to_voter(VoterCommand::Election(event.clone()));
        self.router.publish(NodeEvent::Election(event));
    }
}
