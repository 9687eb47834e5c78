//! Voter task: turns election events into this node's own votes.

use std::sync::Arc;
use tokio::sync::mpsc;

use quorum_consensus::{
    BroadcastMessage, BroadcastPayload, Broadcaster, CastVote, Clock, ElectionEvent,
    ElectionVoter, Transaction, TransactionRejectionReason,
};

use crate::election_service::ElectionCommand;
use crate::events::NodeEvent;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

pub(crate) enum VoterCommand {
    Election(ElectionEvent),
    TransactionRejected(Transaction, TransactionRejectionReason),
}

pub(crate) struct VoterService {
    voter: ElectionVoter,
    router: Router,
    broadcaster: Arc<dyn Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl VoterService {
    pub fn new(
        voter: ElectionVoter,
        router: Router,
        broadcaster: Arc<dyn Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            voter,
            router,
            broadcaster,
            clock,
        }
    }

    pub async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<VoterCommand>,
        mut shutdown: ShutdownSignal,
    ) {
        if !self.voter.can_vote() {
            tracing::info!("local voting inactive, no signer or insufficient weight");
        }
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("voter task shutting down");
                    break;
                }
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
    }

    fn handle(&mut self, command: VoterCommand) {
        match command {
            VoterCommand::Election(event) => {
                let now = self.clock.now();
                for cast in self.voter.on_event(&event, now) {
                    self.cast(cast);
                }
            }
            VoterCommand::TransactionRejected(transaction, reason) => {
                match self.voter.on_transaction_rejected(&transaction, reason) {
                    Ok(Some(cast)) => self.cast(cast),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(hash = %transaction.hash, error = %e, "could not check store for rejected transaction");
                    }
                }
            }
        }
    }

    /// Fold the vote into the local election, then announce it.
    fn cast(&self, cast: CastVote) {
        let kind = if cast.vote.is_final() { "final" } else { "non_final" };
        self.router.metrics.votes_cast.with_label_values(&[kind]).inc();

        self.router.to_election(ElectionCommand::Vote(cast.vote.clone()));
        self.broadcaster.publish(BroadcastMessage::new(
            cast.strategy,
            BroadcastPayload::Vote {
                transaction: cast.transaction.clone(),
                vote: cast.vote.clone(),
            },
        ));
        self.router.publish(NodeEvent::VoteCast(cast));
    }
}
