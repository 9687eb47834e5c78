//! Monitor task: persists confirmations and rebroadcasts stalling candidates.
//!
//! Store writes happen here rather than on the election task so a slow
//! store never holds up vote processing.

use std::sync::Arc;
use tokio::sync::mpsc;

use quorum_consensus::{
    BroadcastMessage, BroadcastPayload, BroadcastStrategy, Broadcaster, Transaction,
    TransactionStore, Vote,
};

use crate::events::NodeEvent;
use crate::prioritizer_service::PrioritizerCommand;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

pub(crate) enum MonitorCommand {
    Confirmed {
        transaction: Transaction,
        votes: Vec<Vote>,
    },
    Staling(Transaction),
}

pub(crate) struct ElectionMonitor {
    store: Arc<dyn TransactionStore>,
    broadcaster: Arc<dyn Broadcaster>,
    router: Router,
}

impl ElectionMonitor {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        broadcaster: Arc<dyn Broadcaster>,
        router: Router,
    ) -> Self {
        Self {
            store,
            broadcaster,
            router,
        }
    }

    pub async fn run(
        self,
        mut inbox: mpsc::UnboundedReceiver<MonitorCommand>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("election monitor shutting down");
                    break;
                }
                command = inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
    }

    fn handle(&self, command: MonitorCommand) {
        match command {
            MonitorCommand::Confirmed { transaction, votes } => {
                self.persist(transaction, &votes);
            }
            MonitorCommand::Staling(transaction) => {
                tracing::debug!(hash = %transaction.hash, "rebroadcasting stalling candidate");
                self.broadcaster.publish(BroadcastMessage::new(
                    BroadcastStrategy::Voters,
                    BroadcastPayload::Transaction(transaction),
                ));
            }
        }
    }

    fn persist(&self, transaction: Transaction, votes: &[Vote]) {
        let hash = transaction.hash;
        match self.store.save_confirmed(&transaction, votes) {
            Ok(()) => {
                tracing::info!(%hash, account = %transaction.account, height = transaction.height.value(), final_votes = votes.len(), "transaction confirmed");
                self.router
                    .to_prioritizer(PrioritizerCommand::TransactionSaved(hash));
                self.router.publish(NodeEvent::TransactionSaved(transaction));
            }
            Err(e) => {
                tracing::warn!(%hash, error = %e, "failed to persist confirmed transaction");
                self.router.metrics.store_failures.inc();
                self.router
                    .to_prioritizer(PrioritizerCommand::ElectionExpired(hash));
            }
        }
    }
}
