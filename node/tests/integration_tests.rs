//! Integration tests driving the full task graph of an [`ElectionNode`]
//! with nullable collaborators.
//!
//! Sweep timers are pushed far into the future; sweeps are triggered
//! explicitly through the handle, with time driven by a [`NullClock`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use quorum_consensus::{
    BroadcastStrategy, ElectionEvent, RepWeightCache, Transaction, TransactionRejectionReason,
    Vote, VoteDropReason, VoteEvent, VoteRejectionReason, VoteSigner,
};
use quorum_crypto::{keypair_from_seed, sign_message};
use quorum_node::{ElectionNode, NodeConfig, NodeDependencies, NodeError, NodeEvent, NodeHandle};
use quorum_nullables::{NullClock, NullNetwork, NullSigner, NullStore};
use quorum_types::{Amount, Height, PublicKey, Timestamp, TxHash};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const START_MS: u64 = 1_000_000;
const LOCAL_SEED: u8 = 1;

struct Harness {
    node: ElectionNode,
    handle: NodeHandle,
    store: Arc<NullStore>,
    network: Arc<NullNetwork>,
    clock: Arc<NullClock>,
}

fn rep(seed: u8) -> PublicKey {
    keypair_from_seed(&[seed; 32]).public
}

fn config() -> NodeConfig {
    NodeConfig {
        min_vote_weight: 1,
        sweep_interval_secs: 3_600,
        poll_interval_ms: 10,
        vote_channel_size: 1,
        ..NodeConfig::default()
    }
}

/// Start a node. `weights` maps rep seeds to their delegated weight; the
/// local representative uses `LOCAL_SEED` when `voting` is set.
fn start(voting: bool, weights: &[(u8, u128)]) -> Harness {
    let mut cache = RepWeightCache::new();
    for (seed, weight) in weights {
        cache.add_weight(&rep(*seed), Amount::new(*weight));
    }
    let signer = voting.then(|| Arc::new(NullSigner::new(LOCAL_SEED)) as Arc<dyn VoteSigner>);
    let store = Arc::new(NullStore::new());
    let network = Arc::new(NullNetwork::new());
    let clock = Arc::new(NullClock::new(START_MS));

    let node = ElectionNode::start(
        config(),
        NodeDependencies {
            weights: Arc::new(cache),
            signer,
            store: store.clone(),
            broadcaster: network.clone(),
            clock: clock.clone(),
        },
    )
    .expect("node starts");
    let handle = node.handle();
    Harness {
        node,
        handle,
        store,
        network,
        clock,
    }
}

fn tx(id: u8) -> Transaction {
    Transaction::new(
        TxHash::new([id; 32]),
        PublicKey([200u8; 32]),
        Height::new(1),
        Timestamp::from_millis(START_MS),
    )
}

/// A correctly signed vote from the rep with `seed`. Weight is left at zero;
/// the node looks it up on admission.
fn remote_vote(seed: u8, hash: TxHash, timestamp: Timestamp) -> Vote {
    let keypair = keypair_from_seed(&[seed; 32]);
    let payload = Vote::signing_payload(&hash, timestamp, &keypair.public);
    Vote::new(
        hash,
        keypair.public,
        timestamp,
        sign_message(&payload, &keypair.private),
        Amount::MIN,
    )
}

async fn wait_for(
    events: &mut broadcast::Receiver<NodeEvent>,
    matches: impl Fn(&NodeEvent) -> bool,
) -> NodeEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for node event")
}

async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never became true");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn observed_transaction_gets_local_vote() {
    let mut h = start(true, &[(LOCAL_SEED, 40), (2, 30), (3, 30)]);
    let mut events = h.handle.subscribe();

    h.handle.transaction_validated(tx(1)).unwrap();

    let event = wait_for(&mut events, |e| matches!(e, NodeEvent::VoteCast(_))).await;
    let NodeEvent::VoteCast(cast) = event else {
        unreachable!()
    };
    assert_eq!(cast.vote.hash, tx(1).hash);
    assert_eq!(cast.vote.public_key, rep(LOCAL_SEED));
    assert!(!cast.vote.is_final());
    assert_eq!(cast.strategy, BroadcastStrategy::Voters);
    assert_eq!(h.network.sent_votes(), vec![(BroadcastStrategy::Voters, false)]);

    let snapshot = h.handle.election_snapshot().await.unwrap();
    assert_eq!(snapshot.open_elections, 1);
    assert_eq!(snapshot.candidates, 1);

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn remote_final_votes_confirm_and_persist() {
    let mut h = start(true, &[(LOCAL_SEED, 40), (2, 30), (3, 30)]);
    let mut events = h.handle.subscribe();
    let hash = tx(1).hash;

    h.handle.transaction_validated(tx(1)).unwrap();
    h.handle
        .vote_received(remote_vote(2, hash, Timestamp::FINAL))
        .unwrap();
    h.handle
        .vote_received(remote_vote(3, hash, Timestamp::FINAL))
        .unwrap();

    let saved = wait_for(&mut events, |e| matches!(e, NodeEvent::TransactionSaved(_))).await;
    let NodeEvent::TransactionSaved(transaction) = saved else {
        unreachable!()
    };
    assert_eq!(transaction.hash, hash);

    let votes = h.store.votes_for(&hash).expect("confirmed transaction persisted");
    assert!(votes.len() >= 2);
    assert!(votes.iter().all(|v| v.is_final()));
    assert!(votes.iter().any(|v| v.public_key == rep(LOCAL_SEED)));
    assert!(h
        .network
        .sent_votes()
        .contains(&(BroadcastStrategy::Everyone, true)));

    let metrics = h.handle.metrics();
    assert_eq!(metrics.elections_confirmed.get(), 1);
    assert_eq!(h.handle.election_snapshot().await.unwrap().open_elections, 0);

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn early_votes_are_buffered_then_replayed() {
    let mut h = start(false, &[(2, 40), (3, 30)]);
    let mut events = h.handle.subscribe();
    let hash = tx(7).hash;

    h.handle
        .vote_received(remote_vote(2, hash, Timestamp::FINAL))
        .unwrap();
    h.handle
        .vote_received(remote_vote(3, hash, Timestamp::FINAL))
        .unwrap();

    let snapshot = h.handle.prioritizer_snapshot().await.unwrap();
    assert_eq!(snapshot.buffered_votes, 2);
    assert_eq!(snapshot.buffered_groups, 1);
    assert_eq!(snapshot.active_elections, 0);

    h.handle.transaction_validated(tx(7)).unwrap();

    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Confirmed { .. }))
    })
    .await;
    wait_for(&mut events, |e| matches!(e, NodeEvent::TransactionSaved(_))).await;
    assert_eq!(h.store.votes_for(&hash).map(|v| v.len()), Some(2));
    assert!(h.network.sent_votes().is_empty());

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn vote_from_weightless_rep_is_rejected() {
    let mut h = start(false, &[(2, 100)]);
    let mut events = h.handle.subscribe();

    h.handle.transaction_validated(tx(1)).unwrap();
    h.handle
        .vote_received(remote_vote(9, tx(1).hash, Timestamp::from_millis(5)))
        .unwrap();

    let event = wait_for(&mut events, |e| matches!(e, NodeEvent::Vote(_))).await;
    let NodeEvent::Vote(VoteEvent::Rejected { vote, reason }) = &event else {
        panic!("expected rejection, got {event:?}");
    };
    assert_eq!(vote.public_key, rep(9));
    assert_eq!(*reason, VoteRejectionReason::InvalidVotingWeight);
    assert_eq!(
        h.handle
            .metrics()
            .votes_rejected
            .with_label_values(&["invalid_voting_weight"])
            .get(),
        1
    );

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn votes_for_rejected_transaction_are_dropped() {
    let mut h = start(false, &[(2, 100)]);
    let mut events = h.handle.subscribe();
    let hash = tx(4).hash;

    h.handle
        .transaction_rejected(tx(4), TransactionRejectionReason::InvalidTransaction)
        .unwrap();
    h.handle
        .vote_received(remote_vote(2, hash, Timestamp::from_millis(5)))
        .unwrap();

    let event = wait_for(&mut events, |e| matches!(e, NodeEvent::Vote(_))).await;
    let NodeEvent::Vote(VoteEvent::Dropped { reason, .. }) = &event else {
        panic!("expected drop, got {event:?}");
    };
    assert_eq!(*reason, VoteDropReason::TransactionDropped);
    assert_eq!(h.handle.prioritizer_snapshot().await.unwrap().buffered_votes, 0);

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn stalled_election_is_rebroadcast_then_expires() {
    let mut h = start(false, &[(2, 100)]);
    let mut events = h.handle.subscribe();

    h.handle.transaction_validated(tx(1)).unwrap();
    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Started { .. }))
    })
    .await;

    h.clock.advance(Duration::from_secs(61));
    h.handle.run_staling_sweep().unwrap();
    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Staling { .. }))
    })
    .await;
    let network = h.network.clone();
    eventually(move || network.sent_transactions() == 1).await;

    h.clock.advance(Duration::from_secs(240));
    h.handle.run_expiry_sweep().unwrap();
    let staled = wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Staled { .. }))
    })
    .await;
    assert_eq!(
        staled,
        NodeEvent::Election(ElectionEvent::Staled { transaction: tx(1) })
    );
    assert_eq!(h.handle.election_snapshot().await.unwrap().open_elections, 0);
    assert_eq!(h.handle.metrics().elections_staled.get(), 1);

    // An expired slot may be observed again.
    h.handle.transaction_validated(tx(1)).unwrap();
    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Started { .. }))
    })
    .await;

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn old_transaction_gets_late_final_vote() {
    let mut h = start(true, &[(LOCAL_SEED, 100)]);
    let mut events = h.handle.subscribe();
    h.store.insert(tx(3));

    h.handle
        .transaction_rejected(tx(3), TransactionRejectionReason::OldTransaction)
        .unwrap();

    let event = wait_for(&mut events, |e| matches!(e, NodeEvent::VoteCast(_))).await;
    let NodeEvent::VoteCast(cast) = event else {
        unreachable!()
    };
    assert_eq!(cast.vote.hash, tx(3).hash);
    assert!(cast.vote.is_final());
    assert_eq!(cast.strategy, BroadcastStrategy::Everyone);
    assert_eq!(h.network.sent_votes(), vec![(BroadcastStrategy::Everyone, true)]);

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn store_failure_is_counted_not_saved() {
    let mut h = start(false, &[(2, 100)]);
    let mut events = h.handle.subscribe();
    h.store.fail_writes(true);

    h.handle.transaction_validated(tx(1)).unwrap();
    h.handle
        .vote_received(remote_vote(2, tx(1).hash, Timestamp::FINAL))
        .unwrap();

    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Confirmed { .. }))
    })
    .await;
    let metrics = h.handle.metrics();
    eventually(move || metrics.store_failures.get() == 1).await;
    assert!(h.store.is_empty());

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn tally_reports_candidate_weight() {
    let mut h = start(false, &[(2, 60), (3, 40)]);
    let mut events = h.handle.subscribe();
    let hash = tx(1).hash;

    h.handle.transaction_validated(tx(1)).unwrap();
    h.handle
        .vote_received(remote_vote(3, hash, Timestamp::from_millis(10)))
        .unwrap();
    wait_for(&mut events, |e| {
        matches!(e, NodeEvent::Election(ElectionEvent::Started { .. }))
    })
    .await;

    let tally = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match h.handle.tally(hash).await.unwrap() {
                Some(tally) if tally.votes == 1 => return tally,
                _ => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    })
    .await
    .expect("vote never reached the election");
    assert_eq!(tally.total_weight, Amount::new(40));
    assert_eq!(tally.final_weight, Amount::MIN);
    assert_eq!(tally.votes, 1);
    assert!(tally.leading);
    assert!(h.handle.tally(TxHash::new([99u8; 32])).await.unwrap().is_none());

    h.node.stop().await.unwrap();
}

#[tokio::test]
async fn stop_closes_the_handle() {
    let mut h = start(false, &[(2, 100)]);
    h.node.stop().await.unwrap();
    assert!(h.node.is_stopped());

    assert!(matches!(
        h.handle.vote_received(remote_vote(2, tx(1).hash, Timestamp::FINAL)),
        Err(NodeError::ChannelClosed(_))
    ));
    assert!(matches!(
        h.handle.election_snapshot().await,
        Err(NodeError::ChannelClosed(_))
    ));
}

#[test]
fn invalid_config_refuses_to_start() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    let result = ElectionNode::start(
        NodeConfig {
            voter_strategy: quorum_consensus::VoterStrategy::ForceEnabled,
            ..config()
        },
        NodeDependencies {
            weights: Arc::new(RepWeightCache::new()),
            signer: None,
            store: Arc::new(NullStore::new()),
            broadcaster: Arc::new(NullNetwork::new()),
            clock: Arc::new(NullClock::new(START_MS)),
        },
    );
    assert!(matches!(result, Err(NodeError::Config(_))));
}
