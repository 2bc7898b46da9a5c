//! End-to-end resharing scenarios over the in-memory network

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;

use crate::{
    commitment::{dl, PolyCommitment, Witness},
    messages::{BoardRequest, BoardResponse, NodeRequest},
    tests::helpers::{generate_element, seeded_rng, Deployment, Dealer},
    BoardService, Field, FieldOf, InMemoryNetwork, NodeService, PairingSuite, Phase,
    ProtocolConfig, ProtocolError, Transport,
};

/// Test one epoch with three nodes and degree one: every node ends up with
/// shares verifying against the new commitments, the shares changed, and the
/// secret is preserved.
pub async fn check_end_to_end<C: PairingSuite>() {
    let mut rng = seeded_rng(0x5eed);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let deployment = Deployment::<C>::honest(config, Dealer::Replicated, &mut rng).await;
    let before = deployment.shares().await;

    deployment.run_epoch().await.unwrap();

    for node in &deployment.nodes {
        let status = node.status();
        assert_eq!(*status.phase(), Phase::Idle);
        assert_eq!(*status.epoch(), 1);
        let metrics = node.last_metrics().await.unwrap();
        assert_eq!(*metrics.epoch(), 1);
        assert!(*metrics.bytes_received() > 0);
    }
    let after = deployment.shares().await;
    for (index, slots) in &after {
        for (old, new) in before[index].iter().zip(slots.iter()) {
            assert_ne!(old.value(), new.value());
        }
    }
    deployment.assert_consistent().await;
    assert_eq!(deployment.board.epoch().await, 1);
    assert!(deployment.board.bytes_written().await > 0);
}

/// Test two consecutive epochs with five nodes, degree two and a bivariate
/// initial sharing.
pub async fn check_bivariate_two_epochs<C: PairingSuite>() {
    let mut rng = seeded_rng(7);
    let config = ProtocolConfig::new(5, 2).unwrap();
    let deployment = Deployment::<C>::honest(config, Dealer::Bivariate, &mut rng).await;
    deployment.assert_consistent().await;

    for epoch in 1..=2 {
        deployment.run_epoch().await.unwrap();
        for node in &deployment.nodes {
            assert_eq!(*node.status().epoch(), epoch);
        }
        deployment.assert_consistent().await;
    }
    assert_eq!(deployment.board.epoch().await, 2);
}

/// Test that a node refuses to reconstruct from a share with a bad witness.
pub async fn check_corrupted_phase1_witness<C: PairingSuite>() {
    let mut rng = seeded_rng(11);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let forged = Witness::<C>::new(generate_element::<C, _>(&mut rng)).serialize();
    let deployment = Deployment::<C>::new(config, Dealer::Replicated, &mut rng, |index, network| {
        if index == 1 {
            Arc::new(Tampering {
                inner: network,
                tamper: Tamper::Phase1Witness {
                    to: 2,
                    witness: forged.clone(),
                },
            }) as Arc<dyn Transport>
        } else {
            network
        }
    })
    .await;
    let before = deployment.node(2).shares().await;

    assert!(deployment.run_epoch().await.is_err());

    assert_eq!(
        deployment.aborted(2).await,
        ProtocolError::ReconstructionVerification { sender: 1 }
    );
    assert_eq!(deployment.node(2).shares().await, before);
    assert!(matches!(
        deployment.node(2).handle(NodeRequest::StartEpoch).await,
        Err(ProtocolError::Aborted(_))
    ));
}

/// Test that a wrong zero-share commitment on the board aborts every node.
pub async fn check_tampered_zero_sum<C: PairingSuite>() {
    let mut rng = seeded_rng(13);
    let config = ProtocolConfig::new(4, 2).unwrap();
    let bogus = dl::commit::<C>(&<FieldOf<C>>::random(&mut rng)).serialize();
    let deployment = Deployment::<C>::new(config, Dealer::Bivariate, &mut rng, |index, network| {
        if index == 3 {
            Arc::new(Tampering {
                inner: network,
                tamper: Tamper::ZeroShareCommitment(bogus.clone()),
            }) as Arc<dyn Transport>
        } else {
            network
        }
    })
    .await;
    let before = deployment.shares().await;

    assert!(deployment.run_epoch().await.is_err());

    for node in &deployment.nodes {
        assert_eq!(
            deployment.aborted(node.index()).await,
            ProtocolError::ZeroSumMismatch
        );
        assert_eq!(*node.status().epoch(), 0);
    }
    assert_eq!(deployment.shares().await, before);
}

/// Test that a zero-polynomial witness which does not open at zero aborts
/// every node, naming the party that posted it.
pub async fn check_tampered_zero_witness<C: PairingSuite>() {
    let mut rng = seeded_rng(19);
    let config = ProtocolConfig::new(4, 1).unwrap();
    let forged = Witness::<C>::new(generate_element::<C, _>(&mut rng)).serialize();
    let deployment = Deployment::<C>::new(config, Dealer::Replicated, &mut rng, |index, network| {
        if index == 2 {
            Arc::new(Tampering {
                inner: network,
                tamper: Tamper::ZeroWitness(forged.clone()),
            }) as Arc<dyn Transport>
        } else {
            network
        }
    })
    .await;
    let before = deployment.shares().await;

    assert!(deployment.run_epoch().await.is_err());

    for node in &deployment.nodes {
        assert_eq!(
            deployment.aborted(node.index()).await,
            ProtocolError::ZeroWitnessInvalid { party: 2 }
        );
        assert_eq!(*node.status().epoch(), 0);
    }
    assert_eq!(deployment.shares().await, before);
}

/// Test that a posted new commitment which is not `old + mid` aborts every
/// node before any share is replaced.
pub async fn check_tampered_new_commitment<C: PairingSuite>() {
    let mut rng = seeded_rng(23);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let bogus = PolyCommitment::<C>::new(generate_element::<C, _>(&mut rng)).serialize();
    let deployment = Deployment::<C>::new(config, Dealer::Bivariate, &mut rng, |index, network| {
        if index == 1 {
            Arc::new(Tampering {
                inner: network,
                tamper: Tamper::NewCommitment(bogus.clone()),
            }) as Arc<dyn Transport>
        } else {
            network
        }
    })
    .await;
    let before = deployment.shares().await;

    assert!(deployment.run_epoch().await.is_err());

    for node in &deployment.nodes {
        assert_eq!(
            deployment.aborted(node.index()).await,
            ProtocolError::CommitmentMismatch { party: 1 }
        );
        assert_eq!(*node.status().epoch(), 0);
    }
    assert_eq!(deployment.shares().await, before);
}

/// Test that a redistributed share with a bad witness aborts its receiver,
/// which keeps its old shares, while the other nodes finish the epoch.
pub async fn check_corrupted_phase3_witness<C: PairingSuite>() {
    let mut rng = seeded_rng(29);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let forged = Witness::<C>::new(generate_element::<C, _>(&mut rng)).serialize();
    let deployment = Deployment::<C>::new(config, Dealer::Replicated, &mut rng, |index, network| {
        if index == 1 {
            Arc::new(Tampering {
                inner: network,
                tamper: Tamper::Phase3Witness {
                    to: 2,
                    witness: forged.clone(),
                },
            }) as Arc<dyn Transport>
        } else {
            network
        }
    })
    .await;
    let before = deployment.node(2).shares().await;

    assert!(deployment.run_epoch().await.is_err());

    assert_eq!(
        deployment.aborted(2).await,
        ProtocolError::ShareVerification { party: 1 }
    );
    assert_eq!(deployment.node(2).shares().await, before);
    assert_eq!(*deployment.node(2).status().epoch(), 0);
    for index in [1, 3] {
        let status = deployment.completed(index, 1).await;
        assert_eq!(*status.phase(), Phase::Idle);
    }
}

/// Test that verification signals arriving between epochs are refused
/// without aborting the node, and that the next epoch still runs.
pub async fn check_out_of_phase_signals<C: PairingSuite>() {
    let mut rng = seeded_rng(31);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let deployment = Deployment::<C>::honest(config, Dealer::Replicated, &mut rng).await;
    let before = deployment.shares().await;

    let node = deployment.node(1);
    assert_eq!(
        node.handle(NodeRequest::StartVerifPhase2).await,
        Err(ProtocolError::UnexpectedPhase("StartVerifPhase2"))
    );
    assert_eq!(
        node.handle(NodeRequest::StartVerifPhase3).await,
        Err(ProtocolError::UnexpectedPhase("StartVerifPhase3"))
    );
    assert_eq!(*node.status().phase(), Phase::Idle);
    assert_eq!(deployment.shares().await, before);

    deployment.run_epoch().await.unwrap();
    assert_eq!(
        node.handle(NodeRequest::StartVerifPhase3).await,
        Err(ProtocolError::UnexpectedPhase("StartVerifPhase3"))
    );
    for node in &deployment.nodes {
        assert_eq!(*node.status().phase(), Phase::Idle);
        assert_eq!(*node.status().epoch(), 1);
    }
    deployment.assert_consistent().await;
}

/// Test that an epoch taking far longer than the per-call timeout completes,
/// since each call only covers the receiver's own handling.
pub async fn check_slow_epoch_under_timeout<C: PairingSuite>() {
    let mut rng = seeded_rng(37);
    let config = ProtocolConfig::new(3, 1).unwrap();
    let limit = Duration::from_millis(250);
    let delay = Duration::from_millis(100);
    let deployment = Deployment::<C>::with_network(
        InMemoryNetwork::with_timeout(limit),
        config,
        Dealer::Replicated,
        &mut rng,
        |_, network| Arc::new(Delayed { inner: network, delay }) as Arc<dyn Transport>,
    )
    .await;

    let started = Instant::now();
    deployment.run_epoch().await.unwrap();
    assert!(started.elapsed() > limit);

    for node in &deployment.nodes {
        assert_eq!(*node.status().phase(), Phase::Idle);
        assert_eq!(*node.status().epoch(), 1);
    }
    deployment.assert_consistent().await;
    assert_eq!(deployment.board.epoch().await, 1);
}

/// Test that the board refuses to start before every initial commitment is
/// posted, and that a second post for a slot is rejected.
pub async fn check_board_readiness<C: PairingSuite>() {
    let config = ProtocolConfig::new(3, 1).unwrap();
    let network = Arc::new(InMemoryNetwork::new());
    let board = crate::BulletinBoard::new(config, network);
    assert_eq!(
        board.handle(BoardRequest::StartEpoch).await,
        Err(ProtocolError::UnexpectedPhase("StartEpoch"))
    );
    assert_eq!(
        board.handle(BoardRequest::ReadPhase1).await,
        Err(ProtocolError::MissingPost { party: 1 })
    );

    let mut rng = seeded_rng(17);
    let post = crate::messages::CommitmentPost::new(
        2,
        &crate::commitment::PolyCommitment::<C>::new(generate_element::<C, _>(&mut rng)),
    );
    assert_eq!(
        board.handle(BoardRequest::WritePhase1(post.clone())).await,
        Ok(BoardResponse::Ack)
    );
    assert_eq!(
        board.handle(BoardRequest::WritePhase1(post)).await,
        Err(ProtocolError::DuplicateMessage { sender: 2 })
    );
    assert!(!board.is_ready().await);
}

/// Test that the in-memory network reports unreachable and stalled peers.
pub async fn check_transport_failures() {
    let network = InMemoryNetwork::with_timeout(Duration::from_millis(50));
    assert!(matches!(
        network.send_to_node(1, NodeRequest::StartEpoch).await,
        Err(ProtocolError::Transport { .. })
    ));
    assert!(matches!(
        network.send_to_board(BoardRequest::ReadPhase1).await,
        Err(ProtocolError::Transport { .. })
    ));

    let stalled = Arc::new(Stalled);
    network.register_node(1, &stalled).await;
    match network.send_to_node(1, NodeRequest::StartEpoch).await {
        Err(ProtocolError::Transport { peer, reason }) => {
            assert_eq!(peer, "node 1");
            assert_eq!(reason, "timed out");
        }
        other => panic!("unexpected result {other:?}"),
    }

    drop(stalled);
    assert!(network.send_to_node(1, NodeRequest::StartEpoch).await.is_err());
}

/// A node that never answers.
struct Stalled;

#[async_trait]
impl NodeService for Stalled {
    async fn handle(&self, _request: NodeRequest) -> Result<(), ProtocolError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// A node whose board calls are slow but honest.
struct Delayed {
    inner: Arc<InMemoryNetwork>,
    delay: Duration,
}

#[async_trait]
impl Transport for Delayed {
    async fn send_to_node(&self, to: u16, request: NodeRequest) -> Result<(), ProtocolError> {
        self.inner.send_to_node(to, request).await
    }

    async fn send_to_board(&self, request: BoardRequest) -> Result<BoardResponse, ProtocolError> {
        tokio::time::sleep(self.delay).await;
        self.inner.send_to_board(request).await
    }
}

/// How a [`Tampering`] transport alters outbound traffic.
enum Tamper {
    /// Replace the witness of phase 1 shares sent to `to`.
    Phase1Witness { to: u16, witness: Vec<u8> },
    /// Replace the witness of phase 3 shares sent to `to`.
    Phase3Witness { to: u16, witness: Vec<u8> },
    /// Replace the zero-share commitment of the phase 2 post.
    ZeroShareCommitment(Vec<u8>),
    /// Replace the zero-polynomial witness of the phase 2 post.
    ZeroWitness(Vec<u8>),
    /// Replace the commitment of the phase 3 post.
    NewCommitment(Vec<u8>),
}

/// Wraps the network of one node and corrupts some of what it sends.
struct Tampering {
    inner: Arc<InMemoryNetwork>,
    tamper: Tamper,
}

#[async_trait]
impl Transport for Tampering {
    async fn send_to_node(&self, to: u16, mut request: NodeRequest) -> Result<(), ProtocolError> {
        match (&self.tamper, &mut request) {
            (Tamper::Phase1Witness { to: target, witness }, NodeRequest::SharePhase1(message))
            | (Tamper::Phase3Witness { to: target, witness }, NodeRequest::SharePhase3(message))
                if *target == to =>
            {
                message.witness = witness.clone();
            }
            _ => {}
        }
        self.inner.send_to_node(to, request).await
    }

    async fn send_to_board(
        &self,
        mut request: BoardRequest,
    ) -> Result<BoardResponse, ProtocolError> {
        match (&self.tamper, &mut request) {
            (Tamper::ZeroShareCommitment(bogus), BoardRequest::WritePhase2(post)) => {
                post.share_commitment = bogus.clone();
            }
            (Tamper::ZeroWitness(bogus), BoardRequest::WritePhase2(post)) => {
                post.zero_witness = bogus.clone();
            }
            (Tamper::NewCommitment(bogus), BoardRequest::WritePhase3(post)) => {
                post.commitment = bogus.clone();
            }
            _ => {}
        }
        self.inner.send_to_board(request).await
    }
}
