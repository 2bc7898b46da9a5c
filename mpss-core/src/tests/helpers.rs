//! Helper functions for testing

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use futures::future::select_all;

use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};

use crate::{
    messages::BoardRequest,
    share::{deal_bivariate, deal_replicated},
    BulletinBoard, CommitmentKey, Field, FieldOf, G1Element, Group, InMemoryNetwork, Node,
    NodeStatus, PairingSuite, Phase, ProtocolConfig, ProtocolError, Scalar, ShareRecord,
    Transport,
};

/// How long a test waits for the nodes to finish before giving up.
const SETTLE_LIMIT: Duration = Duration::from_secs(60);

/// Helper function for randomly generating an element
pub fn generate_element<C: PairingSuite, R: RngCore + CryptoRng>(rng: &mut R) -> G1Element<C> {
    let scalar = <FieldOf<C>>::random(rng);
    <C::G1>::generator() * scalar
}

/// A deterministic RNG for reproducible runs.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// How the initial shares are dealt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dealer {
    /// One polynomial shared by every party.
    Replicated,
    /// A bivariate polynomial, one reduced polynomial per party.
    Bivariate,
}

/// A board and `n` nodes wired together over an [`InMemoryNetwork`].
pub struct Deployment<C: PairingSuite> {
    /// The protocol shape.
    pub config: ProtocolConfig,
    /// The commitment key every party uses.
    pub key: CommitmentKey<C>,
    /// The network everybody is registered on.
    pub network: Arc<InMemoryNetwork>,
    /// The bulletin board.
    pub board: Arc<BulletinBoard>,
    /// The nodes, in party order.
    pub nodes: Vec<Arc<Node<C>>>,
    /// The dealt secret.
    pub secret: Scalar<C>,
}

impl<C> Deployment<C>
where
    C: PairingSuite,
{
    /// Deals, starts and registers every party, then posts the initial
    /// commitments so that the board is ready.
    ///
    /// `transport_for` picks the transport each node sends through, which
    /// lets tests slip a tampering layer in front of a node.
    pub async fn new<R, F>(
        config: ProtocolConfig,
        dealer: Dealer,
        rng: &mut R,
        transport_for: F,
    ) -> Self
    where
        R: RngCore + CryptoRng,
        F: Fn(u16, Arc<InMemoryNetwork>) -> Arc<dyn Transport>,
    {
        Self::with_network(InMemoryNetwork::new(), config, dealer, rng, transport_for).await
    }

    /// Like [`Deployment::new`], over a caller-configured network.
    pub async fn with_network<R, F>(
        network: InMemoryNetwork,
        config: ProtocolConfig,
        dealer: Dealer,
        rng: &mut R,
        transport_for: F,
    ) -> Self
    where
        R: RngCore + CryptoRng,
        F: Fn(u16, Arc<InMemoryNetwork>) -> Arc<dyn Transport>,
    {
        let key = CommitmentKey::<C>::insecure_fixed(config.degree().into());
        let network = Arc::new(network);
        let board = Arc::new(BulletinBoard::new(config, network.clone()));
        network.register_board(&board).await;

        let secret = <FieldOf<C>>::random(rng);
        let (mut shares, commitments) = match dealer {
            Dealer::Replicated => deal_replicated(&config, &key, secret, rng),
            Dealer::Bivariate => deal_bivariate(&config, &key, secret, rng),
        }
        .unwrap();

        let mut nodes = Vec::new();
        for index in config.indices() {
            let node = Node::new(
                index,
                config,
                key.clone(),
                shares.remove(&index).unwrap(),
                transport_for(index, network.clone()),
                rng,
            )
            .unwrap();
            network.register_node(index, &node).await;
            nodes.push(node);
        }
        for (node, commitment) in nodes.iter().zip(commitments.iter()) {
            node.post_initial_commitment(commitment).await.unwrap();
        }
        assert!(board.is_ready().await);

        Self {
            config,
            key,
            network,
            board,
            nodes,
            secret,
        }
    }

    /// A deployment where every node talks to the network directly.
    pub async fn honest<R: RngCore + CryptoRng>(
        config: ProtocolConfig,
        dealer: Dealer,
        rng: &mut R,
    ) -> Self {
        Self::new(config, dealer, rng, |_, network| -> Arc<dyn Transport> { network }).await
    }

    /// Asks the board to run one epoch and waits until it is over.
    ///
    /// Fails with the error of the first node seen aborting.
    pub async fn run_epoch(&self) -> Result<(), ProtocolError> {
        let epoch = self.nodes[0].status().epoch() + 1;
        self.network.send_to_board(BoardRequest::StartEpoch).await?;
        self.settle(epoch).await
    }

    /// Waits until every node completed `epoch`, or until one aborted.
    pub async fn settle(&self, epoch: u64) -> Result<(), ProtocolError> {
        let mut pending: Vec<_> = self
            .nodes
            .iter()
            .map(|node| {
                Box::pin(node.wait_until(move |status| {
                    *status.epoch() >= epoch || matches!(status.phase(), Phase::Aborted(_))
                }))
            })
            .collect();
        let settled = tokio::time::timeout(SETTLE_LIMIT, async move {
            while !pending.is_empty() {
                let (status, _, rest) = select_all(pending).await;
                if let Phase::Aborted(err) = status.phase() {
                    return Err(err.clone());
                }
                pending = rest;
            }
            Ok(())
        })
        .await;
        settled.expect("nodes did not settle")
    }

    /// Waits until node `index` aborts and returns the error it recorded.
    pub async fn aborted(&self, index: u16) -> ProtocolError {
        let wait = self
            .node(index)
            .wait_until(|status| matches!(status.phase(), Phase::Aborted(_)));
        let status: NodeStatus = tokio::time::timeout(SETTLE_LIMIT, wait)
            .await
            .expect("node did not abort");
        match status.phase() {
            Phase::Aborted(err) => err.clone(),
            phase => panic!("node {index} is in {phase:?}"),
        }
    }

    /// Waits until node `index` completed `epoch`.
    pub async fn completed(&self, index: u16, epoch: u64) -> NodeStatus {
        let wait = self
            .node(index)
            .wait_until(move |status| *status.epoch() >= epoch);
        tokio::time::timeout(SETTLE_LIMIT, wait)
            .await
            .expect("node did not complete the epoch")
    }

    /// The shares every node holds, keyed by party index.
    pub async fn shares(&self) -> BTreeMap<u16, Vec<ShareRecord<C>>> {
        let mut shares = BTreeMap::new();
        for node in &self.nodes {
            shares.insert(node.index(), node.shares().await);
        }
        shares
    }

    /// The node with party index `index`.
    pub fn node(&self, index: u16) -> &Arc<Node<C>> {
        &self.nodes[usize::from(index) - 1]
    }

    /// Checks that every node holds shares verifying against the board's
    /// current commitments, and that they still recombine to the secret.
    pub async fn assert_consistent(&self) {
        let posts = self
            .network
            .send_to_board(BoardRequest::ReadPhase1)
            .await
            .unwrap()
            .into_commitments()
            .unwrap();
        let commitments: Vec<_> = posts
            .iter()
            .map(|p| p.to_commitment::<C>().unwrap())
            .collect();
        let shares = self.shares().await;
        for (index, slots) in &shares {
            for (slot, record) in slots.iter().enumerate() {
                assert_eq!(record.index(), index);
                assert!(
                    record.verify(&self.key, &commitments[slot]),
                    "share of node {index} in slot {} does not verify",
                    slot + 1
                );
            }
        }
        assert_eq!(
            crate::recover_secret(&self.config, &shares).unwrap(),
            self.secret
        );
    }
}
