//! The per-party resharing state machine.
//!
//! An epoch runs in three phases:
//!
//! 1. Reconstruction: every node sends slot `j` of its shares to node `j`,
//!    which verifies them against `commit(R_j)` and interpolates `R_j`.
//! 2. Proactivization: every node deals a sharing of zero, sums the shares it
//!    receives into `z_j` and posts `g^{z_j}` together with a commitment to a
//!    fresh polynomial `Q_j` vanishing at zero. The board triggers the check
//!    that the `z_j` recombine to zero.
//! 3. Redistribution: every node evaluates `R_j + Q_j + z_j` at every party
//!    index, sends the witnessed evaluations out and posts the commitment.
//!    The board triggers the final consistency check, after which the new
//!    shares replace the old ones.
//!
//! Phases advance on quorum: the call that delivers the `n`-th message of a
//! phase hands the next step to a task owned by the node and returns once the
//! message is stored. A call therefore only ever covers the receiving party's
//! own work, never the rest of the epoch. Completion is observed through
//! [`Node::wait_until`]. Any failure aborts the node for good.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use derive_getters::Getters;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use tokio::{
    sync::{watch, Mutex},
    task::JoinSet,
};
use tracing::{debug, error, info};

use crate::{
    commitment::{dl, kate::CommitmentKey, PolyCommitment},
    messages::{
        BoardRequest, CommitmentPost, NodeRequest, Phase2Post, PointMessage, ZeroShareMessage,
    },
    metrics::{EpochMetrics, MetricsRecorder},
    polynomial::{lagrange_coefficients_at_zero, lagrange_interpolate, Polynomial},
    share::{index_scalar, zero_shares, ShareRecord},
    slots::Slots,
    transport::{fan_out, NodeService, Transport},
    Error, Field, FieldOf, Group, PairingSuite, ProtocolConfig, ProtocolError, Scalar,
};

/// Where a node is in the current epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Between epochs.
    Idle,
    /// Sending reconstruction shares.
    Phase1Sharing,
    /// Verifying and interpolating the reconstruction shares.
    Phase1Reconstructing,
    /// Dealing zero-shares and posting the phase 2 triple.
    Phase2Sharing,
    /// Checking every posted triple.
    Phase2Verifying,
    /// Sending the redistributed shares and posting the new commitment.
    Phase3Sharing,
    /// Checking the new commitments and the received shares.
    Phase3Verifying,
    /// The node hit a fatal error and no longer serves requests.
    Aborted(ProtocolError),
}

/// A snapshot of a node's progress.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct NodeStatus {
    /// The current phase.
    phase: Phase,
    /// The number of completed epochs.
    epoch: u64,
}

struct NodeState<C: PairingSuite> {
    phase: Phase,
    epoch: u64,
    rng: ChaCha20Rng,
    /// Slot `j` holds `R_j(index)`.
    shares: Vec<ShareRecord<C>>,
    old_commitments: Vec<PolyCommitment<C>>,
    phase1: Slots<ShareRecord<C>>,
    reconstructed: Option<Polynomial<FieldOf<C>>>,
    phase2: Slots<Scalar<C>>,
    proactive: Option<Polynomial<FieldOf<C>>>,
    mid_commitments: Vec<PolyCommitment<C>>,
    new_commitment: Option<PolyCommitment<C>>,
    phase3: Slots<ShareRecord<C>>,
    pending: Vec<ShareRecord<C>>,
    metrics: MetricsRecorder,
    last_metrics: Option<EpochMetrics>,
}

impl<C> NodeState<C>
where
    C: PairingSuite,
{
    /// Drops everything that only lives for one epoch. Secret polynomials
    /// and shares zeroize on drop.
    fn clear_transient(&mut self) {
        self.old_commitments.clear();
        self.phase1.clear();
        self.reconstructed = None;
        self.phase2.clear();
        self.proactive = None;
        self.mid_commitments.clear();
        self.new_commitment = None;
        self.phase3.clear();
        self.pending.clear();
    }
}

/// Protocol work triggered by a request, run on the node's own task.
#[derive(Clone, Copy, Debug)]
enum Step {
    StartEpoch,
    Reconstruct,
    PostPhase2,
    VerifyPhase2,
    PostPhase3,
    VerifyPhase3,
}

/// One party of the resharing protocol.
pub struct Node<C: PairingSuite> {
    index: u16,
    config: ProtocolConfig,
    key: CommitmentKey<C>,
    transport: Arc<dyn Transport>,
    this: Weak<Self>,
    state: Mutex<NodeState<C>>,
    status: watch::Sender<NodeStatus>,
    /// Steps in flight; finished ones are reaped when the next is spawned.
    steps: Mutex<JoinSet<()>>,
}

impl<C> Node<C>
where
    C: PairingSuite,
{
    /// Creates party `index` holding `shares`, one record per party slot.
    ///
    /// The node's own randomness is seeded from `rng`.
    pub fn new<R: RngCore + CryptoRng>(
        index: u16,
        config: ProtocolConfig,
        key: CommitmentKey<C>,
        shares: Vec<ShareRecord<C>>,
        transport: Arc<dyn Transport>,
        rng: &mut R,
    ) -> Result<Arc<Self>, Error> {
        config.check_index(index)?;
        if shares.len() != usize::from(config.parties()) {
            return Err(Error::IncorrectNumberOfShares {
                expected: config.parties(),
                actual: shares.len(),
            });
        }
        if let Some(record) = shares.iter().find(|r| r.index != index) {
            return Err(Error::InvalidPartyIndex {
                index: record.index,
            });
        }
        if key.max_degree() < usize::from(config.degree()) {
            return Err(Error::PolynomialTooLarge);
        }

        let mut seed = <ChaCha20Rng as SeedableRng>::Seed::default();
        rng.fill_bytes(&mut seed);
        let parties = config.parties();
        let (status, _) = watch::channel(NodeStatus {
            phase: Phase::Idle,
            epoch: 0,
        });

        Ok(Arc::new_cyclic(|this| Self {
            index,
            config,
            key,
            transport,
            this: this.clone(),
            state: Mutex::new(NodeState {
                phase: Phase::Idle,
                epoch: 0,
                rng: ChaCha20Rng::from_seed(seed),
                shares,
                old_commitments: Vec::new(),
                phase1: Slots::new(parties),
                reconstructed: None,
                phase2: Slots::new(parties),
                proactive: None,
                mid_commitments: Vec::new(),
                new_commitment: None,
                phase3: Slots::new(parties),
                pending: Vec::new(),
                metrics: MetricsRecorder::default(),
                last_metrics: None,
            }),
            status,
            steps: Mutex::new(JoinSet::new()),
        }))
    }

    /// This node's party index.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// The protocol shape.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The current phase and the number of completed epochs.
    pub fn status(&self) -> NodeStatus {
        self.status.borrow().clone()
    }

    /// Waits until the status satisfies `done` and returns that status.
    pub async fn wait_until(&self, done: impl FnMut(&NodeStatus) -> bool) -> NodeStatus {
        let mut status = self.status.subscribe();
        let reached = status.wait_for(done).await.map(|s| s.clone());
        reached.unwrap_or_else(|_| status.borrow().clone())
    }

    /// A copy of the share slots currently held.
    pub async fn shares(&self) -> Vec<ShareRecord<C>> {
        self.state.lock().await.shares.clone()
    }

    /// Figures of the last completed epoch.
    pub async fn last_metrics(&self) -> Option<EpochMetrics> {
        self.state.lock().await.last_metrics
    }

    /// Posts the commitment to this party's polynomial from the initial
    /// dealing, which the board needs from everyone before the first epoch.
    pub async fn post_initial_commitment(
        &self,
        commitment: &PolyCommitment<C>,
    ) -> Result<(), ProtocolError> {
        debug!(node = self.index, "posting initial commitment");
        self.transport
            .send_to_board(BoardRequest::WritePhase1(CommitmentPost::new(
                self.index, commitment,
            )))
            .await?;
        Ok(())
    }

    /// Records a fatal error unless one is already recorded.
    async fn abort(&self, err: &ProtocolError) {
        let mut state = self.state.lock().await;
        if let Phase::Aborted(_) = state.phase {
            return;
        }
        error!(node = self.index, epoch = state.epoch, error = %err, "aborting epoch");
        state.clear_transient();
        self.enter(&mut state, Phase::Aborted(err.clone()));
    }

    /// Moves to `phase` and publishes the new status.
    fn enter(&self, state: &mut NodeState<C>, phase: Phase) {
        state.phase = phase;
        self.status.send_replace(NodeStatus {
            phase: state.phase.clone(),
            epoch: state.epoch,
        });
    }

    /// Runs `step` on a task owned by this node.
    async fn spawn(&self, step: Step) {
        let Some(node) = self.this.upgrade() else {
            return;
        };
        let mut steps = self.steps.lock().await;
        while steps.try_join_next().is_some() {}
        steps.spawn(node.run(step));
    }

    async fn run(self: Arc<Self>, step: Step) {
        debug!(node = self.index, ?step, "running step");
        let result = match step {
            Step::StartEpoch => self.start_epoch().await,
            Step::Reconstruct => self.reconstruct().await,
            Step::PostPhase2 => self.post_phase2().await,
            Step::VerifyPhase2 => self.verify_phase2().await,
            Step::PostPhase3 => self.post_phase3().await,
            Step::VerifyPhase3 => self.verify_phase3().await,
        };
        if let Err(err) = result {
            self.abort(&err).await;
        }
    }

    /// Decodes one commitment per party, in party order.
    fn decode_commitments(
        &self,
        posts: &[CommitmentPost],
    ) -> Result<Vec<PolyCommitment<C>>, ProtocolError> {
        self.check_post_senders(posts.iter().map(|p| p.sender))?;
        Ok(posts
            .iter()
            .map(|p| p.to_commitment::<C>())
            .collect::<Result<_, _>>()?)
    }

    fn check_post_senders(
        &self,
        senders: impl ExactSizeIterator<Item = u16>,
    ) -> Result<(), ProtocolError> {
        let len = senders.len();
        for (party, sender) in self.config.indices().zip(senders) {
            if party != sender {
                return Err(ProtocolError::MissingPost { party });
            }
        }
        if len != usize::from(self.config.parties()) {
            let party = u16::try_from(len + 1).unwrap_or(u16::MAX);
            return Err(ProtocolError::MissingPost { party });
        }
        Ok(())
    }

    fn own_slot(&self) -> usize {
        usize::from(self.index) - 1
    }

    /// Accepts `StartEpoch` while idle.
    async fn begin_epoch(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Idle {
            return Err(ProtocolError::UnexpectedPhase("StartEpoch"));
        }
        state.metrics.start();
        self.enter(&mut state, Phase::Phase1Sharing);
        info!(node = self.index, epoch = state.epoch + 1, "starting epoch");
        Ok(())
    }

    /// Fetches the current commitments and sends slot `j` of our shares to
    /// node `j`.
    async fn start_epoch(&self) -> Result<(), ProtocolError> {
        let response = self.transport.send_to_board(BoardRequest::ReadPhase1).await?;
        self.state.lock().await.metrics.received(response.encoded_len());
        let old_commitments = self.decode_commitments(&response.into_commitments()?)?;

        let mut messages: Vec<_> = {
            let mut state = self.state.lock().await;
            state.old_commitments = old_commitments;
            self.config
                .indices()
                .zip(state.shares.iter())
                .map(|(to, record)| (to, PointMessage::new(self.index, record)))
                .collect()
        };

        let (_, own) = messages.remove(self.own_slot());
        let quorum = self.accept_phase1(own).await?;
        debug!(node = self.index, "sending phase 1 shares");
        fan_out(
            self.transport.as_ref(),
            messages
                .into_iter()
                .map(|(to, message)| (to, NodeRequest::SharePhase1(message))),
        )
        .await?;
        if quorum {
            self.reconstruct().await?;
        }
        Ok(())
    }

    async fn accept_phase1(&self, message: PointMessage) -> Result<bool, ProtocolError> {
        let sender = message.sender;
        self.config.check_index(sender)?;
        if message.x != sender {
            return Err(ProtocolError::ReconstructionVerification { sender });
        }
        let record = message.to_record::<C>()?;
        debug!(node = self.index, from = sender, "received phase 1 share");
        let quorum = self.state.lock().await.phase1.insert(sender, record)?;
        if quorum {
            info!(node = self.index, "phase 1 quorum reached");
        }
        Ok(quorum)
    }

    /// Verifies every reconstruction share against our old commitment,
    /// interpolates our polynomial and starts phase 2.
    async fn reconstruct(&self) -> Result<(), ProtocolError> {
        let (records, commitment) = {
            let mut state = self.state.lock().await;
            self.enter(&mut state, Phase::Phase1Reconstructing);
            let commitment = state
                .old_commitments
                .get(self.own_slot())
                .copied()
                .ok_or(ProtocolError::MissingPost { party: self.index })?;
            (state.phase1.take(), commitment)
        };

        for record in &records {
            if !record.verify(&self.key, &commitment) {
                error!(
                    node = self.index,
                    from = record.index,
                    "reconstruction share failed verification"
                );
                return Err(ProtocolError::ReconstructionVerification {
                    sender: record.index,
                });
            }
        }
        let threshold = self.config.threshold();
        let xs: Vec<_> = records
            .iter()
            .take(threshold)
            .map(|r| index_scalar::<FieldOf<C>>(r.index))
            .collect();
        let ys: Vec<_> = records.iter().take(threshold).map(|r| r.value).collect();
        let poly = lagrange_interpolate::<FieldOf<C>>(&xs, &ys, self.config.degree().into())?;
        drop(records);

        let mut messages: Vec<_> = {
            let mut state = self.state.lock().await;
            state.reconstructed = Some(poly);
            state.metrics.reconstructed();
            self.enter(&mut state, Phase::Phase2Sharing);
            let shares = zero_shares::<FieldOf<C>, _>(&self.config, &mut state.rng)?;
            self.config
                .indices()
                .zip(shares.iter())
                .map(|(to, share)| (to, ZeroShareMessage::new::<C>(self.index, share)))
                .collect()
        };
        info!(node = self.index, "reconstructed, starting phase 2");

        let (_, own) = messages.remove(self.own_slot());
        let quorum = self.accept_phase2(own).await?;
        fan_out(
            self.transport.as_ref(),
            messages
                .into_iter()
                .map(|(to, message)| (to, NodeRequest::SharePhase2(message))),
        )
        .await?;
        if quorum {
            self.post_phase2().await?;
        }
        Ok(())
    }

    async fn accept_phase2(&self, message: ZeroShareMessage) -> Result<bool, ProtocolError> {
        let sender = message.sender;
        self.config.check_index(sender)?;
        let share = message.to_scalar::<C>()?;
        debug!(node = self.index, from = sender, "received zero-share");
        let quorum = self.state.lock().await.phase2.insert(sender, share)?;
        if quorum {
            info!(node = self.index, "phase 2 quorum reached");
        }
        Ok(quorum)
    }

    /// Sums the received zero-shares and posts the phase 2 triple.
    async fn post_phase2(&self) -> Result<(), ProtocolError> {
        let zero = <FieldOf<C>>::zero();
        let post = {
            let mut state = self.state.lock().await;
            let sum = state
                .phase2
                .take()
                .into_iter()
                .fold(zero, |acc, share| acc + share);
            let q = Polynomial::random_with_constant(
                self.config.degree().into(),
                zero,
                &mut state.rng,
            );
            let share_commitment = dl::commit::<C>(&sum);
            let poly_commitment = self.key.commit(&q)?;
            let zero_witness = self.key.create_witness(&q, zero)?;
            let mut proactive = q;
            proactive.set_constant(sum);
            state.proactive = Some(proactive);
            Phase2Post::new(self.index, &share_commitment, &poly_commitment, &zero_witness)
        };
        debug!(node = self.index, "posting phase 2 commitments");
        self.transport
            .send_to_board(BoardRequest::WritePhase2(post))
            .await?;
        Ok(())
    }

    /// Accepts `StartVerifPhase2` once our own triple is posted.
    async fn begin_verify_phase2(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Phase2Sharing
            || state.reconstructed.is_none()
            || state.proactive.is_none()
        {
            return Err(ProtocolError::UnexpectedPhase("StartVerifPhase2"));
        }
        self.enter(&mut state, Phase::Phase2Verifying);
        Ok(())
    }

    /// Checks the posted triples, then builds and sends the new shares.
    async fn verify_phase2(&self) -> Result<(), ProtocolError> {
        let response = self.transport.send_to_board(BoardRequest::ReadPhase2).await?;
        self.state.lock().await.metrics.received(response.encoded_len());
        let posts = response.into_phase2()?;
        self.check_post_senders(posts.iter().map(|p| p.sender))?;
        let triples = posts
            .iter()
            .map(|p| p.decode::<C>())
            .collect::<Result<Vec<_>, _>>()?;

        let xs: Vec<_> = self
            .config
            .indices()
            .map(index_scalar::<FieldOf<C>>)
            .collect();
        let lambdas = lagrange_coefficients_at_zero::<FieldOf<C>>(&xs)?;
        let weighted = triples
            .iter()
            .zip(lambdas.iter())
            .fold(<C::G1>::identity(), |acc, ((share, _, _), lambda)| {
                acc + share.to_element() * *lambda
            });
        if weighted != <C::G1>::identity() {
            error!(node = self.index, "zero-share commitments do not sum to zero");
            return Err(ProtocolError::ZeroSumMismatch);
        }

        let zero = <FieldOf<C>>::zero();
        let mut mid_commitments = Vec::with_capacity(triples.len());
        for (party, (share, poly, witness)) in self.config.indices().zip(triples) {
            if !self.key.verify_eval(&poly, zero, zero, &witness) {
                error!(node = self.index, party, "zero polynomial witness invalid");
                return Err(ProtocolError::ZeroWitnessInvalid { party });
            }
            mid_commitments.push(PolyCommitment::from(share) + poly);
        }
        info!(node = self.index, "zero-sharing verified, starting phase 3");

        let new_poly = {
            let mut state = self.state.lock().await;
            let (Some(reconstructed), Some(proactive)) =
                (state.reconstructed.take(), state.proactive.take())
            else {
                return Err(ProtocolError::MissingPost { party: self.index });
            };
            state.mid_commitments = mid_commitments;
            state.metrics.proactivized();
            self.enter(&mut state, Phase::Phase3Sharing);
            &reconstructed + &proactive
        };

        let new_commitment = self.key.commit(&new_poly)?;
        let mut messages = self
            .config
            .indices()
            .map(|to| {
                let record = ShareRecord::from_polynomial(&self.key, &new_poly, to)?;
                Ok((to, PointMessage::new(self.index, &record)))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        drop(new_poly);
        self.state.lock().await.new_commitment = Some(new_commitment);

        let (_, own) = messages.remove(self.own_slot());
        let quorum = self.accept_phase3(own).await?;
        debug!(node = self.index, "sending phase 3 shares");
        fan_out(
            self.transport.as_ref(),
            messages
                .into_iter()
                .map(|(to, message)| (to, NodeRequest::SharePhase3(message))),
        )
        .await?;
        if quorum {
            self.post_phase3().await?;
        }
        Ok(())
    }

    async fn accept_phase3(&self, message: PointMessage) -> Result<bool, ProtocolError> {
        let sender = message.sender;
        self.config.check_index(sender)?;
        if message.x != self.index {
            return Err(ProtocolError::ShareVerification { party: sender });
        }
        let record = message.to_record::<C>()?;
        debug!(node = self.index, from = sender, "received phase 3 share");
        let quorum = self.state.lock().await.phase3.insert(sender, record)?;
        if quorum {
            info!(node = self.index, "phase 3 quorum reached");
        }
        Ok(quorum)
    }

    /// Holds the received shares back for verification and posts the new
    /// commitment.
    async fn post_phase3(&self) -> Result<(), ProtocolError> {
        let commitment = {
            let mut state = self.state.lock().await;
            state.pending = state.phase3.take();
            state
                .new_commitment
                .ok_or(ProtocolError::UnexpectedPhase("SharePhase3"))?
        };
        debug!(node = self.index, "posting phase 3 commitment");
        self.transport
            .send_to_board(BoardRequest::WritePhase3(CommitmentPost::new(
                self.index,
                &commitment,
            )))
            .await?;
        Ok(())
    }

    /// Accepts `StartVerifPhase3` once our own commitment is posted.
    async fn begin_verify_phase3(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Phase3Sharing
            || state.pending.len() != usize::from(self.config.parties())
        {
            return Err(ProtocolError::UnexpectedPhase("StartVerifPhase3"));
        }
        self.enter(&mut state, Phase::Phase3Verifying);
        Ok(())
    }

    /// Checks `new_j == old_j + mid_j` for every party and our received
    /// shares against the new commitments, then installs the shares.
    async fn verify_phase3(&self) -> Result<(), ProtocolError> {
        let (old_commitments, mid_commitments, pending) = {
            let mut state = self.state.lock().await;
            (
                state.old_commitments.clone(),
                state.mid_commitments.clone(),
                std::mem::take(&mut state.pending),
            )
        };
        let response = self.transport.send_to_board(BoardRequest::ReadPhase3).await?;
        self.state.lock().await.metrics.received(response.encoded_len());
        let new_commitments = self.decode_commitments(&response.into_commitments()?)?;

        for ((party, new), (old, mid)) in self
            .config
            .indices()
            .zip(new_commitments.iter())
            .zip(old_commitments.iter().zip(mid_commitments.iter()))
        {
            if *new != *old + *mid {
                error!(node = self.index, party, "new commitment inconsistent");
                return Err(ProtocolError::CommitmentMismatch { party });
            }
        }
        for ((party, record), commitment) in self
            .config
            .indices()
            .zip(pending.iter())
            .zip(new_commitments.iter())
        {
            if !record.verify(&self.key, commitment) {
                error!(node = self.index, party, "redistributed share failed verification");
                return Err(ProtocolError::ShareVerification { party });
            }
        }

        let mut state = self.state.lock().await;
        state.shares = pending;
        state.clear_transient();
        state.epoch += 1;
        let epoch = state.epoch;
        let metrics = state.metrics.finish(epoch);
        state.last_metrics = Some(metrics);
        self.enter(&mut state, Phase::Idle);
        info!(
            node = self.index,
            epoch,
            total = ?metrics.total(),
            bytes = metrics.bytes_received(),
            "epoch complete"
        );
        Ok(())
    }

    /// Applies one request and returns the step it triggers, if any.
    async fn dispatch(&self, request: NodeRequest) -> Result<Option<Step>, ProtocolError> {
        Ok(match request {
            NodeRequest::StartEpoch => {
                self.begin_epoch().await?;
                Some(Step::StartEpoch)
            }
            NodeRequest::SharePhase1(message) => self
                .accept_phase1(message)
                .await?
                .then_some(Step::Reconstruct),
            NodeRequest::SharePhase2(message) => self
                .accept_phase2(message)
                .await?
                .then_some(Step::PostPhase2),
            NodeRequest::StartVerifPhase2 => {
                self.begin_verify_phase2().await?;
                Some(Step::VerifyPhase2)
            }
            NodeRequest::SharePhase3(message) => self
                .accept_phase3(message)
                .await?
                .then_some(Step::PostPhase3),
            NodeRequest::StartVerifPhase3 => {
                self.begin_verify_phase3().await?;
                Some(Step::VerifyPhase3)
            }
        })
    }
}

#[async_trait]
impl<C> NodeService for Node<C>
where
    C: PairingSuite,
{
    async fn handle(&self, request: NodeRequest) -> Result<(), ProtocolError> {
        {
            let mut state = self.state.lock().await;
            if let Phase::Aborted(err) = &state.phase {
                return Err(ProtocolError::Aborted(err.to_string()));
            }
            state.metrics.received(request.encoded_len());
        }
        debug!(node = self.index, request = %request, "handling request");
        match self.dispatch(request).await {
            Ok(Some(step)) => {
                self.spawn(step).await;
                Ok(())
            }
            Ok(None) => Ok(()),
            // A call arriving at the wrong time is refused without touching
            // the epoch.
            Err(err @ ProtocolError::UnexpectedPhase(_)) => Err(err),
            Err(err) => {
                self.abort(&err).await;
                Err(err)
            }
        }
    }
}
