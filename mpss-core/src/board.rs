//! The bulletin board: a rendezvous point that collects one post per party
//! and phase, and starts the next step once everyone has posted.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    messages::{BoardRequest, BoardResponse, CommitmentPost, NodeRequest, Phase2Post},
    slots::Slots,
    transport::{fan_out, BoardService, Transport},
    ProtocolConfig, ProtocolError,
};

struct BoardState {
    /// Set once every party posted its initial commitment.
    ready: bool,
    /// Set from `StartEpoch` until the phase 3 quorum.
    running: bool,
    epoch: u64,
    /// The commitments the current shares verify against.
    phase1: Slots<CommitmentPost>,
    phase2: Slots<Phase2Post>,
    phase3: Slots<CommitmentPost>,
    bytes_written: u64,
}

/// The bulletin board of a deployment.
pub struct BulletinBoard {
    config: ProtocolConfig,
    transport: Arc<dyn Transport>,
    state: Mutex<BoardState>,
}

impl BulletinBoard {
    /// Creates an empty board.
    pub fn new(config: ProtocolConfig, transport: Arc<dyn Transport>) -> Self {
        let parties = config.parties();
        Self {
            config,
            transport,
            state: Mutex::new(BoardState {
                ready: false,
                running: false,
                epoch: 0,
                phase1: Slots::new(parties),
                phase2: Slots::new(parties),
                phase3: Slots::new(parties),
                bytes_written: 0,
            }),
        }
    }

    /// Whether every initial commitment has been posted.
    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.ready
    }

    /// The number of epochs whose phase 3 commitments were accepted.
    pub async fn epoch(&self) -> u64 {
        self.state.lock().await.epoch
    }

    /// Total encoded size of all accepted writes.
    pub async fn bytes_written(&self) -> u64 {
        self.state.lock().await.bytes_written
    }

    /// Sends `request` to every node and waits for all of them.
    async fn broadcast(&self, request: NodeRequest) -> Result<(), ProtocolError> {
        info!(request = %request, "broadcasting to all nodes");
        let result = fan_out(
            self.transport.as_ref(),
            self.config.indices().map(|to| (to, request.clone())),
        )
        .await;
        if let Err(err) = &result {
            warn!(request = %request, error = %err, "broadcast failed");
        }
        result
    }

    async fn start_epoch(&self) -> Result<(), ProtocolError> {
        {
            let mut state = self.state.lock().await;
            if !state.ready || state.running {
                return Err(ProtocolError::UnexpectedPhase("StartEpoch"));
            }
            state.running = true;
            state.phase2.clear();
            state.phase3.clear();
        }
        self.broadcast(NodeRequest::StartEpoch).await
    }

    async fn write_phase1(&self, post: CommitmentPost, size: usize) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().await;
        let sender = post.sender;
        if state.phase1.insert(sender, post)? {
            info!("all initial commitments posted");
            state.ready = true;
        }
        state.bytes_written += size as u64;
        debug!(from = sender, "phase 1 commitment written");
        Ok(())
    }

    async fn write_phase2(&self, post: Phase2Post, size: usize) -> Result<(), ProtocolError> {
        let quorum = {
            let mut state = self.state.lock().await;
            let sender = post.sender;
            let quorum = state.phase2.insert(sender, post)?;
            state.bytes_written += size as u64;
            debug!(from = sender, "phase 2 triple written");
            quorum
        };
        if quorum {
            self.broadcast(NodeRequest::StartVerifPhase2).await?;
        }
        Ok(())
    }

    async fn write_phase3(&self, post: CommitmentPost, size: usize) -> Result<(), ProtocolError> {
        let quorum = {
            let mut state = self.state.lock().await;
            let sender = post.sender;
            let quorum = state.phase3.insert(sender, post)?;
            state.bytes_written += size as u64;
            debug!(from = sender, "phase 3 commitment written");
            if quorum {
                // The new commitments back the shares of the next epoch. Phase
                // 3 stays readable until then so the nodes can check them.
                state.phase1 = state.phase3.clone();
                state.running = false;
                state.epoch += 1;
                info!(epoch = state.epoch, "epoch closed");
            }
            quorum
        };
        if quorum {
            self.broadcast(NodeRequest::StartVerifPhase3).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BoardService for BulletinBoard {
    async fn handle(&self, request: BoardRequest) -> Result<BoardResponse, ProtocolError> {
        let size = request.encoded_len();
        debug!(request = %request, "board handling request");
        match request {
            BoardRequest::StartEpoch => {
                self.start_epoch().await?;
                Ok(BoardResponse::Ack)
            }
            BoardRequest::WritePhase1(post) => {
                self.write_phase1(post, size).await?;
                Ok(BoardResponse::Ack)
            }
            BoardRequest::ReadPhase1 => Ok(BoardResponse::Commitments(
                self.state.lock().await.phase1.snapshot()?,
            )),
            BoardRequest::WritePhase2(post) => {
                self.write_phase2(post, size).await?;
                Ok(BoardResponse::Ack)
            }
            BoardRequest::ReadPhase2 => Ok(BoardResponse::Phase2(
                self.state.lock().await.phase2.snapshot()?,
            )),
            BoardRequest::WritePhase3(post) => {
                self.write_phase3(post, size).await?;
                Ok(BoardResponse::Ack)
            }
            BoardRequest::ReadPhase3 => Ok(BoardResponse::Commitments(
                self.state.lock().await.phase3.snapshot()?,
            )),
        }
    }
}
