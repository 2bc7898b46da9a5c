//! Transport seams between nodes and the bulletin board.
//!
//! Nodes and the board only talk through [`Transport`]. Remote transports are
//! left to embedders; [`InMemoryNetwork`] runs every party in one process and
//! dispatches each call on its own `tokio` task, the way a server would.

use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    messages::{BoardRequest, BoardResponse, NodeRequest},
    ProtocolError,
};

/// Serves the calls addressed to a node.
#[async_trait]
pub trait NodeService: Send + Sync {
    /// Handles one inbound call.
    async fn handle(&self, request: NodeRequest) -> Result<(), ProtocolError>;
}

/// Serves the calls addressed to the bulletin board.
#[async_trait]
pub trait BoardService: Send + Sync {
    /// Handles one inbound call.
    async fn handle(&self, request: BoardRequest) -> Result<BoardResponse, ProtocolError>;
}

/// Outbound calls from a party.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers `request` to node `to` and waits for it to be accepted.
    async fn send_to_node(&self, to: u16, request: NodeRequest) -> Result<(), ProtocolError>;

    /// Delivers `request` to the bulletin board and waits for the reply.
    async fn send_to_board(&self, request: BoardRequest) -> Result<BoardResponse, ProtocolError>;
}

/// Sends one request per target concurrently and waits for all of them.
///
/// Returns the first failure, in target order, once every call has finished.
pub async fn fan_out<T>(
    transport: &T,
    targets: impl IntoIterator<Item = (u16, NodeRequest)>,
) -> Result<(), ProtocolError>
where
    T: Transport + ?Sized,
{
    let results = join_all(
        targets
            .into_iter()
            .map(|(to, request)| transport.send_to_node(to, request)),
    )
    .await;
    results.into_iter().collect()
}

pub(crate) fn node_name(index: u16) -> String {
    format!("node {index}")
}

pub(crate) const BOARD_NAME: &str = "bulletin board";

/// An in-process network.
///
/// Holds weak references so that dropping a party unregisters it. Requests
/// and responses go through their byte encoding on the way, so the same
/// decoding paths run as with a remote transport.
#[derive(Default)]
pub struct InMemoryNetwork {
    nodes: RwLock<BTreeMap<u16, Weak<dyn NodeService>>>,
    board: RwLock<Option<Weak<dyn BoardService>>>,
    timeout: Option<Duration>,
}

impl InMemoryNetwork {
    /// A network without call timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// A network that gives up on any call that takes longer than `timeout`.
    ///
    /// A call covers one hop: the receiver stores the message and schedules
    /// whatever step it triggers before replying, so the limit bounds a
    /// single party's handling rather than a whole epoch. The caller stops
    /// waiting when the limit passes; the receiver still finishes handling
    /// the call, so it is never left half-applied.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Makes `node` reachable as party `index`.
    pub async fn register_node<S>(&self, index: u16, node: &Arc<S>)
    where
        S: NodeService + 'static,
    {
        let node: Arc<dyn NodeService> = node.clone();
        self.nodes.write().await.insert(index, Arc::downgrade(&node));
    }

    /// Makes `board` reachable as the bulletin board.
    pub async fn register_board<S>(&self, board: &Arc<S>)
    where
        S: BoardService + 'static,
    {
        let board: Arc<dyn BoardService> = board.clone();
        *self.board.write().await = Some(Arc::downgrade(&board));
    }

    async fn join<T>(
        &self,
        peer: String,
        mut handle: JoinHandle<Result<T, ProtocolError>>,
    ) -> Result<T, ProtocolError> {
        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(%peer, ?limit, "call timed out");
                    return Err(transport_error(peer, "timed out"));
                }
            },
            None => handle.await,
        };
        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(transport_error(peer, err)),
            Err(err) => Err(transport_error(peer, err)),
        }
    }
}

fn transport_error(peer: String, reason: impl ToString) -> ProtocolError {
    ProtocolError::Transport {
        peer,
        reason: reason.to_string(),
    }
}

#[async_trait]
impl Transport for InMemoryNetwork {
    async fn send_to_node(&self, to: u16, request: NodeRequest) -> Result<(), ProtocolError> {
        let peer = node_name(to);
        let node = self
            .nodes
            .read()
            .await
            .get(&to)
            .and_then(Weak::upgrade)
            .ok_or_else(|| transport_error(peer.clone(), "not registered"))?;
        let bytes = request.serialize()?;
        let handle = tokio::spawn(async move {
            let request = NodeRequest::deserialize(&bytes)?;
            node.handle(request).await?;
            Ok::<_, ProtocolError>(())
        });
        self.join(peer, handle).await
    }

    async fn send_to_board(&self, request: BoardRequest) -> Result<BoardResponse, ProtocolError> {
        let peer = BOARD_NAME.to_string();
        let board = self
            .board
            .read()
            .await
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| transport_error(peer.clone(), "not registered"))?;
        let bytes = request.serialize()?;
        let handle = tokio::spawn(async move {
            let request = BoardRequest::deserialize(&bytes)?;
            let response = board.handle(request).await?;
            Ok::<_, ProtocolError>(response.serialize()?)
        });
        let bytes = self.join(peer, handle).await?;
        Ok(BoardResponse::deserialize(&bytes)?)
    }
}
