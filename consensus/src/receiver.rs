//! Ingress adapter — turns raw inbound network events into exactly-once
//! verified, exactly-once committed ledger mutations, classified for the
//! consensus engine.
//!
//! One worker task serves each inbound topic, reading from its own bounded
//! queue so a slow topic cannot block the others; producers feel backpressure
//! at queue capacity.
//!
//! Dedup policy per topic: Publish, ConfirmAck and SyncBlock are checked
//! against the shared short-TTL cache before verification. ConfirmReq is
//! not — a requester must receive an acknowledgement even for a block this
//! node already settled, and dedup would starve legitimate re-requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lattice_ledger::{Ledger, LedgerError, ProcessResult, StateBlock};
use lattice_messages::{
    BlockSource, InboundMessage, MessageSink, NetPayload, OutboundEvent, Topic,
};
use lattice_types::BlockHash;

use crate::cache::ExpiringCache;
use crate::config::ConsensusConfig;
use crate::consensus::ConsensusAlgorithm;
use crate::error::ConsensusError;

/// Check-then-commit pipeline against the ledger collaborator.
///
/// A transient storage conflict is retried after `retry_delay` until a
/// non-conflict outcome is reached. A "block already exists" outcome from the
/// commit step is success (idempotent), not an error. Only `Progress`
/// candidates are committed; any other classification returns immediately.
pub(crate) async fn verify_commit(
    ledger: &dyn Ledger,
    block: &StateBlock,
    retry_delay: Duration,
) -> Result<ProcessResult, LedgerError> {
    let result = loop {
        match ledger.block_check(block) {
            Ok(result) => break result,
            Err(LedgerError::Conflict) => tokio::time::sleep(retry_delay).await,
            Err(LedgerError::BlockExists) => break ProcessResult::Old,
            Err(e) => return Err(e),
        }
    };
    if result != ProcessResult::Progress {
        return Ok(result);
    }

    loop {
        match ledger.block_commit(block) {
            Ok(()) => break,
            Err(LedgerError::Conflict) => tokio::time::sleep(retry_delay).await,
            Err(LedgerError::BlockExists) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(ProcessResult::Progress)
}

/// Cloneable handle the network layer uses to feed messages in. Sends block
/// when the matching topic queue is full.
#[derive(Clone)]
pub struct InboundHandle {
    publish: mpsc::Sender<InboundMessage>,
    confirm_req: mpsc::Sender<InboundMessage>,
    confirm_ack: mpsc::Sender<InboundMessage>,
    sync_block: mpsc::Sender<InboundMessage>,
    generate_block: mpsc::Sender<InboundMessage>,
}

impl InboundHandle {
    /// Submit one inbound message to its topic queue.
    pub async fn submit(&self, msg: InboundMessage) -> Result<(), ConsensusError> {
        let topic = msg.topic();
        let sender = match topic {
            Topic::Publish => &self.publish,
            Topic::ConfirmReq => &self.confirm_req,
            Topic::ConfirmAck => &self.confirm_ack,
            Topic::SyncBlock => &self.sync_block,
            Topic::GenerateBlock => &self.generate_block,
        };
        sender
            .send(msg)
            .await
            .map_err(|_| ConsensusError::ChannelClosed(topic))
    }
}

/// The consensus ingress adapter.
pub struct Receiver {
    engine: Arc<dyn ConsensusAlgorithm>,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn MessageSink>,
    /// Short-TTL message dedup cache, owned by the façade.
    processed: Arc<Mutex<ExpiringCache<BlockHash, ()>>>,
    config: ConsensusConfig,
    quit: broadcast::Sender<()>,
}

impl Receiver {
    pub fn new(
        engine: Arc<dyn ConsensusAlgorithm>,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn MessageSink>,
        processed: Arc<Mutex<ExpiringCache<BlockHash, ()>>>,
        config: ConsensusConfig,
    ) -> Self {
        let (quit, _) = broadcast::channel(1);
        Self {
            engine,
            ledger,
            sink,
            processed,
            config,
            quit,
        }
    }

    /// Spawn one worker per topic. Returns the submission handle and the
    /// worker join handles.
    pub fn start(self: Arc<Self>) -> (InboundHandle, Vec<JoinHandle<()>>) {
        let capacity = self.config.ingress_queue_capacity;
        let (publish_tx, publish_rx) = mpsc::channel(capacity);
        let (req_tx, req_rx) = mpsc::channel(capacity);
        let (ack_tx, ack_rx) = mpsc::channel(capacity);
        let (sync_tx, sync_rx) = mpsc::channel(capacity);
        let (generate_tx, generate_rx) = mpsc::channel(capacity);

        let handles = vec![
            Self::spawn_worker(Arc::clone(&self), publish_rx),
            Self::spawn_worker(Arc::clone(&self), req_rx),
            Self::spawn_worker(Arc::clone(&self), ack_rx),
            Self::spawn_worker(Arc::clone(&self), sync_rx),
            Self::spawn_worker(Arc::clone(&self), generate_rx),
        ];

        let handle = InboundHandle {
            publish: publish_tx,
            confirm_req: req_tx,
            confirm_ack: ack_tx,
            sync_block: sync_tx,
            generate_block: generate_tx,
        };
        (handle, handles)
    }

    /// Signal the workers to stop accepting new messages.
    pub fn stop(&self) {
        let _ = self.quit.send(());
    }

    fn spawn_worker(receiver: Arc<Self>, mut rx: mpsc::Receiver<InboundMessage>) -> JoinHandle<()> {
        let mut quit = receiver.quit.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = quit.recv() => break,
                    msg = rx.recv() => match msg {
                        Some(msg) => receiver.handle(msg).await,
                        None => break,
                    },
                }
            }
        })
    }

    /// Process one inbound message: dedup, verify, rebroadcast, forward.
    pub async fn handle(&self, msg: InboundMessage) {
        match msg {
            InboundMessage::Publish { block, hash, peer } => {
                debug!(block = %block.hash(), from = ?peer, "received publish");
                if self.seen(hash).await {
                    return;
                }
                let Some(result) = self.verify(&block).await else {
                    return;
                };
                self.sink.publish(OutboundEvent::SendToPeers {
                    payload: NetPayload::Publish(block.clone()),
                    exclude: peer,
                });
                self.engine
                    .process_msg(Topic::Publish, result, BlockSource::live(block), None)
                    .await;
            }
            InboundMessage::ConfirmReq { block, hash: _, peer } => {
                debug!(block = %block.hash(), from = ?peer, "received confirm_req");
                let Some(result) = self.verify(&block).await else {
                    return;
                };
                self.sink.publish(OutboundEvent::SendToPeers {
                    payload: NetPayload::ConfirmReq(block.clone()),
                    exclude: peer,
                });
                self.engine
                    .process_msg(Topic::ConfirmReq, result, BlockSource::live(block), None)
                    .await;
            }
            InboundMessage::ConfirmAck { ack, hash, peer } => {
                debug!(block = %ack.block_hash(), voter = %ack.voter, "received confirm_ack");
                if !ack.verify() {
                    debug!(voter = %ack.voter, "dropping vote with invalid signature");
                    return;
                }
                if self.seen(hash).await {
                    return;
                }
                let Some(result) = self.verify(&ack.block).await else {
                    return;
                };
                self.sink.publish(OutboundEvent::SendToPeers {
                    payload: NetPayload::ConfirmAck(ack.clone()),
                    exclude: peer,
                });
                let source = BlockSource::live(ack.block.clone());
                self.engine
                    .process_msg(Topic::ConfirmAck, result, source, Some(ack))
                    .await;
            }
            InboundMessage::SyncBlock { block } => {
                let hash = block.hash();
                debug!(block = %hash, "received sync block");
                if self.seen(hash).await {
                    return;
                }
                let Some(result) = self.verify(&block).await else {
                    return;
                };
                // Bulk feeds are never rebroadcast.
                self.engine
                    .process_msg(Topic::SyncBlock, result, BlockSource::synced(block), None)
                    .await;
            }
            InboundMessage::GenerateBlock { result, block } => {
                debug!(block = %block.hash(), ?result, "received locally generated block");
                // Already verified and classified by the generator.
                self.engine
                    .process_msg(Topic::GenerateBlock, result, BlockSource::live(block), None)
                    .await;
            }
        }
    }

    /// Dedup check-and-mark. Returns `true` if the hash was already seen.
    async fn seen(&self, hash: BlockHash) -> bool {
        let mut processed = self.processed.lock().await;
        if processed.contains(&hash) {
            return true;
        }
        processed.insert(hash, ());
        false
    }

    async fn verify(&self, block: &StateBlock) -> Option<ProcessResult> {
        match verify_commit(
            self.ledger.as_ref(),
            block,
            self.config.conflict_retry_delay(),
        )
        .await
        {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(block = %block.hash(), "verification failed: {e}");
                None
            }
        }
    }
}
