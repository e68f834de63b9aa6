//! Consensus façade — owns the lifecycle of the receiver and the consensus
//! algorithm behind it.
//!
//! Only DPoS exists today, but the algorithm stays behind the
//! [`ConsensusAlgorithm`] capability trait so alternative implementations
//! (and test doubles) can be swapped in.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use lattice_ledger::{Ledger, ProcessResult};
use lattice_messages::{BlockSource, ConfirmAck, MessageSink, Topic};
use lattice_types::KeyPair;

use crate::cache::ExpiringCache;
use crate::config::ConsensusConfig;
use crate::dpos::Dpos;
use crate::receiver::{InboundHandle, Receiver};

/// The capability surface a consensus algorithm exposes to the node.
#[async_trait]
pub trait ConsensusAlgorithm: Send + Sync {
    /// One-time setup before the service loops run.
    async fn init(&self);

    /// Spawn the algorithm's periodic service loops.
    fn start(self: Arc<Self>) -> Vec<JoinHandle<()>>;

    /// Signal the service loops to wind down. In-flight work completes.
    fn stop(&self);

    /// Route one classified inbound message.
    async fn process_msg(
        &self,
        topic: Topic,
        result: ProcessResult,
        source: BlockSource,
        ack: Option<ConfirmAck>,
    );
}

/// The embedded consensus service: receiver + algorithm + shared dedup cache.
pub struct Consensus {
    algorithm: Arc<dyn ConsensusAlgorithm>,
    receiver: Arc<Receiver>,
    tasks: Vec<JoinHandle<()>>,
    handle: Option<InboundHandle>,
}

impl Consensus {
    /// Build a consensus service running DPoS.
    ///
    /// `accounts` are this node's candidate representative accounts; only
    /// those registered on-chain will actually vote.
    pub fn new_dpos(
        config: ConsensusConfig,
        accounts: Vec<KeyPair>,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let algorithm = Arc::new(Dpos::new(
            config.clone(),
            accounts,
            Arc::clone(&ledger),
            Arc::clone(&sink),
        ));
        Self::with_algorithm(algorithm, config, ledger, sink)
    }

    /// Build a consensus service around any [`ConsensusAlgorithm`].
    pub fn with_algorithm(
        algorithm: Arc<dyn ConsensusAlgorithm>,
        config: ConsensusConfig,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let processed = Arc::new(Mutex::new(ExpiringCache::new(
            config.dedup_cache_size,
            config.dedup_ttl(),
        )));
        let receiver = Arc::new(Receiver::new(
            Arc::clone(&algorithm),
            ledger,
            sink,
            processed,
            config,
        ));
        Self {
            algorithm,
            receiver,
            tasks: Vec::new(),
            handle: None,
        }
    }

    pub async fn init(&self) {
        self.algorithm.init().await;
    }

    /// Start the algorithm loops and the ingress workers. Returns the handle
    /// the network layer uses to feed messages in.
    pub fn start(&mut self) -> InboundHandle {
        let mut tasks = Arc::clone(&self.algorithm).start();
        let (handle, receiver_tasks) = Arc::clone(&self.receiver).start();
        tasks.extend(receiver_tasks);
        self.tasks = tasks;
        self.handle = Some(handle.clone());
        handle
    }

    /// Cooperative shutdown: stop accepting new work, then wait for every
    /// loop to finish its in-flight operation and exit.
    pub async fn stop(&mut self) {
        self.receiver.stop();
        self.algorithm.stop();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("consensus task ended abnormally: {e}");
            }
        }
        self.handle = None;
    }

    /// The ingress handle, once started.
    pub fn inbound(&self) -> Option<InboundHandle> {
        self.handle.clone()
    }
}
