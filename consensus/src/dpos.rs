//! DPoS consensus engine.
//!
//! Routes classified blocks and votes into the election pool, generates
//! votes for this node's local representatives, detects forks, and runs the
//! periodic maintenance loops (announcement sweep, representative refresh,
//! online-representative discovery). All state is owned by the engine
//! instance and torn down with it; nothing lives in process-wide globals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lattice_ledger::{Ledger, LedgerError, ProcessResult, StateBlock};
use lattice_messages::{
    BlockSource, ConfirmAck, MessageSink, NetPayload, Origin, OutboundEvent, Topic,
};
use lattice_types::{Address, BlockHash, KeyPair, Timestamp};

use crate::cache::ExpiringCache;
use crate::config::ConsensusConfig;
use crate::consensus::ConsensusAlgorithm;
use crate::election_pool::{ElectionPool, SweepAction};
use crate::error::ConsensusError;
use crate::receiver::verify_commit;
use crate::representatives::{LocalReps, OnlineReps};

/// The delegated-proof-of-stake consensus engine.
pub struct Dpos {
    config: ConsensusConfig,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn MessageSink>,
    /// Configured candidate accounts; filtered into `local_reps` on refresh.
    accounts: Vec<Arc<KeyPair>>,
    pool: Mutex<ElectionPool>,
    /// Blocks parked on a missing dependency, keyed by the dependency hash.
    unchecked: Mutex<ExpiringCache<BlockHash, Vec<BlockSource>>>,
    /// Votes parked on a not-yet-known block, keyed by that block's hash.
    vote_parked: Mutex<ExpiringCache<BlockHash, HashMap<Address, ConfirmAck>>>,
    local_reps: Mutex<LocalReps>,
    online_reps: Mutex<OnlineReps>,
    quit: broadcast::Sender<()>,
}

impl Dpos {
    pub fn new(
        config: ConsensusConfig,
        accounts: Vec<KeyPair>,
        ledger: Arc<dyn Ledger>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let pool = ElectionPool::new(
            config.announce_interval_secs,
            config.max_announcements,
            ledger.total_representative_weight(),
        );
        let unchecked = ExpiringCache::new(config.unchecked_cache_size, config.unchecked_ttl());
        let vote_parked = ExpiringCache::new(config.vote_cache_size, config.vote_cache_ttl());
        let online_reps = OnlineReps::new(config.online_rep_ttl_secs);
        let (quit, _) = broadcast::channel(1);

        Self {
            config,
            ledger,
            sink,
            accounts: accounts.into_iter().map(Arc::new).collect(),
            pool: Mutex::new(pool),
            unchecked: Mutex::new(unchecked),
            vote_parked: Mutex::new(vote_parked),
            local_reps: Mutex::new(LocalReps::new()),
            online_reps: Mutex::new(online_reps),
            quit,
        }
    }

    // ── Routing ─────────────────────────────────────────────────────────

    /// Route a classified block by its verifier outcome, then drain any
    /// blocks that were waiting on it.
    pub async fn process_result(&self, result: ProcessResult, source: &BlockSource) {
        self.route(result, source).await;
        if result == ProcessResult::Progress {
            self.dequeue_unchecked(source.block.hash()).await;
        }
    }

    /// Single-step routing; dependency draining is the caller's concern.
    async fn route(&self, result: ProcessResult, source: &BlockSource) {
        let block = &source.block;
        let hash = block.hash();

        match result {
            ProcessResult::Progress => match source.origin {
                Origin::Synchronized => {
                    debug!(block = %hash, "block arrived via sync, no election needed");
                }
                Origin::UnSynchronized => {
                    debug!(block = %hash, "registering election root");
                    self.pool
                        .lock()
                        .await
                        .add_to_roots(block.clone(), Timestamp::now());
                }
            },
            ProcessResult::Fork => {
                warn!(block = %hash, "fork detected");
                self.process_fork(block).await;
            }
            ProcessResult::GapPrevious => {
                debug!(block = %hash, dependency = %block.previous, "gap previous, parking block");
                self.enqueue_unchecked(block.previous, source.clone()).await;
            }
            ProcessResult::GapSource => {
                debug!(block = %hash, dependency = %block.link, "gap source, parking block");
                self.enqueue_unchecked(block.link, source.clone()).await;
            }
            ProcessResult::Old => {
                debug!(block = %hash, "block already settled");
            }
            ProcessResult::BadSignature
            | ProcessResult::BadWork
            | ProcessResult::BalanceMismatch
            | ProcessResult::UnReceivable
            | ProcessResult::GapSmartContract
            | ProcessResult::InvalidData
            | ProcessResult::Other => {
                warn!(block = %hash, ?result, "dropping rejected block");
            }
        }
    }

    /// A fork candidate arrived: make sure the locally committed rival has an
    /// election and solicit votes for it.
    async fn process_fork(&self, block: &StateBlock) {
        let rival = self.find_rival(block);
        let created = self
            .pool
            .lock()
            .await
            .add_to_roots(rival.clone(), Timestamp::now());
        if created {
            self.sink
                .publish(OutboundEvent::Broadcast(NetPayload::ConfirmReq(rival)));
        }
    }

    /// The block currently occupying the contested chain slot. Falls back to
    /// the candidate itself when the ledger cannot resolve the rival.
    fn find_rival(&self, block: &StateBlock) -> StateBlock {
        let lookup = self
            .ledger
            .competing_child(&block.slot(), &block.address)
            .and_then(|hash| self.ledger.get_block(&hash));
        match lookup {
            Ok(rival) => rival,
            Err(e) => {
                warn!(block = %block.hash(), "competing child lookup failed: {e}");
                block.clone()
            }
        }
    }

    // ── Dependency gap queue ────────────────────────────────────────────

    async fn enqueue_unchecked(&self, dependency: BlockHash, source: BlockSource) {
        let mut unchecked = self.unchecked.lock().await;
        if let Some(pending) = unchecked.get_mut(&dependency) {
            pending.push(source);
        } else {
            unchecked.insert(dependency, vec![source]);
        }
    }

    /// A previously missing hash became available: replay every block parked
    /// on it through the verify pipeline exactly once, fold any parked votes
    /// into its election, and vote on it with the local representatives.
    /// Transitive dependents drain through the worklist in the same pass.
    async fn dequeue_unchecked(&self, hash: BlockHash) {
        let mut resolved = vec![hash];

        while let Some(hash) = resolved.pop() {
            let Some(sources) = self.unchecked.lock().await.remove(&hash) else {
                continue;
            };
            debug!(dependency = %hash, count = sources.len(), "replaying parked blocks");

            for source in sources {
                let result = match verify_commit(
                    self.ledger.as_ref(),
                    &source.block,
                    self.config.conflict_retry_delay(),
                )
                .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(block = %source.block.hash(), "replay verification failed: {e}");
                        continue;
                    }
                };

                self.route(result, &source).await;

                if result == ProcessResult::Progress {
                    self.replay_parked_votes(&source.block).await;
                    self.vote_locally(&source.block, true).await;
                    resolved.push(source.block.hash());
                }
            }
        }
    }

    async fn replay_parked_votes(&self, block: &StateBlock) {
        let parked = self.vote_parked.lock().await.remove(&block.hash());
        let Some(parked) = parked else { return };
        debug!(block = %block.hash(), count = parked.len(), "replaying parked votes");

        let mut pool = self.pool.lock().await;
        for ack in parked.into_values() {
            let weight = self.ledger.representative_weight(&ack.voter);
            pool.vote(&ack, weight);
        }
    }

    async fn park_vote(&self, ack: ConfirmAck) {
        let hash = ack.block_hash();
        let mut parked = self.vote_parked.lock().await;
        if let Some(entry) = parked.get_mut(&hash) {
            entry.insert(ack.voter.clone(), ack);
        } else {
            let mut votes = HashMap::new();
            votes.insert(ack.voter.clone(), ack);
            parked.insert(hash, votes);
        }
    }

    // ── Local voting ────────────────────────────────────────────────────

    /// Have every local representative sign a vote for `block` and broadcast
    /// it; `submit` additionally folds the vote into the matching election.
    /// A failure for one key skips only that key.
    async fn vote_locally(&self, block: &StateBlock, submit: bool) {
        let reps = self.local_reps.lock().await.snapshot();
        if reps.is_empty() {
            return;
        }
        let now = Timestamp::now();

        for (address, key) in reps {
            self.online_reps
                .lock()
                .await
                .mark_online(address.clone(), now);

            let ack = match self.generate_vote(block, address.clone(), &key) {
                Ok(ack) => ack,
                Err(e) => {
                    warn!(representative = %address, "vote generation failed: {e}");
                    continue;
                }
            };
            if submit {
                let weight = self.ledger.representative_weight(&ack.voter);
                self.pool.lock().await.vote(&ack, weight);
            }
            self.sink
                .publish(OutboundEvent::Broadcast(NetPayload::ConfirmAck(ack)));
        }
    }

    fn generate_vote(
        &self,
        block: &StateBlock,
        address: Address,
        key: &KeyPair,
    ) -> Result<ConfirmAck, ConsensusError> {
        Ok(ConfirmAck::sign(block.clone(), address, &key.private))
    }

    // ── Representative bookkeeping ──────────────────────────────────────

    /// Re-scan the configured accounts, keeping those registered on-chain,
    /// and refresh the quorum base for new elections.
    pub async fn refresh_representatives(&self) {
        let count = self
            .local_reps
            .lock()
            .await
            .refresh(&self.accounts, self.ledger.as_ref());
        info!(representatives = count, "refreshed local representative registry");
        if count > 1 {
            error!("running two or more representatives on one node endangers the network");
        }
        self.pool
            .lock()
            .await
            .set_total_weight(self.ledger.total_representative_weight());
    }

    /// Provoke remote representatives into revealing liveness: mark the local
    /// ones online, then request confirmation for one random ledger block.
    pub async fn find_online_representatives(&self) -> Result<(), ConsensusError> {
        let reps = self.local_reps.lock().await.snapshot();
        let now = Timestamp::now();
        {
            let mut online = self.online_reps.lock().await;
            for (address, _) in &reps {
                online.mark_online(address.clone(), now);
            }
        }

        let block = self.ledger.random_block()?;
        self.sink
            .publish(OutboundEvent::Broadcast(NetPayload::ConfirmReq(block)));
        Ok(())
    }

    /// Expire stale online-representative records and persist the survivors.
    pub async fn clean_online_reps(&self) {
        let live = self.online_reps.lock().await.sweep(Timestamp::now());
        if let Err(e) = self.ledger.set_online_representatives(&live) {
            warn!("persisting online representatives failed: {e}");
        }
    }

    // ── Announcement sweep ──────────────────────────────────────────────

    /// One sweep over the election pool: announce unconfirmed leaders,
    /// finalize confirmed winners. Side effects run outside the pool lock.
    pub async fn run_sweep(&self, now: Timestamp) {
        let actions = self.pool.lock().await.tick(now);
        for action in actions {
            match action {
                SweepAction::Announce { block } => {
                    debug!(block = %block.hash(), "requesting confirmation");
                    self.sink
                        .publish(OutboundEvent::Broadcast(NetPayload::ConfirmReq(block)));
                }
                SweepAction::Finalize { winner, losers } => {
                    self.finalize(winner, losers).await;
                }
            }
        }
    }

    async fn finalize(&self, winner: StateBlock, losers: Vec<StateBlock>) {
        info!(block = %winner.hash(), "election confirmed");
        self.sink
            .publish(OutboundEvent::ConfirmedBlock(winner.clone()));
        self.persist_winner(&winner).await;
        self.roll_back_losers(&losers).await;
    }

    async fn persist_winner(&self, winner: &StateBlock) {
        let hash = winner.hash();
        match self.ledger.has_block(&hash) {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                warn!(block = %hash, "winner existence check failed: {e}");
                return;
            }
        }
        loop {
            match self.ledger.block_commit(winner) {
                Ok(()) => {
                    debug!(block = %hash, "winner persisted");
                    return;
                }
                Err(LedgerError::Conflict) => {
                    tokio::time::sleep(self.config.conflict_retry_delay()).await;
                }
                Err(LedgerError::BlockExists) => return,
                Err(e) => {
                    error!(block = %hash, "persisting winner failed: {e}");
                    return;
                }
            }
        }
    }

    /// Remove committed losers from the ledger. A per-block failure is
    /// logged and does not abort the batch.
    async fn roll_back_losers(&self, losers: &[StateBlock]) {
        for loser in losers {
            let hash = loser.hash();
            match self.ledger.has_block(&hash) {
                Ok(true) => {
                    info!(block = %hash, "rolling back fork loser");
                    if let Err(e) = self.ledger.rollback(&hash) {
                        warn!(block = %hash, "rollback failed: {e}");
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(block = %hash, "rollback existence check failed: {e}");
                }
            }
        }
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub async fn election_count(&self) -> usize {
        self.pool.lock().await.len()
    }

    pub async fn unchecked_count(&self) -> usize {
        self.unchecked.lock().await.len()
    }

    pub async fn parked_vote_count(&self) -> usize {
        self.vote_parked.lock().await.len()
    }

    pub async fn local_representative_count(&self) -> usize {
        self.local_reps.lock().await.len()
    }
}

#[async_trait]
impl ConsensusAlgorithm for Dpos {
    async fn init(&self) {
        if !self.accounts.is_empty() {
            self.refresh_representatives().await;
        }
    }

    fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!("DPoS consensus service started");
        let mut handles = Vec::new();

        // Announcement sweep.
        {
            let engine = Arc::clone(&self);
            let mut quit = self.quit.subscribe();
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(engine.config.sweep_interval());
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = quit.recv() => break,
                        _ = ticker.tick() => engine.run_sweep(Timestamp::now()).await,
                    }
                }
                info!("announcement sweep stopped");
            }));
        }

        // Representative maintenance.
        {
            let engine = Arc::clone(&self);
            let mut quit = self.quit.subscribe();
            handles.push(tokio::spawn(async move {
                let refresh_period = Duration::from_secs(engine.config.rep_refresh_interval_secs);
                let discovery_period =
                    Duration::from_secs(engine.config.online_discovery_interval_secs);
                let start = tokio::time::Instant::now();
                let mut refresh = tokio::time::interval_at(start + refresh_period, refresh_period);
                let mut discovery =
                    tokio::time::interval_at(start + discovery_period, discovery_period);
                loop {
                    tokio::select! {
                        _ = quit.recv() => break,
                        _ = refresh.tick() => engine.refresh_representatives().await,
                        _ = discovery.tick() => {
                            if let Err(e) = engine.find_online_representatives().await {
                                warn!("online representative discovery failed: {e}");
                            }
                            engine.clean_online_reps().await;
                            engine.unchecked.lock().await.purge_expired();
                            engine.vote_parked.lock().await.purge_expired();
                        }
                    }
                }
                info!("representative maintenance stopped");
            }));
        }

        handles
    }

    fn stop(&self) {
        info!("DPoS consensus service stopping");
        let _ = self.quit.send(());
    }

    async fn process_msg(
        &self,
        topic: Topic,
        result: ProcessResult,
        source: BlockSource,
        ack: Option<ConfirmAck>,
    ) {
        self.process_result(result, &source).await;
        let block = &source.block;

        match topic {
            Topic::Publish | Topic::GenerateBlock => {
                if result == ProcessResult::Progress {
                    self.vote_locally(block, true).await;
                }
            }
            Topic::ConfirmReq => {
                // A requester deserves an acknowledgement even for blocks we
                // already settled, so Old still generates (but does not tally)
                // a vote.
                if result == ProcessResult::Progress {
                    self.vote_locally(block, true).await;
                } else if result == ProcessResult::Old {
                    self.vote_locally(block, false).await;
                }
            }
            Topic::ConfirmAck => {
                let Some(ack) = ack else {
                    warn!(block = %block.hash(), "confirm_ack message without a vote payload");
                    return;
                };
                self.online_reps
                    .lock()
                    .await
                    .mark_online(ack.voter.clone(), Timestamp::now());

                if result.is_gap() {
                    debug!(block = %block.hash(), voter = %ack.voter, "parking early vote");
                    self.park_vote(ack).await;
                } else if result == ProcessResult::Progress {
                    let weight = self.ledger.representative_weight(&ack.voter);
                    self.pool.lock().await.vote(&ack, weight);
                    self.vote_locally(block, true).await;
                } else if result == ProcessResult::Old || result == ProcessResult::Fork {
                    // Old: the voted block is already settled here. Fork: the
                    // voted block is the rival of a block settled here. Both
                    // map to the root's election and must tally, or the losing
                    // side's node would never learn the outcome.
                    let weight = self.ledger.representative_weight(&ack.voter);
                    self.pool.lock().await.vote(&ack, weight);
                }
            }
            Topic::SyncBlock => {}
        }
    }
}
