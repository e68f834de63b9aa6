//! Representative registries.
//!
//! `LocalReps` holds the signing keys of this node's own representative
//! accounts: configured accounts filtered down to those registered on-chain.
//! `OnlineReps` tracks which remote representatives have shown liveness
//! recently, each with an expiry deadline.

use lattice_ledger::Ledger;
use lattice_types::{Address, KeyPair, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;

/// This node's own voting identities.
#[derive(Default)]
pub struct LocalReps {
    keys: HashMap<Address, Arc<KeyPair>>,
}

impl LocalReps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from the configured accounts, keeping only those
    /// registered on-chain as representatives. Returns how many survived.
    pub fn refresh(&mut self, accounts: &[Arc<KeyPair>], ledger: &dyn Ledger) -> usize {
        self.keys.clear();
        for account in accounts {
            let address = lattice_crypto::derive_address(&account.public);
            if ledger.is_registered_representative(&address) {
                self.keys.insert(address, Arc::clone(account));
            }
        }
        self.keys.len()
    }

    /// Snapshot of every local representative and its signing key.
    pub fn snapshot(&self) -> Vec<(Address, Arc<KeyPair>)> {
        self.keys
            .iter()
            .map(|(addr, key)| (addr.clone(), Arc::clone(key)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Liveness records for representatives observed voting or heartbeating.
pub struct OnlineReps {
    /// Address → expiry instant.
    entries: HashMap<Address, Timestamp>,
    ttl_secs: u64,
}

impl OnlineReps {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_secs,
        }
    }

    /// Record liveness for an address, extending its deadline.
    pub fn mark_online(&mut self, address: Address, now: Timestamp) {
        self.entries.insert(address, now.plus(self.ttl_secs));
    }

    /// Drop expired records and return the addresses still considered online.
    pub fn sweep(&mut self, now: Timestamp) -> Vec<Address> {
        self.entries.retain(|_, expiry| *expiry > now);
        let mut live: Vec<Address> = self.entries.keys().cloned().collect();
        live.sort();
        live
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_crypto::{derive_address, generate_keypair};
    use lattice_nullables::NullLedger;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn refresh_keeps_only_registered_accounts() {
        let ledger = NullLedger::new();
        let registered = Arc::new(generate_keypair());
        let unregistered = Arc::new(generate_keypair());
        ledger.register_representative(derive_address(&registered.public), 50);

        let mut reps = LocalReps::new();
        let count = reps.refresh(
            &[Arc::clone(&registered), Arc::clone(&unregistered)],
            &ledger,
        );
        assert_eq!(count, 1);

        let snapshot = reps.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, derive_address(&registered.public));
    }

    #[test]
    fn refresh_drops_deregistered_accounts() {
        let ledger = NullLedger::new();
        let account = Arc::new(generate_keypair());

        let mut reps = LocalReps::new();
        assert_eq!(reps.refresh(&[Arc::clone(&account)], &ledger), 0);
        assert!(reps.is_empty());

        ledger.register_representative(derive_address(&account.public), 50);
        assert_eq!(reps.refresh(&[account], &ledger), 1);
    }

    #[test]
    fn online_reps_expire() {
        let mut online = OnlineReps::new(300);
        online.mark_online(Address::new("lat_a"), ts(100));
        online.mark_online(Address::new("lat_b"), ts(300));

        // At 400: a expires exactly at 400, b lives until 600.
        let live = online.sweep(ts(400));
        assert_eq!(live, vec![Address::new("lat_b")]);
        assert_eq!(online.len(), 1);
    }

    #[test]
    fn mark_online_extends_deadline() {
        let mut online = OnlineReps::new(300);
        online.mark_online(Address::new("lat_a"), ts(100));
        online.mark_online(Address::new("lat_a"), ts(350));

        let live = online.sweep(ts(500));
        assert_eq!(live, vec![Address::new("lat_a")]);
    }
}
