//! State block — the block format for the lattice's account chains.
//!
//! Every block carries the account's full state after the operation, so a
//! single block is enough to describe the chain head.

use lattice_types::{Address, BlockHash, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// The type of operation this block represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Account opening block (first block in the chain).
    Open,
    /// Send value to another account.
    Send,
    /// Receive value from a send block (`link` = source send hash).
    Receive,
    /// Change consensus representative.
    Change,
    /// Contract-originated send.
    ContractSend,
    /// Contract-originated reward/receive (`link` = source transaction).
    ContractReward,
}

impl BlockKind {
    /// Kinds whose election root is derived from `link` rather than
    /// `previous`: the block occupies a slot identified by the transaction it
    /// consumes, not by a predecessor.
    pub fn roots_on_link(&self) -> bool {
        matches!(self, BlockKind::Open | BlockKind::ContractReward)
    }
}

/// A state block in one account's chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBlock {
    /// The block type / operation.
    pub kind: BlockKind,

    /// The account this block belongs to.
    pub address: Address,

    /// Hash of the previous block in this account's chain (zero for Open).
    pub previous: BlockHash,

    /// Link field — the source transaction for receive-style blocks, the
    /// destination for send-style blocks, zero otherwise.
    pub link: BlockHash,

    /// The account's consensus representative.
    pub representative: Address,

    /// Account balance after this block.
    pub balance: u128,

    /// Block timestamp.
    pub timestamp: Timestamp,

    /// Proof-of-work nonce (anti-spam).
    pub work: u64,

    /// Signature by the account holder over the block hash.
    pub signature: Signature,
}

impl StateBlock {
    /// Compute the hash of this block from its contents.
    ///
    /// Work and signature are excluded: the signature signs this hash, and
    /// the work nonce may be regenerated without changing block identity.
    pub fn hash(&self) -> BlockHash {
        let kind = [self.kind as u8];
        let balance = self.balance.to_be_bytes();
        let timestamp = self.timestamp.as_secs().to_be_bytes();
        let digest = lattice_crypto::blake2b_256_multi(&[
            &kind,
            self.address.as_str().as_bytes(),
            self.previous.as_bytes(),
            self.link.as_bytes(),
            self.representative.as_str().as_bytes(),
            &balance,
            &timestamp,
        ]);
        BlockHash::new(digest)
    }

    /// Whether this is the first block in an account chain.
    pub fn is_open(&self) -> bool {
        self.kind == BlockKind::Open
    }

    /// The chain slot this block competes for: `link` for open/reward
    /// blocks, `previous` for everything else.
    pub fn slot(&self) -> BlockHash {
        if self.kind.roots_on_link() {
            self.link
        } else {
            self.previous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(n: u8) -> Address {
        Address::new(format!("lat_{}", "1".repeat(n as usize + 1)))
    }

    fn make_block(kind: BlockKind, previous: BlockHash, link: BlockHash) -> StateBlock {
        StateBlock {
            kind,
            address: test_address(3),
            previous,
            link,
            representative: test_address(5),
            balance: 1000,
            timestamp: Timestamp::new(1_000_000),
            work: 0,
            signature: Signature([1u8; 64]),
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let b = make_block(BlockKind::Send, BlockHash::new([2u8; 32]), BlockHash::ZERO);
        assert_eq!(b.hash(), b.hash());
    }

    #[test]
    fn hash_ignores_work_and_signature() {
        let mut a = make_block(BlockKind::Send, BlockHash::new([2u8; 32]), BlockHash::ZERO);
        let mut b = a.clone();
        a.work = 42;
        b.signature = Signature([9u8; 64]);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_depends_on_contents() {
        let a = make_block(BlockKind::Send, BlockHash::new([2u8; 32]), BlockHash::ZERO);
        let mut b = a.clone();
        b.balance = 999;
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn slot_follows_kind() {
        let prev = BlockHash::new([2u8; 32]);
        let link = BlockHash::new([3u8; 32]);

        let send = make_block(BlockKind::Send, prev, link);
        assert_eq!(send.slot(), prev);

        let open = make_block(BlockKind::Open, BlockHash::ZERO, link);
        assert_eq!(open.slot(), link);

        let reward = make_block(BlockKind::ContractReward, prev, link);
        assert_eq!(reward.slot(), link);

        // A plain receive chains on its previous like any other block.
        let receive = make_block(BlockKind::Receive, prev, link);
        assert_eq!(receive.slot(), prev);
    }

    #[test]
    fn open_detection() {
        let open = make_block(BlockKind::Open, BlockHash::ZERO, BlockHash::new([3u8; 32]));
        assert!(open.is_open());
        let send = make_block(BlockKind::Send, BlockHash::new([2u8; 32]), BlockHash::ZERO);
        assert!(!send.is_open());
    }
}
