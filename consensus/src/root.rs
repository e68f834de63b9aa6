//! Root keys — the deterministic identity of a contested chain slot.

use lattice_ledger::StateBlock;
use lattice_types::BlockHash;
use std::fmt;

/// Groups mutually-exclusive candidate blocks into one election.
///
/// 33 bytes: a tag byte followed by a hash. Open and contract-reward blocks
/// root on their `link` (tag 1) — they occupy the slot of the transaction
/// they consume; every other kind roots on its `previous` (tag 0). Two
/// blocks with equal root keys always compete for the same chain slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootKey([u8; 33]);

impl RootKey {
    pub fn for_block(block: &StateBlock) -> Self {
        let mut key = [0u8; 33];
        if block.kind.roots_on_link() {
            key[0] = 1;
            key[1..].copy_from_slice(block.link.as_bytes());
        } else {
            key[1..].copy_from_slice(block.previous.as_bytes());
        }
        Self(key)
    }

    /// The contested slot hash (previous or link, depending on the tag).
    pub fn slot_hash(&self) -> BlockHash {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.0[1..]);
        BlockHash::new(bytes)
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootKey(tag={}, {:?})", self.0[0], self.slot_hash())
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0[0], self.slot_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_ledger::BlockKind;
    use lattice_types::{Address, Signature, Timestamp};

    fn make_block(kind: BlockKind, previous: BlockHash, link: BlockHash) -> StateBlock {
        StateBlock {
            kind,
            address: Address::new("lat_1111"),
            previous,
            link,
            representative: Address::new("lat_2222"),
            balance: 100,
            timestamp: Timestamp::new(1_000_000),
            work: 0,
            signature: Signature([1u8; 64]),
        }
    }

    #[test]
    fn forks_share_a_root() {
        let prev = BlockHash::new([7u8; 32]);
        let mut a = make_block(BlockKind::Send, prev, BlockHash::new([1u8; 32]));
        let b = make_block(BlockKind::Send, prev, BlockHash::new([2u8; 32]));
        a.balance = 50;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(RootKey::for_block(&a), RootKey::for_block(&b));
    }

    #[test]
    fn open_roots_on_link() {
        let link = BlockHash::new([9u8; 32]);
        let open = make_block(BlockKind::Open, BlockHash::ZERO, link);
        let key = RootKey::for_block(&open);
        assert_eq!(key.slot_hash(), link);
    }

    #[test]
    fn contract_reward_roots_on_link() {
        let link = BlockHash::new([9u8; 32]);
        let reward = make_block(BlockKind::ContractReward, BlockHash::new([7u8; 32]), link);
        assert_eq!(RootKey::for_block(&reward).slot_hash(), link);
    }

    #[test]
    fn tag_separates_link_and_previous_roots() {
        let h = BlockHash::new([5u8; 32]);
        // Same 32 bytes, but one roots on previous and one on link.
        let send = make_block(BlockKind::Send, h, BlockHash::ZERO);
        let open = make_block(BlockKind::Open, BlockHash::ZERO, h);
        assert_ne!(RootKey::for_block(&send), RootKey::for_block(&open));
        assert_eq!(
            RootKey::for_block(&send).slot_hash(),
            RootKey::for_block(&open).slot_hash()
        );
    }

    #[test]
    fn receive_roots_on_previous() {
        let prev = BlockHash::new([3u8; 32]);
        let link = BlockHash::new([4u8; 32]);
        let receive = make_block(BlockKind::Receive, prev, link);
        assert_eq!(RootKey::for_block(&receive).slot_hash(), prev);
    }
}
