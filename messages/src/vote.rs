//! Representative votes (ConfirmAck messages).

use lattice_crypto::{blake2b_256_multi, decode_address, sign_message, verify_signature};
use lattice_ledger::StateBlock;
use lattice_types::{Address, BlockHash, PrivateKey, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// A representative's signed endorsement of one block.
///
/// The signature covers the referenced block's hash. A voter's most recent
/// ack for a chain slot supersedes any earlier one; `sequence` is reserved
/// for future replay ordering and is currently always zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfirmAck {
    pub block: StateBlock,
    pub voter: Address,
    pub signature: Signature,
    pub sequence: u32,
}

impl ConfirmAck {
    /// Sign a vote for `block` with a representative's key.
    pub fn sign(block: StateBlock, voter: Address, key: &PrivateKey) -> Self {
        let hash = block.hash();
        let signature = sign_message(hash.as_bytes(), key);
        Self {
            block,
            voter,
            signature,
            sequence: 0,
        }
    }

    /// The hash of the block this vote endorses.
    pub fn block_hash(&self) -> BlockHash {
        self.block.hash()
    }

    /// Verify the vote signature against the claimed voter address.
    ///
    /// Returns `false` if the address does not decode to a public key or the
    /// signature does not cover the referenced block hash.
    pub fn verify(&self) -> bool {
        let Some(pubkey) = decode_address(self.voter.as_str()) else {
            return false;
        };
        let hash = self.block_hash();
        verify_signature(hash.as_bytes(), &self.signature, &PublicKey(pubkey))
    }

    /// Message-level identity used for ingress deduplication: distinct from
    /// the block hash so two reps voting for the same block are not collapsed.
    pub fn message_hash(&self) -> BlockHash {
        let digest = blake2b_256_multi(&[
            self.block_hash().as_bytes(),
            self.voter.as_str().as_bytes(),
            &self.signature.0,
        ]);
        BlockHash::new(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_crypto::{derive_address, generate_keypair};
    use lattice_ledger::BlockKind;
    use lattice_types::Timestamp;

    fn make_block() -> StateBlock {
        StateBlock {
            kind: BlockKind::Send,
            address: Address::new("lat_11111"),
            previous: BlockHash::new([2u8; 32]),
            link: BlockHash::ZERO,
            representative: Address::new("lat_22222"),
            balance: 500,
            timestamp: Timestamp::new(1_000_000),
            work: 0,
            signature: Signature([1u8; 64]),
        }
    }

    #[test]
    fn signed_vote_verifies() {
        let kp = generate_keypair();
        let voter = derive_address(&kp.public);
        let ack = ConfirmAck::sign(make_block(), voter, &kp.private);
        assert!(ack.verify());
        assert_eq!(ack.sequence, 0);
    }

    #[test]
    fn wrong_voter_fails_verification() {
        let kp = generate_keypair();
        let other = generate_keypair();
        let ack = ConfirmAck::sign(make_block(), derive_address(&other.public), &kp.private);
        assert!(!ack.verify());
    }

    #[test]
    fn undecodable_voter_fails_verification() {
        let kp = generate_keypair();
        let ack = ConfirmAck::sign(make_block(), Address::new("lat_notarealaddress"), &kp.private);
        assert!(!ack.verify());
    }

    #[test]
    fn tampered_block_fails_verification() {
        let kp = generate_keypair();
        let voter = derive_address(&kp.public);
        let mut ack = ConfirmAck::sign(make_block(), voter, &kp.private);
        ack.block.balance = 9999;
        assert!(!ack.verify());
    }

    #[test]
    fn message_hash_distinguishes_voters() {
        let k1 = generate_keypair();
        let k2 = generate_keypair();
        let a1 = ConfirmAck::sign(make_block(), derive_address(&k1.public), &k1.private);
        let a2 = ConfirmAck::sign(make_block(), derive_address(&k2.public), &k2.private);
        assert_eq!(a1.block_hash(), a2.block_hash());
        assert_ne!(a1.message_hash(), a2.message_hash());
    }
}
