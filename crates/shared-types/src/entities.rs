//! # Core Domain Entities
//!
//! The ledger data model.
//!
//! ## Clusters
//!
//! - **Chain**: `Block` (and its header-only projection, the block-head)
//! - **Value**: `Transaction`, `TxnInput`, `TxnOutput`, `OutPoint`
//! - **Relay**: `MerklePath`, `ProofNode`, `Position`
//!
//! Identities (`Block::hash`, `Transaction::hash`) are derived on demand from
//! the canonical encoding and never stored inside the record.

use crate::encoding::{canonical_hash, CanonicalEncode, CanonicalEncoder};
use crate::errors::TxnError;
use serde::{Deserialize, Serialize};
use shared_crypto::{owner_hash, sha256_many, verify_signature, Secp256k1KeyPair};
use std::collections::HashMap;

pub use shared_crypto::PubKeyHash;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// The all-zero hash; the `prev_hash` of every genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Shard identifier in `[0, max_group_num)`.
pub type GroupId = u32;

/// `vout_index` carried by the single input of a coinbase transaction.
pub const COINBASE_VOUT_INDEX: i32 = -1;

/// First eight hex characters of a hash, for log lines.
pub fn hash_prefix(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

/// Number of leading zero bits in a hash.
pub fn leading_zero_bits(hash: &Hash) -> u32 {
    let mut bits = 0;
    for byte in hash {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

// =============================================================================
// CLUSTER B: VALUE TRANSFER
// =============================================================================

/// Reference to one output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the transaction holding the output.
    pub txn_hash: Hash,
    /// Position of the output in that transaction's `vout`.
    pub index: u32,
}

impl OutPoint {
    /// Create an outpoint.
    pub fn new(txn_hash: Hash, index: u32) -> Self {
        Self { txn_hash, index }
    }
}

/// A spendable amount locked to an owner hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnOutput {
    /// Amount in base units.
    pub value: i64,
    /// Owner hash the output is locked to.
    pub pub_key_hash: PubKeyHash,
}

impl TxnOutput {
    /// Create an output.
    pub fn new(value: i64, pub_key_hash: PubKeyHash) -> Self {
        Self {
            value,
            pub_key_hash,
        }
    }

    /// Whether `pub_key_hash` can spend this output.
    pub fn is_locked_with_key(&self, pub_key_hash: &PubKeyHash) -> bool {
        &self.pub_key_hash == pub_key_hash
    }
}

/// A reference to the output being spent, plus the spending proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnInput {
    /// Hash of the transaction holding the spent output.
    pub vout_hash: Hash,
    /// Index of the spent output; `-1` marks a coinbase input.
    pub vout_index: i32,
    /// Cached value of the spent output.
    pub vout_value: i64,
    /// `r || s` signature; empty in the trimmed copy.
    pub signature: Vec<u8>,
    /// Compressed public key of the spender; empty in the trimmed copy.
    pub pub_key: Vec<u8>,
}

impl TxnInput {
    /// Unsigned input spending `outpoint`.
    pub fn spending(outpoint: OutPoint, value: i64) -> Self {
        Self {
            vout_hash: outpoint.txn_hash,
            vout_index: outpoint.index as i32,
            vout_value: value,
            signature: Vec::new(),
            pub_key: Vec::new(),
        }
    }

    /// The output this input spends, `None` for a coinbase input.
    pub fn outpoint(&self) -> Option<OutPoint> {
        u32::try_from(self.vout_index)
            .ok()
            .map(|index| OutPoint::new(self.vout_hash, index))
    }

    /// Owner hash of the spending key.
    pub fn owner(&self) -> PubKeyHash {
        owner_hash(&self.pub_key)
    }

    /// The spent output as recorded by this input, without consulting the
    /// chain. This is what a rollback restores.
    pub fn spent_output(&self) -> TxnOutput {
        TxnOutput::new(self.vout_value, self.owner())
    }
}

/// A value transfer. Identity is [`Transaction::hash`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    /// Inputs.
    pub vin: Vec<TxnInput>,
    /// Outputs.
    pub vout: Vec<TxnOutput>,
}

impl CanonicalEncode for TxnInput {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.write_hash(&self.vout_hash)
            .write_i32(self.vout_index)
            .write_i64(self.vout_value)
            .write_var_bytes(&self.signature)
            .write_var_bytes(&self.pub_key);
    }
}

impl CanonicalEncode for TxnOutput {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.write_i64(self.value).write_fixed(&self.pub_key_hash);
    }
}

impl CanonicalEncode for Transaction {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.write_len(self.vin.len());
        for input in &self.vin {
            input.encode_canonical(enc);
        }
        enc.write_len(self.vout.len());
        for output in &self.vout {
            output.encode_canonical(enc);
        }
    }
}

impl Transaction {
    /// Build the coinbase paying `reward` to `owner` in block `height` of
    /// `group`. The input's `vout_hash` commits to (group, height) so
    /// coinbases at different heights never share an identity.
    pub fn coinbase(owner: PubKeyHash, reward: i64, group: GroupId, height: u32) -> Self {
        let marker = sha256_many(&[
            b"coinbase".as_slice(),
            group.to_be_bytes().as_slice(),
            height.to_be_bytes().as_slice(),
        ]);
        Self {
            vin: vec![TxnInput {
                vout_hash: marker,
                vout_index: COINBASE_VOUT_INDEX,
                vout_value: 0,
                signature: Vec::new(),
                pub_key: Vec::new(),
            }],
            vout: vec![TxnOutput::new(reward, owner)],
        }
    }

    /// Exactly one input with `vout_index == -1`.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].vout_index == COINBASE_VOUT_INDEX
    }

    /// Copy with every signature and public key stripped.
    pub fn trimmed_copy(&self) -> Transaction {
        Transaction {
            vin: self
                .vin
                .iter()
                .map(|vin| TxnInput {
                    vout_hash: vin.vout_hash,
                    vout_index: vin.vout_index,
                    vout_value: vin.vout_value,
                    signature: Vec::new(),
                    pub_key: Vec::new(),
                })
                .collect(),
            vout: self.vout.clone(),
        }
    }

    /// Transaction identity: hash of the trimmed copy.
    pub fn hash(&self) -> Hash {
        canonical_hash(&self.trimmed_copy())
    }

    /// Outputs spent by this transaction (empty for a coinbase).
    pub fn spent_outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.vin.iter().filter_map(TxnInput::outpoint)
    }

    /// Sum of output values.
    pub fn output_value(&self) -> i64 {
        self.vout.iter().map(|o| o.value).sum()
    }

    /// Sum of cached input values.
    pub fn input_value(&self) -> i64 {
        self.vin.iter().map(|i| i.vout_value).sum()
    }

    /// Pre-image signed by input `index` spending an output of `referenced_owner`.
    pub fn signature_message(&self, index: usize, referenced_owner: &PubKeyHash) -> Hash {
        let trimmed = self.trimmed_copy().canonical_bytes();
        let index = (index as u32).to_be_bytes();
        sha256_many(&[trimmed.as_slice(), index.as_slice(), referenced_owner.as_slice()])
    }

    /// Sign every input with `keypair`, which must own all spent outputs.
    pub fn sign(&mut self, keypair: &Secp256k1KeyPair) {
        if self.is_coinbase() {
            return;
        }
        let owner = keypair.pub_key_hash();
        let pub_key = keypair.public_key();
        for index in 0..self.vin.len() {
            let message = self.signature_message(index, &owner);
            self.vin[index].signature = keypair.sign(&message);
            self.vin[index].pub_key = pub_key.clone();
        }
    }

    /// Check values, ownership and signatures against the outputs this
    /// transaction references. A coinbase is always well-formed here;
    /// its placement is checked by block acceptance.
    pub fn verify(&self, referenced: &HashMap<OutPoint, TxnOutput>) -> Result<(), TxnError> {
        if self.vout.iter().any(|o| o.value <= 0) {
            return Err(TxnError::NonPositiveOutput);
        }
        if self.is_coinbase() {
            return Ok(());
        }
        if self.vin.is_empty() {
            return Err(TxnError::NoInputs);
        }

        for (index, input) in self.vin.iter().enumerate() {
            let outpoint = input.outpoint().ok_or(TxnError::MisplacedCoinbaseInput)?;
            let output = referenced
                .get(&outpoint)
                .ok_or(TxnError::MissingReference(outpoint))?;
            if output.value != input.vout_value {
                return Err(TxnError::ValueMismatch {
                    outpoint,
                    cached: input.vout_value,
                    actual: output.value,
                });
            }
            if input.owner() != output.pub_key_hash {
                return Err(TxnError::OwnerMismatch(outpoint));
            }
            let message = self.signature_message(index, &output.pub_key_hash);
            if !verify_signature(&input.pub_key, &message, &input.signature) {
                return Err(TxnError::BadSignature(index));
            }
        }

        if self.output_value() > self.input_value() {
            return Err(TxnError::Overspend {
                inputs: self.input_value(),
                outputs: self.output_value(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// CLUSTER C: THE CHAIN
// =============================================================================

/// A block of one group's chain.
///
/// A *block-head* is the same record with `txns` cleared; since the body is
/// committed through `merkle_root`, a block and its head share one hash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Group this block belongs to.
    pub group: GroupId,
    /// Height; `0` is genesis.
    pub height: u32,
    /// Hash of the block at `height - 1`; zero for genesis.
    pub prev_hash: Hash,
    /// Merkle root over `txns` hashes.
    pub merkle_root: Hash,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Required leading zero bits of the block hash.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Transaction bodies; empty in a block-head.
    pub txns: Vec<Transaction>,
}

/// Header-only projection of a [`Block`].
pub type BlockHead = Block;

impl CanonicalEncode for Block {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.write_u32(self.group)
            .write_u32(self.height)
            .write_hash(&self.prev_hash)
            .write_hash(&self.merkle_root)
            .write_u64(self.timestamp)
            .write_u32(self.bits)
            .write_u64(self.nonce);
    }
}

impl Block {
    /// Block identity.
    pub fn hash(&self) -> Hash {
        canonical_hash(self)
    }

    /// Whether this is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Header-only copy.
    pub fn head(&self) -> BlockHead {
        Block {
            txns: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether the hash satisfies `bits`.
    pub fn meets_difficulty(&self) -> bool {
        leading_zero_bits(&self.hash()) >= self.bits
    }

    /// Hashes of the body transactions, in block order.
    pub fn txn_hashes(&self) -> Vec<Hash> {
        self.txns.iter().map(Transaction::hash).collect()
    }
}

// =============================================================================
// CLUSTER D: RELAY PROOFS
// =============================================================================

/// Side of the sibling at one Merkle level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    /// Sibling is the left operand.
    Left,
    /// Sibling is the right operand.
    Right,
}

/// One step of a Merkle inclusion path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Sibling hash at this level.
    pub hash: Hash,
    /// Which side the sibling sits on.
    pub position: Position,
}

impl ProofNode {
    /// Sibling on the left.
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    /// Sibling on the right.
    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// Leaf-to-root inclusion path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerklePath {
    /// Steps, leaf level first.
    pub nodes: Vec<ProofNode>,
}
