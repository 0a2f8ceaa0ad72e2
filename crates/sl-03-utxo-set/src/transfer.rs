//! # Transfer Construction
//!
//! Builds a signed payment from a wallet key's unspent outputs.

use crate::domain::UtxoError;
use crate::utxo_set::UtxoSet;
use shared_crypto::{PubKeyHash, Secp256k1KeyPair};
use shared_types::{OutPoint, Transaction, TxnInput, TxnOutput};
use sl_02_chain_store::KeyValueStore;

impl<S: KeyValueStore> UtxoSet<S> {
    /// Pay `amount` from `keypair` to `to`, returning change to the sender.
    ///
    /// Outputs already claimed by pending transactions are skipped. Selection
    /// takes outputs in key order until the amount is covered.
    pub fn new_transfer<F>(
        &self,
        keypair: &Secp256k1KeyPair,
        to: PubKeyHash,
        amount: i64,
        is_claimed: F,
    ) -> Result<Transaction, UtxoError>
    where
        F: Fn(&OutPoint) -> bool,
    {
        if amount <= 0 {
            return Err(UtxoError::InvalidAmount(amount));
        }

        let from = keypair.pub_key_hash();
        let mut gathered = 0i64;
        let mut vin = Vec::new();
        for (outpoint, output) in self.spendable(&from, is_claimed)? {
            if gathered >= amount {
                break;
            }
            gathered += output.value;
            vin.push(TxnInput::spending(outpoint, output.value));
        }

        if gathered < amount {
            return Err(UtxoError::InsufficientFunds {
                available: gathered,
                required: amount,
            });
        }

        let mut vout = vec![TxnOutput::new(amount, to)];
        if gathered > amount {
            vout.push(TxnOutput::new(gathered - amount, from));
        }

        let mut txn = Transaction { vin, vout };
        txn.sign(keypair);
        Ok(txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Block, GroupId};
    use sl_01_group_router::group_of;
    use sl_02_chain_store::InMemoryKVStore;

    fn key_in_group(group: GroupId) -> Secp256k1KeyPair {
        (1u8..=255)
            .map(|seed| Secp256k1KeyPair::from_bytes([seed; 32]).unwrap())
            .find(|key| group_of(&key.pub_key_hash(), 4) == group)
            .unwrap()
    }

    fn funded(owner: &Secp256k1KeyPair, coins: u32) -> UtxoSet<InMemoryKVStore> {
        let mut utxo = UtxoSet::new(InMemoryKVStore::new(), 0, 4);
        let txns = (0..coins)
            .map(|h| Transaction::coinbase(owner.pub_key_hash(), 10, 0, h))
            .collect();
        utxo.update(&Block {
            txns,
            ..Block::default()
        })
        .unwrap();
        utxo
    }

    #[test]
    fn test_transfer_with_change_verifies() {
        let alice = key_in_group(0);
        let utxo = funded(&alice, 2);

        let txn = utxo.new_transfer(&alice, [9u8; 20], 15, |_| false).unwrap();
        assert_eq!(txn.vin.len(), 2);
        assert_eq!(txn.vout[0], TxnOutput::new(15, [9u8; 20]));
        assert_eq!(txn.vout[1], TxnOutput::new(5, alice.pub_key_hash()));
        assert!(utxo.mem_verify_transaction(&txn, |_| false).is_ok());
    }

    #[test]
    fn test_tampered_transfer_fails() {
        let alice = key_in_group(0);
        let utxo = funded(&alice, 1);

        let mut txn = utxo.new_transfer(&alice, [9u8; 20], 10, |_| false).unwrap();
        assert_eq!(txn.vout.len(), 1);
        txn.vout[0].pub_key_hash = [8u8; 20];
        assert!(matches!(
            utxo.mem_verify_transaction(&txn, |_| false),
            Err(UtxoError::InvalidTxn(_))
        ));
    }

    #[test]
    fn test_insufficient_and_claimed_funds() {
        let alice = key_in_group(0);
        let utxo = funded(&alice, 1);

        assert!(matches!(
            utxo.new_transfer(&alice, [9u8; 20], 11, |_| false),
            Err(UtxoError::InsufficientFunds { available: 10, required: 11 })
        ));
        assert!(matches!(
            utxo.new_transfer(&alice, [9u8; 20], 1, |_| true),
            Err(UtxoError::InsufficientFunds { available: 0, .. })
        ));
        assert!(matches!(
            utxo.new_transfer(&alice, [9u8; 20], 0, |_| false),
            Err(UtxoError::InvalidAmount(0))
        ));
    }
}
