// tests/integration.rs

//! Integration tests for the ringscope chain layer
//!
//! Walks the complete path from raw blobs to a verified ring: snapshot on
//! disk, store replay, ring resolution and signature checks.

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use ringscope_core::extra::{write_extra, ExtraField};
    use ringscope_core::resolver::absolute_to_relative;
    use ringscope_core::*;
    use ringscope_crypto::keys::{generate_wallet_keys, SecretKey};
    use ringscope_crypto::ring::{generate_ring_signature, verify_ring_signature};
    use ringscope_crypto::stealth::{derive, derive_output_key};

    const AMOUNT: u64 = 500_000_000;

    fn coinbase_paying(height: u64, keys: &[[u8; 32]], tx_public: &ringscope_crypto::PublicKey) -> Transaction {
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: height + 60,
                inputs: vec![TxIn::Gen { height }],
                outputs: keys.iter().map(|&key| TxOut { amount: AMOUNT, key }).collect(),
                extra: write_extra(&[ExtraField::PublicKey(tx_public.to_bytes())]),
            },
            signatures: vec![Default::default()],
            rct_remainder: vec![],
        }
    }

    #[test]
    fn test_snapshot_to_verified_ring() {
        let mut rng = StdRng::seed_from_u64(99);
        let (view, spend) = generate_wallet_keys(&mut rng);

        // Block 0: three decoys. Block 1: a decoy and an output to our wallet.
        let decoy_secret = SecretKey::generate(&mut rng);
        let decoys: Vec<[u8; 32]> =
            (0..3).map(|_| SecretKey::generate(&mut rng).public_key().to_bytes()).collect();
        let block0 = coinbase_paying(0, &decoys, &decoy_secret.public_key());

        let r = SecretKey::generate(&mut rng);
        let ours = derive_output_key(view.public(), spend.public(), &r, 1);
        let block1 = coinbase_paying(
            1,
            &[SecretKey::generate(&mut rng).public_key().to_bytes(), ours.to_bytes()],
            &r.public_key(),
        );
        assert_eq!(block1.owned_outputs(view.secret(), spend.public()), vec![1]);

        // Block 2: spend global index 4 in a ring over {1, 2, 4}
        let keys = derive(&view, &spend, &r.public_key(), 1).unwrap();
        assert_eq!(keys.public, ours);
        let absolute = vec![1u64, 2, 4];
        let ring_keys = vec![
            ringscope_crypto::PublicKey::from_bytes(&decoys[1]).unwrap(),
            ringscope_crypto::PublicKey::from_bytes(&decoys[2]).unwrap(),
            ours,
        ];
        let prefix = TransactionPrefix {
            version: 1,
            unlock_time: 0,
            inputs: vec![TxIn::ToKey(KeyInput {
                amount: AMOUNT,
                key_offsets: absolute_to_relative(&absolute).unwrap(),
                key_image: keys.key_image.to_bytes(),
            })],
            outputs: vec![TxOut { amount: AMOUNT, key: [0x58; 32] }],
            extra: vec![],
        };
        let ring = ringscope_crypto::Ring::from_keys(ring_keys);
        let sig = generate_ring_signature(&prefix.hash(), &keys.key_image, &ring, &keys.secret, 2, &mut rng)
            .unwrap();
        let block2 = Transaction { prefix, signatures: vec![sig], rct_remainder: vec![] };

        // Persist and replay
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let mut snapshot = ChainSnapshot::new();
        snapshot.push(&block0, 0, None);
        snapshot.push(&block1, 1, None);
        snapshot.push(&block2, 2, None);
        snapshot.save_to_file(&path).unwrap();
        let store = open_store(&path).unwrap();

        // Resolve and verify the on-chain signature
        let spend_hash = block2.hash().unwrap();
        let tx = store.get_tx(&spend_hash).unwrap();
        assert_eq!(tx.to_bytes(), block2.to_bytes());

        let input = tx.inputs()[0].as_key_input().unwrap();
        let resolved = resolve_ring(&store, input).unwrap();
        assert_eq!(resolved.absolute_offsets(), absolute);
        assert_eq!(resolved.members[2].tx_hash, block1.hash().unwrap());
        assert_eq!(resolved.members[2].index_in_tx, 1);
        assert_eq!(resolved.members[0].height, 0);
        assert_eq!(resolved.position(&ours), Some(2));

        let image = input.key_image().unwrap();
        assert!(verify_ring_signature(&tx.prefix_hash(), &image, &resolved.to_ring(), &tx.signatures[0]));

        // Shuffled rows lose positional binding
        let mut shuffled = tx.signatures[0].clone();
        shuffled.elements_mut().swap(0, 2);
        assert!(!verify_ring_signature(&tx.prefix_hash(), &image, &resolved.to_ring(), &shuffled));
    }

    #[test]
    fn test_missing_parent_output() {
        // A store whose bucket points at a transaction lacking the key
        struct Broken(MemoryStore);

        impl BlockchainStore for Broken {
            fn get_tx(&self, hash: &Hash) -> Result<Transaction> {
                let mut tx = self.0.get_tx(hash)?;
                tx.prefix.outputs.clear();
                Ok(tx)
            }
            fn get_num_outputs(&self, amount: u64) -> Result<u64> {
                self.0.get_num_outputs(amount)
            }
            fn get_output_keys(&self, amount: u64, offsets: &[u64]) -> Result<Vec<OutputData>> {
                self.0.get_output_keys(amount, offsets)
            }
            fn get_output_tx(&self, amount: u64, offset: u64) -> Result<OutputLocation> {
                self.0.get_output_tx(amount, offset)
            }
            fn get_tx_block_height(&self, hash: &Hash) -> Result<Height> {
                self.0.get_tx_block_height(hash)
            }
        }

        let mut rng = StdRng::seed_from_u64(5);
        let key = SecretKey::generate(&mut rng).public_key();
        let store = MemoryStore::new();
        store.add_transaction(coinbase_paying(0, &[key.to_bytes()], &key), 0, None).unwrap();

        let input = KeyInput { amount: AMOUNT, key_offsets: vec![0], key_image: [0u8; 32] };
        let err = resolve_ring(&Broken(store), &input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingOutput);
    }

    #[test]
    fn test_invalid_member_key_is_invalid_encoding() {
        let mut rng = StdRng::seed_from_u64(6);
        let tx_key = SecretKey::generate(&mut rng).public_key();
        // y = p + 1 is a non-canonical encoding
        let mut bad = [0xffu8; 32];
        bad[0] = 0xee;
        bad[31] = 0x7f;

        let store = MemoryStore::new();
        store.add_transaction(coinbase_paying(0, &[bad], &tx_key), 0, None).unwrap();
        let input = KeyInput { amount: AMOUNT, key_offsets: vec![0], key_image: [0u8; 32] };
        assert_eq!(resolve_ring(&store, &input).unwrap_err().kind(), ErrorKind::InvalidEncoding);
    }
}
