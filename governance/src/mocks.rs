//! In-memory chain, virtual clock and misbehaving signers for testing.
//!
//! The mock [Chain] decodes every submitted transaction, holds it until a block is
//! sealed, and tracks the chain root by folding each block's transactions root into the
//! previous one (see [fold]). Failure modes are toggled at runtime.

use crate::{
    block::{self, Block, Consensus, Tip},
    transaction::Transaction,
    wire::Limits,
    Address, Error,
};
use bytes::Bytes;
use futures::future;
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use vigil_codec::Decode;
use vigil_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    hash,
    sha256::Digest,
    Error as CryptoError, Signer,
};
use vigil_utils::union;

/// Folds a block's transactions root into the previous chain root.
pub fn fold(previous: &Digest, transactions_root: &Digest) -> Digest {
    hash(&union(previous, transactions_root))
}

struct State {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    included: HashMap<Digest, u32>,
    storage: HashMap<(Address, Bytes), Bytes>,
    submitted: Vec<Bytes>,

    auto_seal: bool,
    advance_on_fold: bool,
    hang: bool,
    unavailable: bool,
    misreport_hashes: bool,
}

impl State {
    fn tip(&self) -> &Block {
        // Genesis is inserted at construction and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    fn seal(&mut self) -> u32 {
        let tip = self.tip();
        let root = block::transactions_root(&self.pending);
        let block_root = fold(&tip.header().block_root(), &root);
        let tip = Tip::from(tip.header());
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::extend(
            &tip,
            0,
            tip.timestamp,
            block_root,
            Consensus::default(),
            transactions,
        )
        .expect("mock chain exhausted");
        let height = block.height();
        for transaction in block.transactions() {
            self.included.insert(transaction.hash(), height);
        }
        self.blocks.push(block);
        height
    }
}

/// An in-memory chain.
#[derive(Clone)]
pub struct Chain {
    state: Arc<Mutex<State>>,
}

impl Chain {
    /// Creates a chain containing only a genesis block at `timestamp`.
    pub fn new(timestamp: u32) -> Self {
        let state = State {
            blocks: vec![Block::genesis(timestamp)],
            pending: Vec::new(),
            included: HashMap::new(),
            storage: HashMap::new(),
            submitted: Vec::new(),
            auto_seal: false,
            advance_on_fold: false,
            hang: false,
            unavailable: false,
            misreport_hashes: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Seals pending transactions (if any) into a new block, returning its height.
    pub fn seal(&self) -> u32 {
        self.state.lock().unwrap().seal()
    }

    /// Seal pending transactions whenever inclusion is queried.
    pub fn set_auto_seal(&self, enabled: bool) {
        self.state.lock().unwrap().auto_seal = enabled;
    }

    /// Seal an empty block whenever a block root is folded (moving the tip mid-assembly).
    pub fn set_advance_on_fold(&self, enabled: bool) {
        self.state.lock().unwrap().advance_on_fold = enabled;
    }

    /// Never respond to any call.
    pub fn set_hang(&self, enabled: bool) {
        self.state.lock().unwrap().hang = enabled;
    }

    /// Fail every call with [Error::RemoteUnavailable].
    pub fn set_unavailable(&self, enabled: bool) {
        self.state.lock().unwrap().unavailable = enabled;
    }

    /// Report the hash of every submitted transaction incorrectly.
    pub fn set_misreport_hashes(&self, enabled: bool) {
        self.state.lock().unwrap().misreport_hashes = enabled;
    }

    /// Stores `value` under `key` for `contract`.
    pub fn set_storage(&self, contract: Address, key: Bytes, value: Bytes) {
        self.state
            .lock()
            .unwrap()
            .storage
            .insert((contract, key), value);
    }

    /// Raw transactions submitted so far, in order.
    pub fn submitted(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().submitted.clone()
    }

    async fn respond<T>(
        &self,
        operation: &'static str,
        handler: impl FnOnce(&mut State) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            if state.unavailable {
                Some(Err(Error::RemoteUnavailable(
                    operation,
                    "connection refused".into(),
                )))
            } else if state.hang {
                None
            } else {
                Some(handler(&mut state))
            }
        };
        match outcome {
            Some(result) => result,
            None => future::pending().await,
        }
    }
}

impl crate::Chain for Chain {
    async fn current_height(&self) -> Result<u32, Error> {
        self.respond("current_height", |state| Ok(state.tip().height()))
            .await
    }

    async fn block_by_height(&self, height: u32) -> Result<Option<Block>, Error> {
        self.respond("block_by_height", |state| {
            Ok(state.blocks.get(height as usize).cloned())
        })
        .await
    }

    async fn send_raw_transaction(&self, transaction: Bytes) -> Result<Digest, Error> {
        self.respond("send_raw_transaction", |state| {
            let decoded = Transaction::decode_cfg(transaction.clone(), &Limits::default())
                .map_err(|err| Error::RemoteUnavailable("send_raw_transaction", err.to_string()))?;
            let mut hash = decoded.hash();
            if state.misreport_hashes {
                hash = vigil_cryptography::hash(hash.as_ref());
            }
            state.submitted.push(transaction);
            state.pending.push(decoded);
            Ok(hash)
        })
        .await
    }

    async fn transaction_height(&self, hash: Digest) -> Result<Option<u32>, Error> {
        self.respond("transaction_height", |state| {
            if state.auto_seal && !state.pending.is_empty() {
                state.seal();
            }
            Ok(state.included.get(&hash).copied())
        })
        .await
    }

    async fn block_root_with_new_tx_root(
        &self,
        transactions_root: Digest,
    ) -> Result<Digest, Error> {
        self.respond("block_root_with_new_tx_root", |state| {
            let root = fold(&state.tip().header().block_root(), &transactions_root);
            if state.advance_on_fold {
                state.seal();
            }
            Ok(root)
        })
        .await
    }

    async fn storage(&self, contract: Address, key: Bytes) -> Result<Option<Bytes>, Error> {
        self.respond("storage", |state| {
            Ok(state.storage.get(&(contract, key)).cloned())
        })
        .await
    }
}

/// A virtual clock.
///
/// Sleeping advances the clock by the requested duration once the sleep is first polled
/// and completes immediately.
#[derive(Clone)]
pub struct Clock {
    now: Arc<Mutex<SystemTime>>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }
}

impl crate::Clock for Clock {
    fn current(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send + 'static {
        let clock = self.clone();
        async move { clock.advance(duration) }
    }
}

/// A signer that can be told to refuse.
#[derive(Clone, Debug)]
pub struct RefusingSigner {
    key: PrivateKey,
    refuse: bool,
}

impl RefusingSigner {
    /// A signer that signs normally.
    pub fn willing(key: PrivateKey) -> Self {
        Self { key, refuse: false }
    }

    /// A signer that fails every request.
    pub fn refusing(key: PrivateKey) -> Self {
        Self { key, refuse: true }
    }
}

impl Signer for RefusingSigner {
    type Signature = Signature;
    type PublicKey = PublicKey;

    fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        if self.refuse {
            return Err(CryptoError::SigningFailed("wallet refused to sign".into()));
        }
        self.key.sign(message)
    }
}
