use crate::{
    address::GOVERNANCE,
    block::{Assembler, Consensus},
    chain::{wait_for_transaction, Chain, Clock},
    emergency::{Builder, Evidence, Reason, Request},
    threshold::Coordinator,
    transaction::{self, Param, Transaction},
    Config, Error, Registry, SignerSet, Wallet,
};
use bytes::Bytes;
use tracing::{debug, info, warn};
use vigil_codec::Encode;
use vigil_cryptography::{ed25519::PublicKey, sha256::Digest};
use vigil_utils::{union, SystemTimeExt};

/// Storage key prefix under which the governance contract records black-listed peers.
const BLACKLIST_PREFIX: &[u8] = b"blackList";

/// Builds, signs, submits and confirms governance actions against a [Chain].
pub struct Driver<C: Chain, K: Clock> {
    chain: C,
    clock: K,
    registry: Registry,
    coordinator: Coordinator,
    config: Config,
}

impl<C: Chain, K: Clock> Driver<C, K> {
    pub fn new(chain: C, clock: K, registry: Registry, config: Config) -> Result<Self, Error> {
        let coordinator = Coordinator::new(config.concurrency)?;
        Ok(Self {
            chain,
            clock,
            registry,
            coordinator,
            config,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Signs and submits the registered `action` on behalf of `set`, then waits for it to
    /// be confirmed. Returns the transaction hash.
    pub async fn invoke<W: Wallet>(
        &self,
        action: &str,
        params: Vec<Param>,
        set: &SignerSet,
        signers: &[W],
    ) -> Result<Digest, Error> {
        let transaction = self.sign(action, params, set, signers)?;
        let hash = self.submit(&transaction).await?;
        let height = wait_for_transaction(&self.chain, &self.clock, &self.config, hash).await?;
        info!(action, %hash, height, "action confirmed");
        Ok(hash)
    }

    /// Builds and signs the registered `action` without submitting it.
    pub fn sign<W: Wallet>(
        &self,
        action: &str,
        params: Vec<Param>,
        set: &SignerSet,
        signers: &[W],
    ) -> Result<Transaction, Error> {
        let resolved = self.registry.get(action)?;
        let contract = resolved.contract.to_string();
        let unsigned = transaction::Builder::new(contract, &resolved.method, set.address())
            .params(params)
            .version(self.config.version)
            .gas_price(self.config.gas_price)
            .gas_limit(resolved.gas_limit)
            .build(self.clock.current())?;
        debug!(
            action,
            method = %resolved.method,
            hash = %unsigned.hash(),
            nonce = unsigned.nonce(),
            "built transaction"
        );
        self.coordinator.sign_transaction(set, signers, unsigned)
    }

    /// Submits a signed transaction, returning its hash.
    ///
    /// Fails with [Error::HashMismatch] if the node hashes the transaction differently.
    pub async fn submit(&self, transaction: &Transaction) -> Result<Digest, Error> {
        let raw = Bytes::from(transaction.encode());
        let hash = self
            .clock
            .timeout(
                "send_raw_transaction",
                self.config.rpc_timeout,
                self.chain.send_raw_transaction(raw),
            )
            .await?;
        let local = transaction.hash();
        if hash != local {
            warn!(%local, remote = %hash, "node reported a different hash");
            return Err(Error::HashMismatch {
                local,
                remote: hash,
            });
        }
        info!(%hash, "submitted transaction");
        Ok(hash)
    }

    /// Returns whether the governance contract has black-listed `peer`.
    pub async fn blacklisted(&self, peer: &PublicKey) -> Result<bool, Error> {
        let key = Bytes::from(union(BLACKLIST_PREFIX, peer));
        let value = self
            .clock
            .timeout(
                "storage",
                self.config.rpc_timeout,
                self.chain.storage(GOVERNANCE, key),
            )
            .await?;
        Ok(value.is_some())
    }

    /// Assembles a candidate block carrying `transactions` and runs it through every
    /// emergency signing stage.
    #[allow(clippy::too_many_arguments)]
    pub async fn emergency<P: Wallet, A: Wallet, R: Wallet>(
        &self,
        reason: Reason,
        evidence: Evidence,
        transactions: Vec<Transaction>,
        consensus: Consensus,
        proposer: &P,
        admins: &SignerSet,
        signers: &[A],
        requester: &R,
    ) -> Result<Request, Error> {
        let assembler = Assembler::new(self.chain.clone(), self.clock.clone(), &self.config);
        let timestamp = self.clock.current().epoch_secs().min(u32::MAX as u64) as u32;
        let block = assembler
            .assemble(transactions, timestamp, consensus)
            .await?;
        info!(
            %reason,
            %evidence,
            height = block.height(),
            hash = %block.hash(),
            "assembled override candidate"
        );

        let mut builder = Builder::new(reason, evidence, block);
        builder.sign_proposer(proposer)?;
        builder.sign_quorum(&self.coordinator, admins, signers)?;
        builder.finalize(requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mocks, Stage};
    use futures::executor::block_on;
    use std::time::Duration;
    use vigil_codec::Decode;
    use vigil_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
    use vigil_utils::hex;

    fn signers(n: u64) -> (Vec<PrivateKey>, SignerSet) {
        let signers: Vec<_> = (0..n).map(PrivateKey::from_seed).collect();
        let set = SignerSet::new(signers.iter().map(|s| s.public_key()).collect()).unwrap();
        (signers, set)
    }

    fn driver(chain: &mocks::Chain, config: Config) -> Driver<mocks::Chain, mocks::Clock> {
        Driver::new(
            chain.clone(),
            mocks::Clock::default(),
            Registry::governance(),
            config,
        )
        .unwrap()
    }

    #[vigil_macros::test_traced]
    fn test_invoke() {
        let chain = mocks::Chain::new(0);
        chain.set_auto_seal(true);
        let driver = driver(&chain, Config::default());
        let (signers, set) = signers(4);
        let peer = PrivateKey::from_seed(100).public_key();

        let hash = block_on(driver.invoke(
            "black_node",
            vec![Param::Array(vec![Param::PublicKey(hex(&peer))])],
            &set,
            &signers[..3],
        ))
        .unwrap();

        let submitted = chain.submitted();
        assert_eq!(submitted.len(), 1);
        let tx = Transaction::decode_cfg(submitted[0].clone(), &Default::default()).unwrap();
        assert_eq!(tx.hash(), hash);
        assert_eq!(tx.unsigned().payer(), set.address());
        assert_eq!(tx.unsigned().invocation().method(), "blackNode");
        assert_eq!(tx.unsigned().invocation().contract(), GOVERNANCE);
        tx.signatures()[0]
            .verify(Stage::Transaction, &set, hash.as_ref())
            .unwrap();
    }

    #[vigil_macros::test_traced]
    fn test_invoke_times_out() {
        let chain = mocks::Chain::new(0);
        let config = Config {
            confirmation_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let driver = driver(&chain, config);
        let (signers, set) = signers(4);
        let result = block_on(driver.invoke("commit_dpos", vec![], &set, &signers[..3]));
        assert!(matches!(
            result,
            Err(Error::Timeout("wait_for_transaction", d)) if d == Duration::from_secs(5)
        ));
        assert_eq!(chain.submitted().len(), 1);
    }

    #[test]
    fn test_invoke_unknown_action() {
        let chain = mocks::Chain::new(0);
        let driver = driver(&chain, Config::default());
        let (signers, set) = signers(4);
        let result = block_on(driver.invoke("halt", vec![], &set, &signers));
        assert!(matches!(result, Err(Error::UnknownAction(_))));
        assert!(chain.submitted().is_empty());
    }

    #[test]
    fn test_invoke_quorum_unmet_never_submits() {
        let chain = mocks::Chain::new(0);
        let driver = driver(&chain, Config::default());
        let (signers, set) = signers(7);
        let result = block_on(driver.invoke("commit_dpos", vec![], &set, &signers[..4]));
        assert!(matches!(result, Err(Error::QuorumUnmet { got: 4, need: 5, .. })));
        assert!(chain.submitted().is_empty());
    }

    #[test]
    fn test_submit_unavailable() {
        let chain = mocks::Chain::new(0);
        let driver = driver(&chain, Config::default());
        let (signers, set) = signers(1);
        let transaction = driver.sign("commit_dpos", vec![], &set, &signers).unwrap();
        chain.set_unavailable(true);
        let err = block_on(driver.submit(&transaction)).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_submit_hash_mismatch() {
        let chain = mocks::Chain::new(0);
        chain.set_auto_seal(true);
        chain.set_misreport_hashes(true);
        let driver = driver(&chain, Config::default());
        let (signers, set) = signers(4);
        let transaction = driver.sign("commit_dpos", vec![], &set, &signers[..3]).unwrap();
        match block_on(driver.submit(&transaction)) {
            Err(Error::HashMismatch { local, remote }) => {
                assert_eq!(local, transaction.hash());
                assert_ne!(remote, local);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // Invoke stops before waiting on the reported hash
        let result = block_on(driver.invoke("commit_dpos", vec![], &set, &signers[..3]));
        assert!(matches!(result, Err(Error::HashMismatch { .. })));
        assert_eq!(chain.submitted().len(), 2);
    }

    #[test]
    fn test_blacklisted() {
        let chain = mocks::Chain::new(0);
        let driver = driver(&chain, Config::default());
        let peer = PrivateKey::from_seed(5).public_key();
        assert!(!block_on(driver.blacklisted(&peer)).unwrap());

        chain.set_storage(
            GOVERNANCE,
            Bytes::from(union(b"blackList", &peer)),
            Bytes::from_static(&[1]),
        );
        assert!(block_on(driver.blacklisted(&peer)).unwrap());
    }

    #[vigil_macros::test_traced(level = "DEBUG")]
    fn test_emergency() {
        let chain = mocks::Chain::new(0);
        chain.seal();
        let driver = driver(
            &chain,
            Config {
                concurrency: std::num::NonZeroUsize::new(2).unwrap(),
                ..Default::default()
            },
        );
        let (admins, set) = signers(7);
        let request = block_on(driver.emergency(
            Reason::Blacklist,
            Evidence::ConsensusStalled,
            vec![],
            Consensus::default(),
            &PrivateKey::from_seed(50),
            &set,
            &admins[..5],
            &admins[0],
        ))
        .unwrap();
        assert_eq!(request.height(), 2);
        assert_eq!(request.groups()[0].len(), 5);
        crate::emergency::Verifier::new(set)
            .require_admin_requester(true)
            .verify(&request)
            .unwrap();
    }
}
