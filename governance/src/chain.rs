//! Interfaces to the chain and to time, plus bounded waiting for inclusion.
//!
//! Every remote call may suspend. Callers wrap each call in [Clock::timeout] and never
//! retry implicitly: a call that does not complete in time surfaces as [Error::Timeout].

use crate::{block::Block, Address, Config, Error};
use bytes::Bytes;
use futures::future::{select, Either};
use std::{
    future::Future,
    pin::pin,
    time::{Duration, SystemTime},
};
use tracing::{debug, warn};
use vigil_cryptography::sha256::Digest;

/// Read and write access to a chain node.
///
/// Implementations report connectivity failures as [Error::RemoteUnavailable].
pub trait Chain: Clone + Send + Sync + 'static {
    /// Height of the latest block.
    fn current_height(&self) -> impl Future<Output = Result<u32, Error>> + Send;

    /// Block at `height`, if the node has it.
    fn block_by_height(
        &self,
        height: u32,
    ) -> impl Future<Output = Result<Option<Block>, Error>> + Send;

    /// Submits an encoded transaction, returning its hash.
    fn send_raw_transaction(
        &self,
        transaction: Bytes,
    ) -> impl Future<Output = Result<Digest, Error>> + Send;

    /// Height of the block that included the transaction `hash`, if any.
    fn transaction_height(
        &self,
        hash: Digest,
    ) -> impl Future<Output = Result<Option<u32>, Error>> + Send;

    /// Chain root after folding a new transactions root into the current one.
    fn block_root_with_new_tx_root(
        &self,
        transactions_root: Digest,
    ) -> impl Future<Output = Result<Digest, Error>> + Send;

    /// Value stored under `key` by `contract`, if any.
    fn storage(
        &self,
        contract: Address,
        key: Bytes,
    ) -> impl Future<Output = Result<Option<Bytes>, Error>> + Send;
}

/// Interface to time.
///
/// It is necessary to mock time to test waiting deterministically.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Returns the current time.
    fn current(&self) -> SystemTime;

    /// Sleep for the given duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send + 'static;

    /// Await `future`, returning [Error::Timeout] naming `operation` if it does not
    /// complete within `duration`.
    fn timeout<F, T>(
        &self,
        operation: &'static str,
        duration: Duration,
        future: F,
    ) -> impl Future<Output = Result<T, Error>> + Send
    where
        F: Future<Output = Result<T, Error>> + Send,
        T: Send,
    {
        let sleep = self.sleep(duration);
        async move {
            match select(pin!(future), pin!(sleep)).await {
                Either::Left((result, _)) => result,
                Either::Right(_) => {
                    warn!(operation, ?duration, "timed out");
                    Err(Error::Timeout(operation, duration))
                }
            }
        }
    }
}

/// [Clock] backed by the system clock and `tokio` timers.
///
/// [TokioClock::sleep] must be awaited from within a `tokio` runtime with time enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn current(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send + 'static {
        tokio::time::sleep(duration)
    }
}

/// Waits for `hash` to be included and confirmed, returning the inclusion height.
///
/// A transaction included at height `h` is confirmed once the chain reaches
/// `h + confirmations - 1`. Polls every `config.poll_interval` until
/// `config.confirmation_timeout` elapses.
pub async fn wait_for_transaction<C: Chain, K: Clock>(
    chain: &C,
    clock: &K,
    config: &Config,
    hash: Digest,
) -> Result<u32, Error> {
    let deadline = clock.current() + config.confirmation_timeout;
    let extra = config.confirmations.max(1) - 1;
    loop {
        let included = clock
            .timeout(
                "transaction_height",
                config.rpc_timeout,
                chain.transaction_height(hash),
            )
            .await?;
        if let Some(height) = included {
            let current = clock
                .timeout("current_height", config.rpc_timeout, chain.current_height())
                .await?;
            if current >= height.saturating_add(extra) {
                debug!(%hash, height, current, "transaction confirmed");
                return Ok(height);
            }
        }
        if clock.current() >= deadline {
            warn!(%hash, timeout = ?config.confirmation_timeout, "transaction not confirmed");
            return Err(Error::Timeout(
                "wait_for_transaction",
                config.confirmation_timeout,
            ));
        }
        clock.sleep(config.poll_interval).await;
    }
}

/// Waits for the chain to reach `height`, returning the height observed.
pub async fn wait_for_blocks<C: Chain, K: Clock>(
    chain: &C,
    clock: &K,
    config: &Config,
    height: u32,
) -> Result<u32, Error> {
    let deadline = clock.current() + config.confirmation_timeout;
    loop {
        let current = clock
            .timeout("current_height", config.rpc_timeout, chain.current_height())
            .await?;
        if current >= height {
            return Ok(current);
        }
        if clock.current() >= deadline {
            warn!(current, target = height, "chain did not advance");
            return Err(Error::Timeout("wait_for_blocks", config.confirmation_timeout));
        }
        clock.sleep(config.poll_interval).await;
    }
}
