use std::{num::NonZeroUsize, time::Duration};

/// Configuration for the [crate::Driver].
#[derive(Clone, Debug)]
pub struct Config {
    /// Protocol version byte written into every transaction.
    pub version: u8,

    /// Gas price attached to native invocations.
    pub gas_price: u64,

    /// Number of threads used to collect signatures within a stage.
    ///
    /// With a value of one, signers are invoked sequentially on the caller's thread.
    pub concurrency: NonZeroUsize,

    /// Maximum time to wait for any single chain RPC call.
    pub rpc_timeout: Duration,

    /// Maximum time to wait for a submitted transaction to be included and confirmed.
    pub confirmation_timeout: Duration,

    /// Number of blocks (including the one containing the transaction) required before
    /// a transaction is considered confirmed.
    pub confirmations: u32,

    /// How often to poll the chain while waiting for confirmation.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 0,
            gas_price: 2_500,
            concurrency: NonZeroUsize::MIN,
            rpc_timeout: Duration::from_secs(10),
            confirmation_timeout: Duration::from_secs(30),
            confirmations: 1,
            poll_interval: Duration::from_secs(1),
        }
    }
}
