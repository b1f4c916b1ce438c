//! Candidate blocks and their assembly from a chain tip.

use crate::{
    chain::{Chain, Clock},
    merkle,
    transaction::Transaction,
    wire::{read_count, read_var, var_size, write_var, Limits},
    Address, Config, Error,
};
use bytes::{Buf, BufMut, Bytes};
use std::time::Duration;
use tracing::debug;
use vigil_codec::{
    varint, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, Write,
};
use vigil_cryptography::{double_hash, ed25519::PublicKey, sha256::Digest};

/// The last block the chain agreed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tip {
    pub height: u32,
    pub hash: Digest,
    pub timestamp: u32,
}

impl From<&Header> for Tip {
    fn from(header: &Header) -> Self {
        Self {
            height: header.height,
            hash: header.hash,
            timestamp: header.timestamp,
        }
    }
}

/// Consensus fields of a candidate header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Consensus {
    /// Opaque consensus payload.
    pub payload: Bytes,

    /// Consensus nonce (written as the header's consensus data).
    pub nonce: u64,

    /// Bookkeeper expected to produce the next block.
    pub next_bookkeeper: Address,
}

/// A block header.
///
/// The hash covers every field up to and including the next bookkeeper. Bookkeeper keys
/// and signatures are written after it and do not affect the hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    version: u32,
    prev_hash: Digest,
    transactions_root: Digest,
    block_root: Digest,
    timestamp: u32,
    height: u32,
    consensus: Consensus,
    bookkeepers: Vec<PublicKey>,
    signatures: Vec<Bytes>,

    hash: Digest,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        version: u32,
        prev_hash: Digest,
        transactions_root: Digest,
        block_root: Digest,
        timestamp: u32,
        height: u32,
        consensus: Consensus,
    ) -> Self {
        let mut header = Self {
            version,
            prev_hash,
            transactions_root,
            block_root,
            timestamp,
            height,
            consensus,
            bookkeepers: Vec::new(),
            signatures: Vec::new(),
            hash: Digest::zero(),
        };
        header.hash = header.compute_hash();
        header
    }

    fn compute_hash(&self) -> Digest {
        let mut buf = Vec::with_capacity(self.unsigned_size());
        self.write_unsigned(&mut buf);
        double_hash(&buf)
    }

    fn write_unsigned(&self, buf: &mut impl BufMut) {
        self.version.write(buf);
        self.prev_hash.write(buf);
        self.transactions_root.write(buf);
        self.block_root.write(buf);
        self.timestamp.write(buf);
        self.height.write(buf);
        self.consensus.nonce.write(buf);
        self.consensus.payload.write(buf);
        self.consensus.next_bookkeeper.write(buf);
    }

    fn unsigned_size(&self) -> usize {
        u32::SIZE
            + Digest::SIZE * 3
            + u32::SIZE
            + u32::SIZE
            + u64::SIZE
            + self.consensus.payload.encode_size()
            + Address::SIZE
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn prev_hash(&self) -> Digest {
        self.prev_hash
    }

    /// Merkle root of the block's transaction hashes.
    pub fn transactions_root(&self) -> Digest {
        self.transactions_root
    }

    /// Chain-wide root after folding in this block's transactions root.
    pub fn block_root(&self) -> Digest {
        self.block_root
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn consensus(&self) -> &Consensus {
        &self.consensus
    }

    pub fn bookkeepers(&self) -> &[PublicKey] {
        &self.bookkeepers
    }

    pub fn signatures(&self) -> &[Bytes] {
        &self.signatures
    }

    pub fn hash(&self) -> Digest {
        self.hash
    }
}

impl Write for Header {
    fn write(&self, buf: &mut impl BufMut) {
        self.write_unsigned(buf);
        varint::write(self.bookkeepers.len() as u64, buf);
        for bookkeeper in &self.bookkeepers {
            write_var(bookkeeper, buf);
        }
        self.signatures.write(buf);
    }
}

impl EncodeSize for Header {
    fn encode_size(&self) -> usize {
        self.unsigned_size()
            + varint::size(self.bookkeepers.len() as u64)
            + self.bookkeepers.len() * var_size::<PublicKey>()
            + self.signatures.encode_size()
    }
}

impl Read for Header {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let version = u32::read(buf)?;
        let prev_hash = Digest::read(buf)?;
        let transactions_root = Digest::read(buf)?;
        let block_root = Digest::read(buf)?;
        let timestamp = u32::read(buf)?;
        let height = u32::read(buf)?;
        let nonce = u64::read(buf)?;
        let payload = Bytes::read_cfg(buf, &RangeCfg::new(..=limits.max_payload))?;
        let next_bookkeeper = Address::read(buf)?;
        let mut header = Self::new(
            version,
            prev_hash,
            transactions_root,
            block_root,
            timestamp,
            height,
            Consensus {
                payload,
                nonce,
                next_bookkeeper,
            },
        );

        let count = read_count(buf, limits.max_signers)?;
        header.bookkeepers = Vec::with_capacity(count);
        for _ in 0..count {
            header.bookkeepers.push(read_var(buf)?);
        }
        header.signatures = Vec::<Bytes>::read_cfg(
            buf,
            &(
                RangeCfg::new(..=limits.max_signers),
                RangeCfg::new(..=limits.max_param_size),
            ),
        )?;
        Ok(header)
    }
}

/// A header and its ordered transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Builds the block extending `tip`.
    ///
    /// The transactions root is computed here from `transactions`, so it always matches
    /// the list the block carries. `timestamp` is bumped to one second past the tip if
    /// it does not already exceed it.
    ///
    /// Fails with [Error::InvalidTip] if the tip leaves no room for a successor height or
    /// timestamp.
    pub fn extend(
        tip: &Tip,
        version: u32,
        timestamp: u32,
        block_root: Digest,
        consensus: Consensus,
        transactions: Vec<Transaction>,
    ) -> Result<Self, Error> {
        let height = tip.height.checked_add(1).ok_or(Error::InvalidTip {
            height: tip.height,
            reason: "height exhausted",
        })?;
        let timestamp = if timestamp > tip.timestamp {
            timestamp
        } else {
            tip.timestamp.checked_add(1).ok_or(Error::InvalidTip {
                height: tip.height,
                reason: "timestamp exhausted",
            })?
        };
        let header = Header::new(
            version,
            tip.hash,
            transactions_root(&transactions),
            block_root,
            timestamp,
            height,
            consensus,
        );
        Ok(Self {
            header,
            transactions,
        })
    }

    /// Builds a block with no parent.
    pub fn genesis(timestamp: u32) -> Self {
        let header = Header::new(
            0,
            Digest::zero(),
            merkle::root(&[]),
            Digest::zero(),
            timestamp,
            0,
            Consensus::default(),
        );
        Self {
            header,
            transactions: Vec::new(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Hash of the header.
    pub fn hash(&self) -> Digest {
        self.header.hash
    }
}

/// Merkle root over the hashes of `transactions`.
pub fn transactions_root(transactions: &[Transaction]) -> Digest {
    let hashes: Vec<Digest> = transactions.iter().map(Transaction::hash).collect();
    merkle::root(&hashes)
}

impl Write for Block {
    fn write(&self, buf: &mut impl BufMut) {
        self.header.write(buf);
        (self.transactions.len() as u32).write(buf);
        for transaction in &self.transactions {
            transaction.write(buf);
        }
    }
}

impl EncodeSize for Block {
    fn encode_size(&self) -> usize {
        self.header.encode_size()
            + u32::SIZE
            + self
                .transactions
                .iter()
                .map(EncodeSize::encode_size)
                .sum::<usize>()
    }
}

impl Read for Block {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let header = Header::read_cfg(buf, limits)?;
        let count = u32::read(buf)? as usize;
        if count > limits.max_transactions {
            return Err(CodecError::InvalidLength(count));
        }
        let mut transactions = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            transactions.push(Transaction::read_cfg(buf, limits)?);
        }
        Ok(Self {
            header,
            transactions,
        })
    }
}

/// Builds candidate blocks extending the current chain tip.
pub struct Assembler<C: Chain, K: Clock> {
    chain: C,
    clock: K,
    version: u32,
    rpc_timeout: Duration,
}

impl<C: Chain, K: Clock> Assembler<C, K> {
    pub fn new(chain: C, clock: K, config: &Config) -> Self {
        Self {
            chain,
            clock,
            version: 0,
            rpc_timeout: config.rpc_timeout,
        }
    }

    /// Sets the header version of assembled blocks.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Assembles a candidate at `tip + 1` carrying `transactions`.
    ///
    /// Fails with [Error::StaleTip] if the chain advances while the block root is being
    /// folded.
    pub async fn assemble(
        &self,
        transactions: Vec<Transaction>,
        timestamp: u32,
        consensus: Consensus,
    ) -> Result<Block, Error> {
        // Read the tip
        let height = self
            .clock
            .timeout("current_height", self.rpc_timeout, self.chain.current_height())
            .await?;
        let tip = self
            .clock
            .timeout(
                "block_by_height",
                self.rpc_timeout,
                self.chain.block_by_height(height),
            )
            .await?
            .ok_or_else(|| {
                Error::RemoteUnavailable("block_by_height", format!("block {height} not found"))
            })?;
        let tip = Tip::from(tip.header());

        // Fold the new transactions root into the chain root
        let root = transactions_root(&transactions);
        let block_root = self
            .clock
            .timeout(
                "block_root_with_new_tx_root",
                self.rpc_timeout,
                self.chain.block_root_with_new_tx_root(root),
            )
            .await?;

        // The fold is only valid against the tip it was computed on
        let found = self
            .clock
            .timeout("current_height", self.rpc_timeout, self.chain.current_height())
            .await?;
        if found != tip.height {
            return Err(Error::StaleTip {
                expected: tip.height,
                found,
            });
        }

        let block = Block::extend(
            &tip,
            self.version,
            timestamp,
            block_root,
            consensus,
            transactions,
        )?;
        debug!(
            height = block.height(),
            hash = %block.hash(),
            transactions = block.transactions().len(),
            "assembled candidate block"
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use futures::executor::block_on;
    use vigil_codec::{Decode, Encode};
    use vigil_cryptography::hash;

    fn consensus() -> Consensus {
        Consensus {
            payload: Bytes::from_static(b"override"),
            nonce: 42,
            next_bookkeeper: Address::native(9),
        }
    }

    #[test]
    fn test_extend() {
        let genesis = Block::genesis(100);
        let tip = Tip::from(genesis.header());
        let block = Block::extend(&tip, 0, 150, hash(b"root"), consensus(), vec![]).unwrap();
        assert_eq!(block.height(), 1);
        assert_eq!(block.header().prev_hash(), genesis.hash());
        assert_eq!(block.header().timestamp(), 150);
        assert_eq!(block.header().transactions_root(), Digest::zero());
        assert!(block.header().bookkeepers().is_empty());
        assert!(block.header().signatures().is_empty());
    }

    #[test]
    fn test_timestamp_bumped() {
        let tip = Tip::from(Block::genesis(100).header());
        for timestamp in [0, 99, 100] {
            let block =
                Block::extend(&tip, 0, timestamp, Digest::zero(), consensus(), vec![]).unwrap();
            assert_eq!(block.header().timestamp(), 101);
        }
    }

    #[test]
    fn test_extend_exhausted_tip() {
        let tip = Tip {
            height: u32::MAX,
            hash: hash(b"tip"),
            timestamp: 100,
        };
        assert!(matches!(
            Block::extend(&tip, 0, 200, Digest::zero(), consensus(), vec![]),
            Err(Error::InvalidTip {
                height: u32::MAX,
                reason: "height exhausted"
            })
        ));

        // No timestamp exceeds the tip's
        let tip = Tip {
            height: 7,
            hash: hash(b"tip"),
            timestamp: u32::MAX,
        };
        for timestamp in [0, u32::MAX] {
            let err = Block::extend(&tip, 0, timestamp, Digest::zero(), consensus(), vec![])
                .unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidTip {
                    height: 7,
                    reason: "timestamp exhausted"
                }
            ));
            assert!(!err.is_retryable());
        }

        // One below the limit still extends
        let tip = Tip {
            height: u32::MAX - 1,
            hash: hash(b"tip"),
            timestamp: u32::MAX - 1,
        };
        let block = Block::extend(&tip, 0, 0, Digest::zero(), consensus(), vec![]).unwrap();
        assert_eq!(block.height(), u32::MAX);
        assert_eq!(block.header().timestamp(), u32::MAX);
    }

    #[test]
    fn test_hash_excludes_bookkeepers() {
        let tip = Tip::from(Block::genesis(0).header());
        let block = Block::extend(&tip, 0, 1, Digest::zero(), consensus(), vec![]).unwrap();
        let mut signed = block.header().clone();
        signed.signatures.push(Bytes::from_static(b"sig"));
        assert_eq!(signed.compute_hash(), block.hash());

        // Consensus fields are covered
        let other = Block::extend(
            &tip,
            0,
            1,
            Digest::zero(),
            Consensus {
                nonce: 43,
                ..consensus()
            },
            vec![],
        )
        .unwrap();
        assert_ne!(other.hash(), block.hash());
    }

    #[test]
    fn test_codec() {
        let tip = Tip::from(Block::genesis(0).header());
        let block = Block::extend(&tip, 1, 7, hash(b"root"), consensus(), vec![]).unwrap();
        let encoded = block.encode();
        assert_eq!(encoded.len(), block.encode_size());

        // version, prev, tx root, block root, timestamp, height, nonce
        let fixed = 4 + 32 * 3 + 4 + 4 + 8;
        assert_eq!(&encoded[..4], &1u32.to_le_bytes());
        assert_eq!(&encoded[4..36], block.header().prev_hash().as_ref());
        assert_eq!(&encoded[fixed - 16..fixed - 12], &7u32.to_le_bytes());
        assert_eq!(&encoded[fixed - 12..fixed - 8], &1u32.to_le_bytes());
        assert_eq!(&encoded[fixed - 8..fixed], &42u64.to_le_bytes());
        assert_eq!(encoded[fixed], 8);

        // no bookkeepers, no signatures, no transactions
        assert_eq!(&encoded[encoded.len() - 6..], &[0, 0, 0, 0, 0, 0]);

        let decoded = Block::decode_cfg(encoded, &Limits::default()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }

    #[test]
    fn test_codec_limits() {
        let tip = Tip::from(Block::genesis(0).header());
        let block = Block::extend(&tip, 0, 1, Digest::zero(), consensus(), vec![]).unwrap();
        let limits = Limits {
            max_payload: 4,
            ..Default::default()
        };
        assert!(matches!(
            Block::decode_cfg(block.encode(), &limits),
            Err(CodecError::InvalidLength(8))
        ));
    }

    #[test]
    fn test_assemble() {
        let chain = mocks::Chain::new(1_000);
        chain.seal();
        chain.seal();
        let clock = mocks::Clock::default();
        let tip = block_on(chain.block_by_height(2)).unwrap().unwrap();

        let assembler = Assembler::new(chain.clone(), clock, &Config::default());
        let block = block_on(assembler.assemble(vec![], 0, consensus())).unwrap();
        assert_eq!(block.height(), 3);
        assert_eq!(block.header().prev_hash(), tip.hash());
        assert_eq!(block.header().timestamp(), tip.header().timestamp() + 1);
        assert_eq!(
            block.header().block_root(),
            mocks::fold(&tip.header().block_root(), &Digest::zero())
        );
    }

    #[test]
    fn test_assemble_unavailable() {
        let chain = mocks::Chain::new(0);
        chain.set_unavailable(true);
        let assembler = Assembler::new(chain, mocks::Clock::default(), &Config::default());
        let err = block_on(assembler.assemble(vec![], 0, consensus())).unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable("current_height", _)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_assemble_stale_tip() {
        let chain = mocks::Chain::new(0);
        chain.set_advance_on_fold(true);
        let assembler = Assembler::new(chain, mocks::Clock::default(), &Config::default());
        let err = block_on(assembler.assemble(vec![], 0, consensus())).unwrap_err();
        assert!(matches!(
            err,
            Error::StaleTip {
                expected: 0,
                found: 1
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_assemble_timeout() {
        let chain = mocks::Chain::new(0);
        chain.set_hang(true);
        let config = Config::default();
        let assembler = Assembler::new(chain, mocks::Clock::default(), &config);
        let err = block_on(assembler.assemble(vec![], 0, consensus())).unwrap_err();
        assert!(matches!(err, Error::Timeout("current_height", d) if d == config.rpc_timeout));
    }

    #[test]
    fn test_assemble_exhausted_tip() {
        let chain = mocks::Chain::new(u32::MAX);
        let assembler = Assembler::new(chain, mocks::Clock::default(), &Config::default());
        let err = block_on(assembler.assemble(vec![], u32::MAX, consensus())).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTip {
                height: 0,
                reason: "timestamp exhausted"
            }
        ));
    }
}
