//! Native-contract invocation transactions.
//!
//! An [UnsignedTransaction] is hashed once at construction (double SHA-256 of its
//! encoding) and never mutated afterwards. Signatures are attached by wrapping it in a
//! [Transaction] (see [crate::threshold::Coordinator::sign_transaction]).

use crate::{threshold::AggregateSignature, wire::Limits, Address, Error};
use bytes::{Buf, BufMut, Bytes};
use std::time::SystemTime;
use vigil_codec::{
    varint, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, VarUint, Write,
};
use vigil_cryptography::{double_hash, ed25519::PublicKey, sha256::Digest};
use vigil_utils::{from_hex_formatted, SystemTimeExt};

/// Transaction type of a native-contract invocation.
pub const INVOKE: u8 = 0xd1;

/// Default gas limit for governance invocations.
pub const DEFAULT_GAS_LIMIT: u64 = 20_000;

/// A typed invocation parameter.
///
/// Each parameter is encoded as a one-byte tag followed by its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Param {
    /// Raw bytes (`0x00 ‖ varBytes`).
    Bytes(Bytes),
    /// UTF-8 string (`0x01 ‖ varBytes`).
    Str(String),
    /// Unsigned integer (`0x02 ‖ u64`).
    Int(u64),
    /// Boolean (`0x03 ‖ u8`).
    Bool(bool),
    /// Hex-encoded address (`0x04 ‖ 20 bytes`).
    Address(String),
    /// Hex-encoded ed25519 public key (`0x05 ‖ 32 bytes`).
    PublicKey(String),
    /// Nested parameters (`0x06 ‖ VarUint(n) ‖ params`).
    Array(Vec<Param>),
}

impl Param {
    const BYTES: u8 = 0x00;
    const STR: u8 = 0x01;
    const INT: u8 = 0x02;
    const BOOL: u8 = 0x03;
    const ADDRESS: u8 = 0x04;
    const PUBLIC_KEY: u8 = 0x05;
    const ARRAY: u8 = 0x06;

    /// Encodes the parameter.
    ///
    /// Returns the reason encoding failed, if any.
    pub fn encode(&self) -> Result<Bytes, String> {
        let mut buf = Vec::new();
        self.write_into(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn write_into(&self, buf: &mut Vec<u8>) -> Result<(), String> {
        match self {
            Self::Bytes(value) => {
                buf.put_u8(Self::BYTES);
                value.write(buf);
            }
            Self::Str(value) => {
                buf.put_u8(Self::STR);
                Bytes::copy_from_slice(value.as_bytes()).write(buf);
            }
            Self::Int(value) => {
                buf.put_u8(Self::INT);
                value.write(buf);
            }
            Self::Bool(value) => {
                buf.put_u8(Self::BOOL);
                value.write(buf);
            }
            Self::Address(value) => {
                let address: Address = value.parse().map_err(|err: Error| err.to_string())?;
                buf.put_u8(Self::ADDRESS);
                address.write(buf);
            }
            Self::PublicKey(value) => {
                let raw = from_hex_formatted(value)
                    .ok_or_else(|| format!("public key {value:?} is not hex"))?;
                let key = PublicKey::try_from(&raw[..])
                    .map_err(|err| format!("invalid public key: {err}"))?;
                buf.put_u8(Self::PUBLIC_KEY);
                key.write(buf);
            }
            Self::Array(values) => {
                buf.put_u8(Self::ARRAY);
                VarUint(values.len() as u64).write(buf);
                for (index, value) in values.iter().enumerate() {
                    value
                        .write_into(buf)
                        .map_err(|reason| format!("element {index}: {reason}"))?;
                }
            }
        }
        Ok(())
    }
}

/// The contract call carried by a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    contract: Address,
    method: String,
    params: Vec<Bytes>,
}

impl Invocation {
    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Encoded parameters, in call order.
    pub fn params(&self) -> &[Bytes] {
        &self.params
    }
}

impl Write for Invocation {
    fn write(&self, buf: &mut impl BufMut) {
        self.contract.write(buf);
        varint::write(self.method.len() as u64, buf);
        buf.put_slice(self.method.as_bytes());
        self.params.write(buf);
    }
}

impl EncodeSize for Invocation {
    fn encode_size(&self) -> usize {
        Address::SIZE
            + varint::size(self.method.len() as u64)
            + self.method.len()
            + self.params.encode_size()
    }
}

impl Read for Invocation {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let contract = Address::read(buf)?;
        let method = Bytes::read_cfg(buf, &RangeCfg::new(1..=limits.max_method))?;
        let method = String::from_utf8(method.to_vec())
            .map_err(|_| CodecError::Invalid("Invocation", "method is not utf-8"))?;
        let params = Vec::<Bytes>::read_cfg(
            buf,
            &(
                RangeCfg::new(..=limits.max_params),
                RangeCfg::new(..=limits.max_param_size),
            ),
        )?;
        Ok(Self {
            contract,
            method,
            params,
        })
    }
}

/// A native-contract invocation awaiting signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    version: u8,
    nonce: u32,
    gas_price: u64,
    gas_limit: u64,
    payer: Address,
    invocation: Invocation,

    hash: Digest,
}

impl UnsignedTransaction {
    fn new(
        version: u8,
        nonce: u32,
        gas_price: u64,
        gas_limit: u64,
        payer: Address,
        invocation: Invocation,
    ) -> Self {
        let mut tx = Self {
            version,
            nonce,
            gas_price,
            gas_limit,
            payer,
            invocation,
            hash: Digest::zero(),
        };
        let mut buf = Vec::with_capacity(tx.encode_size());
        tx.write(&mut buf);
        tx.hash = double_hash(&buf);
        tx
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn payer(&self) -> Address {
        self.payer
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Double SHA-256 of the encoding. This is the message every signer signs.
    pub fn hash(&self) -> Digest {
        self.hash
    }
}

impl Write for UnsignedTransaction {
    fn write(&self, buf: &mut impl BufMut) {
        self.version.write(buf);
        INVOKE.write(buf);
        self.nonce.write(buf);
        self.gas_price.write(buf);
        self.gas_limit.write(buf);
        self.payer.write(buf);
        self.invocation.write(buf);

        // No attributes
        VarUint(0).write(buf);
    }
}

impl EncodeSize for UnsignedTransaction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + u8::SIZE
            + u32::SIZE
            + u64::SIZE
            + u64::SIZE
            + Address::SIZE
            + self.invocation.encode_size()
            + varint::size(0)
    }
}

impl Read for UnsignedTransaction {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let version = u8::read(buf)?;
        let kind = u8::read(buf)?;
        if kind != INVOKE {
            return Err(CodecError::InvalidEnum("UnsignedTransaction", kind));
        }
        let nonce = u32::read(buf)?;
        let gas_price = u64::read(buf)?;
        let gas_limit = u64::read(buf)?;
        let payer = Address::read(buf)?;
        let invocation = Invocation::read_cfg(buf, limits)?;
        if varint::read(buf)? != 0 {
            return Err(CodecError::Invalid(
                "UnsignedTransaction",
                "attributes are not supported",
            ));
        }
        Ok(Self::new(
            version, nonce, gas_price, gas_limit, payer, invocation,
        ))
    }
}

/// An [UnsignedTransaction] with its aggregate signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    unsigned: UnsignedTransaction,
    signatures: Vec<AggregateSignature>,
}

impl Transaction {
    pub(crate) fn new(unsigned: UnsignedTransaction, signatures: Vec<AggregateSignature>) -> Self {
        Self {
            unsigned,
            signatures,
        }
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signatures(&self) -> &[AggregateSignature] {
        &self.signatures
    }

    /// Hash of the unsigned transaction. Signatures do not change it.
    pub fn hash(&self) -> Digest {
        self.unsigned.hash()
    }
}

impl Write for Transaction {
    fn write(&self, buf: &mut impl BufMut) {
        self.unsigned.write(buf);
        self.signatures.write(buf);
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.unsigned.encode_size() + self.signatures.encode_size()
    }
}

impl Read for Transaction {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let unsigned = UnsignedTransaction::read_cfg(buf, limits)?;
        let signatures = Vec::<AggregateSignature>::read_cfg(
            buf,
            &(RangeCfg::new(..=limits.max_groups), limits.clone()),
        )?;
        Ok(Self {
            unsigned,
            signatures,
        })
    }
}

/// Builds an [UnsignedTransaction] invoking a native contract.
#[derive(Clone, Debug)]
pub struct Builder {
    contract: String,
    method: String,
    payer: Address,
    params: Vec<Param>,
    version: u8,
    gas_price: u64,
    gas_limit: u64,
    nonce: Option<u32>,
    limits: Limits,
}

impl Builder {
    /// Starts an invocation of `method` on the contract at `contract` (hex), paid for by `payer`.
    pub fn new(contract: impl Into<String>, method: impl Into<String>, payer: Address) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            payer,
            params: Vec::new(),
            version: 0,
            gas_price: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            nonce: None,
            limits: Limits::default(),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Overrides the time-derived nonce.
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Builds the transaction.
    ///
    /// Unless overridden, the nonce is the millisecond timestamp of `now` truncated to
    /// 32 bits. Two transactions built in the same millisecond share a nonce.
    pub fn build(self, now: SystemTime) -> Result<UnsignedTransaction, Error> {
        let contract: Address = self.contract.parse()?;
        if self.method.is_empty() {
            return Err(Error::Method("method name is empty".into()));
        }
        if self.method.len() > self.limits.max_method {
            return Err(Error::Method(format!(
                "method name is {} bytes (max {})",
                self.method.len(),
                self.limits.max_method
            )));
        }
        if self.params.len() > self.limits.max_params {
            return Err(Error::Parameter(
                self.limits.max_params,
                format!("too many parameters (max {})", self.limits.max_params),
            ));
        }
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let encoded = param
                    .encode()
                    .map_err(|reason| Error::Parameter(index, reason))?;
                if encoded.len() > self.limits.max_param_size {
                    return Err(Error::Parameter(
                        index,
                        format!(
                            "encoded to {} bytes (max {})",
                            encoded.len(),
                            self.limits.max_param_size
                        ),
                    ));
                }
                Ok(encoded)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let nonce = self.nonce.unwrap_or(now.epoch_millis() as u32);
        Ok(UnsignedTransaction::new(
            self.version,
            nonce,
            self.gas_price,
            self.gas_limit,
            self.payer,
            Invocation {
                contract,
                method: self.method,
                params,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::GOVERNANCE;
    use std::time::{Duration, UNIX_EPOCH};
    use test_case::test_case;
    use vigil_codec::{Decode, Encode};
    use vigil_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};
    use vigil_utils::hex;

    const GOVERNANCE_HEX: &str = "0000000000000000000000000000000000000007";

    fn payer() -> Address {
        Address::from_public_key(&PrivateKey::from_seed(0).public_key())
    }

    #[test]
    fn test_build() {
        let peer = PrivateKey::from_seed(1).public_key();
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        let tx = Builder::new(GOVERNANCE_HEX, "blackNode", payer())
            .param(Param::Array(vec![Param::PublicKey(hex(&peer))]))
            .gas_price(500)
            .build(now)
            .unwrap();
        assert_eq!(tx.invocation().contract(), GOVERNANCE);
        assert_eq!(tx.invocation().method(), "blackNode");
        assert_eq!(tx.nonce(), 1_700_000_000_123u64 as u32);
        assert_eq!(tx.gas_price(), 500);
        assert_eq!(tx.gas_limit(), DEFAULT_GAS_LIMIT);

        // Array of one public key
        let param = &tx.invocation().params()[0];
        assert_eq!(param[0], Param::ARRAY);
        assert_eq!(param[1], 1);
        assert_eq!(param[2], Param::PUBLIC_KEY);
        assert_eq!(&param[3..], peer.as_ref());
    }

    #[test]
    fn test_nonce_override() {
        let build = |nonce| {
            Builder::new(GOVERNANCE_HEX, "commitDpos", payer())
                .nonce(nonce)
                .build(UNIX_EPOCH)
                .unwrap()
        };
        assert_eq!(build(7).nonce(), 7);
        assert_eq!(build(7).hash(), build(7).hash());
        assert_ne!(build(7).hash(), build(8).hash());
    }

    #[test]
    fn test_invalid_contract() {
        let result = Builder::new("0xnot-hex", "blackNode", payer()).build(UNIX_EPOCH);
        assert!(matches!(result, Err(Error::Address(_))));
    }

    #[test_case(""; "empty")]
    #[test_case(&"m".repeat(257); "oversized")]
    fn test_invalid_method(method: &str) {
        let result = Builder::new(GOVERNANCE_HEX, method, payer()).build(UNIX_EPOCH);
        assert!(matches!(result, Err(Error::Method(_))));
    }

    #[test]
    fn test_invalid_parameter() {
        let result = Builder::new(GOVERNANCE_HEX, "blackNode", payer())
            .param(Param::Int(1))
            .param(Param::PublicKey("abcd".into()))
            .build(UNIX_EPOCH);
        match result {
            Err(Error::Parameter(index, _)) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }

        // Nested failures report the top-level index
        let result = Builder::new(GOVERNANCE_HEX, "blackNode", payer())
            .param(Param::Array(vec![Param::Address("07".into())]))
            .build(UNIX_EPOCH);
        match result {
            Err(Error::Parameter(index, reason)) => {
                assert_eq!(index, 0);
                assert!(reason.starts_with("element 0"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_parameter() {
        let limits = Limits {
            max_param_size: 8,
            ..Default::default()
        };
        let result = Builder::new(GOVERNANCE_HEX, "updateConfig", payer())
            .limits(limits)
            .param(Param::Bytes(Bytes::from(vec![0; 16])))
            .build(UNIX_EPOCH);
        assert!(matches!(result, Err(Error::Parameter(0, _))));
    }

    #[test]
    fn test_param_encoding() {
        assert_eq!(&Param::Int(1).encode().unwrap()[..], &[2, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&Param::Bool(true).encode().unwrap()[..], &[3, 1]);
        assert_eq!(&Param::Str("ok".into()).encode().unwrap()[..], &[1, 2, b'o', b'k']);
        assert_eq!(
            &Param::Bytes(Bytes::from_static(&[9])).encode().unwrap()[..],
            &[0, 1, 9]
        );
        let address = Param::Address(format!("0x{GOVERNANCE_HEX}")).encode().unwrap();
        assert_eq!(address[0], 4);
        assert_eq!(&address[1..], GOVERNANCE.as_ref());
    }

    #[test]
    fn test_wire_format() {
        let tx = Builder::new(GOVERNANCE_HEX, "m", payer())
            .version(1)
            .nonce(0x0102_0304)
            .gas_price(5)
            .gas_limit(6)
            .build(UNIX_EPOCH)
            .unwrap();
        let encoded = tx.encode();
        assert_eq!(encoded.len(), tx.encode_size());
        assert_eq!(&encoded[..6], &[1, INVOKE, 4, 3, 2, 1]);
        assert_eq!(&encoded[6..14], &5u64.to_le_bytes());
        assert_eq!(&encoded[14..22], &6u64.to_le_bytes());
        assert_eq!(&encoded[22..42], payer().as_ref());
        assert_eq!(&encoded[42..62], GOVERNANCE.as_ref());

        // method, zero params, zero attributes
        assert_eq!(&encoded[62..], &[1, b'm', 0, 0]);
        assert_eq!(tx.hash(), double_hash(&encoded));

        let decoded = UnsignedTransaction::decode_cfg(encoded, &Limits::default()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn test_reject_unknown_type() {
        let tx = Builder::new(GOVERNANCE_HEX, "m", payer())
            .build(UNIX_EPOCH)
            .unwrap();
        let mut encoded = tx.encode();
        encoded[1] = 0xd0;
        assert!(matches!(
            UnsignedTransaction::decode_cfg(encoded, &Limits::default()),
            Err(CodecError::InvalidEnum("UnsignedTransaction", 0xd0))
        ));
    }

    #[test]
    fn test_reject_attributes() {
        let tx = Builder::new(GOVERNANCE_HEX, "m", payer())
            .build(UNIX_EPOCH)
            .unwrap();
        let mut encoded = tx.encode().to_vec();
        let last = encoded.len() - 1;
        encoded[last] = 1;
        assert!(matches!(
            UnsignedTransaction::decode_cfg(Bytes::from(encoded), &Limits::default()),
            Err(CodecError::Invalid(_, _))
        ));
    }
}
