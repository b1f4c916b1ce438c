use super::{Evidence, Reason};
use crate::{
    block::Block,
    threshold::AggregateSignature,
    wire::{read_count, read_var, var_size, write_var, Limits},
};
use bytes::{Buf, BufMut};
use vigil_codec::{varint, EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use vigil_cryptography::{
    double_hash,
    ed25519::{PublicKey, Signature},
    sha256::Digest,
};

/// A proposer-signed candidate block and the reason for overriding consensus with it.
///
/// The encoding of a [Proposal] is the message every admin signs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    reason: Reason,
    evidence: Evidence,
    height: u32,
    block: Block,
    proposer: PublicKey,
    signature: Signature,
}

impl Proposal {
    pub(super) fn new(
        reason: Reason,
        evidence: Evidence,
        block: Block,
        proposer: PublicKey,
        signature: Signature,
    ) -> Self {
        Self {
            reason,
            evidence,
            height: block.height(),
            block,
            proposer,
            signature,
        }
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn evidence(&self) -> Evidence {
        self.evidence
    }

    /// Height the proposal claims for its block.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn proposer(&self) -> &PublicKey {
        &self.proposer
    }

    /// Proposer signature over the block hash.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Write for Proposal {
    fn write(&self, buf: &mut impl BufMut) {
        (self.reason as u8).write(buf);
        (self.evidence as u8).write(buf);
        self.height.write(buf);
        self.block.write(buf);
        write_var(&self.proposer, buf);
        write_var(&self.signature, buf);
    }
}

impl EncodeSize for Proposal {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + u8::SIZE
            + u32::SIZE
            + self.block.encode_size()
            + var_size::<PublicKey>()
            + var_size::<Signature>()
    }
}

impl Read for Proposal {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let reason =
            Reason::try_from(u8::read(buf)?).map_err(|v| CodecError::InvalidEnum("Reason", v))?;
        let evidence = Evidence::try_from(u8::read(buf)?)
            .map_err(|v| CodecError::InvalidEnum("Evidence", v))?;
        let height = u32::read(buf)?;
        let block = Block::read_cfg(buf, limits)?;
        let proposer = read_var(buf)?;
        let signature = read_var(buf)?;
        Ok(Self {
            reason,
            evidence,
            height,
            block,
            proposer,
            signature,
        })
    }
}

/// A finalized emergency override request.
///
/// Requests are only produced by [super::Builder::finalize] or by decoding, and expose
/// no mutators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    proposal: Proposal,
    groups: Vec<AggregateSignature>,
    requester: PublicKey,
    requester_signature: Signature,
}

impl Request {
    pub(super) fn new(
        proposal: Proposal,
        groups: Vec<AggregateSignature>,
        requester: PublicKey,
        requester_signature: Signature,
    ) -> Self {
        Self {
            proposal,
            groups,
            requester,
            requester_signature,
        }
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    pub fn reason(&self) -> Reason {
        self.proposal.reason
    }

    pub fn evidence(&self) -> Evidence {
        self.proposal.evidence
    }

    pub fn height(&self) -> u32 {
        self.proposal.height
    }

    pub fn block(&self) -> &Block {
        &self.proposal.block
    }

    /// Admin signature groups, in the order they were collected.
    pub fn groups(&self) -> &[AggregateSignature] {
        &self.groups
    }

    pub fn requester(&self) -> &PublicKey {
        &self.requester
    }

    pub fn requester_signature(&self) -> &Signature {
        &self.requester_signature
    }

    /// The message the requester signed.
    pub fn digest(&self) -> Digest {
        digest(&self.proposal, &self.groups, &self.requester)
    }
}

/// Double SHA-256 over every request field that precedes the requester signature.
pub(super) fn digest(
    proposal: &Proposal,
    groups: &[AggregateSignature],
    requester: &PublicKey,
) -> Digest {
    let mut buf = Vec::with_capacity(signed_size(proposal, groups));
    write_signed(proposal, groups, requester, &mut buf);
    double_hash(&buf)
}

fn write_signed(
    proposal: &Proposal,
    groups: &[AggregateSignature],
    requester: &PublicKey,
    buf: &mut impl BufMut,
) {
    proposal.write(buf);
    varint::write(groups.len() as u64, buf);
    for group in groups {
        group.write(buf);
    }
    write_var(requester, buf);
}

fn signed_size(proposal: &Proposal, groups: &[AggregateSignature]) -> usize {
    proposal.encode_size()
        + varint::size(groups.len() as u64)
        + groups.iter().map(EncodeSize::encode_size).sum::<usize>()
        + var_size::<PublicKey>()
}

impl Write for Request {
    fn write(&self, buf: &mut impl BufMut) {
        write_signed(&self.proposal, &self.groups, &self.requester, buf);
        write_var(&self.requester_signature, buf);
    }
}

impl EncodeSize for Request {
    fn encode_size(&self) -> usize {
        signed_size(&self.proposal, &self.groups) + var_size::<Signature>()
    }
}

impl Read for Request {
    type Cfg = Limits;

    fn read_cfg(buf: &mut impl Buf, limits: &Limits) -> Result<Self, CodecError> {
        let proposal = Proposal::read_cfg(buf, limits)?;
        let count = read_count(buf, limits.max_groups)?;
        let mut groups = Vec::with_capacity(count);
        for _ in 0..count {
            groups.push(AggregateSignature::read_cfg(buf, limits)?);
        }
        let requester = read_var(buf)?;
        let requester_signature = read_var(buf)?;
        Ok(Self {
            proposal,
            groups,
            requester,
            requester_signature,
        })
    }
}
