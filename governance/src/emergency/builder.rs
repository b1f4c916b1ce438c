use super::{
    request::{digest, Proposal, Request},
    Evidence, Reason,
};
use crate::{
    block::Block,
    threshold::{AggregateSignature, Coordinator},
    Error, SignerSet, Stage, Wallet,
};
use std::fmt;
use tracing::{debug, info, warn};
use vigil_codec::Encode;

/// Progress of a [Builder] through the signing stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Holds the candidate block; nobody has signed.
    Built,
    /// The proposer has signed the block hash.
    ProposerSigned,
    /// At least one admin group has signed the proposal.
    QuorumSigned,
    /// The requester has signed and the request was returned.
    Finalized,
    /// A signer failed. No request will be produced.
    Aborted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Built => "built",
            Self::ProposerSigned => "proposer_signed",
            Self::QuorumSigned => "quorum_signed",
            Self::Finalized => "finalized",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Runs the proposer, quorum and requester signing stages over a candidate block.
///
/// Stages must be called in order. A stage called out of order fails with
/// [Error::OutOfOrder] and leaves the builder untouched. A signer failure moves the
/// builder to [State::Aborted], after which every stage fails.
pub struct Builder {
    state: State,
    reason: Reason,
    evidence: Evidence,
    block: Option<Block>,
    proposal: Option<Proposal>,
    groups: Vec<AggregateSignature>,
}

impl Builder {
    pub fn new(reason: Reason, evidence: Evidence, block: Block) -> Self {
        Self {
            state: State::Built,
            reason,
            evidence,
            block: Some(block),
            proposal: None,
            groups: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn expect(&self, expected: &[State]) -> Result<(), Error> {
        if expected.contains(&self.state) {
            return Ok(());
        }
        Err(Error::OutOfOrder {
            expected: expected[0],
            found: self.state,
        })
    }

    fn abort(&mut self, err: Error) -> Error {
        if matches!(err, Error::Signing { .. }) {
            warn!(?err, state = %self.state, "aborting emergency request");
            self.state = State::Aborted;
            self.block = None;
            self.proposal = None;
            self.groups.clear();
        }
        err
    }

    /// Has `proposer` sign the candidate block hash.
    pub fn sign_proposer<W: Wallet>(&mut self, proposer: &W) -> Result<(), Error> {
        self.expect(&[State::Built])?;
        let Some(block) = self.block.take() else {
            return Err(Error::OutOfOrder {
                expected: State::Built,
                found: self.state,
            });
        };
        let public_key = proposer.public_key();
        let hash = block.hash();
        let signature = match proposer.sign(&hash) {
            Ok(signature) => signature,
            Err(source) => {
                return Err(self.abort(Error::Signing {
                    stage: Stage::Proposer,
                    signer: public_key,
                    source,
                }))
            }
        };
        debug!(height = block.height(), %hash, proposer = %public_key, "proposer signed");
        self.proposal = Some(Proposal::new(
            self.reason,
            self.evidence,
            block,
            public_key,
            signature,
        ));
        self.state = State::ProposerSigned;
        Ok(())
    }

    /// Has every admin in `signers` sign the proposal, appending one signature group.
    ///
    /// May be called again once quorum-signed to append further groups.
    pub fn sign_quorum<W: Wallet>(
        &mut self,
        coordinator: &Coordinator,
        admins: &SignerSet,
        signers: &[W],
    ) -> Result<(), Error> {
        self.expect(&[State::ProposerSigned, State::QuorumSigned])?;
        let Some(proposal) = &self.proposal else {
            return Err(Error::OutOfOrder {
                expected: State::ProposerSigned,
                found: self.state,
            });
        };
        let message = proposal.encode();
        let group = coordinator
            .sign(Stage::Quorum, admins, signers, &message)
            .map_err(|err| self.abort(err))?;
        debug!(
            signers = group.len(),
            threshold = group.threshold(),
            groups = self.groups.len() + 1,
            "admin quorum signed"
        );
        self.groups.push(group);
        self.state = State::QuorumSigned;
        Ok(())
    }

    /// Has `requester` sign the assembled request and returns it.
    pub fn finalize<W: Wallet>(&mut self, requester: &W) -> Result<Request, Error> {
        self.expect(&[State::QuorumSigned])?;
        let Some(proposal) = self.proposal.take() else {
            return Err(Error::OutOfOrder {
                expected: State::QuorumSigned,
                found: self.state,
            });
        };
        let groups = std::mem::take(&mut self.groups);
        let public_key = requester.public_key();
        let digest = digest(&proposal, &groups, &public_key);
        let signature = match requester.sign(&digest) {
            Ok(signature) => signature,
            Err(source) => {
                return Err(self.abort(Error::Signing {
                    stage: Stage::Requester,
                    signer: public_key,
                    source,
                }))
            }
        };
        self.state = State::Finalized;
        let request = Request::new(proposal, groups, public_key, signature);
        info!(
            reason = %request.reason(),
            evidence = %request.evidence(),
            height = request.height(),
            groups = request.groups().len(),
            %digest,
            "finalized emergency request"
        );
        Ok(request)
    }
}
