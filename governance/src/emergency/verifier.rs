use super::Request;
use crate::{block::transactions_root, Error, SignerSet, Stage};
use tracing::debug;
use vigil_codec::Encode;
use vigil_cryptography::Verifier as _;

/// Checks a decoded [Request] the way a chain node would before acting on it.
#[derive(Clone, Debug)]
pub struct Verifier {
    admins: SignerSet,
    admin_requester: bool,
}

impl Verifier {
    /// Verifies admin groups against `admins`.
    pub fn new(admins: SignerSet) -> Self {
        Self {
            admins,
            admin_requester: false,
        }
    }

    /// Also requires the requester to be one of the admins.
    pub fn require_admin_requester(mut self, required: bool) -> Self {
        self.admin_requester = required;
        self
    }

    /// Returns an error describing the first check `request` fails.
    pub fn verify(&self, request: &Request) -> Result<(), Error> {
        let proposal = request.proposal();
        let block = proposal.block();
        if proposal.height() != block.height() {
            return Err(Error::ProposalHeight {
                proposal: proposal.height(),
                block: block.height(),
            });
        }
        let expected = block.header().transactions_root();
        let found = transactions_root(block.transactions());
        if expected != found {
            return Err(Error::TransactionsRoot { expected, found });
        }

        // Proposer over the block hash
        if !proposal
            .proposer()
            .verify(&block.hash(), proposal.signature())
        {
            return Err(Error::InvalidSignature {
                stage: Stage::Proposer,
                signer: *proposal.proposer(),
            });
        }

        // Every admin group over the proposal
        if request.groups().is_empty() {
            return Err(Error::MissingAdminSignatures);
        }
        let message = proposal.encode();
        for group in request.groups() {
            group.verify(Stage::Quorum, &self.admins, &message)?;
        }

        // Requester over everything else
        if !request
            .requester()
            .verify(&request.digest(), request.requester_signature())
        {
            return Err(Error::InvalidSignature {
                stage: Stage::Requester,
                signer: *request.requester(),
            });
        }
        if self.admin_requester && !self.admins.contains(request.requester()) {
            return Err(Error::UnauthorizedRequester(*request.requester()));
        }
        debug!(
            height = block.height(),
            groups = request.groups().len(),
            requester = %request.requester(),
            "verified emergency request"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::{Block, Consensus, Tip},
        emergency::{Builder, Evidence, Reason},
        threshold::Coordinator,
        wire::Limits,
    };
    use std::num::NonZeroUsize;
    use vigil_codec::Decode;
    use vigil_cryptography::{ed25519::PrivateKey, sha256::Digest, PrivateKeyExt, Signer};

    struct Fixture {
        admins: Vec<PrivateKey>,
        set: SignerSet,
    }

    impl Fixture {
        fn new() -> Self {
            let admins: Vec<_> = (20..24).map(PrivateKey::from_seed).collect();
            let set = SignerSet::new(admins.iter().map(|a| a.public_key()).collect()).unwrap();
            Self { admins, set }
        }

        fn request(&self, requester: &PrivateKey) -> Request {
            let tip = Tip::from(Block::genesis(0).header());
            let block =
                Block::extend(&tip, 0, 1, Digest::zero(), Consensus::default(), vec![]).unwrap();
            let mut builder = Builder::new(Reason::Blacklist, Evidence::Equivocation, block);
            builder.sign_proposer(&PrivateKey::from_seed(0)).unwrap();
            builder
                .sign_quorum(
                    &Coordinator::new(NonZeroUsize::MIN).unwrap(),
                    &self.set,
                    &self.admins[..3],
                )
                .unwrap();
            builder.finalize(requester).unwrap()
        }
    }

    #[test]
    fn test_accepts() {
        let fixture = Fixture::new();
        let request = fixture.request(&PrivateKey::from_seed(1));
        Verifier::new(fixture.set.clone()).verify(&request).unwrap();
    }

    #[test]
    fn test_requester_authorization() {
        let fixture = Fixture::new();
        let outsider = PrivateKey::from_seed(1);
        let request = fixture.request(&outsider);
        let verifier = Verifier::new(fixture.set.clone()).require_admin_requester(true);
        assert!(matches!(
            verifier.verify(&request),
            Err(Error::UnauthorizedRequester(key)) if key == outsider.public_key()
        ));

        let request = fixture.request(&fixture.admins[3]);
        verifier.verify(&request).unwrap();
    }

    #[test]
    fn test_wrong_admins() {
        let fixture = Fixture::new();
        let request = fixture.request(&PrivateKey::from_seed(1));
        let other = Fixture {
            set: SignerSet::new(
                (30..34)
                    .map(|seed| PrivateKey::from_seed(seed).public_key())
                    .collect(),
            )
            .unwrap(),
            admins: vec![],
        };
        assert!(matches!(
            Verifier::new(other.set).verify(&request),
            Err(Error::UnknownSigner {
                stage: Stage::Quorum,
                ..
            })
        ));
    }

    #[test]
    fn test_proposal_height_mismatch() {
        let fixture = Fixture::new();
        let request = fixture.request(&PrivateKey::from_seed(1));
        let mut encoded = request.encode();

        // Proposal height follows the reason and evidence codes
        encoded[2] = 9;
        let tampered = Request::decode_cfg(encoded, &Limits::default()).unwrap();
        assert!(matches!(
            Verifier::new(fixture.set).verify(&tampered),
            Err(Error::ProposalHeight {
                proposal: 9,
                block: 1
            })
        ));
    }
}
