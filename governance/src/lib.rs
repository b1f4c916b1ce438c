//! Authorize native-contract calls with quorum multi-signatures and build emergency
//! consensus-override requests.
//!
//! # Overview
//!
//! Governance actions on the chain are native-contract invocations that must be signed
//! by at least `M` of the `N` keys in a [SignerSet], where `M = floor((5N + 6) / 7)`.
//! When normal consensus cannot make progress (or a validator equivocates), the same
//! signer-set abstraction authorizes an emergency override: an out-of-band candidate
//! block, signed by a proposer, endorsed by an admin quorum and finally sealed by a
//! requester.
//!
//! The crate is organized leaf-first:
//!
//! - [signer_set]: ordered public keys, derived threshold and multisig [Address].
//! - [transaction]: typed parameters and the [transaction::Builder] for unsigned invocations.
//! - [threshold]: the [threshold::Coordinator] that turns signers into an
//!   [threshold::AggregateSignature].
//! - [merkle] and [block]: transaction roots and the [block::Assembler] for candidate blocks.
//! - [emergency]: the staged request [emergency::Builder] and [emergency::Verifier].
//! - [chain]: the [Chain] and [Clock] interfaces plus bounded waiting.
//! - [Driver]: ties build, sign, submit and confirm together for a [Registry] of actions.
//!
//! # Status
//!
//! `vigil-governance` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use vigil_cryptography::{ed25519, Signer};

pub mod address;
pub mod block;
pub mod chain;
mod config;
mod driver;
pub mod emergency;
mod error;
pub mod merkle;
pub mod mocks;
pub mod registry;
pub mod signer_set;
pub mod threshold;
pub mod transaction;
pub mod wire;

pub use address::Address;
pub use chain::{Chain, Clock, TokioClock};
pub use config::Config;
pub use driver::Driver;
pub use error::{Error, Stage};
pub use registry::{Action, Registry};
pub use signer_set::SignerSet;

/// A key (local or remote) able to sign governance payloads.
///
/// Any [Signer] over ed25519 keys is a [Wallet].
pub trait Wallet: Signer<PublicKey = ed25519::PublicKey, Signature = ed25519::Signature> {}

impl<T> Wallet for T where
    T: Signer<PublicKey = ed25519::PublicKey, Signature = ed25519::Signature>
{
}
