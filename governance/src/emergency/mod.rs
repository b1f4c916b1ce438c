//! Emergency consensus-override requests.
//!
//! # Overview
//!
//! When consensus stalls (or a validator equivocates) the network can be instructed,
//! outside of normal block production, to accept a candidate block that black-lists the
//! offending validators. The instruction is a [Request] assembled in three signing
//! stages:
//!
//! 1. The **proposer** signs the candidate block hash.
//! 2. An **admin quorum** signs the canonical proposal buffer (see [Proposal]), producing
//!    one aggregate signature group.
//! 3. The **requester** signs the double SHA-256 of the whole request (minus its own
//!    signature).
//!
//! [Builder] enforces that the stages run in order and never yields a partial request.
//! [Verifier] performs the checks a chain node would run on a decoded request.
//!
//! # Encoding
//!
//! ```text
//! reason u8 ‖ evidence u8 ‖ proposal height u32 ‖ block
//!   ‖ varBytes(proposer key) ‖ varBytes(proposer signature)
//!   ‖ VarUint(groups) ‖ aggregate signature…
//!   ‖ varBytes(requester key) ‖ varBytes(requester signature)
//! ```

use std::fmt;

mod builder;
mod request;
mod verifier;

pub use builder::{Builder, State};
pub use request::{Proposal, Request};
pub use verifier::Verifier;

/// Why an override is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reason {
    /// Black-list the validators named in the candidate block.
    Blacklist = 1,
}

impl TryFrom<u8> for Reason {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Blacklist),
            other => Err(other),
        }
    }
}

/// What justifies the override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Evidence {
    /// Consensus has stopped producing blocks.
    ConsensusStalled = 1,
    /// A validator signed conflicting blocks.
    Equivocation = 2,
}

impl TryFrom<u8> for Evidence {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::ConsensusStalled),
            2 => Ok(Self::Equivocation),
            other => Err(other),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blacklist => f.write_str("blacklist"),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsensusStalled => f.write_str("consensus_stalled"),
            Self::Equivocation => f.write_str("equivocation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Reason::Blacklist as u8, 1);
        assert_eq!(Evidence::ConsensusStalled as u8, 1);
        assert_eq!(Evidence::Equivocation as u8, 2);
        assert_eq!(Reason::try_from(1), Ok(Reason::Blacklist));
        assert_eq!(Reason::try_from(0), Err(0));
        assert_eq!(Evidence::try_from(2), Ok(Evidence::Equivocation));
        assert_eq!(Evidence::try_from(3), Err(3));
    }
}
