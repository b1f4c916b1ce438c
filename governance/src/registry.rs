//! Named governance actions.
//!
//! A [Registry] maps an action name (as operators refer to it) to the native contract,
//! method and gas limit that implement it. Registries are plain values handed to
//! [crate::Driver::new]; there is no global registry.

use crate::{address::GOVERNANCE, transaction::DEFAULT_GAS_LIMIT, Address, Error};
use std::collections::BTreeMap;

/// A native-contract call an action resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub contract: Address,
    pub method: String,
    pub gas_limit: u64,
}

impl Action {
    pub fn new(contract: Address, method: impl Into<String>, gas_limit: u64) -> Self {
        Self {
            contract,
            method: method.into(),
            gas_limit,
        }
    }
}

/// Action name to [Action] lookup.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    actions: BTreeMap<String, Action>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the governance contract's administrative methods.
    pub fn governance() -> Self {
        let mut registry = Self::new();
        for (name, method) in [
            ("register_candidate", "registerCandidate"),
            ("approve_candidate", "approveCandidate"),
            ("reject_candidate", "rejectCandidate"),
            ("black_node", "blackNode"),
            ("white_node", "whiteNode"),
            ("quit_node", "quitNode"),
            ("vote_for_peer", "voteForPeer"),
            ("unvote_for_peer", "unVoteForPeer"),
            ("withdraw", "withdraw"),
            ("commit_dpos", "commitDpos"),
            ("update_config", "updateConfig"),
            ("update_global_param", "updateGlobalParam"),
        ] {
            registry.register(name, Action::new(GOVERNANCE, method, DEFAULT_GAS_LIMIT));
        }
        registry
    }

    /// Registers `action` under `name`, returning the action it replaced (if any).
    pub fn register(&mut self, name: impl Into<String>, action: Action) -> Option<Action> {
        self.actions.insert(name.into(), action)
    }

    /// Looks up the action registered under `name`.
    pub fn get(&self, name: &str) -> Result<&Action, Error> {
        self.actions
            .get(name)
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}
