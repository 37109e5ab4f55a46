//! Events emitted when ledger state changes.

use serde::Serialize;
use stakepgp_types::{Address, FieldElement, Timestamp, Wei};

/// Ledger-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum LedgerEvent {
    Staked {
        user: Address,
        public_key: String,
        amount: Wei,
    },
    Challenged {
        user: Address,
        challenger: Address,
    },
    /// `success` is true when the staker proved their identity.
    ChallengeResolved {
        user: Address,
        challenger: Address,
        success: bool,
    },
    StakeWithdrawn {
        user: Address,
        amount: Wei,
    },
    LockExtended {
        user: Address,
        new_unlock_time: Timestamp,
    },
    OwnershipTransferStarted {
        previous_owner: Address,
        new_owner: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    RegistryUpdated,
    PassportCommitmentRegistered {
        nullifier: FieldElement,
        commitment: FieldElement,
    },
    DscKeyCommitmentRegistered {
        commitment: FieldElement,
    },
    VcAndDiscloseCircuitUpdated {
        verifier: String,
    },
    RegisterCircuitVerifierUpdated {
        type_id: u64,
        verifier: String,
    },
    DscCircuitVerifierUpdated {
        type_id: u64,
        verifier: String,
    },
}

/// Synchronous fan-out event bus.
///
/// Listeners run inline after the change is committed; keep them fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&LedgerEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&LedgerEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &LedgerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
