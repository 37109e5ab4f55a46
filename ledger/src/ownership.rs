//! Two-step ownership of the ledger's admin operations.

use stakepgp_types::Address;

use crate::LedgerError;

/// The current owner and an optional pending owner.
///
/// A transfer only completes when the pending owner accepts it. Once
/// renounced, no account passes [`Ownership::check_owner`] again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ownership {
    owner: Option<Address>,
    pending_owner: Option<Address>,
}

impl Ownership {
    pub fn new(owner: Address) -> Result<Self, LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::OwnableInvalidOwner(owner));
        }
        Ok(Self {
            owner: Some(owner),
            pending_owner: None,
        })
    }

    /// The owner, or the zero address after renouncing.
    pub fn owner(&self) -> Address {
        self.owner.unwrap_or(Address::ZERO)
    }

    pub fn pending_owner(&self) -> Address {
        self.pending_owner.unwrap_or(Address::ZERO)
    }

    pub fn check_owner(&self, caller: Address) -> Result<(), LedgerError> {
        if self.owner != Some(caller) {
            return Err(LedgerError::OwnableUnauthorizedAccount(caller));
        }
        Ok(())
    }

    /// Start a transfer. Offering the zero address cancels a pending one.
    /// Returns `(owner, new_owner)`.
    pub fn transfer(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(Address, Address), LedgerError> {
        self.check_owner(caller)?;
        self.pending_owner = (!new_owner.is_zero()).then_some(new_owner);
        Ok((caller, new_owner))
    }

    /// Complete a transfer. Returns `(previous_owner, new_owner)`.
    pub fn accept(&mut self, caller: Address) -> Result<(Address, Address), LedgerError> {
        if self.pending_owner != Some(caller) {
            return Err(LedgerError::OwnableUnauthorizedAccount(caller));
        }
        let previous = self.owner();
        self.owner = Some(caller);
        self.pending_owner = None;
        Ok((previous, caller))
    }

    /// Give up ownership for good. Returns the previous owner.
    pub fn renounce(&mut self, caller: Address) -> Result<Address, LedgerError> {
        self.check_owner(caller)?;
        self.owner = None;
        self.pending_owner = None;
        Ok(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Address = Address::ZERO;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    #[test]
    fn zero_owner_is_rejected() {
        assert!(matches!(
            Ownership::new(A),
            Err(LedgerError::OwnableInvalidOwner(_))
        ));
    }

    #[test]
    fn transfer_needs_acceptance() {
        let mut own = Ownership::new(addr(1)).unwrap();
        own.transfer(addr(1), addr(2)).unwrap();
        assert_eq!(own.owner(), addr(1));
        assert_eq!(own.pending_owner(), addr(2));

        assert!(matches!(
            own.accept(addr(3)),
            Err(LedgerError::OwnableUnauthorizedAccount(a)) if a == addr(3)
        ));
        assert_eq!(own.accept(addr(2)).unwrap(), (addr(1), addr(2)));
        assert_eq!(own.owner(), addr(2));
        assert!(own.pending_owner().is_zero());
        assert!(own.check_owner(addr(1)).is_err());
    }

    #[test]
    fn only_owner_may_transfer() {
        let mut own = Ownership::new(addr(1)).unwrap();
        assert!(own.transfer(addr(2), addr(2)).is_err());
    }

    #[test]
    fn renounce_leaves_no_owner() {
        let mut own = Ownership::new(addr(1)).unwrap();
        own.transfer(addr(1), addr(2)).unwrap();
        own.renounce(addr(1)).unwrap();
        assert!(own.owner().is_zero());
        assert!(own.pending_owner().is_zero());
        assert!(own.check_owner(A).is_err());
        assert!(own.accept(addr(2)).is_err());
    }
}
