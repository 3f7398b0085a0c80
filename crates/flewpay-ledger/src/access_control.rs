//! Role-based access control.
//!
//! The registry is the single owner of role membership. It is a pure state
//! machine: mutating calls return the event to record (or `None` when the
//! call changed nothing) and the owning component appends it to its own
//! log, so role changes share one ordered log with the component's other
//! mutations.

use std::collections::BTreeSet;

use flewpay_types::{AccountId, FlewpayError, LedgerEvent, Result, Role};

/// (role, account) membership set with the `ADMIN` gate.
#[derive(Debug, Clone, Default)]
pub struct AccessControlRegistry {
    members: BTreeSet<(Role, AccountId)>,
}

impl AccessControlRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry where `account` holds each of `roles`.
    ///
    /// Returns the registry and one `RoleGranted` per initial role, with
    /// `account` as the sender.
    #[must_use]
    pub fn with_initial_roles(account: AccountId, roles: &[Role]) -> (Self, Vec<LedgerEvent>) {
        let mut registry = Self::new();
        let events = roles
            .iter()
            .filter(|role| registry.members.insert((**role, account)))
            .map(|role| LedgerEvent::RoleGranted {
                role: *role,
                account,
                sender: account,
            })
            .collect();
        (registry, events)
    }

    /// Pure membership lookup.
    #[must_use]
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.members.contains(&(role, account))
    }

    /// Gate for privileged entry points.
    pub fn ensure_role(&self, role: Role, account: AccountId) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            tracing::warn!(account = %account, role = %role, "Privileged call refused");
            Err(FlewpayError::Unauthorized { account, role })
        }
    }

    /// Gate accepting any of `roles`. The error names the first role.
    pub fn ensure_any_role(&self, roles: &[Role], account: AccountId) -> Result<()> {
        if roles.iter().any(|role| self.has_role(*role, account)) {
            return Ok(());
        }
        let role = roles.first().copied().unwrap_or(Role::Admin);
        tracing::warn!(account = %account, roles = ?roles, "Privileged call refused");
        Err(FlewpayError::Unauthorized { account, role })
    }

    /// Grant `role` to `account`. Caller must hold `ADMIN`.
    ///
    /// Idempotent: granting a held role succeeds and returns `None`.
    pub fn grant_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<Option<LedgerEvent>> {
        self.ensure_role(Role::Admin, caller)?;
        if !self.members.insert((role, account)) {
            return Ok(None);
        }
        tracing::info!(role = %role, account = %account, sender = %caller, "Role granted");
        Ok(Some(LedgerEvent::RoleGranted {
            role,
            account,
            sender: caller,
        }))
    }

    /// Revoke `role` from `account`. Caller must hold `ADMIN`.
    ///
    /// Idempotent: revoking a role that is not held succeeds and returns `None`.
    pub fn revoke_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<Option<LedgerEvent>> {
        self.ensure_role(Role::Admin, caller)?;
        Ok(self.remove(caller, role, account))
    }

    /// Drop one of the caller's own roles.
    pub fn renounce_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<Option<LedgerEvent>> {
        if caller != account {
            return Err(FlewpayError::RenounceForOther { caller, account });
        }
        Ok(self.remove(caller, role, account))
    }

    fn remove(&mut self, sender: AccountId, role: Role, account: AccountId) -> Option<LedgerEvent> {
        if !self.members.remove(&(role, account)) {
            return None;
        }
        tracing::info!(role = %role, account = %account, sender = %sender, "Role revoked");
        Some(LedgerEvent::RoleRevoked {
            role,
            account,
            sender,
        })
    }

    /// Accounts holding `role`, in address order.
    #[must_use]
    pub fn members(&self, role: Role) -> Vec<AccountId> {
        self.members
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, a)| *a)
            .collect()
    }

    /// Roles held by `account`.
    #[must_use]
    pub fn roles_of(&self, account: AccountId) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has_role(*role, account))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AccessControlRegistry, AccountId) {
        let admin = AccountId::random();
        let (registry, _) = AccessControlRegistry::with_initial_roles(admin, &[Role::Admin]);
        (registry, admin)
    }

    #[test]
    fn initial_roles_emit_grants() {
        let owner = AccountId::random();
        let (registry, events) = AccessControlRegistry::with_initial_roles(
            owner,
            &[Role::Admin, Role::Minter, Role::Pauser],
        );
        assert_eq!(events.len(), 3);
        assert_eq!(registry.roles_of(owner), vec![Role::Admin, Role::Minter, Role::Pauser]);
    }

    #[test]
    fn admin_grants_and_revokes() {
        let (mut registry, admin) = setup();
        let user = AccountId::random();

        let event = registry.grant_role(admin, Role::Minter, user).unwrap();
        assert_eq!(
            event,
            Some(LedgerEvent::RoleGranted {
                role: Role::Minter,
                account: user,
                sender: admin,
            })
        );
        assert!(registry.has_role(Role::Minter, user));

        let event = registry.revoke_role(admin, Role::Minter, user).unwrap();
        assert!(matches!(event, Some(LedgerEvent::RoleRevoked { .. })));
        assert!(!registry.has_role(Role::Minter, user));
    }

    #[test]
    fn grant_is_idempotent() {
        let (mut registry, admin) = setup();
        let user = AccountId::random();
        registry.grant_role(admin, Role::Pauser, user).unwrap();
        let before = registry.clone().members(Role::Pauser);

        let second = registry.grant_role(admin, Role::Pauser, user).unwrap();
        assert_eq!(second, None);
        assert_eq!(registry.members(Role::Pauser), before);
    }

    #[test]
    fn revoke_is_idempotent() {
        let (mut registry, admin) = setup();
        let user = AccountId::random();
        assert_eq!(registry.revoke_role(admin, Role::Minter, user).unwrap(), None);
        assert!(!registry.has_role(Role::Minter, user));
    }

    #[test]
    fn non_admin_cannot_grant_or_revoke() {
        let (mut registry, admin) = setup();
        let user = AccountId::random();
        let other = AccountId::random();

        let err = registry.grant_role(user, Role::Minter, other).unwrap_err();
        assert_eq!(
            err,
            FlewpayError::Unauthorized {
                account: user,
                role: Role::Admin,
            }
        );
        let err = registry.revoke_role(user, Role::Admin, admin).unwrap_err();
        assert!(matches!(err, FlewpayError::Unauthorized { .. }));
        assert!(registry.has_role(Role::Admin, admin));
    }

    #[test]
    fn renounce_only_for_self() {
        let (mut registry, admin) = setup();
        let user = AccountId::random();
        registry.grant_role(admin, Role::Minter, user).unwrap();

        let err = registry.renounce_role(admin, Role::Minter, user).unwrap_err();
        assert!(matches!(err, FlewpayError::RenounceForOther { .. }));

        let event = registry.renounce_role(user, Role::Minter, user).unwrap();
        assert_eq!(
            event,
            Some(LedgerEvent::RoleRevoked {
                role: Role::Minter,
                account: user,
                sender: user,
            })
        );
        assert!(!registry.has_role(Role::Minter, user));
    }

    #[test]
    fn ensure_any_role() {
        let (mut registry, admin) = setup();
        let liquidator = AccountId::random();
        registry.grant_role(admin, Role::Liquidator, liquidator).unwrap();

        let allowed = [Role::Admin, Role::Liquidator];
        assert!(registry.ensure_any_role(&allowed, admin).is_ok());
        assert!(registry.ensure_any_role(&allowed, liquidator).is_ok());
        assert!(registry.ensure_any_role(&allowed, AccountId::random()).is_err());
    }

    #[test]
    fn admin_can_revoke_own_admin() {
        // No automatic protection of the deployer's initial roles.
        let (mut registry, admin) = setup();
        registry.revoke_role(admin, Role::Admin, admin).unwrap();
        assert!(!registry.has_role(Role::Admin, admin));
        assert!(registry.grant_role(admin, Role::Admin, admin).is_err());
    }
}
