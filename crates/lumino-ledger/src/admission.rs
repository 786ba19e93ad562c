use lumino_types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Admission control for compute providers
pub trait Whitelist: Send {
    fn is_eligible(&self, account: &AccountId) -> bool;
}

/// Privileged roles for configuration calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
}

/// Role-based authorization
pub trait AccessControl: Send {
    fn has_role(&self, account: &AccountId, role: Role) -> bool;
}

/// In-memory whitelist. `open()` admits everyone.
#[derive(Debug, Clone, Default)]
pub struct MemoryWhitelist {
    accounts: BTreeSet<AccountId>,
    open: bool,
}

impl MemoryWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open() -> Self {
        MemoryWhitelist {
            accounts: BTreeSet::new(),
            open: true,
        }
    }

    pub fn add(&mut self, account: impl Into<AccountId>) {
        self.accounts.insert(account.into());
    }

    pub fn remove(&mut self, account: &AccountId) {
        self.accounts.remove(account);
    }
}

impl Whitelist for MemoryWhitelist {
    fn is_eligible(&self, account: &AccountId) -> bool {
        self.open || self.accounts.contains(account)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAccess {
    grants: BTreeMap<AccountId, BTreeSet<Role>>,
}

impl MemoryAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(admin: impl Into<AccountId>) -> Self {
        let mut access = Self::new();
        access.grant(admin, Role::Admin);
        access
    }

    pub fn grant(&mut self, account: impl Into<AccountId>, role: Role) {
        self.grants.entry(account.into()).or_default().insert(role);
    }

    pub fn revoke(&mut self, account: &AccountId, role: Role) {
        if let Some(roles) = self.grants.get_mut(account) {
            roles.remove(&role);
        }
    }
}

impl AccessControl for MemoryAccess {
    fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.grants
            .get(account)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }
}
