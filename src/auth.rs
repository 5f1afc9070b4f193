//! Caller identity and role-gated authorization of write operations.
//!
//! Identity extraction belongs to the hosting ledger: the core only asks an
//! [`IdentityResolver`] for the caller's id and declared role, once per
//! invoke, and checks the role against the operation's [`Permission`].

use crate::error::{LoyaltyError, Result};
use std::fmt;
use std::str::FromStr;

/// A verified caller as handed over by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Caller {
            id: id.into(),
            role: role.into(),
        }
    }
}

/// Source of the current caller's identity.
pub trait IdentityResolver {
    fn resolve(&self) -> Result<Caller>;
}

impl IdentityResolver for Caller {
    fn resolve(&self) -> Result<Caller> {
        Ok(self.clone())
    }
}

/// Identity attributes as read from a request, either of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub caller: Option<String>,
    pub role: Option<String>,
}

impl IdentityResolver for RequestIdentity {
    fn resolve(&self) -> Result<Caller> {
        let id = self.caller.as_deref().ok_or_else(|| {
            LoyaltyError::IdentityUnavailable("missing attribute 'username'".into())
        })?;
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| LoyaltyError::IdentityUnavailable("missing attribute 'role'".into()))?;
        Ok(Caller::new(id, role))
    }
}

/// Participant roles known to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Regulator,
    Hotel,
    Airlines,
    Vendor,
    Customer,
}

impl Role {
    /// Hotels, airlines and vendors run points of sale.
    pub fn is_merchant(self) -> bool {
        matches!(self, Role::Hotel | Role::Airlines | Role::Vendor)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regulator" => Ok(Role::Regulator),
            "hotel" => Ok(Role::Hotel),
            "airlines" => Ok(Role::Airlines),
            "vendor" => Ok(Role::Vendor),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// What a write operation needs the caller to be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Enroll new customers.
    Enroll,
    /// Edit a customer's contact details.
    ManageProfile,
    /// Set a cashback balance directly or deactivate a customer.
    ManageBalance,
    /// Create and edit points of sale and items.
    ManageCatalog,
    /// Buy an item for a customer.
    Purchase,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Permission::Enroll => "enroll customers",
            Permission::ManageProfile => "manage customer profiles",
            Permission::ManageBalance => "manage customer balances",
            Permission::ManageCatalog => "manage points of sale and items",
            Permission::Purchase => "purchase items",
        };
        f.write_str(label)
    }
}

/// How write operations are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    /// Every caller may run every operation.
    Open,

    /// Callers are checked against the role table.
    #[default]
    RoleGated,
}

impl AccessPolicy {
    /// Checks that `caller` holds `permission`.
    ///
    /// `subject` is the customer the operation acts on, if any; a caller with
    /// the customer role may only act on their own record.
    pub fn authorize(
        self,
        caller: &Caller,
        permission: Permission,
        subject: Option<&str>,
    ) -> Result<()> {
        if self == AccessPolicy::Open {
            return Ok(());
        }

        let allowed = match caller.role.parse::<Role>() {
            Ok(Role::Regulator) => true,
            Ok(role) if role.is_merchant() => matches!(
                permission,
                Permission::Enroll | Permission::ManageCatalog | Permission::Purchase
            ),
            Ok(_) => {
                matches!(permission, Permission::ManageProfile | Permission::Purchase)
                    && subject == Some(caller.id.as_str())
            }
            Err(_) => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(LoyaltyError::Unauthorized {
                caller: caller.id.clone(),
                role: caller.role.clone(),
                operation: permission.to_string(),
            })
        }
    }
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(AccessPolicy::Open),
            "role-gated" => Ok(AccessPolicy::RoleGated),
            other => Err(format!("unknown access policy '{}'", other)),
        }
    }
}
