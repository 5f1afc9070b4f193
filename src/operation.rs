//! The fixed operation tables.
//!
//! Write operations are submitted as invokes and read operations as queries.
//! The two tables are disjoint apart from `ping`, so a write submitted as a
//! query is simply unknown.

use crate::auth::Permission;
use crate::error::LoyaltyError;
use std::fmt;
use std::str::FromStr;

/// Operations that may change ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    CreateCustomer,
    CreatePos,
    CreateItem,
    DeactivateCustomer,
    DeactivatePos,
    UpdateName,
    UpdateAddress,
    UpdateCashback,
    UpdateEmail,
    UpdatePhone,
    UpdatePosName,
    UpdatePercentage,
    UpdateItemName,
    UpdatePosId,
    UpdatePrice,
    BuyItemByMoney,
    BuyItemByWallet,
    Ping,
}

impl WriteOp {
    pub const ALL: [WriteOp; 18] = [
        WriteOp::CreateCustomer,
        WriteOp::CreatePos,
        WriteOp::CreateItem,
        WriteOp::DeactivateCustomer,
        WriteOp::DeactivatePos,
        WriteOp::UpdateName,
        WriteOp::UpdateAddress,
        WriteOp::UpdateCashback,
        WriteOp::UpdateEmail,
        WriteOp::UpdatePhone,
        WriteOp::UpdatePosName,
        WriteOp::UpdatePercentage,
        WriteOp::UpdateItemName,
        WriteOp::UpdatePosId,
        WriteOp::UpdatePrice,
        WriteOp::BuyItemByMoney,
        WriteOp::BuyItemByWallet,
        WriteOp::Ping,
    ];

    /// The name callers use for this operation.
    pub fn name(self) -> &'static str {
        match self {
            WriteOp::CreateCustomer => "create_customer",
            WriteOp::CreatePos => "create_pos",
            WriteOp::CreateItem => "create_item",
            WriteOp::DeactivateCustomer => "deactivate_customer",
            WriteOp::DeactivatePos => "deactivate_pos",
            WriteOp::UpdateName => "update_name",
            WriteOp::UpdateAddress => "update_address",
            WriteOp::UpdateCashback => "update_cashback",
            WriteOp::UpdateEmail => "update_email",
            WriteOp::UpdatePhone => "update_phone",
            WriteOp::UpdatePosName => "update_posname",
            WriteOp::UpdatePercentage => "update_percentage",
            WriteOp::UpdateItemName => "update_item_name",
            WriteOp::UpdatePosId => "update_posid",
            WriteOp::UpdatePrice => "update_price",
            WriteOp::BuyItemByMoney => "buy_item_by_money",
            WriteOp::BuyItemByWallet => "buy_item_by_wallet",
            WriteOp::Ping => "ping",
        }
    }

    /// Number of positional arguments the operation takes.
    pub fn arity(self) -> usize {
        match self {
            WriteOp::Ping => 0,
            WriteOp::CreateCustomer
            | WriteOp::CreatePos
            | WriteOp::CreateItem
            | WriteOp::DeactivateCustomer
            | WriteOp::DeactivatePos => 1,
            _ => 2,
        }
    }

    /// Permission the caller needs, `None` for `ping`.
    pub fn permission(self) -> Option<Permission> {
        match self {
            WriteOp::Ping => None,
            WriteOp::CreateCustomer => Some(Permission::Enroll),
            WriteOp::UpdateName
            | WriteOp::UpdateAddress
            | WriteOp::UpdateEmail
            | WriteOp::UpdatePhone => Some(Permission::ManageProfile),
            WriteOp::UpdateCashback | WriteOp::DeactivateCustomer => {
                Some(Permission::ManageBalance)
            }
            WriteOp::CreatePos
            | WriteOp::CreateItem
            | WriteOp::DeactivatePos
            | WriteOp::UpdatePosName
            | WriteOp::UpdatePercentage
            | WriteOp::UpdateItemName
            | WriteOp::UpdatePosId
            | WriteOp::UpdatePrice => Some(Permission::ManageCatalog),
            WriteOp::BuyItemByMoney | WriteOp::BuyItemByWallet => Some(Permission::Purchase),
        }
    }
}

impl FromStr for WriteOp {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WriteOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| LoyaltyError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    GetCustomerDetails,
    GetCustomers,
    CheckUniqueCustomer,
    GetPosDetails,
    GetPointsOfSale,
    CheckUniquePos,
    GetItemDetails,
    GetItems,
    CheckUniqueItem,
    Ping,
}

impl ReadOp {
    pub const ALL: [ReadOp; 10] = [
        ReadOp::GetCustomerDetails,
        ReadOp::GetCustomers,
        ReadOp::CheckUniqueCustomer,
        ReadOp::GetPosDetails,
        ReadOp::GetPointsOfSale,
        ReadOp::CheckUniquePos,
        ReadOp::GetItemDetails,
        ReadOp::GetItems,
        ReadOp::CheckUniqueItem,
        ReadOp::Ping,
    ];

    /// The name callers use for this operation.
    pub fn name(self) -> &'static str {
        match self {
            ReadOp::GetCustomerDetails => "get_customer_details",
            ReadOp::GetCustomers => "get_customers",
            ReadOp::CheckUniqueCustomer => "check_unique_customer",
            ReadOp::GetPosDetails => "get_pos_details",
            ReadOp::GetPointsOfSale => "get_points_of_sale",
            ReadOp::CheckUniquePos => "check_unique_pos",
            ReadOp::GetItemDetails => "get_item_details",
            ReadOp::GetItems => "get_items",
            ReadOp::CheckUniqueItem => "check_unique_item",
            ReadOp::Ping => "ping",
        }
    }

    /// Number of positional arguments the operation takes.
    pub fn arity(self) -> usize {
        match self {
            ReadOp::GetCustomers | ReadOp::GetPointsOfSale | ReadOp::GetItems | ReadOp::Ping => 0,
            _ => 1,
        }
    }
}

impl FromStr for ReadOp {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| LoyaltyError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for ReadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
