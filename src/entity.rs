//! Entity models: customers, points of sale and items.
//!
//! Entities are plain values rebuilt from the store on every read. Each type
//! knows its wire shape, its creation defaults and the fields an update may
//! touch; persistence lives in [`crate::repository`].

use crate::config::Config;
use crate::error::{LoyaltyError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for text fields that have not been filled in yet.
pub const UNDEFINED: &str = "UNDEFINED";

/// Highest loyalty percentage a point of sale may carry.
pub const MAX_PERCENTAGE: u8 = 100;

/// The three kinds of stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    PointOfSale,
    Item,
}

impl EntityKind {
    /// Store key holding this kind's identifier index.
    pub fn index_key(self) -> &'static str {
        match self {
            EntityKind::Customer => "customerIDs",
            EntityKind::PointOfSale => "posIDs",
            EntityKind::Item => "itemIDs",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Customer => "Customer",
            EntityKind::PointOfSale => "PointOfSale",
            EntityKind::Item => "Item",
        };
        f.write_str(label)
    }
}

/// A stored entity type.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug {
    const KIND: EntityKind;

    /// A single-field change accepted by [`Record::apply`].
    type Field;

    /// Identifier the record is stored under.
    fn id(&self) -> &str;

    /// Builds a freshly created record.
    fn with_defaults(id: &str, config: &Config) -> Self;

    /// Applies one field change in place.
    fn apply(&mut self, field: Self::Field);

    /// Status gate for field updates. Types without a status flag are always open.
    fn is_active(&self) -> bool {
        true
    }

    /// Checks invariants serde cannot express.
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Records that carry an active-status flag and can be switched off.
pub trait Deactivate: Record {
    fn deactivate(&mut self);
}

// ==================== CUSTOMER ====================

/// A loyalty program member and their cashback wallet.
///
/// # Invariants
///
/// - `cashback` never goes negative; a wallet purchase needs a balance
///   strictly greater than the price
/// - once `status == false` no field update or purchase is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Customer {
    #[serde(rename = "customerID")]
    pub customer_id: String,
    pub name: String,
    pub address: String,
    pub cashback: u64,
    pub email: String,
    pub phone: String,
    pub status: bool,
}

/// Updatable customer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerField {
    Name(String),
    Address(String),
    Cashback(u64),
    Email(String),
    Phone(String),
}

impl Customer {
    /// Credits accrued cashback.
    pub fn accrue(&mut self, amount: u64) -> Result<()> {
        if !self.status {
            return Err(LoyaltyError::CustomerInactive(self.customer_id.clone()));
        }

        self.cashback = self
            .cashback
            .checked_add(amount)
            .ok_or_else(|| LoyaltyError::BalanceOverflow(self.customer_id.clone()))?;
        Ok(())
    }

    /// Pays `price` out of the cashback wallet.
    ///
    /// A balance exactly equal to the price is not enough.
    pub fn spend(&mut self, price: u64) -> Result<()> {
        if !self.status {
            return Err(LoyaltyError::CustomerInactive(self.customer_id.clone()));
        }

        if self.cashback <= price {
            return Err(LoyaltyError::InsufficientBalance {
                customer: self.customer_id.clone(),
                balance: self.cashback,
                price,
            });
        }

        self.cashback -= price;
        Ok(())
    }
}

impl Record for Customer {
    const KIND: EntityKind = EntityKind::Customer;
    type Field = CustomerField;

    fn id(&self) -> &str {
        &self.customer_id
    }

    fn with_defaults(id: &str, _config: &Config) -> Self {
        Customer {
            customer_id: id.to_string(),
            name: id.to_string(),
            address: UNDEFINED.to_string(),
            cashback: 0,
            email: UNDEFINED.to_string(),
            phone: UNDEFINED.to_string(),
            status: true,
        }
    }

    fn apply(&mut self, field: CustomerField) {
        match field {
            CustomerField::Name(name) => self.name = name,
            CustomerField::Address(address) => self.address = address,
            CustomerField::Cashback(cashback) => self.cashback = cashback,
            CustomerField::Email(email) => self.email = email,
            CustomerField::Phone(phone) => self.phone = phone,
        }
    }

    fn is_active(&self) -> bool {
        self.status
    }
}

impl Deactivate for Customer {
    fn deactivate(&mut self) {
        self.status = false;
    }
}

// ==================== POINT OF SALE ====================

/// A merchant location that grants cashback on purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointOfSale {
    #[serde(rename = "posId")]
    pub pos_id: String,
    #[serde(rename = "posName")]
    pub name: String,
    pub status: bool,
    /// Share of an item's price credited as cashback, 0..=100.
    #[serde(rename = "percentage")]
    pub loyalty_percentage: u8,
}

/// Updatable point-of-sale fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOfSaleField {
    Name(String),
    Percentage(u8),
}

impl Record for PointOfSale {
    const KIND: EntityKind = EntityKind::PointOfSale;
    type Field = PointOfSaleField;

    fn id(&self) -> &str {
        &self.pos_id
    }

    fn with_defaults(id: &str, config: &Config) -> Self {
        PointOfSale {
            pos_id: id.to_string(),
            name: id.to_string(),
            status: true,
            loyalty_percentage: config.default_percentage,
        }
    }

    fn apply(&mut self, field: PointOfSaleField) {
        match field {
            PointOfSaleField::Name(name) => self.name = name,
            PointOfSaleField::Percentage(percentage) => self.loyalty_percentage = percentage,
        }
    }

    fn is_active(&self) -> bool {
        self.status
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.loyalty_percentage > MAX_PERCENTAGE {
            return Err(format!(
                "loyalty percentage {} exceeds {}",
                self.loyalty_percentage, MAX_PERCENTAGE
            ));
        }
        Ok(())
    }
}

impl Deactivate for PointOfSale {
    fn deactivate(&mut self) {
        self.status = false;
    }
}

// ==================== ITEM ====================

/// A purchasable item sold at a point of sale.
///
/// The owning point of sale is not checked on write; it has to resolve when
/// the item is bought by money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "posId")]
    pub pos_id: String,
    #[serde(rename = "itemName")]
    pub name: String,
    pub price: u64,
}

/// Updatable item fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemField {
    Name(String),
    PosId(String),
    Price(u64),
}

impl Record for Item {
    const KIND: EntityKind = EntityKind::Item;
    type Field = ItemField;

    fn id(&self) -> &str {
        &self.item_id
    }

    fn with_defaults(id: &str, config: &Config) -> Self {
        Item {
            item_id: id.to_string(),
            pos_id: UNDEFINED.to_string(),
            name: UNDEFINED.to_string(),
            price: config.default_price,
        }
    }

    fn apply(&mut self, field: ItemField) {
        match field {
            ItemField::Name(name) => self.name = name,
            ItemField::PosId(pos_id) => self.pos_id = pos_id,
            ItemField::Price(price) => self.price = price,
        }
    }
}
