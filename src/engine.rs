//! Purchase transactions.
//!
//! Both purchase kinds act on one customer and one item. Buying by money
//! credits cashback at the rate of the item's point of sale; buying by wallet
//! pays the full price out of the cashback balance. Only the customer record
//! is written; the item and point of sale are read-only inputs, and there is
//! no stock to decrement.

use crate::entity::{Customer, Item, PointOfSale};
use crate::error::{LoyaltyError, Result};
use crate::repository::Repository;
use crate::store::RecordStore;
use log::debug;

/// Cashback earned on `price` at `percentage`, truncated toward zero.
///
/// Returns `None` only if the result does not fit a balance.
pub fn accrual(percentage: u8, price: u64) -> Option<u64> {
    u64::try_from(u128::from(percentage) * u128::from(price) / 100).ok()
}

/// Runs purchase transactions against a repository.
///
/// The customer and item are handed in already loaded; the point of sale
/// is resolved here, at transaction time, from the item's `pos_id`.
pub struct PurchaseEngine<'r, 'a, S: ?Sized> {
    repo: &'r mut Repository<'a, S>,
}

impl<'r, 'a, S: RecordStore + ?Sized> PurchaseEngine<'r, 'a, S> {
    pub fn new(repo: &'r mut Repository<'a, S>) -> Self {
        PurchaseEngine { repo }
    }

    /// Accrual purchase: credits `percentage * price / 100` of cashback.
    pub fn buy_item_by_money(&mut self, mut customer: Customer, item: &Item) -> Result<Customer> {
        if !customer.status {
            return Err(LoyaltyError::CustomerInactive(customer.customer_id));
        }

        let pos: PointOfSale = self.repo.retrieve(&item.pos_id).map_err(|e| {
            LoyaltyError::PointOfSaleLookupFailed {
                id: item.pos_id.clone(),
                source: Box::new(e),
            }
        })?;

        let accrued = accrual(pos.loyalty_percentage, item.price)
            .ok_or_else(|| LoyaltyError::BalanceOverflow(customer.customer_id.clone()))?;
        customer.accrue(accrued)?;
        self.repo.save(&customer)?;

        debug!(
            "Customer {} bought {} for {} at {} ({}%), accrued {}, balance {}",
            customer.customer_id,
            item.item_id,
            item.price,
            pos.pos_id,
            pos.loyalty_percentage,
            accrued,
            customer.cashback
        );
        Ok(customer)
    }

    /// Wallet purchase: pays the item's price out of the cashback balance.
    ///
    /// The balance must be strictly greater than the price.
    pub fn buy_item_by_wallet(&mut self, mut customer: Customer, item: &Item) -> Result<Customer> {
        customer.spend(item.price)?;
        self.repo.save(&customer)?;

        debug!(
            "Customer {} paid {} for {} from wallet, balance {}",
            customer.customer_id, item.price, item.item_id, customer.cashback
        );
        Ok(customer)
    }
}
