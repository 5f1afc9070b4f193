//! Request dispatch.
//!
//! [`Dispatcher::invoke`] runs write operations and [`Dispatcher::query`] runs
//! read operations. Each invoke stages its writes in a [`WriteSet`] that is
//! committed only when the whole request succeeds; each query runs against a
//! write set that is always discarded.

use crate::auth::{AccessPolicy, Caller, IdentityResolver};
use crate::codec;
use crate::config::Config;
use crate::engine::PurchaseEngine;
use crate::entity::{
    Customer, CustomerField, Item, ItemField, PointOfSale, PointOfSaleField, Record, MAX_PERCENTAGE,
};
use crate::error::{LoyaltyError, Result};
use crate::operation::{ReadOp, WriteOp};
use crate::repository::Repository;
use crate::store::{RecordStore, WriteSet};
use log::{debug, warn};
use serde_json::Value;

/// Fixed reply to `ping`.
pub const PING_REPLY: &str = "Hello, world!";

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A write that returns nothing.
    Done,
    /// Text returned to the caller (JSON for records and lists).
    Payload(String),
}

impl Response {
    /// The payload text, empty for [`Response::Done`].
    pub fn as_str(&self) -> &str {
        match self {
            Response::Done => "",
            Response::Payload(text) => text,
        }
    }
}

/// Routes named operations to repository and purchase-engine calls.
pub struct Dispatcher<S> {
    store: S,
    config: Config,
}

impl<S: RecordStore> Dispatcher<S> {
    pub fn new(store: S, config: Config) -> Self {
        Dispatcher { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives back the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs a write operation on behalf of the caller `identity` resolves to.
    pub fn invoke(
        &mut self,
        identity: &dyn IdentityResolver,
        function: &str,
        args: &[&str],
    ) -> Result<Response> {
        let result = self.apply_invoke(identity, function, args);
        match &result {
            Ok(_) => debug!("INVOKE {} {:?}: ok", function, args),
            Err(e) => warn!("INVOKE {} {:?}: {}", function, args, e),
        }
        result
    }

    /// Runs a read-only operation. Nothing it does is ever committed.
    pub fn query(&self, function: &str, args: &[&str]) -> Result<Response> {
        let result = self.apply_query(function, args);
        if let Err(e) = &result {
            warn!("QUERY {} {:?}: {}", function, args, e);
        }
        result
    }

    fn apply_invoke(
        &mut self,
        identity: &dyn IdentityResolver,
        function: &str,
        args: &[&str],
    ) -> Result<Response> {
        let caller = identity.resolve()?;
        let op: WriteOp = function.parse()?;
        expect_arity(op.name(), op.arity(), args)?;

        let mut staged = WriteSet::new(&self.store);
        let handler = WriteHandler {
            repo: Repository::new(&mut staged, &self.config),
            caller: &caller,
            policy: self.config.access_policy,
            op,
        };
        let response = handler.run(args)?;

        let writes = staged.into_writes();
        let staged_keys = writes.len();
        self.store.commit(writes)?;

        debug!(
            "Caller {} ({}) committed {} with {} key(s)",
            caller.id, caller.role, op, staged_keys
        );
        Ok(response)
    }

    fn apply_query(&self, function: &str, args: &[&str]) -> Result<Response> {
        let op: ReadOp = function.parse()?;
        expect_arity(op.name(), op.arity(), args)?;

        if op == ReadOp::Ping {
            return Ok(Response::Payload(PING_REPLY.to_string()));
        }

        let mut view = WriteSet::new(&self.store);
        let repo = Repository::new(&mut view, &self.config);

        match op {
            ReadOp::GetCustomerDetails => details(&repo.retrieve::<Customer>(args[0])?),
            ReadOp::GetCustomers => enumerate::<Customer, _>(&repo),
            ReadOp::CheckUniqueCustomer => check_unique::<Customer, _>(&repo, args[0]),
            ReadOp::GetPosDetails => details(&repo.retrieve::<PointOfSale>(args[0])?),
            ReadOp::GetPointsOfSale => enumerate::<PointOfSale, _>(&repo),
            ReadOp::CheckUniquePos => check_unique::<PointOfSale, _>(&repo, args[0]),
            ReadOp::GetItemDetails => details(&repo.retrieve::<Item>(args[0])?),
            ReadOp::GetItems => enumerate::<Item, _>(&repo),
            ReadOp::CheckUniqueItem => check_unique::<Item, _>(&repo, args[0]),
            ReadOp::Ping => Ok(Response::Payload(PING_REPLY.to_string())),
        }
    }
}

/// One write operation bound to its caller and staged repository.
struct WriteHandler<'a, S: ?Sized> {
    repo: Repository<'a, S>,
    caller: &'a Caller,
    policy: AccessPolicy,
    op: WriteOp,
}

impl<S: RecordStore + ?Sized> WriteHandler<'_, S> {
    fn run(mut self, args: &[&str]) -> Result<Response> {
        match self.op {
            WriteOp::Ping => return Ok(Response::Payload(PING_REPLY.to_string())),

            WriteOp::CreateCustomer => {
                self.authorize(None)?;
                self.repo.create::<Customer>(args[0])?;
            }
            WriteOp::CreatePos => {
                self.authorize(None)?;
                self.repo.create::<PointOfSale>(args[0])?;
            }
            WriteOp::CreateItem => {
                self.authorize(None)?;
                self.repo.create::<Item>(args[0])?;
            }

            WriteOp::DeactivateCustomer => {
                self.authorize(Some(args[0]))?;
                self.repo.deactivate::<Customer>(args[0])?;
            }
            WriteOp::DeactivatePos => {
                self.authorize(None)?;
                self.repo.deactivate::<PointOfSale>(args[0])?;
            }

            WriteOp::UpdateName => {
                self.update_customer(args, |v| Ok(CustomerField::Name(v.to_string())))?
            }
            WriteOp::UpdateAddress => {
                self.update_customer(args, |v| Ok(CustomerField::Address(v.to_string())))?
            }
            WriteOp::UpdateCashback => {
                self.update_customer(args, |v| {
                    Ok(CustomerField::Cashback(parse_amount("cashback", v)?))
                })?
            }
            WriteOp::UpdateEmail => {
                self.update_customer(args, |v| Ok(CustomerField::Email(v.to_string())))?
            }
            WriteOp::UpdatePhone => {
                self.update_customer(args, |v| Ok(CustomerField::Phone(v.to_string())))?
            }

            WriteOp::UpdatePosName => {
                self.update_pos(args, |v| Ok(PointOfSaleField::Name(v.to_string())))?
            }
            WriteOp::UpdatePercentage => {
                self.update_pos(args, |v| Ok(PointOfSaleField::Percentage(parse_percentage(v)?)))?
            }

            WriteOp::UpdateItemName => {
                self.update_item(args, |v| Ok(ItemField::Name(v.to_string())))?
            }
            WriteOp::UpdatePosId => {
                self.update_item(args, |v| Ok(ItemField::PosId(v.to_string())))?
            }
            WriteOp::UpdatePrice => {
                self.update_item(args, |v| Ok(ItemField::Price(parse_amount("price", v)?)))?
            }

            WriteOp::BuyItemByMoney | WriteOp::BuyItemByWallet => {
                let customer = lookup_customer(&self.repo, args[0])?;
                let item = lookup_item(&self.repo, args[1])?;
                self.authorize(Some(customer.customer_id.as_str()))?;

                let mut engine = PurchaseEngine::new(&mut self.repo);
                if self.op == WriteOp::BuyItemByMoney {
                    engine.buy_item_by_money(customer, &item)?;
                } else {
                    engine.buy_item_by_wallet(customer, &item)?;
                }
            }
        }

        Ok(Response::Done)
    }

    fn authorize(&self, subject: Option<&str>) -> Result<()> {
        match self.op.permission() {
            Some(permission) => self.policy.authorize(self.caller, permission, subject),
            None => Ok(()),
        }
    }

    fn update_customer<F>(&mut self, args: &[&str], field: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<CustomerField>,
    {
        let customer = lookup_customer(&self.repo, args[0])?;
        self.authorize(Some(customer.customer_id.as_str()))?;
        let field = field(args[1])?;
        self.repo.apply_update(customer, field)?;
        Ok(())
    }

    fn update_pos<F>(&mut self, args: &[&str], field: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<PointOfSaleField>,
    {
        let pos: PointOfSale = self.repo.retrieve(args[0]).map_err(|e| {
            LoyaltyError::PointOfSaleLookupFailed {
                id: args[0].to_string(),
                source: Box::new(e),
            }
        })?;
        self.authorize(None)?;
        let field = field(args[1])?;
        self.repo.apply_update(pos, field)?;
        Ok(())
    }

    fn update_item<F>(&mut self, args: &[&str], field: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<ItemField>,
    {
        let item = lookup_item(&self.repo, args[0])?;
        self.authorize(None)?;
        let field = field(args[1])?;
        self.repo.apply_update(item, field)?;
        Ok(())
    }
}

fn lookup_customer<S: RecordStore + ?Sized>(
    repo: &Repository<'_, S>,
    id: &str,
) -> Result<Customer> {
    repo.retrieve(id).map_err(|e| LoyaltyError::CustomerLookupFailed {
        id: id.to_string(),
        source: Box::new(e),
    })
}

fn lookup_item<S: RecordStore + ?Sized>(repo: &Repository<'_, S>, id: &str) -> Result<Item> {
    repo.retrieve(id).map_err(|e| LoyaltyError::ItemLookupFailed {
        id: id.to_string(),
        source: Box::new(e),
    })
}

fn expect_arity(name: &str, expected: usize, args: &[&str]) -> Result<()> {
    if args.len() != expected {
        return Err(LoyaltyError::InvalidArgument(format!(
            "{} expects {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn parse_amount(field: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        LoyaltyError::InvalidArgument(format!(
            "{} must be a non-negative integer, got '{}'",
            field, value
        ))
    })
}

fn parse_percentage(value: &str) -> Result<u8> {
    let percentage = parse_amount("percentage", value)?;
    u8::try_from(percentage)
        .ok()
        .filter(|p| *p <= MAX_PERCENTAGE)
        .ok_or_else(|| {
            LoyaltyError::InvalidArgument(format!(
                "percentage must be between 0 and {}, got {}",
                MAX_PERCENTAGE, percentage
            ))
        })
}

fn details<T: Record>(record: &T) -> Result<Response> {
    let bytes = codec::encode(record)?;
    String::from_utf8(bytes)
        .map(Response::Payload)
        .map_err(|e| LoyaltyError::corrupt(record.id(), e))
}

/// Lists every record of one kind as a JSON array.
///
/// Retrieval is fail-fast (see [`Repository::list_all`]); a record that then
/// fails to format is left out of the list.
fn enumerate<T: Record, S: RecordStore + ?Sized>(repo: &Repository<'_, S>) -> Result<Response> {
    let entries: Vec<Value> = repo
        .list_all::<T>()?
        .iter()
        .filter_map(|record| match serde_json::to_value(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Leaving {} {} out of the listing: {}", T::KIND, record.id(), e);
                None
            }
        })
        .collect();

    serde_json::to_string(&entries)
        .map(Response::Payload)
        .map_err(|e| LoyaltyError::corrupt(T::KIND.index_key(), e))
}

/// `true` if nothing is stored under `id` yet.
fn check_unique<T: Record, S: RecordStore + ?Sized>(
    repo: &Repository<'_, S>,
    id: &str,
) -> Result<Response> {
    let unique = match repo.retrieve::<T>(id) {
        Ok(_) => false,
        Err(LoyaltyError::NotFound { .. }) => true,
        Err(LoyaltyError::CorruptRecord { .. }) => false,
        Err(e) => return Err(e),
    };
    Ok(Response::Payload(unique.to_string()))
}
