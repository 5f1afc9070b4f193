//! # Loyalty Ledger
//!
//! Transactional record store for a loyalty-rewards program. Customers hold
//! a cashback wallet, points of sale set a loyalty percentage, and items sold
//! at a point of sale can be bought either with money (earning cashback) or
//! out of the wallet.
//!
//! ## Design Principles
//!
//! - **Atomic requests**: every invoke stages its writes and commits them only
//!   on success
//! - **Read/write separation**: queries run against a view that is never committed
//! - **Integer money**: balances and prices are whole units, accrual truncates
//! - **Stable wire format**: records are stored as the same JSON queries return
//!
//! ## Example
//!
//! ```no_run
//! use loyalty_ledger::{Caller, Config, Dispatcher, MemoryStore};
//!
//! let regulator = Caller::new("AU0000001", "regulator");
//! let mut ledger = Dispatcher::new(MemoryStore::new(), Config::default());
//! ledger.invoke(&regulator, "create_customer", &["CU0000001"]).unwrap();
//! let details = ledger.query("get_customer_details", &["CU0000001"]).unwrap();
//! println!("{}", details.as_str());
//! ```

pub mod auth;
pub mod batch;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod entity;
pub mod error;
pub mod identifier;
pub mod index;
pub mod operation;
pub mod repository;
pub mod request;
pub mod store;

pub use auth::{AccessPolicy, Caller, IdentityResolver, RequestIdentity, Role};
pub use batch::{BatchRunner, Outcome};
pub use config::Config;
pub use dispatch::{Dispatcher, Response};
pub use engine::PurchaseEngine;
pub use entity::{Customer, EntityKind, Item, PointOfSale, Record};
pub use error::{LoyaltyError, Result};
pub use identifier::IdPolicy;
pub use operation::{ReadOp, WriteOp};
pub use repository::Repository;
pub use request::{RequestKind, RequestRecord};
pub use store::{MemoryStore, RecordStore, WriteSet};
