//! Domain layer
//!
//! # Domain Models
//!
//! - `TreeRecord`: one persisted node (`id`, `name`, `parent_id`, `left`, `right`)
//! - `Interval`: the nested set `(left, right)` pair
//!
//! # Interval Encoder
//!
//! - `interval`: renumbering, insert planning and invariant checks (pure)
//!
//! # Port Traits
//!
//! - `TreeStore`: primary storage abstraction
//! - `TransactionManager`: caller-driven unit of work

pub mod interval;
pub mod models;
pub mod ports;

pub use interval::{plan_insert, renumber, validate, InsertPlan, Placement, Renumber, SLOT_WIDTH};
pub use models::{Interval, RecordId, TreeRecord, NO_PARENT};
pub use ports::{TransactionManager, TreeStore};
