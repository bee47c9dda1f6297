//! CRIF (Common Risk Interchange Format) records and record store.
//!
//! - [`CrifRecord`]: one sensitivity or SIMM parameter observation
//! - [`NettingSetDetails`]: the primary partition key for aggregation
//! - [`Crif`]: ordered record collection with filtering and netting

mod record;
mod store;

pub use record::{CrifRecord, NettingSetDetails};
pub use store::Crif;
