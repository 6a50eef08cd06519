pub mod usage_ledger;

pub use usage_ledger::{MemoryUsageLedger, RedisUsageLedger, UsageLedger};
