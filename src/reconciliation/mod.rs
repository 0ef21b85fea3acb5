//! Reconciliation module: statement line lifecycle, matching and batch
//! reconciliation against the cash account's GL splits

pub mod committer;
pub mod coordinator;
pub mod core;
pub mod matcher;
pub mod pool;
pub mod store;
pub mod summary;

pub use committer::*;
pub use coordinator::*;
pub use self::core::*;
pub use matcher::*;
pub use pool::*;
pub use store::*;
pub use summary::*;
