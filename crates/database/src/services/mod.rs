pub mod allocation;
pub mod committer;
pub mod roster;
pub mod sessions;

pub use allocation::{AllocationPlan, AllocationReport, AllocationService};
pub use committer::AtomicCommitter;
pub use roster::RosterResolver;
pub use sessions::SessionService;
