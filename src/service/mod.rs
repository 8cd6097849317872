pub mod aggregation;
pub mod attendance;
pub mod directory;
pub mod report;

pub use aggregation::AggregationService;
pub use attendance::AttendanceService;
pub use directory::DirectoryService;
pub use report::ReportService;

/// Ids are assigned by the service since the store replaces whole collections.
pub(crate) fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |id| id + 1)
}

/// Read-modify-write rounds tried before a conflicting writer wins.
pub(crate) const WRITE_ATTEMPTS: u32 = 3;
