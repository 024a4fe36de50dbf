//! Pure stages between raw tables and grid-aligned channel series:
//! column normalization, temporal cleaning, value sanitization.

pub mod normalize;
pub mod sanitize;
pub mod temporal;

pub use normalize::{canonical_label, ChannelMatcher, ColumnNormalizer, NormalizedRow, NormalizedTable};
pub use sanitize::{interpolate_gaps, SanitizedPair, ValueSanitizer};
pub use temporal::{
    parse_date, parse_time, row_timestamp, CleanedTable, CleaningStats, RowTimestamp, TemporalCleaner, TimeOfDay,
};
