pub mod filter;

pub use filter::{day_index, DateRange, Filter, FilterError, YearMonth};
