pub mod channel;
pub mod forecast;
pub mod quality;
pub mod series;

pub use channel::Channel;
pub use forecast::{ForecastArtifact, ForecastScenario, ForecastSeries};
pub use quality::QualityReport;
pub use series::{align_to_step, ChannelSeries, SeriesError, Slot, SlotFlag, TimeGrid};
