use std::{fmt, str::FromStr};

use super::Channel;

/// Precomputed forecast runs published next to the cleaned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastScenario {
    /// One week forecast after three weeks of history.
    OneWeek,
    /// One month forecast after three months of history.
    OneMonth,
}

impl ForecastScenario {
    pub const ALL: [ForecastScenario; 2] = [ForecastScenario::OneWeek, ForecastScenario::OneMonth];

    pub fn as_str(self) -> &'static str {
        match self {
            ForecastScenario::OneWeek => "1_week",
            ForecastScenario::OneMonth => "1_month",
        }
    }
}

impl fmt::Display for ForecastScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1_week" => Ok(ForecastScenario::OneWeek),
            "1_month" => Ok(ForecastScenario::OneMonth),
            other => Err(format!("unknown forecast scenario '{other}'")),
        }
    }
}

/// Predicted vs. actual values for one channel, as parallel arrays.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForecastSeries {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub model: Option<String>,
    pub dates: Vec<String>,
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
}

impl ForecastSeries {
    pub fn is_aligned(&self) -> bool {
        self.dates.len() == self.predicted.len() && self.predicted.len() == self.actual.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForecastArtifact {
    #[cfg_attr(feature = "serde", serde(default))]
    pub scenario: String,
    #[cfg_attr(feature = "serde", serde(rename = "tourA"))]
    pub tour_a: ForecastSeries,
    #[cfg_attr(feature = "serde", serde(rename = "tourB"))]
    pub tour_b: ForecastSeries,
}

impl ForecastArtifact {
    pub fn series(&self, channel: Channel) -> &ForecastSeries {
        match channel {
            Channel::A => &self.tour_a,
            Channel::B => &self.tour_b,
        }
    }
}
