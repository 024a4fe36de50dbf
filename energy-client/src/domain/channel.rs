use std::{fmt, str::FromStr};

/// One of the two monitored buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    A,
    B,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    pub fn label(self) -> &'static str {
        match self {
            Channel::A => "Tour A",
            Channel::B => "Tour B",
        }
    }

    /// Key used in JSON payloads (`tourA` / `tourB`).
    pub fn key(self) -> &'static str {
        match self {
            Channel::A => "tourA",
            Channel::B => "tourB",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "").as_str() {
            "a" | "toura" => Ok(Channel::A),
            "b" | "tourb" => Ok(Channel::B),
            other => Err(format!("unknown channel '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_channel_names() {
        assert_eq!("A".parse::<Channel>().unwrap(), Channel::A);
        assert_eq!("tour_b".parse::<Channel>().unwrap(), Channel::B);
        assert_eq!("Tour A".parse::<Channel>().unwrap(), Channel::A);
        assert!("c".parse::<Channel>().is_err());
    }
}
