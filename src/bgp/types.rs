//! Address families, filter kinds and flag vectors

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address Family Identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Afi {
    Ipv4,
    Ipv6,
}

impl Afi {
    /// Keyword used in `address-family` commands
    pub fn keyword(self) -> &'static str {
        match self {
            Afi::Ipv4 => "ipv4",
            Afi::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for Afi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Afi::Ipv4 => write!(f, "IPv4"),
            Afi::Ipv6 => write!(f, "IPv6"),
        }
    }
}

impl FromStr for Afi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(Afi::Ipv4),
            "ipv6" => Ok(Afi::Ipv6),
            _ => Err(format!("unknown address family '{}'", s)),
        }
    }
}

/// Subsequent Address Family Identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Safi {
    Unicast,
    Multicast,
    LabeledUnicast,
}

impl Safi {
    /// Keyword used in `address-family` commands
    pub fn keyword(self) -> &'static str {
        match self {
            Safi::Unicast => "unicast",
            Safi::Multicast => "multicast",
            Safi::LabeledUnicast => "labeled-unicast",
        }
    }
}

impl fmt::Display for Safi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Safi::Unicast => write!(f, "Unicast"),
            Safi::Multicast => write!(f, "Multicast"),
            Safi::LabeledUnicast => write!(f, "Labeled Unicast"),
        }
    }
}

impl FromStr for Safi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unicast" => Ok(Safi::Unicast),
            "multicast" => Ok(Safi::Multicast),
            "labeled-unicast" => Ok(Safi::LabeledUnicast),
            _ => Err(format!("unknown sub-address family '{}'", s)),
        }
    }
}

/// Combined AFI/SAFI pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Family {
    pub afi: Afi,
    pub safi: Safi,
}

impl Family {
    pub const fn new(afi: Afi, safi: Safi) -> Self {
        Family { afi, safi }
    }

    /// Arguments of the `address-family` command, e.g. `ipv6 multicast`
    pub fn command_args(&self) -> String {
        format!("{} {}", self.afi.keyword(), self.safi.keyword())
    }

    /// Short form used in case descriptions, e.g. `ipv4-unicast`
    pub fn slug(&self) -> String {
        format!("{}-{}", self.afi.keyword(), self.safi.keyword())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.afi, self.safi)
    }
}

/// Families exercised when a catalog entry does not name its own
pub const DEFAULT_FAMILIES: [Family; 4] = [
    Family::new(Afi::Ipv4, Safi::Unicast),
    Family::new(Afi::Ipv4, Safi::Multicast),
    Family::new(Afi::Ipv6, Safi::Unicast),
    Family::new(Afi::Ipv6, Safi::Multicast),
];

/// Direction a policy object is applied in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::In => 0,
            Direction::Out => 1,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            _ => Err(format!("unknown direction '{}'", s)),
        }
    }
}

/// Named policy objects a neighbor can reference per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    DistributeList,
    FilterList,
    PrefixList,
    RouteMap,
    /// Single-slot filter; stored under [`Direction::In`]
    UnsuppressMap,
}

impl FilterKind {
    pub const ALL: [FilterKind; 5] = [
        FilterKind::DistributeList,
        FilterKind::FilterList,
        FilterKind::PrefixList,
        FilterKind::RouteMap,
        FilterKind::UnsuppressMap,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            FilterKind::DistributeList => 0,
            FilterKind::FilterList => 1,
            FilterKind::PrefixList => 2,
            FilterKind::RouteMap => 3,
            FilterKind::UnsuppressMap => 4,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            FilterKind::DistributeList => "distribute-list",
            FilterKind::FilterList => "filter-list",
            FilterKind::PrefixList => "prefix-list",
            FilterKind::RouteMap => "route-map",
            FilterKind::UnsuppressMap => "unsuppress-map",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        FilterKind::ALL.into_iter().find(|k| k.keyword() == s)
    }

    /// Whether the filter is configured with an explicit direction
    pub fn is_directional(self) -> bool {
        !matches!(self, FilterKind::UnsuppressMap)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

bitflags! {
    /// Family-independent neighbor flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PeerFlags: u32 {
        const PASSIVE = 1 << 0;
        const SHUTDOWN = 1 << 1;
        const DONT_CAPABILITY = 1 << 2;
        const OVERRIDE_CAPABILITY = 1 << 3;
        const STRICT_CAP_MATCH = 1 << 4;
        const DYNAMIC_CAPABILITY = 1 << 5;
        const DISABLE_CONNECTED_CHECK = 1 << 6;
        const ENFORCE_FIRST_AS = 1 << 7;
        const CAPABILITY_ENHE = 1 << 8;
        const ROUTEADV = 1 << 9;
    }
}

bitflags! {
    /// Per-family neighbor flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AfFlags: u32 {
        const SEND_COMMUNITY = 1 << 0;
        const SEND_EXT_COMMUNITY = 1 << 1;
        const SEND_LARGE_COMMUNITY = 1 << 2;
        const NEXTHOP_SELF = 1 << 3;
        const FORCE_NEXTHOP_SELF = 1 << 4;
        const REFLECTOR_CLIENT = 1 << 5;
        const RSERVER_CLIENT = 1 << 6;
        const SOFT_RECONFIG = 1 << 7;
        const AS_PATH_UNCHANGED = 1 << 8;
        const NEXTHOP_UNCHANGED = 1 << 9;
        const MED_UNCHANGED = 1 << 10;
        const DEFAULT_ORIGINATE = 1 << 11;
        const REMOVE_PRIVATE_AS = 1 << 12;
        const REMOVE_PRIVATE_AS_ALL = 1 << 13;
        const REMOVE_PRIVATE_AS_REPLACE = 1 << 14;
        const ALLOWAS_IN = 1 << 15;
        const ALLOWAS_IN_ORIGIN = 1 << 16;
        const ORF_PREFIX_SM = 1 << 17;
        const ORF_PREFIX_RM = 1 << 18;
        const MAX_PREFIX = 1 << 19;
        const MAX_PREFIX_WARNING = 1 << 20;
        const AS_OVERRIDE = 1 << 21;
        const ADDPATH_TX_ALL_PATHS = 1 << 22;
        const ADDPATH_TX_BESTPATH_PER_AS = 1 << 23;
        const WEIGHT = 1 << 24;

        const ATTRIBUTE_UNCHANGED = Self::AS_PATH_UNCHANGED.bits()
            | Self::NEXTHOP_UNCHANGED.bits()
            | Self::MED_UNCHANGED.bits();
        const REMOVE_PRIVATE_AS_ALL_REPLACE = Self::REMOVE_PRIVATE_AS_ALL.bits()
            | Self::REMOVE_PRIVATE_AS_REPLACE.bits();
        const SEND_ALL_COMMUNITIES = Self::SEND_COMMUNITY.bits()
            | Self::SEND_EXT_COMMUNITY.bits()
            | Self::SEND_LARGE_COMMUNITY.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_strings() {
        let family = Family::new(Afi::Ipv6, Safi::Multicast);
        assert_eq!(family.command_args(), "ipv6 multicast");
        assert_eq!(family.slug(), "ipv6-multicast");
        assert_eq!(family.to_string(), "IPv6 Multicast");
    }

    #[test]
    fn test_default_families_are_distinct() {
        for (i, a) in DEFAULT_FAMILIES.iter().enumerate() {
            for b in &DEFAULT_FAMILIES[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_filter_kind_keywords() {
        for kind in FilterKind::ALL {
            assert_eq!(FilterKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert!(FilterKind::from_keyword("access-list").is_none());
        assert!(!FilterKind::UnsuppressMap.is_directional());
    }

    #[test]
    fn test_flag_names_parse() {
        let flags: AfFlags = bitflags::parser::from_str("AS_PATH_UNCHANGED | MED_UNCHANGED").unwrap();
        assert_eq!(flags, AfFlags::AS_PATH_UNCHANGED | AfFlags::MED_UNCHANGED);
        assert!(AfFlags::ATTRIBUTE_UNCHANGED.contains(flags));
    }
}
