//! Reference BGP configuration model
//!
//! An in-process neighbor/peer-group registry with a line-oriented command
//! interpreter in front of it. It implements [`crate::backend::ConfigBackend`]
//! so the test engine can run against it without a routing daemon.

mod instance;
mod peer;
mod render;
mod types;
mod vty;

pub use peer::{
    default_routeadv, PeerSort, DEFAULT_ALLOWAS_IN, DEFAULT_EBGP_ROUTEADV, DEFAULT_IBGP_ROUTEADV,
    DEFAULT_MAX_PREFIX_THRESHOLD,
};
pub use types::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi, DEFAULT_FAMILIES};
pub use vty::Vty;
