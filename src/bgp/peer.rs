//! Neighbor and peer-group state
//!
//! A peer-group is stored as a [`Peer`] of kind [`PeerKind::Group`], the
//! same way a daemon keeps the group's own configuration in a shadow peer.
//! Every flag vector carries value, override and invert bits; see
//! [`FlagVec`] for how they interact.

use std::net::IpAddr;

use bitflags::Flags;

use super::types::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi};
use crate::backend::{FilterState, FlagState};

/// Route advertisement interval for external neighbors, in seconds
pub const DEFAULT_EBGP_ROUTEADV: u32 = 30;
/// Route advertisement interval for internal neighbors, in seconds
pub const DEFAULT_IBGP_ROUTEADV: u32 = 5;
/// `allowas-in` occurrence count when none is given
pub const DEFAULT_ALLOWAS_IN: u8 = 3;
/// `maximum-prefix` warning threshold percentage when none is given
pub const DEFAULT_MAX_PREFIX_THRESHOLD: u8 = 75;

/// Advertisement interval a neighbor falls back to
pub fn default_routeadv(internal: bool) -> u32 {
    if internal {
        DEFAULT_IBGP_ROUTEADV
    } else {
        DEFAULT_EBGP_ROUTEADV
    }
}

/// Every family a neighbor keeps per-family state for
pub const ALL_FAMILIES: [Family; 6] = [
    Family::new(Afi::Ipv4, Safi::Unicast),
    Family::new(Afi::Ipv4, Safi::Multicast),
    Family::new(Afi::Ipv4, Safi::LabeledUnicast),
    Family::new(Afi::Ipv6, Safi::Unicast),
    Family::new(Afi::Ipv6, Safi::Multicast),
    Family::new(Afi::Ipv6, Safi::LabeledUnicast),
];

fn family_index(family: Family) -> usize {
    let afi = match family.afi {
        Afi::Ipv4 => 0,
        Afi::Ipv6 => 1,
    };
    let safi = match family.safi {
        Safi::Unicast => 0,
        Safi::Multicast => 1,
        Safi::LabeledUnicast => 2,
    };
    afi * 3 + safi
}

/// How a neighbor is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerKind {
    Address(IpAddr),
    Interface(String),
    Group,
}

/// Session type relative to the local AS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSort {
    Internal,
    External,
}

/// Value, override and invert bits of one flag vector
///
/// The effective (configured) state of a bit is `value ^ inverted`. A
/// member's override bit is set exactly when the member itself configured
/// the bit; a group never sets override bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagVec<F> {
    pub value: F,
    pub overridden: F,
    pub inverted: F,
}

impl<F: Flags + Copy> FlagVec<F> {
    pub fn new() -> Self {
        Self {
            value: F::empty(),
            overridden: F::empty(),
            inverted: F::empty(),
        }
    }

    /// Bits that default to on: raw value and invert both set
    pub fn with_inverted(bits: F) -> Self {
        Self {
            value: bits,
            overridden: F::empty(),
            inverted: bits,
        }
    }

    /// Effective state of every bit
    pub fn logical(&self) -> F {
        self.value.symmetric_difference(self.inverted)
    }

    /// Write raw bits. With `track_override`, returns the bits that are no
    /// longer explicitly configured and must be inherited or defaulted.
    pub fn write(&mut self, bits: F, set: bool, track_override: bool) -> F {
        self.value.set(bits, set);
        if !track_override {
            return F::empty();
        }
        let explicit = if set {
            bits.difference(self.inverted)
        } else {
            bits.intersection(self.inverted)
        };
        self.overridden = self.overridden.difference(bits).union(explicit);
        bits.difference(explicit)
    }

    /// Adopt the effective state of `parent` for `bits`
    pub fn inherit(&mut self, bits: F, parent: &FlagVec<F>) {
        let raw = parent
            .logical()
            .symmetric_difference(self.inverted)
            .intersection(bits);
        self.value = self.value.difference(bits).union(raw);
    }

    /// Reset `bits` to their unconfigured state
    pub fn restore(&mut self, bits: F) {
        self.value = self
            .value
            .difference(bits)
            .union(self.inverted.intersection(bits));
    }

    pub fn state(&self, bits: F) -> FlagState {
        FlagState {
            value: self.value.intersects(bits),
            overridden: self.overridden.intersects(bits),
            inverted: self.inverted.intersects(bits),
        }
    }
}

/// `maximum-prefix` parameters; the warning-only mode is a flag bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPrefix {
    pub max: u32,
    pub threshold: u8,
    pub restart: Option<u16>,
}

/// One filter slot: the policy name and whether the member set it itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSlot {
    pub name: Option<String>,
    pub overridden: bool,
}

/// Per-family neighbor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfConfig {
    pub activated: bool,
    pub flags: FlagVec<AfFlags>,
    pub filters: [[FilterSlot; 2]; 5],
    pub allowas_in: Option<u8>,
    pub max_prefix: Option<MaxPrefix>,
    pub weight: Option<u16>,
    pub default_rmap: Option<String>,
}

impl AfConfig {
    fn new() -> Self {
        Self {
            activated: false,
            flags: FlagVec::with_inverted(AfFlags::SEND_ALL_COMMUNITIES),
            filters: Default::default(),
            allowas_in: None,
            max_prefix: None,
            weight: None,
            default_rmap: None,
        }
    }

    pub fn filter(&self, kind: FilterKind, direction: Direction) -> &FilterSlot {
        &self.filters[kind.index()][direction.index()]
    }

    pub fn filter_mut(&mut self, kind: FilterKind, direction: Direction) -> &mut FilterSlot {
        &mut self.filters[kind.index()][direction.index()]
    }

    pub fn filter_state(&self, kind: FilterKind, direction: Direction) -> FilterState {
        let slot = self.filter(kind, direction);
        FilterState {
            attached: slot.name.is_some(),
            overridden: slot.overridden,
        }
    }

    /// Copy the parameters belonging to `bits` from `parent`
    pub fn inherit_params(&mut self, bits: AfFlags, parent: &AfConfig) {
        if bits.intersects(AfFlags::ALLOWAS_IN) {
            self.allowas_in = parent.allowas_in;
        }
        if bits.intersects(AfFlags::MAX_PREFIX) {
            self.max_prefix = parent.max_prefix;
        }
        if bits.intersects(AfFlags::WEIGHT) {
            self.weight = parent.weight;
        }
        if bits.intersects(AfFlags::DEFAULT_ORIGINATE) {
            self.default_rmap = parent.default_rmap.clone();
        }
    }

    pub fn restore_params(&mut self, bits: AfFlags) {
        if bits.intersects(AfFlags::ALLOWAS_IN) {
            self.allowas_in = None;
        }
        if bits.intersects(AfFlags::MAX_PREFIX) {
            self.max_prefix = None;
        }
        if bits.intersects(AfFlags::WEIGHT) {
            self.weight = None;
        }
        if bits.intersects(AfFlags::DEFAULT_ORIGINATE) {
            self.default_rmap = None;
        }
    }

    /// Take over every non-overridden flag, parameter and filter of `parent`
    pub fn inherit_all(&mut self, parent: &AfConfig) {
        let bits = AfFlags::all().difference(self.flags.overridden);
        self.flags.inherit(bits, &parent.flags);
        self.inherit_params(bits, parent);
        for kind in FilterKind::ALL {
            for direction in [Direction::In, Direction::Out] {
                let slot = self.filter_mut(kind, direction);
                if !slot.overridden {
                    slot.name = parent.filter(kind, direction).name.clone();
                }
            }
        }
    }

    /// Drop every non-overridden flag, parameter and filter
    pub fn restore_all(&mut self) {
        let bits = AfFlags::all().difference(self.flags.overridden);
        self.flags.restore(bits);
        self.restore_params(bits);
        for row in self.filters.iter_mut() {
            for slot in row.iter_mut().filter(|s| !s.overridden) {
                slot.name = None;
            }
        }
    }

    /// Effective weight, zero unless configured
    pub fn effective_weight(&self) -> u16 {
        if self.flags.logical().contains(AfFlags::WEIGHT) {
            self.weight.unwrap_or(0)
        } else {
            0
        }
    }
}

/// A neighbor or the shadow configuration of a peer-group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Address, interface or group name as used in `neighbor <host>`
    pub host: String,
    pub kind: PeerKind,
    pub remote_as: Option<u32>,
    /// Name of the peer-group this neighbor is bound to
    pub group: Option<String>,
    pub flags: FlagVec<PeerFlags>,
    pub routeadv: Option<u32>,
    af: Vec<AfConfig>,
}

impl Peer {
    fn with_kind(host: String, kind: PeerKind) -> Self {
        let flags = match kind {
            PeerKind::Interface(_) => FlagVec::with_inverted(PeerFlags::CAPABILITY_ENHE),
            _ => FlagVec::new(),
        };
        Self {
            host,
            kind,
            remote_as: None,
            group: None,
            flags,
            routeadv: None,
            af: ALL_FAMILIES.iter().map(|_| AfConfig::new()).collect(),
        }
    }

    pub fn address(addr: IpAddr) -> Self {
        Self::with_kind(addr.to_string(), PeerKind::Address(addr))
    }

    pub fn interface(name: &str) -> Self {
        Self::with_kind(name.to_string(), PeerKind::Interface(name.to_string()))
    }

    pub fn group(name: &str) -> Self {
        Self::with_kind(name.to_string(), PeerKind::Group)
    }

    pub fn is_group(&self) -> bool {
        self.kind == PeerKind::Group
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, PeerKind::Interface(_))
    }

    pub fn af(&self, family: Family) -> &AfConfig {
        &self.af[family_index(family)]
    }

    pub fn af_mut(&mut self, family: Family) -> &mut AfConfig {
        &mut self.af[family_index(family)]
    }

    pub fn sort(&self, local_as: u32) -> Option<PeerSort> {
        self.remote_as.map(|asn| {
            if asn == local_as {
                PeerSort::Internal
            } else {
                PeerSort::External
            }
        })
    }

    /// Take over every non-overridden global and per-family setting of `group`
    pub fn inherit_from(&mut self, group: &Peer) {
        let bits = PeerFlags::all().difference(self.flags.overridden);
        self.flags.inherit(bits, &group.flags);
        if bits.contains(PeerFlags::ROUTEADV) {
            self.routeadv = group.routeadv;
        }
        for family in ALL_FAMILIES {
            let parent = group.af(family);
            let af = self.af_mut(family);
            af.activated |= parent.activated;
            af.inherit_all(parent);
        }
    }

    /// Forget everything that was inherited from a group
    pub fn restore_inherited(&mut self) {
        let bits = PeerFlags::all().difference(self.flags.overridden);
        self.flags.restore(bits);
        if bits.contains(PeerFlags::ROUTEADV) {
            self.routeadv = None;
        }
        for family in ALL_FAMILIES {
            self.af_mut(family).restore_all();
        }
    }
}
