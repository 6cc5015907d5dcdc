//! BGP instance: neighbor and peer-group registry
//!
//! All inheritance happens here. Writing a flag on a member records an
//! override; clearing the override makes the member fall back to its
//! group (or to the default when it has none). Writing a flag on a group
//! pushes the new state to every member that has not overridden it.

use std::net::IpAddr;

use super::peer::{AfConfig, Peer, PeerSort};
use super::types::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi};
use crate::backend::CommandError;

/// Entity a neighbor command resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Member(usize),
    Group(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct BgpInstance {
    pub asn: u32,
    /// Activate ipv4 unicast on new neighbors
    pub default_ipv4_unicast: bool,
    pub groups: Vec<Peer>,
    pub peers: Vec<Peer>,
}

impl BgpInstance {
    pub fn new(asn: u32) -> Self {
        Self {
            asn,
            default_ipv4_unicast: true,
            groups: Vec::new(),
            peers: Vec::new(),
        }
    }

    pub fn find_group(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.host == name)
    }

    pub fn find_peer(&self, host: &str) -> Option<usize> {
        match host.parse::<IpAddr>() {
            Ok(addr) => self.peers.iter().position(|p| p.host == addr.to_string()),
            Err(_) => self
                .peers
                .iter()
                .position(|p| p.is_interface() && p.host == host),
        }
    }

    /// Resolve the `<host>` word of a neighbor command
    pub fn resolve(&self, word: &str) -> Option<Target> {
        self.find_peer(word)
            .map(Target::Member)
            .or_else(|| self.find_group(word).map(Target::Group))
    }

    pub fn entity(&self, target: Target) -> &Peer {
        match target {
            Target::Member(idx) => &self.peers[idx],
            Target::Group(idx) => &self.groups[idx],
        }
    }

    fn parent_of(&self, member: usize) -> Option<&Peer> {
        self.peers[member]
            .group
            .as_deref()
            .and_then(|name| self.find_group(name))
            .map(|idx| &self.groups[idx])
    }

    fn members_of_mut<'a>(&'a mut self, group: &'a str) -> impl Iterator<Item = &'a mut Peer> + 'a {
        self.peers
            .iter_mut()
            .filter(move |p| p.group.as_deref() == Some(group))
    }

    /// Session type of a neighbor; a group takes its own remote-as or,
    /// failing that, the one of its first member
    pub fn sort(&self, target: Target) -> Option<PeerSort> {
        match target {
            Target::Member(idx) => self.peers[idx].sort(self.asn),
            Target::Group(idx) => {
                let group = &self.groups[idx];
                group.sort(self.asn).or_else(|| {
                    self.peers
                        .iter()
                        .find(|p| p.group.as_deref() == Some(group.host.as_str()))
                        .and_then(|p| p.sort(self.asn))
                })
            }
        }
    }

    pub fn create_group(&mut self, name: &str) -> usize {
        if let Some(idx) = self.find_group(name) {
            return idx;
        }
        self.groups.push(Peer::group(name));
        self.groups.len() - 1
    }

    pub fn delete_group(&mut self, idx: usize) {
        let group = self.groups.remove(idx);
        for member in self.members_of_mut(&group.host) {
            member.group = None;
            member.restore_inherited();
        }
    }

    pub fn create_peer(&mut self, mut peer: Peer, remote_as: Option<u32>) -> usize {
        peer.remote_as = remote_as;
        if self.default_ipv4_unicast {
            peer.af_mut(Family::new(Afi::Ipv4, Safi::Unicast)).activated = true;
        }
        self.peers.push(peer);
        self.peers.len() - 1
    }

    pub fn delete_peer(&mut self, idx: usize) {
        self.peers.remove(idx);
    }

    pub fn set_remote_as(&mut self, target: Target, asn: u32) -> Result<(), CommandError> {
        match target {
            Target::Member(idx) => {
                if let Some(group_as) = self.parent_of(idx).and_then(|g| g.remote_as) {
                    if group_as != asn {
                        return Err(CommandError::warning(
                            "% Peer-group member cannot override remote-as of peer-group",
                        ));
                    }
                }
                self.peers[idx].remote_as = Some(asn);
            }
            Target::Group(idx) => {
                self.groups[idx].remote_as = Some(asn);
                let name = self.groups[idx].host.clone();
                for member in self.members_of_mut(&name) {
                    member.remote_as = Some(asn);
                }
            }
        }
        Ok(())
    }

    /// Bind a member to a group; binding to the current group again is a no-op
    pub fn bind(&mut self, member: usize, group_name: &str) -> Result<(), CommandError> {
        let gidx = self
            .find_group(group_name)
            .ok_or_else(|| CommandError::warning("% Configure the peer-group first"))?;

        match self.peers[member].group.as_deref() {
            Some(current) if current == group_name => return Ok(()),
            Some(_) => {
                return Err(CommandError::warning(
                    "% Cannot change the peer-group. Deconfigure first",
                ))
            }
            None => {}
        }

        let group = self.groups[gidx].clone();
        let peer = &mut self.peers[member];
        match (group.remote_as, peer.remote_as) {
            (Some(group_as), Some(peer_as)) if group_as != peer_as => {
                return Err(CommandError::warning(format!(
                    "% Peer with AS {} cannot be in this peer-group",
                    peer_as
                )));
            }
            (None, None) => {
                return Err(CommandError::warning(
                    "% Specify remote-as or peer-group remote AS first",
                ));
            }
            _ => {}
        }

        peer.group = Some(group.host.clone());
        if peer.remote_as.is_none() {
            peer.remote_as = group.remote_as;
        }
        peer.inherit_from(&group);
        Ok(())
    }

    pub fn unbind(&mut self, member: usize, group_name: &str) -> Result<(), CommandError> {
        let peer = &mut self.peers[member];
        if peer.group.as_deref() != Some(group_name) {
            return Err(CommandError::warning(
                "% Peer is not a member of this peer-group",
            ));
        }
        peer.group = None;
        peer.restore_inherited();
        Ok(())
    }

    pub fn set_activate(&mut self, target: Target, family: Family, on: bool) {
        match target {
            Target::Member(idx) => self.peers[idx].af_mut(family).activated = on,
            Target::Group(idx) => {
                self.groups[idx].af_mut(family).activated = on;
                let name = self.groups[idx].host.clone();
                for member in self.members_of_mut(&name) {
                    member.af_mut(family).activated = on;
                }
            }
        }
    }

    /// Apply `params` to the entity, then raise `set` and drop `clear`
    pub fn modify_peer_flags<P>(
        &mut self,
        target: Target,
        set: PeerFlags,
        clear: PeerFlags,
        params: P,
    ) -> Result<(), CommandError>
    where
        P: FnOnce(&mut Peer),
    {
        self.check_peer_flags(target, set)?;

        match target {
            Target::Member(idx) => {
                let parent = self.parent_of(idx).map(|g| (g.flags, g.routeadv));
                let peer = &mut self.peers[idx];
                params(peer);
                let mut fallback = peer.flags.write(set, true, true);
                fallback |= peer.flags.write(clear, false, true);
                if fallback.is_empty() {
                    return Ok(());
                }
                match parent {
                    Some((flags, routeadv)) => {
                        peer.flags.inherit(fallback, &flags);
                        if fallback.contains(PeerFlags::ROUTEADV) {
                            peer.routeadv = routeadv;
                        }
                    }
                    None => {
                        peer.flags.restore(fallback);
                        if fallback.contains(PeerFlags::ROUTEADV) {
                            peer.routeadv = None;
                        }
                    }
                }
            }
            Target::Group(idx) => {
                let group = &mut self.groups[idx];
                params(group);
                group.flags.write(set, true, false);
                group.flags.write(clear, false, false);
                let (flags, routeadv) = (group.flags, group.routeadv);
                let name = group.host.clone();
                for member in self.members_of_mut(&name) {
                    let bits = (set | clear).difference(member.flags.overridden);
                    member.flags.inherit(bits, &flags);
                    if bits.contains(PeerFlags::ROUTEADV) {
                        member.routeadv = routeadv;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_peer_flags(&self, target: Target, set: PeerFlags) -> Result<(), CommandError> {
        let current = self.entity(target).flags.logical();
        let conflict = (set.contains(PeerFlags::STRICT_CAP_MATCH)
            && current.contains(PeerFlags::OVERRIDE_CAPABILITY))
            || (set.contains(PeerFlags::OVERRIDE_CAPABILITY)
                && current.contains(PeerFlags::STRICT_CAP_MATCH));
        if conflict {
            return Err(CommandError::warning(
                "% Can't set override-capability and strict-capability-match at the same time",
            ));
        }
        Ok(())
    }

    /// Per-family variant of [`Self::modify_peer_flags`]
    pub fn modify_af_flags<P>(
        &mut self,
        target: Target,
        family: Family,
        set: AfFlags,
        clear: AfFlags,
        params: P,
    ) -> Result<(), CommandError>
    where
        P: FnOnce(&mut AfConfig),
    {
        self.check_activated(target, family)?;
        self.check_af_flags(target, set)?;

        match target {
            Target::Member(idx) => {
                let parent = self.parent_of(idx).map(|g| g.af(family).clone());
                let af = self.peers[idx].af_mut(family);
                params(af);
                let mut fallback = af.flags.write(set, true, true);
                fallback |= af.flags.write(clear, false, true);
                if fallback.is_empty() {
                    return Ok(());
                }
                match parent {
                    Some(parent) => {
                        af.flags.inherit(fallback, &parent.flags);
                        af.inherit_params(fallback, &parent);
                    }
                    None => {
                        af.flags.restore(fallback);
                        af.restore_params(fallback);
                    }
                }
            }
            Target::Group(idx) => {
                let group = &mut self.groups[idx];
                let af = group.af_mut(family);
                params(af);
                af.flags.write(set, true, false);
                af.flags.write(clear, false, false);
                let parent = af.clone();
                let name = group.host.clone();
                for member in self.members_of_mut(&name) {
                    let af = member.af_mut(family);
                    let bits = (set | clear).difference(af.flags.overridden);
                    af.flags.inherit(bits, &parent.flags);
                    af.inherit_params(bits, &parent);
                }
            }
        }
        Ok(())
    }

    fn check_activated(&self, target: Target, family: Family) -> Result<(), CommandError> {
        if self.entity(target).af(family).activated {
            Ok(())
        } else {
            Err(CommandError::warning(
                "% Activate the neighbor for the address family first",
            ))
        }
    }

    fn check_af_flags(&self, target: Target, set: AfFlags) -> Result<(), CommandError> {
        let sort = self.sort(target);
        if set.contains(AfFlags::REFLECTOR_CLIENT) && sort == Some(PeerSort::External) {
            return Err(CommandError::warning(
                "% Invalid command. Not an internal neighbor",
            ));
        }
        if set.contains(AfFlags::AS_OVERRIDE) && sort == Some(PeerSort::Internal) {
            return Err(CommandError::warning(
                "% as-override cannot be configured for internal neighbor",
            ));
        }
        Ok(())
    }

    /// Bind (`Some`) or release (`None`) a named policy object
    pub fn set_filter(
        &mut self,
        target: Target,
        family: Family,
        kind: FilterKind,
        direction: Direction,
        name: Option<String>,
    ) -> Result<(), CommandError> {
        self.check_activated(target, family)?;
        if name.is_some() {
            let conflicting = match kind {
                FilterKind::PrefixList => Some(FilterKind::DistributeList),
                FilterKind::DistributeList => Some(FilterKind::PrefixList),
                _ => None,
            };
            if let Some(other) = conflicting {
                let af = self.entity(target).af(family);
                if af.filter(other, direction).name.is_some() {
                    return Err(CommandError::warning(
                        "% Prefix/distribute list can not co-exist",
                    ));
                }
            }
        }

        match target {
            Target::Member(idx) => {
                let inherited = self
                    .parent_of(idx)
                    .and_then(|g| g.af(family).filter(kind, direction).name.clone());
                let slot = self.peers[idx].af_mut(family).filter_mut(kind, direction);
                slot.overridden = name.is_some();
                slot.name = name.or(inherited);
            }
            Target::Group(idx) => {
                let group = &mut self.groups[idx];
                group.af_mut(family).filter_mut(kind, direction).name = name.clone();
                let group_name = group.host.clone();
                for member in self.members_of_mut(&group_name) {
                    let slot = member.af_mut(family).filter_mut(kind, direction);
                    if !slot.overridden {
                        slot.name = name.clone();
                    }
                }
            }
        }
        Ok(())
    }
}
