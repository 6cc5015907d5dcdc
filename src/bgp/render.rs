//! Running-configuration renderer
//!
//! Members print only what they configured themselves; inherited state is
//! implied by the `peer-group` line. Groups print everything they have
//! configured. A bit that defaults to on prints as `no neighbor ...`.

use bitflags::Flags;

use super::instance::BgpInstance;
use super::peer::{
    default_routeadv, AfConfig, FlagVec, Peer, PeerKind, PeerSort, ALL_FAMILIES,
    DEFAULT_ALLOWAS_IN, DEFAULT_MAX_PREFIX_THRESHOLD,
};
use super::types::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi};
use super::vty::{AF_FLAG_COMMANDS, PEER_FLAG_COMMANDS};

pub(super) fn running_config(bgp: Option<&BgpInstance>) -> String {
    let mut lines = vec!["!".to_string()];
    if let Some(bgp) = bgp {
        instance_lines(bgp, &mut lines);
        lines.push("!".to_string());
    }
    lines.push("end".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn instance_lines(bgp: &BgpInstance, lines: &mut Vec<String>) {
    lines.push(format!("router bgp {}", bgp.asn));
    if !bgp.default_ipv4_unicast {
        lines.push(" no bgp default ipv4-unicast".to_string());
    }

    for entity in bgp.groups.iter().chain(bgp.peers.iter()) {
        for line in header_lines(bgp, entity) {
            lines.push(format!(" {}", line));
        }
        for line in global_lines(bgp, entity) {
            lines.push(format!(" {}", line));
        }
    }

    for family in ALL_FAMILIES {
        let body: Vec<String> = bgp
            .groups
            .iter()
            .chain(bgp.peers.iter())
            .flat_map(|entity| af_lines(bgp, entity, family))
            .collect();
        if body.is_empty() {
            continue;
        }
        lines.push(" !".to_string());
        lines.push(format!(" address-family {}", family.command_args()));
        lines.extend(body.into_iter().map(|line| format!("  {}", line)));
        lines.push(" exit-address-family".to_string());
    }
}

fn group_remote_as(bgp: &BgpInstance, peer: &Peer) -> Option<u32> {
    peer.group
        .as_deref()
        .and_then(|name| bgp.find_group(name))
        .and_then(|idx| bgp.groups[idx].remote_as)
}

fn header_lines(bgp: &BgpInstance, entity: &Peer) -> Vec<String> {
    let host = &entity.host;
    let mut lines = Vec::new();
    let remote_as = entity
        .remote_as
        .filter(|_| entity.is_group() || group_remote_as(bgp, entity).is_none())
        .map(|asn| format!("neighbor {} remote-as {}", host, asn));

    match &entity.kind {
        PeerKind::Group => {
            lines.push(format!("neighbor {} peer-group", host));
            lines.extend(remote_as);
        }
        PeerKind::Interface(_) => {
            match &entity.group {
                Some(group) => lines.push(format!("neighbor {} interface peer-group {}", host, group)),
                None => lines.push(format!("neighbor {} interface", host)),
            }
            lines.extend(remote_as);
        }
        PeerKind::Address(_) => {
            lines.extend(remote_as);
            if let Some(group) = &entity.group {
                lines.push(format!("neighbor {} peer-group {}", host, group));
            }
        }
    }
    lines
}

/// Bits the entity configured itself
fn configured<F: Flags + Copy>(entity: &Peer, flags: &FlagVec<F>) -> F {
    if entity.is_group() {
        flags.logical()
    } else {
        flags.logical().intersection(flags.overridden)
    }
}

fn prefix<F: Flags + Copy>(flags: &FlagVec<F>, bits: F) -> &'static str {
    if flags.inverted.intersects(bits) {
        "no "
    } else {
        ""
    }
}

fn global_lines(bgp: &BgpInstance, entity: &Peer) -> Vec<String> {
    let host = &entity.host;
    let own = configured(entity, &entity.flags);
    let mut lines = Vec::new();

    if own.contains(PeerFlags::ROUTEADV) {
        let internal = entity.sort(bgp.asn) == Some(PeerSort::Internal);
        let secs = entity.routeadv.unwrap_or_else(|| default_routeadv(internal));
        lines.push(format!("neighbor {} advertisement-interval {}", host, secs));
    }
    for (command, bits) in PEER_FLAG_COMMANDS {
        if own.intersects(*bits) {
            lines.push(format!(
                "{}neighbor {} {}",
                prefix(&entity.flags, *bits),
                host,
                command
            ));
        }
    }
    lines
}

fn af_lines(bgp: &BgpInstance, entity: &Peer, family: Family) -> Vec<String> {
    let host = &entity.host;
    let af = entity.af(family);
    let own = configured(entity, &af.flags);
    let mut commands: Vec<String> = Vec::new();

    let default_active = bgp.default_ipv4_unicast && family == Family::new(Afi::Ipv4, Safi::Unicast);
    let inherited_active = !entity.is_group()
        && entity
            .group
            .as_deref()
            .and_then(|name| bgp.find_group(name))
            .map(|idx| bgp.groups[idx].af(family).activated)
            .unwrap_or(false);
    if af.activated != default_active && !(af.activated && inherited_active) {
        let neg = if af.activated { "" } else { "no " };
        commands.push(format!("{}neighbor {} activate", neg, host));
    }
    if !af.activated {
        return commands;
    }

    for (command, bits, _) in AF_FLAG_COMMANDS {
        if own.intersects(*bits) {
            commands.push(format!("{}neighbor {} {}", prefix(&af.flags, *bits), host, command));
        }
    }
    commands.extend(param_lines(af, own).into_iter().map(|c| format!("neighbor {} {}", host, c)));
    commands.extend(filter_lines(entity, af).into_iter().map(|c| format!("neighbor {} {}", host, c)));
    commands
}

/// Commands whose text carries parameters
fn param_lines(af: &AfConfig, own: AfFlags) -> Vec<String> {
    let mut commands = Vec::new();

    if own.contains(AfFlags::ALLOWAS_IN) {
        commands.push(format!("allowas-in {}", af.allowas_in.unwrap_or(DEFAULT_ALLOWAS_IN)));
    }
    if own.contains(AfFlags::ALLOWAS_IN_ORIGIN) {
        commands.push("allowas-in origin".to_string());
    }

    let unchanged = own.intersection(AfFlags::ATTRIBUTE_UNCHANGED);
    if !unchanged.is_empty() {
        let mut command = String::from("attribute-unchanged");
        for (name, bit) in [
            ("as-path", AfFlags::AS_PATH_UNCHANGED),
            ("next-hop", AfFlags::NEXTHOP_UNCHANGED),
            ("med", AfFlags::MED_UNCHANGED),
        ] {
            if unchanged.contains(bit) {
                command.push(' ');
                command.push_str(name);
            }
        }
        commands.push(command);
    }

    let orf = own.intersection(AfFlags::ORF_PREFIX_SM | AfFlags::ORF_PREFIX_RM);
    if !orf.is_empty() {
        let mode = if orf == AfFlags::ORF_PREFIX_SM | AfFlags::ORF_PREFIX_RM {
            "both"
        } else if orf == AfFlags::ORF_PREFIX_SM {
            "send"
        } else {
            "receive"
        };
        commands.push(format!("capability orf prefix-list {}", mode));
    }

    if own.contains(AfFlags::DEFAULT_ORIGINATE) {
        match &af.default_rmap {
            Some(rmap) => commands.push(format!("default-originate route-map {}", rmap)),
            None => commands.push("default-originate".to_string()),
        }
    }

    if own.contains(AfFlags::MAX_PREFIX) {
        if let Some(limits) = &af.max_prefix {
            let mut command = format!("maximum-prefix {}", limits.max);
            if limits.threshold != DEFAULT_MAX_PREFIX_THRESHOLD {
                command.push_str(&format!(" {}", limits.threshold));
            }
            if af.flags.logical().contains(AfFlags::MAX_PREFIX_WARNING) {
                command.push_str(" warning-only");
            } else if let Some(restart) = limits.restart {
                command.push_str(&format!(" restart {}", restart));
            }
            commands.push(command);
        }
    }

    if own.contains(AfFlags::REMOVE_PRIVATE_AS) {
        let mut command = String::from("remove-private-AS");
        if own.contains(AfFlags::REMOVE_PRIVATE_AS_ALL) {
            command.push_str(" all");
        }
        if own.contains(AfFlags::REMOVE_PRIVATE_AS_REPLACE) {
            command.push_str(" replace-AS");
        }
        commands.push(command);
    }

    if own.contains(AfFlags::WEIGHT) {
        commands.push(format!("weight {}", af.weight.unwrap_or(0)));
    }
    commands
}

fn filter_lines(entity: &Peer, af: &AfConfig) -> Vec<String> {
    let mut commands = Vec::new();
    for kind in FilterKind::ALL {
        let directions: &[Direction] = if kind.is_directional() {
            &[Direction::In, Direction::Out]
        } else {
            &[Direction::In]
        };
        for direction in directions {
            let slot = af.filter(kind, *direction);
            let name = match &slot.name {
                Some(name) if entity.is_group() || slot.overridden => name,
                _ => continue,
            };
            if kind.is_directional() {
                commands.push(format!("{} {} {}", kind, name, direction));
            } else {
                commands.push(format!("{} {}", kind, name));
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use crate::backend::ConfigBackend;
    use crate::bgp::Vty;

    fn render(lines: &[&str]) -> String {
        let mut vty = Vty::new();
        for line in lines {
            vty.execute(line).unwrap();
        }
        vty.render_config()
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Vty::new().render_config(), "!\nend\n");
    }

    #[test]
    fn test_baseline_topology() {
        let config = render(&[
            "router bgp 100",
            "no bgp default ipv4-unicast",
            "neighbor PG-TEST peer-group",
            "neighbor 1.1.1.1 remote-as 200",
            "neighbor 1.1.1.1 peer-group PG-TEST",
        ]);
        assert!(config.contains("router bgp 100\n no bgp default ipv4-unicast\n"));
        assert!(config.contains(" neighbor PG-TEST peer-group\n"));
        assert!(config.contains(" neighbor 1.1.1.1 remote-as 200\n"));
        assert!(config.contains(" neighbor 1.1.1.1 peer-group PG-TEST\n"));
        assert!(!config.contains("address-family"));
    }

    #[test]
    fn test_member_renders_only_overrides() {
        let config = render(&[
            "router bgp 100",
            "no bgp default ipv4-unicast",
            "neighbor PG-TEST peer-group",
            "neighbor 1.1.1.1 remote-as 200",
            "address-family ipv6 unicast",
            "neighbor PG-TEST activate",
            "neighbor 1.1.1.1 activate",
            "neighbor PG-TEST maximum-prefix 20 2 restart 200",
            "neighbor 1.1.1.1 peer-group PG-TEST",
            "neighbor PG-TEST next-hop-self",
            "neighbor 1.1.1.1 attribute-unchanged as-path med",
        ]);
        assert!(config.contains(" address-family ipv6 unicast\n"));
        assert!(config.contains("  neighbor PG-TEST maximum-prefix 20 2 restart 200\n"));
        assert!(config.contains("  neighbor PG-TEST next-hop-self\n"));
        assert!(!config.contains("neighbor 1.1.1.1 next-hop-self"));
        assert!(!config.contains("neighbor 1.1.1.1 maximum-prefix"));
        assert!(config.contains("  neighbor 1.1.1.1 attribute-unchanged as-path med\n"));
        assert!(config.contains(" exit-address-family\n"));
    }

    #[test]
    fn test_parameter_forms() {
        let config = render(&[
            "router bgp 100",
            "neighbor 1.1.1.1 remote-as 200",
            "neighbor 1.1.1.1 allowas-in 1",
            "neighbor 1.1.1.1 maximum-prefix 10 warning-only",
            "neighbor 1.1.1.1 default-originate route-map RM-PEER",
            "neighbor 1.1.1.1 remove-private-AS all replace-AS",
            "neighbor 1.1.1.1 unsuppress-map UM-PEER",
            "neighbor 1.1.1.1 distribute-list FL-PEER out",
            "neighbor 1.1.1.1 capability orf prefix-list receive",
            "neighbor 1.1.1.1 advertisement-interval 10",
        ]);
        for expected in [
            "neighbor 1.1.1.1 allowas-in 1",
            "neighbor 1.1.1.1 maximum-prefix 10 warning-only",
            "neighbor 1.1.1.1 default-originate route-map RM-PEER",
            "neighbor 1.1.1.1 remove-private-AS all replace-AS",
            "neighbor 1.1.1.1 unsuppress-map UM-PEER",
            "neighbor 1.1.1.1 distribute-list FL-PEER out",
            "neighbor 1.1.1.1 capability orf prefix-list receive",
            "neighbor 1.1.1.1 advertisement-interval 10",
        ] {
            assert!(config.contains(expected), "missing [{}] in:\n{}", expected, config);
        }
        // Activation is implicit for ipv4 unicast here.
        assert!(!config.contains("activate"));
    }

    #[test]
    fn test_inverted_flag_renders_negated() {
        let config = render(&[
            "router bgp 100",
            "neighbor PG-TEST peer-group",
            "neighbor IP-TEST interface",
            "neighbor IP-TEST remote-as 200",
            "no neighbor IP-TEST capability extended-nexthop",
            "neighbor PG-TEST capability extended-nexthop",
        ]);
        assert!(config.contains(" no neighbor IP-TEST capability extended-nexthop\n"));
        assert!(config.contains(" neighbor PG-TEST capability extended-nexthop\n"));
    }
}
