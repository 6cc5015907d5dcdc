//! Built-in attribute list

use super::{AttrKind, AttrOptions, AttributeDescriptor, CatalogEntry};
use crate::bgp::{AfFlags, Direction, FilterKind, PeerFlags};
use crate::testing::custom;

fn peer_flag(command: &str, bits: PeerFlags) -> AttributeDescriptor {
    AttributeDescriptor::new(command, AttrKind::GlobalFlag(bits))
}

fn af_flag(command: &str, bits: AfFlags) -> AttributeDescriptor {
    AttributeDescriptor::new(command, AttrKind::FamilyFlag(bits))
}

fn af_filter(kind: FilterKind, direction: Direction) -> AttributeDescriptor {
    let (member, group) = match kind {
        FilterKind::UnsuppressMap => (
            "unsuppress-map UM-PEER".to_string(),
            "unsuppress-map UM-GROUP".to_string(),
        ),
        _ => {
            let prefix = match kind {
                FilterKind::PrefixList => "PL",
                FilterKind::RouteMap => "RM",
                _ => "FL",
            };
            (
                format!("{} {}-PEER {}", kind, prefix, direction),
                format!("{} {}-GROUP {}", kind, prefix, direction),
            )
        }
    };
    AttributeDescriptor::new(kind.keyword(), AttrKind::FamilyFilter { kind, direction })
        .with_commands(&member, &group)
}

/// Every attribute exercised when no catalog file is given
pub fn builtin() -> Vec<CatalogEntry> {
    let inverted = AttrOptions {
        invert_member: true,
        invert_group: true,
        ..AttrOptions::default()
    };
    let attrs = vec![
        AttributeDescriptor::new(
            "advertisement-interval",
            AttrKind::GlobalCustom(custom::lookup("advertisement-interval")),
        )
        .with_commands("advertisement-interval 10", "advertisement-interval 20"),
        peer_flag("capability dynamic", PeerFlags::DYNAMIC_CAPABILITY),
        peer_flag("capability extended-nexthop", PeerFlags::CAPABILITY_ENHE),
        peer_flag("capability extended-nexthop", PeerFlags::CAPABILITY_ENHE).with_options(
            AttrOptions {
                invert_member: true,
                interface_member: true,
                ..AttrOptions::default()
            },
        ),
        peer_flag("disable-connected-check", PeerFlags::DISABLE_CONNECTED_CHECK),
        peer_flag("dont-capability-negotiate", PeerFlags::DONT_CAPABILITY),
        peer_flag("enforce-first-as", PeerFlags::ENFORCE_FIRST_AS),
        peer_flag("override-capability", PeerFlags::OVERRIDE_CAPABILITY),
        peer_flag("passive", PeerFlags::PASSIVE),
        peer_flag("shutdown", PeerFlags::SHUTDOWN),
        peer_flag("strict-capability-match", PeerFlags::STRICT_CAP_MATCH),
        af_flag("addpath-tx-all-paths", AfFlags::ADDPATH_TX_ALL_PATHS),
        af_flag("addpath-tx-bestpath-per-AS", AfFlags::ADDPATH_TX_BESTPATH_PER_AS),
        af_flag("allowas-in", AfFlags::ALLOWAS_IN).with_commands("allowas-in 1", "allowas-in 2"),
        af_flag("allowas-in origin", AfFlags::ALLOWAS_IN_ORIGIN),
        af_flag("as-override", AfFlags::AS_OVERRIDE),
        af_flag("attribute-unchanged as-path", AfFlags::AS_PATH_UNCHANGED),
        af_flag("attribute-unchanged next-hop", AfFlags::NEXTHOP_UNCHANGED),
        af_flag("attribute-unchanged med", AfFlags::MED_UNCHANGED),
        af_flag(
            "attribute-unchanged as-path next-hop",
            AfFlags::AS_PATH_UNCHANGED | AfFlags::NEXTHOP_UNCHANGED,
        ),
        af_flag(
            "attribute-unchanged as-path med",
            AfFlags::AS_PATH_UNCHANGED | AfFlags::MED_UNCHANGED,
        ),
        af_flag(
            "attribute-unchanged as-path next-hop med",
            AfFlags::ATTRIBUTE_UNCHANGED,
        ),
        af_flag("capability orf prefix-list send", AfFlags::ORF_PREFIX_SM),
        af_flag("capability orf prefix-list receive", AfFlags::ORF_PREFIX_RM),
        af_flag(
            "capability orf prefix-list both",
            AfFlags::ORF_PREFIX_SM | AfFlags::ORF_PREFIX_RM,
        ),
        af_flag("default-originate", AfFlags::DEFAULT_ORIGINATE),
        af_flag("default-originate route-map", AfFlags::DEFAULT_ORIGINATE).with_commands(
            "default-originate route-map RM-PEER",
            "default-originate route-map RM-GROUP",
        ),
        af_filter(FilterKind::DistributeList, Direction::In),
        af_filter(FilterKind::DistributeList, Direction::Out),
        af_filter(FilterKind::FilterList, Direction::In),
        af_filter(FilterKind::FilterList, Direction::Out),
        af_flag("maximum-prefix", AfFlags::MAX_PREFIX)
            .with_commands("maximum-prefix 10", "maximum-prefix 20"),
        af_flag("maximum-prefix", AfFlags::MAX_PREFIX)
            .with_commands("maximum-prefix 10 restart 100", "maximum-prefix 20 restart 200"),
        af_flag("maximum-prefix", AfFlags::MAX_PREFIX).with_commands(
            "maximum-prefix 10 1 restart 100",
            "maximum-prefix 20 2 restart 200",
        ),
        af_flag("maximum-prefix", AfFlags::MAX_PREFIX | AfFlags::MAX_PREFIX_WARNING)
            .with_commands("maximum-prefix 10 warning-only", "maximum-prefix 20 warning-only"),
        af_flag("maximum-prefix", AfFlags::MAX_PREFIX | AfFlags::MAX_PREFIX_WARNING).with_commands(
            "maximum-prefix 10 1 warning-only",
            "maximum-prefix 20 2 warning-only",
        ),
        af_flag("next-hop-self", AfFlags::NEXTHOP_SELF),
        af_flag("next-hop-self force", AfFlags::FORCE_NEXTHOP_SELF),
        af_filter(FilterKind::PrefixList, Direction::In),
        af_filter(FilterKind::PrefixList, Direction::Out),
        af_flag("remove-private-AS", AfFlags::REMOVE_PRIVATE_AS),
        af_flag(
            "remove-private-AS all",
            AfFlags::REMOVE_PRIVATE_AS | AfFlags::REMOVE_PRIVATE_AS_ALL,
        ),
        af_flag(
            "remove-private-AS replace-AS",
            AfFlags::REMOVE_PRIVATE_AS | AfFlags::REMOVE_PRIVATE_AS_REPLACE,
        ),
        af_flag(
            "remove-private-AS all replace-AS",
            AfFlags::REMOVE_PRIVATE_AS_ALL_REPLACE,
        ),
        af_filter(FilterKind::RouteMap, Direction::In),
        af_filter(FilterKind::RouteMap, Direction::Out),
        af_flag("route-reflector-client", AfFlags::REFLECTOR_CLIENT).with_options(AttrOptions {
            use_ibgp: true,
            skip_transfer: true,
            ..AttrOptions::default()
        }),
        af_flag("route-server-client", AfFlags::RSERVER_CLIENT),
        af_flag("send-community", AfFlags::SEND_COMMUNITY).with_options(inverted),
        af_flag("send-community extended", AfFlags::SEND_EXT_COMMUNITY).with_options(inverted),
        af_flag("send-community large", AfFlags::SEND_LARGE_COMMUNITY).with_options(inverted),
        af_flag("soft-reconfiguration inbound", AfFlags::SOFT_RECONFIG),
        af_filter(FilterKind::UnsuppressMap, Direction::In),
        af_flag("weight", AfFlags::WEIGHT).with_commands("weight 100", "weight 200"),
        AttributeDescriptor::new("weight", AttrKind::FamilyCustom(custom::lookup("weight")))
            .with_name("weight value")
            .with_commands("weight 100", "weight 200"),
    ];
    attrs.into_iter().map(CatalogEntry::Attribute).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{expand, Case};

    fn find<'a>(entries: &'a [CatalogEntry], command: &str) -> Vec<&'a AttributeDescriptor> {
        entries
            .iter()
            .filter_map(|e| match e {
                CatalogEntry::Attribute(attr) if attr.command == command => Some(attr),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_builtin_has_no_invalid_entries() {
        assert!(builtin()
            .iter()
            .all(|e| matches!(e, CatalogEntry::Attribute(_))));
    }

    #[test]
    fn test_custom_handlers_resolve() {
        let entries = builtin();
        let interval = find(&entries, "advertisement-interval");
        assert_eq!(interval.len(), 1);
        assert!(interval[0].kind.validator().is_some());
        assert!(!interval[0].kind.is_family_scoped());

        let weight = find(&entries, "weight");
        assert_eq!(weight.len(), 2);
        assert!(weight
            .iter()
            .any(|w| matches!(&w.kind, AttrKind::FamilyCustom(Some(_)))));
    }

    #[test]
    fn test_weight_cases_are_distinguishable() {
        let weight: Vec<String> = expand(&builtin())
            .iter()
            .map(Case::description)
            .filter(|d| d.starts_with("peer\\ipv4-unicast\\weight"))
            .collect();
        assert_eq!(
            weight,
            vec!["peer\\ipv4-unicast\\weight", "peer\\ipv4-unicast\\weight value"]
        );
    }

    #[test]
    fn test_scope_options() {
        let entries = builtin();
        let enhe = find(&entries, "capability extended-nexthop");
        assert_eq!(enhe.len(), 2);
        assert!(enhe[1].options.interface_member);
        assert!(enhe[1].options.invert_member);
        assert!(!enhe[1].options.invert_group);

        let rr = find(&entries, "route-reflector-client");
        assert!(rr[0].options.use_ibgp && rr[0].options.skip_transfer);

        for cmd in ["send-community", "send-community extended", "send-community large"] {
            let attr = find(&entries, cmd)[0];
            assert!(attr.options.invert_member && attr.options.invert_group);
        }
    }

    #[test]
    fn test_filter_commands() {
        let entries = builtin();
        let route_maps = find(&entries, "route-map");
        assert_eq!(route_maps[0].member_command(), "route-map RM-PEER in");
        assert_eq!(route_maps[1].group_command(), "route-map RM-GROUP out");
        let unsuppress = find(&entries, "unsuppress-map");
        assert_eq!(unsuppress[0].member_command(), "unsuppress-map UM-PEER");
        let prefix = find(&entries, "prefix-list");
        assert_eq!(prefix[0].group_command(), "prefix-list PL-GROUP in");
    }

    #[test]
    fn test_expansion_counts() {
        let cases = expand(&builtin());
        let global = cases
            .iter()
            .filter(|c| matches!(c, Case::Attribute(c) if c.family.is_none()))
            .count();
        assert_eq!(global, 11);
        assert_eq!(cases.len(), 11 + (builtin().len() - 11) * 4);
    }
}
