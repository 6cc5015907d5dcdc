//! Line-oriented command interpreter
//!
//! Commands are matched against the current node first and then against
//! each parent node, so a neighbor command typed inside an address-family
//! block still reaches the router node.

use std::fmt::Display;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;

use tracing::{debug, trace};

use super::instance::{BgpInstance, Target};
use super::peer::{
    default_routeadv, AfConfig, MaxPrefix, Peer, PeerSort, DEFAULT_ALLOWAS_IN,
    DEFAULT_MAX_PREFIX_THRESHOLD,
};
use super::render;
use super::types::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi};
use crate::backend::{
    AccessError, CommandError, CommandStatus, ConfigBackend, FilterState, FlagBits, FlagState,
    Handle, Setting,
};

/// Family-independent flags set by a bare keyword
pub(super) const PEER_FLAG_COMMANDS: &[(&str, PeerFlags)] = &[
    ("capability dynamic", PeerFlags::DYNAMIC_CAPABILITY),
    ("capability extended-nexthop", PeerFlags::CAPABILITY_ENHE),
    ("disable-connected-check", PeerFlags::DISABLE_CONNECTED_CHECK),
    ("dont-capability-negotiate", PeerFlags::DONT_CAPABILITY),
    ("enforce-first-as", PeerFlags::ENFORCE_FIRST_AS),
    ("override-capability", PeerFlags::OVERRIDE_CAPABILITY),
    ("passive", PeerFlags::PASSIVE),
    ("shutdown", PeerFlags::SHUTDOWN),
    ("strict-capability-match", PeerFlags::STRICT_CAP_MATCH),
];

/// Per-family flags set by a bare keyword, with the bits the positive
/// form clears
pub(super) const AF_FLAG_COMMANDS: &[(&str, AfFlags, AfFlags)] = &[
    (
        "addpath-tx-all-paths",
        AfFlags::ADDPATH_TX_ALL_PATHS,
        AfFlags::ADDPATH_TX_BESTPATH_PER_AS,
    ),
    (
        "addpath-tx-bestpath-per-AS",
        AfFlags::ADDPATH_TX_BESTPATH_PER_AS,
        AfFlags::ADDPATH_TX_ALL_PATHS,
    ),
    ("as-override", AfFlags::AS_OVERRIDE, AfFlags::empty()),
    ("next-hop-self", AfFlags::NEXTHOP_SELF, AfFlags::empty()),
    ("next-hop-self force", AfFlags::FORCE_NEXTHOP_SELF, AfFlags::empty()),
    ("route-reflector-client", AfFlags::REFLECTOR_CLIENT, AfFlags::empty()),
    ("route-server-client", AfFlags::RSERVER_CLIENT, AfFlags::empty()),
    ("send-community", AfFlags::SEND_COMMUNITY, AfFlags::empty()),
    ("send-community extended", AfFlags::SEND_EXT_COMMUNITY, AfFlags::empty()),
    ("send-community large", AfFlags::SEND_LARGE_COMMUNITY, AfFlags::empty()),
    ("soft-reconfiguration inbound", AfFlags::SOFT_RECONFIG, AfFlags::empty()),
];

const ATTRIBUTE_UNCHANGED_OPTIONS: &[(&str, AfFlags)] = &[
    ("as-path", AfFlags::AS_PATH_UNCHANGED),
    ("next-hop", AfFlags::NEXTHOP_UNCHANGED),
    ("med", AfFlags::MED_UNCHANGED),
];

const ORF_MODES: &[(&str, AfFlags)] = &[
    ("send", AfFlags::ORF_PREFIX_SM),
    ("receive", AfFlags::ORF_PREFIX_RM),
    ("both", AfFlags::ORF_PREFIX_SM.union(AfFlags::ORF_PREFIX_RM)),
];

const ORF_MASK: AfFlags = AfFlags::ORF_PREFIX_SM.union(AfFlags::ORF_PREFIX_RM);
const ALLOWAS_IN_MASK: AfFlags = AfFlags::ALLOWAS_IN.union(AfFlags::ALLOWAS_IN_ORIGIN);
const MAX_PREFIX_MASK: AfFlags = AfFlags::MAX_PREFIX.union(AfFlags::MAX_PREFIX_WARNING);
const REMOVE_PRIVATE_AS_MASK: AfFlags =
    AfFlags::REMOVE_PRIVATE_AS.union(AfFlags::REMOVE_PRIVATE_AS_ALL_REPLACE);

/// Command node the interpreter is positioned at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Config,
    Bgp,
    AddressFamily(Family),
}

impl Node {
    fn parent(self) -> Option<Node> {
        match self {
            Node::AddressFamily(_) => Some(Node::Bgp),
            Node::Bgp => Some(Node::Config),
            Node::Config => None,
        }
    }

    /// Family targeted by per-family commands at this node
    fn family(self) -> Family {
        match self {
            Node::AddressFamily(family) => family,
            _ => Family::new(Afi::Ipv4, Safi::Unicast),
        }
    }
}

/// In-process configuration backend with a single BGP instance
#[derive(Debug)]
pub struct Vty {
    node: Node,
    bgp: Option<BgpInstance>,
}

impl Default for Vty {
    fn default() -> Self {
        Self::new()
    }
}

impl Vty {
    pub fn new() -> Self {
        Self {
            node: Node::Config,
            bgp: None,
        }
    }

    fn dispatch(&mut self, node: Node, negate: bool, words: &[&str]) -> Result<(), CommandError> {
        match (node, words[0]) {
            (Node::Config, "router") => self.router_bgp(negate, &words[1..]),
            (Node::Bgp | Node::AddressFamily(_), "neighbor") => {
                self.neighbor(node.family(), negate, &words[1..])
            }
            (Node::Bgp, "bgp") => self.bgp_option(negate, &words[1..]),
            (Node::Bgp, "address-family") if !negate => self.address_family(&words[1..]),
            (Node::AddressFamily(_), "exit-address-family") if !negate => {
                self.node = Node::Bgp;
                Ok(())
            }
            (_, "exit") if !negate => {
                self.node = node.parent().unwrap_or(Node::Config);
                Ok(())
            }
            _ => Err(unknown(negate, words)),
        }
    }

    fn instance(&mut self) -> Result<&mut BgpInstance, CommandError> {
        self.bgp
            .as_mut()
            .ok_or_else(|| CommandError::warning("% No BGP process is configured"))
    }

    fn router_bgp(&mut self, negate: bool, args: &[&str]) -> Result<(), CommandError> {
        if args.first() != Some(&"bgp") {
            return Err(CommandError::no_match("% Unknown command: router"));
        }

        if negate {
            if args.len() > 1 {
                let asn: u32 = number(args, 1, "AS number", 1..=u32::MAX)?;
                if self.bgp.as_ref().map(|b| b.asn) != Some(asn) {
                    return Err(CommandError::warning(format!(
                        "% BGP instance {} is not configured",
                        asn
                    )));
                }
            }
            self.instance()?;
            self.bgp = None;
            self.node = Node::Config;
            return Ok(());
        }

        let asn: u32 = number(args, 1, "AS number", 1..=u32::MAX)?;
        match self.bgp.as_ref().map(|b| b.asn) {
            Some(current) if current != asn => {
                return Err(CommandError::warning(format!(
                    "BGP is already running; AS is {}",
                    current
                )));
            }
            Some(_) => {}
            None => {
                debug!(asn, "bgp instance created");
                self.bgp = Some(BgpInstance::new(asn));
            }
        }
        self.node = Node::Bgp;
        Ok(())
    }

    fn bgp_option(&mut self, negate: bool, args: &[&str]) -> Result<(), CommandError> {
        match args {
            ["default", "ipv4-unicast"] => {
                self.instance()?.default_ipv4_unicast = !negate;
                Ok(())
            }
            _ => Err(CommandError::no_match("% Unknown command: bgp")),
        }
    }

    fn address_family(&mut self, args: &[&str]) -> Result<(), CommandError> {
        let afi = match args.first() {
            Some(word) => Afi::from_str(word).map_err(|e| CommandError::no_match(format!("% {}", e)))?,
            None => return Err(CommandError::incomplete("% Command incomplete: address-family")),
        };
        let safi = match args.get(1) {
            Some(word) => Safi::from_str(word).map_err(|e| CommandError::no_match(format!("% {}", e)))?,
            None => Safi::Unicast,
        };
        self.node = Node::AddressFamily(Family::new(afi, safi));
        Ok(())
    }

    fn neighbor(&mut self, family: Family, negate: bool, args: &[&str]) -> Result<(), CommandError> {
        let (host, rest) = match args {
            [host, rest @ ..] => (*host, rest),
            [] => return Err(CommandError::incomplete("% Command incomplete: neighbor")),
        };
        let bgp = self.instance()?;

        match rest {
            [] if negate => delete_neighbor(bgp, host),
            [] => Err(CommandError::incomplete("% Command incomplete: neighbor")),
            ["remote-as", asn @ ..] => remote_as(bgp, host, negate, asn),
            ["interface", group @ ..] => interface(bgp, host, negate, group),
            ["peer-group"] => peer_group(bgp, host, negate),
            ["peer-group", group] => peer_group_bind(bgp, host, negate, group),
            _ => {
                let target = bgp.resolve(host).ok_or_else(|| {
                    CommandError::warning("% Specify remote-as or peer-group commands first")
                })?;
                trace!(host, ?target, "neighbor command");
                apply(bgp, target, family, negate, rest)
            }
        }
    }

    fn target(&self, handle: &Handle) -> Result<(&BgpInstance, Target), AccessError> {
        let bgp = self.bgp.as_ref().ok_or(AccessError::NoInstance)?;
        let target = match handle {
            Handle::Member(host) => bgp.find_peer(host).map(Target::Member),
            Handle::Group(name) => bgp.find_group(name).map(Target::Group),
        };
        target
            .map(|t| (bgp, t))
            .ok_or_else(|| AccessError::UnknownHandle(handle.clone()))
    }
}

impl ConfigBackend for Vty {
    fn execute(&mut self, line: &str) -> Result<(), CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (negate, words) = match tokens.split_first() {
            Some((&"no", rest)) => (true, rest),
            Some(_) => (false, &tokens[..]),
            None => return Err(CommandError::no_match("% Unknown command: empty line")),
        };
        if words.is_empty() {
            return Err(CommandError::incomplete("% Command incomplete: no"));
        }

        let origin = self.node;
        let mut candidate = Some(origin);
        let mut first_miss = None;
        while let Some(node) = candidate {
            self.node = node;
            match self.dispatch(node, negate, words) {
                Ok(()) => return Ok(()),
                Err(err) if err.status == CommandStatus::NoMatch => {
                    first_miss.get_or_insert(err);
                    candidate = node.parent();
                }
                Err(err) => {
                    self.node = origin;
                    return Err(err);
                }
            }
        }
        self.node = origin;
        Err(first_miss.unwrap_or_else(|| unknown(negate, words)))
    }

    fn render_config(&self) -> String {
        render::running_config(self.bgp.as_ref())
    }

    fn read_flag(
        &self,
        handle: &Handle,
        bits: FlagBits,
        family: Option<Family>,
    ) -> Result<FlagState, AccessError> {
        let (bgp, target) = self.target(handle)?;
        let entity = bgp.entity(target);
        match bits {
            FlagBits::Global(bits) => Ok(entity.flags.state(bits)),
            FlagBits::Family(bits) => {
                let family = family.ok_or(AccessError::FamilyRequired("per-family flag"))?;
                Ok(entity.af(family).flags.state(bits))
            }
        }
    }

    fn read_filter(
        &self,
        handle: &Handle,
        kind: FilterKind,
        direction: Direction,
        family: Family,
    ) -> Result<FilterState, AccessError> {
        let (bgp, target) = self.target(handle)?;
        Ok(bgp.entity(target).af(family).filter_state(kind, direction))
    }

    fn read_setting(
        &self,
        handle: &Handle,
        setting: Setting,
        family: Option<Family>,
    ) -> Result<u32, AccessError> {
        let (bgp, target) = self.target(handle)?;
        let entity = bgp.entity(target);
        match setting {
            Setting::AdvertisementInterval => Ok(entity.routeadv.unwrap_or_else(|| {
                default_routeadv(bgp.sort(target) == Some(PeerSort::Internal))
            })),
            Setting::Weight => {
                let family = family.ok_or(AccessError::FamilyRequired("weight"))?;
                Ok(u32::from(entity.af(family).effective_weight()))
            }
        }
    }

    fn lookup_member(&self, identifier: &str) -> Option<Handle> {
        let bgp = self.bgp.as_ref()?;
        bgp.find_peer(identifier)
            .map(|idx| Handle::Member(bgp.peers[idx].host.clone()))
    }

    fn lookup_group(&self, name: &str) -> Option<Handle> {
        let bgp = self.bgp.as_ref()?;
        bgp.find_group(name)
            .map(|idx| Handle::Group(bgp.groups[idx].host.clone()))
    }

    fn reset(&mut self) {
        self.bgp = None;
        self.node = Node::Config;
    }
}

fn unknown(negate: bool, words: &[&str]) -> CommandError {
    let prefix = if negate { "no " } else { "" };
    CommandError::no_match(format!("% Unknown command: {}{}", prefix, words.join(" ")))
}

/// Parse `args[idx]` as a number within `range`
fn number<T>(args: &[&str], idx: usize, what: &str, range: RangeInclusive<T>) -> Result<T, CommandError>
where
    T: FromStr + PartialOrd + Display,
{
    let word = args
        .get(idx)
        .ok_or_else(|| CommandError::incomplete(format!("% Command incomplete: missing {}", what)))?;
    match word.parse::<T>() {
        Ok(value) if range.contains(&value) => Ok(value),
        _ => Err(CommandError::no_match(format!(
            "% Invalid {} '{}', expected {}-{}",
            what,
            word,
            range.start(),
            range.end()
        ))),
    }
}

fn delete_neighbor(bgp: &mut BgpInstance, host: &str) -> Result<(), CommandError> {
    match bgp.resolve(host) {
        Some(Target::Member(idx)) => bgp.delete_peer(idx),
        Some(Target::Group(idx)) => bgp.delete_group(idx),
        None => return Err(CommandError::warning("% Specify remote-as or peer-group commands first")),
    }
    Ok(())
}

fn remote_as(bgp: &mut BgpInstance, host: &str, negate: bool, args: &[&str]) -> Result<(), CommandError> {
    let target = bgp.resolve(host);
    if negate {
        return match target {
            Some(Target::Member(idx)) => {
                bgp.delete_peer(idx);
                Ok(())
            }
            Some(Target::Group(idx)) => {
                bgp.groups[idx].remote_as = None;
                Ok(())
            }
            None => Err(CommandError::warning("% Specify remote-as or peer-group commands first")),
        };
    }

    let asn = match args.first() {
        Some(&"internal") => bgp.asn,
        _ => number(args, 0, "AS number", 1..=u32::MAX)?,
    };
    match target {
        Some(target) => bgp.set_remote_as(target, asn),
        None => {
            let addr: IpAddr = host
                .parse()
                .map_err(|_| CommandError::warning("% Create the peer-group or interface first"))?;
            bgp.create_peer(Peer::address(addr), Some(asn));
            Ok(())
        }
    }
}

fn interface(bgp: &mut BgpInstance, host: &str, negate: bool, args: &[&str]) -> Result<(), CommandError> {
    if host.parse::<IpAddr>().is_ok() {
        return Err(CommandError::warning("% Cannot configure an address as interface"));
    }
    let group = match args {
        [] => None,
        ["peer-group", name] => Some(*name),
        ["peer-group"] => return Err(CommandError::incomplete("% Command incomplete: peer-group")),
        _ => return Err(unknown(negate, args)),
    };

    let existing = bgp.find_peer(host);
    if negate {
        let idx = existing.ok_or_else(|| CommandError::warning("% No such neighbor interface"))?;
        bgp.delete_peer(idx);
        return Ok(());
    }

    if bgp.find_group(host).is_some() {
        return Err(CommandError::warning("% Name conflict with peer-group"));
    }
    let idx = match existing {
        Some(idx) => idx,
        None => bgp.create_peer(Peer::interface(host), None),
    };
    match group {
        Some(name) => bgp.bind(idx, name),
        None => Ok(()),
    }
}

fn peer_group(bgp: &mut BgpInstance, name: &str, negate: bool) -> Result<(), CommandError> {
    if negate {
        let idx = bgp
            .find_group(name)
            .ok_or_else(|| CommandError::warning("% Create the peer-group first"))?;
        bgp.delete_group(idx);
        return Ok(());
    }
    if name.parse::<IpAddr>().is_ok() || bgp.find_peer(name).is_some() {
        return Err(CommandError::warning("% Name conflict with peer"));
    }
    bgp.create_group(name);
    Ok(())
}

fn peer_group_bind(bgp: &mut BgpInstance, host: &str, negate: bool, group: &str) -> Result<(), CommandError> {
    let idx = match bgp.resolve(host) {
        Some(Target::Member(idx)) => idx,
        Some(Target::Group(_)) => return Err(CommandError::warning("% Invalid command for a peer-group")),
        None if negate => return Err(CommandError::warning("% Specify remote-as or peer-group commands first")),
        None => {
            let addr: IpAddr = host
                .parse()
                .map_err(|_| CommandError::warning("% Create the peer-group or interface first"))?;
            let group_as = bgp
                .find_group(group)
                .and_then(|g| bgp.groups[g].remote_as)
                .ok_or_else(|| CommandError::warning("% Specify remote-as or peer-group remote AS first"))?;
            bgp.create_peer(Peer::address(addr), Some(group_as))
        }
    };
    if negate {
        bgp.unbind(idx, group)
    } else {
        bgp.bind(idx, group)
    }
}

/// Write a per-family flag command: the positive form raises `set` and
/// drops `clear`, the negated form drops `bits`
fn af_write<P>(
    bgp: &mut BgpInstance,
    target: Target,
    family: Family,
    negate: bool,
    bits: AfFlags,
    clear: AfFlags,
    params: P,
) -> Result<(), CommandError>
where
    P: FnOnce(&mut AfConfig),
{
    if negate {
        bgp.modify_af_flags(target, family, AfFlags::empty(), bits, params)
    } else {
        bgp.modify_af_flags(target, family, bits, clear.difference(bits), params)
    }
}

fn apply(
    bgp: &mut BgpInstance,
    target: Target,
    family: Family,
    negate: bool,
    words: &[&str],
) -> Result<(), CommandError> {
    let line = words.join(" ");

    if let Some((_, bits)) = PEER_FLAG_COMMANDS.iter().find(|(kw, _)| *kw == line) {
        return if negate {
            bgp.modify_peer_flags(target, PeerFlags::empty(), *bits, |_| {})
        } else {
            bgp.modify_peer_flags(target, *bits, PeerFlags::empty(), |_| {})
        };
    }
    if let Some((_, bits, clear)) = AF_FLAG_COMMANDS.iter().find(|(kw, _, _)| *kw == line) {
        return af_write(bgp, target, family, negate, *bits, *clear, |_| {});
    }

    let (keyword, args) = (words[0], &words[1..]);
    match keyword {
        "activate" if args.is_empty() => {
            bgp.set_activate(target, family, !negate);
            Ok(())
        }
        "shutdown" => {
            // `shutdown message <text>`
            let bits = PeerFlags::SHUTDOWN;
            if negate {
                bgp.modify_peer_flags(target, PeerFlags::empty(), bits, |_| {})
            } else if args.first() == Some(&"message") {
                bgp.modify_peer_flags(target, bits, PeerFlags::empty(), |_| {})
            } else {
                Err(unknown(negate, words))
            }
        }
        "advertisement-interval" => {
            if negate {
                bgp.modify_peer_flags(target, PeerFlags::empty(), PeerFlags::ROUTEADV, |p| {
                    p.routeadv = None
                })
            } else {
                let secs: u32 = number(args, 0, "advertisement interval", 0..=600)?;
                bgp.modify_peer_flags(target, PeerFlags::ROUTEADV, PeerFlags::empty(), |p| {
                    p.routeadv = Some(secs)
                })
            }
        }
        "send-community" => {
            let bits = match args {
                ["standard"] => AfFlags::SEND_COMMUNITY,
                ["both"] => AfFlags::SEND_COMMUNITY | AfFlags::SEND_EXT_COMMUNITY,
                ["all"] => AfFlags::SEND_ALL_COMMUNITIES,
                _ => return Err(unknown(negate, words)),
            };
            af_write(bgp, target, family, negate, bits, AfFlags::empty(), |_| {})
        }
        "allowas-in" => {
            if negate {
                return af_write(bgp, target, family, true, ALLOWAS_IN_MASK, AfFlags::empty(), |af| {
                    af.allowas_in = None
                });
            }
            match args {
                ["origin"] => af_write(
                    bgp,
                    target,
                    family,
                    false,
                    AfFlags::ALLOWAS_IN_ORIGIN,
                    ALLOWAS_IN_MASK,
                    |af| af.allowas_in = None,
                ),
                _ => {
                    let count = if args.is_empty() {
                        DEFAULT_ALLOWAS_IN
                    } else {
                        number(args, 0, "occurrence count", 1..=10)?
                    };
                    af_write(bgp, target, family, false, AfFlags::ALLOWAS_IN, ALLOWAS_IN_MASK, |af| {
                        af.allowas_in = Some(count)
                    })
                }
            }
        }
        "attribute-unchanged" => {
            let mut bits = AfFlags::empty();
            for arg in args {
                let (_, bit) = ATTRIBUTE_UNCHANGED_OPTIONS
                    .iter()
                    .find(|(kw, _)| kw == arg)
                    .ok_or_else(|| unknown(negate, words))?;
                bits |= *bit;
            }
            if bits.is_empty() {
                bits = AfFlags::ATTRIBUTE_UNCHANGED;
            }
            af_write(bgp, target, family, negate, bits, AfFlags::ATTRIBUTE_UNCHANGED, |_| {})
        }
        "capability" => {
            let mode = match args {
                ["orf", "prefix-list", mode] => *mode,
                ["orf", ..] => return Err(CommandError::incomplete("% Command incomplete: capability orf")),
                _ => return Err(unknown(negate, words)),
            };
            let (_, bits) = ORF_MODES
                .iter()
                .find(|(kw, _)| *kw == mode)
                .ok_or_else(|| unknown(negate, words))?;
            af_write(bgp, target, family, negate, *bits, ORF_MASK, |_| {})
        }
        "default-originate" => {
            let rmap = match args {
                [] => None,
                ["route-map", name] => Some(name.to_string()),
                ["route-map"] => return Err(CommandError::incomplete("% Command incomplete: route-map")),
                _ => return Err(unknown(negate, words)),
            };
            let rmap = if negate { None } else { rmap };
            af_write(bgp, target, family, negate, AfFlags::DEFAULT_ORIGINATE, AfFlags::empty(), |af| {
                af.default_rmap = rmap
            })
        }
        "maximum-prefix" => {
            if negate {
                return af_write(bgp, target, family, true, MAX_PREFIX_MASK, AfFlags::empty(), |af| {
                    af.max_prefix = None
                });
            }
            let (limits, warning) = parse_max_prefix(args)?;
            let bits = if warning {
                MAX_PREFIX_MASK
            } else {
                AfFlags::MAX_PREFIX
            };
            af_write(bgp, target, family, false, bits, MAX_PREFIX_MASK, |af| {
                af.max_prefix = Some(limits)
            })
        }
        "remove-private-AS" => {
            if negate {
                return af_write(bgp, target, family, true, REMOVE_PRIVATE_AS_MASK, AfFlags::empty(), |_| {});
            }
            let bits = match args {
                [] => AfFlags::REMOVE_PRIVATE_AS,
                ["all"] => AfFlags::REMOVE_PRIVATE_AS | AfFlags::REMOVE_PRIVATE_AS_ALL,
                ["replace-AS"] => AfFlags::REMOVE_PRIVATE_AS | AfFlags::REMOVE_PRIVATE_AS_REPLACE,
                ["all", "replace-AS"] => REMOVE_PRIVATE_AS_MASK,
                _ => return Err(unknown(negate, words)),
            };
            af_write(bgp, target, family, false, bits, REMOVE_PRIVATE_AS_MASK, |_| {})
        }
        "weight" => {
            if negate {
                return af_write(bgp, target, family, true, AfFlags::WEIGHT, AfFlags::empty(), |af| {
                    af.weight = None
                });
            }
            let weight: u16 = number(args, 0, "weight", 0..=u16::MAX)?;
            af_write(bgp, target, family, false, AfFlags::WEIGHT, AfFlags::empty(), |af| {
                af.weight = Some(weight)
            })
        }
        _ => match FilterKind::from_keyword(keyword) {
            Some(kind) => filter(bgp, target, family, negate, kind, args),
            None => Err(unknown(negate, words)),
        },
    }
}

/// `maximum-prefix MAX [THRESHOLD] [warning-only | restart MINUTES]`
fn parse_max_prefix(args: &[&str]) -> Result<(MaxPrefix, bool), CommandError> {
    let max: u32 = number(args, 0, "prefix limit", 1..=u32::MAX)?;
    let mut rest = &args[1..];
    let mut threshold = DEFAULT_MAX_PREFIX_THRESHOLD;
    if let Some(word) = rest.first() {
        if word.chars().all(|c| c.is_ascii_digit()) {
            threshold = number(rest, 0, "threshold", 1..=100)?;
            rest = &rest[1..];
        }
    }
    let (restart, warning) = match rest {
        [] => (None, false),
        ["warning-only"] => (None, true),
        ["restart", ..] => (Some(number(rest, 1, "restart interval", 1..=u16::MAX)?), false),
        _ => {
            return Err(CommandError::no_match(format!(
                "% Unknown command: maximum-prefix {}",
                args.join(" ")
            )))
        }
    };
    Ok((
        MaxPrefix {
            max,
            threshold,
            restart,
        },
        warning,
    ))
}

fn filter(
    bgp: &mut BgpInstance,
    target: Target,
    family: Family,
    negate: bool,
    kind: FilterKind,
    args: &[&str],
) -> Result<(), CommandError> {
    let (name, direction) = if kind.is_directional() {
        match args {
            [name, dir] => (Some(*name), *dir),
            [dir] if negate => (None, *dir),
            _ => {
                return Err(CommandError::incomplete(format!(
                    "% Command incomplete: {}",
                    kind
                )))
            }
        }
    } else {
        match args {
            [name] => (Some(*name), "in"),
            [] if negate => (None, "in"),
            _ => {
                return Err(CommandError::incomplete(format!(
                    "% Command incomplete: {}",
                    kind
                )))
            }
        }
    };
    let direction =
        Direction::from_str(direction).map_err(|e| CommandError::no_match(format!("% {}", e)))?;
    let name = if negate { None } else { name.map(str::to_string) };
    bgp.set_filter(target, family, kind, direction, name)
}
