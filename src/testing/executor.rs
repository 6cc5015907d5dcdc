//! Scenario executor
//!
//! Every case runs two passes from a fresh environment. The pair
//! (set on member, set on group) plus the join state is tracked across
//! steps and every step is followed by a full verification of both scopes.

use tracing::{info, info_span, warn};

use super::context::{ensure_eq, Failure, TestContext};
use super::custom::ValidationContext;
use super::reporter::CaseReport;
use crate::backend::{ConfigBackend, FilterState, FlagBits, FlagState, Handle, Session};
use crate::catalog::{AttrKind, Case, ExpandedCase};
use crate::common::config::TopologyConfig;

/// Run one case against a fresh backend
pub fn run_case(
    case: &Case,
    backend: Box<dyn ConfigBackend>,
    topology: &TopologyConfig,
) -> CaseReport {
    let description = case.description();
    let span = info_span!("case", case = %description);
    let _enter = span.enter();

    let mut ctx = TestContext::new(Session::open(backend));
    match case {
        Case::Invalid(entry) => ctx.record(Failure::internal(entry.reason.clone())),
        Case::Attribute(case) => {
            if let Err(failure) = Scenario::new(case, topology).run(&mut ctx) {
                ctx.record(failure);
            }
        }
    }

    let report = ctx.finish(description);
    if report.passed() {
        info!(steps = report.log.len(), "OK");
    } else {
        warn!(state = %report.state, error = report.error.as_deref().unwrap_or(""), "failed");
    }
    report
}

/// Scripted transitions of one expanded case
struct Scenario<'a> {
    case: &'a ExpandedCase,
    topology: &'a TopologyConfig,
    /// Member key as the backend stores it, refreshed on every lookup
    host: String,
    step: u32,
    member_set: bool,
    group_set: bool,
    joined: bool,
}

impl<'a> Scenario<'a> {
    fn new(case: &'a ExpandedCase, topology: &'a TopologyConfig) -> Self {
        let host = if case.attr.options.interface_member {
            topology.peer_interface.clone()
        } else {
            topology.peer_address.clone()
        };
        Self {
            case,
            topology,
            host,
            step: 0,
            member_set: false,
            group_set: false,
            joined: false,
        }
    }

    fn run(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        self.first_pass(ctx)?;
        self.second_pass(ctx)
    }

    /// member, group, join, group cleared
    fn first_pass(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        let skip_transfer = self.case.attr.options.skip_transfer;
        self.initialize(ctx, false)?;
        self.set_member(ctx, "set")?;
        self.set_group(ctx)?;
        if skip_transfer {
            ctx.suspend();
        }
        self.join(ctx, "add")?;
        if skip_transfer {
            ctx.resume();
        }
        self.unset_group(ctx)
    }

    /// join, re-join, then every edge between the four set states
    fn second_pass(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        self.initialize(ctx, true)?;
        self.set_member(ctx, "set")?;
        self.join(ctx, "add")?;
        self.join(ctx, "re-add")?;
        self.set_group(ctx)?;
        self.unset_group(ctx)?;
        self.set_group(ctx)?;
        self.set_member(ctx, "re-set")?;
        self.unset_member(ctx)?;
        self.unset_group(ctx)?;
        self.set_member(ctx, "set")
    }

    fn member_host(&self) -> &str {
        &self.host
    }

    fn group_name(&self) -> &str {
        &self.topology.peer_group
    }

    /// `no ` prefix of the form that sets the attribute on a scope
    fn enable_prefix(inverted: bool) -> &'static str {
        if inverted {
            "no "
        } else {
            ""
        }
    }

    fn disable_prefix(inverted: bool) -> &'static str {
        Self::enable_prefix(!inverted)
    }

    fn initialize(&mut self, ctx: &mut TestContext, again: bool) -> Result<(), Failure> {
        ctx.guard()?;
        ctx.log(format!(
            "prepare: {}initialize bgp test environment",
            if again { "re-" } else { "" }
        ));
        ctx.reset();
        self.member_set = false;
        self.group_set = false;
        self.joined = false;

        let topo = self.topology;
        let options = self.case.attr.options;
        let host = self.member_host().to_string();
        let remote_as = if options.use_ibgp {
            topo.local_asn
        } else {
            topo.peer_asn
        };

        ctx.execute(&format!("router bgp {}", topo.local_asn))?;
        ctx.execute("no bgp default ipv4-unicast")?;
        ctx.execute(&format!("neighbor {} peer-group", topo.peer_group))?;
        if options.interface_member {
            ctx.execute(&format!("neighbor {} interface", host))?;
        }
        ctx.execute(&format!("neighbor {} remote-as {}", host, remote_as))?;

        let member = ctx.session().lookup_member(&host).ok_or_else(|| {
            Failure::internal(format!("could not retrieve instance of bgp peer [{}]", host))
        })?;
        let group = ctx.session().lookup_group(&topo.peer_group).ok_or_else(|| {
            Failure::internal(format!(
                "could not retrieve instance of bgp peer-group [{}]",
                topo.peer_group
            ))
        })?;
        self.host = member.key().to_string();
        ctx.bind(member, group);

        if let Some(family) = self.case.family {
            ctx.log(format!("prepare: switch address-family to [{}]", family));
            ctx.execute(&format!("address-family {}", family.command_args()))?;
            ctx.execute(&format!("neighbor {} activate", topo.peer_group))?;
            ctx.execute(&format!("neighbor {} activate", self.host))?;
        }
        Ok(())
    }

    fn next_step(&mut self) -> u32 {
        self.step += 1;
        self.step
    }

    fn set_member(&mut self, ctx: &mut TestContext, verb: &str) -> Result<(), Failure> {
        let case = self.case;
        let attr = &case.attr;
        let step = self.next_step();
        ctx.log(format!(
            "case {:02}: {} {} [{}] on [{}]",
            step,
            verb,
            attr.kind.label(),
            attr.member_command(),
            self.member_host()
        ));
        ctx.execute(&format!(
            "{}neighbor {} {}",
            Self::enable_prefix(attr.options.invert_member),
            self.member_host(),
            attr.member_command()
        ))?;
        self.member_set = true;
        self.verify(ctx)
    }

    fn unset_member(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        let case = self.case;
        let attr = &case.attr;
        let step = self.next_step();
        ctx.log(format!(
            "case {:02}: unset {} [{}] on [{}]",
            step,
            attr.kind.label(),
            attr.member_command(),
            self.member_host()
        ));
        ctx.execute(&format!(
            "{}neighbor {} {}",
            Self::disable_prefix(attr.options.invert_member),
            self.member_host(),
            attr.member_command()
        ))?;
        self.member_set = false;
        self.verify(ctx)
    }

    fn set_group(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        let case = self.case;
        let attr = &case.attr;
        let step = self.next_step();
        ctx.log(format!(
            "case {:02}: set {} [{}] on [{}]",
            step,
            attr.kind.label(),
            attr.group_command(),
            self.group_name()
        ));
        ctx.execute(&format!(
            "{}neighbor {} {}",
            Self::enable_prefix(attr.options.invert_group),
            self.group_name(),
            attr.group_command()
        ))?;
        self.group_set = true;
        self.verify(ctx)
    }

    fn unset_group(&mut self, ctx: &mut TestContext) -> Result<(), Failure> {
        let case = self.case;
        let attr = &case.attr;
        let step = self.next_step();
        ctx.log(format!(
            "case {:02}: unset {} [{}] on [{}]",
            step,
            attr.kind.label(),
            attr.group_command(),
            self.group_name()
        ));
        ctx.execute(&format!(
            "{}neighbor {} {}",
            Self::disable_prefix(attr.options.invert_group),
            self.group_name(),
            attr.group_command()
        ))?;
        self.group_set = false;
        self.verify(ctx)
    }

    fn join(&mut self, ctx: &mut TestContext, verb: &str) -> Result<(), Failure> {
        let step = self.next_step();
        ctx.log(format!(
            "case {:02}: {} peer [{}] to group [{}]",
            step,
            verb,
            self.member_host(),
            self.group_name()
        ));
        ctx.execute(&format!(
            "neighbor {} peer-group {}",
            self.member_host(),
            self.group_name()
        ))?;
        self.joined = true;
        self.verify(ctx)
    }

    /// Check rendered text and stored state of both scopes
    fn verify(&self, ctx: &TestContext) -> Result<(), Failure> {
        ctx.guard()?;
        if ctx.is_suspended() {
            return Ok(());
        }
        self.verify_config(ctx)?;
        self.verify_state(ctx)
    }

    fn verify_config(&self, ctx: &TestContext) -> Result<(), Failure> {
        let attr = &self.case.attr;
        let host = self.member_host();
        let group = self.group_name();

        if self.joined {
            let interface = if attr.options.interface_member {
                "interface "
            } else {
                ""
            };
            ctx.expect_config(
                &format!("neighbor {} {}peer-group {}", host, interface, group),
                true,
            )?;
        }

        if self.member_set {
            ctx.expect_config(
                &format!(
                    "{}neighbor {} {}",
                    Self::enable_prefix(attr.options.invert_member),
                    host,
                    attr.member_command()
                ),
                true,
            )?;
        } else {
            ctx.expect_config(&format!("neighbor {} {}", host, attr.command), false)?;
        }

        if self.group_set {
            ctx.expect_config(
                &format!(
                    "{}neighbor {} {}",
                    Self::enable_prefix(attr.options.invert_group),
                    group,
                    attr.group_command()
                ),
                true,
            )
        } else {
            ctx.expect_config(&format!("neighbor {} {}", group, attr.command), false)
        }
    }

    fn verify_state(&self, ctx: &TestContext) -> Result<(), Failure> {
        let (member, group) = ctx.handles()?;
        let attr = &self.case.attr;
        let effective = self.member_set || self.group_set;

        match &attr.kind {
            AttrKind::GlobalFlag(bits) => {
                self.check_flags(ctx, member, group, FlagBits::Global(*bits))
            }
            AttrKind::FamilyFlag(bits) => {
                self.check_flags(ctx, member, group, FlagBits::Family(*bits))
            }
            AttrKind::FamilyFilter { .. } => {
                self.check_filter(ctx, member, effective, self.member_set)?;
                self.check_filter(ctx, group, self.group_set, false)
            }
            AttrKind::GlobalCustom(_) | AttrKind::FamilyCustom(_) => {
                let Some(validator) = attr.kind.validator() else {
                    return Ok(());
                };
                let vctx = ValidationContext::new(ctx.session(), self.case.family, attr.options);
                validator
                    .validate(&vctx, member, group, self.member_set, self.group_set)
                    .map_err(Failure::into_custom)
            }
        }
    }

    fn check_flags(
        &self,
        ctx: &TestContext,
        member: &Handle,
        group: &Handle,
        bits: FlagBits,
    ) -> Result<(), Failure> {
        let options = self.case.attr.options;
        self.check_flag(
            ctx,
            member,
            bits,
            self.member_set || self.group_set,
            self.member_set,
            options.invert_member,
        )?;
        self.check_flag(ctx, group, bits, self.group_set, false, options.invert_group)
    }

    fn check_flag(
        &self,
        ctx: &TestContext,
        handle: &Handle,
        bits: FlagBits,
        set: bool,
        overridden: bool,
        inverted: bool,
    ) -> Result<(), Failure> {
        let state: FlagState = ctx
            .session()
            .read_flag(handle, bits, self.case.family)
            .map_err(|e| read_failure(handle, e))?;
        let scope = scope_name(handle);
        ensure_eq(&format!("{}.value", scope), state.value, set ^ inverted)?;
        ensure_eq(&format!("{}.override", scope), state.overridden, overridden)?;
        ensure_eq(&format!("{}.invert", scope), state.inverted, inverted)
    }

    fn check_filter(
        &self,
        ctx: &TestContext,
        handle: &Handle,
        attached: bool,
        overridden: bool,
    ) -> Result<(), Failure> {
        let AttrKind::FamilyFilter { kind, direction } = self.case.attr.kind else {
            return Err(Failure::internal("filter check on a non-filter attribute"));
        };
        let family = self
            .case
            .family
            .ok_or_else(|| Failure::internal(format!("filter [{}] has no address family", kind)))?;
        let state: FilterState = ctx
            .session()
            .read_filter(handle, kind, direction, family)
            .map_err(|e| read_failure(handle, e))?;
        let scope = scope_name(handle);
        ensure_eq(&format!("{}.override", scope), state.overridden, overridden)?;
        ensure_eq(&format!("{}.attached", scope), state.attached, attached)
    }
}

fn scope_name(handle: &Handle) -> &'static str {
    if handle.is_group() {
        "group"
    } else {
        "member"
    }
}

fn read_failure(handle: &Handle, error: crate::backend::AccessError) -> Failure {
    Failure::internal(format!("could not read state of [{}]: {}", handle, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccessError, CommandError, FilterState, Setting};
    use crate::bgp::{AfFlags, Afi, Direction, Family, FilterKind, PeerFlags, Safi, Vty};
    use crate::catalog::{builtin, expand, AttrOptions, AttributeDescriptor, InvalidEntry};
    use crate::testing::TestState;

    fn run(attr: AttributeDescriptor, family: Option<Family>) -> CaseReport {
        let case = Case::Attribute(ExpandedCase { attr, family });
        run_case(&case, Box::new(Vty::new()), &TopologyConfig::default())
    }

    const V4: Option<Family> = Some(Family::new(Afi::Ipv4, Safi::Unicast));

    #[test]
    fn test_global_flag_passes() {
        let report = run(
            AttributeDescriptor::new("passive", AttrKind::GlobalFlag(PeerFlags::PASSIVE)),
            None,
        );
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
        assert_eq!(report.log[0], "prepare: initialize bgp test environment");
        assert_eq!(report.log[1], "case 01: set peer-flag [passive] on [1.1.1.1]");
        assert_eq!(report.log[3], "case 03: add peer [1.1.1.1] to group [PG-TEST]");
        assert_eq!(report.log[5], "prepare: re-initialize bgp test environment");
        assert_eq!(report.log[8], "case 07: re-add peer [1.1.1.1] to group [PG-TEST]");
        assert_eq!(report.log[12], "case 11: re-set peer-flag [passive] on [1.1.1.1]");
        assert_eq!(
            report.log.last().map(String::as_str),
            Some("case 14: set peer-flag [passive] on [1.1.1.1]")
        );
        assert_eq!(report.log.len(), 16);
    }

    #[test]
    fn test_family_case_switches_family() {
        let report = run(
            AttributeDescriptor::new("as-override", AttrKind::FamilyFlag(AfFlags::AS_OVERRIDE)),
            Some(Family::new(Afi::Ipv6, Safi::Multicast)),
        );
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
        assert_eq!(report.log[1], "prepare: switch address-family to [IPv6 Multicast]");
        assert_eq!(report.log[2], "case 01: set af-flag [as-override] on [1.1.1.1]");
    }

    #[test]
    fn test_inverted_interface_member() {
        let attr = AttributeDescriptor::new(
            "capability extended-nexthop",
            AttrKind::GlobalFlag(PeerFlags::CAPABILITY_ENHE),
        )
        .with_options(AttrOptions {
            invert_member: true,
            interface_member: true,
            ..AttrOptions::default()
        });
        let report = run(attr, None);
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
        assert_eq!(
            report.log[1],
            "case 01: set peer-flag [capability extended-nexthop] on [IP-TEST]"
        );
    }

    #[test]
    fn test_filter_case() {
        let attr = AttributeDescriptor::new(
            "route-map",
            AttrKind::FamilyFilter {
                kind: FilterKind::RouteMap,
                direction: Direction::In,
            },
        )
        .with_commands("route-map RM-PEER in", "route-map RM-GROUP in");
        let report = run(attr, V4);
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
        assert_eq!(report.log[2], "case 01: set af-filter [route-map RM-PEER in] on [1.1.1.1]");
    }

    #[test]
    fn test_wrong_flag_is_assert_error() {
        // the command sets PASSIVE, the descriptor watches SHUTDOWN
        let report = run(
            AttributeDescriptor::new("passive", AttrKind::GlobalFlag(PeerFlags::SHUTDOWN)),
            None,
        );
        assert_eq!(report.state, TestState::AssertError);
        assert_eq!(
            report.error.as_deref(),
            Some("assertion failed: member.value[false] == [true]")
        );
        // nothing logged past the failing step
        assert_eq!(report.log.len(), 2);
    }

    #[test]
    fn test_rejected_command_is_command_error() {
        let report = run(
            AttributeDescriptor::new("no-such-knob", AttrKind::GlobalFlag(PeerFlags::PASSIVE)),
            None,
        );
        assert_eq!(report.state, TestState::CommandError);
        assert_eq!(
            report.error.as_deref(),
            Some("execution of command [neighbor 1.1.1.1 no-such-knob] has failed with code [2]")
        );
    }

    #[test]
    fn test_unrendered_form_is_config_error() {
        // the default threshold is accepted but never rendered
        let attr = AttributeDescriptor::new("maximum-prefix", AttrKind::FamilyFlag(AfFlags::MAX_PREFIX))
            .with_commands("maximum-prefix 10 75", "maximum-prefix 20");
        let report = run(attr, V4);
        assert_eq!(report.state, TestState::ConfigError);
        assert_eq!(
            report.error.as_deref(),
            Some("expected config [neighbor 1.1.1.1 maximum-prefix 10 75] to be present")
        );
    }

    #[test]
    fn test_custom_failure_is_retagged() {
        let attr = AttributeDescriptor::new(
            "weight",
            AttrKind::FamilyCustom(crate::testing::custom::lookup("weight")),
        )
        .with_commands("weight 150", "weight 200");
        let report = run(attr, V4);
        assert_eq!(report.state, TestState::CustomError);
        assert_eq!(
            report.error.as_deref(),
            Some("custom handler failed: assertion failed: member.weight[150] == [100]")
        );
    }

    #[test]
    fn test_custom_without_validator_only_checks_config() {
        let attr = AttributeDescriptor::new("weight", AttrKind::FamilyCustom(None))
            .with_commands("weight 150", "weight 250");
        let report = run(attr, V4);
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
    }

    #[test]
    fn test_invalid_entry_is_internal_error() {
        let case = Case::Invalid(InvalidEntry {
            command: "bogus".into(),
            reason: "invalid attribute type [bogus]".into(),
        });
        let report = run_case(&case, Box::new(Vty::new()), &TopologyConfig::default());
        assert_eq!(report.state, TestState::InternalError);
        assert_eq!(report.description, "peer\\bogus");
        assert!(report.log.is_empty());
    }

    /// Backend that accepts everything but never knows the neighbor
    struct Forgetful(Vty);

    impl ConfigBackend for Forgetful {
        fn execute(&mut self, line: &str) -> Result<(), CommandError> {
            self.0.execute(line)
        }
        fn render_config(&self) -> String {
            self.0.render_config()
        }
        fn read_flag(&self, h: &Handle, b: FlagBits, f: Option<Family>) -> Result<FlagState, AccessError> {
            self.0.read_flag(h, b, f)
        }
        fn read_filter(
            &self,
            h: &Handle,
            k: FilterKind,
            d: Direction,
            f: Family,
        ) -> Result<FilterState, AccessError> {
            self.0.read_filter(h, k, d, f)
        }
        fn read_setting(&self, h: &Handle, s: Setting, f: Option<Family>) -> Result<u32, AccessError> {
            self.0.read_setting(h, s, f)
        }
        fn lookup_member(&self, _identifier: &str) -> Option<Handle> {
            None
        }
        fn lookup_group(&self, name: &str) -> Option<Handle> {
            self.0.lookup_group(name)
        }
        fn reset(&mut self) {
            self.0.reset()
        }
    }

    #[test]
    fn test_missing_member_is_internal_error() {
        let case = Case::Attribute(ExpandedCase {
            attr: AttributeDescriptor::new("passive", AttrKind::GlobalFlag(PeerFlags::PASSIVE)),
            family: None,
        });
        let report = run_case(
            &case,
            Box::new(Forgetful(Vty::new())),
            &TopologyConfig::default(),
        );
        assert_eq!(report.state, TestState::InternalError);
        assert_eq!(
            report.error.as_deref(),
            Some("could not retrieve instance of bgp peer [1.1.1.1]")
        );
    }

    #[test]
    fn test_skip_transfer_still_runs_commands() {
        let attr = AttributeDescriptor::new(
            "route-reflector-client",
            AttrKind::FamilyFlag(AfFlags::REFLECTOR_CLIENT),
        )
        .with_options(AttrOptions {
            use_ibgp: true,
            skip_transfer: true,
            ..AttrOptions::default()
        });
        let report = run(attr, V4);
        assert_eq!(report.state, TestState::Success, "{:?}", report.error);
        assert_eq!(report.log.len(), 18);
    }

    #[test]
    fn test_every_builtin_case_passes() {
        let topology = TopologyConfig::default();
        for case in expand(&builtin()) {
            let report = run_case(&case, Box::new(Vty::new()), &topology);
            assert_eq!(
                report.state,
                TestState::Success,
                "{}: {:?}",
                report.description,
                report.error
            );
        }
    }
}
