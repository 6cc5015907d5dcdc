//! Custom validators for attributes that are not a plain flag or filter

use std::fmt;
use std::sync::Arc;

use super::context::{ensure_eq, Failure};
use crate::backend::{Handle, Session, Setting};
use crate::bgp::{default_routeadv, Family};
use crate::catalog::AttrOptions;

/// Attribute-specific state checks run after every scenario step
pub trait CustomValidator: fmt::Debug {
    fn name(&self) -> &'static str;

    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        member: &Handle,
        group: &Handle,
        member_set: bool,
        group_set: bool,
    ) -> Result<(), Failure>;
}

/// Read-only view handed to a validator
pub struct ValidationContext<'a> {
    session: &'a Session,
    family: Option<Family>,
    options: AttrOptions,
}

impl<'a> ValidationContext<'a> {
    pub fn new(session: &'a Session, family: Option<Family>, options: AttrOptions) -> Self {
        Self {
            session,
            family,
            options,
        }
    }

    pub fn family(&self) -> Option<Family> {
        self.family
    }

    pub fn options(&self) -> &AttrOptions {
        &self.options
    }

    pub fn read_setting(&self, handle: &Handle, setting: Setting) -> Result<u32, Failure> {
        self.session
            .read_setting(handle, setting, self.family)
            .map_err(|e| Failure::internal(format!("could not read state of [{}]: {}", handle, e)))
    }
}

/// Resolve a validator by its registered name
pub fn lookup(name: &str) -> Option<Arc<dyn CustomValidator>> {
    match name {
        "advertisement-interval" => Some(Arc::new(AdvertisementInterval)),
        "weight" => Some(Arc::new(Weight)),
        _ => None,
    }
}

/// Members use 10 s, groups 20 s; unset falls back to the session default
#[derive(Debug)]
struct AdvertisementInterval;

impl CustomValidator for AdvertisementInterval {
    fn name(&self) -> &'static str {
        "advertisement-interval"
    }

    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        member: &Handle,
        group: &Handle,
        member_set: bool,
        group_set: bool,
    ) -> Result<(), Failure> {
        let def = default_routeadv(ctx.options().use_ibgp);
        let expected = match (member_set, group_set) {
            (true, _) => 10,
            (false, true) => 20,
            (false, false) => def,
        };
        ensure_eq(
            "member.advertisement-interval",
            ctx.read_setting(member, Setting::AdvertisementInterval)?,
            expected,
        )?;
        ensure_eq(
            "group.advertisement-interval",
            ctx.read_setting(group, Setting::AdvertisementInterval)?,
            if group_set { 20 } else { def },
        )
    }
}

/// Members use weight 100, groups 200; unset means 0
#[derive(Debug)]
struct Weight;

impl CustomValidator for Weight {
    fn name(&self) -> &'static str {
        "weight"
    }

    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        member: &Handle,
        group: &Handle,
        member_set: bool,
        group_set: bool,
    ) -> Result<(), Failure> {
        if ctx.family().is_none() {
            return Err(Failure::internal("weight requires an address family"));
        }
        let expected = match (member_set, group_set) {
            (true, _) => 100,
            (false, true) => 200,
            (false, false) => 0,
        };
        ensure_eq(
            "member.weight",
            ctx.read_setting(member, Setting::Weight)?,
            expected,
        )?;
        ensure_eq(
            "group.weight",
            ctx.read_setting(group, Setting::Weight)?,
            if group_set { 200 } else { 0 },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::{Afi, Safi, Vty};
    use crate::testing::TestState;

    const V4: Family = Family::new(Afi::Ipv4, Safi::Unicast);

    fn session(lines: &[&str]) -> Session {
        let mut session = Session::open(Box::new(Vty::new()));
        for line in lines {
            session.execute(line).unwrap();
        }
        session
    }

    fn handles() -> (Handle, Handle) {
        (
            Handle::Member("1.1.1.1".into()),
            Handle::Group("PG-TEST".into()),
        )
    }

    const BASE: &[&str] = &[
        "router bgp 100",
        "neighbor PG-TEST peer-group",
        "neighbor 1.1.1.1 remote-as 200",
    ];

    #[test]
    fn test_lookup() {
        for name in ["advertisement-interval", "weight"] {
            assert_eq!(lookup(name).map(|v| v.name()), Some(name));
        }
        assert!(lookup("hold-time").is_none());
    }

    #[test]
    fn test_advertisement_interval_defaults() {
        let session = session(BASE);
        let ctx = ValidationContext::new(&session, None, AttrOptions::default());
        let (member, group) = handles();
        let validator = lookup("advertisement-interval").unwrap();
        validator.validate(&ctx, &member, &group, false, false).unwrap();

        let err = validator
            .validate(&ctx, &member, &group, true, false)
            .unwrap_err();
        assert_eq!(err.state, TestState::AssertError);
        assert_eq!(
            err.message,
            "assertion failed: member.advertisement-interval[30] == [10]"
        );
    }

    #[test]
    fn test_advertisement_interval_inherited() {
        let mut lines = BASE.to_vec();
        lines.extend([
            "neighbor PG-TEST advertisement-interval 20",
            "neighbor 1.1.1.1 peer-group PG-TEST",
        ]);
        let session = session(&lines);
        let ctx = ValidationContext::new(&session, None, AttrOptions::default());
        let (member, group) = handles();
        lookup("advertisement-interval")
            .unwrap()
            .validate(&ctx, &member, &group, false, true)
            .unwrap();
    }

    #[test]
    fn test_weight() {
        let mut lines = BASE.to_vec();
        lines.extend([
            "address-family ipv4 unicast",
            "neighbor PG-TEST activate",
            "neighbor 1.1.1.1 activate",
            "neighbor 1.1.1.1 weight 100",
        ]);
        let session = session(&lines);
        let ctx = ValidationContext::new(&session, Some(V4), AttrOptions::default());
        let (member, group) = handles();
        let validator = lookup("weight").unwrap();
        validator.validate(&ctx, &member, &group, true, false).unwrap();
        assert!(validator.validate(&ctx, &member, &group, false, false).is_err());

        let global = ValidationContext::new(&session, None, AttrOptions::default());
        let err = validator
            .validate(&global, &member, &group, true, false)
            .unwrap_err();
        assert_eq!(err.state, TestState::InternalError);
    }
}
