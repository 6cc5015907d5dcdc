//! Attribute catalog
//!
//! Declares every attribute whose inheritance behavior is exercised and
//! expands descriptors into per-family test cases.

mod builtin;
mod file;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::bgp::{AfFlags, Direction, Family, FilterKind, PeerFlags, DEFAULT_FAMILIES};
use crate::testing::CustomValidator;

pub use builtin::builtin;
pub use file::load_file;

/// What an attribute is and where its state lives
#[derive(Clone)]
pub enum AttrKind {
    /// Family-independent flag bits
    GlobalFlag(PeerFlags),
    /// Per-family flag bits
    FamilyFlag(AfFlags),
    /// Named policy object bound in one direction
    FamilyFilter {
        kind: FilterKind,
        direction: Direction,
    },
    /// Family-independent attribute checked only by its validator
    GlobalCustom(Option<Arc<dyn CustomValidator>>),
    /// Per-family attribute checked only by its validator
    FamilyCustom(Option<Arc<dyn CustomValidator>>),
}

impl AttrKind {
    /// Label used in case log lines
    pub fn label(&self) -> &'static str {
        match self {
            AttrKind::GlobalFlag(_) => "peer-flag",
            AttrKind::FamilyFlag(_) => "af-flag",
            AttrKind::FamilyFilter { .. } => "af-filter",
            AttrKind::GlobalCustom(_) | AttrKind::FamilyCustom(_) => "custom",
        }
    }

    pub fn is_family_scoped(&self) -> bool {
        !matches!(self, AttrKind::GlobalFlag(_) | AttrKind::GlobalCustom(_))
    }

    pub fn validator(&self) -> Option<&Arc<dyn CustomValidator>> {
        match self {
            AttrKind::GlobalCustom(v) | AttrKind::FamilyCustom(v) => v.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKind::GlobalFlag(bits) => f.debug_tuple("GlobalFlag").field(bits).finish(),
            AttrKind::FamilyFlag(bits) => f.debug_tuple("FamilyFlag").field(bits).finish(),
            AttrKind::FamilyFilter { kind, direction } => f
                .debug_struct("FamilyFilter")
                .field("kind", kind)
                .field("direction", direction)
                .finish(),
            AttrKind::GlobalCustom(v) => f
                .debug_tuple("GlobalCustom")
                .field(&v.as_ref().map(|v| v.name()))
                .finish(),
            AttrKind::FamilyCustom(v) => f
                .debug_tuple("FamilyCustom")
                .field(&v.as_ref().map(|v| v.name()))
                .finish(),
        }
    }
}

/// Scope options of an attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttrOptions {
    /// The member's flag defaults to on; setting it is the `no` form
    pub invert_member: bool,
    /// The group's flag defaults to on; setting it is the `no` form
    pub invert_group: bool,
    /// Configure the member as an internal neighbor
    pub use_ibgp: bool,
    /// Configure the member by interface name instead of address
    pub interface_member: bool,
    /// Suspend assertions while the member joins its group
    pub skip_transfer: bool,
}

/// One testable attribute
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    /// Primary command, also the text expected absent once unset
    pub command: String,
    /// Label used in case descriptions, defaults to `command`
    pub name: Option<String>,
    pub member_command: Option<String>,
    pub group_command: Option<String>,
    pub kind: AttrKind,
    pub options: AttrOptions,
    /// Families to expand into; empty means the default set
    pub families: Vec<Family>,
}

impl AttributeDescriptor {
    pub fn new(command: &str, kind: AttrKind) -> Self {
        Self {
            command: command.to_string(),
            name: None,
            member_command: None,
            group_command: None,
            kind,
            options: AttrOptions::default(),
            families: Vec::new(),
        }
    }

    /// Use distinct command forms on the member and on the group
    pub fn with_commands(mut self, member: &str, group: &str) -> Self {
        self.member_command = Some(member.to_string());
        self.group_command = Some(group.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_options(mut self, options: AttrOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.command)
    }

    pub fn member_command(&self) -> &str {
        self.member_command.as_deref().unwrap_or(&self.command)
    }

    pub fn group_command(&self) -> &str {
        self.group_command.as_deref().unwrap_or(&self.command)
    }
}

/// A catalog entry that could not be turned into a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    pub command: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum CatalogEntry {
    Attribute(AttributeDescriptor),
    Invalid(InvalidEntry),
}

/// A descriptor bound to at most one family
#[derive(Debug, Clone)]
pub struct ExpandedCase {
    pub attr: AttributeDescriptor,
    pub family: Option<Family>,
}

impl ExpandedCase {
    pub fn description(&self) -> String {
        match self.family {
            Some(family) => format!("peer\\{}\\{}", family.slug(), self.attr.name()),
            None => format!("peer\\{}", self.attr.name()),
        }
    }
}

/// Unit of work for the runner
#[derive(Debug, Clone)]
pub enum Case {
    Attribute(ExpandedCase),
    Invalid(InvalidEntry),
}

impl Case {
    pub fn description(&self) -> String {
        match self {
            Case::Attribute(case) => case.description(),
            Case::Invalid(entry) => format!("peer\\{}", entry.command),
        }
    }
}

/// Expand entries into cases: one per global attribute, one per family
/// otherwise
pub fn expand(entries: &[CatalogEntry]) -> Vec<Case> {
    let mut cases = Vec::new();
    for entry in entries {
        let attr = match entry {
            CatalogEntry::Attribute(attr) => attr,
            CatalogEntry::Invalid(invalid) => {
                cases.push(Case::Invalid(invalid.clone()));
                continue;
            }
        };

        if !attr.kind.is_family_scoped() {
            cases.push(Case::Attribute(ExpandedCase {
                attr: attr.clone(),
                family: None,
            }));
            continue;
        }

        let families: &[Family] = if attr.families.is_empty() {
            &DEFAULT_FAMILIES
        } else {
            &attr.families
        };
        cases.extend(families.iter().map(|family| {
            Case::Attribute(ExpandedCase {
                attr: attr.clone(),
                family: Some(*family),
            })
        }));
    }
    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::{Afi, Safi};

    fn entry(attr: AttributeDescriptor) -> CatalogEntry {
        CatalogEntry::Attribute(attr)
    }

    #[test]
    fn test_global_kind_yields_one_case() {
        let cases = expand(&[entry(AttributeDescriptor::new(
            "passive",
            AttrKind::GlobalFlag(PeerFlags::PASSIVE),
        ))]);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].description(), "peer\\passive");
    }

    #[test]
    fn test_family_kind_uses_default_families() {
        let cases = expand(&[entry(AttributeDescriptor::new(
            "as-override",
            AttrKind::FamilyFlag(AfFlags::AS_OVERRIDE),
        ))]);
        let descriptions: Vec<String> = cases.iter().map(Case::description).collect();
        assert_eq!(
            descriptions,
            vec![
                "peer\\ipv4-unicast\\as-override",
                "peer\\ipv4-multicast\\as-override",
                "peer\\ipv6-unicast\\as-override",
                "peer\\ipv6-multicast\\as-override",
            ]
        );
    }

    #[test]
    fn test_declared_families_replace_defaults() {
        let mut attr = AttributeDescriptor::new(
            "route-map",
            AttrKind::FamilyFilter {
                kind: FilterKind::RouteMap,
                direction: Direction::In,
            },
        );
        attr.families = vec![Family::new(Afi::Ipv6, Safi::LabeledUnicast)];
        let cases = expand(&[entry(attr)]);
        assert_eq!(cases.len(), 1);
        assert_eq!(
            cases[0].description(),
            "peer\\ipv6-labeled-unicast\\route-map"
        );
    }

    #[test]
    fn test_invalid_entry_is_kept() {
        let cases = expand(&[CatalogEntry::Invalid(InvalidEntry {
            command: "bogus".into(),
            reason: "invalid attribute type [bogus]".into(),
        })]);
        assert!(matches!(&cases[..], [Case::Invalid(e)] if e.command == "bogus"));
    }

    #[test]
    fn test_command_defaults() {
        let attr = AttributeDescriptor::new("weight", AttrKind::FamilyFlag(AfFlags::WEIGHT))
            .with_commands("weight 100", "weight 200");
        assert_eq!(attr.member_command(), "weight 100");
        assert_eq!(attr.group_command(), "weight 200");

        let attr = AttributeDescriptor::new("passive", AttrKind::GlobalFlag(PeerFlags::PASSIVE));
        assert_eq!(attr.member_command(), "passive");
        assert_eq!(attr.group_command(), "passive");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(AttrKind::GlobalFlag(PeerFlags::PASSIVE).label(), "peer-flag");
        assert_eq!(AttrKind::FamilyCustom(None).label(), "custom");
        assert!(AttrKind::FamilyCustom(None).is_family_scoped());
        assert!(!AttrKind::GlobalCustom(None).is_family_scoped());
    }
}
