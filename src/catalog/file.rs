//! YAML catalog files
//!
//! A catalog file is a sequence of entries. Structural problems (bad YAML,
//! unknown fields) fail the whole file; semantic problems in one entry turn
//! that entry into an [`InvalidEntry`] so it is still reported.

use std::path::Path;
use std::sync::Arc;

use bitflags::Flags;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AttrKind, AttrOptions, AttributeDescriptor, CatalogEntry, InvalidEntry};
use crate::bgp::{AfFlags, Direction, Family, FilterKind, PeerFlags};
use crate::common::{Error, Result};
use crate::testing::{custom, CustomValidator};

/// One entry as written in the catalog file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    /// Primary command text
    command: String,
    /// Label used in case descriptions, defaults to `command`
    name: Option<String>,
    /// Command used on the member, defaults to `command`
    member_command: Option<String>,
    /// Command used on the group, defaults to `command`
    group_command: Option<String>,
    /// One of `global-flag`, `family-flag`, `family-filter`, `global-custom`, `family-custom`
    kind: String,
    /// Flag bit names, e.g. `"AS_PATH_UNCHANGED | MED_UNCHANGED"`
    flag: Option<String>,
    /// Filter slot for `family-filter`
    filter: Option<RawFilter>,
    /// Registered custom validator name
    handler: Option<String>,
    #[serde(default)]
    options: AttrOptions,
    /// Families to expand into; empty means the default set
    #[serde(default)]
    families: Vec<Family>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawFilter {
    kind: String,
    direction: Option<String>,
}

/// Load a catalog from a YAML file
pub fn load_file(path: &Path) -> Result<Vec<CatalogEntry>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    let entries = parse(&text).map_err(|e| Error::catalog(path, e))?;
    debug!(path = %path.display(), entries = entries.len(), "catalog loaded");
    Ok(entries)
}

fn parse(text: &str) -> std::result::Result<Vec<CatalogEntry>, serde_yaml::Error> {
    let raw: Vec<RawEntry> = serde_yaml::from_str(text)?;
    Ok(raw
        .into_iter()
        .map(|entry| {
            let command = entry.name.clone().unwrap_or_else(|| entry.command.clone());
            match resolve(entry) {
                Ok(attr) => CatalogEntry::Attribute(attr),
                Err(reason) => {
                    warn!(command = %command, %reason, "invalid catalog entry");
                    CatalogEntry::Invalid(InvalidEntry { command, reason })
                }
            }
        })
        .collect())
}

fn resolve(entry: RawEntry) -> std::result::Result<AttributeDescriptor, String> {
    let kind = match entry.kind.as_str() {
        "global-flag" => {
            reject_extra(&entry, false, false)?;
            AttrKind::GlobalFlag(parse_flags::<PeerFlags>(&entry)?)
        }
        "family-flag" => {
            reject_extra(&entry, false, false)?;
            AttrKind::FamilyFlag(parse_flags::<AfFlags>(&entry)?)
        }
        "family-filter" => {
            reject_extra(&entry, true, false)?;
            parse_filter(&entry)?
        }
        "global-custom" => {
            reject_extra(&entry, false, true)?;
            AttrKind::GlobalCustom(parse_handler(&entry)?)
        }
        "family-custom" => {
            reject_extra(&entry, false, true)?;
            AttrKind::FamilyCustom(parse_handler(&entry)?)
        }
        other => return Err(format!("invalid attribute type [{}]", other)),
    };

    if !kind.is_family_scoped() && !entry.families.is_empty() {
        return Err(format!(
            "attribute kind [{}] does not take address families",
            entry.kind
        ));
    }

    Ok(AttributeDescriptor {
        command: entry.command,
        name: entry.name,
        member_command: entry.member_command,
        group_command: entry.group_command,
        kind,
        options: entry.options,
        families: entry.families,
    })
}

/// Reject payload fields the kind has no use for
fn reject_extra(
    entry: &RawEntry,
    takes_filter: bool,
    takes_handler: bool,
) -> std::result::Result<(), String> {
    let flag_kind = !takes_filter && !takes_handler;
    if entry.flag.is_some() && !flag_kind {
        return Err(format!("attribute kind [{}] does not take a flag", entry.kind));
    }
    if entry.filter.is_some() && !takes_filter {
        return Err(format!("attribute kind [{}] does not take a filter", entry.kind));
    }
    if entry.handler.is_some() && !takes_handler {
        return Err(format!("attribute kind [{}] does not take a handler", entry.kind));
    }
    Ok(())
}

fn parse_flags<F>(entry: &RawEntry) -> std::result::Result<F, String>
where
    F: Flags,
    F::Bits: bitflags::parser::ParseHex,
{
    let text = entry
        .flag
        .as_deref()
        .ok_or_else(|| format!("attribute kind [{}] requires a flag", entry.kind))?;
    let bits: F = bitflags::parser::from_str(text)
        .map_err(|e| format!("invalid flag [{}]: {}", text, e))?;
    if bits.is_empty() {
        return Err(format!("flag [{}] names no bits", text));
    }
    Ok(bits)
}

fn parse_filter(entry: &RawEntry) -> std::result::Result<AttrKind, String> {
    let raw = entry
        .filter
        .as_ref()
        .ok_or_else(|| format!("attribute kind [{}] requires a filter", entry.kind))?;
    let kind = FilterKind::from_keyword(&raw.kind)
        .ok_or_else(|| format!("invalid filter type [{}]", raw.kind))?;
    let direction = match (&raw.direction, kind.is_directional()) {
        (Some(dir), true) => dir.parse::<Direction>()?,
        (None, true) => return Err(format!("filter [{}] requires a direction", kind)),
        (Some(_), false) => return Err(format!("filter [{}] does not take a direction", kind)),
        (None, false) => Direction::In,
    };
    Ok(AttrKind::FamilyFilter { kind, direction })
}

fn parse_handler(entry: &RawEntry) -> std::result::Result<Option<Arc<dyn CustomValidator>>, String> {
    match entry.handler.as_deref() {
        None => Ok(None),
        Some(name) => custom::lookup(name)
            .map(Some)
            .ok_or_else(|| format!("unknown custom handler [{}]", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::{Afi, Safi};
    use std::io::Write;

    fn single(yaml: &str) -> CatalogEntry {
        let mut entries = parse(yaml).unwrap();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    fn reason(entry: CatalogEntry) -> String {
        match entry {
            CatalogEntry::Invalid(invalid) => invalid.reason,
            CatalogEntry::Attribute(attr) => panic!("expected invalid entry, got {:?}", attr),
        }
    }

    #[test]
    fn test_parse_flag_entry() {
        let entry = single(
            r#"
- command: attribute-unchanged as-path med
  kind: family-flag
  flag: AS_PATH_UNCHANGED | MED_UNCHANGED
  families:
    - { afi: ipv6, safi: unicast }
"#,
        );
        let CatalogEntry::Attribute(attr) = entry else {
            panic!("expected attribute");
        };
        assert!(matches!(
            attr.kind,
            AttrKind::FamilyFlag(bits) if bits == AfFlags::AS_PATH_UNCHANGED | AfFlags::MED_UNCHANGED
        ));
        assert_eq!(attr.families, vec![Family::new(Afi::Ipv6, Safi::Unicast)]);
    }

    #[test]
    fn test_parse_filter_and_options() {
        let entry = single(
            r#"
- command: route-map
  member_command: route-map RM-PEER out
  group_command: route-map RM-GROUP out
  kind: family-filter
  filter: { kind: route-map, direction: out }
  options: { use_ibgp: true }
"#,
        );
        let CatalogEntry::Attribute(attr) = entry else {
            panic!("expected attribute");
        };
        assert!(matches!(
            attr.kind,
            AttrKind::FamilyFilter { kind: FilterKind::RouteMap, direction: Direction::Out }
        ));
        assert!(attr.options.use_ibgp);
        assert!(!attr.options.skip_transfer);
        assert_eq!(attr.member_command(), "route-map RM-PEER out");
    }

    #[test]
    fn test_custom_without_handler_is_valid() {
        let entry = single("- { command: weight, kind: family-custom }");
        assert!(matches!(
            entry,
            CatalogEntry::Attribute(AttributeDescriptor { kind: AttrKind::FamilyCustom(None), .. })
        ));
    }

    #[test]
    fn test_name_labels_description() {
        let entry = single("- { command: weight, name: weight value, kind: family-custom, handler: weight }");
        let CatalogEntry::Attribute(attr) = entry else {
            panic!("expected attribute");
        };
        assert_eq!(attr.command, "weight");
        assert_eq!(attr.name(), "weight value");

        let entry = single("- { command: weight, name: weight value, kind: bogus }");
        assert!(matches!(entry, CatalogEntry::Invalid(e) if e.command == "weight value"));
    }

    #[test]
    fn test_invalid_entries_are_kept() {
        assert_eq!(
            reason(single("- { command: x, kind: bogus }")),
            "invalid attribute type [bogus]"
        );
        assert_eq!(
            reason(single("- { command: x, kind: global-custom, handler: nope }")),
            "unknown custom handler [nope]"
        );
        assert_eq!(
            reason(single("- { command: x, kind: global-flag }")),
            "attribute kind [global-flag] requires a flag"
        );
        assert!(reason(single("- { command: x, kind: global-flag, flag: NOT_A_FLAG }"))
            .starts_with("invalid flag [NOT_A_FLAG]"));
        assert_eq!(
            reason(single("- { command: x, kind: family-flag, flag: PASSIVE, handler: weight }")),
            "attribute kind [family-flag] does not take a handler"
        );
        assert_eq!(
            reason(single(
                "- { command: x, kind: family-filter, filter: { kind: route-map } }"
            )),
            "filter [route-map] requires a direction"
        );
    }

    #[test]
    fn test_unknown_field_fails_file() {
        assert!(parse("- { command: x, kind: global-flag, flag: PASSIVE, colour: red }").is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- {{ command: passive, kind: global-flag, flag: PASSIVE }}").unwrap();
        let entries = load_file(file.path()).unwrap();
        assert!(matches!(&entries[..], [CatalogEntry::Attribute(a)] if a.command == "passive"));

        let err = load_file(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
