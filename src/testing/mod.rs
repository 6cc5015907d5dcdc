//! Attribute inheritance test engine
//!
//! Drives a configuration backend through scripted member/group
//! transitions for every catalog case and checks rendered text and stored
//! state after each step.

mod context;
pub mod custom;
mod executor;
mod reporter;

pub use context::{ensure_eq, Failure, TestContext, TestState};
pub use custom::{CustomValidator, ValidationContext};
pub use executor::run_case;
pub use reporter::{CaseReport, OutputFormat, Reporter, Summary};

use tracing::debug;

use crate::backend::BackendFactory;
use crate::catalog::{expand, CatalogEntry};
use crate::common::config::TopologyConfig;

/// Run every expanded case whose description contains `filter`
///
/// Each case gets its own backend from `factory`; a failing case never
/// stops the run.
pub fn run_catalog(
    entries: &[CatalogEntry],
    filter: Option<&str>,
    factory: &BackendFactory,
    topology: &TopologyConfig,
) -> Vec<CaseReport> {
    let cases = expand(entries);
    debug!(cases = cases.len(), "catalog expanded");
    cases
        .iter()
        .filter(|case| filter.map_or(true, |f| case.description().contains(f)))
        .map(|case| run_case(case, factory(), topology))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::Vty;
    use crate::catalog::builtin;

    fn factory() -> BackendFactory {
        Box::new(|| Box::new(Vty::new()))
    }

    #[test]
    fn test_filter_selects_cases() {
        let reports = run_catalog(
            &builtin(),
            Some("send-community"),
            &factory(),
            &TopologyConfig::default(),
        );
        // three attributes, four default families each
        assert_eq!(reports.len(), 12);
        assert!(reports.iter().all(CaseReport::passed));
    }

    #[test]
    fn test_topology_is_used() {
        let topology = TopologyConfig {
            peer_address: "10.0.0.2".into(),
            peer_group: "PG-CORE".into(),
            ..TopologyConfig::default()
        };
        let reports = run_catalog(&builtin(), Some("peer\\passive"), &factory(), &topology);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].passed(), "{:?}", reports[0].error);
        assert!(reports[0]
            .log
            .contains(&"case 03: add peer [10.0.0.2] to group [PG-CORE]".to_string()));
    }

    #[test]
    fn test_member_address_is_canonicalized() {
        let topology = TopologyConfig {
            peer_address: "2001:DB8::1".into(),
            ..TopologyConfig::default()
        };
        let reports = run_catalog(&builtin(), Some("peer\\passive"), &factory(), &topology);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].passed(), "{:?}", reports[0].error);
        assert!(reports[0]
            .log
            .contains(&"case 01: set peer-flag [passive] on [2001:db8::1]".to_string()));

        let reports = run_catalog(
            &builtin(),
            Some("ipv6-unicast\\route-map"),
            &factory(),
            &topology,
        );
        // inbound and outbound
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(CaseReport::passed));
    }
}
