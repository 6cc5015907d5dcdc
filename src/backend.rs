//! Configuration subsystem interface
//!
//! The test engine never touches neighbor state directly. Everything it
//! needs goes through [`ConfigBackend`]: executing one configuration line,
//! rendering the running configuration, reading typed flag/filter state
//! and resolving member/group handles. A [`Session`] owns one backend for
//! the lifetime of a test case and closes it on drop.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::bgp::{AfFlags, Direction, Family, FilterKind, PeerFlags};

/// Reference to a configured member (neighbor) or group (peer-group)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Handle {
    /// Neighbor address or interface name
    Member(String),
    /// Peer-group name
    Group(String),
}

impl Handle {
    pub fn key(&self) -> &str {
        match self {
            Handle::Member(key) | Handle::Group(key) => key,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Handle::Group(_))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Flag bits to inspect, tagged with the vector they live in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagBits {
    Global(PeerFlags),
    Family(AfFlags),
}

/// Raw value, override and invert bits of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagState {
    pub value: bool,
    pub overridden: bool,
    pub inverted: bool,
}

/// Attachment and override state of a filter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    pub attached: bool,
    pub overridden: bool,
}

/// Numeric settings readable for custom validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Effective route advertisement interval in seconds
    AdvertisementInterval,
    /// Effective weight for a family
    Weight,
}

/// Status code of a rejected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Command matched but was refused
    Warning,
    /// No command matched the input
    NoMatch,
    /// Command is missing arguments
    Incomplete,
}

impl CommandStatus {
    pub fn code(self) -> i32 {
        match self {
            CommandStatus::Warning => 1,
            CommandStatus::NoMatch => 2,
            CommandStatus::Incomplete => 4,
        }
    }
}

/// A configuration line rejected by the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommandError {
    pub status: CommandStatus,
    pub message: String,
}

impl CommandError {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Warning,
            message: message.into(),
        }
    }

    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::NoMatch,
            message: message.into(),
        }
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Incomplete,
            message: message.into(),
        }
    }
}

/// Failure to read state through a handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("no bgp instance is configured")]
    NoInstance,

    #[error("handle [{0}] does not resolve to a configured neighbor")]
    UnknownHandle(Handle),

    #[error("{0} requires an address family")]
    FamilyRequired(&'static str),
}

/// Operations the engine consumes from the configuration subsystem
pub trait ConfigBackend {
    /// Apply one configuration line in the active session
    fn execute(&mut self, line: &str) -> Result<(), CommandError>;

    /// Render the full configuration as it would be persisted
    fn render_config(&self) -> String;

    /// Read value/override/invert bits; `family` selects the per-family vector
    fn read_flag(
        &self,
        handle: &Handle,
        bits: FlagBits,
        family: Option<Family>,
    ) -> Result<FlagState, AccessError>;

    /// Read whether a named policy object is bound for a direction
    fn read_filter(
        &self,
        handle: &Handle,
        kind: FilterKind,
        direction: Direction,
        family: Family,
    ) -> Result<FilterState, AccessError>;

    /// Read an effective numeric setting
    fn read_setting(
        &self,
        handle: &Handle,
        setting: Setting,
        family: Option<Family>,
    ) -> Result<u32, AccessError>;

    fn lookup_member(&self, identifier: &str) -> Option<Handle>;

    fn lookup_group(&self, name: &str) -> Option<Handle>;

    /// Tear down every member, group and instance
    fn reset(&mut self);

    /// Release session resources
    fn close(&mut self) {}
}

/// Constructor for a fresh backend per test case
pub type BackendFactory = Box<dyn Fn() -> Box<dyn ConfigBackend>>;

/// One configuration session, exclusively owned by a test case
pub struct Session {
    backend: Box<dyn ConfigBackend>,
    closed: bool,
}

impl Session {
    pub fn open(backend: Box<dyn ConfigBackend>) -> Self {
        debug!("configuration session opened");
        Self {
            backend,
            closed: false,
        }
    }

    pub fn execute(&mut self, line: &str) -> Result<(), CommandError> {
        trace!(command = line, "execute");
        self.backend.execute(line)
    }

    pub fn render_config(&self) -> String {
        self.backend.render_config()
    }

    pub fn read_flag(
        &self,
        handle: &Handle,
        bits: FlagBits,
        family: Option<Family>,
    ) -> Result<FlagState, AccessError> {
        self.backend.read_flag(handle, bits, family)
    }

    pub fn read_filter(
        &self,
        handle: &Handle,
        kind: FilterKind,
        direction: Direction,
        family: Family,
    ) -> Result<FilterState, AccessError> {
        self.backend.read_filter(handle, kind, direction, family)
    }

    pub fn read_setting(
        &self,
        handle: &Handle,
        setting: Setting,
        family: Option<Family>,
    ) -> Result<u32, AccessError> {
        self.backend.read_setting(handle, setting, family)
    }

    pub fn lookup_member(&self, identifier: &str) -> Option<Handle> {
        self.backend.lookup_member(identifier)
    }

    pub fn lookup_group(&self, name: &str) -> Option<Handle> {
        self.backend.lookup_group(name)
    }

    pub fn reset(&mut self) {
        debug!("configuration registry reset");
        self.backend.reset();
    }

    /// Close the session; dropping does the same
    pub fn close(&mut self) {
        if !self.closed {
            self.backend.close();
            self.closed = true;
            debug!("configuration session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
