//! BFD record types and configuration limits.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Instance names must be strictly shorter than this.
pub const BFD_INAME_MAX: usize = 32;

/// Minimum accepted min_rx value in milliseconds.
pub const BFD_MINRX_MIN_MS: u64 = 1;
/// Maximum accepted min_rx value in milliseconds; the stored microsecond
/// value must fit in a u32.
pub const BFD_MINRX_MAX_MS: u64 = (u32::MAX / 1000) as u64;
/// min_rx values above this many milliseconds are applied but flagged.
pub const BFD_MINRX_MAX_SENSIBLE_MS: u64 = 1000;
/// Default min_rx in milliseconds.
pub const BFD_MINRX_DEFAULT_MS: u32 = 10;

/// Minimum accepted min_tx value in milliseconds.
pub const BFD_MINTX_MIN_MS: u64 = 1;
/// Maximum accepted min_tx value in milliseconds.
pub const BFD_MINTX_MAX_MS: u64 = (u32::MAX / 1000) as u64;
/// min_tx values above this many milliseconds are applied but flagged.
pub const BFD_MINTX_MAX_SENSIBLE_MS: u64 = 1000;
/// Default min_tx in milliseconds.
pub const BFD_MINTX_DEFAULT_MS: u32 = 10;

/// Minimum accepted idle_tx value in milliseconds.
pub const BFD_IDLETX_MIN_MS: u64 = 1;
/// Maximum accepted idle_tx value in milliseconds.
pub const BFD_IDLETX_MAX_MS: u64 = (u32::MAX / 1000) as u64;
/// idle_tx values above this many milliseconds are applied but flagged.
pub const BFD_IDLETX_MAX_SENSIBLE_MS: u64 = 10000;
/// Default idle_tx in milliseconds.
pub const BFD_IDLETX_DEFAULT_MS: u32 = 1000;

/// Minimum detect multiplier.
pub const BFD_MULTIPLIER_MIN: u64 = 1;
/// Maximum detect multiplier.
pub const BFD_MULTIPLIER_MAX: u64 = u8::MAX as u64;
/// Default detect multiplier.
pub const BFD_MULTIPLIER_DEFAULT: u8 = 5;

/// Maximum ttl/hoplimit value.
pub const BFD_TTL_MAX: u64 = u8::MAX as u64;
/// Default ttl for sessions with an IPv4 neighbor.
pub const BFD_CONTROL_TTL: u8 = 255;
/// Default hop limit for sessions with an IPv6 neighbor.
pub const BFD_CONTROL_HOPLIMIT: u8 = 64;

/// Minimum tracking weight for the redundancy role.
pub const BFD_WEIGHT_MIN: i64 = -253;
/// Maximum tracking weight for the redundancy role.
pub const BFD_WEIGHT_MAX: i64 = 253;

/// Daemon role a configuration load runs as.
///
/// The three worker roles read the same configuration text but activate
/// different keyword sets; the parent supervisor recognizes every keyword
/// without acting on any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Supervising parent process; keywords accepted, blocks skipped.
    Parent,
    /// Liveness monitor owning the BFD instances.
    Bfd,
    /// Redundancy/virtual-router daemon tracking instances by name.
    Vrrp,
    /// Health-checker daemon tracking instances by name.
    Checker,
}

impl Role {
    /// Returns the role name used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Bfd => "bfd",
            Role::Vrrp => "vrrp",
            Role::Checker => "checker",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Role::Parent),
            "bfd" => Ok(Role::Bfd),
            "vrrp" => Ok(Role::Vrrp),
            "checker" => Ok(Role::Checker),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consumer roles enabled in this deployment.
///
/// Runtime replacement for build-time role selection: keyword wiring and
/// the default "monitored by every role" resolution both consult this set,
/// so every role combination runs through one code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledRoles {
    /// The redundancy daemon is part of this deployment.
    pub vrrp: bool,
    /// The health-checker daemon is part of this deployment.
    pub checker: bool,
}

impl EnabledRoles {
    /// Every consumer role enabled.
    pub fn all() -> Self {
        Self {
            vrrp: true,
            checker: true,
        }
    }
}

impl Default for EnabledRoles {
    fn default() -> Self {
        Self::all()
    }
}

/// One configured BFD neighbor-monitoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfdInstance {
    /// Instance name, unique across the configuration.
    pub name: String,
    /// Neighbor the session is established with; mandatory by block close.
    pub neighbor_addr: Option<IpAddr>,
    /// Local address control packets are sent from.
    pub source_addr: Option<IpAddr>,
    /// Required minimum receive interval, microseconds.
    pub local_min_rx_us: u32,
    /// Desired minimum transmit interval, microseconds.
    pub local_min_tx_us: u32,
    /// Transmit interval while the session is down, microseconds.
    pub local_idle_tx_us: u32,
    /// Detection time multiplier.
    pub local_detect_mult: u8,
    /// Do not initiate sessions, only respond.
    pub passive: bool,
    /// Outgoing ttl/hoplimit; 0 until resolved at block close.
    pub ttl: u8,
    /// Maximum hops the neighbor may be away; -1 is unlimited.
    pub max_hops: i16,
    /// Deliver liveness events to the redundancy daemon.
    pub notify_vrrp: bool,
    /// Deliver liveness events to the health-checker daemon.
    pub notify_checker: bool,
}

impl BfdInstance {
    /// Creates an instance with protocol defaults and no addresses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            neighbor_addr: None,
            source_addr: None,
            local_min_rx_us: BFD_MINRX_DEFAULT_MS * 1000,
            local_min_tx_us: BFD_MINTX_DEFAULT_MS * 1000,
            local_idle_tx_us: BFD_IDLETX_DEFAULT_MS * 1000,
            local_detect_mult: BFD_MULTIPLIER_DEFAULT,
            passive: false,
            ttl: 0,
            max_hops: -1,
            notify_vrrp: false,
            notify_checker: false,
        }
    }
}

/// Redundancy-role reference to a BFD instance.
///
/// References the instance by name only; the monitor role keeps ownership
/// of the instance itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedBfd {
    /// Referenced instance name.
    pub name: String,
    /// Priority adjustment applied while the instance is down.
    pub weight: i32,
    /// Last known liveness; owned by the runtime protocol.
    pub up: bool,
}

impl TrackedBfd {
    /// Creates a reference with neutral weight and the session down.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 0,
            up: false,
        }
    }
}

/// Health-checker reference to a BFD instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerTrackedBfd {
    /// Referenced instance name.
    pub name: String,
    /// Last known liveness; owned by the runtime protocol.
    pub up: bool,
}

impl CheckerTrackedBfd {
    /// Creates a reference with the session down.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: false,
        }
    }
}
