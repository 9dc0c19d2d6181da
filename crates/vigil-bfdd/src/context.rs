//! Per-load parse state shared by the BFD keyword handlers.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::types::{BfdInstance, CheckerTrackedBfd, EnabledRoles, Role, TrackedBfd};

/// Monitor-role data set: the configured BFD instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfdData {
    /// Instances in declaration order; the last one is the instance
    /// currently being built while its block is open.
    pub instances: Vec<BfdInstance>,
}

impl BfdData {
    /// Looks up an instance by name (case-sensitive exact match).
    pub fn find_by_name(&self, name: &str) -> Option<&BfdInstance> {
        self.instances.iter().find(|bfd| bfd.name == name)
    }

    /// Looks up an instance by its neighbor address.
    pub fn find_by_neighbor(&self, addr: IpAddr) -> Option<&BfdInstance> {
        self.instances
            .iter()
            .find(|bfd| bfd.neighbor_addr == Some(addr))
    }
}

/// Redundancy-role data set: instances tracked by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrrpData {
    /// Tracked references in declaration order.
    pub tracked_bfds: Vec<TrackedBfd>,
}

impl VrrpData {
    /// Looks up a tracked reference by instance name.
    pub fn find_tracked(&self, name: &str) -> Option<&TrackedBfd> {
        self.tracked_bfds.iter().find(|t| t.name == name)
    }
}

/// Checker-role data set: instances tracked by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerData {
    /// Tracked references in declaration order.
    pub tracked_bfds: Vec<CheckerTrackedBfd>,
}

impl CheckerData {
    /// Looks up a tracked reference by instance name.
    pub fn find_tracked(&self, name: &str) -> Option<&CheckerTrackedBfd> {
        self.tracked_bfds.iter().find(|t| t.name == name)
    }
}

/// Role-selector keywords seen inside the currently open instance block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SelectedRoles {
    pub vrrp: bool,
    pub checker: bool,
}

impl SelectedRoles {
    /// True if any selector keyword appeared in the block.
    pub fn any(&self) -> bool {
        self.vrrp || self.checker
    }

    /// Resets the accumulator when a new block opens.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// All mutable state for one configuration load.
///
/// A fresh context is built per load and threaded through every handler;
/// nothing outlives the load, so reloads are fully independent.
#[derive(Debug)]
pub struct ParseContext {
    /// Role this load runs as.
    pub role: Role,
    /// Consumer roles enabled in this deployment.
    pub enabled: EnabledRoles,
    /// Monitor-role instances.
    pub bfd: BfdData,
    /// Redundancy-role tracked references.
    pub vrrp: VrrpData,
    /// Checker-role tracked references.
    pub checker: CheckerData,
    /// Selectors seen in the currently open instance block.
    pub(crate) selected: SelectedRoles,
    /// True once any selector keyword has been seen in this load.
    pub(crate) selector_seen: bool,
    /// Tracked references created while no selector had been seen; they
    /// lose their by-default status if a selector turns up later.
    pub(crate) vrrp_defaults: Vec<String>,
    pub(crate) checker_defaults: Vec<String>,
}

impl ParseContext {
    /// Creates an empty context for one load.
    pub fn new(role: Role, enabled: EnabledRoles) -> Self {
        Self {
            role,
            enabled,
            bfd: BfdData::default(),
            vrrp: VrrpData::default(),
            checker: CheckerData::default(),
            selected: SelectedRoles::default(),
            selector_seen: false,
            vrrp_defaults: Vec::new(),
            checker_defaults: Vec::new(),
        }
    }
}
