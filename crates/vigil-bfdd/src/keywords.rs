//! Role-based keyword activation and the configuration load drivers.
//!
//! Every daemon role parses the same configuration text; what differs is
//! which handler set is wired behind the keywords. The monitor role gets
//! the full instance builder; the redundancy and checker roles get the
//! cross-reference registry and accept the monitor's field keywords
//! without acting on them, so shared text parses identically everywhere.

use std::fs;
use std::path::Path;

use vigil_conf::{process_stream, tokenize, ConfError, KeywordTable};

use crate::context::ParseContext;
use crate::instance;
use crate::registry;
use crate::types::{EnabledRoles, Role};

/// Wires the `bfd_instance` keyword set for `role`.
///
/// Exactly one root handler is selected per role; the field keywords are
/// live only behind the monitor-role handler. The `vrrp`/`checker`
/// selector keywords are installed for every role whose daemon is part of
/// the deployment, independent of the role currently parsing.
pub fn install_bfd_keywords(
    table: &mut KeywordTable<ParseContext>,
    role: Role,
    enabled: EnabledRoles,
) {
    let bfd_handlers = matches!(role, Role::Bfd | Role::Parent);

    match role {
        Role::Bfd | Role::Parent => {
            table.install_root("bfd_instance", instance::bfd_open, role == Role::Bfd);
            table.install_end_handler(instance::bfd_end);
        }
        Role::Vrrp if enabled.vrrp => {
            table.install_root("bfd_instance", registry::vrrp_track_open, true);
            table.install_end_handler(registry::vrrp_track_end);
        }
        Role::Checker if enabled.checker => {
            table.install_root("bfd_instance", registry::checker_track_open, true);
            table.install_end_handler(registry::checker_track_end);
        }
        // The role's daemon is not part of this deployment: no keywords.
        _ => return,
    }

    table.install_keyword_conditional("source_ip", instance::bfd_source_ip, bfd_handlers);
    table.install_keyword_conditional("neighbor_ip", instance::bfd_neighbor_ip, bfd_handlers);
    table.install_keyword_conditional("min_rx", instance::bfd_min_rx, bfd_handlers);
    table.install_keyword_conditional("min_tx", instance::bfd_min_tx, bfd_handlers);
    table.install_keyword_conditional("idle_tx", instance::bfd_idle_tx, bfd_handlers);
    table.install_keyword_conditional("multiplier", instance::bfd_multiplier, bfd_handlers);
    table.install_keyword_conditional("passive", instance::bfd_passive, bfd_handlers);
    table.install_keyword_conditional("ttl", instance::bfd_ttl, bfd_handlers);
    table.install_keyword_conditional("hoplimit", instance::bfd_ttl, bfd_handlers);
    table.install_keyword_conditional("max_hops", instance::bfd_max_hops, bfd_handlers);

    if enabled.vrrp {
        table.install_keyword_conditional(
            "weight",
            registry::vrrp_track_weight,
            role == Role::Vrrp,
        );
        table.install_keyword("vrrp", registry::bfd_event_vrrp);
    }
    if enabled.checker {
        table.install_keyword("checker", registry::bfd_event_checker);
    }
}

/// Parses configuration text as `role` and returns the populated per-load
/// context.
///
/// A fresh keyword table and context are built for every call, so
/// repeated loads of the same text are fully independent and yield
/// structurally identical results.
pub fn load_config_str(
    input: &str,
    role: Role,
    enabled: EnabledRoles,
) -> Result<ParseContext, ConfError> {
    let lines = tokenize(input)?;

    let mut table = KeywordTable::new();
    install_bfd_keywords(&mut table, role, enabled);

    let mut ctx = ParseContext::new(role, enabled);
    process_stream(&table, &mut ctx, &lines)?;
    registry::reconcile_tracked(&mut ctx);
    Ok(ctx)
}

/// Reads and parses a configuration file as `role`.
pub fn load_config_path(
    path: &Path,
    role: Role,
    enabled: EnabledRoles,
) -> Result<ParseContext, ConfError> {
    let input = fs::read_to_string(path)
        .map_err(|source| ConfError::io(path.display().to_string(), source))?;
    load_config_str(&input, role, enabled)
}
