//! Monitor-role keyword handlers: building and validating BFD instances.
//!
//! The handlers populate the instance most recently appended to the
//! monitor list; the block's end handler performs the deferred
//! cross-field validation and either commits the instance or removes it.
//! Field-level failures leave the field at its prior value; only a bad or
//! duplicate neighbor address is fatal to the whole block.

use std::net::IpAddr;

use tracing::{error, info};
use vigil_conf::{HandlerAction, Line};

use crate::context::ParseContext;
use crate::types::{
    BfdInstance, BFD_CONTROL_HOPLIMIT, BFD_CONTROL_TTL, BFD_IDLETX_MAX_MS,
    BFD_IDLETX_MAX_SENSIBLE_MS, BFD_IDLETX_MIN_MS, BFD_INAME_MAX, BFD_MINRX_MAX_MS,
    BFD_MINRX_MAX_SENSIBLE_MS, BFD_MINRX_MIN_MS, BFD_MINTX_MAX_MS, BFD_MINTX_MAX_SENSIBLE_MS,
    BFD_MINTX_MIN_MS, BFD_MULTIPLIER_MAX, BFD_MULTIPLIER_MIN, BFD_TTL_MAX,
};

/// Opens a `bfd_instance` block for the monitor role.
pub(crate) fn bfd_open(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(name) = line.arg(1) else {
        error!("Configuration error: bfd_instance without a name - ignoring");
        return HandlerAction::AbortBlock;
    };

    if name.len() >= BFD_INAME_MAX {
        error!(
            "Configuration error: BFD instance {} name too long (maximum length is {} characters) - ignoring",
            name,
            BFD_INAME_MAX - 1
        );
        return HandlerAction::AbortBlock;
    }

    if ctx.bfd.find_by_name(name).is_some() {
        error!(
            "Configuration error: BFD instance {} already configured - ignoring",
            name
        );
        return HandlerAction::AbortBlock;
    }

    ctx.bfd.instances.push(BfdInstance::new(name));
    ctx.selected.clear();
    HandlerAction::Continue
}

/// Sets the neighbor address; a malformed or duplicate address discards
/// the whole instance.
pub(crate) fn bfd_neighbor_ip(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(name) = ctx.bfd.instances.last().map(|bfd| bfd.name.clone()) else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    let Ok(addr) = raw.parse::<IpAddr>() else {
        error!(
            "Configuration error: BFD instance {} has malformed neighbor address {} - ignoring instance",
            name, raw
        );
        ctx.bfd.instances.pop();
        return HandlerAction::AbortBlock;
    };

    if ctx.bfd.find_by_neighbor(addr).is_some() {
        error!(
            "Configuration error: BFD instance {} has duplicate neighbor address {} - ignoring instance",
            name, raw
        );
        ctx.bfd.instances.pop();
        return HandlerAction::AbortBlock;
    }

    if let Some(bfd) = ctx.bfd.instances.last_mut() {
        bfd.neighbor_addr = Some(addr);
    }
    HandlerAction::Continue
}

/// Sets the source address; failures are field-local.
pub(crate) fn bfd_source_ip(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(bfd) = ctx.bfd.instances.last_mut() else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    match raw.parse::<IpAddr>() {
        Ok(addr) => bfd.source_addr = Some(addr),
        Err(_) => error!(
            "Configuration error: BFD instance {} has malformed source address {} - ignoring",
            bfd.name, raw
        ),
    }
    HandlerAction::Continue
}

/// Shared parse/validate/apply for the millisecond interval keywords.
///
/// The sensible-maximum check runs against the parsed value whether or
/// not the range check accepted it.
fn apply_interval_ms(
    bfd: &mut BfdInstance,
    line: &Line,
    keyword: &'static str,
    min_ms: u64,
    max_ms: u64,
    sensible_ms: u64,
    set: fn(&mut BfdInstance, u32),
) {
    let raw = line.arg(1).unwrap_or("");
    let Ok(value) = raw.parse::<u64>() else {
        error!(
            "Configuration error: BFD instance {} {} value {} is not valid (must be in range [{}-{}]) - ignoring",
            bfd.name, keyword, raw, min_ms, max_ms
        );
        return;
    };

    if value < min_ms || value > max_ms {
        error!(
            "Configuration error: BFD instance {} {} value {} is not valid (must be in range [{}-{}]) - ignoring",
            bfd.name, keyword, raw, min_ms, max_ms
        );
    } else {
        set(bfd, (value * 1000) as u32);
    }

    if value > sensible_ms {
        info!(
            "Configuration warning: BFD instance {} {} value {} is larger than max sensible ({})",
            bfd.name, keyword, value, sensible_ms
        );
    }
}

/// Sets the required minimum receive interval.
pub(crate) fn bfd_min_rx(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    if let Some(bfd) = ctx.bfd.instances.last_mut() {
        apply_interval_ms(
            bfd,
            line,
            "min_rx",
            BFD_MINRX_MIN_MS,
            BFD_MINRX_MAX_MS,
            BFD_MINRX_MAX_SENSIBLE_MS,
            |bfd, us| bfd.local_min_rx_us = us,
        );
    }
    HandlerAction::Continue
}

/// Sets the desired minimum transmit interval.
pub(crate) fn bfd_min_tx(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    if let Some(bfd) = ctx.bfd.instances.last_mut() {
        apply_interval_ms(
            bfd,
            line,
            "min_tx",
            BFD_MINTX_MIN_MS,
            BFD_MINTX_MAX_MS,
            BFD_MINTX_MAX_SENSIBLE_MS,
            |bfd, us| bfd.local_min_tx_us = us,
        );
    }
    HandlerAction::Continue
}

/// Sets the transmit interval used while the session is down.
pub(crate) fn bfd_idle_tx(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    if let Some(bfd) = ctx.bfd.instances.last_mut() {
        apply_interval_ms(
            bfd,
            line,
            "idle_tx",
            BFD_IDLETX_MIN_MS,
            BFD_IDLETX_MAX_MS,
            BFD_IDLETX_MAX_SENSIBLE_MS,
            |bfd, us| bfd.local_idle_tx_us = us,
        );
    }
    HandlerAction::Continue
}

/// Sets the detect multiplier.
pub(crate) fn bfd_multiplier(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(bfd) = ctx.bfd.instances.last_mut() else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    match raw.parse::<u64>() {
        Ok(value) if (BFD_MULTIPLIER_MIN..=BFD_MULTIPLIER_MAX).contains(&value) => {
            bfd.local_detect_mult = value as u8;
        }
        _ => error!(
            "Configuration error: BFD instance {} multiplier value {} not valid (must be in range [{}-{}]) - ignoring",
            bfd.name, raw, BFD_MULTIPLIER_MIN, BFD_MULTIPLIER_MAX
        ),
    }
    HandlerAction::Continue
}

/// Marks the instance passive: never initiate, only respond.
pub(crate) fn bfd_passive(ctx: &mut ParseContext, _line: &Line) -> HandlerAction {
    if let Some(bfd) = ctx.bfd.instances.last_mut() {
        bfd.passive = true;
    }
    HandlerAction::Continue
}

/// Sets the outgoing ttl/hoplimit. 0 is rejected: it is only the internal
/// unset marker resolved at block close.
pub(crate) fn bfd_ttl(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(bfd) = ctx.bfd.instances.last_mut() else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 && value <= BFD_TTL_MAX => bfd.ttl = value as u8,
        _ => error!(
            "Configuration error: BFD instance {} ttl/hoplimit value {} not valid (must be in range [1-{}]) - ignoring",
            bfd.name, raw, BFD_TTL_MAX
        ),
    }
    HandlerAction::Continue
}

/// Sets the maximum accepted hop distance; -1 means unlimited.
pub(crate) fn bfd_max_hops(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(bfd) = ctx.bfd.instances.last_mut() else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    match raw.parse::<i64>() {
        Ok(value) if value >= -1 && value <= BFD_TTL_MAX as i64 => bfd.max_hops = value as i16,
        _ => error!(
            "Configuration error: BFD instance {} max_hops value {} not valid (must be in range [-1-{}]) - ignoring",
            bfd.name, raw, BFD_TTL_MAX
        ),
    }
    HandlerAction::Continue
}

/// End-of-block validation: checks the minimum configuration
/// requirements, resolves deferred defaults and the per-role delivery
/// flags, or removes the instance.
pub(crate) fn bfd_end(ctx: &mut ParseContext) {
    let Some(bfd) = ctx.bfd.instances.last() else {
        return;
    };

    let Some(neighbor) = bfd.neighbor_addr else {
        error!(
            "Configuration error: BFD instance {} has no neighbor address set - disabling instance",
            bfd.name
        );
        ctx.bfd.instances.pop();
        return;
    };

    if let Some(source) = bfd.source_addr {
        if source.is_ipv4() != neighbor.is_ipv4() {
            error!(
                "Configuration error: BFD instance {} source address {} and neighbor address {} are not of the same family - disabling instance",
                bfd.name, source, neighbor
            );
            ctx.bfd.instances.pop();
            return;
        }
    }

    let selected = ctx.selected;
    let enabled = ctx.enabled;
    let Some(bfd) = ctx.bfd.instances.last_mut() else {
        return;
    };

    if bfd.ttl == 0 {
        bfd.ttl = if neighbor.is_ipv4() {
            BFD_CONTROL_TTL
        } else {
            BFD_CONTROL_HOPLIMIT
        };
    }

    if bfd.max_hops > bfd.ttl as i16 {
        info!(
            "BFD instance {}: max_hops exceeds ttl/hoplimit - setting to ttl/hoplimit",
            bfd.name
        );
        bfd.max_hops = bfd.ttl as i16;
    }

    // No selector keyword in the block means every enabled role monitors
    // the instance; otherwise only the roles explicitly selected.
    bfd.notify_vrrp = enabled.vrrp && (!selected.any() || selected.vrrp);
    bfd.notify_checker = enabled.checker && (!selected.any() || selected.checker);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnabledRoles, Role};
    use pretty_assertions::assert_eq;
    use vigil_conf::tokenize;

    fn line(text: &str) -> Line {
        tokenize(text).unwrap().pop().unwrap()
    }

    fn ctx_with_instance(name: &str) -> ParseContext {
        let mut ctx = ParseContext::new(Role::Bfd, EnabledRoles::default());
        assert_eq!(
            bfd_open(&mut ctx, &line(&format!("bfd_instance {} {{", name))),
            HandlerAction::Continue
        );
        ctx
    }

    #[test]
    fn test_open_rejects_long_name() {
        let mut ctx = ParseContext::new(Role::Bfd, EnabledRoles::default());
        let name = "a".repeat(BFD_INAME_MAX);
        let action = bfd_open(&mut ctx, &line(&format!("bfd_instance {} {{", name)));
        assert_eq!(action, HandlerAction::AbortBlock);
        assert!(ctx.bfd.instances.is_empty());

        // One character shorter is acceptable.
        let name = "a".repeat(BFD_INAME_MAX - 1);
        let action = bfd_open(&mut ctx, &line(&format!("bfd_instance {} {{", name)));
        assert_eq!(action, HandlerAction::Continue);
        assert_eq!(ctx.bfd.instances.len(), 1);
    }

    #[test]
    fn test_open_rejects_duplicate_name() {
        let mut ctx = ctx_with_instance("n1");
        let action = bfd_open(&mut ctx, &line("bfd_instance n1 {"));
        assert_eq!(action, HandlerAction::AbortBlock);
        assert_eq!(ctx.bfd.instances.len(), 1);
    }

    #[test]
    fn test_open_resets_selector_accumulator() {
        let mut ctx = ctx_with_instance("n1");
        ctx.selected.vrrp = true;
        bfd_open(&mut ctx, &line("bfd_instance n2 {"));
        assert!(!ctx.selected.any());
    }

    #[test]
    fn test_neighbor_malformed_is_block_fatal() {
        let mut ctx = ctx_with_instance("n1");
        let action = bfd_neighbor_ip(&mut ctx, &line("neighbor_ip not-an-address"));
        assert_eq!(action, HandlerAction::AbortBlock);
        assert!(ctx.bfd.instances.is_empty());
    }

    #[test]
    fn test_neighbor_duplicate_is_block_fatal() {
        let mut ctx = ctx_with_instance("n1");
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        bfd_open(&mut ctx, &line("bfd_instance n2 {"));
        let action = bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        assert_eq!(action, HandlerAction::AbortBlock);
        assert_eq!(ctx.bfd.instances.len(), 1);
        assert_eq!(ctx.bfd.instances[0].name, "n1");
    }

    #[test]
    fn test_source_malformed_is_field_local() {
        let mut ctx = ctx_with_instance("n1");
        let action = bfd_source_ip(&mut ctx, &line("source_ip nope"));
        assert_eq!(action, HandlerAction::Continue);
        assert_eq!(ctx.bfd.instances[0].source_addr, None);
    }

    #[test]
    fn test_min_rx_applied_scaled() {
        let mut ctx = ctx_with_instance("n1");
        bfd_min_rx(&mut ctx, &line("min_rx 200"));
        assert_eq!(ctx.bfd.instances[0].local_min_rx_us, 200_000);
    }

    #[test]
    fn test_min_rx_out_of_range_keeps_prior_value() {
        let mut ctx = ctx_with_instance("n1");
        bfd_min_rx(&mut ctx, &line("min_rx 0"));
        assert_eq!(ctx.bfd.instances[0].local_min_rx_us, 10_000);

        // Above the admissible maximum: rejected (and flagged as beyond
        // the sensible maximum, which does not make it applied).
        bfd_min_rx(&mut ctx, &line("min_rx 99999999999"));
        assert_eq!(ctx.bfd.instances[0].local_min_rx_us, 10_000);

        bfd_min_rx(&mut ctx, &line("min_rx ten"));
        assert_eq!(ctx.bfd.instances[0].local_min_rx_us, 10_000);
    }

    #[test]
    fn test_min_rx_above_sensible_still_applied() {
        let mut ctx = ctx_with_instance("n1");
        bfd_min_rx(&mut ctx, &line("min_rx 5000"));
        assert_eq!(ctx.bfd.instances[0].local_min_rx_us, 5_000_000);
    }

    #[test]
    fn test_multiplier_range() {
        let mut ctx = ctx_with_instance("n1");
        bfd_multiplier(&mut ctx, &line("multiplier 4"));
        assert_eq!(ctx.bfd.instances[0].local_detect_mult, 4);

        bfd_multiplier(&mut ctx, &line("multiplier 0"));
        assert_eq!(ctx.bfd.instances[0].local_detect_mult, 4);

        bfd_multiplier(&mut ctx, &line("multiplier 256"));
        assert_eq!(ctx.bfd.instances[0].local_detect_mult, 4);
    }

    #[test]
    fn test_ttl_rejects_zero() {
        let mut ctx = ctx_with_instance("n1");
        bfd_ttl(&mut ctx, &line("ttl 0"));
        assert_eq!(ctx.bfd.instances[0].ttl, 0);

        bfd_ttl(&mut ctx, &line("ttl 64"));
        assert_eq!(ctx.bfd.instances[0].ttl, 64);

        bfd_ttl(&mut ctx, &line("ttl 256"));
        assert_eq!(ctx.bfd.instances[0].ttl, 64);
    }

    #[test]
    fn test_max_hops_range() {
        let mut ctx = ctx_with_instance("n1");
        bfd_max_hops(&mut ctx, &line("max_hops -1"));
        assert_eq!(ctx.bfd.instances[0].max_hops, -1);

        bfd_max_hops(&mut ctx, &line("max_hops 8"));
        assert_eq!(ctx.bfd.instances[0].max_hops, 8);

        bfd_max_hops(&mut ctx, &line("max_hops -2"));
        assert_eq!(ctx.bfd.instances[0].max_hops, 8);

        bfd_max_hops(&mut ctx, &line("max_hops 300"));
        assert_eq!(ctx.bfd.instances[0].max_hops, 8);
    }

    #[test]
    fn test_end_discards_without_neighbor() {
        let mut ctx = ctx_with_instance("n1");
        bfd_end(&mut ctx);
        assert!(ctx.bfd.instances.is_empty());
    }

    #[test]
    fn test_end_discards_family_mismatch() {
        let mut ctx = ctx_with_instance("n1");
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 2001:db8::1"));
        bfd_source_ip(&mut ctx, &line("source_ip 192.0.2.1"));
        bfd_end(&mut ctx);
        assert!(ctx.bfd.instances.is_empty());
    }

    #[test]
    fn test_end_resolves_ttl_by_family() {
        let mut ctx = ctx_with_instance("n1");
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        bfd_end(&mut ctx);
        assert_eq!(ctx.bfd.instances[0].ttl, BFD_CONTROL_TTL);

        bfd_open(&mut ctx, &line("bfd_instance n2 {"));
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 2001:db8::1"));
        bfd_end(&mut ctx);
        assert_eq!(ctx.bfd.instances[1].ttl, BFD_CONTROL_HOPLIMIT);
    }

    #[test]
    fn test_end_clamps_max_hops_to_ttl() {
        let mut ctx = ctx_with_instance("n1");
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        bfd_ttl(&mut ctx, &line("ttl 64"));
        bfd_max_hops(&mut ctx, &line("max_hops 200"));
        bfd_end(&mut ctx);
        assert_eq!(ctx.bfd.instances[0].max_hops, 64);
    }

    #[test]
    fn test_end_resolves_notify_flags() {
        // No selector: every enabled role.
        let mut ctx = ctx_with_instance("n1");
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        bfd_end(&mut ctx);
        assert!(ctx.bfd.instances[0].notify_vrrp);
        assert!(ctx.bfd.instances[0].notify_checker);

        // vrrp selected: only the redundancy role.
        bfd_open(&mut ctx, &line("bfd_instance n2 {"));
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.2"));
        ctx.selected.vrrp = true;
        bfd_end(&mut ctx);
        assert!(ctx.bfd.instances[1].notify_vrrp);
        assert!(!ctx.bfd.instances[1].notify_checker);
    }

    #[test]
    fn test_end_respects_enabled_roles() {
        let enabled = EnabledRoles {
            vrrp: false,
            checker: true,
        };
        let mut ctx = ParseContext::new(Role::Bfd, enabled);
        bfd_open(&mut ctx, &line("bfd_instance n1 {"));
        bfd_neighbor_ip(&mut ctx, &line("neighbor_ip 192.0.2.1"));
        bfd_end(&mut ctx);
        assert!(!ctx.bfd.instances[0].notify_vrrp);
        assert!(ctx.bfd.instances[0].notify_checker);
    }
}
