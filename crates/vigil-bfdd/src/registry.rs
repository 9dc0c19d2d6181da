//! Cross-reference registry: the redundancy and checker roles track BFD
//! instances by name.
//!
//! Each consuming role keeps its own list of lightweight references; a
//! reference never owns the monitor role's instance, it only names it.
//! Tracking is by default for every enabled role, and becomes opt-in the
//! moment any `vrrp`/`checker` selector keyword is used anywhere in the
//! load: a reference whose role was never selected for its instance is
//! removed, either at block close or by the end-of-load reconciliation.

use tracing::{error, info};
use vigil_conf::{HandlerAction, Line};

use crate::context::ParseContext;
use crate::types::{CheckerTrackedBfd, TrackedBfd, BFD_WEIGHT_MAX, BFD_WEIGHT_MIN};

/// Marks the current instance as monitored by the redundancy role.
pub(crate) fn bfd_event_vrrp(ctx: &mut ParseContext, _line: &Line) -> HandlerAction {
    ctx.selected.vrrp = true;
    ctx.selector_seen = true;
    HandlerAction::Continue
}

/// Marks the current instance as monitored by the checker role.
pub(crate) fn bfd_event_checker(ctx: &mut ParseContext, _line: &Line) -> HandlerAction {
    ctx.selected.checker = true;
    ctx.selector_seen = true;
    HandlerAction::Continue
}

/// Opens a `bfd_instance` block for the redundancy role: registers a
/// provisional tracked reference.
pub(crate) fn vrrp_track_open(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(name) = line.arg(1) else {
        error!("Configuration error: bfd_instance without a name - ignoring");
        return HandlerAction::AbortBlock;
    };

    if ctx.vrrp.find_tracked(name).is_some() {
        info!("BFD instance {} already tracked - ignoring", name);
        return HandlerAction::AbortBlock;
    }

    ctx.vrrp.tracked_bfds.push(TrackedBfd::new(name));
    ctx.selected.clear();
    HandlerAction::Continue
}

/// Sets the tracking weight on the reference being built.
pub(crate) fn vrrp_track_weight(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(tracked) = ctx.vrrp.tracked_bfds.last_mut() else {
        return HandlerAction::Continue;
    };

    let raw = line.arg(1).unwrap_or("");
    match raw.parse::<i64>() {
        Ok(value) if (BFD_WEIGHT_MIN..=BFD_WEIGHT_MAX).contains(&value) => {
            tracked.weight = value as i32;
        }
        _ => error!(
            "Configuration error: BFD instance {} weight value {} not valid (must be in range [{}-{}]) - ignoring",
            tracked.name, raw, BFD_WEIGHT_MIN, BFD_WEIGHT_MAX
        ),
    }
    HandlerAction::Continue
}

/// Closes a redundancy-role block: keeps the reference only if this role
/// still claims the instance.
pub(crate) fn vrrp_track_end(ctx: &mut ParseContext) {
    let Some(tracked) = ctx.vrrp.tracked_bfds.last() else {
        return;
    };

    if ctx.selected.vrrp {
        return;
    }
    if ctx.selector_seen {
        info!(
            "BFD instance {} not selected for the redundancy role - dropping",
            tracked.name
        );
        ctx.vrrp.tracked_bfds.pop();
    } else {
        ctx.vrrp_defaults.push(tracked.name.clone());
    }
}

/// Opens a `bfd_instance` block for the checker role.
pub(crate) fn checker_track_open(ctx: &mut ParseContext, line: &Line) -> HandlerAction {
    let Some(name) = line.arg(1) else {
        error!("Configuration error: bfd_instance without a name - ignoring");
        return HandlerAction::AbortBlock;
    };

    if ctx.checker.find_tracked(name).is_some() {
        info!("BFD instance {} already tracked - ignoring", name);
        return HandlerAction::AbortBlock;
    }

    ctx.checker.tracked_bfds.push(CheckerTrackedBfd::new(name));
    ctx.selected.clear();
    HandlerAction::Continue
}

/// Closes a checker-role block: keeps the reference only if this role
/// still claims the instance.
pub(crate) fn checker_track_end(ctx: &mut ParseContext) {
    let Some(tracked) = ctx.checker.tracked_bfds.last() else {
        return;
    };

    if ctx.selected.checker {
        return;
    }
    if ctx.selector_seen {
        info!(
            "BFD instance {} not selected for the checker role - dropping",
            tracked.name
        );
        ctx.checker.tracked_bfds.pop();
    } else {
        ctx.checker_defaults.push(tracked.name.clone());
    }
}

/// End-of-load reconciliation of the by-default references.
///
/// Selection is opt-in as soon as any selector keyword was used anywhere
/// in the load; references created before the first selector appeared
/// were kept provisionally and are dropped here. Without any selector,
/// every role tracks every instance and the provisional markers are
/// simply discarded, so re-parsing the same text always yields the same
/// lists.
pub(crate) fn reconcile_tracked(ctx: &mut ParseContext) {
    if !ctx.selector_seen {
        ctx.vrrp_defaults.clear();
        ctx.checker_defaults.clear();
        return;
    }

    for name in std::mem::take(&mut ctx.vrrp_defaults) {
        if let Some(pos) = ctx.vrrp.tracked_bfds.iter().position(|t| t.name == name) {
            info!(
                "BFD instance {} not selected for the redundancy role - dropping",
                name
            );
            ctx.vrrp.tracked_bfds.remove(pos);
        }
    }

    for name in std::mem::take(&mut ctx.checker_defaults) {
        if let Some(pos) = ctx.checker.tracked_bfds.iter().position(|t| t.name == name) {
            info!(
                "BFD instance {} not selected for the checker role - dropping",
                name
            );
            ctx.checker.tracked_bfds.remove(pos);
        }
    }
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

    fn vrrp_ctx() -> ParseContext {
        ParseContext::new(Role::Vrrp, EnabledRoles::default())
    }

    #[test]
    fn test_duplicate_tracked_name_aborts_block() {
        let mut ctx = vrrp_ctx();
        assert_eq!(
            vrrp_track_open(&mut ctx, &line("bfd_instance t1 {")),
            HandlerAction::Continue
        );
        assert_eq!(
            vrrp_track_open(&mut ctx, &line("bfd_instance t1 {")),
            HandlerAction::AbortBlock
        );
        assert_eq!(ctx.vrrp.tracked_bfds.len(), 1);
    }

    #[test]
    fn test_weight_range() {
        let mut ctx = vrrp_ctx();
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));

        vrrp_track_weight(&mut ctx, &line("weight 120"));
        assert_eq!(ctx.vrrp.tracked_bfds[0].weight, 120);

        vrrp_track_weight(&mut ctx, &line("weight -254"));
        assert_eq!(ctx.vrrp.tracked_bfds[0].weight, 120);

        vrrp_track_weight(&mut ctx, &line("weight 254"));
        assert_eq!(ctx.vrrp.tracked_bfds[0].weight, 120);

        vrrp_track_weight(&mut ctx, &line("weight heavy"));
        assert_eq!(ctx.vrrp.tracked_bfds[0].weight, 120);

        vrrp_track_weight(&mut ctx, &line("weight -253"));
        assert_eq!(ctx.vrrp.tracked_bfds[0].weight, -253);
    }

    #[test]
    fn test_end_keeps_explicitly_selected() {
        let mut ctx = vrrp_ctx();
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));
        bfd_event_vrrp(&mut ctx, &line("vrrp"));
        vrrp_track_end(&mut ctx);
        assert_eq!(ctx.vrrp.tracked_bfds.len(), 1);
        assert!(ctx.vrrp_defaults.is_empty());
    }

    #[test]
    fn test_end_drops_when_other_role_selected() {
        let mut ctx = vrrp_ctx();
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));
        bfd_event_checker(&mut ctx, &line("checker"));
        vrrp_track_end(&mut ctx);
        assert!(ctx.vrrp.tracked_bfds.is_empty());
    }

    #[test]
    fn test_end_drops_after_earlier_selector() {
        let mut ctx = vrrp_ctx();
        ctx.selector_seen = true;
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));
        vrrp_track_end(&mut ctx);
        assert!(ctx.vrrp.tracked_bfds.is_empty());
    }

    #[test]
    fn test_reconcile_drops_earlier_defaults_once_selector_seen() {
        let mut ctx = vrrp_ctx();
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));
        vrrp_track_end(&mut ctx);
        assert_eq!(ctx.vrrp_defaults, vec!["t1".to_string()]);

        vrrp_track_open(&mut ctx, &line("bfd_instance t2 {"));
        bfd_event_vrrp(&mut ctx, &line("vrrp"));
        vrrp_track_end(&mut ctx);

        reconcile_tracked(&mut ctx);
        assert_eq!(ctx.vrrp.tracked_bfds.len(), 1);
        assert_eq!(ctx.vrrp.tracked_bfds[0].name, "t2");
    }

    #[test]
    fn test_reconcile_keeps_defaults_without_any_selector() {
        let mut ctx = vrrp_ctx();
        vrrp_track_open(&mut ctx, &line("bfd_instance t1 {"));
        vrrp_track_end(&mut ctx);
        vrrp_track_open(&mut ctx, &line("bfd_instance t2 {"));
        vrrp_track_end(&mut ctx);

        reconcile_tracked(&mut ctx);
        assert_eq!(ctx.vrrp.tracked_bfds.len(), 2);
        assert!(ctx.vrrp_defaults.is_empty());
    }

    #[test]
    fn test_checker_end_mirrors_vrrp() {
        let mut ctx = ParseContext::new(Role::Checker, EnabledRoles::default());
        checker_track_open(&mut ctx, &line("bfd_instance t1 {"));
        bfd_event_vrrp(&mut ctx, &line("vrrp"));
        checker_track_end(&mut ctx);
        assert!(ctx.checker.tracked_bfds.is_empty());
    }
}
