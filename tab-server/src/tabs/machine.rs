//! Tab status transition table

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::TabStatus;

/// An allowed status change and the side effects it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// open → closed
    Close,
    /// open → paid; needs a tendered amount ≥ total
    Pay,
    /// open → fiado; appends a FIADO ledger entry
    Fiado,
    /// closed | paid | fiado → open; admin only
    Reopen,
    /// any non-deleted → deleted
    Delete,
}

use TabStatus::{Closed, Deleted, Fiado, Open, Paid};

const TRANSITIONS: &[(TabStatus, TabStatus, Transition)] = &[
    (Open, Closed, Transition::Close),
    (Open, Paid, Transition::Pay),
    (Open, Fiado, Transition::Fiado),
    (Open, Deleted, Transition::Delete),
    (Closed, Open, Transition::Reopen),
    (Closed, Deleted, Transition::Delete),
    (Paid, Open, Transition::Reopen),
    (Paid, Deleted, Transition::Delete),
    (Fiado, Open, Transition::Reopen),
    (Fiado, Deleted, Transition::Delete),
];

impl Transition {
    pub const fn requires_admin(&self) -> bool {
        matches!(self, Self::Reopen)
    }

    pub const fn target(&self) -> TabStatus {
        match self {
            Self::Close => Closed,
            Self::Pay => Paid,
            Self::Fiado => Fiado,
            Self::Reopen => Open,
            Self::Delete => Deleted,
        }
    }
}

/// Look up the transition from `from` to `to`
pub fn plan(from: TabStatus, to: TabStatus) -> AppResult<Transition> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, transition)| *transition)
        .ok_or_else(|| {
            let allowed: Vec<&str> = allowed_targets(from).map(|s| s.as_str()).collect();
            AppError::invalid_state(
                ErrorCode::InvalidTransition,
                format!("Cannot move tab from {from} to {to}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str())
            .with_detail("allowed", allowed)
        })
}

/// Statuses reachable from `from`
pub fn allowed_targets(from: TabStatus) -> impl Iterator<Item = TabStatus> {
    TRANSITIONS
        .iter()
        .filter(move |(f, _, _)| *f == from)
        .map(|(_, t, _)| *t)
}

/// A status request, with `closed` + payment method `fiado` read as `fiado`
pub fn requested_status(status: Option<TabStatus>, payment_method: Option<&str>) -> Option<TabStatus> {
    match (status, payment_method) {
        (Some(Closed), Some(method)) if method.trim().eq_ignore_ascii_case("fiado") => Some(Fiado),
        (status, _) => status,
    }
}
