// ABOUTME: Audit trail for high-sensitivity administrative actions
// ABOUTME: Emits structured tracing events on a dedicated target for reveal and rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Audit Events
//!
//! Secret reveal and rotation are the highest-sensitivity actions in this
//! core, so every invocation emits an audit record: who, when, which client,
//! and the outcome. Attempt and result are both recorded regardless of
//! whether the operation succeeds. Events go to the dedicated `audit`
//! tracing target so subscribers can route them to durable storage
//! independently of application logs; routine authorization denials log at
//! `debug` and never reach this target.

use crate::errors::AppError;

/// Tracing target carrying audit events, for subscriber filtering
pub const AUDIT_TARGET: &str = "audit";

/// Auditable administrative actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Disclosure of the stored secret hash
    RevealSecret,
    /// Replacement of the client secret with freshly issued material
    RotateSecret,
}

impl AuditAction {
    /// Stable event name for log consumers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RevealSecret => "client.secret.reveal",
            Self::RotateSecret => "client.secret.rotate",
        }
    }
}

/// Record that `actor` attempted `action` on `client`
pub fn attempted(action: AuditAction, actor: &str, client: &str) {
    tracing::info!(
        target: "audit",
        action = action.as_str(),
        actor = %actor,
        client = %client,
        outcome = "attempted",
    );
}

/// Record that the attempt completed successfully
pub fn succeeded(action: AuditAction, actor: &str, client: &str) {
    tracing::info!(
        target: "audit",
        action = action.as_str(),
        actor = %actor,
        client = %client,
        outcome = "succeeded",
    );
}

/// Record that the attempt was refused, with the refusal code
pub fn denied(action: AuditAction, actor: &str, client: &str, error: &AppError) {
    tracing::warn!(
        target: "audit",
        action = action.as_str(),
        actor = %actor,
        client = %client,
        outcome = "denied",
        code = ?error.code,
    );
}
