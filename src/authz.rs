// ABOUTME: Pure authorization decision primitives over the principal context
// ABOUTME: Permission, any-permission, and project-scoped role checks with typed denial reasons
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Authorizer
//!
//! Pure, synchronous predicates over a [`PrincipalContext`]. Nothing here
//! blocks, mutates, or knows about transport status codes: every denial is a
//! single [`AuthzDenial`] carrying a machine-distinguishable reason
//! (unauthenticated vs. forbidden) that the transport layer maps to a status
//! code via the error taxonomy.
//!
//! Denials are logged at `debug`; they are routine and must stay below the
//! severity of audit events.

use uuid::Uuid;

use crate::errors::AppError;
use crate::principal::{PrincipalContext, ProjectRole};

/// Why an authorization check failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzDenial {
    /// No principal context present on the request
    Unauthenticated,
    /// Valid principal, insufficient grant
    Forbidden {
        /// Human-readable description of the missing requirement
        required: String,
    },
}

impl From<AuthzDenial> for AppError {
    fn from(denial: AuthzDenial) -> Self {
        match denial {
            AuthzDenial::Unauthenticated => {
                Self::unauthenticated("authentication required")
            }
            AuthzDenial::Forbidden { required } => {
                Self::forbidden(format!("missing required grant: {required}"))
            }
        }
    }
}

/// Result of a pure authorization check
pub type AuthzResult = Result<(), AuthzDenial>;

/// Require that a principal context is present at all.
///
/// Used for "must be logged in, no specific permission" operations.
///
/// # Errors
/// Returns [`AuthzDenial::Unauthenticated`] when no context is present.
pub fn check_authenticated(
    principal: Option<&PrincipalContext>,
) -> Result<&PrincipalContext, AuthzDenial> {
    principal.ok_or(AuthzDenial::Unauthenticated)
}

/// Require a single permission, satisfied verbatim or by the `root` wildcard.
///
/// # Errors
/// Returns [`AuthzDenial::Forbidden`] when neither the permission nor `root`
/// is granted.
pub fn check_permission(principal: &PrincipalContext, permission: &str) -> AuthzResult {
    if principal.grants(permission) {
        return Ok(());
    }
    tracing::debug!(
        subject = %principal.subject_id(),
        permission = %permission,
        "permission denied"
    );
    Err(AuthzDenial::Forbidden {
        required: permission.to_string(),
    })
}

/// Require at least one of several permissions.
///
/// Used where a global admin permission and a narrower self-service
/// permission are both acceptable for the same action.
///
/// # Errors
/// Returns [`AuthzDenial::Forbidden`] when none of the permissions is granted.
pub fn check_any_permission(principal: &PrincipalContext, permissions: &[&str]) -> AuthzResult {
    if permissions.iter().any(|p| principal.grants(p)) {
        return Ok(());
    }
    tracing::debug!(
        subject = %principal.subject_id(),
        permissions = ?permissions,
        "no acceptable permission granted"
    );
    Err(AuthzDenial::Forbidden {
        required: format!("any of {permissions:?}"),
    })
}

/// Require a permission plus membership in the given project.
///
/// The `root` wildcard satisfies the permission half but never substitutes
/// for membership: a caller outside the project is denied regardless of
/// global grants.
///
/// # Errors
/// Returns [`AuthzDenial::Forbidden`] when the permission is missing or the
/// caller is not a member of `project_id`.
pub fn check_project_access(
    principal: &PrincipalContext,
    permission: &str,
    project_id: Uuid,
) -> AuthzResult {
    check_permission(principal, permission)?;
    if principal.role_in(project_id).is_some() {
        return Ok(());
    }
    tracing::debug!(
        subject = %principal.subject_id(),
        project_id = %project_id,
        "caller is not a member of the project"
    );
    Err(AuthzDenial::Forbidden {
        required: format!("membership in project {project_id}"),
    })
}

/// Require a permission plus a minimum role within the project.
///
/// The caller's role rank must be greater than or equal to `minimum` under
/// the fixed ordering `user < member < admin < owner`.
///
/// # Errors
/// Returns [`AuthzDenial::Forbidden`] when the permission is missing, the
/// caller is not a member, or their role ranks below `minimum`.
pub fn check_project_role(
    principal: &PrincipalContext,
    permission: &str,
    project_id: Uuid,
    minimum: ProjectRole,
) -> AuthzResult {
    check_project_access(principal, permission, project_id)?;
    match principal.role_in(project_id) {
        Some(role) if role >= minimum => Ok(()),
        Some(role) => {
            tracing::debug!(
                subject = %principal.subject_id(),
                project_id = %project_id,
                role = %role,
                minimum = %minimum,
                "role below required minimum"
            );
            Err(AuthzDenial::Forbidden {
                required: format!("role {minimum} or higher in project {project_id}"),
            })
        }
        // Unreachable after check_project_access, but fail closed anyway.
        None => Err(AuthzDenial::Forbidden {
            required: format!("membership in project {project_id}"),
        }),
    }
}
