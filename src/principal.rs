// ABOUTME: Request-scoped principal context derived from verified token claims
// ABOUTME: Defines the project role vocabulary and fail-closed claims reshaping
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Principal Context
//!
//! The decoded, verified representation of a caller: subject id, granted
//! permission set, and project-scoped role memberships. A context is built
//! once per request from already-verified claims and is immutable from then
//! on; authorization checks are read-only predicates over it.
//!
//! Construction trusts the token verifier completely. It makes no trust
//! decisions of its own, but it does fail closed: missing subject or
//! malformed membership keys reject the token instead of producing a context
//! with empty or default trust.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Reserved wildcard permission meaning "all permissions granted"
pub const ROOT_PERMISSION: &str = "root";

/// Caller role within a project, ordered by privilege
///
/// Variant order carries the total order `user < member < admin < owner`,
/// so role comparisons are plain integer comparisons.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Read-mostly participant
    User,
    /// Regular project member
    Member,
    /// Can manage project configuration and members
    Admin,
    /// Full control over the project
    Owner,
}

impl ProjectRole {
    /// Numeric rank for the fixed ordering `user(1) < member(2) < admin(3) < owner(4)`
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::User => 1,
            Self::Member => 2,
            Self::Admin => 3,
            Self::Owner => 4,
        }
    }

    /// Parse a role label from token claims.
    ///
    /// Unknown labels degrade to the least-privileged role rather than
    /// rejecting the token, so a vocabulary extension on the issuer side can
    /// never grant more than `user` here.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "user" => Self::User,
            "member" => Self::Member,
            "admin" => Self::Admin,
            "owner" => Self::Owner,
            other => {
                tracing::warn!(role = %other, "unknown project role label, defaulting to user");
                Self::User
            }
        }
    }

    /// Canonical label for this role
    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Claims shape consumed from a verified access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (stable caller identifier)
    pub sub: String,
    /// Granted permission strings, may include the `root` wildcard
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Project id → role label
    #[serde(default)]
    pub memberships: HashMap<String, String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Immutable, request-scoped caller identity and grants
#[derive(Debug, Clone)]
pub struct PrincipalContext {
    subject_id: String,
    permissions: HashSet<String>,
    memberships: HashMap<Uuid, ProjectRole>,
}

impl PrincipalContext {
    /// Construct a context directly; used by tests and service-to-service
    /// callers that already hold verified identity material.
    #[must_use]
    pub fn new(
        subject_id: impl Into<String>,
        permissions: impl IntoIterator<Item = String>,
        memberships: impl IntoIterator<Item = (Uuid, ProjectRole)>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            permissions: permissions.into_iter().collect(),
            memberships: memberships.into_iter().collect(),
        }
    }

    /// Reshape verified claims into a principal context.
    ///
    /// # Errors
    /// Fails closed with `Unauthenticated` when the subject is missing or a
    /// membership key is not a valid project id.
    pub fn from_claims(claims: &AccessClaims) -> AppResult<Self> {
        let subject_id = claims.sub.trim();
        if subject_id.is_empty() {
            return Err(AppError::unauthenticated("token claims missing subject"));
        }

        let mut memberships = HashMap::with_capacity(claims.memberships.len());
        for (project, label) in &claims.memberships {
            let project_id = Uuid::parse_str(project).map_err(|_| {
                AppError::unauthenticated(format!(
                    "token membership key {project:?} is not a valid project id"
                ))
            })?;
            memberships.insert(project_id, ProjectRole::from_label(label));
        }

        Ok(Self {
            subject_id: subject_id.to_string(),
            permissions: claims.permissions.iter().cloned().collect(),
            memberships,
        })
    }

    /// Stable caller identifier
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Whether the permission set contains `permission` verbatim or the
    /// reserved `root` wildcard. No other prefix or glob matching exists.
    #[must_use]
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.contains(permission) || self.permissions.contains(ROOT_PERMISSION)
    }

    /// The caller's role in `project_id`, if they are a member
    #[must_use]
    pub fn role_in(&self, project_id: Uuid) -> Option<ProjectRole> {
        self.memberships.get(&project_id).copied()
    }

    /// Granted permission strings
    #[must_use]
    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }

    /// Project memberships
    #[must_use]
    pub fn memberships(&self) -> &HashMap<Uuid, ProjectRole> {
        &self.memberships
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> AccessClaims {
        AccessClaims {
            sub: sub.to_string(),
            permissions: vec!["employee:read".into()],
            memberships: HashMap::new(),
            exp: 4_102_444_800,
            iat: 1_700_000_000,
        }
    }

    #[test]
    fn test_role_total_order() {
        assert!(ProjectRole::User < ProjectRole::Member);
        assert!(ProjectRole::Member < ProjectRole::Admin);
        assert!(ProjectRole::Admin < ProjectRole::Owner);
        assert_eq!(ProjectRole::User.rank(), 1);
        assert_eq!(ProjectRole::Owner.rank(), 4);
    }

    #[test]
    fn test_role_label_roundtrip() {
        for role in [
            ProjectRole::User,
            ProjectRole::Member,
            ProjectRole::Admin,
            ProjectRole::Owner,
        ] {
            assert_eq!(ProjectRole::from_label(role.as_label()), role);
        }
    }

    #[test]
    fn test_unknown_label_degrades_to_user() {
        assert_eq!(ProjectRole::from_label("superuser"), ProjectRole::User);
    }

    #[test]
    fn test_missing_subject_fails_closed() {
        let err = PrincipalContext::from_claims(&claims("   ")).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::Unauthenticated);
    }

    #[test]
    fn test_malformed_project_id_fails_closed() {
        let mut c = claims("subject-1");
        c.memberships
            .insert("not-a-uuid".into(), "admin".into());
        let err = PrincipalContext::from_claims(&c).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::Unauthenticated);
    }

    #[test]
    fn test_from_claims_reshapes_memberships() {
        let project = Uuid::new_v4();
        let mut c = claims("subject-1");
        c.memberships
            .insert(project.to_string(), "owner".into());
        let ctx = PrincipalContext::from_claims(&c).unwrap();
        assert_eq!(ctx.subject_id(), "subject-1");
        assert_eq!(ctx.role_in(project), Some(ProjectRole::Owner));
        assert!(ctx.grants("employee:read"));
        assert!(!ctx.grants("employee:write"));
    }

    #[test]
    fn test_root_wildcard_grants_everything() {
        let ctx = PrincipalContext::new("subject-1", [ROOT_PERMISSION.to_string()], []);
        assert!(ctx.grants("anything:at_all"));
    }
}
