// ABOUTME: Integration tests for authorization predicates over the principal context
// ABOUTME: Validates wildcard, any-permission, and project-scoped role semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::HashMap;

use uuid::Uuid;
use warden::authz::{
    check_any_permission, check_authenticated, check_permission, check_project_access,
    check_project_role, AuthzDenial,
};
use warden::errors::AppError;
use warden::principal::{AccessClaims, PrincipalContext, ProjectRole, ROOT_PERMISSION};

fn context_from_claims(
    permissions: &[&str],
    memberships: &[(Uuid, &str)],
) -> PrincipalContext {
    let claims = AccessClaims {
        sub: "user-42".into(),
        permissions: permissions.iter().map(ToString::to_string).collect(),
        memberships: memberships
            .iter()
            .map(|(id, role)| (id.to_string(), (*role).to_string()))
            .collect::<HashMap<_, _>>(),
        exp: 4_102_444_800,
        iat: 1_700_000_000,
    };
    PrincipalContext::from_claims(&claims).unwrap()
}

#[test]
fn test_root_grants_every_permission() {
    let ctx = context_from_claims(&[ROOT_PERMISSION], &[]);
    for permission in ["employee:read", "project:delete", "made:up"] {
        assert!(check_permission(&ctx, permission).is_ok());
    }
}

#[test]
fn test_permission_requires_verbatim_match_without_root() {
    let ctx = context_from_claims(&["employee:read"], &[]);
    assert!(check_permission(&ctx, "employee:read").is_ok());
    assert!(check_permission(&ctx, "employee:delete").is_err());
    assert!(check_permission(&ctx, "employee:*").is_err());
}

#[test]
fn test_any_permission_admin_or_self_service() {
    let admin = context_from_claims(&["employee:read"], &[]);
    let regular = context_from_claims(&["employee:read_self"], &[]);
    let neither = context_from_claims(&["chatbot:read"], &[]);

    let acceptable = ["employee:read", "employee:read_self"];
    assert!(check_any_permission(&admin, &acceptable).is_ok());
    assert!(check_any_permission(&regular, &acceptable).is_ok());
    assert!(check_any_permission(&neither, &acceptable).is_err());
}

#[test]
fn test_project_access_denied_without_membership_even_with_root() {
    let project = Uuid::new_v4();
    let ctx = context_from_claims(&[ROOT_PERMISSION], &[]);
    assert!(check_project_access(&ctx, "chatbot:read", project).is_err());

    let member = context_from_claims(&[ROOT_PERMISSION], &[(project, "user")]);
    assert!(check_project_access(&member, "chatbot:read", project).is_ok());
}

#[test]
fn test_minimum_role_ladder() {
    let project = Uuid::new_v4();
    let cases = [
        ("user", ProjectRole::Member, false),
        ("member", ProjectRole::Member, true),
        ("member", ProjectRole::Admin, false),
        ("admin", ProjectRole::Admin, true),
        ("admin", ProjectRole::Owner, false),
        ("owner", ProjectRole::Owner, true),
        ("owner", ProjectRole::User, true),
    ];
    for (label, minimum, expected) in cases {
        let ctx = context_from_claims(&["project:update"], &[(project, label)]);
        let result = check_project_role(&ctx, "project:update", project, minimum);
        assert_eq!(result.is_ok(), expected, "{label} vs {minimum:?}");
    }
}

#[test]
fn test_denial_reasons_distinguish_status() {
    let ctx = context_from_claims(&[], &[]);

    let unauthenticated: AppError = check_authenticated(None).unwrap_err().into();
    assert_eq!(unauthenticated.http_status(), 401);

    let forbidden: AppError = check_permission(&ctx, "employee:read").unwrap_err().into();
    assert_eq!(forbidden.http_status(), 403);
}

#[test]
fn test_checks_do_not_mutate_context() {
    let project = Uuid::new_v4();
    let ctx = context_from_claims(&["employee:read"], &[(project, "admin")]);

    let _ = check_permission(&ctx, "employee:read");
    let _ = check_project_access(&ctx, "missing:perm", project);
    let _ = check_authenticated(Some(&ctx));

    assert_eq!(ctx.permissions().len(), 1);
    assert_eq!(ctx.memberships().len(), 1);
    assert_eq!(ctx.role_in(project), Some(ProjectRole::Admin));
}

#[test]
fn test_unauthenticated_variant_equality() {
    assert_eq!(
        check_authenticated(None).unwrap_err(),
        AuthzDenial::Unauthenticated
    );
}
