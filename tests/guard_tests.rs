use doc_portal::{
    access::AccessQuery,
    denial::DenialPayload,
    guard::{
        Decision, Denial, DenialMode, DenialReason, Evaluation, Guard, GuardAction, GuardOptions,
        RedirectState, ReplaceRedirect, Requirement, SIGN_IN_MESSAGE, evaluate,
    },
    models::{Role, User},
    session::Session,
};

// --- Helpers ---

const ROLES: [Role; 3] = [Role::Admin, Role::Operator, Role::Viewer];

fn user(role: Role, permissions: &[&str]) -> User {
    permissions
        .iter()
        .fold(User::new("Dana", role), |user, p| user.with_permission(*p))
}

fn requirements() -> Vec<Requirement> {
    let mut all = vec![
        Requirement::authenticated(),
        Requirement::permission("doc:read"),
        Requirement::permission("doc:write"),
    ];
    all.extend(ROLES.iter().map(|r| Requirement::role(*r)));
    all.push(Requirement {
        role: Some(Role::Operator),
        permission: Some("doc:write".into()),
    });
    all
}

fn sessions() -> Vec<Session> {
    let mut all = vec![
        Session::loading(),
        Session::anonymous(),
        // Authenticated flag without a user must still be denied on any role or permission.
        Session {
            is_authenticated: true,
            is_loading: false,
            user: None,
        },
    ];
    for role in ROLES {
        all.push(Session::authenticated(user(role, &[])));
        all.push(Session::authenticated(user(role, &["doc:read"])));
        all.push(Session::authenticated(user(role, &["doc:read", "doc:write"])));
    }
    all
}

// --- Evaluation Order ---

#[test]
fn test_loading_session_is_pending_for_every_requirement() {
    for requirement in requirements() {
        // Loading overrides a user that is already present.
        let mut session = Session::authenticated(user(Role::Admin, &["doc:write"]));
        session.is_loading = true;

        assert_eq!(
            evaluate(&requirement, &session, "/documents"),
            Evaluation::Pending
        );
        assert_eq!(
            evaluate(&requirement, &Session::loading(), "/documents"),
            Evaluation::Pending
        );
    }
}

#[test]
fn test_anonymous_session_redirects_with_requested_path() {
    for requirement in requirements() {
        for path in ["/", "/admin/users", "/documents?page=2"] {
            let evaluation = evaluate(&requirement, &Session::anonymous(), path);
            assert_eq!(
                evaluation,
                Evaluation::Decided(Decision::RedirectUnauthenticated(RedirectState {
                    from: path.to_string(),
                    message: SIGN_IN_MESSAGE.to_string(),
                }))
            );
        }
    }
}

#[test]
fn test_role_only_requirement_allows_exact_match() {
    for held in ROLES {
        for required in ROLES {
            let session = Session::authenticated(user(held, &["doc:read"]));
            let decided = evaluate(&Requirement::role(required), &session, "/");
            assert_eq!(
                decided == Evaluation::Decided(Decision::Allow),
                held == required,
                "held {held}, required {required}"
            );
        }
    }
}

#[test]
fn test_permission_only_requirement_is_set_membership() {
    for held in [&[][..], &["doc:read"][..], &["doc:read", "doc:write"][..]] {
        let session = Session::authenticated(user(Role::Viewer, held));
        for required in ["doc:read", "doc:write", "doc:delete"] {
            let decided = evaluate(&Requirement::permission(required), &session, "/");
            assert_eq!(
                decided == Evaluation::Decided(Decision::Allow),
                held.contains(&required),
                "held {held:?}, required {required}"
            );
        }
    }
}

#[test]
fn test_role_is_checked_before_permission() {
    let session = Session::authenticated(user(Role::Viewer, &[]));
    let requirement = Requirement {
        role: Some(Role::Operator),
        permission: Some("doc:write".into()),
    };

    let Evaluation::Decided(Decision::Deny(denial)) = evaluate(&requirement, &session, "/") else {
        panic!("expected a denial");
    };
    assert_eq!(denial.reason, DenialReason::Role);
}

#[test]
fn test_authenticated_without_user_is_denied_not_allowed() {
    let session = Session {
        is_authenticated: true,
        is_loading: false,
        user: None,
    };

    assert_eq!(
        evaluate(&Requirement::role(Role::Viewer), &session, "/"),
        Evaluation::Decided(Decision::Deny(Denial {
            reason: DenialReason::Role,
            required: "viewer".to_string(),
            current: None,
        }))
    );
    assert!(matches!(
        evaluate(&Requirement::permission("doc:read"), &session, "/"),
        Evaluation::Decided(Decision::Deny(_))
    ));
}

#[test]
fn test_evaluation_is_idempotent() {
    for session in sessions() {
        for requirement in requirements() {
            let first = evaluate(&requirement, &session, "/documents");
            let second = evaluate(&requirement, &session, "/documents");
            assert_eq!(first, second);
        }
    }
}

#[test]
fn test_access_query_agrees_with_guard() {
    for session in sessions() {
        for requirement in requirements() {
            let allowed =
                evaluate(&requirement, &session, "/") == Evaluation::Decided(Decision::Allow);
            let check = AccessQuery::new(&session).check_access(&requirement);
            assert_eq!(
                check.has_access, allowed,
                "session {session:?}, requirement {requirement:?}"
            );
        }
    }
}

// --- Scenarios ---

#[test]
fn test_viewer_on_admin_route_is_denied_by_role() {
    let session = Session::authenticated(user(Role::Viewer, &[]));

    assert_eq!(
        evaluate(&Requirement::role(Role::Admin), &session, "/admin/users"),
        Evaluation::Decided(Decision::Deny(Denial {
            reason: DenialReason::Role,
            required: "admin".to_string(),
            current: Some("viewer".to_string()),
        }))
    );
}

#[test]
fn test_anonymous_admin_visit_redirects_to_login() {
    let guard = Guard::new(Requirement::role(Role::Admin), GuardOptions::default());

    let action = guard.act(&Session::anonymous(), "/admin/users");

    let GuardAction::Redirect(redirect) = action else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.location, "/login");
    assert_eq!(redirect.state.map(|s| s.from).as_deref(), Some("/admin/users"));
}

#[test]
fn test_missing_permission_does_not_disclose_held_permissions() {
    let session = Session::authenticated(user(Role::Operator, &["doc:read"]));

    assert_eq!(
        evaluate(&Requirement::permission("doc:write"), &session, "/documents/1"),
        Evaluation::Decided(Decision::Deny(Denial {
            reason: DenialReason::Permission,
            required: "doc:write".to_string(),
            current: None,
        }))
    );
}

#[test]
fn test_admin_with_empty_requirement_is_allowed() {
    let session = Session::authenticated(user(Role::Admin, &[]));

    assert_eq!(
        evaluate(&Requirement::authenticated(), &session, "/me"),
        Evaluation::Decided(Decision::Allow)
    );
}

// --- Actions ---

#[test]
fn test_act_maps_outcomes_in_render_mode() {
    let guard = Guard::new(Requirement::role(Role::Admin), GuardOptions::default());
    let viewer = Session::authenticated(user(Role::Viewer, &[]));

    assert_eq!(guard.act(&Session::loading(), "/x"), GuardAction::ShowPending);
    assert_eq!(
        guard.act(&Session::authenticated(user(Role::Admin, &[])), "/x"),
        GuardAction::RenderChildren
    );
    assert_eq!(
        guard.act(&viewer, "/x"),
        GuardAction::RenderAccessDenied(DenialPayload {
            reason: DenialReason::Role,
            required: "admin".to_string(),
            current: Some("viewer".to_string()),
            user_name: Some("Dana".to_string()),
        })
    );
}

#[test]
fn test_silent_mode_redirects_denials_to_fallback() {
    let options = GuardOptions {
        login_path: "/signin".to_string(),
        denial_mode: DenialMode::Silent {
            fallback: "/home".to_string(),
        },
    };
    let guard = Guard::new(Requirement::permission("doc:write"), options);

    assert_eq!(
        guard.act(&Session::authenticated(user(Role::Viewer, &[])), "/documents/1"),
        GuardAction::Redirect(ReplaceRedirect {
            location: "/home".to_string(),
            state: None,
        })
    );

    // Silent mode only changes denials; sign-in redirects still carry their state.
    let GuardAction::Redirect(redirect) = guard.act(&Session::anonymous(), "/documents/1") else {
        panic!("expected a redirect");
    };
    assert_eq!(redirect.location, "/signin");
    assert!(redirect.state.is_some());
}
