//! Auth and admin store behavior, including session-wide effects.

mod support;

use alms_auth::SessionStatus;
use alms_core::entities::{CouponStatus, Credentials, ProfileUpdate};
use alms_http::mock::MockReply;
use alms_http::{ErrorKind, Method};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::harness;

fn credentials() -> Credentials {
    Credentials {
        email: "ada@example.org".into(),
        password: "secret".into(),
    }
}

#[tokio::test]
async fn login_without_token_reports_exact_message() {
    let h = harness(None);
    h.transport.on(
        Method::Post,
        "/auth/login",
        MockReply::ok(json!({"status": "success", "data": {"user": {"_id": "u1"}}})),
    );

    let err = h.stores.auth.login(&credentials()).await.unwrap_err();

    assert_eq!(err.message(), "Invalid login response: missing token or user");
    let state = h.stores.auth.state();
    assert!(!state.is_authenticated);
    assert_eq!(state.user, None);
    assert_eq!(
        state.error.as_deref(),
        Some("Invalid login response: missing token or user")
    );
    assert!(!state.is_loading);
}

#[tokio::test]
async fn login_then_profile_update_replaces_user() {
    let h = harness(None);
    h.transport
        .on(
            Method::Post,
            "/auth/login",
            MockReply::ok(json!({"data": {"token": "tok", "user": {"_id": "u1", "name": "Ada"}}})),
        )
        .on(
            Method::Put,
            "/auth/profile",
            MockReply::ok(json!({"data": {"user": {"_id": "u1", "name": "Ada", "phone": "555-0100"}}})),
        );
    h.stores.auth.login(&credentials()).await.unwrap();

    let user = h
        .stores
        .auth
        .update_profile(&ProfileUpdate {
            phone: Some("555-0100".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(user.phone.as_deref(), Some("555-0100"));
    let state = h.stores.auth.state();
    assert!(state.is_authenticated);
    assert_eq!(state.status, SessionStatus::Authenticated);
    assert_eq!(state.user.and_then(|u| u.phone), Some("555-0100".to_string()));
    let put = h.transport.calls_to("/auth/profile").remove(0);
    assert_eq!(put.header("Authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn registration_pending_approval_sets_notice() {
    let h = harness(None);
    h.transport.on(
        Method::Post,
        "/auth/register",
        MockReply::json(
            201,
            json!({"status": "success", "message": "Awaiting approval", "data": {"requiresApproval": true}}),
        ),
    );

    let outcome = h
        .stores
        .auth
        .register(&alms_core::entities::Registration {
            name: "Partner Co".into(),
            email: "p@example.org".into(),
            password: "secret".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.requires_approval());
    let state = h.stores.auth.state();
    assert_eq!(state.notice.as_deref(), Some("Awaiting approval"));
    assert_eq!(state.error, None);
    assert!(!state.is_authenticated);
}

#[tokio::test]
async fn auth_failure_from_any_store_clears_both_backends() {
    let h = harness(None);
    h.transport
        .on(
            Method::Post,
            "/auth/login",
            MockReply::ok(json!({"data": {"token": "tok", "user": {"_id": "u1"}}})),
        )
        .on(Method::Get, "/donations/my", MockReply::error(401, "jwt expired"));
    h.stores.auth.login(&credentials()).await.unwrap();
    assert!(h.stores.auth.state().is_authenticated);

    let err = h.stores.donations.fetch_my_donations(1).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(h.cookie.get(), None);
    assert_eq!(h.durable.get(), None);
    let state = h.stores.auth.state();
    assert!(!state.is_authenticated);
    assert_eq!(state.status, SessionStatus::Anonymous);
}

#[tokio::test]
async fn coupon_timeout_is_network_error_and_leaves_list_empty() {
    let h = harness(Some("tok"));
    h.transport.on(Method::Get, "/coupons", MockReply::timeout());

    let err = h
        .stores
        .admin
        .fetch_coupons(Some(CouponStatus::Active))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.message().contains("connect"));
    let state = h.stores.admin.state();
    assert!(state.coupons.is_empty());
    assert_eq!(state.error, None);
    assert!(!state.is_loading);
    let call = h.transport.last_call().unwrap();
    assert_eq!(call.query, vec![("status".to_string(), "active".to_string())]);
}

#[tokio::test]
async fn redeeming_refreshes_filtered_coupons() {
    let h = harness(Some("tok"));
    h.transport
        .on(
            Method::Get,
            "/coupons",
            MockReply::ok(json!({"data": [{"_id": "k1", "code": "SAVE10", "status": "active"}]})),
        )
        .on(Method::Get, "/coupons", MockReply::ok(json!({"data": []})))
        .on(
            Method::Post,
            "/coupons/SAVE10/redeem",
            MockReply::ok(json!({"data": {"_id": "k1", "code": "SAVE10", "status": "redeemed"}})),
        );
    h.stores
        .admin
        .fetch_coupons(Some(CouponStatus::Active))
        .await
        .unwrap();

    let redeemed = h.stores.admin.redeem_coupon("SAVE10").await.unwrap();

    assert_eq!(redeemed.status, CouponStatus::Redeemed);
    assert!(h.stores.admin.state().coupons.is_empty());
    let refresh = h.transport.last_call().unwrap();
    assert_eq!(refresh.query, vec![("status".to_string(), "active".to_string())]);
}

#[tokio::test]
async fn dashboard_substitutes_zeroes_for_unreachable_resources() {
    let h = harness(Some("tok"));
    h.transport
        .on(Method::Get, "/admin/stats", MockReply::error(404, "Not found"))
        .on(
            Method::Get,
            "/admin/users",
            MockReply::ok(json!({
                "data": [{"_id": "u1", "isApproved": true}, {"_id": "u2", "isApproved": false}],
                "pagination": {"page": 1, "limit": 10, "total": 12, "pages": 2}
            })),
        )
        .on(
            Method::Get,
            "/campaigns",
            MockReply::ok(json!({"data": [
                {"_id": "c1", "status": "active", "raisedAmount": 100},
                {"_id": "c2", "status": "completed", "raisedAmount": 50.5}
            ]})),
        )
        .on(Method::Get, "/donations", MockReply::error(500, "boom"))
        .on(Method::Get, "/coupons", MockReply::timeout())
        .on(Method::Get, "/partners", MockReply::ok(json!([{"_id": "p1"}])));

    let stats = h.stores.admin.fetch_dashboard_stats().await.unwrap();

    assert_eq!(stats.total_users, 12);
    // Counted over the first page only.
    assert_eq!(stats.pending_approvals, 1);
    assert_eq!(stats.total_campaigns, 2);
    assert_eq!(stats.active_campaigns, 1);
    assert!((stats.total_raised - 150.5).abs() < f64::EPSILON);
    assert_eq!(stats.total_donations, 0);
    assert_eq!(stats.active_coupons, 0);
    assert_eq!(stats.total_partners, 1);
    let state = h.stores.admin.state();
    assert_eq!(state.stats, stats);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn reported_counters_take_precedence() {
    let h = harness(Some("tok"));
    h.transport
        .on(
            Method::Get,
            "/admin/stats",
            MockReply::ok(json!({"data": {"totalUsers": 40, "pendingApprovals": 3}})),
        )
        .on(Method::Get, "/admin/users", MockReply::ok(json!({"data": [{"_id": "u1"}]})));

    let stats = h.stores.admin.fetch_dashboard_stats().await.unwrap();

    assert_eq!(stats.total_users, 40);
    assert_eq!(stats.pending_approvals, 3);
}

#[tokio::test]
async fn approving_user_reloads_current_page() {
    let h = harness(Some("tok"));
    h.transport
        .on(
            Method::Get,
            "/admin/users",
            MockReply::ok(json!({"data": [{"_id": "u2", "isApproved": false}]})),
        )
        .on(
            Method::Get,
            "/admin/users",
            MockReply::ok(json!({"data": [{"_id": "u2", "isApproved": true}]})),
        )
        .on(
            Method::Put,
            "/admin/users/u2/approve",
            MockReply::ok(json!({"data": {"_id": "u2", "isApproved": true}})),
        );
    h.stores.admin.fetch_users(2).await.unwrap();

    let approved = h.stores.admin.approve_user("u2").await.unwrap();

    assert!(approved.is_approved);
    let state = h.stores.admin.state();
    assert!(state.users[0].is_approved);
    let refresh = h.transport.last_call().unwrap();
    assert_eq!(refresh.query, vec![("page".to_string(), "2".to_string())]);
}
