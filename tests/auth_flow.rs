#![cfg(feature = "inmem-store")]

mod common;

use std::time::Duration;

use actix_web::{test, web, App};
use filmcollab::auth::{Role, SESSION_COOKIE};
use filmcollab::configure;
use filmcollab::repo::inmem::InMemRepo;
use serde_json::{json, Value};

use common::*;

#[actix_web::test]
async fn first_sign_in_provisions_a_member() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let idp = bearer(&state, "u-sarah", "Sarah Johnson", Role::User);
    let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/sign-in")
        .insert_header(idp)
        .set_json(json!({"portal": "user"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie set");
    assert!(cookie.http_only().unwrap_or(false));
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["role"], "USER");
    assert_eq!(v["redirect"], "/dashboard");
    assert_eq!(v["full_name"], "Sarah Johnson");

    let stored = state.repo.get_profile("u-sarah").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);

    // the fresh token works for subsequent calls
    let token = v["token"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["user_id"], "u-sarah");
    assert_eq!(me["home"], "/dashboard");
}

#[actix_web::test]
async fn member_on_admin_portal_is_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let idp = user(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/sign-in")
        .insert_header(idp.clone())
        .set_json(json!({"portal": "admin"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie");
    assert_eq!(cleared.value(), "");
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["error"], "Forbidden");

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(idp).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn bootstrap_admin_lands_on_admin_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config();
    cfg.bootstrap_admins.insert("u-ava".to_string());
    let state = state_in(&dir, cfg);
    // the identity provider does not know about roles
    let idp = bearer(&state, "u-ava", "Ava Chen", Role::User);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/sign-in")
        .insert_header(idp)
        .set_json(json!({"portal": "admin"}))
        .to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["role"], "ADMIN");
    assert_eq!(v["redirect"], "/admin");

    let token = v["token"].as_str().unwrap().to_string();
    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn slow_profile_lookup_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config();
    cfg.auth_timeout = Duration::from_millis(50);
    let repo = SlowProfiles { inner: InMemRepo::new(dir.path()), delay: Duration::from_millis(500) };
    let state = state_with(repo, cfg);
    let idp = user(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/sign-in")
        .insert_header(idp)
        .set_json(json!({"portal": "user"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 504);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["error"], "Request timed out");
}

#[actix_web::test]
async fn sign_in_without_identity_is_unauthorized() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/sign-in")
        .set_json(json!({"portal": "user"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn sign_out_revokes_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let auth = user(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/auth/sign-out").insert_header(auth.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(auth).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn refresh_rotates_the_token() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let auth = user(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/auth/refresh").insert_header(auth.clone()).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    let fresh = v["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(auth).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {fresh}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["name"], "Sarah Johnson");
}

#[actix_web::test]
async fn session_cookie_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let token = state.sessions.issue("u-sarah", "Sarah Johnson", Role::User).unwrap();
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE, token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["role"], "USER");
}

#[actix_web::test]
async fn access_check_redirects_by_role() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let member = user(&state);
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/access?path=/admin/users").insert_header(member.clone()).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["area"], "admin_dashboard");
    assert_eq!(v["allowed"], false);
    assert_eq!(v["redirect"], "/dashboard");

    let req = test::TestRequest::get().uri("/api/access?path=/sign-in").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["redirect"], "/admin");

    let req = test::TestRequest::get().uri("/api/access?path=/dashboard/projects").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["allowed"], false);
    assert_eq!(v["redirect"], "/sign-in");

    let req = test::TestRequest::get().uri("/api/access?path=/jobs").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["allowed"], true);
    assert!(v.get("redirect").is_none());
}

#[tokio::test]
async fn revoked_tokens_stay_revoked_across_clones() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let clone = state.clone();
    let token = state.sessions.issue("u-sarah", "Sarah", Role::User).unwrap();
    let claims = clone.sessions.verify(&token).unwrap();
    clone.sessions.invalidate(&claims);
    assert!(state.sessions.verify(&token).is_err());
}

#[actix_web::test]
async fn demotion_reaches_sessions_already_issued() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    state
        .repo
        .upsert_profile(filmcollab::models::Profile {
            user_id: "u-marcus".into(),
            role: Role::Admin,
            full_name: "Marcus Lee".into(),
        })
        .await
        .unwrap();
    let marcus = bearer(&state, "u-marcus", "Marcus Lee", Role::Admin);
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/admin/stats").insert_header(marcus.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::put()
        .uri("/api/admin/profiles/u-marcus")
        .insert_header(ops)
        .set_json(json!({"role": "USER"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    // the token still says ADMIN but the stored profile no longer does
    let req = test::TestRequest::get().uri("/api/admin/stats").insert_header(marcus.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get().uri("/api/auth/me").insert_header(marcus.clone()).to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["role"], "USER");
    assert_eq!(me["home"], "/dashboard");

    let req = test::TestRequest::post().uri("/api/auth/refresh").insert_header(marcus).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    let fresh = format!("Bearer {}", v["token"].as_str().unwrap());

    let req = test::TestRequest::get()
        .uri("/api/admin/stats")
        .insert_header(("Authorization", fresh.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
    let req = test::TestRequest::get()
        .uri("/api/projects")
        .insert_header(("Authorization", fresh))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}
