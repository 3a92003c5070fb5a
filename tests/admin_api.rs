#![cfg(feature = "inmem-store")]

mod common;

use actix_web::{test, web, App};
use filmcollab::auth::Role;
use filmcollab::configure;
use serde_json::{json, Value};

use common::*;

#[actix_web::test]
async fn stats_reflect_the_seeded_desk() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/admin/stats").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["totalUsers"], 4);
    assert_eq!(v["activeUsers"], 3);
    assert_eq!(v["suspendedUsers"], 1);
    assert_eq!(v["flaggedPosts"], 1);
    assert_eq!(v["pendingProjects"], 1);
    assert_eq!(v["pendingJobs"], 1);
}

#[actix_web::test]
async fn members_cannot_reach_the_admin_api() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let member = user(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    for uri in ["/api/admin/stats", "/api/admin/users", "/api/admin/backend-status"] {
        let req = test::TestRequest::get().uri(uri).insert_header(member.clone()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403, "{uri}");
    }
    let req = test::TestRequest::post().uri("/api/admin/users/u1/suspend").insert_header(member).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn suspending_a_user_updates_stats_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/admin/users/u1/suspend").insert_header(ops.clone()).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["notice"]["tone"], "warning");
    assert_eq!(v["notice"]["message"], "You suspended Sarah Johnson");
    assert_eq!(v["data"]["status"], "Suspended");

    let req = test::TestRequest::get().uri("/api/admin/users?status=Suspended").insert_header(ops.clone()).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["total"], 2);

    let req = test::TestRequest::get().uri("/api/admin/stats").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["suspendedUsers"], 2);
}

#[actix_web::test]
async fn actions_outside_a_collection_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/admin/users/u1/approve").insert_header(ops.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let v: Value = test::read_body_json(resp).await;
    assert!(v["details"].as_str().unwrap().contains("approve"));

    let req = test::TestRequest::get().uri("/api/admin/widgets").insert_header(ops.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::post().uri("/api/admin/jobs/missing/approve").insert_header(ops).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn post_review_and_idempotent_delete() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/admin/posts/ap3/approve").insert_header(ops.clone()).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["data"]["status"], "Published");

    for _ in 0..2 {
        let req = test::TestRequest::post().uri("/api/admin/posts/ap2/delete").insert_header(ops.clone()).to_request();
        let v: Value = test::call_and_read_body_json(&app, req).await;
        assert!(v.get("data").is_none());
    }

    let req = test::TestRequest::get().uri("/api/admin/posts").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["total"], 2);
}

#[actix_web::test]
async fn profile_update_changes_the_role() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state.clone())).configure(configure)).await;

    let req = test::TestRequest::put()
        .uri("/api/admin/profiles/u-marcus")
        .insert_header(ops.clone())
        .set_json(json!({"role": "ADMIN"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["details"], "full_name");

    let req = test::TestRequest::put()
        .uri("/api/admin/profiles/u-marcus")
        .insert_header(ops)
        .set_json(json!({"role": "ADMIN", "full_name": "Marcus Lee"}))
        .to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["role"], "ADMIN");

    let stored = state.repo.get_profile("u-marcus").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Admin);
    assert_eq!(stored.full_name, "Marcus Lee");
}

#[actix_web::test]
async fn backend_status_reports_classification() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_in(&dir, test_config());
    let ops = admin(&state);
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/admin/backend-status").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v, json!({"status": "ok"}));

    let broken = state_with(FailingRepo, test_config());
    let ops = admin(&broken);
    let app = test::init_service(App::new().app_data(web::Data::new(broken)).configure(configure)).await;
    let req = test::TestRequest::get().uri("/api/admin/backend-status").insert_header(ops).to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["status"], "table_missing");
    assert!(v["details"].as_str().unwrap().contains("jobs"));
}
