use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn duplicate_student_id_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    app.create_student(&admin, "STU-001").await;

    let res = app
        .post_with_token(
            routes::STUDENTS,
            &json!({ "student_id": "STU-001", "first_name": "Kofi", "last_name": "Boateng" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn student_search_filters_and_paginates() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    for i in 0..3 {
        app.create_student(&admin, &format!("JHS-{i}")).await;
    }
    app.create_student(&admin, "SHS-9").await;

    let res = app
        .get_with_token(&format!("{}?search=JHS&per_page=2", routes::STUDENTS), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["pagination"]["total"], 3);
    assert_eq!(res.body["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn course_defaults_and_updates() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let course_id = app
        .create_course(&admin, "HIS101", json!({ "description": "Ghanaian history" }))
        .await;

    let res = app.get_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["credit_hours"], 3);
    assert!(res.body["level"].is_null());

    let res = app
        .patch_with_token(
            &routes::course(course_id),
            &json!({ "description": null, "level": "JHS", "credit_hours": 4 }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["description"].is_null());
    assert_eq!(res.body["level"], "JHS");
    assert_eq!(res.body["credit_hours"], 4);

    let res = app
        .get_with_token(&format!("{}?level=JHS", routes::COURSES), &admin)
        .await;
    assert_eq!(res.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn course_with_unknown_scale_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();

    let res = app
        .post_with_token(
            routes::COURSES,
            &json!({ "name": "Physics", "code": "PHY101", "grading_scale_id": 42 }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn duplicate_course_code_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    app.create_course(&admin, "MTH101", json!({})).await;

    let res = app
        .post_with_token(
            routes::COURSES,
            &json!({ "name": "Maths again", "code": "MTH101" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn course_with_components_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let course_id = app.create_course(&admin, "BIO101", json!({})).await;
    let component = app
        .create_component(&admin, course_id, "Exam", "EXAM", 100.0, 100)
        .await;

    let res = app.delete_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 409);

    let res = app.delete_with_token(&routes::component(component), &admin).await;
    assert_eq!(res.status, 204);
    let res = app.delete_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 204);
    let res = app.get_with_token(&routes::course(course_id), &admin).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn component_validation() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let course_id = app.create_course(&admin, "CHM101", json!({})).await;

    for body in [
        json!({ "name": "Quiz", "kind": "QUIZ", "max_score": 0.0, "weight": 10 }),
        json!({ "name": "Quiz", "kind": "QUIZ", "max_score": 101.0, "weight": 10 }),
        json!({ "name": "Quiz", "kind": "QUIZ", "max_score": 20.0, "weight": 101 }),
        json!({ "name": "Quiz", "kind": "ORAL", "max_score": 20.0, "weight": 10 }),
    ] {
        let res = app
            .post_with_token(&routes::course_components(course_id), &body, &admin)
            .await;
        assert_eq!(res.status, 400, "accepted {body}");
    }

    let res = app
        .post_with_token(
            &routes::course_components(9999),
            &json!({ "name": "Quiz", "kind": "QUIZ", "max_score": 20.0, "weight": 10 }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn grading_scale_lifecycle() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();

    let res = app
        .post_with_token(
            routes::GRADING_SCALES,
            &json!({ "name": "Bad", "level": "JHS", "grades": ["A", "B"] }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(
            routes::GRADING_SCALES,
            &json!({ "name": "Basic", "level": "JHS", "grades": { "50": "Pass", "0": "Fail" } }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let scale_id = res.id();
    assert_eq!(res.body["is_active"], true);

    let course_id = app
        .create_course(&admin, "JHS101", json!({ "grading_scale_id": scale_id }))
        .await;
    let res = app
        .delete_with_token(&routes::grading_scale(scale_id), &admin)
        .await;
    assert_eq!(res.status, 409);

    let res = app
        .patch_with_token(
            &routes::course(course_id),
            &json!({ "grading_scale_id": null }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .patch_with_token(
            &routes::grading_scale(scale_id),
            &json!({ "is_active": false }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["is_active"], false);

    let res = app
        .delete_with_token(&routes::grading_scale(scale_id), &admin)
        .await;
    assert_eq!(res.status, 204);
}

#[tokio::test]
async fn seeded_scales_are_listed_by_level() {
    let app = TestApp::spawn_seeded().await;

    let res = app
        .get_with_token(
            &format!("{}?level=UNIVERSITY", routes::GRADING_SCALES),
            &app.admin_token(),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body.as_array().map(Vec::len), Some(3));
}
