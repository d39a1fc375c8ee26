use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::STUDENTS).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = TestApp::spawn().await;
    let forged = server::utils::jwt::sign(1, "mallory", "ADMIN", "some-other-secret").unwrap();

    let res = app.get_with_token(routes::STUDENTS, &forged).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.token(9, "JANITOR");

    let res = app.get_with_token(routes::GRADES, &token).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn student_cannot_record_scores() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let student_id = app.create_student(&admin, "STU-001").await;
    let course_id = app.create_course(&admin, "MTH101", json!({})).await;
    let exam = app
        .create_component(&admin, course_id, "Final", "EXAM", 100.0, 100)
        .await;

    let res = app
        .record_score(&app.student_token(), student_id, exam, 50.0)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    let scores = app.get_with_token(routes::SCORES, &admin).await;
    assert_eq!(scores.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn teacher_cannot_manage_custom_tables() {
    let app = TestApp::spawn().await;

    let res = app
        .post_with_token(
            routes::TABLES,
            &json!({ "name": "library" }),
            &app.teacher_token(),
        )
        .await;
    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn students_and_parents_only_see_their_own_records() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let teacher = app.teacher_token();

    // Token uid 3 is the student, uid 4 the parent.
    let own = app
        .create_student_with(
            &admin,
            json!({ "student_id": "STU-001", "user_id": 3, "parent_user_id": 4 }),
        )
        .await;
    let other = app.create_student(&admin, "STU-999").await;
    let course_id = app.create_course(&admin, "GEO101", json!({})).await;
    let exam = app
        .create_component(&admin, course_id, "Final", "EXAM", 100.0, 100)
        .await;
    app.record_score(&teacher, own, exam, 70.0).await;
    let other_score = app.record_score(&teacher, other, exam, 8.0).await.id();
    let other_grade = app.grade_of(&admin, other, course_id).await.unwrap()["id"]
        .as_i64()
        .unwrap() as i32;

    for token in [app.student_token(), app.parent_token()] {
        let grades = app.get_with_token(routes::GRADES, &token).await;
        assert_eq!(grades.status, 200, "{}", grades.text);
        assert_eq!(grades.body["pagination"]["total"], 1);
        assert_eq!(grades.body["data"][0]["student_id"], own);

        let res = app
            .get_with_token(&format!("{}/{other_grade}", routes::GRADES), &token)
            .await;
        assert_eq!(res.status, 404);

        let scores = app.get_with_token(routes::SCORES, &token).await;
        assert_eq!(scores.body["pagination"]["total"], 1);
        assert_eq!(scores.body["data"][0]["student_id"], own);

        let res = app.get_with_token(&routes::score(other_score), &token).await;
        assert_eq!(res.status, 404);

        let students = app.get_with_token(routes::STUDENTS, &token).await;
        assert_eq!(students.body["pagination"]["total"], 1);
    }

    let all = app.get_with_token(routes::GRADES, &teacher).await;
    assert_eq!(all.body["pagination"]["total"], 2);
}

#[tokio::test]
async fn unlinked_student_sees_nothing() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    app.create_student(&admin, "STU-001").await;

    let res = app.get_with_token(routes::GRADES, &app.student_token()).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"], json!([]));
    let res = app.get_with_token(routes::STUDENTS, &app.student_token()).await;
    assert_eq!(res.body["data"], json!([]));
}
