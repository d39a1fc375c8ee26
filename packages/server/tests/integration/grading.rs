use serde_json::json;

use crate::common::{TestApp, routes};

/// Course with quiz 10, assignment 10, midsem 20 and exam 60.
struct Fixture {
    student_id: i32,
    course_id: i32,
    quiz: i32,
    assignment: i32,
    midsem: i32,
    exam: i32,
}

async fn setup(app: &TestApp, extra: serde_json::Value) -> Fixture {
    let admin = app.admin_token();
    let student_id = app.create_student(&admin, "STU-100").await;
    let course_id = app.create_course(&admin, "SCI101", extra).await;
    let quiz = app
        .create_component(&admin, course_id, "Quiz 1", "QUIZ", 20.0, 10)
        .await;
    let assignment = app
        .create_component(&admin, course_id, "Assignment 1", "ASSIGNMENT", 50.0, 10)
        .await;
    let midsem = app
        .create_component(&admin, course_id, "Mid-semester", "MIDSEM", 50.0, 20)
        .await;
    let exam = app
        .create_component(&admin, course_id, "Final exam", "EXAM", 100.0, 60)
        .await;
    Fixture {
        student_id,
        course_id,
        quiz,
        assignment,
        midsem,
        exam,
    }
}

#[tokio::test]
async fn recording_scores_recomputes_the_weighted_grade() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    for (component, score) in [
        (f.quiz, 18.0),
        (f.assignment, 45.0),
        (f.midsem, 40.0),
        (f.exam, 80.0),
    ] {
        let res = app
            .record_score(&teacher, f.student_id, component, score)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["recorded_by"], 2);
    }

    let grade = app
        .grade_of(&teacher, f.student_id, f.course_id)
        .await
        .expect("grade should exist");
    assert_eq!(grade["final_grade"].as_f64(), Some(61.6));
    assert!(grade["letter_grade"].is_null());
}

#[tokio::test]
async fn unscored_components_count_as_zero() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let res = app.record_score(&teacher, f.student_id, f.exam, 80.0).await;
    assert_eq!(res.status, 201, "{}", res.text);

    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(48.0));
}

#[tokio::test]
async fn weight_mismatch_rejects_the_score_and_keeps_the_grade() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let teacher = app.teacher_token();
    let student_id = app.create_student(&admin, "STU-200").await;
    let course_id = app.create_course(&admin, "ENG101", json!({})).await;
    let quiz = app
        .create_component(&admin, course_id, "Quiz", "QUIZ", 10.0, 30)
        .await;
    app.create_component(&admin, course_id, "Exam", "EXAM", 100.0, 60)
        .await;

    let res = app.record_score(&teacher, student_id, quiz, 5.0).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["message"].as_str().unwrap().contains("100"));

    let scores = app
        .get_with_token(&format!("{}?student_id={student_id}", routes::SCORES), &teacher)
        .await;
    assert_eq!(scores.body["pagination"]["total"], 0);
    assert!(app.grade_of(&teacher, student_id, course_id).await.is_none());
}

#[tokio::test]
async fn score_above_max_is_rejected() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let res = app.record_score(&teacher, f.student_id, f.quiz, 21.0).await;
    assert_eq!(res.status, 400);
    assert_eq!(
        res.body["message"],
        "Score cannot exceed the component's max score (20)"
    );

    let res = app.record_score(&teacher, f.student_id, f.quiz, -1.0).await;
    assert_eq!(res.status, 400);

    let scores = app.get_with_token(routes::SCORES, &teacher).await;
    assert_eq!(scores.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn duplicate_score_conflicts() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let res = app.record_score(&teacher, f.student_id, f.quiz, 10.0).await;
    assert_eq!(res.status, 201);
    let res = app.record_score(&teacher, f.student_id, f.quiz, 12.0).await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn unknown_student_or_component_is_not_found() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let res = app.record_score(&teacher, 9999, f.quiz, 10.0).await;
    assert_eq!(res.status, 404);
    let res = app.record_score(&teacher, f.student_id, 9999, 10.0).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn updating_a_score_recomputes_the_grade() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let res = app.record_score(&teacher, f.student_id, f.exam, 50.0).await;
    let score_id = res.id();

    let res = app
        .put_with_token(&routes::score(score_id), &json!({ "score": 100.0 }), &teacher)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["score"].as_f64(), Some(100.0));
    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(60.0));

    let res = app
        .patch_with_token(&routes::score(score_id), &json!({ "score": 75.0 }), &teacher)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(45.0));

    let res = app
        .patch_with_token(&routes::score(score_id), &json!({}), &teacher)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["score"].as_f64(), Some(75.0));

    let res = app
        .patch_with_token(&routes::score(score_id), &json!({ "score": 101.0 }), &teacher)
        .await;
    assert_eq!(res.status, 400);
    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(45.0));
}

#[tokio::test]
async fn deleting_the_last_score_resets_the_grade() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let teacher = app.teacher_token();

    let score_id = app
        .record_score(&teacher, f.student_id, f.exam, 80.0)
        .await
        .id();

    let res = app.delete_with_token(&routes::score(score_id), &teacher).await;
    assert_eq!(res.status, 204);

    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(0.0));

    let res = app.get_with_token(&routes::score(score_id), &teacher).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn letter_comes_from_the_course_scale() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let scale = app
        .post_with_token(
            routes::GRADING_SCALES,
            &json!({
                "name": "School scale",
                "level": "SHS",
                "grades": { "70": "A", "60": "B", "50": "C", "0": "F" },
            }),
            &admin,
        )
        .await;
    assert_eq!(scale.status, 201, "{}", scale.text);

    let f = setup(&app, json!({ "grading_scale_id": scale.id() })).await;
    let teacher = app.teacher_token();
    for (component, score) in [
        (f.quiz, 18.0),
        (f.assignment, 45.0),
        (f.midsem, 40.0),
        (f.exam, 80.0),
    ] {
        app.record_score(&teacher, f.student_id, component, score)
            .await;
    }

    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["letter_grade"], "B");
    assert_eq!(grade["grading_scale_id"], scale.id());
}

#[tokio::test]
async fn course_level_falls_back_to_a_seeded_scale() {
    let app = TestApp::spawn_seeded().await;
    let f = setup(&app, json!({ "level": "UNIVERSITY" })).await;
    let teacher = app.teacher_token();

    app.record_score(&teacher, f.student_id, f.exam, 100.0).await;

    let grade = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(grade["final_grade"].as_f64(), Some(60.0));
    assert!(grade["grading_scale_id"].is_number());
    assert!(grade["letter_grade"].is_string());
}

#[tokio::test]
async fn recompute_endpoint_picks_up_weight_changes() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let admin = app.admin_token();
    let teacher = app.teacher_token();

    app.record_score(&teacher, f.student_id, f.exam, 100.0).await;
    let before = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(before["final_grade"].as_f64(), Some(60.0));

    // Shift 10 points from the midsem to the exam.
    let res = app
        .patch_with_token(&routes::component(f.midsem), &json!({ "weight": 10 }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app
        .patch_with_token(&routes::component(f.exam), &json!({ "weight": 70 }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let unchanged = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(unchanged["final_grade"].as_f64(), Some(60.0));

    let res = app
        .post_with_token(
            routes::GRADES_RECOMPUTE,
            &json!({ "student_id": f.student_id, "course_id": f.course_id }),
            &teacher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["final_grade"].as_f64(), Some(70.0));
}

#[tokio::test]
async fn lowering_max_score_below_recorded_scores_is_rejected() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let admin = app.admin_token();

    app.record_score(&app.teacher_token(), f.student_id, f.quiz, 18.0)
        .await;

    let res = app
        .patch_with_token(&routes::component(f.quiz), &json!({ "max_score": 15.0 }), &admin)
        .await;
    assert_eq!(res.status, 400);

    let res = app.delete_with_token(&routes::component(f.quiz), &admin).await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn weight_mismatch_leaves_an_existing_grade_untouched() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let admin = app.admin_token();
    let teacher = app.teacher_token();

    app.record_score(&teacher, f.student_id, f.exam, 80.0).await;
    let before = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();

    let res = app
        .patch_with_token(&routes::component(f.quiz), &json!({ "weight": 5 }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.record_score(&teacher, f.student_id, f.quiz, 20.0).await;
    assert_eq!(res.status, 400);

    let after = app.grade_of(&teacher, f.student_id, f.course_id).await.unwrap();
    assert_eq!(after["final_grade"], before["final_grade"]);
    assert_eq!(after["updated_at"], before["updated_at"]);
}

#[tokio::test]
async fn scores_can_be_searched_by_component_or_student_name() {
    let app = TestApp::spawn().await;
    let f = setup(&app, json!({})).await;
    let admin = app.admin_token();
    let teacher = app.teacher_token();
    let kofi = app
        .create_student_with(
            &admin,
            json!({ "student_id": "STU-300", "first_name": "Kofi", "last_name": "Boateng" }),
        )
        .await;

    app.record_score(&teacher, f.student_id, f.quiz, 15.0).await;
    app.record_score(&teacher, f.student_id, f.exam, 60.0).await;
    app.record_score(&teacher, kofi, f.exam, 70.0).await;

    let res = app
        .get_with_token(&format!("{}?search=boat", routes::SCORES), &teacher)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["data"][0]["student_id"], kofi);

    let res = app
        .get_with_token(&format!("{}?search=FINAL%20EXAM", routes::SCORES), &teacher)
        .await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(
            &format!("{}?search=exam&student_id={}", routes::SCORES, f.student_id),
            &teacher,
        )
        .await;
    assert_eq!(res.body["pagination"]["total"], 1);

    let res = app
        .get_with_token(&format!("{}?search=100%25", routes::SCORES), &teacher)
        .await;
    assert_eq!(res.body["pagination"]["total"], 0);
}
