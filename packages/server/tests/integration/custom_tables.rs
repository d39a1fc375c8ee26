use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn rows_round_trip_with_declared_types() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "library_books").await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "title", "data_type": "text", "required": true }),
    )
    .await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "pages", "data_type": "integer", "required": true }),
    )
    .await;
    app.create_field(&admin, table_id, json!({ "name": "on_loan", "data_type": "boolean" }))
        .await;
    app.create_field(&admin, table_id, json!({ "name": "acquired", "data_type": "date" }))
        .await;

    let res = app
        .post_with_token(
            &routes::rows_add("library_books"),
            &json!({ "title": "Things Fall Apart", "pages": "209", "on_loan": true, "acquired": "2024-01-15" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let row_id = res.id();
    assert_eq!(res.body["title"], "Things Fall Apart");
    assert_eq!(res.body["pages"], 209);
    assert_eq!(res.body["on_loan"], true);
    assert_eq!(res.body["acquired"], "2024-01-15");

    let res = app
        .get_with_token(&routes::rows("library_books"), &app.teacher_token())
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["table"], "library_books");
    let rows = res.body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], row_id);
    assert_eq!(rows[0]["pages"], 209);

    let res = app
        .get_with_token(&routes::table(table_id), &admin)
        .await;
    assert_eq!(res.body["fields"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn required_and_unknown_fields_are_enforced() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "clubs").await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "name", "data_type": "text", "required": true }),
    )
    .await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "members", "data_type": "integer", "required": true }),
    )
    .await;

    let res = app
        .post_with_token(&routes::rows_add("clubs"), &json!({ "name": "Chess" }), &admin)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Missing required field: members");

    let res = app
        .post_with_token(
            &routes::rows_add("clubs"),
            &json!({ "name": "Chess", "members": null }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(
            &routes::rows_add("clubs"),
            &json!({ "name": "Chess", "members": 12, "budget": 5 }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(
            &routes::rows_add("clubs"),
            &json!({ "name": "Chess", "members": "twelve" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(&routes::rows_add("clubs"), &json!({}), &admin)
        .await;
    assert_eq!(res.status, 400);

    let res = app.get_with_token(&routes::rows("clubs"), &admin).await;
    assert_eq!(res.body["data"], json!([]));
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "notes").await;
    app.create_field(&admin, table_id, json!({ "name": "body", "data_type": "text" }))
        .await;

    let res = app
        .post_raw_with_token(&routes::rows_add("notes"), "{\"body\": ", &admin)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_or_inactive_table_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();

    let res = app.get_with_token(&routes::rows("nope"), &admin).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let table_id = app.create_table(&admin, "archive").await;
    app.create_field(&admin, table_id, json!({ "name": "item", "data_type": "text" }))
        .await;
    let res = app
        .patch_with_token(&routes::table(table_id), &json!({ "is_active": false }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .post_with_token(&routes::rows_add("archive"), &json!({ "item": "x" }), &admin)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn defaults_fill_absent_fields_on_insert() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "lockers").await;
    app.create_field(&admin, table_id, json!({ "name": "code", "data_type": "text" }))
        .await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "deposit", "data_type": "decimal", "default_value": "12.5" }),
    )
    .await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "assigned", "data_type": "boolean", "required": true, "default_value": "false" }),
    )
    .await;

    let res = app
        .post_with_token(&routes::rows_add("lockers"), &json!({ "code": "L-01" }), &admin)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["deposit"], 12.5);
    assert_eq!(res.body["assigned"], false);

    let res = app
        .post_with_token(
            routes::FIELDS,
            &json!({ "table_id": table_id, "name": "floor", "data_type": "integer", "default_value": "first" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn choices_restrict_text_values() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "houses").await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "colour", "data_type": "text", "choices": ["red", "blue", "o'range"] }),
    )
    .await;

    let res = app
        .post_with_token(&routes::rows_add("houses"), &json!({ "colour": "green" }), &admin)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(&routes::rows_add("houses"), &json!({ "colour": 5 }), &admin)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .post_with_token(&routes::rows_add("houses"), &json!({ "colour": "o'range" }), &admin)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app
        .post_with_token(
            routes::FIELDS,
            &json!({ "table_id": table_id, "name": "size", "data_type": "integer", "choices": ["1"] }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn put_requires_required_fields_but_patch_merges() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "buses").await;
    app.create_field(
        &admin,
        table_id,
        json!({ "name": "plate", "data_type": "text", "required": true }),
    )
    .await;
    app.create_field(&admin, table_id, json!({ "name": "seats", "data_type": "integer" }))
        .await;

    let row_id = app
        .post_with_token(
            &routes::rows_add("buses"),
            &json!({ "plate": "GR-1234-24", "seats": 40 }),
            &admin,
        )
        .await
        .id();

    let res = app
        .put_with_token(&routes::row("buses", row_id), &json!({ "seats": 45 }), &admin)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .patch_with_token(&routes::row("buses", row_id), &json!({ "seats": 45 }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["plate"], "GR-1234-24");
    assert_eq!(res.body["seats"], 45);

    let res = app
        .put_with_token(
            &routes::row("buses", row_id),
            &json!({ "plate": "AS-99-22" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["plate"], "AS-99-22");
    assert_eq!(res.body["seats"], 45);

    let res = app
        .patch_with_token(&routes::row("buses", 999), &json!({ "seats": 1 }), &admin)
        .await;
    assert_eq!(res.status, 404);

    let res = app.delete_with_token(&routes::row("buses", row_id), &admin).await;
    assert_eq!(res.status, 204);
    let res = app.get_with_token(&routes::row("buses", row_id), &admin).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn table_and_field_names_are_validated() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();

    for name in ["Books", "1books", "books; DROP TABLE students", ""] {
        let res = app
            .post_with_token(routes::TABLES, &json!({ "name": name }), &admin)
            .await;
        assert_eq!(res.status, 400, "accepted table name {name:?}");
    }

    let table_id = app.create_table(&admin, "books").await;
    let res = app
        .post_with_token(routes::TABLES, &json!({ "name": "books" }), &admin)
        .await;
    assert_eq!(res.status, 409);

    let res = app
        .post_with_token(
            routes::FIELDS,
            &json!({ "table_id": table_id, "name": "id", "data_type": "text" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 400);

    app.create_field(&admin, table_id, json!({ "name": "title", "data_type": "text" }))
        .await;
    let res = app
        .post_with_token(
            routes::FIELDS,
            &json!({ "table_id": table_id, "name": "title", "data_type": "integer" }),
            &admin,
        )
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn deleting_fields_and_tables_drops_storage() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let table_id = app.create_table(&admin, "trips").await;
    app.create_field(&admin, table_id, json!({ "name": "place", "data_type": "text" }))
        .await;
    let cost = app
        .create_field(&admin, table_id, json!({ "name": "cost", "data_type": "decimal" }))
        .await;
    app.post_with_token(
        &routes::rows_add("trips"),
        &json!({ "place": "Cape Coast", "cost": "150.75" }),
        &admin,
    )
    .await;

    let res = app.delete_with_token(&routes::field(cost), &admin).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::rows("trips"), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let row = &res.body["data"][0];
    assert_eq!(row["place"], "Cape Coast");
    assert!(row.get("cost").is_none());

    let res = app.delete_with_token(&routes::table(table_id), &admin).await;
    assert_eq!(res.status, 204);
    let res = app.get_with_token(&routes::rows("trips"), &admin).await;
    assert_eq!(res.status, 404);

    // The name is free again and starts with an empty table.
    app.create_table(&admin, "trips").await;
    let res = app.get_with_token(&routes::rows("trips"), &admin).await;
    assert_eq!(res.body["data"], json!([]));
}

#[tokio::test]
async fn table_and_field_lists_are_paginated() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token();
    let first = app.create_table(&admin, "alpha").await;
    for name in ["beta", "gamma"] {
        app.create_table(&admin, name).await;
    }
    for name in ["one", "two", "three"] {
        app.create_field(&admin, first, json!({ "name": name, "data_type": "text" }))
            .await;
    }
    let res = app
        .patch_with_token(&routes::table(first), &json!({ "is_active": false }), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .get_with_token(&format!("{}?per_page=2", routes::TABLES), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 3);
    assert_eq!(res.body["pagination"]["total_pages"], 2);
    assert_eq!(res.body["data"][0]["name"], "alpha");
    assert_eq!(res.body["data"][0]["fields"].as_array().map(Vec::len), Some(3));

    let res = app
        .get_with_token(&format!("{}?is_active=true", routes::TABLES), &admin)
        .await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(
            &format!("{}?table_id={first}&per_page=2&page=2", routes::FIELDS),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 3);
    assert_eq!(res.body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(res.body["data"][0]["name"], "three");
}
