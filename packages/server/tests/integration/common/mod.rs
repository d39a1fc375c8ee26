use std::net::SocketAddr;

use reqwest::Client;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, SeedConfig, ServerConfig,
};
use server::state::AppState;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const STUDENTS: &str = "/api/v1/students";
    pub const COURSES: &str = "/api/v1/courses";
    pub const GRADING_SCALES: &str = "/api/v1/grading-scales";
    pub const SCORES: &str = "/api/v1/scores";
    pub const GRADES: &str = "/api/v1/grades";
    pub const GRADES_RECOMPUTE: &str = "/api/v1/grades/recompute";
    pub const TABLES: &str = "/api/v1/custom_tables/tables";
    pub const FIELDS: &str = "/api/v1/custom_tables/fields";

    pub fn course(id: i32) -> String {
        format!("/api/v1/courses/{id}")
    }

    pub fn course_components(course_id: i32) -> String {
        format!("/api/v1/courses/{course_id}/components")
    }

    pub fn component(id: i32) -> String {
        format!("/api/v1/components/{id}")
    }

    pub fn grading_scale(id: i32) -> String {
        format!("/api/v1/grading-scales/{id}")
    }

    pub fn score(id: i32) -> String {
        format!("/api/v1/scores/{id}")
    }

    pub fn grade_for(student_id: i32, course_id: i32) -> String {
        format!("/api/v1/grades?student_id={student_id}&course_id={course_id}")
    }

    pub fn table(id: i32) -> String {
        format!("/api/v1/custom_tables/tables/{id}")
    }

    pub fn field(id: i32) -> String {
        format!("/api/v1/custom_tables/fields/{id}")
    }

    pub fn rows(table: &str) -> String {
        format!("/api/v1/custom_tables/data/{table}")
    }

    pub fn rows_add(table: &str) -> String {
        format!("/api/v1/custom_tables/data/{table}/add")
    }

    pub fn row(table: &str, pk: i32) -> String {
        format!("/api/v1/custom_tables/data/{table}/{pk}")
    }
}

/// A running test server backed by its own in-memory SQLite database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_seed(false).await
    }

    /// Spawn with the built-in grading scales inserted.
    pub async fn spawn_seeded() -> Self {
        Self::spawn_with_seed(true).await
    }

    async fn spawn_with_seed(seed: bool) -> Self {
        let db_url = "sqlite::memory:".to_string();
        // One connection: every pooled connection would otherwise open its own empty database.
        let mut opts = ConnectOptions::new(&db_url);
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts)
            .await
            .expect("Failed to open in-memory database");
        server::database::sync_schema(&db)
            .await
            .expect("Failed to sync schema");
        if seed {
            server::seed::seed_grading_scales(&db)
                .await
                .expect("Failed to seed grading scales");
        }

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            seed: SeedConfig {
                grading_scales: seed,
            },
        };

        let state = AppState {
            db: db.clone(),
            config: app_config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Issue a token the way the identity service would.
    pub fn token(&self, user_id: i32, role: &str) -> String {
        server::utils::jwt::sign(user_id, &format!("user{user_id}"), role, JWT_SECRET)
            .expect("Failed to sign token")
    }

    pub fn admin_token(&self) -> String {
        self.token(1, "ADMIN")
    }

    pub fn teacher_token(&self) -> String {
        self.token(2, "TEACHER")
    }

    pub fn student_token(&self) -> String {
        self.token(3, "STUDENT")
    }

    pub fn parent_token(&self) -> String {
        self.token(4, "PARENT")
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// POST a raw, possibly malformed, JSON body.
    pub async fn post_raw_with_token(&self, path: &str, body: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a student via the API and return its `id`.
    pub async fn create_student(&self, token: &str, student_id: &str) -> i32 {
        self.create_student_with(token, json!({ "student_id": student_id }))
            .await
    }

    /// Create a student with extra fields (names, account links) and return its `id`.
    pub async fn create_student_with(&self, token: &str, body: Value) -> i32 {
        let mut payload = json!({ "first_name": "Ama", "last_name": "Mensah" });
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
            target.extend(extra.clone());
        }
        let res = self.post_with_token(routes::STUDENTS, &payload, token).await;
        assert_eq!(res.status, 201, "create_student failed: {}", res.text);
        res.id()
    }

    /// Create a course via the API and return its `id`.
    pub async fn create_course(&self, token: &str, code: &str, body: Value) -> i32 {
        let mut payload = json!({ "name": format!("Course {code}"), "code": code });
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
            target.extend(extra.clone());
        }
        let res = self.post_with_token(routes::COURSES, &payload, token).await;
        assert_eq!(res.status, 201, "create_course failed: {}", res.text);
        res.id()
    }

    /// Add a component to a course and return its `id`.
    pub async fn create_component(
        &self,
        token: &str,
        course_id: i32,
        name: &str,
        kind: &str,
        max_score: f64,
        weight: i32,
    ) -> i32 {
        let res = self
            .post_with_token(
                &routes::course_components(course_id),
                &json!({
                    "name": name,
                    "kind": kind,
                    "max_score": max_score,
                    "weight": weight,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_component failed: {}", res.text);
        res.id()
    }

    /// Record a score and return the raw response.
    pub async fn record_score(
        &self,
        token: &str,
        student_id: i32,
        component_id: i32,
        score: f64,
    ) -> TestResponse {
        self.post_with_token(
            routes::SCORES,
            &json!({
                "student_id": student_id,
                "component_id": component_id,
                "score": score,
            }),
            token,
        )
        .await
    }

    /// Fetch the stored grade for a (student, course) pair, if any.
    pub async fn grade_of(&self, token: &str, student_id: i32, course_id: i32) -> Option<Value> {
        let res = self
            .get_with_token(&routes::grade_for(student_id, course_id), token)
            .await;
        assert_eq!(res.status, 200, "list grades failed: {}", res.text);
        res.body["data"].as_array().and_then(|d| d.first().cloned())
    }

    /// Create a custom table via the API and return its `id`.
    pub async fn create_table(&self, token: &str, name: &str) -> i32 {
        let res = self
            .post_with_token(routes::TABLES, &json!({ "name": name }), token)
            .await;
        assert_eq!(res.status, 201, "create_table failed: {}", res.text);
        res.id()
    }

    /// Add a field to a custom table and return its `id`.
    pub async fn create_field(&self, token: &str, table_id: i32, body: Value) -> i32 {
        let mut payload = json!({ "table_id": table_id });
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
            target.extend(extra.clone());
        }
        let res = self.post_with_token(routes::FIELDS, &payload, token).await;
        assert_eq!(res.status, 201, "create_field failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
