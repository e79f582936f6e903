use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use rundown_backend::config::Config;
use rundown_backend::{db, services};
use rundown_common::model::import::{ImportBatch, ImportReport, ImportRowError};
use rundown_common::model::story::{ApprovalStatus, StoryRecord};
use tempfile::TempDir;

const BOUNDARY: &str = "----rundown-test-boundary";

/// Database on disk with one admin and one student session.
fn test_config(dir: &TempDir) -> Config {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: dir.path().join("rundown.sqlite"),
        max_upload_bytes: 64 * 1024,
    };
    let conn = config.open_db().expect("open db");
    db::init(&conn).expect("init schema");
    conn.execute_batch(
        "INSERT INTO users (id, name, role) VALUES (1, 'Admin', 'admin'), (2, 'Student', 'student');
         INSERT INTO sessions (token, user_id) VALUES ('admin-token', 1), ('student-token', 2);",
    )
    .expect("seed");
    config
}

fn multipart_body(file_name: &str, content: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

fn import_request(token: Option<&str>, file_name: &str, content: &str) -> test::TestRequest {
    let mut req = test::TestRequest::post()
        .uri("/api/stories/import")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(file_name, content));
    if let Some(token) = token {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
    }
    req
}

macro_rules! app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($config))
                .configure(services::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn admin_import_reports_rejections_and_approves_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let csv = "idea_title,idea_description\n\
               Fixed Test Story 1,\n\
               ,Valid description without a title\n";
    let resp = test::call_service(&app, import_request(Some("admin-token"), "stories.csv", csv).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let report: ImportReport = test::read_body_json(resp).await;
    assert_eq!(
        report,
        ImportReport {
            imported: 1,
            total: 2,
            errors: vec![ImportRowError {
                row: 2,
                title: None,
                error: "missing title".to_string(),
            }],
        }
    );

    let req = test::TestRequest::get()
        .uri("/api/stories?status=approved")
        .insert_header((header::AUTHORIZATION, "Bearer admin-token"))
        .to_request();
    let stories: Vec<StoryRecord> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].story.title, "Fixed Test Story 1");
    assert_eq!(stories[0].status, ApprovalStatus::Approved);
}

#[actix_web::test]
async fn student_imports_wait_for_review() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let resp = test::call_service(
        &app,
        import_request(Some("student-token"), "mine.CSV", "idea_title\nClub fair\n").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/stories?status=pending")
        .insert_header((header::AUTHORIZATION, "Bearer student-token"))
        .to_request();
    let stories: Vec<StoryRecord> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].submitted_by, 2);
}

#[actix_web::test]
async fn import_requires_a_known_token() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let resp = test::call_service(&app, import_request(None, "s.csv", "idea_title\nA\n").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        import_request(Some("stolen"), "s.csv", "idea_title\nA\n").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unparseable_file_is_a_bad_request_not_a_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let resp = test::call_service(&app, import_request(Some("admin-token"), "empty.csv", "").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "the uploaded file is empty");
}

#[actix_web::test]
async fn non_csv_and_oversized_uploads_are_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let resp = test::call_service(
        &app,
        import_request(Some("admin-token"), "stories.xlsx", "idea_title\nA\n").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let big = format!("idea_title\n{}\n", "x".repeat(70 * 1024));
    let resp = test::call_service(&app, import_request(Some("admin-token"), "big.csv", &big).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn a_second_file_part_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let part = |name: &str, content: &str| {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {content}\r\n"
        )
    };
    let body = format!(
        "{}{}--{BOUNDARY}--\r\n",
        part("first.csv", "idea_title\nFirst\n"),
        part("second.csv", "idea_title\nSecond\n")
    );
    let req = test::TestRequest::post()
        .uri("/api/stories/import")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .insert_header((header::AUTHORIZATION, "Bearer admin-token"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/stories")
        .insert_header((header::AUTHORIZATION, "Bearer admin-token"))
        .to_request();
    let stories: Vec<StoryRecord> = test::call_and_read_body_json(&app, req).await;
    assert!(stories.is_empty());
}

#[actix_web::test]
async fn imports_are_recorded_in_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let csv = "idea_title\nOne\nTwo\n";
    let resp = test::call_service(&app, import_request(Some("admin-token"), "batch.csv", csv).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/stories/imports")
        .insert_header((header::AUTHORIZATION, "Bearer admin-token"))
        .to_request();
    let batches: Vec<ImportBatch> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].file_name, "batch.csv");
    assert_eq!(batches[0].imported, 2);
    assert_eq!(batches[0].total, 2);
    let mut hasher = md5::Context::new();
    hasher.consume(csv.as_bytes());
    assert_eq!(batches[0].file_md5, format!("{:x}", hasher.finalize()));
}

#[actix_web::test]
async fn template_lists_the_import_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app!(test_config(&dir));

    let req = test::TestRequest::get()
        .uri("/api/stories/import/template")
        .insert_header((header::AUTHORIZATION, "Bearer student-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );

    let body = test::read_body(resp).await;
    let header_line = std::str::from_utf8(&body).unwrap().trim_end();
    assert!(header_line.starts_with("idea_title,idea_description,question_1"));
    assert!(header_line.ends_with("tags,interviewees"));
}
