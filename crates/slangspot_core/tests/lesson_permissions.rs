use rusqlite::Connection;
use slangspot_core::db::open_db_in_memory;
use slangspot_core::model::lesson::{ExpressionForm, LessonForm};
use slangspot_core::repo::lesson_repo::{LessonRepository, SqliteLessonRepository};
use slangspot_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use slangspot_core::service::lesson_service::LessonService;
use slangspot_core::{RecordStatus, RedirectTarget, ServiceError, User};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed_user(conn: &Connection, username: &str) -> User {
    let user = User::new(username, format!("{username}@example.com"));
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn seed_superuser(conn: &Connection, username: &str) -> User {
    let mut user = User::new(username, "");
    user.is_superuser = true;
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn lesson_form(title: &str, country: &str) -> LessonForm {
    LessonForm {
        title: title.to_string(),
        description: "Expresiones de la calle".to_string(),
        difficulty: "beginner".to_string(),
        category: "slang".to_string(),
        country: country.to_string(),
        ..LessonForm::default()
    }
}

#[test]
fn non_owner_delete_is_forbidden_and_lesson_stays_active() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let other = seed_user(&conn, "bruno");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let saved = service
        .create_lesson(&owner, &lesson_form("Test", "CO"))
        .unwrap();
    let id = saved.record.meta.id;

    match service.delete_lesson(&other, id).unwrap_err() {
        ServiceError::Forbidden { message } => {
            assert_eq!(message, "You do not have permission to delete this lesson.");
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = SqliteLessonRepository::new(&conn)
        .get_lesson(id, false)
        .unwrap()
        .expect("lesson should still be active");
    assert_eq!(stored.meta.status, RecordStatus::Active);
    assert!(stored.meta.deleted_at.is_none());
}

#[test]
fn non_owner_edit_is_forbidden_before_validation() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let other = seed_user(&conn, "bruno");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));
    let id = service
        .create_lesson(&owner, &lesson_form("Chévere", "VE"))
        .unwrap()
        .record
        .meta
        .id;

    let err = service
        .update_lesson(&other, id, &LessonForm::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));

    let unchanged = service.lesson_detail(None, id).unwrap().lesson;
    assert_eq!(unchanged.fields.title, "Chévere");
}

#[test]
fn owner_update_redirects_to_detail() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));
    let id = service
        .create_lesson(&owner, &lesson_form("Parce", "CO"))
        .unwrap()
        .record
        .meta
        .id;

    let mut form = lesson_form("Parce y parcero", "co");
    form.video_url = Some("https://youtu.be/abc123".to_string());
    let saved = service.update_lesson(&owner, id, &form).unwrap();

    assert_eq!(saved.redirect, RedirectTarget::LessonDetail(id));
    assert_eq!(saved.record.fields.title, "Parce y parcero");
    assert_eq!(
        saved.record.fields.video_url.as_deref(),
        Some("https://www.youtube.com/embed/abc123")
    );
}

#[test]
fn invalid_form_reports_field_errors_without_persisting() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let mut form = lesson_form("", "XX");
    form.difficulty = "expert".to_string();
    match service.create_lesson(&owner, &form).unwrap_err() {
        ServiceError::Invalid(errors) => {
            assert!(errors.contains("title"));
            assert!(errors.contains("country"));
            assert!(errors.contains("difficulty"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM lessons;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn superuser_may_delete_any_lesson() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let admin = seed_superuser(&conn, "admin");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));
    let id = service
        .create_lesson(&owner, &lesson_form("Guay", "ES"))
        .unwrap()
        .record
        .meta
        .id;

    let redirect = service.delete_lesson(&admin, id).unwrap();
    assert_eq!(redirect, RedirectTarget::LessonList);
}

#[test]
fn expression_permissions_follow_lesson_author() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let other = seed_user(&conn, "bruno");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));
    let lesson_id = service
        .create_lesson(&owner, &lesson_form("Órale", "MX"))
        .unwrap()
        .record
        .meta
        .id;

    let form = ExpressionForm {
        text: Some("¡Órale!".to_string()),
        meaning: Some("Expresión de sorpresa o ánimo".to_string()),
        ..ExpressionForm::default()
    };
    let denied = service.create_expression(&other, lesson_id, &form).unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));

    let saved = service.create_expression(&owner, lesson_id, &form).unwrap();
    assert_eq!(saved.redirect, RedirectTarget::LessonDetail(lesson_id));
    let expression_id = saved.record.meta.id;

    let denied = service
        .update_expression(&other, expression_id, &ExpressionForm::default())
        .unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));
    let denied = service.delete_expression(&other, expression_id).unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));

    let redirect = service.delete_expression(&owner, expression_id).unwrap();
    assert_eq!(redirect, RedirectTarget::LessonDetail(lesson_id));

    let detail = service.lesson_detail(Some(&owner), lesson_id).unwrap();
    assert!(detail.expressions.is_empty());
    assert!(detail.can_edit);
}

#[test]
fn deleted_lesson_keeps_expression_rows_and_ownership() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let other = seed_user(&conn, "bruno");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));
    let lesson_id = service
        .create_lesson(&owner, &lesson_form("Boludo", "AR"))
        .unwrap()
        .record
        .meta
        .id;
    let expression_id = service
        .create_expression(
            &owner,
            lesson_id,
            &ExpressionForm {
                text: Some("che".to_string()),
                ..ExpressionForm::default()
            },
        )
        .unwrap()
        .record
        .meta
        .id;

    service.delete_lesson(&owner, lesson_id).unwrap();

    let repo = SqliteLessonRepository::new(&conn);
    let expression = repo
        .get_expression(expression_id, false)
        .unwrap()
        .expect("children are not cascaded");
    assert!(expression.meta.is_active());

    let denied = service.delete_expression(&other, expression_id).unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));
    service.delete_expression(&owner, expression_id).unwrap();
}

#[test]
fn missing_lesson_is_not_found() {
    let conn = setup();
    let owner = seed_user(&conn, "ana");
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let err = service
        .delete_lesson(&owner, uuid::Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "lesson", .. }));
}
