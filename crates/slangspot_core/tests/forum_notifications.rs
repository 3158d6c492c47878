use rusqlite::Connection;
use slangspot_core::db::open_db_in_memory;
use slangspot_core::model::forum::{CommentForm, ForumPost, ForumPostForm, ModerationAction};
use slangspot_core::model::notification::{NotificationEvent, NotificationKind};
use slangspot_core::repo::forum_repo::SqliteForumRepository;
use slangspot_core::repo::notification_repo::SqliteNotificationRepository;
use slangspot_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use slangspot_core::service::forum_service::ForumService;
use slangspot_core::service::notification_service::NotificationService;
use slangspot_core::{PublishError, Publisher, ServiceError, User};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, event: &NotificationEvent) -> Result<bool, PublishError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(true)
    }
}

struct FailingPublisher;

impl Publisher for FailingPublisher {
    fn publish(&self, _event: &NotificationEvent) -> Result<bool, PublishError> {
        Err(PublishError("channel closed".to_string()))
    }
}

type Forum<'a> = ForumService<
    'a,
    SqliteForumRepository<'a>,
    SqliteUserRepository<'a>,
    SqliteNotificationRepository<'a>,
>;

fn forum<'a>(conn: &'a Connection, publisher: &'a dyn Publisher) -> Forum<'a> {
    ForumService::new(
        SqliteForumRepository::new(conn),
        SqliteUserRepository::new(conn),
        NotificationService::new(SqliteNotificationRepository::new(conn), publisher),
    )
}

fn notifications<'a>(
    conn: &'a Connection,
    publisher: &'a dyn Publisher,
) -> NotificationService<'a, SqliteNotificationRepository<'a>> {
    NotificationService::new(SqliteNotificationRepository::new(conn), publisher)
}

fn seed_user(conn: &Connection, username: &str) -> User {
    let user = User::new(username, "");
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn seed_post(service: &Forum<'_>, author: &User) -> ForumPost {
    service
        .create_post(
            author,
            &ForumPostForm {
                title: "¿Cómo se dice 'cool' en Chile?".to_string(),
                content: "Quiero sonar natural".to_string(),
                ..ForumPostForm::default()
            },
        )
        .unwrap()
        .record
}

fn comment(content: &str) -> CommentForm {
    CommentForm {
        content: content.to_string(),
        parent: None,
    }
}

#[test]
fn non_owner_comment_notifies_author_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let commenter = seed_user(&conn, "bruno");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    let saved = service
        .add_comment(&commenter, post.meta.id, &comment("Se dice 'bacán'"))
        .unwrap();

    let inbox = notifications(&conn, &publisher)
        .list_unread(&author, None)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::NewComment);
    assert_eq!(inbox[0].related_post_id, Some(post.meta.id));
    assert_eq!(inbox[0].related_comment_id, Some(saved.record.meta.id));
    assert_eq!(inbox[0].related_user_id, Some(commenter.id));
    assert!(inbox[0].message.starts_with("bruno commented on your post"));

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipient, author.id);
}

#[test]
fn author_commenting_on_own_post_creates_no_notification() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    service
        .add_comment(&author, post.meta.id, &comment("Actualizo: ya lo sé"))
        .unwrap();

    let count = notifications(&conn, &publisher).unread_count(&author).unwrap();
    assert_eq!(count, 0);
    assert!(publisher.events().is_empty());
}

#[test]
fn reply_and_mentions_notify_each_recipient_once() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let first = seed_user(&conn, "bruno");
    let replier = seed_user(&conn, "carla");
    let mentioned = seed_user(&conn, "diego");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    let parent = service
        .add_comment(&first, post.meta.id, &comment("Se dice 'bacán'"))
        .unwrap()
        .record;
    service
        .add_comment(
            &replier,
            post.meta.id,
            &CommentForm {
                content: "@bruno tiene razón, @Diego y @ana. @nobody".to_string(),
                parent: Some(parent.meta.id.to_string()),
            },
        )
        .unwrap();

    let inbox = notifications(&conn, &publisher);
    let bruno = inbox.list_unread(&first, None).unwrap();
    assert_eq!(bruno.len(), 1);
    assert_eq!(bruno[0].kind, NotificationKind::Reply);

    let ana = inbox.list_unread(&author, None).unwrap();
    assert_eq!(ana.len(), 2);
    assert!(ana.iter().all(|item| item.kind == NotificationKind::NewComment));

    let diego = inbox.list_unread(&mentioned, None).unwrap();
    assert_eq!(diego.len(), 1);
    assert_eq!(diego[0].kind, NotificationKind::Mention);

    assert_eq!(inbox.unread_count(&replier).unwrap(), 0);
}

#[test]
fn reply_to_comment_of_another_post_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let first = seed_post(&service, &author);
    let second = seed_post(&service, &author);
    assert_ne!(first.slug, second.slug);

    let foreign = service
        .add_comment(&author, first.meta.id, &comment("primero"))
        .unwrap()
        .record;
    let err = service
        .add_comment(
            &author,
            second.meta.id,
            &CommentForm {
                content: "respuesta".to_string(),
                parent: Some(foreign.meta.id.to_string()),
            },
        )
        .unwrap_err();
    match err {
        ServiceError::Invalid(errors) => assert!(errors.contains("parent")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn post_like_toggles_and_notifies_only_on_like() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let fan = seed_user(&conn, "bruno");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    let liked = service.toggle_post_like(&fan, post.meta.id).unwrap();
    assert!(liked.liked);
    assert_eq!(liked.likes_count, 1);

    let own = service.toggle_post_like(&author, post.meta.id).unwrap();
    assert!(own.liked);
    assert_eq!(own.likes_count, 2);

    let unliked = service.toggle_post_like(&fan, post.meta.id).unwrap();
    assert!(!unliked.liked);
    assert_eq!(unliked.likes_count, 1);

    let stored: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM forum_post_likes WHERE post_id = ?1;",
            [post.meta.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, i64::from(unliked.likes_count));

    let inbox = notifications(&conn, &publisher)
        .list_unread(&author, None)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::PostLike);
}

#[test]
fn comment_like_toggles_and_reports_count() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let fan = seed_user(&conn, "bruno");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);
    let reply = service
        .add_comment(&author, post.meta.id, &comment("gracias"))
        .unwrap()
        .record;

    let first = service.toggle_comment_like(&fan, reply.meta.id).unwrap();
    let second = service.toggle_comment_like(&fan, reply.meta.id).unwrap();
    assert_eq!((first.liked, first.likes_count), (true, 1));
    assert_eq!((second.liked, second.likes_count), (false, 0));

    let detail = service.post_detail(&fan, post.meta.id).unwrap();
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].comment.likes_count, 0);
    assert_eq!(detail.post.views, 1);
}

#[test]
fn failed_publish_does_not_fail_the_request() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let commenter = seed_user(&conn, "bruno");
    let publisher = FailingPublisher;
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    service
        .add_comment(&commenter, post.meta.id, &comment("hola"))
        .unwrap();

    let count = notifications(&conn, &publisher).unread_count(&author).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn failed_notification_insert_rolls_back_the_comment() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let commenter = seed_user(&conn, "bruno");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);
    conn.execute_batch("DROP TABLE notifications;").unwrap();

    let err = service
        .add_comment(&commenter, post.meta.id, &comment("hola"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)), "unexpected error: {err:?}");

    let stored: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1;",
            [post.meta.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, 0);
    assert!(conn.is_autocommit());
    assert!(publisher.events().is_empty());
}

#[test]
fn moderation_is_staff_only_and_closing_blocks_comments() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let mut staff = User::new("moderadora", "");
    staff.is_staff = true;
    SqliteUserRepository::new(&conn).create_user(&staff).unwrap();
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);

    let denied = service
        .moderate_post(&author, post.meta.id, ModerationAction::Close)
        .unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));

    let closed = service
        .moderate_post(&staff, post.meta.id, ModerationAction::Close)
        .unwrap()
        .record;
    assert!(closed.is_closed);

    let rejected = service
        .add_comment(&author, post.meta.id, &comment("¿sigue abierto?"))
        .unwrap_err();
    match rejected {
        ServiceError::Forbidden { message } => {
            assert_eq!(message, "This post is closed to new comments.");
        }
        other => panic!("unexpected error: {other}"),
    }

    let inbox = notifications(&conn, &publisher)
        .list_unread(&author, None)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Moderation);
}

#[test]
fn mark_read_is_scoped_to_the_recipient() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let commenter = seed_user(&conn, "bruno");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);
    service
        .add_comment(&commenter, post.meta.id, &comment("uno"))
        .unwrap();
    service
        .add_comment(&commenter, post.meta.id, &comment("dos"))
        .unwrap();

    let inbox = notifications(&conn, &publisher);
    let unread = inbox.list_unread(&author, None).unwrap();
    assert_eq!(unread.len(), 2);

    let foreign = inbox.mark_read(&commenter, unread[0].id).unwrap_err();
    assert!(matches!(foreign, ServiceError::NotFound { .. }));

    let outcome = inbox.mark_read(&author, unread[0].id).unwrap();
    assert!(outcome.read);
    assert_eq!(outcome.unread_count, 1);

    let outcome = inbox.mark_all_read(&author).unwrap();
    assert_eq!(outcome.unread_count, 0);
}

#[test]
fn popular_posts_default_to_a_thirty_day_window() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let publisher = RecordingPublisher::default();
    let service = forum(&conn, &publisher);
    let post = seed_post(&service, &author);
    let twenty_days_ms: i64 = 20 * 24 * 60 * 60 * 1000;
    conn.execute(
        "UPDATE forum_posts SET created_at = created_at - ?1 WHERE id = ?2;",
        rusqlite::params![twenty_days_ms, post.meta.id.to_string()],
    )
    .unwrap();

    let default_window = service.popular_posts(None).unwrap();
    assert_eq!(default_window.len(), 1);
    assert_eq!(default_window[0].post.meta.id, post.meta.id);
    assert_eq!(service.popular_posts(Some(0)).unwrap().len(), 1);
    assert!(service.popular_posts(Some(7)).unwrap().is_empty());
}
