use rusqlite::Connection;
use slangspot_core::db::open_db_in_memory;
use slangspot_core::model::blog::BlogPostForm;
use slangspot_core::model::forum::{CategoryForm, ForumPostForm};
use slangspot_core::model::lesson::LessonForm;
use slangspot_core::repo::blog_repo::SqliteBlogRepository;
use slangspot_core::repo::forum_repo::SqliteForumRepository;
use slangspot_core::repo::lesson_repo::SqliteLessonRepository;
use slangspot_core::repo::notification_repo::SqliteNotificationRepository;
use slangspot_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use slangspot_core::service::blog_service::BlogService;
use slangspot_core::service::forum_service::ForumService;
use slangspot_core::service::lesson_service::LessonService;
use slangspot_core::service::notification_service::NotificationService;
use slangspot_core::{NoopPublisher, SearchParams, User};

fn seed_user(conn: &Connection, username: &str) -> User {
    let user = User::new(username, "");
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn seed_lessons(conn: &Connection, author: &User) {
    let service = LessonService::new(SqliteLessonRepository::new(conn));
    for (title, description, difficulty, category, country) in [
        ("Parce", "Amigo en Colombia", "beginner", "slang", "CO"),
        ("Al que madruga", "Dios le ayuda", "intermediate", "proverb", "ES"),
        ("Chamba", "Trabajo en México", "advanced", "slang", "MX"),
        ("Bacano", "Algo muy bueno, 100% colombiano", "beginner", "slang", "CO"),
    ] {
        service
            .create_lesson(
                author,
                &LessonForm {
                    title: title.to_string(),
                    description: description.to_string(),
                    difficulty: difficulty.to_string(),
                    category: category.to_string(),
                    country: country.to_string(),
                    ..LessonForm::default()
                },
            )
            .unwrap();
    }
}

fn titles<T>(items: &[T], title: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| title(item).to_string()).collect()
}

#[test]
fn lesson_query_without_matches_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    seed_lessons(&conn, &author);
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let params = SearchParams {
        q: Some("zzz-no-such-text".to_string()),
        ..SearchParams::default()
    };
    assert!(service.list_lessons(&params).unwrap().is_empty());
}

#[test]
fn lesson_filters_compose_and_default_to_most_recent() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    seed_lessons(&conn, &author);
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let all = service.list_lessons(&SearchParams::default()).unwrap();
    assert_eq!(
        titles(&all, |lesson| &lesson.fields.title),
        vec!["Bacano", "Chamba", "Al que madruga", "Parce"]
    );

    let colombian = service
        .list_lessons(&SearchParams {
            country: Some("co".to_string()),
            level: Some("beginner".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(
        titles(&colombian, |lesson| &lesson.fields.title),
        vec!["Bacano", "Parce"]
    );

    let by_text = service
        .list_lessons(&SearchParams {
            q: Some("méxico".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(titles(&by_text, |lesson| &lesson.fields.title), vec!["Chamba"]);

    let by_description = service
        .list_lessons(&SearchParams {
            q: Some("100%".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(titles(&by_description, |lesson| &lesson.fields.title), vec!["Bacano"]);
}

#[test]
fn unknown_filter_values_and_sort_keys_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    seed_lessons(&conn, &author);
    let service = LessonService::new(SqliteLessonRepository::new(&conn));

    let lessons = service
        .list_lessons(&SearchParams {
            country: Some("XX".to_string()),
            sort: Some("sideways".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(lessons.len(), 4);
    assert_eq!(lessons[0].fields.title, "Bacano");

    let by_title = service
        .list_lessons(&SearchParams {
            sort: Some("title".to_string()),
            limit: Some("2".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(
        titles(&by_title, |lesson| &lesson.fields.title),
        vec!["Al que madruga", "Bacano"]
    );
}

#[test]
fn forum_list_filters_by_tag_category_and_text() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let mut moderator = User::new("moderadora", "");
    moderator.is_staff = true;
    SqliteUserRepository::new(&conn).create_user(&moderator).unwrap();

    let publisher = NoopPublisher;
    let service = ForumService::new(
        SqliteForumRepository::new(&conn),
        SqliteUserRepository::new(&conn),
        NotificationService::new(SqliteNotificationRepository::new(&conn), &publisher),
    );
    let category = service
        .create_category(
            &moderator,
            &CategoryForm {
                name: "Dudas de vocabulario".to_string(),
                ..CategoryForm::default()
            },
        )
        .unwrap()
        .record;
    assert_eq!(category.slug, "dudas-de-vocabulario");

    service
        .create_post(
            &author,
            &ForumPostForm {
                title: "Jerga de Medellín".to_string(),
                content: "¿Qué es 'parce'?".to_string(),
                category: Some(category.meta.id.to_string()),
                tags: Some("colombia, jerga".to_string()),
            },
        )
        .unwrap();
    service
        .create_post(
            &author,
            &ForumPostForm {
                title: "Refranes españoles".to_string(),
                content: "Mis favoritos".to_string(),
                category: None,
                tags: Some("espana".to_string()),
            },
        )
        .unwrap();

    let tagged = service
        .list_posts(&SearchParams {
            tag: Some("Colombia".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(titles(&tagged, |summary| &summary.post.fields.title), vec!["Jerga de Medellín"]);

    let in_category = service
        .list_posts(&SearchParams {
            category: Some("dudas-de-vocabulario".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(in_category.len(), 1);

    let by_tag_text = service
        .list_posts(&SearchParams {
            q: Some("espan".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(
        titles(&by_tag_text, |summary| &summary.post.fields.title),
        vec!["Refranes españoles"]
    );

    let tags = service.list_tags().unwrap();
    assert_eq!(tags.len(), 3);
}

#[test]
fn blog_list_shows_only_published_posts() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let service = BlogService::new(SqliteBlogRepository::new(&conn));

    for (title, published) in [("Borrador", None), ("Publicado", Some("on"))] {
        service
            .create_post(
                &author,
                &BlogPostForm {
                    title: title.to_string(),
                    content: "texto".to_string(),
                    category: Some("cultura".to_string()),
                    is_published: published.map(str::to_string),
                    ..BlogPostForm::default()
                },
            )
            .unwrap();
    }

    let published = service.list_published(&SearchParams::default()).unwrap();
    assert_eq!(titles(&published, |post| &post.fields.title), vec!["Publicado"]);

    let wrong_category = service
        .list_published(&SearchParams {
            category: Some("historia".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert!(wrong_category.is_empty());
}

#[test]
fn text_search_ignores_case_of_non_ascii_letters() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_user(&conn, "ana");
    let lessons = LessonService::new(SqliteLessonRepository::new(&conn));
    lessons
        .create_lesson(
            &author,
            &LessonForm {
                title: "Ñapa".to_string(),
                description: "Un poquito ÉXTRA".to_string(),
                difficulty: "beginner".to_string(),
                category: "slang".to_string(),
                country: "CO".to_string(),
                ..LessonForm::default()
            },
        )
        .unwrap();

    for q in ["Ñapa", "ñapa", "ÑAPA", "éxtra"] {
        let found = lessons
            .list_lessons(&SearchParams {
                q: Some(q.to_string()),
                ..SearchParams::default()
            })
            .unwrap();
        assert_eq!(titles(&found, |lesson| &lesson.fields.title), vec!["Ñapa"], "q={q}");
    }

    let publisher = NoopPublisher;
    let forum = ForumService::new(
        SqliteForumRepository::new(&conn),
        SqliteUserRepository::new(&conn),
        NotificationService::new(SqliteNotificationRepository::new(&conn), &publisher),
    );
    forum
        .create_post(
            &author,
            &ForumPostForm {
                title: "¿QUÉ SIGNIFICA ÑERO?".to_string(),
                content: "Lo oí en Bogotá".to_string(),
                ..ForumPostForm::default()
            },
        )
        .unwrap();
    let posts = forum
        .list_posts(&SearchParams {
            q: Some("qué significa ñero".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(posts.len(), 1);

    let blog = BlogService::new(SqliteBlogRepository::new(&conn));
    blog.create_post(
        &author,
        &BlogPostForm {
            title: "La ÉPOCA dorada del tango".to_string(),
            content: "texto".to_string(),
            is_published: Some("on".to_string()),
            ..BlogPostForm::default()
        },
    )
    .unwrap();
    let articles = blog
        .list_published(&SearchParams {
            q: Some("época".to_string()),
            ..SearchParams::default()
        })
        .unwrap();
    assert_eq!(
        titles(&articles, |post| &post.fields.title),
        vec!["La ÉPOCA dorada del tango"]
    );
}
