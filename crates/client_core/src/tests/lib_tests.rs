use identity::InMemoryIdentityProvider;
use storage::{MemoryStore, Storage};

use super::*;
use crate::{
    directory,
    navigation::Screen,
    test_support::{drain_notices, me, signed_in_app, SilentIdentityProvider},
};

#[tokio::test(start_paused = true)]
async fn restored_session_forms_a_group_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    for email in ["a@x.com", "b@x.com", "me@x.com"] {
        directory::register_user_if_absent(store.as_ref(), email)
            .await
            .expect("seed");
    }
    let provider = Arc::new(InMemoryIdentityProvider::default());
    provider.restore_session(me()).await;

    let app = App::start(ClientSettings::default(), store.clone(), provider);
    let mut events = app.context().subscribe_events();
    let mut nav = app.navigator();
    let mut session = app.session();
    assert_eq!(
        nav.resolve_splash(&mut session).await.expect("splash"),
        Screen::MainArea
    );
    assert!(matches!(
        Dashboard::from_session(&session.snapshot()),
        Dashboard::Ready(ref profile) if profile.email == "me@x.com"
    ));

    let mut formation = app.group_formation();
    formation.toggle_selection_mode();
    let candidates = formation.load_directory().await.expect("directory").to_vec();
    assert_eq!(candidates, vec!["a@x.com", "b@x.com"]);
    formation.toggle_selection("a@x.com");
    formation.confirm_selection().expect("naming");
    formation.set_group_name("Trip");
    let name = formation.group_name().to_string();
    let group = formation.create_group(&name).await.expect("group");

    assert_eq!(group.members, vec!["me@x.com", "a@x.com"]);
    assert_eq!(
        directory::list_groups(store.as_ref()).await.expect("groups"),
        vec![group.clone()]
    );

    let mut saw_group = false;
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::GroupCreated(created) = event {
            saw_group = created == group;
        }
    }
    assert!(saw_group);
    app.shutdown().await;
}

#[tokio::test]
async fn events_reach_every_subscriber() {
    let app = signed_in_app(Arc::new(MemoryStore::new()), me()).await;
    let mut first = app.context().subscribe_events();
    let mut second = app.context().subscribe_events();

    app.context().notify(Notice::new("Hello", "world"));

    assert_eq!(drain_notices(&mut first), vec![Notice::new("Hello", "world")]);
    assert_eq!(drain_notices(&mut second), vec![Notice::new("Hello", "world")]);
}

#[tokio::test]
async fn silent_errors_produce_no_notice() {
    let app = signed_in_app(Arc::new(MemoryStore::new()), me()).await;
    let mut events = app.context().subscribe_events();

    let err = app.context().report(AppError::Cancelled);
    assert_eq!(err, AppError::Cancelled);
    app.context().report(AppError::Navigation(
        navigation::NavigationError::NothingToPop(Screen::Splash),
    ));
    assert!(drain_notices(&mut events).is_empty());

    app.context().report(AppError::NotSignedIn);
    let notices = drain_notices(&mut events);
    assert_eq!(notices[0].title, "Not Signed In");
}

#[tokio::test(start_paused = true)]
async fn dashboard_shows_loading_while_provider_is_silent() {
    let provider = Arc::new(SilentIdentityProvider::default());
    let app = App::start(
        ClientSettings::default(),
        Arc::new(MemoryStore::new()),
        provider,
    );
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;

    let dashboard = Dashboard::from_session(&app.session().snapshot());
    assert_eq!(dashboard, Dashboard::Loading);
    assert_eq!(dashboard.placeholder(), Some("Loading..."));
}

#[tokio::test]
async fn runs_against_sqlite_storage() {
    let storage = Storage::new("sqlite::memory:").await.expect("storage");
    let app = signed_in_app(Arc::new(storage.clone()), me()).await;
    directory::register_user_if_absent(app.context().store().as_ref(), "a@x.com")
        .await
        .expect("register");

    let mut formation = app.group_formation();
    assert_eq!(
        formation.load_directory().await.expect("directory"),
        &["a@x.com".to_string()]
    );
    formation.toggle_selection("a@x.com");
    let group = formation.create_group("Dinner").await.expect("group");

    let groups = directory::list_groups(&storage).await.expect("groups");
    assert_eq!(groups, vec![group]);
}

#[tokio::test]
async fn zero_event_capacity_is_clamped() {
    let settings = ClientSettings {
        event_capacity: 0,
        ..ClientSettings::default()
    };
    let app = App::start(
        settings,
        Arc::new(MemoryStore::new()),
        Arc::new(InMemoryIdentityProvider::default()),
    );
    let mut events = app.context().subscribe_events();
    app.context().notify(Notice::new("Ping", "pong"));
    assert_eq!(drain_notices(&mut events).len(), 1);
}
