use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::future::{self, BoxFuture};
use gameshow_host::{
    config::HostConfig,
    dao::{
        app_store::{DEFAULT_STORAGE_KEY, LoadIssue},
        blob_store::{BlobStore, MemoryBlobStore},
        storage::{StorageError, StorageResult},
    },
    dto::{
        events::SessionNotice,
        game::{CreateGameRequest, GameSettingsInput, QuestionInput, TeamsInput, WagerQuestionInput},
        phase::VisibleSessionPhase,
        session::SessionSnapshot,
    },
    error::ServiceError,
    services::{editor_service, game_service, session_service},
    state::{
        AppState, SharedState,
        game::{GameId, GameMode, Outcome, Scores, Team},
        state_machine::{Rejection, WagerOutcome},
    },
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn host_on(blob: Arc<dyn BlobStore>, config: HostConfig) -> SharedState {
    init_tracing();
    AppState::with_store(config, blob).await
}

async fn host() -> (SharedState, MemoryBlobStore) {
    let blob = MemoryBlobStore::new();
    let state = host_on(Arc::new(blob.clone()), HostConfig::default()).await;
    (state, blob)
}

/// Create a game with questions in `cells` and, optionally, a wager question.
async fn seeded_game(state: &SharedState, timer: u32, cells: &[(u8, u8)], wager: bool) -> GameId {
    let summary = game_service::create_game(
        state,
        CreateGameRequest {
            name: "Friday Night".into(),
            teams: Some(TeamsInput {
                team_a: "Owls".into(),
                team_b: "Foxes".into(),
            }),
            question_timer_seconds: Some(timer),
        },
    )
    .await
    .unwrap();
    let game_id = GameId::from(summary.id);

    for &(category_index, row_index) in cells {
        editor_service::save_question(
            state,
            &game_id,
            QuestionInput {
                category_index,
                row_index,
                question: format!("Question {category_index}/{row_index}"),
                answer: format!("Answer {category_index}/{row_index}"),
            },
        )
        .await
        .unwrap();
    }

    if wager {
        editor_service::set_wager_question(
            state,
            &game_id,
            Some(WagerQuestionInput {
                category: "World Capitals".into(),
                question: "Capital of Australia?".into(),
                answer: "Canberra".into(),
            }),
        )
        .await
        .unwrap();
    }

    game_id
}

fn phase_of(snapshot: &SessionSnapshot) -> VisibleSessionPhase {
    snapshot.phase.phase
}

#[tokio::test]
async fn friday_night_plays_through_to_a_winner() {
    let (state, blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(0, 0), (1, 1)], true).await;
    let mut notices = state.subscribe();

    let started = session_service::start_session(&state, &game_id).await.unwrap();
    assert_eq!(phase_of(&started), VisibleSessionPhase::Idle);
    assert_eq!(started.teams.team_a, "Owls");

    let open = session_service::select_cell(&state, 0, 0).await.unwrap();
    assert_eq!(phase_of(&open), VisibleSessionPhase::QuestionOpen);
    let on_screen = open.question.as_ref().unwrap();
    assert_eq!(on_screen.points, Some(100));
    assert_eq!(on_screen.answer, None);
    assert_eq!(open.phase.countdown, None);

    let revealed = session_service::reveal(&state).await.unwrap();
    assert_eq!(
        revealed.question.unwrap().answer.as_deref(),
        Some("Answer 0/0")
    );

    let after_award = session_service::award(&state, Team::A).await.unwrap();
    assert_eq!(phase_of(&after_award), VisibleSessionPhase::Idle);
    assert_eq!(after_award.scores, Scores::new(100, 0));

    session_service::select_cell(&state, 1, 1).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    let round_done = session_service::mark_wrong(&state).await.unwrap();
    assert_eq!(phase_of(&round_done), VisibleSessionPhase::RoundComplete);
    assert_eq!(round_done.scores, Scores::new(100, 0));

    let wagering = session_service::advance(&state).await.unwrap();
    assert_eq!(phase_of(&wagering), VisibleSessionPhase::WagerPending);

    session_service::place_wager(&state, Team::A, 100).await.unwrap();
    session_service::place_wager(&state, Team::B, 0).await.unwrap();
    let wager_open = session_service::open_wager_question(&state).await.unwrap();
    assert_eq!(phase_of(&wager_open), VisibleSessionPhase::WagerQuestion);
    assert_eq!(
        wager_open.question.as_ref().unwrap().question,
        "Capital of Australia?"
    );

    session_service::reveal(&state).await.unwrap();
    let resolved = session_service::resolve_wager(&state, WagerOutcome::Correct(Team::A))
        .await
        .unwrap();
    assert_eq!(phase_of(&resolved), VisibleSessionPhase::WagerResolved);
    assert_eq!(resolved.scores, Scores::new(200, 0));

    let over = session_service::advance(&state).await.unwrap();
    assert_eq!(phase_of(&over), VisibleSessionPhase::GameOver);
    assert_eq!(over.phase.outcome, Some(Outcome::Winner(Team::A)));

    let board = session_service::scoreboard(&state).await.unwrap();
    assert_eq!(board.leader, Outcome::Winner(Team::A));

    let mut phase_changes = 0;
    let mut score_changes = 0;
    while let Ok(notice) = notices.try_recv() {
        match notice {
            SessionNotice::PhaseChanged(_) => phase_changes += 1,
            SessionNotice::ScoresChanged(_) => score_changes += 1,
            SessionNotice::SessionEnded(_) => {}
        }
    }
    assert_eq!(phase_changes, 14);
    assert_eq!(score_changes, 3);

    // A fresh host on the same storage sees the finished game.
    let reopened = host_on(Arc::new(blob), HostConfig::default()).await;
    let game = reopened.repository().get_game(&game_id).await.unwrap();
    assert_eq!(game.scores, Scores::new(200, 0));
    assert_eq!(game.progress.current_mode, Some(GameMode::Jeopardy));
    assert!(game.board.is_exhausted());
    assert!(game.wager_question.unwrap().used);

    let resumed = session_service::start_session(&reopened, &game_id).await.unwrap();
    assert_eq!(phase_of(&resumed), VisibleSessionPhase::GameOver);
}

#[tokio::test]
async fn equal_scores_end_in_a_tie() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(0, 4), (1, 4)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();

    session_service::select_cell(&state, 0, 4).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    session_service::award(&state, Team::A).await.unwrap();
    session_service::select_cell(&state, 1, 4).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    let done = session_service::award(&state, Team::B).await.unwrap();
    assert_eq!(done.scores, Scores::new(500, 500));
    assert_eq!(phase_of(&done), VisibleSessionPhase::RoundComplete);

    let over = session_service::advance(&state).await.unwrap();
    assert_eq!(over.phase.outcome, Some(Outcome::Tie));
}

#[tokio::test]
async fn used_cells_cannot_be_selected_again() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(0, 0), (0, 1)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();

    session_service::select_cell(&state, 0, 0).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    session_service::award(&state, Team::B).await.unwrap();

    let err = session_service::select_cell(&state, 0, 0).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Rejected(Rejection::QuestionUsed(_))
    ));
    let err = session_service::select_cell(&state, 5, 4).await.unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(Rejection::EmptyCell(_))));
    let err = session_service::select_cell(&state, 6, 0).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let snapshot = session_service::snapshot(&state).await.unwrap();
    assert_eq!(phase_of(&snapshot), VisibleSessionPhase::Idle);
}

#[tokio::test]
async fn losing_wager_clamps_score_at_zero() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(2, 2)], true).await;
    session_service::start_session(&state, &game_id).await.unwrap();

    session_service::select_cell(&state, 2, 2).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    session_service::award(&state, Team::A).await.unwrap();
    session_service::advance(&state).await.unwrap();

    let err = session_service::place_wager(&state, Team::A, 500)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Rejected(Rejection::WagerExceedsScore {
            team: Team::A,
            amount: 500,
            score: 300
        })
    ));

    session_service::place_wager(&state, Team::A, 300).await.unwrap();
    let err = session_service::open_wager_question(&state).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Rejected(Rejection::WagersIncomplete)
    ));
    session_service::place_wager(&state, Team::B, 0).await.unwrap();
    session_service::open_wager_question(&state).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    let resolved = session_service::resolve_wager(&state, WagerOutcome::BothWrong)
        .await
        .unwrap();
    assert_eq!(resolved.scores, Scores::new(0, 0));

    let over = session_service::advance(&state).await.unwrap();
    assert_eq!(over.phase.outcome, Some(Outcome::Tie));
}

#[tokio::test(start_paused = true)]
async fn countdown_reveals_the_answer_on_its_own() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 5, &[(3, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();

    let open = session_service::select_cell(&state, 3, 0).await.unwrap();
    assert_eq!(open.phase.countdown, Some(5));
    let session = state.active_session().await.unwrap();
    assert!(session.countdown_active());

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let ticking = session_service::snapshot(&state).await.unwrap();
    assert_eq!(ticking.phase.countdown, Some(3));
    assert_eq!(ticking.phase.revealed, Some(false));

    tokio::time::sleep(Duration::from_secs(3)).await;
    let revealed = session_service::snapshot(&state).await.unwrap();
    assert_eq!(revealed.phase.countdown, Some(0));
    assert_eq!(revealed.phase.revealed, Some(true));
    assert_eq!(
        revealed.question.unwrap().answer.as_deref(),
        Some("Answer 3/0")
    );
    assert!(!session.countdown_active());

    let done = session_service::award(&state, Team::A).await.unwrap();
    assert_eq!(done.scores, Scores::new(100, 0));
}

#[tokio::test(start_paused = true)]
async fn manual_reveal_cancels_the_countdown() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 10, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let revealed = session_service::reveal(&state).await.unwrap();
    assert_eq!(revealed.phase.countdown, Some(8));
    let session = state.active_session().await.unwrap();
    assert!(!session.countdown_active());
    let version = revealed.phase.version;

    tokio::time::sleep(Duration::from_secs(20)).await;
    let later = session_service::snapshot(&state).await.unwrap();
    assert_eq!(later.phase.version, version);
    assert_eq!(later.phase.countdown, Some(8));
}

#[tokio::test(start_paused = true)]
async fn exiting_to_the_board_cancels_the_countdown() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 10, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let board = session_service::exit_to_board(&state).await.unwrap();
    assert_eq!(phase_of(&board), VisibleSessionPhase::Idle);
    let version = board.phase.version;

    tokio::time::sleep(Duration::from_secs(15)).await;
    let later = session_service::snapshot(&state).await.unwrap();
    assert_eq!(later.phase.version, version);
    assert_eq!(phase_of(&later), VisibleSessionPhase::Idle);

    // The question was not played and can be opened again with a fresh timer.
    let reopened = session_service::select_cell(&state, 0, 0).await.unwrap();
    assert_eq!(reopened.phase.countdown, Some(10));
}

#[tokio::test(start_paused = true)]
async fn ending_the_session_cancels_the_countdown() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 10, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();
    let session = state.active_session().await.unwrap();

    session_service::end_session(&state).await.unwrap();
    assert!(!session.countdown_active());
    assert!(state.active_session().await.is_none());

    let err = session_service::reveal(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn exit_before_reveal_can_be_forbidden() {
    let config = HostConfig::from_json(r#"{ "exitPolicy": "after_reveal" }"#).unwrap();
    let state = host_on(Arc::new(MemoryBlobStore::new()), config).await;
    let game_id = seeded_game(&state, 0, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();

    let err = session_service::exit_to_board(&state).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Rejected(Rejection::ExitBeforeReveal)
    ));

    session_service::reveal(&state).await.unwrap();
    let board = session_service::exit_to_board(&state).await.unwrap();
    assert_eq!(phase_of(&board), VisibleSessionPhase::Idle);
}

#[tokio::test]
async fn restarted_session_resumes_on_the_board() {
    let (state, blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(0, 0), (4, 3)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 4, 3).await.unwrap();
    session_service::reveal(&state).await.unwrap();
    session_service::award(&state, Team::B).await.unwrap();
    state.shutdown().await;

    let reopened = host_on(Arc::new(blob), HostConfig::default()).await;
    let resumed = session_service::start_session(&reopened, &game_id).await.unwrap();
    assert_eq!(phase_of(&resumed), VisibleSessionPhase::Idle);
    assert_eq!(resumed.scores, Scores::new(0, 400));

    let err = session_service::select_cell(&reopened, 4, 3).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Rejected(Rejection::QuestionUsed(_))
    ));
}

#[tokio::test]
async fn board_edits_and_removal_wait_for_the_session_to_end() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();

    let err = editor_service::save_question(
        &state,
        &game_id,
        QuestionInput {
            category_index: 1,
            row_index: 0,
            question: "Late addition".into(),
            answer: "Refused".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert!(matches!(
        game_service::remove_game(&state, &game_id).await.unwrap_err(),
        ServiceError::InvalidState(_)
    ));

    // Cosmetic settings stay editable.
    let renamed = editor_service::update_settings(
        &state,
        &game_id,
        GameSettingsInput {
            name: Some("Saturday Night".into()),
            question_timer_seconds: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "Saturday Night");

    session_service::end_session(&state).await.unwrap();
    game_service::remove_game(&state, &game_id).await.unwrap();
    assert!(game_service::list_games(&state).await.is_empty());
    assert!(matches!(
        game_service::get_game(&state, &game_id).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn saving_into_an_occupied_cell_replaces_the_question() {
    let (state, _blob) = host().await;
    let game_id = seeded_game(&state, 0, &[(2, 1)], false).await;

    let replacement = editor_service::save_question(
        &state,
        &game_id,
        QuestionInput {
            category_index: 2,
            row_index: 1,
            question: "  Replacement  ".into(),
            answer: "New".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(replacement.points, 200);
    assert_eq!(replacement.question, "Replacement");
    assert_eq!(replacement.category, "Category 3");

    let game = game_service::get_game(&state, &game_id).await.unwrap();
    assert_eq!(game.questions.len(), 1);
    assert_eq!(game.questions[0].id, replacement.id);
}

#[tokio::test]
async fn new_games_are_listed_first_and_users_remembered() {
    let (state, _blob) = host().await;
    seeded_game(&state, 0, &[], false).await;
    let second = game_service::create_game(
        &state,
        CreateGameRequest {
            name: "Quiz Night".into(),
            teams: None,
            question_timer_seconds: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(second.teams.team_a, "Team A");
    assert_eq!(second.question_timer_seconds, 30);

    let games = game_service::list_games(&state).await;
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].name, "Quiz Night");

    assert!(game_service::current_user(&state).await.is_none());
    game_service::sign_in(&state, "  ada ").await.unwrap();
    assert_eq!(game_service::current_user(&state).await.as_deref(), Some("ada"));
    assert!(matches!(
        game_service::sign_in(&state, " ").await.unwrap_err(),
        ServiceError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_storage() {
    let (state, blob) = host().await;
    let err = game_service::create_game(
        &state,
        CreateGameRequest {
            name: "   ".into(),
            teams: None,
            question_timer_seconds: Some(601),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(blob.get_raw(DEFAULT_STORAGE_KEY).is_none());
}

#[tokio::test]
async fn full_storage_is_reported_and_nothing_changes() {
    let blob = MemoryBlobStore::new().with_quota(64);
    let state = host_on(Arc::new(blob), HostConfig::default()).await;

    let err = game_service::create_game(
        &state,
        CreateGameRequest {
            name: "Too big to store".into(),
            teams: None,
            question_timer_seconds: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::StorageFull(_)));
    assert!(game_service::list_games(&state).await.is_empty());
}

#[tokio::test]
async fn corrupted_storage_is_kept_aside_before_the_next_save() {
    let raw = r#"{"games": [ {"id":"g1","name":"Precious"} broken"#;
    let blob = MemoryBlobStore::new();
    blob.insert_raw(DEFAULT_STORAGE_KEY, raw);
    let state = host_on(Arc::new(blob.clone()), HostConfig::default()).await;

    let Some(LoadIssue::Corrupted {
        backup_key: Some(backup_key),
        ..
    }) = state.load_issue()
    else {
        panic!("expected a backed up corruption, got {:?}", state.load_issue());
    };
    assert!(game_service::list_games(&state).await.is_empty());

    game_service::sign_in(&state, "ada").await.unwrap();
    assert_eq!(blob.get_raw(backup_key).as_deref(), Some(raw));
}

#[tokio::test]
async fn unreadable_storage_is_never_overwritten_unless_allowed() {
    let store = FaultyStore::default();
    store.inner.insert_raw(DEFAULT_STORAGE_KEY, r#"{"users":["grace"]}"#);
    store.unreadable.store(true, Ordering::SeqCst);
    let state = host_on(Arc::new(store.clone()), HostConfig::default()).await;
    assert!(matches!(state.load_issue(), Some(LoadIssue::Unreadable(_))));

    let err = game_service::sign_in(&state, "ada").await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(StorageError::Protected { .. })));
    assert_eq!(
        store.inner.get_raw(DEFAULT_STORAGE_KEY).as_deref(),
        Some(r#"{"users":["grace"]}"#)
    );

    state.allow_overwrite();
    game_service::sign_in(&state, "ada").await.unwrap();
    assert_eq!(game_service::current_user(&state).await.as_deref(), Some("ada"));
}

#[tokio::test]
async fn legacy_games_keep_their_content_when_others_are_saved() {
    let blob = MemoryBlobStore::new();
    blob.insert_raw(
        DEFAULT_STORAGE_KEY,
        r#"{"games":[{"id":"g1","name":"Old","modes":{
            "jeopardy":[{"id":"q1","category":"Art","question":"Water lilies?","answer":"Monet","points":200}],
            "priceIsRight":[{"id":"p1","item":"Toaster","price":30}]
        }}]}"#,
    );
    let state = host_on(Arc::new(blob.clone()), HostConfig::default()).await;
    assert!(state.load_issue().is_none());

    game_service::create_game(
        &state,
        CreateGameRequest {
            name: "New".into(),
            teams: None,
            question_timer_seconds: None,
        },
    )
    .await
    .unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&blob.get_raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
    let legacy = saved["games"]
        .as_array()
        .unwrap()
        .iter()
        .find(|game| game["id"] == "g1")
        .unwrap();
    assert_eq!(legacy["modes"]["jeopardy"][0]["answer"], "Monet");
    assert_eq!(legacy["modes"]["priceIsRight"][0]["item"], "Toaster");
}

/// Memory store whose reads can fail and whose writes can fail or hang.
#[derive(Clone, Default)]
struct FaultyStore {
    inner: MemoryBlobStore,
    unreadable: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
}

impl BlobStore for FaultyStore {
    fn read(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        if self.unreadable.load(Ordering::SeqCst) {
            let err = std::io::Error::other("bad sector");
            return Box::pin(future::ready(Err(StorageError::unavailable(
                "read failed".into(),
                err,
            ))));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        if self.hanging.load(Ordering::SeqCst) {
            return Box::pin(future::pending());
        }
        if self.failing.load(Ordering::SeqCst) {
            let err = std::io::Error::other("disk unplugged");
            return Box::pin(future::ready(Err(StorageError::unavailable(
                "write failed".into(),
                err,
            ))));
        }
        self.inner.write(key, value)
    }
}

#[tokio::test]
async fn failed_persistence_leaves_the_session_where_it_was() {
    let store = FaultyStore::default();
    let state = host_on(Arc::new(store.clone()), HostConfig::default()).await;
    let game_id = seeded_game(&state, 0, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();
    let revealed = session_service::reveal(&state).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    let err = session_service::award(&state, Team::A).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));

    let unchanged = session_service::snapshot(&state).await.unwrap();
    assert_eq!(unchanged.phase, revealed.phase);
    assert_eq!(unchanged.scores, Scores::default());

    store.failing.store(false, Ordering::SeqCst);
    let done = session_service::award(&state, Team::A).await.unwrap();
    assert_eq!(phase_of(&done), VisibleSessionPhase::RoundComplete);
    assert_eq!(done.scores, Scores::new(100, 0));
}

#[tokio::test(start_paused = true)]
async fn hanging_persistence_times_out() {
    let store = FaultyStore::default();
    let config = HostConfig::from_json(r#"{ "transitionTimeoutMs": 200 }"#).unwrap();
    let state = host_on(Arc::new(store.clone()), config).await;
    let game_id = seeded_game(&state, 0, &[(0, 0)], false).await;
    session_service::start_session(&state, &game_id).await.unwrap();
    session_service::select_cell(&state, 0, 0).await.unwrap();
    session_service::reveal(&state).await.unwrap();

    store.hanging.store(true, Ordering::SeqCst);
    let err = session_service::mark_wrong(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::Timeout));

    store.hanging.store(false, Ordering::SeqCst);
    let snapshot = session_service::snapshot(&state).await.unwrap();
    assert_eq!(phase_of(&snapshot), VisibleSessionPhase::QuestionOpen);
    assert_eq!(snapshot.phase.revealed, Some(true));
}
