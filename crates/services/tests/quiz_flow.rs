use std::time::Duration;

use quiz_core::model::{Difficulty, Question};
use quiz_core::time::fixed_clock;
use services::{AppServices, OptionMark, PlayerOptions, SessionState};

async fn services_with_pack(db: &str, time_limit: u32) -> AppServices {
    let url = format!("sqlite:file:{db}?mode=memory&cache=shared");
    let services = AppServices::new_sqlite(&url, fixed_clock())
        .await
        .expect("open sqlite");
    let packs = services.pack_service();
    packs
        .create_pack("Rivers", Difficulty::Medium, time_limit, None)
        .await
        .expect("create pack");
    for (query, answer) in [("Longest river?", "Nile"), ("River through Paris?", "Seine")] {
        packs
            .add_question(
                "Rivers",
                Question::new(query, answer, ["Danube", "Thames", "Volga"]).unwrap(),
            )
            .await
            .unwrap();
    }
    services
}

#[tokio::test]
async fn stored_pack_plays_to_the_end() {
    let services = services_with_pack("memdb_quiz_flow_play", 30).await;
    assert!(services.seeded_default());

    let player = services
        .start_quiz("Rivers", PlayerOptions::default())
        .await
        .expect("start");
    // The database pool keeps real-time deadlines; only the countdown runs on
    // the paused clock.
    tokio::time::pause();

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let snap = player.snapshot();
    assert_eq!(snap.remaining_secs, 25);
    let right = snap.options.iter().find(|o| o.is_correct()).unwrap().id();
    assert!(player.submit_answer(right));
    assert!(player.advance());

    tokio::time::sleep(Duration::from_millis(30_500)).await;
    let snap = player.snapshot();
    assert_eq!(snap.state, SessionState::Revealed);
    assert_eq!(
        snap.options
            .iter()
            .filter(|o| o.mark() == OptionMark::Correct)
            .count(),
        1
    );
    assert!(player.advance());

    let result = player.result().expect("finished");
    assert_eq!(result.to_string(), "Score: 1/2 (50.0%)");
}

#[tokio::test]
async fn later_edits_do_not_change_a_running_quiz() {
    let services = services_with_pack("memdb_quiz_flow_edit", 10).await;
    let player = services
        .start_quiz("Rivers", PlayerOptions::default())
        .await
        .expect("start");

    services
        .pack_service()
        .remove_question("Rivers", 1)
        .await
        .unwrap();

    assert_eq!(player.snapshot().total_questions, 2);
    let result = player.end();
    assert_eq!((result.correct, result.total), (0, 2));
    assert_eq!(player.state(), SessionState::Finished);
}
