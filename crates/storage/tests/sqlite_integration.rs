use quiz_core::model::{Category, CategoryId, Difficulty, Question, QuestionPack};
use quiz_core::time::fixed_now;
use storage::repository::{CategoryRepository, PackRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    SqliteRepository::open(&url).await.expect("open")
}

fn build_pack(name: &str, questions: &[(&str, &str)]) -> QuestionPack {
    let mut pack = QuestionPack::new(name, Difficulty::Hard, 20, fixed_now()).unwrap();
    for (query, answer) in questions {
        pack.push_question(
            Question::new(*query, *answer, ["wrong 1", "wrong 2", "wrong 3"]).unwrap(),
        );
    }
    pack
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_question_order() {
    let repo = connect("memdb_pack_roundtrip").await;

    let category_id = repo
        .save_category(&Category::new("Science").unwrap())
        .await
        .unwrap();

    let mut pack = build_pack(
        "Physics",
        &[("Speed of light?", "c"), ("Unit of force?", "Newton"), ("H2O?", "Water")],
    );
    pack.set_category(Some(category_id));
    let id = repo.save_pack(&pack).await.unwrap();

    let loaded = repo.load_pack("Physics").await.unwrap().expect("stored");
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.difficulty(), Difficulty::Hard);
    assert_eq!(loaded.time_limit_secs(), 20);
    assert_eq!(loaded.category_id(), Some(category_id));
    assert_eq!(loaded.created_at(), fixed_now());

    let queries: Vec<&str> = loaded.questions().iter().map(Question::query).collect();
    assert_eq!(queries, vec!["Speed of light?", "Unit of force?", "H2O?"]);
    assert_eq!(loaded.questions()[1].incorrect_answers()[2], "wrong 3");
}

#[tokio::test]
async fn sqlite_update_replaces_questions_and_detects_conflicts() {
    let repo = connect("memdb_pack_update").await;

    repo.save_pack(&build_pack("History", &[("1066?", "Hastings")]))
        .await
        .unwrap();
    repo.save_pack(&build_pack("Art", &[])).await.unwrap();

    let err = repo
        .save_pack(&build_pack("History", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NameConflict { name } if name == "History"));

    let mut history = repo.load_pack("History").await.unwrap().unwrap();
    history.remove_question(0).unwrap();
    history.push_question(Question::new("1492?", "Columbus", ["a", "b", "c"]).unwrap());
    history.push_question(Question::new("1815?", "Waterloo", ["a", "b", "c"]).unwrap());
    history.set_time_limit_secs(45).unwrap();
    repo.save_pack(&history).await.unwrap();

    let reloaded = repo.load_pack("History").await.unwrap().unwrap();
    assert_eq!(reloaded.question_count(), 2);
    assert_eq!(reloaded.questions()[0].correct_answer(), "Columbus");
    assert_eq!(reloaded.time_limit_secs(), 45);

    let mut art = repo.load_pack("Art").await.unwrap().unwrap();
    art.rename("History").unwrap();
    assert!(matches!(
        repo.save_pack(&art).await.unwrap_err(),
        StorageError::NameConflict { .. }
    ));
}

#[tokio::test]
async fn sqlite_lists_and_deletes_packs() {
    let repo = connect("memdb_pack_list").await;

    repo.save_pack(&build_pack("Zebra facts", &[("Stripes?", "Yes")]))
        .await
        .unwrap();
    repo.save_pack(&build_pack("Astronomy", &[("Closest star?", "Sun"), ("Red planet?", "Mars")]))
        .await
        .unwrap();

    let list = repo.list_packs().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "Astronomy");
    assert_eq!(list[0].question_count, 2);
    assert_eq!(list[1].question_count, 1);

    assert!(repo.pack_exists("Astronomy").await.unwrap());
    repo.delete_pack("Astronomy").await.unwrap();
    assert!(!repo.pack_exists("Astronomy").await.unwrap());
    assert!(matches!(
        repo.delete_pack("Astronomy").await.unwrap_err(),
        StorageError::NotFound
    ));
    assert_eq!(repo.list_packs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_categories_are_unique() {
    let repo = connect("memdb_categories").await;
    repo.save_category(&Category::new("Music").unwrap())
        .await
        .unwrap();
    let err = repo
        .save_category(&Category::new("Music").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NameConflict { .. }));

    let categories = repo.list_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name(), "Music");
}

#[tokio::test]
async fn sqlite_rejects_unknown_category() {
    let repo = connect("memdb_unknown_category").await;

    let mut pack = build_pack("Orphan", &[("Q?", "A")]);
    pack.set_category(Some(CategoryId::new(99)));
    let err = repo.save_pack(&pack).await.unwrap_err();
    assert!(matches!(err, StorageError::UnknownCategory { id } if id == CategoryId::new(99)));
    assert!(!repo.pack_exists("Orphan").await.unwrap());

    pack.set_category(None);
    let id = repo.save_pack(&pack).await.unwrap();

    let mut stored = repo.load_pack("Orphan").await.unwrap().unwrap();
    assert_eq!(stored.id(), Some(id));
    stored.set_category(Some(CategoryId::new(42)));
    assert!(matches!(
        repo.save_pack(&stored).await.unwrap_err(),
        StorageError::UnknownCategory { .. }
    ));
}

#[tokio::test]
async fn sqlite_lists_categories_by_name() {
    let repo = connect("memdb_category_order").await;
    for name in ["Zoology", "Art", "Music"] {
        repo.save_category(&Category::new(name).unwrap())
            .await
            .unwrap();
    }
    let names: Vec<String> = repo
        .list_categories()
        .await
        .unwrap()
        .iter()
        .map(|c| c.name().to_owned())
        .collect();
    assert_eq!(names, vec!["Art", "Music", "Zoology"]);
}
