use friendbook_core::db::open_db_in_memory;
use friendbook_core::{
    FriendChanges, FriendRepository, FriendValidationError, NewFriend, RepoError,
    SqliteFriendRepository,
};
use rusqlite::params;

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    for input in [
        NewFriend::new("John Doe", 30),
        NewFriend::new("John Doe", 18).with_city("Austin"),
    ] {
        let id = repo.create_friend(&input).unwrap();
        let loaded = repo.get_friend(id).unwrap().unwrap();
        assert_eq!(loaded, input.clone().into_friend(id));
    }
}

#[test]
fn identifiers_are_unique_and_not_reused_after_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    let first = repo.create_friend(&NewFriend::new("Jane Smith", 25)).unwrap();
    let second = repo.create_friend(&NewFriend::new("Peter Jones", 40)).unwrap();
    assert_ne!(first, second);

    repo.delete_friend(second).unwrap();
    let third = repo.create_friend(&NewFriend::new("Peter Jones", 40)).unwrap();
    assert!(third > second);
}

#[test]
fn get_missing_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    assert!(repo.get_friend(42).unwrap().is_none());
}

#[test]
fn update_changes_only_given_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    let id = repo
        .create_friend(&NewFriend::new("John Doe", 30).with_city("Austin"))
        .unwrap();
    let updated = repo.update_friend(id, &FriendChanges::age(31)).unwrap();
    assert_eq!(updated, 1);

    let loaded = repo.get_friend(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, "John Doe");
    assert_eq!(loaded.age, 31);
    assert_eq!(loaded.city.as_deref(), Some("Austin"));
}

#[test]
fn update_can_set_and_clear_city() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    let id = repo.create_friend(&NewFriend::new("Jane Smith", 25)).unwrap();

    let set_city = FriendChanges {
        city: Some(Some("London".to_string())),
        ..FriendChanges::default()
    };
    assert_eq!(repo.update_friend(id, &set_city).unwrap(), 1);
    assert_eq!(
        repo.get_friend(id).unwrap().unwrap().city.as_deref(),
        Some("London")
    );

    let clear_city = FriendChanges {
        city: Some(None),
        ..FriendChanges::default()
    };
    assert_eq!(repo.update_friend(id, &clear_city).unwrap(), 1);
    let loaded = repo.get_friend(id).unwrap().unwrap();
    assert_eq!(loaded.city, None);
    assert_eq!(loaded.age, 25);
}

#[test]
fn update_missing_returns_zero_without_error() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    assert_eq!(repo.update_friend(7, &FriendChanges::age(31)).unwrap(), 0);
    assert_eq!(repo.count_friends().unwrap(), 0);
}

#[test]
fn delete_removes_record_and_is_silent_when_absent() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    let id = repo.create_friend(&NewFriend::new("Jane Smith", 25)).unwrap();
    repo.delete_friend(id).unwrap();
    assert!(repo.get_friend(id).unwrap().is_none());

    repo.delete_friend(id).unwrap();
    repo.delete_friend(9_999).unwrap();
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    let err = repo.create_friend(&NewFriend::new("   ", 30)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(FriendValidationError::EmptyName)
    ));

    let id = repo.create_friend(&NewFriend::new("John Doe", 30)).unwrap();
    let err = repo
        .update_friend(id, &FriendChanges::age(-1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(FriendValidationError::NegativeAge(-1))
    ));

    assert_eq!(repo.get_friend(id).unwrap().unwrap().age, 30);
    assert_eq!(repo.count_friends().unwrap(), 1);
}

#[test]
fn clear_removes_every_record() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    repo.create_friend(&NewFriend::new("John Doe", 30)).unwrap();
    repo.create_friend(&NewFriend::new("Jane Smith", 25)).unwrap();

    assert_eq!(repo.clear_friends().unwrap(), 2);
    assert_eq!(repo.count_friends().unwrap(), 0);
    assert_eq!(repo.clear_friends().unwrap(), 0);
}

#[test]
fn corrupted_body_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO friends (id, body) VALUES (?1, ?2);",
        params![5, r#"{"name":"John Doe"}"#],
    )
    .unwrap();

    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    let err = repo.get_friend(5).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("friends.id=5")));
}

#[test]
fn friend_serializes_without_absent_city() {
    let friend = NewFriend::new("John Doe", 31).into_friend(1);
    assert_eq!(
        serde_json::to_string(&friend).unwrap(),
        r#"{"id":1,"name":"John Doe","age":31}"#
    );

    let with_city = NewFriend::new("John Doe", 18).with_city("Austin").into_friend(4);
    assert_eq!(
        serde_json::to_string(&with_city).unwrap(),
        r#"{"id":4,"name":"John Doe","age":18,"city":"Austin"}"#
    );
}

#[test]
fn list_returns_all_records_in_identifier_order() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    assert!(repo.list_friends().unwrap().is_empty());

    let peter = repo.create_friend(&NewFriend::new("Peter Jones", 40)).unwrap();
    let jane = repo.create_friend(&NewFriend::new("Jane Smith", 25)).unwrap();

    let ids: Vec<_> = repo
        .list_friends()
        .unwrap()
        .into_iter()
        .map(|friend| friend.id)
        .collect();
    assert_eq!(ids, vec![peter, jane]);
}
