use friendbook_core::db::open_db_in_memory;
use friendbook_core::{
    transaction_friends, FriendRepository, FriendService, FriendValidationError, NewFriend,
    RepoError, SqliteFriendRepository,
};
use rusqlite::Connection;

const REJECT_BOB_TRIGGER: &str = "CREATE TRIGGER reject_bob
    BEFORE INSERT ON friends
    WHEN json_extract(NEW.body, '$.name') = 'Bob'
    BEGIN
        SELECT RAISE(ABORT, 'simulated store failure');
    END;";

#[test]
fn perform_transaction_inserts_both_records() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    let mut service = FriendService::new(repo);

    service.perform_transaction().unwrap();

    assert_eq!(service.count_friends().unwrap(), 2);
    let alice = service.friends_named("Alice").unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].age, 25);
    assert_eq!(alice[0].city.as_deref(), Some("New York"));
    let bob = service.friends_named("Bob").unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].age, 22);
    assert_eq!(bob[0].city.as_deref(), Some("London"));
}

#[test]
fn store_failure_mid_transaction_leaves_neither_record() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(REJECT_BOB_TRIGGER).unwrap();

    {
        let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
        let mut service = FriendService::new(repo);

        let err = service.perform_transaction().unwrap_err();
        assert!(matches!(err, RepoError::Db(_)));
        assert!(err.to_string().contains("simulated store failure"));

        assert_eq!(service.count_friends().unwrap(), 0);
        assert!(service.friends_named("Alice").unwrap().is_empty());
    }

    assert!(!in_transaction(&conn));
}

#[test]
fn invalid_record_rolls_back_earlier_inserts_in_batch() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    let existing = repo.create_friend(&NewFriend::new("Peter Jones", 40)).unwrap();

    let err = repo
        .insert_friends(&[NewFriend::new("Alice", 25), NewFriend::new("", 22)])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(FriendValidationError::EmptyName)
    ));

    assert_eq!(repo.count_friends().unwrap(), 1);
    assert!(repo.get_friend(existing).unwrap().is_some());
    assert!(repo.friends_named("Alice").unwrap().is_empty());
}

#[test]
fn transaction_succeeds_after_failure_is_removed() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(REJECT_BOB_TRIGGER).unwrap();
    {
        let repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
        let mut service = FriendService::new(repo);
        assert!(service.perform_transaction().is_err());
    }

    conn.execute_batch("DROP TRIGGER reject_bob;").unwrap();
    let mut repo = SqliteFriendRepository::try_new(&mut conn).unwrap();
    let ids = repo.insert_friends(&transaction_friends()).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);
    assert_eq!(repo.count_friends().unwrap(), 2);
}

#[test]
fn empty_batch_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteFriendRepository::try_new(&mut conn).unwrap();

    assert!(repo.insert_friends(&[]).unwrap().is_empty());
    assert_eq!(repo.count_friends().unwrap(), 0);
}

fn in_transaction(conn: &Connection) -> bool {
    !conn.is_autocommit()
}
