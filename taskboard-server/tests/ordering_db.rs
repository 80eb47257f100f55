//! Database-backed ordering, ownership and concurrency tests.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p taskboard-server -- --ignored

use std::time::Duration;

use sqlx::PgPool;
use taskboard_core::{check_dense, Position, RetryPolicy, Transient};
use taskboard_server::db::{
    BoardRepo, Card, CardPatch, CardRepo, Collection, DbError, ListPatch, ListRepo, Store,
    UserRepo,
};
use taskboard_server::models::{Email, Title};
use taskboard_server::{ApiError, StoreConfig};
use uuid::Uuid;

fn store(pool: PgPool) -> Store {
    Store::new(
        pool,
        StoreConfig {
            lock_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default().with_max_attempts(10),
            ..StoreConfig::default()
        },
    )
}

fn pos(value: i64) -> Position {
    Position::new(value).unwrap()
}

fn title(text: &str) -> Title {
    Title::new(text).unwrap()
}

async fn user(store: &Store, email: &str) -> Uuid {
    UserRepo::new(store)
        .create(&Email::new(email).unwrap(), "not-a-real-hash")
        .await
        .unwrap()
        .id
}

/// A board owned by `owner` with one list per entry of `lists`, each holding
/// that many cards named `<list><n>`.
async fn board_with(store: &Store, owner: Uuid, lists: &[(&str, usize)]) -> Vec<(Uuid, Vec<Uuid>)> {
    let board = BoardRepo::new(store).create(owner, title("board")).await.unwrap();
    let mut out = Vec::new();
    for (name, cards) in lists {
        let list = ListRepo::new(store)
            .create(board.id, owner, title(name))
            .await
            .unwrap();
        let mut ids = Vec::new();
        for n in 1..=*cards {
            let card = CardRepo::new(store)
                .create(list.id, owner, title(&format!("{name}{n}")), None)
                .await
                .unwrap();
            ids.push(card.id);
        }
        out.push((list.id, ids));
    }
    out
}

async fn order_of(store: &Store, list_id: Uuid) -> Vec<Uuid> {
    sqlx::query_scalar("SELECT id FROM cards WHERE list_id = $1 ORDER BY position")
        .bind(list_id)
        .fetch_all(store.pool())
        .await
        .unwrap()
}

async fn positions_of(store: &Store, list_id: Uuid) -> Vec<i64> {
    sqlx::query_scalar("SELECT position::BIGINT FROM cards WHERE list_id = $1")
        .bind(list_id)
        .fetch_all(store.pool())
        .await
        .unwrap()
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn create_appends(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("c", 3)]).await;
    let (list_id, cards) = &lists[0];

    assert_eq!(&order_of(&store, *list_id).await, cards);
    assert_eq!(positions_of(&store, *list_id).await.len(), 3);
    assert!(check_dense(positions_of(&store, *list_id).await).is_ok());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn reorder_inside_list(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("c", 4)]).await;
    let (list_id, c) = &lists[0];

    let moved = CardRepo::new(&store)
        .move_to(c[3], owner, *list_id, pos(2))
        .await
        .unwrap();

    assert_eq!(moved.position, 2);
    assert_eq!(order_of(&store, *list_id).await, vec![c[0], c[3], c[1], c[2]]);
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn move_between_lists(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("a", 2), ("b", 3)]).await;
    let (a, a_cards) = &lists[0];
    let (b, b_cards) = &lists[1];

    let moved = CardRepo::new(&store)
        .move_to(a_cards[0], owner, *b, pos(2))
        .await
        .unwrap();

    assert_eq!(moved.list_id, *b);
    assert_eq!(moved.position, 2);
    assert_eq!(order_of(&store, *a).await, vec![a_cards[1]]);
    assert_eq!(
        order_of(&store, *b).await,
        vec![b_cards[0], a_cards[0], b_cards[1], b_cards[2]]
    );
    assert!(check_dense(positions_of(&store, *a).await).is_ok());
    assert!(check_dense(positions_of(&store, *b).await).is_ok());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn move_clamps_past_the_end(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("a", 2), ("b", 3)]).await;
    let (a, a_cards) = &lists[0];
    let (b, _) = &lists[1];
    let repo = CardRepo::new(&store);

    let same = repo.move_to(a_cards[0], owner, *a, pos(50)).await.unwrap();
    assert_eq!(same.position, 2);

    let across = repo.move_to(a_cards[0], owner, *b, pos(50)).await.unwrap();
    assert_eq!(across.position, 4);
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn foreign_or_missing_card_is_not_found(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let intruder = user(&store, "intruder@example.com").await;
    let lists = board_with(&store, owner, &[("a", 1)]).await;
    let intruder_lists = board_with(&store, intruder, &[("x", 0)]).await;
    let (a, a_cards) = &lists[0];
    let repo = CardRepo::new(&store);

    let foreign = repo
        .move_to(a_cards[0], intruder, intruder_lists[0].0, pos(1))
        .await;
    assert!(matches!(foreign, Err(DbError::NotFound { resource: "card", .. })));

    let missing = repo.move_to(Uuid::new_v4(), owner, *a, pos(1)).await;
    assert!(matches!(missing, Err(DbError::NotFound { resource: "card", .. })));

    // Nothing moved.
    assert_eq!(order_of(&store, *a).await, a_cards.clone());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn foreign_destination_is_forbidden(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let other = user(&store, "other@example.com").await;
    let lists = board_with(&store, owner, &[("a", 2)]).await;
    let foreign = board_with(&store, other, &[("x", 1)]).await;
    let (a, a_cards) = &lists[0];

    let result = CardRepo::new(&store)
        .move_to(a_cards[0], owner, foreign[0].0, pos(1))
        .await;
    assert!(matches!(result, Err(DbError::Forbidden { resource: "list", .. })));

    let missing = CardRepo::new(&store)
        .move_to(a_cards[0], owner, Uuid::new_v4(), pos(1))
        .await;
    assert!(matches!(missing, Err(DbError::Forbidden { .. })));

    assert_eq!(order_of(&store, *a).await, a_cards.clone());
    assert_eq!(order_of(&store, foreign[0].0).await, foreign[0].1.clone());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn delete_repacks_siblings(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("c", 4)]).await;
    let (list_id, c) = &lists[0];

    CardRepo::new(&store).delete(c[1], owner).await.unwrap();

    assert_eq!(order_of(&store, *list_id).await, vec![c[0], c[2], c[3]]);
    let mut positions = positions_of(&store, *list_id).await;
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn put_with_list_id_appends_to_new_list(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("a", 2), ("b", 2)]).await;
    let (a, a_cards) = &lists[0];
    let (b, _) = &lists[1];

    let patch = CardPatch {
        title: Some(title("renamed")),
        list_id: Some(*b),
        ..CardPatch::default()
    };
    let card: Card = CardRepo::new(&store)
        .update(a_cards[0], owner, patch)
        .await
        .unwrap();

    assert_eq!(card.title, "renamed");
    assert_eq!(card.list_id, *b);
    assert_eq!(card.position, 3);
    assert!(check_dense(positions_of(&store, *a).await).is_ok());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn lists_reorder_and_move_across_boards(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let first = board_with(&store, owner, &[("l1", 0), ("l2", 0), ("l3", 0)]).await;
    let second = BoardRepo::new(&store).create(owner, title("second")).await.unwrap();
    let repo = ListRepo::new(&store);

    let reordered = repo
        .update(
            first[2].0,
            owner,
            ListPatch {
                order: Some(pos(1)),
                ..ListPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reordered.position, 1);

    let moved = repo.move_to(first[0].0, owner, second.id, pos(1)).await.unwrap();
    assert_eq!(moved.board_id, second.id);
    assert_eq!(moved.position, 1);

    let board_id: Uuid = sqlx::query_scalar("SELECT board_id FROM lists WHERE id = $1")
        .bind(first[1].0)
        .fetch_one(store.pool())
        .await
        .unwrap();
    let remaining: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT id, position FROM lists WHERE board_id = $1 ORDER BY position")
            .bind(board_id)
            .fetch_all(store.pool())
            .await
            .unwrap();
    assert_eq!(remaining, vec![(first[2].0, 1), (first[1].0, 2)]);

    let tree = BoardRepo::new(&store)
        .get_tree(second.id, owner)
        .await
        .unwrap();
    assert_eq!(tree.lists.len(), 1);
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn concurrent_moves_stay_dense(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("a", 6), ("b", 6)]).await;
    let (a, a_cards) = lists[0].clone();
    let (b, b_cards) = lists[1].clone();

    let mut handles = Vec::new();
    for (i, card) in a_cards.iter().chain(b_cards.iter()).copied().enumerate() {
        let store = store.clone();
        let to = if i % 2 == 0 { a } else { b };
        let at = pos((i as i64 * 5) % 7 + 1);
        handles.push(tokio::spawn(async move {
            CardRepo::new(&store).move_to(card, owner, to, at).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let in_a = positions_of(&store, a).await;
    let in_b = positions_of(&store, b).await;
    assert_eq!(in_a.len() + in_b.len(), 12);
    assert!(check_dense(in_a).is_ok());
    assert!(check_dense(in_b).is_ok());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn held_parent_lock_gives_up_as_transient(pool: PgPool) {
    let seed = store(pool.clone());
    let owner = user(&seed, "owner@example.com").await;
    let lists = board_with(&seed, owner, &[("c", 3)]).await;
    let (list_id, c) = &lists[0];

    let impatient = Store::new(
        pool,
        StoreConfig {
            lock_timeout: Duration::from_millis(100),
            retry: RetryPolicy::default().with_max_attempts(2),
            ..StoreConfig::default()
        },
    );

    let mut holder = impatient.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM lists WHERE id = $1 FOR UPDATE")
        .bind(list_id)
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = CardRepo::new(&impatient)
        .move_to(c[2], owner, *list_id, pos(1))
        .await
        .unwrap_err();
    assert!(err.is_transient(), "{err:?}");
    assert!(matches!(ApiError::from(err), ApiError::Transient));

    holder.rollback().await.unwrap();
    assert_eq!(&order_of(&impatient, *list_id).await, c);
    assert!(check_dense(positions_of(&impatient, *list_id).await).is_ok());
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn tree_reads_past_a_held_lock(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("a", 2), ("b", 1)]).await;
    let board_id: Uuid = sqlx::query_scalar("SELECT board_id FROM lists WHERE id = $1")
        .bind(lists[0].0)
        .fetch_one(store.pool())
        .await
        .unwrap();

    // An open writer has moved a card but not committed yet.
    let mut writer = store.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM lists WHERE board_id = $1 ORDER BY id FOR UPDATE")
        .bind(board_id)
        .execute(&mut *writer)
        .await
        .unwrap();
    sqlx::query("UPDATE cards SET list_id = $2, position = 2 WHERE id = $1")
        .bind(lists[0].1[1])
        .bind(lists[1].0)
        .execute(&mut *writer)
        .await
        .unwrap();

    let tree = BoardRepo::new(&store).get_tree(board_id, owner).await.unwrap();
    writer.rollback().await.unwrap();

    let seen: Vec<Vec<Uuid>> = tree
        .lists
        .iter()
        .map(|entry| entry.cards.iter().map(|card| card.id).collect())
        .collect();
    assert_eq!(seen, vec![lists[0].1.clone(), lists[1].1.clone()]);
}

#[sqlx::test(migrator = "taskboard_server::MIGRATOR")]
#[ignore = "requires database"]
async fn audit_finds_and_repairs_gaps(pool: PgPool) {
    let store = store(pool);
    let owner = user(&store, "owner@example.com").await;
    let lists = board_with(&store, owner, &[("c", 3)]).await;
    let (list_id, c) = &lists[0];

    // Legacy data: positions 1, 5, 9.
    for (card, position) in c.iter().zip([1, 5, 9]) {
        sqlx::query("UPDATE cards SET position = $2 WHERE id = $1")
            .bind(card)
            .bind(position)
            .execute(store.pool())
            .await
            .unwrap();
    }

    let reports = store.audit(Collection::Cards).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].parent, *list_id);
    assert_eq!(reports[0].children, 3);

    let changed = store.repair(Collection::Cards, *list_id).await.unwrap();
    assert_eq!(changed, 2);
    assert_eq!(order_of(&store, *list_id).await, c.clone());
    assert!(store.audit(Collection::Cards).await.unwrap().is_empty());
}
