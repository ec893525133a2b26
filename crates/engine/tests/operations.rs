mod common;

use common::{balance, category, engine_from, engine_with_db, operation, operation_input, user, wallet};
use engine::{Engine, EngineError, Money, OperationFilter, RoleSet};
use uuid::Uuid;

#[tokio::test]
async fn snapshot_is_the_balance_right_after_the_save() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let first = operation(&engine, &alice, &cash, &food, -30_00, "").await;
    assert_eq!(first.current_balance, Money::new(70_00));
    assert_eq!(balance(&engine, &cash).await, 70_00);

    let second = operation(&engine, &alice, &cash, &food, 50_00, "").await;
    assert_eq!(second.current_balance, Money::new(120_00));

    // Older snapshots are never recomputed.
    let first = engine.operation_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(first.operation.current_balance, Money::new(70_00));

    engine.delete_operation(first.operation.id).await.unwrap();
    assert_eq!(balance(&engine, &cash).await, 150_00);
    let second = engine.operation_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(second.operation.current_balance, Money::new(120_00));
    assert!(engine.operation_by_id(first.operation.id).await.unwrap().is_none());
}

#[tokio::test]
async fn editing_applies_only_the_difference() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let op = operation(&engine, &alice, &cash, &food, -30_00, "").await;
    let mut input = operation_input(&alice, &cash, &food, -50_00, "");
    input.id = Some(op.id);
    input.title = "Groceries".to_string();
    let edited = engine.save_operation(input).await.unwrap();

    assert_eq!(edited.id, op.id);
    assert_eq!(edited.title, "Groceries");
    assert_eq!(edited.current_balance, Money::new(50_00));
    assert_eq!(edited.created_at, op.created_at);
    assert_eq!(balance(&engine, &cash).await, 50_00);
}

#[tokio::test]
async fn moving_an_operation_reverts_the_old_wallet() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let bank = wallet(&engine, &alice, "Bank", 500_00).await;
    let food = category(&engine, &alice, "Food").await;

    let op = operation(&engine, &alice, &cash, &food, -40_00, "").await;
    let mut input = operation_input(&alice, &bank, &food, -40_00, "");
    input.id = Some(op.id);
    let moved = engine.save_operation(input).await.unwrap();

    assert_eq!(moved.wallet_id, bank.id);
    assert_eq!(moved.current_balance, Money::new(460_00));
    assert_eq!(balance(&engine, &cash).await, 100_00);
    assert_eq!(balance(&engine, &bank).await, 460_00);
}

#[tokio::test]
async fn balance_floor_rejects_overdraw_and_leaves_no_trace() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 10_00).await;
    let food = category(&engine, &alice, "Food").await;

    let err = engine
        .save_operation(operation_input(&alice, &cash, &food, -20_00, "lunch"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(err.field(), Some("amount"));

    assert_eq!(balance(&engine, &cash).await, 10_00);
    let page = engine
        .operations_page(1, &OperationFilter::by_wallet(cash.id))
        .await
        .unwrap();
    assert_eq!(page.total_items, 0);
    assert!(engine.tag_by_title("lunch").await.unwrap().is_none());

    // Exactly reaching the floor is fine.
    let op = operation(&engine, &alice, &cash, &food, -10_00, "").await;
    assert_eq!(op.current_balance, Money::ZERO);
}

#[tokio::test]
async fn balance_floor_applies_to_edits() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let op = operation(&engine, &alice, &cash, &food, -60_00, "").await;
    let mut input = operation_input(&alice, &cash, &food, -120_00, "");
    input.id = Some(op.id);
    let err = engine.save_operation(input).await.unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, &cash).await, 40_00);
}

#[tokio::test]
async fn configured_floor_allows_overdraft() {
    let (engine, _db) = engine_from(Engine::builder().balance_floor(Money::new(-100_00))).await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let card = wallet(&engine, &alice, "Card", 0).await;
    let food = category(&engine, &alice, "Food").await;

    let op = operation(&engine, &alice, &card, &food, -75_00, "").await;
    assert_eq!(op.current_balance, Money::new(-75_00));

    let err = engine
        .save_operation(operation_input(&alice, &card, &food, -30_00, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn deleting_never_checks_the_floor() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 0).await;
    let food = category(&engine, &alice, "Food").await;

    let income = operation(&engine, &alice, &cash, &food, 50_00, "").await;
    operation(&engine, &alice, &cash, &food, -50_00, "").await;

    engine.delete_operation(income.id).await.unwrap();
    assert_eq!(balance(&engine, &cash).await, -50_00);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let err = engine
        .save_operation(operation_input(&alice, &cash, &food, 0, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let mut input = operation_input(&alice, &cash, &food, 10_00, "");
    input.title = "   ".to_string();
    let err = engine.save_operation(input).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
    assert_eq!(err.field(), Some("title"));

    let mut input = operation_input(&alice, &cash, &food, 10_00, "");
    input.category_id = Uuid::new_v4();
    let err = engine.save_operation(input).await.unwrap_err();
    assert!(err.is_not_found());

    let mut input = operation_input(&alice, &cash, &food, 10_00, "");
    input.wallet_id = Uuid::new_v4();
    let err = engine.save_operation(input).await.unwrap_err();
    assert!(err.is_not_found());

    let err = engine.delete_operation(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(balance(&engine, &cash).await, 100_00);
}

#[tokio::test]
async fn tags_are_created_once_per_normalized_title() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let first = operation(&engine, &alice, &cash, &food, -5_00, "Lunch, lunch ,Office").await;
    let second = operation(&engine, &alice, &cash, &food, -5_00, "LUNCH").await;

    let tags = engine.tags_page(1, None).await.unwrap();
    assert_eq!(tags.total_items, 2);

    let first = engine.operation_by_id(first.id).await.unwrap().unwrap();
    let titles: Vec<&str> = first.tags.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Lunch", "Office"]);

    let second = engine.operation_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(second.tags.len(), 1);
    assert_eq!(second.tags[0].id, first.tags[0].id);

    let again = engine.get_or_create_tag(" lunch ", alice.id).await.unwrap();
    assert_eq!(again.id, first.tags[0].id);
    assert_eq!(engine.tags_page(1, None).await.unwrap().total_items, 2);
}

#[tokio::test]
async fn editing_replaces_tag_links() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;

    let op = operation(&engine, &alice, &cash, &food, -5_00, "a, b").await;
    let mut input = operation_input(&alice, &cash, &food, -5_00, "b, c");
    input.id = Some(op.id);
    engine.save_operation(input).await.unwrap();

    let view = engine.operation_by_id(op.id).await.unwrap().unwrap();
    let titles: Vec<&str> = view.tags.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c"]);
    // The unlinked tag itself survives.
    assert!(engine.tag_by_title("a").await.unwrap().is_some());
}

#[tokio::test]
async fn operation_view_carries_its_relations() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;
    let op = operation(&engine, &alice, &cash, &food, -5_00, "x").await;

    let view = engine.operation_by_id(op.id).await.unwrap().unwrap();
    assert_eq!(view.operation, op);
    assert_eq!(view.wallet.id, cash.id);
    assert_eq!(view.wallet.balance, Money::new(95_00));
    assert_eq!(view.category, food);
    assert_eq!(view.author.id, alice.id);
    assert_eq!(view.tags.len(), 1);
}
