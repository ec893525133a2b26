mod common;

use common::{category, engine_with_db, operation, user, wallet};
use engine::{
    CategoryInput, EngineError, Money, Permission, RoleSet, Subject, TagInput, WalletInput,
    WalletKind, deny_unless_granted, is_granted,
};

#[tokio::test]
async fn category_titles_are_unique_and_slugged() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let bob = user(&engine, "bob@example.com", RoleSet::regular()).await;

    let eating_out = category(&engine, &alice, "  Eating   Out ").await;
    assert_eq!(eating_out.title, "Eating Out");
    assert_eq!(eating_out.slug, "eating-out");

    let err = engine
        .save_category(CategoryInput {
            id: None,
            title: "eating out".to_string(),
            author_id: bob.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let renamed = engine
        .save_category(CategoryInput {
            id: Some(eating_out.id),
            title: "Restaurants & Bars".to_string(),
            author_id: bob.id,
        })
        .await
        .unwrap();
    assert_eq!(renamed.slug, "restaurants-bars");
    assert_eq!(renamed.author_id, alice.id);

    let found = engine.category_by_title("RESTAURANTS & bars").await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(eating_out.id));
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 100_00).await;
    let food = category(&engine, &alice, "Food").await;
    let spare = category(&engine, &alice, "Spare").await;

    let op = operation(&engine, &alice, &cash, &food, -1_00, "").await;
    assert!(!engine.category_can_be_deleted(food.id).await.unwrap());
    assert!(engine.category_can_be_deleted(spare.id).await.unwrap());

    let err = engine.delete_category(food.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InUse(_)));
    assert!(engine.category_by_id(food.id).await.unwrap().is_some());

    engine.delete_operation(op.id).await.unwrap();
    engine.delete_category(food.id).await.unwrap();
    assert!(engine.category_by_id(food.id).await.unwrap().is_none());
}

#[tokio::test]
async fn categories_page_filters_by_author() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let bob = user(&engine, "bob@example.com", RoleSet::regular()).await;
    category(&engine, &alice, "Food").await;
    category(&engine, &alice, "Rent").await;
    category(&engine, &bob, "Fuel").await;

    assert_eq!(engine.categories_page(1, None).await.unwrap().total_items, 3);
    let mine = engine.categories_page(1, Some(alice.id)).await.unwrap();
    assert_eq!(mine.total_items, 2);
    assert_eq!(mine.items[0].title, "Rent");
}

#[tokio::test]
async fn admin_authored_categories_are_visible_to_everyone() {
    let (engine, _db) = engine_with_db().await;
    let admin = user(&engine, "admin@example.com", RoleSet::admin()).await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let bob = user(&engine, "bob@example.com", RoleSet::regular()).await;
    let shared = category(&engine, &admin, "Shared").await;
    let private = category(&engine, &bob, "Private").await;
    let alice_actor = engine.actor(alice.id).await.unwrap();
    let admin_actor = engine.actor(admin.id).await.unwrap();

    let shared = engine.category_subject(&shared).await.unwrap();
    assert!(is_granted(Permission::View, &shared, alice_actor.as_ref()));
    assert!(!is_granted(Permission::Edit, &shared, alice_actor.as_ref()));

    let private = engine.category_subject(&private).await.unwrap();
    assert!(!is_granted(Permission::View, &private, alice_actor.as_ref()));
    assert!(is_granted(Permission::Delete, &private, admin_actor.as_ref()));
    assert!(!is_granted(Permission::View, &private, None));
}

#[tokio::test]
async fn tags_crud_and_access() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let bob = user(&engine, "bob@example.com", RoleSet::regular()).await;

    let tag = engine
        .save_tag(TagInput {
            id: None,
            title: "Travel".to_string(),
            author_id: alice.id,
        })
        .await
        .unwrap();
    let err = engine
        .save_tag(TagInput {
            id: None,
            title: "TRAVEL".to_string(),
            author_id: bob.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let subject = engine.tag_subject(&tag).await.unwrap();
    let bob_actor = engine.actor(bob.id).await.unwrap();
    assert!(deny_unless_granted(Permission::Edit, &subject, bob_actor.as_ref()).is_err());

    for title in ["alpha", "zulu"] {
        engine.get_or_create_tag(title, bob.id).await.unwrap();
    }
    let page = engine.tags_page(1, None).await.unwrap();
    let titles: Vec<&str> = page.items.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["zulu", "alpha", "Travel"]);
    assert_eq!(engine.tags_page(1, Some(bob.id)).await.unwrap().total_items, 2);

    engine.delete_tag(tag.id).await.unwrap();
    assert!(engine.tag_by_id(tag.id).await.unwrap().is_none());
    assert!(engine.delete_tag(tag.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn wallets_belong_to_their_owner() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let admin = user(&engine, "admin@example.com", RoleSet::admin()).await;
    let cash = wallet(&engine, &alice, "Cash", 12_34).await;

    let subject = Subject::wallet(&cash);
    let alice_actor = engine.actor(alice.id).await.unwrap();
    let admin_actor = engine.actor(admin.id).await.unwrap();
    assert!(is_granted(Permission::Edit, &subject, alice_actor.as_ref()));
    assert!(!is_granted(Permission::View, &subject, admin_actor.as_ref()));

    assert_eq!(engine.wallets_page(1, alice.id).await.unwrap().total_items, 1);
    assert_eq!(engine.wallets_page(1, admin.id).await.unwrap().total_items, 0);
}

#[tokio::test]
async fn opening_balance_is_only_set_on_creation() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 50_00).await;

    let updated = engine
        .save_wallet(WalletInput {
            id: Some(cash.id),
            title: "Pocket".to_string(),
            kind: WalletKind::Cash,
            balance: Money::new(1_000_00),
            owner_id: alice.id,
        })
        .await
        .unwrap();
    assert_eq!(updated.title, "Pocket");
    assert_eq!(updated.kind, WalletKind::Cash);
    assert_eq!(updated.balance, Money::new(50_00));
}

#[tokio::test]
async fn wallet_with_operations_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let alice = user(&engine, "alice@example.com", RoleSet::regular()).await;
    let cash = wallet(&engine, &alice, "Cash", 50_00).await;
    let empty = wallet(&engine, &alice, "Empty", 0).await;
    let food = category(&engine, &alice, "Food").await;
    operation(&engine, &alice, &cash, &food, -1_00, "").await;

    let err = engine.delete_wallet(cash.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InUse(_)));

    engine.delete_wallet(empty.id).await.unwrap();
    assert!(engine.wallet_by_id(empty.id).await.unwrap().is_none());
}
