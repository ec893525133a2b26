#![allow(dead_code)]

use engine::{
    Category, CategoryInput, CredentialHasher, Engine, EngineBuilder, EngineError, Money,
    Operation, OperationInput, RoleSet, User, Wallet, WalletInput, WalletKind,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

/// Reversible stand-in for a real password hash.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plain: &str) -> Result<String, EngineError> {
        Ok(format!("plain${plain}"))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, EngineError> {
        match hash.strip_prefix("plain$") {
            Some(stored) => Ok(stored == plain),
            None => Err(EngineError::Credential("not a plain hash".to_string())),
        }
    }
}

pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_from(Engine::builder()).await
}

pub async fn engine_from(builder: EngineBuilder) -> (Engine, DatabaseConnection) {
    let db = database().await;
    let engine = builder.database(db.clone()).build().await.unwrap();
    (engine, db)
}

pub async fn user(engine: &Engine, email: &str, roles: RoleSet) -> User {
    engine
        .register_user(email, "password", roles, &PlainHasher)
        .await
        .unwrap()
}

pub async fn wallet(engine: &Engine, owner: &User, title: &str, cents: i64) -> Wallet {
    engine
        .save_wallet(WalletInput {
            id: None,
            title: title.to_string(),
            kind: WalletKind::Bank,
            balance: Money::new(cents),
            owner_id: owner.id,
        })
        .await
        .unwrap()
}

pub async fn category(engine: &Engine, author: &User, title: &str) -> Category {
    engine
        .save_category(CategoryInput {
            id: None,
            title: title.to_string(),
            author_id: author.id,
        })
        .await
        .unwrap()
}

pub fn operation_input(
    author: &User,
    wallet: &Wallet,
    category: &Category,
    cents: i64,
    tags: &str,
) -> OperationInput {
    OperationInput {
        id: None,
        title: format!("operation {cents}"),
        amount: Money::new(cents),
        category_id: category.id,
        wallet_id: wallet.id,
        author_id: author.id,
        tags: tags.to_string(),
    }
}

pub async fn operation(
    engine: &Engine,
    author: &User,
    wallet: &Wallet,
    category: &Category,
    cents: i64,
    tags: &str,
) -> Operation {
    engine
        .save_operation(operation_input(author, wallet, category, cents, tags))
        .await
        .unwrap()
}

pub async fn balance(engine: &Engine, wallet: &Wallet) -> i64 {
    engine
        .wallet_by_id(wallet.id)
        .await
        .unwrap()
        .unwrap()
        .balance
        .cents()
}
