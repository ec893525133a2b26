use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Query,
};

use crate::{
    Actor, CredentialHasher, EngineError, Money, Page, ResultEngine, RoleSet, User, categories,
    operation_tags, operations, pagination::fetch_page, reports, tags, users,
    util::normalize_email, wallets,
};

use super::{Engine, wallets::shift_wallet_balance, with_tx};

/// Profile fields of a user. Passwords are set through
/// [`Engine::register_user`] and [`Engine::change_password`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInput {
    pub id: Option<Uuid>,
    pub email: String,
    pub roles: RoleSet,
}

impl Engine {
    /// Create a user with a hashed password.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        roles: RoleSet,
        hasher: &dyn CredentialHasher,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(EngineError::Credential(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = hasher.hash(password)?;

        with_tx!(self, |db_tx| {
            ensure_email_free(&db_tx, &email, None).await?;
            let model = insert_user(&db_tx, email, &roles, password_hash).await?;
            tracing::info!(user = %model.id, roles = %model.roles, "user registered");
            User::try_from(model)
        })
    }

    /// Create or update a user profile.
    ///
    /// A user created here has no password and cannot sign in until
    /// [`Engine::change_password`] sets one.
    pub async fn save_user(&self, input: UserInput) -> ResultEngine<User> {
        let email = normalize_email(&input.email)?;
        with_tx!(self, |db_tx| {
            ensure_email_free(&db_tx, &email, input.id).await?;
            let model = match input.id {
                Some(id) => {
                    let mut active: users::ActiveModel =
                        require_user_model(&db_tx, id).await?.into();
                    active.email = ActiveValue::Set(email);
                    active.roles = ActiveValue::Set(input.roles.to_stored_json());
                    active.updated_at = ActiveValue::Set(Utc::now());
                    active.update(&db_tx).await?
                }
                None => insert_user(&db_tx, email, &input.roles, String::new()).await?,
            };
            User::try_from(model)
        })
    }

    /// Replace the stored roles of a user.
    pub async fn set_user_roles(&self, user_id: Uuid, roles: RoleSet) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let mut active: users::ActiveModel =
                require_user_model(&db_tx, user_id).await?.into();
            active.roles = ActiveValue::Set(roles.to_stored_json());
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            tracing::info!(user = %model.id, roles = %model.roles, "roles updated");
            User::try_from(model)
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        password: &str,
        hasher: &dyn CredentialHasher,
    ) -> ResultEngine<()> {
        if password.is_empty() {
            return Err(EngineError::Credential(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = hasher.hash(password)?;
        with_tx!(self, |db_tx| {
            let mut active: users::ActiveModel =
                require_user_model(&db_tx, user_id).await?.into();
            active.password_hash = ActiveValue::Set(password_hash);
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// The actor for `email` when `password` matches, `None` otherwise.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
        hasher: &dyn CredentialHasher,
    ) -> ResultEngine<Option<Actor>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        let Some(model) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        if model.password_hash.is_empty() || !hasher.verify(password, &model.password_hash)? {
            tracing::debug!(user = %model.id, "credentials rejected");
            return Ok(None);
        }
        let user = User::try_from(model)?;
        Ok(Some(Actor::from(&user)))
    }

    /// Resolve the actor for an authenticated user id.
    pub async fn actor(&self, user_id: Uuid) -> ResultEngine<Option<Actor>> {
        Ok(self.user_by_id(user_id).await?.as_ref().map(Actor::from))
    }

    pub async fn users_page(&self, page: u64) -> ResultEngine<Page<User>> {
        let select = users::Entity::find()
            .order_by_desc(users::Column::UpdatedAt)
            .order_by_desc(users::Column::Id);
        fetch_page(&self.database, select, page, self.page_size)
            .await?
            .try_map(User::try_from)
    }

    pub async fn user_by_id(&self, user_id: Uuid) -> ResultEngine<Option<User>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Delete a user and everything they own, in one transaction.
    ///
    /// Order:
    /// 1. operations the user authored or that are booked on the user's
    ///    wallets; wallets of other users get the amounts reverted;
    /// 2. the user's reports;
    /// 3. the user's tags and categories. One still used by an operation of
    ///    someone else is handed over to the author of the oldest such
    ///    operation instead of being deleted;
    /// 4. the user's wallets, then the user.
    ///
    /// Nothing is deleted when any step fails.
    pub async fn delete_user(&self, user_id: Uuid) -> ResultEngine<()> {
        let id = user_id.to_string();
        with_tx!(self, |db_tx| {
            require_user_model(&db_tx, user_id).await?;

            let wallet_ids: Vec<String> = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(id.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|w| w.id)
                .collect();
            let own_wallets: HashSet<&str> = wallet_ids.iter().map(String::as_str).collect();

            let doomed = operations::Entity::find()
                .filter(
                    Condition::any()
                        .add(operations::Column::AuthorId.eq(id.clone()))
                        .add(operations::Column::WalletId.is_in(wallet_ids.clone())),
                )
                .all(&db_tx)
                .await?;
            for operation in doomed.iter() {
                if !own_wallets.contains(operation.wallet_id.as_str()) {
                    shift_wallet_balance(
                        &db_tx,
                        &operation.wallet_id,
                        -Money::new(operation.amount),
                        None,
                    )
                    .await?;
                }
            }
            let operation_ids: Vec<String> = doomed.into_iter().map(|o| o.id).collect();
            operation_tags::Entity::delete_many()
                .filter(operation_tags::Column::OperationId.is_in(operation_ids.clone()))
                .exec(&db_tx)
                .await?;
            let removed_operations = operations::Entity::delete_many()
                .filter(operations::Column::Id.is_in(operation_ids))
                .exec(&db_tx)
                .await?
                .rows_affected;

            reports::Entity::delete_many()
                .filter(reports::Column::AuthorId.eq(id.clone()))
                .exec(&db_tx)
                .await?;

            let mut dropped_tags = Vec::new();
            let mut handed_over = 0u64;
            for tag in tags::Entity::find()
                .filter(tags::Column::AuthorId.eq(id.clone()))
                .all(&db_tx)
                .await?
            {
                let user_of = operations::Entity::find()
                    .filter(
                        operations::Column::Id.in_subquery(
                            Query::select()
                                .column(operation_tags::Column::OperationId)
                                .from(operation_tags::Entity)
                                .and_where(operation_tags::Column::TagId.eq(tag.id.clone()))
                                .to_owned(),
                        ),
                    )
                    .order_by_asc(operations::Column::CreatedAt)
                    .order_by_asc(operations::Column::Id)
                    .one(&db_tx)
                    .await?;
                match user_of {
                    Some(operation) => {
                        let mut active: tags::ActiveModel = tag.into();
                        active.author_id = ActiveValue::Set(operation.author_id);
                        active.update(&db_tx).await?;
                        handed_over += 1;
                    }
                    None => dropped_tags.push(tag.id),
                }
            }
            tags::Entity::delete_many()
                .filter(tags::Column::Id.is_in(dropped_tags))
                .exec(&db_tx)
                .await?;

            let mut dropped_categories = Vec::new();
            for category in categories::Entity::find()
                .filter(categories::Column::AuthorId.eq(id.clone()))
                .all(&db_tx)
                .await?
            {
                let user_of = operations::Entity::find()
                    .filter(operations::Column::CategoryId.eq(category.id.clone()))
                    .order_by_asc(operations::Column::CreatedAt)
                    .order_by_asc(operations::Column::Id)
                    .one(&db_tx)
                    .await?;
                match user_of {
                    Some(operation) => {
                        let mut active: categories::ActiveModel = category.into();
                        active.author_id = ActiveValue::Set(operation.author_id);
                        active.update(&db_tx).await?;
                        handed_over += 1;
                    }
                    None => dropped_categories.push(category.id),
                }
            }
            categories::Entity::delete_many()
                .filter(categories::Column::Id.is_in(dropped_categories))
                .exec(&db_tx)
                .await?;

            wallets::Entity::delete_many()
                .filter(wallets::Column::Id.is_in(wallet_ids))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(id.clone()).exec(&db_tx).await?;

            tracing::info!(
                user = %id,
                operations = removed_operations,
                handed_over,
                "user deleted"
            );
            Ok(())
        })
    }
}

async fn require_user_model<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> ResultEngine<users::Model> {
    users::Entity::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
}

async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<Uuid>,
) -> ResultEngine<()> {
    let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(users::Column::Id.ne(id.to_string()));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(email.to_string()));
    }
    Ok(())
}

async fn insert_user<C: ConnectionTrait>(
    db: &C,
    email: String,
    roles: &RoleSet,
    password_hash: String,
) -> ResultEngine<users::Model> {
    let now = Utc::now();
    let model = users::ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        email: ActiveValue::Set(email),
        roles: ActiveValue::Set(roles.to_stored_json()),
        password_hash: ActiveValue::Set(password_hash),
        created_at: ActiveValue::Set(now),
        updated_at: ActiveValue::Set(now),
    }
    .insert(db)
    .await?;
    Ok(model)
}
