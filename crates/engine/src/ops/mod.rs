use sea_orm::DatabaseConnection;

use crate::{EngineError, Money, PAGE_SIZE, ResultEngine};

mod categories;
mod operations;
mod reports;
mod tags;
mod users;
mod wallets;

pub use categories::CategoryInput;
pub use operations::OperationInput;
pub use reports::ReportInput;
pub use tags::TagInput;
pub use users::UserInput;
pub use wallets::WalletInput;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    page_size: u64,
    balance_floor: Money,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Items per page used by every listing.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Lowest balance a save may leave on a wallet.
    pub fn balance_floor(&self) -> Money {
        self.balance_floor
    }
}

/// The builder for `Engine`
#[derive(Debug)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    page_size: u64,
    balance_floor: Money,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            page_size: PAGE_SIZE,
            balance_floor: Money::ZERO,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override [`PAGE_SIZE`].
    pub fn page_size(mut self, page_size: u64) -> EngineBuilder {
        self.page_size = page_size;
        self
    }

    pub fn balance_floor(mut self, floor: Money) -> EngineBuilder {
        self.balance_floor = floor;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.page_size == 0 {
            return Err(EngineError::InvalidConfig(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            page_size: self.page_size,
            balance_floor: Money::checked(self.balance_floor.cents())?,
        })
    }
}
