pub mod error;
pub mod filter;
pub mod rating;
pub mod ship;
pub mod validation;

use std::str::FromStr;

pub use error::Error;
pub use filter::{Clause, Predicate, ShipFilter};
pub use rating::calculate_rating;
pub use ship::{Ship, ShipRepository, ShipRepositoryImpl, ShipType};
pub use sqlx::Error as SqlxError;
pub use validation::{is_id_valid, CreateShip, ShipDraft, ShipPatch};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const MAX_LIMIT: usize = 10_000;

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates or upgrades the schema.
pub async fn migrate(pool: &Pool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ListingParams {
    pub offset: i64,
    pub limit: i64,
    /// Columns to sort by, ascending
    pub order: Option<Vec<String>>,
}

impl Default for ListingParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_LIMIT as i64,
            order: None,
        }
    }
}

impl ListingParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            order: None,
        }
    }
    pub fn with_order(mut self, order: Vec<String>) -> Self {
        self.order = Some(order);
        self
    }

    /// Renders the ORDER BY list, rejecting fields not in `valid_fields`.
    pub fn ordering(&self, valid_fields: &[&str]) -> Result<String> {
        let ordering = self
            .order
            .as_ref()
            .map(|o| {
                o.iter()
                    .map(|field| {
                        if valid_fields.contains(&field.as_str()) {
                            Ok(field.clone())
                        } else {
                            Err(Error::InvalidOrderByField(field.clone()))
                        }
                    })
                    .collect::<Result<Vec<String>>>()
                    .map(|o| o.join(", "))
            })
            .transpose()?
            .unwrap_or_default();
        Ok(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let params = ListingParams::new(0, 10)
            .with_order(vec!["speed".to_string(), "id".to_string()]);
        let ordering = params.ordering(&["id", "speed"]).unwrap();
        assert_eq!(ordering, "speed, id");

        let params = ListingParams::new(0, 10).with_order(vec!["secret".to_string()]);
        assert!(matches!(
            params.ordering(&["id"]),
            Err(Error::InvalidOrderByField(f)) if f == "secret"
        ));

        assert_eq!(ListingParams::default().ordering(&["id"]).unwrap(), "");
    }
}
