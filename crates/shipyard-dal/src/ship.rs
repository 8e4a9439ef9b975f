use futures::{StreamExt as _, TryStreamExt as _};
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Connection as _, Executor, Pool, QueryBuilder};
use time::Date;
use tracing::debug;

use crate::{
    ChosenDB, Error, ListingParams,
    error::Result,
    filter::Predicate,
    validation::{ShipDraft, ShipPatch},
};

pub const VALID_ORDER_FIELDS: &[&str] = &[
    "id",
    "name",
    "planet",
    "ship_type",
    "prod_date",
    "is_used",
    "speed",
    "crew_size",
    "rating",
];

const SHIP_COLUMNS: &str = "id, name, planet, ship_type, prod_date, is_used, speed, crew_size, rating";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipType {
    Transport,
    Military,
    Merchant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Ship {
    pub id: i64,
    pub name: String,
    pub planet: String,
    pub ship_type: ShipType,
    /// Production date, transported as epoch milliseconds (midnight UTC)
    #[serde(with = "epoch_millis")]
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub prod_date: Date,
    pub is_used: bool,
    pub speed: f64,
    pub crew_size: i32,
    pub rating: f64,
}

/// Dates on the wire are milliseconds since unix epoch, as the frontend
/// works with javascript timestamps.
pub mod epoch_millis {
    use serde::{Deserialize as _, Deserializer, Serializer};
    use time::{Date, OffsetDateTime};

    const NANOS_IN_MILLI: i128 = 1_000_000;

    pub fn to_millis(date: Date) -> i64 {
        date.midnight().assume_utc().unix_timestamp() * 1000
    }

    pub fn from_millis(millis: i64) -> Result<Date, time::error::ComponentRange> {
        OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * NANOS_IN_MILLI)
            .map(|dt| dt.date())
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(to_millis(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        from_millis(millis).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize as _, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_some(&super::to_millis(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            Option::<i64>::deserialize(deserializer)?
                .map(super::from_millis)
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

pub type ShipRepository = ShipRepositoryImpl<Pool<ChosenDB>>;

pub struct ShipRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ShipRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, draft: ShipDraft) -> Result<Ship> {
        let result = sqlx::query(
            "INSERT INTO ship (name, planet, ship_type, prod_date, is_used, speed, crew_size, rating)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.name)
        .bind(&draft.planet)
        .bind(draft.ship_type)
        .bind(draft.prod_date)
        .bind(draft.is_used)
        .bind(draft.speed)
        .bind(draft.crew_size)
        .bind(draft.rating)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created ship {id} with rating {}", draft.rating);
        self.get(id).await
    }

    /// Applies partial update to an existing ship.
    ///
    /// Fails with [`Error::RecordNotFound`] if there is no such ship and with
    /// [`Error::InvalidInput`] if any present field of the patch is invalid.
    /// In both cases nothing is written.
    pub async fn update(&self, id: i64, patch: ShipPatch) -> Result<Ship> {
        // write lock up front, concurrent updates wait on busy timeout
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin_with("BEGIN IMMEDIATE").await?;
        let mut ship = get(id, &mut *transaction)
            .await?
            .ok_or_else(|| not_found(id))?;

        patch.apply_to(&mut ship)?;

        sqlx::query(
            "UPDATE ship SET name = ?, planet = ?, ship_type = ?, prod_date = ?, is_used = ?,
            speed = ?, crew_size = ?, rating = ? WHERE id = ?",
        )
        .bind(&ship.name)
        .bind(&ship.planet)
        .bind(ship.ship_type)
        .bind(ship.prod_date)
        .bind(ship.is_used)
        .bind(ship.speed)
        .bind(ship.crew_size)
        .bind(ship.rating)
        .bind(id)
        .execute(&mut *transaction)
        .await?;
        transaction.commit().await?;

        Ok(ship)
    }

    pub async fn count(&self, predicate: &Predicate) -> Result<u64> {
        let mut query = QueryBuilder::<ChosenDB>::new("SELECT count(*) FROM ship");
        predicate.push_where(&mut query);
        let count: i64 = query
            .build_query_scalar()
            .fetch_one(&self.executor)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn list(&self, predicate: &Predicate, params: ListingParams) -> Result<Vec<Ship>> {
        let order = params.ordering(VALID_ORDER_FIELDS)?;
        let mut query = QueryBuilder::<ChosenDB>::new(format!("SELECT {SHIP_COLUMNS} FROM ship"));
        predicate.push_where(&mut query);
        query.push(" ORDER BY ");
        if !order.is_empty() {
            query.push(order).push(", ");
        }
        query
            .push("id LIMIT ")
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        debug!("Listing ships: {}", query.sql());

        let records = query
            .build_query_as::<Ship>()
            .fetch(&self.executor)
            .take(crate::MAX_LIMIT)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(records)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM ship WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(not_found(id))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Ship> {
        get(id, &self.executor).await?.ok_or_else(|| not_found(id))
    }
}

fn not_found(id: i64) -> Error {
    Error::RecordNotFound(format!("Ship {id}"))
}

async fn get<'c, E>(id: i64, executor: E) -> Result<Option<Ship>>
where
    E: Executor<'c, Database = ChosenDB>,
{
    let record = sqlx::query_as::<_, Ship>(&format!("SELECT {SHIP_COLUMNS} FROM ship WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(record)
}
