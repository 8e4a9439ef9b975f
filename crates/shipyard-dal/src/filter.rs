//! Composable filtering of ships.
//!
//! Every group of query parameters contributes at most one [`Clause`],
//! absent parameters contribute nothing. Resulting [`Predicate`] is a
//! conjunction of all clauses, it can be evaluated against a [`Ship`] or
//! rendered into SQL `WHERE` for the repository.

use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use time::Date;

use crate::{
    ChosenDB,
    ship::{Ship, ShipType, epoch_millis},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Planet,
    ShipType,
    ProdDate,
    IsUsed,
    Speed,
    CrewSize,
    Rating,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Planet => "planet",
            Field::ShipType => "ship_type",
            Field::ProdDate => "prod_date",
            Field::IsUsed => "is_used",
            Field::Speed => "speed",
            Field::CrewSize => "crew_size",
            Field::Rating => "rating",
        }
    }

    fn value_of(&self, ship: &Ship) -> Value {
        match self {
            Field::Name => Value::Text(ship.name.clone()),
            Field::Planet => Value::Text(ship.planet.clone()),
            Field::ShipType => Value::ShipType(ship.ship_type),
            Field::ProdDate => Value::Date(ship.prod_date),
            Field::IsUsed => Value::Bool(ship.is_used),
            Field::Speed => Value::Real(ship.speed),
            Field::CrewSize => Value::Integer(ship.crew_size.into()),
            Field::Rating => Value::Real(ship.rating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Date(Date),
    ShipType(ShipType),
}

impl Value {
    fn push_bind(&self, query: &mut QueryBuilder<'_, ChosenDB>) {
        match self {
            Value::Text(v) => query.push_bind(v.clone()),
            Value::Integer(v) => query.push_bind(*v),
            Value::Real(v) => query.push_bind(*v),
            Value::Bool(v) => query.push_bind(*v),
            Value::Date(v) => query.push_bind(*v),
            Value::ShipType(v) => query.push_bind(*v),
        };
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Value::Date(v)
    }
}

impl From<ShipType> for Value {
    fn from(v: ShipType) -> Self {
        Value::ShipType(v)
    }
}

/// Inclusive bounds of a range clause
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    AtLeast(Value),
    AtMost(Value),
    Between(Value, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Case sensitive substring match
    Contains(Field, String),
    Equals(Field, Value),
    InRange(Field, Bounds),
}

impl Clause {
    pub fn contains(field: Field, pattern: Option<&str>) -> Option<Self> {
        pattern.map(|p| Clause::Contains(field, p.to_string()))
    }

    pub fn equals<V: Into<Value>>(field: Field, value: Option<V>) -> Option<Self> {
        value.map(|v| Clause::Equals(field, v.into()))
    }

    /// One sided comparison if only one bound is given, closed interval
    /// for both, no clause for none.
    pub fn in_range<V: Into<Value>>(field: Field, min: Option<V>, max: Option<V>) -> Option<Self> {
        let bounds = match (min, max) {
            (None, None) => return None,
            (Some(min), None) => Bounds::AtLeast(min.into()),
            (None, Some(max)) => Bounds::AtMost(max.into()),
            (Some(min), Some(max)) => Bounds::Between(min.into(), max.into()),
        };
        Some(Clause::InRange(field, bounds))
    }

    pub fn matches(&self, ship: &Ship) -> bool {
        match self {
            Clause::Contains(field, pattern) => match field.value_of(ship) {
                Value::Text(text) => text.contains(pattern.as_str()),
                _ => false,
            },
            Clause::Equals(field, value) => field.value_of(ship) == *value,
            Clause::InRange(field, bounds) => {
                let actual = field.value_of(ship);
                match bounds {
                    Bounds::AtLeast(min) => actual >= *min,
                    Bounds::AtMost(max) => actual <= *max,
                    Bounds::Between(min, max) => actual >= *min && actual <= *max,
                }
            }
        }
    }

    fn push_sql(&self, query: &mut QueryBuilder<'_, ChosenDB>) {
        match self {
            Clause::Contains(field, pattern) => {
                // instr, unlike LIKE, is case sensitive and has no wildcards
                query.push(format!("instr({}, ", field.column()));
                query.push_bind(pattern.clone());
                query.push(") > 0");
            }
            Clause::Equals(field, value) => {
                query.push(format!("{} = ", field.column()));
                value.push_bind(query);
            }
            Clause::InRange(field, bounds) => match bounds {
                Bounds::AtLeast(min) => {
                    query.push(format!("{} >= ", field.column()));
                    min.push_bind(query);
                }
                Bounds::AtMost(max) => {
                    query.push(format!("{} <= ", field.column()));
                    max.push_bind(query);
                }
                Bounds::Between(min, max) => {
                    query.push(format!("{} BETWEEN ", field.column()));
                    min.push_bind(query);
                    query.push(" AND ");
                    max.push_bind(query);
                }
            },
        }
    }
}

/// Conjunction of clauses, empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Option<Clause>) -> Self {
        self.clauses.extend(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, ship: &Ship) -> bool {
        self.clauses.iter().all(|c| c.matches(ship))
    }

    /// Appends ` WHERE ...` to the query, nothing for empty predicate.
    pub fn push_where(&self, query: &mut QueryBuilder<'_, ChosenDB>) {
        for (i, clause) in self.clauses.iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            clause.push_sql(query);
        }
    }
}

impl FromIterator<Option<Clause>> for Predicate {
    fn from_iter<T: IntoIterator<Item = Option<Clause>>>(iter: T) -> Self {
        iter.into_iter().fold(Predicate::all(), Predicate::and)
    }
}

/// Listing filter as received in query string, all parameters are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct ShipFilter {
    /// Part of the name
    pub name: Option<String>,
    /// Part of the planet name
    pub planet: Option<String>,
    #[serde(alias = "type")]
    pub ship_type: Option<ShipType>,
    /// Produced on or after this day, epoch milliseconds
    #[serde(default, with = "epoch_millis::option")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<i64>))]
    pub after: Option<Date>,
    /// Produced on or before this day, epoch milliseconds
    #[serde(default, with = "epoch_millis::option")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<i64>))]
    pub before: Option<Date>,
    pub is_used: Option<bool>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub min_crew_size: Option<i32>,
    pub max_crew_size: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

impl ShipFilter {
    pub fn predicate(&self) -> Predicate {
        [
            Clause::contains(Field::Name, self.name.as_deref()),
            Clause::contains(Field::Planet, self.planet.as_deref()),
            Clause::equals(Field::ShipType, self.ship_type),
            Clause::in_range(Field::ProdDate, self.after, self.before),
            Clause::equals(Field::IsUsed, self.is_used),
            Clause::in_range(Field::Speed, self.min_speed, self.max_speed),
            Clause::in_range(Field::CrewSize, self.min_crew_size, self.max_crew_size),
            Clause::in_range(Field::Rating, self.min_rating, self.max_rating),
        ]
        .into_iter()
        .collect()
    }
}
