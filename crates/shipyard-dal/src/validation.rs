//! Validation of ship data on creation and on partial update.
//!
//! Both payloads share the same per field rules, the only difference is
//! that creation requires all fields except `isUsed`, while update applies
//! whatever fields are present.

use garde::Validate;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    error::{Error, Result},
    rating::{CURRENT_YEAR, calculate_rating},
    ship::{Ship, ShipType, epoch_millis},
};

pub const MIN_PRODUCTION_YEAR: i32 = 2800;
pub const MAX_PRODUCTION_YEAR: i32 = CURRENT_YEAR;

/// Only positive ids can refer to a stored ship.
pub fn is_id_valid(id: i64) -> bool {
    id > 0
}

fn production_year_in_range(date: &Date, _ctx: &()) -> garde::Result {
    let year = date.year();
    if (MIN_PRODUCTION_YEAR..=MAX_PRODUCTION_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "production year {year} is not in range {MIN_PRODUCTION_YEAR}..={MAX_PRODUCTION_YEAR}"
        )))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateShip {
    #[garde(required, length(chars, min = 1, max = 50))]
    pub name: Option<String>,
    #[garde(required, length(chars, min = 1, max = 50))]
    pub planet: Option<String>,
    #[garde(required)]
    #[serde(alias = "type")]
    pub ship_type: Option<ShipType>,
    #[garde(required, inner(custom(production_year_in_range)))]
    #[serde(default, with = "epoch_millis::option", alias = "productionDate")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub prod_date: Option<Date>,
    #[garde(skip)]
    pub is_used: Option<bool>,
    #[garde(required, range(min = 0.01, max = 0.99))]
    pub speed: Option<f64>,
    #[garde(required, range(min = 1, max = 9999))]
    pub crew_size: Option<i32>,
}

impl CreateShip {
    /// Fills in defaults for optional fields, currently only `isUsed`.
    pub fn normalize(self) -> Self {
        Self {
            is_used: Some(self.is_used.unwrap_or(false)),
            ..self
        }
    }

    /// True if all required fields are present and within range.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Validated and rated ship, which is not stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipDraft {
    pub name: String,
    pub planet: String,
    pub ship_type: ShipType,
    pub prod_date: Date,
    pub is_used: bool,
    pub speed: f64,
    pub crew_size: i32,
    pub rating: f64,
}

impl TryFrom<CreateShip> for ShipDraft {
    type Error = Error;

    fn try_from(candidate: CreateShip) -> Result<Self> {
        let candidate = candidate.normalize();
        candidate.validate()?;
        match candidate {
            CreateShip {
                name: Some(name),
                planet: Some(planet),
                ship_type: Some(ship_type),
                prod_date: Some(prod_date),
                is_used: Some(is_used),
                speed: Some(speed),
                crew_size: Some(crew_size),
            } => Ok(ShipDraft {
                rating: calculate_rating(speed, is_used, prod_date.year()),
                name,
                planet,
                ship_type,
                prod_date,
                is_used,
                speed,
                crew_size,
            }),
            _ => Err(Error::InvalidInput("Missing required field".to_string())),
        }
    }
}

/// Partial update of a ship, absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ShipPatch {
    #[garde(length(chars, min = 1, max = 50))]
    pub name: Option<String>,
    #[garde(length(chars, min = 1, max = 50))]
    pub planet: Option<String>,
    #[garde(skip)]
    #[serde(alias = "type")]
    pub ship_type: Option<ShipType>,
    #[garde(inner(custom(production_year_in_range)))]
    #[serde(default, with = "epoch_millis::option", alias = "productionDate")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub prod_date: Option<Date>,
    #[garde(skip)]
    pub is_used: Option<bool>,
    #[garde(range(min = 0.01, max = 0.99))]
    pub speed: Option<f64>,
    #[garde(range(min = 1, max = 9999))]
    pub crew_size: Option<i32>,
}

impl ShipPatch {
    /// Validates all present fields and only if all of them pass applies
    /// them to `ship` and recomputes its rating.
    pub fn apply_to(self, ship: &mut Ship) -> Result<()> {
        self.validate()?;

        if let Some(name) = self.name {
            ship.name = name;
        }
        if let Some(planet) = self.planet {
            ship.planet = planet;
        }
        if let Some(ship_type) = self.ship_type {
            ship.ship_type = ship_type;
        }
        if let Some(prod_date) = self.prod_date {
            ship.prod_date = prod_date;
        }
        if let Some(is_used) = self.is_used {
            ship.is_used = is_used;
        }
        if let Some(speed) = self.speed {
            ship.speed = speed;
        }
        if let Some(crew_size) = self.crew_size {
            ship.crew_size = crew_size;
        }

        ship.rating = calculate_rating(ship.speed, ship.is_used, ship.prod_date.year());
        Ok(())
    }
}
