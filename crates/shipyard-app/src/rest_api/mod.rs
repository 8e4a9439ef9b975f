pub mod ship;

use garde::Validate;
use serde::{Deserialize, Serialize};
use shipyard_dal::ListingParams;

pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// Attribute used to sort listed ships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipOrder {
    #[default]
    Id,
    Name,
    Planet,
    ShipType,
    Date,
    IsUsed,
    Speed,
    CrewSize,
    Rating,
}

impl ShipOrder {
    pub fn column(&self) -> &'static str {
        match self {
            ShipOrder::Id => "id",
            ShipOrder::Name => "name",
            ShipOrder::Planet => "planet",
            ShipOrder::ShipType => "ship_type",
            ShipOrder::Date => "prod_date",
            ShipOrder::IsUsed => "is_used",
            ShipOrder::Speed => "speed",
            ShipOrder::CrewSize => "crew_size",
            ShipOrder::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, Default, Validate, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Zero based page index
    #[garde(skip)]
    page_number: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(skip)]
    order: Option<ShipOrder>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ListingParams {
        let page_size = self.page_size.unwrap_or(default_page_size);
        let offset = i64::from(self.page_number.unwrap_or(0)) * i64::from(page_size);
        let order = self.order.unwrap_or_default();

        let params = ListingParams::new(offset, page_size.into());
        match order {
            ShipOrder::Id => params,
            other => params.with_order(vec![other.column().to_string()]),
        }
    }
}
