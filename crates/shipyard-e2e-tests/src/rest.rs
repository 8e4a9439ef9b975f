use anyhow::{Result, bail};
use reqwest::Url;
use serde_json::{Value, json};
use shipyard_dal::{Ship, ship::epoch_millis::to_millis};
use time::Date;
use tracing::info;

pub fn ship_json(
    name: &str,
    planet: &str,
    ship_type: &str,
    prod_date: Date,
    speed: f64,
    crew_size: i32,
) -> Value {
    json!({
        "name": name,
        "planet": planet,
        "shipType": ship_type,
        "prodDate": to_millis(prod_date),
        "speed": speed,
        "crewSize": crew_size,
    })
}

pub async fn create_ship(client: &reqwest::Client, api_url: &Url, payload: &Value) -> Result<Ship> {
    let response = client.post(api_url.clone()).json(payload).send().await?;
    if !response.status().is_success() {
        bail!("Ship not created: {}", response.status());
    }
    let ship: Ship = response.json().await?;
    info!("Created ship {}", ship.id);
    Ok(ship)
}

pub async fn list_ships(client: &reqwest::Client, api_url: &Url, query: &[(&str, &str)]) -> Result<Vec<Ship>> {
    let response = client.get(api_url.clone()).query(query).send().await?;
    if !response.status().is_success() {
        bail!("Listing failed: {}", response.status());
    }
    Ok(response.json().await?)
}

pub async fn count_ships(client: &reqwest::Client, api_url: &Url, query: &[(&str, &str)]) -> Result<u64> {
    let url = crate::extend_url(api_url, "count");
    let response = client.get(url).query(query).send().await?;
    if !response.status().is_success() {
        bail!("Count failed: {}", response.status());
    }
    Ok(response.json().await?)
}
