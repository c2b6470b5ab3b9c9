//! Health, restaurants and menus.

use bitebox_client::AppState;
use bitebox_core::RestaurantId;

use super::{CommandError, Output};

pub async fn health(state: &AppState, out: Output) -> Result<(), CommandError> {
    let status = state.api().health().await?;
    out.emit(&status, || {
        let env = if status.env.is_empty() { "unknown" } else { &status.env };
        vec![format!(
            "{} is {} (env: {env})",
            state.api().base_url(),
            if status.ok { "up" } else { "degraded" }
        )]
    })
}

pub async fn restaurants(
    state: &AppState,
    out: Output,
    search: Option<&str>,
) -> Result<(), CommandError> {
    let restaurants = match search {
        Some(query) => state.api().search_restaurants(query).await?,
        None => state.api().restaurants().await?.as_ref().clone(),
    };
    out.emit(&restaurants, || {
        if restaurants.is_empty() {
            return vec!["No restaurants found".to_string()];
        }
        restaurants
            .iter()
            .map(|r| {
                format!(
                    "{:<12} {:<28} {:>4.1}* {:<10} fee {:<8} {}",
                    r.id.as_str(),
                    r.name,
                    r.rating,
                    r.delivery_time,
                    r.delivery_fee.to_string(),
                    if r.is_open { "open" } else { "closed" }
                )
            })
            .collect()
    })
}

pub async fn menu(state: &AppState, out: Output, restaurant_id: &str) -> Result<(), CommandError> {
    let items = state.api().menu(&RestaurantId::new(restaurant_id)).await?;
    out.emit(items.as_slice(), || {
        let mut lines = Vec::new();
        for item in items.iter() {
            lines.push(format!(
                "{:<12} {:<32} {:>10}{}",
                item.id.as_str(),
                item.name,
                item.price.to_string(),
                if item.is_available { "" } else { "  (sold out)" }
            ));
            for group in &item.option_groups {
                let options: Vec<String> = group
                    .options
                    .iter()
                    .map(|o| format!("{} +{}", o.name, o.price))
                    .collect();
                lines.push(format!("    {}: {}", group.name, options.join(", ")));
            }
        }
        if lines.is_empty() {
            lines.push("This restaurant has no menu yet".to_string());
        }
        lines
    })
}
