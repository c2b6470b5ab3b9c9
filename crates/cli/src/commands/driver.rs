//! Driver queue, acceptance, stats and location reporting.

use bitebox_client::{ApiClient, AppState, DriverSession};
use bitebox_core::OrderId;

use super::{CommandError, Output};

fn session(state: &AppState) -> Result<DriverSession<ApiClient>, CommandError> {
    state.driver_session().ok_or(CommandError::NotDriver)
}

pub async fn queue(state: &AppState, out: Output) -> Result<(), CommandError> {
    let mut driver = session(state)?;
    driver.load_available_orders().await?;
    let orders = driver.available_orders();
    out.emit(orders, || {
        if orders.is_empty() {
            return vec!["No orders waiting".to_string()];
        }
        orders
            .iter()
            .map(|o| {
                format!(
                    "{:<14} {:>5.1} km  earn {:<8} {} -> {}",
                    o.id().as_str(),
                    o.distance,
                    o.earnings.to_string(),
                    o.pickup_location.address,
                    o.delivery_location.address
                )
            })
            .collect()
    })
}

pub async fn accept(state: &AppState, out: Output, order_id: &str) -> Result<(), CommandError> {
    let mut driver = session(state)?;
    driver.load_available_orders().await?;
    let delivery = driver.accept_order_by_id(&OrderId::new(order_id)).await?;
    out.emit(delivery, || {
        let mut lines = vec![
            format!("Accepted {} ({})", delivery.id(), delivery.status()),
            format!("Pick up at: {}", delivery.pickup_location.address),
            format!("Deliver to: {}", delivery.delivery_location.address),
        ];
        if let Some(action) = delivery.status().driver_action() {
            lines.push(format!("Next: {}", action.label()));
        }
        lines
    })
}

pub async fn stats(state: &AppState, out: Output) -> Result<(), CommandError> {
    let driver = session(state)?;
    let stats = state.api().delivery_stats(driver.driver_id()).await?;
    out.emit(&stats, || {
        let mut lines = vec![
            format!(
                "Today: {} deliveries, {} earned",
                stats.today_deliveries, stats.today_earnings
            ),
            format!(
                "Total: {} deliveries, {} earned",
                stats.total_deliveries, stats.total_earnings
            ),
            format!(
                "Rating {:.1}, completion {:.1}%",
                stats.average_rating, stats.completion_rate
            ),
        ];
        lines.extend(
            stats
                .weekly_earnings
                .iter()
                .map(|day| format!("  {:<4} {}", day.day, day.amount)),
        );
        lines
    })
}

pub async fn location(
    state: &AppState,
    out: Output,
    lat: f64,
    lng: f64,
) -> Result<(), CommandError> {
    let mut driver = session(state)?;
    driver.update_driver_location(lat, lng).await?;
    out.message(&format!("Location sent: {lat:.5}, {lng:.5}"));
    Ok(())
}
