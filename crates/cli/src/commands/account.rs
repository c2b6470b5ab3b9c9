//! The signed-in customer's orders and addresses.

use bitebox_client::AppState;
use bitebox_core::OrderType;

use super::{CommandError, Output};

pub async fn orders(state: &mut AppState, out: Output) -> Result<(), CommandError> {
    let user_id = state.api().current_user()?.id;
    let store = state.orders_mut();
    store.load_orders(&user_id).await;
    if let Some(message) = store.error() {
        return Err(CommandError::OrdersUnavailable(message.to_string()));
    }

    let orders = store.orders();
    out.emit(orders, || {
        if orders.is_empty() {
            return vec!["No orders yet".to_string()];
        }
        orders
            .iter()
            .map(|o| {
                format!(
                    "{:<14} {:<18} {:<10} {:>10}  {}",
                    o.order_number,
                    o.status.to_string(),
                    match o.order_type {
                        OrderType::Delivery => "delivery",
                        OrderType::Pickup => "pickup",
                    },
                    o.totals.total.to_string(),
                    o.created_at.format("%Y-%m-%d %H:%M")
                )
            })
            .collect()
    })
}

pub async fn addresses(state: &AppState, out: Output) -> Result<(), CommandError> {
    let addresses = state.api().my_addresses().await?;
    out.emit(&addresses, || {
        if addresses.is_empty() {
            return vec!["No saved addresses".to_string()];
        }
        addresses
            .iter()
            .map(|a| format!("{:<10} {}", a.id.as_str(), a.one_line()))
            .collect()
    })
}
