use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::models::Service;

pub const CART_KEY: &str = "salonbook.cart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub service_id: String,
    pub name: String,
    pub duration: i32,
    pub price: f64,
}

/// Services picked for one booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicesCart {
    pub items: Vec<CartItem>,
}

impl ServicesCart {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        Ok(queries::load_json(conn, CART_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        if self.items.is_empty() {
            queries::remove_item(conn, CART_KEY)?;
            return Ok(());
        }
        queries::save_json(conn, CART_KEY, self)
    }

    /// Returns false when the service is already in the cart.
    pub fn add(&mut self, service: &Service) -> bool {
        if self.contains(&service.id) {
            return false;
        }
        self.items.push(CartItem {
            service_id: service.id.clone(),
            name: service.name.clone(),
            duration: service.duration,
            price: service.price,
        });
        true
    }

    pub fn remove(&mut self, service_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.service_id != service_id);
        self.items.len() != before
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.items.iter().any(|i| i.service_id == service_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_price(&self) -> f64 {
        self.items.iter().map(|i| i.price).sum()
    }

    pub fn total_duration(&self) -> i32 {
        self.items.iter().map(|i| i.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn service(id: &str, duration: i32, price: f64) -> Service {
        Service {
            id: id.to_string(),
            name: format!("Serviço {id}"),
            category_id: None,
            duration,
            price,
            active: true,
        }
    }

    #[test]
    fn test_add_remove_totals() {
        let mut cart = ServicesCart::default();
        assert!(cart.add(&service("s1", 30, 40.0)));
        assert!(cart.add(&service("s2", 45, 25.5)));
        assert!(!cart.add(&service("s1", 30, 40.0)));
        assert_eq!(cart.total_duration(), 75);
        assert_eq!(cart.total_price(), 65.5);

        assert!(cart.remove("s1"));
        assert!(!cart.remove("s1"));
        assert_eq!(cart.total_duration(), 45);
    }

    #[test]
    fn test_persistence() {
        let conn = db::init_db(":memory:").unwrap();
        let mut cart = ServicesCart::default();
        cart.add(&service("s1", 30, 40.0));
        cart.save(&conn).unwrap();

        let loaded = ServicesCart::load(&conn).unwrap();
        assert_eq!(loaded, cart);

        cart.clear();
        cart.save(&conn).unwrap();
        assert!(ServicesCart::load(&conn).unwrap().is_empty());
        assert!(queries::get_item(&conn, CART_KEY).unwrap().is_none());
    }
}
