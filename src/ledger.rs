//! Flavor inventory and the ledger of recorded sales.
//!
//! [`Ledger`] is a plain owned value; callers that share it across requests
//! wrap it in a lock (see [`crate::state::AppState`]). Every mutating method
//! validates before touching any field, so a rejected call leaves the ledger
//! exactly as it was.

use crate::config::Catalog;
use crate::models::{Cents, Sale};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("El sabor {0} no está disponible.")]
    UnknownFlavor(String),
    #[error("Cantidad inválida: {0}.")]
    InvalidQuantity(String),
    #[error("No hay suficiente stock de {flavor}. Stock actual: {available}")]
    InsufficientStock {
        flavor: String,
        requested: u32,
        available: u32,
    },
}

#[derive(Debug, Clone)]
struct FlavorStock {
    initial: u32,
    stock: u32,
    price: Cents,
}

/// Result of a successful sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub sale: Sale,
    pub running_total: Cents,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    flavors: BTreeMap<String, FlavorStock>,
    sales: Vec<Sale>,
    total: Cents,
}

impl Ledger {
    pub fn new(catalog: &Catalog) -> Self {
        let flavors = catalog
            .flavors
            .iter()
            .map(|flavor| {
                (
                    flavor.name.clone(),
                    FlavorStock {
                        initial: flavor.stock,
                        stock: flavor.stock,
                        price: flavor.price,
                    },
                )
            })
            .collect();

        Self {
            flavors,
            sales: Vec::new(),
            total: Cents::ZERO,
        }
    }

    /// Flavor names in ascending order.
    pub fn flavors(&self) -> Vec<String> {
        self.flavors.keys().cloned().collect()
    }

    pub fn stock(&self) -> BTreeMap<String, u32> {
        self.flavors
            .iter()
            .map(|(name, flavor)| (name.clone(), flavor.stock))
            .collect()
    }

    pub fn stock_of(&self, flavor: &str) -> Option<u32> {
        self.flavors.get(flavor).map(|entry| entry.stock)
    }

    pub fn total(&self) -> Cents {
        self.total
    }

    /// Sales in the order they were recorded.
    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn sell(&mut self, flavor: &str, quantity: u32) -> Result<Receipt, LedgerError> {
        self.sell_at(flavor, quantity, Local::now().naive_local())
    }

    pub fn sell_at(
        &mut self,
        flavor: &str,
        quantity: u32,
        at: NaiveDateTime,
    ) -> Result<Receipt, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(
                "la cantidad debe ser mayor que cero".to_string(),
            ));
        }

        let entry = self
            .flavors
            .get_mut(flavor)
            .ok_or_else(|| LedgerError::UnknownFlavor(flavor.to_string()))?;

        if entry.stock < quantity {
            return Err(LedgerError::InsufficientStock {
                flavor: flavor.to_string(),
                requested: quantity,
                available: entry.stock,
            });
        }

        let amount = entry.price.checked_mul(quantity).ok_or_else(|| {
            LedgerError::InvalidQuantity(format!("el importe de {quantity} unidades es demasiado grande"))
        })?;
        let running_total = self.total.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidQuantity("el total acumulado excedería el máximo".to_string())
        })?;

        entry.stock -= quantity;
        let sale = Sale {
            flavor: flavor.to_string(),
            quantity,
            unit_price: entry.price,
            amount,
            sold_at: at,
            remaining_stock: entry.stock,
        };
        self.sales.push(sale.clone());
        self.total = running_total;

        Ok(Receipt {
            sale,
            running_total,
        })
    }

    /// Drops the sale history and zeroes the total. Stock is untouched.
    pub fn clear_sales(&mut self) {
        self.sales.clear();
        self.total = Cents::ZERO;
    }

    /// Restores every flavor to its configured stock and clears sales.
    pub fn reset_all(&mut self) {
        for flavor in self.flavors.values_mut() {
            flavor.stock = flavor.initial;
        }
        self.clear_sales();
    }
}
