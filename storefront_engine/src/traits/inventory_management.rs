use crate::{
    db_types::OrderLine,
    traits::{StockCommit, StoreDbError},
};

/// The inventory guard. Stock is only ever reduced through an atomic "decrement if at least `quantity` remains"
/// operation at the storage layer, so concurrent callers can never drive it below zero.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Atomically removes `quantity` units of the SKU from stock and returns the stock that remains.
    ///
    /// Fails with [`StoreDbError::InsufficientStock`] (and changes nothing) if fewer than `quantity` units are
    /// available.
    async fn decrement_if_available(&self, sku_id: i64, quantity: i64) -> Result<i64, StoreDbError>;

    /// Takes an order line's quantity out of stock exactly once.
    ///
    /// The line's `stock_committed` marker and the stock decrement are applied in one atomic unit. If the line was
    /// committed previously, nothing changes and [`StockCommit::AlreadyCommitted`] is returned. On
    /// [`StoreDbError::InsufficientStock`] neither the marker nor the stock is changed.
    async fn commit_line_stock(&self, line: &OrderLine) -> Result<StockCommit, StoreDbError>;
}
