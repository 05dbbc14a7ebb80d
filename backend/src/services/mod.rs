//! Business logic services for the Stationery Stock Ledger

pub mod inventory;
pub mod item;
pub mod order;
pub mod order_number;
pub mod stock;

pub use inventory::InventoryService;
pub use item::ItemService;
pub use order::OrderService;
