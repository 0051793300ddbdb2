//! Application service layer.
//!
//! Services contain business logic and orchestrate interactions between
//! sources, repositories and caches. They provide a clean boundary between
//! the HTTP handlers and the data access layer.

mod card_service;
mod inventory_service;
mod price_lookup_service;

pub use card_service::{CardService, CardServiceImpl};
pub use inventory_service::{InventoryService, InventoryServiceImpl, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use price_lookup_service::{compare, PriceLookupService, PriceLookupServiceImpl, SourceResult};
