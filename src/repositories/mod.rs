mod shopify_publisher;
mod supabase_inventory_repository;
mod traits;

pub use shopify_publisher::ShopifyPublisher;
pub use supabase_inventory_repository::SupabaseInventoryRepository;
pub use traits::{InventoryRepository, ListingPublisher};
