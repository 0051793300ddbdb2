mod mock_inventory_repository;
mod mock_listing_publisher;

pub use mock_inventory_repository::MockInventoryRepository;
pub use mock_listing_publisher::MockListingPublisher;
