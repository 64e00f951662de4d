//! Service endpoint paths (relative to the configured base URL)

/// Bulk creation, one request per chunk
pub const BULK_CREATE_PATH: &str = "/AssetService/Assets/Bulk/Create";

/// Bulk variable creation, one request per chunk
pub const VARIABLES_BULK_CREATE_PATH: &str = "/DataService/Variables/Bulk/Create";

/// Asset collection of the data service (listing, attributes, updates)
pub const ASSETS_PATH: &str = "/DataService/anchor/v1/assets";

/// Page size used when listing every asset
pub const LIST_PAGE_SIZE: usize = 100;

/// Parent id the service expects for root assets
pub const DEFAULT_ROOT_PARENT_ID: &str = "0";

/// Attribute key used to tag leaves with their energy type
pub const ENERGY_ATTRIBUTE_KEY: &str = "energyType";
