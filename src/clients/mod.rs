pub mod geocoding;
pub mod identity_provider;
