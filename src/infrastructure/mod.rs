// Infrastructure layer module
// Contains the object storage adapter and external service integrations

pub mod geocode;
pub mod object_store;
pub mod stores;
