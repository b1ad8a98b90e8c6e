pub mod collection;
pub mod fixtures;
pub mod repositories;

pub use collection::{JsonCollection, Record};
pub use fixtures::{seed_data_dir, SeedDataset, SeedReport};
pub use repositories::{
    InMemoryReferenceDataRepository, InMemoryRequestRepository, JsonReferenceDataRepository,
    JsonRequestRepository, ReferenceDataRepository, RequestRepository, StoreError,
};
