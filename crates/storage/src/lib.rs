#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemoryRepository, PatternRepository, Storage, StorageError, TrackingRepository,
};
