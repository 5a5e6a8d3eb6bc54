#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CategoryRepository, InMemoryRepository, PackRepository, Storage, StorageError,
};
