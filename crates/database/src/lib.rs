//! Storage boundary for the allocation and attendance core: the document
//! store, the atomic committer and the services that read, plan and commit.

pub mod collections;
pub mod db;
pub mod entities;
pub mod error;
pub mod legacy;
pub mod services;
pub mod store;

#[cfg(test)]
mod test_support;
