//! Storage layer for asesoria: connection configuration, pooling, embedded
//! migrations, row shapes, and the parameterized statements behind the plan
//! repository.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
