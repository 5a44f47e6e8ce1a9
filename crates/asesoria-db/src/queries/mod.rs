//! Parameterized SQL statements, one module per table.

pub mod favoritos;
pub mod plans;
pub mod usuarios;
