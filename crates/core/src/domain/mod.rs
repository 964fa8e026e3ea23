pub mod customer;
pub mod product;
pub mod quote;
pub mod receipt;
pub mod role;
