pub mod filter;
pub mod jwt;
pub mod media;
pub mod pagination;
pub mod validation;
