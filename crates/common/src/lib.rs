pub mod export;
pub mod filters;
pub mod models;
pub mod network;
pub mod pagination;
pub mod upload;
