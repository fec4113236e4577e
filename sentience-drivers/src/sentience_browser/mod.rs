pub mod cache;
pub mod capture;
pub mod driver;
