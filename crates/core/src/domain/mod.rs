pub mod catalog;
pub mod request;
