pub mod activities;
pub mod companies;
pub mod config;
pub mod contacts;
pub mod deals;
pub mod gateway;
pub mod shared;
