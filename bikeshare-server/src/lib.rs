//! Bike-share station server.
//!
//! Serves filtered, sorted and paged views of bike-share station state
//! while a background feed keeps the availability numbers moving. Stations
//! live either in process or in a remote document store; both sit behind
//! the same [`store::StationStore`] contract.

pub mod cache;
pub mod config;
pub mod domain;
pub mod import;
pub mod mutator;
pub mod query;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod web;
