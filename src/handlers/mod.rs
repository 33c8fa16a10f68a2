//! HTTP request handlers

pub mod admin;
pub mod auth;
pub mod campaigns;
pub mod uploads;
pub mod users;
