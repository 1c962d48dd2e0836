pub mod cache;
pub mod contracts;
pub mod error;
pub mod jwt;
pub mod locations;
pub mod memberships;
pub mod reports;
pub mod reviews;
pub mod search;
