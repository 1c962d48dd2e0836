pub mod extract;
pub mod locations;
pub mod memberships;
pub mod middleware;
pub mod reports;
pub mod reviews;
pub mod search;
