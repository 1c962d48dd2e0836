pub mod catalog;
pub mod location;
pub mod membership;
pub mod opening_hours;
pub mod report;
pub mod review;
pub mod search;
