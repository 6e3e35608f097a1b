pub mod delivery;
pub mod trip;
pub mod user;
