pub mod events;
pub mod rideshare;
