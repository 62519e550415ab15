pub mod analysis;
pub mod draft;
pub mod metrics;
pub mod rent_roll;
pub mod sensitivity;
