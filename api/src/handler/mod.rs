pub mod booking;
pub mod health;
pub mod site_type;
