pub mod booking;
pub mod site_type;
