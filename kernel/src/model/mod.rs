pub mod booking;
pub mod equipment;
pub mod id;
pub mod price;
pub mod site;
pub mod site_type;
pub mod stay;
