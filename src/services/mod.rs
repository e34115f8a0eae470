pub mod gzip;
pub mod stage;
