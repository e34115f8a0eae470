pub mod files;
pub mod filesize;
