pub mod config;
pub mod decrypt;
pub mod encrypt;
pub mod info;
pub mod keyfile;
pub mod rotate;
pub mod shred;
