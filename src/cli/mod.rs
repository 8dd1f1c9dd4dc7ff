pub mod doctor;
pub mod export;
pub mod stats;
pub mod token;
