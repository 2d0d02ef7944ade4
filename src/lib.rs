pub mod goose;
pub mod network;
pub mod os;
pub mod threads;
