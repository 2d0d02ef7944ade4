pub mod capture;
pub mod worker;

pub use capture::spawn_capture_thread;
pub use worker::spawn_worker_threads;
