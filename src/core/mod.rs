pub mod epoch_ms;
pub mod error;
pub mod union;
