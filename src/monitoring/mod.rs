pub mod logger;

pub use logger::SignalLog;
