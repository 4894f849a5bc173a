/// Runtime orchestrator module - Gateway

mod orchestrator;
mod printer;

pub use orchestrator::Orchestrator;
pub use printer::Printer;
