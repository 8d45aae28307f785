pub mod agent;
pub mod balance;
pub mod onboard;
pub mod op;
pub mod runtime;
pub mod tools;
