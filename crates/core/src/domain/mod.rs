pub mod agent_config;
pub mod appointment;
pub mod conversation;
pub mod customer;
