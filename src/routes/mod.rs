mod auth;
mod executions;
mod health_check;
mod machines;
mod regions;

pub use auth::{create_user, login, logout, refresh_token};
pub use executions::{
    batch_restart, describe_execution, list_executions, restart_execution, start_execution,
};
pub use health_check::health_check;
pub use machines::list_machines;
pub use regions::{list_regions, AWS_REGIONS};
