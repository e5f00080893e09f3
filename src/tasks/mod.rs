pub mod mission_task;
pub mod server_task;
