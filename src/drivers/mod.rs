pub mod bno055;
pub mod host_link;
pub mod ir_array;
pub mod timer_pace;
