pub mod config_io;
pub mod task_file;
