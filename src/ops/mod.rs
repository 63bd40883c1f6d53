pub mod complete;
pub mod dates;
pub mod derive;
pub mod hierarchy;
pub mod recurrence;
