pub mod assistant;
pub mod attendance;
pub mod core;
pub mod courses;
pub mod export;
pub mod idcards;
pub mod notifications;
pub mod scanner;
pub mod students;
pub mod teachers;
