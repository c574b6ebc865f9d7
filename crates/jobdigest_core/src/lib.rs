pub mod domain;
pub mod ports;

pub use domain::{
    DashboardStats, Generation, GenerationStatus, GenerationType, NewGeneration, User,
    UserCredentials,
};
pub use ports::{
    ContentGenerationService, DatabaseService, FileStorageService, PortError, PortResult,
};
