//! Repository layer: one zero-sized struct per table, each method taking
//! the pool explicitly.

pub mod encounter_repo;
pub mod population_repo;
pub mod reference_repo;
pub mod server_repo;
pub mod state_repo;
pub mod user_repo;

pub use encounter_repo::EncounterRepo;
pub use population_repo::PopulationRepo;
pub use reference_repo::ReferenceRepo;
pub use server_repo::ServerRepo;
pub use state_repo::StateRepo;
pub use user_repo::UserRepo;
