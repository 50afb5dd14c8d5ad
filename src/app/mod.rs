// Application layer - Use case interactors

pub mod container;
pub mod inspect_interactor;
pub mod process_interactor;

// Re-export interactors
pub use container::AppContainer;
pub use inspect_interactor::{InspectInteractor, InspectReport};
pub use process_interactor::{
    BatchReport, EpisodeAction, EpisodeReport, ProcessInteractor, ProcessSettings, SeasonReport,
};
