// Domain layer - Episode classification and processing decisions

pub mod errors;
pub mod model;
pub mod rules;
