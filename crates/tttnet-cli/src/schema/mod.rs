pub mod ai_model;
pub mod training_state;
