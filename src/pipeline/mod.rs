pub mod cleaning;
pub mod export;
pub mod import;
pub mod nlp;
pub mod processor;
pub mod stages;
