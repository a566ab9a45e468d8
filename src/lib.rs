pub mod agent;
pub mod calendar;
pub mod cli;
pub mod core;
pub mod dialogue;
pub mod google;
pub mod nlp;
pub mod scheduling;
pub mod voice;
