use super::*;

mod analysis_service;
mod papers;
mod submission;
