// Application layer: pipelines and the job service built on the core modules.

pub mod pipelines;
pub mod service;
