pub mod synth_pipeline;

pub use synth_pipeline::SynthPipeline;
