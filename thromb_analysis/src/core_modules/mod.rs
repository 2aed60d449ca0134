pub mod boundary_detector;
pub mod component;
pub mod component_labeler;
pub mod descriptor_builder;
pub mod grid;
pub mod statistics;
pub mod sub_region_classifier;
pub mod thresholder;
