pub mod precomputed;
pub mod randomsample;
