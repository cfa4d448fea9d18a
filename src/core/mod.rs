pub mod coerce;
pub mod etl;
pub mod flatten;
pub mod normalize;
pub mod pipeline;
pub mod project;
pub mod sanitize;
pub mod serialize;
pub mod stages;
pub mod transform;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
