pub use crate::detect::{OverlapDetector, OverlapPair, OverlapReport, Threshold};
pub use crate::index::SpatialIndex;
pub use crate::progress::Progress;
pub use crate::sanitize::{sanitize, Sanitized};
pub use crate::{Feature, FeatureId, VectorDataset};
