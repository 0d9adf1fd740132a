pub mod anomaly_builder;
pub mod baseline_calculator;
pub mod grid_aggregator;
pub mod grid_assigner;
pub mod integrity_checker;
pub mod pipeline;
pub mod series_filter;
pub mod simple_average;

pub use anomaly_builder::AnomalyBuilder;
pub use baseline_calculator::{BaselineCalculator, BaselineTable};
pub use grid_aggregator::{GlobalReduction, GridAggregator};
pub use grid_assigner::{GridAssigner, GridAssignment};
pub use integrity_checker::{IntegrityChecker, IntegrityReport};
pub use pipeline::{AnomalyPipeline, PipelineOutput, PipelineReport};
pub use series_filter::{latest_complete_year, SeriesFilter};
pub use simple_average::SimpleAverager;
