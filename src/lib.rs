//! Basis-risk analytics for commodity spot/futures pairs.
//!
//! The crate aligns a spot proxy and a futures series on common trading days,
//! derives the basis and its rolling risk statistics, simulates a 1:1 short
//! futures hedge, flags an oversized latest basis, and optionally trains a
//! regression model that predicts the next-step basis change from prices and
//! local weather.
//!
//! The analytics core ([`align`], [`metrics`], [`hedge`], [`alerts`],
//! [`features`], [`model`]) works on in-memory series and never touches the
//! network. Data comes in through the [`providers`] traits and goes out through
//! [`report`]; [`pipeline`] wires the stages together.
//!
//! ```
//! use basis_hedge::prelude::*;
//! use chrono::NaiveDate;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let spot = TimeSeries::from_pairs("USO", vec![(day(2), 10.0), (day(3), 11.0), (day(4), 9.0)]).unwrap();
//! let futures = TimeSeries::from_pairs("CL=F", vec![(day(2), 12.0), (day(3), 12.0), (day(4), 13.0)]).unwrap();
//!
//! let outcome = BasisAnalysis::default().run(&spot, &futures).unwrap();
//! assert_eq!(outcome.table.basis, vec![-2.0, -1.0, -4.0]);
//! assert!(outcome.alert.unwrap().is_triggered());
//! ```

pub mod alerts;
pub mod align;
pub mod config;
pub mod data;
pub mod errors;
pub mod features;
pub mod hedge;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod report;

#[cfg(test)]
mod tests {
    mod errors_tests;
    mod mock_data;
    mod scenario_tests;
    mod workflow_tests;
}

/// Convenient re-export of the most common items used when writing examples or tests.
pub mod prelude {
    pub use crate::alerts::{AlertEvaluator, AlertResult, AlertStatus};
    pub use crate::align::{align, align_strict, AlignedTable};
    pub use crate::config::{AnalysisConfig, CommoditySpec, CommodityTable, ModelKind};
    pub use crate::data::{Observation, TimeSeries};
    pub use crate::errors::{BasisHedgeError, Result};
    pub use crate::hedge::{HedgeSimulator, HedgeSummary};
    pub use crate::metrics::{DerivedTable, MetricsEngine};
    pub use crate::pipeline::{
        AnalysisOutcome, BasisAnalysis, BatchRunner, PredictionOutcome, PredictivePipeline,
    };
    pub use crate::providers::{PriceProvider, WeatherProvider};
}
