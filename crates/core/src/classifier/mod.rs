//! Ticket text classification.
//!
//! The [`Classifier`] trait is the seam between intake and the inference
//! service. [`HttpClassifier`] talks to the service over HTTP; tests use the
//! mock in `crate::testing`.

mod http;
mod traits;

pub use http::HttpClassifier;
pub use traits::{combine_text, Classifier, ClassifierError, ClassifierHealth, TEXT_SEPARATOR};
