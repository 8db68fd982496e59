//! Classification of raw answer text into reasoning and answer channels.
//!
//! # Example
//!
//! ```rust
//! use docai_stream::{MarkerConfig, TagClassifier};
//!
//! let mut classifier = TagClassifier::new(&MarkerConfig::default());
//! let first = classifier.classify("ab<thi");
//! assert_eq!(first.answer_units, vec!["ab".to_string()]);
//!
//! let second = classifier.classify("nk>rest");
//! assert_eq!(second.reasoning, "rest");
//! ```

mod classifier;
mod marker;

pub use classifier::{Classified, ClassifierState, TagClassifier};
pub use marker::Marker;
