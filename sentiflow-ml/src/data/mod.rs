//! Raw data handling: CSV tables, dataset sources, label filtering and splitting.

pub mod source;
pub mod split;
pub mod table;

pub use source::DatasetSource;
pub use split::{LabelMapping, filter_sentiments, train_test_split};
pub use table::DataTable;
