mod bundle;

pub use bundle::{BundleCommand, BundleSettings};
