//! Terminal widgets for showing estimates.

mod error;
mod polar;

pub use error::DoaGuiError;
pub use polar::{bearing_line, render_polar, semicircle, PolarView};
