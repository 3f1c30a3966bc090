use banded_data::DataError;
use banded_expr::ExpressionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Band '{band}' has a height of {height:.2} which exceeds the available page content height of {available:.2}.")]
    BandTooTall {
        band: &'static str,
        height: f32,
        available: f32,
    },
    #[error("Expression error during layout: {0}")]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Data(#[from] DataError),
}

pub mod algorithms;
pub mod engine;
pub mod model;

pub use self::engine::{Paginator, layout, render_text};
pub use self::model::{LayoutContent, LayoutElement, LayoutModel, LayoutPage};

#[cfg(test)]
mod engine_test;
