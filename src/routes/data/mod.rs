mod handler;
mod model;

pub use handler::get_data;
pub use model::{DataResponse, FreshData, Source};
