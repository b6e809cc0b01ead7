//! CV data model and exporters.

pub mod html;
pub mod linkedin;
pub mod markdown;
pub mod schema;
