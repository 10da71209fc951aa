pub mod axml;
pub mod dom;
pub mod errors;

mod events;
mod structs;

pub use axml::Axml;
pub use dom::Element;
pub use errors::AxmlError;
