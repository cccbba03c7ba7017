pub mod controller;
pub mod notifications;
pub mod poller;
pub mod render;
pub mod view;

pub use controller::*;
pub use notifications::*;
pub use poller::*;
pub use view::*;
