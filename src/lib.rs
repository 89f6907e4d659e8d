#![forbid(unsafe_code)]

pub mod builder;
pub mod cache;
pub mod composite;
pub mod error;
pub mod refresh;
pub mod schedule;
pub mod scheduler;

pub use cache::{DecodedImage, ImageCache};
pub use composite::{Frame, Surface, render};
pub use error::{DriftwallError, DriftwallResult};
pub use refresh::RefreshLoop;
pub use schedule::{Event, Timeline};
pub use scheduler::{ScheduleResult, resolve};
