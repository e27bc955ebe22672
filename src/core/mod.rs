pub mod axes;
pub mod primitives;
pub mod scale;
pub mod series;
pub mod types;

pub use axes::{AxesLimits, AxesView, LIMIT_TRANSITION_MS, LimitTransition, LinearAxes, SharedAxes};
pub use primitives::{SECONDS_PER_DAY, datetime_to_unix_seconds, unix_seconds_to_datetime};
pub use scale::LinearScale;
pub use series::Series;
pub use types::{DataPoint, PixelRect, Viewport};
