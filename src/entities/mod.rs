mod download;
mod path;
mod point;
mod route;
mod tile;

pub use download::{DownloadJob, DownloadStatus, DownloadSummary};
pub use path::{CacheEntry, PathGeometry};
pub use point::{Point, Waypoint};
pub use route::{Budget, Category, Mood, Route, RouteFilter, TimeBudget};
pub use tile::{BoundingBox, TileCoordinate, TileRecord};
