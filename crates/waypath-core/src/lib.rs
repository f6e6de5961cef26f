pub mod config;
pub mod containment;
pub mod error;
pub mod models;
pub mod path;
pub mod planner;
pub mod raster;
pub mod search;
pub mod snap;
pub mod spatial;
pub mod transform;

pub use config::PlannerConfig;
pub use containment::{point_in_any, point_in_polygon, point_in_ring};
pub use error::{Result, RouteError};
pub use models::{BoundingBox, Coordinate, NamedPoint, ObstacleInput, ObstacleSet, Polygon};
pub use path::{reconstruct, RoutePath};
pub use planner::{PlanReport, PlanRequest, Planner};
pub use raster::{
    rasterize, rasterize_planar, Cell, CellCoord, CellTable, OccupancyGrid, RasterGrid, PATH_CODE,
};
pub use search::{AStar, Search, SearchNode, SearchOutcome, SearchState};
pub use snap::{snap, snap_many};
pub use spatial::{
    bbox_polygon, center, haversine_distance, rhumb_bearing, rhumb_destination, rhumb_distance,
};
pub use transform::{expand, pad_bbox};
