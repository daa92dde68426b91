//! Backend API access: typed client and wire types.

mod client;
mod types;

pub use client::{ApiClient, ApiError, MapLoad, RetryPolicy};
pub use types::{
    ArticleDetail, ArticleRef, ArticleUpdate, CategoryNode, CategoryTree, EventNode, MapCluster,
    MapData, MapPoint, MapResponse, Postura, PosturaEvent, Subcategory, SubcategoryNode,
    TimeFilter,
};
