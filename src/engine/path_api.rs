use super::{Engine, ResolvedPath};

use async_trait::async_trait;

use crate::{
    api::PathAPI,
    entities::{Point, Route},
    error::Error,
};

#[async_trait]
impl PathAPI for Engine {
    async fn resolve_path(&self, route: &Route, start: Option<Point>) -> Result<ResolvedPath, Error> {
        self.resolver.resolve(route, start).await
    }
}
