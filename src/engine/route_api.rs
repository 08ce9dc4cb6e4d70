use super::{rank_by_proximity, Engine, ResolvedPath};

use async_trait::async_trait;

use crate::{
    api::RouteSearchAPI,
    entities::{Point, Route, RouteFilter},
    error::Error,
};

#[async_trait]
impl RouteSearchAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_routes(&self, filter: &RouteFilter, start: Option<Point>) -> Result<Vec<Route>, Error> {
        let routes = self.routes.find_routes(filter).await?;

        tracing::info!("route backend returned {} candidates", routes.len());

        match start {
            Some(start) if !routes.is_empty() => Ok(rank_by_proximity(routes, start)),
            _ => Ok(routes),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn select_route(&self, id: &str, start: Option<Point>) -> Result<(Route, ResolvedPath), Error> {
        let route = self.routes.find_route(id).await?;
        let path = self.resolver.resolve(&route, start).await?;

        Ok((route, path))
    }
}

#[test]
fn find_routes_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let routes = vec![
        route("far", &[(50.45, 30.52)]),
        route("near", &[(49.845, 24.035), (49.85, 24.04)]),
    ];
    let engine = super::test_engine(routes, Arc::new(MockRouting::working()));
    let filter = RouteFilter::default();

    let all = block_on(engine.find_routes(&filter, None)).unwrap();
    assert_eq!(all.len(), 2);

    let nearby = block_on(engine.find_routes(&filter, Some(Point::new(49.8397, 24.0297)))).unwrap();
    assert_eq!(nearby.len(), 1);
    assert_eq!(nearby[0].id, "near");
}

#[test]
fn select_route_test() {
    use crate::testing::{route, MockRouting};
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = super::test_engine(
        vec![route("near", &[(49.845, 24.035), (49.85, 24.04), (49.86, 24.05)])],
        Arc::new(MockRouting::failing()),
    );

    let (route, path) =
        block_on(engine.select_route("near", Some(Point::new(49.8397, 24.0297)))).unwrap();

    assert_eq!(route.waypoints.len(), 3);
    assert_eq!(path.entry_index, Some(0));
    assert_eq!(path.full.len(), 3);
    assert_eq!(path.approach.map(|approach| approach.len()), Some(2));

    assert!(block_on(engine.select_route("missing", None)).is_err());
}
