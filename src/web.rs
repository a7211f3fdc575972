use std::{convert::Infallible, net::SocketAddr};

use async_graphql::http::GraphiQLSource;
use async_graphql_warp::{GraphQLBadRequest, GraphQLResponse};
use tracing::info;
use warp::{
    http::{Response as HttpResponse, StatusCode},
    Filter, Rejection,
};

use crate::api::Schema;

/// Serves the GraphQL API at `/graphql`: queries over POST, the GraphiQL
/// page over GET.
pub(crate) async fn serve(schema: Schema, addr: SocketAddr) {
    let graphql_post = warp::post().and(async_graphql_warp::graphql(schema).and_then(
        |(schema, request): (Schema, async_graphql::Request)| async move {
            Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
        },
    ));
    let graphiql = warp::get().map(|| {
        HttpResponse::builder()
            .header("content-type", "text/html")
            .body(GraphiQLSource::build().endpoint("/graphql").finish())
    });

    let routes = warp::path!("graphql")
        .and(graphiql.or(graphql_post))
        .recover(|err: Rejection| async move {
            if let Some(GraphQLBadRequest(err)) = err.find() {
                return Ok::<_, Infallible>(warp::reply::with_status(
                    err.to_string(),
                    StatusCode::BAD_REQUEST,
                ));
            }
            if err.is_not_found() {
                return Ok(warp::reply::with_status("NOT_FOUND".to_string(), StatusCode::NOT_FOUND));
            }
            Ok(warp::reply::with_status(
                "INTERNAL_SERVER_ERROR".to_string(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        });

    info!("Listening on {addr}");
    warp::serve(routes).run(addr).await;
}
