use axum::{
    extract::{FromRef, State},
    response::Html,
    routing::get,
    Router,
};
use common::utils::template_engine::context;

use crate::{error::HtmlError, html_state::HtmlState};

pub fn public_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route("/", get(index_handler))
}

pub async fn index_handler(State(state): State<HtmlState>) -> Result<Html<String>, HtmlError> {
    let page = state
        .templates
        .render("index.html", &context! { title => state.page_title })?;

    Ok(Html(page))
}
