use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

#[derive(Debug)]
pub enum HtmlError {
    TemplateError(String),
}

impl From<minijinja::Error> for HtmlError {
    fn from(err: minijinja::Error) -> Self {
        Self::TemplateError(err.to_string())
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        match self {
            Self::TemplateError(err) => {
                error!("Template error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(fallback_error("Something went wrong")),
                )
                    .into_response()
            }
        }
    }
}

fn fallback_error(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <body>
        <h1>Error</h1>
        <p>{message}</p>
    </body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_errors_become_server_errors() {
        let err = minijinja::Error::new(minijinja::ErrorKind::TemplateNotFound, "index.html");
        let response = HtmlError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
