use bytes::Bytes;
use http::Response;
use http_body_util::BodyExt;

/// Type alias for the boxed response body returned by every transport.
///
/// The body is type-erased so that any request-execution primitive (hyper,
/// an in-memory fake, a custom stack) can sit underneath the pipeline.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Box an arbitrary response body into [`ResponseBody`].
#[must_use]
pub fn into_response_body<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: http_body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_into_response_body_preserves_parts_and_body() {
        let response = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header("x-test", "1")
            .body(Full::new(Bytes::from_static(b"hello")))
            .unwrap();

        let response = into_response_body(response);

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get("x-test").unwrap(), "1");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello");
    }
}
